//! Recommendable catalog content.

use crate::grouping::CoarseBucket;
use crate::tags::EmotionTags;
use crate::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Books,
    Movies,
    Music,
    Quotes,
}

impl Category {
    pub const ALL: [Category; 4] = [Self::Books, Self::Movies, Self::Music, Self::Quotes];

    pub fn table(&self) -> &'static str {
        match self {
            Self::Books => "books",
            Self::Movies => "movies",
            Self::Music => "music",
            Self::Quotes => "quotes",
        }
    }

    /// Column holding the item's artwork; quotes have none.
    pub fn image_column(&self) -> Option<&'static str> {
        match self {
            Self::Books | Self::Music => Some("thumbnail_url"),
            Self::Movies => Some("poster_url"),
            Self::Quotes => None,
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim().to_ascii_lowercase();
        Self::ALL.iter().copied().find(|c| c.table() == raw)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table())
    }
}

impl FromStr for Category {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| CoreError::UnknownCategory(s.to_string()))
    }
}

/// A stored catalog row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentItem {
    pub id: i64,
    pub title: String,
    pub url: String,
    pub emotion_tags: EmotionTags,
    pub image_url: Option<String>,
}

impl ContentItem {
    /// Shape the row for a recommendation response.
    pub fn to_recommendation(&self, category: Category) -> Recommendation {
        let image = category
            .image_column()
            .map(|_| self.image_url.clone().filter(|u| !u.is_empty()));
        Recommendation {
            title: self.title.clone(),
            url: self.url.clone(),
            emotion_tags: self.emotion_tags.clone(),
            image,
        }
    }
}

/// A row waiting to be inserted.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NewContentItem {
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub emotion_tags: EmotionTags,
    #[serde(default, alias = "thumbnail_url", alias = "poster_url")]
    pub image_url: Option<String>,
}

impl NewContentItem {
    pub fn new(title: impl Into<String>, url: impl Into<String>, tags: &str) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            emotion_tags: EmotionTags::parse(tags),
            image_url: None,
        }
    }

    pub fn with_image(mut self, url: impl Into<String>) -> Self {
        self.image_url = Some(url.into());
        self
    }
}

/// One recommended item as exposed to clients.
///
/// `image` is absent for quotes and `null` for other categories whose row
/// has no artwork.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub title: String,
    pub url: String,
    pub emotion_tags: EmotionTags,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<Option<String>>,
}

/// Recommendations for every category at once.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AllRecommendations {
    pub emotion: String,
    pub books: Vec<Recommendation>,
    pub movies: Vec<Recommendation>,
    pub music: Vec<Recommendation>,
    pub quotes: Vec<Recommendation>,
}

impl AllRecommendations {
    pub fn slot_mut(&mut self, category: Category) -> &mut Vec<Recommendation> {
        match category {
            Category::Books => &mut self.books,
            Category::Movies => &mut self.movies,
            Category::Music => &mut self.music,
            Category::Quotes => &mut self.quotes,
        }
    }
}

/// At most one item per category, picked through a bucket's grouping table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupedRecommendations {
    pub emotion: CoarseBucket,
    pub books: Option<Recommendation>,
    pub movies: Option<Recommendation>,
    pub music: Option<Recommendation>,
    pub quotes: Option<Recommendation>,
}

impl GroupedRecommendations {
    pub fn empty(emotion: CoarseBucket) -> Self {
        Self {
            emotion,
            books: None,
            movies: None,
            music: None,
            quotes: None,
        }
    }

    pub fn slot_mut(&mut self, category: Category) -> &mut Option<Recommendation> {
        match category {
            Category::Books => &mut self.books,
            Category::Movies => &mut self.movies,
            Category::Music => &mut self.music,
            Category::Quotes => &mut self.quotes,
        }
    }
}
