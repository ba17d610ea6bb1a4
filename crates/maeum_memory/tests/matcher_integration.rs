//! Integration tests for CatalogMatcher
//!
//! Uses tempfile::TempDir for isolated SQLite databases.

use maeum_core::config::RecommendConfig;
use maeum_core::{Category, CoarseBucket, CoreError, EmotionLabel, NewContentItem};
use maeum_memory::{CatalogMatcher, SqliteStore};
use std::sync::Arc;

async fn setup(dir: &tempfile::TempDir) -> (CatalogMatcher, Arc<SqliteStore>) {
    let db_path = dir.path().join("test.db");
    let store = Arc::new(SqliteStore::new(&db_path).await.unwrap());
    let matcher = CatalogMatcher::new(store.clone(), RecommendConfig::default());
    (matcher, store)
}

/// Inserting tags {기쁨, 설렘} and querying 기쁨 finds the item.
#[tokio::test]
async fn test_tag_round_trip() {
    let dir = tempfile::TempDir::new().unwrap();
    let (matcher, store) = setup(&dir).await;
    store
        .insert_item(
            Category::Music,
            &NewContentItem::new("NewJeans – Super Shy", "https://y/1", "기쁨,설렘"),
        )
        .await
        .unwrap();

    let items = matcher
        .recommend(Category::Music, Some(EmotionLabel::Joy), 5)
        .await
        .unwrap();
    assert!(items.iter().any(|i| i.title == "NewJeans – Super Shy"));
}

/// A 우울 movie exposes its poster under `image`.
#[tokio::test]
async fn test_movie_poster_exposed_as_image() {
    let dir = tempfile::TempDir::new().unwrap();
    let (matcher, store) = setup(&dir).await;
    store
        .insert_item(
            Category::Movies,
            &NewContentItem::new("이터널 선샤인", "https://n/1", "우울,상실,외로움")
                .with_image("https://img/eternal.jpg"),
        )
        .await
        .unwrap();

    let recs = matcher
        .recommend_raw("movies", Some("우울"), None)
        .await
        .unwrap();
    assert_eq!(recs.len(), 1);
    assert_eq!(recs[0].title, "이터널 선샤인");
    assert_eq!(recs[0].image, Some(Some("https://img/eternal.jpg".to_string())));

    let json = serde_json::to_value(&recs[0]).unwrap();
    assert_eq!(json["image"], "https://img/eternal.jpg");
}

/// Books without artwork serialize `image: null`; quotes omit the field.
#[tokio::test]
async fn test_image_field_is_null_safe() {
    let dir = tempfile::TempDir::new().unwrap();
    let (matcher, store) = setup(&dir).await;
    store
        .insert_item(Category::Books, &NewContentItem::new("책", "", "우울"))
        .await
        .unwrap();
    store
        .insert_item(Category::Quotes, &NewContentItem::new("명언", "", "우울"))
        .await
        .unwrap();

    let book = &matcher.recommend_raw("books", Some("우울"), None).await.unwrap()[0];
    let json = serde_json::to_value(book).unwrap();
    assert!(json.get("image").is_some());
    assert!(json["image"].is_null());

    let quote = &matcher.recommend_raw("quotes", Some("우울"), None).await.unwrap()[0];
    let json = serde_json::to_value(quote).unwrap();
    assert!(json.get("image").is_none());
}

/// Targeted results never exceed the limit and every one carries the tag.
#[tokio::test]
async fn test_limit_caps_and_tags_match() {
    let dir = tempfile::TempDir::new().unwrap();
    let (matcher, store) = setup(&dir).await;
    for i in 0..8 {
        let tags = if i % 2 == 0 { "우울,외로움" } else { "기쁨" };
        store
            .insert_item(Category::Books, &NewContentItem::new(format!("책 {}", i), "", tags))
            .await
            .unwrap();
    }

    for k in [1u32, 2, 3, 10] {
        let items = matcher
            .recommend(Category::Books, Some(EmotionLabel::Gloom), k)
            .await
            .unwrap();
        assert!(items.len() <= k as usize);
        assert!(items
            .iter()
            .all(|i| i.emotion_tags.to_db_string().contains("우울")));
    }
}

/// Unconditioned sampling never returns more than min(limit, catalog size).
#[tokio::test]
async fn test_random_sample_size() {
    let dir = tempfile::TempDir::new().unwrap();
    let (matcher, store) = setup(&dir).await;
    for i in 0..3 {
        store
            .insert_item(Category::Quotes, &NewContentItem::new(format!("명언 {}", i), "", "희망"))
            .await
            .unwrap();
    }

    let small = matcher.recommend(Category::Quotes, None, 2).await.unwrap();
    assert_eq!(small.len(), 2);
    let large = matcher.recommend(Category::Quotes, None, 10).await.unwrap();
    assert_eq!(large.len(), 3);
}

/// Zero targeted matches fall back to random sampling.
#[tokio::test]
async fn test_unmatched_emotion_falls_back() {
    let dir = tempfile::TempDir::new().unwrap();
    let (matcher, store) = setup(&dir).await;
    store
        .insert_item(Category::Books, &NewContentItem::new("기쁜 책", "", "기쁨"))
        .await
        .unwrap();

    let items = matcher
        .recommend(Category::Books, Some(EmotionLabel::Anger), 5)
        .await
        .unwrap();
    assert_eq!(items.len(), 1);

    // Out-of-vocabulary strings behave like no emotion at all
    let recs = matcher
        .recommend_raw("books", Some("행복"), Some(5))
        .await
        .unwrap();
    assert_eq!(recs.len(), 1);
}

#[tokio::test]
async fn test_unknown_category_and_empty_table() {
    let dir = tempfile::TempDir::new().unwrap();
    let (matcher, _store) = setup(&dir).await;

    let recs = matcher.recommend_raw("podcasts", Some("우울"), None).await.unwrap();
    assert!(recs.is_empty());

    let recs = matcher.recommend_raw("movies", Some("우울"), None).await.unwrap();
    assert!(recs.is_empty());
}

#[tokio::test]
async fn test_recommend_all_labels_emotion() {
    let dir = tempfile::TempDir::new().unwrap();
    let (matcher, store) = setup(&dir).await;
    store.seed_sample_catalog().await.unwrap();

    let all = matcher.recommend_all(Some("우울")).await;
    assert_eq!(all.emotion, "우울");
    assert!(!all.movies.is_empty());
    assert!(all.books.len() <= 5);

    let all = matcher.recommend_all(None).await;
    assert_eq!(all.emotion, "default");
}

/// Sadness broadens to uplifting tags, never mirroring 우울 itself.
#[tokio::test]
async fn test_grouped_sadness_prefers_uplifting() {
    let dir = tempfile::TempDir::new().unwrap();
    let (matcher, store) = setup(&dir).await;
    store
        .insert_item(Category::Movies, &NewContentItem::new("슬픈 영화", "", "우울,슬픔"))
        .await
        .unwrap();
    store
        .insert_item(Category::Movies, &NewContentItem::new("따뜻한 영화", "", "희망,감사"))
        .await
        .unwrap();

    let grouped = matcher.recommend_grouped("슬픔").await.unwrap();
    assert_eq!(grouped.emotion, CoarseBucket::Sadness);
    assert_eq!(grouped.movies.map(|m| m.title), Some("따뜻한 영화".to_string()));
    assert!(grouped.books.is_none());
    assert!(grouped.quotes.is_none());
}

#[tokio::test]
async fn test_grouped_unknown_bucket_is_reported() {
    let dir = tempfile::TempDir::new().unwrap();
    let (matcher, _store) = setup(&dir).await;

    let err = matcher.recommend_grouped("황홀").await.unwrap_err();
    assert!(matches!(err, CoreError::UnknownBucket(_)));
}

#[tokio::test]
async fn test_import_json() {
    let dir = tempfile::TempDir::new().unwrap();
    let (_matcher, store) = setup(&dir).await;
    let path = dir.path().join("crawl.json");
    std::fs::write(
        &path,
        r#"[
            {"category": "books", "title": "책 A", "url": "https://b/a", "emotion_tags": ["우울", "희망"], "thumbnail_url": "https://img/a"},
            {"category": "movies", "title": "영화 B", "url": "https://m/b", "emotion_tags": "설렘,사랑", "poster_url": "https://img/b"},
            {"category": "books", "title": "책 A", "url": "https://b/a", "emotion_tags": "우울"},
            {"category": "podcasts", "title": "팟캐스트", "url": ""},
            {"title": "명언 C", "emotion_tags": "감사"}
        ]"#,
    )
    .unwrap();

    let report = store.import_json(&path, Some(Category::Quotes)).await.unwrap();
    assert_eq!(report.inserted, 3);
    assert_eq!(report.duplicates, 1);
    assert_eq!(report.skipped, 1);

    let books = store.list_items(Category::Books).await.unwrap();
    assert_eq!(books[0].image_url.as_deref(), Some("https://img/a"));
    let movies = store.list_items(Category::Movies).await.unwrap();
    assert!(movies[0].emotion_tags.contains(EmotionLabel::Love));
    assert_eq!(store.count_items(Category::Quotes).await.unwrap(), 1);
}
