//! Catalog ingestion: the built-in sample catalog and crawler JSON imports.

use crate::sqlite::SqliteStore;
use anyhow::{Context, Result};
use maeum_core::{Category, NewContentItem};
use serde::Deserialize;
use std::path::Path;

/// Hand-seeded starter catalog.
pub fn sample_catalog() -> Vec<(Category, NewContentItem)> {
    let books = [
        ("미움 받을 용기", "https://www.yes24.com/Product/Goods/12627433", "감사,희망"),
        ("내가 너의 첫사랑이 아니어도", "https://www.yes24.com/Product/Goods/107088952", "설렘,사랑"),
        ("사랑할 때 알아야 할 것들", "https://www.yes24.com/Product/Goods/63898324", "설렘,희망"),
        ("죽고 싶지만 떡볶이는 먹고 싶어", "https://www.yes24.com/Product/Goods/64581273", "우울,외로움"),
        ("혼자가 혼자에게", "https://www.aladin.co.kr/shop/wproduct.aspx?ItemId=265901280", "외로움,우울"),
    ];
    let movies = [
        ("월터의 상상은 현실이 된다", "https://www.netflix.com/title/70293622", "감사,희망,기대"),
        ("인사이드 아웃", "https://www.disneyplus.com/movies/inside-out", "감사,공감,사랑"),
        ("어바웃 타임", "https://www.netflix.com/title/70265153", "설렘,사랑,희망"),
        ("라라랜드", "https://www.netflix.com/title/80095365", "설렘,신남"),
        ("너의 이름은", "https://www.watcha.com/contents/mdYyzKD", "설렘,그리움"),
        ("바닷마을 다이어리", "https://www.watcha.com/contents/m5R4KeX", "외로움,희망,우울"),
        ("이터널 선샤인", "https://www.netflix.com/title/60034550", "우울,상실,외로움"),
    ];
    let music = [
        ("김동률 – 감사", "https://www.youtube.com/watch?v=V09ENoBfRr8", "감사,편안,사랑"),
        ("나얼 – 같은 시간 속의 너", "https://www.youtube.com/watch?v=AfV-SlMdu7A", "감사,그리움"),
        ("방탄소년단 – Dynamite", "https://www.youtube.com/watch?v=gdZLi9oWNZg", "신남,기쁨"),
        ("NewJeans – Super Shy", "https://www.youtube.com/watch?v=ArmDp-zijuc", "설렘,기쁨"),
        ("아이유 – 마음", "https://www.youtube.com/watch?v=0-q1KafFCLU", "우울,외로움"),
        ("정승환 – 눈사람", "https://www.youtube.com/watch?v=c3Vjx0rPs_o", "우울,상실,외로움"),
    ];
    let quotes = [
        ("당신이 지금 가진 모든 것이, 한때 당신이 바라던 것이었다. - 익명", "감사"),
        ("고맙다는 말은 짧지만, 마음을 전하는 가장 따뜻한 언어입니다. - 익명", "감사"),
        ("모든 시작이 설레는 이유는 가능성이 가득하기 때문이다. - 익명", "설렘,희망"),
        ("뛰는 심장이 말해줘. 지금 이 순간을 즐겨! - 익명", "신남,기대"),
        ("혼자인 날에도 나를 안아줄 수 있기를. - 익명", "외로움"),
        ("깊은 밤이 지나면 반드시 아침이 옵니다. - 익명", "우울"),
    ];

    let mut catalog = Vec::new();
    for (title, url, tags) in books {
        catalog.push((Category::Books, NewContentItem::new(title, url, tags)));
    }
    for (title, url, tags) in movies {
        catalog.push((Category::Movies, NewContentItem::new(title, url, tags)));
    }
    for (title, url, tags) in music {
        catalog.push((Category::Music, NewContentItem::new(title, url, tags)));
    }
    for (title, tags) in quotes {
        // Quote sources have no canonical link
        catalog.push((Category::Quotes, NewContentItem::new(title, "", tags)));
    }
    catalog
}

/// Counts from an ingestion run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportReport {
    pub inserted: usize,
    pub duplicates: usize,
    pub skipped: usize,
}

/// One crawler output record. `category` may be omitted when the caller
/// supplies one for the whole file.
#[derive(Debug, Deserialize)]
struct ImportRecord {
    #[serde(default)]
    category: Option<String>,
    #[serde(flatten)]
    item: NewContentItem,
}

impl SqliteStore {
    /// Insert the sample catalog; existing titles are left untouched.
    pub async fn seed_sample_catalog(&self) -> Result<ImportReport> {
        let mut report = ImportReport::default();
        for (category, item) in sample_catalog() {
            match self.insert_item(category, &item).await? {
                Some(_) => report.inserted += 1,
                None => report.duplicates += 1,
            }
        }
        tracing::info!(
            "Seeded catalog: {} inserted, {} already present",
            report.inserted,
            report.duplicates
        );
        Ok(report)
    }

    /// Import a JSON array of crawler records.
    ///
    /// Records with an unknown or missing category, or an empty title, are
    /// skipped and counted rather than aborting the import.
    pub async fn import_json<P: AsRef<Path>>(
        &self,
        path: P,
        default_category: Option<Category>,
    ) -> Result<ImportReport> {
        let raw = tokio::fs::read_to_string(path.as_ref())
            .await
            .with_context(|| format!("Failed to read {}", path.as_ref().display()))?;
        let records: Vec<ImportRecord> = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse {}", path.as_ref().display()))?;

        let mut report = ImportReport::default();
        for record in records {
            let category = match record.category.as_deref() {
                Some(name) => Category::parse(name),
                None => default_category,
            };
            let Some(category) = category else {
                tracing::warn!("Skipping '{}': no usable category", record.item.title);
                report.skipped += 1;
                continue;
            };
            if record.item.title.trim().is_empty() {
                report.skipped += 1;
                continue;
            }
            match self.insert_item(category, &record.item).await? {
                Some(_) => report.inserted += 1,
                None => report.duplicates += 1,
            }
        }

        tracing::info!(
            "Imported {}: {} inserted, {} duplicates, {} skipped",
            path.as_ref().display(),
            report.inserted,
            report.duplicates,
            report.skipped
        );
        Ok(report)
    }
}
