pub mod sqlite;
pub mod catalog;
pub mod diary;
pub mod conversation_log;
pub mod matcher;
pub mod seed;

pub use sqlite::SqliteStore;
pub use diary::Diary;
pub use conversation_log::LoggedTurn;
pub use matcher::CatalogMatcher;
pub use seed::{sample_catalog, ImportReport};
