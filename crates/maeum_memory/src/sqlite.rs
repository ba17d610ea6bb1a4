use anyhow::{Context, Result};
use maeum_core::Category;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Pool, Sqlite,
};
use std::path::Path;
use std::str::FromStr;

/// SQLite-backed store for the catalog, diaries and conversation logs.
///
/// Cheap to clone; all clones share one connection pool.
#[derive(Clone)]
pub struct SqliteStore {
    pub(crate) pool: Pool<Sqlite>,
}

impl SqliteStore {
    /// Open (creating if needed) the database at `db_path`. `":memory:"` gives
    /// a private in-memory database kept alive for the store's lifetime.
    pub async fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let path = db_path.as_ref();
        let in_memory = path.as_os_str() == ":memory:";

        let options = if in_memory {
            SqliteConnectOptions::from_str("sqlite::memory:")?
        } else {
            SqliteConnectOptions::new()
                .filename(path)
                .create_if_missing(true)
        };

        let mut pool_options = SqlitePoolOptions::new().after_connect(|conn, _meta| {
            Box::pin(async move {
                sqlx::query("PRAGMA foreign_keys = ON").execute(conn).await?;
                Ok(())
            })
        });
        if in_memory {
            // Every pooled connection must see the same database.
            pool_options = pool_options
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None);
        }

        let pool = pool_options
            .connect_with(options)
            .await
            .with_context(|| format!("Failed to connect to SQLite database {}", path.display()))?;

        let store = Self { pool };
        store.migrate().await?;
        tracing::debug!("SQLite store ready at {}", path.display());
        Ok(store)
    }

    async fn migrate(&self) -> Result<()> {
        // === Catalog: one table per category ===
        for category in Category::ALL {
            let image_column = category
                .image_column()
                .map(|col| format!(",\n                {} TEXT", col))
                .unwrap_or_default();
            let ddl = format!(
                r#"
                CREATE TABLE IF NOT EXISTS {table} (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL UNIQUE,
                url TEXT NOT NULL DEFAULT '',
                emotion_tags TEXT NOT NULL DEFAULT ''{image_column}
                );
                "#,
                table = category.table(),
                image_column = image_column,
            );
            sqlx::query(&ddl)
                .execute(&self.pool)
                .await
                .with_context(|| format!("Failed to create {} table", category.table()))?;
        }

        // === Diaries ===
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS diaries (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id TEXT NOT NULL,
                content TEXT NOT NULL,
                emotion TEXT NOT NULL,
                confidence REAL NOT NULL,
                created_at INTEGER NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await
        .context("Failed to create diaries table")?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_diaries_user ON diaries(user_id)")
            .execute(&self.pool)
            .await
            .context("Failed to create diaries user index")?;

        // === Conversation logs (owned by a diary) ===
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS conversation_logs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                diary_id INTEGER NOT NULL,
                user_input TEXT NOT NULL,
                response TEXT NOT NULL,
                mode TEXT NOT NULL CHECK (mode IN ('T', 'F')),
                audio_url TEXT,
                created_at INTEGER NOT NULL,
                FOREIGN KEY(diary_id) REFERENCES diaries(id) ON DELETE CASCADE
            );
            "#,
        )
        .execute(&self.pool)
        .await
        .context("Failed to create conversation_logs table")?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_conversation_logs_diary ON conversation_logs(diary_id, created_at)",
        )
        .execute(&self.pool)
        .await
        .context("Failed to create conversation_logs index")?;

        Ok(())
    }
}

/// Milliseconds since the epoch; the ordering key for diaries and logs.
pub(crate) fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
