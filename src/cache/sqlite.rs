// SQLite cache store
//
// Single table, shared by every process that points at the same file:
//
// lookup_cache(key TEXT PRIMARY KEY, value TEXT NOT NULL, created_at TEXT NOT NULL)

use async_trait::async_trait;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

use crate::cache::CacheStore;
use crate::error::Result;

pub struct SqliteCacheStore {
    pool: SqlitePool,
}

impl SqliteCacheStore {
    /// Open (creating if needed) the database at `url`, e.g. `sqlite:cache.db`
    pub async fn connect(url: &str) -> Result<Self> {
        // Every connection to :memory: is a separate database
        let in_memory = url.contains(":memory:");
        let url = if in_memory || url.contains("mode=") {
            url.to_string()
        } else if url.contains('?') {
            format!("{}&mode=rwc", url)
        } else {
            format!("{}?mode=rwc", url)
        };

        log::info!("Opening lookup cache at {}", url);
        let pool = SqlitePoolOptions::new()
            .max_connections(if in_memory { 1 } else { 5 })
            .connect(&url)
            .await?;
        Self::with_pool(pool).await
    }

    /// Use an existing pool; creates the cache table if missing
    pub async fn with_pool(pool: SqlitePool) -> Result<Self> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS lookup_cache (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                created_at TEXT NOT NULL
            )",
        )
        .execute(&pool)
        .await?;
        Ok(Self { pool })
    }

    pub async fn len(&self) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM lookup_cache")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

#[async_trait]
impl CacheStore for SqliteCacheStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let value = sqlx::query_scalar::<_, String>("SELECT value FROM lookup_cache WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(value)
    }

    async fn put(&self, key: &str, value: &str) -> Result<()> {
        sqlx::query("INSERT OR REPLACE INTO lookup_cache (key, value, created_at) VALUES (?, ?, ?)")
            .bind(key)
            .bind(value)
            .bind(chrono::Utc::now().format("%Y-%m-%d %H:%M:%S").to_string())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        let result = sqlx::query("DELETE FROM lookup_cache").execute(&self.pool).await?;
        log::debug!("Cleared {} lookup cache entries", result.rows_affected());
        Ok(())
    }
}
