// Lookup Cache
//
// Optional decorator in front of the resolver. Entries are keyed by
// "{CALL}|{generation id}" and hold the JSON-serialized ResolvedEntity.
// The store is cleared as a whole when a new generation shows up.
//
// Store calls may block (SQLite, or a remote store behind the same trait), so
// each one runs under a timeout. A slow or failing store never fails a lookup:
// the resolver answers directly and the problem is logged.

mod memory;
mod sqlite;

pub use memory::MemoryCacheStore;
pub use sqlite::SqliteCacheStore;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::config::CacheConfig;
use crate::error::Result;
use crate::generation::ReferenceStore;
use crate::model::ResolvedEntity;

/// Key/value store for serialized lookups
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;
    async fn put(&self, key: &str, value: &str) -> Result<()>;
    /// Drop every entry
    async fn clear(&self) -> Result<()>;
}

pub fn cache_key(call: &str, generation: Uuid) -> String {
    format!("{}|{}", crate::callsign::normalize(call), generation)
}

/// Store selected by configuration: SQLite when a URL is set, else memory
pub async fn store_from_config(config: &CacheConfig) -> Result<Arc<dyn CacheStore>> {
    Ok(match &config.sqlite_url {
        Some(url) => Arc::new(SqliteCacheStore::connect(url).await?),
        None => Arc::new(MemoryCacheStore::new()),
    })
}

/// Resolver front end that memoizes current-time lookups
pub struct CachedResolver {
    references: Arc<ReferenceStore>,
    store: Arc<dyn CacheStore>,
    timeout: Duration,
    /// Generation the store's contents belong to
    seen: Mutex<Option<Uuid>>,
}

impl CachedResolver {
    pub fn new(references: Arc<ReferenceStore>, store: Arc<dyn CacheStore>, timeout: Duration) -> Self {
        Self {
            references,
            store,
            timeout,
            seen: Mutex::new(None),
        }
    }

    /// Resolve at the current time, through the cache
    pub async fn resolve(&self, raw: &str) -> Result<ResolvedEntity> {
        let generation = self.references.current();
        let key = cache_key(raw, generation.id());

        if self.sync_generation(generation.id()).await {
            match self.guarded("get", self.store.get(&key)).await {
                Some(Some(value)) => match serde_json::from_str::<ResolvedEntity>(&value) {
                    Ok(resolved) => {
                        log::trace!("cache hit {}", key);
                        return Ok(resolved);
                    }
                    Err(e) => log::warn!("Discarding unreadable cache entry {}: {}", key, e),
                },
                Some(None) => log::trace!("cache miss {}", key),
                None => return generation.resolve(raw),
            }
        }

        let resolved = generation.resolve(raw)?;
        match serde_json::to_string(&resolved) {
            Ok(value) => {
                self.guarded("put", self.store.put(&key, &value)).await;
            }
            Err(e) => log::warn!("Failed to serialize lookup for {}: {}", key, e),
        }
        Ok(resolved)
    }

    /// Historical lookups bypass the cache
    pub async fn resolve_at(&self, raw: &str, at: chrono::DateTime<chrono::Utc>) -> Result<ResolvedEntity> {
        self.references.current().resolve_at(raw, at)
    }

    pub async fn resolve_batch<S: AsRef<str>>(&self, calls: &[S]) -> Vec<Result<ResolvedEntity>> {
        let mut results = Vec::with_capacity(calls.len());
        for call in calls {
            results.push(self.resolve(call.as_ref()).await);
        }
        results
    }

    /// Clear the store the first time a generation is seen. Returns false
    /// when the store could not be cleared and must not be read.
    async fn sync_generation(&self, id: Uuid) -> bool {
        let mut seen = self.seen.lock().await;
        if *seen == Some(id) {
            return true;
        }
        if self.guarded("clear", self.store.clear()).await.is_none() {
            return false;
        }
        if let Some(previous) = *seen {
            log::info!("Reference data changed ({} -> {}), lookup cache cleared", previous, id);
        }
        *seen = Some(id);
        true
    }

    /// Run a store call under the timeout; None on timeout or error
    async fn guarded<T>(&self, op: &str, call: impl Future<Output = Result<T>>) -> Option<T> {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(Ok(value)) => Some(value),
            Ok(Err(e)) => {
                log::warn!("Lookup cache {} failed, resolving directly: {}", op, e);
                None
            }
            Err(_) => {
                log::warn!("Lookup cache {} timed out after {:?}, resolving directly", op, self.timeout);
                None
            }
        }
    }
}
