use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tracing::warn;

use crate::env::LockCacheSettings;
use crate::metrics;
use crate::secrets::{SecretError, SecretProvider};

pub mod mock;
pub mod redis;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache backend error: {0}")]
    Backend(#[from] ::redis::RedisError),

    #[error("cache credential error: {0}")]
    Credential(#[from] SecretError),
}

/// Advisory-lock cache contract, shared by the real client and the
/// in-process fallback. Values are strings; the TTL applies on set.
#[async_trait]
pub trait LockCache: Send + Sync {
    async fn get(&self, cache_name: &str, key: &str) -> Result<Option<String>, CacheError>;

    async fn set(
        &self,
        cache_name: &str,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> Result<(), CacheError>;

    async fn ping(&self) -> Result<(), CacheError>;
}

/// Builds the real lock-cache client, falling back to the in-process mock
/// when credentials or connectivity are unavailable. Matchmaking keeps
/// working in that case, without cross-process lock exclusivity.
pub async fn connect_lock_cache(
    settings: &LockCacheSettings,
    secrets: &dyn SecretProvider,
) -> Arc<dyn LockCache> {
    match redis::RedisLockCache::connect(settings, secrets).await {
        Ok(client) => {
            metrics::LOCK_CACHE_FALLBACK_ACTIVE.set(0);
            Arc::new(client)
        }
        Err(e) => {
            warn!("Failed to initialize lock cache client, using mock: {}", e);
            metrics::LOCK_CACHE_FALLBACK_ACTIVE.set(1);
            Arc::new(mock::MockLockCache::new())
        }
    }
}
