use std::time::Duration;

use ::redis::{aio::ConnectionManager, AsyncCommands};
use async_trait::async_trait;
use tracing::{info, warn};

use super::{CacheError, LockCache};
use crate::env::LockCacheSettings;
use crate::secrets::{self, SecretProvider};

/// Redis-backed lock cache. The connection manager reconnects on its own,
/// so the handle is cheap to clone per call.
pub struct RedisLockCache {
    conn: ConnectionManager,
}

impl RedisLockCache {
    pub async fn connect(
        settings: &LockCacheSettings,
        secrets_provider: &dyn SecretProvider,
    ) -> Result<Self, CacheError> {
        let api_key = secrets::fetch_api_key(secrets_provider, &settings.secret_id).await?;

        let url = format!("redis://:{}@{}:{}/", api_key, settings.host, settings.port);
        let client = ::redis::Client::open(url)?;
        let conn = ConnectionManager::new(client).await?;

        let cache = Self { conn };

        // Connectivity probe; a failed ping is not fatal.
        match cache.ping().await {
            Ok(()) => info!(
                "Lock cache connected: {}:{}",
                settings.host, settings.port
            ),
            Err(e) => warn!("Lock cache ping failed, continuing: {}", e),
        }

        Ok(cache)
    }

    fn entry_key(cache_name: &str, key: &str) -> String {
        format!("{}:{}", cache_name, key)
    }
}

#[async_trait]
impl LockCache for RedisLockCache {
    async fn get(&self, cache_name: &str, key: &str) -> Result<Option<String>, CacheError> {
        let mut conn = self.conn.clone();
        let value: Option<String> = conn.get(Self::entry_key(cache_name, key)).await?;
        Ok(value)
    }

    async fn set(
        &self,
        cache_name: &str,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        conn.set_ex::<_, _, ()>(Self::entry_key(cache_name, key), value, ttl.as_secs() as usize)
            .await?;
        Ok(())
    }

    async fn ping(&self) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        ::redis::cmd("PING").query_async::<_, String>(&mut conn).await?;
        Ok(())
    }
}
