use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::debug;

use super::{CacheError, LockCache};

/// In-process stand-in used when the real cache cannot be constructed.
/// Entries never expire and are lost on restart; it only has to satisfy
/// the request path of a single process.
#[derive(Default)]
pub struct MockLockCache {
    entries: RwLock<HashMap<String, String>>,
}

impl MockLockCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn entry_key(cache_name: &str, key: &str) -> String {
        format!("{}:{}", cache_name, key)
    }
}

#[async_trait]
impl LockCache for MockLockCache {
    async fn get(&self, cache_name: &str, key: &str) -> Result<Option<String>, CacheError> {
        debug!("[MOCK] Getting key {} from cache {}", key, cache_name);
        let entries = self.entries.read();
        Ok(entries.get(&Self::entry_key(cache_name, key)).cloned())
    }

    async fn set(
        &self,
        cache_name: &str,
        key: &str,
        value: &str,
        _ttl: Duration,
    ) -> Result<(), CacheError> {
        debug!(
            "[MOCK] Setting key {} in cache {} to value {}",
            key, cache_name, value
        );
        let mut entries = self.entries.write();
        entries.insert(Self::entry_key(cache_name, key), value.to_string());
        Ok(())
    }

    async fn ping(&self) -> Result<(), CacheError> {
        debug!("[MOCK] Ping successful");
        Ok(())
    }
}
