use tracing::{debug, info, warn};

use super::lock_key;
use crate::cache::LockCache;
use crate::error::BattleError;
use crate::store::{self, GameStore, ScanFilter, PLAYER_PK_PREFIX, PROFILE_SK};

/// Pages through player profiles looking for a defender who is not the
/// attacker and holds no lock entry. First unlocked candidate in scan
/// order wins.
pub struct OpponentScanner<'a> {
    store: &'a dyn GameStore,
    cache: &'a dyn LockCache,
    cache_name: &'a str,
    page_size: u32,
}

impl<'a> OpponentScanner<'a> {
    pub fn new(
        store: &'a dyn GameStore,
        cache: &'a dyn LockCache,
        cache_name: &'a str,
        page_size: u32,
    ) -> Self {
        Self {
            store,
            cache,
            cache_name,
            page_size,
        }
    }

    /// Returns `None` once pagination is exhausted without an unlocked
    /// candidate. Store errors abort the search; a cache read error only
    /// disqualifies the candidate it happened on.
    pub async fn find_unlocked_opponent(
        &self,
        attacker_id: &str,
    ) -> Result<Option<String>, BattleError> {
        let filter = ScanFilter {
            pk_prefix: PLAYER_PK_PREFIX.to_string(),
            sk: PROFILE_SK.to_string(),
        };
        let attacker_pk = store::player_pk(attacker_id);
        let mut cursor: Option<String> = None;

        loop {
            debug!("Scanning game store for player profiles");
            let page = self
                .store
                .scan(&filter, self.page_size, cursor)
                .await
                .map_err(BattleError::OpponentScan)?;

            let candidate_count = page
                .items
                .iter()
                .filter(|item| item.pk != attacker_pk)
                .count();
            debug!("Found {} potential opponents in page", candidate_count);

            for item in &page.items {
                if item.pk == attacker_pk {
                    continue;
                }
                let Some(candidate) = item.pk.strip_prefix(PLAYER_PK_PREFIX) else {
                    continue;
                };

                let key = lock_key(candidate);
                debug!("Checking lock for player: {} with key: {}", candidate, key);
                match self.cache.get(self.cache_name, &key).await {
                    Ok(None) => {
                        info!("Found unlocked player: {}", candidate);
                        return Ok(Some(candidate.to_string()));
                    }
                    Ok(Some(_)) => {}
                    Err(e) => {
                        warn!("Error checking cache for player {}, skipping: {}", candidate, e);
                    }
                }
            }

            cursor = page.next_cursor;
            if cursor.is_none() {
                debug!("No more players to check");
                return Ok(None);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::time::Duration;

    use async_trait::async_trait;
    use parking_lot::Mutex;
    use serde_json::json;

    use super::*;
    use crate::cache::mock::MockLockCache;
    use crate::cache::CacheError;
    use crate::store::memory::MemoryGameStore;
    use crate::store::{PutCondition, ScanPage, StoreError, StoreItem};
    use crate::battle::LOCK_VALUE;

    const CACHE: &str = "test-cache";

    async fn seed_profiles(store: &MemoryGameStore, ids: &[&str]) {
        for id in ids {
            store
                .put_item(
                    StoreItem::new(
                        store::player_pk(id),
                        PROFILE_SK.to_string(),
                        json!({ "gold": 100 }),
                    ),
                    PutCondition::None,
                )
                .await
                .unwrap();
        }
    }

    async fn lock_player(cache: &MockLockCache, id: &str) {
        cache
            .set(CACHE, &lock_key(id), LOCK_VALUE, Duration::from_secs(180))
            .await
            .unwrap();
    }

    /// Delegates to the mock but remembers every lock key it was asked
    /// about.
    struct RecordingLockCache {
        inner: MockLockCache,
        queried: Mutex<Vec<String>>,
    }

    impl RecordingLockCache {
        fn new() -> Self {
            Self {
                inner: MockLockCache::new(),
                queried: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl LockCache for RecordingLockCache {
        async fn get(&self, cache_name: &str, key: &str) -> Result<Option<String>, CacheError> {
            self.queried.lock().push(key.to_string());
            self.inner.get(cache_name, key).await
        }

        async fn set(
            &self,
            cache_name: &str,
            key: &str,
            value: &str,
            ttl: Duration,
        ) -> Result<(), CacheError> {
            self.inner.set(cache_name, key, value, ttl).await
        }

        async fn ping(&self) -> Result<(), CacheError> {
            self.inner.ping().await
        }
    }

    /// Fails lock reads for one specific player.
    struct FaultyLockCache {
        inner: MockLockCache,
        failing_key: String,
    }

    #[async_trait]
    impl LockCache for FaultyLockCache {
        async fn get(&self, cache_name: &str, key: &str) -> Result<Option<String>, CacheError> {
            if key == self.failing_key {
                return Err(CacheError::Backend(::redis::RedisError::from((
                    ::redis::ErrorKind::IoError,
                    "simulated cache outage",
                ))));
            }
            self.inner.get(cache_name, key).await
        }

        async fn set(
            &self,
            cache_name: &str,
            key: &str,
            value: &str,
            ttl: Duration,
        ) -> Result<(), CacheError> {
            self.inner.set(cache_name, key, value, ttl).await
        }

        async fn ping(&self) -> Result<(), CacheError> {
            self.inner.ping().await
        }
    }

    struct BrokenStore;

    #[async_trait]
    impl GameStore for BrokenStore {
        async fn get_item(&self, _pk: &str, _sk: &str) -> Result<Option<StoreItem>, StoreError> {
            Err(StoreError::Database(sqlx::Error::PoolClosed))
        }

        async fn put_item(
            &self,
            _item: StoreItem,
            _condition: PutCondition,
        ) -> Result<(), StoreError> {
            Err(StoreError::Database(sqlx::Error::PoolClosed))
        }

        async fn query(&self, _pk: &str, _sk_prefix: &str) -> Result<Vec<StoreItem>, StoreError> {
            Err(StoreError::Database(sqlx::Error::PoolClosed))
        }

        async fn scan(
            &self,
            _filter: &ScanFilter,
            _page_size: u32,
            _cursor: Option<String>,
        ) -> Result<ScanPage, StoreError> {
            Err(StoreError::Database(sqlx::Error::PoolClosed))
        }
    }

    #[tokio::test]
    async fn never_returns_the_attacker() {
        let store = MemoryGameStore::new();
        seed_profiles(&store, &["p1"]).await;
        let cache = MockLockCache::new();

        let scanner = OpponentScanner::new(&store, &cache, CACHE, 5);
        let found = scanner.find_unlocked_opponent("p1").await.unwrap();
        assert_eq!(found, None);
    }

    #[tokio::test]
    async fn skips_locked_players_and_returns_first_unlocked() {
        let store = MemoryGameStore::new();
        seed_profiles(&store, &["p1", "p2", "p3"]).await;
        let cache = MockLockCache::new();
        lock_player(&cache, "p2").await;

        let scanner = OpponentScanner::new(&store, &cache, CACHE, 5);
        let found = scanner.find_unlocked_opponent("p1").await.unwrap();
        assert_eq!(found.as_deref(), Some("p3"));
    }

    #[tokio::test]
    async fn pagination_visits_every_candidate_exactly_once() {
        // 13 candidates with page size 5: two full pages plus a remainder.
        let store = MemoryGameStore::new();
        let ids: Vec<String> = (0..14).map(|i| format!("p{:02}", i)).collect();
        let refs: Vec<&str> = ids.iter().map(String::as_str).collect();
        seed_profiles(&store, &refs).await;

        let cache = RecordingLockCache::new();
        // Lock everyone so the scan has to walk the full key space.
        for id in &ids {
            if id != "p00" {
                lock_player(&cache.inner, id).await;
            }
        }

        let scanner = OpponentScanner::new(&store, &cache, CACHE, 5);
        let found = scanner.find_unlocked_opponent("p00").await.unwrap();
        assert_eq!(found, None);

        let queried = cache.queried.lock().clone();
        assert_eq!(queried.len(), 13);
        let unique: HashSet<_> = queried.iter().collect();
        assert_eq!(unique.len(), 13);
        assert!(!queried.contains(&lock_key("p00")));
    }

    #[tokio::test]
    async fn cache_error_skips_only_that_candidate() {
        let store = MemoryGameStore::new();
        seed_profiles(&store, &["p1", "p2", "p3"]).await;
        let cache = FaultyLockCache {
            inner: MockLockCache::new(),
            failing_key: lock_key("p2"),
        };

        let scanner = OpponentScanner::new(&store, &cache, CACHE, 5);
        let found = scanner.find_unlocked_opponent("p1").await.unwrap();
        assert_eq!(found.as_deref(), Some("p3"));
    }

    #[tokio::test]
    async fn store_error_aborts_the_search() {
        let store = BrokenStore;
        let cache = MockLockCache::new();

        let scanner = OpponentScanner::new(&store, &cache, CACHE, 5);
        let err = scanner.find_unlocked_opponent("p1").await.unwrap_err();
        assert!(matches!(err, BattleError::OpponentScan(_)));
    }
}
