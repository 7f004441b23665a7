use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::{lock_key, records::BattleRecordWriter, scanner::OpponentScanner, LOCK_VALUE};
use crate::cache::LockCache;
use crate::env::{BattleSettings, LockCacheSettings};
use crate::error::BattleError;
use crate::metrics;
use crate::protocol::BattleStartResult;
use crate::store::GameStore;

/// Orchestrates defender selection, advisory locking and battle-record
/// persistence for one battle-start request. Stateless across requests;
/// the injected store and cache handles live for the process.
pub struct BattleCoordinator {
    store: Arc<dyn GameStore>,
    cache: Arc<dyn LockCache>,
    cache_name: String,
    lock_ttl: Duration,
    scan_page_size: u32,
}

impl BattleCoordinator {
    pub fn new(
        store: Arc<dyn GameStore>,
        cache: Arc<dyn LockCache>,
        lock_cache: &LockCacheSettings,
        battle: &BattleSettings,
    ) -> Self {
        Self {
            store,
            cache,
            cache_name: lock_cache.cache_name.clone(),
            lock_ttl: Duration::from_secs(battle.lock_ttl_seconds),
            scan_page_size: battle.scan_page_size,
        }
    }

    pub async fn start_battle(
        &self,
        attacker_id: Option<&str>,
        defender_id: Option<&str>,
    ) -> Result<BattleStartResult, BattleError> {
        let attacker_id = match attacker_id {
            Some(id) if !id.trim().is_empty() => id,
            _ => return Err(BattleError::MissingAttackerId),
        };

        // An empty defenderId means "pick one for me", same as omitting it.
        match defender_id.filter(|id| !id.is_empty()) {
            Some(defender_id) => {
                info!("Handling specific defender: {}", defender_id);
                self.start_with_defender(attacker_id, defender_id).await
            }
            None => {
                info!(
                    "Handling random defender selection for attacker: {}",
                    attacker_id
                );
                self.start_with_random_defender(attacker_id).await
            }
        }
    }

    async fn start_with_defender(
        &self,
        attacker_id: &str,
        defender_id: &str,
    ) -> Result<BattleStartResult, BattleError> {
        if self.is_defender_locked(defender_id).await {
            metrics::DEFENDER_LOCK_CONFLICTS_TOTAL.inc();
            return Err(BattleError::DefenderAlreadyInBattle);
        }

        self.lock_defender(defender_id).await;
        self.create_battle(attacker_id, defender_id).await
    }

    async fn start_with_random_defender(
        &self,
        attacker_id: &str,
    ) -> Result<BattleStartResult, BattleError> {
        let scanner = OpponentScanner::new(
            self.store.as_ref(),
            self.cache.as_ref(),
            &self.cache_name,
            self.scan_page_size,
        );
        let defender_id = match scanner.find_unlocked_opponent(attacker_id).await? {
            Some(id) => id,
            None => {
                metrics::OPPONENT_SCAN_EXHAUSTED_TOTAL.inc();
                return Err(BattleError::NoAvailableOpponents);
            }
        };

        self.lock_defender(&defender_id).await;
        self.create_battle(attacker_id, &defender_id).await
    }

    /// Lock check preceding a specific-defender battle. A cache read
    /// failure counts as "not locked": availability wins over strict
    /// exclusion while the cache is unreachable.
    async fn is_defender_locked(&self, defender_id: &str) -> bool {
        let key = lock_key(defender_id);
        debug!("Checking lock for defender: {} with key: {}", defender_id, key);
        match self.cache.get(&self.cache_name, &key).await {
            Ok(value) => {
                let locked = value.is_some();
                debug!("Lock check result: {}", if locked { "locked" } else { "not locked" });
                locked
            }
            Err(e) => {
                warn!("Error checking lock, assuming not locked: {}", e);
                false
            }
        }
    }

    /// Best-effort lock set; failure never blocks battle creation.
    async fn lock_defender(&self, defender_id: &str) {
        let key = lock_key(defender_id);
        debug!("Setting lock for defender: {}", defender_id);
        if let Err(e) = self
            .cache
            .set(&self.cache_name, &key, LOCK_VALUE, self.lock_ttl)
            .await
        {
            warn!(
                "Failed to set lock for defender {}, continuing anyway: {}",
                defender_id, e
            );
        }
    }

    async fn create_battle(
        &self,
        attacker_id: &str,
        defender_id: &str,
    ) -> Result<BattleStartResult, BattleError> {
        let battle_id = Uuid::new_v4();
        let start_time = Utc::now();

        BattleRecordWriter::new(self.store.as_ref())
            .create_battle(attacker_id, defender_id, battle_id, start_time)
            .await?;

        metrics::BATTLES_STARTED_TOTAL.inc();
        Ok(BattleStartResult {
            battle_id,
            attacker_id: attacker_id.to_string(),
            defender_id: defender_id.to_string(),
        })
    }
}
