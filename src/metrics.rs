use lazy_static::lazy_static;
use prometheus::{opts, IntCounter, IntGauge, Registry};

lazy_static! {
    /// The total number of battles started successfully.
    pub static ref BATTLES_STARTED_TOTAL: IntCounter =
        IntCounter::with_opts(opts!("battles_started_total", "Total number of battles started")).unwrap();

    /// Specific-defender requests rejected because the defender held a lock.
    pub static ref DEFENDER_LOCK_CONFLICTS_TOTAL: IntCounter =
        IntCounter::with_opts(opts!("defender_lock_conflicts_total", "Battle starts rejected due to an existing defender lock")).unwrap();

    /// Random-path requests that exhausted the scan without a defender.
    pub static ref OPPONENT_SCAN_EXHAUSTED_TOTAL: IntCounter =
        IntCounter::with_opts(opts!("opponent_scan_exhausted_total", "Random matchmaking scans that found no unlocked opponent")).unwrap();

    /// 1 while the in-process mock lock cache is serving requests.
    pub static ref LOCK_CACHE_FALLBACK_ACTIVE: IntGauge =
        IntGauge::with_opts(opts!("lock_cache_fallback_active", "Whether the mock lock cache fallback is active")).unwrap();
}

pub fn register_custom_metrics(registry: &Registry) -> Result<(), prometheus::Error> {
    registry.register(Box::new(BATTLES_STARTED_TOTAL.clone()))?;
    registry.register(Box::new(DEFENDER_LOCK_CONFLICTS_TOTAL.clone()))?;
    registry.register(Box::new(OPPONENT_SCAN_EXHAUSTED_TOTAL.clone()))?;
    registry.register(Box::new(LOCK_CACHE_FALLBACK_ACTIVE.clone()))?;
    Ok(())
}
