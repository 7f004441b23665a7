use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

pub mod memory;
pub mod postgres;

pub const PLAYER_PK_PREFIX: &str = "PLAYER#";
pub const PROFILE_SK: &str = "PROFILE#";

pub fn player_pk(player_id: &str) -> String {
    format!("{}{}", PLAYER_PK_PREFIX, player_id)
}

/// Partition/sort keyed item. Attributes travel as loose JSON, the shape
/// they are stored and served in.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreItem {
    pub pk: String,
    pub sk: String,
    pub attributes: Value,
}

impl StoreItem {
    pub fn new(pk: String, sk: String, attributes: Value) -> Self {
        Self { pk, sk, attributes }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PutCondition {
    None,
    /// Reject the write when an item with the same (pk, sk) exists.
    IfNotExists,
}

/// Scan selector: partition keys starting with `pk_prefix` whose sort key
/// equals `sk`.
#[derive(Debug, Clone)]
pub struct ScanFilter {
    pub pk_prefix: String,
    pub sk: String,
}

#[derive(Debug, Clone, Default)]
pub struct ScanPage {
    pub items: Vec<StoreItem>,
    /// Continuation cursor; `None` once the scan is exhausted.
    pub next_cursor: Option<String>,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("item already exists")]
    ConditionFailed,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration failed: {0}")]
    Migration(String),
}

/// Key-sorted entity store holding player profiles and battle records.
#[async_trait]
pub trait GameStore: Send + Sync {
    async fn get_item(&self, pk: &str, sk: &str) -> Result<Option<StoreItem>, StoreError>;

    async fn put_item(&self, item: StoreItem, condition: PutCondition) -> Result<(), StoreError>;

    /// All items in one partition whose sort key starts with `sk_prefix`,
    /// ordered by sort key.
    async fn query(&self, pk: &str, sk_prefix: &str) -> Result<Vec<StoreItem>, StoreError>;

    /// One page of a prefix-filtered scan across partitions. Pass the
    /// returned cursor back in to continue.
    async fn scan(
        &self,
        filter: &ScanFilter,
        page_size: u32,
        cursor: Option<String>,
    ) -> Result<ScanPage, StoreError>;
}
