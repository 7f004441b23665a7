use std::collections::BTreeMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;

use super::{GameStore, PutCondition, ScanFilter, ScanPage, StoreError, StoreItem};

/// In-process store for tests and local development. Keeps items in
/// (pk, sk) order so scans and queries behave like the durable backend.
#[derive(Default)]
pub struct MemoryGameStore {
    items: RwLock<BTreeMap<(String, String), Value>>,
}

impl MemoryGameStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl GameStore for MemoryGameStore {
    async fn get_item(&self, pk: &str, sk: &str) -> Result<Option<StoreItem>, StoreError> {
        let items = self.items.read();
        Ok(items
            .get(&(pk.to_string(), sk.to_string()))
            .map(|attributes| StoreItem::new(pk.to_string(), sk.to_string(), attributes.clone())))
    }

    async fn put_item(&self, item: StoreItem, condition: PutCondition) -> Result<(), StoreError> {
        let mut items = self.items.write();
        let key = (item.pk, item.sk);
        if condition == PutCondition::IfNotExists && items.contains_key(&key) {
            return Err(StoreError::ConditionFailed);
        }
        items.insert(key, item.attributes);
        Ok(())
    }

    async fn query(&self, pk: &str, sk_prefix: &str) -> Result<Vec<StoreItem>, StoreError> {
        let items = self.items.read();
        let mut out = Vec::new();
        for ((item_pk, item_sk), attributes) in items.range((pk.to_string(), String::new())..) {
            if item_pk != pk {
                break;
            }
            if item_sk.starts_with(sk_prefix) {
                out.push(StoreItem::new(
                    item_pk.clone(),
                    item_sk.clone(),
                    attributes.clone(),
                ));
            }
        }
        Ok(out)
    }

    async fn scan(
        &self,
        filter: &ScanFilter,
        page_size: u32,
        cursor: Option<String>,
    ) -> Result<ScanPage, StoreError> {
        let items = self.items.read();
        let mut page = Vec::new();
        for ((item_pk, item_sk), attributes) in items.iter() {
            if !item_pk.starts_with(&filter.pk_prefix) || *item_sk != filter.sk {
                continue;
            }
            if let Some(ref after) = cursor {
                if item_pk <= after {
                    continue;
                }
            }
            page.push(StoreItem::new(
                item_pk.clone(),
                item_sk.clone(),
                attributes.clone(),
            ));
            if page.len() as u32 == page_size {
                break;
            }
        }

        let next_cursor = if page.len() as u32 == page_size {
            page.last().map(|item| item.pk.clone())
        } else {
            None
        };

        Ok(ScanPage {
            items: page,
            next_cursor,
        })
    }
}
