use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::BattleError;
use crate::store::{self, GameStore, PutCondition, StoreItem};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Attacker,
    Defender,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Attacker => "ATTACKER",
            Role::Defender => "DEFENDER",
        }
    }
}

/// One side's durable row for a battle.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BattleRecord {
    pub battle_id: Uuid,
    pub role: Role,
    pub opponent_id: String,
    pub start_time: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub fn battle_sk(battle_id: &Uuid, role: Role) -> String {
    format!("BATTLE#{}#{}", battle_id, role.as_str())
}

/// Persists the attacker and defender rows for a new battle. The two puts
/// are sequential, not transactional: a crash between them leaves a
/// one-sided battle row behind.
pub struct BattleRecordWriter<'a> {
    store: &'a dyn GameStore,
}

impl<'a> BattleRecordWriter<'a> {
    pub fn new(store: &'a dyn GameStore) -> Self {
        Self { store }
    }

    pub async fn create_battle(
        &self,
        attacker_id: &str,
        defender_id: &str,
        battle_id: Uuid,
        start_time: DateTime<Utc>,
    ) -> Result<(), BattleError> {
        info!(
            "Creating battle rows for battle {} between {} and {}",
            battle_id, attacker_id, defender_id
        );

        let rows = [
            (attacker_id, Role::Attacker, defender_id),
            (defender_id, Role::Defender, attacker_id),
        ];

        for (player_id, role, opponent_id) in rows {
            let record = BattleRecord {
                battle_id,
                role,
                opponent_id: opponent_id.to_string(),
                start_time,
                created_at: start_time,
                updated_at: start_time,
            };
            let attributes = serde_json::to_value(&record).map_err(|e| {
                BattleError::Internal(format!("failed to serialize battle record: {}", e))
            })?;

            debug!("Writing {} row for battle {}", role.as_str(), battle_id);
            let item = StoreItem::new(
                store::player_pk(player_id),
                battle_sk(&battle_id, role),
                attributes,
            );
            self.store
                .put_item(item, PutCondition::None)
                .await
                .map_err(BattleError::RecordWrite)?;
        }

        Ok(())
    }
}
