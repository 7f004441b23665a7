use serde::{Deserialize, Serialize};
use uuid::Uuid;

// --- Battle API payloads ---

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartBattleRequest {
    #[serde(default)]
    pub attacker_id: Option<String>,
    /// Omitted (or empty) to request random matchmaking.
    #[serde(default)]
    pub defender_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BattleStartResult {
    pub battle_id: Uuid,
    pub attacker_id: String,
    pub defender_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BattleResultsRequest {
    #[serde(default)]
    pub player_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePlayerRequest {
    pub player_id: String,
    #[serde(default)]
    pub preferred_username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}
