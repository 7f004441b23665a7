use actix_web::{post, web, HttpResponse};
use serde_json::json;
use tracing::info;

use crate::error::BattleError;
use crate::protocol::{BattleResultsRequest, CreatePlayerRequest, StartBattleRequest};
use crate::store::{self, PutCondition, StoreError, StoreItem, PROFILE_SK};
use crate::AppState;

/// POST /battle/start
/// Starts a battle against the given defender, or a randomly selected
/// unlocked one when no defender is named.
#[post("/battle/start")]
pub async fn start_battle(
    state: web::Data<AppState>,
    req_body: web::Json<StartBattleRequest>,
) -> Result<HttpResponse, BattleError> {
    let result = state
        .coordinator
        .start_battle(
            req_body.attacker_id.as_deref(),
            req_body.defender_id.as_deref(),
        )
        .await?;

    info!(
        "Battle {} started: {} attacks {}",
        result.battle_id, result.attacker_id, result.defender_id
    );
    Ok(HttpResponse::Ok().json(result))
}

/// POST /battle/{battle_id}/results
/// Returns the requesting player's rows for one battle.
#[post("/battle/{battle_id}/results")]
pub async fn get_battle_results(
    state: web::Data<AppState>,
    path: web::Path<String>,
    req_body: web::Json<BattleResultsRequest>,
) -> Result<HttpResponse, BattleError> {
    let battle_id = path.into_inner();
    let player_id = match req_body.player_id.as_deref().filter(|id| !id.is_empty()) {
        Some(id) => id,
        None => return Err(BattleError::MissingPlayerId),
    };

    let rows = state
        .store
        .query(&store::player_pk(player_id), &format!("BATTLE#{}", battle_id))
        .await
        .map_err(BattleError::ResultsQuery)?;

    if rows.is_empty() {
        return Err(BattleError::BattleNotFound);
    }

    let results: Vec<serde_json::Value> = rows.into_iter().map(|item| item.attributes).collect();
    Ok(HttpResponse::Ok().json(results))
}

/// POST /admin/players
/// Provisions a player profile, mirroring the account-confirmation hook.
/// The conditional put keeps an existing profile from being overwritten.
#[post("/admin/players")]
pub async fn create_player(
    state: web::Data<AppState>,
    req_body: web::Json<CreatePlayerRequest>,
) -> Result<HttpResponse, BattleError> {
    let req = req_body.into_inner();
    if req.player_id.trim().is_empty() {
        return Err(BattleError::MissingPlayerId);
    }

    let now = chrono::Utc::now();
    let profile = json!({
        "preferredUsername": req
            .preferred_username
            .unwrap_or_else(|| format!("user_{}", req.player_id)),
        "email": req.email,
        "gold": 1000,
        "trophy": 0,
        "experience": 0,
        "createdAt": now,
        "updatedAt": now,
    });

    let item = StoreItem::new(
        store::player_pk(&req.player_id),
        PROFILE_SK.to_string(),
        profile,
    );
    match state.store.put_item(item, PutCondition::IfNotExists).await {
        Ok(()) => {
            info!("Player profile created for {}", req.player_id);
            Ok(HttpResponse::Created().json(json!({ "playerId": req.player_id })))
        }
        Err(StoreError::ConditionFailed) => Err(BattleError::PlayerAlreadyExists),
        Err(e) => Err(BattleError::ProfileWrite(e)),
    }
}
