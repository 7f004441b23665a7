use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

use crate::store::StoreError;

/// Unified error type for the battle endpoints.
#[derive(Debug, Error)]
pub enum BattleError {
    #[error("attackerId is required.")]
    MissingAttackerId,

    #[error("PlayerId is required.")]
    MissingPlayerId,

    #[error("Defender is already in a battle.")]
    DefenderAlreadyInBattle,

    #[error("No available opponents.")]
    NoAvailableOpponents,

    #[error("Battle not found.")]
    BattleNotFound,

    #[error("Player already exists.")]
    PlayerAlreadyExists,

    #[error("Failed to fetch players from the game store: {0}")]
    OpponentScan(#[source] StoreError),

    #[error("Failed to create battle in database: {0}")]
    RecordWrite(#[source] StoreError),

    #[error("Failed to query battle results: {0}")]
    ResultsQuery(#[source] StoreError),

    #[error("Failed to create player profile: {0}")]
    ProfileWrite(#[source] StoreError),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl ResponseError for BattleError {
    fn status_code(&self) -> StatusCode {
        match self {
            BattleError::MissingAttackerId | BattleError::MissingPlayerId => {
                StatusCode::BAD_REQUEST
            }
            BattleError::DefenderAlreadyInBattle | BattleError::PlayerAlreadyExists => {
                StatusCode::CONFLICT
            }
            BattleError::NoAvailableOpponents | BattleError::BattleNotFound => {
                StatusCode::NOT_FOUND
            }
            BattleError::OpponentScan(_)
            | BattleError::RecordWrite(_)
            | BattleError::ResultsQuery(_)
            | BattleError::ProfileWrite(_)
            | BattleError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        tracing::error!("{}", self);

        // 4xx bodies carry a static message; 5xx keep the wrapped cause
        // string for diagnostics.
        HttpResponse::build(self.status_code()).json(json!({ "message": self.to_string() }))
    }
}
