use thiserror::Error;

use crate::domain::{MatchId, PlayerId};

/// Failures surfaced by the matchmaking and rating operations.
///
/// Every variant except `PersistenceFailure` is raised before any state is
/// touched, so callers can retry or correct their input freely.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Not enough available players: {available} available, {required} required")]
    InsufficientPlayers { available: usize, required: usize },

    #[error("Unknown player: {0}")]
    UnknownPlayer(PlayerId),

    #[error("Unknown match: {0}")]
    UnknownMatch(MatchId),

    #[error("Round {0} has no matches")]
    UnknownRound(u32),

    #[error("Invalid score {score1}-{score2}: scores must be non-negative")]
    InvalidScore { score1: i32, score2: i32 },

    #[error("Match {0} is already completed")]
    AlreadyCompleted(MatchId),

    #[error("Match {0} is not completed")]
    NotCompleted(MatchId),

    #[error("Invalid teams: {0}")]
    InvalidTeams(String),

    #[error("Team split needs exactly 4 distinct players, got {0}")]
    InvalidSplitInput(usize),

    #[error("Invalid player: {0}")]
    InvalidPlayer(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Storage failure: {0:#}")]
    PersistenceFailure(#[source] anyhow::Error),
}

pub type EngineResult<T> = Result<T, EngineError>;

impl EngineError {
    /// Errors the caller can fix by changing input (as opposed to storage trouble).
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, EngineError::PersistenceFailure(_))
    }
}

/// Wrap a storage result so it surfaces as `PersistenceFailure`
pub fn with_store_context<T>(result: anyhow::Result<T>, operation: &str) -> EngineResult<T> {
    result.map_err(|e| EngineError::PersistenceFailure(e.context(store_context(operation))))
}

/// Add context to storage errors
pub fn store_context(operation: &str) -> String {
    format!("Failed to {}", operation)
}
