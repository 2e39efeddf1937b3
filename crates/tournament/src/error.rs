//! Tournament run errors

use bracket_core::{ConfigError, JudgeError};
use thiserror::Error;

use crate::store::StoreError;

/// Errors that stop a tournament run.
///
/// Judge failures other than missing credentials never show up here; they
/// are absorbed into fallback verdicts. Unreadable snapshots on resume are
/// not errors either: the run starts fresh instead.
#[derive(Debug, Error)]
pub enum TournamentError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("judge unavailable: {0}")]
    Judge(#[from] JudgeError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("no items to run a tournament on")]
    NoItems,

    #[error("a judge is required unless running dry")]
    MissingJudge,

    #[error("tournament has not been initialized")]
    NotInitialized,

    #[error("tournament is already initialized")]
    AlreadyInitialized,

    #[error("round {0} was interrupted and cannot be continued in-process")]
    Interrupted(u32),
}
