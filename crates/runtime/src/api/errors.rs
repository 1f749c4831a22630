//! Unified error types surfaced by the runtime API.
//!
//! Rule refusals are not errors here: they travel as [`FailureReason`] values
//! inside successful replies. `RuntimeError` covers worker coordination.
use thiserror::Error;
use tokio::sync::oneshot;

use combat_core::{CombatantId, ErrorSeverity, FailureReason, RuleError};

pub type Result<T> = std::result::Result<T, RuntimeError>;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("simulation worker command channel closed")]
    CommandChannelClosed,

    #[error("simulation worker reply channel closed")]
    ReplyChannelClosed(#[source] oneshot::error::RecvError),

    #[error("simulation worker join failed")]
    WorkerJoin(#[source] tokio::task::JoinError),

    #[error("runtime requires a catalog to be configured before building")]
    MissingCatalog,

    #[error("combatant {0} does not exist")]
    UnknownCombatant(CombatantId),

    #[error("request payload rejected: {0}")]
    InvalidPayload(String),

    #[error("combat rule refused the operation: {0}")]
    Rule(#[from] FailureReason),
}

impl RuleError for RuntimeError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            RuntimeError::CommandChannelClosed
            | RuntimeError::ReplyChannelClosed(_)
            | RuntimeError::WorkerJoin(_) => ErrorSeverity::Fatal,
            RuntimeError::MissingCatalog => ErrorSeverity::Internal,
            RuntimeError::UnknownCombatant(_) | RuntimeError::InvalidPayload(_) => {
                ErrorSeverity::Validation
            }
            RuntimeError::Rule(reason) => reason.severity(),
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            RuntimeError::CommandChannelClosed => "command-channel-closed",
            RuntimeError::ReplyChannelClosed(_) => "reply-channel-closed",
            RuntimeError::WorkerJoin(_) => "worker-join",
            RuntimeError::MissingCatalog => "missing-catalog",
            RuntimeError::UnknownCombatant(_) => "unknown-combatant",
            RuntimeError::InvalidPayload(_) => "invalid-payload",
            RuntimeError::Rule(reason) => reason.code(),
        }
    }
}
