use crate::ledger::LedgerError;
use crate::types::{ActionId, Address};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TimelockError {
    #[error("not initialized: run 'timelock init'")]
    NotInitialized,

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("invalid address '{0}': expected 0x-prefixed 20-byte hex")]
    InvalidAddress(String),

    #[error("invalid hex '{0}'")]
    InvalidHex(String),

    #[error("invalid label '{0}': must be non-empty and use only letters, digits, '_', '.', ':' or '-'")]
    InvalidLabel(String),

    #[error("invalid value '{0}': expected a decimal wei amount")]
    InvalidValue(String),

    #[error("plan error in action '{label}': {reason}")]
    Plan { label: String, reason: String },

    #[error("plan error: {0}")]
    PlanFile(String),

    #[error("action not found: {0}")]
    ActionNotFound(String),

    #[error("ambiguous action id prefix '{0}'")]
    AmbiguousId(String),

    #[error("action store error: {0}")]
    Store(String),

    #[error(
        "schedule of {id} ({label}) confirmed but the program reports no ready timestamp; \
         re-run schedule once the transaction is visible"
    )]
    ScheduleNotObserved { id: ActionId, label: String },

    #[error("ledger call failed for {id} ({label}: {description}, target {target}): {source}")]
    LedgerAction {
        id: ActionId,
        label: String,
        description: String,
        target: Address,
        #[source]
        source: LedgerError,
    },

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, TimelockError>;
