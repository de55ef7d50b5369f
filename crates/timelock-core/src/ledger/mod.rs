//! Ledger Gateway: read/write access to the timelock program.
//!
//! The orchestrator only needs three operations: read the recorded ready
//! timestamp of an action, and submit schedule / execute calls awaited to
//! confirmation. [`JsonRpcGateway`] implements them over HTTP JSON-RPC;
//! tests substitute in-process fakes.

pub mod abi;
pub mod rpc;

pub use rpc::JsonRpcGateway;

use crate::types::{ActionId, Address, Payload, U256};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure of a single gateway call.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum LedgerError {
    /// No answer within the per-call timeout. The call may or may not have
    /// taken effect.
    #[error("timed out: {0}")]
    Timeout(String),

    #[error("transport error: {0}")]
    Transport(String),

    /// The program rejected the call because the buffer has not elapsed.
    #[error("buffer not elapsed: {0}")]
    BufferNotElapsed(String),

    /// The program rejected the call for any other precondition.
    #[error("rejected by program: {0}")]
    Rejected(String),

    #[error("rpc error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("malformed response: {0}")]
    Malformed(String),

    /// Call arguments could not be ABI-encoded; nothing was sent.
    #[error("cannot encode call: {0}")]
    Encoding(String),
}

impl LedgerError {
    /// Timeouts and connectivity failures; safe to retry by re-invoking.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Timeout(_) | Self::Transport(_))
    }
}

/// A transaction that has been mined successfully.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmedTx {
    pub tx_hash: String,
    pub block_number: u64,
}

pub type LedgerResult<T> = std::result::Result<T, LedgerError>;

/// Access to the authoritative timelock program.
///
/// Submit calls return only once the transaction is confirmed (or has
/// definitively failed); a broadcast alone is not success.
pub trait LedgerGateway {
    /// On-chain ready timestamp for `id` in unix seconds; `0` if the program
    /// has no record (never scheduled, or already consumed).
    fn ready_timestamp(&self, id: &ActionId) -> LedgerResult<u64>;

    fn submit_schedule(
        &self,
        target: &Address,
        value: U256,
        payload: &Payload,
        id: &ActionId,
    ) -> LedgerResult<ConfirmedTx>;

    fn submit_execute(
        &self,
        target: &Address,
        value: U256,
        payload: &Payload,
        id: &ActionId,
    ) -> LedgerResult<ConfirmedTx>;
}
