//! Scheduling and execution of timelocked governance actions.
//!
//! An action (label, target, calldata) gets a deterministic id. It is
//! scheduled on an on-chain timelock program, tracked locally until its
//! buffer elapses, and then executed. The on-chain program is the source of
//! truth; the local store is a cache reconciled against it.

pub mod action;
pub mod clock;
pub mod codec;
pub mod config;
pub mod error;
pub mod io;
pub mod ledger;
pub mod orchestrator;
pub mod paths;
pub mod plan;
pub mod store;
pub mod types;

pub use error::{Result, TimelockError};
