//! Delayed governance-action orchestration.
//!
//! [`Orchestrator`] ties an [`ActionStore`], a [`LedgerGateway`] and a
//! [`Clock`] together and exposes the three operations an operator runs:
//!
//! ```text
//! schedule()       Scheduler   store → ledger (read, maybe write) → store
//! reconcile()      Reconciler  store → ledger (read only)        → store
//! execute_ready()  Executor    store → ledger (read, write)      → store
//! ```
//!
//! Each operation performs its own `load → mutate → save` cycle and holds no
//! state between calls, so separate invocations (or separate processes run
//! one after another) observe each other's results through the store.

mod executor;
mod reconciler;
mod scheduler;


pub use executor::ExecutionReport;
pub use reconciler::ReconcileReport;

use crate::action::GovernanceAction;
use crate::clock::Clock;
use crate::error::TimelockError;
use crate::ledger::{LedgerError, LedgerGateway};
use crate::store::ActionStore;

pub struct Orchestrator<'a> {
    store: &'a dyn ActionStore,
    ledger: &'a dyn LedgerGateway,
    clock: &'a dyn Clock,
}

impl<'a> Orchestrator<'a> {
    pub fn new(
        store: &'a dyn ActionStore,
        ledger: &'a dyn LedgerGateway,
        clock: &'a dyn Clock,
    ) -> Self {
        Self {
            store,
            ledger,
            clock,
        }
    }
}

/// Attach action context to a gateway error.
pub(crate) fn ledger_err(action: &GovernanceAction, source: LedgerError) -> TimelockError {
    TimelockError::LedgerAction {
        id: action.id,
        label: action.label.clone(),
        description: action.description.clone(),
        target: action.target,
        source,
    }
}
