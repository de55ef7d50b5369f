use serde::Serialize;

use crate::action::{unix, LocalStatus};
use crate::error::Result;
use crate::ledger::LedgerError;
use crate::types::ActionId;

use super::{ledger_err, Orchestrator};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExecutionReport {
    pub executed: Vec<ActionId>,
    /// Buffer not elapsed, either by the fresh read or by the program's
    /// own check at submission time.
    pub still_pending: Vec<ActionId>,
    /// Rejected for a broken precondition; left in `pending` for triage.
    pub failed: Vec<(ActionId, String)>,
    /// No longer recorded on-chain; left for the Reconciler to classify.
    pub vanished: Vec<ActionId>,
}

impl Orchestrator<'_> {
    /// Submit execute calls for every pending action whose buffer has
    /// elapsed, in ascending id order.
    ///
    /// Each action's ready timestamp is read fresh before submission, and
    /// nothing is submitted unless that timestamp is non-zero and not in the
    /// future. The store is saved after every submission outcome. Transient
    /// gateway errors stop the pass and are returned after saving.
    pub fn execute_ready(&self) -> Result<ExecutionReport> {
        let mut state = self.store.load()?;
        let mut report = ExecutionReport::default();

        let ids: Vec<ActionId> = state.pending.keys().copied().collect();
        for id in ids {
            let Some(action) = state.pending.get_mut(&id) else {
                continue;
            };
            let now = self.clock.now();

            let ready_at = match self.ledger.ready_timestamp(&id) {
                Ok(ts) => ts,
                Err(e) => {
                    let err = ledger_err(action, e);
                    self.store.save(&state)?;
                    return Err(err);
                }
            };
            if ready_at == 0 {
                tracing::warn!(%id, label = %action.label, "not recorded on-chain; run reconcile");
                report.vanished.push(id);
                continue;
            }
            action.ready_at_chain = ready_at;
            if ready_at > unix(now) {
                action.status = LocalStatus::Pending;
                report.still_pending.push(id);
                continue;
            }

            action.status = LocalStatus::ReadyToExecute;
            match self
                .ledger
                .submit_execute(&action.target, action.value, &action.payload, &id)
            {
                Ok(tx) => {
                    let confirmed_at = self.clock.now();
                    if let Some(done) = state.retire(&id) {
                        done.status = LocalStatus::Executed;
                        done.executed_at = Some(confirmed_at);
                        done.execution_tx = Some(tx.tx_hash.clone());
                        done.last_error = None;
                        done.touch(confirmed_at);
                        tracing::info!(%id, label = %done.label, tx = %tx.tx_hash, "executed");
                    }
                    report.executed.push(id);
                }
                Err(LedgerError::BufferNotElapsed(reason)) => {
                    // Local clock ahead of chain time.
                    tracing::info!(%id, label = %action.label, %reason, "buffer not yet elapsed");
                    action.status = LocalStatus::Pending;
                    report.still_pending.push(id);
                }
                Err(LedgerError::Rejected(reason)) => {
                    tracing::warn!(%id, label = %action.label, %reason, "execution rejected");
                    action.last_error = Some(reason.clone());
                    action.touch(now);
                    report.failed.push((id, reason));
                }
                Err(e) => {
                    let err = ledger_err(action, e);
                    self.store.save(&state)?;
                    return Err(err);
                }
            }
            self.store.save(&state)?;
        }

        self.store.save(&state)?;
        Ok(report)
    }
}
