use serde::Serialize;

use crate::action::{unix, LocalStatus};
use crate::error::Result;
use crate::types::ActionId;

use super::{ledger_err, Orchestrator};

/// Classification produced by one reconciliation pass. Every queried action
/// lands in exactly one list.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReconcileReport {
    pub promoted_to_ready: Vec<ActionId>,
    /// Actions whose status became `Pending`: a ready action whose on-chain
    /// timestamp moved later, or a record whose stored status was unknown.
    pub demoted_to_pending: Vec<ActionId>,
    /// Same status, but the on-chain ready timestamp changed.
    pub rescheduled: Vec<ActionId>,
    /// Actions the program no longer records. Moved to `executed` with
    /// status `ExecutedOrCancelled`.
    pub promoted_to_executed: Vec<ActionId>,
    pub unchanged: Vec<ActionId>,
}

impl ReconcileReport {
    pub fn changed(&self) -> bool {
        !(self.promoted_to_ready.is_empty()
            && self.demoted_to_pending.is_empty()
            && self.rescheduled.is_empty()
            && self.promoted_to_executed.is_empty())
    }
}

impl Orchestrator<'_> {
    /// Re-derive the status of every pending action from the program.
    ///
    /// Never submits a transaction. Actions already in `executed` are not
    /// consulted, so terminal states cannot regress. If a read fails, the
    /// classifications made so far are saved before the error is returned.
    pub fn reconcile(&self) -> Result<ReconcileReport> {
        let mut state = self.store.load()?;
        let now = self.clock.now();
        let now_secs = unix(now);
        let mut report = ReconcileReport::default();
        let mut dirty = false;

        let ids: Vec<ActionId> = state.pending.keys().copied().collect();
        for id in ids {
            let Some(action) = state.pending.get_mut(&id) else {
                continue;
            };
            let ready_at = match self.ledger.ready_timestamp(&id) {
                Ok(ts) => ts,
                Err(e) => {
                    let err = ledger_err(action, e);
                    if dirty {
                        self.store.save(&state)?;
                    }
                    return Err(err);
                }
            };

            if ready_at == 0 {
                // Executed by someone else, or cancelled. Indistinguishable
                // from here, so record both as ExecutedOrCancelled.
                if let Some(retired) = state.retire(&id) {
                    retired.status = LocalStatus::ExecutedOrCancelled;
                    retired.ready_at_chain = 0;
                    retired.executed_at = Some(now);
                    retired.touch(now);
                    tracing::info!(%id, label = %retired.label, "no longer on-chain; retired");
                }
                report.promoted_to_executed.push(id);
                dirty = true;
                continue;
            }

            let previous = action.status;
            let moved = action.ready_at_chain != ready_at;
            action.ready_at_chain = ready_at;
            action.status = if ready_at <= now_secs {
                LocalStatus::ReadyToExecute
            } else {
                LocalStatus::Pending
            };
            if moved || previous != action.status {
                action.touch(now);
                dirty = true;
            }

            if moved {
                tracing::warn!(
                    %id,
                    label = %action.label,
                    ready_at,
                    "on-chain ready timestamp changed"
                );
            }
            let bucket = match (previous == action.status, action.status) {
                (false, LocalStatus::ReadyToExecute) => {
                    tracing::info!(%id, label = %action.label, ready_at, "ready to execute");
                    &mut report.promoted_to_ready
                }
                (false, _) => {
                    tracing::info!(
                        %id,
                        label = %action.label,
                        from = %previous,
                        ready_at,
                        "back to pending"
                    );
                    &mut report.demoted_to_pending
                }
                (true, _) if moved => &mut report.rescheduled,
                (true, _) => &mut report.unchanged,
            };
            bucket.push(id);
        }

        if dirty {
            self.store.save(&state)?;
        }
        Ok(report)
    }
}
