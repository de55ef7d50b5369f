use crate::action::{ActionRequest, GovernanceAction};
use crate::error::{Result, TimelockError};
use crate::ledger::LedgerError;
use crate::types;

use super::Orchestrator;

impl Orchestrator<'_> {
    /// Schedule `request` on the timelock unless it is already known.
    ///
    /// Idempotent: an id already present in either partition is returned
    /// unchanged, and an id the program already records is adopted without
    /// submitting anything. Submission failures are returned to the caller
    /// and leave the store untouched.
    pub fn schedule(&self, request: &ActionRequest) -> Result<GovernanceAction> {
        types::validate_label(&request.label)?;
        let id = request.id();
        let mut state = self.store.load()?;

        if let Some(existing) = state.get(&id) {
            tracing::info!(
                %id,
                label = %request.label,
                status = %existing.status,
                "already tracked; not resubmitting"
            );
            return Ok(existing.clone());
        }

        let to_ctx = |source: LedgerError| TimelockError::LedgerAction {
            id,
            label: request.label.clone(),
            description: request.description.clone(),
            target: request.target,
            source,
        };

        let on_chain = self.ledger.ready_timestamp(&id).map_err(to_ctx)?;
        let (ready_at, scheduled_at_local) = if on_chain != 0 {
            tracing::info!(
                %id,
                label = %request.label,
                ready_at = on_chain,
                "adopting action already scheduled on-chain"
            );
            (on_chain, None)
        } else {
            let submitted_at = self.clock.now();
            let tx = self
                .ledger
                .submit_schedule(&request.target, request.value, &request.payload, &id)
                .map_err(to_ctx)?;
            tracing::info!(%id, label = %request.label, tx = %tx.tx_hash, "schedule confirmed");

            let ready_at = self.ledger.ready_timestamp(&id).map_err(to_ctx)?;
            if ready_at == 0 {
                return Err(TimelockError::ScheduleNotObserved {
                    id,
                    label: request.label.clone(),
                });
            }
            (ready_at, Some(submitted_at))
        };

        let action =
            GovernanceAction::observed(request, ready_at, scheduled_at_local, self.clock.now());
        state.pending.insert(id, action.clone());
        self.store.save(&state)?;
        Ok(action)
    }

    /// Schedule every request in order, collecting per-request outcomes.
    ///
    /// A failure does not stop the batch; re-running is safe because
    /// `schedule` is idempotent.
    pub fn schedule_all<'r>(
        &self,
        requests: &'r [ActionRequest],
    ) -> Vec<(&'r ActionRequest, Result<GovernanceAction>)> {
        requests.iter().map(|r| (r, self.schedule(r))).collect()
    }
}
