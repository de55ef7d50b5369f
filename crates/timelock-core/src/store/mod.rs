//! Action Store: durable local view of governance actions.
//!
//! State is two partitions keyed by action id. `pending` holds everything
//! still waiting on the program; `executed` is the append-only audit
//! history. Actions only ever move `pending → executed`.
//!
//! Every mutating operation does a full `load → mutate → save` cycle, so
//! the process can be restarted between any two operations.

pub mod json;
pub mod db;

pub use self::json::JsonFileStore;
pub use self::db::RedbStore;

use crate::action::GovernanceAction;
use crate::config::{Config, StoreBackend};
use crate::error::Result;
use crate::paths;
use crate::types::ActionId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Mutex;

pub const STATE_VERSION: u32 = 1;

// ---------------------------------------------------------------------------
// StoreState
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreState {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub pending: BTreeMap<ActionId, GovernanceAction>,
    #[serde(default)]
    pub executed: BTreeMap<ActionId, GovernanceAction>,
}

fn default_version() -> u32 {
    STATE_VERSION
}

impl Default for StoreState {
    fn default() -> Self {
        Self {
            version: STATE_VERSION,
            pending: BTreeMap::new(),
            executed: BTreeMap::new(),
        }
    }
}

impl StoreState {
    pub fn get(&self, id: &ActionId) -> Option<&GovernanceAction> {
        self.executed.get(id).or_else(|| self.pending.get(id))
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty() && self.executed.is_empty()
    }

    /// Move a pending action into the executed partition, returning it.
    pub fn retire(&mut self, id: &ActionId) -> Option<&mut GovernanceAction> {
        let action = self.pending.remove(id)?;
        Some(self.executed.entry(*id).or_insert(action))
    }

    /// Drop stale `pending` copies of ids already recorded as executed, and
    /// move any terminal-status record sitting in `pending` to `executed`.
    ///
    /// Returns the number of records touched.
    pub fn normalize(&mut self) -> usize {
        let stale: Vec<ActionId> = self
            .pending
            .iter()
            .filter(|(id, a)| self.executed.contains_key(*id) || a.status.is_terminal())
            .map(|(id, _)| *id)
            .collect();
        for id in &stale {
            if let Some(action) = self.pending.remove(id) {
                if action.status.is_terminal() {
                    self.executed.entry(*id).or_insert(action);
                }
            }
        }
        stale.len()
    }

    /// Find an action by full id or unambiguous hex prefix.
    pub fn find(&self, needle: &str) -> Result<&GovernanceAction> {
        use crate::error::TimelockError;
        let needle = needle.trim().to_ascii_lowercase();
        let needle = needle.strip_prefix("0x").unwrap_or(&needle).to_string();
        let mut hits = self
            .pending
            .values()
            .chain(self.executed.values())
            .filter(|a| a.id.to_string()[2..].starts_with(&needle));
        let first = hits
            .next()
            .ok_or_else(|| TimelockError::ActionNotFound(needle.clone()))?;
        if hits.any(|a| a.id != first.id) {
            return Err(TimelockError::AmbiguousId(needle));
        }
        Ok(first)
    }
}

// ---------------------------------------------------------------------------
// ActionStore
// ---------------------------------------------------------------------------

/// Durable storage for [`StoreState`].
///
/// `save` must be atomic: after a crash, `load` returns either the state
/// before the save or the state after it.
pub trait ActionStore {
    /// Read durable state. Returns an empty state on first run.
    fn load(&self) -> Result<StoreState>;

    fn save(&self, state: &StoreState) -> Result<()>;
}

/// Open the store backend selected in `config`.
pub fn open(root: &Path, config: &Config) -> Result<Box<dyn ActionStore>> {
    Ok(match config.store.backend {
        StoreBackend::Json => Box::new(JsonFileStore::new(paths::json_state_path(root))),
        StoreBackend::Redb => Box::new(RedbStore::open(&paths::redb_state_path(root))?),
    })
}

// ---------------------------------------------------------------------------
// MemoryStore
// ---------------------------------------------------------------------------

/// Non-durable store, for tests and embedding.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<StoreState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(state: StoreState) -> Self {
        Self {
            state: Mutex::new(state),
        }
    }

    pub fn snapshot(&self) -> StoreState {
        self.state.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl ActionStore for MemoryStore {
    fn load(&self) -> Result<StoreState> {
        let mut state = self.snapshot();
        state.normalize();
        Ok(state)
    }

    fn save(&self, state: &StoreState) -> Result<()> {
        *self.state.lock().unwrap_or_else(|e| e.into_inner()) = state.clone();
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::action::{ActionRequest, LocalStatus};
    use crate::types::{Address, Payload};
    use chrono::{DateTime, Utc};

    pub(crate) fn sample(label: &str, ready_at: u64) -> GovernanceAction {
        let req = ActionRequest::new(label, Address::repeat_byte(9), Payload(vec![1, 2, 3])).unwrap();
        let now = DateTime::from_timestamp(1_000, 0).unwrap();
        GovernanceAction::observed(&req, ready_at, Some(now), now)
    }

    pub(crate) fn state_with(pending: &[GovernanceAction]) -> StoreState {
        let mut s = StoreState::default();
        for a in pending {
            s.pending.insert(a.id, a.clone());
        }
        s
    }

    #[test]
    fn memory_store_starts_empty() {
        let store = MemoryStore::new();
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn retire_moves_between_partitions() {
        let a = sample("a", 2_000);
        let mut s = state_with(&[a.clone()]);
        let moved = s.retire(&a.id).unwrap();
        moved.status = LocalStatus::Executed;
        assert!(s.pending.is_empty());
        assert_eq!(s.executed[&a.id].status, LocalStatus::Executed);
        assert!(s.retire(&a.id).is_none());
    }

    #[test]
    fn normalize_prefers_executed_partition() {
        let a = sample("a", 2_000);
        let mut s = state_with(&[a.clone()]);
        let mut done = a.clone();
        done.status = LocalStatus::Executed;
        s.executed.insert(a.id, done);

        assert_eq!(s.normalize(), 1);
        assert!(s.pending.is_empty());
        assert_eq!(s.get(&a.id).unwrap().status, LocalStatus::Executed);
    }

    #[test]
    fn normalize_moves_terminal_records_out_of_pending() {
        let mut a = sample("a", 0);
        a.status = LocalStatus::ExecutedOrCancelled;
        let mut s = state_with(&[a.clone()]);
        s.normalize();
        assert!(s.pending.is_empty());
        assert!(s.executed.contains_key(&a.id));
    }

    #[test]
    fn find_by_prefix() {
        let a = sample("a", 2_000);
        let s = state_with(&[a.clone()]);
        let prefix = &a.id.to_string()[..10];
        assert_eq!(s.find(prefix).unwrap().id, a.id);
        assert!(matches!(
            s.find("0xffffffffffff"),
            Err(crate::error::TimelockError::ActionNotFound(_))
        ));
    }

    #[test]
    fn find_rejects_ambiguous_prefix() {
        let s = state_with(&[sample("a", 1), sample("b", 2)]);
        assert!(matches!(
            s.find("0x"),
            Err(crate::error::TimelockError::AmbiguousId(_))
        ));
    }
}
