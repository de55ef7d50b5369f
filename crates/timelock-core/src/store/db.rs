//! Embedded-database backend using redb.
//!
//! # Table design
//!
//! Two tables mirror the two partitions:
//! ```text
//! pending:    [ action id: 32 bytes ] -> JSON-encoded GovernanceAction
//! executed:   [ action id: 32 bytes ] -> JSON-encoded GovernanceAction
//! quarantine: [ key: 32 bytes ]       -> raw bytes that failed to decode
//! ```
//!
//! Keys are raw id bytes, so table iteration order equals `ActionId`
//! ordering. `save` rewrites both tables inside a single write transaction;
//! redb's commit is atomic, so a crash leaves either the old or the new
//! state. A record that no longer decodes is moved to `quarantine` on load
//! and the rest of the state loads normally.

use std::collections::BTreeMap;
use std::path::Path;

use redb::{Database, ReadableTable, TableDefinition};

use crate::action::GovernanceAction;
use crate::error::{Result, TimelockError};
use crate::types::{encode_hex, ActionId};

use super::{ActionStore, StoreState, STATE_VERSION};

type Partition = TableDefinition<'static, &'static [u8], &'static [u8]>;

const PENDING: &str = "pending";
const EXECUTED: &str = "executed";
const QUARANTINE: Partition = TableDefinition::new("quarantine");

fn partition(name: &'static str) -> Partition {
    TableDefinition::new(name)
}

fn db_err(e: impl std::fmt::Display) -> TimelockError {
    TimelockError::Store(e.to_string())
}

pub struct RedbStore {
    db: Database,
}

impl RedbStore {
    /// Open or create the database at `path`, creating both tables.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let db = Database::create(path).map_err(db_err)?;
        let wt = db.begin_write().map_err(db_err)?;
        wt.open_table(partition(PENDING)).map_err(db_err)?;
        wt.open_table(partition(EXECUTED)).map_err(db_err)?;
        wt.open_table(QUARANTINE).map_err(db_err)?;
        wt.commit().map_err(db_err)?;
        Ok(Self { db })
    }

    fn read_partition(&self, name: &'static str) -> Result<BTreeMap<ActionId, GovernanceAction>> {
        let mut out = BTreeMap::new();
        let mut undecodable = Vec::new();
        {
            let rt = self.db.begin_read().map_err(db_err)?;
            let table = rt.open_table(partition(name)).map_err(db_err)?;
            for entry in table.iter().map_err(db_err)? {
                let (k, v) = entry.map_err(db_err)?;
                match serde_json::from_slice::<GovernanceAction>(v.value()) {
                    Ok(action) => {
                        out.insert(action.id, action);
                    }
                    Err(e) => {
                        tracing::warn!(
                            table = name,
                            key = %encode_hex(k.value()),
                            raw = %String::from_utf8_lossy(v.value()),
                            error = %e,
                            "undecodable action record moved to quarantine"
                        );
                        undecodable.push((k.value().to_vec(), v.value().to_vec()));
                    }
                }
            }
        }
        if !undecodable.is_empty() {
            self.quarantine(name, &undecodable)?;
        }
        Ok(out)
    }

    fn quarantine(&self, name: &'static str, records: &[(Vec<u8>, Vec<u8>)]) -> Result<()> {
        let wt = self.db.begin_write().map_err(db_err)?;
        {
            let mut source = wt.open_table(partition(name)).map_err(db_err)?;
            let mut sink = wt.open_table(QUARANTINE).map_err(db_err)?;
            for (key, raw) in records {
                sink.insert(key.as_slice(), raw.as_slice()).map_err(db_err)?;
                source.remove(key.as_slice()).map_err(db_err)?;
            }
        }
        wt.commit().map_err(db_err)?;
        Ok(())
    }
}

impl ActionStore for RedbStore {
    fn load(&self) -> Result<StoreState> {
        let mut state = StoreState {
            version: STATE_VERSION,
            pending: self.read_partition(PENDING)?,
            executed: self.read_partition(EXECUTED)?,
        };
        let moved = state.normalize();
        if moved > 0 {
            tracing::warn!(moved, "removed terminal or already-executed records from pending");
        }
        Ok(state)
    }

    fn save(&self, state: &StoreState) -> Result<()> {
        let wt = self.db.begin_write().map_err(db_err)?;
        for (name, records) in [(PENDING, &state.pending), (EXECUTED, &state.executed)] {
            wt.delete_table(partition(name)).map_err(db_err)?;
            let mut table = wt.open_table(partition(name)).map_err(db_err)?;
            for (id, action) in records {
                let value = serde_json::to_vec(action)?;
                table
                    .insert(id.as_bytes().as_slice(), value.as_slice())
                    .map_err(db_err)?;
            }
        }
        wt.commit().map_err(db_err)?;
        Ok(())
    }
}
