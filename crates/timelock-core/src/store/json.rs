use crate::error::Result;
use crate::io;
use crate::paths;
use std::path::{Path, PathBuf};

use super::{ActionStore, StoreState};

/// JSON-file backend. The whole state is one pretty-printed document,
/// replaced atomically on every save.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ActionStore for JsonFileStore {
    fn load(&self) -> Result<StoreState> {
        let Some(data) = io::read_optional(&self.path)? else {
            return Ok(StoreState::default());
        };
        if data.trim().is_empty() {
            return Ok(StoreState::default());
        }
        match serde_json::from_str::<StoreState>(&data) {
            Ok(mut state) => {
                let moved = state.normalize();
                if moved > 0 {
                    tracing::warn!(
                        path = %self.path.display(),
                        moved,
                        "removed terminal or already-executed records from pending"
                    );
                }
                Ok(state)
            }
            Err(e) => {
                // Unreadable state is treated as a first run; keep the bytes
                // for the operator before the next save replaces them.
                let sidecar = paths::corrupt_sidecar(&self.path);
                io::atomic_write(&sidecar, data.as_bytes())?;
                tracing::warn!(
                    path = %self.path.display(),
                    sidecar = %sidecar.display(),
                    error = %e,
                    "action state unreadable; starting from empty state"
                );
                Ok(StoreState::default())
            }
        }
    }

    fn save(&self, state: &StoreState) -> Result<()> {
        let mut data = serde_json::to_vec_pretty(state)?;
        data.push(b'\n');
        io::atomic_write(&self.path, &data)
    }
}
