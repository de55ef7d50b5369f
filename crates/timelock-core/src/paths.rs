use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Directory constants
// ---------------------------------------------------------------------------

pub const TIMELOCK_DIR: &str = ".timelock";

pub const CONFIG_FILE: &str = ".timelock/config.yaml";
pub const JSON_STATE_FILE: &str = ".timelock/actions.json";
pub const REDB_STATE_FILE: &str = ".timelock/actions.redb";
pub const PLAN_FILE: &str = ".timelock/plan.yaml";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn timelock_dir(root: &Path) -> PathBuf {
    root.join(TIMELOCK_DIR)
}

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

pub fn json_state_path(root: &Path) -> PathBuf {
    root.join(JSON_STATE_FILE)
}

pub fn redb_state_path(root: &Path) -> PathBuf {
    root.join(REDB_STATE_FILE)
}

pub fn plan_path(root: &Path) -> PathBuf {
    root.join(PLAN_FILE)
}

/// Sidecar path a corrupt state file is copied to before being ignored.
pub fn corrupt_sidecar(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".corrupt");
    path.with_file_name(name)
}
