use std::path::{Path, PathBuf};

/// Resolve the project root.
///
/// Priority:
/// 1. `--root` flag / `TIMELOCK_ROOT` env var (passed in as `explicit`)
/// 2. Nearest ancestor of the cwd containing `.timelock/`
/// 3. Nearest ancestor of the cwd containing `.git/`
/// 4. The cwd
pub fn resolve_root(explicit: Option<&Path>) -> PathBuf {
    if let Some(p) = explicit {
        return p.to_path_buf();
    }
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    find_marker(&cwd, timelock_core::paths::TIMELOCK_DIR)
        .or_else(|| find_marker(&cwd, ".git"))
        .unwrap_or(cwd)
}

fn find_marker(start: &Path, marker: &str) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(marker).is_dir())
        .map(Path::to_path_buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn explicit_root_wins() {
        let dir = TempDir::new().unwrap();
        assert_eq!(resolve_root(Some(dir.path())), dir.path());
    }

    #[test]
    fn nearest_marker_above_start() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join(".timelock")).unwrap();
        let deep = dir.path().join("ops/scripts");
        std::fs::create_dir_all(&deep).unwrap();

        assert_eq!(find_marker(&deep, ".timelock").as_deref(), Some(dir.path()));
        assert_eq!(find_marker(&deep, "no-such-marker"), None);
    }
}
