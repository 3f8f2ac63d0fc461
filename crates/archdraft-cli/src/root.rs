use archdraft_core::paths;
use std::path::{Path, PathBuf};

/// Resolve the archdraft root directory.
///
/// Priority:
/// 1. `--root` flag / `ARCHDRAFT_ROOT` env var (passed in as `explicit`)
/// 2. Walk upward from `cwd` looking for `archdraft.yaml`
/// 3. Fall back to `cwd`
pub fn resolve_root(explicit: Option<&Path>) -> PathBuf {
    if let Some(p) = explicit {
        return p.to_path_buf();
    }
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    find_upward(&cwd).unwrap_or(cwd)
}

fn find_upward(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| paths::config_path(dir).is_file())
        .map(Path::to_path_buf)
}
