use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Directory constants
// ---------------------------------------------------------------------------

pub const ARCHDRAFT_DIR: &str = ".archdraft";
pub const CONFIG_FILE: &str = "archdraft.yaml";
pub const DEFAULT_DB_FILE: &str = ".archdraft/archdraft.db";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

pub fn archdraft_dir(root: &Path) -> PathBuf {
    root.join(ARCHDRAFT_DIR)
}

/// Resolve a configured database path: absolute paths are kept, relative
/// ones are anchored at `root`.
pub fn database_path(root: &Path, configured: &Path) -> PathBuf {
    if configured.is_absolute() {
        configured.to_path_buf()
    } else {
        root.join(configured)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_database_path_is_anchored_at_root() {
        let p = database_path(Path::new("/srv/app"), Path::new(DEFAULT_DB_FILE));
        assert_eq!(p, PathBuf::from("/srv/app/.archdraft/archdraft.db"));
    }

    #[test]
    fn absolute_database_path_is_kept() {
        let p = database_path(Path::new("/srv/app"), Path::new("/var/lib/ad.db"));
        assert_eq!(p, PathBuf::from("/var/lib/ad.db"));
    }
}
