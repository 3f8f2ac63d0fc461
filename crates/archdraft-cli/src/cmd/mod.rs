pub mod init;
pub mod project;
pub mod serve;
pub mod user;

use anyhow::Context;
use archdraft_core::{Config, Db};
use std::path::Path;

/// Load the configuration under `root` (defaults when absent) and open the
/// database it points at.
pub fn open_db(root: &Path) -> anyhow::Result<(Config, Db)> {
    let config = Config::load_or_default(root).context("failed to load archdraft.yaml")?;
    let path = config.database_path(root);
    let db = Db::open(&path).with_context(|| format!("failed to open {}", path.display()))?;
    Ok((config, db))
}

pub fn runtime() -> anyhow::Result<tokio::runtime::Runtime> {
    tokio::runtime::Runtime::new().context("failed to start tokio runtime")
}
