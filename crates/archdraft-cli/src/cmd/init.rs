use anyhow::Context;
use archdraft_core::{io, paths, Config, Db};
use std::path::Path;

pub fn run(root: &Path) -> anyhow::Result<()> {
    println!("Initializing archdraft in: {}", root.display());

    let dir = paths::archdraft_dir(root);
    io::ensure_dir(&dir).with_context(|| format!("failed to create {}", dir.display()))?;

    let config_path = paths::config_path(root);
    let config = if config_path.exists() {
        println!("  exists:  {}", paths::CONFIG_FILE);
        Config::load(root).context("failed to read archdraft.yaml")?
    } else {
        let cfg = Config::default();
        cfg.save(root).context("failed to write archdraft.yaml")?;
        println!("  created: {}", paths::CONFIG_FILE);
        cfg
    };

    for w in config.validate() {
        println!("  {:?}: {}", w.level, w.message);
    }

    let db_path = config.database_path(root);
    let existed = db_path.exists();
    Db::open(&db_path).with_context(|| format!("failed to open {}", db_path.display()))?;
    let verb = if existed { "exists: " } else { "created:" };
    println!("  {verb} {}", db_path.display());

    Ok(())
}
