use anyhow::Context;
use archdraft_core::Config;
use archdraft_server::AppState;
use std::path::Path;

pub fn run(root: &Path, port: Option<u16>, open: bool, api_key: Option<String>) -> anyhow::Result<()> {
    let config = Config::load_or_default(root).context("failed to load archdraft.yaml")?;
    let port = port.unwrap_or(config.server.port);
    if api_key.is_none() {
        tracing::warn!("GEMINI_API_KEY is not set; generate and regenerate will return nothing");
    }

    let state = AppState::open(root, api_key)?;
    let rt = super::runtime()?;
    rt.block_on(archdraft_server::serve(state, &config.server.host, port, open))
}
