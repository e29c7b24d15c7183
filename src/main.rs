use std::path::PathBuf;

use agentscape::{app::ViewerApp, config::ViewerConfig};
use anyhow::Context;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match std::env::args_os().nth(1).map(PathBuf::from) {
        Some(path) => ViewerConfig::load(&path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => ViewerConfig::default(),
    };

    ViewerApp::new(config)?.run()?;
    Ok(())
}
