//! `gamecode config`: print the effective plugin configuration.

use anyhow::{Context, Result};
use gamecode_plugin::PluginConfig;
use std::path::Path;

pub fn run(path: &Path) -> Result<()> {
    let config = PluginConfig::load(Some(path))
        .with_context(|| format!("failed to load config from {}", path.display()))?;
    print!("{}", config.to_toml()?);
    Ok(())
}
