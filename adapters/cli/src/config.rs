use std::{fs, path::Path};

use anyhow::{Context, Result};
use bat_rounds_core::{GameConfig, GameMode};

/// Reads and validates a game configuration from a TOML file.
pub(crate) fn load(path: &Path) -> Result<GameConfig> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read game config at {}", path.display()))?;
    parse(&contents).with_context(|| format!("invalid game config at {}", path.display()))
}

/// Parses and validates a game configuration from TOML contents.
pub(crate) fn parse(contents: &str) -> Result<GameConfig> {
    let config: GameConfig =
        toml::from_str(contents).context("failed to parse game config toml contents")?;
    config.validate()?;
    Ok(config)
}

/// Renders the default configuration of a mode as TOML.
pub(crate) fn render_default(mode: GameMode) -> Result<String> {
    toml::to_string_pretty(&GameConfig::for_mode(mode)).context("failed to render game config")
}
