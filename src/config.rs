//! Configuration loading: built-in defaults, then a JSON file, then CLI overrides.

use crate::model::AnalysisConfig;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

const CONFIG_FILE: &str = "config.json";

/// `<config dir>/simstats/config.json`, if the platform has a config dir.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("simstats").join(CONFIG_FILE))
}

/// Load the configuration. An explicit path must exist; the default path is
/// used only when present.
pub fn load(explicit: Option<&Path>) -> Result<AnalysisConfig> {
    match explicit {
        Some(path) => read_file(path),
        None => match default_config_path().filter(|p| p.is_file()) {
            Some(path) => {
                tracing::debug!(path = %path.display(), "using default config file");
                read_file(&path)
            }
            None => Ok(AnalysisConfig::default()),
        },
    }
}

fn read_file(path: &Path) -> Result<AnalysisConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    let cfg: AnalysisConfig = serde_json::from_str(&text)
        .with_context(|| format!("invalid config {}", path.display()))?;
    validate(&cfg).with_context(|| format!("invalid config {}", path.display()))?;
    Ok(cfg)
}

pub fn validate(cfg: &AnalysisConfig) -> Result<()> {
    if !(cfg.confidence > 0.0 && cfg.confidence < 1.0) {
        anyhow::bail!("confidence must be between 0 and 1, got {}", cfg.confidence);
    }
    for attrs in &cfg.search_attrs {
        if attrs.groupby.is_empty() {
            anyhow::bail!("search attrs `{}` need at least one groupby column", attrs.output);
        }
    }
    Ok(())
}
