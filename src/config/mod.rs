//! Configuration module for SearchBridge
//!
//! Handles loading and validating settings from YAML files and environment variables.

mod settings;

pub use settings::*;

use anyhow::Result;
use std::path::PathBuf;
use tracing::info;

/// Environment variable pointing at an explicit settings file
pub const SETTINGS_PATH_VAR: &str = "SEARCH_SETTINGS_PATH";

/// Candidate settings locations, in lookup order
pub fn candidate_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();
    if let Ok(path) = std::env::var(SETTINGS_PATH_VAR) {
        paths.push(PathBuf::from(path));
    }
    paths.push(PathBuf::from("settings.yml"));
    paths.push(PathBuf::from("config/settings.yml"));
    paths.push(PathBuf::from("/etc/searchbridge/settings.yml"));
    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join("searchbridge/settings.yml"));
    }
    paths
}

/// Load settings from the first existing file (or defaults), then apply
/// environment overrides and validate.
pub fn load() -> Result<Settings> {
    let mut settings = match candidate_paths().into_iter().find(|p| p.exists()) {
        Some(path) => {
            info!("Loading settings from: {}", path.display());
            Settings::from_file(&path)?
        }
        None => {
            info!("No settings file found, using defaults");
            Settings::default()
        }
    };

    settings.merge_env();
    settings.validate()?;
    Ok(settings)
}
