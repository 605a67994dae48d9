use std::{fs, path::Path};

use anyhow::Context;
use serde::Deserialize;
use shared::{domain::FieldDef, record::Fields};
use tracing::warn;

pub const DEFAULT_CONFIG_PATH: &str = "tabula.toml";

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub bind_addr: String,
    /// `None` or `memory` keeps records in process.
    pub database_url: Option<String>,
    pub entities: Vec<EntityConfig>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".into(),
            database_url: None,
            entities: Vec::new(),
        }
    }
}

/// One `[[entities]]` table.
#[derive(Debug, Clone, Deserialize)]
pub struct EntityConfig {
    pub name: String,
    #[serde(default)]
    pub fields: Vec<FieldDef>,
    /// Records inserted on startup when the entity is still empty.
    #[serde(default)]
    pub seed: Vec<Fields>,
}

/// Reads `TABULA_CONFIG` (or `tabula.toml`) and applies environment overrides.
pub fn load_settings() -> anyhow::Result<Settings> {
    let path = std::env::var("TABULA_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    let mut settings = load_settings_from(Path::new(&path))?;
    apply_env_overrides(&mut settings, |key| std::env::var(key).ok());
    Ok(settings)
}

pub fn load_settings_from(path: &Path) -> anyhow::Result<Settings> {
    if !path.exists() {
        warn!(path = %path.display(), "config file not found; using defaults");
        return Ok(Settings::default());
    }
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file '{}'", path.display()))?;
    parse_settings(&raw).with_context(|| format!("invalid config file '{}'", path.display()))
}

pub fn parse_settings(raw: &str) -> anyhow::Result<Settings> {
    Ok(toml::from_str(raw)?)
}

pub fn apply_env_overrides(settings: &mut Settings, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(v) = lookup("SERVER_BIND") {
        settings.bind_addr = v;
    }
    if let Some(v) = lookup("APP__BIND_ADDR") {
        settings.bind_addr = v;
    }

    if let Some(v) = lookup("DATABASE_URL") {
        settings.database_url = Some(v);
    }
    if let Some(v) = lookup("APP__DATABASE_URL") {
        settings.database_url = Some(v);
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
