//! Application configuration.
//!
//! Settings are read from `<config dir>/scribe/config.toml` and may be
//! overridden with `SCRIBE_*` environment variables, e.g.
//! `SCRIBE_LOG_LEVEL=debug`.

use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{Context, Result};
use config::{Config, Environment, File, Map};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::annotate::RuleTables;

/// Directory under the user's config dir holding scribe settings.
pub const CONFIG_DIR: &str = "scribe";
/// File name of the settings file.
pub const CONFIG_FILE: &str = "config.toml";
/// Prefix of environment variables overriding settings.
pub const ENV_PREFIX: &str = "SCRIBE";

const DEFAULT_CONFIG: &str = r#"# Roster parser settings.

# Force-level selections rendered as configuration lines.
configuration_selections = ["Battle Size", "Gametype"]

# Force-level selections skipped when their name contains one of these.
ignored_selections = ["Detachment Command Cost"]

# Profile types collected into detachment and faction rule glossaries.
rule_profile_types = ["Abilities", "Dynastic Code", "Household Tradition"]

# Replacement phrase tables (JSON). Leave unset to use the bundled ones.
# weapon_rules_path = "/path/to/weapon_abilities.json"
# invulnerable_phrases_path = "/path/to/invulnerable_saves.json"

log_level = "info"
"#;

/// Settings shared by the library and the command line frontend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScribeConfig {
    /// Force-level selection names parsed as configuration.
    pub configuration_selections: Vec<String>,
    /// Substrings of force-level selection names to skip.
    pub ignored_selections: Vec<String>,
    /// Profile types harvested into detachment and faction glossaries.
    pub rule_profile_types: Vec<String>,
    /// Replacement weapon rule table.
    pub weapon_rules_path: Option<PathBuf>,
    /// Replacement invulnerable save phrase table.
    pub invulnerable_phrases_path: Option<PathBuf>,
    /// Fallback log filter when `RUST_LOG` is unset.
    pub log_level: String,
}

impl Default for ScribeConfig {
    fn default() -> Self {
        let options = ParseOptions::default();
        Self {
            configuration_selections: options.configuration_selections,
            ignored_selections: options.ignored_selections,
            rule_profile_types: options.rule_profile_types,
            weapon_rules_path: None,
            invulnerable_phrases_path: None,
            log_level: "info".to_string(),
        }
    }
}

impl ScribeConfig {
    /// Load from the default location plus environment overrides.
    pub fn load() -> Result<Self> {
        Self::load_from(default_config_path())
    }

    /// Load from `path` plus environment overrides. A missing file yields
    /// the defaults.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        Self::load_with_env(path.as_ref(), None)
    }

    /// `env` stands in for the process environment when set.
    fn load_with_env(path: &Path, env: Option<Map<String, String>>) -> Result<Self> {
        let settings = Config::builder()
            .add_source(File::from(path).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("configuration_selections")
                    .with_list_parse_key("ignored_selections")
                    .with_list_parse_key("rule_profile_types")
                    .source(env),
            )
            .build()
            .with_context(|| format!("failed to read config {}", path.display()))?;
        settings
            .try_deserialize()
            .with_context(|| format!("invalid config {}", path.display()))
    }

    /// Parser settings carried by this configuration.
    pub fn parse_options(&self) -> ParseOptions {
        ParseOptions {
            configuration_selections: self.configuration_selections.clone(),
            ignored_selections: self.ignored_selections.clone(),
            rule_profile_types: self.rule_profile_types.clone(),
        }
    }

    /// Phrase tables, honouring the configured replacement files.
    pub fn rule_tables(&self) -> Result<Arc<RuleTables>> {
        RuleTables::load(
            self.weapon_rules_path.as_deref(),
            self.invulnerable_phrases_path.as_deref(),
        )
        .context("failed to load rule tables")
    }
}

/// The part of the configuration the parser consults while walking a roster.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseOptions {
    pub configuration_selections: Vec<String>,
    pub ignored_selections: Vec<String>,
    pub rule_profile_types: Vec<String>,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            configuration_selections: vec!["Battle Size".to_string(), "Gametype".to_string()],
            ignored_selections: vec!["Detachment Command Cost".to_string()],
            rule_profile_types: ["Abilities", "Dynastic Code", "Household Tradition"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

impl ParseOptions {
    pub fn is_ignored(&self, selection_name: &str) -> bool {
        self.ignored_selections
            .iter()
            .any(|ignored| selection_name.contains(ignored.as_str()))
    }

    pub fn is_configuration(&self, selection_name: &str) -> bool {
        self.configuration_selections
            .iter()
            .any(|name| name == selection_name)
    }

    pub fn is_rule_profile(&self, profile_type: &str) -> bool {
        self.rule_profile_types.iter().any(|kind| kind == profile_type)
    }
}

/// `<config dir>/scribe/config.toml`, falling back to the working directory.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CONFIG_DIR)
        .join(CONFIG_FILE)
}

/// Write the default config file if none exists yet.
pub fn ensure_default_config() -> Result<PathBuf> {
    let path = default_config_path();
    ensure_config_at(&path)?;
    Ok(path)
}

/// Write the default config to `path` unless a file is already there.
pub fn ensure_config_at(path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if path.exists() {
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create config directory {}", parent.display()))?;
    }
    fs::write(path, DEFAULT_CONFIG)
        .with_context(|| format!("failed to write config {}", path.display()))?;
    info!("wrote default config to {}", path.display());
    Ok(())
}
