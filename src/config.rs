use serde::{Deserialize, Serialize};
use std::{fs::File, io::BufReader, path::Path};

use crate::{AbilityError, AbilityResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AbilityConfig {
    /// Page loaded into the main window. Required.
    pub page_path: String,

    #[serde(default = "default_runtime_version")]
    pub runtime_version: String,

    /// Asks the bridge to clean up an instance left over from a previous run.
    #[serde(default)]
    pub clean_up_prior_instance: bool,

    #[serde(default = "default_locator_key")]
    pub locator_key: String,

    #[serde(default)]
    pub bridge_init: BridgeInitPolicy,

    #[serde(default = "default_true")]
    pub show_banner: bool,

    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

/// How many initialize calls are made before the debug-mode flag is trusted.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, strum::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum BridgeInitPolicy {
    /// Initialize, then initialize again to confirm. A failed confirmation
    /// falls back to debug mode instead of failing creation.
    #[default]
    Confirm,
    /// A single initialize call; its report is used as is.
    Single,
}

impl AbilityConfig {
    pub fn new<S: Into<String>>(page_path: S) -> Self {
        Self {
            page_path: page_path.into(),
            runtime_version: default_runtime_version(),
            clean_up_prior_instance: false,
            locator_key: default_locator_key(),
            bridge_init: BridgeInitPolicy::default(),
            show_banner: default_true(),
            log_filter: default_log_filter(),
        }
    }

    pub fn validate(&self) -> AbilityResult<()> {
        if self.page_path.trim().is_empty() {
            return Err(AbilityError::Config("page_path must not be empty".to_string()));
        }
        if self.locator_key.is_empty() {
            return Err(AbilityError::Config(
                "locator_key must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> AbilityResult<Self> {
        let config: Self = from_file(path)?;
        config.validate()?;
        Ok(config)
    }
}

pub fn from_file<T: for<'de> Deserialize<'de>, P: AsRef<Path>>(path: P) -> AbilityResult<T> {
    let file = File::open(path)
        .map_err(|e| AbilityError::Config(format!("Failed to open config file: {}", e)))?;
    let reader = BufReader::new(file);
    let config = serde_json::from_reader(reader)
        .map_err(|e| AbilityError::Config(format!("Failed to parse config file: {}", e)))?;
    Ok(config)
}

pub fn from_str<T: for<'de> Deserialize<'de>>(s: &str) -> AbilityResult<T> {
    let config = serde_json::from_str(s)
        .map_err(|e| AbilityError::Config(format!("Failed to parse config: {}", e)))?;
    Ok(config)
}

fn default_runtime_version() -> String {
    "0.72.5".to_string()
}

fn default_locator_key() -> String {
    "RNAbility".to_string()
}

fn default_true() -> bool {
    true
}

fn default_log_filter() -> String {
    "info".to_string()
}
