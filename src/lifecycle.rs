//! Payloads delivered by the host environment with its lifecycle callbacks.

use serde::{Deserialize, Serialize};

use crate::{AbilityError, AbilityResult};

/// Memory pressure reported by the host, from mild to severe.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, strum::Display,
)]
#[serde(try_from = "i32", into = "i32")]
pub enum MemoryLevel {
    #[strum(serialize = "MEMORY_LEVEL_MODERATE")]
    Moderate,
    #[strum(serialize = "MEMORY_LEVEL_LOW")]
    Low,
    #[strum(serialize = "MEMORY_LEVEL_CRITICAL")]
    Critical,
}

impl MemoryLevel {
    pub fn code(self) -> i32 {
        match self {
            MemoryLevel::Moderate => 0,
            MemoryLevel::Low => 1,
            MemoryLevel::Critical => 2,
        }
    }
}

impl TryFrom<i32> for MemoryLevel {
    type Error = AbilityError;

    fn try_from(value: i32) -> AbilityResult<Self> {
        match value {
            0 => Ok(MemoryLevel::Moderate),
            1 => Ok(MemoryLevel::Low),
            2 => Ok(MemoryLevel::Critical),
            other => Err(AbilityError::invalid_argument(format!(
                "unknown memory level: {}",
                other
            ))),
        }
    }
}

impl From<MemoryLevel> for i32 {
    fn from(level: MemoryLevel) -> Self {
        level.code()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
pub enum ColorMode {
    Light,
    Dark,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Vertical,
    Horizontal,
}

/// Environment configuration pushed by the host when it changes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Configuration {
    #[serde(default)]
    pub color_mode: Option<ColorMode>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub direction: Option<Direction>,
    #[serde(default)]
    pub display_id: Option<i64>,
    #[serde(default)]
    pub screen_density: Option<u32>,
    #[serde(default)]
    pub font_size_scale: Option<f64>,
}

/// Launch parameters handed to `on_create`. Not interpreted by the orchestrator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LaunchParams {
    #[serde(default)]
    pub want: serde_json::Value,
    #[serde(default)]
    pub param: serde_json::Value,
}
