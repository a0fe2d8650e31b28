//! Native bridge contract.
//!
//! The bridge is the loaded native module backing the managed runtime. Its
//! internals are opaque here: the orchestrator only needs the initialize
//! handshake and the memory-pressure notification.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::logger::AbilityLogger;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum BridgeError {
    #[error("Native module failed to load: {message}")]
    LoadFailed { message: String },
    #[error("Initialize call rejected: {message}")]
    InitializeRejected { message: String },
    #[error("Memory level notification failed: {message}")]
    NotifyFailed { message: String },
}

pub type BridgeResult<T> = Result<T, BridgeError>;

/// Result of the bridge initialize handshake.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InitReport {
    #[serde(default, rename = "isDebugModeEnabled")]
    pub is_debug_mode_enabled: Option<bool>,
}

impl InitReport {
    pub fn with_debug_mode(enabled: bool) -> Self {
        Self {
            is_debug_mode_enabled: Some(enabled),
        }
    }

    /// Debug mode as reported, falling back to enabled when the bridge is silent.
    pub fn debug_mode_or_default(&self) -> bool {
        self.is_debug_mode_enabled.unwrap_or(true)
    }
}

#[mockall::automock]
#[async_trait]
pub trait NativeBridge: Send + Sync {
    async fn initialize(&self, should_clean_up: bool) -> BridgeResult<InitReport>;
    async fn notify_memory_level(&self, level: i32) -> BridgeResult<()>;
}

/// Loads the native module. Loading happens once per orchestrator.
#[async_trait]
pub trait BridgeLoader: Send + Sync {
    async fn load(&self, logger: &AbilityLogger) -> BridgeResult<Arc<dyn NativeBridge>>;
}

/// Loader handing out a bridge that was constructed up front.
pub struct PreloadedBridge {
    bridge: Arc<dyn NativeBridge>,
}

impl PreloadedBridge {
    pub fn new(bridge: Arc<dyn NativeBridge>) -> Self {
        Self { bridge }
    }
}

#[async_trait]
impl BridgeLoader for PreloadedBridge {
    async fn load(&self, logger: &AbilityLogger) -> BridgeResult<Arc<dyn NativeBridge>> {
        logger.debug("using preloaded native bridge");
        Ok(self.bridge.clone())
    }
}

/// Loader that always fails, for hosts where the native module is missing.
pub struct UnavailableBridge {
    reason: String,
}

impl UnavailableBridge {
    pub fn new<S: Into<String>>(reason: S) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl BridgeLoader for UnavailableBridge {
    async fn load(&self, _logger: &AbilityLogger) -> BridgeResult<Arc<dyn NativeBridge>> {
        Err(BridgeError::LoadFailed {
            message: self.reason.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_debug_flag_defaults_to_enabled() {
        assert!(InitReport::default().debug_mode_or_default());
        assert!(!InitReport::with_debug_mode(false).debug_mode_or_default());
    }

    #[test]
    fn test_init_report_wire_name() {
        let report: InitReport = serde_json::from_str(r#"{"isDebugModeEnabled":false}"#).unwrap();
        assert_eq!(report.is_debug_mode_enabled, Some(false));

        let empty: InitReport = serde_json::from_str("{}").unwrap();
        assert_eq!(empty.is_debug_mode_enabled, None);
    }

    #[tokio::test]
    async fn test_preloaded_bridge_returns_same_handle() {
        let mut mock = MockNativeBridge::new();
        mock.expect_initialize()
            .returning(|_| Ok(InitReport::with_debug_mode(true)));
        let bridge: Arc<dyn NativeBridge> = Arc::new(mock);
        let loader = PreloadedBridge::new(bridge.clone());

        let loaded = loader.load(&AbilityLogger::new("test")).await.unwrap();
        assert!(std::ptr::eq(
            Arc::as_ptr(&loaded) as *const (),
            Arc::as_ptr(&bridge) as *const ()
        ));
        assert_eq!(
            loaded.initialize(false).await.unwrap(),
            InitReport::with_debug_mode(true)
        );
    }

    #[tokio::test]
    async fn test_unavailable_bridge_fails_to_load() {
        let loader = UnavailableBridge::new("librnoh_app.so missing");
        let result = loader.load(&AbilityLogger::new("test")).await;
        assert!(matches!(result, Err(BridgeError::LoadFailed { .. })));
    }
}
