use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::bridge::NativeBridge;
use crate::context::{ContextFactory, HostContext};
use crate::lifecycle::{Configuration, MemoryLevel};
use crate::logger::AbilityLogger;

/// Registry-assigned identifier of a managed runtime instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstanceId(u64);

impl InstanceId {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InstanceOptions {
    pub name: String,
    #[serde(default)]
    pub bundle_url: Option<String>,
    #[serde(default)]
    pub initial_props: serde_json::Value,
    #[serde(default)]
    pub enable_debugger: bool,
}

impl InstanceOptions {
    pub fn named<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

/// Lifecycle hooks every managed runtime instance supports.
///
/// Hooks are synchronous notifications; an instance that needs to do async
/// work in response schedules it itself.
pub trait RuntimeInstance: Send + Sync {
    fn id(&self) -> InstanceId;
    fn on_destroy(&self);
    fn on_configuration_update(&self, config: &Configuration);
    fn on_foreground(&self);
    fn on_background(&self);
    fn on_back_press(&self);
    fn on_memory_level(&self, _level: MemoryLevel) {}
}

/// Everything a factory needs to build an instance.
pub struct InstanceDeps {
    pub id: InstanceId,
    pub options: InstanceOptions,
    pub bridge: Arc<dyn NativeBridge>,
    pub host_context: Arc<HostContext>,
    pub logger: AbilityLogger,
    /// Produces the instance's `RuntimeContext` once the instance exists.
    pub context_factory: ContextFactory,
}

#[async_trait]
pub trait InstanceFactory: Send + Sync {
    async fn create(&self, deps: InstanceDeps) -> InstanceResult<Arc<dyn RuntimeInstance>>;
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum InstanceError {
    #[error("Failed to create instance {name}: {message}")]
    CreationFailed { name: String, message: String },
    #[error("Factory returned instance {actual} for slot {expected}")]
    IdMismatch {
        expected: InstanceId,
        actual: InstanceId,
    },
}

pub type InstanceResult<T> = Result<T, InstanceError>;
