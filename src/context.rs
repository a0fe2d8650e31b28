use std::collections::HashMap;
use std::sync::{Arc, Weak};

use serde::{Deserialize, Serialize};

use crate::ability::AbilityOrchestrator;
use crate::instance::RuntimeInstance;
use crate::logger::AbilityLogger;
use crate::AbilityResult;

/// Host execution context the ability runs in. Passed through to instances untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HostContext {
    pub bundle_name: String,
    #[serde(default)]
    pub attributes: HashMap<String, serde_json::Value>,
}

impl HostContext {
    pub fn new<S: Into<String>>(bundle_name: S) -> Self {
        Self {
            bundle_name: bundle_name.into(),
            attributes: HashMap::new(),
        }
    }
}

pub type ContextFactory =
    Arc<dyn Fn(Arc<dyn RuntimeInstance>) -> AbilityResult<RuntimeContext> + Send + Sync>;

/// Per-instance context binding the runtime version, the instance, the logger
/// and the owning ability.
#[derive(Clone)]
pub struct RuntimeContext {
    runtime_version: String,
    instance: Arc<dyn RuntimeInstance>,
    logger: AbilityLogger,
    ability: Weak<AbilityOrchestrator>,
}

impl std::fmt::Debug for RuntimeContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuntimeContext")
            .field("runtime_version", &self.runtime_version)
            .field("instance", &self.instance.id())
            .field("logger", &self.logger)
            .finish()
    }
}

impl RuntimeContext {
    pub(crate) fn new(
        runtime_version: String,
        instance: Arc<dyn RuntimeInstance>,
        logger: AbilityLogger,
        ability: Weak<AbilityOrchestrator>,
    ) -> Self {
        Self {
            runtime_version,
            instance,
            logger,
            ability,
        }
    }

    pub fn runtime_version(&self) -> &str {
        &self.runtime_version
    }

    pub fn instance(&self) -> &Arc<dyn RuntimeInstance> {
        &self.instance
    }

    pub fn logger(&self) -> &AbilityLogger {
        &self.logger
    }

    /// The owning ability, unless it has already been dropped.
    pub fn ability(&self) -> Option<Arc<AbilityOrchestrator>> {
        self.ability.upgrade()
    }
}
