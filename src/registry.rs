use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::{DashMap, DashSet};

use crate::bridge::NativeBridge;
use crate::context::{ContextFactory, HostContext};
use crate::instance::{
    InstanceDeps, InstanceError, InstanceFactory, InstanceId, InstanceOptions, RuntimeInstance,
};
use crate::logger::AbilityLogger;
use crate::AbilityResult;

/// Owns the live managed runtime instances of one ability.
pub struct InstanceRegistry {
    instances: Arc<DashMap<InstanceId, Arc<dyn RuntimeInstance>>>,
    // ids handed to a factory whose `create` has not returned yet
    pending: DashSet<InstanceId>,
    next_id: AtomicU64,
    logger: AbilityLogger,
    bridge: Arc<dyn NativeBridge>,
    host_context: Arc<HostContext>,
    factory: Arc<dyn InstanceFactory>,
    context_factory: ContextFactory,
}

impl InstanceRegistry {
    pub fn new(
        logger: AbilityLogger,
        bridge: Arc<dyn NativeBridge>,
        host_context: Arc<HostContext>,
        factory: Arc<dyn InstanceFactory>,
        context_factory: ContextFactory,
    ) -> Self {
        Self {
            instances: Arc::new(DashMap::new()),
            pending: DashSet::new(),
            next_id: AtomicU64::new(1),
            logger: logger.child("InstanceRegistry"),
            bridge,
            host_context,
            factory,
            context_factory,
        }
    }

    #[tracing::instrument(skip(self, options), fields(name = %options.name), level = "debug")]
    pub async fn create_instance(
        &self,
        options: InstanceOptions,
    ) -> AbilityResult<Arc<dyn RuntimeInstance>> {
        let id = InstanceId::new(self.next_id.fetch_add(1, Ordering::SeqCst));
        self.pending.insert(id);

        let deps = InstanceDeps {
            id,
            options,
            bridge: self.bridge.clone(),
            host_context: self.host_context.clone(),
            logger: self.logger.clone(),
            context_factory: self.context_factory.clone(),
        };
        let created = self.factory.create(deps).await;
        self.pending.remove(&id);

        let instance = created?;
        if instance.id() != id {
            self.logger.error(format!(
                "factory returned instance {} for id {}, destroying it",
                instance.id(),
                id
            ));
            instance.on_destroy();
            return Err(InstanceError::IdMismatch {
                expected: id,
                actual: instance.id(),
            }
            .into());
        }

        self.instances.insert(id, instance.clone());
        self.logger.debug(format!("registered instance {}", id));
        Ok(instance)
    }

    /// Unregisters the instance. Does not call its destroy hook.
    pub fn delete_instance(&self, id: InstanceId) -> Option<Arc<dyn RuntimeInstance>> {
        let removed = self.instances.remove(&id).map(|(_, instance)| instance);
        match removed {
            Some(_) => self.logger.debug(format!("unregistered instance {}", id)),
            None => self
                .logger
                .debug(format!("instance {} was not registered", id)),
        }
        removed
    }

    /// Applies `f` to every registered instance in id order.
    ///
    /// Works on a snapshot, so `f` may create or delete instances without
    /// deadlocking on the map.
    pub fn for_each<F>(&self, mut f: F)
    where
        F: FnMut(&Arc<dyn RuntimeInstance>),
    {
        for instance in self.instances() {
            f(&instance);
        }
    }

    pub fn instances(&self) -> Vec<Arc<dyn RuntimeInstance>> {
        let mut snapshot: Vec<_> = self
            .instances
            .iter()
            .map(|entry| (*entry.key(), entry.value().clone()))
            .collect();
        snapshot.sort_by_key(|(id, _)| *id);
        snapshot.into_iter().map(|(_, instance)| instance).collect()
    }

    pub fn get(&self, id: InstanceId) -> Option<Arc<dyn RuntimeInstance>> {
        self.instances.get(&id).map(|entry| entry.value().clone())
    }

    pub fn contains(&self, id: InstanceId) -> bool {
        self.instances.contains_key(&id)
    }

    /// True when this exact `instance` is registered here. Another instance
    /// carrying the same id does not count.
    pub fn owns(&self, instance: &Arc<dyn RuntimeInstance>) -> bool {
        self.instances
            .get(&instance.id())
            .map(|entry| {
                Arc::as_ptr(entry.value()) as *const () == Arc::as_ptr(instance) as *const ()
            })
            .unwrap_or(false)
    }

    /// True while the factory is still building the instance for `id`.
    pub fn is_pending(&self, id: InstanceId) -> bool {
        self.pending.contains(&id)
    }

    pub fn ids(&self) -> Vec<InstanceId> {
        let mut ids: Vec<_> = self.instances.iter().map(|entry| *entry.key()).collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }
}
