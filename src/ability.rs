//! The ability orchestrator.
//!
//! Translates the host component lifecycle into bridge initialization and
//! instance registry operations. The host delivers lifecycle callbacks one at
//! a time; every callback that arrives before `on_create` has finished sees no
//! registry and skips its fan-out.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock, Weak};
use std::time::Duration;

use tokio::sync::RwLock;

use crate::bridge::{BridgeLoader, NativeBridge};
use crate::config::{AbilityConfig, BridgeInitPolicy};
use crate::context::{ContextFactory, HostContext, RuntimeContext};
use crate::instance::{InstanceFactory, InstanceOptions, RuntimeInstance};
use crate::lifecycle::{Configuration, LaunchParams, MemoryLevel};
use crate::locator::AbilityLocator;
use crate::logger::{AbilityLogger, LogSeverity};
use crate::registry::InstanceRegistry;
use crate::timestamp::Timestamp;
use crate::window::{ContentLoadResult, Window, WindowResult, WindowStage};
use crate::{AbilityError, AbilityResult};

const BANNER: &str = "\n\n\
██████╗ ███╗   ██╗ ██████╗ ██╗  ██╗\n\
██╔══██╗████╗  ██║██╔═══██╗██║  ██║\n\
██████╔╝██╔██╗ ██║██║   ██║███████║\n\
██╔══██╗██║╚██╗██║██║   ██║██╔══██║\n\
██║  ██║██║ ╚████║╚██████╔╝██║  ██║\n\
╚═╝  ╚═╝╚═╝  ╚═══╝ ╚═════╝ ╚═╝  ╚═╝\n";

/// Collaborators supplied by the embedding host.
pub struct AbilityCollaborators {
    pub bridge_loader: Arc<dyn BridgeLoader>,
    pub instance_factory: Arc<dyn InstanceFactory>,
    pub host_context: HostContext,
    pub locator: AbilityLocator,
    /// Root logger. A logger named `RNOH` is created when absent.
    pub logger: Option<AbilityLogger>,
}

pub struct AbilityOrchestrator {
    config: AbilityConfig,
    me: Weak<AbilityOrchestrator>,
    bridge_loader: Arc<dyn BridgeLoader>,
    instance_factory: Arc<dyn InstanceFactory>,
    host_context: Arc<HostContext>,
    locator: AbilityLocator,
    provided_logger: AbilityLogger,
    logger: AbilityLogger,
    bridge: OnceLock<Arc<dyn NativeBridge>>,
    registry: OnceLock<InstanceRegistry>,
    window: RwLock<Option<Arc<dyn Window>>>,
    initialized_at: OnceLock<Timestamp>,
    ready_at: OnceLock<Timestamp>,
    debug_mode_enabled: AtomicBool,
    creation_started: AtomicBool,
}

impl AbilityOrchestrator {
    /// Builds an orchestrator. Fails if the configuration is invalid, in
    /// particular when no page path is set.
    pub fn new(
        config: AbilityConfig,
        collaborators: AbilityCollaborators,
    ) -> AbilityResult<Arc<Self>> {
        config.validate()?;
        let provided_logger = collaborators
            .logger
            .unwrap_or_else(|| AbilityLogger::new("RNOH"));
        let logger = provided_logger.child("AbilityOrchestrator");

        Ok(Arc::new_cyclic(|me| Self {
            config,
            me: me.clone(),
            bridge_loader: collaborators.bridge_loader,
            instance_factory: collaborators.instance_factory,
            host_context: Arc::new(collaborators.host_context),
            locator: collaborators.locator,
            provided_logger,
            logger,
            bridge: OnceLock::new(),
            registry: OnceLock::new(),
            window: RwLock::new(None),
            initialized_at: OnceLock::new(),
            ready_at: OnceLock::new(),
            debug_mode_enabled: AtomicBool::new(true),
            creation_started: AtomicBool::new(false),
        }))
    }

    /// Loads and initializes the native bridge, then builds the instance
    /// registry and publishes this ability to the locator.
    ///
    /// Only bridge loading and the first initialize call can fail this
    /// method. A failed confirmation call leaves debug mode enabled.
    pub async fn on_create(&self, launch: LaunchParams) -> AbilityResult<()> {
        if self.creation_started.swap(true, Ordering::SeqCst) {
            return Err(AbilityError::AlreadyCreated);
        }
        let _ = self.initialized_at.set(Timestamp::now());
        if self.config.show_banner {
            self.provided_logger.info(BANNER);
        }
        let trace = self.logger.child("on_create").start_tracing();
        trace
            .instrument(self.initialize_bridge_and_registry(launch))
            .await
    }

    async fn initialize_bridge_and_registry(&self, launch: LaunchParams) -> AbilityResult<()> {
        self.logger.debug(format!(
            "launch want={} param={}",
            launch.want, launch.param
        ));

        let should_clean_up = self.config.clean_up_prior_instance;
        let bridge = self
            .bridge_loader
            .load(&self.provided_logger)
            .await
            .map_err(|e| {
                self.logger.fatal(format!("Failed to load native bridge: {}", e));
                AbilityError::BridgeInit(e)
            })?;
        let first = bridge.initialize(should_clean_up).await.map_err(|e| {
            self.logger
                .fatal(format!("Failed to initialize native bridge: {}", e));
            AbilityError::BridgeInit(e)
        })?;

        let debug_mode = match self.config.bridge_init {
            BridgeInitPolicy::Single => first.debug_mode_or_default(),
            BridgeInitPolicy::Confirm => {
                self.confirm_initialization(bridge.as_ref(), should_clean_up)
                    .await
            }
        };
        self.apply_debug_mode(debug_mode);

        let registry = InstanceRegistry::new(
            self.provided_logger.clone(),
            bridge.clone(),
            self.host_context.clone(),
            self.instance_factory.clone(),
            self.context_factory(),
        );
        if self.bridge.set(bridge).is_err() || self.registry.set(registry).is_err() {
            return Err(AbilityError::AlreadyCreated);
        }

        if let Some(me) = self.me.upgrade() {
            self.locator.publish(&self.config.locator_key, &me);
        }
        Ok(())
    }

    async fn confirm_initialization(
        &self,
        bridge: &dyn NativeBridge,
        should_clean_up: bool,
    ) -> bool {
        self.provided_logger.info(format!(
            "confirming native bridge initialization, should_clean_up: {}",
            should_clean_up
        ));
        match bridge.initialize(should_clean_up).await {
            Ok(report) => {
                self.provided_logger
                    .info(format!("initialize returned: {:?}", report));
                report.debug_mode_or_default()
            }
            Err(e) => {
                self.provided_logger
                    .error(format!("initialize confirmation failed: {}", e));
                true
            }
        }
    }

    fn apply_debug_mode(&self, enabled: bool) {
        self.debug_mode_enabled.store(enabled, Ordering::SeqCst);
        self.logger.set_min_severity(if enabled {
            LogSeverity::Debug
        } else {
            LogSeverity::Info
        });
        if enabled {
            self.logger
                .warn("Debug mode is enabled. Performance is affected.");
        }
    }

    fn context_factory(&self) -> ContextFactory {
        let me = self.me.clone();
        Arc::new(move |instance: Arc<dyn RuntimeInstance>| {
            let ability = me
                .upgrade()
                .ok_or_else(|| AbilityError::internal("ability has been dropped"))?;
            ability.build_context(instance, true)
        })
    }

    /// Host teardown: destroys every registered instance and withdraws this
    /// ability from the locator.
    pub fn on_destroy(&self) {
        let trace = self.logger.child("on_destroy").start_tracing();
        trace.in_scope(|| {
            self.for_each_instance("on_destroy", |instance| instance.on_destroy());
            self.locator.withdraw(&self.config.locator_key, &self.me);
        });
    }

    /// Records the readiness time on the first call after creation started
    /// and logs the startup latency. Calls before `on_create` and repeated
    /// calls do nothing.
    pub fn mark_readiness(&self) {
        let Some(initialized_at) = self.initialized_at.get() else {
            self.logger
                .warn("readiness signalled before creation started, ignoring");
            return;
        };
        let now = Timestamp::now();
        if self.ready_at.set(now).is_err() {
            return;
        }
        self.logger.warn(format!(
            "START UP TIME: {} ms",
            now.duration_since(initialized_at).as_millis()
        ));
    }

    pub async fn create_and_register_instance(
        &self,
        options: InstanceOptions,
    ) -> AbilityResult<Arc<dyn RuntimeInstance>> {
        let trace = self
            .logger
            .child("create_and_register_instance")
            .start_tracing();
        let registry = self.registry.get().ok_or(AbilityError::NotCreated)?;
        trace.instrument(registry.create_instance(options)).await
    }

    /// Calls the instance's destroy hook, then unregisters it. Instances
    /// this ability's registry does not hold are left untouched.
    pub fn destroy_and_unregister_instance(&self, instance: &Arc<dyn RuntimeInstance>) {
        let logger = self.logger.child("destroy_and_unregister_instance");
        let trace = logger.start_tracing();
        trace.in_scope(|| match self.registry.get() {
            Some(registry) if registry.owns(instance) => {
                instance.on_destroy();
                registry.delete_instance(instance.id());
            }
            _ => logger.warn(format!(
                "instance {} is not registered with this ability, ignoring",
                instance.id()
            )),
        });
    }

    /// Builds the context for an instance registered with this ability.
    pub fn create_context(
        &self,
        instance: Arc<dyn RuntimeInstance>,
    ) -> AbilityResult<RuntimeContext> {
        self.build_context(instance, false)
    }

    /// Context requests arriving through `InstanceDeps` may come from an
    /// instance whose creation has not returned yet.
    fn build_context(
        &self,
        instance: Arc<dyn RuntimeInstance>,
        allow_pending: bool,
    ) -> AbilityResult<RuntimeContext> {
        let registry = self.registry.get().ok_or(AbilityError::NotCreated)?;
        let pending = allow_pending && registry.is_pending(instance.id());
        if !pending && !registry.owns(&instance) {
            return Err(AbilityError::invalid_argument(format!(
                "instance {} was not created by this ability",
                instance.id()
            )));
        }
        Ok(RuntimeContext::new(
            self.config.runtime_version.clone(),
            instance,
            self.provided_logger.clone(),
            self.me.clone(),
        ))
    }

    pub fn logger(&self) -> AbilityLogger {
        self.provided_logger.clone()
    }

    pub async fn on_window_setup(&self, window: &dyn Window) -> WindowResult<()> {
        let trace = self.logger.child("on_window_setup").start_tracing();
        trace
            .instrument(window.set_layout_full_screen(true))
            .await
    }

    /// Sets up the main window and loads the configured page into it.
    /// Failures are logged; the host stays usable.
    pub async fn on_window_stage_create(&self, stage: &dyn WindowStage) {
        let logger = self.logger.child("on_window_stage_create");
        let trace = logger.start_tracing();
        if !trace
            .instrument(self.attach_main_window(stage, &logger))
            .await
        {
            return;
        }

        // the trace stays open until the host reports the load result
        let span = trace.span().clone();
        let content_logger = logger.clone();
        span.in_scope(|| {
            stage.load_content(
                self.page_path(),
                Box::new(move |result: ContentLoadResult| {
                    let _trace = trace;
                    match result {
                        Ok(data) => content_logger
                            .info(format!("Succeeded in loading the content: {}", data)),
                        Err(e) => {
                            content_logger.error(format!("Failed to load the content: {}", e))
                        }
                    }
                }),
            )
        });
    }

    async fn attach_main_window(&self, stage: &dyn WindowStage, logger: &AbilityLogger) -> bool {
        let window = match stage.main_window() {
            Ok(window) => window,
            Err(e) => {
                logger.error(format!("Failed to get main window: {}", e));
                return false;
            }
        };
        *self.window.write().await = Some(window.clone());

        if let Err(e) = self.on_window_setup(window.as_ref()).await {
            logger.error(format!("Failed to setup window: {}", e));
            return false;
        }
        true
    }

    pub async fn on_memory_level(&self, level: MemoryLevel) {
        let logger = self.logger.child("on_memory_level");
        let trace = logger.start_tracing();
        trace
            .instrument(async {
                logger.debug(format!("Received memory level event: {}", level));
                match self.bridge.get() {
                    Some(bridge) => {
                        if let Err(e) = bridge.notify_memory_level(level.code()).await {
                            logger.error(format!(
                                "Failed to notify bridge of memory level: {}",
                                e
                            ));
                        }
                    }
                    None => logger.debug("native bridge not initialized, skipping notification"),
                }
                self.for_each_instance("on_memory_level", |instance| {
                    instance.on_memory_level(level)
                });
            })
            .await;
    }

    pub fn on_configuration_update(&self, config: &Configuration) {
        let trace = self
            .logger
            .child("on_configuration_update")
            .start_tracing();
        trace.in_scope(|| {
            self.for_each_instance("on_configuration_update", |instance| {
                instance.on_configuration_update(config)
            })
        });
    }

    pub fn on_foreground(&self) {
        let trace = self.logger.child("on_foreground").start_tracing();
        trace.in_scope(|| self.for_each_instance("on_foreground", |instance| instance.on_foreground()));
    }

    pub fn on_background(&self) {
        let trace = self.logger.child("on_background").start_tracing();
        trace.in_scope(|| self.for_each_instance("on_background", |instance| instance.on_background()));
    }

    /// Forwards back press to every instance. The event is always consumed.
    pub fn on_back_press(&self) -> bool {
        let trace = self.logger.child("on_back_press").start_tracing();
        trace.in_scope(|| self.for_each_instance("on_back_press", |instance| instance.on_back_press()));
        true
    }

    fn for_each_instance<F>(&self, event: &str, f: F)
    where
        F: FnMut(&Arc<dyn RuntimeInstance>),
    {
        match self.registry.get() {
            Some(registry) => registry.for_each(f),
            None => self
                .logger
                .debug(format!("no instance registry yet, skipping {}", event)),
        }
    }

    pub fn config(&self) -> &AbilityConfig {
        &self.config
    }

    pub fn page_path(&self) -> &str {
        &self.config.page_path
    }

    pub fn is_debug_mode_enabled(&self) -> bool {
        self.debug_mode_enabled.load(Ordering::SeqCst)
    }

    pub fn registry(&self) -> Option<&InstanceRegistry> {
        self.registry.get()
    }

    pub fn bridge(&self) -> Option<Arc<dyn NativeBridge>> {
        self.bridge.get().cloned()
    }

    pub async fn window(&self) -> Option<Arc<dyn Window>> {
        self.window.read().await.clone()
    }

    pub fn initialization_timestamp(&self) -> Option<Timestamp> {
        self.initialized_at.get().copied()
    }

    pub fn readiness_timestamp(&self) -> Option<Timestamp> {
        self.ready_at.get().copied()
    }

    /// Time from the start of creation to the first readiness signal.
    pub fn startup_latency(&self) -> Option<Duration> {
        let initialized_at = self.initialized_at.get()?;
        let ready_at = self.ready_at.get()?;
        Some(ready_at.duration_since(initialized_at))
    }
}
