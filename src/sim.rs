//! Headless collaborators for driving an ability without a real host.
//!
//! Used by the `ability-sim` binary and by tests: a scripted native bridge, an
//! instance that records every hook it receives, and a window stage that
//! completes content loading immediately.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use dashmap::DashMap;

use crate::bridge::{BridgeResult, InitReport, NativeBridge};
use crate::context::{ContextFactory, RuntimeContext};
use crate::instance::{
    InstanceDeps, InstanceError, InstanceFactory, InstanceId, InstanceOptions, InstanceResult,
    RuntimeInstance,
};
use crate::lifecycle::{Configuration, MemoryLevel};
use crate::logger::AbilityLogger;
use crate::window::{
    ContentLoadCallback, ContentLoadError, Window, WindowError, WindowResult, WindowStage,
};
use crate::AbilityResult;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Bridge answering initialize calls from a script of responses.
///
/// Once the script runs out, every call reports `fallback`.
pub struct ScriptedBridge {
    responses: Mutex<VecDeque<BridgeResult<InitReport>>>,
    fallback: InitReport,
    initialize_calls: AtomicUsize,
    memory_levels: Mutex<Vec<i32>>,
}

impl ScriptedBridge {
    pub fn new(fallback: InitReport) -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            fallback,
            initialize_calls: AtomicUsize::new(0),
            memory_levels: Mutex::new(vec![]),
        }
    }

    pub fn push_response(self, response: BridgeResult<InitReport>) -> Self {
        lock(&self.responses).push_back(response);
        self
    }

    pub fn initialize_calls(&self) -> usize {
        self.initialize_calls.load(Ordering::SeqCst)
    }

    pub fn memory_levels(&self) -> Vec<i32> {
        lock(&self.memory_levels).clone()
    }
}

#[async_trait]
impl NativeBridge for ScriptedBridge {
    async fn initialize(&self, _should_clean_up: bool) -> BridgeResult<InitReport> {
        self.initialize_calls.fetch_add(1, Ordering::SeqCst);
        let scripted = lock(&self.responses).pop_front();
        scripted.unwrap_or_else(|| Ok(self.fallback.clone()))
    }

    async fn notify_memory_level(&self, level: i32) -> BridgeResult<()> {
        lock(&self.memory_levels).push(level);
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, strum::Display)]
pub enum InstanceEvent {
    Destroy,
    ConfigurationUpdate(Configuration),
    Foreground,
    Background,
    BackPress,
    MemoryLevel(MemoryLevel),
}

/// Instance that records the hooks it receives.
pub struct RecordingInstance {
    id: InstanceId,
    options: InstanceOptions,
    logger: AbilityLogger,
    context_factory: Option<ContextFactory>,
    events: Mutex<Vec<InstanceEvent>>,
}

impl RecordingInstance {
    pub fn options(&self) -> &InstanceOptions {
        &self.options
    }

    pub fn events(&self) -> Vec<InstanceEvent> {
        lock(&self.events).clone()
    }

    pub fn count(&self, event: &InstanceEvent) -> usize {
        lock(&self.events).iter().filter(|e| *e == event).count()
    }

    pub fn is_destroyed(&self) -> bool {
        self.count(&InstanceEvent::Destroy) > 0
    }

    /// Requests this instance's context from the owning ability.
    pub fn context(self: &Arc<Self>) -> AbilityResult<RuntimeContext> {
        let factory = self
            .context_factory
            .as_ref()
            .ok_or_else(|| crate::AbilityError::internal("instance has no owning ability"))?;
        let instance: Arc<dyn RuntimeInstance> = self.clone();
        factory(instance)
    }

    fn record(&self, event: InstanceEvent) {
        self.logger
            .debug(format!("instance {} received {}", self.id, event));
        lock(&self.events).push(event);
    }
}

impl RuntimeInstance for RecordingInstance {
    fn id(&self) -> InstanceId {
        self.id
    }

    fn on_destroy(&self) {
        self.record(InstanceEvent::Destroy);
    }

    fn on_configuration_update(&self, config: &Configuration) {
        self.record(InstanceEvent::ConfigurationUpdate(config.clone()));
    }

    fn on_foreground(&self) {
        self.record(InstanceEvent::Foreground);
    }

    fn on_background(&self) {
        self.record(InstanceEvent::Background);
    }

    fn on_back_press(&self) {
        self.record(InstanceEvent::BackPress);
    }

    fn on_memory_level(&self, level: MemoryLevel) {
        self.record(InstanceEvent::MemoryLevel(level));
    }
}

/// Factory producing `RecordingInstance`s and keeping a typed handle to each.
#[derive(Default)]
pub struct RecordingInstanceFactory {
    created: DashMap<InstanceId, Arc<RecordingInstance>>,
    fail_next: AtomicBool,
}

impl RecordingInstanceFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_next_creation(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    pub fn instance(&self, id: InstanceId) -> Option<Arc<RecordingInstance>> {
        self.created.get(&id).map(|entry| entry.value().clone())
    }

    pub fn created_count(&self) -> usize {
        self.created.len()
    }

    /// An instance that no registry knows about.
    pub fn detached_instance(&self, id: u64) -> Arc<dyn RuntimeInstance> {
        Arc::new(RecordingInstance {
            id: InstanceId::new(id),
            options: InstanceOptions::named("detached"),
            logger: AbilityLogger::new("detached"),
            context_factory: None,
            events: Mutex::new(vec![]),
        })
    }
}

#[async_trait]
impl InstanceFactory for RecordingInstanceFactory {
    async fn create(&self, deps: InstanceDeps) -> InstanceResult<Arc<dyn RuntimeInstance>> {
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(InstanceError::CreationFailed {
                name: deps.options.name,
                message: "scripted failure".to_string(),
            });
        }
        // let concurrent creations interleave
        tokio::task::yield_now().await;

        let instance = Arc::new(RecordingInstance {
            id: deps.id,
            logger: deps.logger.child(&format!("instance-{}", deps.id)),
            options: deps.options,
            context_factory: Some(deps.context_factory),
            events: Mutex::new(vec![]),
        });
        self.created.insert(deps.id, instance.clone());
        Ok(instance)
    }
}

#[derive(Default)]
pub struct HeadlessWindow {
    full_screen: AtomicBool,
    fail_setup: bool,
}

impl HeadlessWindow {
    pub fn is_full_screen(&self) -> bool {
        self.full_screen.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Window for HeadlessWindow {
    async fn set_layout_full_screen(&self, enabled: bool) -> WindowResult<()> {
        if self.fail_setup {
            return Err(WindowError::SetupFailed {
                message: "layout rejected".to_string(),
            });
        }
        self.full_screen.store(enabled, Ordering::SeqCst);
        Ok(())
    }
}

/// Window stage whose content loads complete synchronously.
pub struct HeadlessWindowStage {
    window: Option<Arc<HeadlessWindow>>,
    content_error: Option<ContentLoadError>,
    loaded_paths: Mutex<Vec<String>>,
}

impl Default for HeadlessWindowStage {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessWindowStage {
    pub fn new() -> Self {
        Self {
            window: Some(Arc::new(HeadlessWindow::default())),
            content_error: None,
            loaded_paths: Mutex::new(vec![]),
        }
    }

    pub fn without_window() -> Self {
        Self {
            window: None,
            ..Self::new()
        }
    }

    pub fn with_failing_setup() -> Self {
        Self {
            window: Some(Arc::new(HeadlessWindow {
                full_screen: AtomicBool::new(false),
                fail_setup: true,
            })),
            ..Self::new()
        }
    }

    pub fn with_content_error(code: i32, message: &str) -> Self {
        Self {
            content_error: Some(ContentLoadError {
                code,
                message: message.to_string(),
            }),
            ..Self::new()
        }
    }

    pub fn headless_window(&self) -> Option<Arc<HeadlessWindow>> {
        self.window.clone()
    }

    pub fn loaded_paths(&self) -> Vec<String> {
        lock(&self.loaded_paths).clone()
    }
}

impl WindowStage for HeadlessWindowStage {
    fn main_window(&self) -> WindowResult<Arc<dyn Window>> {
        match &self.window {
            Some(window) => Ok(window.clone()),
            None => Err(WindowError::MainWindowUnavailable {
                message: "headless stage has no window".to_string(),
            }),
        }
    }

    fn load_content(&self, path: &str, callback: ContentLoadCallback) {
        lock(&self.loaded_paths).push(path.to_string());
        match &self.content_error {
            Some(error) => callback(Err(error.clone())),
            None => callback(Ok(serde_json::json!({ "path": path }))),
        }
    }
}
