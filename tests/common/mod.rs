#![allow(dead_code)]

use std::sync::Arc;

use ability_host::{
    bridge::{InitReport, PreloadedBridge},
    config::AbilityConfig,
    context::HostContext,
    locator::AbilityLocator,
    sim::{RecordingInstanceFactory, ScriptedBridge},
    AbilityCollaborators, AbilityOrchestrator,
};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[ctor::ctor]
fn init_tests() {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::from_default_env())
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

pub const PAGE_PATH: &str = "pages/Index";

pub struct Harness {
    pub ability: Arc<AbilityOrchestrator>,
    pub bridge: Arc<ScriptedBridge>,
    pub factory: Arc<RecordingInstanceFactory>,
    pub locator: AbilityLocator,
}

pub fn harness_with(bridge: ScriptedBridge, config: AbilityConfig) -> Harness {
    let bridge = Arc::new(bridge);
    let factory = Arc::new(RecordingInstanceFactory::new());
    let locator = AbilityLocator::new();
    let ability = AbilityOrchestrator::new(
        config,
        AbilityCollaborators {
            bridge_loader: Arc::new(PreloadedBridge::new(bridge.clone())),
            instance_factory: factory.clone(),
            host_context: HostContext::new("com.example.app"),
            locator: locator.clone(),
            logger: None,
        },
    )
    .expect("valid config");
    Harness {
        ability,
        bridge,
        factory,
        locator,
    }
}

pub fn harness(bridge: ScriptedBridge) -> Harness {
    harness_with(bridge, AbilityConfig::new(PAGE_PATH))
}

/// Bridge that reports debug mode disabled on every call.
pub fn release_bridge() -> ScriptedBridge {
    ScriptedBridge::new(InitReport::with_debug_mode(false))
}
