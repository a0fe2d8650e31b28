use std::path::PathBuf;
use std::sync::Arc;

use ability_host::{
    bridge::{InitReport, PreloadedBridge},
    config::AbilityConfig,
    context::HostContext,
    instance::{InstanceOptions, RuntimeInstance},
    lifecycle::{ColorMode, Configuration, LaunchParams, MemoryLevel},
    locator::AbilityLocator,
    sim::{HeadlessWindowStage, RecordingInstanceFactory, ScriptedBridge},
    telemetry, AbilityCollaborators, AbilityError, AbilityOrchestrator,
};
use clap::Parser;
use tracing::{debug, info};

/// Drives a full ability lifecycle against headless collaborators.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Page path used when no config file is given
    #[arg(short, long, default_value = "pages/Index")]
    page_path: String,

    /// Number of instances to create
    #[arg(short, long, default_value_t = 2)]
    instances: usize,

    /// Debug-mode flag the simulated bridge reports
    #[arg(long)]
    bridge_debug: bool,

    /// Memory level (0-2) to deliver after startup
    #[arg(long, default_value_t = 1)]
    memory_level: i32,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn load_config(cli: &Cli) -> Result<AbilityConfig, AbilityError> {
    match &cli.config {
        Some(path) => AbilityConfig::from_file(path),
        None => Ok(AbilityConfig::new(cli.page_path.clone())),
    }
}

async fn run(cli: &Cli, config: AbilityConfig) -> Result<(), AbilityError> {
    debug!("config: {:?}", config);

    let bridge = Arc::new(ScriptedBridge::new(InitReport::with_debug_mode(
        cli.bridge_debug,
    )));
    let factory = Arc::new(RecordingInstanceFactory::new());
    let locator = AbilityLocator::new();
    let ability = AbilityOrchestrator::new(
        config,
        AbilityCollaborators {
            bridge_loader: Arc::new(PreloadedBridge::new(bridge.clone())),
            instance_factory: factory.clone(),
            host_context: HostContext::new("com.example.sim"),
            locator: locator.clone(),
            logger: None,
        },
    )?;

    ability.on_create(LaunchParams::default()).await?;
    info!(
        "ability created, debug mode: {}",
        ability.is_debug_mode_enabled()
    );
    let key = ability.config().locator_key.clone();
    info!("published as {}: {}", key, locator.contains(&key));

    let stage = HeadlessWindowStage::new();
    ability.on_window_stage_create(&stage).await;

    let mut instances: Vec<Arc<dyn RuntimeInstance>> = vec![];
    for i in 0..cli.instances {
        let instance = ability
            .create_and_register_instance(InstanceOptions::named(format!("app-{}", i)))
            .await?;
        instances.push(instance);
    }
    ability.mark_readiness();

    ability.on_foreground();
    ability.on_configuration_update(&Configuration {
        color_mode: Some(ColorMode::Dark),
        ..Default::default()
    });
    ability
        .on_memory_level(MemoryLevel::try_from(cli.memory_level)?)
        .await;
    ability.on_back_press();
    ability.on_background();

    if let Some(first) = instances.first() {
        ability.destroy_and_unregister_instance(first);
    }
    ability.on_destroy();

    println!("initialize calls:   {}", bridge.initialize_calls());
    println!("memory levels:      {:?}", bridge.memory_levels());
    println!("loaded pages:       {:?}", stage.loaded_paths());
    println!("instances created:  {}", factory.created_count());
    if let Some(latency) = ability.startup_latency() {
        println!("startup latency:    {} ms", latency.as_millis());
    }
    for instance in &instances {
        if let Some(recorded) = factory.instance(instance.id()) {
            let events: Vec<String> = recorded.events().iter().map(|e| e.to_string()).collect();
            println!("instance {}: {}", instance.id(), events.join(", "));
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };
    let filter = if cli.verbose {
        "debug".to_string()
    } else {
        config.log_filter.clone()
    };
    if let Err(e) = telemetry::init_tracing(&filter) {
        eprintln!("{}", e);
    }

    if let Err(e) = run(&cli, config).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
