use tracing_subscriber::{EnvFilter, FmtSubscriber};

use crate::{AbilityError, AbilityResult};

/// Installs the global fmt subscriber. `RUST_LOG` wins over `default_filter`.
pub fn init_tracing(default_filter: &str) -> AbilityResult<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .map_err(|e| AbilityError::Config(format!("Invalid log filter: {}", e)))?;
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| AbilityError::internal(format!("Failed to set tracing subscriber: {}", e)))
}
