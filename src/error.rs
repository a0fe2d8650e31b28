use thiserror::Error;

use crate::bridge::BridgeError;
use crate::instance::InstanceError;

#[derive(Error, Debug)]
pub enum AbilityError {
    /// Loading the native bridge or its mandatory first `initialize` call failed.
    #[error("Failed to initialize native bridge: {0}")]
    BridgeInit(#[source] BridgeError),
    #[error("Ability has not been created yet")]
    NotCreated,
    #[error("Ability has already been created")]
    AlreadyCreated,
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("Instance error: {0}")]
    Instance(#[from] InstanceError),
    #[error("Config error: {0}")]
    Config(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

pub type AbilityResult<T> = Result<T, AbilityError>;

impl AbilityError {
    pub fn internal<S: Into<String>>(message: S) -> Self {
        AbilityError::Internal(message.into())
    }

    pub fn invalid_argument<S: Into<String>>(message: S) -> Self {
        AbilityError::InvalidArgument(message.into())
    }

    /// True for errors that must abort host component creation.
    pub fn is_fatal(&self) -> bool {
        matches!(self, AbilityError::BridgeInit(_))
    }
}
