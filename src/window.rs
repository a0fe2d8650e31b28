//! Windowing contract offered by the host.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum WindowError {
    #[error("Main window unavailable: {message}")]
    MainWindowUnavailable { message: String },
    #[error("Window setup failed: {message}")]
    SetupFailed { message: String },
}

pub type WindowResult<T> = Result<T, WindowError>;

/// Content loading failure as reported by the host, with its error code.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("content load failed with code {code}: {message}")]
pub struct ContentLoadError {
    pub code: i32,
    pub message: String,
}

pub type ContentLoadResult = Result<serde_json::Value, ContentLoadError>;

pub type ContentLoadCallback = Box<dyn FnOnce(ContentLoadResult) + Send + 'static>;

#[mockall::automock]
#[async_trait]
pub trait Window: Send + Sync {
    async fn set_layout_full_screen(&self, enabled: bool) -> WindowResult<()>;
}

pub trait WindowStage: Send + Sync {
    fn main_window(&self) -> WindowResult<Arc<dyn Window>>;

    /// Starts loading the page at `path`. `callback` runs once loading
    /// completes, possibly after this call has returned.
    fn load_content(&self, path: &str, callback: ContentLoadCallback);
}
