//! # ability-host: lifecycle orchestration for an embedded managed runtime
//!
//! The host environment drives a component through creation, window attach,
//! foreground/background, memory pressure and teardown. This crate turns
//! those callbacks into operations on a native bridge and on the managed
//! runtime instances created through it.
//!
//! ## Components
//!
//! - [`bridge`]: the native bridge contract (initialize handshake, memory
//!   pressure notification) and its loaders.
//! - [`logger`]: hierarchical named logger with a shared minimum severity and
//!   scoped trace guards, built on `tracing`.
//! - [`instance`]: the lifecycle hooks every managed instance supports and the
//!   factory that builds instances.
//! - [`registry`]: owns the live instances of one ability and fans events out
//!   to them.
//! - [`ability`]: the orchestrator tying everything together.
//!
//! ## Creation protocol
//!
//! ```text
//! load bridge → initialize → confirm initialize → set log level → registry → publish
//! ```
//!
//! Loading the bridge and the first initialize call are the only fatal
//! steps. A failing confirmation call leaves debug mode enabled and creation
//! continues. Lifecycle events arriving before creation has completed find no
//! registry and are skipped.
//!
//! ## Headless use
//!
//! The [`sim`] module contains scripted collaborators used by the
//! `ability-sim` binary and by the test suite.

pub mod ability;
pub mod bridge;
pub mod config;
pub mod context;
pub mod error;
pub mod instance;
pub mod lifecycle;
pub mod locator;
pub mod logger;
pub mod registry;
pub mod sim;
pub mod telemetry;
pub mod timestamp;
pub mod window;

// Re-exports
pub use ability::{AbilityCollaborators, AbilityOrchestrator};
pub use error::*;
