//! Hierarchical logger on top of `tracing`.
//!
//! Every component asks for a named child of the logger it was given. All
//! loggers derived from the same root share one minimum severity, so the
//! orchestrator can lower or raise verbosity for the whole family at once.

use std::fmt::Display;
use std::future::Future;
use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use tracing::instrument::Instrumented;
use tracing::{Instrument, Span};

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Default,
    strum::Display,
    strum::EnumString,
)]
#[strum(serialize_all = "lowercase")]
#[repr(u8)]
pub enum LogSeverity {
    Debug = 0,
    #[default]
    Info = 1,
    Warn = 2,
    Error = 3,
    Fatal = 4,
}

impl LogSeverity {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => LogSeverity::Debug,
            1 => LogSeverity::Info,
            2 => LogSeverity::Warn,
            3 => LogSeverity::Error,
            _ => LogSeverity::Fatal,
        }
    }
}

#[derive(Clone)]
pub struct AbilityLogger {
    name: Arc<str>,
    min_severity: Arc<AtomicU8>,
    open_traces: Arc<AtomicUsize>,
}

impl std::fmt::Debug for AbilityLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AbilityLogger")
            .field("name", &self.name)
            .field("min_severity", &self.min_severity())
            .finish()
    }
}

impl AbilityLogger {
    pub fn new<S: AsRef<str>>(name: S) -> Self {
        Self {
            name: Arc::from(name.as_ref()),
            min_severity: Arc::new(AtomicU8::new(LogSeverity::Debug as u8)),
            open_traces: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Derives a logger named `<parent>::<name>` sharing this logger's settings.
    pub fn child(&self, name: &str) -> Self {
        let name = if self.name.is_empty() {
            name.to_string()
        } else {
            format!("{}::{}", self.name, name)
        };
        Self {
            name: Arc::from(name),
            min_severity: self.min_severity.clone(),
            open_traces: self.open_traces.clone(),
        }
    }

    pub fn min_severity(&self) -> LogSeverity {
        LogSeverity::from_u8(self.min_severity.load(Ordering::SeqCst))
    }

    pub fn set_min_severity(&self, severity: LogSeverity) {
        self.min_severity.store(severity as u8, Ordering::SeqCst);
    }

    pub fn is_enabled(&self, severity: LogSeverity) -> bool {
        severity >= self.min_severity()
    }

    pub fn debug(&self, message: impl Display) {
        if self.is_enabled(LogSeverity::Debug) {
            tracing::debug!(logger = %self.name, "{}", message);
        }
    }

    pub fn info(&self, message: impl Display) {
        if self.is_enabled(LogSeverity::Info) {
            tracing::info!(logger = %self.name, "{}", message);
        }
    }

    pub fn warn(&self, message: impl Display) {
        if self.is_enabled(LogSeverity::Warn) {
            tracing::warn!(logger = %self.name, "{}", message);
        }
    }

    pub fn error(&self, message: impl Display) {
        if self.is_enabled(LogSeverity::Error) {
            tracing::error!(logger = %self.name, "{}", message);
        }
    }

    pub fn fatal(&self, message: impl Display) {
        tracing::error!(logger = %self.name, fatal = true, "{}", message);
    }

    /// Opens a trace span named after this logger. The span closes when the
    /// returned guard is dropped. Spans opened while another trace is entered
    /// become its children.
    pub fn start_tracing(&self) -> TraceGuard {
        let span = tracing::debug_span!("trace", logger = %self.name);
        self.open_traces.fetch_add(1, Ordering::SeqCst);
        tracing::trace!(parent: &span, "start tracing");
        TraceGuard {
            span,
            started: Instant::now(),
            open_traces: self.open_traces.clone(),
        }
    }

    /// Number of trace guards opened by this logger family and not yet closed.
    pub fn open_trace_count(&self) -> usize {
        self.open_traces.load(Ordering::SeqCst)
    }
}

#[must_use = "the trace closes as soon as the guard is dropped"]
pub struct TraceGuard {
    span: Span,
    started: Instant,
    open_traces: Arc<AtomicUsize>,
}

impl TraceGuard {
    pub fn span(&self) -> &Span {
        &self.span
    }

    /// Runs `f` inside the trace span.
    pub fn in_scope<R>(&self, f: impl FnOnce() -> R) -> R {
        self.span.in_scope(f)
    }

    /// Attaches the trace span to `future`, entering it on every poll.
    pub fn instrument<F: Future>(&self, future: F) -> Instrumented<F> {
        future.instrument(self.span.clone())
    }
}

impl Drop for TraceGuard {
    fn drop(&mut self) {
        let elapsed_us = self.started.elapsed().as_micros() as u64;
        tracing::trace!(parent: &self.span, elapsed_us, "stop tracing");
        self.open_traces.fetch_sub(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::str::FromStr;
    use tracing_subscriber::registry::{LookupSpan, Registry};

    #[test]
    fn test_child_names_are_hierarchical() {
        let root = AbilityLogger::new("RNOH");
        let child = root.child("AbilityOrchestrator").child("on_create");
        assert_eq!(child.name(), "RNOH::AbilityOrchestrator::on_create");

        let unnamed = AbilityLogger::new("");
        assert_eq!(unnamed.child("registry").name(), "registry");
    }

    #[test]
    fn test_severity_is_shared_across_children() {
        let root = AbilityLogger::new("root");
        let child = root.child("child");
        assert_eq!(child.min_severity(), LogSeverity::Debug);

        child.set_min_severity(LogSeverity::Info);
        assert_eq!(root.min_severity(), LogSeverity::Info);
        assert!(!root.is_enabled(LogSeverity::Debug));
        assert!(root.is_enabled(LogSeverity::Warn));
    }

    #[test]
    fn test_trace_guard_closes_on_drop() {
        let logger = AbilityLogger::new("root");
        let outer = logger.start_tracing();
        {
            let _inner = logger.child("inner").start_tracing();
            assert_eq!(logger.open_trace_count(), 2);
        }
        assert_eq!(logger.open_trace_count(), 1);
        drop(outer);
        assert_eq!(logger.open_trace_count(), 0);
    }

    fn parent_of(child: &Span) -> Option<tracing::Id> {
        let id = child.id()?;
        tracing::dispatcher::get_default(|dispatch| {
            let registry = dispatch.downcast_ref::<Registry>()?;
            let span = registry.span(&id)?;
            span.parent().map(|parent| parent.id())
        })
    }

    #[test]
    fn test_traces_opened_in_scope_are_nested() {
        let _default = tracing::subscriber::set_default(Registry::default());
        let logger = AbilityLogger::new("root");
        let outer = logger.start_tracing();
        let inner = outer.in_scope(|| logger.child("inner").start_tracing());

        assert!(outer.span().id().is_some());
        assert_eq!(parent_of(inner.span()), outer.span().id());

        let detached = logger.child("detached").start_tracing();
        assert_eq!(parent_of(detached.span()), None);
    }

    #[tokio::test]
    async fn test_instrumented_future_runs_inside_trace() {
        let _default = tracing::subscriber::set_default(Registry::default());
        let logger = AbilityLogger::new("root");
        let trace = logger.start_tracing();

        let current = TraceGuard::instrument(&trace, async { Span::current().id() }).await;
        assert!(current.is_some());
        assert_eq!(current, trace.span().id());
    }

    #[test]
    fn test_severity_parsing() {
        assert_eq!(LogSeverity::from_str("warn").unwrap(), LogSeverity::Warn);
        assert_eq!(LogSeverity::Debug.to_string(), "debug");
        assert!(LogSeverity::Debug < LogSeverity::Info);
    }
}
