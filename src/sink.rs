//! Destinations for log lines.
//!
//! Every line the interceptor produces is handed to a [`LogSink`] as a
//! `(tag, message)` pair. [`TracingSink`] forwards lines to `tracing`, and
//! [`MultiSink`] fans a line out to several sinks.

use std::sync::Arc;
use tracing::{debug, error, info, trace, warn, Level};

/// Receiver of formatted log lines.
///
/// Implementations must not block for long: they are called in-line on the task
/// executing the HTTP call.
///
/// # Examples
///
/// ```rust
/// use reqlog::LogSink;
///
/// #[derive(Debug)]
/// struct StderrSink;
///
/// impl LogSink for StderrSink {
///     fn log(&self, tag: &str, message: &str) {
///         eprintln!("[{tag}] {message}");
///     }
/// }
/// ```
pub trait LogSink: Send + Sync + 'static {
    /// Record one line under `tag`.
    fn log(&self, tag: &str, message: &str);
}

impl<T: LogSink + ?Sized> LogSink for Arc<T> {
    fn log(&self, tag: &str, message: &str) {
        (**self).log(tag, message)
    }
}

impl<T: LogSink + ?Sized> LogSink for Box<T> {
    fn log(&self, tag: &str, message: &str) {
        (**self).log(tag, message)
    }
}

/// [`LogSink`] that emits each line as a `tracing` event.
///
/// The tag is recorded in the `tag` field. Lines are emitted at `ERROR` by
/// default so they survive whatever level filter the application runs with;
/// use [`TracingSink::with_level`] to pick something quieter.
#[derive(Debug, Clone, Copy)]
pub struct TracingSink {
    level: Level,
}

impl TracingSink {
    /// Create a sink that logs at `ERROR`.
    pub fn new() -> Self {
        Self { level: Level::ERROR }
    }

    /// Create a sink that logs at `level`.
    pub fn with_level(level: Level) -> Self {
        Self { level }
    }

    /// The level lines are emitted at.
    pub fn level(&self) -> Level {
        self.level
    }
}

impl Default for TracingSink {
    fn default() -> Self {
        Self::new()
    }
}

impl LogSink for TracingSink {
    fn log(&self, tag: &str, message: &str) {
        if self.level == Level::ERROR {
            error!(tag = %tag, "{message}");
        } else if self.level == Level::WARN {
            warn!(tag = %tag, "{message}");
        } else if self.level == Level::INFO {
            info!(tag = %tag, "{message}");
        } else if self.level == Level::DEBUG {
            debug!(tag = %tag, "{message}");
        } else {
            trace!(tag = %tag, "{message}");
        }
    }
}

/// A sink that delegates to multiple inner sinks.
///
/// Sinks receive each line in the order they were added.
///
/// ```rust
/// use reqlog::{MultiSink, TracingSink};
/// use tracing::Level;
///
/// let sink = MultiSink::new()
///     .with(TracingSink::new())
///     .with(TracingSink::with_level(Level::DEBUG));
/// assert_eq!(sink.len(), 2);
/// ```
#[derive(Default)]
pub struct MultiSink {
    sinks: Vec<Arc<dyn LogSink>>,
}

impl MultiSink {
    /// Create a new empty MultiSink.
    pub fn new() -> Self {
        Self { sinks: Vec::new() }
    }

    /// Add a sink to the chain. Returns self for builder pattern.
    pub fn with<S: LogSink>(mut self, sink: S) -> Self {
        self.sinks.push(Arc::new(sink));
        self
    }

    /// Returns true if no sinks have been added.
    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    /// Returns the number of sinks in the chain.
    pub fn len(&self) -> usize {
        self.sinks.len()
    }
}

impl LogSink for MultiSink {
    fn log(&self, tag: &str, message: &str) {
        for sink in &self.sinks {
            sink.log(tag, message);
        }
    }
}

/// A sink bound to the tag every line is logged under.
#[derive(Clone)]
pub(crate) struct TaggedSink {
    tag: Arc<str>,
    sink: Arc<dyn LogSink>,
}

impl TaggedSink {
    pub(crate) fn new(tag: &str, sink: Arc<dyn LogSink>) -> Self {
        Self {
            tag: Arc::from(tag),
            sink,
        }
    }

    pub(crate) fn tag(&self) -> &str {
        &self.tag
    }

    pub(crate) fn emit(&self, message: impl AsRef<str>) {
        self.sink.log(&self.tag, message.as_ref());
    }
}
