#![forbid(unsafe_code)]

//! Tracing layer that formats events as single log lines.
//!
//! [`ConsoleLayer`] turns each tracing event into
//! `HH:MM:SS LEVEL target: message key=value ...` and hands it to a
//! [`LogSink`]. The browser frontend installs a sink that forwards to the
//! devtools console at the matching level; tests use [`CaptureSink`].
//!
//! ```ignore
//! use espejo_web::console_layer::{CaptureSink, ConsoleLayer};
//! use tracing_subscriber::prelude::*;
//!
//! let sink = CaptureSink::new();
//! tracing_subscriber::registry()
//!     .with(ConsoleLayer::new(sink.clone()))
//!     .init();
//! ```

use std::fmt::{self, Write as FmtWrite};
use std::sync::{Arc, Mutex};

use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::Layer;
use tracing_subscriber::layer::Context;

// ============================================================================
// Sinks
// ============================================================================

/// Destination for formatted log lines.
pub trait LogSink: Send + Sync + 'static {
    fn write(&self, level: Level, line: &str);
}

/// Sink that keeps every line in memory.
#[derive(Debug, Clone, Default)]
pub struct CaptureSink {
    lines: Arc<Mutex<Vec<(Level, String)>>>,
}

impl CaptureSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Captured lines without their levels.
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        self.entries().into_iter().map(|(_, line)| line).collect()
    }

    /// Captured `(level, line)` pairs.
    #[must_use]
    pub fn entries(&self) -> Vec<(Level, String)> {
        match self.lines.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl LogSink for CaptureSink {
    fn write(&self, level: Level, line: &str) {
        let mut guard = match self.lines.lock() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.push((level, line.to_string()));
    }
}

// ============================================================================
// Formatting helpers
// ============================================================================

/// Format level as a fixed-width string.
fn level_str(level: Level) -> &'static str {
    match level {
        Level::ERROR => "ERROR",
        Level::WARN => "WARN ",
        Level::INFO => "INFO ",
        Level::DEBUG => "DEBUG",
        Level::TRACE => "TRACE",
    }
}

/// Extracts message and structured fields from a tracing event.
#[derive(Default)]
struct EventVisitor {
    message: Option<String>,
    fields: Vec<(String, String)>,
}

impl EventVisitor {
    fn push(&mut self, field: &Field, value: String) {
        if field.name() == "message" {
            self.message = Some(value);
        } else {
            self.fields.push((field.name().to_string(), value));
        }
    }
}

impl Visit for EventVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        let rendered = format!("{value:?}");
        self.push(field, strip_debug_quotes(&rendered));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.push(field, value.to_string());
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.push(field, value.to_string());
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.push(field, value.to_string());
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.push(field, value.to_string());
    }
}

/// Remove surrounding quotes from Debug-formatted strings.
fn strip_debug_quotes(s: &str) -> String {
    if s.len() >= 2 && s.starts_with('"') && s.ends_with('"') {
        s[1..s.len() - 1].to_string()
    } else {
        s.to_string()
    }
}

/// Wall-clock `HH:MM:SS` (UTC). `web_time` keeps this working on wasm32.
fn timestamp_now() -> String {
    let since_epoch = web_time::SystemTime::now()
        .duration_since(web_time::UNIX_EPOCH)
        .unwrap_or_default();
    let secs = since_epoch.as_secs();
    let h = (secs / 3600) % 24;
    let m = (secs % 3600) / 60;
    let s = secs % 60;
    format!("{h:02}:{m:02}:{s:02}")
}

// ============================================================================
// ConsoleLayer
// ============================================================================

/// A `tracing_subscriber::Layer` writing one line per event to a [`LogSink`]:
/// `HH:MM:SS LEVEL target: message key=value...`.
pub struct ConsoleLayer<S: LogSink> {
    sink: S,
}

impl<S: LogSink> ConsoleLayer<S> {
    pub fn new(sink: S) -> Self {
        Self { sink }
    }

    fn format_event(&self, event: &Event<'_>) -> String {
        let metadata = event.metadata();
        let mut visitor = EventVisitor::default();
        event.record(&mut visitor);

        let mut line = timestamp_now();
        line.push(' ');
        line.push_str(level_str(*metadata.level()));
        let _ = write!(line, " {}: ", metadata.target());
        line.push_str(visitor.message.as_deref().unwrap_or_default());
        for (k, v) in &visitor.fields {
            let _ = write!(line, " {k}={v}");
        }
        line
    }
}

impl<S, Sub> Layer<Sub> for ConsoleLayer<S>
where
    S: LogSink,
    Sub: Subscriber,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, Sub>) {
        let line = self.format_event(event);
        self.sink.write(*event.metadata().level(), &line);
    }
}
