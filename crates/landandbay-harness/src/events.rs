// crates/landandbay-harness/src/events.rs
// ============================================================================
// Module: Lifecycle Events
// Description: Structured JSON-lines events for terraform lifecycle steps.
// Purpose: Make apply, retry, and teardown outcomes visible without a logging
//          framework dependency.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! Every terraform command the harness runs emits a [`HarnessEvent`] through an
//! [`EventSink`]. Sinks write one JSON object per line to stderr or to an
//! append-only file; teardown failures are always recorded here so leaked
//! resources are visible in the run log.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use serde::Serialize;

use crate::config::HarnessConfig;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Severity of a lifecycle event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventLevel {
    /// Routine progress.
    Info,
    /// Recoverable problem, such as a retried command.
    Warn,
    /// Failure that needs operator attention.
    Error,
}

/// Lifecycle event payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HarnessEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event severity.
    pub level: EventLevel,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Terraform working directory.
    pub dir: String,
    /// Resource name prefix when known.
    pub prefix: Option<String>,
    /// Terraform subcommand.
    pub command: Option<&'static str>,
    /// Attempt number (1-based) for retried commands.
    pub attempt: Option<u32>,
    /// Free-form detail, typically the tail of stderr.
    pub detail: Option<String>,
}

impl HarnessEvent {
    /// Creates an info-level event for the given directory.
    #[must_use]
    pub fn new(event: &'static str, dir: &Path) -> Self {
        Self {
            event,
            level: EventLevel::Info,
            timestamp_ms: now_millis(),
            dir: dir.display().to_string(),
            prefix: None,
            command: None,
            attempt: None,
            detail: None,
        }
    }

    /// Sets the event severity.
    #[must_use]
    pub const fn with_level(mut self, level: EventLevel) -> Self {
        self.level = level;
        self
    }

    /// Sets the resource prefix.
    #[must_use]
    pub fn with_prefix(mut self, prefix: Option<&str>) -> Self {
        self.prefix = prefix.map(str::to_string);
        self
    }

    /// Sets the terraform subcommand.
    #[must_use]
    pub const fn with_command(mut self, command: &'static str) -> Self {
        self.command = Some(command);
        self
    }

    /// Sets the attempt number.
    #[must_use]
    pub const fn with_attempt(mut self, attempt: u32) -> Self {
        self.attempt = Some(attempt);
        self
    }

    /// Sets the detail text.
    #[must_use]
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

// ============================================================================
// SECTION: Sinks
// ============================================================================

/// Sink for lifecycle events.
pub trait EventSink: Send + Sync {
    /// Record a lifecycle event.
    fn record(&self, event: &HarnessEvent);
}

/// Event sink that logs JSON lines to stderr.
pub struct StderrEventSink;

impl EventSink for StderrEventSink {
    fn record(&self, event: &HarnessEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            let _ = writeln!(io::stderr(), "{payload}");
        }
    }
}

/// Event sink that appends JSON lines to a file.
pub struct FileEventSink {
    /// File handle used for append-only logging.
    file: Mutex<std::fs::File>,
}

impl FileEventSink {
    /// Opens the event log in append mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn new(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

impl EventSink for FileEventSink {
    fn record(&self, event: &HarnessEvent) {
        if let Ok(payload) = serde_json::to_string(event)
            && let Ok(mut file) = self.file.lock()
        {
            let _ = writeln!(file, "{payload}");
            let _ = file.flush();
        }
    }
}

/// No-op event sink.
pub struct NoopEventSink;

impl EventSink for NoopEventSink {
    fn record(&self, _event: &HarnessEvent) {}
}

/// In-memory event sink for tests and tooling.
#[derive(Default)]
pub struct MemoryEventSink {
    /// Recorded events in arrival order.
    events: Mutex<Vec<HarnessEvent>>,
}

impl MemoryEventSink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of recorded events.
    #[must_use]
    pub fn events(&self) -> Vec<HarnessEvent> {
        self.events.lock().map(|events| events.clone()).unwrap_or_default()
    }

    /// Returns the identifiers of recorded events.
    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        self.events().iter().map(|event| event.event).collect()
    }
}

impl EventSink for MemoryEventSink {
    fn record(&self, event: &HarnessEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}

/// Builds the sink selected by configuration: the event log file when set,
/// stderr otherwise.
///
/// # Errors
///
/// Returns an error when the configured event log cannot be opened.
pub fn sink_for(config: &HarnessConfig) -> io::Result<Arc<dyn EventSink>> {
    match &config.event_log {
        Some(path) => Ok(Arc::new(FileEventSink::new(path)?)),
        None => Ok(Arc::new(StderrEventSink)),
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Returns the current time in milliseconds since the Unix epoch.
fn now_millis() -> u128 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis()
}

// ============================================================================
// SECTION: Tests
// ============================================================================
