//! Reporting collaborator for decorator events
//!
//! Decorators describe what they observed as [`CallEvent`]s and hand them to
//! a [`Reporter`]. Where the events end up (tracing, JSON lines, memory) is
//! the reporter's business.

use std::io::Write;
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use tracing::{debug, warn};

use crate::facade::current_boundary;
use crate::key::{join_args, ArgValue};

/// Kind of event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    /// Call is about to be delegated
    Enter,
    /// Delegate returned
    Exit,
    /// Duration of the delegate call
    Timing,
}

/// One structured event
///
/// Serializes as
/// `{"event", "operation", "args", "result"?, "durationMicros"?, "boundary"?, "at"}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CallEvent {
    /// What happened
    pub event: EventKind,
    /// Operation name
    pub operation: String,
    /// Argument snapshot
    pub args: Vec<ArgValue>,
    /// Rendered result (exit events)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    /// Elapsed time (timing events)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_micros: Option<u64>,
    /// Innermost facade boundary active for the call
    #[serde(skip_serializing_if = "Option::is_none")]
    pub boundary: Option<String>,
    /// Wall-clock time the event was produced
    pub at: DateTime<Utc>,
}

/// Receives decorator events
pub trait Reporter: Send + Sync {
    /// Handle one event. Must not fail the intercepted call.
    fn report(&self, event: &CallEvent);
}

/// State of one intercepted call, owned by the decorator frame
#[derive(Debug)]
pub struct CallRecord {
    operation: &'static str,
    args: Vec<ArgValue>,
    started: Instant,
    boundary: Option<Arc<str>>,
}

impl CallRecord {
    /// Start recording a call
    pub fn start(operation: &'static str, args: Vec<ArgValue>) -> Self {
        Self {
            operation,
            args,
            started: Instant::now(),
            boundary: current_boundary(),
        }
    }

    /// Operation name
    pub fn operation(&self) -> &'static str {
        self.operation
    }

    /// Enter event
    pub fn enter(&self) -> CallEvent {
        self.event(EventKind::Enter)
    }

    /// Exit event carrying the rendered result
    pub fn exit(&self, result: String) -> CallEvent {
        CallEvent {
            result: Some(result),
            ..self.event(EventKind::Exit)
        }
    }

    /// Timing event, measured from [`CallRecord::start`] until now
    pub fn timing(&self) -> CallEvent {
        let micros = u64::try_from(self.started.elapsed().as_micros()).unwrap_or(u64::MAX);
        CallEvent {
            duration_micros: Some(micros),
            ..self.event(EventKind::Timing)
        }
    }

    fn event(&self, kind: EventKind) -> CallEvent {
        CallEvent {
            event: kind,
            operation: self.operation.to_string(),
            args: self.args.clone(),
            result: None,
            duration_micros: None,
            boundary: self.boundary.as_deref().map(str::to_string),
            at: Utc::now(),
        }
    }
}

/// Writes events as debug-level tracing lines
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn report(&self, event: &CallEvent) {
        let args = join_args(&event.args);
        let boundary = event.boundary.as_deref().unwrap_or("-");
        match event.event {
            EventKind::Enter => {
                debug!(boundary, "Intercepted {}({})", event.operation, args);
            }
            EventKind::Exit => {
                debug!(
                    boundary,
                    "{}({}) returned {}",
                    event.operation,
                    args,
                    event.result.as_deref().unwrap_or("")
                );
            }
            EventKind::Timing => {
                debug!(
                    boundary,
                    "{}({}) took {}us",
                    event.operation,
                    args,
                    event.duration_micros.unwrap_or_default()
                );
            }
        }
    }
}

/// Writes one JSON object per event to `W`
pub struct JsonReporter<W> {
    out: Mutex<W>,
}

impl<W: Write + Send> JsonReporter<W> {
    /// Create a reporter writing to `out`
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    /// Recover the writer
    pub fn into_inner(self) -> W {
        self.out.into_inner()
    }
}

impl<W: Write + Send> Reporter for JsonReporter<W> {
    fn report(&self, event: &CallEvent) {
        let mut out = self.out.lock();
        let written = serde_json::to_writer(&mut *out, event)
            .map_err(std::io::Error::from)
            .and_then(|_| out.write_all(b"\n"));
        if let Err(e) = written {
            warn!("Failed to write {} event: {}", event.operation, e);
        }
    }
}

/// Keeps every event in memory, optionally forwarding to another reporter
#[derive(Default)]
pub struct RecordingReporter {
    events: Mutex<Vec<CallEvent>>,
    forward: Option<Arc<dyn Reporter>>,
}

impl RecordingReporter {
    /// Create a recorder that only keeps events
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a recorder that also passes every event on to `next`
    pub fn forwarding(next: Arc<dyn Reporter>) -> Self {
        Self {
            events: Mutex::new(Vec::new()),
            forward: Some(next),
        }
    }

    /// Snapshot of the recorded events, oldest first
    pub fn events(&self) -> Vec<CallEvent> {
        self.events.lock().clone()
    }

    /// Number of recorded events of `kind`
    pub fn count(&self, kind: EventKind) -> usize {
        self.events.lock().iter().filter(|e| e.event == kind).count()
    }

    /// Number of recorded events
    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    /// Check if nothing was recorded
    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }

    /// Forget recorded events
    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

impl Reporter for RecordingReporter {
    fn report(&self, event: &CallEvent) {
        self.events.lock().push(event.clone());
        if let Some(next) = &self.forward {
            next.report(event);
        }
    }
}
