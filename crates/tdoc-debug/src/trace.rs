//! Event tracing
//!
//! Hosts call installed [`DispatchHook`]s around every handler they dispatch. The
//! [`EventTracer`] hook appends an [`EventInfo`] to a shared [`EventLog`] before the
//! handler runs and never touches the event itself.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tdoc_core::schema::HANDLER_PREFIX;

/// One traced dispatch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventInfo {
    /// Handler that received the event
    pub event_type: String,
    /// Seconds since the session started
    pub timestamp: f64,
    /// Event as rendered by the host
    pub source: String,
    /// Receiving object
    pub target: String,
    /// Extra attributes; always holds `type`
    pub data: Map<String, Value>,
}

/// A handler invocation as seen by hooks
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchedEvent {
    /// Handler name (`on_button_pressed`)
    pub handler: String,
    /// Event as rendered by the host
    pub source: String,
    /// Event type name
    pub event_type: String,
    /// Receiving object
    pub target: String,
    /// Extra attributes
    pub data: Map<String, Value>,
}

impl DispatchedEvent {
    /// Create event with no extra attributes
    #[must_use]
    pub fn new(
        handler: impl Into<String>,
        source: impl Into<String>,
        event_type: impl Into<String>,
        target: impl Into<String>,
    ) -> Self {
        Self {
            handler: handler.into(),
            source: source.into(),
            event_type: event_type.into(),
            target: target.into(),
            data: Map::new(),
        }
    }
}

/// Middleware around a host's handler dispatch
pub trait DispatchHook: Send + Sync {
    /// Whether to observe `handler`
    fn wants(&self, handler: &str) -> bool {
        handler.starts_with(HANDLER_PREFIX)
    }

    /// Called before the handler runs
    fn before_dispatch(&self, event: &DispatchedEvent);

    /// Called after the handler returns, with its running time
    fn after_dispatch(&self, _event: &DispatchedEvent, _elapsed: Duration) {}
}

/// Hooks installed on a host for one session
#[derive(Default, Clone)]
pub struct HookSet {
    hooks: Vec<Arc<dyn DispatchHook>>,
}

impl std::fmt::Debug for HookSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HookSet").field("hooks", &self.hooks.len()).finish()
    }
}

impl HookSet {
    /// Create empty set
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add hook
    pub fn install(&mut self, hook: Arc<dyn DispatchHook>) {
        self.hooks.push(hook);
    }

    /// Remove every hook
    pub fn clear(&mut self) {
        self.hooks.clear();
    }

    /// Number of hooks
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    /// Whether no hook is installed
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    /// Notify interested hooks, in install order
    pub fn before(&self, event: &DispatchedEvent) {
        for hook in self.hooks.iter().filter(|h| h.wants(&event.handler)) {
            hook.before_dispatch(event);
        }
    }

    /// Notify interested hooks, in reverse install order
    pub fn after(&self, event: &DispatchedEvent, elapsed: Duration) {
        for hook in self.hooks.iter().rev().filter(|h| h.wants(&event.handler)) {
            hook.after_dispatch(event, elapsed);
        }
    }
}

/// Append-only event log for one session
///
/// Timestamps are taken while the lock is held, so they never decrease in append
/// order.
#[derive(Debug)]
pub struct EventLog {
    started: Instant,
    inner: Mutex<Vec<EventInfo>>,
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new()
    }
}

impl EventLog {
    /// Create log starting now
    #[must_use]
    pub fn new() -> Self {
        Self::starting_at(Instant::now())
    }

    /// Create log measuring from `started`
    #[must_use]
    pub fn starting_at(started: Instant) -> Self {
        Self {
            started,
            inner: Mutex::new(Vec::new()),
        }
    }

    /// Append an event, returning its timestamp
    pub fn record(&self, event: &DispatchedEvent) -> f64 {
        let mut data = event.data.clone();
        data.insert("type".to_string(), Value::String(event.event_type.clone()));

        let mut guard = self.inner.lock();
        let timestamp = self.started.elapsed().as_secs_f64();
        guard.push(EventInfo {
            event_type: event.handler.clone(),
            timestamp,
            source: event.source.clone(),
            target: event.target.clone(),
            data,
        });
        timestamp
    }

    /// All events, oldest first
    #[must_use]
    pub fn events(&self) -> Vec<EventInfo> {
        self.inner.lock().clone()
    }

    /// The last `n` events, oldest first
    #[must_use]
    pub fn recent(&self, n: usize) -> Vec<EventInfo> {
        let guard = self.inner.lock();
        let skip = guard.len().saturating_sub(n);
        guard[skip..].to_vec()
    }

    /// Number of events
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    /// Whether nothing was recorded
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }
}

/// Hook recording every handler dispatch
#[derive(Debug)]
pub struct EventTracer {
    log: Arc<EventLog>,
    echo: bool,
}

impl EventTracer {
    /// Create tracer appending to `log`; `echo` also logs each event at info level
    #[must_use]
    pub fn new(log: Arc<EventLog>, echo: bool) -> Self {
        Self { log, echo }
    }
}

impl DispatchHook for EventTracer {
    fn before_dispatch(&self, event: &DispatchedEvent) {
        let timestamp = self.log.record(event);
        if self.echo {
            tracing::info!("[EVENT] {:.4} {}: {}", timestamp, event.handler, event.source);
        }
    }
}
