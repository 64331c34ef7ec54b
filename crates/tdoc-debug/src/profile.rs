//! Call profiler
//!
//! Tracks nested enter/exit records on a stack. Per function it keeps the call
//! count, own time (excluding nested calls) and cumulative time (including them).
//! Recursive calls add to cumulative time only at the outermost frame, so it never
//! exceeds wall time. Rows a host profiled itself can be folded in with
//! [`CallProfiler::absorb`].

use std::collections::HashMap;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use serde::Serialize;

use crate::error::ProfileError;
use crate::trace::{DispatchHook, DispatchedEvent};

/// Summary line for one function
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerformanceMetric {
    /// Function or handler name
    pub function_name: String,
    /// Completed calls
    pub call_count: u64,
    /// Own time in seconds
    pub total_time: f64,
    /// Own time per call in seconds
    pub per_call_time: f64,
    /// Time including nested calls, in seconds
    pub cumulative_time: f64,
}

#[derive(Debug)]
struct Frame {
    function: String,
    started: Instant,
    nested: Duration,
}

#[derive(Debug, Default, Clone, Copy)]
struct Stats {
    calls: u64,
    own: Duration,
    cumulative: Duration,
    active: u32,
}

#[derive(Debug, Default)]
struct ProfileState {
    stack: Vec<Frame>,
    stats: HashMap<String, Stats>,
    failure: Option<ProfileError>,
}

/// Stack-based profiler shared between a host's dispatch hooks and the debugger
#[derive(Debug)]
pub struct CallProfiler {
    limit: usize,
    state: Mutex<ProfileState>,
}

impl CallProfiler {
    /// Create profiler keeping the top `limit` functions
    #[must_use]
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            state: Mutex::new(ProfileState::default()),
        }
    }

    /// Open a call to `function`
    pub fn enter(&self, function: &str) {
        let mut state = self.state.lock();
        state.stats.entry(function.to_string()).or_default().active += 1;
        state.stack.push(Frame {
            function: function.to_string(),
            started: Instant::now(),
            nested: Duration::ZERO,
        });
    }

    /// Close the innermost open call to `function`
    ///
    /// Calls opened inside it that never exited (a run interrupted mid-handler) are
    /// closed first at the current time. `measured` overrides the local clock when the
    /// host timed the call itself. Exiting a function with no open call poisons the
    /// profile; [`CallProfiler::finish`] then reports it.
    pub fn exit(&self, function: &str, measured: Option<Duration>) {
        let mut state = self.state.lock();
        if state.failure.is_some() {
            return;
        }

        let Some(depth) = state.stack.iter().rposition(|f| f.function == function) else {
            let expected = state
                .stack
                .last()
                .map_or_else(|| "<none>".to_string(), |f| f.function.clone());
            state.failure = Some(ProfileError::Unbalanced {
                expected,
                found: function.to_string(),
            });
            return;
        };

        while state.stack.len() > depth + 1 {
            if let Some(inner) = state.stack.pop() {
                tracing::debug!("closing unfinished call to {}", inner.function);
                let elapsed = inner.started.elapsed();
                close(&mut state, &inner, elapsed);
            }
        }
        if let Some(frame) = state.stack.pop() {
            let elapsed = measured.unwrap_or_else(|| frame.started.elapsed());
            close(&mut state, &frame, elapsed);
        }
    }

    /// Add rows measured elsewhere (the host's own profiler)
    ///
    /// Rows for a function already known are summed into it.
    pub fn absorb(&self, rows: impl IntoIterator<Item = PerformanceMetric>) {
        let mut state = self.state.lock();
        for row in rows {
            let stats = state.stats.entry(row.function_name).or_default();
            stats.calls += row.call_count;
            stats.own += secs(row.total_time);
            stats.cumulative += secs(row.cumulative_time);
        }
    }

    /// Guard that enters now and exits when dropped
    #[must_use]
    pub fn scope(&self, function: impl Into<String>) -> ProfileScope<'_> {
        let function = function.into();
        self.enter(&function);
        ProfileScope {
            profiler: self,
            function,
        }
    }

    /// Summarise, most cumulative time first
    ///
    /// Calls still open (an interrupted run) are closed at the current time.
    ///
    /// # Errors
    /// [`ProfileError::Unbalanced`] when enter and exit records did not pair up.
    pub fn finish(&self) -> Result<Vec<PerformanceMetric>, ProfileError> {
        let mut state = self.state.lock();
        if let Some(e) = state.failure.clone() {
            return Err(e);
        }

        while let Some(frame) = state.stack.pop() {
            let elapsed = frame.started.elapsed();
            close(&mut state, &frame, elapsed);
        }

        let mut metrics: Vec<PerformanceMetric> = state
            .stats
            .iter()
            .filter(|(_, s)| s.calls > 0)
            .map(|(name, s)| {
                let own = s.own.as_secs_f64();
                #[allow(clippy::cast_precision_loss)]
                let per_call = own / s.calls as f64;
                PerformanceMetric {
                    function_name: name.clone(),
                    call_count: s.calls,
                    total_time: own,
                    per_call_time: per_call,
                    cumulative_time: s.cumulative.as_secs_f64(),
                }
            })
            .collect();

        metrics.sort_by(|a, b| {
            b.cumulative_time
                .total_cmp(&a.cumulative_time)
                .then_with(|| a.function_name.cmp(&b.function_name))
        });
        metrics.truncate(self.limit);
        Ok(metrics)
    }
}

fn secs(value: f64) -> Duration {
    Duration::try_from_secs_f64(value).unwrap_or_default()
}

fn close(state: &mut ProfileState, frame: &Frame, elapsed: Duration) {
    let own = elapsed.saturating_sub(frame.nested);
    if let Some(parent) = state.stack.last_mut() {
        parent.nested += elapsed;
    }

    let stats = state.stats.entry(frame.function.clone()).or_default();
    stats.calls += 1;
    stats.own += own;
    stats.active = stats.active.saturating_sub(1);
    if stats.active == 0 {
        stats.cumulative += elapsed;
    }
}

impl DispatchHook for CallProfiler {
    fn before_dispatch(&self, event: &DispatchedEvent) {
        self.enter(&event.handler);
    }

    fn after_dispatch(&self, event: &DispatchedEvent, elapsed: Duration) {
        self.exit(&event.handler, Some(elapsed));
    }
}

/// Open profiler call, closed on drop
#[derive(Debug)]
pub struct ProfileScope<'p> {
    profiler: &'p CallProfiler,
    function: String,
}

impl Drop for ProfileScope<'_> {
    fn drop(&mut self) {
        self.profiler.exit(&self.function, None);
    }
}
