//! Debug session state machine
//!
//! ```text
//! Idle → WalkingTree → TracingEvents → Running → Interrupted ┐
//!                   └──────────────────↗   ↑  → Crashed     ├→ ReportReady
//!                                          └─── Exited ─────┘
//! ```
//!
//! `Exited → Running` repeats the run for `--iterations`; tracing is skipped when
//! disabled. A failed or panicking run is still followed by a report.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tdoc_core::schema::{event_tag, HANDLER_PREFIX};

use crate::analysis::{HandlerInfo, StaticAnalysis};
use crate::config::DebugConfig;
use crate::error::{ProfileError, RunError, StateError};
use crate::host::HostApp;
use crate::inspect::WidgetTree;
use crate::profile::{CallProfiler, PerformanceMetric};
use crate::trace::{DispatchHook, EventInfo, EventLog, EventTracer};

/// Debug session lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    /// Created
    Idle,
    /// Building the initial widget snapshot
    WalkingTree,
    /// Installing dispatch hooks
    TracingEvents,
    /// Application running
    Running,
    /// Ended by the user
    Interrupted,
    /// Ended by an application failure
    Crashed,
    /// Ended normally
    Exited,
    /// Session data final
    ReportReady,
}

/// States reachable from `from`
#[must_use]
pub fn allowed_transitions(from: SessionState) -> Vec<SessionState> {
    use SessionState::*;
    match from {
        Idle => vec![WalkingTree],
        WalkingTree => vec![TracingEvents, Running, ReportReady],
        TracingEvents => vec![Running],
        Running => vec![Interrupted, Crashed, Exited],
        Exited => vec![Running, ReportReady],
        Interrupted | Crashed => vec![ReportReady],
        ReportReady => vec![],
    }
}

/// Check a transition against the state machine
///
/// # Errors
/// [`StateError::IllegalTransition`] when `to` is not reachable from `from`.
pub fn validate_transition(from: SessionState, to: SessionState) -> Result<(), StateError> {
    if allowed_transitions(from).contains(&to) {
        Ok(())
    } else {
        Err(StateError::IllegalTransition { from, to })
    }
}

/// How the last run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Ran to completion
    Exited,
    /// Stopped by the user
    Interrupted,
    /// Failed or panicked
    Crashed,
}

/// Captured application failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeFailure {
    /// `Type: detail` summary
    pub message: String,
    /// Full trace
    pub trace: String,
}

/// Profiling result for the report
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ProfileSummary {
    /// Not requested
    #[default]
    Disabled,
    /// Metrics, most cumulative time first
    Metrics(Vec<PerformanceMetric>),
    /// Requested but not produced
    Unavailable(String),
}

impl From<Result<Vec<PerformanceMetric>, ProfileError>> for ProfileSummary {
    fn from(value: Result<Vec<PerformanceMetric>, ProfileError>) -> Self {
        match value {
            Ok(metrics) => Self::Metrics(metrics),
            Err(e) => Self::Unavailable(e.to_string()),
        }
    }
}

/// Everything a debug report is built from
#[derive(Debug, Clone, Default)]
pub struct DebugSession {
    /// Application name
    pub app_name: String,
    /// Whether the application actually ran
    pub live: bool,
    /// Widget snapshot
    pub tree: WidgetTree,
    /// Handler inventory
    pub handlers: Vec<HandlerInfo>,
    /// Traced events, oldest first
    pub events: Vec<EventInfo>,
    /// Profiling result
    pub profile: ProfileSummary,
    /// Failures of the application
    pub failures: Vec<RuntimeFailure>,
    /// How the last run ended
    pub outcome: Option<RunOutcome>,
    /// Completed runs
    pub runs: usize,
}

impl DebugSession {
    /// Session from a syntax-tree approximation; nothing ran
    #[must_use]
    pub fn from_static(app_name: impl Into<String>, analysis: StaticAnalysis, config: &DebugConfig) -> Self {
        let profile = if config.profile_performance {
            ProfileSummary::from(Err(ProfileError::NotLive))
        } else {
            ProfileSummary::Disabled
        };
        Self {
            app_name: app_name.into(),
            live: false,
            tree: analysis.tree,
            handlers: analysis.handlers,
            profile,
            ..Self::default()
        }
    }

    /// Whether the application failed
    #[inline]
    #[must_use]
    pub fn crashed(&self) -> bool {
        self.outcome == Some(RunOutcome::Crashed)
    }
}

/// Attaches to a host and collects a [`DebugSession`]
#[derive(Debug)]
pub struct Debugger<'c> {
    config: &'c DebugConfig,
    state: SessionState,
}

impl<'c> Debugger<'c> {
    /// Create idle debugger
    #[must_use]
    pub fn new(config: &'c DebugConfig) -> Self {
        Self {
            config,
            state: SessionState::Idle,
        }
    }

    /// Current state
    #[inline]
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    fn transition(&mut self, to: SessionState) -> Result<(), StateError> {
        validate_transition(self.state, to)?;
        tracing::debug!("session {:?} -> {:?}", self.state, to);
        self.state = to;
        Ok(())
    }

    /// Walk, instrument and run `host`, then collect the session
    ///
    /// Application failures and panics are recorded, not returned.
    ///
    /// # Errors
    /// [`StateError`] when called on a debugger that already ran.
    pub async fn start(&mut self, host: &mut dyn HostApp) -> Result<DebugSession, StateError> {
        self.transition(SessionState::WalkingTree)?;
        let mut tree = host.root().map(WidgetTree::walk).unwrap_or_default();

        let log = Arc::new(EventLog::new());
        if self.config.trace_events {
            self.transition(SessionState::TracingEvents)?;
            host.install_hook(Arc::new(EventTracer::new(Arc::clone(&log), self.config.verbose)));
        }

        let profiler = self
            .config
            .profile_performance
            .then(|| Arc::new(CallProfiler::new(self.config.profile_limit)));
        if let Some(profiler) = &profiler {
            host.install_hook(Arc::clone(profiler) as Arc<dyn DispatchHook>);
        }

        tracing::info!("debugging {}; press Ctrl+C to stop and view the report", host.name());

        let mut failures = Vec::new();
        let mut outcome = RunOutcome::Exited;
        let mut runs = 0;
        for iteration in 0..self.config.iterations {
            self.transition(SessionState::Running)?;
            tracing::debug!("run {} of {}", iteration + 1, self.config.iterations);

            let result = {
                let scope_name = format!("{}.run", host.name());
                let _scope = profiler.as_ref().map(|p| p.scope(scope_name));
                AssertUnwindSafe(host.run()).catch_unwind().await
            };
            runs += 1;
            if let Some(profiler) = &profiler {
                profiler.absorb(host.take_profile());
            }

            outcome = match result {
                Ok(Ok(())) => RunOutcome::Exited,
                Ok(Err(RunError::Interrupted)) => RunOutcome::Interrupted,
                Ok(Err(RunError::Failed { message, trace })) => {
                    tracing::error!("application failed: {}\n{}", message, trace);
                    failures.push(RuntimeFailure { message, trace });
                    RunOutcome::Crashed
                }
                Err(payload) => {
                    let message = panic_message(payload.as_ref());
                    tracing::error!("application panicked: {}", message);
                    failures.push(RuntimeFailure {
                        message: format!("Panic: {message}"),
                        trace: String::new(),
                    });
                    RunOutcome::Crashed
                }
            };

            self.transition(match outcome {
                RunOutcome::Exited => SessionState::Exited,
                RunOutcome::Interrupted => SessionState::Interrupted,
                RunOutcome::Crashed => SessionState::Crashed,
            })?;
            if outcome != RunOutcome::Exited {
                break;
            }
        }

        host.remove_hooks();

        if tree.is_empty() {
            if let Some(root) = host.root() {
                tree = WidgetTree::walk(root);
            }
        }

        let handlers = host
            .handler_names()
            .into_iter()
            .filter(|n| n.starts_with(HANDLER_PREFIX))
            .map(|name| HandlerInfo {
                event_tag: event_tag(&name).map(str::to_string),
                class: Some(host.name().to_string()),
                line: None,
                name,
            })
            .collect();

        let profile = profiler
            .map(|p| ProfileSummary::from(p.finish()))
            .unwrap_or_default();

        self.transition(SessionState::ReportReady)?;
        Ok(DebugSession {
            app_name: host.name().to_string(),
            live: true,
            tree,
            handlers,
            events: log.events(),
            profile,
            failures,
            outcome: Some(outcome),
            runs,
        })
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
