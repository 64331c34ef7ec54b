//! tdoc debugging
//!
//! Runtime diagnostics for Textual applications. A [`Debugger`] attaches to a
//! [`HostApp`], snapshots its widget graph, wraps handler dispatch with tracing and
//! profiling hooks, runs it, and collects a [`DebugSession`] that [`DebugReport`]
//! renders.
//!
//! # Architecture
//!
//! ```text
//! HostApp ── root() ──→ WidgetTree::walk
//!    │
//!    ├── install_hook(EventTracer)  → EventLog
//!    ├── install_hook(CallProfiler) → PerformanceMetric
//!    └── run() ─→ Exited | Interrupted | Failed
//!                         ↓
//!                   DebugSession ─→ DebugReport
//! ```
//!
//! [`ProcessHost`] is the host for real applications: it runs the target under a
//! Python interpreter with a bundled agent and streams its dispatches back. Without
//! a live run, [`analyze_file`] approximates the same session from source.
//!
//! # Example
//!
//! ```rust,ignore
//! use tdoc_debug::{DebugConfig, DebugReport, Debugger, ProcessHost};
//!
//! let config = DebugConfig::new().with_trace_events(true).with_profiling(true);
//! let mut host = ProcessHost::new("app.py", &config);
//! let session = Debugger::new(&config).start(&mut host).await?;
//! println!("{}", DebugReport::new("app.py", &session, &config).generate_text());
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod analysis;
pub mod config;
pub mod debugger;
pub mod error;
pub mod host;
pub mod inspect;
pub mod process;
pub mod profile;
pub mod report;
pub mod trace;

pub use analysis::{analyze_file, analyze_source, HandlerInfo, LayoutAnalysis, StaticAnalysis};
pub use config::DebugConfig;
pub use debugger::{
    allowed_transitions, validate_transition, DebugSession, Debugger, ProfileSummary, RunOutcome,
    RuntimeFailure, SessionState,
};
pub use error::{AnalysisError, InspectError, ProfileError, ReportError, RunError, StateError};
pub use host::HostApp;
pub use inspect::{Inspectable, WidgetInfo, WidgetTree};
pub use process::ProcessHost;
pub use profile::{CallProfiler, PerformanceMetric};
pub use report::{diagnose_errors, emit, format_widget_tree, DebugReport};
pub use trace::{DispatchHook, DispatchedEvent, EventInfo, EventLog, EventTracer, HookSet};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
