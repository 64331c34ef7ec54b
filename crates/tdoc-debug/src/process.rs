//! Live host backed by a Python process
//!
//! Runs the bundled agent under the configured interpreter. The agent loads the
//! application, wraps its handlers while it runs, and reports on stdout one JSON
//! message per line. Dispatch records go to the installed hooks; the latest widget
//! snapshot is served through [`Inspectable`]. With profiling on, the agent also runs
//! the interpreter's own profiler and sends its rows when the application stops.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Map;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;

use crate::config::DebugConfig;
use crate::error::{InspectError, RunError};
use crate::host::HostApp;
use crate::inspect::Inspectable;
use crate::profile::PerformanceMetric;
use crate::trace::{DispatchHook, DispatchedEvent, HookSet};

/// Agent source passed to the interpreter with `-c`
pub const AGENT_SOURCE: &str = include_str!("../agent/tdoc_agent.py");

/// Raw output lines kept for crash reports
const MAX_DIAGNOSTIC_LINES: usize = 200;

/// Widget node from an agent snapshot
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RemoteNode {
    /// Type name
    #[serde(rename = "type")]
    pub widget_type: String,
    /// Python object id
    pub identity: u64,
    /// DOM id
    #[serde(default)]
    pub id: Option<String>,
    /// CSS classes
    #[serde(default)]
    pub classes: Vec<String>,
    /// Displayed
    #[serde(default = "visible_by_default")]
    pub visible: bool,
    /// Width and height
    #[serde(default)]
    pub size: Option<(u32, u32)>,
    /// Child nodes
    #[serde(default)]
    pub children: Vec<RemoteNode>,
}

fn visible_by_default() -> bool {
    true
}

impl Inspectable for RemoteNode {
    fn type_name(&self) -> &str {
        &self.widget_type
    }

    fn identity(&self) -> u64 {
        self.identity
    }

    fn dom_id(&self) -> Result<Option<String>, InspectError> {
        Ok(self.id.clone())
    }

    fn classes(&self) -> Result<Vec<String>, InspectError> {
        Ok(self.classes.clone())
    }

    fn is_visible(&self) -> bool {
        self.visible
    }

    fn size(&self) -> Option<(u32, u32)> {
        self.size
    }

    fn children(&self) -> Result<Vec<&dyn Inspectable>, InspectError> {
        Ok(self.children.iter().map(|c| c as &dyn Inspectable).collect())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
enum Phase {
    Before,
    After,
}

/// One interpreter-level profile row
#[derive(Debug, Clone, PartialEq, Deserialize)]
struct ProfileRow {
    function: String,
    calls: u64,
    total_time: f64,
    cumulative_time: f64,
}

impl From<ProfileRow> for PerformanceMetric {
    fn from(row: ProfileRow) -> Self {
        #[allow(clippy::cast_precision_loss)]
        let per_call_time = if row.calls == 0 {
            0.0
        } else {
            row.total_time / row.calls as f64
        };
        Self {
            function_name: row.function,
            call_count: row.calls,
            total_time: row.total_time,
            per_call_time,
            cumulative_time: row.cumulative_time,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum AgentMessage {
    Ready {
        app: String,
        #[serde(default)]
        handlers: Vec<String>,
    },
    Tree {
        root: Option<RemoteNode>,
    },
    Dispatch {
        phase: Phase,
        handler: String,
        #[serde(default)]
        source: String,
        #[serde(default)]
        event_type: String,
        #[serde(default)]
        target: String,
        #[serde(default)]
        elapsed: Option<f64>,
    },
    Log {
        message: String,
    },
    Error {
        message: String,
        #[serde(default)]
        traceback: String,
    },
    Profile {
        rows: Vec<ProfileRow>,
    },
    Interrupted,
    Exit {
        #[serde(default)]
        code: i32,
    },
}

/// [`HostApp`] running a Textual application file under the agent
#[derive(Debug)]
pub struct ProcessHost {
    app_file: PathBuf,
    python: String,
    trace: bool,
    profile: Option<usize>,
    profile_rows: Vec<PerformanceMetric>,
    name: String,
    handlers: Vec<String>,
    snapshot: Option<RemoteNode>,
    hooks: HookSet,
    diagnostics: Vec<String>,
    failure: Option<RunError>,
}

impl ProcessHost {
    /// Create host for `app_file`
    #[must_use]
    pub fn new(app_file: impl Into<PathBuf>, config: &DebugConfig) -> Self {
        let app_file = app_file.into();
        let name = app_file
            .file_stem()
            .map_or_else(|| "app".to_string(), |s| s.to_string_lossy().into_owned());
        Self {
            app_file,
            python: config.python.clone(),
            trace: config.trace_events || config.profile_performance,
            profile: config.profile_performance.then_some(config.profile_limit),
            profile_rows: Vec::new(),
            name,
            handlers: Vec::new(),
            snapshot: None,
            hooks: HookSet::new(),
            diagnostics: Vec::new(),
            failure: None,
        }
    }

    /// Application file
    #[inline]
    #[must_use]
    pub fn app_file(&self) -> &Path {
        &self.app_file
    }

    /// Output lines that were not agent messages
    #[inline]
    #[must_use]
    pub fn diagnostics(&self) -> &[String] {
        &self.diagnostics
    }

    /// Apply one line of agent output
    pub fn handle_line(&mut self, line: &str) {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return;
        }

        let message = match serde_json::from_str::<AgentMessage>(trimmed) {
            Ok(message) => message,
            Err(_) => {
                if self.diagnostics.len() < MAX_DIAGNOSTIC_LINES {
                    self.diagnostics.push(trimmed.to_string());
                }
                return;
            }
        };

        match message {
            AgentMessage::Ready { app, handlers } => {
                tracing::debug!("agent ready: {} with {} handler(s)", app, handlers.len());
                self.name = app;
                self.handlers = handlers;
            }
            AgentMessage::Tree { root } => {
                self.snapshot = root;
            }
            AgentMessage::Dispatch {
                phase,
                handler,
                source,
                event_type,
                target,
                elapsed,
            } => {
                let event = DispatchedEvent {
                    handler,
                    source,
                    event_type,
                    target,
                    data: Map::new(),
                };
                match phase {
                    Phase::Before => self.hooks.before(&event),
                    Phase::After => {
                        let elapsed = elapsed
                            .and_then(|s| Duration::try_from_secs_f64(s).ok())
                            .unwrap_or_default();
                        self.hooks.after(&event, elapsed);
                    }
                }
            }
            AgentMessage::Log { message } => tracing::warn!("agent: {}", message),
            AgentMessage::Error { message, traceback } => {
                let trace = if traceback.is_empty() {
                    self.diagnostics.join("\n")
                } else {
                    traceback
                };
                self.failure = Some(RunError::failed(message, trace));
            }
            AgentMessage::Profile { rows } => {
                tracing::debug!("agent profile: {} row(s)", rows.len());
                self.profile_rows.extend(rows.into_iter().map(PerformanceMetric::from));
            }
            AgentMessage::Interrupted => self.failure = Some(RunError::Interrupted),
            AgentMessage::Exit { code } => tracing::debug!("agent exited with code {}", code),
        }
    }

    /// Feed agent output to [`ProcessHost::handle_line`] until it ends or `interrupt`
    /// resolves; `true` when interrupted
    ///
    /// `interrupt` is created once and polled across every read, so a signal that
    /// lands while a line is being handled is not lost.
    async fn pump<R, F>(&mut self, output: R, interrupt: F) -> bool
    where
        R: AsyncRead + Unpin,
        F: Future,
    {
        let mut lines = BufReader::new(output).lines();
        tokio::pin!(interrupt);

        loop {
            tokio::select! {
                line = lines.next_line() => match line {
                    Ok(Some(line)) => self.handle_line(&line),
                    Ok(None) => return false,
                    Err(e) => {
                        tracing::warn!("agent output unreadable: {}", e);
                        return false;
                    }
                },
                _ = &mut interrupt => return true,
            }
        }
    }

    /// Outcome once the process has ended
    fn outcome(&mut self, success: bool, status: &str) -> Result<(), RunError> {
        if let Some(failure) = self.failure.take() {
            return Err(failure);
        }
        if success {
            Ok(())
        } else {
            Err(RunError::failed(
                format!("ProcessError: application exited with {status}"),
                self.diagnostics.join("\n"),
            ))
        }
    }
}

#[async_trait]
impl HostApp for ProcessHost {
    fn name(&self) -> &str {
        &self.name
    }

    fn root(&self) -> Option<&dyn Inspectable> {
        self.snapshot.as_ref().map(|n| n as &dyn Inspectable)
    }

    fn handler_names(&self) -> Vec<String> {
        self.handlers.clone()
    }

    fn install_hook(&mut self, hook: Arc<dyn DispatchHook>) {
        self.hooks.install(hook);
    }

    fn remove_hooks(&mut self) {
        self.hooks.clear();
    }

    fn take_profile(&mut self) -> Vec<PerformanceMetric> {
        std::mem::take(&mut self.profile_rows)
    }

    async fn run(&mut self) -> Result<(), RunError> {
        self.failure = None;
        tracing::info!("starting {} under {}", self.app_file.display(), self.python);

        let mut child = Command::new(&self.python)
            .arg("-c")
            .arg(AGENT_SOURCE)
            .arg(&self.app_file)
            .env("TDOC_TRACE", if self.trace { "1" } else { "0" })
            .env("TDOC_PROFILE", self.profile.map_or_else(|| "0".to_string(), |n| n.to_string()))
            .stdin(Stdio::inherit())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                RunError::failed(format!("OSError: cannot start {}: {e}", self.python), String::new())
            })?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| RunError::failed("OSError: agent output unavailable", String::new()))?;
        if self.pump(stdout, tokio::signal::ctrl_c()).await {
            tracing::info!("interrupt received; stopping application");
            if let Err(e) = child.kill().await {
                tracing::warn!("cannot stop application: {}", e);
            }
            return Err(RunError::Interrupted);
        }

        let status = child
            .wait()
            .await
            .map_err(|e| RunError::failed(format!("OSError: {e}"), String::new()))?;
        self.outcome(status.success(), &status.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace::{EventLog, EventTracer};

    fn host() -> ProcessHost {
        ProcessHost::new("demo.py", &DebugConfig::default().with_trace_events(true))
    }

    #[test]
    fn ready_sets_name_and_handlers() {
        let mut host = host();
        assert_eq!(host.name(), "demo");
        host.handle_line(r#"{"kind":"ready","app":"DemoApp","handlers":["on_key","on_mount"]}"#);
        assert_eq!(host.name(), "DemoApp");
        assert_eq!(host.handler_names(), vec!["on_key".to_string(), "on_mount".to_string()]);
    }

    #[test]
    fn tree_snapshot_is_inspectable() {
        let mut host = host();
        assert!(host.root().is_none());
        host.handle_line(
            r#"{"kind":"tree","root":{"type":"Screen","identity":1,"children":[{"type":"Button","identity":2,"id":"go","classes":["primary"],"size":[10,3]}]}}"#,
        );
        let root = host.root().unwrap();
        assert_eq!(root.type_name(), "Screen");
        let children = root.children().unwrap();
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].dom_id().unwrap().as_deref(), Some("go"));
        assert_eq!(children[0].size(), Some((10, 3)));
        assert!(children[0].is_visible());
    }

    #[test]
    fn dispatch_records_reach_hooks() {
        let mut host = host();
        let log = Arc::new(EventLog::new());
        host.install_hook(Arc::new(EventTracer::new(Arc::clone(&log), false)));

        host.handle_line(
            r#"{"kind":"dispatch","phase":"before","handler":"on_key","source":"Key(q)","event_type":"Key","target":"DemoApp"}"#,
        );
        host.handle_line(
            r#"{"kind":"dispatch","phase":"after","handler":"on_key","source":"Key(q)","event_type":"Key","target":"DemoApp","elapsed":0.002}"#,
        );

        let events = log.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type, "on_key");
        assert_eq!(events[0].source, "Key(q)");
    }

    #[test]
    fn error_record_becomes_failure() {
        let mut host = host();
        host.handle_line("plain output from the app");
        host.handle_line(r#"{"kind":"error","message":"KeyError: 'x'","traceback":"Traceback..."}"#);
        assert_eq!(host.diagnostics(), &["plain output from the app".to_string()]);

        let err = host.outcome(false, "exit status: 1").unwrap_err();
        assert_eq!(err, RunError::failed("KeyError: 'x'", "Traceback..."));
    }

    #[test]
    fn interrupted_record() {
        let mut host = host();
        host.handle_line(r#"{"kind":"interrupted"}"#);
        assert_eq!(host.outcome(false, "exit status: 130"), Err(RunError::Interrupted));
    }

    #[test]
    fn nonzero_exit_without_record_fails() {
        let mut host = host();
        host.handle_line("Traceback (most recent call last):");
        let err = host.outcome(false, "exit status: 2").unwrap_err();
        match err {
            RunError::Failed { message, trace } => {
                assert!(message.starts_with("ProcessError"));
                assert!(trace.contains("Traceback"));
            }
            RunError::Interrupted => panic!("unexpected interrupt"),
        }
        assert!(host.outcome(true, "exit status: 0").is_ok());
    }

    #[test]
    fn profile_rows_become_metrics() {
        let mut host = ProcessHost::new("demo.py", &DebugConfig::default().with_profiling(true));
        host.handle_line(
            r#"{"kind":"profile","rows":[{"function":"demo.py:12(load_rows)","calls":4,"total_time":0.2,"cumulative_time":0.5},{"function":"~:0(<built-in method time.sleep>)","calls":0,"total_time":0.0,"cumulative_time":0.0}]}"#,
        );

        let rows = host.take_profile();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].function_name, "demo.py:12(load_rows)");
        assert_eq!(rows[0].call_count, 4);
        assert!((rows[0].per_call_time - 0.05).abs() < 1e-9);
        assert!((rows[0].cumulative_time - 0.5).abs() < 1e-9);
        assert!(rows[1].per_call_time.abs() < f64::EPSILON);
        assert!(host.take_profile().is_empty());
    }

    #[tokio::test]
    async fn pump_reads_until_output_ends() {
        let mut host = host();
        let output: &[u8] = b"{\"kind\":\"ready\",\"app\":\"DemoApp\"}\nnoise\n";
        let interrupted = host.pump(output, std::future::pending::<()>()).await;

        assert!(!interrupted);
        assert_eq!(host.name(), "DemoApp");
        assert_eq!(host.diagnostics(), &["noise".to_string()]);
    }

    #[tokio::test]
    async fn pump_observes_interrupt_while_output_is_open() {
        let mut host = host();
        let (output, mut agent) = tokio::io::duplex(256);
        tokio::io::AsyncWriteExt::write_all(&mut agent, b"{\"kind\":\"interrupted\"}\n")
            .await
            .unwrap();
        let (signal, interrupt) = tokio::sync::oneshot::channel::<()>();
        signal.send(()).unwrap();

        assert!(host.pump(output, interrupt).await);
        drop(agent);
    }

    #[test]
    fn agent_source_is_bundled() {
        assert!(AGENT_SOURCE.contains("def main(argv)"));
    }
}
