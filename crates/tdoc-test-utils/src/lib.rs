//! Testing utilities for the tdoc workspace
//!
//! Sample application sources, a mock widget graph and a scripted host.

#![allow(missing_docs)]

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tdoc_debug::{
    DispatchHook, DispatchedEvent, HookSet, HostApp, InspectError, Inspectable,
    PerformanceMetric, RunError,
};

// ---------------------------------------------------------------------------
// Sample sources
// ---------------------------------------------------------------------------

/// Passes validation with no warnings
pub const VALID_APP: &str = r#"from textual.app import App, ComposeResult
from textual.containers import Vertical
from textual.widgets import Button, Footer, Header


class DemoApp(App):
    CSS = """
    $dark: #101010;
    Screen {
        background: $dark;
    }
    """

    def compose(self) -> ComposeResult:
        yield Header()
        with Vertical(id="main"):
            yield Button("Go", id="go", classes="primary")
        yield Footer()

    def on_button_pressed(self, event) -> None:
        self.exit()
"#;

/// Only problem: `App` is never imported
pub const MISSING_IMPORT_APP: &str = r#"from textual.app import ComposeResult
from textual.widgets import Footer, Header


class DemoApp(App):
    def compose(self) -> ComposeResult:
        yield Header()
        yield Footer()
"#;

/// Uses a deprecated widget
pub const DEPRECATED_WIDGET_APP: &str = r#"from textual.app import App, ComposeResult
from textual.widgets import Footer, Header, TextLog


class LogApp(App):
    def compose(self) -> ComposeResult:
        yield Header()
        yield TextLog()
        yield Footer()
"#;

/// Style block with an unclosed rule on line 6
pub const UNBALANCED_CSS_APP: &str = r#"from textual.app import App, ComposeResult
from textual.widgets import Footer, Header


class BrokenApp(App):
    CSS = """Screen { background: red; dark: 1;"""

    def compose(self) -> ComposeResult:
        yield Header()
        yield Footer()
"#;

/// Application whose widgets nest `levels` deep below the composition root
#[must_use]
pub fn nested_app(levels: usize) -> String {
    let mut source = String::from(
        "from textual.app import App, ComposeResult\n\
         from textual.containers import Vertical\n\
         from textual.widgets import Footer, Header, Label\n\n\n\
         class DeepApp(App):\n    def compose(self) -> ComposeResult:\n        yield Header()\n",
    );
    let mut indent = 8;
    for _ in 1..levels {
        source.push_str(&format!("{}with Vertical():\n", " ".repeat(indent)));
        indent += 4;
    }
    source.push_str(&format!("{}yield Label(\"leaf\")\n", " ".repeat(indent)));
    source.push_str("        yield Footer()\n");
    source
}

/// Write `source` to `dir/name`, returning the path
///
/// # Panics
/// When the file cannot be written.
pub fn write_app(dir: &Path, name: &str, source: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, source).unwrap();
    path
}

// ---------------------------------------------------------------------------
// Mock widget graph
// ---------------------------------------------------------------------------

/// In-memory [`Inspectable`] node
#[derive(Debug, Clone, PartialEq)]
pub struct MockWidget {
    pub kind: String,
    pub identity: u64,
    pub id: Option<String>,
    pub classes: Vec<String>,
    pub visible: bool,
    pub children: Vec<MockWidget>,
    /// Attribute and child reads fail
    pub broken: bool,
}

impl MockWidget {
    pub fn new(kind: &str, identity: u64) -> Self {
        Self {
            kind: kind.to_string(),
            identity,
            id: None,
            classes: Vec::new(),
            visible: true,
            children: Vec::new(),
            broken: false,
        }
    }

    pub fn with_id(mut self, id: &str) -> Self {
        self.id = Some(id.to_string());
        self
    }

    pub fn with_classes(mut self, classes: &[&str]) -> Self {
        self.classes = classes.iter().map(|c| (*c).to_string()).collect();
        self
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    pub fn broken(mut self) -> Self {
        self.broken = true;
        self
    }

    pub fn child(mut self, child: MockWidget) -> Self {
        self.children.push(child);
        self
    }

    /// Number of nodes in this subtree
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(MockWidget::count).sum::<usize>()
    }
}

impl Inspectable for MockWidget {
    fn type_name(&self) -> &str {
        &self.kind
    }

    fn identity(&self) -> u64 {
        self.identity
    }

    fn dom_id(&self) -> Result<Option<String>, InspectError> {
        if self.broken {
            return Err(InspectError::Attribute {
                widget: self.kind.clone(),
                attribute: "id",
                reason: "widget detached".to_string(),
            });
        }
        Ok(self.id.clone())
    }

    fn classes(&self) -> Result<Vec<String>, InspectError> {
        Ok(self.classes.clone())
    }

    fn is_visible(&self) -> bool {
        self.visible
    }

    fn children(&self) -> Result<Vec<&dyn Inspectable>, InspectError> {
        if self.broken {
            return Err(InspectError::Children {
                widget: self.kind.clone(),
                reason: "widget detached".to_string(),
            });
        }
        Ok(self.children.iter().map(|c| c as &dyn Inspectable).collect())
    }
}

/// `Screen` with a header, a container holding two buttons, and a footer
pub fn sample_screen() -> MockWidget {
    MockWidget::new("Screen", 1)
        .child(MockWidget::new("Header", 2))
        .child(
            MockWidget::new("Vertical", 3)
                .with_id("main")
                .child(MockWidget::new("Button", 4).with_id("ok").with_classes(&["primary"]))
                .child(MockWidget::new("Button", 5).with_id("cancel").hidden()),
        )
        .child(MockWidget::new("Footer", 6))
}

// ---------------------------------------------------------------------------
// Scripted host
// ---------------------------------------------------------------------------

/// One handler dispatch in a script
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub handler: String,
    pub event_type: String,
    pub source: String,
    pub elapsed: Duration,
}

impl Step {
    pub fn new(handler: &str, event_type: &str) -> Self {
        Self {
            handler: handler.to_string(),
            event_type: event_type.to_string(),
            source: format!("{event_type}()"),
            elapsed: Duration::from_millis(1),
        }
    }

    pub fn taking(mut self, elapsed: Duration) -> Self {
        self.elapsed = elapsed;
        self
    }
}

/// How a scripted run ends
#[derive(Debug, Clone, PartialEq)]
pub enum Ending {
    Exit,
    Interrupt,
    /// Interrupted after the handler's before hooks ran but before it returned
    InterruptInside(Step),
    Fail { message: String, trace: String },
    Panic(String),
}

/// [`HostApp`] replaying a fixed dispatch script
///
/// Every step runs the "handler" (recorded in [`ScriptedApp::invocations`]) between
/// the installed hooks' before and after callbacks, so tests can check that
/// instrumentation leaves the application's own behaviour unchanged.
#[derive(Debug)]
pub struct ScriptedApp {
    name: String,
    root: Option<MockWidget>,
    handlers: Vec<String>,
    script: Vec<Step>,
    ending: Ending,
    hooks: HookSet,
    invocations: Arc<Mutex<Vec<String>>>,
    host_profile: Vec<PerformanceMetric>,
    pending_profile: Vec<PerformanceMetric>,
    runs: usize,
}

impl ScriptedApp {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            root: None,
            handlers: Vec::new(),
            script: Vec::new(),
            ending: Ending::Exit,
            hooks: HookSet::new(),
            invocations: Arc::new(Mutex::new(Vec::new())),
            host_profile: Vec::new(),
            pending_profile: Vec::new(),
            runs: 0,
        }
    }

    pub fn with_root(mut self, root: MockWidget) -> Self {
        self.root = Some(root);
        self
    }

    pub fn with_handlers(mut self, handlers: &[&str]) -> Self {
        self.handlers = handlers.iter().map(|h| (*h).to_string()).collect();
        self
    }

    pub fn step(mut self, step: Step) -> Self {
        self.script.push(step);
        self
    }

    pub fn ending(mut self, ending: Ending) -> Self {
        self.ending = ending;
        self
    }

    /// Rows the host reports from its own profiler after every run
    pub fn with_host_profile(mut self, rows: Vec<PerformanceMetric>) -> Self {
        self.host_profile = rows;
        self
    }

    /// Handlers actually run, in order, across all runs
    pub fn invocations(&self) -> Vec<String> {
        self.invocations.lock().clone()
    }

    pub fn runs(&self) -> usize {
        self.runs
    }

    pub fn installed_hooks(&self) -> usize {
        self.hooks.len()
    }
}

#[async_trait]
impl HostApp for ScriptedApp {
    fn name(&self) -> &str {
        &self.name
    }

    fn root(&self) -> Option<&dyn Inspectable> {
        self.root.as_ref().map(|r| r as &dyn Inspectable)
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
        std::mem::take(&mut self.pending_profile)
    }

    async fn run(&mut self) -> Result<(), RunError> {
        self.runs += 1;
        self.pending_profile.extend(self.host_profile.iter().cloned());
        for step in &self.script {
            let event = DispatchedEvent::new(&step.handler, &step.source, &step.event_type, &self.name);
            self.hooks.before(&event);
            self.invocations.lock().push(step.handler.clone());
            self.hooks.after(&event, step.elapsed);
            tokio::task::yield_now().await;
        }

        match &self.ending {
            Ending::Exit => Ok(()),
            Ending::Interrupt => Err(RunError::Interrupted),
            Ending::InterruptInside(step) => {
                let event = DispatchedEvent::new(&step.handler, &step.source, &step.event_type, &self.name);
                self.hooks.before(&event);
                self.invocations.lock().push(step.handler.clone());
                Err(RunError::Interrupted)
            }
            Ending::Fail { message, trace } => Err(RunError::failed(message.clone(), trace.clone())),
            Ending::Panic(message) => panic!("{message}"),
        }
    }
}
