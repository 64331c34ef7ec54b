//! Debugger configuration

use std::path::PathBuf;

/// Widget tree rendering depth
pub const DEFAULT_MAX_TREE_DEPTH: usize = 5;

/// Events shown in a report
pub const DEFAULT_RECENT_EVENTS: usize = 20;

/// Metrics shown in a report
pub const DEFAULT_TOP_METRICS: usize = 10;

/// Metrics retained from a profile
pub const DEFAULT_PROFILE_LIMIT: usize = 50;

/// Interpreter used by the live host unless overridden
pub const DEFAULT_PYTHON: &str = "python3";

/// Environment variable overriding the interpreter
pub const PYTHON_ENV: &str = "TDOC_PYTHON";

/// Debug session settings
///
/// Built once per invocation and passed by reference; nothing mutates it afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebugConfig {
    /// Record handler dispatches
    pub trace_events: bool,
    /// Render the widget tree
    pub trace_widgets: bool,
    /// Render the layout analysis
    pub trace_layout: bool,
    /// Profile handler and run timings
    pub profile_performance: bool,
    /// Report destination instead of stdout
    pub log_file: Option<PathBuf>,
    /// Echo events as they happen and show every section
    pub verbose: bool,
    /// Extra copy of the report
    pub output_file: Option<PathBuf>,
    /// Runs of the application under one profiler, at least 1
    pub iterations: usize,
    /// Deepest widget tree level rendered
    pub max_tree_depth: usize,
    /// Trailing events rendered
    pub recent_events: usize,
    /// Metrics rendered
    pub top_metrics: usize,
    /// Metrics kept from the profile
    pub profile_limit: usize,
    /// Interpreter for the live host
    pub python: String,
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            trace_events: false,
            trace_widgets: false,
            trace_layout: false,
            profile_performance: false,
            log_file: None,
            verbose: false,
            output_file: None,
            iterations: 1,
            max_tree_depth: DEFAULT_MAX_TREE_DEPTH,
            recent_events: DEFAULT_RECENT_EVENTS,
            top_metrics: DEFAULT_TOP_METRICS,
            profile_limit: DEFAULT_PROFILE_LIMIT,
            python: DEFAULT_PYTHON.to_string(),
        }
    }
}

impl DebugConfig {
    /// Create default config
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply environment overrides
    #[must_use]
    pub fn from_env(mut self) -> Self {
        if let Ok(python) = std::env::var(PYTHON_ENV) {
            if !python.trim().is_empty() {
                self.python = python;
            }
        }
        self
    }

    /// With event tracing
    #[must_use]
    pub fn with_trace_events(mut self, enabled: bool) -> Self {
        self.trace_events = enabled;
        self
    }

    /// With widget tree rendering
    #[must_use]
    pub fn with_trace_widgets(mut self, enabled: bool) -> Self {
        self.trace_widgets = enabled;
        self
    }

    /// With layout analysis
    #[must_use]
    pub fn with_trace_layout(mut self, enabled: bool) -> Self {
        self.trace_layout = enabled;
        self
    }

    /// With profiling
    #[must_use]
    pub fn with_profiling(mut self, enabled: bool) -> Self {
        self.profile_performance = enabled;
        self
    }

    /// With verbose output
    #[must_use]
    pub fn with_verbose(mut self, enabled: bool) -> Self {
        self.verbose = enabled;
        self
    }

    /// Tree, layout and verbose together
    #[must_use]
    pub fn analyze(self) -> Self {
        self.with_trace_widgets(true)
            .with_trace_layout(true)
            .with_verbose(true)
    }

    /// With report destination
    #[must_use]
    pub fn with_log_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_file = Some(path.into());
        self
    }

    /// With report copy
    #[must_use]
    pub fn with_output_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_file = Some(path.into());
        self
    }

    /// With run count, clamped to at least 1
    #[must_use]
    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations.max(1);
        self
    }

    /// With interpreter
    #[must_use]
    pub fn with_python(mut self, python: impl Into<String>) -> Self {
        self.python = python.into();
        self
    }

    /// Whether the widget tree belongs in the report even when nothing was captured
    #[inline]
    #[must_use]
    pub fn shows_tree(&self) -> bool {
        self.trace_widgets || self.verbose
    }

    /// Whether the layout analysis belongs in the report
    #[inline]
    #[must_use]
    pub fn shows_layout(&self) -> bool {
        self.trace_layout || self.verbose
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = DebugConfig::default();
        assert_eq!(config.iterations, 1);
        assert_eq!(config.max_tree_depth, 5);
        assert_eq!(config.recent_events, 20);
        assert_eq!(config.top_metrics, 10);
        assert_eq!(config.profile_limit, 50);
        assert!(!config.shows_tree());
    }

    #[test]
    fn analyze_enables_tree_layout_and_verbose() {
        let config = DebugConfig::new().analyze();
        assert!(config.trace_widgets && config.trace_layout && config.verbose);
        assert!(!config.trace_events);
    }

    #[test]
    fn iterations_are_clamped() {
        assert_eq!(DebugConfig::new().with_iterations(0).iterations, 1);
        assert_eq!(DebugConfig::new().with_iterations(3).iterations, 3);
    }
}
