//! Dynamic debug report
//!
//! Sections in order: widget tree, layout analysis, event handlers, recent events,
//! performance metrics, error diagnosis. Each appears only when enabled and
//! non-empty, except the metrics section, which explains itself when profiling was
//! requested but produced nothing.

use std::fmt::Write as _;
use std::io::Write;
use std::path::PathBuf;

use tdoc_core::report::{heavy_rule, push_section};
use tdoc_core::Schema;

use crate::analysis::LayoutAnalysis;
use crate::config::DebugConfig;
use crate::debugger::{DebugSession, ProfileSummary, RunOutcome};
use crate::error::ReportError;
use crate::inspect::{WidgetInfo, WidgetTree};

const GENERAL_STEPS: &[&str] = &[
    "Check the full traceback for error location",
    "Verify all imports are correct",
    "Check widget names and IDs",
    "Ensure proper indentation",
    "Run with --verbose for more details",
];

/// Likely causes for a failure type name
fn known_causes(failure_type: &str) -> Option<&'static [&'static str]> {
    let causes: &'static [&'static str] = match failure_type {
        "ImportError" | "ModuleNotFoundError" => &[
            "Ensure Textual is installed: pip install textual",
            "Check Python version (requires 3.7+)",
            "Verify import statements are correct",
        ],
        "SyntaxError" => &[
            "Check for missing colons (:) at end of lines",
            "Verify proper indentation",
            "Ensure parentheses are balanced",
        ],
        "AttributeError" => &[
            "Verify widget names are spelled correctly",
            "Check that widgets are properly imported",
            "Ensure widgets exist in this Textual version",
        ],
        "TypeError" => &[
            "Check method signatures",
            "Verify event handlers accept correct parameters",
            "Ensure CSS is properly formatted",
        ],
        "KeyError" => &[
            "Verify all widget IDs exist",
            "Check for typos in widget IDs",
            "Ensure widgets are created before being queried",
        ],
        _ => return None,
    };
    Some(causes)
}

/// Render the `WIDGET TREE` block, roots first, down to `max_depth`
#[must_use]
pub fn format_widget_tree(tree: &WidgetTree, max_depth: usize) -> String {
    if tree.is_empty() {
        return "No widgets found\n".to_string();
    }

    let mut out = String::new();
    let _ = writeln!(out, "WIDGET TREE");
    let _ = writeln!(out, "{}", heavy_rule());
    for root in tree.roots() {
        render_widget(&mut out, tree, root, 0, max_depth);
    }
    let _ = writeln!(out, "{}", heavy_rule());
    out
}

fn render_widget(out: &mut String, tree: &WidgetTree, widget: &WidgetInfo, depth: usize, max_depth: usize) {
    if depth > max_depth {
        return;
    }

    let _ = write!(out, "{}├─ {}", "  ".repeat(depth), widget.widget_type);
    if let Some(id) = &widget.id {
        let _ = write!(out, " (id: {id})");
    }
    if !widget.classes.is_empty() {
        let _ = write!(out, " [classes: {}]", widget.classes.join(", "));
    }
    if !widget.visible {
        out.push_str(" (hidden)");
    }
    out.push('\n');

    for child in tree.children_of(&widget.name) {
        render_widget(out, tree, child, depth + 1, max_depth);
    }
}

/// Render the `ERROR DIAGNOSIS` block for failure messages
///
/// The failure type is the text before the first colon.
#[must_use]
pub fn diagnose_errors(errors: &[String]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "ERROR DIAGNOSIS");
    let _ = writeln!(out, "{}", heavy_rule());

    if errors.is_empty() {
        out.push_str("No errors to diagnose.\n");
        return out;
    }

    for error in errors {
        let _ = writeln!(out, "\n{error}");
        let failure_type = error.split_once(':').map_or("Unknown", |(t, _)| t.trim());
        if let Some(causes) = known_causes(failure_type) {
            out.push_str("\nPossible solutions:\n");
            for cause in causes {
                let _ = writeln!(out, "  • {cause}");
            }
        }
    }

    out.push_str("\nGeneral debugging steps:\n");
    for (i, step) in GENERAL_STEPS.iter().enumerate() {
        let _ = writeln!(out, "  {}. {step}", i + 1);
    }
    let _ = writeln!(out, "{}", heavy_rule());
    out
}

/// Text report for one debug session
#[derive(Debug, Clone)]
pub struct DebugReport<'a> {
    name: &'a str,
    session: &'a DebugSession,
    config: &'a DebugConfig,
    generated: Option<String>,
}

impl<'a> DebugReport<'a> {
    /// Create report for the file displayed as `name`
    #[must_use]
    pub fn new(name: &'a str, session: &'a DebugSession, config: &'a DebugConfig) -> Self {
        Self {
            name,
            session,
            config,
            generated: None,
        }
    }

    /// Fix the `Generated:` timestamp
    #[must_use]
    pub fn with_timestamp(mut self, generated: impl Into<String>) -> Self {
        self.generated = Some(generated.into());
        self
    }

    /// Render the report
    #[must_use]
    pub fn generate_text(&self) -> String {
        let session = self.session;
        let config = self.config;
        let mut out = String::new();

        let generated = self
            .generated
            .clone()
            .unwrap_or_else(|| chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string());
        let _ = writeln!(out, "{}", heavy_rule());
        let _ = writeln!(out, "TEXTUAL DEBUG REPORT: {}", self.name);
        let _ = writeln!(out, "Generated: {generated}");
        let _ = writeln!(out, "Mode: {}", self.mode());
        let _ = writeln!(out, "{}", heavy_rule());

        if !session.tree.is_empty() || config.shows_tree() {
            let _ = write!(out, "\n{}", format_widget_tree(&session.tree, config.max_tree_depth));
        }

        if config.shows_layout() {
            let layout = LayoutAnalysis::from_tree(&session.tree, Schema::textual());
            let _ = write!(out, "\n{}", layout.generate_text());
        }

        if (config.trace_events || config.verbose) && !session.handlers.is_empty() {
            push_section(&mut out, "EVENT HANDLERS");
            for handler in &session.handlers {
                let tag = handler.event_tag.as_deref().unwrap_or("-");
                let _ = write!(out, "{:30} | {:12}", handler.name, tag);
                match (&handler.class, handler.line) {
                    (Some(class), Some(line)) => {
                        let _ = write!(out, " | {class}:{line}");
                    }
                    (Some(class), None) => {
                        let _ = write!(out, " | {class}");
                    }
                    (None, Some(line)) => {
                        let _ = write!(out, " | line {line}");
                    }
                    (None, None) => {}
                }
                out.push('\n');
            }
        }

        if !session.events.is_empty() {
            push_section(&mut out, &format!("RECENT EVENTS (last {})", config.recent_events));
            let skip = session.events.len().saturating_sub(config.recent_events);
            for event in &session.events[skip..] {
                let _ = writeln!(
                    out,
                    "{:.4} | {:20} | {} -> {}",
                    event.timestamp, event.event_type, event.source, event.target
                );
            }
        }

        match &session.profile {
            ProfileSummary::Disabled => {}
            ProfileSummary::Metrics(metrics) => {
                push_section(&mut out, "PERFORMANCE METRICS");
                if metrics.is_empty() {
                    out.push_str("No calls recorded\n");
                }
                for metric in metrics.iter().take(config.top_metrics) {
                    let _ = writeln!(
                        out,
                        "{:30} | {:5} calls | {:.4}s total | {:.6}s/call | {:.4}s cumulative",
                        metric.function_name,
                        metric.call_count,
                        metric.total_time,
                        metric.per_call_time,
                        metric.cumulative_time
                    );
                }
            }
            ProfileSummary::Unavailable(reason) => {
                push_section(&mut out, "PERFORMANCE METRICS");
                let _ = writeln!(out, "Profiling unavailable: {reason}");
            }
        }

        if !session.failures.is_empty() {
            push_section(&mut out, "ERRORS DETECTED");
            let messages: Vec<String> = session.failures.iter().map(|f| f.message.clone()).collect();
            out.push_str(&diagnose_errors(&messages));
        }

        let _ = writeln!(out, "\n{}", heavy_rule());
        out
    }

    fn mode(&self) -> String {
        if !self.session.live {
            return "static analysis (run with --live to execute the application)".to_string();
        }
        let outcome = match self.session.outcome {
            Some(RunOutcome::Exited) | None => "exited",
            Some(RunOutcome::Interrupted) => "interrupted",
            Some(RunOutcome::Crashed) => "crashed",
        };
        format!("live, {} run(s), {outcome}", self.session.runs)
    }
}

/// Deliver a rendered report
///
/// Goes to the configured log file, or to `stdout` when none is set; a copy goes to
/// the output file. Returns the files written.
///
/// # Errors
/// [`ReportError::Io`] when a destination cannot be written.
pub fn emit(text: &str, config: &DebugConfig, stdout: &mut dyn Write) -> Result<Vec<PathBuf>, ReportError> {
    let mut written = Vec::new();

    match &config.log_file {
        Some(path) => {
            std::fs::write(path, text).map_err(|e| ReportError::io(path, e))?;
            tracing::info!("debug report saved to {}", path.display());
            written.push(path.clone());
        }
        None => {
            stdout
                .write_all(text.as_bytes())
                .and_then(|()| stdout.flush())
                .map_err(|e| ReportError::io("<stdout>", e))?;
        }
    }

    if let Some(path) = &config.output_file {
        if config.log_file.as_ref() != Some(path) {
            std::fs::write(path, text).map_err(|e| ReportError::io(path, e))?;
            tracing::info!("report copy saved to {}", path.display());
            written.push(path.clone());
        }
    }

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::debugger::RuntimeFailure;
    use crate::trace::EventInfo;
    use pretty_assertions::assert_eq;

    fn tree() -> WidgetTree {
        let mut tree = WidgetTree::new();
        tree.add(WidgetInfo::new("Screen", 1));
        tree.add(
            WidgetInfo::new("Button", 2)
                .with_id(Some("go".to_string()))
                .with_classes(["primary".to_string(), "wide".to_string()])
                .with_parent(Some("Screen_1".to_string())),
        );
        let mut hidden = WidgetInfo::new("Label", 3).with_parent(Some("Screen_1".to_string()));
        hidden.visible = false;
        tree.add(hidden);
        tree
    }

    #[test]
    fn widget_tree_annotations() {
        let text = format_widget_tree(&tree(), 5);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "WIDGET TREE");
        assert_eq!(lines[2], "├─ Screen");
        assert_eq!(lines[3], "  ├─ Button (id: go) [classes: primary, wide]");
        assert_eq!(lines[4], "  ├─ Label (hidden)");
    }

    #[test]
    fn widget_tree_depth_limit() {
        let text = format_widget_tree(&tree(), 0);
        assert!(text.contains("├─ Screen"));
        assert!(!text.contains("Button"));
    }

    #[test]
    fn empty_tree() {
        assert_eq!(format_widget_tree(&WidgetTree::new(), 5), "No widgets found\n");
    }

    #[test]
    fn captured_tree_is_rendered_without_inspect() {
        let session = DebugSession {
            tree: tree(),
            ..DebugSession::default()
        };
        let config = DebugConfig::new();
        let text = DebugReport::new("app.py", &session, &config).generate_text();
        assert!(text.contains("WIDGET TREE"));
        assert!(text.contains("  ├─ Button (id: go) [classes: primary, wide]"));

        let empty = DebugReport::new("app.py", &DebugSession::default(), &config).generate_text();
        assert!(!empty.contains("WIDGET TREE"));
        assert!(!empty.contains("No widgets found"));
    }

    #[test]
    fn diagnosis_matches_failure_type() {
        let text = diagnose_errors(&["KeyError: 'missing'".to_string()]);
        assert!(text.contains("Possible solutions:"));
        assert!(text.contains("  • Verify all widget IDs exist"));
        assert!(text.contains("  5. Run with --verbose for more details"));
    }

    #[test]
    fn unknown_failure_gets_general_steps_only() {
        let text = diagnose_errors(&["RecursionError: too deep".to_string()]);
        assert!(!text.contains("Possible solutions:"));
        assert!(text.contains("General debugging steps:"));
        assert!(diagnose_errors(&[]).contains("No errors to diagnose."));
    }

    #[test]
    fn recent_events_are_truncated() {
        let mut session = DebugSession {
            live: true,
            outcome: Some(RunOutcome::Interrupted),
            runs: 1,
            ..DebugSession::default()
        };
        for i in 0..25 {
            session.events.push(EventInfo {
                event_type: format!("on_key_{i}"),
                timestamp: f64::from(i) / 10.0,
                source: "Key".to_string(),
                target: "DemoApp".to_string(),
                data: serde_json::Map::new(),
            });
        }
        let config = DebugConfig::new();
        let text = DebugReport::new("app.py", &session, &config)
            .with_timestamp("2026-01-01 00:00:00")
            .generate_text();

        assert!(text.contains("Mode: live, 1 run(s), interrupted"));
        assert!(text.contains("RECENT EVENTS (last 20)"));
        assert!(!text.contains("on_key_4 "));
        assert!(text.contains("0.5000 | on_key_5             | Key -> DemoApp"));
        assert!(text.contains("2.4000 | on_key_24"));
    }

    #[test]
    fn profiling_notice() {
        let session = DebugSession {
            profile: ProfileSummary::Unavailable("profiling requires a live run (--live)".to_string()),
            ..DebugSession::default()
        };
        let config = DebugConfig::new();
        let text = DebugReport::new("app.py", &session, &config).generate_text();
        assert!(text.contains("PERFORMANCE METRICS"));
        assert!(text.contains("Profiling unavailable: profiling requires a live run (--live)"));
    }

    #[test]
    fn failures_are_diagnosed() {
        let session = DebugSession {
            live: true,
            outcome: Some(RunOutcome::Crashed),
            failures: vec![RuntimeFailure {
                message: "AttributeError: 'NoneType' object has no attribute 'x'".to_string(),
                trace: String::new(),
            }],
            ..DebugSession::default()
        };
        let config = DebugConfig::new();
        let text = DebugReport::new("app.py", &session, &config).generate_text();
        assert!(text.contains("ERRORS DETECTED"));
        assert!(text.contains("Verify widget names are spelled correctly"));
    }

    #[test]
    fn header_layout() {
        let session = DebugSession::default();
        let config = DebugConfig::new();
        let text = DebugReport::new("app.py", &session, &config)
            .with_timestamp("2026-01-01 00:00:00")
            .generate_text();
        let rule = heavy_rule();
        let expected = format!(
            "{rule}\nTEXTUAL DEBUG REPORT: app.py\nGenerated: 2026-01-01 00:00:00\n\
             Mode: static analysis (run with --live to execute the application)\n{rule}\n\n{rule}\n"
        );
        assert_eq!(text, expected);
    }

    #[test]
    fn emit_to_stdout_and_copy() {
        let dir = tempfile::tempdir().unwrap();
        let copy = dir.path().join("copy.txt");
        let config = DebugConfig::new().with_output_file(&copy);

        let mut stdout = Vec::new();
        let written = emit("report\n", &config, &mut stdout).unwrap();
        assert_eq!(stdout, b"report\n");
        assert_eq!(written, vec![copy.clone()]);
        assert_eq!(std::fs::read_to_string(copy).unwrap(), "report\n");
    }

    #[test]
    fn emit_to_log_file() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("debug.log");
        let config = DebugConfig::new().with_log_file(&log);

        let mut stdout = Vec::new();
        emit("report\n", &config, &mut stdout).unwrap();
        assert!(stdout.is_empty());
        assert_eq!(std::fs::read_to_string(log).unwrap(), "report\n");
    }
}
