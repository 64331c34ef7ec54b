//! Static approximation and layout analysis
//!
//! Without a live run, the widget tree and handler inventory are read from the
//! syntax tree: one root per composition method (the owning class), children
//! following `with` blocks and container call arguments.

use std::collections::BTreeMap;
use std::fmt::Write;
use std::path::Path;

use serde::Serialize;
use tdoc_core::report::heavy_rule;
use tdoc_core::schema::{event_tag, APP_BASE, HANDLER_PREFIX, MAX_NESTING_DEPTH};
use tdoc_core::{compositions, Schema, SourceTree};

use crate::error::AnalysisError;
use crate::inspect::{WidgetInfo, WidgetTree};

/// More regular widgets than this directly under a root is flagged
const LOOSE_WIDGET_LIMIT: usize = 5;

const LAYOUT_RECOMMENDATIONS: &[&str] = &[
    "Use Horizontal/Vertical for simple layouts",
    "Use Grid for complex layouts",
    "Avoid excessive nesting (>5 levels)",
    "Consider using CSS grid for 2D layouts",
    "Use content-align for simple alignment",
];

/// One event handler
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HandlerInfo {
    /// Method name
    pub name: String,
    /// Defining class
    pub class: Option<String>,
    /// Event-type tag (`key` for `on_key_pressed`)
    pub event_tag: Option<String>,
    /// 1-based definition line; unknown for live handlers
    pub line: Option<usize>,
}

/// What the syntax tree says about an application
#[derive(Debug, Clone, Default)]
pub struct StaticAnalysis {
    /// Declared widgets under their composing class
    pub tree: WidgetTree,
    /// Handlers in source order
    pub handlers: Vec<HandlerInfo>,
    /// Classes deriving from the application base
    pub app_classes: Vec<String>,
}

/// Analyse parsed source
#[must_use]
pub fn analyze_source(source: &SourceTree) -> StaticAnalysis {
    let mut tree = WidgetTree::new();

    for composition in compositions(source) {
        let root = WidgetInfo::new(composition.owner(), composition.method.node.start_byte() as u64);
        let root_name = root.name.clone();
        tree.add(root);

        let mut names: Vec<String> = Vec::with_capacity(composition.widgets.len());
        for decl in &composition.widgets {
            let parent = decl
                .parent
                .and_then(|p| names.get(p).cloned())
                .unwrap_or_else(|| root_name.clone());
            let info = WidgetInfo::new(decl.widget_type(), decl.call.node.start_byte() as u64)
                .with_id(decl.id.clone())
                .with_classes(decl.classes.iter().cloned())
                .with_parent(Some(parent));
            names.push(info.name.clone());
            tree.add(info);
        }
    }

    let handlers = source
        .functions()
        .into_iter()
        .filter(|f| f.name.starts_with(HANDLER_PREFIX))
        .map(|f| HandlerInfo {
            event_tag: event_tag(&f.name).map(str::to_string),
            class: f.class.clone(),
            line: Some(f.line),
            name: f.name,
        })
        .collect();

    let app_classes = source
        .classes()
        .into_iter()
        .filter(|c| c.inherits_from(APP_BASE))
        .map(|c| c.name)
        .collect();

    StaticAnalysis {
        tree,
        handlers,
        app_classes,
    }
}

/// Read, parse and analyse `path`
///
/// # Errors
/// [`AnalysisError::Io`] when the file cannot be read, [`AnalysisError::Parse`] when
/// it is not valid Python.
pub fn analyze_file(path: &Path) -> Result<StaticAnalysis, AnalysisError> {
    let source = std::fs::read_to_string(path).map_err(|source| AnalysisError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let tree = SourceTree::parse(source).map_err(|source| AnalysisError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    let analysis = analyze_source(&tree);
    tracing::debug!(
        "{}: {} declared widget(s), {} handler(s)",
        path.display(),
        analysis.tree.len(),
        analysis.handlers.len()
    );
    Ok(analysis)
}

/// Layout statistics over a widget tree
///
/// Roots are screens or composing classes and are not counted as widgets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LayoutAnalysis {
    /// Widgets below the roots
    pub total: usize,
    /// Containers among them
    pub containers: usize,
    /// Non-container widgets
    pub regular: usize,
    /// Containers per type
    pub distribution: BTreeMap<String, usize>,
    /// Deepest nesting
    pub max_depth: usize,
    /// Most regular widgets directly under one root
    pub loose_widgets: usize,
}

impl LayoutAnalysis {
    /// Analyse `tree`
    #[must_use]
    pub fn from_tree(tree: &WidgetTree, schema: &Schema) -> Self {
        let mut distribution = BTreeMap::new();
        let mut total = 0;
        for node in tree.nodes().iter().filter(|n| n.parent.is_some()) {
            total += 1;
            if schema.is_container(&node.widget_type) {
                *distribution.entry(node.widget_type.clone()).or_insert(0) += 1;
            }
        }
        let containers = distribution.values().sum();

        let loose_widgets = tree
            .roots()
            .iter()
            .map(|root| {
                tree.children_of(&root.name)
                    .iter()
                    .filter(|c| !schema.is_container(&c.widget_type))
                    .count()
            })
            .max()
            .unwrap_or(0);

        Self {
            total,
            containers,
            regular: total - containers,
            distribution,
            max_depth: tree.max_depth(),
            loose_widgets,
        }
    }

    /// Warning lines for the analysis
    #[must_use]
    pub fn warnings(&self) -> Vec<&'static str> {
        let mut warnings = Vec::new();
        if self.loose_widgets > LOOSE_WIDGET_LIMIT {
            warnings.push("Many widgets without containers may cause layout issues");
        }
        if self.max_depth > MAX_NESTING_DEPTH {
            warnings.push("Deep nesting may impact performance");
        }
        warnings
    }

    /// Render the `LAYOUT ANALYSIS` block
    #[must_use]
    pub fn generate_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "LAYOUT ANALYSIS");
        let _ = writeln!(out, "{}", heavy_rule());
        let _ = writeln!(out, "\nTotal widgets: {}", self.total);
        let _ = writeln!(out, "Containers: {}", self.containers);
        let _ = writeln!(out, "Regular widgets: {}", self.regular);

        let _ = writeln!(out, "\nContainer distribution:");
        for (kind, count) in &self.distribution {
            let _ = writeln!(out, "  {kind}: {count}");
        }

        let _ = writeln!(out, "\nMaximum nesting depth: {}", self.max_depth);
        for warning in self.warnings() {
            let _ = writeln!(out, "\nWARNING: {warning}");
        }

        let _ = writeln!(out, "\nLayout recommendations:");
        for rec in LAYOUT_RECOMMENDATIONS {
            let _ = writeln!(out, "  • {rec}");
        }
        let _ = writeln!(out, "{}", heavy_rule());
        out
    }
}
