//! Widget schema registry
//!
//! Static tables describing the Textual framework as far as the diagnostics need to
//! know it: widget and container names, event tags used in handler names, and
//! renamed identifiers. Read-only; shared freely across threads.

use std::collections::{HashMap, HashSet};

use once_cell::sync::Lazy;

/// Name of the application base class
pub const APP_BASE: &str = "App";

/// Composition method that declares an application's widget tree
pub const COMPOSE_METHOD: &str = "compose";

/// Expected return annotation of the composition method
pub const COMPOSE_RESULT: &str = "ComposeResult";

/// Prefix that binds a method to an event
pub const HANDLER_PREFIX: &str = "on_";

/// Generic key-press hook, superseded by `BINDINGS` tables
pub const KEY_HOOK: &str = "on_key";

/// Class attributes holding embedded stylesheets
pub const STYLE_ATTRIBUTES: &[&str] = &["CSS", "DEFAULT_CSS"];

/// Markers that indicate a stylesheet defines theme variants
pub const THEME_MARKERS: &[&str] = &["dark:", "quantum:"];

/// Import line inserted by the auto-fix engine
pub const BASE_IMPORT: &str = "from textual.app import App, ComposeResult";

/// Module prefix of the framework
pub const FRAMEWORK_MODULE: &str = "textual";

/// Deepest widget nesting that does not warrant a warning
pub const MAX_NESTING_DEPTH: usize = 5;

/// Minimum number of yields expected from a composition method
pub const MIN_COMPOSE_YIELDS: usize = 2;

/// Number of `query_one` calls above which caching is recommended
pub const QUERY_ONE_THRESHOLD: usize = 5;

/// Generic tips appended to reports that carry suggestions
pub const PERFORMANCE_TIPS: &[&str] = &[
    "Use 'content-align' instead of nested containers for alignment",
    "Cache frequently accessed widgets with query_one()",
    "Use 'disabled' attribute instead of removing/re-adding widgets",
    "Minimize DOM queries by storing widget references",
    "Use CSS classes for common styling instead of inline styles",
    "Consider using 'reactive' for frequently changing values",
    "Use 'Lazy' widgets for large lists or grids",
];

const WIDGETS: &[&str] = &[
    "Badge",
    "Button",
    "Checkbox",
    "ContentTab",
    "DataGrid",
    "DataTable",
    "Digits",
    "DirectoryTree",
    "FileTree",
    "Footer",
    "Gauge",
    "Header",
    "Input",
    "Label",
    "Link",
    "ListItem",
    "ListView",
    "LoadingIndicator",
    "Log",
    "Markdown",
    "MarkdownViewer",
    "OptionList",
    "Placeholder",
    "Pretty",
    "ProgressBar",
    "RadioButton",
    "RadioSet",
    "RichLog",
    "Rule",
    "Select",
    "SelectionList",
    "Sparkline",
    "Static",
    "Switch",
    "Table",
    "Tabs",
    "Tag",
    "TextArea",
    "Toast",
    "Tree",
];

const CONTAINERS: &[&str] = &[
    "Center",
    "Collapsible",
    "Container",
    "ContentSwitcher",
    "Grid",
    "Horizontal",
    "HorizontalScroll",
    "Middle",
    "ScreenSwitch",
    "ScrollableContainer",
    "TabPane",
    "TabbedContent",
    "Tabs",
    "Vertical",
    "VerticalScroll",
];

// First segment of `on_<tag>_<name>` handler names, lowercase.
const EVENT_TAGS: &[&str] = &[
    "app",
    "blur",
    "button",
    "checkbox",
    "click",
    "collapsible",
    "data",
    "descendant",
    "directory",
    "enter",
    "event",
    "focus",
    "hide",
    "input",
    "key",
    "leave",
    "list",
    "load",
    "log",
    "markdown",
    "message",
    "mount",
    "mouse",
    "option",
    "paste",
    "radio",
    "resize",
    "screen",
    "select",
    "selection",
    "show",
    "switch",
    "tab",
    "tabbed",
    "text",
    "tree",
    "unmount",
];

const DEPRECATED: &[(&str, &str)] = &[
    ("FooterTui", "Footer"),
    ("HeaderTui", "Header"),
    ("TextLog", "RichLog"),
];

static TEXTUAL: Lazy<Schema> = Lazy::new(|| Schema {
    widgets: WIDGETS.iter().copied().collect(),
    containers: CONTAINERS.iter().copied().collect(),
    event_tags: EVENT_TAGS.iter().copied().collect(),
    deprecated: DEPRECATED.iter().copied().collect(),
});

/// Known identifiers of a widget framework
#[derive(Debug, Clone)]
pub struct Schema {
    widgets: HashSet<&'static str>,
    containers: HashSet<&'static str>,
    event_tags: HashSet<&'static str>,
    deprecated: HashMap<&'static str, &'static str>,
}

impl Schema {
    /// Registry for the Textual framework
    #[inline]
    #[must_use]
    pub fn textual() -> &'static Schema {
        &TEXTUAL
    }

    /// Whether `name` is a known leaf widget
    #[inline]
    #[must_use]
    pub fn is_known_widget(&self, name: &str) -> bool {
        self.widgets.contains(name)
    }

    /// Whether `name` is a known container
    #[inline]
    #[must_use]
    pub fn is_container(&self, name: &str) -> bool {
        self.containers.contains(name)
    }

    /// Whether `name` is a widget or container
    #[inline]
    #[must_use]
    pub fn is_known(&self, name: &str) -> bool {
        self.is_known_widget(name) || self.is_container(name)
    }

    /// Whether `tag` is a known handler event tag, case-insensitively
    #[must_use]
    pub fn is_known_event(&self, tag: &str) -> bool {
        self.event_tags.contains(tag.to_ascii_lowercase().as_str())
    }

    /// Replacement for a deprecated identifier
    #[inline]
    #[must_use]
    pub fn replacement_for(&self, name: &str) -> Option<&'static str> {
        self.deprecated.get(name).copied()
    }
}

/// Event tag of `on_<tag>_<rest>`; `None` for single-segment names like `on_mount`
#[must_use]
pub fn event_tag(name: &str) -> Option<&str> {
    let rest = name.strip_prefix(HANDLER_PREFIX)?;
    let mut segments = rest.split('_');
    let tag = segments.next()?;
    segments.next()?;
    Some(tag)
}

/// Whether a stylesheet mentions any theme variant marker
#[must_use]
pub fn has_theme_variant(css: &str) -> bool {
    THEME_MARKERS.iter().any(|m| css.contains(m))
}
