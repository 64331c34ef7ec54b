//! Validation issues and fix records

use std::fmt;

/// Issue severity
///
/// Only errors fail validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    /// Validation-fatal
    Error,
    /// Robustness or style concern
    Warning,
    /// Advisory best-practice nudge
    Suggestion,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Suggestion => "suggestion",
        };
        f.write_str(name)
    }
}

/// Stable identifier of the check that produced an issue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IssueCode {
    /// Source file missing
    FileNotFound,
    /// Source file unreadable
    Io,
    /// Source does not parse
    Syntax,
    /// `App` is not imported
    MissingAppImport,
    /// `ComposeResult` is not imported
    MissingComposeResultImport,
    /// No class inherits from `App`
    NoAppClass,
    /// Application class lacks `compose`
    MissingCompose,
    /// `compose` return annotation missing or unexpected
    ComposeAnnotation,
    /// Generic key hook used instead of bindings
    KeyHook,
    /// Widget not in the schema
    UnknownWidget,
    /// Widget renamed or removed
    DeprecatedWidget,
    /// Too few yields in `compose`
    ComposeYields,
    /// Widget nesting too deep
    DeepNesting,
    /// `{` without matching `}`
    StyleUnclosedBlock,
    /// `}` without matching `{`
    StyleUnexpectedClose,
    /// Import inside a stylesheet
    StyleImport,
    /// Stylesheet defines no theme variant
    StyleThemeVariant,
    /// Handler event tag not in the schema
    UnknownEventTag,
    /// Handler takes no event parameter
    HandlerArity,
    /// Repeated `query_one` lookups
    QueryCaching,
    /// Auto-fix ran and changed the file
    FixApplied,
    /// Auto-fix could not write the file
    FixFailed,
}

impl IssueCode {
    /// Kebab-case name
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueCode::FileNotFound => "file-not-found",
            IssueCode::Io => "io",
            IssueCode::Syntax => "syntax",
            IssueCode::MissingAppImport => "missing-app-import",
            IssueCode::MissingComposeResultImport => "missing-compose-result-import",
            IssueCode::NoAppClass => "no-app-class",
            IssueCode::MissingCompose => "missing-compose",
            IssueCode::ComposeAnnotation => "compose-annotation",
            IssueCode::KeyHook => "key-hook",
            IssueCode::UnknownWidget => "unknown-widget",
            IssueCode::DeprecatedWidget => "deprecated-widget",
            IssueCode::ComposeYields => "compose-yields",
            IssueCode::DeepNesting => "deep-nesting",
            IssueCode::StyleUnclosedBlock => "style-unclosed-block",
            IssueCode::StyleUnexpectedClose => "style-unexpected-close",
            IssueCode::StyleImport => "style-import",
            IssueCode::StyleThemeVariant => "style-theme-variant",
            IssueCode::UnknownEventTag => "unknown-event-tag",
            IssueCode::HandlerArity => "handler-arity",
            IssueCode::QueryCaching => "query-caching",
            IssueCode::FixApplied => "fix-applied",
            IssueCode::FixFailed => "fix-failed",
        }
    }
}

impl fmt::Display for IssueCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where an issue was found
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locator {
    /// 1-based source line
    pub line: usize,
    /// Enclosing class, method or attribute
    pub symbol: Option<String>,
}

/// A single finding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    severity: Severity,
    code: IssueCode,
    message: String,
    locator: Option<Locator>,
}

impl ValidationIssue {
    /// Create issue
    #[must_use]
    pub fn new(severity: Severity, code: IssueCode, message: impl Into<String>) -> Self {
        Self {
            severity,
            code,
            message: message.into(),
            locator: None,
        }
    }

    /// Create error
    #[inline]
    #[must_use]
    pub fn error(code: IssueCode, message: impl Into<String>) -> Self {
        Self::new(Severity::Error, code, message)
    }

    /// Create warning
    #[inline]
    #[must_use]
    pub fn warning(code: IssueCode, message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, code, message)
    }

    /// Create suggestion
    #[inline]
    #[must_use]
    pub fn suggestion(code: IssueCode, message: impl Into<String>) -> Self {
        Self::new(Severity::Suggestion, code, message)
    }

    /// With source line
    #[must_use]
    pub fn at_line(mut self, line: usize) -> Self {
        let symbol = self.locator.take().and_then(|l| l.symbol);
        self.locator = Some(Locator { line, symbol });
        self
    }

    /// With source line and symbol
    #[must_use]
    pub fn at(mut self, line: usize, symbol: impl Into<String>) -> Self {
        self.locator = Some(Locator {
            line,
            symbol: Some(symbol.into()),
        });
        self
    }

    /// Severity
    #[inline]
    #[must_use]
    pub fn severity(&self) -> Severity {
        self.severity
    }

    /// Producing check
    #[inline]
    #[must_use]
    pub fn code(&self) -> IssueCode {
        self.code
    }

    /// Human-readable message
    #[inline]
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Location, when known
    #[inline]
    #[must_use]
    pub fn locator(&self) -> Option<&Locator> {
        self.locator.as_ref()
    }

    /// Source line, when known
    #[inline]
    #[must_use]
    pub fn line(&self) -> Option<usize> {
        self.locator.as_ref().map(|l| l.line)
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)?;
        if let Some(line) = self.line() {
            write!(f, " (line {line})")?;
        }
        Ok(())
    }
}

/// A source change written by the auto-fix engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixRecord {
    /// What was changed
    pub description: String,
}

impl FixRecord {
    /// Create record
    #[must_use]
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
        }
    }
}

impl fmt::Display for FixRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.description)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_appends_line() {
        let issue = ValidationIssue::error(IssueCode::StyleUnclosedBlock, "Unclosed style block")
            .at(12, "CSS");
        assert_eq!(issue.to_string(), "Unclosed style block (line 12)");
        assert_eq!(issue.locator().unwrap().symbol.as_deref(), Some("CSS"));
    }

    #[test]
    fn display_without_locator() {
        let issue = ValidationIssue::warning(IssueCode::MissingComposeResultImport, "import it");
        assert_eq!(issue.to_string(), "import it");
        assert_eq!(issue.line(), None);
    }

    #[test]
    fn codes_are_kebab_case() {
        assert_eq!(IssueCode::MissingAppImport.as_str(), "missing-app-import");
        assert_eq!(IssueCode::DeepNesting.to_string(), "deep-nesting");
    }
}
