//! Validation session
//!
//! The mutable accumulator every rule pass appends to. One session per file; nothing
//! is shared between sessions.

use crate::issue::{FixRecord, IssueCode, Severity, ValidationIssue};

/// Issues and fixes collected while validating one file
///
/// Issues are partitioned by severity on insertion, so each lives in exactly one of
/// the three sequences. Once pushed, an issue is never modified.
#[derive(Debug, Clone, Default)]
pub struct ValidationSession {
    errors: Vec<ValidationIssue>,
    warnings: Vec<ValidationIssue>,
    suggestions: Vec<ValidationIssue>,
    fixes_applied: Vec<FixRecord>,
}

impl ValidationSession {
    /// Create empty session
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an issue under its severity
    pub fn push(&mut self, issue: ValidationIssue) {
        match issue.severity() {
            Severity::Error => self.errors.push(issue),
            Severity::Warning => self.warnings.push(issue),
            Severity::Suggestion => self.suggestions.push(issue),
        }
    }

    /// Record an applied fix
    pub fn record_fix(&mut self, fix: FixRecord) {
        self.fixes_applied.push(fix);
    }

    /// Drop every error, returning how many were removed
    ///
    /// Warnings and suggestions stay.
    pub fn clear_errors(&mut self) -> usize {
        let removed = self.errors.len();
        self.errors.clear();
        removed
    }

    /// Errors, in order found
    #[inline]
    #[must_use]
    pub fn errors(&self) -> &[ValidationIssue] {
        &self.errors
    }

    /// Warnings, in order found
    #[inline]
    #[must_use]
    pub fn warnings(&self) -> &[ValidationIssue] {
        &self.warnings
    }

    /// Suggestions, in order found
    #[inline]
    #[must_use]
    pub fn suggestions(&self) -> &[ValidationIssue] {
        &self.suggestions
    }

    /// Fixes written to disk
    #[inline]
    #[must_use]
    pub fn fixes_applied(&self) -> &[FixRecord] {
        &self.fixes_applied
    }

    /// Whether any error carries `code`
    #[must_use]
    pub fn has_error(&self, code: IssueCode) -> bool {
        self.errors.iter().any(|e| e.code() == code)
    }

    /// All issues with `code`, regardless of severity
    #[must_use]
    pub fn issues_with(&self, code: IssueCode) -> Vec<&ValidationIssue> {
        self.errors
            .iter()
            .chain(&self.warnings)
            .chain(&self.suggestions)
            .filter(|i| i.code() == code)
            .collect()
    }

    /// Validation passes iff there are no errors
    #[inline]
    #[must_use]
    pub fn passed(&self) -> bool {
        self.errors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issues_are_partitioned_by_severity() {
        let mut session = ValidationSession::new();
        session.push(ValidationIssue::error(IssueCode::NoAppClass, "none"));
        session.push(ValidationIssue::warning(IssueCode::UnknownWidget, "odd"));
        session.push(ValidationIssue::suggestion(IssueCode::KeyHook, "bindings"));

        assert_eq!(session.errors().len(), 1);
        assert_eq!(session.warnings().len(), 1);
        assert_eq!(session.suggestions().len(), 1);
        assert!(!session.passed());
    }

    #[test]
    fn warnings_never_fail() {
        let mut session = ValidationSession::new();
        session.push(ValidationIssue::warning(IssueCode::DeepNesting, "deep"));
        session.push(ValidationIssue::suggestion(IssueCode::QueryCaching, "cache"));
        assert!(session.passed());
    }

    #[test]
    fn clear_errors_keeps_other_severities() {
        let mut session = ValidationSession::new();
        session.push(ValidationIssue::error(IssueCode::MissingAppImport, "import"));
        session.push(ValidationIssue::error(IssueCode::MissingCompose, "compose"));
        session.push(ValidationIssue::warning(IssueCode::DeepNesting, "deep"));

        assert_eq!(session.clear_errors(), 2);
        assert!(session.passed());
        assert_eq!(session.warnings().len(), 1);
    }
}
