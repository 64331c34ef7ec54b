//! File validation entry point

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tdoc_core::{ParseError, Schema, SourceTree};

use crate::fix::AutoFixer;
use crate::issue::{IssueCode, ValidationIssue};
use crate::report::StaticReport;
use crate::rules::{default_rules, RuleContext, RuleSet};
use crate::session::ValidationSession;

/// Validation behaviour
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValidateOptions {
    /// Repair fixable errors in place
    pub fix: bool,
    /// Log per-pass progress at info level
    pub verbose: bool,
}

impl ValidateOptions {
    /// With auto-fix
    #[must_use]
    pub fn with_fix(mut self, fix: bool) -> Self {
        self.fix = fix;
        self
    }

    /// With verbose progress
    #[must_use]
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }
}

/// Outcome of validating one file
#[derive(Debug, Clone)]
pub struct FileValidation {
    /// File as given
    pub path: PathBuf,
    /// Collected issues
    pub session: ValidationSession,
}

impl FileValidation {
    /// Whether the file has no errors
    #[inline]
    #[must_use]
    pub fn passed(&self) -> bool {
        self.session.passed()
    }

    /// Render the static report
    #[must_use]
    pub fn report(&self) -> String {
        let name = self.path.display().to_string();
        StaticReport::new(&name, &self.session).generate_text()
    }
}

/// Runs the rule passes over source files
///
/// Holds no per-file state; one validator can be shared across threads.
#[derive(Debug)]
pub struct Validator {
    options: ValidateOptions,
    rules: RuleSet,
    schema: &'static Schema,
    fixer: AutoFixer,
}

impl Default for Validator {
    fn default() -> Self {
        Self::new(ValidateOptions::default())
    }
}

impl Validator {
    /// Create validator with the default passes
    #[must_use]
    pub fn new(options: ValidateOptions) -> Self {
        Self {
            options,
            rules: default_rules(),
            schema: Schema::textual(),
            fixer: AutoFixer::new(),
        }
    }

    /// With a custom pass list
    #[must_use]
    pub fn with_rules(mut self, rules: RuleSet) -> Self {
        self.rules = rules;
        self
    }

    /// Options in effect
    #[inline]
    #[must_use]
    pub fn options(&self) -> ValidateOptions {
        self.options
    }

    /// Validate a file, repairing it when enabled
    ///
    /// Read and parse failures become error issues; this never fails outright.
    pub fn validate_file(&self, path: &Path) -> FileValidation {
        if self.options.verbose {
            tracing::info!("validating {}", path.display());
        }

        let mut session = ValidationSession::new();
        let source = match fs::read_to_string(path) {
            Ok(source) => source,
            Err(e) => {
                let issue = if e.kind() == ErrorKind::NotFound {
                    ValidationIssue::error(
                        IssueCode::FileNotFound,
                        format!("File not found: {}", path.display()),
                    )
                } else {
                    ValidationIssue::error(
                        IssueCode::Io,
                        format!("Failed to read {}: {e}", path.display()),
                    )
                };
                session.push(issue);
                return FileValidation {
                    path: path.to_path_buf(),
                    session,
                };
            }
        };

        if let Some(tree) = self.check(source, &mut session) {
            if self.options.fix && !session.passed() {
                self.fixer.apply(path, &tree, &mut session);
            }
        }

        tracing::debug!(
            "{}: {} error(s), {} warning(s), {} suggestion(s)",
            path.display(),
            session.errors().len(),
            session.warnings().len(),
            session.suggestions().len()
        );

        FileValidation {
            path: path.to_path_buf(),
            session,
        }
    }

    /// Validate source text without touching the filesystem
    #[must_use]
    pub fn validate_source(&self, source: &str) -> ValidationSession {
        let mut session = ValidationSession::new();
        self.check(source.to_string(), &mut session);
        session
    }

    /// Parse and run every pass; `None` when the source does not parse
    fn check(&self, source: String, session: &mut ValidationSession) -> Option<SourceTree> {
        let tree = match SourceTree::parse(source) {
            Ok(tree) => tree,
            Err(ParseError::Syntax(e)) => {
                session.push(
                    ValidationIssue::error(IssueCode::Syntax, format!("Syntax error: {}", e.message))
                        .at_line(e.line),
                );
                return None;
            }
            Err(e) => {
                session.push(ValidationIssue::error(
                    IssueCode::Syntax,
                    format!("Syntax error: {e}"),
                ));
                return None;
            }
        };

        let ctx = RuleContext::new(&tree, self.schema);
        self.rules.run(&ctx, session);

        if self.options.verbose {
            tracing::info!(
                "ran {} pass(es): {} error(s), {} warning(s)",
                self.rules.names().len(),
                session.errors().len(),
                session.warnings().len()
            );
        }
        Some(tree)
    }
}
