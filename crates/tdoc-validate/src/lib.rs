//! tdoc validation
//!
//! Static checks for Textual applications. A [`Validator`] parses a source file,
//! runs the default [`RuleSet`] against it, optionally hands recoverable errors to the
//! [`AutoFixer`], and leaves the outcome in a [`ValidationSession`].
//!
//! # Architecture
//!
//! ```text
//! file → SourceTree → RuleSet (imports, structure, widgets, style, handlers, practices)
//!                          ↓
//!                  ValidationSession ── errors / warnings / suggestions
//!                          ↓ (--fix)
//!                      AutoFixer ── fixes applied
//!                          ↓
//!                     StaticReport
//! ```
//!
//! Every file gets its own session, so directory scans validate in parallel
//! ([`scan::validate_all`]).

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod error;
pub mod fix;
pub mod issue;
pub mod report;
pub mod rules;
pub mod scan;
pub mod session;
pub mod validator;

pub use error::{FixError, RuleError, ScanError};
pub use fix::AutoFixer;
pub use issue::{FixRecord, IssueCode, Locator, Severity, ValidationIssue};
pub use report::StaticReport;
pub use rules::{default_rules, Rule, RuleContext, RuleSet};
pub use scan::{ScanOptions, ScanSummary};
pub use session::ValidationSession;
pub use validator::{FileValidation, ValidateOptions, Validator};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
