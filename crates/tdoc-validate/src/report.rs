//! Static validation report

use std::fmt::Write;

use tdoc_core::report::{push_banner, push_numbered};
use tdoc_core::schema::PERFORMANCE_TIPS;

use crate::session::ValidationSession;

/// Tips shown under a report that carries suggestions
const TIPS_SHOWN: usize = 5;

/// Text report for one validated file
#[derive(Debug, Clone, Copy)]
pub struct StaticReport<'a> {
    name: &'a str,
    session: &'a ValidationSession,
}

impl<'a> StaticReport<'a> {
    /// Create report for the file displayed as `name`
    #[inline]
    #[must_use]
    pub fn new(name: &'a str, session: &'a ValidationSession) -> Self {
        Self { name, session }
    }

    /// Render the report
    ///
    /// Sections appear only when non-empty: errors, warnings, suggestions, fixes
    /// applied. The verdict line always appears; performance tips follow when there
    /// are suggestions.
    #[must_use]
    pub fn generate_text(&self) -> String {
        let mut out = String::new();
        out.push('\n');
        push_banner(&mut out, &format!("VALIDATION REPORT: {}", self.name));

        push_numbered(&mut out, "ERRORS", self.session.errors());
        push_numbered(&mut out, "WARNINGS", self.session.warnings());
        push_numbered(&mut out, "SUGGESTIONS", self.session.suggestions());
        push_numbered(&mut out, "FIXES APPLIED", self.session.fixes_applied());

        out.push('\n');
        if self.session.passed() {
            out.push_str("VALIDATION PASSED\n");
        } else {
            let _ = writeln!(
                out,
                "VALIDATION FAILED ({} error(s))",
                self.session.errors().len()
            );
        }

        if !self.session.suggestions().is_empty() {
            out.push_str("\nPERFORMANCE TIPS:\n");
            for tip in PERFORMANCE_TIPS.iter().take(TIPS_SHOWN) {
                let _ = writeln!(out, "  • {tip}");
            }
        }

        out
    }
}
