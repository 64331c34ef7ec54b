//! DOM query habits

use tdoc_core::schema::QUERY_ONE_THRESHOLD;
use tdoc_core::CallSite;

use super::{Rule, RuleContext};
use crate::error::RuleError;
use crate::issue::{IssueCode, ValidationIssue};
use crate::session::ValidationSession;

const QUERY_ONE: &str = "query_one";

/// Flags repeated `query_one` lookups
///
/// One suggestion when the application queries itself, plus a warning once the
/// module holds more than [`QUERY_ONE_THRESHOLD`] lookups.
#[derive(Debug, Clone, Copy, Default)]
pub struct PracticesRule;

impl Rule for PracticesRule {
    fn name(&self) -> &'static str {
        "practices"
    }

    fn check(&self, ctx: &RuleContext<'_>, session: &mut ValidationSession) -> Result<(), RuleError> {
        let source = ctx.tree.source();
        let queries: Vec<CallSite<'_>> = ctx
            .tree
            .walk()
            .filter_map(|n| CallSite::from_node(n, source))
            .filter(|c| c.callee == QUERY_ONE && c.receiver().is_some())
            .collect();

        if let Some(first) = queries.iter().find(|c| c.receiver() == Some("self")) {
            session.push(
                ValidationIssue::suggestion(
                    IssueCode::QueryCaching,
                    "Consider caching query_one results to avoid repeated DOM queries",
                )
                .at_line(first.line),
            );
        }

        if queries.len() > QUERY_ONE_THRESHOLD {
            session.push(ValidationIssue::warning(
                IssueCode::QueryCaching,
                format!("Found {} query_one calls. Consider caching results.", queries.len()),
            ));
        }

        tracing::debug!("found {} query_one call(s)", queries.len());
        Ok(())
    }
}
