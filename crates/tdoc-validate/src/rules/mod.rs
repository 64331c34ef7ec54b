//! Rule passes
//!
//! Each pass walks the parsed module for one concern and appends issues to the
//! session:
//! - imports: framework imports the application needs
//! - structure: application class, composition method, key hook
//! - widgets: widget identifiers and nesting depth inside composition methods
//! - style: embedded stylesheet integrity
//! - handlers: event handler naming and arity
//! - practices: DOM query caching

use tdoc_core::{Schema, SourceTree};

use crate::error::RuleError;
use crate::session::ValidationSession;

mod handlers;
mod imports;
mod practices;
mod structure;
mod style;
mod widgets;

pub use handlers::HandlerRule;
pub use imports::ImportRule;
pub use practices::PracticesRule;
pub use structure::StructureRule;
pub use style::StyleRule;
pub use widgets::WidgetRule;

/// Inputs shared by all passes over one file
#[derive(Debug, Clone, Copy)]
pub struct RuleContext<'a> {
    /// Parsed module
    pub tree: &'a SourceTree,
    /// Framework schema
    pub schema: &'a Schema,
}

impl<'a> RuleContext<'a> {
    /// Create context
    #[inline]
    #[must_use]
    pub fn new(tree: &'a SourceTree, schema: &'a Schema) -> Self {
        Self { tree, schema }
    }
}

/// A single validation pass
///
/// Implementations must not keep state between calls; the same rule instance
/// validates many files, possibly on several threads.
pub trait Rule: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Check the module, appending issues to `session`
    ///
    /// # Errors
    /// Returns [`RuleError`] when the pass cannot continue; issues pushed before the
    /// failure are kept.
    fn check(&self, ctx: &RuleContext<'_>, session: &mut ValidationSession) -> Result<(), RuleError>;
}

/// Ordered collection of passes
pub struct RuleSet {
    rules: Vec<Box<dyn Rule>>,
}

impl Default for RuleSet {
    fn default() -> Self {
        default_rules()
    }
}

impl std::fmt::Debug for RuleSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleSet")
            .field("rules", &self.names())
            .finish()
    }
}

impl RuleSet {
    /// Create empty set
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    /// Append a pass
    pub fn register<R: Rule + 'static>(&mut self, rule: R) {
        self.rules.push(Box::new(rule));
    }

    /// Names of registered passes, in run order
    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    /// Run every pass
    ///
    /// A failing pass is logged and skipped; the others still run.
    pub fn run(&self, ctx: &RuleContext<'_>, session: &mut ValidationSession) {
        for rule in &self.rules {
            if let Err(e) = rule.check(ctx, session) {
                tracing::warn!("rule '{}' stopped early: {}", rule.name(), e);
            }
        }
    }
}

/// The standard passes, in report order
#[must_use]
pub fn default_rules() -> RuleSet {
    let mut set = RuleSet::new();
    set.register(ImportRule);
    set.register(StructureRule);
    set.register(WidgetRule);
    set.register(HandlerRule);
    set.register(StyleRule);
    set.register(PracticesRule);
    set
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingRule;

    impl Rule for FailingRule {
        fn name(&self) -> &'static str {
            "failing"
        }

        fn check(&self, _ctx: &RuleContext<'_>, session: &mut ValidationSession) -> Result<(), RuleError> {
            session.push(crate::issue::ValidationIssue::warning(
                crate::issue::IssueCode::KeyHook,
                "before failing",
            ));
            Err(RuleError::Abandoned {
                rule: "failing",
                line: 1,
                reason: "always".to_string(),
            })
        }
    }

    struct CountingRule;

    impl Rule for CountingRule {
        fn name(&self) -> &'static str {
            "counting"
        }

        fn check(&self, _ctx: &RuleContext<'_>, session: &mut ValidationSession) -> Result<(), RuleError> {
            session.push(crate::issue::ValidationIssue::suggestion(
                crate::issue::IssueCode::KeyHook,
                "ran",
            ));
            Ok(())
        }
    }

    #[test]
    fn failing_pass_does_not_stop_others() {
        let tree = SourceTree::parse("x = 1\n").unwrap();
        let ctx = RuleContext::new(&tree, Schema::textual());

        let mut set = RuleSet::new();
        set.register(FailingRule);
        set.register(CountingRule);

        let mut session = ValidationSession::new();
        set.run(&ctx, &mut session);
        assert_eq!(session.warnings().len(), 1);
        assert_eq!(session.suggestions().len(), 1);
    }

    #[test]
    fn default_rule_order() {
        assert_eq!(
            default_rules().names(),
            vec!["imports", "structure", "widgets", "handlers", "style", "practices"]
        );
    }
}
