//! Event handler naming and arity

use tdoc_core::schema::{event_tag, HANDLER_PREFIX};
use tdoc_core::FunctionDef;

use super::{Rule, RuleContext};
use crate::error::RuleError;
use crate::issue::{IssueCode, ValidationIssue};
use crate::session::ValidationSession;

/// Checks methods named `on_…`
#[derive(Debug, Clone, Copy, Default)]
pub struct HandlerRule;

impl Rule for HandlerRule {
    fn name(&self) -> &'static str {
        "handlers"
    }

    fn check(&self, ctx: &RuleContext<'_>, session: &mut ValidationSession) -> Result<(), RuleError> {
        let handlers: Vec<FunctionDef<'_>> = ctx
            .tree
            .functions()
            .into_iter()
            .filter(|f| f.name.starts_with(HANDLER_PREFIX))
            .collect();

        for handler in &handlers {
            let symbol = match &handler.class {
                Some(class) => format!("{class}.{}", handler.name),
                None => handler.name.clone(),
            };

            if let Some(tag) = event_tag(&handler.name) {
                if !ctx.schema.is_known_event(tag) {
                    session.push(
                        ValidationIssue::warning(
                            IssueCode::UnknownEventTag,
                            format!("Unknown event type '{tag}' in handler '{}'", handler.name),
                        )
                        .at(handler.line, symbol.clone()),
                    );
                }
            }

            if handler.explicit_params().is_empty() {
                session.push(
                    ValidationIssue::warning(
                        IssueCode::HandlerArity,
                        format!("Event handler '{}' should have event parameter", handler.name),
                    )
                    .at(handler.line, symbol),
                );
            }
        }

        tracing::debug!("validated {} event handler(s)", handlers.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tdoc_core::{Schema, SourceTree};

    fn run(source: &str) -> ValidationSession {
        let tree = SourceTree::parse(source).unwrap();
        let mut session = ValidationSession::new();
        HandlerRule
            .check(&RuleContext::new(&tree, Schema::textual()), &mut session)
            .unwrap();
        session
    }

    #[test]
    fn known_tag_with_event_is_clean() {
        let session = run("class A(App):\n    def on_button_pressed(self, event):\n        pass\n");
        assert!(session.warnings().is_empty());
    }

    #[test]
    fn unknown_tag_warns() {
        let session = run("class A(App):\n    def on_frobnicate_now(self, event):\n        pass\n");
        let unknown = session.issues_with(IssueCode::UnknownEventTag);
        assert_eq!(unknown.len(), 1);
        assert_eq!(
            unknown[0].message(),
            "Unknown event type 'frobnicate' in handler 'on_frobnicate_now'"
        );
        assert!(session.passed());
    }

    #[test]
    fn missing_event_parameter_warns() {
        let session = run("class A(App):\n    async def on_input_changed(self):\n        pass\n");
        let arity = session.issues_with(IssueCode::HandlerArity);
        assert_eq!(arity.len(), 1);
        assert_eq!(arity[0].line(), Some(2));
    }

    #[test]
    fn tag_case_is_ignored() {
        let session = run("class A(App):\n    def on_Button_pressed(self, event):\n        pass\n");
        assert!(session.issues_with(IssueCode::UnknownEventTag).is_empty());
    }
}
