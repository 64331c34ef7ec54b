//! Widget identifiers and nesting inside composition methods

use tdoc_core::compose::{compositions, Composition};
use tdoc_core::schema::{MAX_NESTING_DEPTH, MIN_COMPOSE_YIELDS};
use tdoc_core::Schema;

use super::{Rule, RuleContext};
use crate::error::RuleError;
use crate::issue::{IssueCode, ValidationIssue};
use crate::session::ValidationSession;

/// Checks the widgets every `compose` method declares
///
/// - deprecated identifiers are errors
/// - identifiers outside the schema are warnings, one per occurrence
/// - nesting deeper than [`MAX_NESTING_DEPTH`] warns once per method
/// - fewer than [`MIN_COMPOSE_YIELDS`] yields warns
#[derive(Debug, Clone, Copy, Default)]
pub struct WidgetRule;

impl Rule for WidgetRule {
    fn name(&self) -> &'static str {
        "widgets"
    }

    fn check(&self, ctx: &RuleContext<'_>, session: &mut ValidationSession) -> Result<(), RuleError> {
        let comps = compositions(ctx.tree);
        for comp in &comps {
            check_yields(comp, session);
            check_identifiers(comp, ctx.schema, session);
            check_depth(comp, session);
        }
        tracing::debug!("checked {} compose method(s)", comps.len());
        Ok(())
    }
}

fn symbol(comp: &Composition<'_>) -> String {
    format!("{}.compose", comp.owner())
}

fn check_yields(comp: &Composition<'_>, session: &mut ValidationSession) {
    let message = match comp.yield_count {
        0 => "No yield statements found in compose method",
        n if n < MIN_COMPOSE_YIELDS => "compose method should yield at least Header and Footer",
        _ => return,
    };
    session.push(
        ValidationIssue::warning(IssueCode::ComposeYields, message).at(comp.method.line, symbol(comp)),
    );
}

fn check_identifiers(comp: &Composition<'_>, schema: &Schema, session: &mut ValidationSession) {
    for widget in &comp.widgets {
        let name = widget.widget_type();
        if let Some(replacement) = schema.replacement_for(name) {
            session.push(
                ValidationIssue::error(
                    IssueCode::DeprecatedWidget,
                    format!("Deprecated widget '{name}' found. Use '{replacement}' instead"),
                )
                .at(widget.call.line, symbol(comp)),
            );
        } else if !schema.is_known(name) {
            session.push(
                ValidationIssue::warning(
                    IssueCode::UnknownWidget,
                    format!("Unknown widget or container: {name}"),
                )
                .at(widget.call.line, symbol(comp)),
            );
        }
    }
}

fn check_depth(comp: &Composition<'_>, session: &mut ValidationSession) {
    let Some(deepest) = comp.widgets.iter().max_by_key(|w| w.depth) else {
        return;
    };
    if deepest.depth > MAX_NESTING_DEPTH {
        session.push(
            ValidationIssue::warning(
                IssueCode::DeepNesting,
                format!(
                    "Deep widget nesting detected in {} (depth {}). Consider flattening the layout",
                    comp.owner(),
                    deepest.depth
                ),
            )
            .at(deepest.call.line, symbol(comp)),
        );
    }
}
