//! Framework import checks

use tdoc_core::schema::{APP_BASE, COMPOSE_RESULT, FRAMEWORK_MODULE};
use tdoc_core::ImportedName;

use super::{Rule, RuleContext};
use crate::error::RuleError;
use crate::issue::{IssueCode, ValidationIssue};
use crate::session::ValidationSession;

/// Requires `App` and recommends `ComposeResult` from the framework
#[derive(Debug, Clone, Copy, Default)]
pub struct ImportRule;

impl Rule for ImportRule {
    fn name(&self) -> &'static str {
        "imports"
    }

    fn check(&self, ctx: &RuleContext<'_>, session: &mut ValidationSession) -> Result<(), RuleError> {
        let imports = ctx.tree.imports();

        if !provides(&imports, APP_BASE) && !imports.iter().any(|i| i.name == "app" && from_framework(i)) {
            session.push(ValidationIssue::error(
                IssueCode::MissingAppImport,
                "Missing required import: from textual.app import App",
            ));
        }

        if !provides(&imports, COMPOSE_RESULT) {
            session.push(ValidationIssue::warning(
                IssueCode::MissingComposeResultImport,
                "Consider importing ComposeResult for type hints",
            ));
        }

        tracing::debug!("validated {} import(s)", imports.len());
        Ok(())
    }
}

/// Whether `name` is reachable through the framework imports
///
/// A plain `import textual…` counts, since the name is then usable qualified.
fn provides(imports: &[ImportedName], name: &str) -> bool {
    imports.iter().any(|i| {
        if i.module.is_none() {
            return i.name == FRAMEWORK_MODULE || i.name.starts_with("textual.");
        }
        from_framework(i) && (i.name == name || i.name == "*")
    })
}

fn from_framework(import: &ImportedName) -> bool {
    import
        .module
        .as_deref()
        .is_some_and(|m| m.split('.').any(|segment| segment == FRAMEWORK_MODULE))
}

/// Names under which `ComposeResult` is bound in the module
pub(crate) fn compose_result_aliases(imports: &[ImportedName]) -> Vec<String> {
    imports
        .iter()
        .filter(|i| from_framework(i) && i.name == COMPOSE_RESULT)
        .map(|i| i.bound_name().to_string())
        .collect()
}
