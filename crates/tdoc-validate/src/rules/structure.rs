//! Application class structure
//!
//! The base class and annotation checks compare names as written. An aliased base
//! (`from textual.app import App as Base`) is not followed.

use tdoc_core::schema::{APP_BASE, COMPOSE_METHOD, COMPOSE_RESULT, KEY_HOOK};
use tdoc_core::ClassDef;

use super::imports::compose_result_aliases;
use super::{Rule, RuleContext};
use crate::error::RuleError;
use crate::issue::{IssueCode, ValidationIssue};
use crate::session::ValidationSession;

/// Requires an application class with a composition method
#[derive(Debug, Clone, Copy, Default)]
pub struct StructureRule;

impl Rule for StructureRule {
    fn name(&self) -> &'static str {
        "structure"
    }

    fn check(&self, ctx: &RuleContext<'_>, session: &mut ValidationSession) -> Result<(), RuleError> {
        let app_classes: Vec<ClassDef<'_>> = ctx
            .tree
            .classes()
            .into_iter()
            .filter(|c| c.inherits_from(APP_BASE))
            .collect();

        if app_classes.is_empty() {
            session.push(ValidationIssue::error(
                IssueCode::NoAppClass,
                "No application class found: no class inherits from App",
            ));
            return Ok(());
        }

        let aliases = compose_result_aliases(&ctx.tree.imports());
        for class in &app_classes {
            check_app_class(class, &aliases, session);
        }

        tracing::debug!("validated {} App class(es)", app_classes.len());
        Ok(())
    }
}

fn check_app_class(class: &ClassDef<'_>, aliases: &[String], session: &mut ValidationSession) {
    let methods = class.methods();

    match methods.iter().find(|m| m.name == COMPOSE_METHOD) {
        None => session.push(
            ValidationIssue::error(
                IssueCode::MissingCompose,
                format!("App class {} is missing 'compose' method", class.name),
            )
            .at(class.line, class.name.clone()),
        ),
        Some(compose) => match compose.returns.as_deref() {
            None => {
                let symbol = format!("{}.compose", class.name);
                session.push(
                    ValidationIssue::warning(
                        IssueCode::ComposeAnnotation,
                        format!(
                            "Method 'compose' in {} should have return type hint (ComposeResult)",
                            class.name
                        ),
                    )
                    .at(compose.line, symbol.clone()),
                );
                session.push(
                    ValidationIssue::suggestion(
                        IssueCode::ComposeAnnotation,
                        "Add return type hint to compose method",
                    )
                    .at(compose.line, symbol),
                );
            }
            Some(annotation) if !annotation_matches(annotation, aliases) => session.push(
                ValidationIssue::warning(
                    IssueCode::ComposeAnnotation,
                    format!(
                        "Method 'compose' in {} should return ComposeResult, not '{annotation}'",
                        class.name
                    ),
                )
                .at(compose.line, format!("{}.compose", class.name)),
            ),
            Some(_) => {}
        },
    }

    if let Some(hook) = methods.iter().find(|m| m.name == KEY_HOOK) {
        session.push(
            ValidationIssue::suggestion(
                IssueCode::KeyHook,
                format!("Consider using BINDINGS instead of on_key in {}", class.name),
            )
            .at(hook.line, format!("{}.{KEY_HOOK}", class.name)),
        );
    }

    tracing::debug!("validated methods for {}", class.name);
}

/// Syntactic check of a return annotation against `ComposeResult`
fn annotation_matches(annotation: &str, aliases: &[String]) -> bool {
    let name = annotation.trim().trim_matches(|c| c == '"' || c == '\'');
    let last = name.rsplit('.').next().unwrap_or(name);
    last == COMPOSE_RESULT || aliases.iter().any(|a| a == name)
}
