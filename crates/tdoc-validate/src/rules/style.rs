//! Embedded stylesheet integrity
//!
//! Braces are balanced across the whole literal with a stack, so a block opened on
//! one line and closed on a later one is fine. Lines starting with `/*` are skipped.
//! Reported lines are source lines, not lines within the literal.

use tdoc_core::schema::{has_theme_variant, STYLE_ATTRIBUTES};
use tdoc_core::StringAssignment;

use super::{Rule, RuleContext};
use crate::error::RuleError;
use crate::issue::{IssueCode, ValidationIssue};
use crate::session::ValidationSession;

/// Checks `CSS` and `DEFAULT_CSS` string literals
#[derive(Debug, Clone, Copy, Default)]
pub struct StyleRule;

impl Rule for StyleRule {
    fn name(&self) -> &'static str {
        "style"
    }

    fn check(&self, ctx: &RuleContext<'_>, session: &mut ValidationSession) -> Result<(), RuleError> {
        let blocks = ctx.tree.string_assignments(STYLE_ATTRIBUTES);
        for block in &blocks {
            check_block(block, session);
        }
        tracing::debug!("validated {} style block(s)", blocks.len());
        Ok(())
    }
}

fn check_block(block: &StringAssignment, session: &mut ValidationSession) {
    let mut open: Vec<usize> = Vec::new();

    for (i, raw) in block.value.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with("/*") {
            continue;
        }
        let source_line = block.source_line(i + 1);

        for ch in line.chars() {
            match ch {
                '{' => open.push(source_line),
                '}' => {
                    if open.pop().is_none() {
                        session.push(
                            ValidationIssue::error(
                                IssueCode::StyleUnexpectedClose,
                                format!("Unexpected '}}' in CSS at line {source_line}"),
                            )
                            .at(source_line, block.target.clone()),
                        );
                    }
                }
                _ => {}
            }
        }

        if has_import(line) {
            session.push(
                ValidationIssue::error(
                    IssueCode::StyleImport,
                    format!("CSS import statement found at line {source_line} (not supported)"),
                )
                .at(source_line, block.target.clone()),
            );
        }
    }

    for line in open {
        session.push(
            ValidationIssue::error(
                IssueCode::StyleUnclosedBlock,
                format!("Unclosed CSS block starting at line {line}"),
            )
            .at(line, block.target.clone()),
        );
    }

    if !has_theme_variant(&block.value) {
        session.push(
            ValidationIssue::warning(
                IssueCode::StyleThemeVariant,
                "Consider defining 'quantum' or 'dark' theme variants",
            )
            .at(block.line, block.target.clone()),
        );
    }
}

/// Whether a line holds an `import`/`@import` token
fn has_import(line: &str) -> bool {
    line.split(|c: char| c.is_whitespace() || matches!(c, ';' | ',' | '(' | '{' | '}'))
        .any(|token| token.eq_ignore_ascii_case("import") || token.eq_ignore_ascii_case("@import"))
}
