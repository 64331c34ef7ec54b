//! Auto-fix engine
//!
//! Repairs exactly one class of error: a missing `App` import. The patched source is
//! written to a temporary file next to the original and renamed over it, so an
//! interrupted write never leaves a truncated module behind. Validation is not
//! repeated after a fix; the session tells the caller to re-run instead.

use std::fs;
use std::io::Write;
use std::path::Path;

use tdoc_core::schema::BASE_IMPORT;
use tdoc_core::syntax::line_of;
use tdoc_core::SourceTree;
use tempfile::NamedTempFile;
use tree_sitter::Node;

use crate::error::FixError;
use crate::issue::{FixRecord, IssueCode, ValidationIssue};
use crate::session::ValidationSession;

const APP_MODULE: &str = "textual.app";

/// Source rewrite produced by a repair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Patch {
    /// New module text
    pub source: String,
    /// What changed
    pub description: String,
}

/// Applies recoverable repairs to a source file
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoFixer;

impl AutoFixer {
    /// Create fixer
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Repair `path` if the session holds a fixable error
    ///
    /// On success the error set is cleared, a [`FixRecord`] is added and a warning asks
    /// for a re-run; errors the fix did not touch resurface on that run. On failure the file is untouched and
    /// an error issue describes why. Returns whether the file was rewritten.
    pub fn apply(&self, path: &Path, tree: &SourceTree, session: &mut ValidationSession) -> bool {
        if !session.has_error(IssueCode::MissingAppImport) {
            tracing::debug!("no fixable errors in {}", path.display());
            return false;
        }

        let patch = patch_missing_import(tree);
        match write_atomic(path, &patch.source) {
            Ok(()) => {
                let cleared = session.clear_errors();
                tracing::info!(
                    "{}: {}; cleared {} error(s) pending re-run",
                    path.display(),
                    patch.description,
                    cleared
                );
                session.record_fix(FixRecord::new(patch.description));
                session.push(ValidationIssue::warning(
                    IssueCode::FixApplied,
                    "Auto-fixes applied. Re-run validation.",
                ));
                true
            }
            Err(e) => {
                tracing::error!("auto-fix failed for {}: {}", path.display(), e);
                session.push(ValidationIssue::error(
                    IssueCode::FixFailed,
                    format!("Failed to apply fixes: {e}"),
                ));
                false
            }
        }
    }
}

/// Add `App` to the module's imports
///
/// Extends a plain single-line `from textual.app import …` statement at module level
/// when one exists; otherwise inserts [`BASE_IMPORT`] after the module preamble.
#[must_use]
pub fn patch_missing_import(tree: &SourceTree) -> Patch {
    if let Some(import) = extendable_app_import(tree) {
        let source = tree.source();
        let at = import.end_byte();
        return Patch {
            source: format!("{}, App{}", &source[..at], &source[at..]),
            description: format!(
                "Added App to existing import on line {}",
                line_of(import)
            ),
        };
    }

    let mut lines: Vec<String> = tree
        .source()
        .split_inclusive('\n')
        .map(str::to_string)
        .collect();
    let at = tree.preamble_end_line().min(lines.len());
    if let Some(prev) = at.checked_sub(1).and_then(|i| lines.get_mut(i)) {
        if !prev.ends_with('\n') {
            prev.push('\n');
        }
    }
    lines.insert(at, format!("{BASE_IMPORT}\n"));

    Patch {
        source: lines.concat(),
        description: format!("Inserted missing import: {BASE_IMPORT}"),
    }
}

/// First top-level `from textual.app import a, b` that can take one more name
fn extendable_app_import(tree: &SourceTree) -> Option<Node<'_>> {
    let root = tree.root();
    let mut cursor = root.walk();
    let found = root.named_children(&mut cursor).find(|node| {
        node.kind() == "import_from_statement"
            && node.start_position().row == node.end_position().row
            && node
                .child_by_field_name("module_name")
                .is_some_and(|m| tree.text(m) == APP_MODULE)
            && !tree.text(*node).contains(['(', '\\', '*'])
    });
    found
}

/// Replace `path` with `contents` via a sibling temporary file
///
/// # Errors
/// Returns [`FixError::Io`] when the original cannot be inspected or the temporary
/// file cannot be written or renamed.
pub fn write_atomic(path: &Path, contents: &str) -> Result<(), FixError> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let permissions = fs::metadata(path)
        .map_err(|e| FixError::io(path, e))?
        .permissions();

    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| FixError::io(path, e))?;
    tmp.write_all(contents.as_bytes())
        .map_err(|e| FixError::io(path, e))?;
    tmp.as_file().sync_all().map_err(|e| FixError::io(path, e))?;
    fs::set_permissions(tmp.path(), permissions).map_err(|e| FixError::io(path, e))?;
    tmp.persist(path).map_err(|e| FixError::io(path, e.error))?;

    Ok(())
}
