//! Directory scanning
//!
//! Files are collected sequentially, then validated on the rayon pool. Each file gets
//! its own session, so a file that fails to read or parse only affects its own
//! result.

use std::fmt;
use std::path::{Path, PathBuf};

use globset::{Glob, GlobMatcher};
use rayon::prelude::*;
use tdoc_core::report::heavy_rule;
use walkdir::{DirEntry, WalkDir};

use crate::error::ScanError;
use crate::validator::{FileValidation, Validator};

/// Marker for virtual environment paths to skip
const VENV_MARKER: &str = "venv";

/// File selection for a directory scan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanOptions {
    /// Glob matched against file names (or relative paths when it contains `/`)
    pub pattern: String,
    /// Descend into subdirectories
    pub recursive: bool,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            pattern: "*.py".to_string(),
            recursive: false,
        }
    }
}

impl ScanOptions {
    /// With file pattern
    #[must_use]
    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = pattern.into();
        self
    }

    /// With recursion
    #[must_use]
    pub fn with_recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }
}

/// Files under `dir` matching `options`, sorted
///
/// Any path containing `venv` is skipped: files and directories named so, and
/// everything when `dir` itself is such a path. Hidden directories are scanned.
///
/// # Errors
/// [`ScanError::NotFound`] when `dir` is not a directory, [`ScanError::Pattern`] when
/// the pattern does not compile.
pub fn collect_files(dir: &Path, options: &ScanOptions) -> Result<Vec<PathBuf>, ScanError> {
    if !dir.is_dir() {
        return Err(ScanError::NotFound(dir.to_path_buf()));
    }

    let matcher: GlobMatcher = Glob::new(&options.pattern)
        .map_err(|source| ScanError::Pattern {
            pattern: options.pattern.clone(),
            source,
        })?
        .compile_matcher();
    let match_path = options.pattern.contains('/');

    if dir.to_string_lossy().contains(VENV_MARKER) {
        tracing::debug!("{} is a virtual environment path, nothing to scan", dir.display());
        return Ok(Vec::new());
    }

    let walker = WalkDir::new(dir)
        .max_depth(if options.recursive { usize::MAX } else { 1 })
        .sort_by_file_name();

    let mut files = Vec::new();
    for entry in walker
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_venv(e))
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!("skipping unreadable entry: {}", e);
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }

        let matched = if match_path {
            entry
                .path()
                .strip_prefix(dir)
                .is_ok_and(|rel| matcher.is_match(rel))
        } else {
            matcher.is_match(entry.file_name())
        };
        if matched {
            files.push(entry.into_path());
        }
    }

    files.sort();
    tracing::debug!("found {} file(s) under {}", files.len(), dir.display());
    Ok(files)
}

/// Ancestors are already filtered, so the entry's own name decides
fn is_venv(entry: &DirEntry) -> bool {
    entry.file_name().to_string_lossy().contains(VENV_MARKER)
}

/// Validate every file in parallel, results in input order
#[must_use]
pub fn validate_all(validator: &Validator, files: &[PathBuf]) -> Vec<FileValidation> {
    files
        .par_iter()
        .map(|path| validator.validate_file(path))
        .collect()
}

/// Pass/fail totals for a directory run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanSummary {
    /// Files validated
    pub total: usize,
    /// Files without errors
    pub passed: usize,
    /// Files with errors
    pub failed: usize,
}

impl ScanSummary {
    /// Tally results
    #[must_use]
    pub fn from_results(results: &[FileValidation]) -> Self {
        let passed = results.iter().filter(|r| r.passed()).count();
        Self {
            total: results.len(),
            passed,
            failed: results.len() - passed,
        }
    }

    /// Percentage of files that passed; 0 for an empty run
    #[must_use]
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        #[allow(clippy::cast_precision_loss)]
        let rate = self.passed as f64 / self.total as f64 * 100.0;
        rate
    }

    /// Whether every file passed
    #[inline]
    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }
}

impl fmt::Display for ScanSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", heavy_rule())?;
        writeln!(f, "SUMMARY")?;
        writeln!(f, "{}", heavy_rule())?;
        writeln!(f, "Total files:   {}", self.total)?;
        writeln!(f, "Passed:        {}", self.passed)?;
        writeln!(f, "Failed:        {}", self.failed)?;
        writeln!(f, "Success rate:  {:.1}%", self.success_rate())?;
        writeln!(f, "{}", heavy_rule())
    }
}
