//! Error types for validation
//!
//! None of these reach the user as a crash: rule errors are logged and skipped,
//! fix errors become an error issue, scan errors end the directory run.

use std::path::PathBuf;

/// Failure inside a single rule pass
///
/// The built-in passes only see trees that parsed cleanly and never fail; this is
/// the exit for passes registered by callers.
#[derive(Debug, thiserror::Error)]
pub enum RuleError {
    /// The pass gave up on this module
    #[error("{rule} gave up at line {line}: {reason}")]
    Abandoned {
        /// Pass name
        rule: &'static str,
        /// 1-based line
        line: usize,
        /// What went wrong
        reason: String,
    },
}

/// Failure while repairing a file
#[derive(Debug, thiserror::Error)]
pub enum FixError {
    /// Reading or replacing the file failed
    #[error("io error on {path}: {source}")]
    Io {
        /// File being repaired
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },
}

impl FixError {
    /// Create IO error for path
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Failure while collecting files for a directory scan
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    /// Directory does not exist
    #[error("directory not found: {0}")]
    NotFound(PathBuf),

    /// File pattern is not a valid glob
    #[error("invalid file pattern '{pattern}': {source}")]
    Pattern {
        /// Pattern as given
        pattern: String,
        /// Parse failure
        #[source]
        source: globset::Error,
    },
}
