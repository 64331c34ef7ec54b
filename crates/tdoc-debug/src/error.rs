//! Error types for the debugger
//!
//! Runtime failures of the debugged application are data, not errors: they end up in
//! the session and the report. The types here cover the debugger's own failures.

use std::path::PathBuf;

use crate::debugger::SessionState;

/// Failure reading one node of a widget graph
#[derive(Debug, Clone, thiserror::Error)]
pub enum InspectError {
    /// Attribute could not be read
    #[error("cannot read {attribute} of {widget}: {reason}")]
    Attribute {
        /// Widget type name
        widget: String,
        /// Attribute name
        attribute: &'static str,
        /// Why
        reason: String,
    },

    /// Child sequence could not be read
    #[error("children of {widget} unavailable: {reason}")]
    Children {
        /// Widget type name
        widget: String,
        /// Why
        reason: String,
    },
}

/// Failure summarising a profile
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProfileError {
    /// Exit record with no matching entry
    #[error("exit from '{found}' does not match open call '{expected}'")]
    Unbalanced {
        /// Innermost open call, `<none>` when nothing was open
        expected: String,
        /// Function the exit named
        found: String,
    },

    /// Profiling needs a running application
    #[error("profiling requires a live run (--live)")]
    NotLive,
}

/// How one run of the debugged application ended abnormally
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RunError {
    /// User interrupt; the normal way to end a session
    #[error("interrupted by user")]
    Interrupted,

    /// Uncaught failure inside the application
    #[error("{message}")]
    Failed {
        /// `Type: detail` summary
        message: String,
        /// Full trace as reported by the host
        trace: String,
    },
}

impl RunError {
    /// Create failure
    pub fn failed(message: impl Into<String>, trace: impl Into<String>) -> Self {
        Self::Failed {
            message: message.into(),
            trace: trace.into(),
        }
    }
}

/// Debugger driven out of order
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum StateError {
    /// Transition not in the session state machine
    #[error("illegal session transition: {from:?} -> {to:?}")]
    IllegalTransition {
        /// Current state
        from: SessionState,
        /// Requested state
        to: SessionState,
    },
}

/// Failure loading a source for static analysis
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    /// File could not be read
    #[error("cannot read {path}: {source}")]
    Io {
        /// Source file
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// File does not parse
    #[error("cannot parse {path}: {source}")]
    Parse {
        /// Source file
        path: PathBuf,
        /// Parse failure
        #[source]
        source: tdoc_core::ParseError,
    },
}

/// Failure writing a report
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    /// Destination not writable
    #[error("cannot write report to {path}: {source}")]
    Io {
        /// Destination
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },
}

impl ReportError {
    /// Create IO error for path
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
