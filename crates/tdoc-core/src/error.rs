//! Error types for source parsing

/// Malformed Python source.
///
/// Carries the 1-based position of the first error or missing node reported by the
/// parser, so a report can point at it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message} (line {line}, column {column})")]
pub struct SyntaxError {
    /// 1-based line of the first malformed construct
    pub line: usize,
    /// 1-based column of the first malformed construct
    pub column: usize,
    /// Parser message
    pub message: String,
}

impl SyntaxError {
    /// Create syntax error at position
    pub fn new(line: usize, column: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            column,
            message: message.into(),
        }
    }
}

/// Errors while turning source text into a [`SourceTree`](crate::SourceTree)
#[derive(Debug, Clone, thiserror::Error)]
pub enum ParseError {
    /// Grammar could not be loaded into the parser
    #[error("parser initialization failed: {0}")]
    ParserInit(String),

    /// Parser gave up without producing a tree
    #[error("parse failed")]
    ParseFailed,

    /// Source parsed, but contains malformed constructs
    #[error("{0}")]
    Syntax(#[from] SyntaxError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn syntax_error_display() {
        let err = SyntaxError::new(3, 7, "invalid syntax");
        assert_eq!(err.to_string(), "invalid syntax (line 3, column 7)");
    }

    #[test]
    fn parse_error_wraps_syntax_error() {
        let err: ParseError = SyntaxError::new(1, 1, "expected ':'").into();
        assert!(matches!(err, ParseError::Syntax(_)));
        assert_eq!(err.to_string(), "expected ':' (line 1, column 1)");
    }
}
