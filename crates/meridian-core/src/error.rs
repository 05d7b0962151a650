pub type Result<T> = std::result::Result<T, ParseError>;

/// Surfaced to the caller: either the source itself is malformed or the resulting graph
/// would violate one of the semantic-graph invariants (see [`crate::graph`]).
#[derive(Debug, thiserror::Error)]
#[error("line {line}: {reason}")]
pub struct ParseError {
    pub line: usize,
    pub reason: String,
}

impl ParseError {
    pub fn new(line: usize, reason: impl Into<String>) -> Self {
        Self {
            line,
            reason: reason.into(),
        }
    }
}
