use thiserror::Error;

/// Errors produced while splitting a filter string into tokens.
///
/// Every variant carries the byte offset into the filter string where the
/// problem starts, so callers can point at the offending spot.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LexError {
    #[error("Unterminated quoted string starting at position {position}")]
    UnterminatedQuote { position: usize },

    #[error("Empty value after '{prefix}:' at position {position}")]
    EmptyTerm { prefix: String, position: usize },

    #[error("Malformed number '{text}' at position {position}")]
    MalformedNumber { text: String, position: usize },

    #[error(
        "Malformed comparison operator '{text}' at position {position}. \
         Valid operators are: =, ==, !=, <, >, <=, >="
    )]
    MalformedComparator { text: String, position: usize },
}

impl LexError {
    /// Byte offset into the filter string where the error starts.
    pub fn position(&self) -> usize {
        match self {
            LexError::UnterminatedQuote { position }
            | LexError::EmptyTerm { position, .. }
            | LexError::MalformedNumber { position, .. }
            | LexError::MalformedComparator { position, .. } => *position,
        }
    }
}

/// Errors produced while building an expression tree from the token stream.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("Unbalanced parentheses at position {position}")]
    UnbalancedParens { position: usize },

    #[error("Empty filter expression")]
    EmptyExpression,

    #[error(
        "Unknown filter prefix '{prefix}' at position {position}. \
         Valid prefixes are: tag, caption, name, path, marking, crops, \
         visible, size, tags, chars, tokens, stars, width, height, area"
    )]
    UnknownPrefix { prefix: String, position: usize },

    #[error("'{prefix}:' requires a comparison like '{prefix}:>=10' at position {position}")]
    MissingComparator { prefix: String, position: usize },

    #[error(
        "'size:' requires two integer dimensions like 'size:512:512', got '{value}' at position {position}"
    )]
    InvalidSize { value: String, position: usize },

    #[error("Missing AND/OR between filter terms at position {position}")]
    MissingOperator { position: usize },

    #[error("Unexpected trailing input at position {position}")]
    TrailingTokens { position: usize },

    #[error("Expected a filter term at position {position}")]
    ExpectedPredicate { position: usize },

    #[error("Filter expression is nested too deeply (position {position})")]
    TooDeep { position: usize },
}

impl ParseError {
    /// Byte offset into the filter string where the error starts.
    pub fn position(&self) -> usize {
        match self {
            ParseError::EmptyExpression => 0,
            ParseError::UnbalancedParens { position }
            | ParseError::UnknownPrefix { position, .. }
            | ParseError::MissingComparator { position, .. }
            | ParseError::InvalidSize { position, .. }
            | ParseError::MissingOperator { position }
            | ParseError::TrailingTokens { position }
            | ParseError::ExpectedPredicate { position }
            | ParseError::TooDeep { position } => *position,
        }
    }
}

/// Any error that can abort compilation of a filter string.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FilterError {
    #[error(transparent)]
    Lex(#[from] LexError),

    #[error(transparent)]
    Parse(#[from] ParseError),
}

impl FilterError {
    /// Byte offset into the filter string where the error starts.
    pub fn position(&self) -> usize {
        match self {
            FilterError::Lex(e) => e.position(),
            FilterError::Parse(e) => e.position(),
        }
    }
}
