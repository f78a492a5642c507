use super::span::Span;
use thiserror::Error;

#[derive(Debug, PartialEq, Eq, Clone, Error)]
pub enum ParserErrorType {
    #[error("expected next token to be {expected}, got {got} instead")]
    ExpectedToken {
        expected: &'static str,
        got: &'static str,
    },
    #[error("no prefix parse function for {0} found")]
    NoPrefixParseFn(&'static str),
    #[error("illegal token {0}")]
    IllegalToken(String),
    #[error("could not parse {0} as integer")]
    InvalidInteger(String),
    #[error("expression nested too deeply")]
    NestingTooDeep,
}

impl ParserErrorType {
    /// Errors after which the rest of the input is not parsed.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ParserErrorType::NestingTooDeep)
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Error)]
#[error("{error}")]
pub struct ParserError {
    pub error: ParserErrorType,
    pub span: Span,
}

pub type ParserResult<T> = Result<T, ParserError>;

impl ParserError {
    pub fn new(error: ParserErrorType, span: Span) -> Self {
        ParserError { error, span }
    }

    /// Message prefixed with its location and followed by the offending
    /// source line.
    pub fn render(&self, source: &str) -> String {
        let start = self.span.start_pos;
        let line = self.span.line_text(source);
        let marker = " ".repeat(start.column_no.saturating_sub(1));

        format!(
            "[line {}] Error: {}\n    {}\n    {}^",
            start.line_no, self.error, line, marker
        )
    }
}
