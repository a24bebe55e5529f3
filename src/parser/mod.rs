pub mod default;

use thiserror::Error;

use crate::ast::ParsedLine;

pub trait Parser {
    /// `Ok(None)` for a line with nothing to run.
    fn parse(&mut self) -> Result<Option<ParsedLine>, ParseError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("syntax error: expected a filename after `{operator}`")]
    MissingOperand { operator: &'static str },
    #[error("syntax error: empty command in pipeline")]
    EmptyCommand,
}
