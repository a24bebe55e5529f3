use std::path::PathBuf;

use crate::ast::{Command, OutputMode, OutputRedirect, ParsedLine, Pipeline};
use crate::lexer::{Lexer, Operator};
use crate::parser::{ParseError, Parser};

/// Parses one input line into a pipeline of commands.
pub struct DefaultParser<'a> {
    line: &'a str,
}

impl<'a> DefaultParser<'a> {
    pub fn new(line: &'a str) -> Self {
        Self { line }
    }
}

impl Parser for DefaultParser<'_> {
    fn parse(&mut self) -> Result<Option<ParsedLine>, ParseError> {
        let text = self.line.trim();
        let (body, background) = strip_background(text);
        if body.is_empty() {
            return Ok(None);
        }

        let commands = split_segments(body)
            .into_iter()
            .map(parse_segment)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Pipeline::new(commands).map(|pipeline| ParsedLine {
            pipeline,
            background,
            text: text.to_string(),
        }))
    }
}

fn strip_background(line: &str) -> (&str, bool) {
    match line.strip_suffix('&') {
        Some(rest) => (rest.trim_end(), true),
        None => (line, false),
    }
}

// Splits on `|` outside double quotes.
fn split_segments(line: &str) -> Vec<&str> {
    let mut segments = Vec::new();
    let mut in_quotes = false;
    let mut start = 0;
    for (idx, ch) in line.char_indices() {
        match ch {
            '"' => in_quotes = !in_quotes,
            '|' if !in_quotes => {
                segments.push(&line[start..idx]);
                start = idx + 1;
            }
            _ => {}
        }
    }
    segments.push(&line[start..]);
    segments
}

fn parse_segment(segment: &str) -> Result<Command, ParseError> {
    let mut cmd = Command::default();
    let mut tokens = Lexer::new(segment);

    while let Some(token) = tokens.next() {
        let Some(op) = token.operator() else {
            cmd.argv.push(token.text);
            continue;
        };
        let file = match tokens.next() {
            Some(file) if file.operator().is_none() => PathBuf::from(file.text),
            _ => return Err(ParseError::MissingOperand { operator: op.as_str() }),
        };
        match op {
            Operator::RedirectIn => cmd.input = Some(file),
            Operator::RedirectOut => {
                cmd.output = Some(OutputRedirect { path: file, mode: OutputMode::Truncate })
            }
            Operator::RedirectAppend => {
                cmd.output = Some(OutputRedirect { path: file, mode: OutputMode::Append })
            }
        }
    }

    if cmd.argv.is_empty() {
        return Err(ParseError::EmptyCommand);
    }
    Ok(cmd)
}
