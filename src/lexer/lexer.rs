use super::token::Token;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Unquoted,
    Quoted,
}

/// Splits a line into words on unquoted blanks.
///
/// A `"` toggles quoting; inside quotes blanks are literal. There is no escape
/// for an embedded quote, and an unterminated quote runs to the end of the line.
pub struct Lexer<'a> {
    input: &'a str,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Lexer { input }
    }

    pub fn tokenize(line: &str) -> Vec<Token> {
        Lexer::new(line).collect()
    }
}

impl Iterator for Lexer<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        let mut state = State::Unquoted;
        let mut buf = String::new();
        let mut quoted = false;
        let mut consumed = self.input.len();

        for (idx, ch) in self.input.char_indices() {
            match (state, ch) {
                (_, '"') => {
                    state = match state {
                        State::Unquoted => State::Quoted,
                        State::Quoted => State::Unquoted,
                    };
                    quoted = true;
                }
                (State::Unquoted, ' ' | '\t' | '\n') => {
                    if !buf.is_empty() {
                        consumed = idx;
                        break;
                    }
                    // `""` followed by a blank yields nothing
                    quoted = false;
                }
                _ => buf.push(ch),
            }
        }

        self.input = &self.input[consumed..];
        if buf.is_empty() {
            None
        } else {
            Some(Token { text: buf, quoted })
        }
    }
}
