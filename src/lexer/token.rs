/// A single word of input. Quote characters are already stripped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub text: String,
    /// Set when any part of the word came from a quoted span.
    pub quoted: bool,
}

impl Token {
    pub fn word(text: impl Into<String>) -> Self {
        Token { text: text.into(), quoted: false }
    }

    pub fn quoted(text: impl Into<String>) -> Self {
        Token { text: text.into(), quoted: true }
    }

    /// Redirection operator carried by this token, if it is a bare `<`, `>` or `>>`.
    pub fn operator(&self) -> Option<Operator> {
        if self.quoted {
            return None;
        }
        match self.text.as_str() {
            "<" => Some(Operator::RedirectIn),
            ">" => Some(Operator::RedirectOut),
            ">>" => Some(Operator::RedirectAppend),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    RedirectIn,     // <
    RedirectOut,    // >
    RedirectAppend, // >>
}

impl Operator {
    pub fn as_str(self) -> &'static str {
        match self {
            Operator::RedirectIn => "<",
            Operator::RedirectOut => ">",
            Operator::RedirectAppend => ">>",
        }
    }
}
