use std::io::{self, BufRead, Write};

pub struct ShellPrompt {
    text: String,
}

impl ShellPrompt {
    pub fn new(text: impl Into<String>) -> Self {
        ShellPrompt { text: text.into() }
    }

    pub fn show(&self, out: &mut dyn Write) -> io::Result<()> {
        write!(out, "{}", self.text)?;
        out.flush()
    }

    /// `None` at end of input (e.g. Ctrl-D).
    pub fn read_line(&self, input: &mut dyn BufRead) -> io::Result<Option<String>> {
        let mut buf = String::new();
        if input.read_line(&mut buf)? == 0 {
            return Ok(None);
        }
        Ok(Some(buf.trim_end_matches(['\n', '\r']).to_string()))
    }
}
