use std::io::{self, BufRead, Write};

use crate::error::{ShellError, report};
use crate::executor::{ExecOutcome, Executor};
use crate::parser::Parser;
use crate::parser::default::DefaultParser;
use crate::prompt::ShellPrompt;

/// Prompt, read, parse, execute until `exit` or end of input.
pub struct Repl<E: Executor> {
    executor: E,
    prompt: ShellPrompt,
}

impl<E: Executor> Repl<E> {
    pub fn new(executor: E, prompt: ShellPrompt) -> Self {
        Repl { executor, prompt }
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// Returns the status the shell should exit with.
    pub fn run(&mut self, input: &mut dyn BufRead, out: &mut dyn Write) -> io::Result<i32> {
        loop {
            self.prompt.show(out)?;
            let line = match self.prompt.read_line(input) {
                Ok(Some(line)) => line,
                Ok(None) => {
                    // EOF (e.g. Ctrl-D)
                    writeln!(out)?;
                    return Ok(0);
                }
                Err(e) => {
                    log::error!("reading input: {e}");
                    report(&ShellError::Io(e));
                    return Ok(0);
                }
            };

            let parsed = match DefaultParser::new(&line).parse() {
                Ok(Some(parsed)) => parsed,
                Ok(None) => continue,
                Err(e) => {
                    report(&ShellError::from(e));
                    continue;
                }
            };

            match self.executor.exec(&parsed, out) {
                Ok(ExecOutcome::Exit(code)) => return Ok(code),
                Ok(ExecOutcome::Code(code)) => log::trace!("`{}` -> {code}", parsed.text),
                Err(e) => report(&e),
            }
            out.flush()?;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::tests::MockExecutor;

    fn run(input: &str) -> (i32, Vec<String>, String) {
        let mut repl = Repl::new(MockExecutor::new(), ShellPrompt::new("> "));
        let mut out = Vec::new();
        let code = repl.run(&mut input.as_bytes(), &mut out).unwrap();
        let lines = repl.executor().lines.clone();
        (code, lines, String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_exit_stops_the_loop() {
        let (code, lines, _) = run("echo a\nexit 3\necho never\n");
        assert_eq!(code, 3);
        assert_eq!(lines, vec!["echo a", "exit 3"]);
    }

    #[test]
    fn test_eof_ends_with_success() {
        let (code, lines, out) = run("true\n");
        assert_eq!(code, 0);
        assert_eq!(lines, vec!["true"]);
        assert_eq!(out, "> ran: true\n> \n");
    }

    #[test]
    fn test_blank_and_bad_lines_are_skipped() {
        let (code, lines, _) = run("\n   \necho hi >\na | | b\nls\n");
        assert_eq!(code, 0);
        assert_eq!(lines, vec!["ls"]);
    }
}
