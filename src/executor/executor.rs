use std::io::Write;

use crate::ast::ParsedLine;
use crate::error::ShellError;
use crate::job::JobTable;
use crate::terminal::Terminal;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecOutcome {
    /// Keep reading input; the value is the line's exit status.
    Code(i32),
    /// Leave the shell with this status.
    Exit(i32),
}

pub type ExecStatus = Result<ExecOutcome, ShellError>;

pub trait Executor {
    /// Runs one parsed line. Shell messages go to `out`; child processes
    /// write to the inherited stdout.
    fn exec(&mut self, line: &ParsedLine, out: &mut dyn Write) -> ExecStatus;
}

/// Session state shared by built-ins: the job table and the terminal.
#[derive(Debug)]
pub struct ShellContext {
    pub jobs: JobTable,
    pub terminal: Terminal,
}

impl ShellContext {
    pub fn new(terminal: Terminal) -> Self {
        ShellContext {
            jobs: JobTable::new(),
            terminal,
        }
    }
}
