use std::io::Write;

use super::builtins::BuiltinManager;
use super::executor::{ExecOutcome, ExecStatus, Executor, ShellContext};
use super::redirect::RedirectResolver;
use super::spawner::{ProcessSpawner, Spawned};
use crate::ast::{Command, ParsedLine};
use crate::error::report;
use crate::job::JobTable;
use crate::terminal::Terminal;

/// Runs built-ins in the shell and everything else as a process group.
pub struct DefaultExecutor {
    builtins: BuiltinManager,
    spawner: ProcessSpawner,
    ctx: ShellContext,
}

impl DefaultExecutor {
    pub fn new(terminal: Terminal) -> Self {
        DefaultExecutor {
            builtins: BuiltinManager::new(),
            spawner: ProcessSpawner::new(terminal.is_interactive()),
            ctx: ShellContext::new(terminal),
        }
    }

    pub fn jobs(&self) -> &JobTable {
        &self.ctx.jobs
    }

    pub fn jobs_mut(&mut self) -> &mut JobTable {
        &mut self.ctx.jobs
    }

    fn builtin_for<'a>(&self, line: &'a ParsedLine) -> Option<&'a Command> {
        line.pipeline
            .single()
            .filter(|cmd| cmd.name().is_some_and(|name| self.builtins.is_builtin(name)))
    }

    fn exec_builtin(&mut self, cmd: &Command, background: bool, out: &mut dyn Write) -> ExecStatus {
        let name = cmd.name().unwrap_or_default();
        if background {
            log::debug!("`{name}` is a builtin, running it in the foreground");
        }
        let redirections = RedirectResolver::resolve(cmd)?;
        let status = match redirections.stdout {
            Some(mut file) => self.builtins.execute(name, cmd.args(), &mut self.ctx, &mut file),
            None => self.builtins.execute(name, cmd.args(), &mut self.ctx, out),
        };
        status.unwrap_or(Ok(ExecOutcome::Code(127)))
    }

    fn exec_pipeline(&mut self, line: &ParsedLine, out: &mut dyn Write) -> ExecStatus {
        // anything buffered must reach the terminal before children write to it
        out.flush()?;

        let Spawned { handle, failures } = self.spawner.spawn(&line.pipeline)?;
        let Some(mut handle) = handle else {
            let mut failures = failures.into_iter();
            return match failures.next() {
                Some(first) => {
                    failures.for_each(|e| report(&e));
                    Err(first)
                }
                None => Ok(ExecOutcome::Code(1)),
            };
        };
        failures.iter().for_each(report);

        if line.background {
            let pgid = handle.pgid();
            let id = self.ctx.jobs.register(handle, line.text.clone());
            writeln!(out, "[{id}] Background job started (PID: {pgid})")?;
            return Ok(ExecOutcome::Code(0));
        }

        let pgid = handle.pgid();
        let code = self.ctx.terminal.foreground(pgid, || handle.wait())?;
        log::debug!("foreground pipeline {pgid} exited with {code}");
        Ok(ExecOutcome::Code(code))
    }
}

impl Executor for DefaultExecutor {
    fn exec(&mut self, line: &ParsedLine, out: &mut dyn Write) -> ExecStatus {
        match self.builtin_for(line) {
            Some(cmd) => self.exec_builtin(cmd, line.background, out),
            None => self.exec_pipeline(line, out),
        }
    }
}
