use std::collections::HashMap;
use std::env;
use std::io::Write;
use std::path::PathBuf;

use super::executor::{ExecOutcome, ExecStatus, ShellContext};
use crate::error::ShellError;

pub trait BuiltinCommand {
    fn name(&self) -> &'static str;
    fn run(&self, args: &[String], ctx: &mut ShellContext, out: &mut dyn Write) -> ExecStatus;
}

pub struct BuiltinManager {
    commands: HashMap<&'static str, Box<dyn BuiltinCommand>>,
}

impl Default for BuiltinManager {
    fn default() -> Self {
        Self::new()
    }
}

impl BuiltinManager {
    pub fn new() -> Self {
        let mut mgr = BuiltinManager {
            commands: HashMap::new(),
        };
        mgr.register(Box::new(CdCommand));
        mgr.register(Box::new(PwdCommand));
        mgr.register(Box::new(JobsCommand));
        mgr.register(Box::new(FgCommand));
        mgr.register(Box::new(BgCommand));
        mgr.register(Box::new(ExitCommand));
        mgr
    }

    pub fn register(&mut self, cmd: Box<dyn BuiltinCommand>) {
        self.commands.insert(cmd.name(), cmd);
    }

    pub fn is_builtin(&self, name: &str) -> bool {
        self.commands.contains_key(name)
    }

    pub fn execute(
        &self,
        name: &str,
        args: &[String],
        ctx: &mut ShellContext,
        out: &mut dyn Write,
    ) -> Option<ExecStatus> {
        self.commands.get(name).map(|cmd| cmd.run(args, ctx, out))
    }
}

/// Accepts `3` or `%3`.
fn job_id(command: &'static str, args: &[String]) -> Result<usize, ShellError> {
    let arg = args.first().ok_or(ShellError::MissingOperand(command))?;
    arg.strip_prefix('%')
        .unwrap_or(arg)
        .parse()
        .map_err(|_| ShellError::InvalidJobId {
            command,
            arg: arg.clone(),
        })
}

pub struct CdCommand;

impl BuiltinCommand for CdCommand {
    fn name(&self) -> &'static str {
        "cd"
    }
    fn run(&self, args: &[String], _ctx: &mut ShellContext, _out: &mut dyn Write) -> ExecStatus {
        let target = PathBuf::from(args.first().ok_or(ShellError::MissingOperand("cd"))?);
        env::set_current_dir(&target).map_err(|source| ShellError::ChangeDir { path: target, source })?;
        Ok(ExecOutcome::Code(0))
    }
}

pub struct PwdCommand;

impl BuiltinCommand for PwdCommand {
    fn name(&self) -> &'static str {
        "pwd"
    }
    fn run(&self, _args: &[String], _ctx: &mut ShellContext, out: &mut dyn Write) -> ExecStatus {
        writeln!(out, "{}", env::current_dir()?.display())?;
        Ok(ExecOutcome::Code(0))
    }
}

pub struct JobsCommand;

impl BuiltinCommand for JobsCommand {
    fn name(&self) -> &'static str {
        "jobs"
    }
    fn run(&self, _args: &[String], ctx: &mut ShellContext, out: &mut dyn Write) -> ExecStatus {
        ctx.jobs.list(out)?;
        Ok(ExecOutcome::Code(0))
    }
}

pub struct FgCommand;

impl BuiltinCommand for FgCommand {
    fn name(&self) -> &'static str {
        "fg"
    }
    fn run(&self, args: &[String], ctx: &mut ShellContext, out: &mut dyn Write) -> ExecStatus {
        let id = job_id("fg", args)?;
        let code = ctx.jobs.bring_to_foreground(id, &ctx.terminal, out)?;
        Ok(ExecOutcome::Code(code))
    }
}

pub struct BgCommand;

impl BuiltinCommand for BgCommand {
    fn name(&self) -> &'static str {
        "bg"
    }
    fn run(&self, args: &[String], ctx: &mut ShellContext, out: &mut dyn Write) -> ExecStatus {
        let id = job_id("bg", args)?;
        ctx.jobs.bring_to_background(id, out)?;
        Ok(ExecOutcome::Code(0))
    }
}

pub struct ExitCommand;

impl BuiltinCommand for ExitCommand {
    fn name(&self) -> &'static str {
        "exit"
    }
    fn run(&self, args: &[String], _ctx: &mut ShellContext, _out: &mut dyn Write) -> ExecStatus {
        let code = args.first().and_then(|s| s.parse::<i32>().ok()).unwrap_or(0);
        Ok(ExecOutcome::Exit(code))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terminal::Terminal;

    fn run(name: &str, args: &[&str], ctx: &mut ShellContext) -> (ExecStatus, String) {
        let args: Vec<String> = args.iter().map(|s| s.to_string()).collect();
        let mut out = Vec::new();
        let status = BuiltinManager::new()
            .execute(name, &args, ctx, &mut out)
            .expect("not a builtin");
        (status, String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_registry() {
        let mgr = BuiltinManager::new();
        for name in ["cd", "pwd", "jobs", "fg", "bg", "exit"] {
            assert!(mgr.is_builtin(name), "{name}");
        }
        assert!(!mgr.is_builtin("ls"));
        assert!(!mgr.is_builtin("help"));
    }

    #[test]
    fn test_exit_codes() {
        let mut ctx = ShellContext::new(Terminal::detached());
        assert!(matches!(run("exit", &[], &mut ctx).0, Ok(ExecOutcome::Exit(0))));
        assert!(matches!(run("exit", &["3"], &mut ctx).0, Ok(ExecOutcome::Exit(3))));
    }

    #[test]
    fn test_cd_without_operand() {
        let mut ctx = ShellContext::new(Terminal::detached());
        let (status, _) = run("cd", &[], &mut ctx);
        let err = status.unwrap_err();
        assert!(matches!(err, ShellError::MissingOperand("cd")));
        assert_eq!(err.to_string(), "cd: missing operand");
    }

    #[test]
    fn test_cd_to_missing_directory() {
        let mut ctx = ShellContext::new(Terminal::detached());
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        let (status, _) = run("cd", &[missing.to_str().unwrap()], &mut ctx);
        assert!(matches!(status, Err(ShellError::ChangeDir { .. })));
    }

    #[test]
    fn test_pwd_prints_current_dir() {
        let mut ctx = ShellContext::new(Terminal::detached());
        let (status, out) = run("pwd", &[], &mut ctx);
        assert!(matches!(status, Ok(ExecOutcome::Code(0))));
        assert_eq!(out.trim_end(), env::current_dir().unwrap().display().to_string());
    }

    #[test]
    fn test_job_id_forms() {
        assert_eq!(job_id("fg", &["2".to_string()]).unwrap(), 2);
        assert_eq!(job_id("fg", &["%7".to_string()]).unwrap(), 7);
        assert!(matches!(job_id("bg", &[]), Err(ShellError::MissingOperand("bg"))));
        assert!(matches!(
            job_id("fg", &["abc".to_string()]),
            Err(ShellError::InvalidJobId { command: "fg", .. })
        ));
    }

    #[test]
    fn test_fg_unknown_job() {
        let mut ctx = ShellContext::new(Terminal::detached());
        let (status, out) = run("fg", &["99"], &mut ctx);
        assert!(matches!(status, Err(ShellError::NoSuchJob { job: 99, .. })));
        assert!(out.is_empty());
        assert!(ctx.jobs.is_empty());
    }
}
