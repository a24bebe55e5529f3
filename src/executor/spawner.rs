use std::ffi::{CString, c_char};
use std::os::fd::{AsRawFd, RawFd};
use std::ptr;

use nix::errno::Errno;
use nix::unistd::{ForkResult, Pid, fork, setpgid};

use super::pipes::PipeSet;
use super::redirect::RedirectResolver;
use crate::ast::{Command, Pipeline};
use crate::error::{Result, ShellError};
use crate::job::PipelineHandle;
use crate::parser::ParseError;

/// Outcome of launching a pipeline.
///
/// `handle` is `None` only when no stage could be started. Stages that failed
/// before fork (unopenable redirect, fork error) are listed in `failures`; the
/// rest of the pipeline runs regardless.
#[derive(Debug)]
pub struct Spawned {
    pub handle: Option<PipelineHandle>,
    pub failures: Vec<ShellError>,
}

/// Forks one process per stage, wired together with pipes, in one process group.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessSpawner {
    /// Children restore SIGTTOU, which an interactive shell ignores.
    pub reset_job_signals: bool,
}

impl ProcessSpawner {
    pub fn new(reset_job_signals: bool) -> Self {
        ProcessSpawner { reset_job_signals }
    }

    pub fn spawn(&self, pipeline: &Pipeline) -> Result<Spawned> {
        let pipes = PipeSet::allocate(pipeline.len())?;
        log::debug!("{} stage(s), {} pipe(s)", pipeline.len(), pipes.len());

        let pipe_fds = pipes.raw_fds();
        let mut pgid = None;
        let mut pids = Vec::with_capacity(pipeline.len());
        let mut failures = Vec::new();

        for (stage, cmd) in pipeline.commands().iter().enumerate() {
            let wiring = StageWiring {
                stdin: pipes.stdin_for(stage),
                stdout: pipes.stdout_for(stage),
                pipe_fds: &pipe_fds,
            };
            match self.launch(cmd, &wiring, pgid) {
                Ok(pid) => {
                    let leader = *pgid.get_or_insert(pid);
                    log::debug!("stage {stage} `{}`: pid {pid}, pgid {leader}", cmd.argv.join(" "));
                    pids.push(pid);
                }
                Err(e) => {
                    log::warn!("stage {stage} not started: {e}");
                    failures.push(e);
                }
            }
        }

        // every stage has its copies now; the coordinator keeps none
        drop(pipes);

        Ok(Spawned {
            handle: pgid.map(|pgid| PipelineHandle::new(pgid, pids)),
            failures,
        })
    }

    fn launch(&self, cmd: &Command, wiring: &StageWiring<'_>, pgid: Option<Pid>) -> Result<Pid> {
        let name = cmd.name().unwrap_or_default().to_string();
        let argv = cmd
            .argv
            .iter()
            .map(|arg| CString::new(arg.as_bytes()))
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|_| ShellError::NulByte(name.clone()))?;
        if argv.is_empty() {
            return Err(ParseError::EmptyCommand.into());
        }
        // NULL-terminated, borrowing from `argv`, which outlives the fork
        let argv_ptrs: Vec<*const c_char> = argv
            .iter()
            .map(|arg| arg.as_ptr())
            .chain(std::iter::once(ptr::null()))
            .collect();

        // opened here so the parent reports the error; closed in the parent on return
        let redirections = RedirectResolver::resolve(cmd)?;

        let image = ChildImage {
            pgid: pgid.unwrap_or(Pid::from_raw(0)),
            stdin: wiring.stdin,
            stdout: wiring.stdout,
            pipe_fds: wiring.pipe_fds,
            redirect_in: redirections.stdin.as_ref().map(AsRawFd::as_raw_fd),
            redirect_out: redirections.stdout.as_ref().map(AsRawFd::as_raw_fd),
            argv: &argv_ptrs,
            error_prefix: format!("jobsh: {name}: ").into_bytes(),
            reset_job_signals: self.reset_job_signals,
        };

        match unsafe { fork() } {
            Ok(ForkResult::Parent { child }) => {
                // the child does the same; whichever runs first wins the race
                let group = pgid.unwrap_or(child);
                if let Err(e) = setpgid(child, group) {
                    if e != Errno::EACCES && e != Errno::ESRCH {
                        log::warn!("setpgid({child}, {group}): {e}");
                    }
                }
                Ok(child)
            }
            Ok(ForkResult::Child) => image.exec(),
            Err(source) => Err(ShellError::Fork { command: name, source }),
        }
    }
}

struct StageWiring<'a> {
    stdin: Option<RawFd>,
    stdout: Option<RawFd>,
    pipe_fds: &'a [RawFd],
}

/// Everything the child needs, prepared before fork so the child itself only
/// makes system calls and never allocates.
struct ChildImage<'a> {
    pgid: Pid,
    stdin: Option<RawFd>,
    stdout: Option<RawFd>,
    pipe_fds: &'a [RawFd],
    redirect_in: Option<RawFd>,
    redirect_out: Option<RawFd>,
    argv: &'a [*const c_char],
    error_prefix: Vec<u8>,
    reset_job_signals: bool,
}

impl ChildImage<'_> {
    fn exec(&self) -> ! {
        let _ = setpgid(Pid::from_raw(0), self.pgid);
        if self.reset_job_signals {
            unsafe {
                libc::signal(libc::SIGTTOU, libc::SIG_DFL);
            }
        }

        if let Some(fd) = self.stdin {
            self.dup_or_die(fd, libc::STDIN_FILENO);
        }
        if let Some(fd) = self.stdout {
            self.dup_or_die(fd, libc::STDOUT_FILENO);
        }
        for &fd in self.pipe_fds {
            unsafe {
                libc::close(fd);
            }
        }

        // explicit files override the pipe on the same stream
        if let Some(fd) = self.redirect_in {
            self.dup_or_die(fd, libc::STDIN_FILENO);
            unsafe {
                libc::close(fd);
            }
        }
        if let Some(fd) = self.redirect_out {
            self.dup_or_die(fd, libc::STDOUT_FILENO);
            unsafe {
                libc::close(fd);
            }
        }

        unsafe {
            libc::execvp(self.argv[0], self.argv.as_ptr());
        }
        let (reason, status) = match Errno::last() {
            Errno::ENOENT => ("command not found", 127),
            other => (other.desc(), 126),
        };
        self.die(reason, status)
    }

    fn dup_or_die(&self, from: RawFd, to: RawFd) {
        if from == to {
            return;
        }
        if unsafe { libc::dup2(from, to) } == -1 {
            self.die(Errno::last().desc(), 1);
        }
    }

    fn die(&self, reason: &str, status: i32) -> ! {
        write_stderr(&self.error_prefix);
        write_stderr(reason.as_bytes());
        write_stderr(b"\n");
        unsafe { libc::_exit(status) }
    }
}

fn write_stderr(bytes: &[u8]) {
    unsafe {
        libc::write(libc::STDERR_FILENO, bytes.as_ptr().cast(), bytes.len());
    }
}
