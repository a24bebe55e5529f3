use std::io::{self, IsTerminal};
use std::os::fd::AsFd;

use nix::sys::signal::{SigHandler, Signal, killpg, signal};
use nix::unistd::{Pid, getpgrp, tcsetpgrp};

/// Controlling-terminal ownership for foreground pipelines.
///
/// Only active when stdin is a terminal; otherwise every method is a no-op and
/// pipelines simply inherit stdin.
#[derive(Debug, Clone, Copy)]
pub struct Terminal {
    shell_pgid: Option<Pid>,
}

impl Terminal {
    pub fn detect() -> Self {
        if !io::stdin().is_terminal() {
            return Self::detached();
        }
        // tcsetpgrp from a background group raises SIGTTOU
        if let Err(e) = unsafe { signal(Signal::SIGTTOU, SigHandler::SigIgn) } {
            log::warn!("cannot ignore SIGTTOU, terminal hand-off disabled: {e}");
            return Self::detached();
        }
        let shell_pgid = getpgrp();
        log::debug!("interactive session, shell process group {shell_pgid}");
        Terminal { shell_pgid: Some(shell_pgid) }
    }

    pub fn detached() -> Self {
        Terminal { shell_pgid: None }
    }

    pub fn is_interactive(&self) -> bool {
        self.shell_pgid.is_some()
    }

    /// Runs `f` with `pgid` owning the terminal, then takes it back.
    pub fn foreground<T>(&self, pgid: Pid, f: impl FnOnce() -> T) -> T {
        let Some(shell_pgid) = self.shell_pgid else {
            return f();
        };
        set_foreground(io::stdin(), pgid);
        // a stage that touched the terminal before the hand-off is stopped by SIGTTIN
        if let Err(e) = killpg(pgid, Signal::SIGCONT) {
            log::debug!("SIGCONT to {pgid}: {e}");
        }
        let out = f();
        set_foreground(io::stdin(), shell_pgid);
        out
    }
}

fn set_foreground<F: AsFd>(tty: F, pgid: Pid) {
    if let Err(e) = tcsetpgrp(tty, pgid) {
        log::warn!("tcsetpgrp({pgid}): {e}");
    }
}
