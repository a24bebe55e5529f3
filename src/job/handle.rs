use nix::errno::Errno;
use nix::sys::signal::{Signal, killpg};
use nix::sys::wait::{WaitPidFlag, WaitStatus, waitpid};
use nix::unistd::Pid;

use crate::error::{Result, ShellError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MemberState {
    Running,
    Stopped,
    Done(i32),
}

#[derive(Debug)]
struct Member {
    pid: Pid,
    state: MemberState,
}

impl Member {
    fn is_done(&self) -> bool {
        matches!(self.state, MemberState::Done(_))
    }

    fn apply(&mut self, status: WaitStatus) {
        self.state = match status {
            WaitStatus::Exited(_, code) => MemberState::Done(code),
            WaitStatus::Signaled(_, sig, _) => MemberState::Done(128 + sig as i32),
            WaitStatus::Stopped(..) => MemberState::Stopped,
            WaitStatus::Continued(_) => MemberState::Running,
            _ => self.state,
        };
    }
}

/// Aggregate state of every process in a pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupState {
    Running,
    Stopped,
    Finished,
}

/// A launched pipeline: its process group and every member pid.
///
/// Waiting and signalling always cover the whole group, so a job never
/// outlives the bookkeeping of any of its stages.
#[derive(Debug)]
pub struct PipelineHandle {
    pgid: Pid,
    members: Vec<Member>,
}

impl PipelineHandle {
    pub fn new(pgid: Pid, pids: Vec<Pid>) -> Self {
        let members = pids
            .into_iter()
            .map(|pid| Member { pid, state: MemberState::Running })
            .collect();
        PipelineHandle { pgid, members }
    }

    /// Process group id; also the pid of the group leader.
    pub fn pgid(&self) -> Pid {
        self.pgid
    }

    pub fn pids(&self) -> Vec<Pid> {
        self.members.iter().map(|m| m.pid).collect()
    }

    pub fn state(&self) -> GroupState {
        let mut live = self.members.iter().filter(|m| !m.is_done()).peekable();
        if live.peek().is_none() {
            GroupState::Finished
        } else if live.any(|m| m.state == MemberState::Stopped) {
            GroupState::Stopped
        } else {
            GroupState::Running
        }
    }

    /// Collects any status changes without blocking.
    pub fn poll(&mut self) -> Result<GroupState> {
        let flags = WaitPidFlag::WNOHANG | WaitPidFlag::WUNTRACED | WaitPidFlag::WCONTINUED;
        for member in self.members.iter_mut().filter(|m| !m.is_done()) {
            loop {
                match waitpid(member.pid, Some(flags)) {
                    Ok(WaitStatus::StillAlive) => break,
                    Ok(status) => {
                        log::trace!("pid {}: {:?}", member.pid, status);
                        member.apply(status);
                        if member.is_done() {
                            break;
                        }
                    }
                    Err(Errno::EINTR) => continue,
                    Err(Errno::ECHILD) => {
                        member.state = MemberState::Done(0);
                        break;
                    }
                    Err(e) => return Err(ShellError::Wait(e)),
                }
            }
        }
        Ok(self.state())
    }

    /// Blocks until every member has exited. Returns the last stage's status.
    pub fn wait(&mut self) -> Result<i32> {
        for member in self.members.iter_mut().filter(|m| !m.is_done()) {
            while !member.is_done() {
                match waitpid(member.pid, None) {
                    Ok(status) => member.apply(status),
                    Err(Errno::EINTR) => continue,
                    Err(Errno::ECHILD) => member.state = MemberState::Done(0),
                    Err(e) => return Err(ShellError::Wait(e)),
                }
            }
        }
        log::debug!("process group {} finished", self.pgid);
        Ok(match self.members.last().map(|m| m.state) {
            Some(MemberState::Done(code)) => code,
            _ => 0,
        })
    }

    /// Sends SIGCONT to the whole group.
    pub fn resume(&mut self) -> Result<()> {
        match killpg(self.pgid, Signal::SIGCONT) {
            Ok(()) => {}
            // group already gone; the next poll reaps it
            Err(Errno::ESRCH) => log::debug!("process group {} no longer exists", self.pgid),
            Err(e) => return Err(ShellError::Signal(e)),
        }
        for member in self.members.iter_mut() {
            if member.state == MemberState::Stopped {
                member.state = MemberState::Running;
            }
        }
        Ok(())
    }
}
