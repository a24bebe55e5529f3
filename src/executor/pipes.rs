use std::os::fd::{AsRawFd, OwnedFd, RawFd};

use nix::fcntl::OFlag;
use nix::unistd::pipe2;

use crate::error::{Result, ShellError};

/// One inter-stage pipe. Both ends close when dropped.
#[derive(Debug)]
pub struct Pipe {
    pub read: OwnedFd,
    pub write: OwnedFd,
}

/// The `n - 1` pipes joining an `n`-stage pipeline, indexed by stage.
///
/// Pipe `i` carries stage `i`'s stdout to stage `i + 1`'s stdin. Every end is
/// close-on-exec, so a stage only keeps the ends it `dup2`s onto 0 and 1.
#[derive(Debug)]
pub struct PipeSet {
    pipes: Vec<Pipe>,
}

impl PipeSet {
    /// Allocates every pipe up front. On failure the ones already created are
    /// dropped and nothing is left open.
    pub fn allocate(stages: usize) -> Result<Self> {
        let count = stages.saturating_sub(1);
        let mut pipes = Vec::with_capacity(count);
        for _ in 0..count {
            let (read, write) = pipe2(OFlag::O_CLOEXEC).map_err(ShellError::Pipe)?;
            pipes.push(Pipe { read, write });
        }
        Ok(PipeSet { pipes })
    }

    pub fn len(&self) -> usize {
        self.pipes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pipes.is_empty()
    }

    /// Read end feeding `stage`, if it is not the first.
    pub fn stdin_for(&self, stage: usize) -> Option<RawFd> {
        stage
            .checked_sub(1)
            .and_then(|prev| self.pipes.get(prev))
            .map(|p| p.read.as_raw_fd())
    }

    /// Write end fed by `stage`, if it is not the last.
    pub fn stdout_for(&self, stage: usize) -> Option<RawFd> {
        self.pipes.get(stage).map(|p| p.write.as_raw_fd())
    }

    /// Every descriptor held, both ends of every pipe.
    pub fn raw_fds(&self) -> Vec<RawFd> {
        self.pipes
            .iter()
            .flat_map(|p| [p.read.as_raw_fd(), p.write.as_raw_fd()])
            .collect()
    }
}
