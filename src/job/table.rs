use std::collections::BTreeMap;
use std::fmt;
use std::io::Write;

use super::handle::{GroupState, PipelineHandle};
use crate::error::{Result, ShellError};
use crate::terminal::Terminal;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Running,
    Stopped,
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobState::Running => write!(f, "Running"),
            JobState::Stopped => write!(f, "Stopped"),
        }
    }
}

#[derive(Debug)]
pub struct Job {
    pub id: usize,
    pub handle: PipelineHandle,
    /// The input line that started the job.
    pub command: String,
    pub state: JobState,
}

/// Background jobs of one shell session, keyed by id.
///
/// Ids come from a counter starting at 1 and are never handed out twice.
/// Every mutation goes through `&mut self`; a reaper running outside the
/// control loop has to take the same exclusive borrow (e.g. behind a `Mutex`).
#[derive(Debug)]
pub struct JobTable {
    jobs: BTreeMap<usize, Job>,
    next_id: usize,
}

impl Default for JobTable {
    fn default() -> Self {
        Self::new()
    }
}

impl JobTable {
    pub fn new() -> Self {
        JobTable {
            jobs: BTreeMap::new(),
            next_id: 1,
        }
    }

    pub fn register(&mut self, handle: PipelineHandle, command: impl Into<String>) -> usize {
        let id = self.next_id;
        self.next_id += 1;
        let command = command.into();
        log::debug!("job [{id}] registered: pgid {} `{command}`", handle.pgid());
        self.jobs.insert(
            id,
            Job {
                id,
                handle,
                command,
                state: JobState::Running,
            },
        );
        id
    }

    pub fn get(&self, id: usize) -> Option<&Job> {
        self.jobs.get(&id)
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Job> {
        self.jobs.values()
    }

    /// Polls every job without blocking, drops the finished ones and returns them.
    pub fn reap(&mut self) -> Vec<Job> {
        let mut finished = Vec::new();
        for job in self.jobs.values_mut() {
            match job.handle.poll() {
                Ok(GroupState::Finished) => finished.push(job.id),
                Ok(GroupState::Stopped) => job.state = JobState::Stopped,
                Ok(GroupState::Running) => job.state = JobState::Running,
                Err(e) => log::warn!("job [{}]: {e}", job.id),
            }
        }
        finished
            .into_iter()
            .filter_map(|id| self.jobs.remove(&id))
            .inspect(|job| log::info!("job [{}] finished: {}", job.id, job.command))
            .collect()
    }

    /// Reaps, then prints what is still tracked.
    pub fn list(&mut self, out: &mut dyn Write) -> Result<()> {
        self.reap();
        if self.jobs.is_empty() {
            return Ok(());
        }
        writeln!(out, "Active Jobs:")?;
        for job in self.jobs.values() {
            writeln!(
                out,
                "[{}] PID: {}  Command: {} ({})",
                job.id,
                job.handle.pgid(),
                job.command,
                job.state
            )?;
        }
        Ok(())
    }

    /// Waits for job `id` to finish with the terminal handed to it, then drops it.
    ///
    /// The entry stays in the table until the wait succeeds, so a failed `fg`
    /// leaves the job listed and reapable.
    pub fn bring_to_foreground(&mut self, id: usize, terminal: &Terminal, out: &mut dyn Write) -> Result<i32> {
        let job = self
            .jobs
            .get_mut(&id)
            .ok_or(ShellError::NoSuchJob { command: "fg", job: id })?;
        writeln!(out, "Bringing job [{id}] to foreground: {}", job.command)?;
        out.flush()?;

        // the cached state lags behind external stops; the wait below never
        // returns for a stopped group, so it is always continued first
        job.handle.resume()?;
        job.state = JobState::Running;
        let code = terminal.foreground(job.handle.pgid(), || job.handle.wait())?;

        self.jobs.remove(&id);
        log::debug!("job [{id}] completed in foreground with status {code}");
        Ok(code)
    }

    /// Continues job `id` in the background.
    pub fn bring_to_background(&mut self, id: usize, out: &mut dyn Write) -> Result<()> {
        let job = self
            .jobs
            .get_mut(&id)
            .ok_or(ShellError::NoSuchJob { command: "bg", job: id })?;
        writeln!(out, "Resuming job [{id}] in background: {}", job.command)?;
        job.handle.resume()?;
        job.state = JobState::Running;
        Ok(())
    }
}

impl Drop for JobTable {
    fn drop(&mut self) {
        self.reap();
        for job in self.jobs.values() {
            log::info!("session ending with job [{}] still running: {}", job.id, job.command);
        }
    }
}
