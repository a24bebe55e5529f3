use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::parser::ParseError;

pub type Result<T> = std::result::Result<T, ShellError>;

/// Everything the shell reports to the user without exiting.
#[derive(Debug, Error)]
pub enum ShellError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// A redirection target could not be opened.
    #[error("{}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Pipe allocation failed; nothing was started.
    #[error("cannot create pipe: {0}")]
    Pipe(#[source] nix::Error),

    #[error("{command}: cannot fork: {source}")]
    Fork {
        command: String,
        #[source]
        source: nix::Error,
    },

    #[error("{0}: argument contains a NUL byte")]
    NulByte(String),

    #[error("wait failed: {0}")]
    Wait(#[source] nix::Error),

    #[error("cannot signal process group: {0}")]
    Signal(#[source] nix::Error),

    #[error("{command}: {job}: no such job")]
    NoSuchJob { command: &'static str, job: usize },

    #[error("{command}: {arg}: invalid job id")]
    InvalidJobId { command: &'static str, arg: String },

    #[error("{0}: missing operand")]
    MissingOperand(&'static str),

    #[error("cd: {}: {source}", .path.display())]
    ChangeDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Prints an error the way every failure surfaces at the prompt.
pub fn report(err: &ShellError) {
    log::debug!("reporting {err:?}");
    eprintln!("jobsh: {err}");
}
