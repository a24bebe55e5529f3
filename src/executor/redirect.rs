use std::fs::{File, OpenOptions};
use std::os::unix::fs::OpenOptionsExt;
use std::path::Path;

use crate::ast::{Command, OutputMode, OutputRedirect};
use crate::error::{Result, ShellError};

const OUTPUT_FILE_MODE: u32 = 0o644;

/// Files a command's own `<`, `>` and `>>` resolved to.
#[derive(Debug, Default)]
pub struct Redirections {
    pub stdin: Option<File>,
    pub stdout: Option<File>,
}

pub struct RedirectResolver;

impl RedirectResolver {
    /// Opens the command's input and output files. Nothing is left open on error.
    pub fn resolve(cmd: &Command) -> Result<Redirections> {
        let stdin = cmd.input.as_deref().map(Self::open_input).transpose()?;
        let stdout = cmd.output.as_ref().map(Self::open_output).transpose()?;
        Ok(Redirections { stdin, stdout })
    }

    pub fn open_input(path: &Path) -> Result<File> {
        File::open(path).map_err(|source| ShellError::Open {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn open_output(target: &OutputRedirect) -> Result<File> {
        let mut options = OpenOptions::new();
        options.write(true).create(true).mode(OUTPUT_FILE_MODE);
        match target.mode {
            OutputMode::Truncate => options.truncate(true),
            OutputMode::Append => options.append(true),
        };
        options.open(&target.path).map_err(|source| ShellError::Open {
            path: target.path.clone(),
            source,
        })
    }
}
