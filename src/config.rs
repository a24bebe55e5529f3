use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use log::LevelFilter;
use thiserror::Error;

const RC_FILE: &str = ".jobshrc";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub prompt: String,
    pub log_level: LevelFilter,
    /// Greeting on start and farewell on exit.
    pub banner: bool,
}

impl Default for Config {
    fn default() -> Self {
        ConfigLoader::default_config()
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Parse error: line {line}: {msg}")]
    Parse { line: usize, msg: String },
}

pub struct ConfigLoader;

impl ConfigLoader {
    pub fn default_config() -> Config {
        Config {
            prompt: "jobsh> ".to_string(),
            log_level: LevelFilter::Warn,
            banner: false,
        }
    }

    /// `$HOME/.jobshrc`, if `HOME` is set.
    pub fn default_path() -> Option<PathBuf> {
        std::env::var_os("HOME").map(|home| Path::new(&home).join(RC_FILE))
    }

    /// Reads the rc file; a missing file means defaults.
    pub fn load() -> Result<Config, ConfigError> {
        match Self::default_path() {
            Some(path) if path.is_file() => Self::load_from_file(path),
            _ => Ok(Self::default_config()),
        }
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
        let src = std::fs::read_to_string(path)?;
        Self::load_from_str(&src)
    }

    pub fn load_from_str(src: &str) -> Result<Config, ConfigError> {
        let mut config = Self::default_config();

        for (lineno, line) in src.lines().enumerate() {
            let line_no = lineno + 1;
            if line.trim().is_empty() || line.trim_start().starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                return Err(ConfigError::Parse {
                    line: line_no,
                    msg: format!("no '=' found: {line}"),
                });
            };

            match key.trim() {
                // kept verbatim so a trailing space in the prompt survives
                "prompt" => config.prompt = value.to_string(),
                "log_level" => {
                    config.log_level = LevelFilter::from_str(value.trim()).map_err(|_| ConfigError::Parse {
                        line: line_no,
                        msg: format!("invalid log level: {}", value.trim()),
                    })?
                }
                "banner" => {
                    config.banner = value.trim().parse::<bool>().map_err(|_| ConfigError::Parse {
                        line: line_no,
                        msg: format!("expected true or false: {}", value.trim()),
                    })?
                }
                other => {
                    return Err(ConfigError::Parse {
                        line: line_no,
                        msg: format!("unknown key: {other}"),
                    });
                }
            }
        }

        Ok(config)
    }
}
