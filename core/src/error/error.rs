use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("logging setup failed: {0}")]
    Logging(String),
    #[error("server failed: {0}")]
    Server(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("internal error: {0:#}")]
    Anyhow(#[from] anyhow::Error),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot determine user {0} directory")]
    NoUserDir(&'static str),
    #[error("failed to read config from {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config from {path:?}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("invalid config: {0}")]
    Invalid(String),
    #[error("couldn't create video dir at {path:?}: {source}")]
    VideoDir {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Rejections returned by the stream registry. None of these are fatal.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("No such stream")]
    NotFound,
    #[error("Stream already enabled")]
    AlreadyEnabled,
    #[error("Stream already disabled")]
    AlreadyDisabled,
}

#[derive(Error, Debug)]
pub enum RunnerError {
    #[error("spawn failed: {program}: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },
    #[error("wait failed: {0}")]
    Wait(std::io::Error),
    #[error("terminate failed: {0}")]
    Terminate(std::io::Error),
}
