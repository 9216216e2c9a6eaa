use std::collections::BTreeMap;
use std::net::IpAddr;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Placeholder in `capture.args` replaced with the stream's source locator.
pub const SOURCE_PLACEHOLDER: &str = "{source}";
/// Placeholder in `capture.args` replaced with the segment path of the attempt.
pub const OUTPUT_PLACEHOLDER: &str = "{output}";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Shared bearer secret required on every control request.
    pub secret: String,

    /// Stream name -> capture settings. Fixed for the life of the process.
    #[serde(default)]
    pub streams: BTreeMap<String, StreamConfig>,

    #[serde(default)]
    pub http: HttpConfig,

    #[serde(default)]
    pub capture: CaptureConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    /// Where segments are written. Defaults to `<user cache dir>/surf-vcr`.
    #[serde(default)]
    pub video_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamConfig {
    /// Filled in from the table key after parsing.
    #[serde(default, skip_serializing)]
    pub name: String,

    /// Opaque locator handed to the capture tool.
    pub source: String,
}

impl StreamConfig {
    pub fn new(name: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: source.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_http_host")]
    pub host: String,

    #[serde(default = "default_http_port")]
    pub port: u16,
}

fn default_http_host() -> String {
    "127.0.0.1".to_string()
}

fn default_http_port() -> u16 {
    31930
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: default_http_host(),
            port: default_http_port(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureConfig {
    /// Capture tool binary, resolved through `PATH`.
    #[serde(default = "default_capture_program")]
    pub program: String,

    /// Argument template; `{source}` and `{output}` are substituted per attempt.
    #[serde(default = "default_capture_args")]
    pub args: Vec<String>,

    /// Fixed delay between a capture exiting and the next attempt.
    #[serde(default = "default_restart_delay_secs")]
    pub restart_delay_secs: u64,

    /// How long a cancelled capture gets after SIGTERM before SIGKILL.
    #[serde(default = "default_kill_grace_ms")]
    pub kill_grace_ms: u64,
}

fn default_capture_program() -> String {
    "gst-launch-1.0".to_string()
}

fn default_capture_args() -> Vec<String> {
    vec![
        SOURCE_PLACEHOLDER.to_string(),
        "!".to_string(),
        "hlsdemux".to_string(),
        "!".to_string(),
        "filesink".to_string(),
        format!("location={OUTPUT_PLACEHOLDER}"),
    ]
}

fn default_restart_delay_secs() -> u64 {
    10
}

fn default_kill_grace_ms() -> u64 {
    3000
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            program: default_capture_program(),
            args: default_capture_args(),
            restart_delay_secs: default_restart_delay_secs(),
            kill_grace_ms: default_kill_grace_ms(),
        }
    }
}

impl CaptureConfig {
    pub fn restart_delay(&self) -> Duration {
        Duration::from_secs(self.restart_delay_secs)
    }

    pub fn kill_grace(&self) -> Duration {
        Duration::from_millis(self.kill_grace_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_logging_enabled")]
    pub enabled: bool,

    /// If true, log to stderr.
    #[serde(default = "default_logging_console")]
    pub console: bool,

    /// If true, log to a file under `directory` (or OS temp dir if unset).
    #[serde(default)]
    pub file: bool,

    /// EnvFilter string, e.g. "info" or "surf_vcr_core=debug".
    #[serde(default = "default_logging_level")]
    pub level: String,

    /// Optional directory for log files. If empty or unset, uses OS temp dir.
    #[serde(default)]
    pub directory: Option<String>,
}

fn default_logging_enabled() -> bool {
    true
}

fn default_logging_console() -> bool {
    true
}

fn default_logging_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: default_logging_enabled(),
            console: default_logging_console(),
            file: false,
            level: default_logging_level(),
            directory: None,
        }
    }
}

impl AppConfig {
    /// Minimal config for a set of `(name, source)` pairs; everything else defaulted.
    pub fn with_streams<I, N, S>(secret: impl Into<String>, streams: I) -> Self
    where
        I: IntoIterator<Item = (N, S)>,
        N: Into<String>,
        S: Into<String>,
    {
        let streams = streams
            .into_iter()
            .map(|(name, source)| {
                let name = name.into();
                (name.clone(), StreamConfig::new(name, source))
            })
            .collect();

        Self {
            secret: secret.into(),
            streams,
            http: HttpConfig::default(),
            capture: CaptureConfig::default(),
            logging: LoggingConfig::default(),
            video_dir: None,
        }
    }

    /// Copies table keys into `StreamConfig::name` and checks every field the
    /// supervisor relies on.
    pub fn validate(&mut self) -> Result<(), ConfigError> {
        if self.secret.trim().is_empty() {
            return Err(ConfigError::Invalid("secret must not be empty".into()));
        }

        for (name, stream) in self.streams.iter_mut() {
            validate_stream_name(name)?;
            if stream.source.trim().is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "stream {name:?} has an empty source"
                )));
            }
            stream.name = name.clone();
        }

        if self.capture.program.trim().is_empty() {
            return Err(ConfigError::Invalid("capture.program must not be empty".into()));
        }
        if !self
            .capture
            .args
            .iter()
            .any(|a| a.contains(OUTPUT_PLACEHOLDER))
        {
            return Err(ConfigError::Invalid(format!(
                "capture.args must reference {OUTPUT_PLACEHOLDER}"
            )));
        }

        let ip: IpAddr = self.http.host.parse().map_err(|_| {
            ConfigError::Invalid(format!("http.host {:?} is not an IP address", self.http.host))
        })?;
        if !ip.is_loopback() {
            return Err(ConfigError::Invalid(format!(
                "http.host {ip} is not a loopback address"
            )));
        }

        Ok(())
    }
}

// Names end up in segment file names, so they must stay a single path component.
fn validate_stream_name(name: &str) -> Result<(), ConfigError> {
    if name.trim().is_empty()
        || name == "."
        || name.contains("..")
        || name.contains('/')
        || name.contains('\\')
    {
        return Err(ConfigError::Invalid(format!(
            "stream name {name:?} is not usable as a file name prefix"
        )));
    }
    Ok(())
}
