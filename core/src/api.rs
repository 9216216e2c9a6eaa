//! Stable re-exports for consumers (`cli` and external crates).
//!
//! Prefer importing from `surf_vcr_core::api` instead of reaching into internal modules.

pub use crate::config::{
    ensure_video_dir, load_default, load_from_path, AppConfig, CaptureConfig, HttpConfig,
    LoggingConfig, StreamConfig,
};
pub use crate::error::{CliError, ConfigError, RegistryError, RunnerError};
pub use crate::registry::{StreamRegistry, StreamState};
pub use crate::runner::{
    run_stream, segment_path, CaptureBackend, CaptureOutcome, CaptureSession, CaptureStartArgs,
    ProcessBackend, RunnerSettings,
};
pub use crate::shutdown::{wait_for_signal, Shutdown};
