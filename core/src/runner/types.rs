use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::config::{CaptureConfig, OUTPUT_PLACEHOLDER, SOURCE_PLACEHOLDER};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureStartArgs {
    pub program: String,
    pub args: Vec<String>,
    pub working_dir: PathBuf,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaptureOutcome {
    pub success: bool,
    pub exit_code: Option<i32>,
    /// Terminating signal, when the platform reports one.
    pub signal: Option<i32>,
    pub duration_ms: u64,
}

impl CaptureOutcome {
    pub fn failed(exit_code: i32) -> Self {
        Self {
            success: false,
            exit_code: Some(exit_code),
            ..Self::default()
        }
    }

    pub fn succeeded() -> Self {
        Self {
            success: true,
            exit_code: Some(0),
            ..Self::default()
        }
    }
}

/// Capture settings shared by every runner of one supervisor.
#[derive(Debug, Clone)]
pub struct RunnerSettings {
    pub program: String,
    pub args: Vec<String>,
    pub restart_delay: Duration,
    pub kill_grace: Duration,
}

impl RunnerSettings {
    pub fn from_config(cfg: &CaptureConfig) -> Self {
        Self {
            program: cfg.program.clone(),
            args: cfg.args.clone(),
            restart_delay: cfg.restart_delay(),
            kill_grace: cfg.kill_grace(),
        }
    }

    /// Expands the argument template for one attempt.
    pub fn start_args(&self, source: &str, output: &Path, working_dir: &Path) -> CaptureStartArgs {
        let output = output.to_string_lossy();
        let args = self
            .args
            .iter()
            .map(|a| {
                a.replace(SOURCE_PLACEHOLDER, source)
                    .replace(OUTPUT_PLACEHOLDER, &output)
            })
            .collect();

        CaptureStartArgs {
            program: self.program.clone(),
            args,
            working_dir: working_dir.to_path_buf(),
        }
    }
}

impl Default for RunnerSettings {
    fn default() -> Self {
        Self::from_config(&CaptureConfig::default())
    }
}
