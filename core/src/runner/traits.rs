use std::time::Duration;

use async_trait::async_trait;

use crate::error::RunnerError;

use super::types::{CaptureOutcome, CaptureStartArgs};

/// One running capture attempt.
#[async_trait]
pub trait CaptureSession: Send {
    fn pid(&self) -> Option<u32>;
    /// Resolves when the capture exits on its own. Must be cancel-safe.
    async fn wait(&mut self) -> Result<CaptureOutcome, RunnerError>;
    /// Stops the capture, escalating to a hard kill after `grace`, and reaps it.
    async fn terminate(&mut self, grace: Duration) -> Result<(), RunnerError>;
}

#[async_trait]
pub trait CaptureBackend: Send + Sync {
    fn name(&self) -> &str;
    async fn start(&self, args: &CaptureStartArgs) -> Result<Box<dyn CaptureSession>, RunnerError>;
}
