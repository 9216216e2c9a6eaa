use std::process::Stdio;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::process::{Child, Command};
use tracing::{debug, warn};

use crate::error::RunnerError;

use super::traits::{CaptureBackend, CaptureSession};
use super::types::{CaptureOutcome, CaptureStartArgs};

/// Runs the capture tool as a local subprocess in its own process group.
#[derive(Debug, Default)]
pub struct ProcessBackend {}

impl ProcessBackend {
    pub fn new() -> Self {
        Self {}
    }
}

#[async_trait]
impl CaptureBackend for ProcessBackend {
    fn name(&self) -> &str {
        "process"
    }

    async fn start(&self, args: &CaptureStartArgs) -> Result<Box<dyn CaptureSession>, RunnerError> {
        let mut cmd = Command::new(&args.program);
        cmd.args(&args.args)
            .current_dir(&args.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true);

        // The tool may fork helpers; signalling the group reaches all of them.
        #[cfg(unix)]
        cmd.process_group(0);

        let child = cmd.spawn().map_err(|source| RunnerError::Spawn {
            program: args.program.clone(),
            source,
        })?;
        debug!(pid = ?child.id(), program = %args.program, "Spawned capture process");

        Ok(Box::new(ProcessSession {
            child,
            started: Instant::now(),
        }))
    }
}

struct ProcessSession {
    child: Child,
    started: Instant,
}

#[async_trait]
impl CaptureSession for ProcessSession {
    fn pid(&self) -> Option<u32> {
        self.child.id()
    }

    async fn wait(&mut self) -> Result<CaptureOutcome, RunnerError> {
        let status = self.child.wait().await.map_err(RunnerError::Wait)?;

        #[cfg(unix)]
        let signal = std::os::unix::process::ExitStatusExt::signal(&status);
        #[cfg(not(unix))]
        let signal = None;

        Ok(CaptureOutcome {
            success: status.success(),
            exit_code: status.code(),
            signal,
            duration_ms: self.started.elapsed().as_millis() as u64,
        })
    }

    async fn terminate(&mut self, grace: Duration) -> Result<(), RunnerError> {
        // Already reaped.
        let Some(pid) = self.child.id() else {
            return Ok(());
        };

        #[cfg(unix)]
        {
            signal_group(pid, libc::SIGTERM);
            match tokio::time::timeout(grace, self.child.wait()).await {
                Ok(res) => {
                    res.map_err(RunnerError::Wait)?;
                    return Ok(());
                }
                Err(_) => {
                    warn!(pid, grace_ms = grace.as_millis() as u64, "Capture ignored SIGTERM, killing");
                    signal_group(pid, libc::SIGKILL);
                }
            }
        }
        #[cfg(not(unix))]
        let _ = (pid, grace);

        self.child.kill().await.map_err(RunnerError::Terminate)
    }
}

#[cfg(unix)]
fn signal_group(pgid: u32, sig: libc::c_int) {
    let rc = unsafe { libc::kill(-(pgid as libc::pid_t), sig) };
    if rc != 0 {
        debug!(pgid, sig, error = %std::io::Error::last_os_error(), "Signalling process group failed");
    }
}
