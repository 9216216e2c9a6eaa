use std::path::Path;

use chrono::Local;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::StreamConfig;

use super::segment::segment_path;
use super::traits::CaptureBackend;
use super::types::RunnerSettings;

/// Keeps one stream's capture alive until `token` is cancelled.
///
/// Every exit that is not caused by cancellation (non-zero status, clean
/// exit, failure to launch) is followed by a fixed `restart_delay` and a fresh
/// attempt writing to a new segment. There is no retry cap. Cancellation
/// during a capture terminates it; cancellation during the delay ends the
/// loop immediately.
pub async fn run_stream(
    stream: &StreamConfig,
    backend: &dyn CaptureBackend,
    settings: &RunnerSettings,
    video_dir: &Path,
    token: &CancellationToken,
) {
    let name = stream.name.as_str();

    while !token.is_cancelled() {
        let output = segment_path(video_dir, name, Local::now()).await;
        info!(
            name,
            source = %stream.source,
            destination = %output.display(),
            "Starting stream"
        );

        let args = settings.start_args(&stream.source, &output, video_dir);
        match backend.start(&args).await {
            Ok(mut session) => {
                debug!(name, pid = ?session.pid(), "Capture running");
                tokio::select! {
                    _ = token.cancelled() => {
                        if let Err(e) = session.terminate(settings.kill_grace).await {
                            warn!(name, error = %e, "Failed to terminate capture");
                        }
                        break;
                    }
                    res = session.wait() => {
                        if token.is_cancelled() {
                            break;
                        }
                        match res {
                            Ok(outcome) if outcome.success => {
                                warn!(name, duration_ms = outcome.duration_ms, "Stream exited without error, will restart");
                            }
                            Ok(outcome) => {
                                warn!(
                                    name,
                                    exit_code = ?outcome.exit_code,
                                    signal = ?outcome.signal,
                                    duration_ms = outcome.duration_ms,
                                    "Stream exited with error, will restart"
                                );
                            }
                            Err(e) => {
                                warn!(name, error = %e, "Stream exited with error, will restart");
                            }
                        }
                    }
                }
            }
            Err(e) => {
                warn!(name, error = %e, "Stream failed to start, will restart");
            }
        }

        tokio::select! {
            _ = token.cancelled() => break,
            _ = tokio::time::sleep(settings.restart_delay) => {}
        }
    }

    info!(name, "Stopped stream");
}
