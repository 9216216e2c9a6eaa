//! Shutdown coordination.
//!
//! A single root [`CancellationToken`] fans out to every stream runner through
//! child tokens, and a [`TaskTracker`] counts runner tasks still in flight.
//! [`Shutdown::drained`] resolves only once the root has been cancelled *and*
//! every tracked runner has returned; the hosting process must not exit
//! before that. There is no internal deadline: the service manager is
//! expected to hard-kill us if draining takes too long.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::info;

#[derive(Clone, Debug, Default)]
pub struct Shutdown {
    root: CancellationToken,
    tracker: TaskTracker,
    triggered: Arc<AtomicBool>,
}

impl Shutdown {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fresh token that is cancelled whenever the root is.
    pub fn child_token(&self) -> CancellationToken {
        self.root.child_token()
    }

    pub fn is_triggered(&self) -> bool {
        self.root.is_cancelled()
    }

    /// Cancels the root token. Only the first call has any effect.
    pub fn trigger(&self, reason: &str) {
        if self.triggered.swap(true, Ordering::SeqCst) {
            return;
        }
        info!(reason, "Shutting down...");
        self.root.cancel();
    }

    /// Resolves once [`Shutdown::trigger`] has been called.
    pub async fn cancelled(&self) {
        self.root.cancelled().await
    }

    /// Spawns `fut` on the runtime and counts it as outstanding until it returns.
    pub fn spawn<F>(&self, fut: F) -> JoinHandle<F::Output>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        self.tracker.spawn(fut)
    }

    /// Number of tracked tasks that have not finished yet.
    pub fn outstanding(&self) -> usize {
        self.tracker.len()
    }

    pub async fn drained(&self) {
        self.root.cancelled().await;
        self.tracker.close();
        self.tracker.wait().await;
    }
}

/// Waits for a termination signal.
///
/// Returns `Ok(())` when any signal is received, or `Err` if signal registration fails.
#[cfg(unix)]
pub async fn wait_for_signal() -> std::io::Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigquit = signal(SignalKind::quit())?;

    tokio::select! {
        _ = sigint.recv()  => info!("Received SIGINT"),
        _ = sigterm.recv() => info!("Received SIGTERM"),
        _ = sigquit.recv() => info!("Received SIGQUIT"),
    }
    Ok(())
}

#[cfg(not(unix))]
pub async fn wait_for_signal() -> std::io::Result<()> {
    tokio::signal::ctrl_c().await?;
    info!("Received Ctrl+C");
    Ok(())
}
