//! Stream registry.
//!
//! Maps every configured stream name to `Option<RunHandle>`: `None` means
//! disabled, `Some` means exactly one runner task owns that stream. Keys are
//! created once from config and never removed.
//!
//! `disable` only cancels the handle. The runner task clears its own entry
//! when it exits, so a following `enable` can never overlap with a runner that
//! is still shutting down.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::StreamConfig;
use crate::error::RegistryError;
use crate::runner::{run_stream, CaptureBackend, RunnerSettings};
use crate::shutdown::Shutdown;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamState {
    Enabled,
    Disabled,
}

impl StreamState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Enabled => "enabled",
            Self::Disabled => "disabled",
        }
    }

    pub fn is_enabled(self) -> bool {
        matches!(self, Self::Enabled)
    }
}

impl fmt::Display for StreamState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ownership of one in-flight runner.
struct RunHandle {
    generation: u64,
    cancel: CancellationToken,
}

pub struct StreamRegistry {
    streams: HashMap<String, Arc<StreamConfig>>,
    entries: RwLock<HashMap<String, Option<RunHandle>>>,
    backend: Arc<dyn CaptureBackend>,
    settings: RunnerSettings,
    video_dir: PathBuf,
    shutdown: Shutdown,
    next_generation: AtomicU64,
}

impl StreamRegistry {
    /// Creates a registry with every stream disabled.
    pub fn new(
        streams: impl IntoIterator<Item = StreamConfig>,
        backend: Arc<dyn CaptureBackend>,
        settings: RunnerSettings,
        video_dir: PathBuf,
        shutdown: Shutdown,
    ) -> Arc<Self> {
        let streams: HashMap<String, Arc<StreamConfig>> = streams
            .into_iter()
            .map(|s| (s.name.clone(), Arc::new(s)))
            .collect();
        let entries = streams.keys().map(|name| (name.clone(), None)).collect();

        Arc::new(Self {
            streams,
            entries: RwLock::new(entries),
            backend,
            settings,
            video_dir,
            shutdown,
            next_generation: AtomicU64::new(0),
        })
    }

    pub fn shutdown(&self) -> &Shutdown {
        &self.shutdown
    }

    pub fn video_dir(&self) -> &Path {
        &self.video_dir
    }

    /// Configured stream names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.streams.keys().cloned().collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.streams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.streams.is_empty()
    }

    /// Launches a runner for `name` and returns without waiting for the
    /// capture to start.
    pub async fn enable(self: &Arc<Self>, name: &str) -> Result<(), RegistryError> {
        let mut entries = self.entries.write().await;
        let entry = entries.get_mut(name).ok_or(RegistryError::NotFound)?;
        if entry.is_some() {
            return Err(RegistryError::AlreadyEnabled);
        }
        let stream = self
            .streams
            .get(name)
            .cloned()
            .ok_or(RegistryError::NotFound)?;

        let cancel = self.shutdown.child_token();
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        *entry = Some(RunHandle {
            generation,
            cancel: cancel.clone(),
        });

        let me = Arc::clone(self);
        self.shutdown.spawn(async move {
            run_stream(
                &stream,
                me.backend.as_ref(),
                &me.settings,
                &me.video_dir,
                &cancel,
            )
            .await;
            me.clear(&stream.name, generation).await;
        });

        info!(name, generation, backend = self.backend.name(), "Enabled stream");
        Ok(())
    }

    /// Requests the runner for `name` to stop. The entry flips to disabled
    /// once the runner has actually exited.
    pub async fn disable(&self, name: &str) -> Result<(), RegistryError> {
        let entries = self.entries.write().await;
        let entry = entries.get(name).ok_or(RegistryError::NotFound)?;
        let handle = entry.as_ref().ok_or(RegistryError::AlreadyDisabled)?;
        handle.cancel.cancel();

        info!(name, generation = handle.generation, "Disabling stream");
        Ok(())
    }

    pub async fn status(&self, name: &str) -> Result<StreamState, RegistryError> {
        let entries = self.entries.read().await;
        let entry = entries.get(name).ok_or(RegistryError::NotFound)?;
        Ok(state_of(entry))
    }

    /// Snapshot of every stream taken under a single read of the map.
    pub async fn list(&self) -> BTreeMap<String, StreamState> {
        let entries = self.entries.read().await;
        entries
            .iter()
            .map(|(name, entry)| (name.clone(), state_of(entry)))
            .collect()
    }

    async fn clear(&self, name: &str, generation: u64) {
        let mut entries = self.entries.write().await;
        if let Some(entry) = entries.get_mut(name) {
            if entry.as_ref().map(|h| h.generation) == Some(generation) {
                *entry = None;
                debug!(name, generation, "Cleared stream entry");
            }
        }
    }
}

fn state_of(entry: &Option<RunHandle>) -> StreamState {
    if entry.is_some() {
        StreamState::Enabled
    } else {
        StreamState::Disabled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RunnerError;
    use crate::runner::{CaptureOutcome, CaptureSession, CaptureStartArgs};
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    /// Captures that run until terminated.
    #[derive(Default)]
    struct HangingBackend {
        live: Arc<AtomicUsize>,
        starts: AtomicUsize,
    }

    struct HangingSession {
        live: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl CaptureBackend for HangingBackend {
        fn name(&self) -> &str {
            "hanging"
        }

        async fn start(
            &self,
            _args: &CaptureStartArgs,
        ) -> Result<Box<dyn CaptureSession>, RunnerError> {
            self.starts.fetch_add(1, Ordering::SeqCst);
            self.live.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(HangingSession {
                live: self.live.clone(),
            }))
        }
    }

    #[async_trait]
    impl CaptureSession for HangingSession {
        fn pid(&self) -> Option<u32> {
            None
        }

        async fn wait(&mut self) -> Result<CaptureOutcome, RunnerError> {
            std::future::pending().await
        }

        async fn terminate(&mut self, _grace: Duration) -> Result<(), RunnerError> {
            self.live.fetch_sub(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn registry(names: &[&str]) -> (Arc<StreamRegistry>, Arc<HangingBackend>) {
        let backend = Arc::new(HangingBackend::default());
        let settings = RunnerSettings {
            program: "fake".into(),
            args: vec!["{output}".into()],
            restart_delay: Duration::from_millis(10),
            kill_grace: Duration::from_millis(10),
        };
        let reg = StreamRegistry::new(
            names.iter().map(|n| StreamConfig::new(*n, format!("src-{n}"))),
            backend.clone(),
            settings,
            std::env::temp_dir(),
            Shutdown::new(),
        );
        (reg, backend)
    }

    async fn wait_for_state(reg: &StreamRegistry, name: &str, want: StreamState) {
        tokio::time::timeout(Duration::from_secs(2), async {
            while reg.status(name).await.unwrap() != want {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap_or_else(|_| panic!("{name} never became {want}"));
    }

    async fn wait_for_idle(reg: &StreamRegistry) {
        tokio::time::timeout(Duration::from_secs(2), async {
            while reg.shutdown().outstanding() != 0 {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("runner tasks should finish");
    }

    #[tokio::test]
    async fn test_all_streams_start_disabled() {
        let (reg, _) = registry(&["cam2", "cam1"]);
        let list = reg.list().await;
        assert_eq!(
            list.into_iter().collect::<Vec<_>>(),
            vec![
                ("cam1".to_string(), StreamState::Disabled),
                ("cam2".to_string(), StreamState::Disabled),
            ]
        );
        assert_eq!(reg.names(), vec!["cam1", "cam2"]);
    }

    #[tokio::test]
    async fn test_unknown_stream_is_not_found() {
        let (reg, _) = registry(&["cam1"]);
        assert_eq!(reg.enable("nope").await, Err(RegistryError::NotFound));
        assert_eq!(reg.disable("nope").await, Err(RegistryError::NotFound));
        assert_eq!(reg.status("nope").await, Err(RegistryError::NotFound));
    }

    #[tokio::test]
    async fn test_double_enable_is_rejected_and_keeps_runner() {
        let (reg, backend) = registry(&["cam1"]);
        reg.enable("cam1").await.unwrap();
        assert_eq!(reg.enable("cam1").await, Err(RegistryError::AlreadyEnabled));
        assert_eq!(reg.status("cam1").await.unwrap(), StreamState::Enabled);

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(backend.starts.load(Ordering::SeqCst), 1);
        assert_eq!(reg.shutdown().outstanding(), 1);
    }

    #[tokio::test]
    async fn test_disable_when_disabled_is_rejected() {
        let (reg, _) = registry(&["cam1"]);
        assert_eq!(reg.disable("cam1").await, Err(RegistryError::AlreadyDisabled));
    }

    #[tokio::test]
    async fn test_disable_eventually_reports_disabled() {
        let (reg, backend) = registry(&["cam1"]);
        reg.enable("cam1").await.unwrap();
        reg.disable("cam1").await.unwrap();

        wait_for_state(&reg, "cam1", StreamState::Disabled).await;
        assert_eq!(backend.live.load(Ordering::SeqCst), 0);
        wait_for_idle(&reg).await;
    }

    #[tokio::test]
    async fn test_reenable_after_disable_starts_fresh_runner() {
        let (reg, backend) = registry(&["cam1"]);
        for _ in 0..3 {
            reg.enable("cam1").await.unwrap();
            // Let the runner reach its capture before cancelling it.
            tokio::time::sleep(Duration::from_millis(20)).await;
            reg.disable("cam1").await.unwrap();
            wait_for_state(&reg, "cam1", StreamState::Disabled).await;
        }
        assert_eq!(backend.starts.load(Ordering::SeqCst), 3);
        assert_eq!(backend.live.load(Ordering::SeqCst), 0);
        assert_eq!(reg.list().await.len(), 1);
    }

    #[tokio::test]
    async fn test_root_shutdown_clears_every_stream() {
        let (reg, backend) = registry(&["cam1", "cam2", "cam3"]);
        for name in reg.names() {
            reg.enable(&name).await.unwrap();
        }
        tokio::time::sleep(Duration::from_millis(20)).await;

        reg.shutdown().trigger("test");
        tokio::time::timeout(Duration::from_secs(2), reg.shutdown().drained())
            .await
            .expect("runners should drain");

        assert!(reg.list().await.values().all(|s| *s == StreamState::Disabled));
        assert_eq!(backend.live.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_toggling_keeps_one_entry_per_stream() {
        let names: Vec<String> = (0..8).map(|i| format!("cam{i}")).collect();
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        let (reg, backend) = registry(&refs);

        let mut tasks = Vec::new();
        for name in names.clone() {
            let reg = reg.clone();
            tasks.push(tokio::spawn(async move {
                for _ in 0..25 {
                    let _ = reg.enable(&name).await;
                    tokio::task::yield_now().await;
                    let _ = reg.disable(&name).await;
                }
            }));
        }
        tokio::time::timeout(Duration::from_secs(10), async {
            for t in tasks {
                t.await.unwrap();
            }
        })
        .await
        .expect("toggling different streams must not block");

        for name in &names {
            if reg.status(name).await.unwrap().is_enabled() {
                let _ = reg.disable(name).await;
            }
            wait_for_state(&reg, name, StreamState::Disabled).await;
        }

        let list = reg.list().await;
        assert_eq!(list.len(), names.len());
        assert_eq!(backend.live.load(Ordering::SeqCst), 0);
        wait_for_idle(&reg).await;
    }
}
