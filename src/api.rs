//! Boundary operations the desktop shell invokes.

use std::path::PathBuf;
use std::sync::Arc;

use log::info;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::enumerator::WindowEnumerator;
use crate::error::Error;
use crate::models::{ConfigId, ConfigSummary, WindowRecord, WindowSnapshot};
use crate::platform::{native_window_system, WindowSystem};
use crate::replay::{ReplayEngine, ReplayOptions, ReplayReport};
use crate::store::ConfigStore;

/// The engine behind the UI's invoke boundary.
///
/// Stateless between calls apart from the durable catalog: every operation
/// is self-contained given its arguments, so an unsaved snapshot lives on
/// the caller's side and is passed back in full to [`Backend::save_config`].
pub struct Backend {
    enumerator: WindowEnumerator,
    store: ConfigStore,
    replay: ReplayEngine,
    active_replay: Mutex<Option<CancellationToken>>,
}

impl Backend {
    pub fn new(data_dir: PathBuf, system: Arc<dyn WindowSystem>) -> Result<Self, Error> {
        Self::with_replay_options(data_dir, system, ReplayOptions::default())
    }

    pub fn with_replay_options(
        data_dir: PathBuf,
        system: Arc<dyn WindowSystem>,
        options: ReplayOptions,
    ) -> Result<Self, Error> {
        Ok(Self {
            enumerator: WindowEnumerator::new(system.clone()),
            store: ConfigStore::new(data_dir)?,
            replay: ReplayEngine::with_options(system, options),
            active_replay: Mutex::new(None),
        })
    }

    /// Native OS window system and the default per-user catalog location.
    pub fn native() -> Result<Self, Error> {
        let data_dir = crate::default_data_dir().ok_or_else(|| {
            Error::StoreWriteFailed("no application data directory on this platform".into())
        })?;
        Self::new(data_dir, native_window_system()?)
    }

    /// Snapshot the currently open windows. The snapshot is unsaved; pass
    /// its window list to [`Backend::save_config`] to persist it.
    pub async fn enumerate_windows(&self) -> Result<WindowSnapshot, Error> {
        let enumerator = self.enumerator.clone();
        let windows = tokio::task::spawn_blocking(move || enumerator.enumerate())
            .await
            .map_err(|err| {
                Error::EnumerationUnavailable(format!("enumeration task failed: {err}"))
            })??;

        Ok(WindowSnapshot { id: None, windows })
    }

    /// Persist a snapshot, minting an id when `id` is `None`. Returns the
    /// authoritative id for subsequent saves and starts.
    pub async fn save_config(
        &self,
        id: Option<ConfigId>,
        windows: Vec<WindowRecord>,
    ) -> Result<ConfigId, Error> {
        self.store.save(id, windows).await
    }

    pub async fn list_configs(&self) -> Result<Vec<ConfigSummary>, Error> {
        self.store.list().await
    }

    pub async fn delete_config(&self, id: &ConfigId) -> Result<(), Error> {
        self.store.delete(id).await
    }

    /// Restore a saved configuration. Fails with [`Error::NotFound`] before
    /// touching any process when the id is unknown; otherwise always
    /// returns a per-record report, partial failures included.
    pub async fn start_config(&self, id: &ConfigId) -> Result<ReplayReport, Error> {
        let config = self.store.load(id).await?;
        info!(
            "Starting configuration {} ({} windows)",
            config.id,
            config.windows.len()
        );

        let cancel = CancellationToken::new();
        {
            let mut active = self.active_replay.lock().await;
            // A new start supersedes a replay that is still running.
            if let Some(previous) = active.replace(cancel.clone()) {
                previous.cancel();
            }
        }

        Ok(self.replay.run(&config, &cancel).await)
    }

    /// Best-effort cancellation of the replay in flight: the record being
    /// restored completes, the rest are reported as pending.
    pub async fn cancel_replay(&self) {
        if let Some(token) = self.active_replay.lock().await.take() {
            token.cancel();
            info!("Replay cancellation requested");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tempfile::tempdir;

    use super::*;
    use crate::platform::fake::{FakeExecutable, FakeWindowSystem};
    use crate::replay::RecordOutcome;

    fn fast_options() -> ReplayOptions {
        ReplayOptions {
            launch_timeout: Duration::from_millis(100),
            poll_interval: Duration::from_millis(5),
        }
    }

    fn backend(fake: Arc<FakeWindowSystem>, dir: &std::path::Path) -> Backend {
        Backend::with_replay_options(dir.to_path_buf(), fake, fast_options()).unwrap()
    }

    #[tokio::test]
    async fn fresh_snapshot_is_unsaved() {
        let dir = tempdir().unwrap();
        let fake = Arc::new(FakeWindowSystem::new(2));
        fake.add_window("Editor", "EditorWnd", "/bin/editor", 1);

        let snapshot = backend(fake, dir.path()).enumerate_windows().await.unwrap();
        assert!(snapshot.id.is_none());
        assert_eq!(snapshot.windows.len(), 1);
        assert_eq!(snapshot.windows[0].desktop_index, 1);
    }

    #[tokio::test]
    async fn start_unknown_config_launches_nothing() {
        let dir = tempdir().unwrap();
        let fake = Arc::new(FakeWindowSystem::new(1));
        let backend = backend(fake.clone(), dir.path());

        let err = backend
            .start_config(&ConfigId::from("missing"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
        assert!(fake.launched().is_empty());
    }

    #[tokio::test]
    async fn capture_save_start_round_trip() {
        let dir = tempdir().unwrap();
        let fake = Arc::new(FakeWindowSystem::new(2));
        fake.add_window("Editor", "EditorWnd", "/bin/editor", 0);
        fake.register_executable(
            "/bin/editor",
            FakeExecutable {
                title: "Editor".into(),
                class_name: "EditorWnd".into(),
                opens_window: true,
            },
        );
        let backend = backend(fake.clone(), dir.path());

        let snapshot = backend.enumerate_windows().await.unwrap();
        let id = backend.save_config(None, snapshot.windows).await.unwrap();

        let summaries = backend.list_configs().await.unwrap();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].id, id);

        // The captured window is still live, so replay matches instead of
        // launching a second copy.
        let report = backend.start_config(&id).await.unwrap();
        assert_eq!(report.records[0].outcome, RecordOutcome::MatchedExisting);
        assert!(fake.launched().is_empty());

        backend.delete_config(&id).await.unwrap();
        assert!(backend.list_configs().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn enumeration_failure_is_surfaced_not_empty_success() {
        let dir = tempdir().unwrap();
        let fake = Arc::new(FakeWindowSystem::new(1));
        fake.fail_enumeration();

        let err = backend(fake, dir.path())
            .enumerate_windows()
            .await
            .unwrap_err();
        assert!(matches!(err, Error::EnumerationUnavailable(_)));
    }
}
