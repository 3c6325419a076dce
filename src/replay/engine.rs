use std::sync::Arc;
use std::time::Duration;

use log::{info, warn};
use tokio_util::sync::CancellationToken;

use crate::desktops::DesktopMapper;
use crate::models::{Configuration, WindowRecord};
use crate::platform::{WindowHandle, WindowSystem};

use super::{FailureReason, RecordOutcome, RecordReport, ReplayReport};

#[derive(Debug, Clone, Copy)]
pub struct ReplayOptions {
    /// How long a relaunched process gets to open its first window.
    pub launch_timeout: Duration,
    pub poll_interval: Duration,
}

impl Default for ReplayOptions {
    fn default() -> Self {
        Self {
            launch_timeout: Duration::from_secs(10),
            poll_interval: Duration::from_millis(250),
        }
    }
}

#[derive(Clone)]
pub struct ReplayEngine {
    system: Arc<dyn WindowSystem>,
    mapper: DesktopMapper,
    options: ReplayOptions,
}

impl ReplayEngine {
    pub fn new(system: Arc<dyn WindowSystem>) -> Self {
        Self::with_options(system, ReplayOptions::default())
    }

    pub fn with_options(system: Arc<dyn WindowSystem>, options: ReplayOptions) -> Self {
        let mapper = DesktopMapper::new(system.clone());
        Self {
            system,
            mapper,
            options,
        }
    }

    /// Restore every record of the configuration, in stored order.
    ///
    /// Failures stay local to their record and never abort the batch.
    /// Cancellation takes effect between records; a record mid-relaunch
    /// completes and the rest are reported as [`RecordOutcome::Pending`].
    pub async fn run(&self, config: &Configuration, cancel: &CancellationToken) -> ReplayReport {
        let mut records = Vec::with_capacity(config.windows.len());

        for window in &config.windows {
            let outcome = if cancel.is_cancelled() {
                info!("Replay of {} cancelled; skipping '{}'", config.id, window.title);
                RecordOutcome::Pending
            } else {
                self.restore_record(window).await
            };

            records.push(RecordReport {
                title: window.title.clone(),
                executable_path: window.executable_path.clone(),
                outcome,
            });
        }

        ReplayReport {
            config_id: config.id.clone(),
            records,
        }
    }

    async fn restore_record(&self, record: &WindowRecord) -> RecordOutcome {
        if !record.replayable() {
            return RecordOutcome::Failed(FailureReason::LaunchFailed(
                "no executable path was captured for this window".into(),
            ));
        }

        let target_desktop = self.mapper.clamp(record.desktop_index);

        // Prefer a window that is already live over spawning a second copy.
        if let Some(handle) = self.find_live_match(record) {
            return match self.system.move_to_desktop(handle, target_desktop) {
                Ok(()) => RecordOutcome::MatchedExisting,
                Err(err) => RecordOutcome::Failed(FailureReason::PlacementDenied(err.to_string())),
            };
        }

        let process_id = match self.system.launch(&record.executable_path) {
            Ok(process_id) => process_id,
            Err(err) => {
                warn!("Launch of {} failed: {err:#}", record.executable_path);
                return RecordOutcome::Failed(FailureReason::LaunchFailed(err.to_string()));
            }
        };

        let Some(handle) = self.await_window(process_id).await else {
            return RecordOutcome::Failed(FailureReason::LaunchFailed(format!(
                "process {process_id} exited or opened no window within {:?}",
                self.options.launch_timeout
            )));
        };

        match self.system.move_to_desktop(handle, target_desktop) {
            Ok(()) => RecordOutcome::Placed,
            // Only the placement failed; the freshly launched process is
            // left running.
            Err(err) => RecordOutcome::Failed(FailureReason::PlacementDenied(err.to_string())),
        }
    }

    /// A live window whose executable path and class both match the stored
    /// record. Titles and process ids are not stable across runs and are
    /// deliberately ignored.
    fn find_live_match(&self, record: &WindowRecord) -> Option<WindowHandle> {
        let live = self.system.list_windows().ok()?;
        live.iter()
            .find(|w| {
                w.executable_path.as_deref() == Some(record.executable_path.as_str())
                    && w.class_name == record.class_name
            })
            .map(|w| w.handle)
    }

    /// Poll for the first window owned by the launched process, giving up
    /// early when the process exits without opening one.
    async fn await_window(&self, process_id: u32) -> Option<WindowHandle> {
        let deadline = tokio::time::Instant::now() + self.options.launch_timeout;

        loop {
            if let Ok(windows) = self.system.list_windows() {
                if let Some(window) = windows.iter().find(|w| w.process_id == process_id) {
                    return Some(window.handle);
                }
            }

            if !self.system.process_alive(process_id) {
                return None;
            }
            if tokio::time::Instant::now() >= deadline {
                return None;
            }
            tokio::time::sleep(self.options.poll_interval).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::models::ConfigId;
    use crate::platform::fake::{FakeExecutable, FakeWindowSystem};

    fn fast_options() -> ReplayOptions {
        ReplayOptions {
            launch_timeout: Duration::from_millis(100),
            poll_interval: Duration::from_millis(5),
        }
    }

    fn record(title: &str, executable_path: &str, class_name: &str, desktop_index: u32) -> WindowRecord {
        WindowRecord {
            title: title.into(),
            executable_path: executable_path.into(),
            process_id: 101,
            class_name: class_name.into(),
            desktop_index,
        }
    }

    fn config(windows: Vec<WindowRecord>) -> Configuration {
        Configuration {
            id: ConfigId::from("cfg-1"),
            windows,
            saved_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn live_match_is_moved_not_relaunched() {
        let fake = Arc::new(FakeWindowSystem::new(3));
        let handle = fake.add_window("Editor", "EditorWnd", "/bin/editor", 2);
        let engine = ReplayEngine::with_options(fake.clone(), fast_options());

        let report = engine
            .run(
                &config(vec![record("Editor", "/bin/editor", "EditorWnd", 1)]),
                &CancellationToken::new(),
            )
            .await;

        assert_eq!(report.records[0].outcome, RecordOutcome::MatchedExisting);
        assert!(fake.launched().is_empty());
        assert_eq!(fake.desktop_of(handle), Some(1));
        assert!(report.fully_restored());
    }

    #[tokio::test]
    async fn relaunch_places_window_on_clamped_desktop() {
        let fake = Arc::new(FakeWindowSystem::new(2));
        fake.register_executable(
            "/bin/terminal",
            FakeExecutable {
                title: "Terminal".into(),
                class_name: "TermWnd".into(),
                opens_window: true,
            },
        );
        let engine = ReplayEngine::with_options(fake.clone(), fast_options());

        // Desktop 7 no longer exists; only 0 and 1 do.
        let report = engine
            .run(
                &config(vec![record("Terminal", "/bin/terminal", "TermWnd", 7)]),
                &CancellationToken::new(),
            )
            .await;

        assert_eq!(report.records[0].outcome, RecordOutcome::Placed);
        assert_eq!(fake.launched(), vec!["/bin/terminal".to_string()]);

        let moves = fake.moves();
        assert_eq!(moves.len(), 1);
        assert_eq!(moves[0].1, 1, "desktop 7 should clamp to the last desktop");
    }

    #[tokio::test]
    async fn one_failure_does_not_abort_the_batch() {
        let fake = Arc::new(FakeWindowSystem::new(1));
        fake.add_window("Editor", "EditorWnd", "/bin/editor", 0);
        let engine = ReplayEngine::with_options(fake.clone(), fast_options());

        let report = engine
            .run(
                &config(vec![
                    record("Ghost", "/bin/ghost", "GhostWnd", 0),
                    record("Editor", "/bin/editor", "EditorWnd", 0),
                ]),
                &CancellationToken::new(),
            )
            .await;

        assert!(matches!(
            report.records[0].outcome,
            RecordOutcome::Failed(FailureReason::LaunchFailed(_))
        ));
        assert_eq!(report.records[1].outcome, RecordOutcome::MatchedExisting);
        assert_eq!(report.failed_count(), 1);
        assert!(!report.fully_restored());
    }

    #[tokio::test]
    async fn capture_only_record_fails_as_launch_failed() {
        let fake = Arc::new(FakeWindowSystem::new(1));
        let engine = ReplayEngine::with_options(fake.clone(), fast_options());

        let report = engine
            .run(
                &config(vec![record("Tray", "", "TrayWnd", 0)]),
                &CancellationToken::new(),
            )
            .await;

        assert!(matches!(
            report.records[0].outcome,
            RecordOutcome::Failed(FailureReason::LaunchFailed(_))
        ));
        assert!(fake.launched().is_empty());
    }

    #[tokio::test]
    async fn denied_placement_keeps_the_launched_process() {
        let fake = Arc::new(FakeWindowSystem::new(1));
        fake.register_executable(
            "/bin/editor",
            FakeExecutable {
                title: "Editor".into(),
                class_name: "EditorWnd".into(),
                opens_window: true,
            },
        );
        fake.deny_moves();
        let engine = ReplayEngine::with_options(fake.clone(), fast_options());

        let report = engine
            .run(
                &config(vec![record("Editor", "/bin/editor", "EditorWnd", 0)]),
                &CancellationToken::new(),
            )
            .await;

        assert!(matches!(
            report.records[0].outcome,
            RecordOutcome::Failed(FailureReason::PlacementDenied(_))
        ));
        // The process was launched and is not cleaned up on failure.
        assert_eq!(fake.launched().len(), 1);
    }

    #[tokio::test]
    async fn process_that_opens_no_window_fails_quickly() {
        let fake = Arc::new(FakeWindowSystem::new(1));
        fake.register_executable(
            "/bin/daemon",
            FakeExecutable {
                title: "Daemon".into(),
                class_name: "DaemonWnd".into(),
                opens_window: false,
            },
        );
        let engine = ReplayEngine::with_options(fake.clone(), fast_options());

        let report = engine
            .run(
                &config(vec![record("Daemon", "/bin/daemon", "DaemonWnd", 0)]),
                &CancellationToken::new(),
            )
            .await;

        assert!(matches!(
            report.records[0].outcome,
            RecordOutcome::Failed(FailureReason::LaunchFailed(_))
        ));
    }

    #[tokio::test]
    async fn cancelled_run_reports_remaining_records_as_pending() {
        let fake = Arc::new(FakeWindowSystem::new(1));
        let engine = ReplayEngine::with_options(fake.clone(), fast_options());

        let cancel = CancellationToken::new();
        cancel.cancel();

        let report = engine
            .run(
                &config(vec![
                    record("Editor", "/bin/editor", "EditorWnd", 0),
                    record("Browser", "/bin/browser", "BrowserWnd", 0),
                ]),
                &cancel,
            )
            .await;

        assert!(report
            .records
            .iter()
            .all(|r| r.outcome == RecordOutcome::Pending));
        assert!(fake.launched().is_empty());
    }
}
