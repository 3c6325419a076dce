use std::path::{Path, PathBuf};
use std::sync::{mpsc, Arc, Mutex};
use std::thread::{self, JoinHandle};

use chrono::Utc;
use log::{error, info};
use tokio::sync::oneshot;

mod catalog;

use catalog::Catalog;

use crate::error::Error;
use crate::models::{ConfigId, ConfigSummary, Configuration, WindowRecord};

type StoreTask = Box<dyn FnOnce(&mut Catalog) + Send + 'static>;

enum StoreCommand {
    Execute(StoreTask),
    Shutdown,
}

struct StoreInner {
    sender: mpsc::Sender<StoreCommand>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl Drop for StoreInner {
    fn drop(&mut self) {
        let mut guard = match self.worker.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        if let Some(handle) = guard.take() {
            if let Err(err) = self.sender.send(StoreCommand::Shutdown) {
                error!("Failed to send shutdown to store thread: {err}");
            }
            if let Err(join_err) = handle.join() {
                error!("Failed to join store thread: {join_err:?}");
            }
        }
    }
}

/// Durable catalog of saved window configurations.
///
/// A dedicated worker thread owns the on-disk catalog and executes all
/// operations in submission order, which serializes concurrent saves to
/// the same id (last writer wins, each write individually atomic).
#[derive(Clone)]
pub struct ConfigStore {
    inner: Arc<StoreInner>,
    dir: Arc<PathBuf>,
}

impl ConfigStore {
    pub fn new(dir: PathBuf) -> Result<Self, Error> {
        let (command_tx, command_rx) = mpsc::channel::<StoreCommand>();
        let (ready_tx, ready_rx) = mpsc::channel();
        let dir_for_thread = dir.clone();

        let worker = thread::Builder::new()
            .name("vdesk-store".into())
            .spawn(move || {
                let mut catalog = match Catalog::open(dir_for_thread) {
                    Ok(catalog) => catalog,
                    Err(err) => {
                        let _ = ready_tx.send(Err(err));
                        return;
                    }
                };

                if ready_tx.send(Ok(())).is_err() {
                    error!("Store initialization receiver dropped before ready signal");
                    return;
                }

                while let Ok(command) = command_rx.recv() {
                    match command {
                        StoreCommand::Execute(task) => task(&mut catalog),
                        StoreCommand::Shutdown => break,
                    }
                }

                info!("Configuration store thread shutting down");
            })
            .map_err(|err| {
                Error::StoreUnavailable(format!("failed to spawn store worker thread: {err}"))
            })?;

        ready_rx.recv().map_err(|_| {
            Error::StoreUnavailable("store worker exited before signaling readiness".into())
        })??;

        info!("Configuration catalog at {}", dir.display());

        Ok(Self {
            inner: Arc::new(StoreInner {
                sender: command_tx,
                worker: Mutex::new(Some(worker)),
            }),
            dir: Arc::new(dir),
        })
    }

    pub fn dir(&self) -> &Path {
        self.dir.as_path()
    }

    async fn execute<F, T>(&self, task: F) -> Result<T, Error>
    where
        F: FnOnce(&mut Catalog) -> Result<T, Error> + Send + 'static,
        T: Send + 'static,
    {
        let sender = self.inner.sender.clone();
        let (reply_tx, reply_rx) = oneshot::channel();

        let command = StoreCommand::Execute(Box::new(move |catalog| {
            let result = task(catalog);
            if reply_tx.send(result).is_err() {
                error!("Store caller dropped before receiving result");
            }
        }));

        sender.send(command).map_err(|err| {
            Error::StoreUnavailable(format!("failed to reach store worker: {err}"))
        })?;

        reply_rx
            .await
            .map_err(|_| Error::StoreUnavailable("store worker terminated unexpectedly".into()))?
    }

    /// Persist a snapshot. `None` mints a fresh id; an existing id fully
    /// replaces the prior record. Returns the authoritative id.
    pub async fn save(
        &self,
        id: Option<ConfigId>,
        windows: Vec<WindowRecord>,
    ) -> Result<ConfigId, Error> {
        let config = Configuration {
            id: id.unwrap_or_else(ConfigId::mint),
            windows,
            saved_at: Utc::now(),
        };
        let saved_id = config.id.clone();

        self.execute(move |catalog| catalog.write(&config)).await?;

        info!("Saved configuration {saved_id}");
        Ok(saved_id)
    }

    pub async fn load(&self, id: &ConfigId) -> Result<Configuration, Error> {
        let id = id.clone();
        self.execute(move |catalog| catalog.read(&id)).await
    }

    pub async fn list(&self) -> Result<Vec<ConfigSummary>, Error> {
        self.execute(|catalog| catalog.list()).await
    }

    /// Idempotent: deleting an id that was never saved is not an error.
    pub async fn delete(&self, id: &ConfigId) -> Result<(), Error> {
        let id = id.clone();
        self.execute(move |catalog| catalog.remove(&id)).await
    }
}
