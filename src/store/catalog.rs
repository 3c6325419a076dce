use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use log::warn;

use crate::error::Error;
use crate::models::{ConfigId, ConfigSummary, Configuration};

const TMP_SUFFIX: &str = ".tmp";

/// On-disk catalog layout: one `<id>.json` per configuration inside the
/// data directory. Writes land in `<id>.json.tmp` first and are renamed
/// into place, so a crash mid-save leaves the previous record (or nothing)
/// behind, never a half-written one.
pub(crate) struct Catalog {
    dir: PathBuf,
}

impl Catalog {
    pub(crate) fn open(dir: PathBuf) -> Result<Self, Error> {
        fs::create_dir_all(&dir).map_err(|err| {
            Error::StoreWriteFailed(format!(
                "cannot create catalog directory {}: {err}",
                dir.display()
            ))
        })?;

        let catalog = Self { dir };
        catalog.sweep_temp_files();
        Ok(catalog)
    }

    pub(crate) fn write(&self, config: &Configuration) -> Result<(), Error> {
        if !config.id.is_safe_file_stem() {
            return Err(Error::StoreWriteFailed(format!(
                "id '{}' is not usable as a catalog key",
                config.id
            )));
        }

        let path = self.dir.join(format!("{}.json", config.id));
        let tmp = self.dir.join(format!("{}.json{TMP_SUFFIX}", config.id));

        let bytes = serde_json::to_vec_pretty(config).map_err(|err| {
            Error::StoreWriteFailed(format!("cannot encode configuration {}: {err}", config.id))
        })?;
        fs::write(&tmp, &bytes).map_err(|err| {
            Error::StoreWriteFailed(format!("cannot write {}: {err}", tmp.display()))
        })?;
        replace_file(&tmp, &path).map_err(|err| {
            Error::StoreWriteFailed(format!("cannot commit {}: {err}", path.display()))
        })
    }

    pub(crate) fn read(&self, id: &ConfigId) -> Result<Configuration, Error> {
        if !id.is_safe_file_stem() {
            return Err(Error::NotFound(id.clone()));
        }

        let path = self.dir.join(format!("{id}.json"));
        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                return Err(Error::NotFound(id.clone()))
            }
            Err(err) => {
                return Err(Error::StoreReadFailed(format!(
                    "cannot read {}: {err}",
                    path.display()
                )))
            }
        };

        serde_json::from_str(&contents).map_err(|err| {
            Error::StoreReadFailed(format!("configuration {id} is corrupt: {err}"))
        })
    }

    /// Summaries of every readable record, oldest save first. Records that
    /// fail to decode are skipped so one bad file cannot hide the rest.
    pub(crate) fn list(&self) -> Result<Vec<ConfigSummary>, Error> {
        let entries = fs::read_dir(&self.dir).map_err(|err| {
            Error::StoreReadFailed(format!("cannot list {}: {err}", self.dir.display()))
        })?;

        let mut summaries = Vec::new();
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }

            let parsed = fs::read_to_string(&path)
                .ok()
                .and_then(|contents| serde_json::from_str::<Configuration>(&contents).ok());
            match parsed {
                Some(config) => summaries.push(ConfigSummary::from(&config)),
                None => warn!("skipping unreadable catalog record {}", path.display()),
            }
        }

        summaries.sort_by(|a, b| a.saved_at.cmp(&b.saved_at));
        Ok(summaries)
    }

    /// Idempotent: removing an id that was never saved succeeds.
    pub(crate) fn remove(&self, id: &ConfigId) -> Result<(), Error> {
        if !id.is_safe_file_stem() {
            return Ok(());
        }

        let path = self.dir.join(format!("{id}.json"));
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(Error::StoreWriteFailed(format!(
                "cannot delete {}: {err}",
                path.display()
            ))),
        }
    }

    /// Drop temp files orphaned by an interrupted save.
    fn sweep_temp_files(&self) {
        let Ok(entries) = fs::read_dir(&self.dir) else {
            return;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.to_string_lossy().ends_with(TMP_SUFFIX) {
                if let Err(err) = fs::remove_file(&path) {
                    warn!("could not remove stale temp file {}: {err}", path.display());
                }
            }
        }
    }
}

/// Rename with a Windows fallback: rename-over-existing fails there, so
/// drop the destination and retry once.
fn replace_file(tmp: &Path, path: &Path) -> std::io::Result<()> {
    match fs::rename(tmp, path) {
        Ok(()) => Ok(()),
        Err(_) if path.exists() => {
            fs::remove_file(path)?;
            fs::rename(tmp, path)
        }
        Err(err) => Err(err),
    }
}
