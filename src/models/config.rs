use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::WindowRecord;

/// Opaque stable identifier of a saved configuration. Assigned at first
/// save and unchanged thereafter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfigId(String);

impl ConfigId {
    pub fn mint() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Ids double as catalog file names; anything that could name a path
    /// outside the catalog directory is not usable as a key.
    pub fn is_safe_file_stem(&self) -> bool {
        !self.0.is_empty()
            && self
                .0
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    }
}

impl fmt::Display for ConfigId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for ConfigId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for ConfigId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// A persisted snapshot of window records. Never mutated in place once
/// saved; a re-save replaces the whole record under the same id.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Configuration {
    pub id: ConfigId,
    pub windows: Vec<WindowRecord>,
    #[serde(default = "Utc::now")]
    pub saved_at: DateTime<Utc>,
}

/// Catalog listing entry: enough to render a saved configuration without
/// loading its full window list.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigSummary {
    pub id: ConfigId,
    pub window_count: usize,
    /// Captured window count per virtual desktop ordinal.
    pub windows_per_desktop: BTreeMap<u32, usize>,
    pub saved_at: DateTime<Utc>,
}

impl From<&Configuration> for ConfigSummary {
    fn from(config: &Configuration) -> Self {
        let mut windows_per_desktop: BTreeMap<u32, usize> = BTreeMap::new();
        for window in &config.windows {
            *windows_per_desktop.entry(window.desktop_index).or_insert(0) += 1;
        }

        Self {
            id: config.id.clone(),
            window_count: config.windows.len(),
            windows_per_desktop,
            saved_at: config.saved_at,
        }
    }
}
