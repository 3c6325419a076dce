use serde::{Deserialize, Serialize};

use super::ConfigId;

/// One observed top-level window at capture time.
///
/// `process_id` is only meaningful for the capture session it was observed
/// in; replay matching relies on `executable_path` + `class_name`, which
/// survive process restarts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowRecord {
    pub title: String,
    /// Absolute path of the backing process image. Empty when the OS denied
    /// the lookup; such a record is capture-only and cannot be relaunched.
    #[serde(default)]
    pub executable_path: String,
    pub process_id: u32,
    pub class_name: String,
    pub desktop_index: u32,
}

impl WindowRecord {
    pub fn replayable(&self) -> bool {
        !self.executable_path.is_empty()
    }
}

/// A fresh enumeration result handed across the UI boundary.
///
/// `id` is populated only when the snapshot corresponds to an already saved
/// configuration; a live capture always starts out unsaved.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowSnapshot {
    pub id: Option<ConfigId>,
    pub windows: Vec<WindowRecord>,
}
