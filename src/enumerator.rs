//! Live window inventory: a read-only snapshot of the user-relevant
//! top-level windows currently open.

use std::sync::Arc;

use log::warn;

use crate::desktops::DesktopMapper;
use crate::error::Error;
use crate::models::WindowRecord;
use crate::platform::{RawWindow, WindowSystem};

#[derive(Clone)]
pub struct WindowEnumerator {
    system: Arc<dyn WindowSystem>,
    mapper: DesktopMapper,
}

impl WindowEnumerator {
    pub fn new(system: Arc<dyn WindowSystem>) -> Self {
        let mapper = DesktopMapper::new(system.clone());
        Self { system, mapper }
    }

    /// Snapshot every user-relevant top-level window, in OS enumeration
    /// order.
    ///
    /// Read-only and safe to call repeatedly. A failed executable-path or
    /// desktop lookup degrades that one record instead of aborting the
    /// pass; only a failed OS query fails the call.
    pub fn enumerate(&self) -> Result<Vec<WindowRecord>, Error> {
        let raw = self
            .system
            .list_windows()
            .map_err(|err| Error::EnumerationUnavailable(format!("{err:#}")))?;

        let mut records = Vec::new();
        for window in raw {
            if !user_relevant(&window) {
                continue;
            }

            let desktop_index = match self.mapper.desktop_index_for(window.handle) {
                Ok(index) => index,
                Err(err) => {
                    warn!("desktop lookup failed for '{}': {err:#}", window.title);
                    0
                }
            };

            records.push(WindowRecord {
                title: window.title,
                executable_path: window.executable_path.unwrap_or_default(),
                process_id: window.process_id,
                class_name: window.class_name,
                desktop_index,
            });
        }

        Ok(records)
    }
}

/// Inclusion policy: a window is captured iff it has a title and is a
/// normal shown surface rather than a tool/helper window.
fn user_relevant(window: &RawWindow) -> bool {
    !window.title.is_empty() && window.is_visible && !window.is_tool_window
}
