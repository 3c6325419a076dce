//! Maps live windows to virtual desktop ordinals and resolves stored
//! ordinals against the desktops that exist at replay time.

use std::sync::Arc;

use anyhow::Result;

use crate::platform::{WindowHandle, WindowSystem};

#[derive(Clone)]
pub struct DesktopMapper {
    system: Arc<dyn WindowSystem>,
}

impl DesktopMapper {
    pub fn new(system: Arc<dyn WindowSystem>) -> Self {
        Self { system }
    }

    /// Zero-based desktop ordinal the window currently occupies. Stable
    /// within one enumeration pass only; a stored value is advisory by the
    /// time it is replayed.
    pub fn desktop_index_for(&self, window: WindowHandle) -> Result<u32> {
        self.system.desktop_index_for(window)
    }

    pub fn current_desktop_count(&self) -> Result<u32> {
        self.system.desktop_count()
    }

    /// Resolve a stored desktop ordinal against the desktops that exist
    /// now. A vanished desktop falls back to the last existing one; when
    /// the count cannot be determined the stored ordinal is kept as-is.
    pub fn clamp(&self, stored_index: u32) -> u32 {
        match self.system.desktop_count() {
            Ok(count) if count > 0 => stored_index.min(count - 1),
            _ => stored_index,
        }
    }
}
