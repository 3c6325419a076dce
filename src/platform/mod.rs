//! OS window-system capability boundary.
//!
//! Everything the engine needs from the operating system goes through
//! [`WindowSystem`], so the enumerator, store, and replay engine stay
//! OS-agnostic and can run against [`fake::FakeWindowSystem`] in tests.

use std::sync::Arc;

use anyhow::Result;
use sysinfo::{Pid, System};

use crate::error::Error;

pub mod fake;
#[cfg(target_os = "windows")]
pub mod windows;

/// Opaque OS window handle. Valid only while the window is alive; never
/// persisted.
pub type WindowHandle = u64;

/// Per-window data as the OS reports it, before any inclusion policy is
/// applied.
#[derive(Debug, Clone)]
pub struct RawWindow {
    pub handle: WindowHandle,
    pub title: String,
    pub class_name: String,
    pub process_id: u32,
    /// `None` when the OS denied the process image lookup.
    pub executable_path: Option<String>,
    /// A normal, shown top-level surface (not cloaked, zero-sized, or
    /// style-less).
    pub is_visible: bool,
    pub is_tool_window: bool,
}

pub trait WindowSystem: Send + Sync {
    /// Snapshot of every top-level window, unfiltered.
    fn list_windows(&self) -> Result<Vec<RawWindow>>;

    /// Zero-based virtual desktop ordinal a live window currently occupies.
    fn desktop_index_for(&self, window: WindowHandle) -> Result<u32>;

    /// Number of virtual desktops currently configured.
    fn desktop_count(&self) -> Result<u32>;

    /// Spawn the executable with no arguments and return its process id.
    fn launch(&self, executable_path: &str) -> Result<u32>;

    /// Move a live window onto the given virtual desktop.
    fn move_to_desktop(&self, window: WindowHandle, desktop_index: u32) -> Result<()>;

    /// Whether the process is still running. Used while waiting for a
    /// relaunched process to surface its first window.
    fn process_alive(&self, process_id: u32) -> bool {
        let system = System::new_all();
        system.process(Pid::from_u32(process_id)).is_some()
    }
}

/// The window system for the OS this build targets.
pub fn native_window_system() -> Result<Arc<dyn WindowSystem>, Error> {
    #[cfg(target_os = "windows")]
    {
        let system = windows::VirtualDesktopSystem::new()
            .map_err(|err| Error::EnumerationUnavailable(err.to_string()))?;
        Ok(Arc::new(system))
    }

    #[cfg(not(target_os = "windows"))]
    {
        Err(Error::EnumerationUnavailable(format!(
            "no window system backend for {}",
            std::env::consts::OS
        )))
    }
}
