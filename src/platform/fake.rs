//! Deterministic in-memory [`WindowSystem`] for tests and for embedders
//! that need to exercise the engine without touching a real desktop.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Mutex;

use anyhow::{anyhow, bail, Result};

use super::{RawWindow, WindowHandle, WindowSystem};

/// Behavior of a registered fake executable when launched.
#[derive(Debug, Clone)]
pub struct FakeExecutable {
    pub title: String,
    pub class_name: String,
    /// When false the launched "process" exits immediately without ever
    /// opening a window.
    pub opens_window: bool,
}

#[derive(Default)]
struct FakeState {
    windows: Vec<RawWindow>,
    desktop_of: HashMap<WindowHandle, u32>,
    desktop_count: u32,
    executables: HashMap<String, FakeExecutable>,
    launched: Vec<String>,
    live_pids: Vec<u32>,
    moves: Vec<(WindowHandle, u32)>,
    deny_moves: bool,
    fail_enumeration: bool,
    fail_desktop_count: bool,
}

pub struct FakeWindowSystem {
    state: Mutex<FakeState>,
    next_handle: AtomicU64,
    next_pid: AtomicU32,
}

impl FakeWindowSystem {
    pub fn new(desktop_count: u32) -> Self {
        Self {
            state: Mutex::new(FakeState {
                desktop_count,
                ..FakeState::default()
            }),
            next_handle: AtomicU64::new(1),
            next_pid: AtomicU32::new(1000),
        }
    }

    /// Add a normal visible window backed by the given executable.
    pub fn add_window(
        &self,
        title: &str,
        class_name: &str,
        executable_path: &str,
        desktop_index: u32,
    ) -> WindowHandle {
        let handle = self.next_handle.fetch_add(1, Ordering::SeqCst);
        let process_id = self.next_pid.fetch_add(1, Ordering::SeqCst);

        let mut state = self.state.lock().unwrap();
        state.windows.push(RawWindow {
            handle,
            title: title.into(),
            class_name: class_name.into(),
            process_id,
            executable_path: Some(executable_path.into()),
            is_visible: true,
            is_tool_window: false,
        });
        state.desktop_of.insert(handle, desktop_index);
        state.live_pids.push(process_id);
        handle
    }

    /// Add a window with full control over its raw fields. No desktop
    /// mapping is created; pair with [`FakeWindowSystem::set_desktop`] when
    /// one is wanted.
    pub fn add_raw_window(&self, raw: RawWindow) -> WindowHandle {
        let handle = raw.handle;
        self.state.lock().unwrap().windows.push(raw);
        handle
    }

    pub fn set_desktop(&self, window: WindowHandle, desktop_index: u32) {
        self.state
            .lock()
            .unwrap()
            .desktop_of
            .insert(window, desktop_index);
    }

    pub fn register_executable(&self, path: &str, executable: FakeExecutable) {
        self.state
            .lock()
            .unwrap()
            .executables
            .insert(path.into(), executable);
    }

    pub fn deny_moves(&self) {
        self.state.lock().unwrap().deny_moves = true;
    }

    pub fn fail_enumeration(&self) {
        self.state.lock().unwrap().fail_enumeration = true;
    }

    pub fn fail_desktop_count(&self) {
        self.state.lock().unwrap().fail_desktop_count = true;
    }

    /// Executable paths launched so far, in launch order.
    pub fn launched(&self) -> Vec<String> {
        self.state.lock().unwrap().launched.clone()
    }

    /// Window moves performed so far, in order.
    pub fn moves(&self) -> Vec<(WindowHandle, u32)> {
        self.state.lock().unwrap().moves.clone()
    }

    pub fn desktop_of(&self, window: WindowHandle) -> Option<u32> {
        self.state.lock().unwrap().desktop_of.get(&window).copied()
    }
}

impl WindowSystem for FakeWindowSystem {
    fn list_windows(&self) -> Result<Vec<RawWindow>> {
        let state = self.state.lock().unwrap();
        if state.fail_enumeration {
            bail!("window system offline");
        }
        Ok(state.windows.clone())
    }

    fn desktop_index_for(&self, window: WindowHandle) -> Result<u32> {
        self.state
            .lock()
            .unwrap()
            .desktop_of
            .get(&window)
            .copied()
            .ok_or_else(|| anyhow!("no desktop known for window {window}"))
    }

    fn desktop_count(&self) -> Result<u32> {
        let state = self.state.lock().unwrap();
        if state.fail_desktop_count {
            bail!("desktop count unavailable");
        }
        Ok(state.desktop_count)
    }

    fn launch(&self, executable_path: &str) -> Result<u32> {
        let executable = {
            let mut state = self.state.lock().unwrap();
            state.launched.push(executable_path.into());
            state.executables.get(executable_path).cloned()
        };

        let Some(executable) = executable else {
            bail!("no such executable: {executable_path}");
        };

        let process_id = self.next_pid.fetch_add(1, Ordering::SeqCst);
        if executable.opens_window {
            let handle = self.next_handle.fetch_add(1, Ordering::SeqCst);
            let mut state = self.state.lock().unwrap();
            state.windows.push(RawWindow {
                handle,
                title: executable.title.clone(),
                class_name: executable.class_name.clone(),
                process_id,
                executable_path: Some(executable_path.into()),
                is_visible: true,
                is_tool_window: false,
            });
            // New windows open on the first desktop, like a real launch.
            state.desktop_of.insert(handle, 0);
            state.live_pids.push(process_id);
        }
        Ok(process_id)
    }

    fn move_to_desktop(&self, window: WindowHandle, desktop_index: u32) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.deny_moves {
            bail!("window move refused");
        }
        if !state.windows.iter().any(|w| w.handle == window) {
            bail!("unknown window {window}");
        }
        state.desktop_of.insert(window, desktop_index);
        state.moves.push((window, desktop_index));
        Ok(())
    }

    fn process_alive(&self, process_id: u32) -> bool {
        self.state.lock().unwrap().live_pids.contains(&process_id)
    }
}
