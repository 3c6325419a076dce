//! Windows implementation of [`WindowSystem`], built on Win32 window
//! enumeration and the virtual desktop API.

use std::ffi::OsString;
use std::os::windows::ffi::OsStringExt;
use std::process::Command;

use anyhow::{anyhow, Context, Result};
use windows::core::PWSTR;
use windows::Win32::Foundation::{BOOL, HWND, LPARAM, MAX_PATH, RECT};
use windows::Win32::Graphics::Dwm::{DwmGetWindowAttribute, DWMWA_CLOAKED};
use windows::Win32::System::Threading::{
    OpenProcess, QueryFullProcessImageNameW, PROCESS_NAME_FORMAT,
    PROCESS_QUERY_LIMITED_INFORMATION,
};
use windows::Win32::UI::WindowsAndMessaging::{
    EnumWindows, GetClassNameW, GetWindowLongW, GetWindowRect, GetWindowTextW,
    GetWindowThreadProcessId, IsWindowVisible, GWL_EXSTYLE, GWL_STYLE, WS_EX_TOOLWINDOW,
    WS_OVERLAPPEDWINDOW, WS_POPUP,
};

use super::{RawWindow, WindowHandle, WindowSystem};

pub struct VirtualDesktopSystem;

impl VirtualDesktopSystem {
    /// Probes the virtual desktop API once so construction fails fast when
    /// the shell does not expose it (e.g. a restricted session).
    pub fn new() -> Result<Self> {
        winvd::get_desktop_count()
            .map_err(|err| anyhow!("virtual desktop API unavailable: {err:?}"))?;
        Ok(Self)
    }
}

fn hwnd(handle: WindowHandle) -> HWND {
    HWND(handle as isize as *mut core::ffi::c_void)
}

unsafe extern "system" fn collect_window(handle: HWND, lparam: LPARAM) -> BOOL {
    let windows = &mut *(lparam.0 as *mut Vec<RawWindow>);

    let mut buffer = [0u16; 512];
    let length = GetWindowTextW(handle, &mut buffer);
    let title = String::from_utf16_lossy(&buffer[..length as usize]);

    let class_length = GetClassNameW(handle, &mut buffer);
    let class_name = String::from_utf16_lossy(&buffer[..class_length as usize]);

    let mut process_id = 0u32;
    GetWindowThreadProcessId(handle, Some(&mut process_id));

    let style = GetWindowLongW(handle, GWL_STYLE);
    let ex_style = GetWindowLongW(handle, GWL_EXSTYLE);
    let is_gui =
        (style & WS_OVERLAPPEDWINDOW.0 as i32) != 0 || (style & WS_POPUP.0 as i32) != 0;
    let is_tool_window = (ex_style & WS_EX_TOOLWINDOW.0 as i32) != 0;

    let mut rect = RECT::default();
    let _ = GetWindowRect(handle, &mut rect);
    let has_size = rect.right - rect.left > 0 && rect.bottom - rect.top > 0;

    // Cloaked windows are kept alive by the system but never shown; treat
    // them as hidden.
    let mut cloaked = BOOL(0);
    let cloak_check = DwmGetWindowAttribute(
        handle,
        DWMWA_CLOAKED,
        &mut cloaked as *mut BOOL as *mut _,
        std::mem::size_of::<BOOL>() as u32,
    );
    let shown = IsWindowVisible(handle).as_bool() && (cloak_check.is_err() || !cloaked.as_bool());

    windows.push(RawWindow {
        handle: handle.0 as isize as u64,
        title,
        class_name,
        process_id,
        executable_path: executable_path_for(process_id).ok(),
        is_visible: shown && is_gui && has_size,
        is_tool_window,
    });

    BOOL(1)
}

fn executable_path_for(process_id: u32) -> Result<String> {
    unsafe {
        let process = OpenProcess(PROCESS_QUERY_LIMITED_INFORMATION, false, process_id)
            .with_context(|| format!("OpenProcess failed for pid {process_id}"))?;

        let mut buffer = [0u16; MAX_PATH as usize];
        let mut size = buffer.len() as u32;
        QueryFullProcessImageNameW(
            process,
            PROCESS_NAME_FORMAT(0),
            PWSTR(buffer.as_mut_ptr()),
            &mut size,
        )
        .with_context(|| format!("QueryFullProcessImageNameW failed for pid {process_id}"))?;

        let path = OsString::from_wide(&buffer[..size as usize]);
        Ok(path.to_string_lossy().into_owned())
    }
}

impl WindowSystem for VirtualDesktopSystem {
    fn list_windows(&self) -> Result<Vec<RawWindow>> {
        let mut windows: Vec<RawWindow> = Vec::new();
        unsafe {
            EnumWindows(
                Some(collect_window),
                LPARAM(&mut windows as *mut _ as isize),
            )
            .context("EnumWindows failed")?;
        }
        Ok(windows)
    }

    fn desktop_index_for(&self, window: WindowHandle) -> Result<u32> {
        let desktop = winvd::get_desktop_by_window(hwnd(window))
            .map_err(|err| anyhow!("desktop lookup failed: {err:?}"))?;
        desktop
            .get_index()
            .map_err(|err| anyhow!("desktop index unavailable: {err:?}"))
    }

    fn desktop_count(&self) -> Result<u32> {
        winvd::get_desktop_count().map_err(|err| anyhow!("desktop count unavailable: {err:?}"))
    }

    fn launch(&self, executable_path: &str) -> Result<u32> {
        let child = Command::new(executable_path)
            .spawn()
            .with_context(|| format!("failed to spawn {executable_path}"))?;
        Ok(child.id())
    }

    fn move_to_desktop(&self, window: WindowHandle, desktop_index: u32) -> Result<()> {
        winvd::move_window_to_desktop(winvd::get_desktop(desktop_index), &hwnd(window))
            .map_err(|err| anyhow!("move to desktop {desktop_index} refused: {err:?}"))
    }
}
