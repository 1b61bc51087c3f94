//! Target window lookup and message-based key injection.
//!
//! Key events are posted to the window's message queue rather than injected
//! system-wide, so the target does not need foreground focus.

#[cfg(target_os = "windows")]
use windows::Win32::Foundation::HWND;

#[cfg(target_os = "windows")]
use super::{KeySink, KeyState, VirtualKey};
use crate::error::{Error, Result};

/// Find the main window belonging to the given process ID.
///
/// Enumerates all top-level windows and returns the first visible one whose
/// owning process matches `target_pid`.
#[cfg(target_os = "windows")]
pub fn find_main_window(target_pid: u32) -> Result<HWND> {
    use windows::Win32::Foundation::LPARAM;
    use windows::Win32::UI::WindowsAndMessaging::EnumWindows;

    FOUND_HWND.with(|cell| cell.set(None));

    // SAFETY: EnumWindows calls the callback synchronously on this thread;
    // the PID pointer outlives the call.
    unsafe {
        EnumWindows(Some(enum_callback), LPARAM(&target_pid as *const u32 as isize)).ok();
    }

    FOUND_HWND
        .with(|cell| cell.take())
        .ok_or_else(|| Error::InputFailed(format!("no visible window for PID {}", target_pid)))
}

#[cfg(target_os = "windows")]
thread_local! {
    static FOUND_HWND: std::cell::Cell<Option<HWND>> = const { std::cell::Cell::new(None) };
}

#[cfg(target_os = "windows")]
unsafe extern "system" fn enum_callback(
    hwnd: HWND,
    lparam: windows::Win32::Foundation::LPARAM,
) -> windows::Win32::Foundation::BOOL {
    use windows::Win32::Foundation::BOOL;
    use windows::Win32::UI::WindowsAndMessaging::{GetWindowThreadProcessId, IsWindowVisible};

    let target_pid = unsafe { *(lparam.0 as *const u32) };
    let mut window_pid: u32 = 0;
    unsafe { GetWindowThreadProcessId(hwnd, Some(&mut window_pid)) };

    if window_pid == target_pid && unsafe { IsWindowVisible(hwnd) }.as_bool() {
        FOUND_HWND.with(|cell| cell.set(Some(hwnd)));
        return BOOL(0); // Stop enumeration
    }
    BOOL(1)
}

/// Posts `WM_KEYDOWN` / `WM_KEYUP` to one window
#[cfg(target_os = "windows")]
pub struct WindowKeySink {
    hwnd: HWND,
}

// SAFETY: PostMessageW may be called from any thread.
#[cfg(target_os = "windows")]
unsafe impl Send for WindowKeySink {}
#[cfg(target_os = "windows")]
unsafe impl Sync for WindowKeySink {}

#[cfg(target_os = "windows")]
impl WindowKeySink {
    pub fn new(hwnd: HWND) -> Self {
        Self { hwnd }
    }

    /// Sink for the main window of `pid`
    pub fn for_process(pid: u32) -> Result<Self> {
        find_main_window(pid).map(Self::new)
    }
}

#[cfg(target_os = "windows")]
impl KeySink for WindowKeySink {
    fn send_key(&self, state: KeyState, key: VirtualKey) -> Result<()> {
        use windows::Win32::Foundation::{LPARAM, WPARAM};
        use windows::Win32::UI::WindowsAndMessaging::PostMessageW;

        tracing::trace!("post {} {}", key, state);
        // SAFETY: posting to a stale HWND fails cleanly with an error.
        unsafe {
            PostMessageW(
                self.hwnd,
                state.message(),
                WPARAM(key.code() as usize),
                LPARAM(0),
            )
        }
        .map_err(|e| Error::InputFailed(e.to_string()))
    }
}

// --- Non-Windows stubs ---

#[cfg(not(target_os = "windows"))]
pub fn find_main_window(_target_pid: u32) -> Result<()> {
    Err(Error::Unsupported("window lookup is only available on Windows"))
}
