//! Windows-side checks for the FSUIPC server
//!
//! FSUIPC and WideClient register a top-level window that clients message
//! to process their requests. Finding it tells us whether a server is
//! reachable before the SDK is asked to open a link.

use tracing::trace;
use windows::Win32::UI::WindowsAndMessaging::FindWindowW;
use windows::core::PCWSTR;

/// Window class registered by FSUIPC 4+ and WideClient
const UIPC_WINDOW_CLASS: &str = "UIPCMAIN";
/// Window class of FS98-era simulators with FSUIPC
const FS98_WINDOW_CLASS: &str = "FS98MAIN";

/// Check whether an FSUIPC server window exists in this session.
pub fn server_window_present() -> bool {
    [UIPC_WINDOW_CLASS, FS98_WINDOW_CLASS].iter().any(|class| {
        let wide_name = wide_string(class);
        // SAFETY: wide_name is a NUL-terminated UTF-16 buffer alive for the call.
        let found =
            unsafe { FindWindowW(PCWSTR::from_raw(wide_name.as_ptr()), PCWSTR::null()) }.is_ok();
        trace!(class, found, "Probed FSUIPC window class");
        found
    })
}

/// Convert string to null-terminated wide string for Windows APIs
fn wide_string(s: &str) -> Vec<u16> {
    use std::ffi::OsStr;
    use std::os::windows::ffi::OsStrExt;
    OsStr::new(s).encode_wide().chain(std::iter::once(0)).collect()
}
