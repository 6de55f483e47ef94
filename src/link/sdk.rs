//! FSUIPC C user library binding
//!
//! Links against `FSUIPC_User64.lib` (64-bit) or `FSUIPC_User.lib` (32-bit)
//! from the FSUIPC SDK. Point the linker at the SDK with
//! `RUSTFLAGS="-L native=<sdk dir>"`.
//!
//! The SDK keeps a single process-wide link; `SdkLink` is a zero-sized handle
//! to it.

use std::ffi::c_void;

use tracing::{debug, trace, warn};

use super::{Link, Request};
use crate::types::{ErrorCode, Simulator, Versions};

#[cfg_attr(target_pointer_width = "64", link(name = "FSUIPC_User64"))]
#[cfg_attr(target_pointer_width = "32", link(name = "FSUIPC_User"))]
unsafe extern "C" {
    fn FSUIPC_Open(fs_req: u32, result: *mut u32) -> i32;
    fn FSUIPC_Close();
    fn FSUIPC_Read(offset: u32, size: u32, dest: *mut c_void, result: *mut u32) -> i32;
    fn FSUIPC_Write(offset: u32, size: u32, src: *mut c_void, result: *mut u32) -> i32;
    fn FSUIPC_Process(result: *mut u32) -> i32;

    static mut FSUIPC_Version: u32;
    static mut FSUIPC_FS_Version: u32;
    static mut FSUIPC_Lib_Version: u32;
}

/// Handle to the SDK's process-wide link.
#[derive(Debug, Default)]
pub struct SdkLink {
    _private: (),
}

impl SdkLink {
    pub fn new() -> Self {
        Self::default()
    }

    fn process() -> Result<(), ErrorCode> {
        let mut result = 0u32;
        // SAFETY: plain C call with a valid out pointer.
        if unsafe { FSUIPC_Process(&mut result) } != 0 {
            Ok(())
        } else {
            Err(ErrorCode::from_raw(result))
        }
    }
}

impl Link for SdkLink {
    fn open(&mut self, simulator: Simulator) -> Result<Versions, ErrorCode> {
        let mut result = 0u32;
        // SAFETY: plain C call with a valid out pointer.
        let opened = unsafe { FSUIPC_Open(simulator.raw(), &mut result) } != 0;
        if !opened {
            return Err(ErrorCode::from_raw(result));
        }

        // SAFETY: the globals are plain DWORDs filled in by FSUIPC_Open.
        let versions = unsafe {
            Versions {
                simulator: (&raw const FSUIPC_FS_Version).read(),
                fsuipc: (&raw const FSUIPC_Version).read(),
                library: (&raw const FSUIPC_Lib_Version).read(),
            }
        };
        debug!(?versions, "FSUIPC SDK link opened");
        Ok(versions)
    }

    fn close(&mut self) {
        // SAFETY: FSUIPC_Close is a no-op when the link is not open.
        unsafe { FSUIPC_Close() };
        trace!("FSUIPC SDK link closed");
    }

    fn transfer(&mut self, requests: &mut [Request<'_>]) -> Result<(), ErrorCode> {
        for (index, request) in requests.iter_mut().enumerate() {
            let mut result = 0u32;
            // SAFETY: read destinations are borrowed for the whole call, so they
            // remain valid until FSUIPC_Process below copies into them. The SDK
            // copies write sources into its request area before returning.
            let queued = unsafe {
                match request {
                    Request::Read { offset, dest } => FSUIPC_Read(
                        *offset,
                        dest.len() as u32,
                        dest.as_mut_ptr().cast::<c_void>(),
                        &mut result,
                    ),
                    Request::Write { offset, src } => FSUIPC_Write(
                        *offset,
                        src.len() as u32,
                        src.as_ptr().cast_mut().cast::<c_void>(),
                        &mut result,
                    ),
                }
            } != 0;

            if !queued {
                let code = ErrorCode::from_raw(result);
                warn!(index, offset = request.offset(), %code, "Failed to queue FSUIPC request");
                // Flush what was already queued so the request area is empty again.
                if index > 0 {
                    let _ = Self::process();
                }
                return Err(code);
            }
        }

        Self::process()
    }
}
