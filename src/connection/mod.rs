//! Connections to FSUIPC
//!
//! A [`Connection`] owns an open [`Link`] for its whole lifetime. Closing
//! consumes it, and dropping it closes the link, so the link is released
//! exactly once on every exit path. [`PreparedData`] borrows the connection
//! it was prepared on and therefore cannot outlive it.

mod prepared;

pub use prepared::PreparedData;

use std::cell::RefCell;

use tracing::{debug, info, warn};

use crate::link::Link;
use crate::types::{FsuipcVersion, LibraryVersion, Simulator, Value, Versions};
use crate::{DataSpecification, FsuipcError, Result};

/// An open FSUIPC link.
///
/// The SDK link is process-wide state: keep at most one `Connection` open
/// per process.
pub struct Connection<L: Link> {
    link: RefCell<L>,
    versions: Versions,
    closed: bool,
}

impl<L: Link> Connection<L> {
    /// Open `link` to a simulator matching `simulator`.
    ///
    /// Fails with [`FsuipcError::Native`] when no simulator is found, the
    /// link is already open, registration fails or the version does not
    /// match.
    pub fn open(mut link: L, simulator: Simulator) -> Result<Self> {
        debug!(%simulator, "Opening FSUIPC link");

        let versions = link.open(simulator).map_err(|code| {
            warn!(%simulator, %code, "Failed to open FSUIPC link");
            FsuipcError::native(code)
        })?;

        info!(
            simulator = versions.simulator,
            fsuipc = %versions.fsuipc(),
            library = %versions.library(),
            "Connected to FSUIPC"
        );

        Ok(Self { link: RefCell::new(link), versions, closed: false })
    }

    /// Close the link.
    pub fn close(mut self) {
        self.release();
    }

    /// Read a specification once, without keeping the prepared layout.
    pub fn read(&self, spec: &DataSpecification) -> Result<Vec<Value>> {
        self.prepare(spec, true)?.read()
    }

    /// Write `values` to the offsets of `spec` once.
    pub fn write(&self, spec: &DataSpecification, values: &[Value]) -> Result<()> {
        self.prepare(spec, false)?.write(values)
    }

    /// Prepare a specification for repeated access.
    ///
    /// With `for_reading` the data can be read and written, otherwise it is
    /// write-only.
    pub fn prepare(&self, spec: &DataSpecification, for_reading: bool) -> Result<PreparedData<'_, L>> {
        PreparedData::new(self, spec, for_reading)
    }

    /// Raw simulator id reported by FSUIPC.
    pub fn simulator_version(&self) -> u32 {
        self.versions.simulator
    }

    /// Simulator family, when the reported id is known.
    pub fn simulator(&self) -> Option<Simulator> {
        self.versions.simulator()
    }

    /// FSUIPC version, e.g. `4.974a`.
    pub fn client_version(&self) -> String {
        self.fsuipc_version().to_string()
    }

    /// SDK library version, e.g. `2.000`.
    pub fn library_version(&self) -> String {
        LibraryVersion(self.versions.library).to_string()
    }

    /// FSUIPC version with its major, minor and build parts.
    pub fn fsuipc_version(&self) -> FsuipcVersion {
        self.versions.fsuipc()
    }

    /// Raw version words captured when the link was opened.
    pub fn versions(&self) -> &Versions {
        &self.versions
    }

    pub(crate) fn link(&self) -> &RefCell<L> {
        &self.link
    }

    fn release(&mut self) {
        if !self.closed {
            self.closed = true;
            self.link.get_mut().close();
            debug!("FSUIPC link closed");
        }
    }
}

impl<L: Link> Drop for Connection<L> {
    fn drop(&mut self) {
        self.release();
    }
}

impl<L: Link> std::fmt::Debug for Connection<L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection").field("versions", &self.versions).finish_non_exhaustive()
    }
}
