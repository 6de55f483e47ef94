//! Native link abstraction
//!
//! A [`Link`] is the boundary to the FSUIPC SDK: it opens the process-wide
//! IPC channel, accumulates read and write requests and processes them in
//! one round trip. Everything above it (layout, marshaling, versions) lives
//! in this crate.
//!
//! Two implementations are provided:
//! - [`SdkLink`] calls the FSUIPC C user library (Windows, `sdk` feature)
//! - [`MemoryLink`] simulates an offset space in process for tests and
//!   offline development

mod memory;
#[cfg(all(windows, feature = "sdk"))]
mod sdk;

pub use memory::{LinkStats, MemoryLink, MemoryLinkBuilder};
#[cfg(all(windows, feature = "sdk"))]
pub use sdk::SdkLink;

use crate::types::{ErrorCode, Simulator, Versions};

/// One entry of a transfer batch.
///
/// Read destinations must stay untouched until [`Link::transfer`] returns;
/// the borrow guarantees it.
#[derive(Debug)]
pub enum Request<'a> {
    Read { offset: u32, dest: &'a mut [u8] },
    Write { offset: u32, src: &'a [u8] },
}

impl Request<'_> {
    pub fn offset(&self) -> u32 {
        match self {
            Request::Read { offset, .. } | Request::Write { offset, .. } => *offset,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Request::Read { dest, .. } => dest.len(),
            Request::Write { src, .. } => src.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Native FSUIPC link.
///
/// Errors are raw SDK codes; the connection layer wraps them into
/// [`FsuipcError::Native`](crate::FsuipcError::Native).
pub trait Link {
    /// Open the link to a simulator matching `simulator`.
    fn open(&mut self, simulator: Simulator) -> Result<Versions, ErrorCode>;

    /// Release the link. Must tolerate being called when not open.
    fn close(&mut self);

    /// Queue every request and process them in one round trip.
    fn transfer(&mut self, requests: &mut [Request<'_>]) -> Result<(), ErrorCode>;
}

impl<L: Link + ?Sized> Link for Box<L> {
    fn open(&mut self, simulator: Simulator) -> Result<Versions, ErrorCode> {
        (**self).open(simulator)
    }

    fn close(&mut self) {
        (**self).close()
    }

    fn transfer(&mut self, requests: &mut [Request<'_>]) -> Result<(), ErrorCode> {
        (**self).transfer(requests)
    }
}
