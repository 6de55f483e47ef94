//! In-process simulated FSUIPC link
//!
//! `MemoryLink` keeps a flat offset space and answers requests from it the
//! way the FSUIPC server would: requests are applied in order, offsets
//! outside the space are bad data and a batch larger than the SDK's request
//! area is rejected. Clones share the same state, so a test can keep a
//! handle for seeding memory and inspecting counters after handing the link
//! to a connection.

use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, trace};

use super::{Link, Request};
use crate::types::{ErrorCode, Simulator, Versions};

/// Size of the SDK's shared request area.
pub const MAX_TRANSFER_SIZE: usize = 0x7F00;
/// Bytes of bookkeeping the SDK adds per queued request.
const REQUEST_HEADER_SIZE: usize = 16;
/// Default offset space, enough for the documented FSUIPC offsets.
const DEFAULT_MEMORY_SIZE: usize = 0x1_0000;

/// Counters of calls made through a [`MemoryLink`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinkStats {
    pub opens: usize,
    pub closes: usize,
    pub transfers: usize,
    pub reads: usize,
    pub writes: usize,
}

#[derive(Debug)]
struct State {
    memory: Vec<u8>,
    simulator: Simulator,
    versions: Versions,
    running: bool,
    open: bool,
    fail_next: Option<ErrorCode>,
    stats: LinkStats,
}

/// Simulated link backed by process memory.
#[derive(Debug, Clone)]
pub struct MemoryLink {
    state: Arc<Mutex<State>>,
}

impl Default for MemoryLink {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl MemoryLink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builder() -> MemoryLinkBuilder {
        MemoryLinkBuilder::default()
    }

    /// Write raw bytes into the offset space, bypassing the link.
    ///
    /// Panics if the range is outside the offset space.
    pub fn poke(&self, offset: u32, bytes: &[u8]) {
        let mut state = self.lock();
        let start = offset as usize;
        state.memory[start..start + bytes.len()].copy_from_slice(bytes);
    }

    /// Read raw bytes from the offset space, bypassing the link.
    ///
    /// Panics if the range is outside the offset space.
    pub fn peek(&self, offset: u32, len: usize) -> Vec<u8> {
        let state = self.lock();
        let start = offset as usize;
        state.memory[start..start + len].to_vec()
    }

    /// Make the next open or transfer fail with `code`.
    pub fn fail_next(&self, code: ErrorCode) {
        self.lock().fail_next = Some(code);
    }

    /// Simulate the simulator starting or stopping.
    pub fn set_running(&self, running: bool) {
        self.lock().running = running;
    }

    pub fn is_open(&self) -> bool {
        self.lock().open
    }

    pub fn stats(&self) -> LinkStats {
        self.lock().stats
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        // A panic while holding the lock leaves plain data behind; keep going.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Link for MemoryLink {
    fn open(&mut self, simulator: Simulator) -> Result<Versions, ErrorCode> {
        let mut state = self.lock();
        state.stats.opens += 1;

        if let Some(code) = state.fail_next.take() {
            return Err(code);
        }
        if state.open {
            return Err(ErrorCode::Open);
        }
        if !state.running {
            return Err(ErrorCode::NoFs);
        }
        if !simulator.accepts(state.simulator) {
            return Err(ErrorCode::WrongFs);
        }

        state.open = true;
        debug!(simulator = %state.simulator, "Memory link opened");
        Ok(state.versions)
    }

    fn close(&mut self) {
        let mut state = self.lock();
        state.stats.closes += 1;
        state.open = false;
        trace!("Memory link closed");
    }

    fn transfer(&mut self, requests: &mut [Request<'_>]) -> Result<(), ErrorCode> {
        let mut state = self.lock();
        state.stats.transfers += 1;

        if let Some(code) = state.fail_next.take() {
            return Err(code);
        }
        if !state.open {
            return Err(ErrorCode::NotOpen);
        }
        if requests.is_empty() {
            return Err(ErrorCode::NoData);
        }

        let queued: usize = requests.iter().map(|r| r.len() + REQUEST_HEADER_SIZE).sum();
        if queued > MAX_TRANSFER_SIZE {
            return Err(ErrorCode::Size);
        }

        let memory_size = state.memory.len();
        if requests.iter().any(|r| r.offset() as usize + r.len() > memory_size) {
            return Err(ErrorCode::Data);
        }

        for request in requests.iter_mut() {
            match request {
                Request::Read { offset, dest } => {
                    let start = *offset as usize;
                    dest.copy_from_slice(&state.memory[start..start + dest.len()]);
                    state.stats.reads += 1;
                }
                Request::Write { offset, src } => {
                    let start = *offset as usize;
                    state.memory[start..start + src.len()].copy_from_slice(src);
                    state.stats.writes += 1;
                }
            }
        }

        trace!(requests = requests.len(), bytes = queued, "Memory link processed batch");
        Ok(())
    }
}

/// Builder for [`MemoryLink`].
#[derive(Debug, Clone)]
pub struct MemoryLinkBuilder {
    memory_size: usize,
    simulator: Simulator,
    versions: Versions,
    running: bool,
}

impl Default for MemoryLinkBuilder {
    fn default() -> Self {
        Self {
            memory_size: DEFAULT_MEMORY_SIZE,
            simulator: Simulator::Fsx,
            versions: Versions {
                simulator: Simulator::Fsx.raw(),
                fsuipc: 0x4974_0000,
                library: 2000,
            },
            running: true,
        }
    }
}

impl MemoryLinkBuilder {
    pub fn memory_size(mut self, size: usize) -> Self {
        self.memory_size = size;
        self
    }

    /// Simulator the link pretends to be attached to.
    pub fn simulator(mut self, simulator: Simulator) -> Self {
        self.simulator = simulator;
        self.versions.simulator = simulator.raw();
        self
    }

    pub fn fsuipc_version(mut self, raw: u32) -> Self {
        self.versions.fsuipc = raw;
        self
    }

    pub fn library_version(mut self, raw: u32) -> Self {
        self.versions.library = raw;
        self
    }

    /// Whether a simulator is reachable when the link is opened.
    pub fn running(mut self, running: bool) -> Self {
        self.running = running;
        self
    }

    pub fn build(self) -> MemoryLink {
        let state = State {
            memory: vec![0; self.memory_size],
            simulator: self.simulator,
            versions: self.versions,
            running: self.running,
            open: false,
            fail_next: None,
            stats: LinkStats::default(),
        };
        MemoryLink { state: Arc::new(Mutex::new(state)) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_checks_filter_and_state() {
        let mut link = MemoryLink::builder().simulator(Simulator::P3d64).build();

        assert_eq!(link.open(Simulator::Fsx), Err(ErrorCode::WrongFs));
        let versions = link.open(Simulator::Any).unwrap();
        assert_eq!(versions.simulator(), Some(Simulator::P3d64));
        assert_eq!(link.open(Simulator::Any), Err(ErrorCode::Open));

        link.close();
        assert!(!link.is_open());
    }

    #[test]
    fn open_fails_without_simulator() {
        let mut link = MemoryLink::builder().running(false).build();
        assert_eq!(link.open(Simulator::Any), Err(ErrorCode::NoFs));
    }

    #[test]
    fn transfer_requires_open_link() {
        let mut link = MemoryLink::new();
        let mut dest = [0u8; 4];
        let mut requests = [Request::Read { offset: 0x0238, dest: &mut dest }];
        assert_eq!(link.transfer(&mut requests), Err(ErrorCode::NotOpen));
    }

    #[test]
    fn batch_applies_requests_in_order() {
        let mut link = MemoryLink::new();
        link.open(Simulator::Any).unwrap();

        let src = [1u8, 2, 3, 4];
        let mut dest = [0u8; 4];
        let mut requests = [
            Request::Write { offset: 0x66c0, src: &src },
            Request::Read { offset: 0x66c0, dest: &mut dest },
        ];
        link.transfer(&mut requests).unwrap();
        drop(requests);

        assert_eq!(dest, src);
        let stats = link.stats();
        assert_eq!((stats.reads, stats.writes, stats.transfers), (1, 1, 1));
    }

    #[test]
    fn out_of_range_and_oversized_batches_fail() {
        let mut link = MemoryLink::builder().memory_size(0x100).build();
        link.open(Simulator::Any).unwrap();

        let mut dest = [0u8; 8];
        let mut requests = [Request::Read { offset: 0xfc, dest: &mut dest }];
        assert_eq!(link.transfer(&mut requests), Err(ErrorCode::Data));

        let big = vec![0u8; MAX_TRANSFER_SIZE];
        let mut requests = [Request::Write { offset: 0, src: &big }];
        assert_eq!(link.transfer(&mut requests), Err(ErrorCode::Size));

        assert_eq!(link.transfer(&mut []), Err(ErrorCode::NoData));
    }

    #[test]
    fn injected_failure_fires_once() {
        let mut link = MemoryLink::new();
        link.open(Simulator::Any).unwrap();
        link.fail_next(ErrorCode::Timeout);

        let mut dest = [0u8; 2];
        let mut requests = [Request::Read { offset: 0, dest: &mut dest }];
        assert_eq!(link.transfer(&mut requests), Err(ErrorCode::Timeout));
        assert_eq!(link.transfer(&mut requests), Ok(()));
    }
}
