//! Prepared data specifications

use tracing::{debug, trace};

use super::Connection;
use crate::codec;
use crate::link::{Link, Request};
use crate::specification::Layout;
use crate::{DataSpecification, FsuipcError, Result, Value};

/// A data specification converted once for repeated reads and writes.
///
/// Holds the computed layout and its scratch buffer, so each access only
/// queues requests and converts values.
///
/// ```rust
/// use fsuipc::{Connection, DataSpecification, MemoryLink, Simulator, ValueType};
///
/// # fn main() -> fsuipc::Result<()> {
/// let connection = Connection::open(MemoryLink::new(), Simulator::Any)?;
/// let spec = DataSpecification::new()
///     .with(0x0560, ValueType::Int64)
///     .with(0x0568, ValueType::Int64)
///     .with(0x0570, ValueType::Int64);
///
/// let mut prepared = connection.prepare(&spec, true)?;
/// let values = prepared.read()?;
/// assert_eq!(values.len(), 3);
/// # Ok(())
/// # }
/// ```
pub struct PreparedData<'c, L: Link> {
    connection: &'c Connection<L>,
    spec: DataSpecification,
    layout: Layout,
    buffer: Vec<u8>,
}

impl<'c, L: Link> PreparedData<'c, L> {
    pub(super) fn new(
        connection: &'c Connection<L>,
        spec: &DataSpecification,
        for_reading: bool,
    ) -> Result<Self> {
        let layout = Layout::new(spec, for_reading)?;
        let buffer = vec![0; layout.size()];

        trace!(fields = layout.len(), bytes = layout.size(), for_reading, "Prepared data");

        Ok(Self { connection, spec: spec.clone(), layout, buffer })
    }

    /// Read every field, in specification order.
    pub fn read(&mut self) -> Result<Vec<Value>> {
        if !self.layout.for_reading() {
            return Err(FsuipcError::WriteOnly);
        }

        {
            let mut requests = read_requests(&self.layout, &mut self.buffer);
            transfer(self.connection, &mut requests)?;
        }

        let values = self
            .layout
            .slots()
            .iter()
            .map(|slot| codec::decode(slot.value_type, &self.buffer[slot.range()]))
            .collect();
        Ok(values)
    }

    /// Write one value per field, in specification order.
    ///
    /// Nothing is transferred unless every value converts.
    pub fn write(&mut self, values: &[Value]) -> Result<()> {
        if values.len() != self.layout.len() {
            return Err(FsuipcError::LengthMismatch {
                expected: self.layout.len(),
                found: values.len(),
            });
        }

        for (index, (slot, value)) in self.layout.slots().iter().zip(values).enumerate() {
            codec::encode(index, slot.value_type, value, &mut self.buffer[slot.range()])?;
        }

        let buffer = &self.buffer;
        let mut requests: Vec<Request<'_>> = self
            .layout
            .slots()
            .iter()
            .map(|slot| Request::Write { offset: slot.offset, src: &buffer[slot.range()] })
            .collect();
        transfer(self.connection, &mut requests)
    }

    /// The specification this data was prepared from.
    pub fn specification(&self) -> &DataSpecification {
        &self.spec
    }

    /// Where each field sits in the scratch buffer.
    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// `false` for write-only data, whose `read` fails with `WriteOnly`.
    pub fn for_reading(&self) -> bool {
        self.layout.for_reading()
    }

    /// Number of values `read` returns and `write` expects.
    pub fn len(&self) -> usize {
        self.layout.len()
    }

    /// Always `false`: empty specifications cannot be prepared.
    pub fn is_empty(&self) -> bool {
        self.layout.is_empty()
    }
}

impl<L: Link> std::fmt::Display for PreparedData<'_, L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&self.layout, f)
    }
}

impl<L: Link> std::fmt::Debug for PreparedData<'_, L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreparedData").field("layout", &self.layout).finish_non_exhaustive()
    }
}

fn transfer<L: Link>(connection: &Connection<L>, requests: &mut [Request<'_>]) -> Result<()> {
    connection.link().borrow_mut().transfer(requests).map_err(|code| {
        debug!(%code, requests = requests.len(), "FSUIPC transfer failed");
        FsuipcError::native(code)
    })
}

/// Split the buffer into one read destination per slot.
///
/// Slots are laid out in ascending, non-overlapping order.
fn read_requests<'b>(layout: &Layout, buffer: &'b mut [u8]) -> Vec<Request<'b>> {
    let mut requests = Vec::with_capacity(layout.len());
    let mut rest = buffer;
    let mut consumed = 0;

    for slot in layout.slots() {
        let (_, tail) = std::mem::take(&mut rest).split_at_mut(slot.start - consumed);
        let (dest, tail) = tail.split_at_mut(slot.value_type.size());
        requests.push(Request::Read { offset: slot.offset, dest });
        rest = tail;
        consumed = slot.start + slot.value_type.size();
    }

    requests
}
