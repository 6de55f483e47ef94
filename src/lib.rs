//! Type-safe Rust client for FSUIPC.
//!
//! FSUIPC exposes a flight simulator's state as a flat space of numbered
//! offsets. This crate reads and writes those offsets through a
//! [`Connection`], converting raw bytes to and from [`Value`]s according to a
//! [`DataSpecification`].
//!
//! # Features
//!
//! - **Prepared access**: compute the buffer layout once, then read or write
//!   the same offsets repeatedly with a single transfer each time
//! - **Scoped release**: connections close exactly once, on `close` or drop
//! - **Pluggable links**: the FSUIPC SDK on Windows (`sdk` feature), or
//!   [`MemoryLink`] for tests and tooling on any platform
//! - **Monitoring**: poll a specification in the background and stream
//!   samples with [`Monitor`]
//!
//! # Example
//!
//! ```rust
//! use fsuipc::{Connection, DataSpecification, MemoryLink, Simulator, Value, ValueType};
//!
//! # fn main() -> fsuipc::Result<()> {
//! let link = MemoryLink::new();
//! link.poke(0x0570, &12_000i64.to_le_bytes());
//!
//! let connection = Connection::open(link, Simulator::Any)?;
//! let spec = DataSpecification::new()
//!     .with(0x0570, ValueType::Int64)
//!     .with(0x3d00, ValueType::CString(24));
//!
//! let values = connection.read(&spec)?;
//! assert_eq!(values[0], Value::Int(12_000));
//!
//! connection.close();
//! # Ok(())
//! # }
//! ```

// Core types and error handling
pub mod codec;
pub mod config;
mod error;
pub mod specification;
pub mod types;

// Connection and links
pub mod connection;
pub mod link;

// Background polling
pub mod monitor;
pub mod stream;

// Platform-specific modules
#[cfg(windows)]
pub mod windows;

pub use config::ClientConfig;
pub use connection::{Connection, PreparedData};
pub use error::*;
pub use link::{Link, LinkStats, MemoryLink, MemoryLinkBuilder, Request};
pub use monitor::{Monitor, MonitorSettings, Sample};
pub use specification::{DataSpecification, Field, Layout};
pub use types::*;

#[cfg(all(windows, feature = "sdk"))]
pub use link::SdkLink;

/// Link type returned by [`Fsuipc::connect`].
pub type DynLink = Box<dyn Link + Send>;

/// Entry point for connecting to a running simulator.
///
/// ```rust,no_run
/// use fsuipc::{DataSpecification, Fsuipc, Simulator, ValueType};
///
/// fn main() -> fsuipc::Result<()> {
///     let connection = Fsuipc::connect(Simulator::Any)?;
///     println!("FSUIPC {}", connection.client_version());
///
///     let spec = DataSpecification::new().with(0x0570, ValueType::Int64);
///     let altitude = connection.read(&spec)?;
///     println!("{:?}", altitude);
///     Ok(())
/// }
/// ```
pub struct Fsuipc;

impl Fsuipc {
    /// Open the FSUIPC SDK link to a simulator matching `simulator`.
    ///
    /// # Platform
    ///
    /// Requires Windows and the `sdk` feature. Elsewhere this returns
    /// [`FsuipcError::UnsupportedPlatform`].
    pub fn connect(simulator: Simulator) -> Result<Connection<DynLink>> {
        #[cfg(all(windows, feature = "sdk"))]
        {
            if !crate::windows::server_window_present() {
                tracing::warn!("No FSUIPC server window found, opening anyway");
            }
            Connection::open(Box::new(SdkLink::new()) as DynLink, simulator)
        }

        #[cfg(not(all(windows, feature = "sdk")))]
        {
            tracing::debug!(%simulator, "FSUIPC SDK link not built in");
            Err(FsuipcError::unsupported_platform("FSUIPC SDK link", "Windows with the `sdk` feature"))
        }
    }

    /// Open any [`Link`] implementation.
    pub fn open_with<L: Link>(link: L, simulator: Simulator) -> Result<Connection<L>> {
        Connection::open(link, simulator)
    }
}
