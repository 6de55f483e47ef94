//! FSUIPC SDK result codes

/// Result codes reported by the FSUIPC SDK.
///
/// The numeric values match the `FSUIPC_ERR_*` constants of the SDK headers.
/// Codes outside the known table are preserved as [`ErrorCode::Unknown`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    Ok,
    Open,
    NoFs,
    RegMsg,
    Atom,
    Map,
    View,
    Version,
    WrongFs,
    NotOpen,
    NoData,
    Timeout,
    SendMsg,
    Data,
    Running,
    Size,
    Unknown(u32),
}

impl ErrorCode {
    /// All codes with a defined meaning, in numeric order.
    pub const ALL: [ErrorCode; 16] = [
        ErrorCode::Ok,
        ErrorCode::Open,
        ErrorCode::NoFs,
        ErrorCode::RegMsg,
        ErrorCode::Atom,
        ErrorCode::Map,
        ErrorCode::View,
        ErrorCode::Version,
        ErrorCode::WrongFs,
        ErrorCode::NotOpen,
        ErrorCode::NoData,
        ErrorCode::Timeout,
        ErrorCode::SendMsg,
        ErrorCode::Data,
        ErrorCode::Running,
        ErrorCode::Size,
    ];

    /// Map a raw SDK result value to a code.
    pub const fn from_raw(raw: u32) -> Self {
        match raw {
            0 => ErrorCode::Ok,
            1 => ErrorCode::Open,
            2 => ErrorCode::NoFs,
            3 => ErrorCode::RegMsg,
            4 => ErrorCode::Atom,
            5 => ErrorCode::Map,
            6 => ErrorCode::View,
            7 => ErrorCode::Version,
            8 => ErrorCode::WrongFs,
            9 => ErrorCode::NotOpen,
            10 => ErrorCode::NoData,
            11 => ErrorCode::Timeout,
            12 => ErrorCode::SendMsg,
            13 => ErrorCode::Data,
            14 => ErrorCode::Running,
            15 => ErrorCode::Size,
            other => ErrorCode::Unknown(other),
        }
    }

    /// The raw SDK value.
    pub const fn raw(self) -> u32 {
        match self {
            ErrorCode::Ok => 0,
            ErrorCode::Open => 1,
            ErrorCode::NoFs => 2,
            ErrorCode::RegMsg => 3,
            ErrorCode::Atom => 4,
            ErrorCode::Map => 5,
            ErrorCode::View => 6,
            ErrorCode::Version => 7,
            ErrorCode::WrongFs => 8,
            ErrorCode::NotOpen => 9,
            ErrorCode::NoData => 10,
            ErrorCode::Timeout => 11,
            ErrorCode::SendMsg => 12,
            ErrorCode::Data => 13,
            ErrorCode::Running => 14,
            ErrorCode::Size => 15,
            ErrorCode::Unknown(raw) => raw,
        }
    }

    /// Human readable description, as worded by the SDK.
    pub const fn description(self) -> &'static str {
        match self {
            ErrorCode::Ok => "OK",
            ErrorCode::Open => "Attempt to Open when already Open",
            ErrorCode::NoFs => "Cannot link to FSUIPC or WideClient",
            ErrorCode::RegMsg => "Failed to Register common message with Windows",
            ErrorCode::Atom => "Failed to create Atom for mapping filename",
            ErrorCode::Map => "Failed to create a file mapping object",
            ErrorCode::View => "Failed to open a view to the file map",
            ErrorCode::Version => "Incorrect version of FSUIPC, or not FSUIPC",
            ErrorCode::WrongFs => "Sim is not version requested",
            ErrorCode::NotOpen => "Call cannot execute, link not Open",
            ErrorCode::NoData => "Call cannot execute: no requests accumulated",
            ErrorCode::Timeout => "IPC timed out all retries",
            ErrorCode::SendMsg => "IPC sendmessage failed all retries",
            ErrorCode::Data => "IPC request contains bad data",
            ErrorCode::Running => {
                "Maybe running on WideClient, but FS not running on Server, or wrong FSUIPC"
            }
            ErrorCode::Size => "Read or Write request cannot be added, memory for Process is full",
            ErrorCode::Unknown(_) => "Unknown error",
        }
    }

    /// Whether the condition may clear up on its own (simulator starting, busy IPC).
    pub const fn is_transient(self) -> bool {
        matches!(
            self,
            ErrorCode::NoFs | ErrorCode::Timeout | ErrorCode::SendMsg | ErrorCode::Running
        )
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.raw(), self.description())
    }
}
