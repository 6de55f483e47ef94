//! Simulator identifiers

use serde::{Deserialize, Serialize};

/// Flight simulator families known to FSUIPC.
///
/// Used both as the filter passed when opening a link and to interpret the
/// simulator version reported once connected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
#[repr(u32)]
pub enum Simulator {
    /// Accept whichever simulator is running
    #[default]
    Any = 0,
    Fs98 = 1,
    Fs2k = 2,
    Cfs2 = 3,
    Cfs1 = 4,
    Fly = 5,
    Fs2k2 = 6,
    Fs2k4 = 7,
    Fsx = 8,
    Esp = 9,
    P3d = 10,
    Fsx64 = 11,
    P3d64 = 12,
    Fs2020 = 13,
}

impl Simulator {
    pub const ALL: [Simulator; 14] = [
        Simulator::Any,
        Simulator::Fs98,
        Simulator::Fs2k,
        Simulator::Cfs2,
        Simulator::Cfs1,
        Simulator::Fly,
        Simulator::Fs2k2,
        Simulator::Fs2k4,
        Simulator::Fsx,
        Simulator::Esp,
        Simulator::P3d,
        Simulator::Fsx64,
        Simulator::P3d64,
        Simulator::Fs2020,
    ];

    /// Map a raw SDK simulator id.
    pub fn from_raw(raw: u32) -> Option<Self> {
        Self::ALL.get(raw as usize).copied()
    }

    pub const fn raw(self) -> u32 {
        self as u32
    }

    /// Whether a simulator reported as `actual` satisfies this filter.
    pub fn accepts(self, actual: Simulator) -> bool {
        self == Simulator::Any || self == actual
    }
}

impl std::fmt::Display for Simulator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Simulator::Any => "any",
            Simulator::Fs98 => "FS98",
            Simulator::Fs2k => "FS2000",
            Simulator::Cfs2 => "CFS2",
            Simulator::Cfs1 => "CFS1",
            Simulator::Fly => "Fly!",
            Simulator::Fs2k2 => "FS2002",
            Simulator::Fs2k4 => "FS2004",
            Simulator::Fsx => "FSX",
            Simulator::Esp => "ESP",
            Simulator::P3d => "Prepar3D",
            Simulator::Fsx64 => "FSX 64-bit",
            Simulator::P3d64 => "Prepar3D 64-bit",
            Simulator::Fs2020 => "MSFS 2020",
        };
        f.write_str(name)
    }
}
