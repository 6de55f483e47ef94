//! Version fields reported by an open link

use serde::{Deserialize, Serialize};

use super::Simulator;

/// Raw version fields captured when a link is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Versions {
    /// Simulator id reported by FSUIPC (see [`Simulator`])
    pub simulator: u32,
    /// Packed FSUIPC version
    pub fsuipc: u32,
    /// SDK library version
    pub library: u32,
}

impl Versions {
    pub fn simulator(&self) -> Option<Simulator> {
        Simulator::from_raw(self.simulator)
    }

    pub fn fsuipc(&self) -> FsuipcVersion {
        FsuipcVersion(self.fsuipc)
    }

    pub fn library(&self) -> LibraryVersion {
        LibraryVersion(self.library)
    }
}

/// Packed FSUIPC version.
///
/// The top nibble is the major version, the next twelve bits hold the minor
/// version as three BCD digits and the low 16 bits carry a build number
/// shown as a letter (`1` is `a`). `0x10230004` renders as `1.023d`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FsuipcVersion(pub u32);

impl FsuipcVersion {
    pub const fn major(self) -> u32 {
        self.0 >> 28
    }

    pub const fn minor(self) -> u32 {
        (self.0 >> 16) & 0x0fff
    }

    pub const fn build(self) -> u32 {
        self.0 & 0xffff
    }

    /// Build letter, `None` for build 0 or builds past `z`.
    pub fn build_letter(self) -> Option<char> {
        match self.build() {
            0 => None,
            n => char::from_u32('a' as u32 + n - 1).filter(|c| c.is_ascii_lowercase()),
        }
    }
}

impl std::fmt::Display for FsuipcVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:x}.{:03x}", self.major(), self.minor())?;
        match (self.build(), self.build_letter()) {
            (0, _) => Ok(()),
            (_, Some(letter)) => write!(f, "{}", letter),
            (build, None) => write!(f, "+{}", build),
        }
    }
}

/// SDK library version, `major * 1000 + minor`. `54021` renders as `54.021`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LibraryVersion(pub u32);

impl LibraryVersion {
    pub const fn major(self) -> u32 {
        self.0 / 1000
    }

    pub const fn minor(self) -> u32 {
        self.0 % 1000
    }
}

impl std::fmt::Display for LibraryVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{:03}", self.major(), self.minor())
    }
}
