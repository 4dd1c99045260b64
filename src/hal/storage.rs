//! Removable storage interface.
//!
//! The core consumes a mounted filesystem; the block driver and the
//! filesystem implementation live outside it.
use core::ops::BitOr;

/// File access flags, combinable with `|`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Mode(u8);

impl Mode {
    pub const READ: Mode = Mode(0b001);
    pub const WRITE: Mode = Mode(0b010);
    /// Create the file, failing if it already exists.
    pub const CREATE_NEW: Mode = Mode(0b100);

    pub const fn contains(self, other: Mode) -> bool { self.0 & other.0 == other.0 }
}

impl BitOr for Mode {
    type Output = Mode;
    fn bitor(self, rhs: Mode) -> Mode { Mode(self.0 | rhs.0) }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Error {
    /// The card is absent or did not initialise.
    NotReady,
    /// The card holds no recognisable filesystem.
    NoFilesystem,
    NotFound,
    Exists,
    Denied,
    Io,
}

pub trait FileSystem {
    type File;

    fn mount(&mut self) -> Result<(), Error>;
    fn open(&mut self, name: &str, mode: Mode) -> Result<Self::File, Error>;
    /// Reads up to `buffer.len()` bytes, returning how many were read.
    /// A short count means the end of the file was reached.
    fn read(&mut self, file: &mut Self::File, buffer: &mut [u8]) -> Result<usize, Error>;
    fn write(&mut self, file: &mut Self::File, bytes: &[u8]) -> Result<usize, Error>;
    fn close(&mut self, file: Self::File) -> Result<(), Error>;
    fn delete(&mut self, name: &str) -> Result<(), Error>;
    fn rename(&mut self, from: &str, to: &str) -> Result<(), Error>;
    fn size(&self, file: &Self::File) -> u64;
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn modes_combine() {
        let mode = Mode::WRITE | Mode::CREATE_NEW;
        assert!(mode.contains(Mode::WRITE));
        assert!(mode.contains(Mode::CREATE_NEW));
        assert!(!mode.contains(Mode::READ));
    }
}
