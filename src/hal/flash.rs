//! Internal flash controller interface.
//!
//! Addresses are absolute (memory-mapped) and sector selection uses the
//! controller's own hardware sector numbers. Geometry, bounds and
//! alignment policy belong to `devices::flash`; a controller only moves
//! bits. Busy hardware is reported as `nb::Error::WouldBlock`.
use core::fmt;

pub trait Controller {
    type Error: Clone + Copy + fmt::Debug;

    /// Enables erase and program operations.
    fn unlock(&mut self);
    /// Write-protects the flash again.
    fn lock(&mut self);
    fn is_locked(&self) -> bool;

    fn erase_sector(&mut self, hardware_id: u32) -> nb::Result<(), Self::Error>;
    fn program_word(&mut self, address: u32, word: u32) -> nb::Result<(), Self::Error>;
    fn program_byte(&mut self, address: u32, byte: u8) -> nb::Result<(), Self::Error>;

    /// Reads a word-aligned memory-mapped word.
    fn read_word(&self, address: u32) -> u32;
}
