//! Power-retained register interface.
//!
//! A retained register survives warm resets, but sits in a power domain
//! that must be explicitly opened for access and closed again afterwards.

pub trait BackupRegister {
    fn enable_access(&mut self);
    fn disable_access(&mut self);
    fn read(&self) -> u32;
    fn write(&mut self, value: u32);
}
