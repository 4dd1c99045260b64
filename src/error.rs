//! Error types and methods for the bootloader core

use crate::hal::{serial::Write, storage};
use ufmt::uwriteln;

/// Top level error type for the bootloader. Unlike the specific
/// module errors, this error contains textual descriptions of the
/// problem as it is meant to be directly reported through the console.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Error {
    /// Error caused by a low level peripheral driver
    DriverError(&'static str),
    /// Error caused by a faulty configuration
    ConfigurationError(&'static str),
    /// Silicon revision with a known flash erratum
    Incompatible(char),
    StorageUnavailable,
    FileAbsent,
    ReadFailure,
    WriteFailure,
    InvalidAddress,
    Misaligned,
    ImageEmpty,
    ImageTooBig,
    ApplicationInvalid,
}

pub trait Convertible {
    fn into(self) -> Error;
}
impl<T: Convertible> From<T> for Error {
    fn from(t: T) -> Self { t.into() }
}

impl Convertible for storage::Error {
    fn into(self) -> Error {
        match self {
            storage::Error::NotReady | storage::Error::NoFilesystem => Error::StorageUnavailable,
            storage::Error::NotFound => Error::FileAbsent,
            storage::Error::Exists | storage::Error::Denied | storage::Error::Io => {
                Error::WriteFailure
            }
        }
    }
}

impl Error {
    /// Short description, suitable for developer trace.
    pub fn description(&self) -> &'static str {
        match self {
            Error::DriverError(text) | Error::ConfigurationError(text) => *text,
            Error::Incompatible(_) => "Silicon revision is incompatible",
            Error::StorageUnavailable => "Removable storage unavailable",
            Error::FileAbsent => "File not found",
            Error::ReadFailure => "Failed to read from removable storage",
            Error::WriteFailure => "Failed to write to removable storage",
            Error::InvalidAddress => "Flash address out of range",
            Error::Misaligned => "Flash access misaligned",
            Error::ImageEmpty => "Firmware image is empty",
            Error::ImageTooBig => "Firmware image too big",
            Error::ApplicationInvalid => "No valid application installed",
        }
    }

    /// Reports error via abstract serial device
    pub fn report<S: Write>(&self, serial: &mut S) {
        match self {
            Error::DriverError(text) => uwriteln!(serial, "[Driver Error] -> {}", *text),
            Error::ConfigurationError(text) => {
                uwriteln!(serial, "[Configuration Error] -> {}", *text)
            }
            Error::Incompatible(revision) => {
                let mut buffer = [0u8; 4];
                let revision: &str = revision.encode_utf8(&mut buffer);
                uwriteln!(serial, "[Silicon Error] -> Revision {} is known bad", revision)
            }
            Error::StorageUnavailable | Error::FileAbsent | Error::ReadFailure | Error::WriteFailure => {
                uwriteln!(serial, "[Storage Error] -> {}", self.description())
            }
            Error::InvalidAddress | Error::Misaligned => {
                uwriteln!(serial, "[Flash Error] -> {}", self.description())
            }
            Error::ImageEmpty | Error::ImageTooBig | Error::ApplicationInvalid => {
                uwriteln!(serial, "[Logic Error] -> {}", self.description())
            }
        }
        .ok();
    }
}
