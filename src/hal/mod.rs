//! Hardware Abstraction Layer, containing interfaces
//! for low level drivers.
#![macro_use]

pub mod flash;
pub mod gpio;
pub mod led;
pub mod mcu;
pub mod retained;
pub mod serial;
pub mod storage;
pub mod time;

#[cfg(not(target_arch = "arm"))]
#[doc(hidden)]
pub mod doubles;
