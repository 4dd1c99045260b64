//! # SD Recovery Bootloader Library
//!
//! Board support and recovery core of a Cortex-M bootloader that
//! decides, on every reset, whether to run the installed application
//! or to stay in recovery mode, and that can reflash the application
//! from files on removable storage before deciding.
//!
//! Everything hardware facing sits behind the traits in [`hal`], so the
//! decision engine, the flash manager and the update pipeline run (and
//! are tested) on the host against the doubles in `hal::doubles`.
#![cfg_attr(test, allow(unused_imports))]
#![cfg_attr(target_arch = "arm", no_std)]

#[cfg(all(target_arch = "arm", feature = "stm32f427"))]
pub use stm32f4::stm32f427 as stm32pac;

#[cfg(target_arch = "arm")]
use defmt_rtt as _;

#[macro_use]
pub mod utilities {
    mod macros;
    pub mod guard;
    pub mod memory;
    pub(crate) mod trace;
}

pub mod configuration;
pub mod devices;
pub mod error;
pub mod hal;

#[cfg(all(target_arch = "arm", feature = "stm32f4_any"))]
#[macro_use]
pub mod drivers;

#[cfg(all(target_arch = "arm", feature = "stm32f4_any"))]
pub mod ports;
