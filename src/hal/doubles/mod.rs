//! Host-side test doubles for every hardware interface in `hal`.
pub mod error;
pub mod flash;
pub mod gpio;
pub mod mcu;
pub mod retained;
pub mod serial;
pub mod storage;
pub mod time;
