//! Driver implementations for the supported MCU families. They
//! implement the `hal` traits over the raw peripheral access crate,
//! and are only compiled for the target.

#[cfg(feature = "stm32f4_any")]
#[macro_use]
pub mod stm32f4 {
    pub mod backup_domain;
    pub mod dbgmcu;
    pub mod flash;
    #[macro_use]
    pub mod gpio;
    pub mod jump;
    pub mod systick;
}
