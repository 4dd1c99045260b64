//! Board configuration, generated at build time from a RON board file
//! (see the `sdboot_config` crate).
//!
//! Exposes `BOARD`, `BOOT_POLICY`, `FLASH_LAYOUT`, `INTERFACES`,
//! `FORCE_PIN` and `SILICON`.
include!(concat!(env!("OUT_DIR"), "/board_configuration.rs"));
