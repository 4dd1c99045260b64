//! Complex modules with business logic related to the problem
//! domain, that lay on top of abstract drivers. Devices are
//! generic, while board specifics (pins, board config) are
//! handled in the `ports` module.

pub mod application;
pub mod board;
pub mod boot_decision;
pub mod boot_signature;
pub mod bootloader;
pub mod flash;
pub mod identity;
pub mod led;
pub mod sampling;
pub mod update;
