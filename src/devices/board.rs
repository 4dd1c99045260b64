//! Board information gathered once during bring-up.
use crate::{
    devices::identity::{read_identity, Identity, SiliconPolicy},
    hal::mcu::IdCode,
    utilities::trace::warn,
};

/// Static description of the board the core was configured for.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct BoardDescription {
    pub name: &'static str,
    /// Total internal flash, bootloader included.
    pub flash_size: u32,
    /// Bytes reserved at the start of flash for the bootloader.
    pub reservation: u32,
    pub systick_mhz: u32,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct BoardInfo {
    pub variant: &'static str,
    pub revision: char,
    /// Largest image the update paths will accept.
    pub firmware_size_max: u32,
    pub systick_mhz: u32,
}

impl BoardDescription {
    /// Image ceiling for this board given the outcome of the silicon check.
    ///
    /// Parts with a known flash erratum may only use the first megabyte,
    /// so the two megabyte ceiling shrinks to one when the check fails.
    pub fn firmware_ceiling(&self, silicon_compatible: bool, limit_small_flash: bool) -> u32 {
        let ceiling = self.flash_size.saturating_sub(self.reservation);
        let two_megabyte_ceiling = mb!(2) - self.reservation;
        if limit_small_flash && !silicon_compatible && ceiling == two_megabyte_ceiling {
            mb!(1) - self.reservation
        } else {
            ceiling
        }
    }

    pub fn info<I: IdCode>(&self, id: &I, silicon: &SiliconPolicy) -> BoardInfo {
        let (Identity { mcu, revision }, compatibility) = read_identity(id, silicon);
        if let Err(error) = compatibility {
            warn!("Silicon check failed: {}", error.description());
        }
        BoardInfo {
            variant: mcu.label,
            revision,
            firmware_size_max: self.firmware_ceiling(compatibility.is_ok(), silicon.limit_small_flash),
            systick_mhz: self.systick_mhz,
        }
    }
}
