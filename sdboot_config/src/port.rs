use std::fmt::Display;

use crate::{memory::FlashSize, KB};
use enum_iterator::IntoEnumIterator;
use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize, IntoEnumIterator)]
pub enum Port {
    FmuV2,
}

impl Default for Port {
    fn default() -> Self { Self::FmuV2 }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Family {
    Stm32,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Subfamily {
    Stm32f4,
}

impl Display for Port {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Port::FmuV2 => "fmu_v2",
        })
    }
}

impl Display for Family {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Family::Stm32 => "stm32",
        })
    }
}

impl Display for Subfamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Subfamily::Stm32f4 => "f4",
        })
    }
}

impl Port {
    pub fn family(&self) -> Family {
        match self {
            Port::FmuV2 => Family::Stm32,
        }
    }

    pub fn subfamily(&self) -> Subfamily {
        match self {
            Port::FmuV2 => Subfamily::Stm32f4,
        }
    }

    pub fn required_feature_flags(&self) -> impl Iterator<Item = &'static str> {
        match self {
            Port::FmuV2 => ["fmu_v2"].into_iter(),
        }
    }

    pub fn supports(&self, flash_size: FlashSize) -> bool {
        match self.subfamily() {
            Subfamily::Stm32f4 => {
                matches!(flash_size, FlashSize::OneMegabyte | FlashSize::TwoMegabytes)
            }
        }
    }

    /// Bytes at the start of flash occupied by the bootloader sectors.
    pub fn reserved_sectors_size(&self) -> u32 {
        match self.subfamily() {
            // Sectors 0 and 1, 16K each.
            Subfamily::Stm32f4 => KB!(32),
        }
    }

    /// Entries in the silicon revision table the core carries for this port.
    pub fn silicon_revision_count(&self) -> usize {
        match self.subfamily() {
            Subfamily::Stm32f4 => 5,
        }
    }

    pub fn systick_mhz(&self) -> u32 {
        match self {
            Port::FmuV2 => 168,
        }
    }

    pub fn memory_constants(&self) -> MemoryConstants {
        match self.subfamily() {
            Subfamily::Stm32f4 => MemoryConstants {
                flash_base: 0x0800_0000,
                otp_base: 0x1FFF_7800,
                otp_size: 512,
                unique_id_base: 0x1FFF_7A10,
            },
        }
    }

    // We might consider making these configurable later, but the need hasn't come up yet.
    pub fn linker_script_constants(&self) -> LinkerScriptConstants {
        match self {
            Port::FmuV2 => LinkerScriptConstants {
                flash: LinkerArea { origin: 0x0800_0000, size: KB!(32) as usize },
                ram: LinkerArea { origin: 0x2000_0000, size: KB!(192) as usize },
            },
        }
    }
}

pub struct MemoryConstants {
    pub flash_base: u32,
    pub otp_base: u32,
    pub otp_size: u32,
    pub unique_id_base: u32,
}

pub struct LinkerScriptConstants {
    pub flash: LinkerArea,
    pub ram: LinkerArea,
}

pub struct LinkerArea {
    pub origin: u32,
    pub size: usize,
}
