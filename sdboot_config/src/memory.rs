use std::fmt::Display;

use serde::{Deserialize, Serialize};

#[macro_export(local_inner_macros)]
macro_rules! KB {
    ($val:expr) => {
        $val * 1024
    };
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlashSize {
    OneMegabyte,
    TwoMegabytes,
}

impl Default for FlashSize {
    fn default() -> Self { Self::TwoMegabytes }
}

impl Display for FlashSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            FlashSize::OneMegabyte => "1M",
            FlashSize::TwoMegabytes => "2M",
        })
    }
}

impl FlashSize {
    pub fn bytes(&self) -> u32 {
        match self {
            FlashSize::OneMegabyte => KB!(1024),
            FlashSize::TwoMegabytes => KB!(2048),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MemoryConfiguration {
    pub flash_size: FlashSize,
    pub bootloader_reservation_kb: u32,
}

impl Default for MemoryConfiguration {
    fn default() -> Self { Self { flash_size: FlashSize::default(), bootloader_reservation_kb: 32 } }
}

impl MemoryConfiguration {
    pub fn reservation_bytes(&self) -> u32 { KB!(self.bootloader_reservation_kb) }

    /// Largest image the recovery path may write, before any silicon limit applies.
    pub fn image_ceiling(&self) -> u32 { self.flash_size.bytes() - self.reservation_bytes() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_ceiling_excludes_the_bootloader_reservation() {
        let memory = MemoryConfiguration::default();
        assert_eq!(memory.image_ceiling(), 2 * 1024 * 1024 - 32 * 1024);

        let memory = MemoryConfiguration { flash_size: FlashSize::OneMegabyte, ..memory };
        assert_eq!(memory.image_ceiling(), 1024 * 1024 - 32 * 1024);
    }
}
