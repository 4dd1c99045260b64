//! This sdboot sub-crate contains the board description language and
//! the code generator that turns it into Rust.
//!
//! NOTE: Nothing in here is linked into the bootloader core. This crate
//! is a dependency of the sdboot **build script**, which parses a RON
//! board file and generates the `configuration` module the core includes
//! (boot policy, flash layout, interface selection, strap mode).

use anyhow::{bail, Result};
use boot::BootConfiguration;
use features::FeatureConfiguration;
use memory::MemoryConfiguration;
use port::Port;
use serde::{Deserialize, Serialize};

pub mod boot;
pub mod codegen;
pub mod features;
pub mod memory;
pub mod port;

/// Upper bound on the boot delay a running application may request, in seconds.
/// The request travels in the low byte of the first signature word.
pub const MAX_REQUESTABLE_DELAY_S: u32 = 0xFF;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Default)]
pub struct Configuration {
    pub port: Port,
    pub memory_configuration: MemoryConfiguration,
    pub boot_configuration: BootConfiguration,
    pub feature_configuration: FeatureConfiguration,
}

impl Configuration {
    /// Parses and validates a RON board file.
    pub fn from_ron(text: &str) -> Result<Self> {
        let configuration: Configuration = ron::from_str(text)?;
        configuration.validate()?;
        Ok(configuration)
    }

    /// Rejects board files that would produce an unsound memory map or
    /// an unreachable recovery path.
    pub fn validate(&self) -> Result<()> {
        let reservation = self.memory_configuration.reservation_bytes();
        if reservation != self.port.reserved_sectors_size() {
            bail!(
                "Bootloader reservation of {}K does not match the {}K occupied by the \
                 reserved sectors of {}",
                reservation / KB!(1),
                self.port.reserved_sectors_size() / KB!(1),
                self.port,
            );
        }

        if !self.port.supports(self.memory_configuration.flash_size) {
            bail!("{} cannot be fitted with {} of flash", self.port, self.memory_configuration.flash_size);
        }

        if let Some(delay) = &self.boot_configuration.boot_delay {
            if delay.max_seconds > MAX_REQUESTABLE_DELAY_S {
                bail!("Maximum boot delay must fit in a byte (got {}s)", delay.max_seconds);
            }
            if delay.offset % 4 != 0 {
                bail!("Boot delay signature offset 0x{:x} is not word aligned", delay.offset);
            }
            let ceiling = self.memory_configuration.image_ceiling();
            if delay.offset.checked_add(8).map_or(true, |end| end > ceiling) {
                bail!("Boot delay signature offset 0x{:x} falls outside the application image", delay.offset);
            }
        }

        let features = &self.feature_configuration;
        if !features.interfaces.usart && !features.interfaces.usb {
            bail!("At least one recovery interface must be enabled");
        }

        if features.silicon.first_bad_offset > self.port.silicon_revision_count() {
            bail!(
                "First bad silicon offset {} is beyond the {} known revisions of {}",
                features.silicon.first_bad_offset,
                self.port.silicon_revision_count(),
                self.port,
            );
        }

        Ok(())
    }

    /// Cargo features the core must be built with to match this board file.
    pub fn required_feature_flags(&self) -> impl Iterator<Item = &'static str> {
        self.port.required_feature_flags()
    }
}
