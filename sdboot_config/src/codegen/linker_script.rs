use std::{fs::OpenOptions, io::Write, path::Path};

use crate::Configuration;
use anyhow::Result;

/// Generates the linker script `memory.x`, which confines the bootloader
/// to its reserved sectors so the application region stays untouched.
pub fn generate_linker_script(out_dir: &Path, configuration: &Configuration) -> Result<()> {
    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(out_dir.join("memory.x"))?;

    let constants = configuration.port.linker_script_constants();
    let reservation = configuration.memory_configuration.reservation_bytes() as usize;

    write!(
        file,
        "MEMORY\n\
         {{\n\
             FLASH : ORIGIN = 0x{:08X}, LENGTH = {}K\n\
             RAM : ORIGIN = 0x{:08X}, LENGTH = {}K\n\
         }}\n",
        constants.flash.origin,
        reservation.min(constants.flash.size) / 1024,
        constants.ram.origin,
        constants.ram.size / 1024,
    )?;

    Ok(())
}
