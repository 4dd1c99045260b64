use anyhow::Result;
use std::path::Path;

use crate::Configuration;

mod board;
mod linker_script;
mod prettify;

pub use board::board_configuration;

/// Name of the generated module, relative to the output directory.
pub const BOARD_CONFIGURATION_FILE: &str = "board_configuration.rs";

/// Generates every artifact the core needs from a board file: the
/// `configuration` module source and the bootloader linker script.
pub fn generate_modules<P: AsRef<Path>>(out_dir: P, configuration: &Configuration) -> Result<()> {
    let out_dir = out_dir.as_ref();
    let module = board::generate_board_configuration(out_dir, configuration)?;
    // Formatting only helps readability of the generated source.
    prettify::prettify_file(module).ok();
    linker_script::generate_linker_script(out_dir, configuration)?;
    Ok(())
}
