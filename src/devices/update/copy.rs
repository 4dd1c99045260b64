use super::*;

/// Transfer unit between removable storage and flash.
pub const BLOCK_SIZE: usize = 512;
/// Blocks between progress reports.
pub const PROGRESS_BLOCKS: u32 = 100;

impl<'a, FS, F, S, L, J> Updater<'a, FS, F, S, L, J>
where
    FS: FileSystem,
    F: Controller,
    F::Error: Convertible,
    S: Write,
    L: Toggle,
    J: Jump,
{
    /// Streams an open file into the application region, from offset zero.
    ///
    /// Only the sectors the image spans are erased. Flash is locked again
    /// on every return path, including a read failure part way through.
    pub(super) fn flash_image(&mut self, file: &mut FS::File) -> Result<(), Error> {
        let size = self.storage.size(file);
        if size == 0 {
            return Err(Error::ImageEmpty);
        }
        if size > u64::from(self.firmware_size_max) {
            return Err(Error::ImageTooBig);
        }
        let size = size as u32;

        let mut flash = self.flash.unlock();
        let sectors = flash.layout().sectors_spanning(size);
        info!("Flashing {} bytes over {} sectors", size, sectors as u32);

        duprint!(self.console, "Erasing     : ");
        for index in 0..sectors {
            flash.erase_sector(index)?;
            self.led.toggle();
            duprint!(self.console, "{}", PROGRESS_TOKEN);
        }

        duprint!(self.console, "\r\nProgramming : ");
        let mut buffer = [0u8; BLOCK_SIZE];
        let mut offset = 0u32;
        let mut blocks = 0u32;
        loop {
            let read = match self.storage.read(file, &mut buffer) {
                Ok(read) => read,
                Err(_) => {
                    duprintln!(self.console, "\r\nFailed to read the file.");
                    return Err(Error::ReadFailure);
                }
            };
            for byte in &buffer[..read] {
                flash.program_byte(offset, *byte)?;
                offset += 1;
            }
            blocks += 1;
            if blocks % PROGRESS_BLOCKS == 0 {
                self.led.toggle();
                duprint!(self.console, "{}", PROGRESS_TOKEN);
            }
            if read < BLOCK_SIZE {
                break;
            }
        }
        duprintln!(self.console, "\r\nAll finished.");
        Ok(())
    }
}
