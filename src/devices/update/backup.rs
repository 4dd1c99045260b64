use super::{copy::BLOCK_SIZE, *};
use crate::utilities::memory::WORD;
use core::cmp::min;

impl<'a, FS, F, S, L, J> Updater<'a, FS, F, S, L, J>
where
    FS: FileSystem,
    F: Controller,
    F::Error: Convertible,
    S: Write,
    L: Toggle,
    J: Jump,
{
    /// Snapshots the installed application into a new `backup.bin`.
    ///
    /// Sectors are dumped in order up to the first blank one. An existing
    /// backup is never overwritten, and an empty or incomplete snapshot
    /// is removed so it can't later be flashed. Returns the bytes written.
    pub fn back_up_application(&mut self) -> Result<u32, Error> {
        self.storage.mount()?;
        let mut file = self.storage.open(BACKUP_FILE, Mode::WRITE | Mode::CREATE_NEW)?;
        duprintln!(self.console, "Backup: created {}", BACKUP_FILE);

        let result = self.dump_sectors(&mut file);
        let written = self.storage.size(&file);
        self.close(file);
        if result.is_err() || written == 0 {
            if self.storage.delete(BACKUP_FILE).is_err() {
                warn!("Failed to remove an unusable backup");
            }
        }

        match result {
            Ok(bytes) => duprintln!(self.console, "\r\nBackup: finished, {} bytes.", bytes),
            Err(error) => self.report(error),
        }
        result
    }

    fn dump_sectors(&mut self, file: &mut FS::File) -> Result<u32, Error> {
        let mut written = 0u32;
        let mut chunk = [0u8; BLOCK_SIZE];
        for index in 0..self.flash.sector_count() {
            let (base, size) = (self.flash.sector_base(index), self.flash.sector_size(index));
            if self.flash.is_blank(base, size) {
                break;
            }
            for start in (0..size).step_by(BLOCK_SIZE) {
                let length = min(BLOCK_SIZE as u32, size - start) as usize;
                for (i, word) in chunk[..length].chunks_exact_mut(WORD as usize).enumerate() {
                    let offset = base + start + i as u32 * WORD;
                    word.copy_from_slice(&self.flash.read_word(offset).to_le_bytes());
                }
                if self.storage.write(file, &chunk[..length])? < length {
                    return Err(Error::WriteFailure);
                }
                written += length as u32;
            }
            self.progress();
        }
        Ok(written)
    }
}
