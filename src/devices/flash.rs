//! Flash memory manager.
//!
//! Presents the application region of internal flash as an ordered
//! table of sectors addressed by *logical offset* from the application
//! load address. Reads are always available; erase and program exist
//! only on the [`Unlocked`] write guard, which re-locks the controller
//! when dropped.
use crate::{
    error::{Convertible, Error},
    hal::flash::Controller,
    utilities::memory::{fits, is_word_aligned, BLANK_WORD, WORD},
};
use nb::block;
use static_assertions::const_assert;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SectorDescriptor {
    pub index: u32,
    pub size: u32,
    /// Sector number as understood by the flash controller.
    pub hardware_id: u32,
}

const fn sector(index: u32, size: u32, hardware_id: u32) -> SectorDescriptor {
    SectorDescriptor { index, size, hardware_id }
}

/// Application sectors of a 1 MiB STM32F4. Sectors 0 and 1 hold the bootloader.
pub const STM32F4_1M_SECTORS: [SectorDescriptor; 10] = [
    sector(0, kb!(16), 0x02),
    sector(1, kb!(16), 0x03),
    sector(2, kb!(64), 0x04),
    sector(3, kb!(128), 0x05),
    sector(4, kb!(128), 0x06),
    sector(5, kb!(128), 0x07),
    sector(6, kb!(128), 0x08),
    sector(7, kb!(128), 0x09),
    sector(8, kb!(128), 0x0a),
    sector(9, kb!(128), 0x0b),
];

/// Application sectors of a 2 MiB STM32F4, second bank included.
pub const STM32F4_2M_SECTORS: [SectorDescriptor; 22] = [
    sector(0, kb!(16), 0x02),
    sector(1, kb!(16), 0x03),
    sector(2, kb!(64), 0x04),
    sector(3, kb!(128), 0x05),
    sector(4, kb!(128), 0x06),
    sector(5, kb!(128), 0x07),
    sector(6, kb!(128), 0x08),
    sector(7, kb!(128), 0x09),
    sector(8, kb!(128), 0x0a),
    sector(9, kb!(128), 0x0b),
    sector(10, kb!(16), 0x10),
    sector(11, kb!(16), 0x11),
    sector(12, kb!(16), 0x12),
    sector(13, kb!(16), 0x13),
    sector(14, kb!(64), 0x14),
    sector(15, kb!(128), 0x15),
    sector(16, kb!(128), 0x16),
    sector(17, kb!(128), 0x17),
    sector(18, kb!(128), 0x18),
    sector(19, kb!(128), 0x19),
    sector(20, kb!(128), 0x1a),
    sector(21, kb!(128), 0x1b),
];

// Indices must be sequential and sizes non-zero, since index order
// defines each sector's offset and a zero size terminates iteration.
const fn is_sound(table: &[SectorDescriptor]) -> bool {
    let mut i = 0;
    while i < table.len() {
        if table[i].index != i as u32 || table[i].size == 0 || table[i].size % WORD != 0 {
            return false;
        }
        i += 1;
    }
    true
}

const fn table_size(table: &[SectorDescriptor]) -> u32 {
    let mut total = 0;
    let mut i = 0;
    while i < table.len() {
        total += table[i].size;
        i += 1;
    }
    total
}

const_assert!(is_sound(&STM32F4_1M_SECTORS));
const_assert!(is_sound(&STM32F4_2M_SECTORS));
const_assert!(table_size(&STM32F4_1M_SECTORS) == kb!(1024) - kb!(32));
const_assert!(table_size(&STM32F4_2M_SECTORS) == kb!(2048) - kb!(32));

/// A board's complete view of non-volatile memory.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct FlashLayout {
    pub sectors: &'static [SectorDescriptor],
    pub flash_base: u32,
    /// Absolute address of logical offset zero.
    pub load_address: u32,
    pub otp_base: u32,
    pub otp_size: u32,
    pub unique_id_base: u32,
}

impl FlashLayout {
    /// Size of sector `index`, or `0` past the end of the table.
    pub fn sector_size(&self, index: usize) -> u32 {
        self.sectors.get(index).map(|s| s.size).unwrap_or(0)
    }

    /// Logical offset of sector `index`: the sum of all preceding sizes.
    pub fn sector_base(&self, index: usize) -> u32 {
        self.sectors.iter().take(index).map(|s| s.size).sum()
    }

    pub fn sector_count(&self) -> usize { self.sectors.len() }

    pub fn total_size(&self) -> u32 { table_size(self.sectors) }

    /// Number of leading sectors needed to hold `length` bytes from offset zero.
    pub fn sectors_spanning(&self, length: u32) -> usize {
        let mut covered = 0u32;
        self.sectors
            .iter()
            .take_while(|s| {
                let needed = covered < length;
                covered = covered.saturating_add(s.size);
                needed
            })
            .count()
    }
}

/// Result of a sector erase request.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(target_arch = "arm", derive(defmt::Format))]
pub enum Erasure {
    Erased,
    /// Blank check passed, the hardware was not touched.
    AlreadyBlank,
    /// No such sector; nothing happened.
    OutOfRange,
}

pub struct FlashManager<F: Controller> {
    controller: F,
    layout: FlashLayout,
}

impl<F: Controller> FlashManager<F>
where
    F::Error: Convertible,
{
    pub fn new(controller: F, layout: FlashLayout) -> Self { Self { controller, layout } }

    pub fn layout(&self) -> &FlashLayout { &self.layout }

    pub fn controller(&self) -> &F { &self.controller }

    pub fn sector_size(&self, index: usize) -> u32 { self.layout.sector_size(index) }

    pub fn sector_base(&self, index: usize) -> u32 { self.layout.sector_base(index) }

    pub fn sector_count(&self) -> usize { self.layout.sector_count() }

    pub fn total_size(&self) -> u32 { self.layout.total_size() }

    /// Word at a logical offset, or `0` if misaligned or out of range.
    pub fn read_word(&self, offset: u32) -> u32 {
        if !is_word_aligned(offset) || !fits(offset, WORD, self.total_size()) {
            return 0;
        }
        self.controller.read_word(self.layout.load_address + offset)
    }

    /// True if every word in `[offset, offset + length)` reads erased.
    /// False for any range not entirely inside the application region.
    pub fn is_blank(&self, offset: u32, length: u32) -> bool {
        fits(offset, length, self.total_size())
            && (0..length).step_by(WORD as usize).all(|i| self.read_word(offset + i) == BLANK_WORD)
    }

    /// Word of the one-time-programmable area, or `0` if misaligned or out of range.
    pub fn read_otp(&self, offset: u32) -> u32 {
        if !is_word_aligned(offset) || !fits(offset, WORD, self.layout.otp_size) {
            return 0;
        }
        self.controller.read_word(self.layout.otp_base + offset)
    }

    /// Word of the factory unique id. Offsets are trusted constants.
    pub fn read_unique_id(&self, offset: u32) -> u32 {
        self.controller.read_word(self.layout.unique_id_base + offset)
    }

    /// Opens the write window. Flash is locked again when the guard drops.
    pub fn unlock(&mut self) -> Unlocked<'_, F> {
        self.controller.unlock();
        Unlocked { manager: self }
    }
}

/// Exclusive write access to the application region.
pub struct Unlocked<'a, F: Controller>
where
    F::Error: Convertible,
{
    manager: &'a mut FlashManager<F>,
}

impl<'a, F: Controller> Unlocked<'a, F>
where
    F::Error: Convertible,
{
    /// Erases sector `index` unless it already reads blank.
    pub fn erase_sector(&mut self, index: usize) -> Result<Erasure, Error> {
        let descriptor = match self.manager.layout.sectors.get(index) {
            Some(descriptor) => *descriptor,
            None => return Ok(Erasure::OutOfRange),
        };
        if self.manager.is_blank(self.manager.sector_base(index), descriptor.size) {
            return Ok(Erasure::AlreadyBlank);
        }
        block!(self.manager.controller.erase_sector(descriptor.hardware_id))?;
        Ok(Erasure::Erased)
    }

    pub fn program_word(&mut self, offset: u32, word: u32) -> Result<(), Error> {
        if !is_word_aligned(offset) {
            return Err(Error::Misaligned);
        }
        let address = self.address(offset, WORD)?;
        block!(self.manager.controller.program_word(address, word))?;
        Ok(())
    }

    pub fn program_byte(&mut self, offset: u32, byte: u8) -> Result<(), Error> {
        let address = self.address(offset, 1)?;
        block!(self.manager.controller.program_byte(address, byte))?;
        Ok(())
    }

    pub fn read_word(&self, offset: u32) -> u32 { self.manager.read_word(offset) }

    pub fn layout(&self) -> &FlashLayout { &self.manager.layout }

    fn address(&self, offset: u32, length: u32) -> Result<u32, Error> {
        if fits(offset, length, self.manager.total_size()) {
            Ok(self.manager.layout.load_address + offset)
        } else {
            Err(Error::InvalidAddress)
        }
    }
}

impl<'a, F: Controller> Drop for Unlocked<'a, F>
where
    F::Error: Convertible,
{
    fn drop(&mut self) { self.manager.controller.lock(); }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::hal::doubles::flash::FakeFlash;

    pub const LAYOUT: FlashLayout = FlashLayout {
        sectors: &STM32F4_2M_SECTORS,
        flash_base: 0x0800_0000,
        load_address: 0x0800_8000,
        otp_base: 0x1FFF_7800,
        otp_size: 512,
        unique_id_base: 0x1FFF_7A10,
    };

    fn manager() -> FlashManager<FakeFlash> { FlashManager::new(FakeFlash::new(&LAYOUT), LAYOUT) }

    #[test]
    fn sector_bases_are_cumulative_and_table_is_terminated() {
        let flash = manager();
        let count = flash.sector_count();
        for i in 0..count {
            let expected: u32 = (0..i).map(|j| flash.sector_size(j)).sum();
            assert_eq!(flash.sector_base(i), expected);
        }
        assert_eq!(flash.sector_size(count), 0);
        assert_eq!(flash.total_size(), kb!(2048) - kb!(32));
    }

    #[test]
    fn one_megabyte_table_stops_at_the_first_bank() {
        assert_eq!(STM32F4_1M_SECTORS.len(), 10);
        assert_eq!(STM32F4_1M_SECTORS[9].hardware_id, 0x0b);
        assert_eq!(STM32F4_2M_SECTORS[10].hardware_id, 0x10);
        assert_eq!(&STM32F4_2M_SECTORS[..10], &STM32F4_1M_SECTORS[..]);
    }

    #[test]
    fn misaligned_or_out_of_range_reads_return_zero() {
        // Given
        let mut flash = manager();
        flash.controller.load_word(0, 0xDEAD_BEEF);
        flash.controller.load_word(4, 0x1234_5678);

        // Then
        assert_eq!(flash.read_word(0), 0xDEAD_BEEF);
        assert_eq!(flash.read_word(4), 0x1234_5678);
        for misaligned in 1..4 {
            assert_eq!(flash.read_word(misaligned), 0);
        }
        assert_eq!(flash.read_word(flash.total_size()), 0);
        assert_eq!(flash.read_word(flash.total_size() - 4), 0xFFFF_FFFF);
    }

    #[test]
    fn erasing_a_blank_sector_does_not_touch_the_hardware() {
        // Given
        let mut flash = manager();

        // When
        let erasure = flash.unlock().erase_sector(3).unwrap();

        // Then
        assert_eq!(erasure, Erasure::AlreadyBlank);
        assert!(flash.controller().erased.is_empty());
    }

    #[test]
    fn erasing_a_dirty_sector_uses_its_hardware_id() {
        // Given
        let mut flash = manager();
        let base = flash.sector_base(4);
        flash.controller.load_word(base + 0x100, 0);

        // When
        let erasure = flash.unlock().erase_sector(4).unwrap();

        // Then
        assert_eq!(erasure, Erasure::Erased);
        assert_eq!(flash.controller().erased, vec![0x06]);
        assert!(flash.is_blank(base, flash.sector_size(4)));

        // When erased again
        let erasure = flash.unlock().erase_sector(4).unwrap();

        // Then nothing more happens
        assert_eq!(erasure, Erasure::AlreadyBlank);
        assert_eq!(flash.controller().erased.len(), 1);
    }

    #[test]
    fn erasing_past_the_table_is_a_no_op() {
        let mut flash = manager();
        let count = flash.sector_count();
        assert_eq!(flash.unlock().erase_sector(count).unwrap(), Erasure::OutOfRange);
        assert!(flash.controller().erased.is_empty());
    }

    #[test]
    fn write_guard_relocks_on_every_exit_path() {
        // Given
        let mut flash = manager();
        assert!(flash.controller().is_locked());

        // When
        let result: Result<(), Error> = (|| {
            let mut unlocked = flash.unlock();
            unlocked.program_word(0, 0x0000_00AA)?;
            unlocked.program_word(2, 0)?;
            Ok(())
        })();

        // Then
        assert_eq!(result, Err(Error::Misaligned));
        assert!(flash.controller().is_locked());
        assert_eq!(flash.controller().unlocks, 1);
        assert_eq!(flash.controller().locks, 1);
        assert_eq!(flash.read_word(0), 0x0000_00AA);
    }

    #[test]
    fn invalid_program_requests_perform_no_hardware_access() {
        // Given
        let mut flash = manager();
        let end = flash.total_size();

        // When
        let mut unlocked = flash.unlock();
        let misaligned = unlocked.program_word(1, 0);
        let beyond = unlocked.program_byte(end, 0);
        let beyond_word = unlocked.program_word(end, 0);
        drop(unlocked);

        // Then
        assert_eq!(misaligned, Err(Error::Misaligned));
        assert_eq!(beyond, Err(Error::InvalidAddress));
        assert_eq!(beyond_word, Err(Error::InvalidAddress));
        assert_eq!(flash.controller().bytes_programmed, 0);
    }

    #[test]
    fn bytes_are_programmed_at_the_load_offset() {
        // Given
        let mut flash = manager();

        // When
        {
            let mut unlocked = flash.unlock();
            for (i, byte) in [0x11u8, 0x22, 0x33, 0x44].iter().enumerate() {
                unlocked.program_byte(0x10 + i as u32, *byte).unwrap();
            }
        }

        // Then
        assert_eq!(flash.read_word(0x10), 0x4433_2211);
        assert_eq!(flash.controller().image(0x10, 4), &[0x11, 0x22, 0x33, 0x44]);
    }

    #[test]
    fn busy_controller_is_waited_out() {
        let mut flash = FlashManager::new(FakeFlash::new(&LAYOUT).with_busy_polls(3), LAYOUT);
        flash.unlock().program_word(0, 0x0102_0304).unwrap();
        assert_eq!(flash.read_word(0), 0x0102_0304);
    }

    #[test]
    fn otp_reads_are_bounds_checked() {
        // Given
        let mut flash = manager();
        flash.controller.set_otp_word(0, 0xCAFE_F00D);
        flash.controller.set_otp_word(508, 0x0BAD_CAFE);

        // Then
        assert_eq!(flash.read_otp(0), 0xCAFE_F00D);
        assert_eq!(flash.read_otp(508), 0x0BAD_CAFE);
        assert_eq!(flash.read_otp(512), 0);
        assert_eq!(flash.read_otp(2), 0);
    }

    #[test]
    fn blank_checks_outside_the_region_are_refused() {
        // Given
        let flash = manager();
        let end = flash.total_size();

        // Then
        assert!(flash.is_blank(end - 8, 8));
        assert!(!flash.is_blank(end - 4, 8));
        assert!(!flash.is_blank(u32::MAX - 3, 8));
        assert!(!flash.is_blank(u32::MAX, 1));
    }

    #[test]
    fn unique_id_is_read_word_by_word() {
        let mut flash = manager();
        flash.controller.unique_id = [1, 0, 0, 0, 2, 0, 0, 0, 3, 0, 0, 0];
        assert_eq!(
            [flash.read_unique_id(0), flash.read_unique_id(4), flash.read_unique_id(8)],
            [1, 2, 3]
        );
    }

    #[test]
    fn sectors_spanning_covers_partial_sectors() {
        assert_eq!(LAYOUT.sectors_spanning(0), 0);
        assert_eq!(LAYOUT.sectors_spanning(1), 1);
        assert_eq!(LAYOUT.sectors_spanning(kb!(16)), 1);
        assert_eq!(LAYOUT.sectors_spanning(kb!(96)), 3);
        assert_eq!(LAYOUT.sectors_spanning(kb!(100)), 4);
        assert_eq!(LAYOUT.sectors_spanning(LAYOUT.total_size()), 22);
    }
}
