//! Removable-media firmware update.
//!
//! Looks for update artifacts on a mounted card and streams whichever
//! one it finds into the application region:
//!
//! * `old` marks an image applied on a previous pass, and is deleted.
//! * `backup.bin` is a recovery image. It is flashed, deleted and
//!   jumped to straight away, and takes priority over `fw.bin`.
//! * `fw.bin` is a new image. It is flashed and renamed to `old`, so the
//!   same image is not flashed again on the next pass.
//!
//! A failure while reading an artifact leaves the flash partially
//! programmed and the artifact in place, so the next pass starts over.
use crate::{
    devices::{application::launch, flash::FlashManager},
    error::{Convertible, Error},
    hal::{
        flash::Controller,
        led::Toggle,
        mcu::Jump,
        serial::Write,
        storage::{FileSystem, Mode},
    },
    utilities::trace::{info, warn},
};

mod backup;
mod copy;

pub const OLD_FILE: &str = "old";
pub const BACKUP_FILE: &str = "backup.bin";
pub const FIRMWARE_FILE: &str = "fw.bin";

/// Status token printed for every unit of progress.
pub const PROGRESS_TOKEN: &str = "#";

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// No card, or no filesystem on it.
    Unavailable,
    /// Nothing to flash.
    Idle,
    /// A backup image was flashed and the jump to it returned.
    Restored,
    /// A new image was flashed and marked as consumed.
    Updated,
    /// Flashing an artifact failed part way, or never started.
    Aborted(Error),
}

pub struct Updater<'a, FS, F, S, L, J>
where
    FS: FileSystem,
    F: Controller,
    F::Error: Convertible,
    S: Write,
    L: Toggle,
    J: Jump,
{
    storage: &'a mut FS,
    flash: &'a mut FlashManager<F>,
    console: &'a mut Option<S>,
    led: &'a mut L,
    jumper: &'a mut J,
    firmware_size_max: u32,
}

impl<'a, FS, F, S, L, J> Updater<'a, FS, F, S, L, J>
where
    FS: FileSystem,
    F: Controller,
    F::Error: Convertible,
    S: Write,
    L: Toggle,
    J: Jump,
{
    pub fn new(
        storage: &'a mut FS,
        flash: &'a mut FlashManager<F>,
        console: &'a mut Option<S>,
        led: &'a mut L,
        jumper: &'a mut J,
        firmware_size_max: u32,
    ) -> Self {
        Self { storage, flash, console, led, jumper, firmware_size_max }
    }

    /// Runs a single update pass.
    pub fn run(&mut self) -> Outcome {
        duprintln!(self.console, "Checking removable storage...");
        if let Err(error) = self.storage.mount() {
            let error = Error::from(error);
            warn!("Update skipped: {}", error.description());
            self.report(error);
            return Outcome::Unavailable;
        }

        self.discard_old();

        if let Ok(file) = self.storage.open(BACKUP_FILE, Mode::READ) {
            return self.restore_backup(file);
        }
        duprintln!(self.console, "No {} found.", BACKUP_FILE);

        match self.storage.open(FIRMWARE_FILE, Mode::READ) {
            Ok(file) => self.apply_update(file),
            Err(_) => {
                duprintln!(self.console, "No {} found.", FIRMWARE_FILE);
                Outcome::Idle
            }
        }
    }

    fn discard_old(&mut self) {
        if let Ok(file) = self.storage.open(OLD_FILE, Mode::READ) {
            duprintln!(self.console, "Found {}, deleting it.", OLD_FILE);
            self.close(file);
            if self.storage.delete(OLD_FILE).is_err() {
                warn!("Failed to delete the previous image marker");
            }
        }
    }

    fn restore_backup(&mut self, mut file: FS::File) -> Outcome {
        duprintln!(self.console, "Found {}, restoring the application.", BACKUP_FILE);
        let result = self.flash_image(&mut file);
        self.close(file);
        if let Err(error) = result {
            self.report(error);
            return Outcome::Aborted(error);
        }

        if self.storage.delete(BACKUP_FILE).is_err() {
            warn!("Failed to delete the backup image");
        }
        let error = launch(self.flash, self.firmware_size_max, self.jumper);
        warn!("Restored application could not be entered: {}", error.description());
        Outcome::Restored
    }

    fn apply_update(&mut self, mut file: FS::File) -> Outcome {
        duprintln!(self.console, "Found {}, updating the application.", FIRMWARE_FILE);
        let result = self.flash_image(&mut file);
        self.close(file);
        if let Err(error) = result {
            self.report(error);
            return Outcome::Aborted(error);
        }

        if self.storage.rename(FIRMWARE_FILE, OLD_FILE).is_err() {
            warn!("Failed to mark the new image as consumed");
        }
        info!("Application updated");
        Outcome::Updated
    }

    fn close(&mut self, file: FS::File) {
        if self.storage.close(file).is_err() {
            warn!("Failed to close a file on removable storage");
        }
    }

    fn progress(&mut self) {
        self.led.toggle();
        duprint!(self.console, "{}", PROGRESS_TOKEN);
    }

    fn report(&mut self, error: Error) {
        if let Some(console) = self.console.as_mut() {
            error.report(console);
        }
    }
}

#[cfg(test)]
pub(crate) mod test {
    use super::*;
    use crate::{
        devices::{
            flash::{FlashLayout, STM32F4_2M_SECTORS},
            led::{Logic, MonochromeLed},
        },
        hal::{
            doubles::{
                flash::FakeFlash,
                gpio::MockPin,
                mcu::RecordingJumper,
                serial::RecordingSerial,
                storage::FakeFileSystem,
            },
            storage,
        },
    };

    pub const LAYOUT: FlashLayout = FlashLayout {
        sectors: &STM32F4_2M_SECTORS,
        flash_base: 0x0800_0000,
        load_address: 0x0800_8000,
        otp_base: 0x1FFF_7800,
        otp_size: 512,
        unique_id_base: 0x1FFF_7A10,
    };

    pub const CEILING: u32 = mb!(2) - kb!(32);

    /// Everything an update pass touches, kept alive across passes.
    pub struct Rig {
        pub storage: FakeFileSystem,
        pub flash: FlashManager<FakeFlash>,
        pub console: Option<RecordingSerial>,
        pub led: MonochromeLed<MockPin>,
        pub jumper: RecordingJumper,
    }

    impl Rig {
        pub fn new(storage: FakeFileSystem) -> Self {
            Self {
                storage,
                flash: FlashManager::new(FakeFlash::new(&LAYOUT), LAYOUT),
                console: Some(RecordingSerial::default()),
                led: MonochromeLed::new(MockPin::default(), Logic::Direct),
                jumper: RecordingJumper::default(),
            }
        }

        pub fn updater(
            &mut self,
        ) -> Updater<'_, FakeFileSystem, FakeFlash, RecordingSerial, MonochromeLed<MockPin>, RecordingJumper>
        {
            Updater::new(
                &mut self.storage,
                &mut self.flash,
                &mut self.console,
                &mut self.led,
                &mut self.jumper,
                CEILING,
            )
        }

        pub fn run(&mut self) -> Outcome { self.updater().run() }

        pub fn fake(&self) -> &FakeFlash { self.flash.controller() }

        pub fn console(&self) -> &str { self.console.as_ref().map(|c| c.text.as_str()).unwrap_or("") }
    }

    /// Recognisable image content with a plausible vector table.
    pub fn image(length: usize) -> Vec<u8> {
        let mut bytes: Vec<u8> = (0..length).map(|i| (i % 251) as u8).collect();
        if length >= 8 {
            bytes[0..4].copy_from_slice(&0x2002_0000u32.to_le_bytes());
            bytes[4..8].copy_from_slice(&0x0800_8201u32.to_le_bytes());
        }
        bytes
    }

    #[test]
    fn new_image_is_flashed_and_marked_as_consumed() {
        // Given
        let firmware = image(kb!(100) as usize);
        let mut rig = Rig::new(FakeFileSystem::with_files([(FIRMWARE_FILE, firmware.clone())]));

        // When
        let outcome = rig.run();

        // Then
        assert_eq!(outcome, Outcome::Updated);
        assert_eq!(rig.fake().image(0, firmware.len()), &firmware[..]);
        assert_eq!(rig.fake().bytes_programmed, firmware.len());
        assert!(rig.storage.contains(OLD_FILE));
        assert!(!rig.storage.contains(FIRMWARE_FILE));
        assert_eq!(rig.storage.operations, ["rename fw.bin old"]);
        assert!(rig.jumper.jumps.is_empty());
        assert!(rig.fake().locked);
        assert_eq!(rig.storage.open_handles, 0);
    }

    #[test]
    fn only_sectors_covering_the_image_are_erased() {
        // Given a fully programmed application region
        let mut rig = Rig::new(FakeFileSystem::with_files([(FIRMWARE_FILE, image(kb!(100) as usize))]));
        let mut fake = FakeFlash::new(&LAYOUT);
        fake.load(0, &vec![0u8; LAYOUT.total_size() as usize]);
        rig.flash = FlashManager::new(fake, LAYOUT);

        // When
        rig.run();

        // Then 16K + 16K + 64K + 128K covers 100K
        assert_eq!(rig.fake().erased, [0x02, 0x03, 0x04, 0x05]);
        assert_eq!(rig.fake().image(kb!(224), 4), [0, 0, 0, 0]);
    }

    #[test]
    fn blank_sectors_are_not_erased_again() {
        // Given
        let mut rig = Rig::new(FakeFileSystem::with_files([(FIRMWARE_FILE, image(kb!(100) as usize))]));

        // When
        rig.run();

        // Then
        assert!(rig.fake().erased.is_empty());
        assert_eq!(rig.fake().locks, 1);
    }

    #[test]
    fn progress_is_reported_per_sector_and_every_hundred_blocks() {
        // Given 250 full blocks plus a short one
        let firmware = image(250 * 512 + 10);
        let mut rig = Rig::new(FakeFileSystem::with_files([(FIRMWARE_FILE, firmware)]));

        // When
        rig.run();

        // Then two tokens for blocks 100 and 200, four for the sectors
        // spanning 125K
        assert_eq!(rig.console.as_ref().unwrap().count(PROGRESS_TOKEN), 6);
        assert_eq!(rig.led.pin().changes.len(), 1 + 6);
    }

    #[test]
    fn backup_image_takes_priority_and_is_jumped_to() {
        // Given
        let backup = image(kb!(40) as usize);
        let mut rig = Rig::new(FakeFileSystem::with_files([
            (BACKUP_FILE, backup.clone()),
            (FIRMWARE_FILE, image(kb!(100) as usize)),
        ]));

        // When
        let outcome = rig.run();

        // Then
        assert_eq!(outcome, Outcome::Restored);
        assert_eq!(rig.fake().image(0, backup.len()), &backup[..]);
        assert!(!rig.storage.contains(BACKUP_FILE));
        assert!(rig.storage.contains(FIRMWARE_FILE));
        assert_eq!(rig.storage.operations, ["delete backup.bin"]);
        assert_eq!(rig.jumper.jumps, [LAYOUT.load_address]);
    }

    #[test]
    fn previous_marker_is_removed_without_touching_flash() {
        // Given
        let mut rig = Rig::new(FakeFileSystem::with_files([(OLD_FILE, image(64))]));

        // When
        let outcome = rig.run();

        // Then
        assert_eq!(outcome, Outcome::Idle);
        assert!(rig.storage.files.is_empty());
        assert_eq!(rig.storage.operations, ["delete old"]);
        assert_eq!(rig.fake().unlocks, 0);
        assert_eq!(rig.fake().bytes_programmed, 0);
    }

    #[test]
    fn read_failure_leaves_the_image_for_the_next_pass() {
        // Given a card that fails after 40% of the image
        let firmware = image(kb!(100) as usize);
        let failing_at = firmware.len() * 4 / 10;
        let storage = FakeFileSystem::with_files([(FIRMWARE_FILE, firmware.clone())])
            .fail_reads_after(FIRMWARE_FILE, failing_at);
        let mut rig = Rig::new(storage);

        // When
        let outcome = rig.run();

        // Then
        assert_eq!(outcome, Outcome::Aborted(Error::ReadFailure));
        assert!(rig.storage.contains(FIRMWARE_FILE));
        assert!(rig.storage.operations.is_empty());
        assert!(rig.fake().locked);
        let programmed = rig.fake().bytes_programmed;
        assert!(programmed >= failing_at && programmed < firmware.len());
        assert!(rig.console().contains("[Storage Error]"));

        // When the card recovers
        rig.storage.read_failure = None;
        let outcome = rig.run();

        // Then the image is flashed again from the start
        assert_eq!(outcome, Outcome::Updated);
        assert_eq!(rig.fake().bytes_programmed, programmed + firmware.len());
        assert_eq!(rig.fake().image(0, firmware.len()), &firmware[..]);
    }

    #[test]
    fn failed_backup_is_neither_deleted_nor_jumped_to() {
        // Given
        let storage = FakeFileSystem::with_files([(BACKUP_FILE, image(kb!(8) as usize))])
            .fail_reads_after(BACKUP_FILE, 1024);
        let mut rig = Rig::new(storage);

        // When
        let outcome = rig.run();

        // Then
        assert_eq!(outcome, Outcome::Aborted(Error::ReadFailure));
        assert!(rig.storage.contains(BACKUP_FILE));
        assert!(rig.jumper.jumps.is_empty());
        assert!(rig.fake().locked);
    }

    #[test]
    fn missing_card_makes_the_pass_a_no_op() {
        // Given
        let mut rig = Rig::new(FakeFileSystem::unavailable(storage::Error::NotReady));

        // When
        let outcome = rig.run();

        // Then
        assert_eq!(outcome, Outcome::Unavailable);
        assert_eq!(rig.fake().unlocks, 0);
        assert!(rig.console().contains("Removable storage unavailable"));
    }

    #[test]
    fn empty_and_oversized_images_never_reach_flash() {
        for (firmware, error) in [
            (Vec::new(), Error::ImageEmpty),
            (vec![0u8; CEILING as usize + 1], Error::ImageTooBig),
        ] {
            // Given
            let mut rig = Rig::new(FakeFileSystem::with_files([(FIRMWARE_FILE, firmware)]));

            // When
            let outcome = rig.run();

            // Then
            assert_eq!(outcome, Outcome::Aborted(error));
            assert_eq!(rig.fake().unlocks, 0);
            assert!(rig.storage.contains(FIRMWARE_FILE));
        }
    }
}
