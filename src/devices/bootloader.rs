//! Generic Bootloader.
//!
//! This module contains the control flow of the bootloader, with
//! the exception of how to construct one. Construction is
//! handled by the `port` module as it depends on board
//! specific information.
//!
//! On start the decision engine runs once. If it favours the
//! application, pending updates are applied and the application is
//! entered. Otherwise (or if the application could not be entered)
//! the recovery service runs in a loop, and each time it returns the
//! bootloader updates from removable storage and tries to jump again.
use crate::{
    devices::{
        application::launch,
        board::BoardInfo,
        boot_decision::{Decision, Engine, Signals},
        boot_signature::SignatureStore,
        flash::FlashManager,
        sampling::Probe,
        update::{Outcome, Updater},
    },
    error::{Convertible, Error},
    hal::{
        flash::Controller,
        led::Toggle,
        mcu::Jump,
        retained::BackupRegister,
        serial::Write,
        storage::FileSystem,
        time::Milliseconds,
    },
    utilities::trace::{info, warn},
};

/// Host-facing transports a board offers to the recovery service.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Interfaces {
    pub usart: bool,
    pub usb: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(target_arch = "arm", derive(defmt::Format))]
pub enum Transport {
    Usart,
    Usb,
}

/// Interactive recovery protocol, served over the board's transports.
pub trait RecoveryService<F: Controller>
where
    F::Error: Convertible,
{
    /// Brings up one transport. Called once per enabled transport.
    fn init_transport(&mut self, transport: Transport);

    /// Serves host requests until the timeout elapses or an image has
    /// been accepted. A zero timeout only returns on an accepted image.
    fn run(&mut self, flash: &mut FlashManager<F>, timeout: Milliseconds);
}

/// Result of one pass through the recovery loop.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Pass {
    /// The strap or a serial break still asks to stay in recovery.
    StillRequested,
    /// Updates were applied and the application could not be entered.
    BootFailed(Outcome),
}

pub struct Bootloader<F, R, FS, S, L, J, ST, VB, BR>
where
    F: Controller,
    F::Error: Convertible,
    R: BackupRegister,
    FS: FileSystem,
    S: Write,
    L: Toggle,
    J: Jump,
    ST: Probe,
    VB: Probe,
    BR: Probe,
{
    pub(crate) flash: FlashManager<F>,
    pub(crate) signature: SignatureStore<R>,
    pub(crate) storage: FS,
    pub(crate) console: Option<S>,
    pub(crate) led: L,
    pub(crate) jumper: J,
    pub(crate) signals: Signals<ST, VB, BR>,
    pub(crate) engine: Engine,
    pub(crate) interfaces: Interfaces,
    pub(crate) board: BoardInfo,
    pub(crate) timeout: Milliseconds,
}

impl<F, R, FS, S, L, J, ST, VB, BR> Bootloader<F, R, FS, S, L, J, ST, VB, BR>
where
    F: Controller,
    F::Error: Convertible,
    R: BackupRegister,
    FS: FileSystem,
    S: Write,
    L: Toggle,
    J: Jump,
    ST: Probe,
    VB: Probe,
    BR: Probe,
{
    /// Main bootloader routine. Only returns through a jump.
    pub fn run<RS: RecoveryService<F>>(mut self, service: &mut RS) -> ! {
        self.start(service);
        loop {
            self.cycle(service);
        }
    }

    /// Decides how to boot, attempts the application if allowed, and
    /// brings up the recovery transports.
    pub fn start<RS: RecoveryService<F>>(&mut self, service: &mut RS) -> Decision {
        let mut revision = [0u8; 4];
        let revision: &str = self.board.revision.encode_utf8(&mut revision);
        duprintln!(self.console, "-- sdboot on {} rev {} --", self.board.variant, revision);

        let decision = self.engine.evaluate(&mut self.signature, &self.flash, &mut self.signals);
        self.timeout = decision.timeout();

        if decision == Decision::BootApp {
            info!("Booting the application");
            self.attempt_boot();
            // The application could not be entered; stay here until
            // something is uploaded.
            self.signature.arm_deadman();
            self.timeout = Milliseconds::FOREVER;
        }

        if self.interfaces.usart {
            service.init_transport(Transport::Usart);
        }
        if self.interfaces.usb {
            service.init_transport(Transport::Usb);
        }
        decision
    }

    /// Runs the recovery service once, then tries to leave recovery.
    pub fn cycle<RS: RecoveryService<F>>(&mut self, service: &mut RS) -> Pass {
        service.run(&mut self.flash, self.timeout);

        if self.signals.still_requested() {
            return Pass::StillRequested;
        }

        let outcome = self.attempt_boot();
        warn!("Failed to enter the application, staying in recovery");
        self.timeout = Milliseconds::FOREVER;
        Pass::BootFailed(outcome)
    }

    pub fn timeout(&self) -> Milliseconds { self.timeout }

    /// Copies the installed application to `backup.bin` on the card.
    ///
    /// Nothing in the boot flow calls this; it is the entry point for a
    /// recovery service command (or a board port) that offers snapshots.
    pub fn back_up_application(&mut self) -> Result<u32, Error> {
        self.updater().back_up_application()
    }

    fn updater(&mut self) -> Updater<'_, FS, F, S, L, J> {
        Updater::new(
            &mut self.storage,
            &mut self.flash,
            &mut self.console,
            &mut self.led,
            &mut self.jumper,
            self.board.firmware_size_max,
        )
    }

    /// Applies pending updates and jumps. Returns if the jump fails.
    fn attempt_boot(&mut self) -> Outcome {
        if self.engine.policy().fail_detect {
            self.signature.arm_deadman();
        }

        let outcome = self.updater().run();

        // A restored backup has already been jumped to.
        if outcome != Outcome::Restored {
            let error = launch(&self.flash, self.board.firmware_size_max, &mut self.jumper);
            if let Some(console) = self.console.as_mut() {
                error.report(console);
            }
        }
        outcome
    }
}
