//! Boot decision engine.
//!
//! Fuses the retained signature, the boot delay signature in flash,
//! the strap pins, bus power and the serial break probe into a single
//! choice between entering the application and staying in recovery.
//! Signals are evaluated in that fixed order. Each one can only veto the
//! boot or raise the recovery timeout, never undo an earlier signal.
use crate::{
    devices::{
        boot_signature::SignatureStore,
        flash::FlashManager,
        sampling::Probe,
    },
    error::Convertible,
    hal::{
        flash::Controller,
        retained::BackupRegister,
        time::{Milliseconds, Seconds},
    },
    utilities::trace::info,
};

/// Low byte of the first signature word carries the delay in seconds.
const DELAY_MASK: u32 = 0xFF;

/// Boot delay signature, written into the application image at a fixed
/// offset so a companion computer gets a window to upload new firmware.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct BootDelay {
    pub offset: u32,
    pub signature1: u32,
    pub signature2: u32,
    pub max_delay: Seconds,
}

impl BootDelay {
    /// Delay encoded in a signature word pair, if it matches and is in range.
    pub fn decode(&self, first: u32, second: u32) -> Option<Seconds> {
        let matches = second == self.signature2 && (first & !DELAY_MASK) == (self.signature1 & !DELAY_MASK);
        let delay = Seconds(first & DELAY_MASK);
        (matches && delay <= self.max_delay).then(|| delay)
    }

    pub fn read<F: Controller>(&self, flash: &FlashManager<F>) -> Option<Seconds>
    where
        F::Error: Convertible,
    {
        self.decode(flash.read_word(self.offset), flash.read_word(self.offset + 4))
    }
}

/// Per board boot behaviour.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Policy {
    /// Recovery timeout when nothing asks for a longer one.
    pub default_timeout: Milliseconds,
    pub boot_delay: Option<BootDelay>,
    /// Arm the retained signature before every jump, so a crashing
    /// application lands back in recovery.
    pub fail_detect: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Decision {
    BootApp,
    /// A zero timeout means waiting until an image is accepted.
    StayInRecovery { timeout: Milliseconds },
}

impl Decision {
    pub fn timeout(&self) -> Milliseconds {
        match self {
            Decision::BootApp => Milliseconds::FOREVER,
            Decision::StayInRecovery { timeout } => *timeout,
        }
    }
}

/// The live hardware signals a board offers to the engine.
pub struct Signals<S: Probe, V: Probe, B: Probe> {
    pub strap: S,
    pub bus_power: V,
    pub serial_break: B,
}

impl<S: Probe, V: Probe, B: Probe> Signals<S, V, B> {
    /// Signals that keep an already running recovery session alive.
    pub fn still_requested(&mut self) -> bool {
        self.strap.asserted() || self.serial_break.asserted()
    }
}

pub struct Engine {
    policy: Policy,
}

impl Engine {
    pub fn new(policy: Policy) -> Self { Self { policy } }

    pub fn policy(&self) -> &Policy { &self.policy }

    pub fn evaluate<R, F, S, V, B>(
        &self,
        store: &mut SignatureStore<R>,
        flash: &FlashManager<F>,
        signals: &mut Signals<S, V, B>,
    ) -> Decision
    where
        R: BackupRegister,
        F: Controller,
        F::Error: Convertible,
        S: Probe,
        V: Probe,
        B: Probe,
    {
        let mut try_boot = true;
        let mut timeout = self.policy.default_timeout;

        if store.take_recovery_request() {
            try_boot = false;
            timeout = Milliseconds::FOREVER;
        }

        if let Some(delay) = self.policy.boot_delay.and_then(|delay| delay.read(flash)) {
            info!("Boot delay of {} seconds requested", delay.0);
            try_boot = false;
            timeout = timeout.max(delay.into());
        }

        if signals.strap.asserted() {
            info!("Force bootloader strap asserted");
            try_boot = false;
        }

        if signals.bus_power.asserted() {
            info!("Bus power present");
            try_boot = false;
        }

        if signals.serial_break.asserted() {
            try_boot = false;
        }

        if try_boot {
            Decision::BootApp
        } else {
            info!("Staying in recovery, timeout {} ms", timeout.0);
            Decision::StayInRecovery { timeout }
        }
    }
}
