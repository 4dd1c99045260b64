//! Construction of the bootloader for the FMUv2 flight controller.
//!
//! Clock tree, UART, USB and SD card bring-up happen before this point;
//! the port receives the mounted-on-demand filesystem and the console.
use super::pin_configuration::*;
use crate::{
    configuration::{BOARD, BOOT_POLICY, FLASH_LAYOUT, FORCE_PIN, INTERFACES, SILICON},
    devices::{
        boot_decision::{Engine, Signals},
        boot_signature::SignatureStore,
        bootloader::Bootloader,
        flash::FlashManager,
        led::{Logic, MonochromeLed},
        sampling::{BreakProbe, ForcePin, LevelSense, Probe, PulledPin, TiedPins},
    },
    drivers::stm32f4::{
        backup_domain::RtcBackupRegister,
        dbgmcu::DebugIdCode,
        flash::McuFlash,
        gpio::{Input, Output, Pull},
        jump::VectorTableJump,
        systick::SysTick,
    },
    error::Error,
    hal::{
        serial::Write,
        storage::FileSystem,
        time::{Bps, Hertz, MegaHertz, Milliseconds},
    },
    stm32pac::{self, RCC},
};

/// Recovery protocol rate on USART2.
const USART_BAUD: Bps = Bps(115_200);

/// Force-bootloader strap, as wired on this unit.
pub enum Strap {
    Tied(TiedPins<StrapDrive, StrapSense>),
    Pulled(PulledPin<StrapSense>),
}

impl Strap {
    fn from_configuration(rcc: &RCC) -> Option<Self> {
        match FORCE_PIN {
            ForcePin::Disabled => None,
            ForcePin::Tied => Some(Strap::Tied(TiedPins::new(
                Output::new(rcc),
                Input::new(rcc, Pull::Down),
            ))),
            ForcePin::Pulled { active_high } => {
                let rest = if active_high { Pull::Down } else { Pull::Up };
                Some(Strap::Pulled(PulledPin::new(Input::new(rcc, rest), active_high)))
            }
        }
    }
}

impl Probe for Strap {
    fn asserted(&mut self) -> bool {
        match self {
            Strap::Tied(pins) => pins.asserted(),
            Strap::Pulled(pin) => pin.asserted(),
        }
    }
}

pub type FmuBootloader<FS, S> = Bootloader<
    McuFlash,
    RtcBackupRegister,
    FS,
    S,
    MonochromeLed<ActivityLed>,
    VectorTableJump,
    Option<Strap>,
    Option<LevelSense<BusPowerSense>>,
    Option<BreakProbe<SerialRx, SysTick>>,
>;

impl<FS: FileSystem, S: Write> FmuBootloader<FS, S> {
    pub fn new(storage: FS, console: Option<S>) -> Result<Self, Error> {
        let peripherals = stm32pac::Peripherals::take()
            .ok_or(Error::DriverError("MCU peripherals already taken"))?;
        let cortex_peripherals = cortex_m::Peripherals::take()
            .ok_or(Error::DriverError("Core peripherals already taken"))?;
        let rcc = &peripherals.RCC;

        let board = BOARD.info(&DebugIdCode::new(peripherals.DBGMCU), &SILICON);
        let clock: Hertz = MegaHertz(board.systick_mhz).into();

        let signals = Signals {
            strap: Strap::from_configuration(rcc),
            bus_power: INTERFACES.usb.then(|| LevelSense::new(Input::new(rcc, Pull::Down))),
            serial_break: INTERFACES.usart.then(|| {
                BreakProbe::new(
                    Input::new(rcc, Pull::Up),
                    SysTick::new(cortex_peripherals.SYST),
                    clock,
                    USART_BAUD,
                )
            }),
        };

        Ok(Bootloader {
            flash: FlashManager::new(McuFlash::new(peripherals.FLASH), FLASH_LAYOUT),
            signature: SignatureStore::new(RtcBackupRegister::new(
                peripherals.PWR,
                peripherals.RTC,
                rcc,
            )),
            storage,
            console,
            led: MonochromeLed::new(Output::new(rcc), Logic::Inverted),
            jumper: VectorTableJump::new(cortex_peripherals.SCB),
            signals,
            engine: Engine::new(BOOT_POLICY),
            interfaces: INTERFACES,
            board,
            timeout: Milliseconds::FOREVER,
        })
    }
}
