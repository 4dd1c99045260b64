//! Internal Flash controller for the STM32F4 family
//!
//! Erase and program operations are started on the first call and
//! reported as `WouldBlock` until the controller is idle again, so
//! callers drive them to completion with `nb::block!`.

use crate::{
    error::{self, Error as BootloaderError},
    hal::flash::Controller,
    stm32pac::FLASH,
};
use core::ptr;

/// Key sequence that opens the control register for writing.
const UNLOCK_KEYS: [u32; 2] = [0x45670123, 0xCDEF89AB];

/// Programming parallelism (`PSIZE`) for byte and word accesses.
const PSIZE_BYTE: u8 = 0b00;
const PSIZE_WORD: u8 = 0b10;

/// Error flags in the status register: WRPERR, PGAERR, PGPERR and PGSERR.
const ERROR_FLAGS: u32 = 0b1111_0000;
const WRITE_PROTECTION_ERROR: u32 = 1 << 4;

#[derive(Copy, Clone, Debug, PartialEq)]
enum Operation {
    Idle,
    Erasing,
    Programming,
}

pub struct McuFlash {
    flash: FLASH,
    operation: Operation,
}

#[derive(Copy, Clone, Debug)]
pub enum Error {
    WriteProtected,
    ProgrammingFailed,
}

impl error::Convertible for Error {
    fn into(self) -> BootloaderError {
        BootloaderError::DriverError(match self {
            Error::WriteProtected => "MCU flash sector is write protected",
            Error::ProgrammingFailed => "MCU flash programming sequence failed",
        })
    }
}

impl McuFlash {
    pub fn new(flash: FLASH) -> Self {
        let mut driver = Self { flash, operation: Operation::Idle };
        driver.lock();
        driver
    }

    fn is_busy(&self) -> bool { self.flash.sr.read().bsy().bit_is_set() }

    /// Wraps up the operation in flight once the controller is idle,
    /// clearing the operation bits and any latched error flags.
    fn finish(&mut self) -> nb::Result<(), Error> {
        self.operation = Operation::Idle;
        self.flash.cr.modify(|_, w| w.ser().clear_bit().pg().clear_bit());
        let flags = self.flash.sr.read().bits() & ERROR_FLAGS;
        if flags == 0 {
            return Ok(());
        }
        // NOTE(Safety): Unsafe block to use the 'bits' convenience function.
        // Error flags are cleared by writing ones. Applies to all blocks in this
        // file unless specified otherwise.
        self.flash.sr.write(|w| unsafe { w.bits(flags) });
        Err(nb::Error::Other(if flags & WRITE_PROTECTION_ERROR != 0 {
            Error::WriteProtected
        } else {
            Error::ProgrammingFailed
        }))
    }

    fn poll(&mut self, operation: Operation) -> Option<nb::Result<(), Error>> {
        if self.is_busy() {
            return Some(Err(nb::Error::WouldBlock));
        }
        (self.operation == operation).then(|| self.finish())
    }

    fn start_programming(&mut self, psize: u8) {
        self.flash.cr.modify(|_, w| unsafe { w.psize().bits(psize).pg().set_bit() });
        self.operation = Operation::Programming;
    }
}

impl Controller for McuFlash {
    type Error = Error;

    fn unlock(&mut self) {
        if !self.is_locked() {
            return;
        }
        self.flash.keyr.write(|w| unsafe { w.bits(UNLOCK_KEYS[0]) });
        self.flash.keyr.write(|w| unsafe { w.bits(UNLOCK_KEYS[1]) });
    }

    fn lock(&mut self) { self.flash.cr.modify(|_, w| w.lock().set_bit()); }

    fn is_locked(&self) -> bool { self.flash.cr.read().lock().bit_is_set() }

    fn erase_sector(&mut self, hardware_id: u32) -> nb::Result<(), Error> {
        if let Some(result) = self.poll(Operation::Erasing) {
            return result;
        }
        self.flash.cr.modify(|_, w| unsafe {
            w.psize().bits(PSIZE_WORD).ser().set_bit().snb().bits(hardware_id as u8)
        });
        self.flash.cr.modify(|_, w| w.strt().set_bit());
        self.operation = Operation::Erasing;
        Err(nb::Error::WouldBlock)
    }

    fn program_word(&mut self, address: u32, word: u32) -> nb::Result<(), Error> {
        if let Some(result) = self.poll(Operation::Programming) {
            return result;
        }
        self.start_programming(PSIZE_WORD);
        // NOTE(Safety): Writing to memory-mapped flash directly is naturally
        // unsafe. Addresses are bounds checked against the board layout by
        // the flash manager before they reach the controller.
        unsafe { ptr::write_volatile(address as *mut u32, word) };
        Err(nb::Error::WouldBlock)
    }

    fn program_byte(&mut self, address: u32, byte: u8) -> nb::Result<(), Error> {
        if let Some(result) = self.poll(Operation::Programming) {
            return result;
        }
        self.start_programming(PSIZE_BYTE);
        unsafe { ptr::write_volatile(address as *mut u8, byte) };
        Err(nb::Error::WouldBlock)
    }

    fn read_word(&self, address: u32) -> u32 {
        // NOTE(Safety): Reads of memory-mapped flash, OTP and the unique id
        // area. Only layout-derived addresses are passed in.
        unsafe { ptr::read_volatile(address as *const u32) }
    }
}
