//! Core SysTick timer as a free-running `CountDown`, clocked from the
//! core clock. Paces the serial break sampler.

use crate::hal::time::CountDown;
use core::convert::Infallible;
use cortex_m::peripheral::{syst::SystClkSource, SYST};

/// SysTick reload values are 24 bits wide.
const MAX_RELOAD: u32 = 0x00FF_FFFF;

pub struct SysTick {
    syst: SYST,
}

impl SysTick {
    pub fn new(mut syst: SYST) -> Self {
        syst.disable_counter();
        syst.set_clock_source(SystClkSource::Core);
        Self { syst }
    }
}

impl CountDown for SysTick {
    fn start(&mut self, reload: u32) {
        self.syst.set_reload(reload.min(MAX_RELOAD));
        self.syst.clear_current();
        self.syst.enable_counter();
    }

    fn wait(&mut self) -> nb::Result<(), Infallible> {
        if self.syst.has_wrapped() {
            Ok(())
        } else {
            Err(nb::Error::WouldBlock)
        }
    }

    fn stop(&mut self) { self.syst.disable_counter(); }
}
