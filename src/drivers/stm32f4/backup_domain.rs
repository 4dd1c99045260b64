//! First RTC backup register, used as the boot signature store.
//!
//! The register sits in the backup domain, which is write protected
//! until `DBP` is set in the power controller.

use crate::{
    hal::retained::BackupRegister,
    stm32pac::{PWR, RCC, RTC},
};

pub struct RtcBackupRegister {
    pwr: PWR,
    rtc: RTC,
}

impl RtcBackupRegister {
    /// Takes the power and RTC blocks, clocking the power controller.
    pub fn new(pwr: PWR, rtc: RTC, rcc: &RCC) -> Self {
        rcc.apb1enr.modify(|_, w| w.pwren().set_bit());
        Self { pwr, rtc }
    }
}

impl BackupRegister for RtcBackupRegister {
    fn enable_access(&mut self) { self.pwr.cr.modify(|_, w| w.dbp().set_bit()); }

    fn disable_access(&mut self) { self.pwr.cr.modify(|_, w| w.dbp().clear_bit()); }

    fn read(&self) -> u32 { self.rtc.bkpr[0].read().bits() }

    fn write(&mut self, value: u32) {
        // NOTE(Safety): Unsafe block to use the 'bits' convenience function.
        self.rtc.bkpr[0].write(|w| unsafe { w.bits(value) });
    }
}
