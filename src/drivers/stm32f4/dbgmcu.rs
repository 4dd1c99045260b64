use crate::{hal::mcu::IdCode, stm32pac::DBGMCU};

/// Device and revision identification, through `DBGMCU_IDCODE`.
pub struct DebugIdCode {
    dbgmcu: DBGMCU,
}

impl DebugIdCode {
    pub fn new(dbgmcu: DBGMCU) -> Self { Self { dbgmcu } }
}

impl IdCode for DebugIdCode {
    fn idcode(&self) -> u32 { self.dbgmcu.idcode.read().bits() }
}
