//! Core MCU services: silicon identification and control transfer.

/// Reads the raw device identification register.
pub trait IdCode {
    fn idcode(&self) -> u32;
}

/// Transfers control to an application vector table.
///
/// On target a successful jump never returns. Returning means control
/// could not be handed over, and the caller stays in charge.
pub trait Jump {
    fn jump(&mut self, vector_table: u32);
}
