use crate::{hal::mcu::Jump, utilities::trace::warn};
use core::mem::size_of;
use cortex_m::peripheral::SCB;

/// Hands the core over to an application vector table.
pub struct VectorTableJump {
    scb: SCB,
}

impl VectorTableJump {
    pub fn new(scb: SCB) -> Self { Self { scb } }
}

impl Jump for VectorTableJump {
    fn jump(&mut self, vector_table: u32) {
        warn!("Jumping to the application. This will break `defmt`.");
        cortex_m::interrupt::disable();

        // NOTE(Safety): Thoroughly unsafe operations, for obvious reasons: we are jumping
        // to an entirely different firmware image! The vector table has been sanity checked
        // against the application region, but past this point there is no turning back.
        unsafe {
            let initial_stack_pointer = *(vector_table as *const u32);
            let reset_handler_pointer =
                *((vector_table as usize + size_of::<u32>()) as *const u32) as *const ();
            let reset_handler = core::mem::transmute::<*const (), fn() -> !>(reset_handler_pointer);
            self.scb.vtor.write(vector_table);
            #[allow(deprecated)]
            cortex_m::register::msp::write(initial_stack_pointer);
            reset_handler()
        }
    }
}
