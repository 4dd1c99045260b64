//! Hand-over to the installed application.
use crate::{
    devices::flash::FlashManager,
    error::{Convertible, Error},
    hal::{flash::Controller, mcu::Jump},
    utilities::{memory::BLANK_WORD, trace::warn},
};

/// Checks that the vector table at the load address looks like one:
/// the initial stack pointer must be programmed and the reset vector
/// must point inside the image.
pub fn check_vector_table<F: Controller>(
    flash: &FlashManager<F>,
    firmware_size_max: u32,
) -> Result<(), Error>
where
    F::Error: Convertible,
{
    let initial_stack_pointer = flash.read_word(0);
    let reset_vector = flash.read_word(4);
    let start = flash.layout().load_address;
    let end = start.saturating_add(firmware_size_max);
    if initial_stack_pointer == BLANK_WORD || !(start..end).contains(&reset_vector) {
        return Err(Error::ApplicationInvalid);
    }
    Ok(())
}

/// Jumps to the application. Only returns if it could not be entered.
pub fn launch<F: Controller, J: Jump>(
    flash: &FlashManager<F>,
    firmware_size_max: u32,
    jumper: &mut J,
) -> Error
where
    F::Error: Convertible,
{
    if let Err(error) = check_vector_table(flash, firmware_size_max) {
        warn!("Refusing to jump: {}", error.description());
        return error;
    }
    warn!("Jumping to the application. This will break `defmt`.");
    jumper.jump(flash.layout().load_address);
    Error::ApplicationInvalid
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        devices::flash::{FlashLayout, STM32F4_2M_SECTORS},
        hal::doubles::{flash::FakeFlash, mcu::RecordingJumper},
    };

    const LAYOUT: FlashLayout = FlashLayout {
        sectors: &STM32F4_2M_SECTORS,
        flash_base: 0x0800_0000,
        load_address: 0x0800_8000,
        otp_base: 0x1FFF_7800,
        otp_size: 512,
        unique_id_base: 0x1FFF_7A10,
    };

    fn flash_with_vectors(stack: u32, reset: u32) -> FlashManager<FakeFlash> {
        let mut flash = FakeFlash::new(&LAYOUT);
        flash.load_word(0, stack);
        flash.load_word(4, reset);
        FlashManager::new(flash, LAYOUT)
    }

    #[test]
    fn plausible_application_is_entered() {
        // Given
        let flash = flash_with_vectors(0x2002_0000, 0x0800_8201);
        let mut jumper = RecordingJumper::default();

        // When
        let error = launch(&flash, mb!(1), &mut jumper);

        // Then
        assert_eq!(jumper.jumps, [0x0800_8000]);
        assert_eq!(error, Error::ApplicationInvalid);
    }

    #[test]
    fn erased_flash_is_not_entered() {
        // Given
        let flash = flash_with_vectors(BLANK_WORD, BLANK_WORD);
        let mut jumper = RecordingJumper::default();

        // When
        let error = launch(&flash, mb!(1), &mut jumper);

        // Then
        assert!(jumper.jumps.is_empty());
        assert_eq!(error, Error::ApplicationInvalid);
    }

    #[test]
    fn reset_vector_must_point_inside_the_image() {
        assert!(check_vector_table(&flash_with_vectors(0x2002_0000, 0x0800_0101), mb!(1)).is_err());
        assert!(check_vector_table(&flash_with_vectors(0x2002_0000, 0x0810_8001), mb!(1)).is_err());
        assert!(check_vector_table(&flash_with_vectors(0x2002_0000, 0x0810_7fff), mb!(1)).is_ok());
    }
}
