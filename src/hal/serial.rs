//! Diagnostic console interface.
//!
//! The console is write-only and formatted with `ufmt`, so any
//! `ufmt::uWrite` sink (a UART transmit half, a semihosting channel,
//! a recording buffer in tests) can serve as one.

/// Marker for a console that status messages can be written to.
pub trait Write: ufmt::uWrite {}
impl<T: ufmt::uWrite> Write for T {}

#[cfg(test)]
mod test {
    use crate::{duprint, duprintln, hal::doubles::serial::RecordingSerial};

    #[test]
    fn printing_to_an_absent_console_does_nothing() {
        // Given
        let mut console: Option<RecordingSerial> = None;

        // When
        duprintln!(console, "Nobody is listening");

        // Then
        assert!(console.is_none());
    }

    #[test]
    fn print_macros_append_to_the_console() {
        // Given
        let mut console = Some(RecordingSerial::default());

        // When
        duprint!(console, "Programming : ");
        duprint!(console, "#");
        duprintln!(console, " {} blocks", 200u32);

        // Then
        assert_eq!(console.unwrap().text, "Programming : # 200 blocks\n");
    }
}
