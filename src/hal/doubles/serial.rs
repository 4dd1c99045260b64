use std::{convert::Infallible, string::String};

/// Console that keeps everything written to it.
#[derive(Clone, Debug, Default)]
pub struct RecordingSerial {
    pub text: String,
}

impl ufmt::uWrite for RecordingSerial {
    type Error = Infallible;
    fn write_str(&mut self, s: &str) -> Result<(), Self::Error> {
        self.text.push_str(s);
        Ok(())
    }
}

impl RecordingSerial {
    /// Number of times `token` was printed.
    pub fn count(&self, token: &str) -> usize { self.text.matches(token).count() }
}
