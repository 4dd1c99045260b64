use crate::hal::mcu::{IdCode, Jump};

#[derive(Copy, Clone, Debug, Default)]
pub struct FakeIdCode(pub u32);

impl IdCode for FakeIdCode {
    fn idcode(&self) -> u32 { self.0 }
}

/// Jumper that records each attempt and always returns, as a failed
/// control transfer would.
#[derive(Clone, Debug, Default)]
pub struct RecordingJumper {
    pub jumps: Vec<u32>,
}

impl Jump for RecordingJumper {
    fn jump(&mut self, vector_table: u32) { self.jumps.push(vector_table); }
}
