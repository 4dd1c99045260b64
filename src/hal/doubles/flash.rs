use super::error::FakeError;
use crate::{devices::flash::FlashLayout, hal::flash::Controller};
use std::vec::Vec;

/// Flash controller over host memory, with NOR semantics: erased bytes
/// read `0xFF` and programming can only clear bits.
///
/// Covers the application region of a `FlashLayout` plus its OTP and
/// unique id areas, and records erases and lock transitions.
#[derive(Clone, Debug)]
pub struct FakeFlash {
    load_address: u32,
    pub data: Vec<u8>,
    otp_base: u32,
    pub otp: Vec<u8>,
    unique_id_base: u32,
    pub unique_id: [u8; 12],
    /// (hardware id, address, size)
    sectors: Vec<(u32, u32, u32)>,
    pub locked: bool,
    pub erased: Vec<u32>,
    pub unlocks: u32,
    pub locks: u32,
    pub bytes_programmed: usize,
    /// Number of times each operation reports busy before completing.
    pub busy_polls: u32,
    pending_busy: u32,
}

impl FakeFlash {
    pub fn new(layout: &FlashLayout) -> Self {
        let mut address = layout.load_address;
        let sectors = layout
            .sectors
            .iter()
            .map(|sector| {
                let entry = (sector.hardware_id, address, sector.size);
                address += sector.size;
                entry
            })
            .collect();
        Self {
            load_address: layout.load_address,
            data: vec![0xFF; layout.total_size() as usize],
            otp_base: layout.otp_base,
            otp: vec![0xFF; layout.otp_size as usize],
            unique_id_base: layout.unique_id_base,
            unique_id: [0u8; 12],
            sectors,
            locked: true,
            erased: Vec::new(),
            unlocks: 0,
            locks: 0,
            bytes_programmed: 0,
            busy_polls: 0,
            pending_busy: 0,
        }
    }

    pub fn with_busy_polls(mut self, polls: u32) -> Self {
        self.busy_polls = polls;
        self.pending_busy = polls;
        self
    }

    /// Places bytes in the application region without going through the controller.
    pub fn load(&mut self, offset: u32, bytes: &[u8]) {
        let start = offset as usize;
        self.data[start..start + bytes.len()].copy_from_slice(bytes);
    }

    pub fn load_word(&mut self, offset: u32, word: u32) { self.load(offset, &word.to_le_bytes()) }

    pub fn image(&self, offset: u32, length: usize) -> &[u8] {
        &self.data[offset as usize..offset as usize + length]
    }

    pub fn set_otp_word(&mut self, offset: u32, word: u32) {
        let start = offset as usize;
        self.otp[start..start + 4].copy_from_slice(&word.to_le_bytes());
    }

    fn busy(&mut self) -> bool {
        if self.pending_busy > 0 {
            self.pending_busy -= 1;
            true
        } else {
            self.pending_busy = self.busy_polls;
            false
        }
    }

    fn data_index(&self, address: u32) -> Option<usize> {
        let offset = address.checked_sub(self.load_address)? as usize;
        (offset < self.data.len()).then(|| offset)
    }

    fn program(&mut self, address: u32, bytes: &[u8]) -> nb::Result<(), FakeError> {
        if self.locked {
            return Err(nb::Error::Other(FakeError));
        }
        if self.busy() {
            return Err(nb::Error::WouldBlock);
        }
        let start = self.data_index(address).ok_or(nb::Error::Other(FakeError))?;
        let end = start + bytes.len();
        if end > self.data.len() {
            return Err(nb::Error::Other(FakeError));
        }
        self.data[start..end].iter_mut().zip(bytes).for_each(|(cell, byte)| *cell &= byte);
        self.bytes_programmed += bytes.len();
        Ok(())
    }
}

fn word_at(bytes: &[u8], offset: usize) -> u32 {
    match bytes.get(offset..offset + 4) {
        Some(word) => u32::from_le_bytes([word[0], word[1], word[2], word[3]]),
        None => 0,
    }
}

impl Controller for FakeFlash {
    type Error = FakeError;

    fn unlock(&mut self) {
        self.locked = false;
        self.unlocks += 1;
    }

    fn lock(&mut self) {
        self.locked = true;
        self.locks += 1;
    }

    fn is_locked(&self) -> bool { self.locked }

    fn erase_sector(&mut self, hardware_id: u32) -> nb::Result<(), FakeError> {
        if self.locked {
            return Err(nb::Error::Other(FakeError));
        }
        if self.busy() {
            return Err(nb::Error::WouldBlock);
        }
        let (_, address, size) = self
            .sectors
            .iter()
            .copied()
            .find(|(id, _, _)| *id == hardware_id)
            .ok_or(nb::Error::Other(FakeError))?;
        let start = (address - self.load_address) as usize;
        self.data[start..start + size as usize].iter_mut().for_each(|byte| *byte = 0xFF);
        self.erased.push(hardware_id);
        Ok(())
    }

    fn program_word(&mut self, address: u32, word: u32) -> nb::Result<(), FakeError> {
        self.program(address, &word.to_le_bytes())
    }

    fn program_byte(&mut self, address: u32, byte: u8) -> nb::Result<(), FakeError> {
        self.program(address, &[byte])
    }

    fn read_word(&self, address: u32) -> u32 {
        if let Some(index) = self.data_index(address) {
            word_at(&self.data, index)
        } else if address >= self.otp_base && address < self.otp_base + self.otp.len() as u32 {
            word_at(&self.otp, (address - self.otp_base) as usize)
        } else if address >= self.unique_id_base && address < self.unique_id_base + 12 {
            word_at(&self.unique_id, (address - self.unique_id_base) as usize)
        } else {
            0
        }
    }
}
