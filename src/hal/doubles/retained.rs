use crate::hal::retained::BackupRegister;

/// Retained register that tracks how its power domain is accessed.
#[derive(Clone, Debug, Default)]
pub struct FakeBackupRegister {
    pub value: u32,
    pub access_enabled: bool,
    pub enables: u32,
    pub disables: u32,
    /// Set when the register is touched outside an access window.
    pub accessed_while_disabled: bool,
}

impl FakeBackupRegister {
    pub fn holding(value: u32) -> Self { Self { value, ..Default::default() } }
}

impl BackupRegister for FakeBackupRegister {
    fn enable_access(&mut self) {
        self.access_enabled = true;
        self.enables += 1;
    }

    fn disable_access(&mut self) {
        self.access_enabled = false;
        self.disables += 1;
    }

    fn read(&self) -> u32 { self.value }

    fn write(&mut self, value: u32) {
        if self.access_enabled {
            self.value = value;
        } else {
            self.accessed_while_disabled = true;
        }
    }
}
