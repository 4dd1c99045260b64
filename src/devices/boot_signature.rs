//! Boot intent persisted across warm resets in a retained register.
//!
//! The register's power domain is only opened for the duration of a
//! single read or write, and is always closed again afterwards.
use crate::{
    hal::retained::BackupRegister,
    utilities::{guard::Guard, trace::info},
};

/// "Stay in recovery on the next boot".
pub const MAGIC: u32 = 0xb007_b007;
/// No pending intent.
pub const CLEAR: u32 = 0;

pub struct SignatureStore<R: BackupRegister> {
    register: R,
}

impl<R: BackupRegister> SignatureStore<R> {
    pub fn new(register: R) -> Self { Self { register } }

    pub fn read_signature(&mut self) -> u32 {
        let register = Guard::new(&mut self.register, R::enable_access, R::disable_access);
        register.read()
    }

    pub fn write_signature(&mut self, signature: u32) {
        let mut register = Guard::new(&mut self.register, R::enable_access, R::disable_access);
        register.write(signature);
    }

    /// Marks the next boot as a recovery boot, in case the application
    /// about to be entered never gets far enough to clear it.
    pub fn arm_deadman(&mut self) { self.write_signature(MAGIC) }

    /// Consumes a pending recovery request. Returns true at most once per
    /// request, so a reset while in recovery does not loop forever.
    pub fn take_recovery_request(&mut self) -> bool {
        if self.read_signature() == MAGIC {
            info!("Recovery requested through the retained signature");
            self.write_signature(CLEAR);
            true
        } else {
            false
        }
    }

    pub fn register(&self) -> &R { &self.register }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::hal::doubles::retained::FakeBackupRegister;

    #[test]
    fn signature_round_trips_through_the_register() {
        // Given
        let mut store = SignatureStore::new(FakeBackupRegister::default());

        // When
        store.write_signature(MAGIC);

        // Then
        assert_eq!(store.read_signature(), MAGIC);
        assert!(!store.register().accessed_while_disabled);
    }

    #[test]
    fn every_access_is_bracketed() {
        // Given
        let mut store = SignatureStore::new(FakeBackupRegister::holding(0x1234));

        // When
        store.read_signature();
        store.write_signature(0x5678);
        store.read_signature();

        // Then
        let register = store.register();
        assert_eq!(register.enables, 3);
        assert_eq!(register.disables, 3);
        assert!(!register.access_enabled);
        assert_eq!(register.value, 0x5678);
    }

    #[test]
    fn recovery_request_is_consumed_once() {
        // Given
        let mut store = SignatureStore::new(FakeBackupRegister::holding(MAGIC));

        // When
        let first = store.take_recovery_request();
        let second = store.take_recovery_request();

        // Then
        assert!(first);
        assert!(!second);
        assert_eq!(store.read_signature(), CLEAR);
    }

    #[test]
    fn foreign_signatures_are_left_alone() {
        // Given
        let mut store = SignatureStore::new(FakeBackupRegister::holding(0xdead_beef));

        // When
        let requested = store.take_recovery_request();

        // Then
        assert!(!requested);
        assert_eq!(store.register().value, 0xdead_beef);
    }

    #[test]
    fn deadman_requests_recovery_on_the_next_boot() {
        // Given
        let mut store = SignatureStore::new(FakeBackupRegister::default());

        // When
        store.arm_deadman();

        // Then
        assert_eq!(store.register().value, MAGIC);
        assert!(store.take_recovery_request());
    }
}
