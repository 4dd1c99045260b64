//! MCU identity and silicon compatibility.
//!
//! The debug MCU id register packs a 12-bit device id and a 16-bit
//! revision id. Revisions are looked up in an ordered table where every
//! entry from `first_bad` onwards carries a known flash erratum.
use crate::{error::Error, hal::mcu::IdCode};

const DEVICE_ID_MASK: u32 = 0xFFF;
const REVISION_ID_SHIFT: u32 = 16;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct McuDescriptor {
    pub id: u16,
    pub label: &'static str,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SiliconRevision {
    pub id: u16,
    pub label: char,
}

/// Ordered revision table. Entries before `first_bad` are known good.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RevisionTable {
    pub entries: &'static [SiliconRevision],
    pub first_bad: usize,
}

impl RevisionTable {
    pub fn known_bad(&self) -> &'static [SiliconRevision] {
        self.entries.get(self.first_bad..).unwrap_or(&[])
    }
}

/// Identification tables and small-flash mitigation for one board.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SiliconPolicy {
    pub mcus: &'static [McuDescriptor],
    pub revisions: RevisionTable,
    /// Clamp the image ceiling to 1M when the silicon check fails.
    pub limit_small_flash: bool,
}

pub const UNKNOWN_MCU: McuDescriptor = McuDescriptor { id: 0, label: "STM32F???" };
pub const UNKNOWN_REVISION: char = '?';

pub const STM32F4_MCUS: [McuDescriptor; 4] = [
    UNKNOWN_MCU,
    McuDescriptor { id: 0x413, label: "STM32F40x" },
    McuDescriptor { id: 0x419, label: "STM32F42x" },
    McuDescriptor { id: 0x421, label: "STM32F446XX" },
];

/// Good revisions go above the cutoff; moving one in means bumping
/// [`FIRST_BAD_SILICON_OFFSET`].
pub const STM32F4_REVISIONS: [SiliconRevision; 5] = [
    SiliconRevision { id: 0x2001, label: '3' },
    SiliconRevision { id: 0x1000, label: 'A' },
    SiliconRevision { id: 0x1001, label: 'Z' },
    SiliconRevision { id: 0x1003, label: 'Y' },
    SiliconRevision { id: 0x1007, label: '1' },
];

pub const FIRST_BAD_SILICON_OFFSET: usize = 1;

pub const STM32F4_REVISION_TABLE: RevisionTable =
    RevisionTable { entries: &STM32F4_REVISIONS, first_bad: FIRST_BAD_SILICON_OFFSET };

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Identity {
    pub mcu: McuDescriptor,
    pub revision: char,
}

pub fn device_id(idcode: u32) -> u16 { (idcode & DEVICE_ID_MASK) as u16 }

pub fn revision_id(idcode: u32) -> u16 { (idcode >> REVISION_ID_SHIFT) as u16 }

/// Classifies an id register value. Unknown devices map to the first
/// descriptor; when a revision id appears more than once the last entry wins.
pub fn identify(idcode: u32, mcus: &[McuDescriptor], revisions: &RevisionTable) -> Identity {
    let device = device_id(idcode);
    let revision = revision_id(idcode);
    let mcu = mcus.iter().find(|mcu| mcu.id == device).copied().unwrap_or(UNKNOWN_MCU);
    let revision = revisions
        .entries
        .iter()
        .filter(|entry| entry.id == revision)
        .last()
        .map(|entry| entry.label)
        .unwrap_or(UNKNOWN_REVISION);
    Identity { mcu, revision }
}

/// Fails with the revision's label if it is in the known-bad suffix.
pub fn check_compatibility(idcode: u32, revisions: &RevisionTable) -> Result<(), Error> {
    let revision = revision_id(idcode);
    match revisions.known_bad().iter().find(|entry| entry.id == revision) {
        Some(entry) => Err(Error::Incompatible(entry.label)),
        None => Ok(()),
    }
}

/// Reads the id register once and classifies it.
pub fn read_identity<I: IdCode>(id: &I, policy: &SiliconPolicy) -> (Identity, Result<(), Error>) {
    let idcode = id.idcode();
    (identify(idcode, policy.mcus, &policy.revisions), check_compatibility(idcode, &policy.revisions))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::hal::doubles::mcu::FakeIdCode;

    fn idcode(revision: u16, device: u16) -> u32 { (revision as u32) << 16 | device as u32 }

    #[test]
    fn known_device_and_revision_are_identified() {
        let identity = identify(idcode(0x2001, 0x419), &STM32F4_MCUS, &STM32F4_REVISION_TABLE);
        assert_eq!(identity.mcu.label, "STM32F42x");
        assert_eq!(identity.revision, '3');
    }

    #[test]
    fn unknown_device_and_revision_fall_back() {
        let identity = identify(idcode(0x4242, 0x123), &STM32F4_MCUS, &STM32F4_REVISION_TABLE);
        assert_eq!(identity.mcu, UNKNOWN_MCU);
        assert_eq!(identity.revision, '?');
    }

    #[test]
    fn device_id_ignores_the_reserved_bits() {
        // Bits 12..16 are reserved and must not affect the lookup.
        let identity = identify(0x1000_F413, &STM32F4_MCUS, &STM32F4_REVISION_TABLE);
        assert_eq!(identity.mcu.label, "STM32F40x");
        assert_eq!(identity.revision, 'A');
    }

    #[test]
    fn duplicated_revision_ids_resolve_to_the_last_entry() {
        // Given
        static DUPLICATED: [SiliconRevision; 3] = [
            SiliconRevision { id: 0x1000, label: 'A' },
            SiliconRevision { id: 0x1001, label: 'Z' },
            SiliconRevision { id: 0x1000, label: 'B' },
        ];
        let table = RevisionTable { entries: &DUPLICATED, first_bad: 3 };

        // When
        let identity = identify(idcode(0x1000, 0x419), &STM32F4_MCUS, &table);

        // Then
        assert_eq!(identity.revision, 'B');
    }

    #[test]
    fn revisions_before_the_cutoff_are_compatible() {
        assert_eq!(check_compatibility(idcode(0x2001, 0x419), &STM32F4_REVISION_TABLE), Ok(()));
        assert_eq!(check_compatibility(idcode(0x9999, 0x419), &STM32F4_REVISION_TABLE), Ok(()));
    }

    #[test]
    fn revisions_at_or_after_the_cutoff_are_incompatible() {
        for (revision, label) in [(0x1000, 'A'), (0x1001, 'Z'), (0x1003, 'Y'), (0x1007, '1')] {
            assert_eq!(
                check_compatibility(idcode(revision, 0x419), &STM32F4_REVISION_TABLE),
                Err(Error::Incompatible(label))
            );
        }
    }

    #[test]
    fn moving_the_cutoff_changes_the_verdict() {
        let lenient = RevisionTable { entries: &STM32F4_REVISIONS, first_bad: 2 };
        assert_eq!(check_compatibility(idcode(0x1000, 0x419), &lenient), Ok(()));

        let none_bad = RevisionTable { entries: &STM32F4_REVISIONS, first_bad: 5 };
        assert_eq!(check_compatibility(idcode(0x1007, 0x419), &none_bad), Ok(()));
    }

    #[test]
    fn identity_is_read_from_the_id_register() {
        // Given
        let id = FakeIdCode(idcode(0x1003, 0x413));
        let policy = SiliconPolicy {
            mcus: &STM32F4_MCUS,
            revisions: STM32F4_REVISION_TABLE,
            limit_small_flash: true,
        };

        // When
        let (identity, compatibility) = read_identity(&id, &policy);

        // Then
        assert_eq!(identity.mcu.label, "STM32F40x");
        assert_eq!(identity.revision, 'Y');
        assert_eq!(compatibility, Err(Error::Incompatible('Y')));
    }
}
