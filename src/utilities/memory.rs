//! Utilities to manipulate flash offsets and sizes
#![macro_use]

#[macro_export]
macro_rules! kb {
    ($val:expr) => {
        $val * 1024
    };
}
#[macro_export]
macro_rules! mb {
    ($val:expr) => {
        $val * 1024 * 1024
    };
}

/// Width of a flash word, in bytes.
pub const WORD: u32 = 4;

/// Value of an erased flash word.
pub const BLANK_WORD: u32 = 0xFFFF_FFFF;

pub const fn is_word_aligned(offset: u32) -> bool { offset % WORD == 0 }

/// Whether `[offset, offset + length)` lies within `[0, limit)`, without overflow.
pub const fn fits(offset: u32, length: u32, limit: u32) -> bool {
    match offset.checked_add(length) {
        Some(end) => end <= limit,
        None => false,
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn conversion_macros() {
        assert_eq!(kb!(16), 0x4000);
        assert_eq!(mb!(1), 0x100000);
    }

    #[test]
    fn word_alignment() {
        assert!(is_word_aligned(0));
        assert!(is_word_aligned(0x1a0));
        assert!(!is_word_aligned(0x1a1));
        assert!(!is_word_aligned(3));
    }

    #[test]
    fn range_fitting_rejects_overflow() {
        assert!(fits(0, 4, 4));
        assert!(!fits(1, 4, 4));
        assert!(fits(508, 4, 512));
        assert!(!fits(512, 4, 512));
        assert!(!fits(u32::MAX, 4, u32::MAX));
    }
}
