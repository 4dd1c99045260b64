//! RAII guard that calls a given function when constructed,
//! and another when it drops out of scope.
//!
//! Useful for ensuring resource cleanup no matter the return
//! path, such as re-disabling access to the backup domain.
//!
//! Example
//! ```
//! # use sdboot_lib::hal::led::*;
//! # use sdboot_lib::devices::led::*;
//! # use sdboot_lib::hal::doubles::gpio::*;
//! # use sdboot_lib::utilities::guard::*;
//! # let pin = MockPin::default();
//! # let mut led = MonochromeLed::new(pin, Logic::Direct);
//! {
//!     // Led is toggled on as soon as guard is constructed, and
//!     // held protected by the guard (as it has exclusive access
//!     // to it)
//!     let guard = Guard::new(&mut led, Toggle::on, Toggle::off);
//!     assert!(guard.is_on());
//! }
//! // Guard has dropped out of scope here, so led is toggled off
//! assert!(!led.is_on());
//! # assert_eq!(led.pin().changes.len(), 3);
//! # assert_eq!(led.pin().changes[1], true);
//! # assert_eq!(led.pin().changes[2], false);
//! ```

use core::{
    marker::PhantomData,
    ops::{Deref, DerefMut},
};

pub struct Guard<'a, T, F, G>
where
    F: FnOnce(&mut T),
    G: FnOnce(&mut T),
{
    item: &'a mut T,
    on_exit: Option<G>,
    _marker: PhantomData<F>,
}

impl<'a, T, F, G> Guard<'a, T, F, G>
where
    F: FnOnce(&mut T),
    G: FnOnce(&mut T),
{
    pub fn new(item: &'a mut T, on_entry: F, on_exit: G) -> Self {
        on_entry(item);
        Self { item, on_exit: Some(on_exit), _marker: PhantomData::default() }
    }
}

impl<'a, T, F, G> Deref for Guard<'a, T, F, G>
where
    F: FnOnce(&mut T),
    G: FnOnce(&mut T),
{
    type Target = T;
    fn deref(&self) -> &T { self.item }
}

impl<'a, T, F, G> DerefMut for Guard<'a, T, F, G>
where
    F: FnOnce(&mut T),
    G: FnOnce(&mut T),
{
    fn deref_mut(&mut self) -> &mut T { self.item }
}

impl<'a, T, F, G> Drop for Guard<'a, T, F, G>
where
    F: FnOnce(&mut T),
    G: FnOnce(&mut T),
{
    fn drop(&mut self) {
        if let Some(on_exit) = self.on_exit.take() {
            on_exit(self.item);
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[derive(Default)]
    struct Latch {
        open: bool,
        transitions: u32,
    }

    fn open(latch: &mut Latch) {
        latch.open = true;
        latch.transitions += 1;
    }

    fn close(latch: &mut Latch) {
        latch.open = false;
        latch.transitions += 1;
    }

    fn early_return(latch: &mut Latch, fail: bool) -> Result<(), ()> {
        let guard = Guard::new(latch, open, close);
        if fail {
            return Err(());
        }
        assert!(guard.open);
        Ok(())
    }

    #[test]
    fn exit_function_runs_on_every_return_path() {
        // Given
        let mut latch = Latch::default();

        // When
        early_return(&mut latch, true).unwrap_err();

        // Then
        assert!(!latch.open);
        assert_eq!(latch.transitions, 2);

        // When
        early_return(&mut latch, false).unwrap();

        // Then
        assert!(!latch.open);
        assert_eq!(latch.transitions, 4);
    }

    #[test]
    fn guarded_item_is_reachable_through_the_guard() {
        let mut latch = Latch::default();
        {
            let mut guard = Guard::new(&mut latch, open, close);
            guard.transitions += 10;
        }
        assert_eq!(latch.transitions, 12);
    }
}
