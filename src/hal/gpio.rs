//! # Simple GPIO interface
//!
//! Separate interfaces to Input and Output pins. Strap pins, the bus
//! power sense line, the serial receive line and the LEDs are all seen
//! by the core through these two traits.

/// Interface to a writable pin.
pub trait OutputPin {
    fn set_low(&mut self);
    fn set_high(&mut self);
}

/// Interface to a readable pin.
pub trait InputPin {
    fn is_high(&self) -> bool;
    fn is_low(&self) -> bool;
}
