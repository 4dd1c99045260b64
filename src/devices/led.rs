//! Activity and status LEDs.
use crate::hal::{gpio::OutputPin, led::Toggle};

/// Solid (non-blinking) monochrome LED
///
/// # Example
/// ```
/// # use sdboot_lib::devices::led::*;
/// # use sdboot_lib::hal::led::Toggle;
/// # use sdboot_lib::hal::doubles::gpio::MockPin;
/// let mut led = MonochromeLed::new(MockPin::default(), Logic::Direct);
///
/// led.toggle();
/// assert!(led.is_on());
/// # assert!(led.pin().state);
/// ```
pub struct MonochromeLed<Pin: OutputPin> {
    pin: Pin,
    is_on: bool,
    logic: Logic,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Logic {
    /// Logical high equals "on"
    Direct,
    /// Logical high equals "off"
    Inverted,
}

// Extension trait to ensure LED pins are correctly
// operated based on the led's direct or inverted logic
trait LedPin: OutputPin {
    fn off(&mut self, logic: Logic) {
        if let Logic::Direct = logic {
            self.set_low();
        } else {
            self.set_high();
        }
    }

    fn on(&mut self, logic: Logic) {
        if let Logic::Direct = logic {
            self.set_high();
        } else {
            self.set_low();
        }
    }
}

impl<Pin: OutputPin> LedPin for Pin {}

impl<Pin: OutputPin> MonochromeLed<Pin> {
    pub fn new(mut pin: Pin, logic: Logic) -> Self {
        pin.off(logic);
        Self { pin, is_on: false, logic }
    }

    pub fn is_on(&self) -> bool { self.is_on }

    pub fn pin(&self) -> &Pin { &self.pin }
}

impl<Pin: OutputPin> Toggle for MonochromeLed<Pin> {
    fn on(&mut self) {
        if !self.is_on {
            self.pin.on(self.logic);
        }
        self.is_on = true;
    }

    fn off(&mut self) {
        if self.is_on {
            self.pin.off(self.logic);
        }
        self.is_on = false;
    }

    fn toggle(&mut self) {
        if self.is_on {
            self.off();
        } else {
            self.on();
        }
    }
}

/// Stand-in for boards without an activity LED.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoLed;

impl Toggle for NoLed {
    fn on(&mut self) {}
    fn off(&mut self) {}
    fn toggle(&mut self) {}
}
