//! GPIO pins for the STM32F4 family.
//!
//! Each pin is a zero sized marker, generated by the `gpio!` macro,
//! that knows its port registers. Configuring a marker yields an
//! `Input` or `Output` that implements the matching `hal::gpio` trait.

use crate::{
    hal::gpio::{InputPin, OutputPin},
    stm32pac::RCC,
};
use core::marker::PhantomData;

/// Internal resistor on an input.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Pull {
    Floating,
    Up,
    Down,
}

impl Pull {
    const fn bits(self) -> u32 {
        match self {
            Pull::Floating => 0b00,
            Pull::Up => 0b01,
            Pull::Down => 0b10,
        }
    }
}

const MODE_INPUT: u32 = 0b00;
const MODE_OUTPUT: u32 = 0b01;

/// Register level access to a single pin.
pub trait PinId {
    fn enable_port(rcc: &RCC);
    fn configure(mode: u32, pull: u32);
    fn read() -> bool;
    fn drive(high: bool);
}

/// Input mode (type state)
pub struct Input<P: PinId> {
    _pin: PhantomData<P>,
}

/// Push pull output mode (type state)
pub struct Output<P: PinId> {
    _pin: PhantomData<P>,
}

impl<P: PinId> Input<P> {
    pub fn new(rcc: &RCC, pull: Pull) -> Self {
        P::enable_port(rcc);
        P::configure(MODE_INPUT, pull.bits());
        Self { _pin: PhantomData }
    }

    /// Floats the pin again, as it was out of reset.
    pub fn release(self) { P::configure(MODE_INPUT, Pull::Floating.bits()); }
}

impl<P: PinId> Output<P> {
    pub fn new(rcc: &RCC) -> Self {
        P::enable_port(rcc);
        P::configure(MODE_OUTPUT, Pull::Floating.bits());
        Self { _pin: PhantomData }
    }

    /// Returns the pin to a floating input.
    pub fn release(self) { P::configure(MODE_INPUT, Pull::Floating.bits()); }
}

impl<P: PinId> InputPin for Input<P> {
    fn is_high(&self) -> bool { P::read() }
    fn is_low(&self) -> bool { !P::read() }
}

impl<P: PinId> OutputPin for Output<P> {
    fn set_low(&mut self) { P::drive(false); }
    fn set_high(&mut self) { P::drive(true); }
}

#[macro_export]
macro_rules! gpio {
    ($GPIOX:ident, $enable:ident, [$($PXi:ident: $i:expr,)+]) => {
        $(
            pub struct $PXi;

            impl $crate::drivers::stm32f4::gpio::PinId for $PXi {
                fn enable_port(rcc: &$crate::stm32pac::RCC) {
                    rcc.ahb1enr.modify(|_, w| w.$enable().set_bit());
                }

                fn configure(mode: u32, pull: u32) {
                    // NOTE(Safety): Read-modify-write of this pin's two bit fields only,
                    // from the single thread of the bootloader. The raw pointer is the
                    // port's fixed register block.
                    let port = unsafe { &*$crate::stm32pac::$GPIOX::ptr() };
                    let shift = 2 * $i;
                    port.moder.modify(|r, w| unsafe {
                        w.bits((r.bits() & !(0b11 << shift)) | (mode << shift))
                    });
                    port.pupdr.modify(|r, w| unsafe {
                        w.bits((r.bits() & !(0b11 << shift)) | (pull << shift))
                    });
                }

                fn read() -> bool {
                    let port = unsafe { &*$crate::stm32pac::$GPIOX::ptr() };
                    port.idr.read().bits() & (1 << $i) != 0
                }

                fn drive(high: bool) {
                    let port = unsafe { &*$crate::stm32pac::$GPIOX::ptr() };
                    let bit = if high { 1 << $i } else { 1 << ($i + 16) };
                    port.bsrr.write(|w| unsafe { w.bits(bit) });
                }
            }
        )+
    };
}
