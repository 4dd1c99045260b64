//! GPIO assignments for the FMUv2 flight controller.
use crate::drivers::stm32f4::gpio::{Input, Output};

gpio!(GPIOA, gpioaen, [PA9: 9,]);
gpio!(GPIOD, gpioden, [PD6: 6,]);
gpio!(GPIOE, gpioeen, [PE12: 12, PE13: 13, PE14: 14,]);

/// Amber activity LED, lit when the pin is driven low.
pub type ActivityLed = Output<PE12>;
/// USB VBUS sense.
pub type BusPowerSense = Input<PA9>;
/// USART2 receive line, sampled for a break before the UART owns it.
pub type SerialRx = Input<PD6>;
/// Strap on servo outputs 3 and 4, for boards that enable one.
pub type StrapDrive = Output<PE14>;
pub type StrapSense = Input<PE13>;
