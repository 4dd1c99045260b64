use serde::{Deserialize, Serialize};

#[derive(Default, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FeatureConfiguration {
    pub interfaces: Interfaces,
    pub force_pin: ForcePin,
    pub silicon: SiliconPolicy,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interfaces {
    pub usart: bool,
    pub usb: bool,
}

impl Default for Interfaces {
    fn default() -> Self { Self { usart: true, usb: true } }
}

/// How the board straps the "stay in the bootloader" request.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ForcePin {
    Disabled,
    /// An output and an input are tied together by a jumper.
    Tied,
    /// A single input held at its inactive level by a pull resistor.
    Pulled { active_high: bool },
}

impl Default for ForcePin {
    fn default() -> Self { ForcePin::Disabled }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiliconPolicy {
    /// Index into the revision table of the first revision with the flash erratum.
    pub first_bad_offset: usize,
    /// Clamp the image ceiling to 1M on affected silicon.
    pub limit_small_flash: bool,
}

impl Default for SiliconPolicy {
    fn default() -> Self { Self { first_bad_offset: 1, limit_small_flash: true } }
}
