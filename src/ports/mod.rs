//! Full project ports for specific targets. They mainly
//! provide a method to construct a generic bootloader from
//! specific parts.

#[cfg(feature = "fmu_v2")]
port!(fmu_v2: [bootloader, pin_configuration,]);
