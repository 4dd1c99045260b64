//! Convenience macros for the bootloader core
#![macro_use]

/// Define and export a specific port module (transparently pulls
/// its namespace to the current one).
///
/// Used mostly to conveniently fit the module declaration and reexport
/// under a single configuration flag.
///
/// # Example
/// ```ignore
/// #[cfg(feature = "fmu_v2")]
/// port!(fmu_v2);
/// // Expands into:
/// pub mod fmu_v2;
/// pub use self::fmu_v2::*;
///
/// #[cfg(feature = "stm32f4_any")]
/// port!(stm32f4: [flash, gpio,]);
/// // Expands into:
/// pub mod stm32f4 { pub mod flash; pub mod gpio; };
/// pub use self::stm32f4::flash;
/// pub use self::stm32f4::gpio;
/// ```
#[macro_export]
macro_rules! port {
    ($mod:ident) => {
        pub mod $mod;
        pub use self::$mod::*;
    };
    ($mod:ident as $name:ident) => {
        pub mod $mod;
        pub use self::$mod as $name;
    };
    ($outer:ident: [$($inner:ident,)+]) => {
        pub mod $outer {
        $(
            pub mod $inner;
        )+
        }
        $(
            pub use self::$outer::$inner;
        )+
    };
}

/// Writes a line to an optional diagnostic console.
///
/// The console is an `Option` of anything implementing `ufmt::uWrite`;
/// nothing is printed when it is `None`, and console write errors are
/// dropped since there is nowhere left to report them.
///
/// # Example
/// ```
/// # use sdboot_lib::{duprintln, hal::doubles::serial::RecordingSerial};
/// let mut console = Some(RecordingSerial::default());
/// duprintln!(console, "Erasing {} sectors", 3u32);
/// # assert_eq!(console.unwrap().text, "Erasing 3 sectors\n");
/// ```
#[macro_export]
macro_rules! duprintln {
    ($serial:expr, $($arg:tt)+) => {
        if let Some(serial) = $serial.as_mut() {
            ufmt::uwriteln!(serial, $($arg)+).ok();
        }
    };
}

/// Writes to an optional diagnostic console, without a trailing newline.
#[macro_export]
macro_rules! duprint {
    ($serial:expr, $($arg:tt)+) => {
        if let Some(serial) = $serial.as_mut() {
            ufmt::uwrite!(serial, $($arg)+).ok();
        }
    };
}
