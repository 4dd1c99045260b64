//! Developer trace.
//!
//! On target, `info!` and `warn!` are the `defmt` macros (transported over
//! RTT). Host builds have no global logger, so the calls compile to nothing.

#[cfg(target_arch = "arm")]
pub(crate) use defmt::{info, warn};

#[cfg(not(target_arch = "arm"))]
macro_rules! discard {
    ($($arg:tt)*) => {{}};
}

#[cfg(not(target_arch = "arm"))]
pub(crate) use discard as info;
#[cfg(not(target_arch = "arm"))]
pub(crate) use discard as warn;
