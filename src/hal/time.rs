//! Time units and timer interfaces.

#[derive(Clone, Copy, Debug, PartialOrd, Ord, PartialEq, Eq)]
pub struct Milliseconds(pub u32);

#[derive(Clone, Copy, Debug, PartialOrd, Ord, PartialEq, Eq)]
pub struct Seconds(pub u32);

/// Bits per second
#[derive(Clone, Copy, Debug, PartialOrd, PartialEq, Eq)]
pub struct Bps(pub u32);

/// Hertz
#[derive(Clone, Copy, Debug, PartialOrd, PartialEq, Eq)]
pub struct Hertz(pub u32);

/// MegaHertz
#[derive(Clone, Copy, Debug, PartialOrd, PartialEq, Eq)]
pub struct MegaHertz(pub u32);

/// Extension trait that adds convenience methods to the `u32` type
pub trait U32Ext {
    /// Wrap in `Bps`
    fn bps(self) -> Bps;

    /// Wrap in `Hertz`
    fn hz(self) -> Hertz;

    /// Wrap in `MegaHertz`
    fn mhz(self) -> MegaHertz;

    /// Wrap in `Seconds`
    fn s(self) -> Seconds;

    /// Wrap in `Milliseconds`
    fn ms(self) -> Milliseconds;
}

impl U32Ext for u32 {
    fn bps(self) -> Bps { Bps(self) }

    fn hz(self) -> Hertz { Hertz(self) }

    fn mhz(self) -> MegaHertz { MegaHertz(self) }

    fn s(self) -> Seconds { Seconds(self) }

    fn ms(self) -> Milliseconds { Milliseconds(self) }
}

impl From<MegaHertz> for Hertz {
    fn from(frequency: MegaHertz) -> Hertz { Hertz(frequency.0 * 1_000_000) }
}

impl From<Seconds> for Milliseconds {
    fn from(seconds: Seconds) -> Milliseconds { Milliseconds(seconds.0.saturating_mul(1_000)) }
}

impl Milliseconds {
    /// A zero timeout means "wait until something happens".
    pub const FOREVER: Milliseconds = Milliseconds(0);
}

/// Free-running periodic timer, used to pace busy-wait sampling.
pub trait CountDown {
    /// Starts counting, wrapping every `reload` timer ticks.
    fn start(&mut self, reload: u32);
    /// Completes once per period.
    fn wait(&mut self) -> nb::Result<(), core::convert::Infallible>;
    fn stop(&mut self);
}
