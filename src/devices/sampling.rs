//! Noisy hardware signals sampled into a single yes/no answer.
//!
//! Tallying is kept separate from pin and timer access, so every
//! threshold can be checked against a plain sequence of levels.
use crate::{
    hal::{
        gpio::{InputPin, OutputPin},
        time::{Bps, CountDown, Hertz},
    },
    utilities::trace::info,
};
use core::iter;

/// Cycles of the tied strap test. Each cycle drives the line high, then low.
pub const TIED_CYCLES: u32 = 10;
pub const TIED_SAMPLES_PER_LEVEL: u32 = 20;
pub const PULLED_SAMPLES: u32 = 200;
/// Percentage of samples that must agree for a strap to count as asserted.
pub const AGREEMENT_PERCENT: u32 = 90;

/// Samples per bit time of the break probe.
pub const BREAK_OVERSAMPLING: u32 = 2;
/// Start, eight data and stop bits.
pub const BREAK_FRAME_BITS: u32 = 10;
pub const BREAK_FRAMES: u32 = 3;
pub const BREAK_SAMPLES: u32 = BREAK_OVERSAMPLING * BREAK_FRAME_BITS * BREAK_FRAMES;
/// Consecutive low samples (nine bit times) that no valid frame can produce.
pub const BREAK_LOW_SAMPLES: u32 = 9 * BREAK_OVERSAMPLING;

/// Running tally of agreeing samples.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Vote {
    pub agree: u32,
    pub samples: u32,
}

impl Vote {
    pub fn record(&mut self, agrees: bool) {
        self.samples += 1;
        if agrees {
            self.agree += 1;
        }
    }

    /// Strictly more than the agreement threshold; rejects wire-to-wire coupling.
    pub fn passes(&self) -> bool {
        self.agree.saturating_mul(100) > self.samples.saturating_mul(AGREEMENT_PERCENT)
    }

    pub fn tally<I: IntoIterator<Item = bool>>(samples: I) -> Self {
        samples.into_iter().fold(Self::default(), |mut vote, agrees| {
            vote.record(agrees);
            vote
        })
    }
}

/// Scans line levels (`true` is high) for a break or a held-low line.
///
/// At most [`BREAK_SAMPLES`] levels are consumed; scanning stops as soon
/// as [`BREAK_LOW_SAMPLES`] consecutive lows have been seen.
pub fn detect_break<I: IntoIterator<Item = bool>>(levels: I) -> bool {
    let mut consecutive_low = 0;
    for high in levels.into_iter().take(BREAK_SAMPLES as usize) {
        consecutive_low = if high { 0 } else { consecutive_low + 1 };
        if consecutive_low >= BREAK_LOW_SAMPLES {
            return true;
        }
    }
    false
}

/// Timer reload that ticks twice per bit at the given baud rate.
pub fn half_bit_reload(clock: Hertz, baud: Bps) -> u32 {
    let ticks_per_period = baud.0.saturating_mul(BREAK_OVERSAMPLING);
    if ticks_per_period == 0 {
        0
    } else {
        clock.0 / ticks_per_period
    }
}

/// A signal that may hold the bootloader in recovery.
pub trait Probe {
    fn asserted(&mut self) -> bool;
}

/// How a board wires its force-bootloader strap.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(target_arch = "arm", derive(defmt::Format))]
pub enum ForcePin {
    Disabled,
    /// Two pins jumpered together: one driven, one sensed.
    Tied,
    /// One pin pulled to a rest level, asserted at the opposite level.
    Pulled { active_high: bool },
}

/// Interface a board lacks; never asserted.
#[derive(Copy, Clone, Debug, Default)]
pub struct Absent;

impl Probe for Absent {
    fn asserted(&mut self) -> bool { false }
}

/// Probe whose presence is only known from the board configuration.
impl<P: Probe> Probe for Option<P> {
    fn asserted(&mut self) -> bool { self.as_mut().map_or(false, P::asserted) }
}

/// Strap made of two pins jumpered together.
pub struct TiedPins<O: OutputPin, I: InputPin> {
    drive: O,
    sense: I,
}

impl<O: OutputPin, I: InputPin> TiedPins<O, I> {
    pub fn new(drive: O, sense: I) -> Self { Self { drive, sense } }

    pub fn release(self) -> (O, I) { (self.drive, self.sense) }
}

impl<O: OutputPin, I: InputPin> Probe for TiedPins<O, I> {
    fn asserted(&mut self) -> bool {
        let mut vote = Vote::default();
        for _ in 0..TIED_CYCLES {
            self.drive.set_high();
            (0..TIED_SAMPLES_PER_LEVEL).for_each(|_| vote.record(self.sense.is_high()));
            self.drive.set_low();
            (0..TIED_SAMPLES_PER_LEVEL).for_each(|_| vote.record(self.sense.is_low()));
        }
        info!("Tied strap vote: {} of {}", vote.agree, vote.samples);
        vote.passes()
    }
}

/// Strap made of a single pulled pin.
pub struct PulledPin<I: InputPin> {
    pin: I,
    active_high: bool,
}

impl<I: InputPin> PulledPin<I> {
    pub fn new(pin: I, active_high: bool) -> Self { Self { pin, active_high } }
}

impl<I: InputPin> Probe for PulledPin<I> {
    fn asserted(&mut self) -> bool {
        let (pin, active_high) = (&self.pin, self.active_high);
        let vote = Vote::tally((0..PULLED_SAMPLES).map(|_| pin.is_high() == active_high));
        info!("Pulled strap vote: {} of {}", vote.agree, vote.samples);
        vote.passes()
    }
}

/// Single read of a level, such as bus power presence.
pub struct LevelSense<I: InputPin> {
    pin: I,
}

impl<I: InputPin> LevelSense<I> {
    pub fn new(pin: I) -> Self { Self { pin } }
}

impl<I: InputPin> Probe for LevelSense<I> {
    fn asserted(&mut self) -> bool { self.pin.is_high() }
}

/// Samples a serial receive line, paced by a timer, looking for a break.
pub struct BreakProbe<I: InputPin, T: CountDown> {
    rx: I,
    timer: T,
    reload: u32,
}

impl<I: InputPin, T: CountDown> BreakProbe<I, T> {
    pub fn new(rx: I, timer: T, clock: Hertz, baud: Bps) -> Self {
        Self { rx, timer, reload: half_bit_reload(clock, baud) }
    }

    pub fn release(self) -> (I, T) { (self.rx, self.timer) }
}

impl<I: InputPin, T: CountDown> Probe for BreakProbe<I, T> {
    fn asserted(&mut self) -> bool {
        self.timer.start(self.reload);
        let (rx, timer) = (&self.rx, &mut self.timer);
        let levels = iter::from_fn(|| nb::block!(timer.wait()).ok().map(|_| rx.is_high()));
        let detected = detect_break(levels);
        self.timer.stop();
        if detected {
            info!("Break detected on the serial line");
        }
        detected
    }
}
