//! # Clock sources
//!
//! The sampler only needs "seconds since some fixed origin" as an `f64`, and whether that reading
//! is coarse enough that a measurement should start on a tick edge. Everything here is monotonic:
//! elapsed times fed into the latency formula can't go negative.
use std::time::{Duration, Instant};

/// Capability the sampler reads time through
pub trait ClockSource {
    /// Current reading, in seconds since the clock's origin
    fn now_secs(&mut self) -> f64;

    /// Whether the sampler should busy-poll to a tick boundary before measuring. Coarse clocks
    /// return `true` so quantization error is paid once at the end of a phase, not at both ends.
    fn needs_tick_alignment(&self) -> bool {
        false
    }
}

/// High resolution monotonic clock backed by `Instant`
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        MonotonicClock {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ClockSource for MonotonicClock {
    #[inline]
    fn now_secs(&mut self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }
}

/// Monotonic clock truncated to a fixed tick, for reproducing the behaviour of coarse timers
/// (e.g. a `CLOCKS_PER_SEC`-style process clock)
pub struct TickClock {
    origin: Instant,
    tick: f64,
}

impl TickClock {
    /// `tick` must be non-zero
    pub fn new(tick: Duration) -> Self {
        assert!(!tick.is_zero(), "tick clock needs a non-zero tick");
        TickClock {
            origin: Instant::now(),
            tick: tick.as_secs_f64(),
        }
    }

    pub fn tick(&self) -> f64 {
        self.tick
    }
}

impl ClockSource for TickClock {
    fn now_secs(&mut self) -> f64 {
        let elapsed = self.origin.elapsed().as_secs_f64();
        (elapsed / self.tick).floor() * self.tick
    }

    fn needs_tick_alignment(&self) -> bool {
        true
    }
}

/// Deterministic clock: every read returns the current value then advances it by a fixed
/// increment. Makes the sampler's batch counts and output exactly predictable.
#[derive(Debug, Clone)]
pub struct SteppingClock {
    next: f64,
    increment: f64,
    reads: u64,
    align: bool,
}

impl SteppingClock {
    pub fn new(start: f64, increment: f64) -> Self {
        SteppingClock {
            next: start,
            increment,
            reads: 0,
            align: false,
        }
    }

    /// Ask the sampler to run tick alignment against this clock
    pub fn with_tick_alignment(mut self) -> Self {
        self.align = true;
        self
    }

    /// Number of readings taken so far
    pub fn reads(&self) -> u64 {
        self.reads
    }
}

impl ClockSource for SteppingClock {
    fn now_secs(&mut self) -> f64 {
        let now = self.next;
        self.next += self.increment;
        self.reads += 1;
        now
    }

    fn needs_tick_alignment(&self) -> bool {
        self.align
    }
}

/// Replays a fixed sequence of readings, one per call. Panics once the script runs out, since a
/// phase waiting on an exhausted clock would otherwise spin forever.
#[derive(Debug, Clone)]
pub struct ScriptedClock {
    readings: Vec<f64>,
    pos: usize,
}

impl ScriptedClock {
    pub fn new(readings: Vec<f64>) -> Self {
        ScriptedClock { readings, pos: 0 }
    }

    /// Readings not yet consumed
    pub fn remaining(&self) -> usize {
        self.readings.len() - self.pos
    }
}

impl ClockSource for ScriptedClock {
    fn now_secs(&mut self) -> f64 {
        let Some(&now) = self.readings.get(self.pos) else {
            panic!("scripted clock exhausted after {} readings", self.pos);
        };
        self.pos += 1;
        now
    }
}
