//! # Latency sampler
//!
//! Measures nanoseconds per pointer-chase hop for one `(csize, stride)` pair, net of loop
//! overhead, in two phases:
//!
//! 1. **Combined**: run step batches (`stride` full traversals of the cycle, `csize` hops in
//!    total) until the wall-clock budget is spent, counting batches as `steps`.
//! 2. **Overhead**: run exactly `steps` batches of the same loop shape with the loads removed.
//!
//! Both phases read the clock once per batch, so the clock's own cost cancels out as well. The
//! difference, divided by `steps * csize` hops, is the latency of one dependent load.
use crate::clock::ClockSource;
use crate::config::SweepConfig;
use crate::working_set::WorkingSet;
use log::debug;
use std::hint::black_box;

/// Raw readings of one sample, before the floor clamp
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimingSample {
    pub csize: usize,
    pub stride: usize,
    /// Seconds spent in the combined phase
    pub combined_secs: f64,
    /// Seconds spent in the overhead-only phase
    pub overhead_secs: f64,
    /// Batches run in the combined phase
    pub steps: u64,
    /// Batches run in the overhead phase; always equal to `steps`
    pub overhead_steps: u64,
}

impl TimingSample {
    /// Time attributable to memory accesses
    pub fn net_secs(&self) -> f64 {
        self.combined_secs - self.overhead_secs
    }

    /// Total hops chased during the combined phase
    pub fn accesses(&self) -> f64 {
        self.steps as f64 * self.csize as f64
    }

    /// Unclamped nanoseconds per access. May be zero or negative on a noisy run.
    pub fn latency_ns(&self) -> f64 {
        (self.net_secs() * 1e9) / self.accesses()
    }
}

/// Clamp a raw latency to the reporting floor
pub fn clamp_latency(latency_ns: f64, floor_ns: f64) -> f64 {
    if latency_ns < floor_ns {
        floor_ns
    } else {
        latency_ns
    }
}

/// One overhead batch: the chase's loop structure without the loads
#[inline(always)]
fn overhead_batch(csize: usize, stride: usize) -> usize {
    let mut index = 0usize;
    for _ in 0..stride {
        index = 0;
        loop {
            // keeps the loop from collapsing into its closed form
            index = black_box(index + stride);
            if index >= csize {
                break;
            }
        }
    }
    index
}

/// One combined batch: `stride` full traversals of the cycle
#[inline(always)]
fn step_batch(working_set: &WorkingSet, stride: usize) -> usize {
    let mut next = 0usize;
    for _ in 0..stride {
        next = working_set.chase();
    }
    next
}

pub struct LatencySampler<C: ClockSource> {
    clock: C,
    phase_duration: f64,
    latency_floor_ns: f64,
}

impl<C: ClockSource> LatencySampler<C> {
    pub fn new(clock: C, config: &SweepConfig) -> Self {
        LatencySampler {
            clock,
            phase_duration: config.phase_duration,
            latency_floor_ns: config.latency_floor_ns,
        }
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn into_clock(self) -> C {
        self.clock
    }

    /// Busy-poll until the clock ticks over, returning the first reading of the new tick
    fn align_to_tick(&mut self) -> f64 {
        let lastsec = self.clock.now_secs();
        loop {
            let sec0 = self.clock.now_secs();
            if sec0 != lastsec {
                return sec0;
            }
        }
    }

    /// Run both phases against the pattern currently arranged in `working_set`
    pub fn measure(&mut self, working_set: &WorkingSet) -> TimingSample {
        let csize = working_set.csize();
        let stride = working_set.stride();
        assert!(
            stride >= 1 && stride <= csize / 2,
            "working set isn't arranged (csize={csize} stride={stride})"
        );

        let sec0 = if self.clock.needs_tick_alignment() {
            self.align_to_tick()
        } else {
            self.clock.now_secs()
        };

        let mut steps = 0u64;
        let combined_secs = loop {
            black_box(step_batch(working_set, stride));
            steps += 1;
            let elapsed = self.clock.now_secs() - sec0;
            if elapsed >= self.phase_duration {
                break elapsed;
            }
        };

        let mut overhead_steps = 0u64;
        let start = self.clock.now_secs();
        let overhead_secs = loop {
            black_box(overhead_batch(csize, stride));
            overhead_steps += 1;
            let sec1 = self.clock.now_secs();
            if overhead_steps >= steps {
                break sec1 - start;
            }
        };

        TimingSample {
            csize,
            stride,
            combined_secs,
            overhead_secs,
            steps,
            overhead_steps,
        }
    }

    /// Measure and return the floor-clamped nanoseconds per access
    pub fn sample(&mut self, working_set: &WorkingSet) -> f64 {
        let timing = self.measure(working_set);
        let latency = clamp_latency(timing.latency_ns(), self.latency_floor_ns);
        debug!(
            "csize={} stride={} steps={} combined={:.6}s overhead={:.6}s latency={:.3}ns",
            timing.csize,
            timing.stride,
            timing.steps,
            timing.combined_secs,
            timing.overhead_secs,
            latency
        );
        latency
    }
}
