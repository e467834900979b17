//! # Sweep
//!
//! Drives the sampler over every working-set size (powers of two from `min_elements` to
//! `max_elements`) and, for each size, every stride (powers of two up to half the size), writing
//! one CSV-ish table row per size:
//!
//! ```text
//!  ,4B,8B,16B,...
//! 4K, 1.2, 1.1, 1.1,...
//! ```
use crate::clock::ClockSource;
use crate::config::SweepConfig;
use crate::sampler::LatencySampler;
use crate::working_set::{Slot, WorkingSet};
use crate::{Result, format_size, format_size_label};
use log::info;
use std::io::Write;
use std::time::Instant;

/// Powers of two from `start` up to and including `end`. `start` must itself be a power of two.
pub fn powers_of_two(start: usize, end: usize) -> impl Iterator<Item = usize> {
    assert!(start.is_power_of_two(), "{start} is not a power of two");
    std::iter::successors(Some(start), |n| n.checked_mul(2)).take_while(move |n| *n <= end)
}

/// Strides valid for a working set of `csize` elements
pub fn strides_for(csize: usize) -> impl Iterator<Item = usize> {
    powers_of_two(1, csize / 2)
}

fn label_elements(elements: usize) -> String {
    format_size_label((elements * size_of::<Slot>()) as u64)
}

pub struct Sweep<C: ClockSource> {
    config: SweepConfig,
    working_set: WorkingSet,
    sampler: LatencySampler<C>,
}

impl<C: ClockSource> Sweep<C> {
    /// Validate `config` and allocate the working set at its largest size
    pub fn new(config: SweepConfig, clock: C) -> Result<Self> {
        config.validate()?;
        let working_set = WorkingSet::with_capacity(config.max_elements);
        let sampler = LatencySampler::new(clock, &config);
        Ok(Sweep {
            config,
            working_set,
            sampler,
        })
    }

    pub fn config(&self) -> &SweepConfig {
        &self.config
    }

    pub fn sampler(&self) -> &LatencySampler<C> {
        &self.sampler
    }

    /// Working-set sizes, in elements
    pub fn sizes(&self) -> impl Iterator<Item = usize> + use<C> {
        powers_of_two(self.config.min_elements, self.config.max_elements)
    }

    /// Column header: one label per stride the largest working set will use
    pub fn write_header<W: Write>(&self, out: &mut W) -> Result<()> {
        write!(out, " ,")?;
        for stride in strides_for(self.config.max_elements) {
            write!(out, "{}", label_elements(stride))?;
        }
        writeln!(out)?;
        Ok(())
    }

    /// Floor-clamped latency for every stride at `csize`, in stride order
    pub fn measure_row(&mut self, csize: usize) -> Vec<f64> {
        assert!(
            csize <= self.working_set.capacity(),
            "sweep size {csize} exceeds working set capacity"
        );
        strides_for(csize)
            .map(|stride| {
                self.working_set.arrange(csize, stride);
                debug_assert_eq!(self.working_set.cycle_len(), csize / stride);
                self.sampler.sample(&self.working_set)
            })
            .collect()
    }

    pub fn write_row<W: Write>(&self, out: &mut W, csize: usize, latencies: &[f64]) -> Result<()> {
        write!(out, "{}", label_elements(csize))?;
        for latency in latencies {
            write!(out, "{:4.1},", latency)?;
        }
        writeln!(out)?;
        Ok(())
    }

    /// Run the whole sweep, flushing `out` after every row
    pub fn run<W: Write>(&mut self, out: &mut W) -> Result<()> {
        info!(
            "Sweeping working sets {} to {}, {:.1}s per sample",
            format_size((self.config.min_elements * size_of::<Slot>()) as f64),
            format_size((self.config.max_elements * size_of::<Slot>()) as f64),
            self.config.phase_duration
        );
        let sweep_start = Instant::now();

        self.write_header(out)?;
        out.flush()?;

        for csize in self.sizes() {
            let row_start = Instant::now();
            let latencies = self.measure_row(csize);
            self.write_row(out, csize, &latencies)?;
            out.flush()?;
            info!(
                "{} row done: {} strides in {:.1}s",
                format_size((csize * size_of::<Slot>()) as f64),
                latencies.len(),
                row_start.elapsed().as_secs_f64()
            );
        }

        info!(
            "Sweep completed in {:.1}s",
            sweep_start.elapsed().as_secs_f64()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SweepError;
    use crate::clock::{ScriptedClock, SteppingClock};
    use proptest::prelude::*;

    #[test]
    fn geometric_sequences() {
        assert_eq!(powers_of_two(1, 8).collect::<Vec<_>>(), vec![1, 2, 4, 8]);
        assert_eq!(powers_of_two(1024, 4096).collect::<Vec<_>>(), vec![1024, 2048, 4096]);
        assert_eq!(powers_of_two(4, 2).count(), 0);
        assert_eq!(strides_for(2).collect::<Vec<_>>(), vec![1]);
        assert_eq!(powers_of_two(1, usize::MAX).count(), usize::BITS as usize);
    }

    #[test]
    fn default_sweep_dimensions() {
        let config = SweepConfig::default();
        let sizes: Vec<_> = powers_of_two(config.min_elements, config.max_elements).collect();
        assert_eq!(sizes.len(), 15);
        assert_eq!(sizes.first(), Some(&1024));
        assert_eq!(sizes.last(), Some(&(4096 * 4096)));
        assert_eq!(strides_for(config.max_elements).count(), 24);
    }

    #[test]
    fn invalid_config_is_rejected_before_allocating() {
        let config = SweepConfig::new().with_bounds(12, 16);
        let result = Sweep::new(config, SteppingClock::new(0.0, 1.0));
        assert!(matches!(result, Err(SweepError::Config(_))));
    }

    #[test]
    fn header_lists_every_stride_of_the_largest_set() {
        let config = SweepConfig::new().with_bounds(8, 16);
        let sweep = Sweep::new(config, SteppingClock::new(0.0, 1.0)).unwrap();
        let mut out = Vec::new();
        sweep.write_header(&mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), " ,4B,8B,16B,32B,\n");
    }

    #[test]
    fn row_uses_one_decimal_in_four_columns() {
        let config = SweepConfig::new().with_bounds(1024, 1024);
        let sweep = Sweep::new(config, SteppingClock::new(0.0, 1.0)).unwrap();
        let mut out = Vec::new();
        sweep.write_row(&mut out, 1024, &[0.1, 1.24, 12.0, 105.55]).unwrap();
        let row = String::from_utf8(out).unwrap();
        assert!(row.starts_with("4K, 0.1, 1.2,12.0,"), "row={row:?}");
        assert!(row.ends_with(",\n"));
    }

    #[test]
    fn row_measures_every_valid_stride() {
        let config = SweepConfig::new()
            .with_bounds(8, 8)
            .with_phase_duration(1.0);
        // each sample: start, one batch, overhead start, one overhead batch
        let script = vec![
            0.0, 1.0, 10.0, 10.5, // stride 1: net 0.5s over 8 accesses
            0.0, 1.0, 10.0, 10.75, // stride 2: net 0.25s
            0.0, 1.0, 10.0, 11.0, // stride 4: net 0, clamped
        ];
        let mut sweep = Sweep::new(config, ScriptedClock::new(script)).unwrap();
        let latencies = sweep.measure_row(8);
        assert_eq!(latencies, vec![62_500_000.0, 31_250_000.0, 0.1]);
        assert_eq!(sweep.sampler().clock().remaining(), 0);
    }

    proptest! {
        #[test]
        fn strides_never_exceed_half_the_set(exp in 1u32..40) {
            let csize = 1usize << exp;
            let strides: Vec<_> = strides_for(csize).collect();
            prop_assert_eq!(strides.len(), exp as usize);
            prop_assert!(strides.iter().all(|s| s.is_power_of_two() && *s <= csize / 2));
        }
    }
}
