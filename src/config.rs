//! Sweep configuration
//!
//! Defaults are compile-time constants. Library users (and tests) can shrink the sweep or shorten
//! the phase duration through the `with_*` builders; the binary always runs the defaults.
use thiserror::Error;

/// Smallest working set probed, in elements
pub const ARRAY_MIN: usize = 1024;
/// Largest working set probed, in elements (64 MiB of `u32`)
pub const ARRAY_MAX: usize = 4096 * 4096;
/// Wall-clock budget of the combined-cost phase, in seconds. Longer runs average out loop overhead
/// against clock resolution; 20.0 was used historically.
pub const PHASE_DURATION_SECS: f64 = 3.0;
/// Reported latencies below this many nanoseconds are clamped up to it
pub const LATENCY_FLOOR_NS: f64 = 0.1;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("working set bound {name}={value} is not a power of two")]
    NotPowerOfTwo { name: &'static str, value: usize },

    #[error("working set must hold at least 2 elements, got {0}")]
    TooSmall(usize),

    #[error("min_elements ({min}) exceeds max_elements ({max})")]
    InvertedBounds { min: usize, max: usize },

    #[error("phase duration must be finite and positive, got {0}")]
    InvalidDuration(f64),

    #[error("latency floor must be finite and non-negative, got {0}")]
    InvalidFloor(f64),
}

/// Bounds and timing parameters for one sweep
#[derive(Debug, Clone, PartialEq)]
pub struct SweepConfig {
    /// Smallest working set, in elements (power of two)
    pub min_elements: usize,
    /// Largest working set, in elements (power of two), also the buffer capacity
    pub max_elements: usize,
    /// Combined-phase budget in seconds
    pub phase_duration: f64,
    /// Floor applied to each reported latency, in nanoseconds
    pub latency_floor_ns: f64,
}

impl SweepConfig {
    pub fn new() -> Self {
        SweepConfig {
            min_elements: ARRAY_MIN,
            max_elements: ARRAY_MAX,
            phase_duration: PHASE_DURATION_SECS,
            latency_floor_ns: LATENCY_FLOOR_NS,
        }
    }

    pub fn with_bounds(mut self, min_elements: usize, max_elements: usize) -> Self {
        self.min_elements = min_elements;
        self.max_elements = max_elements;
        self
    }

    pub fn with_phase_duration(mut self, secs: f64) -> Self {
        self.phase_duration = secs;
        self
    }

    pub fn with_latency_floor(mut self, floor_ns: f64) -> Self {
        self.latency_floor_ns = floor_ns;
        self
    }

    /// Check the invariants the sampler relies on: power-of-two bounds with room for at least one
    /// stride, and a usable duration and floor.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("min_elements", self.min_elements),
            ("max_elements", self.max_elements),
        ] {
            if !value.is_power_of_two() {
                return Err(ConfigError::NotPowerOfTwo { name, value });
            }
        }
        if self.min_elements < 2 {
            return Err(ConfigError::TooSmall(self.min_elements));
        }
        if self.min_elements > self.max_elements {
            return Err(ConfigError::InvertedBounds {
                min: self.min_elements,
                max: self.max_elements,
            });
        }
        if !self.phase_duration.is_finite() || self.phase_duration <= 0.0 {
            return Err(ConfigError::InvalidDuration(self.phase_duration));
        }
        if !self.latency_floor_ns.is_finite() || self.latency_floor_ns < 0.0 {
            return Err(ConfigError::InvalidFloor(self.latency_floor_ns));
        }
        Ok(())
    }
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = SweepConfig::default();
        assert_eq!(config.min_elements, 1024);
        assert_eq!(config.max_elements, 16_777_216);
        assert_eq!(config.phase_duration, 3.0);
        assert_eq!(config.latency_floor_ns, 0.1);
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn rejects_non_power_of_two_bounds() {
        let config = SweepConfig::new().with_bounds(1000, 4096);
        assert_eq!(
            config.validate(),
            Err(ConfigError::NotPowerOfTwo {
                name: "min_elements",
                value: 1000
            })
        );
        let config = SweepConfig::new().with_bounds(1024, 3000);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NotPowerOfTwo {
                name: "max_elements",
                ..
            })
        ));
    }

    #[test]
    fn rejects_degenerate_bounds() {
        assert_eq!(
            SweepConfig::new().with_bounds(1, 16).validate(),
            Err(ConfigError::TooSmall(1))
        );
        assert_eq!(
            SweepConfig::new().with_bounds(32, 16).validate(),
            Err(ConfigError::InvertedBounds { min: 32, max: 16 })
        );
    }

    #[test]
    fn rejects_bad_duration_and_floor() {
        assert!(matches!(
            SweepConfig::new().with_phase_duration(0.0).validate(),
            Err(ConfigError::InvalidDuration(_))
        ));
        assert!(matches!(
            SweepConfig::new().with_phase_duration(f64::NAN).validate(),
            Err(ConfigError::InvalidDuration(_))
        ));
        assert!(matches!(
            SweepConfig::new().with_latency_floor(-1.0).validate(),
            Err(ConfigError::InvalidFloor(_))
        ));
    }

    #[test]
    fn historical_duration_is_accepted() {
        let config = SweepConfig::new().with_phase_duration(20.0);
        assert_eq!(config.validate(), Ok(()));
    }
}
