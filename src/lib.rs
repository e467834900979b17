pub mod clock;
pub mod config;
pub mod sampler;
pub mod sweep;
pub mod working_set;

use thiserror::Error;

pub use config::{ConfigError, SweepConfig};
pub use sampler::{LatencySampler, TimingSample};
pub use sweep::Sweep;
pub use working_set::WorkingSet;

/// Failures outside the measurement itself
#[derive(Error, Debug)]
pub enum SweepError {
    #[error("invalid sweep configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("failed writing results: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SweepError>;

/// Convert number of bytes to formatted string
pub fn format_size(bytes: f64) -> String {
    const GB: f64 = 1024.0 * 1024.0 * 1024.0;
    const MB: f64 = 1024.0 * 1024.0;
    const KB: f64 = 1024.0;

    if bytes >= GB {
        format!("{:.2} GiB", bytes / GB)
    } else if bytes >= MB {
        format!("{:.2} MiB", bytes / MB)
    } else if bytes >= KB {
        format!("{:.2} KiB", bytes / KB)
    } else {
        format!("{:.2} B", bytes)
    }
}

/// Table label for a byte count, trailing comma included. Units switch on decimal thresholds but
/// divide by binary multiples, so 1000..1023 bytes print as `0K,`.
pub fn format_size_label(bytes: u64) -> String {
    const GB: u64 = 1024 * 1024 * 1024;
    const MB: u64 = 1024 * 1024;
    const KB: u64 = 1024;

    if bytes < 1_000 {
        format!("{}B,", bytes)
    } else if bytes < 1_000_000 {
        format!("{}K,", bytes / KB)
    } else if bytes < 1_000_000_000 {
        format!("{}M,", bytes / MB)
    } else {
        format!("{}G,", bytes / GB)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_labels_switch_units() {
        assert_eq!(format_size_label(999), "999B,");
        assert_eq!(format_size_label(1024), "1K,");
        assert_eq!(format_size_label(1_048_576), "1M,");
        assert_eq!(format_size_label(1_073_741_824), "1G,");
    }

    #[test]
    fn size_labels_at_decimal_edges() {
        assert_eq!(format_size_label(4), "4B,");
        assert_eq!(format_size_label(1_000), "0K,");
        assert_eq!(format_size_label(524_288), "512K,");
        assert_eq!(format_size_label(999_999), "976K,");
        assert_eq!(format_size_label(1_000_000), "0M,");
        assert_eq!(format_size_label(67_108_864), "64M,");
        assert_eq!(format_size_label(4 * 1_073_741_824), "4G,");
    }

    #[test]
    fn human_sizes() {
        assert_eq!(format_size(512.0), "512.00 B");
        assert_eq!(format_size(4096.0), "4.00 KiB");
        assert_eq!(format_size(64.0 * 1024.0 * 1024.0), "64.00 MiB");
        assert_eq!(format_size(2.0 * 1024.0 * 1024.0 * 1024.0), "2.00 GiB");
    }
}
