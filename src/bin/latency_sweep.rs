//! Memory latency by working-set size and stride
//!
//! Chases a stride-`s` cycle through working sets of 4 KiB to 64 MiB and prints a table of
//! nanoseconds per dependent load: one row per working-set size, one column per stride. Steps in
//! the table show where the working set falls out of a cache level (down the rows) or where the
//! stride passes a line/page size (across the columns).
//!
//! The table goes to stdout; progress logging goes to stderr (`RUST_LOG=debug` for per-sample
//! detail).

use cache_latency_rs::Sweep;
use cache_latency_rs::clock::MonotonicClock;
use cache_latency_rs::config::SweepConfig;
use log::{error, info, warn};
use std::io::{self, BufWriter};
use std::process::ExitCode;

// use faster/smaller `mimalloc` allocator
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

/// Keep the measurement on one core at top priority so migrations and preemption don't land in the
/// timed phases. Both are best effort.
fn settle_measurement_thread() {
    match core_affinity::get_core_ids().and_then(|ids| ids.last().copied()) {
        Some(core_id) => {
            if core_affinity::set_for_current(core_id) {
                info!("Pinned measurement thread to CPU core {}", core_id.id);
            } else {
                warn!(
                    "Couldn't pin measurement thread to CPU core {} (NOTE: this is expected on macOS)",
                    core_id.id
                );
            }
        }
        None => warn!("Couldn't enumerate CPU cores, measurement thread left unpinned"),
    }

    if thread_priority::set_current_thread_priority(thread_priority::ThreadPriority::Max).is_err() {
        warn!("Couldn't set measurement thread to maximum thread priority");
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    settle_measurement_thread();

    let mut sweep = match Sweep::new(SweepConfig::default(), MonotonicClock::new()) {
        Ok(sweep) => sweep,
        Err(e) => {
            error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let mut out = BufWriter::new(io::stdout().lock());
    if let Err(e) = sweep.run(&mut out) {
        error!("{e}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
