#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Shared CLI utilities for the crowd-flow toolchain.
//!
//! Provides [`init_logger`], which sets up `indicatif-log-bridge` so that
//! `log::info!` and friends are suspended while progress bars redraw, plus
//! the bar constructors the CLI uses.
//!
//! Any binary that calls [`init_logger()`] at startup gets full progress bar
//! support for free.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

pub use indicatif::{MultiProgress, ProgressDrawTarget};

/// Number of positions on an hour-of-day bar.
const HOURS_PER_DAY: u64 = 24;

/// Creates a bar tracking the playback cursor across one day. The
/// position is the current hour and the message carries the snapshot
/// summary.
#[must_use]
pub fn hour_bar(multi: &MultiProgress, hour: u32) -> ProgressBar {
    let bar = multi.add(ProgressBar::new(HOURS_PER_DAY));
    bar.set_style(
        ProgressStyle::with_template("{prefix:.bold} {wide_bar:.green/dim} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("##-"),
    );
    set_hour(&bar, hour);
    bar
}

/// Moves an [`hour_bar`] to `hour`.
pub fn set_hour(bar: &ProgressBar, hour: u32) {
    bar.set_position(u64::from(hour));
    bar.set_prefix(format!("{hour:02}:00"));
}

/// Creates a spinner for work of unknown length (e.g. loading a dataset).
#[must_use]
pub fn spinner(multi: &MultiProgress, message: &str) -> ProgressBar {
    let bar = multi.add(ProgressBar::new_spinner());
    bar.enable_steady_tick(Duration::from_millis(100));
    bar.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    bar.set_message(message.to_string());
    bar
}

/// Initializes the global logger wrapped in `indicatif-log-bridge` so that
/// `log::info!` and friends are suspended while progress bars redraw.
///
/// Returns the [`MultiProgress`] that all progress bars must be added to.
#[must_use]
pub fn init_logger() -> MultiProgress {
    let multi = MultiProgress::new();

    // Build the pretty-env-logger logger manually so we can wrap it.
    let logger = pretty_env_logger::formatted_builder()
        .parse_env("RUST_LOG")
        .build();
    let level = logger.filter();

    indicatif_log_bridge::LogWrapper::new(multi.clone(), logger)
        .try_init()
        .ok(); // Ignore error if logger was already set (e.g., in tests)

    log::set_max_level(level);

    multi
}
