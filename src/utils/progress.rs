//! Progress indicators for the pipeline stages

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

const TICK_CHARS: &str = "⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏";

fn spinner(message: String) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("    {spinner:.cyan} {msg} [{elapsed}]")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars(TICK_CHARS),
    );
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Row-counted bar for copying `total_rows` rows out of `table`
pub fn fetch_bar(table: &str, total_rows: usize) -> ProgressBar {
    let pb = ProgressBar::new(total_rows as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("    {msg} [{bar:40.cyan/blue}] {pos}/{len} rows ({per_sec}, {eta})")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓▒░"),
    );
    pb.set_message(format!("Fetching {}", table));
    pb
}

/// Advance a fetch bar by one received batch
pub fn record_batch(pb: &ProgressBar, batch_rows: usize) {
    pb.inc(batch_rows as u64);
}

pub fn resample_spinner(n_samples: usize) -> ProgressBar {
    spinner(format!(
        "Resampling {} training samples with SMOTE + ENN...",
        n_samples
    ))
}

pub fn fit_spinner(n_trees: usize, n_samples: usize) -> ProgressBar {
    spinner(format!("Fitting {} trees on {} samples...", n_trees, n_samples))
}

/// Finish a progress indicator with a success message
pub fn finish_with_success(pb: &ProgressBar, message: &str) {
    pb.finish_with_message(format!("✅ {}", message));
}

/// Finish a progress indicator with a warning message
pub fn finish_with_warning(pb: &ProgressBar, message: &str) {
    pb.finish_with_message(format!("⚠️  {}", message));
}
