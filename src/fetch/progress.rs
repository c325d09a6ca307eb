//! Live transfer progress.

use indicatif::{ProgressBar, ProgressStyle};

/// Creates a progress handle per transfer
pub trait ProgressSink: Send + Sync {
    fn start(&self, name: &str, expected: u64) -> Box<dyn TransferProgress>;
}

/// Progress of one transfer
pub trait TransferProgress: Send {
    /// Report the running total of bytes written
    fn update(&mut self, transferred: u64);
    fn finish(&mut self);
    fn abandon(&mut self);
}

/// Terminal progress bars
#[derive(Debug, Default, Clone, Copy)]
pub struct BarProgress;

impl ProgressSink for BarProgress {
    fn start(&self, name: &str, expected: u64) -> Box<dyn TransferProgress> {
        let bar = if expected > 0 {
            let bar = ProgressBar::new(expected);
            bar.set_style(
                ProgressStyle::with_template(
                    "{msg} [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec}, {eta})",
                )
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=> "),
            );
            bar
        } else {
            // Unknown size: count bytes only
            let bar = ProgressBar::new_spinner();
            bar.set_style(
                ProgressStyle::with_template("{spinner} {msg} {bytes} ({bytes_per_sec})")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner()),
            );
            bar
        };
        bar.set_message(name.to_string());
        Box::new(Bar(bar))
    }
}

struct Bar(ProgressBar);

impl TransferProgress for Bar {
    fn update(&mut self, transferred: u64) {
        self.0.set_position(transferred);
    }

    fn finish(&mut self) {
        self.0.finish();
    }

    fn abandon(&mut self) {
        self.0.abandon();
    }
}

/// Discards progress (tests, `--no-progress`)
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentProgress;

impl ProgressSink for SilentProgress {
    fn start(&self, _name: &str, _expected: u64) -> Box<dyn TransferProgress> {
        Box::new(Silent)
    }
}

struct Silent;

impl TransferProgress for Silent {
    fn update(&mut self, _transferred: u64) {}
    fn finish(&mut self) {}
    fn abandon(&mut self) {}
}
