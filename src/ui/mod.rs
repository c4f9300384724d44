//! User-facing output
//!
//! This module handles:
//! - Informational, verbose and warning lines
//! - Spinners for long-running steps (extraction)
//! - Byte progress bars for layer downloads
//! - Silent reporting for tests and scripted use
//!
//! All output goes through the [`Reporter`] trait, so the install pipeline never
//! writes to the terminal directly.

use std::time::Duration;

use console::Style;
use indicatif::{ProgressBar, ProgressStyle};

/// Reporter trait for user-visible progress
pub trait Reporter {
    /// Informational line
    fn info(&mut self, message: &str);

    /// Line shown only with `--verbose`
    fn verbose(&mut self, message: &str);

    /// Warning line for recoverable conditions
    fn warning(&mut self, message: &str);

    /// Start a spinner for a step that may take a while
    fn start_step(&mut self, message: &str);

    /// Start a download of `total` bytes, or of unknown size
    fn start_transfer(&mut self, message: &str, total: Option<u64>);

    /// Count `bytes` more received for the current download
    fn advance(&mut self, bytes: u64);

    /// Finish the current step or download successfully
    fn success(&mut self, message: &str);

    /// Abandon the current step or download on error
    fn abandon(&mut self);
}

/// Terminal reporter with coloured prefixes, spinners and progress bars
pub struct ConsoleReporter {
    verbose: bool,
    progress: Option<ProgressBar>,
}

impl ConsoleReporter {
    pub fn new(verbose: bool) -> Self {
        Self {
            verbose,
            progress: None,
        }
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::default_spinner()
            .template("{spinner} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"])
    }

    fn transfer_style() -> ProgressStyle {
        ProgressStyle::default_bar()
            .template("[{bar:40.cyan/blue}] {bytes}/{total_bytes} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> ")
    }

    fn transfer_spinner_style() -> ProgressStyle {
        ProgressStyle::default_spinner()
            .template("{spinner} {bytes} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
    }
}

impl Reporter for ConsoleReporter {
    fn info(&mut self, message: &str) {
        println!("{} {}", Style::new().cyan().bold().apply_to("INFO"), message);
    }

    fn verbose(&mut self, message: &str) {
        if self.verbose {
            println!("{} {}", Style::new().dim().apply_to("DEBUG"), message);
        }
    }

    fn warning(&mut self, message: &str) {
        eprintln!(
            "{} {}",
            Style::new().yellow().bold().apply_to("WARN"),
            message
        );
    }

    fn start_step(&mut self, message: &str) {
        let pb = ProgressBar::new_spinner();
        pb.set_style(Self::spinner_style());
        pb.set_message(message.to_string());
        pb.enable_steady_tick(Duration::from_millis(80));
        self.progress = Some(pb);
    }

    fn start_transfer(&mut self, message: &str, total: Option<u64>) {
        let pb = match total {
            Some(len) => {
                let pb = ProgressBar::new(len);
                pb.set_style(Self::transfer_style());
                pb
            }
            None => {
                let pb = ProgressBar::new_spinner();
                pb.set_style(Self::transfer_spinner_style());
                pb.enable_steady_tick(Duration::from_millis(80));
                pb
            }
        };
        pb.set_message(message.to_string());
        self.progress = Some(pb);
    }

    fn advance(&mut self, bytes: u64) {
        if let Some(pb) = &self.progress {
            pb.inc(bytes);
        }
    }

    fn success(&mut self, message: &str) {
        if let Some(pb) = self.progress.take() {
            pb.finish_and_clear();
        }
        println!(
            "{} {}",
            Style::new().green().bold().apply_to("SUCCESS"),
            message
        );
    }

    fn abandon(&mut self) {
        if let Some(pb) = self.progress.take() {
            pb.abandon();
        }
    }
}

impl Drop for ConsoleReporter {
    fn drop(&mut self) {
        self.abandon();
    }
}

/// Reporter that displays nothing
#[cfg(test)]
#[derive(Default)]
pub struct SilentReporter;

#[cfg(test)]
impl Reporter for SilentReporter {
    fn info(&mut self, _message: &str) {}

    fn verbose(&mut self, _message: &str) {}

    fn warning(&mut self, _message: &str) {}

    fn start_step(&mut self, _message: &str) {}

    fn start_transfer(&mut self, _message: &str, _total: Option<u64>) {}

    fn advance(&mut self, _bytes: u64) {}

    fn success(&mut self, _message: &str) {}

    fn abandon(&mut self) {}
}
