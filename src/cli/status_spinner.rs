use console::{style, Color};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    /// nothing was done, but nothing went wrong either
    Skipped,
    Failure
}

impl Outcome {
    fn symbol(self) -> (&'static str, Color) {
        match self {
            Self::Success => ("✓", Color::Green),
            Self::Skipped => ("-", Color::Yellow),
            Self::Failure => ("✕", Color::Red)
        }
    }
}

impl From<bool> for Outcome {
    fn from(success: bool) -> Self {
        if success { Self::Success } else { Self::Failure }
    }
}

pub struct StatusSpinner<'a> {
    multi: &'a MultiProgress,
    bar: ProgressBar,
}

impl<'a> StatusSpinner<'a> {
    pub fn new(loading: &str, multi: &'a MultiProgress) -> Self {
        let bar = multi.add(ProgressBar::new_spinner());
        bar.enable_steady_tick(Duration::from_millis(100));
        bar.set_message(style(loading).yellow().bright().to_string());
        Self { bar, multi }
    }

    pub fn finish(&self, message: &str, outcome: impl Into<Outcome>) {
        let (symbol, color) = outcome.into().symbol();

        self.bar.set_style(
            ProgressStyle::default_spinner()
                .template("{prefix} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        self.bar.set_prefix(style(symbol).fg(color).bold().to_string());
        self.bar.finish_with_message(style(message).fg(color).bright().to_string());

        self.multi.remove(&self.bar);
    }
}
