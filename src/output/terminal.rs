// Colored terminal output for raffle results.
//
// main.rs delegates here so the CLI's match arms stay short.

use std::io::{self, Write};

use colored::Colorize;
use indicatif::ProgressBar;

use crate::error::{ErrorCategory, RaffleError};
use crate::pipeline::RaffleOutcome;

/// Log sink that hides the spinner while a log line is written, so the two
/// don't interleave on stderr.
pub struct SpinnerWriter<W> {
    spinner: ProgressBar,
    inner: W,
}

impl<W: Write> SpinnerWriter<W> {
    pub fn new(spinner: ProgressBar, inner: W) -> Self {
        Self { spinner, inner }
    }
}

impl<W: Write> Write for SpinnerWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.spinner.suspend(|| self.inner.write(buf))
    }

    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        self.spinner.suspend(|| self.inner.write_all(buf))
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Display the winner of a successful run.
pub fn display_outcome(outcome: &RaffleOutcome, criteria: &str) {
    let winner = &outcome.winner;

    println!(
        "\n{}",
        format!("=== Winner: @{} ===", winner.handle).bold()
    );
    println!("  Profile: {}", winner.profile_url().blue().underline());
    if let Some(avatar) = &winner.avatar {
        println!("  Avatar:  {}", avatar.dimmed());
    }
    println!("  DID:     {}", winner.did.dimmed());
    println!();
    println!(
        "  Drawn from {} participant{} ({criteria})",
        outcome.audience_size,
        if outcome.audience_size == 1 { "" } else { "s" },
    );
    println!("  Post:    {}", outcome.post_uri.dimmed());
    println!(
        "  Rolled:  {}",
        outcome.drawn_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
}

/// Display a failed run as a single notice.
pub fn display_error(err: &RaffleError) {
    let message = err.user_message();
    match err.category() {
        ErrorCategory::BadInput => println!("{} {}", "Input error:".yellow().bold(), message),
        ErrorCategory::NoResults => println!("{}", message.bold()),
        ErrorCategory::ServiceError => println!("{} {}", "Service error:".red().bold(), message),
        ErrorCategory::Cancelled => println!("{}", message.dimmed()),
    }
}
