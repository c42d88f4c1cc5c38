use crate::constants::{CREATED_PREFIX, ERROR_PREFIX, SEARCH_PREFIX, WARNING_PREFIX};
use crate::search::{SearchEvent, SearchObserver};
use crate::utils::{create_progress_spinner, format_file_size, format_size_delta};
use indicatif::ProgressBar;
use std::fmt::Display;

/// How much the CLI prints. Errors are always printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Verbosity {
    /// Errors only.
    Quiet,
    /// Created files and warnings.
    Normal,
    /// Also every calibration and punt.
    Verbose,
}

impl Verbosity {
    /// `quiet` wins over `verbose`.
    pub fn from_flags(verbose: bool, quiet: bool) -> Self {
        match (verbose, quiet) {
            (_, true) => Verbosity::Quiet,
            (true, false) => Verbosity::Verbose,
            (false, false) => Verbosity::Normal,
        }
    }
}

/// Console reporter handed to the pipeline and the search.
pub struct Logger {
    verbosity: Verbosity,
    spinner: ProgressBar,
}

impl Logger {
    pub fn new(verbosity: Verbosity) -> Self {
        // Verbose output is line based; a spinner would interleave with it
        let spinner = match verbosity {
            Verbosity::Normal => create_progress_spinner("Seeding search..."),
            Verbosity::Quiet | Verbosity::Verbose => ProgressBar::hidden(),
        };
        Self { verbosity, spinner }
    }

    pub fn verbosity(&self) -> Verbosity {
        self.verbosity
    }

    pub fn info(&self, message: impl Display) {
        if self.verbosity >= Verbosity::Normal {
            self.spinner.suspend(|| println!("{}", message));
        }
    }

    pub fn verbose(&self, message: impl Display) {
        if self.verbosity >= Verbosity::Verbose {
            println!("{} {}", SEARCH_PREFIX, message);
        }
    }

    pub fn warn(&self, message: impl Display) {
        if self.verbosity >= Verbosity::Normal {
            self.spinner
                .suspend(|| eprintln!("{} {}", WARNING_PREFIX, message));
        }
    }

    pub fn error(&self, message: impl Display) {
        self.spinner
            .suspend(|| eprintln!("{} {}", ERROR_PREFIX, message));
    }

    /// Reports a breakpoint written to disk.
    pub fn created(&self, path: impl Display, file_size: u64) {
        self.info(format!(
            "{} created {} with size {} bytes ({})",
            CREATED_PREFIX,
            path,
            file_size,
            format_file_size(file_size)
        ));
    }

    pub fn finish(&self) {
        self.spinner.finish_and_clear();
    }
}

impl Drop for Logger {
    fn drop(&mut self) {
        self.finish();
    }
}

impl SearchObserver for &Logger {
    fn observe(&mut self, event: &SearchEvent) {
        match *event {
            SearchEvent::Seeded {
                lower,
                upper,
                factor,
            } => {
                self.verbose(format!(
                    "searching {} .. {} with growth factor {}",
                    lower, upper, factor
                ));
            }
            SearchEvent::Probing {
                checkpoint,
                guess,
                target_size,
            } => {
                self.spinner.set_message(format!(
                    "checkpoint {}: probing {} for {}",
                    checkpoint,
                    guess,
                    format_file_size(target_size)
                ));
                self.verbose(format!(
                    "checkpoint {}: probing {} for {} bytes",
                    checkpoint, guess, target_size
                ));
            }
            SearchEvent::Calibrating { adjustment, .. } => {
                self.verbose(format!("calibrating... {:.4}", adjustment));
            }
            SearchEvent::TimedOut {
                checkpoint,
                guess,
                attempt,
            } => {
                self.warn(format!(
                    "checkpoint {}: probe at {} timed out (attempt {})",
                    checkpoint, guess, attempt
                ));
            }
            SearchEvent::Punting { delta, reason, .. } => {
                self.verbose(format!("punting with delta of {} bytes: {}", delta, reason));
            }
            SearchEvent::Accepted {
                checkpoint,
                dimensions,
                file_size,
                target_size,
            } => {
                self.verbose(format!(
                    "checkpoint {}: accepted {} ({} from target)",
                    checkpoint,
                    dimensions,
                    format_size_delta(file_size, target_size)
                ));
            }
            SearchEvent::Finished { breakpoints } => {
                self.verbose(format!("done after {} breakpoints", breakpoints));
                self.finish();
            }
        }
    }
}
