//! Operation logging handle

use std::fmt::Display;

/// Logging handle passed to the cache and the client.
///
/// Output goes through `tracing`; `verbose` decides whether routine
/// operation messages are emitted at `info` or `debug`.
#[derive(Clone, Copy, Debug)]
pub struct Logger {
    verbose: bool,
}

impl Logger {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    pub fn info(&self, message: impl Display) {
        if self.verbose {
            tracing::info!("{}", message);
        } else {
            tracing::debug!("{}", message);
        }
    }

    pub fn warn(&self, message: impl Display) {
        tracing::warn!("{}", message);
    }

    pub fn error(&self, message: impl Display) {
        tracing::error!("{}", message);
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new(true)
    }
}
