//! Reporting of new best solutions found during optimization.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::time::Duration;

use crate::error::DecompError;

/// A new best-so-far solution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub width: usize,
    pub fitness: usize,
    pub elapsed: Duration,
    pub iterations: usize,
}

/// Receives progress events from the optimizers. Sinks are passive: what
/// they do with an event never influences the search.
pub trait ProgressSink {
    fn report(&mut self, progress: Progress);
}

impl ProgressSink for () {
    fn report(&mut self, _progress: Progress) {}
}

impl ProgressSink for Vec<Progress> {
    fn report(&mut self, progress: Progress) {
        self.push(progress);
    }
}

impl<S: ProgressSink + ?Sized> ProgressSink for &mut S {
    fn report(&mut self, progress: Progress) {
        (**self).report(progress);
    }
}

/// Forwards events to the `log` facade at info level.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl ProgressSink for LogSink {
    fn report(&mut self, p: Progress) {
        log::info!(
            "best width {} (fitness {}) after {} ms, {} iterations",
            p.width,
            p.fitness,
            p.elapsed.as_millis(),
            p.iterations
        );
    }
}

/// Appends one line per event to a text file.
#[derive(Debug)]
pub struct FileSink {
    file: File,
}

impl FileSink {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, DecompError> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(FileSink { file })
    }

    /// Appends a free-form line, e.g. a run header.
    pub fn write_line(&mut self, line: &str) -> Result<(), DecompError> {
        writeln!(self.file, "{}", line)?;
        Ok(())
    }
}

impl ProgressSink for FileSink {
    fn report(&mut self, p: Progress) {
        let line = format!(
            "BS {} in {} ms (i {})",
            p.width,
            p.elapsed.as_millis(),
            p.iterations
        );
        if let Err(e) = self.write_line(&line) {
            log::warn!("could not write progress: {}", e);
        }
    }
}
