//! Outcome reporting for the resize batch.

use std::fmt;
use std::path::PathBuf;

/// A single file the batch failed to process.
#[derive(Clone, Debug)]
pub struct ResizeFailure {
    /// The source file that could not be resized.
    pub path: PathBuf,

    /// Why it failed (decode or encode error, rendered for the user).
    pub reason: String,
}

/// The outcome of a resize batch.
///
/// A failure on one file never aborts the batch; it is recorded here and
/// the remaining files are still processed.
#[derive(Clone, Debug, Default)]
pub struct ResizeReport {
    /// Number of files resized and written successfully.
    pub resized: usize,

    /// Files skipped because decoding or encoding failed.
    pub failures: Vec<ResizeFailure>,
}

impl ResizeReport {
    /// Returns true if every file in the batch was processed.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

impl fmt::Display for ResizeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Resized {} image(s), {} failure(s)",
            self.resized,
            self.failures.len()
        )?;
        for failure in &self.failures {
            writeln!(f, "  skipped {}: {}", failure.path.display(), failure.reason)?;
        }
        Ok(())
    }
}
