//! Live progress sink that draws a one-line bar on stderr.

use std::io::Write as _;

use crate::ports::progress::{ProgressEvent, ProgressSink};

const BAR_WIDTH: usize = 30;

/// Writes progress to stderr, overwriting the current line.
pub struct StderrProgress;

impl ProgressSink for StderrProgress {
    fn emit(&self, event: ProgressEvent) {
        let filled = BAR_WIDTH * usize::from(event.percent) / 100;
        let mut stderr = std::io::stderr().lock();
        let _ = write!(
            stderr,
            "\r[{}{}] {:>3}%",
            "#".repeat(filled),
            "-".repeat(BAR_WIDTH - filled),
            event.percent
        );
        if event.percent >= 100 {
            let _ = writeln!(stderr);
        }
        let _ = stderr.flush();
    }
}

/// Discards every event.
pub struct SilentProgress;

impl ProgressSink for SilentProgress {
    fn emit(&self, event: ProgressEvent) {
        tracing::debug!(percent = event.percent, "progress");
    }
}
