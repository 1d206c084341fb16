//! Progress port for fire-and-forget run notifications.

use serde::{Deserialize, Serialize};

/// Completion percentage of a serial analysis run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProgressEvent {
    /// 0 to 100 inclusive.
    pub percent: u8,
}

impl ProgressEvent {
    /// Progress after `done` of `total` files, rounded to the nearest percent.
    #[must_use]
    pub fn after(done: usize, total: usize) -> Self {
        if total == 0 {
            return Self { percent: 100 };
        }
        let percent = (done.min(total) * 200 + total) / (total * 2);
        Self { percent: u8::try_from(percent).unwrap_or(100) }
    }
}

/// Receives progress broadcasts. Delivery is best-effort.
pub trait ProgressSink: Send + Sync {
    /// Publishes one progress event. Must not block the pipeline.
    fn emit(&self, event: ProgressEvent);
}
