//! Progress reporting seam
//!
//! Long-running stages report a percentage in `0..=100`. Reports are
//! fire-and-forget and must never block the reporting stage.

pub trait ProgressSink: Send + Sync {
    fn report(&self, percent: u8);
}

/// Discards every report.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn report(&self, _percent: u8) {}
}

/// Adapts a closure into a [`ProgressSink`].
pub struct ProgressFn<F>(pub F);

impl<F> ProgressSink for ProgressFn<F>
where
    F: Fn(u8) + Send + Sync,
{
    fn report(&self, percent: u8) {
        (self.0)(percent);
    }
}

/// `done * 100 / total`, capped at 100. An empty total counts as complete.
#[must_use]
pub fn percent_of(done: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    u8::try_from((done.min(total) * 100) / total).unwrap_or(100)
}
