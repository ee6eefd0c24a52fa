/// Receives advisory progress updates from long-running operations.
pub trait ProgressSink {
    /// `fraction` is in [0, 1] for the operation named by `label`.
    fn report(&mut self, label: &str, fraction: f32);

    /// Polled between top-level meshes. Work already done is kept when this returns true.
    fn is_cancelled(&self) -> bool {
        false
    }
}

/// Ignores all progress.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn report(&mut self, _label: &str, _fraction: f32) {}
}
