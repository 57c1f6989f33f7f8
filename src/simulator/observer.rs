//! Observer hooks for the step loop.

use crate::error::StepFault;

use super::StepReport;

/// Callbacks invoked by the step loop after every tick.
///
/// All methods have default no-op implementations so implementors only need to override what they
/// care about. Callbacks run on the step loop thread and should return quickly.
pub trait StepObserver: Send {
    /// Called once a step has been committed and published.
    fn on_step(&mut self, _report: &StepReport) {}

    /// Called when a tick was discarded. `step` is the index the tick would have had.
    fn on_fault(&mut self, _step: u64, _fault: &StepFault) {}
}

/// A [`StepObserver`] that does nothing.
pub struct NoopObserver;

impl StepObserver for NoopObserver {}

/// Traces every step through `log`.
pub struct LogObserver;

impl StepObserver for LogObserver {
    fn on_step(&mut self, report: &StepReport) {
        if report.resolution.is_accepted() {
            log::trace!("{}", report.odometry);
        } else {
            log::debug!(
                "step {}: motion rejected, staying at {}",
                report.step,
                report.resolution.pose()
            );
        }
    }
}
