use std::time::Duration;

/// Shared context passed to job workers.
#[derive(Clone, Debug)]
pub struct JobWorkerContext {
    /// Simulated processing time for each new-student notification.
    pub processing_delay: Duration,
}
