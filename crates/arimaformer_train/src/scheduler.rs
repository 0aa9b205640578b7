//! Learning rate schedulers.

/// Trait for learning rate schedulers.
pub trait Scheduler: Send + Sync {
    /// Get the learning rate for the current step.
    fn get_lr(&self, step: usize) -> f64;

    /// Get the scheduler name.
    fn name(&self) -> &str;
}

/// Step decay: the rate is multiplied by `gamma` every `step_size` steps.
///
/// The trainer steps it once per epoch, so epoch `e` (0-based) runs at
/// `initial_lr * gamma^(e / step_size)`.
#[derive(Debug, Clone)]
pub struct StepLR {
    initial_lr: f64,
    step_size: usize,
    gamma: f64,
}

impl StepLR {
    /// Create a new step decay scheduler. A `step_size` of zero is treated as one.
    pub fn new(initial_lr: f64, step_size: usize, gamma: f64) -> Self {
        Self {
            initial_lr,
            step_size: step_size.max(1),
            gamma,
        }
    }
}

impl Scheduler for StepLR {
    fn get_lr(&self, step: usize) -> f64 {
        let n_decays = step / self.step_size;
        self.initial_lr * self.gamma.powi(n_decays as i32)
    }

    fn name(&self) -> &str {
        "StepLR"
    }
}
