// ============================================================
// Layer 5 — Learning-Rate Schedule
// ============================================================
// Linear warmup followed by linear decay to zero:
//
//   lr(step) = base * step / warmup                   step < warmup
//   lr(step) = base * (total - step) / (total - warmup)  otherwise
//
// `step` counts optimiser updates already taken, so the very
// first update (step 0) with no warmup runs at the full base rate
// and the last update of training runs just above zero.

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearWarmupSchedule {
    base_lr:      f64,
    warmup_steps: usize,
    total_steps:  usize,
}

impl LinearWarmupSchedule {
    pub fn new(base_lr: f64, warmup_steps: usize, total_steps: usize) -> Self {
        Self { base_lr, warmup_steps, total_steps }
    }

    /// Learning rate for the update that follows `step` completed updates.
    pub fn lr_at(&self, step: usize) -> f64 {
        if step < self.warmup_steps {
            return self.base_lr * step as f64 / self.warmup_steps.max(1) as f64;
        }
        let remaining = self.total_steps.saturating_sub(step) as f64;
        let span      = self.total_steps.saturating_sub(self.warmup_steps).max(1) as f64;
        self.base_lr * (remaining / span).max(0.0)
    }
}
