//! Step-size controller.

/// Multiplicative step controller, `h_new = safety · h · err^(-1/order)`.
#[derive(Debug, Clone, Copy)]
pub struct StepController {
    pub safety: f64,
    pub max_factor: f64,
    pub min_factor: f64,
    /// Largest factor applied after a rejected step.
    pub reject_factor: f64,
    pub exponent: f64,
}

impl Default for StepController {
    fn default() -> Self {
        Self {
            safety: 0.9,
            max_factor: 5.0,
            min_factor: 0.1,
            reject_factor: 0.5,
            exponent: 1.0 / f64::from(crate::tableau::ORDER),
        }
    }
}

impl StepController {
    /// Factor for the next step after an accepted one (`error <= 1`).
    pub fn grow(&self, error: f64) -> f64 {
        if error <= 0.0 {
            return self.max_factor;
        }
        (self.safety * error.powf(-self.exponent)).clamp(self.min_factor, self.max_factor)
    }

    /// Factor for retrying a rejected step; always shrinks by at least `reject_factor`.
    pub fn shrink(&self, error: f64) -> f64 {
        if !error.is_finite() {
            return self.min_factor;
        }
        self.grow(error).min(self.reject_factor)
    }
}
