//! Laplace noise sampling.
//!
//! Samples are drawn by inverse-CDF transform of a single uniform draw:
//!
//! ```text
//! u = r - 0.5,             r ~ Uniform(0, 1)
//! x = mu - b * sign(u) * ln(1 - 2|u|)
//! ```
//!
//! As `r` approaches either end of the unit interval, `1 - 2|u|` approaches
//! zero and the logarithm diverges, so the noise magnitude is unbounded in
//! distribution. The uniform draw is taken from the open interval `(0, 1)`,
//! which keeps every individual sample finite: the largest magnitude a
//! 52-bit draw can reach is roughly `37 * b`.

use rand::distributions::{Distribution, Open01};
use rand::Rng;

use crate::error::{ObfuscatorError, Result};

/// Draw one sample from Laplace(`mu`, `b`).
///
/// `b` must be finite and positive; callers validate it through
/// [`LaplaceMechanism::validate`].
pub fn sample_laplace<R: Rng + ?Sized>(mu: f64, b: f64, rng: &mut R) -> f64 {
    let r: f64 = Open01.sample(rng);
    let u = r - 0.5;
    mu - b * u.signum() * (1.0 - 2.0 * u.abs()).ln()
}

/// Laplace mechanism calibrated from sensitivity and epsilon.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LaplaceMechanism {
    /// Epsilon parameter.
    pub epsilon: f64,
    /// L1 sensitivity bound.
    pub sensitivity: f64,
}

impl LaplaceMechanism {
    /// Create a new Laplace mechanism.
    pub fn new(epsilon: f64, sensitivity: f64) -> Self {
        Self {
            epsilon,
            sensitivity,
        }
    }

    /// Reject parameters that would make the noise scale meaningless.
    pub fn validate(&self) -> Result<()> {
        if !self.sensitivity.is_finite() || self.sensitivity <= 0.0 {
            return Err(ObfuscatorError::invalid(format!(
                "sensitivity must be positive and finite, got {}",
                self.sensitivity
            )));
        }
        if !self.epsilon.is_finite() || self.epsilon <= 0.0 {
            return Err(ObfuscatorError::invalid(format!(
                "epsilon must be positive and finite, got {}",
                self.epsilon
            )));
        }
        let scale = self.scale();
        if !scale.is_finite() || scale <= 0.0 {
            return Err(ObfuscatorError::invalid(
                "sensitivity / epsilon does not yield a finite positive noise scale",
            ));
        }
        Ok(())
    }

    /// Get the scale parameter.
    pub fn scale(&self) -> f64 {
        self.sensitivity / self.epsilon
    }

    /// Draw zero-centred noise at this mechanism's scale.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        sample_laplace(0.0, self.scale(), rng)
    }
}
