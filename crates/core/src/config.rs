//! Obfuscator configuration.

use laplace_sdc_prng::RandomSource;

use crate::error::{ObfuscatorError, Result};
use crate::obfuscator::Obfuscator;

/// Options recognised when constructing an [`Obfuscator`].
#[derive(Debug)]
pub struct ObfuscatorConfig {
    /// Entropy source for noise draws. `None` seeds a fresh generator from
    /// operating-system entropy.
    pub random_source: Option<RandomSource>,
    /// Whether non-positive true values are perturbed. When false they are
    /// reported as exactly zero.
    pub obfuscate_zero: bool,
    /// Whether repeated queries are answered from the result cache.
    pub use_caching: bool,
    /// Granularity of output rounding. Must be positive.
    pub rounding_step: i64,
}

impl Default for ObfuscatorConfig {
    fn default() -> Self {
        Self {
            random_source: None,
            obfuscate_zero: true,
            use_caching: true,
            rounding_step: 1,
        }
    }
}

impl ObfuscatorConfig {
    /// Supply an external, e.g. seeded, random source.
    pub fn with_random_source(mut self, source: RandomSource) -> Self {
        self.random_source = Some(source);
        self
    }

    /// Set whether zero is obfuscated.
    pub fn with_obfuscate_zero(mut self, obfuscate_zero: bool) -> Self {
        self.obfuscate_zero = obfuscate_zero;
        self
    }

    /// Enable or disable the result cache.
    pub fn with_caching(mut self, use_caching: bool) -> Self {
        self.use_caching = use_caching;
        self
    }

    /// Set the rounding step, e.g. 1, 5 or 10.
    pub fn with_rounding_step(mut self, rounding_step: i64) -> Self {
        self.rounding_step = rounding_step;
        self
    }

    /// Validate configuration parameters.
    pub fn validate(&self) -> Result<()> {
        if self.rounding_step <= 0 {
            return Err(ObfuscatorError::config(format!(
                "rounding_step must be positive, got {}",
                self.rounding_step
            )));
        }
        Ok(())
    }

    /// Validate and build an obfuscator.
    pub fn build(self) -> Result<Obfuscator> {
        Obfuscator::new(self)
    }
}
