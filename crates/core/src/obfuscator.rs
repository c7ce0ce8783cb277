//! Result-caching Laplace obfuscator.
//!
//! An [`Obfuscator`] perturbs integer query results with Laplace noise,
//! rounds them onto a configured grid and floors them at zero. With caching
//! enabled, a query fingerprint `(sensitivity, value, cache_bin)` always gets
//! the answer it got the first time, so an attacker cannot average out the
//! noise by asking again. Note that epsilon is not part of the fingerprint:
//! a repeated query with a different epsilon is answered from the cache.
//!
//! Every operation runs under one instance-wide lock. Noise draws and cache
//! mutation are therefore totally ordered, which is what makes the answers of
//! an externally seeded obfuscator reproducible for a given call sequence.

use std::fmt;

use laplace_sdc_prng::RandomSource;
use parking_lot::Mutex;
use rand::Rng;
use tracing::{debug, trace, warn};

use crate::cache::{CacheKey, ResultCache};
use crate::config::ObfuscatorConfig;
use crate::error::{ObfuscatorError, Result};
use crate::laplace::LaplaceMechanism;
use crate::rounding::round_non_negative;

/// Cache bin used when the caller does not name one.
pub const DEFAULT_CACHE_BIN: i64 = 1;

const LOG_TARGET: &str = "laplace_sdc";

struct EngineState {
    source: RandomSource,
    /// `None` on a non-caching obfuscator.
    cache: Option<ResultCache<CacheKey, i64>>,
}

/// Laplace obfuscator with a deterministic result cache.
///
/// Share between threads with `Arc<Obfuscator>`.
pub struct Obfuscator {
    obfuscate_zero: bool,
    use_caching: bool,
    rounding_step: i64,
    state: Mutex<EngineState>,
}

impl Obfuscator {
    /// Validate `config` and build an obfuscator from it.
    pub fn new(config: ObfuscatorConfig) -> Result<Self> {
        if let Err(err) = config.validate() {
            warn!(target: LOG_TARGET, error = %err, "rejected obfuscator configuration");
            return Err(err);
        }
        Ok(Self::assemble(config))
    }

    /// Build an obfuscator with the default configuration: entropy-seeded,
    /// caching, obfuscating zero, rounding to integers.
    pub fn with_defaults() -> Self {
        Self::assemble(ObfuscatorConfig::default())
    }

    fn assemble(config: ObfuscatorConfig) -> Self {
        let ObfuscatorConfig {
            random_source,
            obfuscate_zero,
            use_caching,
            rounding_step,
        } = config;
        let source = random_source.unwrap_or_else(RandomSource::from_entropy);

        debug!(
            target: LOG_TARGET,
            obfuscate_zero,
            use_caching,
            rounding_step,
            externally_seeded = source.is_externally_seeded(),
            "obfuscator constructed"
        );

        Self {
            obfuscate_zero,
            use_caching,
            rounding_step,
            state: Mutex::new(EngineState {
                source,
                cache: use_caching.then(ResultCache::new),
            }),
        }
    }

    /// Perturb `value` with the (epsilon, 0) Laplace mechanism in the
    /// default cache bin.
    pub fn privatize(&self, value: i64, sensitivity: f64, epsilon: f64) -> Result<i64> {
        self.privatize_in_bin(value, sensitivity, epsilon, DEFAULT_CACHE_BIN)
    }

    /// Perturb `value` with the (epsilon, 0) Laplace mechanism.
    ///
    /// Different cache bins receive independent noise for the same value and
    /// sensitivity, e.g. one bin per stratifier.
    ///
    /// # Errors
    ///
    /// [`ObfuscatorError::InvalidArgument`] if `sensitivity` or `epsilon` is
    /// not positive and finite, or their ratio is not a finite noise scale.
    /// Nothing is drawn or cached in that case.
    pub fn privatize_in_bin(
        &self,
        value: i64,
        sensitivity: f64,
        epsilon: f64,
        cache_bin: i64,
    ) -> Result<i64> {
        let mechanism = LaplaceMechanism::new(epsilon, sensitivity);
        if let Err(err) = mechanism.validate() {
            warn!(target: LOG_TARGET, error = %err, "rejected privatize call");
            return Err(err);
        }

        if !self.obfuscate_zero && value <= 0 {
            return Ok(0);
        }

        let rounding_step = self.rounding_step;
        let mut state = self.state.lock();
        let EngineState { source, cache } = &mut *state;

        match cache {
            Some(cache) => {
                let mut fresh = false;
                let key = CacheKey::new(sensitivity, value, cache_bin);
                let result = cache.get_or_compute(key, || {
                    fresh = true;
                    perturb(value, &mechanism, rounding_step, source)
                });
                trace!(
                    target: LOG_TARGET,
                    cache_bin,
                    fresh,
                    "privatize answered from result cache"
                );
                Ok(result)
            }
            None => Ok(perturb(value, &mechanism, rounding_step, source)),
        }
    }

    /// Whether the query `(value, sensitivity, cache_bin)` has a cached answer.
    ///
    /// # Errors
    ///
    /// [`ObfuscatorError::InvalidOperation`] on a non-caching obfuscator.
    pub fn is_cached(&self, value: i64, sensitivity: f64, cache_bin: i64) -> Result<bool> {
        let state = self.state.lock();
        let cache = caching_only(&state, "inspecting")?;
        Ok(cache.contains(&CacheKey::new(sensitivity, value, cache_bin)))
    }

    /// Number of cached answers.
    ///
    /// # Errors
    ///
    /// [`ObfuscatorError::InvalidOperation`] on a non-caching obfuscator.
    pub fn cached_entries(&self) -> Result<usize> {
        let state = self.state.lock();
        Ok(caching_only(&state, "inspecting")?.len())
    }

    /// Drop every cached answer. The random source keeps its position, so
    /// subsequent queries draw fresh noise.
    ///
    /// # Errors
    ///
    /// [`ObfuscatorError::InvalidOperation`] on a non-caching obfuscator.
    pub fn clear_cache(&self) -> Result<()> {
        let mut state = self.state.lock();
        match state.cache.as_mut() {
            Some(cache) => {
                let removed = cache.clear();
                debug!(target: LOG_TARGET, removed, "result cache cleared");
                Ok(())
            }
            None => Err(not_caching("clearing")),
        }
    }

    /// Whether non-positive values are perturbed.
    pub fn obfuscate_zero(&self) -> bool {
        self.obfuscate_zero
    }

    /// Whether answers are cached.
    pub fn uses_caching(&self) -> bool {
        self.use_caching
    }

    /// Granularity results are rounded to.
    pub fn rounding_step(&self) -> i64 {
        self.rounding_step
    }
}

impl fmt::Debug for Obfuscator {
    // Cache contents pair true values with their noisy answers and must never
    // be printed; only the entry count is shown.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("Obfuscator")
            .field("obfuscate_zero", &self.obfuscate_zero)
            .field("use_caching", &self.use_caching)
            .field("rounding_step", &self.rounding_step)
            .field("cached_entries", &state.cache.as_ref().map(ResultCache::len))
            .field("random_source", &state.source)
            .finish()
    }
}

fn perturb<R: Rng + ?Sized>(
    value: i64,
    mechanism: &LaplaceMechanism,
    rounding_step: i64,
    rng: &mut R,
) -> i64 {
    round_non_negative(value as f64 + mechanism.sample(rng), rounding_step)
}

fn caching_only<'a>(
    state: &'a EngineState,
    action: &str,
) -> Result<&'a ResultCache<CacheKey, i64>> {
    state.cache.as_ref().ok_or_else(|| not_caching(action))
}

fn not_caching(action: &str) -> ObfuscatorError {
    ObfuscatorError::operation(format!(
        "obfuscator is not caching, hence {action} the cache is not allowed"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded(seed: u64) -> ObfuscatorConfig {
        ObfuscatorConfig::default().with_random_source(RandomSource::seeded(seed))
    }

    #[test]
    fn obfuscator_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Obfuscator>();
    }

    #[test]
    fn cached_answer_is_stable() {
        let obf = seeded(1).build().unwrap();
        let first = obf.privatize_in_bin(1_000, 1.0, 0.5, 3).unwrap();
        for _ in 0..10 {
            assert_eq!(obf.privatize_in_bin(1_000, 1.0, 0.5, 3).unwrap(), first);
        }
        assert!(obf.is_cached(1_000, 1.0, 3).unwrap());
        assert!(!obf.is_cached(1_000, 1.0, 4).unwrap());
        assert_eq!(obf.cached_entries().unwrap(), 1);
    }

    #[test]
    fn default_bin_is_one() {
        let obf = seeded(2).build().unwrap();
        let a = obf.privatize(500, 2.0, 1.0).unwrap();
        assert!(obf.is_cached(500, 2.0, DEFAULT_CACHE_BIN).unwrap());
        assert_eq!(obf.privatize_in_bin(500, 2.0, 1.0, 1).unwrap(), a);
    }

    #[test]
    fn non_positive_values_pass_through_without_drawing() {
        let skipping = seeded(3).with_obfuscate_zero(false).build().unwrap();
        assert_eq!(skipping.privatize(0, 1.0, 0.0001).unwrap(), 0);
        assert_eq!(skipping.privatize(-17, 1.0, 0.0001).unwrap(), 0);
        assert!(!skipping.is_cached(0, 1.0, 1).unwrap());
        assert_eq!(skipping.cached_entries().unwrap(), 0);

        let reference = seeded(3).with_obfuscate_zero(false).build().unwrap();
        assert_eq!(
            skipping.privatize(1_000_000, 1.0, 0.0001).unwrap(),
            reference.privatize(1_000_000, 1.0, 0.0001).unwrap()
        );
    }

    #[test]
    fn rejected_arguments_consume_no_randomness() {
        let a = seeded(4).build().unwrap();
        let b = seeded(4).build().unwrap();

        for (sens, eps) in [(1.0, 0.0), (0.0, 1.0), (-1.0, 1.0), (1.0, f64::NAN)] {
            let err = a.privatize(10, sens, eps).unwrap_err();
            assert!(matches!(err, ObfuscatorError::InvalidArgument { .. }));
        }
        assert_eq!(a.cached_entries().unwrap(), 0);
        assert_eq!(
            a.privatize(1_000_000, 1.0, 0.001).unwrap(),
            b.privatize(1_000_000, 1.0, 0.001).unwrap()
        );
    }

    #[test]
    fn non_caching_obfuscator_refuses_inspection() {
        let obf = seeded(5).with_caching(false).build().unwrap();
        assert!(!obf.uses_caching());
        assert!(matches!(
            obf.is_cached(10, 1.0, 1),
            Err(ObfuscatorError::InvalidOperation { .. })
        ));
        assert!(matches!(
            obf.cached_entries(),
            Err(ObfuscatorError::InvalidOperation { .. })
        ));
        assert!(matches!(
            obf.clear_cache(),
            Err(ObfuscatorError::InvalidOperation { .. })
        ));
    }

    #[test]
    fn invalid_rounding_step_fails_construction() {
        let err = seeded(6).with_rounding_step(0).build().unwrap_err();
        assert!(matches!(err, ObfuscatorError::InvalidConfiguration { .. }));
    }

    #[test]
    fn debug_output_hides_values() {
        let obf = seeded(7).with_rounding_step(5).build().unwrap();
        let answer = obf.privatize(987_654_321, 1.0, 1.0).unwrap();
        let dump = format!("{obf:?}");
        assert!(dump.contains("rounding_step: 5"));
        assert!(dump.contains("cached_entries: Some(1)"));
        assert!(!dump.contains("987654321"));
        assert!(!dump.contains(&answer.to_string()));
    }

    #[test]
    fn defaults_are_applied() {
        let obf = Obfuscator::with_defaults();
        assert!(obf.obfuscate_zero());
        assert!(obf.uses_caching());
        assert_eq!(obf.rounding_step(), 1);
        let built = ObfuscatorConfig::default().build().unwrap();
        assert!(built.uses_caching());
    }

    #[test]
    fn configuration_is_readable_while_engine_is_locked() {
        let obf = seeded(9)
            .with_caching(false)
            .with_rounding_step(10)
            .build()
            .unwrap();
        let _guard = obf.state.lock();
        assert!(!obf.uses_caching());
        assert!(obf.obfuscate_zero());
        assert_eq!(obf.rounding_step(), 10);
    }

    #[test]
    fn answer_is_rounded_mechanism_sample() {
        let obf = seeded(8).build().unwrap();
        let mechanism = LaplaceMechanism::new(0.001, 1.0);
        let expected = round_non_negative(
            1_000_000.0 + mechanism.sample(&mut RandomSource::seeded(8)),
            1,
        );
        assert_eq!(obf.privatize(1_000_000, 1.0, 0.001).unwrap(), expected);
    }
}
