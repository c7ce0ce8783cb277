//! Facade crate re-exporting stable APIs.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

/// Crate version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use laplace_sdc_core as core;
pub use laplace_sdc_prng as prng;

pub use laplace_sdc_core::{
    round_non_negative, round_to, sample_laplace, CacheKey, LaplaceMechanism, Obfuscator,
    ObfuscatorConfig, ObfuscatorError, Result, ResultCache, DEFAULT_CACHE_BIN,
};
pub use laplace_sdc_prng::{RandomSource, SeedKey, SeedRng};

/// Convenience prelude covering the obfuscator and its random sources.
pub mod prelude {
    pub use laplace_sdc_core::prelude::*;
    pub use laplace_sdc_prng::prelude::*;
}
