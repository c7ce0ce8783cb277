//! Laplace-mechanism statistical disclosure control.
//!
//! This crate perturbs integer query results with calibrated Laplace noise
//! and caches each answer so that repeating a query returns the same noisy
//! value instead of a fresh one that could be averaged away.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cache;
pub mod config;
pub mod error;
pub mod laplace;
pub mod obfuscator;
pub mod rounding;

pub use cache::{CacheKey, ResultCache};
pub use config::ObfuscatorConfig;
pub use error::{ObfuscatorError, Result};
pub use laplace::{sample_laplace, LaplaceMechanism};
pub use obfuscator::{Obfuscator, DEFAULT_CACHE_BIN};
pub use rounding::{round_non_negative, round_to};

/// Common imports for downstream users.
pub mod prelude {
    pub use crate::{
        round_non_negative, round_to, sample_laplace, CacheKey, LaplaceMechanism, Obfuscator,
        ObfuscatorConfig, ObfuscatorError, Result, ResultCache, DEFAULT_CACHE_BIN,
    };
}
