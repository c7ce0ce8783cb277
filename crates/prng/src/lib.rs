//! Random sources for the Laplace obfuscator.
//!
//! Two flavours are provided: a counter-based Threefry stream that can be
//! seeded externally for reproducible runs, and an OS-entropy-seeded ChaCha20
//! stream used when no seed is supplied. Both are wrapped in [`RandomSource`],
//! the single owned handle an obfuscator draws its noise from.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use std::fmt;

use rand::{CryptoRng, RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;

/// A Threefry key (two u32 words) from which deterministic streams are derived.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SeedKey {
    /// First 32-bit key word.
    pub k1: u32,
    /// Second 32-bit key word.
    pub k2: u32,
}

impl SeedKey {
    /// Create a new key from a 64-bit seed.
    pub fn new(seed: u64) -> Self {
        let (k1, k2) = split_seed(seed);
        Self { k1, k2 }
    }

    /// Absorb arbitrary seed material into a key.
    ///
    /// The bytes are consumed in little-endian 8-byte words, each folded into
    /// the running key, followed by the total length so that trailing zero
    /// bytes still change the result.
    pub fn from_seed_bytes(bytes: &[u8]) -> Self {
        let mut key = Self::new(0);
        for chunk in bytes.chunks(8) {
            let mut word = [0u8; 8];
            word[..chunk.len()].copy_from_slice(chunk);
            key = key.fold_in(u64::from_le_bytes(word));
        }
        key.fold_in(bytes.len() as u64)
    }

    /// Deterministically derive a subkey from additional data.
    pub fn fold_in(self, data: u64) -> Self {
        let (d1, d2) = split_seed(data);
        let (k1, k2) = threefry2x32_pair(self, d1, d2);
        Self { k1, k2 }
    }

    /// Convert the key into a concrete RNG backed by Threefry.
    pub fn to_rng(self) -> SeedRng {
        SeedRng::new(self)
    }
}

/// Threefry RNG stream derived from a key and an internal counter.
#[derive(Clone, Debug)]
pub struct SeedRng {
    key: SeedKey,
    counter: u64,
    buffer: [u32; 2],
    index: usize,
}

impl SeedRng {
    /// Create a new RNG stream from a key.
    pub fn new(key: SeedKey) -> Self {
        Self {
            key,
            counter: 0,
            buffer: [0; 2],
            index: 2,
        }
    }

    fn refill(&mut self) {
        let c0 = self.counter as u32;
        let c1 = self.counter.wrapping_add(1) as u32;
        let (y0, y1) = threefry2x32_pair(self.key, c0, c1);
        self.buffer = [y0, y1];
        self.index = 0;
        self.counter = self.counter.wrapping_add(2);
    }
}

impl RngCore for SeedRng {
    fn next_u32(&mut self) -> u32 {
        if self.index >= 2 {
            self.refill();
        }
        let out = self.buffer[self.index];
        self.index += 1;
        out
    }

    fn next_u64(&mut self) -> u64 {
        let lo = self.next_u32() as u64;
        let hi = self.next_u32() as u64;
        (hi << 32) | lo
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        let mut remaining = dest;
        while !remaining.is_empty() {
            let chunk = self.next_u64().to_le_bytes();
            let take = remaining.len().min(chunk.len());
            remaining[..take].copy_from_slice(&chunk[..take]);
            remaining = &mut remaining[take..];
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

impl CryptoRng for SeedRng {}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Origin {
    Entropy,
    Seeded,
    External,
}

/// The single mutable stream of entropy an obfuscator owns.
///
/// The wrapped generator is never exposed; callers can only draw from it.
/// `Debug` output names where the stream came from but never its state.
pub struct RandomSource {
    inner: Box<dyn RngCore + Send>,
    origin: Origin,
}

impl RandomSource {
    /// A ChaCha20 stream seeded from operating-system entropy.
    pub fn from_entropy() -> Self {
        Self {
            inner: Box::new(ChaCha20Rng::from_entropy()),
            origin: Origin::Entropy,
        }
    }

    /// A reproducible Threefry stream seeded from a 64-bit value.
    pub fn seeded(seed: u64) -> Self {
        Self::from_key(SeedKey::new(seed))
    }

    /// A reproducible Threefry stream seeded from arbitrary bytes.
    pub fn from_seed_bytes(bytes: &[u8]) -> Self {
        Self::from_key(SeedKey::from_seed_bytes(bytes))
    }

    /// A reproducible Threefry stream rooted at `key`.
    pub fn from_key(key: SeedKey) -> Self {
        Self {
            inner: Box::new(key.to_rng()),
            origin: Origin::Seeded,
        }
    }

    /// Wrap a caller-supplied generator.
    pub fn from_rng<R: RngCore + Send + 'static>(rng: R) -> Self {
        Self {
            inner: Box::new(rng),
            origin: Origin::External,
        }
    }

    /// Whether draws are reproducible from caller-provided seed material.
    pub fn is_externally_seeded(&self) -> bool {
        self.origin != Origin::Entropy
    }
}

impl Default for RandomSource {
    fn default() -> Self {
        Self::from_entropy()
    }
}

impl fmt::Debug for RandomSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RandomSource")
            .field("origin", &self.origin)
            .finish_non_exhaustive()
    }
}

impl RngCore for RandomSource {
    fn next_u32(&mut self) -> u32 {
        self.inner.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        self.inner.next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.inner.fill_bytes(dest)
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.inner.try_fill_bytes(dest)
    }
}

fn split_seed(seed: u64) -> (u32, u32) {
    let k1 = (seed >> 32) as u32;
    let k2 = (seed & 0xFFFF_FFFF) as u32;
    (k1, k2)
}

/// Apply the Threefry 2x32 hash to a single pair.
fn threefry2x32_pair(key: SeedKey, x0: u32, x1: u32) -> (u32, u32) {
    const ROTATIONS: [[u32; 4]; 2] = [[13, 15, 26, 6], [17, 29, 16, 24]];

    let ks = [key.k1, key.k2, key.k1 ^ key.k2 ^ 0x1BD1_1BDA];
    let mut x0 = x0.wrapping_add(ks[0]);
    let mut x1 = x1.wrapping_add(ks[1]);

    for block in 0..5u32 {
        for &rot in &ROTATIONS[(block % 2) as usize] {
            round(&mut x0, &mut x1, rot);
        }
        let i = block as usize;
        x0 = x0.wrapping_add(ks[(i + 1) % 3]);
        x1 = x1.wrapping_add(ks[(i + 2) % 3]).wrapping_add(block + 1);
    }

    (x0, x1)
}

#[inline]
fn round(x0: &mut u32, x1: &mut u32, rot: u32) {
    *x0 = x0.wrapping_add(*x1);
    *x1 = x1.rotate_left(rot);
    *x1 ^= *x0;
}

/// Common imports for random sources.
pub mod prelude {
    pub use crate::{RandomSource, SeedKey, SeedRng};
}
