//! Seedable FNV-1a hashing
//!
//! Every kind hashes through [`FnvHasher`], folding 8/16/32/64-bit chunks in
//! little-endian byte order. A seed of zero yields the reference FNV-1a
//! function; other seeds are folded in ahead of the data.

use std::hash::{BuildHasher, Hasher};

use crate::scalar::{Complex, Real};

pub const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
pub const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Seed used by the set table and by `hash()` when no seed is given
pub const DEFAULT_HASH_SEED: u64 = 0;

/// Bit pattern every NaN hashes as
const CANONICAL_NAN_BITS: u64 = 0x7ff8_0000_0000_0000;

/// 64-bit FNV-1a hasher
#[derive(Debug, Clone, Copy)]
pub struct FnvHasher {
    state: u64,
}

impl FnvHasher {
    pub fn with_seed(seed: u64) -> Self {
        let mut hasher = Self {
            state: FNV_OFFSET_BASIS,
        };
        if seed != DEFAULT_HASH_SEED {
            hasher.write_u64(seed);
        }
        hasher
    }

    #[inline]
    fn fold_byte(&mut self, byte: u8) {
        self.state ^= u64::from(byte);
        self.state = self.state.wrapping_mul(FNV_PRIME);
    }

    /// Fold a real so that `0.0`/`-0.0` and all NaNs agree, matching how
    /// reals compare for equality
    pub fn write_real(&mut self, value: Real) {
        self.write_u64(canonical_real_bits(value));
    }

    pub fn write_complex(&mut self, value: Complex) {
        self.write_real(value.re);
        self.write_real(value.im);
    }
}

impl Default for FnvHasher {
    fn default() -> Self {
        Self::with_seed(DEFAULT_HASH_SEED)
    }
}

impl Hasher for FnvHasher {
    fn finish(&self) -> u64 {
        self.state
    }

    fn write(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.fold_byte(byte);
        }
    }

    fn write_u8(&mut self, value: u8) {
        self.fold_byte(value);
    }

    fn write_u16(&mut self, value: u16) {
        self.write(&value.to_le_bytes());
    }

    fn write_u32(&mut self, value: u32) {
        self.write(&value.to_le_bytes());
    }

    fn write_u64(&mut self, value: u64) {
        self.write(&value.to_le_bytes());
    }

    fn write_usize(&mut self, value: usize) {
        self.write_u64(value as u64);
    }
}

/// Builds seeded [`FnvHasher`]s for hash-table backed containers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FnvBuildHasher {
    seed: u64,
}

impl FnvBuildHasher {
    pub fn with_seed(seed: u64) -> Self {
        Self { seed }
    }
}

impl Default for FnvBuildHasher {
    fn default() -> Self {
        Self::with_seed(DEFAULT_HASH_SEED)
    }
}

impl BuildHasher for FnvBuildHasher {
    type Hasher = FnvHasher;

    fn build_hasher(&self) -> FnvHasher {
        FnvHasher::with_seed(self.seed)
    }
}

pub fn canonical_real_bits(value: Real) -> u64 {
    if value.is_nan() {
        CANONICAL_NAN_BITS
    } else if value == 0.0 {
        0
    } else {
        value.to_bits()
    }
}

/// Seed perturbation applied to the element at `position` of a container
pub fn position_perturbation(seed: u64, position: usize) -> u64 {
    let mut hasher = FnvHasher::with_seed(seed);
    hasher.write_u64(position as u64);
    hasher.finish()
}

pub fn hash_boolean(value: bool, seed: u64) -> u64 {
    let mut hasher = FnvHasher::with_seed(seed);
    hasher.write_u8(u8::from(value));
    hasher.finish()
}

pub fn hash_integer(value: i64, seed: u64) -> u64 {
    let mut hasher = FnvHasher::with_seed(seed);
    hasher.write_u64(value as u64);
    hasher.finish()
}

pub fn hash_real(value: Real, seed: u64) -> u64 {
    let mut hasher = FnvHasher::with_seed(seed);
    hasher.write_real(value);
    hasher.finish()
}

pub fn hash_complex(value: Complex, seed: u64) -> u64 {
    let mut hasher = FnvHasher::with_seed(seed);
    hasher.write_complex(value);
    hasher.finish()
}
