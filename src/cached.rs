// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! The cached-number type used inside caches, and its conversions.
//!
//! Conceptually the arithmetic inside a cache is "either floating point or
//! a signed fixed-point with known shift" (spec). The `cache_use_fixed`
//! feature selects which; callers never `as`-cast between representations
//! directly, they go through [`to_cached`]/[`from_cached`] (and, for the
//! final device-facing values, [`to_frac`]/[`to_fixed`]), so the other
//! variant stays reachable.

/// Normalized 16-bit fractional value in `[0, 1]`.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Frac(pub u16);

impl Frac {
    pub const ZERO: Frac = Frac(0);
    pub const ONE: Frac = Frac(u16::MAX);

    pub fn from_f32(f: f32) -> Frac {
        Frac((f.clamp(0.0, 1.0) * u16::MAX as f32).round() as u16)
    }

    pub fn to_f32(self) -> f32 {
        self.0 as f32 / u16::MAX as f32
    }

    pub fn from_byte(b: u8) -> Frac {
        // Replicates the original's `byte2frac`: spread an 8-bit sample
        // across the full 16-bit range rather than just shifting it in,
        // so 0xff maps to `Frac::ONE` exactly.
        Frac(((b as u16) << 8) | b as u16)
    }
}

/// Signed fixed-point number with a compile-time shift, used when
/// `cache_use_fixed` is enabled.
#[derive(Copy, Clone, Debug, Default, PartialEq, PartialOrd)]
pub struct Fixed(pub i32);

impl Fixed {
    pub const SHIFT: u32 = 16;

    pub fn from_f32(f: f32) -> Fixed {
        Fixed((f * (1i32 << Self::SHIFT) as f32).round() as i32)
    }

    pub fn to_f32(self) -> f32 {
        self.0 as f32 / (1i32 << Self::SHIFT) as f32
    }
}

impl std::ops::Add for Fixed {
    type Output = Fixed;
    fn add(self, rhs: Fixed) -> Fixed {
        Fixed(self.0 + rhs.0)
    }
}

impl std::ops::Sub for Fixed {
    type Output = Fixed;
    fn sub(self, rhs: Fixed) -> Fixed {
        Fixed(self.0 - rhs.0)
    }
}

impl std::ops::Mul for Fixed {
    type Output = Fixed;
    fn mul(self, rhs: Fixed) -> Fixed {
        Fixed((((self.0 as i64) * (rhs.0 as i64)) >> Self::SHIFT) as i32)
    }
}

#[cfg(not(feature = "cache_use_fixed"))]
pub type CachedNumber = f32;
#[cfg(feature = "cache_use_fixed")]
pub type CachedNumber = Fixed;

/// Converts a plain `f32` into the cache's native arithmetic type.
#[cfg(not(feature = "cache_use_fixed"))]
pub fn to_cached(f: f32) -> CachedNumber {
    f
}
#[cfg(feature = "cache_use_fixed")]
pub fn to_cached(f: f32) -> CachedNumber {
    Fixed::from_f32(f)
}

/// Converts a cache's native arithmetic type back to `f32`.
#[cfg(not(feature = "cache_use_fixed"))]
pub fn from_cached(v: CachedNumber) -> f32 {
    v
}
#[cfg(feature = "cache_use_fixed")]
pub fn from_cached(v: CachedNumber) -> f32 {
    v.to_f32()
}

/// Converts a cached-number sample directly to a [`Frac`].
pub fn to_frac(v: CachedNumber) -> Frac {
    Frac::from_f32(from_cached(v))
}

/// Converts a cached-number difference to an integer index, truncating
/// toward zero (the original's `cie_cached_product2int`, a plain C `(int)`
/// cast), optionally left-shifted by `fbits` to address sub-samples.
/// Truncation is deliberate, not an approximation: `base = a - step/2`
/// (see `sampler::init_cache`) already biases the grid so that truncating
/// a value exactly on a grid point lands on that point; rounding here
/// would double-round and bias every lookup upward by up to one index.
pub fn cached_to_int(v: CachedNumber, fbits: u32) -> i32 {
    (from_cached(v) * (1i32 << fbits) as f32) as i32
}
