// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! Scalar and vector cache kernels: fixed-size samplings of one-dimensional
//! functions (scalar caches) and the 3-vectors obtained by multiplying a
//! scalar cache by a matrix column (vector caches).

use crate::CACHE_SIZE;
use crate::cached::{CachedNumber, Frac, from_cached, to_cached};
use crate::matrix::{Matrix3, Range, Vector3};
use crate::sampler::CacheParams;

/// A scalar cache's values, as a discriminated union: decode/transform
/// caches stay in float form; the final ABC-encode cache is converted to
/// either `Frac` (no render table) or `Int` (render table, pre-multiplied
/// indices) once the CRD completes.
#[derive(Clone, Debug)]
pub enum ScalarValues<const N: usize> {
    Float([f32; N]),
    Frac([Frac; N]),
    Int([i32; N]),
}

impl<const N: usize> ScalarValues<N> {
    fn as_float(&self) -> &[f32; N] {
        match self {
            ScalarValues::Float(v) => v,
            _ => panic!("expected a float-valued scalar cache"),
        }
    }

    fn as_float_mut(&mut self) -> &mut [f32; N] {
        match self {
            ScalarValues::Float(v) => v,
            _ => panic!("expected a float-valued scalar cache"),
        }
    }
}

/// `{ params, values[N] }`: a fixed-size sampling of a one-dimensional
/// function over a domain, plus the parameters used to index it.
#[derive(Clone, Debug)]
pub struct ScalarCache<const N: usize> {
    pub params: CacheParams,
    pub values: ScalarValues<N>,
}

impl<const N: usize> ScalarCache<N> {
    /// Samples `f` over `domain` into a fresh float-valued cache. The
    /// caller supplies `is_identity`: whether `f` is the default identity
    /// decode proc, the only way `params.is_identity` (and downstream
    /// `skip*` flags) can ever become true, matching how `gscie.c`'s
    /// cache inherits its identity flag from the installed decode proc
    /// rather than inferring it from sampled output.
    pub fn load(domain: Range, is_identity: bool, f: impl Fn(f32) -> f32) -> ScalarCache<N> {
        let (mut params, loop_params) = crate::sampler::init_cache(domain, N);
        params.is_identity = is_identity;
        let mut values = [0.0f32; N];
        let mut x = loop_params.init;
        for slot in values.iter_mut() {
            *slot = f(x);
            x += loop_params.step;
        }
        ScalarCache {
            params,
            values: ScalarValues::Float(values),
        }
    }

    pub fn float_values(&self) -> &[f32; N] {
        self.values.as_float()
    }

    /// Clamps every stored sample to `range`, in place. Idempotent:
    /// applying twice leaves the cache unchanged.
    pub fn restrict(&mut self, range: Range) {
        for v in self.values.as_float_mut().iter_mut() {
            *v = range.clamp(*v);
        }
    }

    /// Rescales every sample by `255 / (range.rmax - range.rmin)`, clamped
    /// to `[0, 255]`, re-expressing the cache in table-index units. Used
    /// when preparing DEF/DEFG decode caches against their `RangeHIJ[K]`.
    pub fn scale_to_table_index(&mut self, range: Range) {
        let scale = 255.0 / (range.rmax - range.rmin);
        for v in self.values.as_float_mut().iter_mut() {
            *v = if *v <= range.rmin {
                0.0
            } else if *v >= range.rmax {
                255.0
            } else {
                (*v - range.rmin) * scale
            };
        }
        self.params.is_identity = false;
    }

    /// Converts a float-valued cache to fracs, in place. Always marks the
    /// result as non-identity: clamping to `[0, 1]` and 16-bit
    /// quantization both break the exactness an identity flag promises.
    pub fn to_fracs(&mut self) {
        let floats = *self.values.as_float();
        let mut fracs = [Frac::ZERO; N];
        for (dst, src) in fracs.iter_mut().zip(floats.iter()) {
            *dst = Frac::from_f32(*src);
        }
        self.values = ScalarValues::Frac(fracs);
        self.params.is_identity = false;
    }
}

/// Cache sampling parameters in cached-number form, used when indexing.
#[derive(Copy, Clone, Debug)]
pub struct CachedCacheParams {
    pub base: CachedNumber,
    pub factor: CachedNumber,
    pub limit: CachedNumber,
    pub is_identity: bool,
}

#[derive(Copy, Clone, Debug, Default)]
pub struct CachedVector3 {
    pub u: CachedNumber,
    pub v: CachedNumber,
    pub w: CachedNumber,
}

impl CachedVector3 {
    pub fn axis(&self, i: usize) -> CachedNumber {
        match i {
            0 => self.u,
            1 => self.v,
            2 => self.w,
            _ => panic!("cached vector3 axis out of range: {i}"),
        }
    }

    fn add(self, rhs: CachedVector3) -> CachedVector3 {
        CachedVector3 {
            u: to_cached(from_cached(self.u) + from_cached(rhs.u)),
            v: to_cached(from_cached(self.v) + from_cached(rhs.v)),
            w: to_cached(from_cached(self.w) + from_cached(rhs.w)),
        }
    }
}

/// `{ params, values[N] }` where each value is a 3-vector of cached
/// numbers, produced by multiplying a scalar cache by a matrix column.
#[derive(Clone, Debug)]
pub struct VectorCache<const N: usize> {
    pub params: CachedCacheParams,
    pub values: [CachedVector3; N],
}

/// Computes a cache index as `trunc((v - base) * factor)`, clamped to
/// `[0, (N-1) << fbits]` and optionally shifted to address sub-samples.
/// Truncation, not rounding: `base` is already offset by half a step (see
/// `sampler::init_cache`) so that truncating performs the rounding; a
/// second `.round()` here would double-round and bias every lookup.
pub fn lookup_index<const N: usize>(v: CachedNumber, params: &CachedCacheParams, fbits: u32) -> i32 {
    let vf = from_cached(v);
    let base = from_cached(params.base);
    if vf <= base {
        return 0;
    }
    let limit = from_cached(params.limit);
    if vf >= limit {
        return ((N - 1) as i32) << fbits;
    }
    let factor = from_cached(params.factor);
    ((vf - base) * factor * (1i32 << fbits) as f32) as i32
}

impl<const N: usize> VectorCache<N> {
    pub fn lookup_value(&self, v: CachedNumber) -> CachedVector3 {
        let idx = lookup_index::<N>(v, &self.params, 0) as usize;
        self.values[idx]
    }
}

/// Multiplies a scalar cache by a 3-vector (a matrix column), producing a
/// vector cache. Iterates top-down: in the original C this let the vector
/// cache alias the scalar cache's storage without clobbering unread
/// entries; here it simply keeps the two representations in lockstep.
pub fn mult<const N: usize>(scalar: &ScalarCache<N>, vec3: Vector3) -> VectorCache<N> {
    let floats = scalar.values.as_float();
    let mut values = [CachedVector3::default(); N];
    for i in (0..N).rev() {
        let f = floats[i];
        values[i] = CachedVector3 {
            u: to_cached(f * vec3.u),
            v: to_cached(f * vec3.v),
            w: to_cached(f * vec3.w),
        };
    }
    let base = scalar.params.base;
    let factor = scalar.params.factor;
    let limit = if factor == 0.0 {
        f32::INFINITY
    } else {
        (N - 1) as f32 / factor + base
    };
    VectorCache {
        params: CachedCacheParams {
            base: to_cached(base),
            factor: to_cached(factor),
            limit: to_cached(limit),
            is_identity: scalar.params.is_identity,
        },
        values,
    }
}

/// Multiplies each of three scalar caches by the corresponding column of
/// `matrix`, returning the resulting vector caches plus whether the
/// composed transform is provably the identity on its sampled domain.
pub fn mult3<const N: usize>(
    caches: &[ScalarCache<N>; 3],
    matrix: &Matrix3,
) -> ([VectorCache<N>; 3], bool) {
    let out = [
        mult(&caches[0], matrix.cu),
        mult(&caches[1], matrix.cv),
        mult(&caches[2], matrix.cw),
    ];
    let is_identity =
        matrix.is_identity && out[0].params.is_identity && out[1].params.is_identity && out[2].params.is_identity;
    (out, is_identity)
}

/// Three independent lookups into `cache[0..3]` using `v`'s three axes,
/// summed componentwise. An interpolating variant (gated by
/// `cache_interpolate_intermediate`) blends each sub-lookup with its
/// neighbor using the fractional bits below `INTERPOLATE_BITS`; it was
/// measured as a net performance loss upstream and stays off by default.
pub fn lookup_mult3<const N: usize>(v: CachedVector3, cache: &[VectorCache<N>; 3]) -> CachedVector3 {
    #[cfg(not(feature = "cache_interpolate_intermediate"))]
    {
        let pu = cache[0].lookup_value(v.u);
        let pv = cache[1].lookup_value(v.v);
        let pw = cache[2].lookup_value(v.w);
        pu.add(pv).add(pw)
    }
    #[cfg(feature = "cache_interpolate_intermediate")]
    {
        lookup_mult3_interpolated(v, cache)
    }
}

#[cfg(feature = "cache_interpolate_intermediate")]
fn lookup_mult3_interpolated<const N: usize>(v: CachedVector3, cache: &[VectorCache<N>; 3]) -> CachedVector3 {
    fn axis<const N: usize>(vin: CachedNumber, c: &VectorCache<N>) -> CachedVector3 {
        let fbits = crate::INTERPOLATE_BITS;
        let idx = lookup_index::<N>(vin, &c.params, fbits);
        let base_i = (idx >> fbits) as usize;
        let hi_i = if idx >= ((N - 1) as i32) << fbits {
            base_i
        } else {
            base_i + 1
        };
        let frac = (idx - ((base_i as i32) << fbits)) as f32 / (1i32 << fbits) as f32;
        let lo = c.values[base_i];
        let hi = c.values[hi_i];
        CachedVector3 {
            u: to_cached(from_cached(lo.u) + (from_cached(hi.u) - from_cached(lo.u)) * frac),
            v: to_cached(from_cached(lo.v) + (from_cached(hi.v) - from_cached(lo.v)) * frac),
            w: to_cached(from_cached(lo.w) + (from_cached(hi.w) - from_cached(lo.w)) * frac),
        }
    }
    let pu = axis(v.u, &cache[0]);
    let pv = axis(v.v, &cache[1]);
    let pw = axis(v.w, &cache[2]);
    pu.add(pv).add(pw)
}
