// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! The domain sampler: computes cache sampling parameters for a given
//! one-dimensional domain, biasing the grid so that a domain value of zero
//! falls exactly on a grid point whenever the domain spans zero.

use crate::matrix::Range;

/// Cache sampling parameters in float form, as used when loading a cache.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct CacheParams {
    pub base: f32,
    pub factor: f32,
    pub limit: f32,
    pub is_identity: bool,
}

/// The `(init, step, limit)` triple a caller loops over to sample a
/// function at each grid point.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ForLoopParams {
    pub init: f32,
    pub step: f32,
    pub limit: f32,
}

/// Computes cache parameters for sampling a function over `domain` at
/// `cache_size` points.
///
/// We need to map the values in `[domain.rmin, domain.rmax]`. However, if
/// neither endpoint is zero and the function is non-linear, this can lead
/// to anomalies at zero, which is the default value for CIE colors. The
/// "correct" fix is to run the mapping function on demand, but instead we
/// adjust the range so that zero maps precisely to a cache slot: widen
/// whichever of `a`/`b` stretches the range the least.
///
/// Idempotent: calling this twice on the same domain produces the same
/// result both times.
pub fn init_cache(domain: Range, cache_size: usize) -> (CacheParams, ForLoopParams) {
    let n = (cache_size - 1) as f64;
    let mut a = domain.rmin as f64;
    let mut b = domain.rmax as f64;
    let mut r = b - a;

    if a < 0.0 && b >= 0.0 {
        let x = -n * a / r; // > 0
        let kb = x.floor(); // >= 0
        let ka = x.ceil() - n; // <= 0

        if kb == 0.0 || (ka != 0.0 && -b / ka < -a / kb) {
            r = -n * b / ka;
            a = b - r;
        } else {
            r = -n * a / kb;
            b = a + r;
        }
    }

    let step = if n == 0.0 { 0.0 } else { r / n };
    let factor = if step == 0.0 { 0.0 } else { (n / r) as f32 };
    let base = (a - step / 2.0) as f32;
    let limit = (b + step / 2.0) as f32;

    tracing::trace!(base, factor, limit, "cache params computed");

    (
        CacheParams {
            base,
            factor,
            limit,
            is_identity: false,
        },
        ForLoopParams {
            init: a as f32,
            step: step as f32,
            limit,
        },
    )
}
