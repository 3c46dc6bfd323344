// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! CIE color-space preparation: the A / ABC / DEF / DEFG variants, each
//! loading its decode caches and fusing its matrix into them exactly once.

use std::sync::{Arc, OnceLock};

use crate::CACHE_SIZE;
use crate::cache::{self, ScalarCache, VectorCache};
use crate::matrix::{Matrix3, Range, Range3, Range4, Vector3};

/// A one-dimensional decode function, as installed by the host.
pub type DecodeFn = Arc<dyn Fn(f32) -> f32 + Send + Sync>;

static IDENTITY_DECODE: OnceLock<DecodeFn> = OnceLock::new();

/// Builds the identity decode function, the default for every channel.
/// Always returns a clone of the same `Arc`, so [`is_identity_decode`] can
/// recognize it by pointer rather than by inspecting the closure.
pub fn identity_decode() -> DecodeFn {
    IDENTITY_DECODE
        .get_or_init(|| Arc::new(|x: f32| x) as DecodeFn)
        .clone()
}

/// Whether `f` is the default identity decode proc returned by
/// [`identity_decode`], the sole way a scalar cache's `is_identity` flag
/// (and therefore `skipABC`/`skipLMN`) can become true.
pub fn is_identity_decode(f: &DecodeFn) -> bool {
    Arc::ptr_eq(f, &identity_decode())
}

fn restrict(pc: &mut [f32], ranges: &[Range]) {
    for (v, r) in pc.iter_mut().zip(ranges.iter()) {
        *v = r.clamp(*v);
    }
}

/// Clamps a single CIEBasedA client color to `RangeA`.
pub fn restrict_color_a(pc: &mut [f32; 1], cie: &CieA) {
    restrict(pc, &[cie.range_a]);
}

/// Clamps a CIEBasedABC client color to `RangeABC`.
pub fn restrict_color_abc(pc: &mut [f32; 3], cie: &CieAbc) {
    restrict(pc, &cie.range_abc.ranges);
}

/// Clamps a CIEBasedDEF client color to `RangeDEF`.
pub fn restrict_color_def(pc: &mut [f32; 3], cie: &CieDef) {
    restrict(pc, &cie.range_def.ranges);
}

/// Clamps a CIEBasedDEFG client color to `RangeDEFG`.
pub fn restrict_color_defg(pc: &mut [f32; 4], cie: &CieDefg) {
    restrict(pc, &cie.range_defg.ranges);
}

/// Fields shared by every CIE color-space variant: the LMN decode stage,
/// shared by A/ABC/DEF/DEFG alike, plus the white/black points used when a
/// CRD is later installed.
#[derive(Clone)]
pub struct CieCommon {
    pub range_lmn: Range3,
    pub decode_lmn: [DecodeFn; 3],
    pub matrix_lmn: Matrix3,
    pub white_point: Vector3,
    pub black_point: Vector3,
    /// Stays a scalar float cache: the LMN decode is only ever fused with
    /// a matrix once a CRD is installed and a joint cache built (see
    /// `joint::joint_complete`), not here.
    pub caches_decode_lmn: [ScalarCache<CACHE_SIZE>; 3],
}

impl CieCommon {
    pub fn new(
        range_lmn: Range3,
        decode_lmn: [DecodeFn; 3],
        matrix_lmn: Matrix3,
        white_point: Vector3,
        black_point: Vector3,
    ) -> CieCommon {
        let caches_decode_lmn = std::array::from_fn(|j| {
            let f = decode_lmn[j].clone();
            let is_identity = is_identity_decode(&decode_lmn[j]);
            ScalarCache::load(range_lmn.ranges[j], is_identity, move |x| f(x))
        });
        CieCommon {
            range_lmn,
            decode_lmn,
            matrix_lmn,
            white_point,
            black_point,
            caches_decode_lmn,
        }
    }
}

/// CIEBasedA: a single decode function, mapped to LMN through a vector
/// rather than a matrix.
#[derive(Clone)]
pub struct CieA {
    pub common: CieCommon,
    pub range_a: Range,
    pub decode_a: DecodeFn,
    pub matrix_a: Vector3,
    pub caches_decode_a: VectorCache<CACHE_SIZE>,
}

impl CieA {
    pub fn new(
        range_a: Range,
        decode_a: DecodeFn,
        matrix_a: Vector3,
        common: CieCommon,
    ) -> CieA {
        let f = decode_a.clone();
        let is_identity = is_identity_decode(&decode_a);
        let scalar = ScalarCache::load(range_a, is_identity, move |x| f(x));
        let caches_decode_a = cache::mult(&scalar, matrix_a);
        CieA {
            common,
            range_a,
            decode_a,
            matrix_a,
            caches_decode_a,
        }
    }
}

/// CIEBasedABC: three decode functions fused into LMN through `MatrixABC`.
#[derive(Clone)]
pub struct CieAbc {
    pub common: CieCommon,
    pub range_abc: Range3,
    pub decode_abc: [DecodeFn; 3],
    pub matrix_abc: Matrix3,
    pub caches_decode_abc: [VectorCache<CACHE_SIZE>; 3],
    pub skip_abc: bool,
}

impl CieAbc {
    pub fn new(
        range_abc: Range3,
        decode_abc: [DecodeFn; 3],
        matrix_abc: Matrix3,
        common: CieCommon,
    ) -> CieAbc {
        let (caches_decode_abc, skip_abc) = Self::complete(&range_abc, &decode_abc, &matrix_abc);
        CieAbc {
            common,
            range_abc,
            decode_abc,
            matrix_abc,
            caches_decode_abc,
            skip_abc,
        }
    }

    fn complete(
        range_abc: &Range3,
        decode_abc: &[DecodeFn; 3],
        matrix_abc: &Matrix3,
    ) -> ([VectorCache<CACHE_SIZE>; 3], bool) {
        let scalars: [ScalarCache<CACHE_SIZE>; 3] = std::array::from_fn(|j| {
            let f = decode_abc[j].clone();
            let is_identity = is_identity_decode(&decode_abc[j]);
            ScalarCache::load(range_abc.ranges[j], is_identity, move |x| f(x))
        });
        cache::mult3(&scalars, matrix_abc)
    }
}

/// The HIJ(K)->ABC lookup table driving a DEF/DEFG color space's table
/// stage: row-major over its input axes, 3 output (ABC) bytes per grid
/// point.
#[derive(Clone)]
pub struct DefLut {
    pub table: Vec<u8>,
    pub dims: Vec<usize>,
}

impl DefLut {
    pub fn identity_cube(dims: Vec<usize>) -> DefLut {
        let corners: usize = dims.iter().product();
        let mut table = vec![0u8; corners * 3];
        let mut idx = vec![0usize; dims.len()];
        for corner in 0..corners {
            let mut rem = corner;
            for (axis, d) in dims.iter().enumerate().rev() {
                idx[axis] = rem % d;
                rem /= d;
            }
            for (axis, &d) in dims.iter().enumerate().take(3) {
                let v = if d > 1 { idx[axis] * 255 / (d - 1) } else { 0 };
                table[corner * 3 + axis] = v as u8;
            }
        }
        DefLut { table, dims }
    }
}

fn load_and_scale_def<const K: usize>(
    range_def: &[Range; K],
    decode_def: &[DecodeFn; K],
    range_hij: &[Range; K],
) -> [ScalarCache<CACHE_SIZE>; K] {
    std::array::from_fn(|j| {
        let f = decode_def[j].clone();
        let is_identity = is_identity_decode(&decode_def[j]);
        let mut cache = ScalarCache::load(range_def[j], is_identity, move |x| f(x));
        cache.scale_to_table_index(range_hij[j]);
        cache
    })
}

/// CIEBasedDEF: a three-channel table-driven front end over a CIEBasedABC.
#[derive(Clone)]
pub struct CieDef {
    pub abc: CieAbc,
    pub range_def: Range3,
    pub decode_def: [DecodeFn; 3],
    pub range_hij: Range3,
    pub caches_decode_def: [ScalarCache<CACHE_SIZE>; 3],
    pub table: DefLut,
}

impl CieDef {
    pub fn new(
        range_def: Range3,
        decode_def: [DecodeFn; 3],
        range_hij: Range3,
        table: DefLut,
        range_abc: Range3,
        decode_abc: [DecodeFn; 3],
        matrix_abc: Matrix3,
        common: CieCommon,
    ) -> CieDef {
        let caches_decode_def =
            load_and_scale_def(&range_def.ranges, &decode_def, &range_hij.ranges);
        CieDef {
            abc: CieAbc::new(range_abc, decode_abc, matrix_abc, common),
            range_def,
            decode_def,
            range_hij,
            caches_decode_def,
            table,
        }
    }
}

/// CIEBasedDEFG: a four-channel table-driven front end over a CIEBasedABC.
#[derive(Clone)]
pub struct CieDefg {
    pub abc: CieAbc,
    pub range_defg: Range4,
    pub decode_defg: [DecodeFn; 4],
    pub range_hijk: Range4,
    pub caches_decode_defg: [ScalarCache<CACHE_SIZE>; 4],
    pub table: DefLut,
}

impl CieDefg {
    pub fn new(
        range_defg: Range4,
        decode_defg: [DecodeFn; 4],
        range_hijk: Range4,
        table: DefLut,
        range_abc: Range3,
        decode_abc: [DecodeFn; 3],
        matrix_abc: Matrix3,
        common: CieCommon,
    ) -> CieDefg {
        let caches_decode_defg =
            load_and_scale_def(&range_defg.ranges, &decode_defg, &range_hijk.ranges);
        CieDefg {
            abc: CieAbc::new(range_abc, decode_abc, matrix_abc, common),
            range_defg,
            decode_defg,
            range_hijk,
            caches_decode_defg,
            table,
        }
    }
}
