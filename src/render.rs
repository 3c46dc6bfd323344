// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! The color-rendering dictionary (CRD): destination-side parameters
//! mapping the LMN/ABC colorimetric chain onto device values, prepared
//! through a four-stage status machine.

use std::sync::Arc;

use crate::CACHE_SIZE;
use crate::cache::{self, ScalarCache, ScalarValues, VectorCache};
use crate::cached::{CachedNumber, Frac, to_cached};
use crate::colorspace::DecodeFn;
use crate::error::Result;
use crate::joint::PointsSd;
use crate::Matrix3;
use crate::matrix::{Range, Range3, Vector3, invert3, matmul3, matrix_init, mult3_vec, transform_range3};

/// The CRD's preparation status. Ordered: no field documented for a later
/// stage is valid while `status` is below that stage.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum RenderStatus {
    Fresh,
    Inited,
    Sampled,
    Completed,
}

/// The user-supplied chromatic-adaptation transform sampled while building
/// a joint cache. Permitted to fail; a failure aborts joint-cache
/// construction with [`Error::TransformPqrFailure`].
pub trait TransformPqr: Send + Sync {
    fn transform(&self, axis: usize, v: f32, points_sd: &PointsSd, crd: &CieRender) -> Result<f32>;

    /// Whether this transform is provably the identity on every input,
    /// independent of domain. Seeds the sampled `TransformPQR` scalar
    /// caches' `is_identity` flag the same way a decode proc's identity
    /// seeds `skipABC`/`skipLMN` — the only way `skipPQR` can become true.
    fn is_identity(&self) -> bool {
        false
    }
}

/// The identity adaptation transform: `TransformPQR(j, v) = v`. The
/// default when a CRD declares no chromatic adaptation.
pub struct IdentityTransformPqr;

impl TransformPqr for IdentityTransformPqr {
    fn transform(&self, _axis: usize, v: f32, _points_sd: &PointsSd, _crd: &CieRender) -> Result<f32> {
        Ok(v)
    }

    fn is_identity(&self) -> bool {
        true
    }
}

/// An optional multi-dimensional render table: a flattened byte LUT
/// indexed by `m` pre-multiplied ABC offsets, plus the per-channel
/// decode-like functions used to build `caches.RenderTableT`.
#[derive(Clone)]
pub struct RenderTable {
    /// Row-major bytes, `dims[0] x dims[1] x dims[2] x m`.
    pub table: Vec<u8>,
    pub m: usize,
    pub dims: [usize; 3],
    pub t_fns: Vec<DecodeFn>,
}

impl RenderTable {
    pub fn identity_t_fns(m: usize) -> Vec<DecodeFn> {
        (0..m)
            .map(|_| Arc::new(|byte_i: f32| byte_i / 255.0) as DecodeFn)
            .collect()
    }
}

/// Samples each `T[j]` over the byte domain `[0, 255]` into a frac cache,
/// also reporting whether every `T[j]` is the identity byte-to-frac map
/// (`byte_to_frac`), which the evaluator uses to skip the per-channel
/// cache lookup on the render-table hot path.
fn load_render_table_t(t_fns: &[DecodeFn]) -> (Vec<ScalarCache<CACHE_SIZE>>, bool) {
    let mut all_identity = true;
    let caches = t_fns
        .iter()
        .map(|f| {
            let (params, _) = crate::sampler::init_cache(Range::ZERO_ONE, CACHE_SIZE);
            let mut fracs = [Frac::ZERO; CACHE_SIZE];
            for (i, slot) in fracs.iter_mut().enumerate() {
                *slot = Frac::from_f32(f(i as f32));
                if *slot != Frac::from_byte(i as u8) {
                    all_identity = false;
                }
            }
            ScalarCache {
                params,
                values: ScalarValues::Frac(fracs),
            }
        })
        .collect();
    (caches, all_identity)
}

/// The color-rendering dictionary. Host-supplied fields are set at
/// construction; the rest are populated as `status` advances.
pub struct CieRender {
    pub status: RenderStatus,
    pub white_point: Vector3,
    pub black_point: Vector3,
    pub matrix_pqr: Matrix3,
    pub matrix_lmn: Matrix3,
    pub matrix_abc: Matrix3,
    pub range_pqr: Range3,
    pub range_lmn: Range3,
    pub range_abc: Range3,
    pub encode_lmn_fns: [DecodeFn; 3],
    pub encode_abc_fns: [DecodeFn; 3],
    pub transform_pqr: Arc<dyn TransformPqr>,
    pub render_table: Option<RenderTable>,

    pub matrix_pqr_inverse_lmn: Matrix3,
    pub domain_lmn: Range3,
    pub domain_abc: Range3,
    pub wdpqr: Vector3,
    pub bdpqr: Vector3,

    caches_encode_lmn_scalar: Option<[ScalarCache<CACHE_SIZE>; 3]>,
    pub caches_encode_abc: Option<[ScalarCache<CACHE_SIZE>; 3]>,
    pub caches_render_table_t: Option<Vec<ScalarCache<CACHE_SIZE>>>,
    pub render_table_t_is_identity: bool,

    pub matrix_abc_encode: Matrix3,
    pub encode_abc_base: [CachedNumber; 3],
    pub caches_encode_lmn: Option<[VectorCache<CACHE_SIZE>; 3]>,
}

impl CieRender {
    pub fn new(
        white_point: Vector3,
        black_point: Vector3,
        matrix_pqr: Matrix3,
        matrix_lmn: Matrix3,
        matrix_abc: Matrix3,
        range_pqr: Range3,
        range_lmn: Range3,
        range_abc: Range3,
        encode_lmn_fns: [DecodeFn; 3],
        encode_abc_fns: [DecodeFn; 3],
        transform_pqr: Arc<dyn TransformPqr>,
        render_table: Option<RenderTable>,
    ) -> CieRender {
        CieRender {
            status: RenderStatus::Fresh,
            white_point,
            black_point,
            matrix_pqr,
            matrix_lmn,
            matrix_abc,
            range_pqr,
            range_lmn,
            range_abc,
            encode_lmn_fns,
            encode_abc_fns,
            transform_pqr,
            render_table,
            matrix_pqr_inverse_lmn: Matrix3::IDENTITY,
            domain_lmn: Range3::DEFAULT,
            domain_abc: Range3::DEFAULT,
            wdpqr: Vector3::ZERO,
            bdpqr: Vector3::ZERO,
            caches_encode_lmn_scalar: None,
            caches_encode_abc: None,
            caches_render_table_t: None,
            render_table_t_is_identity: true,
            matrix_abc_encode: Matrix3::IDENTITY,
            encode_abc_base: [CachedNumber::default(); 3],
            caches_encode_lmn: None,
        }
    }

    /// FRESH -> INITED. Idempotent: recomputes the same derived matrices
    /// and domains every time from the CRD's host-supplied fields.
    pub fn init(&mut self) {
        matrix_init(&mut self.matrix_lmn);
        matrix_init(&mut self.matrix_abc);
        matrix_init(&mut self.matrix_pqr);

        let pqr_inverse = invert3(&self.matrix_pqr);
        // First PQR^-1, then LMN: matmul3(LMN, PQR^-1) applies PQR^-1 first.
        self.matrix_pqr_inverse_lmn = matmul3(&self.matrix_lmn, &pqr_inverse);
        self.domain_lmn = transform_range3(&self.range_pqr, &self.matrix_pqr_inverse_lmn);
        self.domain_abc = transform_range3(&self.range_lmn, &self.matrix_abc);
        self.wdpqr = mult3_vec(self.white_point, &self.matrix_pqr);
        self.bdpqr = mult3_vec(self.black_point, &self.matrix_pqr);

        if self.status < RenderStatus::Inited {
            self.status = RenderStatus::Inited;
        }
    }

    /// INITED -> SAMPLED. Idempotent for the same reason as `init`.
    pub fn sample(&mut self) {
        self.caches_encode_lmn_scalar = Some(std::array::from_fn(|j| {
            let f = self.encode_lmn_fns[j].clone();
            let is_identity = crate::colorspace::is_identity_decode(&self.encode_lmn_fns[j]);
            ScalarCache::load(self.domain_lmn.ranges[j], is_identity, move |x| f(x))
        }));
        self.caches_encode_abc = Some(std::array::from_fn(|j| {
            let f = self.encode_abc_fns[j].clone();
            let is_identity = crate::colorspace::is_identity_decode(&self.encode_abc_fns[j]);
            ScalarCache::load(self.domain_abc.ranges[j], is_identity, move |x| f(x))
        }));

        if let Some(rt) = &self.render_table {
            let (t_caches, is_identity) = load_render_table_t(&rt.t_fns);
            self.caches_render_table_t = Some(t_caches);
            self.render_table_t_is_identity = is_identity;
        }

        if self.status < RenderStatus::Sampled {
            self.status = RenderStatus::Sampled;
        }
        tracing::debug!(status = ?self.status, "CRD sampled");
    }

    /// SAMPLED -> COMPLETED. NOT idempotent: gated by the status guard, a
    /// second call is a no-op rather than double-folding the matrices.
    pub fn complete(&mut self) {
        if self.status >= RenderStatus::Completed {
            return;
        }
        let mut encode_lmn = self
            .caches_encode_lmn_scalar
            .take()
            .expect("sample must run before complete");
        let mut encode_abc = self
            .caches_encode_abc
            .take()
            .expect("sample must run before complete");

        for c in 0..3 {
            encode_lmn[c].restrict(self.range_lmn.ranges[c]);
            encode_abc[c].restrict(self.range_abc.ranges[c]);
        }

        let mut matrix_abc_encode = self.matrix_abc;
        let mut encode_abc_base = [CachedNumber::default(); 3];

        match &self.render_table {
            None => {
                for c in &mut encode_abc {
                    c.restrict(Range::ZERO_ONE);
                    c.to_fracs();
                }
            }
            Some(rt) => {
                for (c, cache) in encode_abc.iter_mut().enumerate() {
                    let range = self.range_abc.ranges[c];
                    let dim = rt.dims[c];
                    let scale = (dim - 1) as f32 / (range.rmax - range.rmin);
                    let rescaled: Vec<f32> = cache
                        .float_values()
                        .iter()
                        .map(|v| ((*v - range.rmin) * scale).clamp(0.0, (dim - 1) as f32))
                        .collect();
                    let mut ints = [0i32; CACHE_SIZE];
                    #[cfg(feature = "render_table_interpolate")]
                    {
                        for (i, v) in rescaled.iter().enumerate() {
                            ints[i] = (v.round() as i32) << crate::INTERPOLATE_BITS;
                        }
                    }
                    #[cfg(not(feature = "render_table_interpolate"))]
                    {
                        // Row-major, channels innermost: axis 2 steps by `m`,
                        // axis 1 by `m * dims[2]`, axis 0 by `m * dims[1] * dims[2]`.
                        let strides = [rt.m * rt.dims[1] * rt.dims[2], rt.m * rt.dims[2], rt.m];
                        let stride = strides[c] as i32;
                        for (i, v) in rescaled.iter().enumerate() {
                            ints[i] = (v.round() as i32) * stride;
                        }
                    }
                    cache.values = ScalarValues::Int(ints);
                    cache.params.is_identity = false;
                }
            }
        }

        for (c, cache) in encode_abc.iter().enumerate() {
            let factor = cache.params.factor;
            let base = cache.params.base;
            let col = match c {
                0 => &mut matrix_abc_encode.cu,
                1 => &mut matrix_abc_encode.cv,
                _ => &mut matrix_abc_encode.cw,
            };
            col.u *= factor;
            col.v *= factor;
            col.w *= factor;
            encode_abc_base[c] = to_cached(base * factor);
        }
        matrix_init(&mut matrix_abc_encode);

        let (caches_encode_lmn, _is_identity) = cache::mult3(&encode_lmn, &matrix_abc_encode);

        self.matrix_abc_encode = matrix_abc_encode;
        self.encode_abc_base = encode_abc_base;
        self.caches_encode_lmn = Some(caches_encode_lmn);
        self.caches_encode_abc = Some(encode_abc);
        self.status = RenderStatus::Completed;
        tracing::debug!("CRD completed");
    }
}
