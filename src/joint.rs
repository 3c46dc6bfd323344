// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! The joint cache: fuses a color space's LMN decode with a CRD's
//! chromatic-adaptation transform, so per-pixel evaluation never has to
//! consult the color space and CRD separately.

use crate::CACHE_SIZE;
use crate::cache::{self, ScalarCache, ScalarValues, VectorCache};
use crate::colorspace::CieCommon;
use crate::error::Result;
use crate::matrix::{Matrix3, Vector3, matmul3, mult3_vec};
use crate::render::CieRender;

/// Source and destination white/black points in both XYZ and PQR space,
/// used by [`crate::render::TransformPqr`] implementations that need the
/// adaptation endpoints.
#[derive(Copy, Clone, Debug)]
pub struct PointsSd {
    pub src_white_xyz: Vector3,
    pub src_black_xyz: Vector3,
    pub src_white_pqr: Vector3,
    pub src_black_pqr: Vector3,
    pub dst_white_pqr: Vector3,
    pub dst_black_pqr: Vector3,
}

/// The product of `joint_init`: everything needed to finish the joint
/// cache, but not yet restricted or fused. Consumed by `joint_complete`,
/// which makes the non-idempotence of completion a property the type
/// system enforces rather than a runtime guard.
pub struct JointCacheInit {
    points_sd: PointsSd,
    matrix_lmn_pqr: Matrix3,
    transform_pqr_scalar: [ScalarCache<CACHE_SIZE>; 3],
}

/// The fused per-imager-state cache: LMN decode and PQR adaptation, ready
/// for per-pixel `lookup_mult3` calls.
pub struct JointCache {
    pub points_sd: PointsSd,
    pub matrix_lmn_pqr: Matrix3,
    pub transform_pqr: [VectorCache<CACHE_SIZE>; 3],
    pub decode_lmn: [VectorCache<CACHE_SIZE>; 3],
    pub skip_lmn: bool,
    pub skip_pqr: bool,
}

/// Idempotent: a pure function of `common` and `crd`, safe to call again
/// (e.g. because the color space changed) without side effects on either.
pub fn joint_init(common: &CieCommon, crd: &CieRender) -> Result<JointCacheInit> {
    let points_sd = PointsSd {
        src_white_xyz: common.white_point,
        src_black_xyz: common.black_point,
        src_white_pqr: mult3_vec(common.white_point, &crd.matrix_pqr),
        src_black_pqr: mult3_vec(common.black_point, &crd.matrix_pqr),
        dst_white_pqr: crd.wdpqr,
        dst_black_pqr: crd.bdpqr,
    };
    let matrix_lmn_pqr = matmul3(&crd.matrix_pqr, &crd.matrix_lmn);

    let mut transform_pqr_scalar: [Option<ScalarCache<CACHE_SIZE>>; 3] = [None, None, None];
    for j in 0..3 {
        let (mut params, loop_params) = crate::sampler::init_cache(crd.range_pqr.ranges[j], CACHE_SIZE);
        params.is_identity = crd.transform_pqr.is_identity();
        let mut values = [0.0f32; CACHE_SIZE];
        let mut x = loop_params.init;
        for slot in values.iter_mut() {
            *slot = crd.transform_pqr.transform(j, x, &points_sd, crd)?;
            x += loop_params.step;
        }
        transform_pqr_scalar[j] = Some(ScalarCache {
            params,
            values: ScalarValues::Float(values),
        });
    }
    let transform_pqr_scalar = transform_pqr_scalar.map(|c| c.expect("every axis sampled above"));

    tracing::trace!(?matrix_lmn_pqr, "joint cache initialized");

    Ok(JointCacheInit {
        points_sd,
        matrix_lmn_pqr,
        transform_pqr_scalar,
    })
}

/// NOT idempotent: consumes `init` by value, so a second completion of
/// the same sampling pass cannot happen by construction.
pub fn joint_complete(init: JointCacheInit, common: &CieCommon, crd: &CieRender) -> JointCache {
    let JointCacheInit {
        points_sd,
        matrix_lmn_pqr,
        mut transform_pqr_scalar,
    } = init;

    for (j, cache) in transform_pqr_scalar.iter_mut().enumerate() {
        cache.restrict(crd.range_pqr.ranges[j]);
    }

    let decode_lmn: [VectorCache<CACHE_SIZE>; 3] =
        std::array::from_fn(|j| cache::mult(&common.caches_decode_lmn[j], matrix_lmn_pqr.column(j)));
    let skip_lmn = matrix_lmn_pqr.is_identity && decode_lmn.iter().all(|c| c.params.is_identity);

    let (transform_pqr, skip_pqr) = cache::mult3(&transform_pqr_scalar, &crd.matrix_pqr_inverse_lmn);

    tracing::debug!(skip_lmn, skip_pqr, "joint cache completed");

    JointCache {
        points_sd,
        matrix_lmn_pqr,
        transform_pqr,
        decode_lmn,
        skip_lmn,
        skip_pqr,
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::colorspace::identity_decode;
    use crate::matrix::Range3;
    use crate::render::IdentityTransformPqr;
    use std::sync::Arc;
    use test_log::test;

    fn identity_common() -> CieCommon {
        CieCommon::new(
            Range3::DEFAULT,
            std::array::from_fn(|_| identity_decode()),
            Matrix3::IDENTITY,
            Vector3::new(1.0, 1.0, 1.0),
            Vector3::ZERO,
        )
    }

    fn identity_crd() -> CieRender {
        let mut crd = CieRender::new(
            Vector3::new(1.0, 1.0, 1.0),
            Vector3::ZERO,
            Matrix3::IDENTITY,
            Matrix3::IDENTITY,
            Matrix3::IDENTITY,
            Range3::DEFAULT,
            Range3::DEFAULT,
            Range3::DEFAULT,
            std::array::from_fn(|_| identity_decode()),
            std::array::from_fn(|_| identity_decode()),
            Arc::new(IdentityTransformPqr),
            None,
        );
        crd.init();
        crd
    }

    #[test]
    fn identity_inputs_yield_skip_flags_set() {
        let common = identity_common();
        let crd = identity_crd();
        let init = joint_init(&common, &crd).unwrap();
        let joint = joint_complete(init, &common, &crd);
        assert!(joint.skip_lmn);
        assert!(joint.skip_pqr);
    }

    #[test]
    fn completion_consumes_init_so_it_cannot_run_twice() {
        let common = identity_common();
        let crd = identity_crd();
        let init = joint_init(&common, &crd).unwrap();
        let _joint = joint_complete(init, &common, &crd);
        // `init` has been moved; a second `joint_complete(init, ...)` call
        // would be a compile error, not a runtime double-fold.
    }
}
