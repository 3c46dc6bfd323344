// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

#![deny(unsafe_code)]

//! CIE-based color rendering core of a PostScript-style imaging pipeline.
//!
//! Converts tristimulus (and higher-dimensional) colorimetric input through
//! a configurable chain of decode functions, matrix transforms, chromatic
//! adaptation, and device encoding, producing device-space color
//! components. See `DESIGN.md` for how each module is grounded.

pub mod cache;
pub mod cached;
pub mod colorspace;
pub mod error;
pub mod eval;
pub mod interp;
pub mod joint;
pub mod matrix;
pub mod render;
pub mod sampler;

#[cfg(test)]
pub(crate) mod test_util;

/// Number of samples held by every cache (`N` in spec terms). Must be a
/// power of two; the render-table byte sampling in [`render`] additionally
/// requires `CACHE_SIZE >= 256`.
pub const CACHE_SIZE: usize = 256;

/// `log2(CACHE_SIZE)`, used when mapping a render-table byte index into
/// cache-index space.
pub const LOG2_CACHE_SIZE: u32 = CACHE_SIZE.ilog2();

/// Fractional bits used to address sub-samples between adjacent cache
/// entries when `cache_interpolate_intermediate` is enabled.
#[cfg(feature = "cache_interpolate_intermediate")]
pub const INTERPOLATE_BITS: u32 = 4;
#[cfg(not(feature = "cache_interpolate_intermediate"))]
pub const INTERPOLATE_BITS: u32 = 0;

pub use cache::{ScalarCache, ScalarValues, VectorCache};
pub use cached::{CachedNumber, Fixed, Frac};
pub use colorspace::{CieA, CieAbc, CieCommon, CieDef, CieDefg, DecodeFn, DefLut};
pub use error::{Error, Result};
pub use eval::{
    DeviceColorSink, ImagerState, concretize_cie_a, concretize_cie_abc, concretize_cie_def,
    concretize_cie_defg, remap_cie_abc,
};
pub use interp::{LinearMultilinearInterpolate, MultilinearInterpolate};
pub use joint::JointCache;
pub use matrix::{Matrix3, Range, Range3, Range4, Vector3};
pub use render::{CieRender, IdentityTransformPqr, RenderStatus, RenderTable, TransformPqr};
