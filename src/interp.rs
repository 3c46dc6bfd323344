// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! The multi-dimensional linear interpolator used by the DEF/DEFG front
//! end to read a color-space's HIJ(K)->ABC lookup table. Treated as a
//! host collaborator (`color_interpolate_linear` in the original): the
//! core only depends on the [`MultilinearInterpolate`] contract, not a
//! specific implementation.

use crate::cached::Frac;

/// Number of fractional bits packed into each fixed-point grid index
/// passed to [`MultilinearInterpolate::interpolate`].
pub const TABLE_INDEX_FRAC_BITS: u32 = 8;

/// Interpolates `channels` output values out of a row-major lookup table
/// with `dims.len()` input axes (channels innermost), given one
/// fixed-point index per axis (`indices[axis] = (grid_i << frac_bits) |
/// frac`).
pub trait MultilinearInterpolate: Send + Sync {
    fn interpolate(
        &self,
        table: &[u8],
        dims: &[usize],
        channels: usize,
        indices: &[i32],
        frac_bits: u32,
        out_fracs: &mut [Frac],
    );
}

/// Reference multilinear (2^k-corner) interpolator: every corner of the
/// enclosing grid cell contributes a weight that is the product, over
/// axes, of that axis's fractional distance (or its complement).
pub struct LinearMultilinearInterpolate;

impl MultilinearInterpolate for LinearMultilinearInterpolate {
    fn interpolate(
        &self,
        table: &[u8],
        dims: &[usize],
        channels: usize,
        indices: &[i32],
        frac_bits: u32,
        out_fracs: &mut [Frac],
    ) {
        let k = dims.len();
        debug_assert_eq!(indices.len(), k);
        debug_assert_eq!(out_fracs.len(), channels);

        let mut strides = vec![channels; k];
        for axis in (0..k.saturating_sub(1)).rev() {
            strides[axis] = strides[axis + 1] * dims[axis + 1];
        }

        let scale = (1i32 << frac_bits) as f32;
        let mut floor_idx = vec![0usize; k];
        let mut frac = vec![0f32; k];
        for axis in 0..k {
            let raw = indices[axis];
            let grid = (raw >> frac_bits).max(0) as usize;
            let grid = grid.min(dims[axis].saturating_sub(1));
            floor_idx[axis] = grid;
            frac[axis] = (raw & ((1 << frac_bits) - 1)) as f32 / scale;
        }

        let mut acc = vec![0f32; channels];
        for corner in 0..(1usize << k) {
            let mut weight = 1f32;
            let mut offset = 0usize;
            for axis in 0..k {
                let bit = (corner >> axis) & 1;
                let idx = (floor_idx[axis] + bit).min(dims[axis].saturating_sub(1));
                offset += idx * strides[axis];
                weight *= if bit == 1 { frac[axis] } else { 1.0 - frac[axis] };
            }
            if weight == 0.0 {
                continue;
            }
            for c in 0..channels {
                acc[c] += weight * table[offset + c] as f32;
            }
        }

        for (dst, v) in out_fracs.iter_mut().zip(acc.iter()) {
            *dst = Frac::from_f32(*v / 255.0);
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use test_log::test;

    #[test]
    fn corners_reproduce_exact_table_values() {
        let dims = [2usize, 2, 2];
        let table: Vec<u8> = vec![
            0, 0, 0, // (0,0,0)
            0, 0, 255, // (0,0,1)
            0, 255, 0, // (0,1,0)
            0, 255, 255, // (0,1,1)
            255, 0, 0, // (1,0,0)
            255, 0, 255, // (1,0,1)
            255, 255, 0, // (1,1,0)
            255, 255, 255, // (1,1,1)
        ];
        let interp = LinearMultilinearInterpolate;
        let mut out = [Frac::ZERO; 3];
        interp.interpolate(&table, &dims, 3, &[0, 0, 0], TABLE_INDEX_FRAC_BITS, &mut out);
        assert_eq!(out, [Frac::ZERO; 3]);

        let full = 1i32 << TABLE_INDEX_FRAC_BITS;
        let mut out = [Frac::ZERO; 3];
        interp.interpolate(&table, &dims, 3, &[full, full, full], TABLE_INDEX_FRAC_BITS, &mut out);
        assert_eq!(out, [Frac::ONE; 3]);
    }

    #[test]
    fn midpoint_averages_opposite_corners() {
        let dims = [2usize];
        let table: Vec<u8> = vec![0, 255];
        let interp = LinearMultilinearInterpolate;
        let half = 1i32 << (TABLE_INDEX_FRAC_BITS - 1);
        let mut out = [Frac::ZERO; 1];
        interp.interpolate(&table, &dims, 1, &[half], TABLE_INDEX_FRAC_BITS, &mut out);
        assert!((out[0].to_f32() - 0.5).abs() < 0.01);
    }
}
