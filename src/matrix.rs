// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! Real-valued 3-vector / 3x3-matrix algebra, and the domain/range pairs
//! the rest of the crate samples functions over.

/// A one-dimensional domain or range, `rmin <= rmax`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Range {
    pub rmin: f32,
    pub rmax: f32,
}

impl Range {
    pub const ZERO_ONE: Range = Range {
        rmin: 0.0,
        rmax: 1.0,
    };

    pub fn new(rmin: f32, rmax: f32) -> Range {
        Range { rmin, rmax }
    }

    pub fn clamp(&self, v: f32) -> f32 {
        v.clamp(self.rmin, self.rmax)
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Range3 {
    pub ranges: [Range; 3],
}

impl Range3 {
    pub const DEFAULT: Range3 = Range3 {
        ranges: [Range::ZERO_ONE, Range::ZERO_ONE, Range::ZERO_ONE],
    };
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Range4 {
    pub ranges: [Range; 4],
}

impl Range4 {
    pub const DEFAULT: Range4 = Range4 {
        ranges: [
            Range::ZERO_ONE,
            Range::ZERO_ONE,
            Range::ZERO_ONE,
            Range::ZERO_ONE,
        ],
    };
}

/// A 3-vector, named `u, v, w` to match the column layout of [`Matrix3`].
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Vector3 {
    pub u: f32,
    pub v: f32,
    pub w: f32,
}

impl Vector3 {
    pub const ZERO: Vector3 = Vector3 {
        u: 0.0,
        v: 0.0,
        w: 0.0,
    };

    pub fn new(u: f32, v: f32, w: f32) -> Vector3 {
        Vector3 { u, v, w }
    }

    pub fn axis(&self, i: usize) -> f32 {
        match i {
            0 => self.u,
            1 => self.v,
            2 => self.w,
            _ => panic!("vector3 axis out of range: {i}"),
        }
    }
}

/// A 3x3 real matrix stored by columns `cu, cv, cw` (so `M * v` is
/// `v.u * cu + v.v * cv + v.w * cw`), with a structural identity flag
/// computed by exact comparison, never by tolerance.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Matrix3 {
    pub cu: Vector3,
    pub cv: Vector3,
    pub cw: Vector3,
    pub is_identity: bool,
}

impl Matrix3 {
    pub const IDENTITY: Matrix3 = Matrix3 {
        cu: Vector3 {
            u: 1.0,
            v: 0.0,
            w: 0.0,
        },
        cv: Vector3 {
            u: 0.0,
            v: 1.0,
            w: 0.0,
        },
        cw: Vector3 {
            u: 0.0,
            v: 0.0,
            w: 1.0,
        },
        is_identity: true,
    };

    pub fn new(cu: Vector3, cv: Vector3, cw: Vector3) -> Matrix3 {
        let mut m = Matrix3 {
            cu,
            cv,
            cw,
            is_identity: false,
        };
        matrix_init(&mut m);
        m
    }

    pub fn column(&self, i: usize) -> Vector3 {
        match i {
            0 => self.cu,
            1 => self.cv,
            2 => self.cw,
            _ => panic!("matrix3 column out of range: {i}"),
        }
    }
}

/// `M * v`, treating `v` as a column vector. `out` must not alias `v`.
pub fn mult3_vec(v: Vector3, m: &Matrix3) -> Vector3 {
    Vector3 {
        u: v.u * m.cu.u + v.v * m.cv.u + v.w * m.cw.u,
        v: v.u * m.cu.v + v.v * m.cv.v + v.w * m.cw.v,
        w: v.u * m.cu.w + v.v * m.cv.w + v.w * m.cw.w,
    }
}

/// `c = a . b`. Note that the composition of "first `a`, then `b`" is
/// `matmul3(b, a)`, not `matmul3(a, b)`: applying the product to a vector
/// applies `a` first.
pub fn matmul3(a: &Matrix3, b: &Matrix3) -> Matrix3 {
    let mut c = Matrix3 {
        cu: mult3_vec(b.cu, a),
        cv: mult3_vec(b.cv, a),
        cw: mult3_vec(b.cw, a),
        is_identity: false,
    };
    matrix_init(&mut c);
    c
}

/// Classical adjugate/determinant inverse. Preserves the caller's
/// `is_identity` flag (an identity matrix inverts to an identity matrix).
pub fn invert3(m: &Matrix3) -> Matrix3 {
    let (a, b, c) = (m.cu.u, m.cv.u, m.cw.u);
    let (d, e, f) = (m.cu.v, m.cv.v, m.cw.v);
    let (g, h, i) = (m.cu.w, m.cv.w, m.cw.w);

    let co_a = (e * i - f * h) as f64;
    let co_b = (f * g - d * i) as f64;
    let co_c = (d * h - e * g) as f64;
    let det = a as f64 * co_a + b as f64 * co_b + c as f64 * co_c;

    Matrix3 {
        cu: Vector3 {
            u: (co_a / det) as f32,
            v: (co_b / det) as f32,
            w: (co_c / det) as f32,
        },
        cv: Vector3 {
            u: ((c as f64 * h as f64 - b as f64 * i as f64) / det) as f32,
            v: ((a as f64 * i as f64 - c as f64 * g as f64) / det) as f32,
            w: ((b as f64 * g as f64 - a as f64 * h as f64) / det) as f32,
        },
        cw: Vector3 {
            u: ((b as f64 * f as f64 - c as f64 * e as f64) / det) as f32,
            v: ((c as f64 * d as f64 - a as f64 * f as f64) / det) as f32,
            w: ((a as f64 * e as f64 - b as f64 * d as f64) / det) as f32,
        },
        is_identity: m.is_identity,
    }
}

/// Sets `is_identity` iff the diagonal is exactly 1.0 and all
/// off-diagonals are exactly 0.0. Matrices are constructed by the caller
/// and compare exactly when left at their defaults, so no tolerance is
/// involved here.
pub fn matrix_init(m: &mut Matrix3) {
    m.is_identity = m.cu.u == 1.0
        && m.cu.v == 0.0
        && m.cu.w == 0.0
        && m.cv.v == 1.0
        && m.cv.u == 0.0
        && m.cv.w == 0.0
        && m.cw.w == 1.0
        && m.cw.u == 0.0
        && m.cw.v == 0.0;
}

/// Transforms a single output axis of a range triple through the matrix
/// row `(mu, mv, mw)`: each axis is a sum of signed products, with each
/// product's endpoints sorted before summation (the matrix is not assumed
/// positive).
fn transform_range_axis(in_: &Range3, mu: f32, mv: f32, mw: f32) -> Range {
    let (mut umin, mut umax) = (mu * in_.ranges[0].rmin, mu * in_.ranges[0].rmax);
    let (mut vmin, mut vmax) = (mv * in_.ranges[1].rmin, mv * in_.ranges[1].rmax);
    let (mut wmin, mut wmax) = (mw * in_.ranges[2].rmin, mw * in_.ranges[2].rmax);
    if umin > umax {
        std::mem::swap(&mut umin, &mut umax);
    }
    if vmin > vmax {
        std::mem::swap(&mut vmin, &mut vmax);
    }
    if wmin > wmax {
        std::mem::swap(&mut wmin, &mut wmax);
    }
    Range {
        rmin: umin + vmin + wmin,
        rmax: umax + vmax + wmax,
    }
}

/// Transforms a range triple through a matrix: output axis `j` is the sum
/// of the three input axes' signed-product intervals taken from matrix row
/// `j`.
pub fn transform_range3(in_: &Range3, m: &Matrix3) -> Range3 {
    Range3 {
        ranges: [
            transform_range_axis(in_, m.cu.u, m.cv.u, m.cw.u),
            transform_range_axis(in_, m.cu.v, m.cv.v, m.cw.v),
            transform_range_axis(in_, m.cu.w, m.cv.w, m.cw.w),
        ],
    }
}
