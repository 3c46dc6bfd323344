// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! End-to-end scenarios exercising the public evaluator API: a color
//! space, an optional color-rendering dictionary, and the per-pixel
//! evaluation functions that tie them together.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use cie_render::colorspace::identity_decode;
use cie_render::{
    CieA, CieAbc, CieCommon, CieDef, CieRender, DefLut, DeviceColorSink, Frac, IdentityTransformPqr,
    ImagerState, LinearMultilinearInterpolate, Matrix3, Range, Range3, RenderTable, Vector3,
    concretize_cie_a, concretize_cie_abc, concretize_cie_def, remap_cie_abc,
};

fn identity_common() -> CieCommon {
    CieCommon::new(
        Range3::DEFAULT,
        std::array::from_fn(|_| identity_decode()),
        Matrix3::IDENTITY,
        Vector3::new(1.0, 1.0, 1.0),
        Vector3::ZERO,
    )
}

fn crd_with_render_table(render_table: Option<RenderTable>) -> Rc<RefCell<CieRender>> {
    Rc::new(RefCell::new(CieRender::new(
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
        render_table,
    )))
}

struct RecordingSink {
    rgb: Option<(Frac, Frac, Frac)>,
    cmyk: Option<(Frac, Frac, Frac, Frac)>,
}

impl RecordingSink {
    fn new() -> RecordingSink {
        RecordingSink {
            rgb: None,
            cmyk: None,
        }
    }
}

impl DeviceColorSink for RecordingSink {
    fn set_rgb(&mut self, r: Frac, g: Frac, b: Frac) {
        self.rgb = Some((r, g, b));
    }
    fn set_cmyk(&mut self, c: Frac, m: Frac, y: Frac, k: Frac) {
        self.cmyk = Some((c, m, y, k));
    }
}

// S1: a CIEBasedA color space with no adaptation anywhere in the chain
// passes its scalar input through to all three device channels.
#[test]
fn s1_cie_a_identity_round_trips_to_rgb() {
    let common = identity_common();
    let crd = crd_with_render_table(None);
    let mut state = ImagerState::new();
    state.set_color_rendering(crd, &common).unwrap();

    let cie = CieA::new(Range::ZERO_ONE, identity_decode(), Vector3::new(1.0, 1.0, 1.0), common);
    state.install_common(&cie.common).unwrap();

    let mut out = [Frac::ZERO; 4];
    let n = concretize_cie_a(0.7, &cie, &mut out, &state);
    assert_eq!(n, 3);
    for c in &out[0..3] {
        assert!((c.to_f32() - 0.7).abs() < 1.0 / 256.0, "got {}", c.to_f32());
    }
}

// S2: a CIEBasedABC client color outside RangeABC is clamped before any
// further stage sees it.
#[test]
fn s2_cie_abc_clamps_out_of_range_client_color() {
    let common = identity_common();
    let crd = crd_with_render_table(None);
    let mut state = ImagerState::new();
    state.set_color_rendering(crd, &common).unwrap();

    let abc = CieAbc::new(
        Range3::DEFAULT,
        std::array::from_fn(|_| identity_decode()),
        Matrix3::IDENTITY,
        common,
    );
    state.install_common(&abc.common).unwrap();

    let mut out = [Frac::ZERO; 4];
    concretize_cie_abc([-1.0, 2.0, 0.4], &abc, &mut out, &state);
    assert!((out[0].to_f32() - 0.0).abs() < 1.0 / 256.0);
    assert!((out[1].to_f32() - 1.0).abs() < 1.0 / 256.0);
    assert!((out[2].to_f32() - 0.4).abs() < 2.0 / 256.0);
}

// S3: a CIEBasedABC color space with a non-identity MatrixABC scales its
// input into LMN space before reaching an otherwise-identity CRD.
#[test]
fn s3_cie_abc_matrix_scales_before_the_crd() {
    let common = identity_common();
    let crd = crd_with_render_table(None);
    let mut state = ImagerState::new();
    state.set_color_rendering(crd, &common).unwrap();

    let half = Matrix3::new(
        Vector3::new(0.5, 0.0, 0.0),
        Vector3::new(0.0, 0.5, 0.0),
        Vector3::new(0.0, 0.0, 0.5),
    );
    let abc = CieAbc::new(
        Range3::DEFAULT,
        std::array::from_fn(|_| identity_decode()),
        half,
        common,
    );
    assert!(!abc.skip_abc, "a scaling matrix must not be flagged skip");
    state.install_common(&abc.common).unwrap();

    let mut out = [Frac::ZERO; 4];
    concretize_cie_abc([0.4, 0.4, 0.4], &abc, &mut out, &state);
    for c in &out[0..3] {
        assert!((c.to_f32() - 0.2).abs() < 1.0 / 128.0, "got {}", c.to_f32());
    }
}

// S4: a CIEBasedDEF color space whose HIJ->ABC table is the identity cube
// passes its input through unchanged.
#[test]
fn s4_cie_def_identity_table_round_trips() {
    let common = identity_common();
    let crd = crd_with_render_table(None);
    let mut state = ImagerState::new();
    state.set_color_rendering(crd, &common).unwrap();

    let def = CieDef::new(
        Range3::DEFAULT,
        std::array::from_fn(|_| identity_decode()),
        Range3::DEFAULT,
        DefLut::identity_cube(vec![9, 9, 9]),
        Range3::DEFAULT,
        std::array::from_fn(|_| identity_decode()),
        Matrix3::IDENTITY,
        common,
    );
    state.install_common(&def.abc.common).unwrap();

    let interp = LinearMultilinearInterpolate;
    let mut out = [Frac::ZERO; 4];
    concretize_cie_def([0.3, 0.6, 0.9], &def, &interp, &mut out, &state);
    let expected = [0.3, 0.6, 0.9];
    for (c, e) in out[0..3].iter().zip(expected.iter()) {
        assert!((c.to_f32() - e).abs() < 0.02, "got {} want {}", c.to_f32(), e);
    }
}

// S5: a CRD with a small, non-identity render table is read through its
// stride-addressed byte lookup and a non-identity RenderTableT.
#[test]
fn s5_render_table_reads_through_non_identity_strides() {
    let dims = [3usize, 3, 2];
    let m = 3usize;
    // table[i][j][k] = (i, j, k) packed into bytes, scaled into [0, 255].
    let mut table = vec![0u8; dims[0] * dims[1] * dims[2] * m];
    for i in 0..dims[0] {
        for j in 0..dims[1] {
            for k in 0..dims[2] {
                let offset = i * (m * dims[1] * dims[2]) + j * (m * dims[2]) + k * m;
                table[offset] = (i * 255 / (dims[0] - 1)) as u8;
                table[offset + 1] = (j * 255 / (dims[1] - 1)) as u8;
                table[offset + 2] = (k * 255 / (dims[2] - 1)) as u8;
            }
        }
    }
    // A non-identity T: inverts the byte, forcing RenderTableT_is_identity
    // to false and exercising the RenderTableT cache lookup.
    let t_fns: Vec<cie_render::DecodeFn> = (0..m)
        .map(|_| Arc::new(|byte_i: f32| 1.0 - byte_i / 255.0) as cie_render::DecodeFn)
        .collect();
    let render_table = RenderTable {
        table,
        m,
        dims,
        t_fns,
    };

    let common = identity_common();
    let crd = crd_with_render_table(Some(render_table));
    let mut state = ImagerState::new();
    state.set_color_rendering(crd.clone(), &common).unwrap();
    assert!(!crd.borrow().render_table_t_is_identity);

    let abc = CieAbc::new(
        Range3::DEFAULT,
        std::array::from_fn(|_| identity_decode()),
        Matrix3::IDENTITY,
        common,
    );
    state.install_common(&abc.common).unwrap();

    let mut out = [Frac::ZERO; 4];
    let n = concretize_cie_abc([0.0, 1.0, 0.5], &abc, &mut out, &state);
    assert_eq!(n, 3);
    // The first channel maps to grid index 0 -> byte 0 -> inverted to 1.0.
    assert!((out[0].to_f32() - 1.0).abs() < 0.05, "got {}", out[0].to_f32());
    // The second channel maps to the last grid index -> byte 255 -> inverted to 0.0.
    assert!((out[1].to_f32() - 0.0).abs() < 0.05, "got {}", out[1].to_f32());
}

// S6: with no color-rendering dictionary installed, every color maps to
// black on three device channels.
#[test]
fn s6_no_crd_yields_black() {
    let state = ImagerState::new();
    let common = identity_common();
    let abc = CieAbc::new(
        Range3::DEFAULT,
        std::array::from_fn(|_| identity_decode()),
        Matrix3::IDENTITY,
        common,
    );

    let mut sink = RecordingSink::new();
    remap_cie_abc([0.9, 0.1, 0.5], &abc, &state, &mut sink).unwrap();
    assert_eq!(sink.rgb, Some((Frac::ZERO, Frac::ZERO, Frac::ZERO)));
    assert_eq!(sink.cmyk, None);
}
