// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! The per-pixel evaluator: `concretize_CIE*` (front end) feeding into
//! `remap_finish` (the shared back end), plus `ImagerState`, which owns
//! the joint cache and the CRD binding for one rendering context.

use std::cell::RefCell;
use std::rc::Rc;

use crate::CACHE_SIZE;
use crate::LOG2_CACHE_SIZE;
use crate::cache::{self, CachedVector3, ScalarCache, ScalarValues};
use crate::cached::{Frac, cached_to_int, to_cached};
use crate::colorspace::{
    CieA, CieAbc, CieCommon, CieDef, CieDefg, DefLut, restrict_color_def, restrict_color_defg,
};
use crate::error::{Error, Result};
use crate::interp::{MultilinearInterpolate, TABLE_INDEX_FRAC_BITS};
use crate::joint::{self, JointCache};
use crate::render::CieRender;

/// A device color sink: the host-supplied RGB/CMYK adapters dispatched to
/// by `remap_cie_abc` based on `remap_finish`'s returned channel count.
pub trait DeviceColorSink {
    fn set_rgb(&mut self, r: Frac, g: Frac, b: Frac);
    fn set_cmyk(&mut self, c: Frac, m: Frac, y: Frac, k: Frac);
}

/// Owns the CRD binding and the joint cache derived from it. Single
/// imager state per rendering context; a CRD may be shared by reference
/// count across imager states, but each keeps its own joint cache.
pub struct ImagerState {
    crd: Option<Rc<RefCell<CieRender>>>,
    joint_cache: Option<JointCache>,
}

impl Default for ImagerState {
    fn default() -> ImagerState {
        ImagerState::new()
    }
}

impl ImagerState {
    pub fn new() -> ImagerState {
        ImagerState {
            crd: None,
            joint_cache: None,
        }
    }

    fn rebuild_joint_cache(&mut self, common: &CieCommon) -> Result<()> {
        self.joint_cache = match &self.crd {
            None => None,
            Some(crd_rc) => {
                let crd = crd_rc.borrow();
                let init = joint::joint_init(common, &crd)?;
                Some(joint::joint_complete(init, common, &crd))
            }
        };
        Ok(())
    }

    /// `install_CIE*`'s common half: (re)builds the joint cache for the
    /// color space just installed, if a CRD is already bound.
    pub fn install_common(&mut self, common: &CieCommon) -> Result<()> {
        self.rebuild_joint_cache(common)
    }

    /// `set_color_rendering`: completes the CRD, binds it by reference,
    /// and rebuilds the joint cache for `common` (the currently installed
    /// color space).
    pub fn set_color_rendering(
        &mut self,
        crd: Rc<RefCell<CieRender>>,
        common: &CieCommon,
    ) -> Result<()> {
        {
            let mut c = crd.borrow_mut();
            c.init();
            c.sample();
            c.complete();
        }
        self.crd = Some(crd);
        self.rebuild_joint_cache(common)
    }

    pub fn current_color_rendering(&self) -> Option<Rc<RefCell<CieRender>>> {
        self.crd.clone()
    }

    /// Produces a fresh joint cache, independent of any cache currently
    /// shared with another imager state (the original's `rc_unshare`).
    pub fn unshare_joint_cache(&mut self, common: &CieCommon) -> Result<()> {
        self.rebuild_joint_cache(common)
    }
}

/// `install_CIE{A,ABC,DEF,DEFG}`: constructs the color space (loading and
/// fusing its decode caches) and readies the imager state's joint cache.
pub fn install_cie_a(
    cie: CieA,
    state: &mut ImagerState,
) -> Result<CieA> {
    state.install_common(&cie.common)?;
    Ok(cie)
}

pub fn install_cie_abc(cie: CieAbc, state: &mut ImagerState) -> Result<CieAbc> {
    state.install_common(&cie.common)?;
    Ok(cie)
}

pub fn install_cie_def(cie: CieDef, state: &mut ImagerState) -> Result<CieDef> {
    state.install_common(&cie.abc.common)?;
    Ok(cie)
}

pub fn install_cie_defg(cie: CieDefg, state: &mut ImagerState) -> Result<CieDefg> {
    state.install_common(&cie.abc.common)?;
    Ok(cie)
}

fn interpolate_cache_value(cache: &ScalarCache<CACHE_SIZE>, v: f32) -> f32 {
    let base = cache.params.base;
    let factor = cache.params.factor;
    let values = cache.float_values();
    if factor == 0.0 {
        return values[0];
    }
    let idx_f = ((v - base) * factor).clamp(0.0, (CACHE_SIZE - 1) as f32);
    let idx0 = idx_f.floor() as usize;
    let idx1 = (idx0 + 1).min(CACHE_SIZE - 1);
    let frac = idx_f - idx0 as f32;
    values[idx0] + (values[idx1] - values[idx0]) * frac
}

/// The DEF/DEFG table front end: maps each input channel through its
/// decode cache into table-index units, packs a fixed-point grid index
/// per axis, and calls the external multilinear interpolator to read the
/// HIJ(K)->ABC table.
fn def_table_lookup(
    pc: &[f32],
    caches: &[ScalarCache<CACHE_SIZE>],
    table: &DefLut,
    interp: &dyn MultilinearInterpolate,
) -> [Frac; 3] {
    let k = table.dims.len();
    let mut indices = vec![0i32; k];
    for axis in 0..k {
        let h = interpolate_cache_value(&caches[axis], pc[axis]).clamp(0.0, 255.0);
        let dim = table.dims[axis];
        let t = if dim > 1 {
            (h / 255.0 * (dim - 1) as f32).clamp(0.0, (dim - 1) as f32)
        } else {
            0.0
        };
        indices[axis] = (t * (1i32 << TABLE_INDEX_FRAC_BITS) as f32).round() as i32;
    }
    let mut out = [Frac::ZERO; 3];
    interp.interpolate(&table.table, &table.dims, 3, &indices, TABLE_INDEX_FRAC_BITS, &mut out);
    out
}

fn cached_vector_of(values: [f32; 3]) -> CachedVector3 {
    CachedVector3 {
        u: to_cached(values[0]),
        v: to_cached(values[1]),
        w: to_cached(values[2]),
    }
}

/// `concretize_CIEA`: writes the resulting device-facing fracs into
/// `out[0..n]` and returns `n` (the channel count `remap_finish` chose).
pub fn concretize_cie_a(a: f32, cie: &CieA, out: &mut [Frac; 4], state: &ImagerState) -> usize {
    let vlmn = cie.caches_decode_a.lookup_value(to_cached(a));
    remap_finish(vlmn, out, state)
}

pub fn concretize_cie_abc(pc: [f32; 3], cie: &CieAbc, out: &mut [Frac; 4], state: &ImagerState) -> usize {
    let mut vabc = cached_vector_of(pc);
    if !cie.skip_abc {
        vabc = cache::lookup_mult3(vabc, &cie.caches_decode_abc);
    }
    remap_finish(vabc, out, state)
}

pub fn concretize_cie_def(
    pc: [f32; 3],
    cie: &CieDef,
    interp: &dyn MultilinearInterpolate,
    out: &mut [Frac; 4],
    state: &ImagerState,
) -> usize {
    let mut clamped = pc;
    restrict_color_def(&mut clamped, cie);
    let abc = def_table_lookup(&clamped, &cie.caches_decode_def, &cie.table, interp);
    let mut vabc = cached_vector_of([abc[0].to_f32(), abc[1].to_f32(), abc[2].to_f32()]);
    if !cie.abc.skip_abc {
        vabc = cache::lookup_mult3(vabc, &cie.abc.caches_decode_abc);
    }
    remap_finish(vabc, out, state)
}

pub fn concretize_cie_defg(
    pc: [f32; 4],
    cie: &CieDefg,
    interp: &dyn MultilinearInterpolate,
    out: &mut [Frac; 4],
    state: &ImagerState,
) -> usize {
    let mut clamped = pc;
    restrict_color_defg(&mut clamped, cie);
    let abc = def_table_lookup(&clamped, &cie.caches_decode_defg, &cie.table, interp);
    let mut vabc = cached_vector_of([abc[0].to_f32(), abc[1].to_f32(), abc[2].to_f32()]);
    if !cie.abc.skip_abc {
        vabc = cache::lookup_mult3(vabc, &cie.abc.caches_decode_abc);
    }
    remap_finish(vabc, out, state)
}

fn interpolate_frac(values: &[Frac; CACHE_SIZE], tabc: i32, b: u32) -> Frac {
    if b == 0 {
        let idx = tabc.clamp(0, (CACHE_SIZE - 1) as i32) as usize;
        return values[idx];
    }
    let idx0 = (tabc >> b).clamp(0, (CACHE_SIZE - 1) as i32) as usize;
    let idx1 = (idx0 + 1).min(CACHE_SIZE - 1);
    let frac = (tabc & ((1 << b) - 1)) as f32 / (1i32 << b) as f32;
    let v0 = values[idx0].to_f32();
    let v1 = values[idx1].to_f32();
    Frac::from_f32(v0 + (v1 - v0) * frac)
}

/// The back end shared by every CIE variant: adapts LMN through PQR (if a
/// CRD is installed), encodes to ABC, and reads either the encode fracs
/// directly or the CRD's render table. Returns the number of channels
/// written (3 with no render table or an RGB-shaped one, `m` otherwise).
fn remap_finish(mut vlmn: CachedVector3, out: &mut [Frac; 4], state: &ImagerState) -> usize {
    let (crd_rc, joint) = match (&state.crd, &state.joint_cache) {
        (Some(crd), Some(joint)) => (crd, joint),
        _ => {
            out[0] = Frac::ZERO;
            out[1] = Frac::ZERO;
            out[2] = Frac::ZERO;
            return 3;
        }
    };
    let crd = crd_rc.borrow();

    if !joint.skip_lmn {
        let vpqr = cache::lookup_mult3(vlmn, &joint.decode_lmn);
        if !joint.skip_pqr {
            vlmn = cache::lookup_mult3(vpqr, &joint.transform_pqr);
        }
    }

    let caches_encode_lmn = crd
        .caches_encode_lmn
        .as_ref()
        .expect("CRD must be COMPLETED before evaluation");
    let vabc = cache::lookup_mult3(vlmn, caches_encode_lmn);

    let b = crate::INTERPOLATE_BITS;
    let mut tabc = [0i32; 3];
    for c in 0..3 {
        let diff = crate::cached::from_cached(vabc.axis(c)) - crate::cached::from_cached(crd.encode_abc_base[c]);
        tabc[c] = cached_to_int(to_cached(diff), b).clamp(0, ((CACHE_SIZE as i32) << b) - 1);
    }

    let caches_encode_abc = crd
        .caches_encode_abc
        .as_ref()
        .expect("CRD must be COMPLETED before evaluation");

    match &crd.render_table {
        None => {
            for c in 0..3 {
                let fracs = match &caches_encode_abc[c].values {
                    ScalarValues::Frac(f) => f,
                    _ => unreachable!("no render table implies EncodeABC caches hold fracs"),
                };
                out[c] = interpolate_frac(fracs, tabc[c], b);
            }
            3
        }
        Some(rt) => {
            let mut offset = 0usize;
            for c in 0..3 {
                let ints = match &caches_encode_abc[c].values {
                    ScalarValues::Int(v) => v,
                    _ => unreachable!("a render table implies EncodeABC caches hold ints"),
                };
                offset += ints[(tabc[c] >> b) as usize] as usize;
            }
            let prtc = &rt.table[offset..offset + rt.m];
            let t_caches = crd.caches_render_table_t.as_ref();
            for k in 0..rt.m {
                out[k] = if crd.render_table_t_is_identity {
                    Frac::from_byte(prtc[k])
                } else {
                    let idx = (prtc[k] as usize) << LOG2_CACHE_SIZE.saturating_sub(8);
                    match &t_caches.unwrap()[k].values {
                        ScalarValues::Frac(f) => f[idx.min(CACHE_SIZE - 1)],
                        _ => unreachable!("RenderTableT caches always hold fracs"),
                    }
                };
            }
            rt.m
        }
    }
}

/// `remap_CIEABC`: evaluates a CIEBasedABC color and dispatches the
/// result to the device's RGB or CMYK adapter.
pub fn remap_cie_abc(
    pc: [f32; 3],
    cie: &CieAbc,
    state: &ImagerState,
    device: &mut dyn DeviceColorSink,
) -> Result<()> {
    let mut out = [Frac::ZERO; 4];
    match concretize_cie_abc(pc, cie, &mut out, state) {
        3 => {
            device.set_rgb(out[0], out[1], out[2]);
            Ok(())
        }
        4 => {
            device.set_cmyk(out[0], out[1], out[2], out[3]);
            Ok(())
        }
        other => Err(Error::UnreachableDispatch(other)),
    }
}
