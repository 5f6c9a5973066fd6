//! Floating-point execution helpers (spec §4.4, "F/D extension").
//!
//! Every function clears no state itself — the caller (`core::execute`)
//! clears `fflags` once per FP instruction and ORs in whatever this
//! module returns. Inexactness is detected by an algebraic round-trip
//! against the operands rather than a wide-precision reference, mirroring
//! the policy of the reference implementation this behavior was distilled
//! from; see DESIGN.md for the tradeoff.

use crate::core::csr::fflags::{DZ, NV, NX};
use crate::core::regfile::{CANONICAL_NAN_32, CANONICAL_NAN_64};
use crate::isa::decode::{CmpKind, FmaKind, SgnjKind};

fn canonical32() -> f32 {
    f32::from_bits(CANONICAL_NAN_32)
}
fn canonical64() -> f64 {
    f64::from_bits(CANONICAL_NAN_64)
}

fn is_signaling32(a: f32) -> bool {
    a.is_nan() && a.to_bits() & 0x0040_0000 == 0
}
fn is_signaling64(a: f64) -> bool {
    a.is_nan() && a.to_bits() & 0x0008_0000_0000_0000 == 0
}

fn nan_guard32(a: f32, b: f32) -> Option<(f32, u64)> {
    if a.is_nan() || b.is_nan() {
        let flags = if is_signaling32(a) || is_signaling32(b) { NV } else { 0 };
        Some((canonical32(), flags))
    } else {
        None
    }
}
fn nan_guard64(a: f64, b: f64) -> Option<(f64, u64)> {
    if a.is_nan() || b.is_nan() {
        let flags = if is_signaling64(a) || is_signaling64(b) { NV } else { 0 };
        Some((canonical64(), flags))
    } else {
        None
    }
}

pub fn fadd_s(a: f32, b: f32) -> (f32, u64) {
    if let Some(nan) = nan_guard32(a, b) {
        return nan;
    }
    if a.is_infinite() && b.is_infinite() && a.signum() != b.signum() {
        return (canonical32(), NV);
    }
    let r = a + b;
    let flags = if r.is_finite() && (r as f64) != (a as f64 + b as f64) { NX } else { 0 };
    (r, flags)
}

pub fn fsub_s(a: f32, b: f32) -> (f32, u64) {
    if let Some(nan) = nan_guard32(a, b) {
        return nan;
    }
    if a.is_infinite() && b.is_infinite() && a.signum() == b.signum() {
        return (canonical32(), NV);
    }
    let r = a - b;
    let flags = if r.is_finite() && (r as f64) != (a as f64 - b as f64) { NX } else { 0 };
    (r, flags)
}

pub fn fmul_s(a: f32, b: f32) -> (f32, u64) {
    if let Some(nan) = nan_guard32(a, b) {
        return nan;
    }
    if (a.is_infinite() && b == 0.0) || (b.is_infinite() && a == 0.0) {
        return (canonical32(), NV);
    }
    let r = a * b;
    let flags = if r.is_finite() && (r as f64) != (a as f64 * b as f64) { NX } else { 0 };
    (r, flags)
}

pub fn fdiv_s(a: f32, b: f32) -> (f32, u64) {
    if let Some(nan) = nan_guard32(a, b) {
        return nan;
    }
    if b == 0.0 {
        if a == 0.0 {
            return (canonical32(), NV);
        }
        if !a.is_infinite() {
            return (if a.signum() == b.signum() { f32::INFINITY } else { f32::NEG_INFINITY }, DZ);
        }
    }
    let r = a / b;
    let flags = if r.is_finite() && (r as f64) != (a as f64 / b as f64) { NX } else { 0 };
    (r, flags)
}

pub fn fsqrt_s(a: f32) -> (f32, u64) {
    if a.is_nan() {
        let flags = if is_signaling32(a) { NV } else { 0 };
        return (canonical32(), flags);
    }
    if a < 0.0 {
        return (canonical32(), NV);
    }
    let r = a.sqrt();
    let flags = if (r as f64) * (r as f64) != a as f64 { NX } else { 0 };
    (r, flags)
}

pub fn fminmax_s(is_max: bool, a: f32, b: f32) -> (f32, u64) {
    if a.is_nan() || b.is_nan() {
        let flags = if is_signaling32(a) || is_signaling32(b) { NV } else { 0 };
        let r = if a.is_nan() && b.is_nan() {
            canonical32()
        } else if a.is_nan() {
            b
        } else {
            a
        };
        return (r, flags);
    }
    if a == 0.0 && b == 0.0 {
        let a_neg = a.is_sign_negative();
        let b_neg = b.is_sign_negative();
        let r = if is_max {
            if a_neg && !b_neg {
                b
            } else {
                a
            }
        } else if !a_neg && b_neg {
            b
        } else {
            a
        };
        return (r, 0);
    }
    let r = if is_max {
        if a > b {
            a
        } else {
            b
        }
    } else if a < b {
        a
    } else {
        b
    };
    (r, 0)
}

pub fn fcmp_s(kind: CmpKind, a: f32, b: f32) -> (u64, u64) {
    if a.is_nan() || b.is_nan() {
        let flags = match kind {
            CmpKind::Eq => {
                if is_signaling32(a) || is_signaling32(b) {
                    NV
                } else {
                    0
                }
            }
            _ => NV,
        };
        return (0, flags);
    }
    let r = match kind {
        CmpKind::Eq => a == b,
        CmpKind::Lt => a < b,
        CmpKind::Le => a <= b,
    };
    (r as u64, 0)
}

pub fn fclass_s(a: f32) -> u64 {
    if a.is_nan() {
        return if is_signaling32(a) { 1 << 8 } else { 1 << 9 };
    }
    if a.is_infinite() {
        return if a.is_sign_negative() { 1 << 0 } else { 1 << 7 };
    }
    if a == 0.0 {
        return if a.is_sign_negative() { 1 << 3 } else { 1 << 4 };
    }
    let subnormal = a.abs() < f32::MIN_POSITIVE;
    match (a.is_sign_negative(), subnormal) {
        (true, true) => 1 << 2,
        (true, false) => 1 << 1,
        (false, true) => 1 << 5,
        (false, false) => 1 << 6,
    }
}

pub fn fsgnj_s(kind: SgnjKind, a: f32, b: f32) -> f32 {
    let mag = a.to_bits() & 0x7fff_ffff;
    let sign = match kind {
        SgnjKind::J => b.to_bits() & 0x8000_0000,
        SgnjKind::Jn => !b.to_bits() & 0x8000_0000,
        SgnjKind::Jx => (a.to_bits() ^ b.to_bits()) & 0x8000_0000,
    };
    f32::from_bits(mag | sign)
}

pub fn fma_s(kind: FmaKind, a: f32, b: f32, c: f32) -> (f32, u64) {
    if a.is_nan() || b.is_nan() || c.is_nan() {
        let sig = is_signaling32(a) || is_signaling32(b) || is_signaling32(c);
        return (canonical32(), if sig { NV } else { 0 });
    }
    if (a.is_infinite() && b == 0.0) || (b.is_infinite() && a == 0.0) {
        return (canonical32(), NV);
    }
    let (negate, add) = match kind {
        FmaKind::Madd => (false, true),
        FmaKind::Msub => (false, false),
        FmaKind::Nmadd => (true, true),
        FmaKind::Nmsub => (true, false),
    };
    if (a * b).is_infinite() && c.is_infinite() {
        let product_sign = a.signum() * b.signum();
        let mismatched = if add { product_sign != c.signum() } else { product_sign == c.signum() };
        if mismatched {
            return (canonical32(), NV);
        }
    }
    let raw = if add { a * b + c } else { a * b - c };
    let flags = if a != 0.0 {
        let back = if add { (raw - c) / a } else { (raw + c) / a };
        if raw.is_finite() && back != b {
            NX
        } else {
            0
        }
    } else {
        0
    };
    let r = if negate { -raw } else { raw };
    (r, flags)
}

pub fn fcvt_precision_s_d(a: f64) -> (f32, u64) {
    if a.is_nan() {
        let flags = if is_signaling64(a) { NV } else { 0 };
        return (canonical32(), flags);
    }
    let r = a as f32;
    let flags = if r.is_finite() && (r as f64) != a { NX } else { 0 };
    (r, flags)
}

pub fn fcvt_precision_d_s(a: f32) -> (f64, u64) {
    if a.is_nan() {
        let flags = if is_signaling32(a) { NV } else { 0 };
        return (canonical64(), flags);
    }
    (a as f64, 0)
}

/// Converts `a` (promoted to f64 by the caller for the f32 source case)
/// to an integer of the requested width/signedness, truncating toward
/// zero (spec §4.4 "Conversions").
pub fn fcvt_to_int(a: f64, unsigned: bool, is64: bool, source_nan: bool, source_signaling: bool) -> (u64, u64) {
    if source_nan {
        let flags = NV;
        let v = match (unsigned, is64) {
            (true, true) => u64::MAX,
            (true, false) => u32::MAX as u64,
            (false, true) => i64::MAX as u64,
            (false, false) => i32::MAX as i64 as u64,
        };
        let _ = source_signaling;
        return (v, flags);
    }
    let truncated = a.trunc();
    let mut flags = if truncated != a { NX } else { 0 };
    let (lo, hi): (f64, f64) = match (unsigned, is64) {
        (true, true) => (0.0, 18446744073709551615.0),
        (true, false) => (0.0, 4294967295.0),
        (false, true) => (-9223372036854775808.0, 9223372036854775807.0),
        (false, false) => (-2147483648.0, 2147483647.0),
    };
    if truncated < lo {
        flags |= NV;
        let v = match (unsigned, is64) {
            (true, _) => 0,
            (false, true) => i64::MIN as u64,
            (false, false) => i32::MIN as i64 as u64,
        };
        return (v, flags);
    }
    if truncated > hi {
        flags |= NV;
        let v = match (unsigned, is64) {
            (true, true) => u64::MAX,
            (true, false) => u32::MAX as u64,
            (false, true) => i64::MAX as u64,
            (false, false) => i32::MAX as i64 as u64,
        };
        return (v, flags);
    }
    let v = match (unsigned, is64) {
        (true, true) => truncated as u64,
        (true, false) => truncated as u32 as u64,
        (false, true) => truncated as i64 as u64,
        (false, false) => truncated as i32 as i64 as u64,
    };
    (v, flags)
}

/// Converts an integer (`raw`, already narrowed/sign-or-zero-extended
/// to 64 bits by the caller per the source width) into a float bit
/// pattern of the requested precision.
pub fn fcvt_from_int(raw: u64, unsigned: bool, dst_double: bool) -> (u64, u64) {
    let exact = if unsigned { raw as f64 } else { raw as i64 as f64 };
    if dst_double {
        (exact.to_bits(), 0)
    } else {
        let narrowed = exact as f32;
        let flags = if (narrowed as f64) != exact { NX } else { 0 };
        (narrowed.to_bits() as u64, flags)
    }
}

// --- double-precision counterparts ---

pub fn fadd_d(a: f64, b: f64) -> (f64, u64) {
    if let Some(nan) = nan_guard64(a, b) {
        return nan;
    }
    if a.is_infinite() && b.is_infinite() && a.signum() != b.signum() {
        return (canonical64(), NV);
    }
    let r = a + b;
    let back = r - b;
    let flags = if r.is_finite() && back != a { NX } else { 0 };
    (r, flags)
}

pub fn fsub_d(a: f64, b: f64) -> (f64, u64) {
    if let Some(nan) = nan_guard64(a, b) {
        return nan;
    }
    if a.is_infinite() && b.is_infinite() && a.signum() == b.signum() {
        return (canonical64(), NV);
    }
    let r = a - b;
    let back = r + b;
    let flags = if r.is_finite() && back != a { NX } else { 0 };
    (r, flags)
}

pub fn fmul_d(a: f64, b: f64) -> (f64, u64) {
    if let Some(nan) = nan_guard64(a, b) {
        return nan;
    }
    if (a.is_infinite() && b == 0.0) || (b.is_infinite() && a == 0.0) {
        return (canonical64(), NV);
    }
    let r = a * b;
    let flags = if r.is_finite() && a != 0.0 && (r / a) != b { NX } else { 0 };
    (r, flags)
}

pub fn fdiv_d(a: f64, b: f64) -> (f64, u64) {
    if let Some(nan) = nan_guard64(a, b) {
        return nan;
    }
    if b == 0.0 {
        if a == 0.0 {
            return (canonical64(), NV);
        }
        if !a.is_infinite() {
            return (if a.signum() == b.signum() { f64::INFINITY } else { f64::NEG_INFINITY }, DZ);
        }
    }
    let r = a / b;
    let flags = if r.is_finite() && r * b != a { NX } else { 0 };
    (r, flags)
}

pub fn fsqrt_d(a: f64) -> (f64, u64) {
    if a.is_nan() {
        let flags = if is_signaling64(a) { NV } else { 0 };
        return (canonical64(), flags);
    }
    if a < 0.0 {
        return (canonical64(), NV);
    }
    let r = a.sqrt();
    let flags = if r * r != a { NX } else { 0 };
    (r, flags)
}

pub fn fminmax_d(is_max: bool, a: f64, b: f64) -> (f64, u64) {
    if a.is_nan() || b.is_nan() {
        let flags = if is_signaling64(a) || is_signaling64(b) { NV } else { 0 };
        let r = if a.is_nan() && b.is_nan() {
            canonical64()
        } else if a.is_nan() {
            b
        } else {
            a
        };
        return (r, flags);
    }
    if a == 0.0 && b == 0.0 {
        let a_neg = a.is_sign_negative();
        let b_neg = b.is_sign_negative();
        let r = if is_max {
            if a_neg && !b_neg {
                b
            } else {
                a
            }
        } else if !a_neg && b_neg {
            b
        } else {
            a
        };
        return (r, 0);
    }
    let r = if is_max {
        if a > b {
            a
        } else {
            b
        }
    } else if a < b {
        a
    } else {
        b
    };
    (r, 0)
}

pub fn fcmp_d(kind: CmpKind, a: f64, b: f64) -> (u64, u64) {
    if a.is_nan() || b.is_nan() {
        let flags = match kind {
            CmpKind::Eq => {
                if is_signaling64(a) || is_signaling64(b) {
                    NV
                } else {
                    0
                }
            }
            _ => NV,
        };
        return (0, flags);
    }
    let r = match kind {
        CmpKind::Eq => a == b,
        CmpKind::Lt => a < b,
        CmpKind::Le => a <= b,
    };
    (r as u64, 0)
}

pub fn fclass_d(a: f64) -> u64 {
    if a.is_nan() {
        return if is_signaling64(a) { 1 << 8 } else { 1 << 9 };
    }
    if a.is_infinite() {
        return if a.is_sign_negative() { 1 << 0 } else { 1 << 7 };
    }
    if a == 0.0 {
        return if a.is_sign_negative() { 1 << 3 } else { 1 << 4 };
    }
    let subnormal = a.abs() < f64::MIN_POSITIVE;
    match (a.is_sign_negative(), subnormal) {
        (true, true) => 1 << 2,
        (true, false) => 1 << 1,
        (false, true) => 1 << 5,
        (false, false) => 1 << 6,
    }
}

pub fn fsgnj_d(kind: SgnjKind, a: f64, b: f64) -> f64 {
    let mag = a.to_bits() & 0x7fff_ffff_ffff_ffff;
    let sign = match kind {
        SgnjKind::J => b.to_bits() & 0x8000_0000_0000_0000,
        SgnjKind::Jn => !b.to_bits() & 0x8000_0000_0000_0000,
        SgnjKind::Jx => (a.to_bits() ^ b.to_bits()) & 0x8000_0000_0000_0000,
    };
    f64::from_bits(mag | sign)
}

pub fn fma_d(kind: FmaKind, a: f64, b: f64, c: f64) -> (f64, u64) {
    if a.is_nan() || b.is_nan() || c.is_nan() {
        let sig = is_signaling64(a) || is_signaling64(b) || is_signaling64(c);
        return (canonical64(), if sig { NV } else { 0 });
    }
    if (a.is_infinite() && b == 0.0) || (b.is_infinite() && a == 0.0) {
        return (canonical64(), NV);
    }
    let (negate, add) = match kind {
        FmaKind::Madd => (false, true),
        FmaKind::Msub => (false, false),
        FmaKind::Nmadd => (true, true),
        FmaKind::Nmsub => (true, false),
    };
    if (a * b).is_infinite() && c.is_infinite() {
        let product_sign = a.signum() * b.signum();
        let mismatched = if add { product_sign != c.signum() } else { product_sign == c.signum() };
        if mismatched {
            return (canonical64(), NV);
        }
    }
    let raw = if add { a * b + c } else { a * b - c };
    let flags = if a != 0.0 {
        let back = if add { (raw - c) / a } else { (raw + c) / a };
        if raw.is_finite() && back != b {
            NX
        } else {
            0
        }
    } else {
        0
    };
    let r = if negate { -raw } else { raw };
    (r, flags)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fadd_basic() {
        let (r, flags) = fadd_s(1.0, 2.0);
        assert_eq!(r, 3.0);
        assert_eq!(flags, 0);
    }

    #[test]
    fn fdiv_by_zero_sets_dz_and_returns_infinity() {
        let (r, flags) = fdiv_s(1.0, 0.0);
        assert!(r.is_infinite() && r.is_sign_positive());
        assert_eq!(flags, DZ);
    }

    #[test]
    fn fdiv_zero_by_zero_is_invalid() {
        let (r, flags) = fdiv_s(0.0, 0.0);
        assert!(r.is_nan());
        assert_eq!(flags, NV);
    }

    #[test]
    fn fsqrt_negative_is_invalid() {
        let (r, flags) = fsqrt_s(-4.0);
        assert!(r.is_nan());
        assert_eq!(flags, NV);
    }

    #[test]
    fn fma_inexact_matches_spec_scenario() {
        let a = 1.0f32 / 3.0f32;
        let (r, flags) = fma_s(FmaKind::Madd, a, 3.0, 0.0);
        assert_ne!(r, 1.0);
        assert_eq!(flags, NX);
    }

    #[test]
    fn fminmax_handles_signed_zero() {
        let (min, _) = fminmax_s(false, 0.0, -0.0);
        assert!(min.is_sign_negative());
        let (max, _) = fminmax_s(true, 0.0, -0.0);
        assert!(max.is_sign_positive());
    }

    #[test]
    fn fcmp_lt_on_nan_is_invalid() {
        let (r, flags) = fcmp_s(CmpKind::Lt, f32::NAN, 1.0);
        assert_eq!(r, 0);
        assert_eq!(flags, NV);
    }

    #[test]
    fn fclass_identifies_categories() {
        assert_eq!(fclass_s(f32::NEG_INFINITY), 1 << 0);
        assert_eq!(fclass_s(0.0), 1 << 4);
        assert_eq!(fclass_s(-0.0), 1 << 3);
        assert_eq!(fclass_s(f32::NAN), 1 << 9);
    }

    #[test]
    fn fcvt_to_int_saturates_out_of_range() {
        let (v, flags) = fcvt_to_int(1e30, false, false, false, false);
        assert_eq!(v, i32::MAX as i64 as u64);
        assert_eq!(flags, NV);
    }

    #[test]
    fn fcvt_to_int_nan_is_max_positive_for_signed() {
        let (v, flags) = fcvt_to_int(0.0, false, true, true, false);
        assert_eq!(v, i64::MAX as u64);
        assert_eq!(flags, NV);
    }
}
