//! Integration tests for the floating-point unit (spec §4.4, F/D extension).

use rv64_sim::core::csr::fflags::{DZ, NV, NX};
use rv64_sim::core::fpu;
use rv64_sim::isa::decode::{CmpKind, FmaKind};

/// Scenario 6: FDIV.S of a finite nonzero value by exact zero raises DZ
/// and produces the correctly-signed infinity.
#[test]
fn float_divide_by_zero_sets_dz() {
    let (r, flags) = fpu::fdiv_s(1.0, 0.0);
    assert!(r.is_infinite() && r.is_sign_positive());
    assert_eq!(flags, DZ);
}

/// Scenario 5: FMADD.S with an inexact product sets NX and the result
/// is not exactly representable.
#[test]
fn fma_inexact_product_sets_nx() {
    let a = 1.0f32 / 3.0;
    let (r, flags) = fpu::fma_s(FmaKind::Madd, a, 3.0, 0.0);
    assert_ne!(r, 1.0);
    assert_eq!(flags, NX);
}

/// 0.0/0.0 is invalid (NV), not divide-by-zero.
#[test]
fn zero_over_zero_is_invalid_not_dz() {
    let (r, flags) = fpu::fdiv_d(0.0, 0.0);
    assert!(r.is_nan());
    assert_eq!(flags, NV);
}

/// FEQ on a signaling NaN is invalid; FEQ on a quiet NaN is not.
#[test]
fn feq_signaling_nan_is_invalid() {
    let quiet_nan = f64::from_bits(0x7ff8_0000_0000_0000);
    let signaling_nan = f64::from_bits(0x7ff4_0000_0000_0000);
    let (_, flags) = fpu::fcmp_d(CmpKind::Eq, quiet_nan, 1.0);
    assert_eq!(flags, 0);
    let (_, flags) = fpu::fcmp_d(CmpKind::Eq, signaling_nan, 1.0);
    assert_eq!(flags, NV);
}

/// FCLASS reports the 10-bit category mask for the canonical categories.
#[test]
fn fclass_covers_all_categories() {
    assert_eq!(fpu::fclass_s(f32::NEG_INFINITY), 1 << 0);
    assert_eq!(fpu::fclass_s(-1.0), 1 << 1);
    assert_eq!(fpu::fclass_s(-0.0), 1 << 3);
    assert_eq!(fpu::fclass_s(0.0), 1 << 4);
    assert_eq!(fpu::fclass_s(1.0), 1 << 6);
    assert_eq!(fpu::fclass_s(f32::INFINITY), 1 << 7);
}

/// FMIN/FMAX treat -0.0 as strictly less than +0.0.
#[test]
fn fminmax_signed_zero_tiebreak() {
    let (min, flags) = fpu::fminmax_d(false, 0.0, -0.0);
    assert!(min.is_sign_negative());
    assert_eq!(flags, 0);
    let (max, _) = fpu::fminmax_d(true, 0.0, -0.0);
    assert!(max.is_sign_positive());
}
