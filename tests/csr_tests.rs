//! Integration tests for the CSR file and its fflags/frm/fcsr aliasing
//! (spec component C3, §4.3).

use rv64_sim::core::csr::{fflags, CsrFile, FCSR, FFLAGS, FRM};

/// fflags and frm are windows into fcsr's low bits, not separate storage.
#[test]
fn fflags_and_frm_are_fcsr_subfields() {
    let mut csrs = CsrFile::new();
    csrs.set(FFLAGS, fflags::NV | fflags::NX);
    csrs.set(FRM, 0b011);
    assert_eq!(csrs.get(FCSR), (0b011 << 5) | fflags::NV | fflags::NX);
}

/// Accumulation across several FP ops is additive until explicitly cleared.
#[test]
fn fflags_accumulate_until_cleared() {
    let mut csrs = CsrFile::new();
    csrs.set_fflags(fflags::NX);
    csrs.set_fflags(fflags::DZ);
    assert_eq!(csrs.get(FFLAGS), fflags::NX | fflags::DZ);
    csrs.clear_fflags();
    assert_eq!(csrs.get(FFLAGS), 0);
}

/// clear_fflags leaves frm untouched.
#[test]
fn clear_fflags_preserves_frm() {
    let mut csrs = CsrFile::new();
    csrs.set(FRM, 0b101);
    csrs.set_fflags(fflags::OF);
    csrs.clear_fflags();
    assert_eq!(csrs.get(FRM), 0b101);
    assert_eq!(csrs.get(FFLAGS), 0);
}

/// An index outside the fflags/frm/fcsr family is plain 64-bit storage.
#[test]
fn unrecognized_csr_is_plain_storage() {
    let mut csrs = CsrFile::new();
    csrs.set(0x7c0, 0xdead_beef);
    assert_eq!(csrs.get(0x7c0), 0xdead_beef);
    assert_eq!(csrs.get(0x7c1), 0);
}
