//! Integer and floating-point register files (spec component C4).

/// NaN-boxing pattern: the upper 32 bits of a float slot holding a
/// 32-bit value are all ones.
const F32_BOX: u64 = 0xffff_ffff_0000_0000;

/// Canonical quiet NaN bit patterns used whenever a non-boxed 32-bit
/// read, or an operation that must produce a NaN, needs one.
pub const CANONICAL_NAN_32: u32 = 0x7fc0_0000;
pub const CANONICAL_NAN_64: u64 = 0x7ff8_0000_0000_0000;

/// 32 general-purpose integer registers. x0 is hardwired to zero.
pub struct IntRegs {
    regs: [u64; 32],
}

impl IntRegs {
    pub fn new() -> Self {
        Self { regs: [0; 32] }
    }

    /// Reads register `idx`. x0 always reads as zero.
    pub fn read(&self, idx: usize) -> u64 {
        if idx == 0 {
            0
        } else {
            self.regs[idx]
        }
    }

    /// Writes register `idx`. Writes to x0 are silently discarded.
    pub fn write(&mut self, idx: usize, val: u64) {
        if idx != 0 {
            self.regs[idx] = val;
        }
    }

    pub fn dump(&self) {
        for i in (0..32).step_by(2) {
            println!(
                "x{:<2}={:#018x} x{:<2}={:#018x}",
                i,
                self.read(i),
                i + 1,
                self.read(i + 1)
            );
        }
    }
}

impl Default for IntRegs {
    fn default() -> Self {
        Self::new()
    }
}

/// 32 floating-point registers, each a 64-bit slot. A single-precision
/// value occupies the low 32 bits with the upper 32 bits NaN-boxed to
/// all ones; a double-precision value occupies the whole slot.
pub struct FloatRegs {
    regs: [u64; 32],
}

impl FloatRegs {
    pub fn new() -> Self {
        Self { regs: [0; 32] }
    }

    /// Reads the raw 64-bit slot contents (used by FMV.X.D and by the
    /// R4-type third operand plumbing, which is precision-agnostic
    /// until the executor interprets it).
    pub fn read_raw(&self, idx: usize) -> u64 {
        self.regs[idx]
    }

    pub fn write_raw(&mut self, idx: usize, val: u64) {
        self.regs[idx] = val;
    }

    /// Reads a single-precision value. If the slot isn't properly
    /// boxed (upper 32 bits not all ones), returns the canonical NaN
    /// per spec §3.
    pub fn read_f32_bits(&self, idx: usize) -> u32 {
        let raw = self.regs[idx];
        if raw & F32_BOX == F32_BOX {
            raw as u32
        } else {
            CANONICAL_NAN_32
        }
    }

    pub fn read_f32(&self, idx: usize) -> f32 {
        f32::from_bits(self.read_f32_bits(idx))
    }

    /// Writes a single-precision value, NaN-boxing the upper 32 bits.
    pub fn write_f32_bits(&mut self, idx: usize, bits: u32) {
        self.regs[idx] = F32_BOX | bits as u64;
    }

    pub fn write_f32(&mut self, idx: usize, val: f32) {
        self.write_f32_bits(idx, val.to_bits());
    }

    pub fn read_f64_bits(&self, idx: usize) -> u64 {
        self.regs[idx]
    }

    pub fn read_f64(&self, idx: usize) -> f64 {
        f64::from_bits(self.regs[idx])
    }

    pub fn write_f64_bits(&mut self, idx: usize, bits: u64) {
        self.regs[idx] = bits;
    }

    pub fn write_f64(&mut self, idx: usize, val: f64) {
        self.write_f64_bits(idx, val.to_bits());
    }
}

impl Default for FloatRegs {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn x0_reads_zero_and_discards_writes() {
        let mut r = IntRegs::new();
        r.write(0, 0xdead_beef);
        assert_eq!(r.read(0), 0);
    }

    #[test]
    fn int_regs_roundtrip() {
        let mut r = IntRegs::new();
        r.write(5, 123);
        assert_eq!(r.read(5), 123);
    }

    #[test]
    fn f32_write_sets_nan_box() {
        let mut f = FloatRegs::new();
        f.write_f32(3, 1.5);
        assert_eq!(f.read_raw(3) & F32_BOX, F32_BOX);
        assert_eq!(f.read_f32(3), 1.5);
    }

    #[test]
    fn unboxed_f32_read_is_canonical_nan() {
        let mut f = FloatRegs::new();
        f.write_f64(4, 1.0);
        assert_eq!(f.read_f32_bits(4), CANONICAL_NAN_32);
    }

    #[test]
    fn f64_uses_whole_slot() {
        let mut f = FloatRegs::new();
        f.write_f64(6, -2.5);
        assert_eq!(f.read_f64(6), -2.5);
    }
}
