//! Flat byte-addressable memory (spec component C2).
//!
//! A single linear backing store. All multi-byte accessors are
//! little-endian and derived from the byte-range primitives, matching
//! the `Memory`/`Fasten` split in the reference implementation this
//! was distilled from.

use crate::common::Trap;

/// A flat, bounds-checked, little-endian byte store.
pub struct Memory {
    data: Vec<u8>,
}

impl Memory {
    /// Creates a zero-filled memory of `size` bytes.
    pub fn new(size: usize) -> Self {
        Self {
            data: vec![0u8; size],
        }
    }

    /// Total addressable size in bytes.
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Reads `n` bytes starting at `addr`.
    pub fn get_bytes(&self, addr: u64, n: usize) -> Result<&[u8], Trap> {
        let start = usize::try_from(addr).map_err(|_| Trap::MemoryFault)?;
        let end = start.checked_add(n).ok_or(Trap::MemoryFault)?;
        self.data.get(start..end).ok_or(Trap::MemoryFault)
    }

    /// Writes `bytes` starting at `addr`.
    pub fn set_bytes(&mut self, addr: u64, bytes: &[u8]) -> Result<(), Trap> {
        let start = usize::try_from(addr).map_err(|_| Trap::MemoryFault)?;
        let end = start.checked_add(bytes.len()).ok_or(Trap::MemoryFault)?;
        let dst = self.data.get_mut(start..end).ok_or(Trap::MemoryFault)?;
        dst.copy_from_slice(bytes);
        Ok(())
    }

    pub fn read_u8(&self, addr: u64) -> Result<u8, Trap> {
        Ok(self.get_bytes(addr, 1)?[0])
    }

    pub fn read_u16(&self, addr: u64) -> Result<u16, Trap> {
        Ok(u16::from_le_bytes(self.get_bytes(addr, 2)?.try_into().unwrap()))
    }

    pub fn read_u32(&self, addr: u64) -> Result<u32, Trap> {
        Ok(u32::from_le_bytes(self.get_bytes(addr, 4)?.try_into().unwrap()))
    }

    pub fn read_u64(&self, addr: u64) -> Result<u64, Trap> {
        Ok(u64::from_le_bytes(self.get_bytes(addr, 8)?.try_into().unwrap()))
    }

    pub fn write_u8(&mut self, addr: u64, v: u8) -> Result<(), Trap> {
        self.set_bytes(addr, &v.to_le_bytes())
    }

    pub fn write_u16(&mut self, addr: u64, v: u16) -> Result<(), Trap> {
        self.set_bytes(addr, &v.to_le_bytes())
    }

    pub fn write_u32(&mut self, addr: u64, v: u32) -> Result<(), Trap> {
        self.set_bytes(addr, &v.to_le_bytes())
    }

    pub fn write_u64(&mut self, addr: u64, v: u64) -> Result<(), Trap> {
        self.set_bytes(addr, &v.to_le_bytes())
    }

    /// Copies `data` into memory starting at `addr`, without bounds
    /// checking against the emulated address space's access rules —
    /// used only by the ELF loader before execution begins.
    pub fn load_image(&mut self, addr: u64, data: &[u8]) {
        let start = addr as usize;
        self.data[start..start + data.len()].copy_from_slice(data);
    }
}
