//! ELF64 program loader and initial stack layout (spec §6, external
//! interfaces). The teacher only ever loads flat binaries or kernel
//! images; real ELF parsing is grounded on the `red-planet-cli`
//! example's `goblin`-based `PT_LOAD` walk.

use std::fmt;

use goblin::elf::program_header::PT_LOAD;
use goblin::elf::Elf;

use crate::common::error::Trap;
use crate::core::memory::Memory;

#[derive(Debug)]
pub enum LoaderError {
    Parse(goblin::error::Error),
    NotExecutable,
}

impl fmt::Display for LoaderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoaderError::Parse(e) => write!(f, "failed to parse ELF: {e}"),
            LoaderError::NotExecutable => write!(f, "not a 64-bit RISC-V executable"),
        }
    }
}

impl std::error::Error for LoaderError {}

impl From<goblin::error::Error> for LoaderError {
    fn from(e: goblin::error::Error) -> Self {
        LoaderError::Parse(e)
    }
}

/// Copies every `PT_LOAD` segment's file bytes to its virtual address,
/// zero-filling `p_memsz - p_filesz`, and returns the entry point.
///
/// Segments are walked in the order the program headers list them;
/// spec §6 requires ascending virtual-address order, which is how
/// every linker this simulator targets already emits them.
pub fn load_elf(memory: &mut Memory, image: &[u8]) -> Result<u64, LoaderError> {
    let elf = Elf::parse(image)?;
    if !elf.is_64 || elf.header.e_machine != goblin::elf::header::EM_RISCV {
        return Err(LoaderError::NotExecutable);
    }

    for header in elf.program_headers.iter().filter(|h| h.p_type == PT_LOAD) {
        let file_bytes = &image[header.file_range()];
        memory.load_image(header.p_vaddr, file_bytes);
        let zero_start = header.p_vaddr + header.p_filesz;
        let zero_len = (header.p_memsz - header.p_filesz) as usize;
        if zero_len > 0 {
            memory.load_image(zero_start, &vec![0u8; zero_len]);
        }
    }

    Ok(elf.entry)
}

/// Lays out `argc`/`argv`/`envp` at the top of the stack per spec §6's
/// diagram and returns the resulting (16-byte-aligned) stack pointer.
pub fn build_initial_stack(
    memory: &mut Memory,
    stack_top: u64,
    args: &[String],
    envp: &[String],
) -> Result<u64, Trap> {
    let mut cursor = stack_top;

    let mut env_ptrs = Vec::with_capacity(envp.len());
    for s in envp.iter().rev() {
        cursor -= s.len() as u64 + 1;
        memory.set_bytes(cursor, s.as_bytes())?;
        memory.write_u8(cursor + s.len() as u64, 0)?;
        env_ptrs.push(cursor);
    }
    env_ptrs.reverse();

    let mut arg_ptrs = Vec::with_capacity(args.len());
    for s in args.iter().rev() {
        cursor -= s.len() as u64 + 1;
        memory.set_bytes(cursor, s.as_bytes())?;
        memory.write_u8(cursor + s.len() as u64, 0)?;
        arg_ptrs.push(cursor);
    }
    arg_ptrs.reverse();

    let mut words: Vec<u64> = Vec::with_capacity(args.len() + envp.len() + 3);
    words.push(args.len() as u64);
    words.extend(arg_ptrs.iter().copied());
    words.push(0);
    words.extend(env_ptrs.iter().copied());
    words.push(0);

    cursor = (cursor - words.len() as u64 * 8) & !0xf;

    let mut addr = cursor;
    for w in &words {
        memory.write_u64(addr, *w)?;
        addr += 8;
    }

    Ok(cursor)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stack_pointer_is_16_byte_aligned() {
        let mut mem = Memory::new(0x10000);
        let sp = build_initial_stack(&mut mem, 0xff00, &["prog".to_string()], &[]).unwrap();
        assert_eq!(sp % 16, 0);
        assert_eq!(mem.read_u64(sp).unwrap(), 1); // argc
    }

    #[test]
    fn argv_pointer_resolves_to_null_terminated_string() {
        let mut mem = Memory::new(0x10000);
        let sp = build_initial_stack(&mut mem, 0xff00, &["hi".to_string()], &[]).unwrap();
        let argv0 = mem.read_u64(sp + 8).unwrap();
        assert_eq!(mem.get_bytes(argv0, 3).unwrap(), b"hi\0");
    }
}
