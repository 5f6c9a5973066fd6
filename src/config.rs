//! TOML configuration (spec §2 ambient stack), following the teacher's
//! `config.rs` idiom of `#[derive(Deserialize)]` structs backed by
//! `#[serde(default = "...")]` helper functions for every optional
//! field.

use serde::Deserialize;

const DEFAULT_MEMORY_SIZE: usize = 128 * 1024 * 1024;
const DEFAULT_STACK_SIZE: usize = 1024 * 1024;

#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(default = "default_memory_size")]
    pub memory_size: usize,

    /// Enables the C (compressed instruction) extension, relaxing
    /// branch/jump target alignment from 4 to 2 bytes.
    #[serde(default)]
    pub compressed_enabled: bool,

    #[serde(default = "default_stack_size")]
    pub stack_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            memory_size: DEFAULT_MEMORY_SIZE,
            compressed_enabled: false,
            stack_size: DEFAULT_STACK_SIZE,
        }
    }
}

fn default_memory_size() -> usize {
    DEFAULT_MEMORY_SIZE
}

fn default_stack_size() -> usize {
    DEFAULT_STACK_SIZE
}
