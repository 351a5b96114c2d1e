use std::{io, path::PathBuf};

use crate::config::arch_config::WordType;

/// Failures that stop the emulator itself. Faults inside the emulated
/// machine are traps, never one of these.
#[derive(thiserror::Error, Debug)]
pub enum EmulatorError {
    #[error("failed to load '{}': {source}", path.display())]
    ImageRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("image is {size} bytes but RAM holds only {capacity}")]
    ImageTooLarge { size: usize, capacity: usize },

    #[error("RAM size {0:#x} is not a power of two of at least 4 bytes")]
    InvalidRamSize(usize),

    #[error("illegal instruction {instr:#010x} at pc {pc:#010x}")]
    IllegalInstruction { pc: WordType, instr: u32 },

    #[error("failed to write memory dump '{}': {source}", path.display())]
    Dump {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}
