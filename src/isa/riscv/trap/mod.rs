use num_enum::{IntoPrimitive, TryFromPrimitive};

use crate::config::arch_config::WordType;

pub mod trap_controller;

/// Synchronous exception causes this hart can raise, numbered as `mcause`
/// reports them.
#[repr(u32)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, IntoPrimitive, TryFromPrimitive)]
pub enum Exception {
    InstructionMisaligned = 0,
    IllegalInstruction = 2,
    Breakpoint = 3,
    LoadMisaligned = 4,
    StoreMisaligned = 6,
    MachineEnvCall = 11,
}

/// A raised trap: the cause plus the value destined for `mtval`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Trap {
    pub cause: Exception,
    pub value: WordType,
}

impl Trap {
    pub fn new(cause: Exception, value: WordType) -> Self {
        Self { cause, value }
    }

    /// `mtval` carries the offending instruction word.
    pub fn illegal(raw_instr: u32) -> Self {
        Self::new(Exception::IllegalInstruction, raw_instr)
    }

    pub fn cause_code(&self) -> WordType {
        self.cause.into()
    }
}
