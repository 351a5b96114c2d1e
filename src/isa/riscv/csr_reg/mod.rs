use phf::phf_map;

use crate::config::{arch_config::WordType, ram_config};

pub type CsrAddr = u16;

#[rustfmt::skip]
#[allow(non_upper_case_globals, unused)]
pub(crate) mod csr_index {
    use super::CsrAddr;

    pub const misa      : CsrAddr = 0x301;  // RV32 + I + M, read only
    pub const mtvec     : CsrAddr = 0x305;  // trap vector, low 2 bits always clear
    pub const mscratch  : CsrAddr = 0x340;
    pub const mepc      : CsrAddr = 0x341;  // address of the trapping instruction
    pub const mcause    : CsrAddr = 0x342;
    pub const mtval     : CsrAddr = 0x343;  // faulting address or instruction word

    pub const mcycle    : CsrAddr = 0xB00;
    pub const minstret  : CsrAddr = 0xB02;
    pub const mcycleh   : CsrAddr = 0xB80;
    pub const minstreth : CsrAddr = 0xB82;
    pub const cycle     : CsrAddr = 0xC00;
    pub const instret   : CsrAddr = 0xC02;
    pub const cycleh    : CsrAddr = 0xC80;
    pub const instreth  : CsrAddr = 0xC82;

    pub const mvendorid : CsrAddr = 0xF11;
    pub const marchid   : CsrAddr = 0xF12;
    pub const mimpid    : CsrAddr = 0xF13;
    pub const mhartid   : CsrAddr = 0xF14;
}

/// MXL = 1 (32 bit), extensions I and M.
pub const MISA_VALUE: WordType = 0x4000_1100;

macro_rules! gen_csr_address_hashmap {
    ($(($name: literal, $addr: literal)),* $(,)? ) => {
        pub const CSR_ADDRESS: phf::Map<&'static str, CsrAddr> = phf_map! {
            $(
                $name => $addr
            ),*
        };

        pub const CSR_NAME: phf::Map<CsrAddr, &'static str> = phf_map! {
            $(
                $addr => $name
            ),*
        };
    };
}

gen_csr_address_hashmap!(
    ("misa", 0x301u16),
    ("mtvec", 0x305u16),
    ("mscratch", 0x340u16),
    ("mepc", 0x341u16),
    ("mcause", 0x342u16),
    ("mtval", 0x343u16),
    ("mcycle", 0xB00u16),
    ("minstret", 0xB02u16),
    ("mcycleh", 0xB80u16),
    ("minstreth", 0xB82u16),
    ("cycle", 0xC00u16),
    ("instret", 0xC02u16),
    ("cycleh", 0xC80u16),
    ("instreth", 0xC82u16),
    ("mvendorid", 0xF11u16),
    ("marchid", 0xF12u16),
    ("mimpid", 0xF13u16),
    ("mhartid", 0xF14u16),
);

pub fn csr_name(addr: CsrAddr) -> Option<&'static str> {
    CSR_NAME.get(&addr).copied()
}

/// Machine-mode CSR state of the hart.
///
/// Only the trap registers and `mscratch` hold data. Identity registers are
/// constants, the counters mirror the retired-instruction count, and every
/// other address reads 0 and drops writes.
#[derive(Debug)]
pub struct CsrRegFile {
    mtvec: WordType,
    mscratch: WordType,
    mepc: WordType,
    mcause: WordType,
    mtval: WordType,

    instret: u64,
}

impl Default for CsrRegFile {
    fn default() -> Self {
        Self::new()
    }
}

impl CsrRegFile {
    /// `mtvec` starts at the RAM base so a trap taken before a handler is
    /// installed still lands in fetchable memory.
    pub fn new() -> Self {
        Self {
            mtvec: ram_config::BASE_ADDR,
            mscratch: 0,
            mepc: 0,
            mcause: 0,
            mtval: 0,
            instret: 0,
        }
    }

    pub fn read(&self, addr: CsrAddr) -> WordType {
        match addr {
            csr_index::mtvec => self.mtvec,
            csr_index::mscratch => self.mscratch,
            csr_index::mepc => self.mepc,
            csr_index::mcause => self.mcause,
            csr_index::mtval => self.mtval,

            csr_index::misa => MISA_VALUE,
            csr_index::mvendorid
            | csr_index::marchid
            | csr_index::mimpid
            | csr_index::mhartid => 0,

            csr_index::mcycle | csr_index::minstret | csr_index::cycle | csr_index::instret => {
                self.instret as WordType
            }
            csr_index::mcycleh
            | csr_index::minstreth
            | csr_index::cycleh
            | csr_index::instreth => (self.instret >> 32) as WordType,

            _ => 0,
        }
    }

    pub fn write(&mut self, addr: CsrAddr, value: WordType) {
        match addr {
            csr_index::mtvec => self.mtvec = value & !3,
            csr_index::mscratch => self.mscratch = value,
            csr_index::mepc => self.mepc = value,
            csr_index::mcause => self.mcause = value,
            csr_index::mtval => self.mtval = value,
            _ => log::trace!("write {value:#x} to read-only or absent csr {addr:#x} dropped"),
        }
    }

    /// Trap handler base, already aligned.
    pub fn trap_vector(&self) -> WordType {
        self.mtvec & !3
    }

    pub fn instret(&self) -> u64 {
        self.instret
    }

    pub(in crate::isa::riscv) fn retire(&mut self) {
        self.instret = self.instret.wrapping_add(1);
    }
}
