//! Table-driven disassembler used for execution traces.
//!
//! Each entry is `(mask, bits, template)`. The first entry whose masked bits
//! match wins, so pseudo-instructions sit before their base forms and the
//! table ends with a catch-all. Template escapes:
//!
//! | code | expands to |
//! |------|------------|
//! | `%1` `%2` `%d` | rs1, rs2, rd register name |
//! | `%i` `%s` `%b` `%j` | I, S, B, J immediate in decimal |
//! | `%B` `%J` | absolute branch/jump target in hex |
//! | `%u` `%U` | U immediate in decimal / hex |
//! | `%x` | shift amount |
//! | `%c` | CSR name, hex address when unnamed |
//! | `%z` | rs1 field as a 5-bit literal |

use std::fmt::Write;

use crate::{
    config::arch_config::{RegisterNaming, SignedWordType, WordType},
    isa::{
        riscv::{csr_reg::csr_name, decoder::fields},
        utils::DecodeMask,
    },
};

struct DisasmEntry {
    pattern: DecodeMask,
    fmt: &'static str,
}

macro_rules! disasm_table {
    ($(($mask:expr, $bits:expr, $fmt:literal)),* $(,)?) => {
        &[$(DisasmEntry { pattern: DecodeMask { key: $bits, mask: $mask }, fmt: $fmt }),*]
    };
}

const R_MASK: u32 = 0xfe00_707f;
const F3_MASK: u32 = 0x0000_707f;
const OP_MASK: u32 = 0x0000_007f;
const FULL: u32 = 0xffff_ffff;

#[rustfmt::skip]
static DISASM_TABLE: &[DisasmEntry] = disasm_table![
    // pseudo-instructions
    (FULL,        0x0000_0013, "nop"),
    (FULL,        0x0000_8067, "ret"),
    (0xfff0_7fff, 0x0000_0067, "jr %1"),
    (0x0000_0fff, 0x0000_006f, "j %J"),
    (0x000f_f07f, 0x0000_0013, "li %d, %i"),
    (0xfff0_707f, 0x0000_0013, "mv %d, %1"),

    (OP_MASK, 0x37, "lui %d, %U"),
    (OP_MASK, 0x17, "auipc %d, %U"),
    (OP_MASK, 0x6f, "jal %d, %J"),
    (F3_MASK, 0x67, "jalr %d, %i(%1)"),

    (F3_MASK, 0x0063, "beq %1, %2, %B"),
    (F3_MASK, 0x1063, "bne %1, %2, %B"),
    (F3_MASK, 0x4063, "blt %1, %2, %B"),
    (F3_MASK, 0x5063, "bge %1, %2, %B"),
    (F3_MASK, 0x6063, "bltu %1, %2, %B"),
    (F3_MASK, 0x7063, "bgeu %1, %2, %B"),

    (F3_MASK, 0x0003, "lb %d, %i(%1)"),
    (F3_MASK, 0x1003, "lh %d, %i(%1)"),
    (F3_MASK, 0x2003, "lw %d, %i(%1)"),
    (F3_MASK, 0x4003, "lbu %d, %i(%1)"),
    (F3_MASK, 0x5003, "lhu %d, %i(%1)"),

    (F3_MASK, 0x0023, "sb %2, %s(%1)"),
    (F3_MASK, 0x1023, "sh %2, %s(%1)"),
    (F3_MASK, 0x2023, "sw %2, %s(%1)"),

    (F3_MASK, 0x0013, "addi %d, %1, %i"),
    (F3_MASK, 0x2013, "slti %d, %1, %i"),
    (F3_MASK, 0x3013, "sltiu %d, %1, %i"),
    (F3_MASK, 0x4013, "xori %d, %1, %i"),
    (F3_MASK, 0x6013, "ori %d, %1, %i"),
    (F3_MASK, 0x7013, "andi %d, %1, %i"),
    (R_MASK,  0x0000_1013, "slli %d, %1, %x"),
    (R_MASK,  0x0000_5013, "srli %d, %1, %x"),
    (R_MASK,  0x4000_5013, "srai %d, %1, %x"),

    (R_MASK, 0x0000_0033, "add %d, %1, %2"),
    (R_MASK, 0x4000_0033, "sub %d, %1, %2"),
    (R_MASK, 0x0000_1033, "sll %d, %1, %2"),
    (R_MASK, 0x0000_2033, "slt %d, %1, %2"),
    (R_MASK, 0x0000_3033, "sltu %d, %1, %2"),
    (R_MASK, 0x0000_4033, "xor %d, %1, %2"),
    (R_MASK, 0x0000_5033, "srl %d, %1, %2"),
    (R_MASK, 0x4000_5033, "sra %d, %1, %2"),
    (R_MASK, 0x0000_6033, "or %d, %1, %2"),
    (R_MASK, 0x0000_7033, "and %d, %1, %2"),

    (R_MASK, 0x0200_0033, "mul %d, %1, %2"),
    (R_MASK, 0x0200_1033, "mulh %d, %1, %2"),
    (R_MASK, 0x0200_2033, "mulhsu %d, %1, %2"),
    (R_MASK, 0x0200_3033, "mulhu %d, %1, %2"),
    (R_MASK, 0x0200_4033, "div %d, %1, %2"),
    (R_MASK, 0x0200_5033, "divu %d, %1, %2"),
    (R_MASK, 0x0200_6033, "rem %d, %1, %2"),
    (R_MASK, 0x0200_7033, "remu %d, %1, %2"),

    (F3_MASK, 0x000f, "fence"),
    (F3_MASK, 0x100f, "fence.i"),

    (FULL, 0x0000_0073, "ecall"),
    (FULL, 0x0010_0073, "ebreak"),
    (FULL, 0x3020_0073, "mret"),
    (F3_MASK, 0x1073, "csrrw %d, %c, %1"),
    (F3_MASK, 0x2073, "csrrs %d, %c, %1"),
    (F3_MASK, 0x3073, "csrrc %d, %c, %1"),
    (F3_MASK, 0x5073, "csrrwi %d, %c, %z"),
    (F3_MASK, 0x6073, "csrrsi %d, %c, %z"),
    (F3_MASK, 0x7073, "csrrci %d, %c, %z"),

    // custom-0 host calls
    (F3_MASK, 0x000b, "_exiti %i"),
    (F3_MASK, 0x100b, "_iocall %i"),
    (F3_MASK, 0x400b, "_exit %1"),

    (0, 0, "unknown"),
];

/// Formats instruction words as assembly text. Holds no machine state, so
/// it can be used outside the run loop as well.
#[derive(Debug, Clone, Copy, Default)]
pub struct Disassembler {
    naming: RegisterNaming,
}

impl Disassembler {
    pub fn new(naming: RegisterNaming) -> Self {
        Self { naming }
    }

    pub fn naming(&self) -> RegisterNaming {
        self.naming
    }

    /// `pc` is only used to resolve branch and jump targets.
    pub fn disassemble(&self, pc: WordType, ins: u32) -> String {
        let fmt = DISASM_TABLE
            .iter()
            .find(|entry| entry.pattern.matches(ins))
            .map_or("unknown", |entry| entry.fmt);

        let mut out = String::with_capacity(fmt.len() + 16);
        let mut chars = fmt.chars();
        while let Some(ch) = chars.next() {
            if ch != '%' {
                out.push(ch);
                continue;
            }

            let Some(code) = chars.next() else { break };
            // Writing into a String cannot fail.
            let _ = match code {
                '1' => write!(out, "{}", self.naming.name(fields::rs1(ins))),
                '2' => write!(out, "{}", self.naming.name(fields::rs2(ins))),
                'd' => write!(out, "{}", self.naming.name(fields::rd(ins))),
                'i' => write!(out, "{}", signed(fields::imm_i(ins))),
                's' => write!(out, "{}", signed(fields::imm_s(ins))),
                'b' => write!(out, "{}", signed(fields::imm_b(ins))),
                'j' => write!(out, "{}", signed(fields::imm_j(ins))),
                'B' => write!(out, "{:#x}", pc.wrapping_add(fields::imm_b(ins))),
                'J' => write!(out, "{:#x}", pc.wrapping_add(fields::imm_j(ins))),
                'u' => write!(out, "{}", signed(fields::imm_u(ins))),
                'U' => write!(out, "{:#x}", fields::imm_u(ins)),
                'x' => write!(out, "{}", fields::shamt(ins)),
                'z' => write!(out, "{}", fields::rs1(ins)),
                'c' => {
                    let addr = fields::csr(ins);
                    match csr_name(addr) {
                        Some(name) => write!(out, "{}", name),
                        None => write!(out, "{:#x}", addr),
                    }
                }
                other => write!(out, "%{}", other),
            };
        }

        out
    }
}

#[inline]
fn signed(imm: WordType) -> SignedWordType {
    imm as SignedWordType
}
