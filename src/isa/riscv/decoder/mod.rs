use std::fmt::Display;

use crate::isa::{
    DecoderTrait,
    riscv::instruction::{
        InstrFormat, RVInstrInfo,
        instr_table::{
            RVInstrDesc, RiscvInstr, TABLE_RV32I, TABLE_RV32M, TABLE_RVHOST, TABLE_RVSYSTEM,
            TABLE_RVZICSR,
        },
    },
    utils::ISABuilder,
};

pub mod fields;
mod funct_decoder;
mod mask_decoder;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeInstr(pub RiscvInstr, pub RVInstrInfo);

impl Display for DecodeInstr {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{} [{}] {:?}", self.0.name(), self.0.isa_name(), self.1)
    }
}

/// Turns raw words into `(instruction, operands)`. `None` means the word is
/// not an instruction this hart implements and must trap as illegal.
pub struct Decoder {
    funct3_decoder: funct_decoder::Decoder,
    mask_decoder: mask_decoder::MaskDecoder,
}

impl Decoder {
    pub fn new() -> Self {
        let isa = ISABuilder::new()
            .add(TABLE_RV32I)
            .add(TABLE_RV32M)
            .add(TABLE_RVZICSR)
            .add(TABLE_RVSYSTEM)
            .add(TABLE_RVHOST)
            .build();
        Self::from_isa(&isa)
    }
}

impl Default for Decoder {
    fn default() -> Self {
        Self::new()
    }
}

impl DecoderTrait<RVInstrDesc, DecodeInstr> for Decoder {
    fn from_isa(instrs: &[RVInstrDesc]) -> Self {
        Self {
            funct3_decoder: funct_decoder::Decoder::from_isa(instrs),
            mask_decoder: mask_decoder::MaskDecoder::from_isa(instrs),
        }
    }

    fn decode(&self, instr: u32) -> Option<DecodeInstr> {
        self.mask_decoder
            .decode(instr)
            .or_else(|| self.funct3_decoder.decode(instr))
    }
}

fn decode_info(raw_instr: u32, instr: RiscvInstr, fmt: InstrFormat) -> RVInstrInfo {
    let rd = fields::rd(raw_instr);
    let rs1 = fields::rs1(raw_instr);
    let rs2 = fields::rs2(raw_instr);

    match fmt {
        InstrFormat::R => RVInstrInfo::R { rd, rs1, rs2 },
        InstrFormat::I => {
            let imm = match instr {
                RiscvInstr::SLLI | RiscvInstr::SRLI | RiscvInstr::SRAI => {
                    fields::shamt(raw_instr) as u32
                }
                _ => fields::imm_i(raw_instr),
            };
            RVInstrInfo::I { rd, rs1, imm }
        }
        InstrFormat::S => RVInstrInfo::S {
            rs1,
            rs2,
            imm: fields::imm_s(raw_instr),
        },
        InstrFormat::B => RVInstrInfo::B {
            rs1,
            rs2,
            imm: fields::imm_b(raw_instr),
        },
        InstrFormat::U => RVInstrInfo::U {
            rd,
            imm: fields::imm_u(raw_instr),
        },
        InstrFormat::J => RVInstrInfo::J {
            rd,
            imm: fields::imm_j(raw_instr),
        },
        InstrFormat::Csr => RVInstrInfo::Csr {
            rd,
            rs1,
            csr: fields::csr(raw_instr),
        },
        InstrFormat::None => RVInstrInfo::None,
    }
}
