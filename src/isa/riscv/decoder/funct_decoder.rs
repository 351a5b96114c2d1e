use smallvec::SmallVec;

use crate::isa::{
    DecoderTrait,
    riscv::{
        decoder::{DecodeInstr, decode_info},
        instruction::{
            InstrFormat,
            instr_table::{RVInstrDesc, RiscvInstr},
        },
    },
};

/// How much of the word beyond the opcode selects the instruction.
#[derive(Debug, Clone)]
enum PartialDecode {
    Unknown,
    Complete,
    RequireF3,
    RequireF7,
}

const MAP_LENGTH: usize = 8;

#[derive(Debug, Clone)]
pub struct SmallMap<K, V> {
    data: SmallVec<[(K, V); MAP_LENGTH]>,
}

impl<K: Eq + Copy, V> SmallMap<K, V> {
    pub fn new() -> Self {
        SmallMap {
            data: SmallVec::new(),
        }
    }

    pub fn insert(&mut self, key: K, value: V) {
        self.data.push((key, value));
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        self.data.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn first(&self) -> Option<&V> {
        self.data.first().map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }
}

pub(super) struct Decoder {
    decode_table: Vec<(PartialDecode, SmallMap<u32, (RiscvInstr, InstrFormat)>)>,
}

#[inline]
fn opcode_f3_f7(opcode: u8, f3: u8, f7: u8) -> u32 {
    (opcode as u32) + ((f3 as u32) << 7) + ((f7 as u32) << 10)
}

impl DecoderTrait<RVInstrDesc, DecodeInstr> for Decoder {
    fn from_isa(instrs: &[RVInstrDesc]) -> Self {
        let mut decode_table = vec![(PartialDecode::Unknown, SmallMap::new()); 1 << 7];

        for desc in instrs {
            if desc.use_mask {
                continue;
            }

            let RVInstrDesc {
                opcode,
                funct3,
                funct7,
                instr,
                format,
                ..
            } = desc.clone();

            let (partial, map) = &mut decode_table[opcode as usize];
            match format {
                InstrFormat::R => {
                    *partial = PartialDecode::RequireF7;
                    map.insert(opcode_f3_f7(opcode, funct3, funct7), (instr, format));
                }

                InstrFormat::I | InstrFormat::S | InstrFormat::B | InstrFormat::Csr => {
                    *partial = PartialDecode::RequireF3;
                    map.insert(opcode_f3_f7(opcode, funct3, 0), (instr, format));
                }

                InstrFormat::U | InstrFormat::J | InstrFormat::None => {
                    *partial = PartialDecode::Complete;
                    map.insert(opcode_f3_f7(opcode, 0, 0), (instr, format));
                }
            }
        }

        log::debug!(
            "funct_decoder has {} instructions.",
            decode_table.iter().map(|(_, map)| map.len()).sum::<usize>()
        );

        Decoder { decode_table }
    }

    fn decode(&self, instr: u32) -> Option<DecodeInstr> {
        let opcode = (instr & 0b1111111) as u8;
        let funct3 = ((instr >> 12) & 0b111) as u8;
        let funct7 = (instr >> 25) as u8;

        let (partial, map) = &self.decode_table[opcode as usize];

        let (instr_kind, fmt) = *match partial {
            PartialDecode::Complete => map.first()?,
            PartialDecode::RequireF3 => map.get(&opcode_f3_f7(opcode, funct3, 0))?,
            PartialDecode::RequireF7 => map.get(&opcode_f3_f7(opcode, funct3, funct7))?,
            PartialDecode::Unknown => return None,
        };

        Some(DecodeInstr(instr_kind, decode_info(instr, instr_kind, fmt)))
    }
}
