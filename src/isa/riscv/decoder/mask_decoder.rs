use crate::isa::{
    DecoderTrait,
    riscv::{
        decoder::{DecodeInstr, decode_info},
        instruction::{
            InstrFormat,
            instr_table::{RVInstrDesc, RiscvInstr},
        },
    },
    utils::DecodeMask,
};

/// Exact-pattern instructions: system calls, `mret`, and the immediate
/// shifts whose upper immediate bits are part of the encoding.
pub(super) struct MaskDecoder {
    masks: Vec<(DecodeMask, RiscvInstr, InstrFormat)>,
}

impl DecoderTrait<RVInstrDesc, DecodeInstr> for MaskDecoder {
    fn decode(&self, raw_instr: u32) -> Option<DecodeInstr> {
        self.masks
            .iter()
            .find(|(mask, _, _)| mask.matches(raw_instr))
            .map(|(_, instr, fmt)| DecodeInstr(*instr, decode_info(raw_instr, *instr, *fmt)))
    }

    fn from_isa(instrs: &[RVInstrDesc]) -> Self {
        let masks = instrs
            .iter()
            .filter(|desc| desc.use_mask)
            .map(|desc| {
                (
                    DecodeMask {
                        mask: desc.mask,
                        key: desc.key,
                    },
                    desc.instr,
                    desc.format,
                )
            })
            .collect();

        Self { masks }
    }
}
