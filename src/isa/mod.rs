pub mod riscv;

pub mod utils;

pub trait DecoderTrait<Desc, Decoded> {
    fn from_isa(instrs: &[Desc]) -> Self;
    fn decode(&self, instr: u32) -> Option<Decoded>;
}
