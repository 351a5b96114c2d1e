pub(super) mod exec_function;
pub mod exec_mapping;
pub mod instr_table;

use crate::{
    config::arch_config::WordType,
    isa::riscv::{executor::RV32CPU, trap::Trap},
};

/// A helper function for normal instruction execution.
///
/// It takes a closure `f` that performs the actual instruction logic.
/// If `f` executes successfully, it will increase PC by 4.
#[inline(always)]
pub(super) fn normal_exec<F>(cpu: &mut RV32CPU, f: F) -> Result<(), Trap>
where
    F: FnOnce(&mut RV32CPU) -> Result<(), Trap>,
{
    f(cpu)?;
    cpu.pc = cpu.pc.wrapping_add(4);
    Ok(())
}

pub(super) type ExecFn = fn(RVInstrInfo, &mut RV32CPU) -> Result<(), Trap>;

/// Operands of a decoded instruction.
///
/// Immediates are already sign extended to a full word; B and J offsets keep
/// their implicit zero bit, U keeps its low 12 zero bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RVInstrInfo {
    None,
    R { rs1: u8, rs2: u8, rd: u8 },
    I { rs1: u8, rd: u8, imm: WordType },
    S { rs1: u8, rs2: u8, imm: WordType },
    B { rs1: u8, rs2: u8, imm: WordType },
    U { rd: u8, imm: WordType },
    J { rd: u8, imm: WordType },
    /// `rs1` doubles as the 5-bit literal of the immediate forms.
    Csr { rs1: u8, rd: u8, csr: u16 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstrFormat {
    None,
    R,
    I,
    S,
    B,
    U,
    J,
    Csr,
}

// define a single enum for every instruction
// define tables for each instruction set
#[macro_export]
macro_rules! define_riscv_isa {
    ( $tot_instr_name:ident,
        $( $isa_name:ident, $isa_table_name:ident, {$(
                $name:ident {
                    opcode: $opcode:literal,
                    funct3: $funct3:literal,
                    funct7: $funct7:literal,
                    format: $fmt:expr,
                    mask: $mask:literal,
                    key: $key:literal,
                    use_mask: $use_mask:literal,
                }),* $(,)?
            }
        ),* $(,)?
    ) => {

        $crate::define_instr_enum!($tot_instr_name, $($($name,)*)*);

        impl $tot_instr_name {
            pub fn isa_name(&self) -> &'static str {
                match self {
                    $(
                        $(
                            $tot_instr_name::$name => stringify!($isa_name),
                        )*
                    )*
                }
            }
        }

        #[derive(Debug, Clone)]
        pub struct RVInstrDesc {
            pub opcode: u8,
            pub funct3: u8,
            pub funct7: u8,
            pub instr: $tot_instr_name,
            pub format: InstrFormat,
            pub mask: u32,
            pub key: u32,
            pub use_mask: bool,
        }

        $(
            pub const $isa_table_name: &[RVInstrDesc] = &[
                $(
                    RVInstrDesc {
                        opcode: $opcode,
                        funct3: $funct3,
                        funct7: $funct7,
                        instr: $tot_instr_name::$name,
                        format: $fmt,
                        mask: $mask,
                        key: $key,
                        use_mask: $use_mask,
                    }
                ),*
            ];
        )*
    };
}
