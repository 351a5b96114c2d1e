use std::marker::PhantomData;

use crate::{
    config::arch_config::{SignedWordType, WordType},
    device::Mem,
    isa::riscv::{
        executor::RV32CPU,
        instruction::{RVInstrInfo, normal_exec},
        trap::{Exception, Trap},
    },
    utils::{TruncateFrom, UnsignedInteger, check_align},
};

/// ExecTrait will generate operation result to `exec_xxx` function.
/// ExecTrait::exec only do calculate.
/// `exec_xxx` function interact with other mod in CPU.
pub(super) trait ExecTrait<T> {
    fn exec(a: WordType, b: WordType) -> T;
}

/// Write `rd` and trace the write-back.
#[inline]
pub(super) fn write_back(cpu: &mut RV32CPU, rd: u8, value: WordType) {
    if rd != 0 && log::log_enabled!(log::Level::Trace) {
        log::trace!("          ({} = {:08x})", cpu.disassembler.naming().name(rd), value);
    }
    cpu.reg_file.write(rd, value);
}

/// Jump to `target` unless it breaks 4-byte alignment, in which case nothing
/// changes and the target is reported in `mtval`.
#[inline]
fn checked_jump_target(target: WordType) -> Result<WordType, Trap> {
    if target & 0x3 != 0 {
        return Err(Trap::new(Exception::InstructionMisaligned, target));
    }
    Ok(target)
}

/// Register-register or register-immediate ALU operation.
pub(super) fn exec_arith<F>(info: RVInstrInfo, cpu: &mut RV32CPU) -> Result<(), Trap>
where
    F: ExecTrait<WordType>,
{
    normal_exec(cpu, |cpu| {
        let (rd, rst) = match info {
            RVInstrInfo::R { rs1, rs2, rd } => {
                let (val1, val2) = cpu.reg_file.read(rs1, rs2);
                (rd, F::exec(val1, val2))
            }
            RVInstrInfo::I { rs1, rd, imm } => {
                let val1 = cpu.reg_file.read(rs1, 0).0;
                (rd, F::exec(val1, imm))
            }
            _ => std::unreachable!(),
        };

        write_back(cpu, rd, rst);
        Ok(())
    })
}

pub(super) fn exec_branch<F>(info: RVInstrInfo, cpu: &mut RV32CPU) -> Result<(), Trap>
where
    F: ExecTrait<bool>,
{
    if let RVInstrInfo::B { rs1, rs2, imm } = info {
        let (val1, val2) = cpu.reg_file.read(rs1, rs2);

        if F::exec(val1, val2) {
            cpu.pc = checked_jump_target(cpu.pc.wrapping_add(imm))?;
        } else {
            cpu.pc = cpu.pc.wrapping_add(4);
        }
    } else {
        std::unreachable!();
    }

    Ok(())
}

pub(super) fn exec_load<T, const EXTEND: bool>(
    info: RVInstrInfo,
    cpu: &mut RV32CPU,
) -> Result<(), Trap>
where
    T: UnsignedInteger,
{
    normal_exec(cpu, |cpu| {
        if let RVInstrInfo::I { rs1, rd, imm } = info {
            let addr = cpu.reg_file.read(rs1, 0).0.wrapping_add(imm);
            if !check_align::<T>(addr) {
                return Err(Trap::new(Exception::LoadMisaligned, addr));
            }

            let mut data: WordType = cpu.memory.read::<T>(addr).into();
            if EXTEND {
                let shift = WordType::BITS - (T::BYTES as u32) * 8;
                data = (((data << shift) as SignedWordType) >> shift) as WordType;
            }
            write_back(cpu, rd, data);
        } else {
            std::unreachable!();
        }
        Ok(())
    })
}

pub(super) fn exec_store<T>(info: RVInstrInfo, cpu: &mut RV32CPU) -> Result<(), Trap>
where
    T: UnsignedInteger,
{
    normal_exec(cpu, |cpu| {
        if let RVInstrInfo::S { rs1, rs2, imm } = info {
            let (val1, val2) = cpu.reg_file.read(rs1, rs2);
            let addr = val1.wrapping_add(imm);
            if !check_align::<T>(addr) {
                return Err(Trap::new(Exception::StoreMisaligned, addr));
            }

            let data = T::truncate_from(val2);
            log::trace!("          ([{:08x}] = {:08x})", addr, data);
            cpu.memory.write(addr, data);
        } else {
            std::unreachable!();
        }
        Ok(())
    })
}

pub(super) fn exec_jal(info: RVInstrInfo, cpu: &mut RV32CPU) -> Result<(), Trap> {
    if let RVInstrInfo::J { rd, imm } = info {
        let target = checked_jump_target(cpu.pc.wrapping_add(imm))?;
        let link = cpu.pc.wrapping_add(4);
        write_back(cpu, rd, link);
        cpu.pc = target;
    } else {
        std::unreachable!();
    }
    Ok(())
}

pub(super) fn exec_jalr(info: RVInstrInfo, cpu: &mut RV32CPU) -> Result<(), Trap> {
    if let RVInstrInfo::I { rs1, rd, imm } = info {
        // Target first: `rd` may alias `rs1`.
        let val = cpu.reg_file.read(rs1, 0).0;
        let target = checked_jump_target(val.wrapping_add(imm) & !1)?;
        let link = cpu.pc.wrapping_add(4);
        write_back(cpu, rd, link);
        cpu.pc = target;
    } else {
        std::unreachable!();
    }
    Ok(())
}

pub(super) fn exec_lui(info: RVInstrInfo, cpu: &mut RV32CPU) -> Result<(), Trap> {
    normal_exec(cpu, |cpu| {
        if let RVInstrInfo::U { rd, imm } = info {
            write_back(cpu, rd, imm);
        }
        Ok(())
    })
}

pub(super) fn exec_auipc(info: RVInstrInfo, cpu: &mut RV32CPU) -> Result<(), Trap> {
    normal_exec(cpu, |cpu| {
        if let RVInstrInfo::U { rd, imm } = info {
            let value = cpu.pc.wrapping_add(imm);
            write_back(cpu, rd, value);
        }
        Ok(())
    })
}

/// CSRRW/CSRRWI: the old value is only read when `rd != x0`.
pub(super) fn exec_csrw<const UIMM: bool>(
    info: RVInstrInfo,
    cpu: &mut RV32CPU,
) -> Result<(), Trap> {
    normal_exec(cpu, |cpu| {
        if let RVInstrInfo::Csr { rs1, rd, csr } = info {
            let new_val = if UIMM {
                rs1 as WordType
            } else {
                cpu.reg_file.read(rs1, rs1).0
            };

            if rd != 0 {
                let value = cpu.csr.read(csr);
                write_back(cpu, rd, value);
            }

            cpu.csr.write(csr, new_val);
        }
        Ok(())
    })
}

/// CSRRS/CSRRC and immediates: always read, write only for a nonzero mask.
pub(super) fn exec_csr_bit<const SET: bool, const UIMM: bool>(
    info: RVInstrInfo,
    cpu: &mut RV32CPU,
) -> Result<(), Trap> {
    normal_exec(cpu, |cpu| {
        if let RVInstrInfo::Csr { rs1, rd, csr } = info {
            let rhs = if UIMM {
                rs1 as WordType
            } else {
                cpu.reg_file.read(rs1, rs1).0
            };

            let value = cpu.csr.read(csr);
            if rhs != 0 {
                let data = if SET { value | rhs } else { value & !rhs };
                cpu.csr.write(csr, data);
            }

            write_back(cpu, rd, value);
        }
        Ok(())
    })
}

pub(super) fn exec_nop(_info: RVInstrInfo, cpu: &mut RV32CPU) -> Result<(), Trap> {
    cpu.pc = cpu.pc.wrapping_add(4);
    Ok(())
}

// =============================================
//                  ExecTrait
// =============================================
// Arith
pub(super) struct ExecAdd {}
impl ExecTrait<WordType> for ExecAdd {
    fn exec(a: WordType, b: WordType) -> WordType {
        a.wrapping_add(b)
    }
}

pub(super) struct ExecSub {}
impl ExecTrait<WordType> for ExecSub {
    fn exec(a: WordType, b: WordType) -> WordType {
        a.wrapping_sub(b)
    }
}

pub(super) struct ExecMulLow {}
impl ExecTrait<WordType> for ExecMulLow {
    fn exec(a: WordType, b: WordType) -> WordType {
        a.wrapping_mul(b)
    }
}

/// High half of the 64-bit product, the operand signedness picked by `S`.
pub(super) struct ExecMulHigh<S> {
    phantom: PhantomData<S>,
}

pub(super) struct SignedSigned;
pub(super) struct SignedUnsigned;
pub(super) struct UnsignedUnsigned;

impl ExecTrait<WordType> for ExecMulHigh<SignedSigned> {
    fn exec(a: WordType, b: WordType) -> WordType {
        let a = a.cast_signed() as i64;
        let b = b.cast_signed() as i64;
        (a.wrapping_mul(b) >> 32) as WordType
    }
}

impl ExecTrait<WordType> for ExecMulHigh<SignedUnsigned> {
    fn exec(a: WordType, b: WordType) -> WordType {
        let a = a.cast_signed() as i64;
        let b = b as i64;
        (a.wrapping_mul(b) >> 32) as WordType
    }
}

impl ExecTrait<WordType> for ExecMulHigh<UnsignedUnsigned> {
    fn exec(a: WordType, b: WordType) -> WordType {
        let a = a as u64;
        let b = b as u64;
        (a.wrapping_mul(b) >> 32) as WordType
    }
}

// Division by zero and `MIN / -1` never trap: all ones / the dividend, and
// `wrapping_*` already yields `MIN` and 0 for the overflow case.
pub(super) struct ExecDivSigned {}
impl ExecTrait<WordType> for ExecDivSigned {
    fn exec(a: WordType, b: WordType) -> WordType {
        if b == 0 {
            return WordType::MAX;
        }
        a.cast_signed().wrapping_div(b.cast_signed()) as WordType
    }
}

pub(super) struct ExecDivUnsigned {}
impl ExecTrait<WordType> for ExecDivUnsigned {
    fn exec(a: WordType, b: WordType) -> WordType {
        if b == 0 {
            return WordType::MAX;
        }
        a / b
    }
}

pub(super) struct ExecRemSigned {}
impl ExecTrait<WordType> for ExecRemSigned {
    fn exec(a: WordType, b: WordType) -> WordType {
        if b == 0 {
            return a;
        }
        a.cast_signed().wrapping_rem(b.cast_signed()) as WordType
    }
}

pub(super) struct ExecRemUnsigned {}
impl ExecTrait<WordType> for ExecRemUnsigned {
    fn exec(a: WordType, b: WordType) -> WordType {
        if b == 0 {
            return a;
        }
        a % b
    }
}

// Shift amounts only use their low 5 bits.
pub(super) struct ExecSLL {}
impl ExecTrait<WordType> for ExecSLL {
    fn exec(a: WordType, b: WordType) -> WordType {
        a.wrapping_shl(b)
    }
}

pub(super) struct ExecSRL {}
impl ExecTrait<WordType> for ExecSRL {
    fn exec(a: WordType, b: WordType) -> WordType {
        a.wrapping_shr(b)
    }
}

pub(super) struct ExecSRA {}
impl ExecTrait<WordType> for ExecSRA {
    fn exec(a: WordType, b: WordType) -> WordType {
        a.cast_signed().wrapping_shr(b).cast_unsigned()
    }
}

// Bit
pub(super) struct ExecAnd {}
impl ExecTrait<WordType> for ExecAnd {
    fn exec(a: WordType, b: WordType) -> WordType {
        a & b
    }
}

pub(super) struct ExecOr {}
impl ExecTrait<WordType> for ExecOr {
    fn exec(a: WordType, b: WordType) -> WordType {
        a | b
    }
}

pub(super) struct ExecXor {}
impl ExecTrait<WordType> for ExecXor {
    fn exec(a: WordType, b: WordType) -> WordType {
        a ^ b
    }
}

// Compare
pub(super) struct ExecSignedLess {}
impl ExecTrait<bool> for ExecSignedLess {
    fn exec(a: WordType, b: WordType) -> bool {
        a.cast_signed() < b.cast_signed()
    }
}
impl ExecTrait<WordType> for ExecSignedLess {
    fn exec(a: WordType, b: WordType) -> WordType {
        (a.cast_signed() < b.cast_signed()) as WordType
    }
}

pub(super) struct ExecUnsignedLess {}
impl ExecTrait<bool> for ExecUnsignedLess {
    fn exec(a: WordType, b: WordType) -> bool {
        a < b
    }
}
impl ExecTrait<WordType> for ExecUnsignedLess {
    fn exec(a: WordType, b: WordType) -> WordType {
        (a < b) as WordType
    }
}

pub(super) struct ExecEqual {}
impl ExecTrait<bool> for ExecEqual {
    fn exec(a: WordType, b: WordType) -> bool {
        a == b
    }
}

pub(super) struct ExecNotEqual {}
impl ExecTrait<bool> for ExecNotEqual {
    fn exec(a: WordType, b: WordType) -> bool {
        a != b
    }
}

pub(super) struct ExecSignedGreatEqual {}
impl ExecTrait<bool> for ExecSignedGreatEqual {
    fn exec(a: WordType, b: WordType) -> bool {
        a.cast_signed() >= b.cast_signed()
    }
}

pub(super) struct ExecUnsignedGreatEqual {}
impl ExecTrait<bool> for ExecUnsignedGreatEqual {
    fn exec(a: WordType, b: WordType) -> bool {
        a >= b
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_div_rem_special_cases() {
        let min = i32::MIN as WordType;
        let neg1 = WordType::MAX;

        assert_eq!(ExecDivSigned::exec(min, neg1), min);
        assert_eq!(ExecRemSigned::exec(min, neg1), 0);

        for x in [0, 1, 7, min, neg1, 0x1234_5678] {
            assert_eq!(ExecDivSigned::exec(x, 0), WordType::MAX);
            assert_eq!(ExecDivUnsigned::exec(x, 0), WordType::MAX);
            assert_eq!(ExecRemSigned::exec(x, 0), x);
            assert_eq!(ExecRemUnsigned::exec(x, 0), x);
        }

        assert_eq!(ExecDivSigned::exec((-7i32) as WordType, 2), (-3i32) as WordType);
        assert_eq!(ExecRemSigned::exec((-7i32) as WordType, 2), (-1i32) as WordType);
        assert_eq!(ExecDivUnsigned::exec(neg1, 2), 0x7fff_ffff);
    }

    #[test]
    fn test_mul_high() {
        let neg1 = WordType::MAX;
        assert_eq!(ExecMulHigh::<SignedSigned>::exec(neg1, neg1), 0);
        assert_eq!(ExecMulHigh::<UnsignedUnsigned>::exec(neg1, neg1), 0xffff_fffe);
        assert_eq!(ExecMulHigh::<SignedUnsigned>::exec(neg1, neg1), neg1);
        assert_eq!(ExecMulHigh::<SignedUnsigned>::exec(2, 0x8000_0000), 1);
        assert_eq!(
            ExecMulHigh::<SignedSigned>::exec(0x8000_0000, 0x8000_0000),
            0x4000_0000
        );
    }

    #[test]
    fn test_shift_amount_masked() {
        assert_eq!(ExecSLL::exec(1, 33), 2);
        assert_eq!(ExecSRL::exec(0x8000_0000, 0xffff_ffe1), 0x4000_0000);
        assert_eq!(ExecSRA::exec(0x8000_0000, 32 + 4), 0xf800_0000);
        assert_eq!(ExecSRA::exec(0x4000_0000, 1), 0x2000_0000);
    }

    #[test]
    fn test_compare() {
        let neg1 = WordType::MAX;
        assert_eq!(<ExecSignedLess as ExecTrait<WordType>>::exec(neg1, 0), 1);
        assert_eq!(<ExecUnsignedLess as ExecTrait<WordType>>::exec(neg1, 0), 0);
        assert!(<ExecSignedGreatEqual as ExecTrait<bool>>::exec(0, neg1));
        assert!(!<ExecUnsignedGreatEqual as ExecTrait<bool>>::exec(0, neg1));
    }
}
