use crate::{
    config::arch_config::WordType,
    isa::riscv::{
        executor::{CpuStatus, RV32CPU},
        instruction::{
            ExecFn, RVInstrInfo, exec_function::*, instr_table::RiscvInstr, normal_exec,
        },
        trap::{Exception, Trap, trap_controller::TrapController},
    },
};

/// First argument register of the host call window (`a0`).
const IOCALL_ARG_BASE: u8 = 10;

pub(in crate::isa::riscv) fn get_exec_func(instr: RiscvInstr) -> ExecFn {
    match instr {
        //---------------------------------------
        // RV_I
        //---------------------------------------

        // Arith
        RiscvInstr::ADD | RiscvInstr::ADDI => exec_arith::<ExecAdd>,
        RiscvInstr::SUB => exec_arith::<ExecSub>,

        // Shift
        RiscvInstr::SLL | RiscvInstr::SLLI => exec_arith::<ExecSLL>,
        RiscvInstr::SRL | RiscvInstr::SRLI => exec_arith::<ExecSRL>,
        RiscvInstr::SRA | RiscvInstr::SRAI => exec_arith::<ExecSRA>,

        // Cond set
        RiscvInstr::SLT | RiscvInstr::SLTI => exec_arith::<ExecSignedLess>,
        RiscvInstr::SLTU | RiscvInstr::SLTIU => exec_arith::<ExecUnsignedLess>,

        // Bit
        RiscvInstr::AND | RiscvInstr::ANDI => exec_arith::<ExecAnd>,
        RiscvInstr::OR | RiscvInstr::ORI => exec_arith::<ExecOr>,
        RiscvInstr::XOR | RiscvInstr::XORI => exec_arith::<ExecXor>,

        // Branch
        RiscvInstr::BEQ => exec_branch::<ExecEqual>,
        RiscvInstr::BNE => exec_branch::<ExecNotEqual>,
        RiscvInstr::BLT => exec_branch::<ExecSignedLess>,
        RiscvInstr::BGE => exec_branch::<ExecSignedGreatEqual>,
        RiscvInstr::BLTU => exec_branch::<ExecUnsignedLess>,
        RiscvInstr::BGEU => exec_branch::<ExecUnsignedGreatEqual>,

        // Load
        RiscvInstr::LB => exec_load::<u8, true>,
        RiscvInstr::LBU => exec_load::<u8, false>,
        RiscvInstr::LH => exec_load::<u16, true>,
        RiscvInstr::LHU => exec_load::<u16, false>,
        RiscvInstr::LW => exec_load::<u32, false>,

        // Store
        RiscvInstr::SB => exec_store::<u8>,
        RiscvInstr::SH => exec_store::<u16>,
        RiscvInstr::SW => exec_store::<u32>,

        // Jump and link
        RiscvInstr::JAL => exec_jal,
        RiscvInstr::JALR => exec_jalr,

        RiscvInstr::LUI => exec_lui,
        RiscvInstr::AUIPC => exec_auipc,

        // Single hart, in-order, no caches: nothing to order or flush.
        RiscvInstr::FENCE | RiscvInstr::FENCE_I => exec_nop,

        RiscvInstr::ECALL => |_info, _cpu| Err(Trap::new(Exception::MachineEnvCall, 0)),
        RiscvInstr::EBREAK => |_info, _cpu| Err(Trap::new(Exception::Breakpoint, 0)),

        //---------------------------------------
        // RV_M
        //---------------------------------------
        RiscvInstr::MUL => exec_arith::<ExecMulLow>,
        RiscvInstr::MULH => exec_arith::<ExecMulHigh<SignedSigned>>,
        RiscvInstr::MULHSU => exec_arith::<ExecMulHigh<SignedUnsigned>>,
        RiscvInstr::MULHU => exec_arith::<ExecMulHigh<UnsignedUnsigned>>,
        RiscvInstr::DIV => exec_arith::<ExecDivSigned>,
        RiscvInstr::DIVU => exec_arith::<ExecDivUnsigned>,
        RiscvInstr::REM => exec_arith::<ExecRemSigned>,
        RiscvInstr::REMU => exec_arith::<ExecRemUnsigned>,

        //---------------------------------------
        // Zicsr
        //---------------------------------------
        RiscvInstr::CSRRW => exec_csrw::<false>,
        RiscvInstr::CSRRC => exec_csr_bit::<false, false>,
        RiscvInstr::CSRRS => exec_csr_bit::<true, false>,
        RiscvInstr::CSRRWI => exec_csrw::<true>,
        RiscvInstr::CSRRCI => exec_csr_bit::<false, true>,
        RiscvInstr::CSRRSI => exec_csr_bit::<true, true>,

        //---------------------------------------
        // Privileged
        //---------------------------------------
        RiscvInstr::MRET => |_info, cpu| {
            TrapController::mret(cpu);
            Ok(())
        },

        //---------------------------------------
        // Host (custom-0)
        //---------------------------------------
        RiscvInstr::EXIT_IMM => |info, cpu| {
            if let RVInstrInfo::I { imm, .. } = info {
                halt(cpu, imm);
            }
            Ok(())
        },

        RiscvInstr::EXIT_REG => |info, cpu| {
            if let RVInstrInfo::I { rs1, .. } = info {
                let code = cpu.reg_file.read(rs1, 0).0;
                halt(cpu, code);
            }
            Ok(())
        },

        RiscvInstr::IOCALL => |info, cpu| {
            normal_exec(cpu, |cpu| {
                if let RVInstrInfo::I { imm, .. } = info {
                    let mut args = [0 as WordType; 8];
                    for (i, arg) in args.iter_mut().enumerate() {
                        *arg = cpu.reg_file.read(IOCALL_ARG_BASE + i as u8, 0).0;
                    }

                    let ret = cpu.host.iocall(&mut cpu.memory, imm, &args);
                    write_back(cpu, IOCALL_ARG_BASE, ret);
                }
                Ok(())
            })
        },
    }
}

fn halt(cpu: &mut RV32CPU, exit_code: WordType) {
    log::debug!("exit({}) at {:#010x}", exit_code, cpu.pc);
    cpu.status = CpuStatus::Halted { exit_code };
    cpu.pc = cpu.pc.wrapping_add(4);
}
