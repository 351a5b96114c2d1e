use crate::{
    config::arch_config::{RegisterNaming, WordType},
    cpu::RegFile,
    device::{Mem, mmio::MemoryBus},
    error::EmulatorError,
    isa::{
        DecoderTrait,
        riscv::{
            csr_reg::{CsrAddr, CsrRegFile},
            decoder::{DecodeInstr, Decoder},
            disasm::Disassembler,
            instruction::{RVInstrInfo, exec_mapping::get_exec_func, instr_table::RiscvInstr},
            trap::{Trap, trap_controller::TrapController},
        },
    },
    syscall::{HostIo, SyscallHandler},
};

const REG_INDEX_MASK: u8 = 0x1f;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CpuStatus {
    Running,
    /// Reached through one of the custom-0 exit instructions.
    Halted { exit_code: WordType },
}

pub struct RV32CPU {
    pub(super) reg_file: RegFile,
    pub(super) memory: MemoryBus,
    pub(super) pc: WordType,
    pub(super) decoder: Decoder,
    pub(super) csr: CsrRegFile,
    pub(super) host: Box<dyn SyscallHandler>,
    pub(super) status: CpuStatus,
    pub(super) disassembler: Disassembler,
    /// Every fetched word, trapping ones included.
    fetched: u64,

    /// Stop with an error instead of trapping on an undecodable word.
    abort_on_illegal: bool,
}

impl RV32CPU {
    pub fn new(memory: MemoryBus, entry: WordType) -> Self {
        Self {
            reg_file: RegFile::new(),
            memory,
            pc: entry,
            decoder: Decoder::new(),
            csr: CsrRegFile::new(),
            host: Box::new(HostIo::new()),
            status: CpuStatus::Running,
            disassembler: Disassembler::default(),
            fetched: 0,
            abort_on_illegal: false,
        }
    }

    pub fn with_naming(mut self, naming: RegisterNaming) -> Self {
        self.disassembler = Disassembler::new(naming);
        self
    }

    pub fn with_host(mut self, host: Box<dyn SyscallHandler>) -> Self {
        self.host = host;
        self
    }

    pub fn with_abort_on_illegal(mut self, abort: bool) -> Self {
        self.abort_on_illegal = abort;
        self
    }

    pub(super) fn execute(&mut self, instr: RiscvInstr, info: RVInstrInfo) -> Result<(), Trap> {
        get_exec_func(instr)(info, self)
    }

    /// Run one instruction. A trap is taken inside the step; only an
    /// illegal instruction in abort mode escapes as an error.
    pub fn step(&mut self) -> Result<(), EmulatorError> {
        if self.is_halted() {
            return Ok(());
        }

        // IF
        let pc = self.pc;
        let raw = self.memory.read::<u32>(pc);
        self.fetched += 1;
        if log::log_enabled!(log::Level::Trace) {
            log::trace!("{:08x}: {:08x} {}", pc, raw, self.disassembler.disassemble(pc, raw));
        }

        // ID
        let Some(DecodeInstr(instr, info)) = self.decoder.decode(raw) else {
            log::warn!("Illegal instruction: {:#010x} at {:#010x}", raw, pc);
            if self.abort_on_illegal {
                return Err(EmulatorError::IllegalInstruction { pc, instr: raw });
            }
            TrapController::send_trap_signal(self, Trap::illegal(raw));
            return Ok(());
        };

        // EX && MEM && WB
        match self.execute(instr, info) {
            Ok(()) => self.csr.retire(),
            Err(trap) => TrapController::send_trap_signal(self, trap),
        }

        Ok(())
    }

    /// Step until the program halts and return its exit code.
    pub fn run(&mut self) -> Result<WordType, EmulatorError> {
        loop {
            if let CpuStatus::Halted { exit_code } = self.status {
                log::info!("CCOUNT: {}", self.fetched);
                log::info!("INSTRET: {}", self.instret());
                log::info!("exit code: {}", exit_code);
                log::debug!("{:?}", self.reg_file);
                return Ok(exit_code);
            }

            self.step()?;
        }
    }

    pub fn status(&self) -> CpuStatus {
        self.status
    }

    pub fn is_halted(&self) -> bool {
        matches!(self.status, CpuStatus::Halted { .. })
    }

    pub fn read_pc(&self) -> WordType {
        self.pc
    }

    /// Only the low 5 bits of `idx` are used, as in an instruction's register field.
    pub fn read_reg(&self, idx: u8) -> WordType {
        self.reg_file.read(idx & REG_INDEX_MASK, 0).0
    }

    pub fn write_reg(&mut self, idx: u8, value: WordType) {
        self.reg_file.write(idx & REG_INDEX_MASK, value);
    }

    pub fn read_csr(&self, addr: CsrAddr) -> WordType {
        self.csr.read(addr)
    }

    /// Instructions retired so far. Trapping instructions do not count.
    pub fn instret(&self) -> u64 {
        self.csr.instret()
    }

    /// Instructions fetched so far, including ones that trapped.
    pub fn fetched(&self) -> u64 {
        self.fetched
    }

    pub fn memory_mut(&mut self) -> &mut MemoryBus {
        &mut self.memory
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        isa::riscv::{cpu_tester::*, csr_reg::csr_index, trap::Exception},
        ram_config::BASE_ADDR,
        utils::negative_of,
    };

    #[test]
    fn test_exec_arith() {
        let mut tester = ExecTester::new();

        run_test_exec(
            RiscvInstr::ADDI,
            RVInstrInfo::I {
                rd: 2,
                rs1: 3,
                imm: negative_of(5),
            },
            |builder| builder.reg(3, 10).pc(0x2000),
            |checker| checker.reg(2, 5).pc(0x2004),
        );

        for _ in 1..=100 {
            tester.test_rand_r(RiscvInstr::ADD, |lhs, rhs| lhs.wrapping_add(rhs));
            tester.test_rand_r(RiscvInstr::SUB, |lhs, rhs| lhs.wrapping_sub(rhs));
            tester.test_rand_r(RiscvInstr::XOR, |lhs, rhs| lhs ^ rhs);
            tester.test_rand_r(RiscvInstr::SLL, |lhs, rhs| lhs << (rhs & 31));
            tester.test_rand_r(RiscvInstr::SRA, |lhs, rhs| {
                ((lhs as i32) >> (rhs & 31)) as WordType
            });
            tester.test_rand_i(RiscvInstr::ADDI, |lhs, imm| lhs.wrapping_add(imm));
            tester.test_rand_i(RiscvInstr::ANDI, |lhs, imm| lhs & imm);

            tester.test_rand_i(RiscvInstr::SLTI, |lhs, imm| {
                ((lhs as i32) < (imm as i32)) as WordType
            });
            tester.test_rand_i(RiscvInstr::SLTIU, |lhs, imm| (lhs < imm) as WordType);
        }

        run_test_exec_decode(
            0x02520333, // mul x6, x4, x5
            |builder| builder.reg(4, 5).reg(5, 10).pc(0x1000),
            |checker| checker.reg(6, 50).pc(0x1004),
        );

        run_test_exec_decode(
            0x4051d193, // srai x3, x3, 5
            |builder| builder.reg(3, 0x8000_0000).pc(0x1000),
            |checker| checker.reg(3, 0xfc00_0000).pc(0x1004),
        );
    }

    #[test]
    fn test_x0_is_never_written() {
        run_test_exec_decode(
            0x00500013, // addi x0, x0, 5
            |builder| builder.pc(0x1000),
            |checker| checker.reg(0, 0).pc(0x1004),
        );
    }

    #[test]
    fn test_load_store_decode() {
        run_test_exec_decode(
            0x00812183, // lw x3, 8(x2)
            |builder| builder.reg(2, BASE_ADDR).mem_base::<u32>(8, 123).pc(0x1000),
            |checker| checker.reg(3, 123).pc(0x1004),
        );

        run_test_exec_decode(
            0xfec42783, // lw a5,-20(s0)
            |builder| builder.reg(8, BASE_ADDR + 36).mem_base(16, 123u32).pc(0x1000),
            |checker| checker.reg(15, 123).pc(0x1004),
        );

        run_test_exec_decode(
            0xfe112c23, // sw x1, -8(x2)
            |builder| builder.reg(2, BASE_ADDR + 16).reg(1, 123),
            |checker| checker.mem_base::<u32>(8, 123),
        );

        run_test_exec_decode(
            0x00110083, // lb x1, 1(x2)
            |builder| builder.reg(2, BASE_ADDR).mem_base::<u8>(1, 0x80),
            |checker| checker.reg(1, 0xffff_ff80),
        );

        run_test_exec_decode(
            0x00114083, // lbu x1, 1(x2)
            |builder| builder.reg(2, BASE_ADDR).mem_base::<u8>(1, 0x80),
            |checker| checker.reg(1, 0x80),
        );

        run_test_exec_decode(
            0x00211083, // lh x1, 2(x2)
            |builder| builder.reg(2, BASE_ADDR).mem_base::<u16>(2, 0x8001),
            |checker| checker.reg(1, 0xffff_8001),
        );

        run_test_exec_decode(
            0x00111123, // sh x1, 2(x2)
            |builder| builder.reg(2, BASE_ADDR).reg(1, 0xdead_beef),
            |checker| checker.mem_base::<u16>(2, 0xbeef).mem_base::<u16>(0, 0),
        );
    }

    #[test]
    fn test_misaligned_access_traps() {
        // lw x3, 1(x2)
        run_test_trap(
            0x00112183,
            |builder| builder.reg(2, BASE_ADDR).reg(3, 77),
            Exception::LoadMisaligned,
            |checker| checker.reg(3, 77).csr(csr_index::mtval, BASE_ADDR + 1),
        );

        // sh x1, 1(x2)
        run_test_trap(
            0x001110a3,
            |builder| builder.reg(2, BASE_ADDR).reg(1, 0xffff),
            Exception::StoreMisaligned,
            |checker| {
                checker
                    .mem_base::<u32>(0, 0)
                    .csr(csr_index::mtval, BASE_ADDR + 1)
            },
        );
    }

    #[test]
    fn test_u_types_decode() {
        run_test_exec_decode(
            0x12233097, // auipc x1, 0x12233
            |builder| builder.reg(1, 3).pc(0x1000),
            |checker| checker.reg(1, 0x12234000).pc(0x1004),
        );

        run_test_exec_decode(
            0xfffff097, // auipc x1, 0xfffff
            |builder| builder.pc(0x2000),
            |checker| checker.reg(1, 0x1000).pc(0x2004),
        );

        run_test_exec_decode(
            0x123451b7, //lui x3, 0x12345
            |builder| builder.reg(3, 0x54321).pc(0x1000),
            |checker| checker.reg(3, 0x12345000).pc(0x1004),
        );
    }

    #[test]
    fn test_branch_decode() {
        run_test_exec_decode(
            0xf8c318e3, // bne x6, x12, -112
            |builder| builder.reg(6, 5).reg(12, 10).pc(0x2000),
            |checker| checker.pc(0x2000 - 112),
        );

        run_test_exec_decode(
            0xf8c318e3, // bne x6, x12, -112
            |builder| builder.reg(6, 5).reg(12, 5).pc(0x2000),
            |checker| checker.pc(0x2004),
        );

        // blt x1, x2, 8: signed compare
        run_test_exec_decode(
            0x0020c463,
            |builder| builder.reg(1, negative_of(1)).reg(2, 1).pc(0x2000),
            |checker| checker.pc(0x2008),
        );

        // bltu x1, x2, 8: unsigned compare
        run_test_exec_decode(
            0x0020e463,
            |builder| builder.reg(1, negative_of(1)).reg(2, 1).pc(0x2000),
            |checker| checker.pc(0x2004),
        );

        // bge x1, x2, 8 on equal operands
        run_test_exec_decode(
            0x0020d463,
            |builder| builder.reg(1, 3).reg(2, 3).pc(0x2000),
            |checker| checker.pc(0x2008),
        );
    }

    #[test]
    fn test_jump_decode() {
        run_test_exec_decode(
            0xf81ff06f, // jal x0, -128
            |builder| builder.pc(0x1234),
            |checker| checker.pc(0x1234 - 128),
        );

        run_test_exec_decode(
            0x008000ef, // jal ra, 8
            |builder| builder.pc(0x1000),
            |checker| checker.reg(1, 0x1004).pc(0x1008),
        );

        run_test_exec_decode(
            0x00078067, // jr a5
            |builder| builder.reg(15, 0x2468).pc(0x1234),
            |checker| checker.pc(0x2468),
        );

        run_test_exec_decode(
            0x001780e7, // jalr ra, 1(a5): low bit dropped
            |builder| builder.reg(15, 0x2468).pc(0x1000),
            |checker| checker.reg(1, 0x1004).pc(0x2468),
        );
    }

    #[test]
    fn test_misaligned_jump_traps_without_side_effects() {
        // jalr ra, 2(a5)
        run_test_trap(
            0x002780e7,
            |builder| builder.reg(15, 0x2000).reg(1, 0x55),
            Exception::InstructionMisaligned,
            |checker| checker.reg(1, 0x55).csr(csr_index::mtval, 0x2002),
        );

        // jal ra, 6
        run_test_trap(
            0x006000ef,
            |builder| builder.reg(1, 0x55),
            Exception::InstructionMisaligned,
            |checker| checker.reg(1, 0x55).csr(csr_index::mtval, TRAP_TEST_PC + 6),
        );

        // beq x0, x0, 6
        run_test_trap(
            0x00000363,
            |builder| builder,
            Exception::InstructionMisaligned,
            |checker| checker.csr(csr_index::mtval, TRAP_TEST_PC + 6),
        );
    }

    #[test]
    fn test_csr() {
        // CSRRS x12, mtvec, x6
        run_test_exec_decode(
            0x30532673,
            |builder| builder.reg(6, 0x00F0).csr(0x305, 0x0F00).pc(0x1000),
            |checker| checker.reg(12, 0x0F00).csr(0x305, 0x0FF0).pc(0x1004),
        );

        // CSRRC x13, mepc, x7
        run_test_exec_decode(
            0x3413b6f3,
            |builder| builder.reg(7, 0x0FF0).csr(0x341, 0x0FFF).pc(0x1000),
            |checker| checker.reg(13, 0x0FFF).csr(0x341, 0x000F).pc(0x1004),
        );

        // CSRRWI x11, mcause, 5
        run_test_exec_decode(
            0x3422d5f3,
            |builder| builder.csr(0x342, 0xABCD).pc(0x1000),
            |checker| checker.reg(11, 0xABCD).csr(0x342, 5).pc(0x1004),
        );

        // CSRRSI x12, mscratch, 6
        run_test_exec_decode(
            0x34036673,
            |builder| builder.csr(0x340, 0x00F0).pc(0x1000),
            |checker| checker.reg(12, 0x00F0).csr(0x340, 0x00F6).pc(0x1004),
        );

        // CSRRCI x13, mscratch, 7
        run_test_exec_decode(
            0x3403f6f3,
            |builder| builder.csr(0x340, 0x00FF).pc(0x1000),
            |checker| checker.reg(13, 0x00FF).csr(0x340, 0x00F8).pc(0x1004),
        );

        // CSRRW x0, mtvec, x5: low bits masked
        run_test_exec_decode(
            0x30529073,
            |builder| builder.reg(5, 0x8000_0043),
            |checker| checker.csr(0x305, 0x8000_0040),
        );

        // CSRRS x10, misa, x0
        run_test_exec_decode(
            0x30102573,
            |builder| builder,
            |checker| checker.reg(10, 0x4000_1100),
        );
    }

    #[test]
    fn test_csr_zero_source_leaves_csr_alone() {
        // CSRRS x12, mscratch, x0
        run_test_exec_decode(
            0x34002673,
            |builder| builder.csr(0x340, 0x1234),
            |checker| checker.reg(12, 0x1234).csr(0x340, 0x1234),
        );

        // CSRRCI x13, mscratch, 0
        run_test_exec_decode(
            0x340076f3,
            |builder| builder.csr(0x340, 0x1234),
            |checker| checker.reg(13, 0x1234).csr(0x340, 0x1234),
        );
    }

    #[test]
    fn test_rv_m() {
        run_test_exec_decode(
            0x02c59733, // mulh a4,a1,a2
            |builder| builder.reg(11, 0xffff_8000).reg(12, 0),
            |checker| checker.reg(14, 0),
        );

        run_test_exec_decode(
            0x02c59733, // mulh a4,a1,a2
            |builder| builder.reg(11, 0x8000_0000).reg(12, 0x8000_0000),
            |checker| checker.reg(14, 0x4000_0000),
        );

        run_test_exec_decode(
            0x02c5c733, // div a4,a1,a2
            |builder| builder.reg(11, 0x8000_0000).reg(12, negative_of(1)),
            |checker| checker.reg(14, 0x8000_0000),
        );

        run_test_exec_decode(
            0x02c5e733, // rem a4,a1,a2
            |builder| builder.reg(11, 0x8000_0000).reg(12, negative_of(1)),
            |checker| checker.reg(14, 0),
        );

        run_test_exec_decode(
            0x02c5d733, // divu a4,a1,a2
            |builder| builder.reg(11, 1234).reg(12, 0),
            |checker| checker.reg(14, WordType::MAX),
        );

        run_test_exec_decode(
            0x02c5f733, // remu a4,a1,a2
            |builder| builder.reg(11, 1234).reg(12, 0),
            |checker| checker.reg(14, 1234),
        );
    }

    #[test]
    fn test_environment_traps() {
        run_test_trap(
            0x00000073,
            |builder| builder,
            Exception::MachineEnvCall,
            |checker| checker.csr(csr_index::mtval, 0),
        );

        run_test_trap(
            0x00100073,
            |builder| builder,
            Exception::Breakpoint,
            |checker| checker.csr(csr_index::mtval, 0),
        );
    }

    #[test]
    fn test_illegal_instruction_traps() {
        // slli with bit 25 set
        run_test_trap(
            0x02009093,
            |builder| builder,
            Exception::IllegalInstruction,
            |checker| checker.csr(csr_index::mtval, 0x02009093),
        );

        run_test_trap(
            0,
            |builder| builder,
            Exception::IllegalInstruction,
            |checker| checker.csr(csr_index::mtval, 0),
        );
    }

    #[test]
    fn test_register_access_uses_five_bit_index() {
        let mut cpu = TestCPUBuilder::new().build();
        cpu.write_reg(33, 0x1234);
        assert_eq!(cpu.read_reg(1), 0x1234);
        assert_eq!(cpu.read_reg(33), 0x1234);

        cpu.write_reg(32, 7);
        assert_eq!(cpu.read_reg(0), 0);
        assert_eq!(cpu.read_reg(255), 0);
    }

    #[test]
    fn test_abort_on_illegal() {
        let mut cpu = TestCPUBuilder::new()
            .program(&[0xffff_ffff])
            .pc(BASE_ADDR)
            .build()
            .with_abort_on_illegal(true);

        assert!(matches!(
            cpu.step(),
            Err(EmulatorError::IllegalInstruction {
                pc: BASE_ADDR,
                instr: 0xffff_ffff
            })
        ));
        assert_eq!(cpu.read_pc(), BASE_ADDR);
    }

    #[test]
    fn test_mret_returns_to_mepc() {
        run_test_exec_decode(
            0x30200073,
            |builder| builder.csr(csr_index::mepc, 0x8000_0124).pc(0x8000_0040),
            |checker| checker.pc(0x8000_0124),
        );
    }

    #[test]
    fn test_run_to_exit() {
        run_test_cpu_step(
            &[
                0x00500093, // addi x1, x0, 5
                0x00108093, // addi x1, x1, 1
                0x0000c00b, // _exit x1
            ],
            |builder| builder,
            |checker| {
                checker
                    .reg(1, 6)
                    .pc(BASE_ADDR + 12)
                    .customized(|checker| {
                        assert_eq!(checker.cpu.status(), CpuStatus::Halted { exit_code: 6 });
                        assert_eq!(checker.cpu.instret(), 3);
                        assert_eq!(checker.cpu.fetched(), 3);
                        checker
                    })
            },
        );

        let mut cpu = TestCPUBuilder::new()
            .program(&[0x00500093, 0x0000c00b])
            .pc(BASE_ADDR)
            .build();
        assert_eq!(cpu.run().unwrap(), 5);

        // Halted: further steps change nothing.
        cpu.step().unwrap();
        assert_eq!(cpu.read_pc(), BASE_ADDR + 8);
    }

    #[test]
    fn test_trapping_instruction_does_not_retire() {
        let mut cpu = TestCPUBuilder::new()
            .program(&[0x00000073])
            .pc(BASE_ADDR)
            .build();
        cpu.step().unwrap();
        assert_eq!(cpu.instret(), 0);
        assert_eq!(cpu.fetched(), 1);
        assert_eq!(cpu.read_csr(csr_index::minstret), 0);
    }
}
