use crate::isa::riscv::{csr_reg::csr_index, executor::RV32CPU, trap::Trap};

/// Machine-mode trap entry and return. There is no other privilege level and
/// no interrupt source, so every trap lands at `mtvec`.
pub(in crate::isa::riscv) struct TrapController {}

impl TrapController {
    /// Record the trap and redirect to the handler. A trap inside a handler
    /// simply overwrites the previous record.
    pub fn send_trap_signal(cpu: &mut RV32CPU, trap: Trap) {
        let epc = cpu.pc;
        cpu.csr.write(csr_index::mepc, epc);
        cpu.csr.write(csr_index::mcause, trap.cause_code());
        cpu.csr.write(csr_index::mtval, trap.value);

        cpu.pc = cpu.csr.trap_vector();

        log::debug!(
            "trap {:?}: mepc = {:#010x}, mtval = {:#010x}, handler = {:#010x}",
            trap.cause,
            epc,
            trap.value,
            cpu.pc
        );
    }

    pub fn mret(cpu: &mut RV32CPU) {
        cpu.pc = cpu.csr.read(csr_index::mepc);
        log::debug!("mret to {:#010x}", cpu.pc);
    }
}
