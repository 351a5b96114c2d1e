mod cpu_tester;
pub mod csr_reg;
pub mod decoder;
pub mod disasm;
pub mod executor;
pub mod instruction;
pub mod trap;
