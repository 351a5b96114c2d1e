#![cfg_attr(debug_assertions, allow(dead_code))]

pub mod config;
pub mod cpu;
pub mod device;
pub mod error;
pub mod isa;
pub mod load;
pub mod ram;
pub mod syscall;
pub mod utils;

pub use config::ram_config;
pub use error::EmulatorError;

use std::{
    fs::File,
    io::{self, BufWriter, Write},
    path::Path,
};

use crate::{
    config::arch_config::{RegisterNaming, WordType},
    device::mmio::MemoryBus,
    isa::riscv::executor::{CpuStatus, RV32CPU},
    syscall::SyscallHandler,
};

/// Machine set-up. Every field has a usable default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmulatorConfig {
    pub(crate) ram_size: usize,
    pub(crate) entry: WordType,
    pub(crate) register_naming: RegisterNaming,
    pub(crate) abort_on_illegal: bool,
}

impl Default for EmulatorConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl EmulatorConfig {
    pub fn new() -> Self {
        Self {
            ram_size: ram_config::DEFAULT_SIZE,
            entry: ram_config::DEFAULT_PC_VALUE,
            register_naming: RegisterNaming::Numeric,
            abort_on_illegal: false,
        }
    }

    /// Must be a power of two.
    pub fn ram_size(mut self, size: usize) -> Self {
        self.ram_size = size;
        self
    }

    pub fn entry(mut self, pc: WordType) -> Self {
        self.entry = pc;
        self
    }

    pub fn register_naming(mut self, naming: RegisterNaming) -> Self {
        self.register_naming = naming;
        self
    }

    pub fn abort_on_illegal(mut self, abort: bool) -> Self {
        self.abort_on_illegal = abort;
        self
    }
}

pub struct Emulator {
    cpu: RV32CPU,
}

impl Emulator {
    pub fn from_binary(path: &Path, config: EmulatorConfig) -> Result<Self, EmulatorError> {
        let image = load::read_image(path)?;
        Self::from_image(&image, config)
    }

    pub fn from_image(image: &[u8], config: EmulatorConfig) -> Result<Self, EmulatorError> {
        let mut memory = MemoryBus::new(config.ram_size)?;
        load::load_bin(&mut memory, image)?;

        let cpu = RV32CPU::new(memory, config.entry)
            .with_naming(config.register_naming)
            .with_abort_on_illegal(config.abort_on_illegal);
        Ok(Self { cpu })
    }

    /// Replace the host side of `_iocall`.
    pub fn with_host(mut self, host: Box<dyn SyscallHandler>) -> Self {
        self.cpu = self.cpu.with_host(host);
        self
    }

    /// Run until the program exits and return its exit code.
    pub fn run(&mut self) -> Result<WordType, EmulatorError> {
        self.cpu.run()
    }

    pub fn step(&mut self) -> Result<(), EmulatorError> {
        self.cpu.step()
    }

    pub fn status(&self) -> CpuStatus {
        self.cpu.status()
    }

    pub fn cpu(&self) -> &RV32CPU {
        &self.cpu
    }

    pub fn dump<W: Write>(&mut self, from: WordType, to: WordType, out: &mut W) -> io::Result<()> {
        load::dump_memory(self.cpu.memory_mut(), from, to, out)
    }

    pub fn dump_to_file(
        &mut self,
        path: &Path,
        from: WordType,
        to: WordType,
    ) -> Result<(), EmulatorError> {
        let wrap = |source: io::Error| EmulatorError::Dump {
            path: path.to_path_buf(),
            source,
        };

        let mut out = BufWriter::new(File::create(path).map_err(wrap)?);
        self.dump(from, to, &mut out).map_err(wrap)
    }
}
