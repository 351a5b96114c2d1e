use crate::{
    config::{arch_config::WordType, ram_config},
    device::{AccessWidth, IoHook, Mem, UnmappedIo},
    error::EmulatorError,
    ram::Ram,
    utils::{TruncateFrom, UnsignedInteger},
};

/// # MemoryBus
/// Single physical address space of the hart.
///
/// ```text
/// 0x0000_0000 ..  BASE_ADDR      io hook (default: reads all ones, writes dropped)
/// BASE_ADDR   ..  0xFFFF_FFFF    RAM, wrapping every `ram.size()` bytes
/// ```
///
/// Callers check alignment; RAM rounds an unaligned access down to its
/// natural slot.
pub struct MemoryBus {
    ram: Ram,
    io: Box<dyn IoHook>,
}

impl MemoryBus {
    pub fn new(ram_size: usize) -> Result<Self, EmulatorError> {
        Ok(Self {
            ram: Ram::new(ram_size)?,
            io: Box::new(UnmappedIo),
        })
    }

    pub fn with_io_hook(mut self, io: Box<dyn IoHook>) -> Self {
        self.io = io;
        self
    }

    /// Copy a raw image to the start of RAM.
    pub fn load_image(&mut self, image: &[u8]) -> Result<(), EmulatorError> {
        self.ram.insert_section(image, 0)
    }

    /// Strict byte view of guest memory for the host side of syscalls.
    ///
    /// Fails when `addr` is below RAM or when any byte of `[addr, addr + len)`
    /// lies past the end of RAM. No wrap-around here.
    pub fn dma(&mut self, addr: WordType, len: usize) -> Option<&mut [u8]> {
        if addr < ram_config::BASE_ADDR {
            return None;
        }
        self.ram.dma(addr - ram_config::BASE_ADDR, len)
    }

    /// Bytes left in RAM from `addr` on, `None` when `addr` is not in RAM.
    pub fn dma_available(&self, addr: WordType) -> Option<usize> {
        if addr < ram_config::BASE_ADDR {
            return None;
        }
        let offset = (addr - ram_config::BASE_ADDR) as usize;
        self.ram.size().checked_sub(offset).filter(|&n| n > 0)
    }
}

impl Mem for MemoryBus {
    fn read<T>(&mut self, addr: WordType) -> T
    where
        T: UnsignedInteger,
    {
        if addr >= ram_config::BASE_ADDR {
            return self.ram.read(addr - ram_config::BASE_ADDR);
        }
        T::truncate_from(self.io.io_read(addr, AccessWidth::of::<T>()))
    }

    fn write<T>(&mut self, addr: WordType, data: T)
    where
        T: UnsignedInteger,
    {
        if addr >= ram_config::BASE_ADDR {
            return self.ram.write(addr - ram_config::BASE_ADDR, data);
        }
        self.io.io_write(addr, AccessWidth::of::<T>(), data.into());
    }
}
