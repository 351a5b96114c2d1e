use crate::{config::arch_config::WordType, utils::UnsignedInteger};

pub mod mmio;

/// Bus accesses never fault. Alignment is the executor's business, checked
/// before anything reaches a `Mem`.
pub trait Mem {
    fn read<T>(&mut self, addr: WordType) -> T
    where
        T: UnsignedInteger;

    fn write<T>(&mut self, addr: WordType, data: T)
    where
        T: UnsignedInteger;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessWidth {
    Byte,
    Half,
    Word,
}

impl AccessWidth {
    pub fn of<T: UnsignedInteger>() -> Self {
        match T::BYTES {
            1 => AccessWidth::Byte,
            2 => AccessWidth::Half,
            _ => AccessWidth::Word,
        }
    }

    /// All ones of this width, zero extended to a word.
    pub fn all_ones(self) -> WordType {
        match self {
            AccessWidth::Byte => u8::MAX as WordType,
            AccessWidth::Half => u16::MAX as WordType,
            AccessWidth::Word => WordType::MAX,
        }
    }
}

/// Handler for everything below the RAM base.
///
/// Values are passed zero extended to a word; only the low `width` bytes of a
/// read result are kept.
pub trait IoHook {
    fn io_read(&mut self, addr: WordType, width: AccessWidth) -> WordType;
    fn io_write(&mut self, addr: WordType, width: AccessWidth, data: WordType);
}

/// Nothing attached: reads float high, writes vanish.
#[derive(Debug, Default)]
pub struct UnmappedIo;

impl IoHook for UnmappedIo {
    fn io_read(&mut self, addr: WordType, width: AccessWidth) -> WordType {
        log::trace!("read from unmapped io {addr:#010x} ({width:?})");
        width.all_ones()
    }

    fn io_write(&mut self, addr: WordType, width: AccessWidth, data: WordType) {
        log::trace!("write {data:#x} to unmapped io {addr:#010x} ({width:?}) dropped");
    }
}
