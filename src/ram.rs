use crate::{
    config::arch_config::WordType, device::Mem, error::EmulatorError, utils::UnsignedInteger,
};

/// Backing store of the RAM region. Addresses are offsets from the RAM base
/// and wrap around the (power of two) size instead of faulting.
pub struct Ram {
    data: Box<[u8]>,
    mask: usize,
}

impl Ram {
    pub fn new(size: usize) -> Result<Self, EmulatorError> {
        if size < 4 || !size.is_power_of_two() {
            return Err(EmulatorError::InvalidRamSize(size));
        }

        Ok(Self {
            data: vec![0u8; size].into_boxed_slice(),
            mask: size - 1,
        })
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Copy `section` in at `offset`. Unlike the regular accessors this does not wrap.
    pub fn insert_section(&mut self, section: &[u8], offset: WordType) -> Result<(), EmulatorError> {
        let start = offset as usize;
        match start.checked_add(section.len()) {
            Some(end) if end <= self.size() => {
                self.data[start..end].copy_from_slice(section);
                Ok(())
            }
            _ => {
                log::error!(
                    "ram::insert_section out of range! offset = {:#x}, len = {:#x}",
                    offset,
                    section.len()
                );
                Err(EmulatorError::ImageTooLarge {
                    size: start.saturating_add(section.len()),
                    capacity: self.size(),
                })
            }
        }
    }

    /// Strict view of `len` bytes at `offset`: `None` when any byte would fall past the end.
    pub fn dma(&mut self, offset: WordType, len: usize) -> Option<&mut [u8]> {
        let start = offset as usize;
        if start >= self.size() || len > self.size() - start {
            return None;
        }
        Some(&mut self.data[start..start + len])
    }

    /// Index of the first byte of the naturally aligned `T` holding `offset`.
    fn slot<T: UnsignedInteger>(&self, offset: WordType) -> usize {
        (offset as usize & self.mask) & !(T::BYTES - 1)
    }
}

impl Mem for Ram {
    fn read<T: UnsignedInteger>(&mut self, offset: WordType) -> T {
        let idx = self.slot::<T>(offset);
        T::from_le_slice(&self.data[idx..idx + T::BYTES])
    }

    fn write<T: UnsignedInteger>(&mut self, offset: WordType, data: T) {
        let idx = self.slot::<T>(offset);
        data.write_le_slice(&mut self.data[idx..idx + T::BYTES]);
    }
}
