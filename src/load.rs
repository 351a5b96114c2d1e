use std::{
    io::{self, Write},
    path::Path,
};

use crate::{
    config::arch_config::WordType,
    device::{Mem, mmio::MemoryBus},
    error::EmulatorError,
};

/// Read a flat binary image. No header, no relocation: the bytes go to RAM
/// as they are.
pub fn read_image(path: &Path) -> Result<Vec<u8>, EmulatorError> {
    std::fs::read(path).map_err(|source| EmulatorError::ImageRead {
        path: path.to_path_buf(),
        source,
    })
}

/// Copy `image` to the start of RAM.
pub fn load_bin(memory: &mut MemoryBus, image: &[u8]) -> Result<(), EmulatorError> {
    memory.load_image(image)?;
    log::info!("loaded {} byte image", image.len());
    Ok(())
}

/// Write the words of `[from, to)` one per line, as 8 lowercase hex digits.
/// Nothing is written unless `to > from`.
pub fn dump_memory<W: Write>(
    memory: &mut MemoryBus,
    from: WordType,
    to: WordType,
    out: &mut W,
) -> io::Result<()> {
    let mut addr = from;
    while addr < to {
        writeln!(out, "{:08x}", memory.read::<u32>(addr))?;
        addr = match addr.checked_add(4) {
            Some(next) => next,
            None => break,
        };
    }
    out.flush()
}
