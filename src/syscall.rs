//! Host side of the custom-0 `_iocall` instruction.
//!
//! Arguments arrive in `a0..a7`, the result goes back to `a0`. Guest pointers
//! are resolved through the bus' strict DMA view, so a bad pointer fails the
//! call instead of aliasing some other part of RAM.

use std::{
    collections::HashMap,
    fs::{File, OpenOptions},
    io::{self, Read, Write},
    path::PathBuf,
};

use bitflags::bitflags;
use num_enum::TryFromPrimitive;

use crate::{config::arch_config::WordType, device::mmio::MemoryBus};

/// Returned in `a0` for every failed call.
pub const IOCALL_FAILED: WordType = WordType::MAX;

/// Longest accepted path, terminator included.
pub const PATH_MAX: usize = 256;

/// First descriptor handed out by `open`; 0..=2 are the host's stdio.
const FIRST_FILE_FD: WordType = 3;

#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive)]
pub enum IoCall {
    Putc = 0,
    Open = 1,
    Close = 2,
    Read = 3,
    Write = 4,
}

bitflags! {
    /// `open` flags, octal values as the guest C library defines them.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct OpenFlags: u32 {
        const WRONLY = 0o1;
        const RDWR   = 0o2;
        const CREAT  = 0o100;
        const EXCL   = 0o200;
        const TRUNC  = 0o1000;
    }
}

impl OpenFlags {
    const ACCMODE: u32 = 0o3;

    fn to_open_options(self, mode: WordType) -> OpenOptions {
        let mut opts = OpenOptions::new();
        match self.bits() & Self::ACCMODE {
            // std refuses create or truncate without write access
            0 if self.intersects(OpenFlags::CREAT | OpenFlags::TRUNC) => {
                opts.read(true).write(true)
            }
            0 => opts.read(true),
            1 => opts.write(true),
            _ => opts.read(true).write(true),
        };

        if self.contains(OpenFlags::CREAT) {
            if self.contains(OpenFlags::EXCL) {
                opts.create_new(true);
            } else {
                opts.create(true);
            }
        }
        if self.contains(OpenFlags::TRUNC) {
            opts.truncate(true);
        }

        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            opts.mode(mode);
        }
        #[cfg(not(unix))]
        let _ = mode;

        opts
    }
}

#[derive(thiserror::Error, Debug)]
pub enum SyscallError {
    #[error("guest range {addr:#010x}+{len:#x} is outside RAM")]
    BadAddress { addr: WordType, len: usize },

    #[error("path at {0:#010x} has no terminator within {PATH_MAX} bytes")]
    UnterminatedPath(WordType),

    #[error("bad file descriptor {0}")]
    BadDescriptor(WordType),

    #[error("unknown iocall {0}")]
    UnknownCall(WordType),

    #[error(transparent)]
    Host(#[from] io::Error),
}

/// Services `_iocall`. The returned word is written to `a0` as is.
pub trait SyscallHandler {
    fn iocall(&mut self, memory: &mut MemoryBus, nr: WordType, args: &[WordType; 8]) -> WordType;
}

/// Default handler backed by the host file system.
pub struct HostIo {
    console: Box<dyn Write>,
    files: HashMap<WordType, File>,
    next_fd: WordType,
}

impl Default for HostIo {
    fn default() -> Self {
        Self::new()
    }
}

impl HostIo {
    pub fn new() -> Self {
        Self::with_console(Box::new(io::stdout()))
    }

    /// `putc` and writes to fd 1 go to `console` instead of the host stdout.
    pub fn with_console(console: Box<dyn Write>) -> Self {
        Self {
            console,
            files: HashMap::new(),
            next_fd: FIRST_FILE_FD,
        }
    }

    fn dispatch(
        &mut self,
        memory: &mut MemoryBus,
        nr: WordType,
        args: &[WordType; 8],
    ) -> Result<WordType, SyscallError> {
        let call = IoCall::try_from(nr).map_err(|_| SyscallError::UnknownCall(nr))?;

        match call {
            IoCall::Putc => {
                self.console.write_all(&[args[0] as u8])?;
                self.console.flush()?;
                Ok(0)
            }

            IoCall::Open => {
                let path = guest_path(memory, args[0])?;
                let flags = OpenFlags::from_bits_truncate(args[1]);
                let file = flags.to_open_options(args[2]).open(&path)?;

                let fd = self.next_fd;
                self.next_fd += 1;
                self.files.insert(fd, file);
                log::debug!("open({}, {:?}) = {}", path.display(), flags, fd);
                Ok(fd)
            }

            IoCall::Close => {
                let fd = args[0];
                self.files
                    .remove(&fd)
                    .map(|_| 0)
                    .ok_or(SyscallError::BadDescriptor(fd))
            }

            IoCall::Read => {
                let (fd, addr, len) = (args[0], args[1], args[2] as usize);
                let buf = memory
                    .dma(addr, len)
                    .ok_or(SyscallError::BadAddress { addr, len })?;

                let n = match fd {
                    0 => io::stdin().read(buf)?,
                    _ => self
                        .files
                        .get_mut(&fd)
                        .ok_or(SyscallError::BadDescriptor(fd))?
                        .read(buf)?,
                };
                Ok(n as WordType)
            }

            IoCall::Write => {
                let (fd, addr, len) = (args[0], args[1], args[2] as usize);
                let buf = memory
                    .dma(addr, len)
                    .ok_or(SyscallError::BadAddress { addr, len })?;

                let n = match fd {
                    1 => {
                        self.console.write_all(buf)?;
                        self.console.flush()?;
                        buf.len()
                    }
                    2 => {
                        io::stderr().write_all(buf)?;
                        buf.len()
                    }
                    _ => self
                        .files
                        .get_mut(&fd)
                        .ok_or(SyscallError::BadDescriptor(fd))?
                        .write(buf)?,
                };
                Ok(n as WordType)
            }
        }
    }
}

impl SyscallHandler for HostIo {
    fn iocall(&mut self, memory: &mut MemoryBus, nr: WordType, args: &[WordType; 8]) -> WordType {
        match self.dispatch(memory, nr, args) {
            Ok(ret) => ret,
            Err(err) => {
                log::debug!("iocall {} failed: {}", nr, err);
                IOCALL_FAILED
            }
        }
    }
}

/// NUL-terminated guest string at `addr`, at most [`PATH_MAX`] bytes and never
/// past the end of RAM.
fn guest_path(memory: &mut MemoryBus, addr: WordType) -> Result<PathBuf, SyscallError> {
    let limit = memory
        .dma_available(addr)
        .ok_or(SyscallError::BadAddress { addr, len: 1 })?
        .min(PATH_MAX);
    let bytes = memory
        .dma(addr, limit)
        .ok_or(SyscallError::BadAddress { addr, len: limit })?;
    let len = bytes
        .iter()
        .position(|&b| b == 0)
        .ok_or(SyscallError::UnterminatedPath(addr))?;

    Ok(host_path(&bytes[..len]))
}

#[cfg(unix)]
fn host_path(bytes: &[u8]) -> PathBuf {
    use std::{ffi::OsStr, os::unix::ffi::OsStrExt};
    PathBuf::from(OsStr::from_bytes(bytes))
}

#[cfg(not(unix))]
fn host_path(bytes: &[u8]) -> PathBuf {
    PathBuf::from(String::from_utf8_lossy(bytes).into_owned())
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, rc::Rc};

    use super::*;
    use crate::{config::ram_config::BASE_ADDR, device::Mem};

    const RAM: usize = 0x1000;

    #[derive(Clone, Default)]
    struct Console(Rc<RefCell<Vec<u8>>>);

    impl Write for Console {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.borrow_mut().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn setup() -> (HostIo, MemoryBus, Console) {
        let console = Console::default();
        let host = HostIo::with_console(Box::new(console.clone()));
        (host, MemoryBus::new(RAM).unwrap(), console)
    }

    fn args(a: &[WordType]) -> [WordType; 8] {
        let mut out = [0; 8];
        out[..a.len()].copy_from_slice(a);
        out
    }

    fn put_bytes(bus: &mut MemoryBus, addr: WordType, bytes: &[u8]) {
        for (i, b) in bytes.iter().enumerate() {
            bus.write::<u8>(addr + i as WordType, *b);
        }
    }

    #[test]
    fn test_putc_and_console_write() {
        let (mut host, mut bus, console) = setup();
        assert_eq!(host.iocall(&mut bus, 0, &args(&['h' as u32])), 0);
        assert_eq!(host.iocall(&mut bus, 0, &args(&[0x100 | 'i' as u32])), 0);

        put_bytes(&mut bus, BASE_ADDR + 0x40, b", world\n");
        assert_eq!(host.iocall(&mut bus, 4, &args(&[1, BASE_ADDR + 0x40, 8])), 8);

        assert_eq!(console.0.borrow().as_slice(), b"hi, world\n");
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("guest.txt");
        let mut path_bytes = path.to_str().unwrap().as_bytes().to_vec();
        path_bytes.push(0);

        let (mut host, mut bus, _) = setup();
        let path_addr = BASE_ADDR + 0x100;
        put_bytes(&mut bus, path_addr, &path_bytes);
        put_bytes(&mut bus, BASE_ADDR + 0x400, b"payload");

        let flags = (OpenFlags::WRONLY | OpenFlags::CREAT | OpenFlags::TRUNC).bits();
        let fd = host.iocall(&mut bus, 1, &args(&[path_addr, flags, 0o644]));
        assert_eq!(fd, 3);
        assert_eq!(host.iocall(&mut bus, 4, &args(&[fd, BASE_ADDR + 0x400, 7])), 7);
        assert_eq!(host.iocall(&mut bus, 2, &args(&[fd])), 0);
        assert_eq!(std::fs::read(&path).unwrap(), b"payload");

        let fd = host.iocall(&mut bus, 1, &args(&[path_addr, 0, 0]));
        assert_eq!(fd, 4);
        assert_eq!(host.iocall(&mut bus, 3, &args(&[fd, BASE_ADDR + 0x800, 64])), 7);
        assert_eq!(bus.dma(BASE_ADDR + 0x800, 7).unwrap(), b"payload");
        assert_eq!(host.iocall(&mut bus, 2, &args(&[fd])), 0);

        // closed twice
        assert_eq!(host.iocall(&mut bus, 2, &args(&[fd])), IOCALL_FAILED);
    }

    #[test]
    fn test_exclusive_create_fails_on_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("exists");
        std::fs::write(&path, b"x").unwrap();
        let mut path_bytes = path.to_str().unwrap().as_bytes().to_vec();
        path_bytes.push(0);

        let (mut host, mut bus, _) = setup();
        put_bytes(&mut bus, BASE_ADDR, &path_bytes);
        let flags = (OpenFlags::WRONLY | OpenFlags::CREAT | OpenFlags::EXCL).bits();
        assert_eq!(
            host.iocall(&mut bus, 1, &args(&[BASE_ADDR, flags, 0o600])),
            IOCALL_FAILED
        );
    }

    #[test]
    fn test_read_only_create() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fresh");
        let mut path_bytes = path.to_str().unwrap().as_bytes().to_vec();
        path_bytes.push(0);

        let (mut host, mut bus, _) = setup();
        put_bytes(&mut bus, BASE_ADDR, &path_bytes);
        let flags = (OpenFlags::CREAT | OpenFlags::TRUNC).bits();
        let fd = host.iocall(&mut bus, 1, &args(&[BASE_ADDR, flags, 0o600]));
        assert_ne!(fd, IOCALL_FAILED);
        assert!(path.exists());

        assert_eq!(host.iocall(&mut bus, 3, &args(&[fd, BASE_ADDR + 0x800, 4])), 0);
        assert_eq!(host.iocall(&mut bus, 2, &args(&[fd])), 0);
    }

    #[test]
    fn test_bad_guest_ranges_fail() {
        let (mut host, mut bus, console) = setup();
        let end = BASE_ADDR + RAM as WordType;

        // below RAM, past RAM, crossing the end
        assert_eq!(host.iocall(&mut bus, 4, &args(&[1, 0x100, 4])), IOCALL_FAILED);
        assert_eq!(host.iocall(&mut bus, 4, &args(&[1, end, 1])), IOCALL_FAILED);
        assert_eq!(host.iocall(&mut bus, 4, &args(&[1, end - 4, 5])), IOCALL_FAILED);
        assert_eq!(host.iocall(&mut bus, 3, &args(&[0, end - 1, 2])), IOCALL_FAILED);
        assert!(console.0.borrow().is_empty());
    }

    #[test]
    fn test_path_must_be_terminated() {
        let (mut host, mut bus, _) = setup();

        put_bytes(&mut bus, BASE_ADDR, &[b'a'; PATH_MAX]);
        assert!(matches!(
            guest_path(&mut bus, BASE_ADDR),
            Err(SyscallError::UnterminatedPath(_))
        ));
        assert_eq!(host.iocall(&mut bus, 1, &args(&[BASE_ADDR, 0, 0])), IOCALL_FAILED);

        // terminator would lie past the end of RAM
        let tail = BASE_ADDR + RAM as WordType - 4;
        put_bytes(&mut bus, tail, b"abcd");
        assert!(matches!(
            guest_path(&mut bus, tail),
            Err(SyscallError::UnterminatedPath(_))
        ));

        put_bytes(&mut bus, tail, b"abc\0");
        assert_eq!(guest_path(&mut bus, tail).unwrap(), PathBuf::from("abc"));
    }

    #[test]
    fn test_unknown_call_and_descriptor() {
        let (mut host, mut bus, _) = setup();
        assert_eq!(host.iocall(&mut bus, 5, &args(&[])), IOCALL_FAILED);
        assert_eq!(host.iocall(&mut bus, 0xffff_ffff, &args(&[])), IOCALL_FAILED);
        assert_eq!(host.iocall(&mut bus, 2, &args(&[7])), IOCALL_FAILED);
        assert_eq!(
            host.iocall(&mut bus, 4, &args(&[9, BASE_ADDR, 1])),
            IOCALL_FAILED
        );
    }
}
