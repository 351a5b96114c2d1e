use std::fmt::{Debug, LowerHex};

use crate::config::arch_config::WordType;

/// get the negative of given number of [`WordType`] in 2's complement.
pub fn negative_of(value: WordType) -> WordType {
    (!value).wrapping_add(1)
}

// ========================================
//  gen_name_list ["a1", "a2", "a3", ... ]
// ========================================

/// # Examples
/// ```
/// assert_eq!(gen_name_list!("a"; 0, 5), ["a0", "a1", "a2", "a3", "a4", "a5"])
/// ```
#[macro_export]
macro_rules! gen_name_list {
    ($base:literal; $begin: literal, $end: literal) => {
        seq_macro::seq!(N in $begin..= $end {
            [ #(concat!($base, stringify!(N)),) *]
        })
    }
}

pub trait TruncateFrom<T>: Sized {
    fn truncate_from(value: T) -> Self;
}

macro_rules! impl_truncate_from {
    ($from:ty, $to:ty) => {
        impl TruncateFrom<$from> for $to {
            fn truncate_from(val: $from) -> Self {
                val as $to
            }
        }
    };
}

impl_truncate_from!(u32, u8);
impl_truncate_from!(u32, u16);
impl_truncate_from!(u32, u32);

/// Access widths the bus understands. Values cross the bus little-endian,
/// whatever the host byte order is.
pub trait UnsignedInteger:
    Copy + Sized + Default + Into<WordType> + TruncateFrom<WordType> + PartialEq + Eq + Debug + LowerHex
{
    const BYTES: usize;

    fn from_le_slice(bytes: &[u8]) -> Self;
    fn write_le_slice(self, bytes: &mut [u8]);
}

macro_rules! impl_unsigned_integer {
    ($t:ty) => {
        impl UnsignedInteger for $t {
            const BYTES: usize = size_of::<$t>();

            fn from_le_slice(bytes: &[u8]) -> Self {
                let mut buf = [0u8; size_of::<$t>()];
                buf.copy_from_slice(&bytes[..size_of::<$t>()]);
                <$t>::from_le_bytes(buf)
            }

            fn write_le_slice(self, bytes: &mut [u8]) {
                bytes[..size_of::<$t>()].copy_from_slice(&self.to_le_bytes());
            }
        }
    };
}

impl_unsigned_integer!(u8);
impl_unsigned_integer!(u16);
impl_unsigned_integer!(u32);

pub fn check_align<T: UnsignedInteger>(addr: WordType) -> bool {
    addr & (T::BYTES as WordType - 1) == 0
}
