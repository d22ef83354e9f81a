#![no_std]

use core::fmt::{self, Display};

pub mod constants;

pub const KIB: usize = 1024usize;
pub const MIB: usize = KIB * 1024;
pub const GIB: usize = MIB * 1024;
pub const TIB: usize = GIB * 1024;
pub const EIB: usize = TIB * 1024;

pub fn get_size_suffix_and_divisor(num: u64) -> (&'static str, u64) {
    if num >= EIB as u64 {
        ("EiB", EIB as u64)
    } else if num >= TIB as u64 {
        ("TiB", TIB as u64)
    } else if num >= GIB as u64 {
        ("GiB", GIB as u64)
    } else if num >= MIB as u64 {
        ("MiB", MIB as u64)
    } else if num >= KIB as u64 {
        ("KiB", KIB as u64)
    } else {
        ("bytes", 1)
    }
}

/// Formats a byte count with the largest binary suffix that fits, e.g. `256 KiB`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteSize(pub u64);

impl Display for ByteSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (suffix, divisor) = get_size_suffix_and_divisor(self.0);
        if self.0 % divisor == 0 {
            write!(f, "{} {}", self.0 / divisor, suffix)
        } else {
            // one decimal is plenty for log lines
            let tenths = self.0 * 10 / divisor;
            write!(f, "{}.{} {}", tenths / 10, tenths % 10, suffix)
        }
    }
}

/// Rounds `value` down to a multiple of `align`, which must be a power of two.
pub const fn align_down(value: usize, align: usize) -> usize {
    value & !(align - 1)
}
