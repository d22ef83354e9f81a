use core::mem;

use crate::KIB;

pub const ARCH_WORD_SIZE: usize = mem::size_of::<usize>();

/// Every thread stack is aligned to this, and so is the top of its initial frame.
pub const STACK_ALIGNMENT: usize = 16;

/// Stack handed to a spawned thread unless its builder asks for another size.
pub const DEFAULT_STACK_SIZE: usize = 256 * KIB;

/// Smallest stack a thread may be spawned with.
pub const MIN_STACK_SIZE: usize = 4 * KIB;

/// Thread names longer than this (in bytes) are truncated.
pub const THREAD_NAME_MAX: usize = 19;

/// Slots in a mailbox when no capacity is given; one of them is never used.
pub const DEFAULT_MAILBOX_CAPACITY: usize = 20;
