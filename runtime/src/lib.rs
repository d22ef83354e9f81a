//! Cooperative green threads on a single OS thread.
//!
//! Threads switch only when they call [`yield_now`]; the next thread in the
//! circular run queue resumes exactly where it last yielded. There is no
//! preemption, no priority and no thread exit.
//!
//! ```no_run
//! # fn main() {
//! // SAFETY: everything below stays on this OS thread
//! let boot = unsafe { runtime::bootstrap() };
//! let worker = runtime::spawn("worker", || loop {
//!     runtime::yield_now();
//! });
//! assert_eq!(runtime::run_queue(), [boot, worker]);
//! runtime::yield_now();
//! # }
//! ```
//!
//! # Limitations
//!
//! - Stacks have a fixed size and overflowing one is undefined behaviour; it
//!   is not detected.
//! - If every thread is waiting on something only another waiting thread can
//!   provide, the process spins in `yield_now` forever. There is no deadlock
//!   detection.
//! - A panic in a spawned thread cannot unwind past the thread's first frame
//!   and aborts the process.
#![cfg_attr(not(test), no_std)]

extern crate alloc;

mod arch;
pub mod errors;
pub mod logging;
pub mod thread;

#[cfg(test)]
mod testing;

pub use errors::{RuntimeError, RuntimeErrorCode};
pub use thread::context::ThreadState;
pub use thread::scheduler::{bootstrap, current, run_queue, yield_now};
pub use thread::{spawn, try_spawn, Builder, ThreadHandle};
