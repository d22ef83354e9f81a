//! The run queue and the switch between its members.
//!
//! `CURRENT` is the scheduler's only piece of state: it is set by [`bootstrap`]
//! and afterwards changed by nothing but [`yield_now`]. Everything else about
//! the run queue lives in the `next` links of the control blocks.

use core::ptr::{self, NonNull};
use core::sync::atomic::{AtomicPtr, Ordering};

use alloc::vec::Vec;

use super::context::ThreadState;
use super::{Thread, ThreadHandle};
use crate::{arch, debug, info};

static CURRENT: AtomicPtr<Thread> = AtomicPtr::new(ptr::null_mut());

/// Turns the calling code into the bootstrap thread: a one-thread run queue
/// running on the process's own stack. Threads can be spawned from here on.
///
/// # Safety
/// Green threads share nothing with the OS thread machinery. After this call,
/// every use of the runtime (spawning, yielding, mailboxes) must happen on the
/// calling OS thread, and no other OS thread may touch the runtime until it is
/// bootstrapped again.
///
/// Bootstrapping again abandons the existing run queue: its threads are never
/// scheduled again and their memory is leaked.
pub unsafe fn bootstrap() -> ThreadHandle {
    let handle = Thread::bootstrap().leak();
    let previous = CURRENT.swap(handle.0.as_ptr(), Ordering::AcqRel);
    if !previous.is_null() {
        debug!("abandoning the previous run queue");
    }
    info!("runtime bootstrapped on {}", arch::name());
    handle
}

/// The running thread, or `None` before [`bootstrap`].
pub fn current() -> Option<ThreadHandle> {
    NonNull::new(CURRENT.load(Ordering::Acquire)).map(ThreadHandle)
}

/// Suspends the calling thread and resumes the next one in the run queue.
///
/// Returns once every other thread in the ring has had its turn and control
/// comes back around. A thread that never calls this starves everyone else.
/// Before [`bootstrap`], and in a one-thread ring, this returns immediately.
pub fn yield_now() {
    let Some(current) = current() else {
        return;
    };
    let next = current.next();
    if next == current {
        return;
    }

    let from = current.thread();
    let to = next.thread();
    if from.state.get() == ThreadState::Running {
        from.state.set(ThreadState::Ready);
    }
    if to.state.get() == ThreadState::Ready {
        to.state.set(ThreadState::Running);
    }

    #[cfg(feature = "yield-trace")]
    debug!(
        "leave for {} (saved sp = {:p})",
        to.name,
        to.stack_pointer.get().as_ptr()
    );

    CURRENT.store(next.0.as_ptr(), Ordering::Release);
    // SAFETY: `from` is the running thread, so its slot is where its cursor
    // belongs; `to` is suspended, so its cursor came from `prepare_stack` or
    // from its own last trip through here. Control blocks are never freed.
    unsafe { arch::switch(from.stack_pointer.as_ptr(), to.stack_pointer.get()) };

    #[cfg(feature = "yield-trace")]
    debug!("enter (resumed at sp = {:p})", from.stack_pointer.get().as_ptr());
}

/// The threads reachable from the current one by following `next`, in run
/// order, each listed once. The walk stops at the first thread seen twice, so
/// it terminates even after a relink has cut the current thread out of the
/// ring.
pub fn run_queue() -> Vec<ThreadHandle> {
    let mut threads = Vec::new();
    let Some(start) = current() else {
        return threads;
    };
    let mut cursor = start;
    while !threads.contains(&cursor) {
        threads.push(cursor);
        cursor = cursor.next();
    }
    threads
}

/// Links `thread` in directly after `anchor`.
pub(crate) fn insert_after(anchor: ThreadHandle, thread: ThreadHandle) {
    thread.link(anchor.next());
    anchor.link(thread);
}

#[cfg(test)]
pub(crate) fn reset() {
    CURRENT.store(ptr::null_mut(), Ordering::Release);
}
