use core::alloc::Layout;
use core::ptr::NonNull;

use alloc::alloc::alloc;
use klib::constants::STACK_ALIGNMENT;
use pal::StackPointer;

use crate::errors::RuntimeError;
use crate::info;

#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum ThreadState {
    /// Linked into the run queue and waiting for its turn.
    Ready,
    Running,
    /// The entry procedure returned. The thread stays linked and only yields.
    Finished,
}

/// A thread's private stack. Stacks are never freed because threads never exit.
pub(crate) struct Stack {
    base: NonNull<u8>,
    size: usize,
}

impl Stack {
    pub(crate) fn allocate(size: usize) -> Result<Stack, RuntimeError> {
        let layout = Layout::from_size_align(size, STACK_ALIGNMENT)
            .map_err(|_| RuntimeError::out_of_memory("a thread stack", size))?;
        // SAFETY: the builder rejects sizes below MIN_STACK_SIZE, so the layout is non-zero.
        let base = unsafe { alloc(layout) };
        let base =
            NonNull::new(base).ok_or_else(|| RuntimeError::out_of_memory("a thread stack", size))?;
        Ok(Stack { base, size })
    }

    pub(crate) fn base(&self) -> *mut u8 {
        self.base.as_ptr()
    }

    pub(crate) fn size(&self) -> usize {
        self.size
    }

    pub(crate) fn contains(&self, sp: StackPointer) -> bool {
        let start = self.base.as_ptr() as usize;
        (start..=start + self.size).contains(&(sp.as_ptr() as usize))
    }
}

/// First code every spawned thread runs; its address is the resume address
/// planted by `prepare_stack`.
pub(crate) extern "C" fn thread_start() -> ! {
    let Some(handle) = crate::current() else {
        unreachable!("switched into a fresh stack with no current thread");
    };
    let thread = handle.thread();

    if let Some(entry) = thread.entry.take() {
        entry();
    }

    thread.state.set(ThreadState::Finished);
    info!("entry procedure returned; parking {}", thread.name);
    loop {
        crate::yield_now();
    }
}
