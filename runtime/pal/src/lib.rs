#![no_std]

/// Saved cursor into a suspended thread's stack.
///
/// Everything a suspended thread needs to resume lives on its own stack, below
/// this pointer; the pointer itself is the only thing kept in the thread's
/// control block.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StackPointer(*mut u8);

impl StackPointer {
    pub const fn null() -> Self {
        Self(core::ptr::null_mut())
    }

    pub const fn new(ptr: *mut u8) -> Self {
        Self(ptr)
    }

    pub const fn as_ptr(&self) -> *mut u8 {
        self.0
    }

    pub fn is_null(&self) -> bool {
        self.0.is_null()
    }
}

/// Entry point a fresh stack "returns" into on its first switch-in.
pub type StartRoutine = extern "C" fn() -> !;

pub trait ContextSwitch {
    /// Architecture name, for log lines.
    fn name(&self) -> &'static str;

    /// Writes a synthetic saved frame at the top of `[base, base + size)` so that
    /// switching to the returned pointer enters `start` with placeholder values in
    /// every callee-saved register.
    ///
    /// # Safety
    /// The region must be writable, owned by the caller, and large enough for
    /// the frame.
    unsafe fn prepare_stack(&self, base: *mut u8, size: usize, start: StartRoutine)
        -> StackPointer;

    /// Saves the callee-saved registers on the running stack, stores the
    /// resulting cursor through `save`, then restores the context saved at
    /// `load` and returns into it.
    ///
    /// Returns to the caller only when some other thread switches back to the
    /// cursor written through `save`.
    ///
    /// # Safety
    /// `save` must be valid for writes and `load` must come from
    /// `prepare_stack` or from an earlier `switch` on a stack that is still live.
    unsafe fn switch(&self, save: *mut StackPointer, load: StackPointer);
}
