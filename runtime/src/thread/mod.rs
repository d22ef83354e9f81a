//! Thread control blocks and the spawner.
//!
//! Every thread, including the bootstrap thread, is a leaked [`Thread`]; the run
//! queue is the circular list formed by their `next` links.

use core::cell::Cell;
use core::fmt::{self, Debug};
use core::ptr::NonNull;
use core::sync::atomic::{AtomicUsize, Ordering};

use alloc::boxed::Box;
use alloc::format;
use alloc::string::String;
use klib::constants::{DEFAULT_STACK_SIZE, MIN_STACK_SIZE, THREAD_NAME_MAX};
use klib::ByteSize;
use pal::StackPointer;

use crate::errors::RuntimeError;
use crate::{arch, debug, fatal};

use self::context::{thread_start, Stack, ThreadState};

pub(crate) mod context;
pub(crate) mod scheduler;

static NEXT_THREAD_ID: AtomicUsize = AtomicUsize::new(1);

pub(crate) struct Thread {
    id: usize,
    name: String,
    /// `None` for the bootstrap thread, which runs on the process stack.
    stack: Option<Stack>,
    stack_pointer: Cell<StackPointer>,
    next: Cell<NonNull<Thread>>,
    state: Cell<ThreadState>,
    entry: Cell<Option<Box<dyn FnOnce()>>>,
}

impl Thread {
    fn bootstrap() -> Thread {
        Thread {
            id: 0,
            name: String::from("bootstrap"),
            stack: None,
            stack_pointer: Cell::new(StackPointer::null()),
            next: Cell::new(NonNull::dangling()),
            state: Cell::new(ThreadState::Running),
            entry: Cell::new(None),
        }
    }

    /// Leaks the control block; its address is its identity from now on and
    /// the `next` link starts out pointing back at itself.
    fn leak(self) -> ThreadHandle {
        let thread: &'static Thread = Box::leak(Box::new(self));
        let handle = ThreadHandle(NonNull::from(thread));
        thread.next.set(handle.0);
        handle
    }
}

/// Non-owning reference to a thread control block.
///
/// Control blocks are never freed, so a handle stays valid for the life of the
/// process. Handles are `!Send`: the whole runtime lives on one OS thread.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct ThreadHandle(NonNull<Thread>);

impl ThreadHandle {
    pub(crate) fn thread(&self) -> &'static Thread {
        // SAFETY: control blocks are leaked in `Thread::leak` and never freed.
        unsafe { &*self.0.as_ptr() }
    }

    pub fn id(&self) -> usize {
        self.thread().id
    }

    pub fn name(&self) -> &'static str {
        &self.thread().name
    }

    pub fn state(&self) -> ThreadState {
        self.thread().state.get()
    }

    /// The thread that runs after this one.
    pub fn next(&self) -> ThreadHandle {
        ThreadHandle(self.thread().next.get())
    }

    /// Makes `next` run after this thread.
    ///
    /// Relinking can take threads out of the rotation for good (nothing points
    /// at them any more). That is allowed; it is how a program hands the
    /// processor to a fixed set of threads.
    pub fn link(&self, next: ThreadHandle) {
        self.thread().next.set(next.0);
    }

    /// Size of the thread's own stack, or `None` for the bootstrap thread.
    pub fn stack_size(&self) -> Option<usize> {
        self.thread().stack.as_ref().map(Stack::size)
    }

    /// Whether the saved stack pointer lies inside the thread's own stack.
    /// Always true for the bootstrap thread and for the running thread.
    pub fn stack_pointer_in_bounds(&self) -> bool {
        let thread = self.thread();
        match &thread.stack {
            Some(stack) if !self.is_current() => stack.contains(thread.stack_pointer.get()),
            _ => true,
        }
    }

    pub fn is_current(&self) -> bool {
        crate::current() == Some(*self)
    }
}

impl Debug for ThreadHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThreadHandle")
            .field("id", &self.id())
            .field("name", &self.name())
            .field("state", &self.state())
            .finish()
    }
}

/// Thread factory, for spawning with a name and stack size of your choosing.
pub struct Builder {
    name: Option<String>,
    stack_size: usize,
}

impl Builder {
    pub fn new() -> Builder {
        Builder {
            name: None,
            stack_size: DEFAULT_STACK_SIZE,
        }
    }

    /// Names the thread. Names longer than `THREAD_NAME_MAX` bytes are cut short.
    pub fn name(mut self, name: &str) -> Builder {
        self.name = Some(truncate_name(name));
        self
    }

    pub fn stack_size(mut self, size: usize) -> Builder {
        self.stack_size = size;
        self
    }

    /// Creates the thread and links it in directly after the current thread.
    ///
    /// The thread does not run until the scheduler reaches it. `entry` is
    /// expected to loop forever; if it returns, the thread parks.
    pub fn spawn<F>(self, entry: F) -> Result<ThreadHandle, RuntimeError>
    where
        F: FnOnce() + 'static,
    {
        let current = crate::current().ok_or_else(RuntimeError::not_bootstrapped)?;
        if self.stack_size < MIN_STACK_SIZE {
            return Err(RuntimeError::stack_too_small(self.stack_size, MIN_STACK_SIZE));
        }

        let stack = Stack::allocate(self.stack_size)?;
        // SAFETY: the stack was just allocated, is owned by this thread and is
        // at least MIN_STACK_SIZE bytes.
        let stack_pointer = unsafe { arch::prepare_stack(stack.base(), stack.size(), thread_start) };
        let id = NEXT_THREAD_ID.fetch_add(1, Ordering::Relaxed);
        let name = self.name.unwrap_or_else(|| format!("thread-{}", id));
        let stack_base = stack.base();

        let handle = Thread {
            id,
            name,
            stack: Some(stack),
            stack_pointer: Cell::new(stack_pointer),
            next: Cell::new(NonNull::dangling()),
            state: Cell::new(ThreadState::Ready),
            entry: Cell::new(Some(Box::new(entry))),
        }
        .leak();

        scheduler::insert_after(current, handle);
        debug!(
            "allocated thread {} (#{}) with a {} stack at {:p} (initial sp = {:p})",
            handle.name(),
            id,
            ByteSize(self.stack_size as u64),
            stack_base,
            stack_pointer.as_ptr()
        );
        Ok(handle)
    }
}

impl Default for Builder {
    fn default() -> Self {
        Self::new()
    }
}

/// Spawns `entry` on a new thread with the default stack size.
///
/// # Panics
/// Failing to create a thread is fatal: this panics if the runtime has not been
/// bootstrapped or the stack cannot be allocated. Use [`try_spawn`] or
/// [`Builder::spawn`] to handle those cases.
pub fn spawn<F>(name: &str, entry: F) -> ThreadHandle
where
    F: FnOnce() + 'static,
{
    match try_spawn(name, entry) {
        Ok(handle) => handle,
        Err(error) => {
            fatal!("cannot spawn {}: {}", name, error);
            panic!("cannot spawn {}: {}", name, error);
        }
    }
}

pub fn try_spawn<F>(name: &str, entry: F) -> Result<ThreadHandle, RuntimeError>
where
    F: FnOnce() + 'static,
{
    Builder::new().name(name).spawn(entry)
}

fn truncate_name(name: &str) -> String {
    let mut end = name.len().min(THREAD_NAME_MAX);
    while !name.is_char_boundary(end) {
        end -= 1;
    }
    String::from(&name[..end])
}
