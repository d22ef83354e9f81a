use std::sync::{Mutex, MutexGuard};

use crate::{bootstrap, ThreadHandle};

static SERIAL: Mutex<()> = Mutex::new(());

/// The runtime is process-wide and the test harness runs tests on several OS
/// threads, so runtime tests take turns. Each gets a freshly bootstrapped run
/// queue on its own OS thread.
pub(crate) fn exclusive_runtime() -> (MutexGuard<'static, ()>, ThreadHandle) {
    let guard = SERIAL.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    // SAFETY: the guard keeps every other runtime test off the runtime while
    // this one uses it from the current OS thread.
    let boot = unsafe { bootstrap() };
    (guard, boot)
}
