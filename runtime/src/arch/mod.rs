use pal::{ContextSwitch, StackPointer, StartRoutine};

#[cfg(target_arch = "aarch64")]
use pal_aarch64::PAL_PLATFORM;
#[cfg(target_arch = "x86_64")]
use pal_x86_64::PAL_PLATFORM;

#[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
compile_error!("the runtime only has context switch support for x86_64 and aarch64");

#[inline]
pub fn name() -> &'static str {
    PAL_PLATFORM.name()
}

/// # Safety
/// See [`ContextSwitch::prepare_stack`].
#[inline]
pub unsafe fn prepare_stack(base: *mut u8, size: usize, start: StartRoutine) -> StackPointer {
    PAL_PLATFORM.prepare_stack(base, size, start)
}

/// # Safety
/// See [`ContextSwitch::switch`].
#[inline]
pub unsafe fn switch(save: *mut StackPointer, load: StackPointer) {
    PAL_PLATFORM.switch(save, load)
}
