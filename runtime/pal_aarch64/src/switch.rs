//! Stack switching for AAPCS64.
//!
//! The saved frame is 160 bytes: `x19`..`x28`, the frame pointer and the link
//! register in pairs, then `d8`..`d15`. `ret` jumps to the restored `x30`, so a
//! fresh frame only has to plant the start routine there.

use core::arch::naked_asm;

use klib::constants::{ARCH_WORD_SIZE, STACK_ALIGNMENT};
use klib::align_down;
use pal::{ContextSwitch, StackPointer, StartRoutine};

pub const INITIAL_FRAME_SIZE: usize = 20 * ARCH_WORD_SIZE;

const LINK_REGISTER_SLOT: usize = 11;

pub struct Platform {}

pub static PAL_PLATFORM: Platform = Platform {};

impl ContextSwitch for Platform {
    fn name(&self) -> &'static str {
        "aarch64"
    }

    unsafe fn prepare_stack(
        &self,
        base: *mut u8,
        size: usize,
        start: StartRoutine,
    ) -> StackPointer {
        debug_assert!(size >= INITIAL_FRAME_SIZE + STACK_ALIGNMENT);
        let top = align_down(base as usize + size, STACK_ALIGNMENT);
        let frame = (top - INITIAL_FRAME_SIZE) as *mut u64;

        for slot in 0..INITIAL_FRAME_SIZE / ARCH_WORD_SIZE {
            // x19.. get recognisable junk, the fp and the d registers start at zero
            let value = match slot {
                0..=9 => 0x1111 + slot as u64,
                LINK_REGISTER_SLOT => start as usize as u64,
                _ => 0,
            };
            frame.add(slot).write(value);
        }

        StackPointer::new(frame as *mut u8)
    }

    #[inline(always)]
    unsafe fn switch(&self, save: *mut StackPointer, load: StackPointer) {
        switch_stacks(save, load)
    }
}

#[unsafe(naked)]
unsafe extern "C" fn switch_stacks(_save: *mut StackPointer, _load: StackPointer) {
    naked_asm!(
        "sub sp, sp, #160",
        "stp x19, x20, [sp, #0]",
        "stp x21, x22, [sp, #16]",
        "stp x23, x24, [sp, #32]",
        "stp x25, x26, [sp, #48]",
        "stp x27, x28, [sp, #64]",
        "stp x29, x30, [sp, #80]",
        "stp d8, d9, [sp, #96]",
        "stp d10, d11, [sp, #112]",
        "stp d12, d13, [sp, #128]",
        "stp d14, d15, [sp, #144]",
        // *save = sp; sp = load
        "mov x9, sp",
        "str x9, [x0]",
        "mov sp, x1",
        "ldp x19, x20, [sp, #0]",
        "ldp x21, x22, [sp, #16]",
        "ldp x23, x24, [sp, #32]",
        "ldp x25, x26, [sp, #48]",
        "ldp x27, x28, [sp, #64]",
        "ldp x29, x30, [sp, #80]",
        "ldp d8, d9, [sp, #96]",
        "ldp d10, d11, [sp, #112]",
        "ldp d12, d13, [sp, #128]",
        "ldp d14, d15, [sp, #144]",
        "add sp, sp, #160",
        "ret",
    );
}
