//! Stack switching for the x86-64 System V ABI.
//!
//! A suspended thread's stack looks like this, from its saved stack pointer up:
//!
//! ```text
//! sp + 0x00  MXCSR (low dword) and x87 control word
//! sp + 0x08  r15
//! sp + 0x10  r14
//! sp + 0x18  r13
//! sp + 0x20  r12
//! sp + 0x28  rbx
//! sp + 0x30  rbp
//! sp + 0x38  resume address
//! ```
//!
//! `rax`, `rcx`, `rdx`, `rsi`, `rdi` and `r8`..`r11` are caller-saved, so the
//! compiler has already spilled anything live in them around the call.

use core::arch::naked_asm;

use klib::align_down;
use klib::constants::{ARCH_WORD_SIZE, STACK_ALIGNMENT};
use pal::{ContextSwitch, StackPointer, StartRoutine};

/// Bytes a fresh stack loses to its synthetic frame, including the fake return
/// address above the start routine.
pub const INITIAL_FRAME_SIZE: usize = 9 * ARCH_WORD_SIZE;

/// Power-on MXCSR (all exceptions masked, round to nearest) in the low dword,
/// default x87 control word above it.
const INITIAL_CONTROL_WORDS: u64 = 0x1f80 | (0x037f << 32);

pub struct Platform {}

pub static PAL_PLATFORM: Platform = Platform {};

impl ContextSwitch for Platform {
    fn name(&self) -> &'static str {
        "x86_64"
    }

    unsafe fn prepare_stack(
        &self,
        base: *mut u8,
        size: usize,
        start: StartRoutine,
    ) -> StackPointer {
        debug_assert!(size >= INITIAL_FRAME_SIZE + STACK_ALIGNMENT);
        let top = align_down(base as usize + size, STACK_ALIGNMENT);
        let mut frame = FrameWriter {
            cursor: base.add(top - base as usize) as *mut u64,
        };

        // `start` is entered by `ret`, so it sees rsp = top - 8 exactly as if it
        // had been called; the zero is the return address it must never use.
        frame.push(0);
        frame.push(start as usize as u64);
        frame.push(0x1116); // rbp
        frame.push(0x1115); // rbx
        frame.push(0x1114); // r12
        frame.push(0x1113); // r13
        frame.push(0x1112); // r14
        frame.push(0x1111); // r15
        frame.push(INITIAL_CONTROL_WORDS);

        StackPointer::new(frame.cursor as *mut u8)
    }

    #[inline(always)]
    unsafe fn switch(&self, save: *mut StackPointer, load: StackPointer) {
        switch_stacks(save, load)
    }
}

struct FrameWriter {
    cursor: *mut u64,
}

impl FrameWriter {
    unsafe fn push(&mut self, value: u64) {
        self.cursor = self.cursor.sub(1);
        self.cursor.write(value);
    }
}

#[unsafe(naked)]
unsafe extern "sysv64" fn switch_stacks(_save: *mut StackPointer, _load: StackPointer) {
    naked_asm!(
        "push rbp",
        "push rbx",
        "push r12",
        "push r13",
        "push r14",
        "push r15",
        "sub rsp, 8",
        "stmxcsr [rsp]",
        "fnstcw [rsp + 4]",
        // *save = rsp; rsp = load
        "mov [rdi], rsp",
        "mov rsp, rsi",
        "ldmxcsr [rsp]",
        "fldcw [rsp + 4]",
        "add rsp, 8",
        "pop r15",
        "pop r14",
        "pop r13",
        "pop r12",
        "pop rbx",
        "pop rbp",
        "ret",
    );
}
