use core::fmt::Display;

use alloc::format;
use alloc::string::String;
use klib::ByteSize;

#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Ord, Eq)]
pub enum RuntimeErrorCode {
    NotBootstrapped = 1,
    StackTooSmall = 2,
    OutOfMemory = 3,
}

#[derive(Clone, Debug)]
pub struct RuntimeError {
    error_code: RuntimeErrorCode,
    message: String,
}

impl RuntimeError {
    pub fn new(error_code: RuntimeErrorCode, message: String) -> Self {
        Self {
            error_code,
            message,
        }
    }

    pub fn not_bootstrapped() -> Self {
        Self::new(
            RuntimeErrorCode::NotBootstrapped,
            String::from("no current thread; bootstrap the runtime first"),
        )
    }

    pub fn stack_too_small(requested: usize, minimum: usize) -> Self {
        Self::new(
            RuntimeErrorCode::StackTooSmall,
            format!(
                "requested a {} stack, at least {} is required",
                ByteSize(requested as u64),
                ByteSize(minimum as u64)
            ),
        )
    }

    pub fn out_of_memory(what: &str, size: usize) -> Self {
        Self::new(
            RuntimeErrorCode::OutOfMemory,
            format!("could not allocate {} for {}", ByteSize(size as u64), what),
        )
    }

    pub fn error_code(&self) -> RuntimeErrorCode {
        self.error_code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for RuntimeError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "{:04x} - {:?} - {}",
            self.error_code as u64, self.error_code, self.message
        )
    }
}

impl core::error::Error for RuntimeError {}
