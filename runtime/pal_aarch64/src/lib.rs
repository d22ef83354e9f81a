#![cfg_attr(not(test), no_std)]

#[cfg(target_arch = "aarch64")]
mod switch;

#[cfg(target_arch = "aarch64")]
pub use switch::{Platform, INITIAL_FRAME_SIZE, PAL_PLATFORM};
