//! Frame scheduling module
//!
//! A single ordered callback registry driving one logical tick per display
//! refresh. The host loop owns the clock and calls [`FrameScheduler::tick`]
//! with the frame delta; handlers run synchronously, in a stable total
//! order, on the calling thread.

pub mod scheduler;

pub use scheduler::{FrameHandle, FrameHandlerOptions, FrameScheduler};
