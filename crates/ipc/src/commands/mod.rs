//! Command types for IPC messages.

mod eraser;

pub use eraser::*;
