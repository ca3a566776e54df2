//! motion.sample.v1 input and shake.event.v1 output schemas
//!
//! This module defines the newline-delimited wire format used by streaming
//! sources and the CLI, plus batch helpers for recordings.

mod adapter;
mod motion_event;

pub use adapter::*;
pub use motion_event::*;
