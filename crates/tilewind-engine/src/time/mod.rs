//! Frame timing.
//!
//! One `FrameClock` per window loop. The loop collects a `FrameArgs` before
//! the `before_frame` hooks and again before the `after_frame` hooks, so each
//! hook round sees the time elapsed since the previous collection.

mod frame_clock;

pub use frame_clock::{FrameArgs, FrameClock};
