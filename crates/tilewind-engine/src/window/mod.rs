//! Windows and their frame loop.
//!
//! A [`Window`] owns a native output window and, optionally, its engine.
//! Its loop is an explicit state machine advanced by [`Window::tick`]; the
//! [`Runtime`] keeps the registry of open windows and ticks them
//! round-robin. Hooks registered with `before_frame` / `after_frame` run
//! around every draw.

mod cancel;
mod config;
mod frame_loop;
mod runtime;
mod slot;

pub use cancel::CancelToken;
pub use config::{DrawFailurePolicy, WindowConfig};
pub use frame_loop::{FrameHook, LoopExit, Tick, Window, WindowId};
pub use runtime::Runtime;
pub use slot::EngineSlot;
