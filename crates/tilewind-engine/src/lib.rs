//! Tilewind engine crate.
//!
//! Handles over the Tilengine C API plus a cooperative window frame loop.
//! Everything runs against a [`native::Native`] backend: the linked library
//! (feature `native`) or the in-memory headless backend used by tests.

pub mod engine;
pub mod error;
pub mod logging;
pub mod native;
pub mod resources;
pub mod time;
pub mod window;

pub use engine::{Engine, EngineAccess, EngineArgs, EngineRef, Tilengine};
pub use error::{EngineError, WindowError};
pub use window::{Runtime, Window, WindowConfig};
