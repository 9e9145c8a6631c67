//! Engine subsystem.
//!
//! A [`Tilengine`] handle owns the backend and hands out at most one live
//! [`Engine`] at a time. Consumers that need "the engine" before it exists,
//! or across reassignments, go through an [`EngineRef`]; [`EngineAccess`]
//! reaches either uniformly.

mod args;
mod context;
mod engine_ref;
mod slots;
mod tilengine;

pub use args::{EngineArgs, MAX_DIMENSION};
pub use context::Engine;
pub use engine_ref::{EngineAccess, EngineRef};
pub use slots::{Animation, Layer, Sprite};
pub use tilengine::Tilengine;
