//! Render resource handles.
//!
//! Each type wraps one native object. Handles are `Clone`: a clone is
//! another reference to the same native object, not a copy (use the
//! `clone_*` methods for that). Nothing is freed on drop; call `delete`
//! exactly once on resources you created. Handles returned by getters such
//! as [`crate::engine::Layer::bitmap`] belong to something else and should
//! not be deleted.

mod bitmap;
mod object_list;
mod palette;
mod sequence;
mod spriteset;
mod tilemap;
mod tileset;

use std::fmt;
use std::rc::Rc;

pub use bitmap::{Bitmap, Rect, Vec2i};
pub use object_list::ObjectList;
pub use palette::Palette;
pub use sequence::Sequence;
pub use spriteset::SpriteSet;
pub use tilemap::Tilemap;
pub use tileset::Tileset;

use crate::engine::Tilengine;
use crate::error::EngineError;
use crate::native::{Native, RawHandle};

/// Native object reference shared by all resource types.
#[derive(Clone)]
pub(crate) struct NativeRef {
    raw: RawHandle,
    native: Rc<dyn Native>,
}

impl NativeRef {
    pub(crate) fn new(raw: RawHandle, native: Rc<dyn Native>) -> Self {
        Self { raw, native }
    }

    /// Runs a native constructor; a null result becomes the native last error.
    pub(crate) fn create(
        tln: &Tilengine,
        ctor: impl FnOnce(&dyn Native) -> Option<RawHandle>,
    ) -> Result<Self, EngineError> {
        let native = tln.backend();
        match ctor(native.as_ref()) {
            Some(raw) => Ok(Self::new(raw, native.clone())),
            None => Err(EngineError::Native(native.last_error())),
        }
    }

    /// Wraps a possibly-null result of a call on the same backend.
    pub(crate) fn sibling(&self, raw: Option<RawHandle>) -> Option<Self> {
        raw.map(|raw| Self::new(raw, self.native.clone()))
    }

    pub(crate) fn raw(&self) -> RawHandle {
        self.raw
    }

    pub(crate) fn native(&self) -> &dyn Native {
        self.native.as_ref()
    }
}

impl fmt::Debug for NativeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.raw.addr())
    }
}

impl PartialEq for NativeRef {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl Eq for NativeRef {}
