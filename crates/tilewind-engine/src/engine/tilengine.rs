use std::cell::Cell;
use std::rc::Rc;

use crate::engine::{Engine, EngineArgs};
use crate::error::EngineError;
use crate::native::{Headless, HeadlessConfig, Native};

/// Entry handle: a backend plus the one-live-engine guard.
///
/// Cheap to clone; clones share the guard. Engines, windows and resources
/// are all created through it.
///
/// Invariant:
/// - at most one [`Engine`] is live per handle (and its clones).
#[derive(Clone)]
pub struct Tilengine {
    native: Rc<dyn Native>,
    live: Rc<Cell<bool>>,
}

impl Tilengine {
    /// Wraps an arbitrary backend.
    pub fn from_backend(native: Rc<dyn Native>) -> Self {
        Self {
            native,
            live: Rc::new(Cell::new(false)),
        }
    }

    /// In-memory backend with default settings.
    pub fn headless() -> Self {
        Self::headless_with(HeadlessConfig::default())
    }

    pub fn headless_with(config: HeadlessConfig) -> Self {
        Self::from_backend(Rc::new(Headless::new(config)))
    }

    /// The linked native library.
    ///
    /// The library keeps process-global state, so only the first call in a
    /// process succeeds; later calls return [`EngineError::BackendClaimed`].
    #[cfg(feature = "native")]
    pub fn native() -> Result<Self, EngineError> {
        use std::sync::atomic::{AtomicBool, Ordering};

        static CLAIMED: AtomicBool = AtomicBool::new(false);
        if CLAIMED.swap(true, Ordering::AcqRel) {
            return Err(EngineError::BackendClaimed);
        }
        Ok(Self::from_backend(Rc::new(crate::native::Ffi::new())))
    }

    pub fn backend(&self) -> &Rc<dyn Native> {
        &self.native
    }

    pub fn has_live_engine(&self) -> bool {
        self.live.get()
    }

    /// Initializes a native context.
    ///
    /// Fails with [`EngineError::AlreadyInitialized`] while another engine
    /// created through this handle is live; the live engine is untouched.
    pub fn create_engine(&self, args: &EngineArgs) -> Result<Engine, EngineError> {
        args.validate()?;
        if self.live.get() {
            return Err(EngineError::AlreadyInitialized);
        }

        let context = self
            .native
            .init(args.width(), args.height(), args.layers(), args.sprites(), args.animations())
            .ok_or_else(|| EngineError::Native(self.native.last_error()))?;

        self.native.set_target_fps(args.target_fps());
        if let Some(path) = args.load_path() {
            self.native.set_load_path(Some(path));
        }

        self.live.set(true);
        log::debug!(
            "engine created: {}x{}, {} layers, {} sprites, {} animations",
            args.width(),
            args.height(),
            args.layers(),
            args.sprites(),
            args.animations()
        );
        Ok(Engine::from_context(self.clone(), context, args))
    }

    pub(crate) fn release(&self) {
        self.live.set(false);
    }
}
