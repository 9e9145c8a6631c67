use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::engine::Engine;

/// Uniform access to "the engine", wherever it is stored.
pub trait EngineAccess {
    /// Runs `f` on the engine; `None` when there is no engine to reach.
    fn with_engine<R>(&self, f: impl FnOnce(&Engine) -> R) -> Option<R>;

    fn with_engine_mut<R>(&mut self, f: impl FnOnce(&mut Engine) -> R) -> Option<R>;

    fn has_engine(&self) -> bool {
        self.with_engine(|_| ()).is_some()
    }
}

impl EngineAccess for Engine {
    fn with_engine<R>(&self, f: impl FnOnce(&Engine) -> R) -> Option<R> {
        Some(f(self))
    }

    fn with_engine_mut<R>(&mut self, f: impl FnOnce(&mut Engine) -> R) -> Option<R> {
        Some(f(self))
    }
}

/// Shared, reassignable engine slot.
///
/// Clones alias one slot: [`replace`](Self::replace) on any clone is seen by
/// all of them. A slot may start empty ([`pending`](Self::pending)) and be
/// filled once the engine exists. The slot only holds the engine; whoever
/// empties it decides when it is dropped.
#[derive(Clone, Default)]
pub struct EngineRef(Rc<RefCell<Option<Engine>>>);

impl EngineRef {
    pub fn new(engine: Engine) -> Self {
        Self(Rc::new(RefCell::new(Some(engine))))
    }

    /// Empty slot for an engine that does not exist yet.
    pub fn pending() -> Self {
        Self::default()
    }

    /// Reads the engine. `None` when the slot is empty or already borrowed
    /// mutably (a re-entrant call from inside [`with_mut`](Self::with_mut)).
    pub fn with<R>(&self, f: impl FnOnce(&Engine) -> R) -> Option<R> {
        let slot = self.0.try_borrow().ok()?;
        slot.as_ref().map(f)
    }

    /// Mutates the engine in place; every alias observes the result once `f`
    /// returns.
    pub fn with_mut<R>(&self, f: impl FnOnce(&mut Engine) -> R) -> Option<R> {
        let mut slot = self.0.try_borrow_mut().ok()?;
        slot.as_mut().map(f)
    }

    /// Installs `engine`, returning the previous one.
    ///
    /// Returns `Err(engine)` unchanged if the slot is in use.
    pub fn replace(&self, engine: Engine) -> Result<Option<Engine>, Engine> {
        match self.0.try_borrow_mut() {
            Ok(mut slot) => Ok(slot.replace(engine)),
            Err(_) => Err(engine),
        }
    }

    /// Empties the slot.
    pub fn take(&self) -> Option<Engine> {
        self.0.try_borrow_mut().ok()?.take()
    }

    pub fn is_set(&self) -> bool {
        self.0.try_borrow().map(|s| s.is_some()).unwrap_or(true)
    }

    /// `true` when both refs alias the same slot.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl From<Engine> for EngineRef {
    fn from(engine: Engine) -> Self {
        Self::new(engine)
    }
}

impl EngineAccess for EngineRef {
    fn with_engine<R>(&self, f: impl FnOnce(&Engine) -> R) -> Option<R> {
        self.with(f)
    }

    fn with_engine_mut<R>(&mut self, f: impl FnOnce(&mut Engine) -> R) -> Option<R> {
        self.with_mut(f)
    }
}

impl fmt::Debug for EngineRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.try_borrow() {
            Ok(slot) => f.debug_tuple("EngineRef").field(&*slot).finish(),
            Err(_) => f.write_str("EngineRef(<in use>)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{EngineArgs, Tilengine};
    use crate::native::Color;

    #[test]
    fn aliases_observe_mutation() {
        let tln = Tilengine::headless();
        let shared = EngineRef::new(tln.create_engine(&EngineArgs::default()).unwrap());
        let alias = shared.clone();

        shared.with_mut(|e| e.set_target_fps(30)).unwrap();
        assert_eq!(alias.with(|e| e.target_fps()), Some(30));
        assert!(alias.ptr_eq(&shared));
    }

    #[test]
    fn pending_slot_is_filled_later() {
        let tln = Tilengine::headless();
        let slot = EngineRef::pending();
        let consumer = slot.clone();
        assert!(!consumer.is_set());
        assert_eq!(consumer.with(|e| e.num_layers()), None);

        let old = slot
            .replace(tln.create_engine(&EngineArgs::new().with_layers(5)).unwrap())
            .unwrap();
        assert!(old.is_none());
        assert_eq!(consumer.with(|e| e.num_layers()), Some(5));
    }

    #[test]
    fn take_empties_every_alias() {
        let tln = Tilengine::headless();
        let shared = EngineRef::new(tln.create_engine(&EngineArgs::default()).unwrap());
        let alias = shared.clone();
        let engine = alias.take().unwrap();
        assert!(!shared.is_set());
        engine.delete();
        assert!(!tln.has_live_engine());
    }

    #[test]
    fn reentrant_access_yields_none() {
        let tln = Tilengine::headless();
        let shared = EngineRef::new(tln.create_engine(&EngineArgs::default()).unwrap());
        let alias = shared.clone();
        let inner = shared.with_mut(|e| {
            e.set_background_color(Color::WHITE);
            alias.with(|e| e.width())
        });
        assert_eq!(inner, Some(None));
    }

    #[test]
    fn separate_refs_are_not_aliases() {
        assert!(!EngineRef::pending().ptr_eq(&EngineRef::pending()));
    }

    #[test]
    fn owned_engine_is_always_reachable() {
        let tln = Tilengine::headless();
        let mut engine = tln.create_engine(&EngineArgs::default()).unwrap();
        assert!(engine.has_engine());
        assert_eq!(engine.with_engine_mut(|e| e.resolution()), Some((384, 216)));
    }
}
