use crate::engine::{Engine, EngineAccess, EngineRef};

/// Where a window finds its engine.
///
/// Owned and managed engines are mutually exclusive.
#[derive(Debug, Default)]
pub enum EngineSlot {
    #[default]
    Unset,
    /// Created by (or handed to) the window; dropped with it.
    Owned(Engine),
    /// Lifetime controlled elsewhere; reached through a shared ref.
    Managed(EngineRef),
}

impl EngineSlot {
    pub fn is_unset(&self) -> bool {
        matches!(self, Self::Unset)
    }

    pub fn is_owned(&self) -> bool {
        matches!(self, Self::Owned(_))
    }

    pub fn is_managed(&self) -> bool {
        matches!(self, Self::Managed(_))
    }

    pub fn managed_ref(&self) -> Option<&EngineRef> {
        match self {
            Self::Managed(r) => Some(r),
            _ => None,
        }
    }
}

impl EngineAccess for EngineSlot {
    fn with_engine<R>(&self, f: impl FnOnce(&Engine) -> R) -> Option<R> {
        match self {
            Self::Unset => None,
            Self::Owned(engine) => Some(f(engine)),
            Self::Managed(r) => r.with(f),
        }
    }

    fn with_engine_mut<R>(&mut self, f: impl FnOnce(&mut Engine) -> R) -> Option<R> {
        match self {
            Self::Unset => None,
            Self::Owned(engine) => Some(f(engine)),
            Self::Managed(r) => r.with_mut(f),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{EngineArgs, Tilengine};

    #[test]
    fn unset_has_no_engine() {
        let slot = EngineSlot::default();
        assert!(slot.is_unset());
        assert!(!slot.has_engine());
    }

    #[test]
    fn managed_follows_the_ref() {
        let tln = Tilengine::headless();
        let shared = EngineRef::pending();
        let mut slot = EngineSlot::Managed(shared.clone());
        assert!(!slot.has_engine());

        let _ = shared.replace(tln.create_engine(&EngineArgs::default()).unwrap());
        assert!(slot.has_engine());
        slot.with_engine_mut(|e| e.set_target_fps(25));
        assert_eq!(shared.with(|e| e.target_fps()), Some(25));
        assert!(slot.managed_ref().is_some_and(|r| r.ptr_eq(&shared)));
    }

    #[test]
    fn owned_engine_drops_with_slot() {
        let tln = Tilengine::headless();
        let slot = EngineSlot::Owned(tln.create_engine(&EngineArgs::default()).unwrap());
        assert!(slot.is_owned());
        drop(slot);
        assert!(!tln.has_live_engine());
    }
}
