use crate::engine::Tilengine;
use crate::error::EngineError;
use crate::native::{ColorStrip, RawHandle, SequenceFrame, SequenceInfo};

use super::{NativeRef, SpriteSet};

/// Timed frame list (tile/sprite animation) or palette color cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sequence(NativeRef);

impl Sequence {
    /// Frame sequence; `target` is the tile or picture index it animates.
    pub fn frames(tln: &Tilengine, name: &str, target: i32, frames: &[SequenceFrame]) -> Result<Self, EngineError> {
        NativeRef::create(tln, |n| n.create_sequence(name, target, frames)).map(Self)
    }

    /// Palette color-cycle sequence.
    pub fn cycle(tln: &Tilengine, name: &str, strips: &[ColorStrip]) -> Result<Self, EngineError> {
        NativeRef::create(tln, |n| n.create_cycle(name, strips)).map(Self)
    }

    /// Sprite animation over the spriteset entries named `basename1`, `basename2`, ...
    pub fn from_spriteset(tln: &Tilengine, name: &str, spriteset: &SpriteSet, basename: &str, delay: i32) -> Result<Self, EngineError> {
        let set = spriteset.raw();
        NativeRef::create(tln, |n| n.create_sprite_sequence(name, set, basename, delay)).map(Self)
    }

    pub fn raw(&self) -> RawHandle {
        self.0.raw()
    }

    pub fn clone_sequence(&self) -> Option<Sequence> {
        self.0.sibling(self.0.native().clone_sequence(self.raw())).map(Self)
    }

    pub fn info(&self) -> Option<SequenceInfo> {
        self.0.native().sequence_info(self.raw())
    }

    pub fn delete(self) -> bool {
        self.0.native().delete_sequence(self.raw())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frames_sequence_info() {
        let tln = Tilengine::headless();
        let frames = [SequenceFrame { index: 1, delay: 4 }, SequenceFrame { index: 2, delay: 4 }];
        let seq = Sequence::frames(&tln, "water", 1, &frames).unwrap();
        let info = seq.info().unwrap();
        assert_eq!(info.name, "water");
        assert_eq!(info.num_frames, 2);
    }

    #[test]
    fn empty_sequence_is_rejected() {
        let tln = Tilengine::headless();
        assert!(Sequence::cycle(&tln, "none", &[]).is_err());
    }

    #[test]
    fn sprite_sequence_counts_matching_entries() {
        let tln = Tilengine::headless();
        let set = SpriteSet::load(&tln, "walk").unwrap();
        let seq = Sequence::from_spriteset(&tln, "walking", &set, "walk", 6).unwrap();
        assert_eq!(seq.info().map(|i| i.num_frames), Some(4));
    }
}
