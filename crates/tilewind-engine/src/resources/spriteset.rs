use crate::engine::Tilengine;
use crate::error::EngineError;
use crate::native::{RawHandle, SpriteData, SpriteInfo};

use super::{Bitmap, NativeRef, Palette};

/// Named sprite graphics cut from a shared bitmap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpriteSet(NativeRef);

impl SpriteSet {
    pub fn new(tln: &Tilengine, bitmap: &Bitmap, data: &[SpriteData]) -> Result<Self, EngineError> {
        let bmp = bitmap.raw();
        NativeRef::create(tln, |n| n.create_spriteset(bmp, data)).map(Self)
    }

    /// Loads `<name>.png` plus its `.txt`/`.json` atlas description.
    pub fn load(tln: &Tilengine, name: &str) -> Result<Self, EngineError> {
        NativeRef::create(tln, |n| n.load_spriteset(name)).map(Self)
    }

    pub fn raw(&self) -> RawHandle {
        self.0.raw()
    }

    pub fn clone_spriteset(&self) -> Option<SpriteSet> {
        self.0.sibling(self.0.native().clone_spriteset(self.raw())).map(Self)
    }

    pub fn info(&self, entry: i32) -> Option<SpriteInfo> {
        self.0.native().spriteset_info(self.raw(), entry)
    }

    pub fn palette(&self) -> Option<Palette> {
        self.0
            .sibling(self.0.native().spriteset_palette(self.raw()))
            .map(Palette::from_ref)
    }

    /// Entry index of the sprite called `name`.
    pub fn find(&self, name: &str) -> Option<i32> {
        match self.0.native().find_spriteset_sprite(self.raw(), name) {
            -1 => None,
            index => Some(index),
        }
    }

    pub fn delete(self) -> bool {
        self.0.native().delete_spriteset(self.raw())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entries_from_bitmap() {
        let tln = Tilengine::headless();
        let bmp = Bitmap::new(&tln, 32, 16, 8).unwrap();
        let data = [
            SpriteData { name: "a".into(), x: 0, y: 0, w: 16, h: 16 },
            SpriteData { name: "b".into(), x: 16, y: 0, w: 16, h: 8 },
        ];
        let set = SpriteSet::new(&tln, &bmp, &data).unwrap();
        assert_eq!(set.find("b"), Some(1));
        assert_eq!(set.find("c"), None);
        assert_eq!(set.info(1), Some(SpriteInfo { w: 16, h: 8 }));
        assert_eq!(set.palette(), bmp.palette());
    }

    #[test]
    fn entries_must_fit_bitmap() {
        let tln = Tilengine::headless();
        let bmp = Bitmap::new(&tln, 8, 8, 8).unwrap();
        let data = [SpriteData { name: "big".into(), x: 0, y: 0, w: 16, h: 16 }];
        assert!(SpriteSet::new(&tln, &bmp, &data).is_err());
    }
}
