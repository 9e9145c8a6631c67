use crate::engine::Tilengine;
use crate::error::EngineError;
use crate::native::{Color, RawHandle};

use super::NativeRef;

/// Native color table (up to 256 entries).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette(NativeRef);

impl Palette {
    pub fn new(tln: &Tilengine, entries: i32) -> Result<Self, EngineError> {
        NativeRef::create(tln, |n| n.create_palette(entries)).map(Self)
    }

    /// Loads a `.act` palette file.
    pub fn load(tln: &Tilengine, filename: &str) -> Result<Self, EngineError> {
        NativeRef::create(tln, |n| n.load_palette(filename)).map(Self)
    }

    pub(crate) fn from_ref(r: NativeRef) -> Self {
        Self(r)
    }

    pub fn raw(&self) -> RawHandle {
        self.0.raw()
    }

    pub fn clone_palette(&self) -> Option<Palette> {
        self.0.sibling(self.0.native().clone_palette(self.raw())).map(Self)
    }

    pub fn set_color(&self, index: i32, color: Color) -> bool {
        self.0.native().set_palette_color(self.raw(), index, color)
    }

    pub fn color(&self, index: i32) -> Option<Color> {
        self.0.native().palette_color(self.raw(), index)
    }

    /// Writes the blend of `a` and `b` into this palette; `factor` 0 is all `a`.
    pub fn mix(&self, a: &Palette, b: &Palette, factor: u8) -> bool {
        self.0.native().mix_palettes(a.raw(), b.raw(), self.raw(), factor)
    }

    pub fn add_color(&self, color: Color, start: u8, count: u8) -> bool {
        self.0.native().add_palette_color(self.raw(), color, start, count)
    }

    pub fn sub_color(&self, color: Color, start: u8, count: u8) -> bool {
        self.0.native().sub_palette_color(self.raw(), color, start, count)
    }

    pub fn mod_color(&self, color: Color, start: u8, count: u8) -> bool {
        self.0.native().mod_palette_color(self.raw(), color, start, count)
    }

    pub fn delete(self) -> bool {
        self.0.native().delete_palette(self.raw())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_and_read_color() {
        let tln = Tilengine::headless();
        let pal = Palette::new(&tln, 16).unwrap();
        assert!(pal.set_color(1, Color::new(255, 0, 0)));
        assert_eq!(pal.color(1), Some(Color::new(255, 0, 0)));
        assert!(!pal.set_color(16, Color::WHITE));
        assert_eq!(pal.color(16), None);
    }

    #[test]
    fn add_color_saturates_range() {
        let tln = Tilengine::headless();
        let pal = Palette::new(&tln, 4).unwrap();
        pal.set_color(1, Color::new(250, 10, 0));
        assert!(pal.add_color(Color::new(10, 10, 10), 1, 2));
        assert_eq!(pal.color(0), Some(Color::BLACK));
        assert_eq!(pal.color(1), Some(Color::new(255, 20, 10)));
        assert_eq!(pal.color(2), Some(Color::new(10, 10, 10)));
        assert_eq!(pal.color(3), Some(Color::BLACK));
    }

    #[test]
    fn mix_blends_into_self() {
        let tln = Tilengine::headless();
        let a = Palette::new(&tln, 2).unwrap();
        let b = Palette::new(&tln, 2).unwrap();
        let dst = Palette::new(&tln, 2).unwrap();
        b.set_color(0, Color::WHITE);
        assert!(dst.mix(&a, &b, 255));
        assert_eq!(dst.color(0), Some(Color::WHITE));
        assert!(dst.mix(&a, &b, 0));
        assert_eq!(dst.color(0), Some(Color::BLACK));
    }

    #[test]
    fn clone_is_independent() {
        let tln = Tilengine::headless();
        let pal = Palette::new(&tln, 2).unwrap();
        let copy = pal.clone_palette().unwrap();
        assert_ne!(pal, copy);
        copy.set_color(0, Color::WHITE);
        assert_eq!(pal.color(0), Some(Color::BLACK));
        assert!(copy.delete());
    }
}
