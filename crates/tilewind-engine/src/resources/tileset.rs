use crate::engine::Tilengine;
use crate::error::EngineError;
use crate::native::RawHandle;

use super::{NativeRef, Palette};

/// Set of equally sized 8 bpp tile graphics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tileset(NativeRef);

impl Tileset {
    /// Empty tileset; without `palette` the native side creates one.
    pub fn new(tln: &Tilengine, num_tiles: i32, width: i32, height: i32, palette: Option<&Palette>) -> Result<Self, EngineError> {
        let palette = palette.map(Palette::raw);
        NativeRef::create(tln, |n| n.create_tileset(num_tiles, width, height, palette)).map(Self)
    }

    /// Loads a `.tsx` tileset.
    pub fn load(tln: &Tilengine, filename: &str) -> Result<Self, EngineError> {
        NativeRef::create(tln, |n| n.load_tileset(filename)).map(Self)
    }

    pub(crate) fn from_ref(r: NativeRef) -> Self {
        Self(r)
    }

    pub fn raw(&self) -> RawHandle {
        self.0.raw()
    }

    pub fn clone_tileset(&self) -> Option<Tileset> {
        self.0.sibling(self.0.native().clone_tileset(self.raw())).map(Self)
    }

    /// Copies one tile's pixels from `data`, `pitch` bytes per source row.
    pub fn set_pixels(&self, entry: i32, data: &[u8], pitch: i32) -> bool {
        self.0.native().set_tileset_pixels(self.raw(), entry, data, pitch)
    }

    pub fn tile_width(&self) -> i32 {
        self.0.native().tile_width(self.raw())
    }

    pub fn tile_height(&self) -> i32 {
        self.0.native().tile_height(self.raw())
    }

    pub fn num_tiles(&self) -> i32 {
        self.0.native().tileset_num_tiles(self.raw())
    }

    pub fn palette(&self) -> Option<Palette> {
        self.0
            .sibling(self.0.native().tileset_palette(self.raw()))
            .map(Palette::from_ref)
    }

    pub fn delete(self) -> bool {
        self.0.native().delete_tileset(self.raw())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_tileset_reports_geometry() {
        let tln = Tilengine::headless();
        let ts = Tileset::new(&tln, 4, 8, 16, None).unwrap();
        assert_eq!(ts.num_tiles(), 4);
        assert_eq!(ts.tile_width(), 8);
        assert_eq!(ts.tile_height(), 16);
        assert!(ts.palette().is_some());
    }

    #[test]
    fn set_pixels_checks_source_size() {
        let tln = Tilengine::headless();
        let ts = Tileset::new(&tln, 1, 4, 4, None).unwrap();
        assert!(ts.set_pixels(0, &[1; 16], 4));
        assert!(!ts.set_pixels(0, &[1; 8], 4));
        assert!(!ts.set_pixels(3, &[1; 16], 4));
    }
}
