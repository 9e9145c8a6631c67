use crate::engine::Tilengine;
use crate::error::EngineError;
use crate::native::{Color, RawHandle, Tile};

use super::{NativeRef, Tileset};

/// Grid of [`Tile`] cells referencing up to eight tilesets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tilemap(NativeRef);

impl Tilemap {
    /// `tiles` is row-major and either empty (all cells empty) or exactly
    /// `rows * cols` long.
    pub fn new(
        tln: &Tilengine,
        rows: i32,
        cols: i32,
        tiles: &[Tile],
        background: Color,
        tileset: Option<&Tileset>,
    ) -> Result<Self, EngineError> {
        let tileset = tileset.map(Tileset::raw);
        NativeRef::create(tln, |n| n.create_tilemap(rows, cols, tiles, background, tileset)).map(Self)
    }

    /// Loads a layer from a `.tmx` map; `None` picks the first tile layer.
    pub fn load(tln: &Tilengine, filename: &str, layer: Option<&str>) -> Result<Self, EngineError> {
        NativeRef::create(tln, |n| n.load_tilemap(filename, layer)).map(Self)
    }

    pub(crate) fn from_ref(r: NativeRef) -> Self {
        Self(r)
    }

    pub fn raw(&self) -> RawHandle {
        self.0.raw()
    }

    pub fn clone_tilemap(&self) -> Option<Tilemap> {
        self.0.sibling(self.0.native().clone_tilemap(self.raw())).map(Self)
    }

    pub fn rows(&self) -> i32 {
        self.0.native().tilemap_rows(self.raw())
    }

    pub fn cols(&self) -> i32 {
        self.0.native().tilemap_cols(self.raw())
    }

    /// Primary tileset.
    pub fn tileset(&self) -> Option<Tileset> {
        self.tileset_at(0)
    }

    pub fn tileset_at(&self, index: i32) -> Option<Tileset> {
        self.0
            .sibling(self.0.native().tilemap_tileset(self.raw(), index))
            .map(Tileset::from_ref)
    }

    pub fn set_tileset_at(&self, tileset: &Tileset, index: i32) -> bool {
        self.0.native().set_tilemap_tileset(self.raw(), tileset.raw(), index)
    }

    pub fn tile(&self, row: i32, col: i32) -> Option<Tile> {
        self.0.native().tilemap_tile(self.raw(), row, col)
    }

    pub fn set_tile(&self, row: i32, col: i32, tile: Tile) -> bool {
        self.0.native().set_tilemap_tile(self.raw(), row, col, tile)
    }

    /// Read-modify-write of one cell.
    pub fn update_tile(&self, row: i32, col: i32, f: impl FnOnce(&mut Tile)) -> bool {
        let Some(mut tile) = self.tile(row, col) else {
            return false;
        };
        f(&mut tile);
        self.set_tile(row, col, tile)
    }

    /// Copies a `rows x cols` block into `dst` at `(dst_row, dst_col)`.
    #[allow(clippy::too_many_arguments)]
    pub fn copy_tiles(&self, src_row: i32, src_col: i32, rows: i32, cols: i32, dst: &Tilemap, dst_row: i32, dst_col: i32) -> bool {
        self.0
            .native()
            .copy_tiles(self.raw(), src_row, src_col, rows, cols, dst.raw(), dst_row, dst_col)
    }

    pub fn delete(self) -> bool {
        self.0.native().delete_tilemap(self.raw())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::native::TileFlags;

    fn map(tln: &Tilengine, rows: i32, cols: i32) -> Tilemap {
        let ts = Tileset::new(tln, 4, 8, 8, None).unwrap();
        Tilemap::new(tln, rows, cols, &[], Color::BLACK, Some(&ts)).unwrap()
    }

    #[test]
    fn update_tile_sets_flip_flag() {
        let tln = Tilengine::headless();
        let tm = Tilemap::load(&tln, "Sonic_md_fg1.tmx", None).unwrap();
        assert!(tm.update_tile(23, 0, |t| t.set_flip_y(true)));
        let tile = tm.tile(23, 0).unwrap();
        assert!(tile.tile_flags().contains(TileFlags::FLIPY));
        assert!(!tm.update_tile(tm.rows(), 0, |t| t.set_flip_y(true)));
    }

    #[test]
    fn tile_count_must_match_grid() {
        let tln = Tilengine::headless();
        assert!(Tilemap::new(&tln, 2, 2, &[Tile::new(1); 3], Color::BLACK, None).is_err());
        let tm = Tilemap::new(&tln, 2, 2, &[Tile::new(1); 4], Color::BLACK, None).unwrap();
        assert_eq!(tm.tile(1, 1), Some(Tile::new(1)));
    }

    #[test]
    fn copy_tiles_moves_block() {
        let tln = Tilengine::headless();
        let src = map(&tln, 4, 4);
        let dst = map(&tln, 4, 4);
        src.set_tile(1, 1, Tile::new(3));
        assert!(src.copy_tiles(1, 1, 2, 2, &dst, 0, 0));
        assert_eq!(dst.tile(0, 0), Some(Tile::new(3)));
        assert!(!src.copy_tiles(3, 3, 2, 2, &dst, 0, 0));
    }

    #[test]
    fn secondary_tilesets() {
        let tln = Tilengine::headless();
        let tm = map(&tln, 1, 1);
        let extra = Tileset::new(&tln, 2, 8, 8, None).unwrap();
        assert!(tm.tileset().is_some());
        assert!(tm.tileset_at(1).is_none());
        assert!(tm.set_tileset_at(&extra, 1));
        assert_eq!(tm.tileset_at(1), Some(extra));
    }
}
