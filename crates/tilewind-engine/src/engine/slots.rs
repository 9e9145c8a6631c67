use std::fmt;
use std::rc::Rc;

use crate::native::{Blend, Color, LayerType, Native, PixelMap, SpriteState, TileFlags, TileInfo};
use crate::resources::{Bitmap, NativeRef, ObjectList, Palette, Sequence, SpriteSet, Tilemap, Tileset};

// ── Layer ─────────────────────────────────────────────────────────────────

/// Background layer slot of an engine, addressed by index.
///
/// Calls act on the engine whose context is current.
#[derive(Clone)]
pub struct Layer {
    index: i32,
    native: Rc<dyn Native>,
}

impl Layer {
    pub(crate) fn new(index: i32, native: Rc<dyn Native>) -> Self {
        Self { index, native }
    }

    pub fn index(&self) -> i32 {
        self.index
    }

    fn wrap(&self, raw: Option<crate::native::RawHandle>) -> Option<NativeRef> {
        raw.map(|raw| NativeRef::new(raw, self.native.clone()))
    }

    pub fn set_tilemap(&self, tilemap: &Tilemap) -> bool {
        self.native.set_layer_tilemap(self.index, tilemap.raw())
    }

    pub fn tilemap(&self) -> Option<Tilemap> {
        self.wrap(self.native.layer_tilemap(self.index)).map(Tilemap::from_ref)
    }

    pub fn set_bitmap(&self, bitmap: &Bitmap) -> bool {
        self.native.set_layer_bitmap(self.index, bitmap.raw())
    }

    pub fn bitmap(&self) -> Option<Bitmap> {
        self.wrap(self.native.layer_bitmap(self.index)).map(Bitmap::from_ref)
    }

    pub fn set_palette(&self, palette: &Palette) -> bool {
        self.native.set_layer_palette(self.index, palette.raw())
    }

    pub fn palette(&self) -> Option<Palette> {
        self.wrap(self.native.layer_palette(self.index)).map(Palette::from_ref)
    }

    pub fn tileset(&self) -> Option<Tileset> {
        self.wrap(self.native.layer_tileset(self.index)).map(Tileset::from_ref)
    }

    pub fn set_position(&self, x: i32, y: i32) -> bool {
        self.native.set_layer_position(self.index, x, y)
    }

    pub fn x(&self) -> i32 {
        self.native.layer_x(self.index)
    }

    pub fn y(&self) -> i32 {
        self.native.layer_y(self.index)
    }

    pub fn set_scaling(&self, sx: f32, sy: f32) -> bool {
        self.native.set_layer_scaling(self.index, sx, sy)
    }

    pub fn set_transform(&self, angle: f32, dx: f32, dy: f32, sx: f32, sy: f32) -> bool {
        self.native.set_layer_transform(self.index, angle, dx, dy, sx, sy)
    }

    /// Drops scaling/transform back to plain scrolling.
    pub fn reset_mode(&self) -> bool {
        self.native.reset_layer_mode(self.index)
    }

    pub fn set_blend_mode(&self, mode: Blend, factor: u8) -> bool {
        self.native.set_layer_blend_mode(self.index, mode, factor)
    }

    pub fn set_clip(&self, x1: i32, y1: i32, x2: i32, y2: i32) -> bool {
        self.native.set_layer_clip(self.index, x1, y1, x2, y2)
    }

    pub fn disable_clip(&self) -> bool {
        self.native.disable_layer_clip(self.index)
    }

    pub fn set_mosaic(&self, width: i32, height: i32) -> bool {
        self.native.set_layer_mosaic(self.index, width, height)
    }

    pub fn disable_mosaic(&self) -> bool {
        self.native.disable_layer_mosaic(self.index)
    }

    pub fn set_objects(&self, list: &ObjectList, tileset: Option<&Tileset>) -> bool {
        self.native
            .set_layer_objects(self.index, list.raw(), tileset.map(Tileset::raw))
    }

    pub fn objects(&self) -> Option<ObjectList> {
        self.wrap(self.native.layer_objects(self.index)).map(ObjectList::from_ref)
    }

    pub fn set_priority(&self, enable: bool) -> bool {
        self.native.set_layer_priority(self.index, enable)
    }

    /// Makes this layer scroll with `parent`.
    pub fn set_parent(&self, parent: &Layer) -> bool {
        self.native.set_layer_parent(self.index, parent.index)
    }

    pub fn disable_parent(&self) -> bool {
        self.native.disable_layer_parent(self.index)
    }

    pub fn enable(&self) -> bool {
        self.native.enable_layer(self.index)
    }

    pub fn disable(&self) -> bool {
        self.native.disable_layer(self.index)
    }

    pub fn layer_type(&self) -> LayerType {
        self.native.layer_type(self.index)
    }

    pub fn width(&self) -> i32 {
        self.native.layer_width(self.index)
    }

    pub fn height(&self) -> i32 {
        self.native.layer_height(self.index)
    }

    /// Clips drawing to the rectangle `(x1, y1)..=(x2, y2)`, or to its outside when `invert`.
    pub fn set_window(&self, x1: i32, y1: i32, x2: i32, y2: i32, invert: bool) -> bool {
        self.native.set_layer_window(self.index, x1, y1, x2, y2, invert)
    }

    /// Tints the windowed area with `color` using `blend`.
    pub fn set_window_color(&self, color: Color, blend: Blend) -> bool {
        self.native.set_layer_window_color(self.index, color, blend)
    }

    pub fn disable_window(&self) -> bool {
        self.native.disable_layer_window(self.index)
    }

    pub fn disable_window_color(&self) -> bool {
        self.native.disable_layer_window_color(self.index)
    }

    /// Tile under the world pixel `(x, y)`. Coordinates wrap around the tilemap.
    pub fn tile(&self, x: i32, y: i32) -> Option<TileInfo> {
        self.native.layer_tile(self.index, x, y)
    }

    /// Per-column vertical offsets; needs one entry per visible column plus two.
    pub fn set_column_offset(&self, offsets: Option<&[i32]>) -> bool {
        self.native.set_layer_column_offset(self.index, offsets)
    }

    /// Per-pixel displacement table covering the whole framebuffer.
    pub fn set_pixel_mapping(&self, table: Option<&[PixelMap]>) -> bool {
        self.native.set_layer_pixel_mapping(self.index, table)
    }
}

// ── Sprite ────────────────────────────────────────────────────────────────

/// Sprite slot of an engine, addressed by index.
#[derive(Clone)]
pub struct Sprite {
    index: i32,
    native: Rc<dyn Native>,
}

impl Sprite {
    pub(crate) fn new(index: i32, native: Rc<dyn Native>) -> Self {
        Self { index, native }
    }

    pub fn index(&self) -> i32 {
        self.index
    }

    /// Assigns a spriteset and flags, enabling the sprite.
    pub fn config(&self, spriteset: &SpriteSet, flags: TileFlags) -> bool {
        self.native.config_sprite(self.index, spriteset.raw(), flags)
    }

    pub fn set_spriteset(&self, spriteset: &SpriteSet) -> bool {
        self.native.set_sprite_set(self.index, spriteset.raw())
    }

    pub fn set_flags(&self, flags: TileFlags) -> bool {
        self.native.set_sprite_flags(self.index, flags)
    }

    pub fn enable_flag(&self, flag: TileFlags, enable: bool) -> bool {
        self.native.enable_sprite_flag(self.index, flag, enable)
    }

    /// Pivot in normalized sprite coordinates, `(0, 0)` is top-left.
    pub fn set_pivot(&self, px: f32, py: f32) -> bool {
        self.native.set_sprite_pivot(self.index, px, py)
    }

    pub fn set_position(&self, x: i32, y: i32) -> bool {
        self.native.set_sprite_position(self.index, x, y)
    }

    pub fn x(&self) -> i32 {
        self.native.sprite_x(self.index)
    }

    pub fn y(&self) -> i32 {
        self.native.sprite_y(self.index)
    }

    pub fn set_picture(&self, entry: i32) -> bool {
        self.native.set_sprite_picture(self.index, entry)
    }

    pub fn picture(&self) -> i32 {
        self.native.sprite_picture(self.index)
    }

    pub fn set_palette(&self, palette: &Palette) -> bool {
        self.native.set_sprite_palette(self.index, palette.raw())
    }

    pub fn palette(&self) -> Option<Palette> {
        self.native
            .sprite_palette(self.index)
            .map(|raw| Palette::from_ref(NativeRef::new(raw, self.native.clone())))
    }

    pub fn set_blend_mode(&self, mode: Blend, factor: u8) -> bool {
        self.native.set_sprite_blend_mode(self.index, mode, factor)
    }

    pub fn set_scaling(&self, sx: f32, sy: f32) -> bool {
        self.native.set_sprite_scaling(self.index, sx, sy)
    }

    pub fn reset_scaling(&self) -> bool {
        self.native.reset_sprite_scaling(self.index)
    }

    pub fn enable_collision(&self, enable: bool) -> bool {
        self.native.enable_sprite_collision(self.index, enable)
    }

    /// Whether the sprite overlapped another collision-enabled sprite last frame.
    pub fn collision(&self) -> bool {
        self.native.sprite_collision(self.index)
    }

    /// Plays `sequence`; `loops == 0` repeats forever.
    pub fn set_animation(&self, sequence: &Sequence, loops: i32) -> bool {
        self.native.set_sprite_animation(self.index, sequence.raw(), loops)
    }

    pub fn disable_animation(&self) -> bool {
        self.native.disable_sprite_animation(self.index)
    }

    pub fn pause_animation(&self) -> bool {
        self.native.pause_sprite_animation(self.index)
    }

    pub fn resume_animation(&self) -> bool {
        self.native.resume_sprite_animation(self.index)
    }

    pub fn disable(&self) -> bool {
        self.native.disable_sprite(self.index)
    }

    /// Position, size and attachments as the renderer sees them.
    pub fn state(&self) -> Option<SpriteState> {
        self.native.sprite_state(self.index)
    }

    /// Makes this sprite the head of the draw list.
    pub fn set_first(&self) -> bool {
        self.native.set_first_sprite(self.index)
    }

    /// Draws `next` right after this sprite.
    pub fn set_next(&self, next: &Sprite) -> bool {
        self.native.set_next_sprite(self.index, next.index)
    }

    /// Masked sprites are hidden inside the engine's mask region.
    pub fn enable_masking(&self, enable: bool) -> bool {
        self.native.enable_sprite_masking(self.index, enable)
    }
}

// ── Animation ─────────────────────────────────────────────────────────────

/// Palette animation slot of an engine.
#[derive(Clone)]
pub struct Animation {
    index: i32,
    native: Rc<dyn Native>,
}

impl Animation {
    pub(crate) fn new(index: i32, native: Rc<dyn Native>) -> Self {
        Self { index, native }
    }

    pub fn index(&self) -> i32 {
        self.index
    }

    pub fn set_palette_animation(&self, palette: &Palette, sequence: &Sequence, blend: bool) -> bool {
        self.native
            .set_palette_animation(self.index, palette.raw(), sequence.raw(), blend)
    }

    pub fn set_source(&self, palette: &Palette) -> bool {
        self.native.set_palette_animation_source(self.index, palette.raw())
    }

    pub fn disable(&self) -> bool {
        self.native.disable_palette_animation(self.index)
    }

    /// Whether an animation is running in this slot.
    pub fn is_active(&self) -> bool {
        self.native.animation_state(self.index)
    }
}

macro_rules! index_debug {
    ($($ty:ident),*) => {$(
        impl fmt::Debug for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_tuple(stringify!($ty)).field(&self.index).finish()
            }
        }
    )*};
}

index_debug!(Layer, Sprite, Animation);

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use crate::engine::{EngineArgs, Tilengine};
    use crate::native::{Blend, Color, ErrorCode, Headless, HeadlessConfig, LayerType, PixelMap, TileFlags};
    use crate::resources::{Bitmap, Palette, Sequence, SpriteSet, Tilemap};

    #[test]
    fn layer_reports_attached_resources() {
        let tln = Tilengine::headless();
        let engine = tln.create_engine(&EngineArgs::default()).unwrap();
        let tm = Tilemap::load(&tln, "Sonic_md_fg1.tmx", None).unwrap();
        let layer = &engine.layers()[0];

        assert_eq!(layer.layer_type(), LayerType::None);
        assert!(layer.set_tilemap(&tm));
        assert_eq!(layer.tilemap(), Some(tm.clone()));
        assert_eq!(layer.layer_type(), LayerType::Tile);
        assert_eq!(layer.width(), tm.cols() * 8);

        let bmp = Bitmap::new(&tln, 256, 256, 8).unwrap();
        assert!(engine.layers()[1].set_bitmap(&bmp));
        assert_eq!(engine.layers()[1].bitmap(), Some(bmp.clone()));
        assert_eq!(engine.layers()[1].palette(), bmp.palette());
    }

    #[test]
    fn layer_parenting_and_position() {
        let tln = Tilengine::headless();
        let engine = tln.create_engine(&EngineArgs::default()).unwrap();
        let (a, b) = (&engine.layers()[0], &engine.layers()[1]);
        assert!(b.set_parent(a));
        assert!(a.set_position(12, 34));
        assert_eq!((a.x(), a.y()), (12, 34));
        assert!(b.disable_parent());
    }

    #[test]
    fn sprite_configuration() {
        let tln = Tilengine::headless();
        let engine = tln.create_engine(&EngineArgs::default()).unwrap();
        let set = SpriteSet::load(&tln, "hero").unwrap();
        let sprite = &engine.sprites()[3];

        assert_eq!(engine.available_sprite(), Some(0));
        assert!(sprite.config(&set, TileFlags::FLIPX));
        assert!(sprite.set_position(10, 20));
        assert_eq!((sprite.x(), sprite.y()), (10, 20));
        assert!(sprite.set_picture(2));
        assert!(!sprite.set_picture(9));
        assert_eq!(sprite.picture(), 2);

        let pal = Palette::new(&tln, 16).unwrap();
        assert!(sprite.set_palette(&pal));
        assert_eq!(sprite.palette(), Some(pal));

        let seq = Sequence::from_spriteset(&tln, "walk", &set, "hero", 5).unwrap();
        assert!(sprite.set_animation(&seq, 0));
        assert!(sprite.pause_animation());
        assert!(sprite.disable());
    }

    #[test]
    fn palette_animation_slot() {
        let tln = Tilengine::headless();
        let engine = tln.create_engine(&EngineArgs::default()).unwrap();
        let pal = Palette::new(&tln, 16).unwrap();
        pal.set_color(1, Color::new(255, 0, 0));
        let cycle = Sequence::cycle(
            &tln,
            "glow",
            &[crate::native::ColorStrip { delay: 4, first: 1, count: 4, dir: 1 }],
        )
        .unwrap();

        let anim = &engine.animations()[0];
        assert!(!anim.is_active());
        assert!(anim.set_palette_animation(&pal, &cycle, true));
        assert!(anim.is_active());
        assert_eq!(engine.available_animation(), Some(1));
        assert!(anim.disable());
        assert!(!anim.is_active());
    }

    fn headless() -> (Rc<Headless>, Tilengine) {
        let backend = Rc::new(Headless::new(HeadlessConfig::default()));
        (backend.clone(), Tilengine::from_backend(backend))
    }

    #[test]
    fn layer_window_and_tint() {
        let (backend, tln) = headless();
        let engine = tln.create_engine(&EngineArgs::default()).unwrap();
        let layer = &engine.layers()[1];

        assert!(layer.set_window(10, 20, 110, 120, true));
        assert_eq!(backend.layer_window(1), Some(([10, 20, 110, 120], true)));
        assert!(layer.set_window_color(Color::new(0, 0, 64), Blend::Add));
        assert_eq!(backend.layer_window_color(1), Some((Color::new(0, 0, 64), Blend::Add)));

        assert!(layer.disable_window_color());
        assert_eq!(backend.layer_window_color(1), None);
        assert!(layer.disable_window());
        assert_eq!(backend.layer_window(1), None);

        assert!(!super::Layer::new(9, tln.backend().clone()).disable_window());
        assert_eq!(engine.last_error(), ErrorCode::IdxLayer);
    }

    #[test]
    fn layer_tile_lookup_wraps() {
        let (_backend, tln) = headless();
        let engine = tln.create_engine(&EngineArgs::default()).unwrap();
        let layer = &engine.layers()[0];
        assert_eq!(layer.tile(0, 0), None);
        assert_eq!(engine.last_error(), ErrorCode::RefTilemap);

        let tm = Tilemap::load(&tln, "Sonic_md_fg1.tmx", None).unwrap();
        assert!(layer.set_tilemap(&tm));

        let origin = layer.tile(0, 0).unwrap();
        assert!(origin.empty);
        assert_eq!((origin.row, origin.col), (0, 0));

        let t = layer.tile(8 * 3 + 5, 8 * 2 + 1).unwrap();
        assert_eq!((t.row, t.col, t.xoffset, t.yoffset), (2, 3, 5, 1));
        assert_eq!(t.index, 3);
        assert!(!t.empty);

        // one tile left of the origin is the last column
        let wrapped = layer.tile(-8, -1).unwrap();
        assert_eq!((wrapped.row, wrapped.col), (tm.rows() - 1, tm.cols() - 1));
        assert_eq!((wrapped.xoffset, wrapped.yoffset), (0, 7));
    }

    #[test]
    fn column_offset_needs_every_visible_column() {
        let (backend, tln) = headless();
        let engine = tln.create_engine(&EngineArgs::default()).unwrap();
        let layer = &engine.layers()[0];
        let columns = (engine.width() / 8 + 2) as usize;
        let offsets: Vec<i32> = (0..columns as i32).collect();

        assert!(!layer.set_column_offset(Some(&offsets)));
        assert_eq!(engine.last_error(), ErrorCode::RefTileset);

        let tm = Tilemap::load(&tln, "Sonic_md_fg1.tmx", None).unwrap();
        assert!(layer.set_tilemap(&tm));
        assert!(!layer.set_column_offset(Some(&offsets[..columns - 1])));
        assert_eq!(engine.last_error(), ErrorCode::WrongSize);

        assert!(layer.set_column_offset(Some(&offsets)));
        assert_eq!(backend.layer_column_offset(0), Some(offsets));
        assert!(layer.set_column_offset(None));
        assert_eq!(backend.layer_column_offset(0), None);
    }

    #[test]
    fn pixel_mapping_covers_the_framebuffer() {
        let (backend, tln) = headless();
        let engine = tln.create_engine(&EngineArgs::new().with_resolution(16, 8)).unwrap();
        let layer = &engine.layers()[2];
        let table = vec![PixelMap { dx: 1, dy: -1 }; 16 * 8];

        assert!(!layer.set_pixel_mapping(Some(&table[1..])));
        assert_eq!(engine.last_error(), ErrorCode::WrongSize);
        assert!(layer.set_pixel_mapping(Some(&table)));
        assert_eq!(backend.layer_pixel_mapping_len(2), Some(16 * 8));
        assert!(layer.set_pixel_mapping(None));
        assert_eq!(backend.layer_pixel_mapping_len(2), None);
    }

    #[test]
    fn sprite_state_reflects_configuration() {
        let (_backend, tln) = headless();
        let engine = tln.create_engine(&EngineArgs::default()).unwrap();
        let set = SpriteSet::load(&tln, "hero").unwrap();
        let sprite = &engine.sprites()[1];

        let idle = sprite.state().unwrap();
        assert!(!idle.enabled);
        assert_eq!(idle.spriteset, None);

        assert!(sprite.config(&set, TileFlags::FLIPY));
        assert!(sprite.set_position(-4, 30));
        assert!(sprite.set_picture(1));
        assert!(sprite.set_scaling(2.0, 0.5));
        let state = sprite.state().unwrap();
        assert!(state.enabled);
        assert_eq!((state.x, state.y), (-4, 30));
        assert_eq!((state.w, state.h), (32, 8));
        assert_eq!(state.index, 1);
        assert_eq!(state.flags, TileFlags::FLIPY);
        assert_eq!(state.spriteset, Some(set.raw()));
    }

    #[test]
    fn sprite_draw_order_and_masking() {
        let (backend, tln) = headless();
        let engine = tln.create_engine(&EngineArgs::new().with_sprites(8)).unwrap();
        let sprites = engine.sprites();

        assert!(sprites[5].set_first());
        assert!(sprites[5].set_next(&sprites[2]));
        assert!(sprites[2].set_next(&sprites[7]));
        assert_eq!(backend.sprite_chain(), vec![5, 2, 7]);

        // a cycle ends the walk instead of looping
        assert!(sprites[7].set_next(&sprites[5]));
        assert_eq!(backend.sprite_chain(), vec![5, 2, 7]);

        assert!(sprites[2].enable_masking(true));
        assert!(backend.sprite_masking(2));
        assert!(sprites[2].enable_masking(false));
        assert!(!backend.sprite_masking(2));

        engine.set_sprites_mask_region(40, 80);
        assert_eq!(backend.mask_region(), Some((40, 80)));
    }
}
