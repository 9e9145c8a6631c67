//! Native engine boundary.
//!
//! [`Native`] mirrors the Tilengine C API one call per method. The rest of
//! the crate only talks to the engine through this trait, so the same
//! handles and frame loop run on the real library ([`Ffi`], feature
//! `native`) or on the in-memory [`Headless`] backend.
//!
//! Conventions:
//! - `bool` returns are native pass/fail, passed through unchanged
//! - `Option<RawHandle>` is `None` where the native call returns null
//! - indices are `i32` like the C signatures; range checks are native

#[cfg(feature = "native")]
mod ffi;
mod headless;
mod types;

#[cfg(feature = "native")]
pub use ffi::Ffi;
pub use headless::{Headless, HeadlessConfig, HeadlessStats};
pub use types::{
    Blend,
    BlendFunction,
    Color,
    ColorStrip,
    Crt,
    CrtEffect,
    ErrorCode,
    Input,
    LayerType,
    LogLevel,
    Overlay,
    PixelMap,
    Player,
    RawHandle,
    SequenceFrame,
    SequenceInfo,
    SpriteData,
    SpriteInfo,
    SpriteState,
    Tile,
    TileFlags,
    TileInfo,
    VideoCallback,
    WindowFlags,
};

/// The native engine API surface.
///
/// All state behind this trait is process-global on the real library; the
/// receiver is `&self` for that reason.
pub trait Native {
    // ── context ───────────────────────────────────────────────────────────

    fn init(&self, hres: i32, vres: i32, layers: i32, sprites: i32, animations: i32) -> Option<RawHandle>;
    fn set_context(&self, context: RawHandle) -> bool;
    fn context(&self) -> Option<RawHandle>;
    fn delete_context(&self, context: RawHandle) -> bool;
    /// Deletes the current context.
    fn deinit(&self);
    fn version(&self) -> u32;

    fn width(&self) -> i32;
    fn height(&self) -> i32;
    fn num_objects(&self) -> u32;
    fn used_memory(&self) -> u32;
    fn num_layers(&self) -> i32;
    fn num_sprites(&self) -> i32;
    fn target_fps(&self) -> i32;
    fn set_target_fps(&self, fps: i32);

    fn set_bg_color(&self, r: u8, g: u8, b: u8);
    fn set_bg_color_from_tilemap(&self, tilemap: RawHandle) -> bool;
    fn disable_bg_color(&self);
    fn set_bg_bitmap(&self, bitmap: Option<RawHandle>) -> bool;
    fn set_bg_palette(&self, palette: RawHandle) -> bool;
    fn set_global_palette(&self, index: i32, palette: RawHandle) -> bool;
    fn global_palette(&self, index: i32) -> Option<RawHandle>;

    fn set_raster_callback(&self, callback: Option<VideoCallback>);
    fn set_frame_callback(&self, callback: Option<VideoCallback>);
    fn set_custom_blend_function(&self, function: Option<BlendFunction>);
    fn set_log_level(&self, level: LogLevel);
    fn set_load_path(&self, path: Option<&str>);
    fn open_resource_pack(&self, filename: &str, key: Option<&str>) -> bool;
    fn close_resource_pack(&self);

    /// Renders `frame` into `target` (32-bit pixels, `pitch` bytes per row).
    ///
    /// The native render target is only valid for the duration of the call.
    fn render_frame_to(&self, target: &mut [u8], pitch: i32, frame: i32);
    fn update_frame(&self, frame: i32);

    fn last_error(&self) -> ErrorCode;
    fn set_last_error(&self, code: ErrorCode);
    fn error_string(&self, code: ErrorCode) -> String;

    // ── window ────────────────────────────────────────────────────────────

    fn create_window(&self, overlay: Option<&str>, flags: WindowFlags) -> bool;
    fn create_window_thread(&self, overlay: Option<&str>, flags: WindowFlags) -> bool;
    fn set_window_title(&self, title: &str);
    /// Single-threaded housekeeping: pumps events, returns whether the window is still open.
    fn process_window(&self) -> bool;
    fn is_window_active(&self) -> bool;
    fn input(&self, player: Player, input: Input) -> bool;
    fn enable_input(&self, player: Player, enable: bool);
    fn assign_input_joystick(&self, player: Player, index: i32);
    fn define_input_key(&self, player: Player, input: Input, keycode: u32);
    fn define_input_button(&self, player: Player, input: Input, button: u8);
    fn draw_frame(&self, frame: i32);
    fn wait_redraw(&self);
    fn delete_window(&self);
    fn config_crt_effect(&self, kind: Crt, blur: bool);
    fn enable_crt_effect(&self, effect: &CrtEffect);
    fn disable_crt_effect(&self);
    /// Legacy blur toggle, superseded by [`CrtEffect::blur`].
    fn enable_blur(&self, enable: bool);
    fn delay(&self, msecs: u32);
    fn ticks(&self) -> u32;
    fn average_fps(&self) -> u32;
    fn window_width(&self) -> i32;
    fn window_height(&self) -> i32;
    fn window_scale_factor(&self) -> i32;
    fn set_window_scale_factor(&self, factor: i32);

    // ── layers ────────────────────────────────────────────────────────────

    fn set_layer_tilemap(&self, layer: i32, tilemap: RawHandle) -> bool;
    fn set_layer_bitmap(&self, layer: i32, bitmap: RawHandle) -> bool;
    fn set_layer_palette(&self, layer: i32, palette: RawHandle) -> bool;
    fn layer_tilemap(&self, layer: i32) -> Option<RawHandle>;
    fn layer_bitmap(&self, layer: i32) -> Option<RawHandle>;
    fn layer_palette(&self, layer: i32) -> Option<RawHandle>;
    fn layer_tileset(&self, layer: i32) -> Option<RawHandle>;
    fn set_layer_position(&self, layer: i32, x: i32, y: i32) -> bool;
    fn layer_x(&self, layer: i32) -> i32;
    fn layer_y(&self, layer: i32) -> i32;
    fn set_layer_scaling(&self, layer: i32, sx: f32, sy: f32) -> bool;
    fn set_layer_transform(&self, layer: i32, angle: f32, dx: f32, dy: f32, sx: f32, sy: f32) -> bool;
    fn reset_layer_mode(&self, layer: i32) -> bool;
    fn set_layer_blend_mode(&self, layer: i32, mode: Blend, factor: u8) -> bool;
    fn set_layer_clip(&self, layer: i32, x1: i32, y1: i32, x2: i32, y2: i32) -> bool;
    fn disable_layer_clip(&self, layer: i32) -> bool;
    /// Limits drawing to a rectangle, or to its outside when `invert`.
    fn set_layer_window(&self, layer: i32, x1: i32, y1: i32, x2: i32, y2: i32, invert: bool) -> bool;
    fn set_layer_window_color(&self, layer: i32, color: Color, blend: Blend) -> bool;
    fn disable_layer_window(&self, layer: i32) -> bool;
    fn disable_layer_window_color(&self, layer: i32) -> bool;
    /// Tile under layer-space pixel `(x, y)` of a tiled layer.
    fn layer_tile(&self, layer: i32, x: i32, y: i32) -> Option<TileInfo>;
    /// Per-column vertical offsets; `None` disables them.
    ///
    /// The native layer keeps reading the table after the call, so
    /// implementations hold their own copy while it is installed.
    fn set_layer_column_offset(&self, layer: i32, offsets: Option<&[i32]>) -> bool;
    /// Pixel-mapping table of `width * height` entries; `None` disables it.
    ///
    /// Kept alive like [`set_layer_column_offset`](Self::set_layer_column_offset).
    fn set_layer_pixel_mapping(&self, layer: i32, table: Option<&[PixelMap]>) -> bool;
    fn set_layer_mosaic(&self, layer: i32, w: i32, h: i32) -> bool;
    fn disable_layer_mosaic(&self, layer: i32) -> bool;
    fn set_layer_objects(&self, layer: i32, list: RawHandle, tileset: Option<RawHandle>) -> bool;
    fn layer_objects(&self, layer: i32) -> Option<RawHandle>;
    fn set_layer_priority(&self, layer: i32, enable: bool) -> bool;
    fn set_layer_parent(&self, layer: i32, parent: i32) -> bool;
    fn disable_layer_parent(&self, layer: i32) -> bool;
    fn enable_layer(&self, layer: i32) -> bool;
    fn disable_layer(&self, layer: i32) -> bool;
    fn layer_type(&self, layer: i32) -> LayerType;
    fn layer_width(&self, layer: i32) -> i32;
    fn layer_height(&self, layer: i32) -> i32;

    // ── sprites ───────────────────────────────────────────────────────────

    fn config_sprite(&self, sprite: i32, spriteset: RawHandle, flags: TileFlags) -> bool;
    fn set_sprite_set(&self, sprite: i32, spriteset: RawHandle) -> bool;
    fn set_sprite_flags(&self, sprite: i32, flags: TileFlags) -> bool;
    fn enable_sprite_flag(&self, sprite: i32, flag: TileFlags, enable: bool) -> bool;
    fn set_sprite_pivot(&self, sprite: i32, px: f32, py: f32) -> bool;
    fn set_sprite_position(&self, sprite: i32, x: i32, y: i32) -> bool;
    fn sprite_x(&self, sprite: i32) -> i32;
    fn sprite_y(&self, sprite: i32) -> i32;
    fn set_sprite_picture(&self, sprite: i32, entry: i32) -> bool;
    fn sprite_picture(&self, sprite: i32) -> i32;
    fn set_sprite_palette(&self, sprite: i32, palette: RawHandle) -> bool;
    fn sprite_palette(&self, sprite: i32) -> Option<RawHandle>;
    fn set_sprite_blend_mode(&self, sprite: i32, mode: Blend, factor: u8) -> bool;
    fn set_sprite_scaling(&self, sprite: i32, sx: f32, sy: f32) -> bool;
    fn reset_sprite_scaling(&self, sprite: i32) -> bool;
    fn enable_sprite_collision(&self, sprite: i32, enable: bool) -> bool;
    fn sprite_collision(&self, sprite: i32) -> bool;
    fn available_sprite(&self) -> i32;
    fn disable_sprite(&self, sprite: i32) -> bool;
    fn set_sprite_animation(&self, sprite: i32, sequence: RawHandle, loops: i32) -> bool;
    fn disable_sprite_animation(&self, sprite: i32) -> bool;
    fn pause_sprite_animation(&self, sprite: i32) -> bool;
    fn resume_sprite_animation(&self, sprite: i32) -> bool;
    fn sprite_state(&self, sprite: i32) -> Option<SpriteState>;
    /// Makes `sprite` the head of the draw-order chain.
    fn set_first_sprite(&self, sprite: i32) -> bool;
    /// Draws `next` right after `sprite`.
    fn set_next_sprite(&self, sprite: i32, next: i32) -> bool;
    fn enable_sprite_masking(&self, sprite: i32, enable: bool) -> bool;
    /// Scanlines `top..=bottom` hide sprites that have masking enabled.
    fn set_sprites_mask_region(&self, top: i32, bottom: i32);

    // ── palette animations ────────────────────────────────────────────────

    fn set_palette_animation(&self, index: i32, palette: RawHandle, sequence: RawHandle, blend: bool) -> bool;
    fn set_palette_animation_source(&self, index: i32, palette: RawHandle) -> bool;
    fn disable_palette_animation(&self, index: i32) -> bool;
    fn animation_state(&self, index: i32) -> bool;
    fn available_animation(&self) -> i32;

    // ── bitmaps ───────────────────────────────────────────────────────────

    fn create_bitmap(&self, width: i32, height: i32, bpp: i32) -> Option<RawHandle>;
    fn load_bitmap(&self, filename: &str) -> Option<RawHandle>;
    fn clone_bitmap(&self, bitmap: RawHandle) -> Option<RawHandle>;
    fn delete_bitmap(&self, bitmap: RawHandle) -> bool;
    fn bitmap_width(&self, bitmap: RawHandle) -> i32;
    fn bitmap_height(&self, bitmap: RawHandle) -> i32;
    fn bitmap_depth(&self, bitmap: RawHandle) -> i32;
    fn bitmap_pitch(&self, bitmap: RawHandle) -> i32;
    fn bitmap_palette(&self, bitmap: RawHandle) -> Option<RawHandle>;
    fn set_bitmap_palette(&self, bitmap: RawHandle, palette: RawHandle) -> bool;
    /// Copies out `pitch * height` bytes of pixel data.
    fn bitmap_pixels(&self, bitmap: RawHandle) -> Option<Vec<u8>>;
    /// Writes `data` starting at byte `offset`; fails if it would overrun.
    fn write_bitmap_pixels(&self, bitmap: RawHandle, offset: usize, data: &[u8]) -> bool;

    // ── palettes ──────────────────────────────────────────────────────────

    fn create_palette(&self, entries: i32) -> Option<RawHandle>;
    fn load_palette(&self, filename: &str) -> Option<RawHandle>;
    fn clone_palette(&self, palette: RawHandle) -> Option<RawHandle>;
    fn delete_palette(&self, palette: RawHandle) -> bool;
    fn set_palette_color(&self, palette: RawHandle, index: i32, color: Color) -> bool;
    fn palette_color(&self, palette: RawHandle, index: i32) -> Option<Color>;
    fn mix_palettes(&self, src1: RawHandle, src2: RawHandle, dst: RawHandle, factor: u8) -> bool;
    fn add_palette_color(&self, palette: RawHandle, color: Color, start: u8, count: u8) -> bool;
    fn sub_palette_color(&self, palette: RawHandle, color: Color, start: u8, count: u8) -> bool;
    fn mod_palette_color(&self, palette: RawHandle, color: Color, start: u8, count: u8) -> bool;

    // ── tilesets ──────────────────────────────────────────────────────────

    fn create_tileset(&self, num_tiles: i32, width: i32, height: i32, palette: Option<RawHandle>) -> Option<RawHandle>;
    fn load_tileset(&self, filename: &str) -> Option<RawHandle>;
    fn clone_tileset(&self, tileset: RawHandle) -> Option<RawHandle>;
    fn delete_tileset(&self, tileset: RawHandle) -> bool;
    fn set_tileset_pixels(&self, tileset: RawHandle, entry: i32, data: &[u8], pitch: i32) -> bool;
    fn tile_width(&self, tileset: RawHandle) -> i32;
    fn tile_height(&self, tileset: RawHandle) -> i32;
    fn tileset_num_tiles(&self, tileset: RawHandle) -> i32;
    fn tileset_palette(&self, tileset: RawHandle) -> Option<RawHandle>;

    // ── tilemaps ──────────────────────────────────────────────────────────

    fn create_tilemap(&self, rows: i32, cols: i32, tiles: &[Tile], bg: Color, tileset: Option<RawHandle>) -> Option<RawHandle>;
    fn load_tilemap(&self, filename: &str, layer: Option<&str>) -> Option<RawHandle>;
    fn clone_tilemap(&self, tilemap: RawHandle) -> Option<RawHandle>;
    fn delete_tilemap(&self, tilemap: RawHandle) -> bool;
    fn tilemap_rows(&self, tilemap: RawHandle) -> i32;
    fn tilemap_cols(&self, tilemap: RawHandle) -> i32;
    fn tilemap_tileset(&self, tilemap: RawHandle, index: i32) -> Option<RawHandle>;
    fn set_tilemap_tileset(&self, tilemap: RawHandle, tileset: RawHandle, index: i32) -> bool;
    fn tilemap_tile(&self, tilemap: RawHandle, row: i32, col: i32) -> Option<Tile>;
    fn set_tilemap_tile(&self, tilemap: RawHandle, row: i32, col: i32, tile: Tile) -> bool;
    #[allow(clippy::too_many_arguments)]
    fn copy_tiles(
        &self,
        src: RawHandle,
        src_row: i32,
        src_col: i32,
        rows: i32,
        cols: i32,
        dst: RawHandle,
        dst_row: i32,
        dst_col: i32,
    ) -> bool;

    // ── sequences ─────────────────────────────────────────────────────────

    fn create_sequence(&self, name: &str, target: i32, frames: &[SequenceFrame]) -> Option<RawHandle>;
    fn create_cycle(&self, name: &str, strips: &[ColorStrip]) -> Option<RawHandle>;
    fn create_sprite_sequence(&self, name: &str, spriteset: RawHandle, basename: &str, delay: i32) -> Option<RawHandle>;
    fn clone_sequence(&self, sequence: RawHandle) -> Option<RawHandle>;
    fn delete_sequence(&self, sequence: RawHandle) -> bool;
    fn sequence_info(&self, sequence: RawHandle) -> Option<SequenceInfo>;

    // ── spritesets ────────────────────────────────────────────────────────

    fn create_spriteset(&self, bitmap: RawHandle, data: &[SpriteData]) -> Option<RawHandle>;
    fn load_spriteset(&self, filename: &str) -> Option<RawHandle>;
    fn clone_spriteset(&self, spriteset: RawHandle) -> Option<RawHandle>;
    fn delete_spriteset(&self, spriteset: RawHandle) -> bool;
    fn spriteset_info(&self, spriteset: RawHandle, entry: i32) -> Option<SpriteInfo>;
    fn spriteset_palette(&self, spriteset: RawHandle) -> Option<RawHandle>;
    /// Entry index of `name`, or `-1`.
    fn find_spriteset_sprite(&self, spriteset: RawHandle, name: &str) -> i32;

    // ── object lists ──────────────────────────────────────────────────────

    fn create_object_list(&self) -> Option<RawHandle>;
    fn add_tile_object(&self, list: RawHandle, id: u16, gid: u16, flags: TileFlags, x: i32, y: i32) -> bool;
    fn load_object_list(&self, filename: &str, layer: Option<&str>) -> Option<RawHandle>;
    fn clone_object_list(&self, list: RawHandle) -> Option<RawHandle>;
    fn delete_object_list(&self, list: RawHandle) -> bool;
    fn list_num_objects(&self, list: RawHandle) -> i32;
}
