use std::fmt;
use std::rc::Rc;

use crate::engine::{Animation, EngineArgs, Layer, Sprite, Tilengine};
use crate::native::{BlendFunction, Color, ErrorCode, LogLevel, Native, RawHandle, VideoCallback};
use crate::resources::{Bitmap, NativeRef, Palette, Tilemap};

/// One initialized native context.
///
/// Created by [`Tilengine::create_engine`]. Layer, sprite and animation
/// slots are fixed at creation. Dropping the engine deletes its context and
/// frees the handle's engine guard; [`delete`](Self::delete) and
/// [`deinit`](Self::deinit) do the same explicitly.
pub struct Engine {
    tln: Tilengine,
    context: RawHandle,
    width: i32,
    height: i32,
    layers: Vec<Layer>,
    sprites: Vec<Sprite>,
    animations: Vec<Animation>,
    framebuffer: Vec<u32>,
    released: bool,
}

impl Engine {
    pub(crate) fn from_context(tln: Tilengine, context: RawHandle, args: &EngineArgs) -> Self {
        let native = tln.backend().clone();
        Self {
            layers: (0..args.layers()).map(|i| Layer::new(i, native.clone())).collect(),
            sprites: (0..args.sprites()).map(|i| Sprite::new(i, native.clone())).collect(),
            animations: (0..args.animations()).map(|i| Animation::new(i, native.clone())).collect(),
            tln,
            context,
            width: args.width(),
            height: args.height(),
            framebuffer: Vec::new(),
            released: false,
        }
    }

    fn native(&self) -> &dyn Native {
        self.tln.backend().as_ref()
    }

    pub fn tilengine(&self) -> &Tilengine {
        &self.tln
    }

    pub fn backend(&self) -> &Rc<dyn Native> {
        self.tln.backend()
    }

    /// Native context handle.
    pub fn context(&self) -> RawHandle {
        self.context
    }

    /// Makes this engine's context the target of native calls.
    pub fn set_context(&self) -> bool {
        self.native().set_context(self.context)
    }

    // ── slots ─────────────────────────────────────────────────────────────

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn layer(&self, index: usize) -> Option<&Layer> {
        self.layers.get(index)
    }

    pub fn sprites(&self) -> &[Sprite] {
        &self.sprites
    }

    pub fn sprite(&self, index: usize) -> Option<&Sprite> {
        self.sprites.get(index)
    }

    pub fn animations(&self) -> &[Animation] {
        &self.animations
    }

    pub fn animation(&self, index: usize) -> Option<&Animation> {
        self.animations.get(index)
    }

    /// First sprite slot not in use.
    pub fn available_sprite(&self) -> Option<usize> {
        usize::try_from(self.native().available_sprite()).ok()
    }

    /// Screen rows `top..bottom` where masked sprites are hidden.
    pub fn set_sprites_mask_region(&self, top: i32, bottom: i32) {
        self.native().set_sprites_mask_region(top, bottom);
    }

    /// First palette animation slot not in use.
    pub fn available_animation(&self) -> Option<usize> {
        usize::try_from(self.native().available_animation()).ok()
    }

    // ── diagnostics ───────────────────────────────────────────────────────

    pub fn num_objects(&self) -> u32 {
        self.native().num_objects()
    }

    pub fn used_memory(&self) -> u32 {
        self.native().used_memory()
    }

    pub fn width(&self) -> i32 {
        self.native().width()
    }

    pub fn height(&self) -> i32 {
        self.native().height()
    }

    pub fn num_layers(&self) -> i32 {
        self.native().num_layers()
    }

    pub fn num_sprites(&self) -> i32 {
        self.native().num_sprites()
    }

    /// Native library version as `0xMMmmpp`.
    pub fn version(&self) -> u32 {
        self.native().version()
    }

    pub fn last_error(&self) -> ErrorCode {
        self.native().last_error()
    }

    pub fn last_error_message(&self) -> String {
        self.native().error_string(self.last_error())
    }

    // ── background, palettes, callbacks ───────────────────────────────────

    pub fn set_background_color(&self, color: Color) {
        self.native().set_bg_color(color.r, color.g, color.b);
    }

    pub fn disable_background_color(&self) {
        self.native().disable_bg_color();
    }

    /// `None` removes the background bitmap.
    pub fn set_background_bitmap(&self, bitmap: Option<&Bitmap>) -> bool {
        self.native().set_bg_bitmap(bitmap.map(Bitmap::raw))
    }

    pub fn set_background_palette(&self, palette: &Palette) -> bool {
        self.native().set_bg_palette(palette.raw())
    }

    /// Uses the tilemap's own background color.
    pub fn set_background_from_tilemap(&self, tilemap: &Tilemap) -> bool {
        self.native().set_bg_color_from_tilemap(tilemap.raw())
    }

    pub fn set_global_palette(&self, index: i32, palette: &Palette) -> bool {
        self.native().set_global_palette(index, palette.raw())
    }

    pub fn global_palette(&self, index: i32) -> Option<Palette> {
        self.native()
            .global_palette(index)
            .map(|raw| Palette::from_ref(NativeRef::new(raw, self.backend().clone())))
    }

    pub fn set_raster_callback(&self, callback: Option<VideoCallback>) {
        self.native().set_raster_callback(callback);
    }

    pub fn set_frame_callback(&self, callback: Option<VideoCallback>) {
        self.native().set_frame_callback(callback);
    }

    pub fn set_blend_function(&self, function: Option<BlendFunction>) {
        self.native().set_custom_blend_function(function);
    }

    pub fn set_log_level(&self, level: LogLevel) {
        self.native().set_log_level(level);
    }

    pub fn target_fps(&self) -> i32 {
        self.native().target_fps()
    }

    pub fn set_target_fps(&self, fps: i32) {
        self.native().set_target_fps(fps);
    }

    /// Base directory for `load_*` calls; `None` resets to the working directory.
    pub fn set_load_path(&self, path: Option<&str>) {
        self.native().set_load_path(path);
    }

    pub fn open_resource_pack(&self, filename: &str, key: Option<&str>) -> bool {
        self.native().open_resource_pack(filename, key)
    }

    pub fn close_resource_pack(&self) {
        self.native().close_resource_pack();
    }

    // ── frames ────────────────────────────────────────────────────────────

    /// Renders one frame without a window (frame 0 auto-increments).
    pub fn update_frame(&self, frame: i32) {
        self.native().update_frame(frame);
    }

    /// Renders `frame` into the engine's own framebuffer and returns it.
    ///
    /// Pixels are `0xAARRGGBB`, `width` per row. The native render target
    /// only points at the buffer for the duration of this call.
    pub fn render_to_buffer(&mut self, frame: i32) -> &[u32] {
        let len = self.width.max(0) as usize * self.height.max(0) as usize;
        self.framebuffer.resize(len, 0);

        let native = self.tln.backend().clone();
        native.set_context(self.context);
        native.render_frame_to(
            bytemuck::cast_slice_mut(&mut self.framebuffer),
            self.width.saturating_mul(4),
            frame,
        );
        &self.framebuffer
    }

    /// Framebuffer size in pixels.
    pub fn resolution(&self) -> (i32, i32) {
        (self.width, self.height)
    }

    // ── teardown ──────────────────────────────────────────────────────────

    /// Deletes the native context.
    pub fn delete(mut self) {
        self.release(false);
    }

    /// Deinitializes the native context (makes it current first).
    pub fn deinit(mut self) {
        self.release(true);
    }

    fn release(&mut self, deinit: bool) {
        if self.released {
            return;
        }
        self.released = true;

        let native = self.native();
        if deinit {
            native.set_context(self.context);
            native.deinit();
        } else {
            native.delete_context(self.context);
        }
        self.tln.release();
        log::debug!("engine context {:#x} released", self.context.addr());
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        self.release(false);
    }
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("context", &format_args!("{:#x}", self.context.addr()))
            .field("resolution", &(self.width, self.height))
            .field("layers", &self.layers.len())
            .field("sprites", &self.sprites.len())
            .field("animations", &self.animations.len())
            .finish()
    }
}
