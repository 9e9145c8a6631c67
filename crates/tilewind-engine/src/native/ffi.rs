use std::cell::RefCell;
use std::collections::HashMap;
use std::ffi::{CStr, CString, c_char, c_void};
use std::ptr;

use super::types::{
    Blend, BlendFunction, Color, ColorStrip, Crt, CrtEffect, ErrorCode, Input, LayerType, LogLevel, Overlay,
    PixelMap, Player, RawHandle, SequenceFrame, SequenceInfo, SpriteData, SpriteInfo, SpriteState, Tile,
    TileFlags, TileInfo, VideoCallback, WindowFlags,
};
use super::Native;

type Handle = *mut c_void;

#[repr(C)]
struct RawSpriteData {
    name: [c_char; 64],
    x: i32,
    y: i32,
    w: i32,
    h: i32,
}

#[repr(C)]
struct RawSequenceInfo {
    name: [c_char; 32],
    num_frames: i32,
}

#[repr(C)]
struct RawSpriteState {
    x: i32,
    y: i32,
    w: i32,
    h: i32,
    flags: u32,
    palette: Handle,
    spriteset: Handle,
    index: i32,
    enabled: bool,
    collision: bool,
}

#[link(name = "Tilengine")]
unsafe extern "C" {
    fn TLN_Init(hres: i32, vres: i32, numlayers: i32, numsprites: i32, numanimations: i32) -> Handle;
    fn TLN_SetContext(context: Handle) -> bool;
    fn TLN_GetContext() -> Handle;
    fn TLN_DeleteContext(context: Handle) -> bool;
    fn TLN_Deinit();
    fn TLN_GetVersion() -> u32;
    fn TLN_GetWidth() -> i32;
    fn TLN_GetHeight() -> i32;
    fn TLN_GetNumObjects() -> u32;
    fn TLN_GetUsedMemory() -> u32;
    fn TLN_GetNumLayers() -> i32;
    fn TLN_GetNumSprites() -> i32;
    fn TLN_GetTargetFps() -> i32;
    fn TLN_SetTargetFps(fps: i32);
    fn TLN_SetBGColor(r: u8, g: u8, b: u8);
    fn TLN_SetBGColorFromTilemap(tilemap: Handle) -> bool;
    fn TLN_DisableBGColor();
    fn TLN_SetBGBitmap(bitmap: Handle) -> bool;
    fn TLN_SetBGPalette(palette: Handle) -> bool;
    fn TLN_SetGlobalPalette(index: i32, palette: Handle) -> bool;
    fn TLN_GetGlobalPalette(index: i32) -> Handle;
    fn TLN_SetRasterCallback(callback: Option<VideoCallback>);
    fn TLN_SetFrameCallback(callback: Option<VideoCallback>);
    fn TLN_SetCustomBlendFunction(function: Option<BlendFunction>);
    fn TLN_SetLogLevel(level: LogLevel);
    fn TLN_SetLoadPath(path: *const c_char);
    fn TLN_OpenResourcePack(filename: *const c_char, key: *const c_char) -> bool;
    fn TLN_CloseResourcePack();
    fn TLN_SetRenderTarget(data: *mut u8, pitch: i32);
    fn TLN_UpdateFrame(frame: i32);
    fn TLN_SetLastError(error: i32);
    fn TLN_GetLastError() -> i32;
    fn TLN_GetErrorString(error: i32) -> *const c_char;

    fn TLN_CreateWindow(overlay: *const c_char, flags: u32) -> bool;
    fn TLN_CreateWindowThread(overlay: *const c_char, flags: u32) -> bool;
    fn TLN_SetWindowTitle(title: *const c_char);
    fn TLN_ProcessWindow() -> bool;
    fn TLN_IsWindowActive() -> bool;
    fn TLN_GetInput(id: i32) -> bool;
    fn TLN_EnableInput(player: Player, enable: bool);
    fn TLN_AssignInputJoystick(player: Player, index: i32);
    fn TLN_DefineInputKey(player: Player, input: Input, keycode: u32);
    fn TLN_DefineInputButton(player: Player, input: Input, joybutton: u8);
    fn TLN_DrawFrame(frame: i32);
    fn TLN_WaitRedraw();
    fn TLN_DeleteWindow();
    fn TLN_ConfigCRTEffect(kind: Crt, blur: bool);
    fn TLN_EnableCRTEffect(
        overlay: Overlay,
        overlay_factor: u8,
        threshold: u8,
        v0: u8,
        v1: u8,
        v2: u8,
        v3: u8,
        blur: bool,
        glow_factor: u8,
    );
    fn TLN_DisableCRTEffect();
    fn TLN_EnableBlur(mode: bool);
    fn TLN_Delay(msecs: u32);
    fn TLN_GetTicks() -> u32;
    fn TLN_GetAverageFps() -> i32;
    fn TLN_GetWindowWidth() -> i32;
    fn TLN_GetWindowHeight() -> i32;
    fn TLN_GetWindowScaleFactor() -> i32;
    fn TLN_SetWindowScaleFactor(factor: i32);

    fn TLN_SetLayerTilemap(nlayer: i32, tilemap: Handle) -> bool;
    fn TLN_SetLayerBitmap(nlayer: i32, bitmap: Handle) -> bool;
    fn TLN_SetLayerPalette(nlayer: i32, palette: Handle) -> bool;
    fn TLN_GetLayerTilemap(nlayer: i32) -> Handle;
    fn TLN_GetLayerBitmap(nlayer: i32) -> Handle;
    fn TLN_GetLayerPalette(nlayer: i32) -> Handle;
    fn TLN_GetLayerTileset(nlayer: i32) -> Handle;
    fn TLN_SetLayerPosition(nlayer: i32, hstart: i32, vstart: i32) -> bool;
    fn TLN_GetLayerX(nlayer: i32) -> i32;
    fn TLN_GetLayerY(nlayer: i32) -> i32;
    fn TLN_SetLayerScaling(nlayer: i32, xfactor: f32, yfactor: f32) -> bool;
    fn TLN_SetLayerTransform(nlayer: i32, angle: f32, dx: f32, dy: f32, sx: f32, sy: f32) -> bool;
    fn TLN_ResetLayerMode(nlayer: i32) -> bool;
    fn TLN_SetLayerBlendMode(nlayer: i32, mode: Blend, factor: u8) -> bool;
    fn TLN_SetLayerClip(nlayer: i32, x1: i32, y1: i32, x2: i32, y2: i32) -> bool;
    fn TLN_DisableLayerClip(nlayer: i32) -> bool;
    fn TLN_SetLayerWindow(nlayer: i32, x1: i32, y1: i32, x2: i32, y2: i32, invert: bool) -> bool;
    fn TLN_SetLayerWindowColor(nlayer: i32, r: u8, g: u8, b: u8, blend: Blend) -> bool;
    fn TLN_DisableLayerWindow(nlayer: i32) -> bool;
    fn TLN_DisableLayerWindowColor(nlayer: i32) -> bool;
    fn TLN_GetLayerTile(nlayer: i32, x: i32, y: i32, info: *mut TileInfo) -> bool;
    fn TLN_SetLayerColumnOffset(nlayer: i32, offset: *mut i32) -> bool;
    fn TLN_SetLayerPixelMapping(nlayer: i32, table: *mut PixelMap) -> bool;
    fn TLN_SetLayerMosaic(nlayer: i32, width: i32, height: i32) -> bool;
    fn TLN_DisableLayerMosaic(nlayer: i32) -> bool;
    fn TLN_SetLayerObjects(nlayer: i32, objects: Handle, tileset: Handle) -> bool;
    fn TLN_GetLayerObjects(nlayer: i32) -> Handle;
    fn TLN_SetLayerPriority(nlayer: i32, enable: bool) -> bool;
    fn TLN_SetLayerParent(nlayer: i32, parent: i32) -> bool;
    fn TLN_DisableLayerParent(nlayer: i32) -> bool;
    fn TLN_EnableLayer(nlayer: i32) -> bool;
    fn TLN_DisableLayer(nlayer: i32) -> bool;
    fn TLN_GetLayerType(nlayer: i32) -> LayerType;
    fn TLN_GetLayerWidth(nlayer: i32) -> i32;
    fn TLN_GetLayerHeight(nlayer: i32) -> i32;

    fn TLN_ConfigSprite(nsprite: i32, spriteset: Handle, flags: u32) -> bool;
    fn TLN_SetSpriteSet(nsprite: i32, spriteset: Handle) -> bool;
    fn TLN_SetSpriteFlags(nsprite: i32, flags: u32) -> bool;
    fn TLN_EnableSpriteFlag(nsprite: i32, flag: u32, enable: bool) -> bool;
    fn TLN_SetSpritePivot(nsprite: i32, px: f32, py: f32) -> bool;
    fn TLN_SetSpritePosition(nsprite: i32, x: i32, y: i32) -> bool;
    fn TLN_GetSpriteX(nsprite: i32) -> i32;
    fn TLN_GetSpriteY(nsprite: i32) -> i32;
    fn TLN_SetSpritePicture(nsprite: i32, entry: i32) -> bool;
    fn TLN_GetSpritePicture(nsprite: i32) -> i32;
    fn TLN_SetSpritePalette(nsprite: i32, palette: Handle) -> bool;
    fn TLN_GetSpritePalette(nsprite: i32) -> Handle;
    fn TLN_SetSpriteBlendMode(nsprite: i32, mode: Blend, factor: u8) -> bool;
    fn TLN_SetSpriteScaling(nsprite: i32, sx: f32, sy: f32) -> bool;
    fn TLN_ResetSpriteScaling(nsprite: i32) -> bool;
    fn TLN_EnableSpriteCollision(nsprite: i32, enable: bool) -> bool;
    fn TLN_GetSpriteCollision(nsprite: i32) -> bool;
    fn TLN_GetAvailableSprite() -> i32;
    fn TLN_DisableSprite(nsprite: i32) -> bool;
    fn TLN_SetSpriteAnimation(nsprite: i32, sequence: Handle, loops: i32) -> bool;
    fn TLN_DisableSpriteAnimation(nsprite: i32) -> bool;
    fn TLN_PauseSpriteAnimation(nsprite: i32) -> bool;
    fn TLN_ResumeSpriteAnimation(nsprite: i32) -> bool;
    fn TLN_GetSpriteState(nsprite: i32, state: *mut RawSpriteState) -> bool;
    fn TLN_SetFirstSprite(nsprite: i32) -> bool;
    fn TLN_SetNextSprite(nsprite: i32, next: i32) -> bool;
    fn TLN_EnableSpriteMasking(nsprite: i32, enable: bool) -> bool;
    fn TLN_SetSpritesMaskRegion(top_line: i32, bottom_line: i32);

    fn TLN_SetPaletteAnimation(index: i32, palette: Handle, sequence: Handle, blend: bool) -> bool;
    fn TLN_SetPaletteAnimationSource(index: i32, palette: Handle) -> bool;
    fn TLN_DisablePaletteAnimation(index: i32) -> bool;
    fn TLN_GetAnimationState(index: i32) -> bool;
    fn TLN_GetAvailableAnimation() -> i32;

    fn TLN_CreateBitmap(width: i32, height: i32, bpp: i32) -> Handle;
    fn TLN_LoadBitmap(filename: *const c_char) -> Handle;
    fn TLN_CloneBitmap(src: Handle) -> Handle;
    fn TLN_DeleteBitmap(bitmap: Handle) -> bool;
    fn TLN_GetBitmapPtr(bitmap: Handle, x: i32, y: i32) -> *mut u8;
    fn TLN_GetBitmapWidth(bitmap: Handle) -> i32;
    fn TLN_GetBitmapHeight(bitmap: Handle) -> i32;
    fn TLN_GetBitmapDepth(bitmap: Handle) -> i32;
    fn TLN_GetBitmapPitch(bitmap: Handle) -> i32;
    fn TLN_GetBitmapPalette(bitmap: Handle) -> Handle;
    fn TLN_SetBitmapPalette(bitmap: Handle, palette: Handle) -> bool;

    fn TLN_CreatePalette(entries: i32) -> Handle;
    fn TLN_LoadPalette(filename: *const c_char) -> Handle;
    fn TLN_ClonePalette(src: Handle) -> Handle;
    fn TLN_DeletePalette(palette: Handle) -> bool;
    fn TLN_SetPaletteColor(palette: Handle, color: i32, r: u8, g: u8, b: u8) -> bool;
    fn TLN_GetPaletteData(palette: Handle, index: i32) -> *mut u8;
    fn TLN_MixPalettes(src1: Handle, src2: Handle, dst: Handle, factor: u8) -> bool;
    fn TLN_AddPaletteColor(palette: Handle, r: u8, g: u8, b: u8, start: u8, num: u8) -> bool;
    fn TLN_SubPaletteColor(palette: Handle, r: u8, g: u8, b: u8, start: u8, num: u8) -> bool;
    fn TLN_ModPaletteColor(palette: Handle, r: u8, g: u8, b: u8, start: u8, num: u8) -> bool;

    fn TLN_CreateTileset(numtiles: i32, width: i32, height: i32, palette: Handle, sp: Handle, attributes: *mut c_void) -> Handle;
    fn TLN_LoadTileset(filename: *const c_char) -> Handle;
    fn TLN_CloneTileset(src: Handle) -> Handle;
    fn TLN_DeleteTileset(tileset: Handle) -> bool;
    fn TLN_SetTilesetPixels(tileset: Handle, entry: i32, srcdata: *const u8, srcpitch: i32) -> bool;
    fn TLN_GetTileWidth(tileset: Handle) -> i32;
    fn TLN_GetTileHeight(tileset: Handle) -> i32;
    fn TLN_GetTilesetNumTiles(tileset: Handle) -> i32;
    fn TLN_GetTilesetPalette(tileset: Handle) -> Handle;

    fn TLN_CreateTilemap(rows: i32, cols: i32, tiles: *const Tile, bgcolor: u32, tileset: Handle) -> Handle;
    fn TLN_LoadTilemap(filename: *const c_char, layername: *const c_char) -> Handle;
    fn TLN_CloneTilemap(src: Handle) -> Handle;
    fn TLN_DeleteTilemap(tilemap: Handle) -> bool;
    fn TLN_GetTilemapRows(tilemap: Handle) -> i32;
    fn TLN_GetTilemapCols(tilemap: Handle) -> i32;
    fn TLN_GetTilemapTileset2(tilemap: Handle, index: i32) -> Handle;
    fn TLN_SetTilemapTileset2(tilemap: Handle, tileset: Handle, index: i32) -> bool;
    fn TLN_GetTilemapTile(tilemap: Handle, row: i32, col: i32, tile: *mut Tile) -> bool;
    fn TLN_SetTilemapTile(tilemap: Handle, row: i32, col: i32, tile: *const Tile) -> bool;
    fn TLN_CopyTiles(src: Handle, srcrow: i32, srccol: i32, rows: i32, cols: i32, dst: Handle, dstrow: i32, dstcol: i32) -> bool;

    fn TLN_CreateSequence(name: *const c_char, target: i32, num_frames: i32, frames: *const SequenceFrame) -> Handle;
    fn TLN_CreateCycle(name: *const c_char, num_strips: i32, strips: *const ColorStrip) -> Handle;
    fn TLN_CreateSpriteSequence(name: *const c_char, spriteset: Handle, basename: *const c_char, delay: i32) -> Handle;
    fn TLN_CloneSequence(src: Handle) -> Handle;
    fn TLN_DeleteSequence(sequence: Handle) -> bool;
    fn TLN_GetSequenceInfo(sequence: Handle, info: *mut RawSequenceInfo) -> bool;

    fn TLN_CreateSpriteset(bitmap: Handle, data: *const RawSpriteData, num_entries: i32) -> Handle;
    fn TLN_LoadSpriteset(name: *const c_char) -> Handle;
    fn TLN_CloneSpriteset(src: Handle) -> Handle;
    fn TLN_DeleteSpriteset(spriteset: Handle) -> bool;
    fn TLN_GetSpriteInfo(spriteset: Handle, entry: i32, info: *mut SpriteInfo) -> bool;
    fn TLN_GetSpritesetPalette(spriteset: Handle) -> Handle;
    fn TLN_FindSpritesetSprite(spriteset: Handle, name: *const c_char) -> i32;

    fn TLN_CreateObjectList() -> Handle;
    fn TLN_AddTileObjectToList(list: Handle, id: u16, gid: u16, flags: u16, x: i32, y: i32) -> bool;
    fn TLN_LoadObjectList(filename: *const c_char, layername: *const c_char) -> Handle;
    fn TLN_CloneObjectList(src: Handle) -> Handle;
    fn TLN_DeleteObjectList(list: Handle) -> bool;
    fn TLN_GetListNumObjects(list: Handle) -> i32;
}

/// The linked Tilengine library.
///
/// Invariant:
/// - at most one instance per process (the library state is global);
///   only [`crate::Tilengine::native`] constructs it.
/// - tables handed to the library by pointer (column offsets, pixel maps)
///   are owned here until replaced, disabled or their context is deleted.
pub struct Ffi {
    pinned: RefCell<HashMap<(usize, i32), Pinned>>,
}

#[derive(Default)]
struct Pinned {
    column_offset: Option<Box<[i32]>>,
    pixel_map: Option<Box<[PixelMap]>>,
}

impl Ffi {
    pub(crate) fn new() -> Self {
        Self {
            pinned: RefCell::new(HashMap::new()),
        }
    }

    /// Pin slot of `layer` in the current context.
    fn pin_key(layer: i32) -> Option<(usize, i32)> {
        handle(unsafe { TLN_GetContext() }).map(|ctx| (ctx.addr(), layer))
    }

    fn unpin_context(&self, context: usize) {
        self.pinned.borrow_mut().retain(|(ctx, _), _| *ctx != context);
    }

    /// Columns the library reads for `layer`: visible width in tiles plus two.
    fn column_count(layer: i32) -> Option<usize> {
        let tileset = unsafe { TLN_GetLayerTileset(layer) };
        if tileset.is_null() {
            unsafe { TLN_SetLastError(ErrorCode::RefTileset as i32) };
            return None;
        }
        let tile_width = unsafe { TLN_GetTileWidth(tileset) }.max(1);
        let width = unsafe { TLN_GetWidth() }.max(0);
        Some((width / tile_width) as usize + 2)
    }
}

fn handle(ptr: Handle) -> Option<RawHandle> {
    RawHandle::from_ptr(ptr)
}

fn raw(h: Option<RawHandle>) -> Handle {
    h.map_or(ptr::null_mut(), RawHandle::as_ptr)
}

/// Interior NULs are reported as a native `NullPointer` error.
fn c_string(s: &str) -> Option<CString> {
    match CString::new(s) {
        Ok(c) => Some(c),
        Err(_) => {
            unsafe { TLN_SetLastError(ErrorCode::NullPointer as i32) };
            None
        }
    }
}

fn opt_ptr(s: &Option<CString>) -> *const c_char {
    s.as_ref().map_or(ptr::null(), |c| c.as_ptr())
}

fn fixed_name<const N: usize>(name: &str) -> [c_char; N] {
    let mut out = [0 as c_char; N];
    for (dst, src) in out.iter_mut().take(N - 1).zip(name.bytes()) {
        *dst = src as c_char;
    }
    out
}

fn read_name(name: &[c_char]) -> String {
    let bytes: Vec<u8> = name.iter().take_while(|&&c| c != 0).map(|&c| c as u8).collect();
    String::from_utf8_lossy(&bytes).into_owned()
}

impl Native for Ffi {
    // ── context ───────────────────────────────────────────────────────────

    fn init(&self, hres: i32, vres: i32, layers: i32, sprites: i32, animations: i32) -> Option<RawHandle> {
        handle(unsafe { TLN_Init(hres, vres, layers, sprites, animations) })
    }

    fn set_context(&self, context: RawHandle) -> bool {
        unsafe { TLN_SetContext(context.as_ptr()) }
    }

    fn context(&self) -> Option<RawHandle> {
        handle(unsafe { TLN_GetContext() })
    }

    fn delete_context(&self, context: RawHandle) -> bool {
        let deleted = unsafe { TLN_DeleteContext(context.as_ptr()) };
        if deleted {
            self.unpin_context(context.addr());
        }
        deleted
    }

    fn deinit(&self) {
        let current = handle(unsafe { TLN_GetContext() });
        unsafe { TLN_Deinit() }
        if let Some(ctx) = current {
            self.unpin_context(ctx.addr());
        }
    }

    fn version(&self) -> u32 {
        unsafe { TLN_GetVersion() }
    }

    fn width(&self) -> i32 {
        unsafe { TLN_GetWidth() }
    }

    fn height(&self) -> i32 {
        unsafe { TLN_GetHeight() }
    }

    fn num_objects(&self) -> u32 {
        unsafe { TLN_GetNumObjects() }
    }

    fn used_memory(&self) -> u32 {
        unsafe { TLN_GetUsedMemory() }
    }

    fn num_layers(&self) -> i32 {
        unsafe { TLN_GetNumLayers() }
    }

    fn num_sprites(&self) -> i32 {
        unsafe { TLN_GetNumSprites() }
    }

    fn target_fps(&self) -> i32 {
        unsafe { TLN_GetTargetFps() }
    }

    fn set_target_fps(&self, fps: i32) {
        unsafe { TLN_SetTargetFps(fps) }
    }

    fn set_bg_color(&self, r: u8, g: u8, b: u8) {
        unsafe { TLN_SetBGColor(r, g, b) }
    }

    fn set_bg_color_from_tilemap(&self, tilemap: RawHandle) -> bool {
        unsafe { TLN_SetBGColorFromTilemap(tilemap.as_ptr()) }
    }

    fn disable_bg_color(&self) {
        unsafe { TLN_DisableBGColor() }
    }

    fn set_bg_bitmap(&self, bitmap: Option<RawHandle>) -> bool {
        unsafe { TLN_SetBGBitmap(raw(bitmap)) }
    }

    fn set_bg_palette(&self, palette: RawHandle) -> bool {
        unsafe { TLN_SetBGPalette(palette.as_ptr()) }
    }

    fn set_global_palette(&self, index: i32, palette: RawHandle) -> bool {
        unsafe { TLN_SetGlobalPalette(index, palette.as_ptr()) }
    }

    fn global_palette(&self, index: i32) -> Option<RawHandle> {
        handle(unsafe { TLN_GetGlobalPalette(index) })
    }

    fn set_raster_callback(&self, callback: Option<VideoCallback>) {
        unsafe { TLN_SetRasterCallback(callback) }
    }

    fn set_frame_callback(&self, callback: Option<VideoCallback>) {
        unsafe { TLN_SetFrameCallback(callback) }
    }

    fn set_custom_blend_function(&self, function: Option<BlendFunction>) {
        unsafe { TLN_SetCustomBlendFunction(function) }
    }

    fn set_log_level(&self, level: LogLevel) {
        unsafe { TLN_SetLogLevel(level) }
    }

    fn set_load_path(&self, path: Option<&str>) {
        let path = path.and_then(c_string);
        unsafe { TLN_SetLoadPath(opt_ptr(&path)) }
    }

    fn open_resource_pack(&self, filename: &str, key: Option<&str>) -> bool {
        let Some(file) = c_string(filename) else {
            return false;
        };
        let key = key.and_then(c_string);
        unsafe { TLN_OpenResourcePack(file.as_ptr(), opt_ptr(&key)) }
    }

    fn close_resource_pack(&self) {
        unsafe { TLN_CloseResourcePack() }
    }

    fn render_frame_to(&self, target: &mut [u8], pitch: i32, frame: i32) {
        let rows = self.height().max(0) as usize;
        if pitch <= 0 || target.len() < pitch as usize * rows {
            unsafe { TLN_SetLastError(ErrorCode::WrongSize as i32) };
            return;
        }
        // the target pointer is only held by the library until it is cleared below
        unsafe {
            TLN_SetRenderTarget(target.as_mut_ptr(), pitch);
            TLN_UpdateFrame(frame);
            TLN_SetRenderTarget(ptr::null_mut(), 0);
        }
    }

    fn update_frame(&self, frame: i32) {
        unsafe { TLN_UpdateFrame(frame) }
    }

    fn last_error(&self) -> ErrorCode {
        ErrorCode::from_raw(unsafe { TLN_GetLastError() }).unwrap_or(ErrorCode::Unsupported)
    }

    fn set_last_error(&self, code: ErrorCode) {
        unsafe { TLN_SetLastError(code as i32) }
    }

    fn error_string(&self, code: ErrorCode) -> String {
        let s = unsafe { TLN_GetErrorString(code as i32) };
        if s.is_null() {
            return code.to_string();
        }
        unsafe { CStr::from_ptr(s) }.to_string_lossy().into_owned()
    }

    // ── window ────────────────────────────────────────────────────────────

    fn create_window(&self, overlay: Option<&str>, flags: WindowFlags) -> bool {
        let overlay = overlay.and_then(c_string);
        unsafe { TLN_CreateWindow(opt_ptr(&overlay), flags.bits()) }
    }

    fn create_window_thread(&self, overlay: Option<&str>, flags: WindowFlags) -> bool {
        let overlay = overlay.and_then(c_string);
        unsafe { TLN_CreateWindowThread(opt_ptr(&overlay), flags.bits()) }
    }

    fn set_window_title(&self, title: &str) {
        if let Some(t) = c_string(title) {
            unsafe { TLN_SetWindowTitle(t.as_ptr()) }
        }
    }

    fn process_window(&self) -> bool {
        unsafe { TLN_ProcessWindow() }
    }

    fn is_window_active(&self) -> bool {
        unsafe { TLN_IsWindowActive() }
    }

    fn input(&self, player: Player, input: Input) -> bool {
        unsafe { TLN_GetInput(input.encode(player)) }
    }

    fn enable_input(&self, player: Player, enable: bool) {
        unsafe { TLN_EnableInput(player, enable) }
    }

    fn assign_input_joystick(&self, player: Player, index: i32) {
        unsafe { TLN_AssignInputJoystick(player, index) }
    }

    fn define_input_key(&self, player: Player, input: Input, keycode: u32) {
        unsafe { TLN_DefineInputKey(player, input, keycode) }
    }

    fn define_input_button(&self, player: Player, input: Input, button: u8) {
        unsafe { TLN_DefineInputButton(player, input, button) }
    }

    fn draw_frame(&self, frame: i32) {
        unsafe { TLN_DrawFrame(frame) }
    }

    fn wait_redraw(&self) {
        unsafe { TLN_WaitRedraw() }
    }

    fn delete_window(&self) {
        unsafe { TLN_DeleteWindow() }
    }

    fn config_crt_effect(&self, kind: Crt, blur: bool) {
        unsafe { TLN_ConfigCRTEffect(kind, blur) }
    }

    fn enable_crt_effect(&self, effect: &CrtEffect) {
        let [v0, v1, v2, v3] = effect.curve;
        unsafe {
            TLN_EnableCRTEffect(
                effect.overlay,
                effect.overlay_factor,
                effect.threshold,
                v0,
                v1,
                v2,
                v3,
                effect.blur,
                effect.glow_factor,
            )
        }
    }

    fn disable_crt_effect(&self) {
        unsafe { TLN_DisableCRTEffect() }
    }

    fn enable_blur(&self, enable: bool) {
        unsafe { TLN_EnableBlur(enable) }
    }

    fn delay(&self, msecs: u32) {
        unsafe { TLN_Delay(msecs) }
    }

    fn ticks(&self) -> u32 {
        unsafe { TLN_GetTicks() }
    }

    fn average_fps(&self) -> u32 {
        unsafe { TLN_GetAverageFps() }.max(0) as u32
    }

    fn window_width(&self) -> i32 {
        unsafe { TLN_GetWindowWidth() }
    }

    fn window_height(&self) -> i32 {
        unsafe { TLN_GetWindowHeight() }
    }

    fn window_scale_factor(&self) -> i32 {
        unsafe { TLN_GetWindowScaleFactor() }
    }

    fn set_window_scale_factor(&self, factor: i32) {
        unsafe { TLN_SetWindowScaleFactor(factor) }
    }

    // ── layers ────────────────────────────────────────────────────────────

    fn set_layer_tilemap(&self, layer: i32, tilemap: RawHandle) -> bool {
        unsafe { TLN_SetLayerTilemap(layer, tilemap.as_ptr()) }
    }

    fn set_layer_bitmap(&self, layer: i32, bitmap: RawHandle) -> bool {
        unsafe { TLN_SetLayerBitmap(layer, bitmap.as_ptr()) }
    }

    fn set_layer_palette(&self, layer: i32, palette: RawHandle) -> bool {
        unsafe { TLN_SetLayerPalette(layer, palette.as_ptr()) }
    }

    fn layer_tilemap(&self, layer: i32) -> Option<RawHandle> {
        handle(unsafe { TLN_GetLayerTilemap(layer) })
    }

    fn layer_bitmap(&self, layer: i32) -> Option<RawHandle> {
        handle(unsafe { TLN_GetLayerBitmap(layer) })
    }

    fn layer_palette(&self, layer: i32) -> Option<RawHandle> {
        handle(unsafe { TLN_GetLayerPalette(layer) })
    }

    fn layer_tileset(&self, layer: i32) -> Option<RawHandle> {
        handle(unsafe { TLN_GetLayerTileset(layer) })
    }

    fn set_layer_position(&self, layer: i32, x: i32, y: i32) -> bool {
        unsafe { TLN_SetLayerPosition(layer, x, y) }
    }

    fn layer_x(&self, layer: i32) -> i32 {
        unsafe { TLN_GetLayerX(layer) }
    }

    fn layer_y(&self, layer: i32) -> i32 {
        unsafe { TLN_GetLayerY(layer) }
    }

    fn set_layer_scaling(&self, layer: i32, sx: f32, sy: f32) -> bool {
        unsafe { TLN_SetLayerScaling(layer, sx, sy) }
    }

    fn set_layer_transform(&self, layer: i32, angle: f32, dx: f32, dy: f32, sx: f32, sy: f32) -> bool {
        unsafe { TLN_SetLayerTransform(layer, angle, dx, dy, sx, sy) }
    }

    fn reset_layer_mode(&self, layer: i32) -> bool {
        unsafe { TLN_ResetLayerMode(layer) }
    }

    fn set_layer_blend_mode(&self, layer: i32, mode: Blend, factor: u8) -> bool {
        unsafe { TLN_SetLayerBlendMode(layer, mode, factor) }
    }

    fn set_layer_clip(&self, layer: i32, x1: i32, y1: i32, x2: i32, y2: i32) -> bool {
        unsafe { TLN_SetLayerClip(layer, x1, y1, x2, y2) }
    }

    fn disable_layer_clip(&self, layer: i32) -> bool {
        unsafe { TLN_DisableLayerClip(layer) }
    }

    fn set_layer_window(&self, layer: i32, x1: i32, y1: i32, x2: i32, y2: i32, invert: bool) -> bool {
        unsafe { TLN_SetLayerWindow(layer, x1, y1, x2, y2, invert) }
    }

    fn set_layer_window_color(&self, layer: i32, color: Color, blend: Blend) -> bool {
        unsafe { TLN_SetLayerWindowColor(layer, color.r, color.g, color.b, blend) }
    }

    fn disable_layer_window(&self, layer: i32) -> bool {
        unsafe { TLN_DisableLayerWindow(layer) }
    }

    fn disable_layer_window_color(&self, layer: i32) -> bool {
        unsafe { TLN_DisableLayerWindowColor(layer) }
    }

    fn layer_tile(&self, layer: i32, x: i32, y: i32) -> Option<TileInfo> {
        let mut info = TileInfo::default();
        unsafe { TLN_GetLayerTile(layer, x, y, &mut info) }.then_some(info)
    }

    fn set_layer_column_offset(&self, layer: i32, offsets: Option<&[i32]>) -> bool {
        let Some(key) = Self::pin_key(layer) else {
            unsafe { TLN_SetLastError(ErrorCode::NullPointer as i32) };
            return false;
        };
        let Some(offsets) = offsets else {
            let ok = unsafe { TLN_SetLayerColumnOffset(layer, ptr::null_mut()) };
            if let Some(pin) = self.pinned.borrow_mut().get_mut(&key) {
                pin.column_offset = None;
            }
            return ok;
        };
        let Some(columns) = Self::column_count(layer) else {
            return false;
        };
        if offsets.len() < columns {
            unsafe { TLN_SetLastError(ErrorCode::WrongSize as i32) };
            return false;
        }

        let mut table: Box<[i32]> = offsets.into();
        if !unsafe { TLN_SetLayerColumnOffset(layer, table.as_mut_ptr()) } {
            return false;
        }
        // The boxed slice does not move when the map reallocates.
        self.pinned.borrow_mut().entry(key).or_default().column_offset = Some(table);
        true
    }

    fn set_layer_pixel_mapping(&self, layer: i32, table: Option<&[PixelMap]>) -> bool {
        let Some(key) = Self::pin_key(layer) else {
            unsafe { TLN_SetLastError(ErrorCode::NullPointer as i32) };
            return false;
        };
        let Some(table) = table else {
            let ok = unsafe { TLN_SetLayerPixelMapping(layer, ptr::null_mut()) };
            if let Some(pin) = self.pinned.borrow_mut().get_mut(&key) {
                pin.pixel_map = None;
            }
            return ok;
        };
        let needed = unsafe { TLN_GetWidth() }.max(0) as usize * unsafe { TLN_GetHeight() }.max(0) as usize;
        if table.len() < needed {
            unsafe { TLN_SetLastError(ErrorCode::WrongSize as i32) };
            return false;
        }

        let mut table: Box<[PixelMap]> = table.into();
        if !unsafe { TLN_SetLayerPixelMapping(layer, table.as_mut_ptr()) } {
            return false;
        }
        self.pinned.borrow_mut().entry(key).or_default().pixel_map = Some(table);
        true
    }

    fn set_layer_mosaic(&self, layer: i32, w: i32, h: i32) -> bool {
        unsafe { TLN_SetLayerMosaic(layer, w, h) }
    }

    fn disable_layer_mosaic(&self, layer: i32) -> bool {
        unsafe { TLN_DisableLayerMosaic(layer) }
    }

    fn set_layer_objects(&self, layer: i32, list: RawHandle, tileset: Option<RawHandle>) -> bool {
        unsafe { TLN_SetLayerObjects(layer, list.as_ptr(), raw(tileset)) }
    }

    fn layer_objects(&self, layer: i32) -> Option<RawHandle> {
        handle(unsafe { TLN_GetLayerObjects(layer) })
    }

    fn set_layer_priority(&self, layer: i32, enable: bool) -> bool {
        unsafe { TLN_SetLayerPriority(layer, enable) }
    }

    fn set_layer_parent(&self, layer: i32, parent: i32) -> bool {
        unsafe { TLN_SetLayerParent(layer, parent) }
    }

    fn disable_layer_parent(&self, layer: i32) -> bool {
        unsafe { TLN_DisableLayerParent(layer) }
    }

    fn enable_layer(&self, layer: i32) -> bool {
        unsafe { TLN_EnableLayer(layer) }
    }

    fn disable_layer(&self, layer: i32) -> bool {
        unsafe { TLN_DisableLayer(layer) }
    }

    fn layer_type(&self, layer: i32) -> LayerType {
        unsafe { TLN_GetLayerType(layer) }
    }

    fn layer_width(&self, layer: i32) -> i32 {
        unsafe { TLN_GetLayerWidth(layer) }
    }

    fn layer_height(&self, layer: i32) -> i32 {
        unsafe { TLN_GetLayerHeight(layer) }
    }

    // ── sprites ───────────────────────────────────────────────────────────

    fn config_sprite(&self, sprite: i32, spriteset: RawHandle, flags: TileFlags) -> bool {
        unsafe { TLN_ConfigSprite(sprite, spriteset.as_ptr(), flags.bits() as u32) }
    }

    fn set_sprite_set(&self, sprite: i32, spriteset: RawHandle) -> bool {
        unsafe { TLN_SetSpriteSet(sprite, spriteset.as_ptr()) }
    }

    fn set_sprite_flags(&self, sprite: i32, flags: TileFlags) -> bool {
        unsafe { TLN_SetSpriteFlags(sprite, flags.bits() as u32) }
    }

    fn enable_sprite_flag(&self, sprite: i32, flag: TileFlags, enable: bool) -> bool {
        unsafe { TLN_EnableSpriteFlag(sprite, flag.bits() as u32, enable) }
    }

    fn set_sprite_pivot(&self, sprite: i32, px: f32, py: f32) -> bool {
        unsafe { TLN_SetSpritePivot(sprite, px, py) }
    }

    fn set_sprite_position(&self, sprite: i32, x: i32, y: i32) -> bool {
        unsafe { TLN_SetSpritePosition(sprite, x, y) }
    }

    fn sprite_x(&self, sprite: i32) -> i32 {
        unsafe { TLN_GetSpriteX(sprite) }
    }

    fn sprite_y(&self, sprite: i32) -> i32 {
        unsafe { TLN_GetSpriteY(sprite) }
    }

    fn set_sprite_picture(&self, sprite: i32, entry: i32) -> bool {
        unsafe { TLN_SetSpritePicture(sprite, entry) }
    }

    fn sprite_picture(&self, sprite: i32) -> i32 {
        unsafe { TLN_GetSpritePicture(sprite) }
    }

    fn set_sprite_palette(&self, sprite: i32, palette: RawHandle) -> bool {
        unsafe { TLN_SetSpritePalette(sprite, palette.as_ptr()) }
    }

    fn sprite_palette(&self, sprite: i32) -> Option<RawHandle> {
        handle(unsafe { TLN_GetSpritePalette(sprite) })
    }

    fn set_sprite_blend_mode(&self, sprite: i32, mode: Blend, factor: u8) -> bool {
        unsafe { TLN_SetSpriteBlendMode(sprite, mode, factor) }
    }

    fn set_sprite_scaling(&self, sprite: i32, sx: f32, sy: f32) -> bool {
        unsafe { TLN_SetSpriteScaling(sprite, sx, sy) }
    }

    fn reset_sprite_scaling(&self, sprite: i32) -> bool {
        unsafe { TLN_ResetSpriteScaling(sprite) }
    }

    fn enable_sprite_collision(&self, sprite: i32, enable: bool) -> bool {
        unsafe { TLN_EnableSpriteCollision(sprite, enable) }
    }

    fn sprite_collision(&self, sprite: i32) -> bool {
        unsafe { TLN_GetSpriteCollision(sprite) }
    }

    fn available_sprite(&self) -> i32 {
        unsafe { TLN_GetAvailableSprite() }
    }

    fn disable_sprite(&self, sprite: i32) -> bool {
        unsafe { TLN_DisableSprite(sprite) }
    }

    fn set_sprite_animation(&self, sprite: i32, sequence: RawHandle, loops: i32) -> bool {
        unsafe { TLN_SetSpriteAnimation(sprite, sequence.as_ptr(), loops) }
    }

    fn disable_sprite_animation(&self, sprite: i32) -> bool {
        unsafe { TLN_DisableSpriteAnimation(sprite) }
    }

    fn pause_sprite_animation(&self, sprite: i32) -> bool {
        unsafe { TLN_PauseSpriteAnimation(sprite) }
    }

    fn resume_sprite_animation(&self, sprite: i32) -> bool {
        unsafe { TLN_ResumeSpriteAnimation(sprite) }
    }

    fn sprite_state(&self, sprite: i32) -> Option<SpriteState> {
        let mut raw = RawSpriteState {
            x: 0,
            y: 0,
            w: 0,
            h: 0,
            flags: 0,
            palette: ptr::null_mut(),
            spriteset: ptr::null_mut(),
            index: 0,
            enabled: false,
            collision: false,
        };
        if !unsafe { TLN_GetSpriteState(sprite, &mut raw) } {
            return None;
        }
        Some(SpriteState {
            x: raw.x,
            y: raw.y,
            w: raw.w,
            h: raw.h,
            flags: TileFlags::from_bits_truncate(raw.flags as u16),
            palette: handle(raw.palette),
            spriteset: handle(raw.spriteset),
            index: raw.index,
            enabled: raw.enabled,
            collision: raw.collision,
        })
    }

    fn set_first_sprite(&self, sprite: i32) -> bool {
        unsafe { TLN_SetFirstSprite(sprite) }
    }

    fn set_next_sprite(&self, sprite: i32, next: i32) -> bool {
        unsafe { TLN_SetNextSprite(sprite, next) }
    }

    fn enable_sprite_masking(&self, sprite: i32, enable: bool) -> bool {
        unsafe { TLN_EnableSpriteMasking(sprite, enable) }
    }

    fn set_sprites_mask_region(&self, top: i32, bottom: i32) {
        unsafe { TLN_SetSpritesMaskRegion(top, bottom) }
    }

    // ── palette animations ────────────────────────────────────────────────

    fn set_palette_animation(&self, index: i32, palette: RawHandle, sequence: RawHandle, blend: bool) -> bool {
        unsafe { TLN_SetPaletteAnimation(index, palette.as_ptr(), sequence.as_ptr(), blend) }
    }

    fn set_palette_animation_source(&self, index: i32, palette: RawHandle) -> bool {
        unsafe { TLN_SetPaletteAnimationSource(index, palette.as_ptr()) }
    }

    fn disable_palette_animation(&self, index: i32) -> bool {
        unsafe { TLN_DisablePaletteAnimation(index) }
    }

    fn animation_state(&self, index: i32) -> bool {
        unsafe { TLN_GetAnimationState(index) }
    }

    fn available_animation(&self) -> i32 {
        unsafe { TLN_GetAvailableAnimation() }
    }

    // ── bitmaps ───────────────────────────────────────────────────────────

    fn create_bitmap(&self, width: i32, height: i32, bpp: i32) -> Option<RawHandle> {
        handle(unsafe { TLN_CreateBitmap(width, height, bpp) })
    }

    fn load_bitmap(&self, filename: &str) -> Option<RawHandle> {
        let file = c_string(filename)?;
        handle(unsafe { TLN_LoadBitmap(file.as_ptr()) })
    }

    fn clone_bitmap(&self, bitmap: RawHandle) -> Option<RawHandle> {
        handle(unsafe { TLN_CloneBitmap(bitmap.as_ptr()) })
    }

    fn delete_bitmap(&self, bitmap: RawHandle) -> bool {
        unsafe { TLN_DeleteBitmap(bitmap.as_ptr()) }
    }

    fn bitmap_width(&self, bitmap: RawHandle) -> i32 {
        unsafe { TLN_GetBitmapWidth(bitmap.as_ptr()) }
    }

    fn bitmap_height(&self, bitmap: RawHandle) -> i32 {
        unsafe { TLN_GetBitmapHeight(bitmap.as_ptr()) }
    }

    fn bitmap_depth(&self, bitmap: RawHandle) -> i32 {
        unsafe { TLN_GetBitmapDepth(bitmap.as_ptr()) }
    }

    fn bitmap_pitch(&self, bitmap: RawHandle) -> i32 {
        unsafe { TLN_GetBitmapPitch(bitmap.as_ptr()) }
    }

    fn bitmap_palette(&self, bitmap: RawHandle) -> Option<RawHandle> {
        handle(unsafe { TLN_GetBitmapPalette(bitmap.as_ptr()) })
    }

    fn set_bitmap_palette(&self, bitmap: RawHandle, palette: RawHandle) -> bool {
        unsafe { TLN_SetBitmapPalette(bitmap.as_ptr(), palette.as_ptr()) }
    }

    fn bitmap_pixels(&self, bitmap: RawHandle) -> Option<Vec<u8>> {
        let len = (self.bitmap_pitch(bitmap).max(0) * self.bitmap_height(bitmap).max(0)) as usize;
        let data = unsafe { TLN_GetBitmapPtr(bitmap.as_ptr(), 0, 0) };
        if data.is_null() {
            return None;
        }
        // SAFETY: the bitmap buffer is `pitch * height` bytes and outlives this copy
        Some(unsafe { std::slice::from_raw_parts(data, len) }.to_vec())
    }

    fn write_bitmap_pixels(&self, bitmap: RawHandle, offset: usize, data: &[u8]) -> bool {
        let len = (self.bitmap_pitch(bitmap).max(0) * self.bitmap_height(bitmap).max(0)) as usize;
        if offset.checked_add(data.len()).is_none_or(|end| end > len) {
            self.set_last_error(ErrorCode::WrongSize);
            return false;
        }
        let base = unsafe { TLN_GetBitmapPtr(bitmap.as_ptr(), 0, 0) };
        if base.is_null() {
            return false;
        }
        // SAFETY: bounds checked against `pitch * height` above
        unsafe { ptr::copy_nonoverlapping(data.as_ptr(), base.add(offset), data.len()) };
        true
    }

    // ── palettes ──────────────────────────────────────────────────────────

    fn create_palette(&self, entries: i32) -> Option<RawHandle> {
        handle(unsafe { TLN_CreatePalette(entries) })
    }

    fn load_palette(&self, filename: &str) -> Option<RawHandle> {
        let file = c_string(filename)?;
        handle(unsafe { TLN_LoadPalette(file.as_ptr()) })
    }

    fn clone_palette(&self, palette: RawHandle) -> Option<RawHandle> {
        handle(unsafe { TLN_ClonePalette(palette.as_ptr()) })
    }

    fn delete_palette(&self, palette: RawHandle) -> bool {
        unsafe { TLN_DeletePalette(palette.as_ptr()) }
    }

    fn set_palette_color(&self, palette: RawHandle, index: i32, color: Color) -> bool {
        unsafe { TLN_SetPaletteColor(palette.as_ptr(), index, color.r, color.g, color.b) }
    }

    fn palette_color(&self, palette: RawHandle, index: i32) -> Option<Color> {
        let data = unsafe { TLN_GetPaletteData(palette.as_ptr(), index) };
        if data.is_null() {
            return None;
        }
        // SAFETY: each palette entry is 4 bytes, RGB in the first three
        let rgb = unsafe { std::slice::from_raw_parts(data, 3) };
        Some(Color::new(rgb[0], rgb[1], rgb[2]))
    }

    fn mix_palettes(&self, src1: RawHandle, src2: RawHandle, dst: RawHandle, factor: u8) -> bool {
        unsafe { TLN_MixPalettes(src1.as_ptr(), src2.as_ptr(), dst.as_ptr(), factor) }
    }

    fn add_palette_color(&self, palette: RawHandle, color: Color, start: u8, count: u8) -> bool {
        unsafe { TLN_AddPaletteColor(palette.as_ptr(), color.r, color.g, color.b, start, count) }
    }

    fn sub_palette_color(&self, palette: RawHandle, color: Color, start: u8, count: u8) -> bool {
        unsafe { TLN_SubPaletteColor(palette.as_ptr(), color.r, color.g, color.b, start, count) }
    }

    fn mod_palette_color(&self, palette: RawHandle, color: Color, start: u8, count: u8) -> bool {
        unsafe { TLN_ModPaletteColor(palette.as_ptr(), color.r, color.g, color.b, start, count) }
    }

    // ── tilesets ──────────────────────────────────────────────────────────

    fn create_tileset(&self, num_tiles: i32, width: i32, height: i32, palette: Option<RawHandle>) -> Option<RawHandle> {
        handle(unsafe { TLN_CreateTileset(num_tiles, width, height, raw(palette), ptr::null_mut(), ptr::null_mut()) })
    }

    fn load_tileset(&self, filename: &str) -> Option<RawHandle> {
        let file = c_string(filename)?;
        handle(unsafe { TLN_LoadTileset(file.as_ptr()) })
    }

    fn clone_tileset(&self, tileset: RawHandle) -> Option<RawHandle> {
        handle(unsafe { TLN_CloneTileset(tileset.as_ptr()) })
    }

    fn delete_tileset(&self, tileset: RawHandle) -> bool {
        unsafe { TLN_DeleteTileset(tileset.as_ptr()) }
    }

    fn set_tileset_pixels(&self, tileset: RawHandle, entry: i32, data: &[u8], pitch: i32) -> bool {
        let (w, h) = (self.tile_width(tileset), self.tile_height(tileset));
        if w <= 0 || h <= 0 || pitch < w || data.len() < (pitch * (h - 1) + w) as usize {
            self.set_last_error(ErrorCode::WrongSize);
            return false;
        }
        unsafe { TLN_SetTilesetPixels(tileset.as_ptr(), entry, data.as_ptr(), pitch) }
    }

    fn tile_width(&self, tileset: RawHandle) -> i32 {
        unsafe { TLN_GetTileWidth(tileset.as_ptr()) }
    }

    fn tile_height(&self, tileset: RawHandle) -> i32 {
        unsafe { TLN_GetTileHeight(tileset.as_ptr()) }
    }

    fn tileset_num_tiles(&self, tileset: RawHandle) -> i32 {
        unsafe { TLN_GetTilesetNumTiles(tileset.as_ptr()) }
    }

    fn tileset_palette(&self, tileset: RawHandle) -> Option<RawHandle> {
        handle(unsafe { TLN_GetTilesetPalette(tileset.as_ptr()) })
    }

    // ── tilemaps ──────────────────────────────────────────────────────────

    fn create_tilemap(&self, rows: i32, cols: i32, tiles: &[Tile], bg: Color, tileset: Option<RawHandle>) -> Option<RawHandle> {
        if !tiles.is_empty() && tiles.len() != (rows.max(0) * cols.max(0)) as usize {
            self.set_last_error(ErrorCode::WrongSize);
            return None;
        }
        let data = if tiles.is_empty() { ptr::null() } else { tiles.as_ptr() };
        handle(unsafe { TLN_CreateTilemap(rows, cols, data, bg.packed(), raw(tileset)) })
    }

    fn load_tilemap(&self, filename: &str, layer: Option<&str>) -> Option<RawHandle> {
        let file = c_string(filename)?;
        let layer = layer.and_then(c_string);
        handle(unsafe { TLN_LoadTilemap(file.as_ptr(), opt_ptr(&layer)) })
    }

    fn clone_tilemap(&self, tilemap: RawHandle) -> Option<RawHandle> {
        handle(unsafe { TLN_CloneTilemap(tilemap.as_ptr()) })
    }

    fn delete_tilemap(&self, tilemap: RawHandle) -> bool {
        unsafe { TLN_DeleteTilemap(tilemap.as_ptr()) }
    }

    fn tilemap_rows(&self, tilemap: RawHandle) -> i32 {
        unsafe { TLN_GetTilemapRows(tilemap.as_ptr()) }
    }

    fn tilemap_cols(&self, tilemap: RawHandle) -> i32 {
        unsafe { TLN_GetTilemapCols(tilemap.as_ptr()) }
    }

    fn tilemap_tileset(&self, tilemap: RawHandle, index: i32) -> Option<RawHandle> {
        handle(unsafe { TLN_GetTilemapTileset2(tilemap.as_ptr(), index) })
    }

    fn set_tilemap_tileset(&self, tilemap: RawHandle, tileset: RawHandle, index: i32) -> bool {
        unsafe { TLN_SetTilemapTileset2(tilemap.as_ptr(), tileset.as_ptr(), index) }
    }

    fn tilemap_tile(&self, tilemap: RawHandle, row: i32, col: i32) -> Option<Tile> {
        let mut tile = Tile::default();
        unsafe { TLN_GetTilemapTile(tilemap.as_ptr(), row, col, &mut tile) }.then_some(tile)
    }

    fn set_tilemap_tile(&self, tilemap: RawHandle, row: i32, col: i32, tile: Tile) -> bool {
        unsafe { TLN_SetTilemapTile(tilemap.as_ptr(), row, col, &tile) }
    }

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
    ) -> bool {
        unsafe { TLN_CopyTiles(src.as_ptr(), src_row, src_col, rows, cols, dst.as_ptr(), dst_row, dst_col) }
    }

    // ── sequences ─────────────────────────────────────────────────────────

    fn create_sequence(&self, name: &str, target: i32, frames: &[SequenceFrame]) -> Option<RawHandle> {
        let name = c_string(name)?;
        handle(unsafe { TLN_CreateSequence(name.as_ptr(), target, frames.len() as i32, frames.as_ptr()) })
    }

    fn create_cycle(&self, name: &str, strips: &[ColorStrip]) -> Option<RawHandle> {
        let name = c_string(name)?;
        handle(unsafe { TLN_CreateCycle(name.as_ptr(), strips.len() as i32, strips.as_ptr()) })
    }

    fn create_sprite_sequence(&self, name: &str, spriteset: RawHandle, basename: &str, delay: i32) -> Option<RawHandle> {
        let name = c_string(name)?;
        let base = c_string(basename)?;
        handle(unsafe { TLN_CreateSpriteSequence(name.as_ptr(), spriteset.as_ptr(), base.as_ptr(), delay) })
    }

    fn clone_sequence(&self, sequence: RawHandle) -> Option<RawHandle> {
        handle(unsafe { TLN_CloneSequence(sequence.as_ptr()) })
    }

    fn delete_sequence(&self, sequence: RawHandle) -> bool {
        unsafe { TLN_DeleteSequence(sequence.as_ptr()) }
    }

    fn sequence_info(&self, sequence: RawHandle) -> Option<SequenceInfo> {
        let mut info = RawSequenceInfo {
            name: [0; 32],
            num_frames: 0,
        };
        unsafe { TLN_GetSequenceInfo(sequence.as_ptr(), &mut info) }.then(|| SequenceInfo {
            name: read_name(&info.name),
            num_frames: info.num_frames,
        })
    }

    // ── spritesets ────────────────────────────────────────────────────────

    fn create_spriteset(&self, bitmap: RawHandle, data: &[SpriteData]) -> Option<RawHandle> {
        let entries: Vec<RawSpriteData> = data
            .iter()
            .map(|d| RawSpriteData {
                name: fixed_name(&d.name),
                x: d.x,
                y: d.y,
                w: d.w,
                h: d.h,
            })
            .collect();
        handle(unsafe { TLN_CreateSpriteset(bitmap.as_ptr(), entries.as_ptr(), entries.len() as i32) })
    }

    fn load_spriteset(&self, filename: &str) -> Option<RawHandle> {
        let file = c_string(filename)?;
        handle(unsafe { TLN_LoadSpriteset(file.as_ptr()) })
    }

    fn clone_spriteset(&self, spriteset: RawHandle) -> Option<RawHandle> {
        handle(unsafe { TLN_CloneSpriteset(spriteset.as_ptr()) })
    }

    fn delete_spriteset(&self, spriteset: RawHandle) -> bool {
        unsafe { TLN_DeleteSpriteset(spriteset.as_ptr()) }
    }

    fn spriteset_info(&self, spriteset: RawHandle, entry: i32) -> Option<SpriteInfo> {
        let mut info = SpriteInfo::default();
        unsafe { TLN_GetSpriteInfo(spriteset.as_ptr(), entry, &mut info) }.then_some(info)
    }

    fn spriteset_palette(&self, spriteset: RawHandle) -> Option<RawHandle> {
        handle(unsafe { TLN_GetSpritesetPalette(spriteset.as_ptr()) })
    }

    fn find_spriteset_sprite(&self, spriteset: RawHandle, name: &str) -> i32 {
        match c_string(name) {
            Some(n) => unsafe { TLN_FindSpritesetSprite(spriteset.as_ptr(), n.as_ptr()) },
            None => -1,
        }
    }

    // ── object lists ──────────────────────────────────────────────────────

    fn create_object_list(&self) -> Option<RawHandle> {
        handle(unsafe { TLN_CreateObjectList() })
    }

    fn add_tile_object(&self, list: RawHandle, id: u16, gid: u16, flags: TileFlags, x: i32, y: i32) -> bool {
        unsafe { TLN_AddTileObjectToList(list.as_ptr(), id, gid, flags.bits(), x, y) }
    }

    fn load_object_list(&self, filename: &str, layer: Option<&str>) -> Option<RawHandle> {
        let file = c_string(filename)?;
        let layer = layer.and_then(c_string);
        handle(unsafe { TLN_LoadObjectList(file.as_ptr(), opt_ptr(&layer)) })
    }

    fn clone_object_list(&self, list: RawHandle) -> Option<RawHandle> {
        handle(unsafe { TLN_CloneObjectList(list.as_ptr()) })
    }

    fn delete_object_list(&self, list: RawHandle) -> bool {
        unsafe { TLN_DeleteObjectList(list.as_ptr()) }
    }

    fn list_num_objects(&self, list: RawHandle) -> i32 {
        unsafe { TLN_GetListNumObjects(list.as_ptr()) }
    }
}
