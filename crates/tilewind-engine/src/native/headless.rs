use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::num::NonZeroUsize;
use std::time::Instant;

use super::types::{
    Blend, BlendFunction, Color, ColorStrip, Crt, CrtEffect, ErrorCode, Input, LayerType, LogLevel, PixelMap,
    Player, RawHandle, SequenceFrame, SequenceInfo, SpriteData, SpriteInfo, SpriteState, Tile, TileFlags,
    TileInfo, VideoCallback, WindowFlags,
};
use super::Native;

const VERSION: u32 = 0x020B00;
const GLOBAL_PALETTES: usize = 8;
const TILEMAP_TILESETS: usize = 8;

/// Headless backend configuration.
#[derive(Debug, Clone)]
pub struct HeadlessConfig {
    /// The window reports itself closed after this many successfully drawn frames.
    pub close_after_frames: Option<u64>,

    /// 1-based draw call numbers that fail with `draw_error`.
    pub failing_draws: Vec<u64>,

    /// Error code raised by a failing draw.
    pub draw_error: ErrorCode,

    /// When set, `load_*` calls synthesize placeholder resources instead of
    /// failing with `FileNotFound`. No files are read either way.
    pub placeholder_assets: bool,
}

impl Default for HeadlessConfig {
    fn default() -> Self {
        Self {
            close_after_frames: None,
            failing_draws: Vec::new(),
            draw_error: ErrorCode::Unsupported,
            placeholder_assets: true,
        }
    }
}

/// Call counters recorded by the headless backend.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct HeadlessStats {
    pub draw_calls: u64,
    pub frames_drawn: u64,
    pub process_calls: u64,
    pub wait_redraw_calls: u64,
    pub context_switches: u64,
    pub contexts_created: u32,
    pub contexts_deleted: u32,
    pub windows_created: u32,
    pub windows_deleted: u32,
}

/// In-memory implementation of [`Native`].
///
/// Keeps the bookkeeping the native library would (contexts, resources,
/// layer/sprite slots, window state, last error) without rasterizing.
/// Rendering into a buffer fills it with the background color.
pub struct Headless {
    config: HeadlessConfig,
    started: Instant,
    state: RefCell<State>,
}

#[derive(Default)]
struct State {
    next_id: usize,
    objects: HashMap<usize, Object>,
    contexts: HashMap<usize, Context>,
    current: Option<usize>,
    last_error: ErrorCode,
    window: Option<WindowState>,
    pressed: HashSet<i32>,
    load_path: Option<String>,
    resource_pack: Option<String>,
    delayed_ms: u32,
    stats: HeadlessStats,
}

struct WindowState {
    threaded: bool,
    closed: bool,
    frames: u64,
    title: String,
    scale: i32,
    crt: Option<(Crt, bool)>,
    crt_effect: Option<CrtEffect>,
    blur: bool,
    disabled_players: HashSet<Player>,
}

#[allow(dead_code)]
struct Context {
    width: i32,
    height: i32,
    target_fps: i32,
    frame: i32,
    bg_color: Option<Color>,
    bg_bitmap: Option<usize>,
    bg_palette: Option<usize>,
    global_palettes: [Option<usize>; GLOBAL_PALETTES],
    raster_callback: Option<VideoCallback>,
    frame_callback: Option<VideoCallback>,
    blend_function: Option<BlendFunction>,
    log_level: LogLevel,
    layers: Vec<LayerState>,
    sprites: Vec<SpriteSlot>,
    animations: Vec<AnimationState>,
    first_sprite: Option<i32>,
    mask_region: Option<(i32, i32)>,
}

#[derive(Default, Clone)]
#[allow(dead_code)]
struct LayerState {
    tilemap: Option<usize>,
    bitmap: Option<usize>,
    palette: Option<usize>,
    objects: Option<(usize, Option<usize>)>,
    x: i32,
    y: i32,
    scaling: Option<(f32, f32)>,
    transform: Option<[f32; 5]>,
    blend: (Blend, u8),
    clip: Option<[i32; 4]>,
    window: Option<([i32; 4], bool)>,
    window_color: Option<(Color, Blend)>,
    column_offset: Option<Vec<i32>>,
    pixel_map: Option<Vec<PixelMap>>,
    mosaic: Option<(i32, i32)>,
    priority: bool,
    parent: Option<i32>,
    enabled: bool,
}

#[derive(Default, Clone)]
#[allow(dead_code)]
struct SpriteSlot {
    spriteset: Option<usize>,
    flags: TileFlags,
    pivot: (f32, f32),
    x: i32,
    y: i32,
    picture: i32,
    palette: Option<usize>,
    blend: (Blend, u8),
    scaling: Option<(f32, f32)>,
    collision: bool,
    enabled: bool,
    animation: Option<(usize, i32)>,
    paused: bool,
    masking: bool,
    next: Option<i32>,
}

#[derive(Default, Clone)]
#[allow(dead_code)]
struct AnimationState {
    palette: Option<usize>,
    sequence: Option<usize>,
    source: Option<usize>,
    blend: bool,
}

enum Object {
    Bitmap(BitmapData),
    Palette(Vec<Color>),
    Tileset(TilesetData),
    Tilemap(TilemapData),
    Sequence(SequenceInfo),
    Spriteset(SpritesetData),
    ObjectList(Vec<TileObject>),
}

#[derive(Clone)]
struct BitmapData {
    width: i32,
    height: i32,
    depth: i32,
    pitch: i32,
    pixels: Vec<u8>,
    palette: Option<usize>,
}

#[derive(Clone)]
struct TilesetData {
    tile_width: i32,
    tile_height: i32,
    tiles: Vec<Vec<u8>>,
    palette: Option<usize>,
}

#[derive(Clone)]
struct TilemapData {
    rows: i32,
    cols: i32,
    tiles: Vec<Tile>,
    bg: Color,
    tilesets: [Option<usize>; TILEMAP_TILESETS],
}

#[derive(Clone)]
struct SpritesetData {
    bitmap: usize,
    entries: Vec<SpriteData>,
}

#[derive(Clone, Copy)]
#[allow(dead_code)]
struct TileObject {
    id: u16,
    gid: u16,
    flags: TileFlags,
    x: i32,
    y: i32,
}

fn handle(id: usize) -> RawHandle {
    // ids start at 1
    RawHandle::from_id(NonZeroUsize::new(id).unwrap_or(NonZeroUsize::MIN))
}

fn bitmap_pitch(width: i32, depth: i32) -> i32 {
    ((width * depth / 8) + 3) & !3
}

impl Headless {
    pub fn new(config: HeadlessConfig) -> Self {
        Self {
            config,
            started: Instant::now(),
            state: RefCell::new(State {
                next_id: 1,
                ..State::default()
            }),
        }
    }

    /// Snapshot of the call counters.
    pub fn stats(&self) -> HeadlessStats {
        self.state.borrow().stats
    }

    /// Simulates the user closing the window.
    pub fn close_window(&self) {
        if let Some(w) = self.state.borrow_mut().window.as_mut() {
            w.closed = true;
        }
    }

    /// Simulates an input being held (or released).
    pub fn set_input(&self, player: Player, input: Input, pressed: bool) {
        let mut st = self.state.borrow_mut();
        let code = input.encode(player);
        if pressed {
            st.pressed.insert(code);
        } else {
            st.pressed.remove(&code);
        }
    }

    /// Title last set on the window, if one is open.
    pub fn window_title(&self) -> Option<String> {
        self.state.borrow().window.as_ref().map(|w| w.title.clone())
    }

    pub fn load_path(&self) -> Option<String> {
        self.state.borrow().load_path.clone()
    }

    pub fn live_contexts(&self) -> usize {
        self.state.borrow().contexts.len()
    }

    /// Whether the open window was created with its own thread.
    pub fn window_threaded(&self) -> Option<bool> {
        self.state.borrow().window.as_ref().map(|w| w.threaded)
    }

    pub fn crt_effect(&self) -> Option<(Crt, bool)> {
        self.state.borrow().window.as_ref().and_then(|w| w.crt)
    }

    /// Effect installed through `enable_crt_effect`, if any.
    pub fn custom_crt_effect(&self) -> Option<CrtEffect> {
        self.state.borrow().window.as_ref().and_then(|w| w.crt_effect)
    }

    pub fn blur_enabled(&self) -> bool {
        self.state.borrow().window.as_ref().is_some_and(|w| w.blur)
    }

    /// Window rectangle `[x1, y1, x2, y2]` and invert flag of a layer.
    pub fn layer_window(&self, layer: i32) -> Option<([i32; 4], bool)> {
        self.state.borrow().layer_ref(layer).and_then(|l| l.window)
    }

    pub fn layer_window_color(&self, layer: i32) -> Option<(Color, Blend)> {
        self.state.borrow().layer_ref(layer).and_then(|l| l.window_color)
    }

    pub fn layer_column_offset(&self, layer: i32) -> Option<Vec<i32>> {
        self.state.borrow().layer_ref(layer).and_then(|l| l.column_offset.clone())
    }

    /// Entries of the installed pixel-mapping table.
    pub fn layer_pixel_mapping_len(&self, layer: i32) -> Option<usize> {
        self.state.borrow().layer_ref(layer).and_then(|l| l.pixel_map.as_ref().map(Vec::len))
    }

    /// Sprite indices in draw order, following the chain from the first sprite.
    pub fn sprite_chain(&self) -> Vec<i32> {
        let st = self.state.borrow();
        let Some(ctx) = st.ctx_ref() else {
            return Vec::new();
        };
        let mut chain = Vec::new();
        let mut cur = ctx.first_sprite;
        while let Some(i) = cur {
            if chain.contains(&i) {
                break;
            }
            chain.push(i);
            cur = usize::try_from(i).ok().and_then(|i| ctx.sprites.get(i)).and_then(|s| s.next);
        }
        chain
    }

    pub fn sprite_masking(&self, sprite: i32) -> bool {
        let st = self.state.borrow();
        st.ctx_ref()
            .and_then(|c| usize::try_from(sprite).ok().and_then(|i| c.sprites.get(i)))
            .is_some_and(|s| s.masking)
    }

    pub fn mask_region(&self) -> Option<(i32, i32)> {
        self.state.borrow().ctx_ref().and_then(|c| c.mask_region)
    }

    /// Background color of the current context (`None` when disabled).
    pub fn bg_color(&self) -> Option<Color> {
        let st = self.state.borrow();
        st.current.and_then(|c| st.contexts.get(&c)).and_then(|c| c.bg_color)
    }
}

impl Default for Headless {
    fn default() -> Self {
        Self::new(HeadlessConfig::default())
    }
}

// ── state helpers ─────────────────────────────────────────────────────────

impl State {
    fn fail<T>(&mut self, code: ErrorCode) -> Option<T> {
        self.last_error = code;
        None
    }

    fn ok(&mut self) -> bool {
        self.last_error = ErrorCode::Ok;
        true
    }

    fn flag(&mut self, r: Option<()>) -> bool {
        r.is_some()
    }

    fn insert(&mut self, obj: Object) -> RawHandle {
        let id = self.next_id;
        self.next_id += 1;
        self.objects.insert(id, obj);
        self.last_error = ErrorCode::Ok;
        handle(id)
    }

    fn ctx(&mut self) -> Option<&mut Context> {
        let Some(cur) = self.current else {
            self.last_error = ErrorCode::NullPointer;
            return None;
        };
        self.contexts.get_mut(&cur)
    }

    fn ctx_ref(&self) -> Option<&Context> {
        self.current.and_then(|c| self.contexts.get(&c))
    }

    fn layer_ref(&self, index: i32) -> Option<&LayerState> {
        let index = usize::try_from(index).ok()?;
        self.ctx_ref().and_then(|c| c.layers.get(index))
    }

    fn layer(&mut self, index: i32) -> Option<&mut LayerState> {
        let ok = self
            .ctx_ref()
            .is_some_and(|c| index >= 0 && (index as usize) < c.layers.len());
        if !ok {
            return self.fail(ErrorCode::IdxLayer);
        }
        self.last_error = ErrorCode::Ok;
        self.ctx().and_then(|c| c.layers.get_mut(index as usize))
    }

    fn sprite(&mut self, index: i32) -> Option<&mut SpriteSlot> {
        let ok = self
            .ctx_ref()
            .is_some_and(|c| index >= 0 && (index as usize) < c.sprites.len());
        if !ok {
            return self.fail(ErrorCode::IdxSprite);
        }
        self.last_error = ErrorCode::Ok;
        self.ctx().and_then(|c| c.sprites.get_mut(index as usize))
    }

    fn animation(&mut self, index: i32) -> Option<&mut AnimationState> {
        let ok = self
            .ctx_ref()
            .is_some_and(|c| index >= 0 && (index as usize) < c.animations.len());
        if !ok {
            return self.fail(ErrorCode::IdxAnimation);
        }
        self.last_error = ErrorCode::Ok;
        self.ctx().and_then(|c| c.animations.get_mut(index as usize))
    }

    fn check(&mut self, h: RawHandle, want: fn(&Object) -> bool, code: ErrorCode) -> Option<usize> {
        let id = h.addr();
        match self.objects.get(&id) {
            Some(o) if want(o) => Some(id),
            _ => self.fail(code),
        }
    }

    fn bitmap(&mut self, h: RawHandle) -> Option<&mut BitmapData> {
        let id = self.check(h, |o| matches!(o, Object::Bitmap(_)), ErrorCode::RefBitmap)?;
        match self.objects.get_mut(&id) {
            Some(Object::Bitmap(b)) => Some(b),
            _ => None,
        }
    }

    fn palette(&mut self, h: RawHandle) -> Option<&mut Vec<Color>> {
        let id = self.check(h, |o| matches!(o, Object::Palette(_)), ErrorCode::RefPalette)?;
        match self.objects.get_mut(&id) {
            Some(Object::Palette(p)) => Some(p),
            _ => None,
        }
    }

    fn tileset(&mut self, h: RawHandle) -> Option<&mut TilesetData> {
        let id = self.check(h, |o| matches!(o, Object::Tileset(_)), ErrorCode::RefTileset)?;
        match self.objects.get_mut(&id) {
            Some(Object::Tileset(t)) => Some(t),
            _ => None,
        }
    }

    fn tilemap(&mut self, h: RawHandle) -> Option<&mut TilemapData> {
        let id = self.check(h, |o| matches!(o, Object::Tilemap(_)), ErrorCode::RefTilemap)?;
        match self.objects.get_mut(&id) {
            Some(Object::Tilemap(t)) => Some(t),
            _ => None,
        }
    }

    fn sequence(&mut self, h: RawHandle) -> Option<&mut SequenceInfo> {
        let id = self.check(h, |o| matches!(o, Object::Sequence(_)), ErrorCode::RefSequence)?;
        match self.objects.get_mut(&id) {
            Some(Object::Sequence(s)) => Some(s),
            _ => None,
        }
    }

    fn spriteset(&mut self, h: RawHandle) -> Option<&mut SpritesetData> {
        let id = self.check(h, |o| matches!(o, Object::Spriteset(_)), ErrorCode::RefSpriteset)?;
        match self.objects.get_mut(&id) {
            Some(Object::Spriteset(s)) => Some(s),
            _ => None,
        }
    }

    fn object_list(&mut self, h: RawHandle) -> Option<&mut Vec<TileObject>> {
        let id = self.check(h, |o| matches!(o, Object::ObjectList(_)), ErrorCode::RefList)?;
        match self.objects.get_mut(&id) {
            Some(Object::ObjectList(l)) => Some(l),
            _ => None,
        }
    }

    fn delete(&mut self, h: RawHandle, want: fn(&Object) -> bool, code: ErrorCode) -> bool {
        match self.check(h, want, code) {
            Some(id) => {
                self.objects.remove(&id);
                self.ok()
            }
            None => false,
        }
    }

    fn clone_object(&mut self, h: RawHandle, want: fn(&Object) -> bool, code: ErrorCode) -> Option<RawHandle> {
        let id = self.check(h, want, code)?;
        let copy = match self.objects.get(&id)? {
            Object::Bitmap(b) => Object::Bitmap(b.clone()),
            Object::Palette(p) => Object::Palette(p.clone()),
            Object::Tileset(t) => Object::Tileset(t.clone()),
            Object::Tilemap(t) => Object::Tilemap(t.clone()),
            Object::Sequence(s) => Object::Sequence(s.clone()),
            Object::Spriteset(s) => Object::Spriteset(s.clone()),
            Object::ObjectList(l) => Object::ObjectList(l.clone()),
        };
        Some(self.insert(copy))
    }

    fn new_palette(&mut self, entries: i32) -> Option<RawHandle> {
        if !(1..=256).contains(&entries) {
            return self.fail(ErrorCode::WrongSize);
        }
        Some(self.insert(Object::Palette(vec![Color::BLACK; entries as usize])))
    }

    fn new_bitmap(&mut self, width: i32, height: i32, depth: i32) -> Option<RawHandle> {
        if width <= 0 || height <= 0 || !matches!(depth, 8 | 16 | 24 | 32) {
            return self.fail(ErrorCode::WrongSize);
        }
        let palette = if depth == 8 {
            self.new_palette(256).map(|h| h.addr())
        } else {
            None
        };
        let pitch = bitmap_pitch(width, depth);
        Some(self.insert(Object::Bitmap(BitmapData {
            width,
            height,
            depth,
            pitch,
            pixels: vec![0; (pitch * height) as usize],
            palette,
        })))
    }

    fn new_tileset(&mut self, num_tiles: i32, tw: i32, th: i32, palette: Option<usize>) -> Option<RawHandle> {
        if num_tiles <= 0 || tw <= 0 || th <= 0 {
            return self.fail(ErrorCode::WrongSize);
        }
        let palette = palette.or_else(|| self.new_palette(256).map(|h| h.addr()));
        Some(self.insert(Object::Tileset(TilesetData {
            tile_width: tw,
            tile_height: th,
            tiles: vec![vec![0; (tw * th) as usize]; num_tiles as usize],
            palette,
        })))
    }

    fn tileset_of(&self, tilemap: usize, index: usize) -> Option<usize> {
        match self.objects.get(&tilemap) {
            Some(Object::Tilemap(t)) => t.tilesets.get(index).copied().flatten(),
            _ => None,
        }
    }

    fn layer_size(&self, layer: &LayerState) -> (i32, i32) {
        if let Some(tm) = layer.tilemap {
            let tileset = self.tileset_of(tm, 0);
            let (tw, th) = match tileset.and_then(|t| self.objects.get(&t)) {
                Some(Object::Tileset(t)) => (t.tile_width, t.tile_height),
                _ => (0, 0),
            };
            if let Some(Object::Tilemap(t)) = self.objects.get(&tm) {
                return (t.cols * tw, t.rows * th);
            }
        }
        if let Some(Object::Bitmap(b)) = layer.bitmap.and_then(|b| self.objects.get(&b)) {
            return (b.width, b.height);
        }
        (0, 0)
    }

    /// Tile of `tilemap` under layer-space pixel `(x, y)`; the map repeats.
    fn tile_at(&self, tilemap: usize, x: i32, y: i32) -> Result<TileInfo, ErrorCode> {
        let (tw, th, tiles) = match self.tileset_of(tilemap, 0).and_then(|t| self.objects.get(&t)) {
            Some(Object::Tileset(t)) if t.tile_width > 0 && t.tile_height > 0 => {
                (t.tile_width, t.tile_height, &t.tiles)
            }
            _ => return Err(ErrorCode::RefTileset),
        };
        let Some(Object::Tilemap(map)) = self.objects.get(&tilemap) else {
            return Err(ErrorCode::RefTilemap);
        };
        if map.cols <= 0 || map.rows <= 0 {
            return Err(ErrorCode::WrongSize);
        }

        let x = i64::from(x).rem_euclid(i64::from(map.cols) * i64::from(tw)) as i32;
        let y = i64::from(y).rem_euclid(i64::from(map.rows) * i64::from(th)) as i32;
        let (row, col) = (y / th, x / tw);
        let (xoffset, yoffset) = (x % tw, y % th);
        let tile = map.tiles.get((row * map.cols + col) as usize).copied().unwrap_or_default();
        let index = tile.index();
        // tile 0 is the empty tile
        let color = match index {
            0 => 0,
            i => tiles
                .get(i as usize)
                .and_then(|px| px.get((yoffset * tw + xoffset) as usize))
                .copied()
                .unwrap_or(0),
        };
        Ok(TileInfo {
            index,
            flags: tile.flags(),
            row,
            col,
            xoffset,
            yoffset,
            color,
            kind: 0,
            empty: index == 0,
        })
    }

    fn palette_op(&mut self, h: RawHandle, start: u8, count: u8, f: impl Fn(Color) -> Color) -> bool {
        let Some(p) = self.palette(h) else {
            return false;
        };
        let start = start as usize;
        let end = (start + count as usize).min(p.len());
        for c in p.iter_mut().take(end).skip(start) {
            *c = f(*c);
        }
        self.ok()
    }
}

// ── Native ────────────────────────────────────────────────────────────────

impl Native for Headless {
    fn init(&self, hres: i32, vres: i32, layers: i32, sprites: i32, animations: i32) -> Option<RawHandle> {
        let mut st = self.state.borrow_mut();
        if hres <= 0 || vres <= 0 || layers < 0 || sprites < 0 || animations < 0 {
            return st.fail(ErrorCode::WrongSize);
        }
        let id = st.next_id;
        st.next_id += 1;
        st.contexts.insert(
            id,
            Context {
                width: hres,
                height: vres,
                target_fps: 60,
                frame: 0,
                bg_color: None,
                bg_bitmap: None,
                bg_palette: None,
                global_palettes: [None; GLOBAL_PALETTES],
                raster_callback: None,
                frame_callback: None,
                blend_function: None,
                log_level: LogLevel::default(),
                layers: vec![
                    LayerState {
                        enabled: true,
                        ..LayerState::default()
                    };
                    layers as usize
                ],
                sprites: vec![SpriteSlot::default(); sprites as usize],
                animations: vec![AnimationState::default(); animations as usize],
                first_sprite: None,
                mask_region: None,
            },
        );
        // the newest context becomes current, as in the native library
        st.current = Some(id);
        st.stats.contexts_created += 1;
        st.ok();
        Some(handle(id))
    }

    fn set_context(&self, context: RawHandle) -> bool {
        let mut st = self.state.borrow_mut();
        if !st.contexts.contains_key(&context.addr()) {
            st.last_error = ErrorCode::NullPointer;
            return false;
        }
        st.current = Some(context.addr());
        st.stats.context_switches += 1;
        st.ok()
    }

    fn context(&self) -> Option<RawHandle> {
        self.state.borrow().current.map(handle)
    }

    fn delete_context(&self, context: RawHandle) -> bool {
        let mut st = self.state.borrow_mut();
        if st.contexts.remove(&context.addr()).is_none() {
            st.last_error = ErrorCode::NullPointer;
            return false;
        }
        if st.current == Some(context.addr()) {
            st.current = None;
        }
        st.stats.contexts_deleted += 1;
        st.ok()
    }

    fn deinit(&self) {
        let mut st = self.state.borrow_mut();
        if let Some(cur) = st.current.take() {
            st.contexts.remove(&cur);
            st.stats.contexts_deleted += 1;
        }
    }

    fn version(&self) -> u32 {
        VERSION
    }

    fn width(&self) -> i32 {
        self.state.borrow().ctx_ref().map_or(0, |c| c.width)
    }

    fn height(&self) -> i32 {
        self.state.borrow().ctx_ref().map_or(0, |c| c.height)
    }

    fn num_objects(&self) -> u32 {
        self.state.borrow().objects.len() as u32
    }

    fn used_memory(&self) -> u32 {
        let st = self.state.borrow();
        st.objects
            .values()
            .map(|o| match o {
                Object::Bitmap(b) => b.pixels.len(),
                Object::Palette(p) => p.len() * 4,
                Object::Tileset(t) => t.tiles.iter().map(Vec::len).sum(),
                Object::Tilemap(t) => t.tiles.len() * 4,
                Object::Sequence(_) => 64,
                Object::Spriteset(s) => s.entries.len() * 80,
                Object::ObjectList(l) => l.len() * 16,
            })
            .sum::<usize>() as u32
    }

    fn num_layers(&self) -> i32 {
        self.state.borrow().ctx_ref().map_or(0, |c| c.layers.len() as i32)
    }

    fn num_sprites(&self) -> i32 {
        self.state.borrow().ctx_ref().map_or(0, |c| c.sprites.len() as i32)
    }

    fn target_fps(&self) -> i32 {
        self.state.borrow().ctx_ref().map_or(0, |c| c.target_fps)
    }

    fn set_target_fps(&self, fps: i32) {
        if let Some(c) = self.state.borrow_mut().ctx() {
            c.target_fps = fps;
        }
    }

    fn set_bg_color(&self, r: u8, g: u8, b: u8) {
        if let Some(c) = self.state.borrow_mut().ctx() {
            c.bg_color = Some(Color::new(r, g, b));
        }
    }

    fn set_bg_color_from_tilemap(&self, tilemap: RawHandle) -> bool {
        let mut st = self.state.borrow_mut();
        let Some(bg) = st.tilemap(tilemap).map(|t| t.bg) else {
            return false;
        };
        match st.ctx() {
            Some(c) => {
                c.bg_color = Some(bg);
                st.ok()
            }
            None => false,
        }
    }

    fn disable_bg_color(&self) {
        if let Some(c) = self.state.borrow_mut().ctx() {
            c.bg_color = None;
        }
    }

    fn set_bg_bitmap(&self, bitmap: Option<RawHandle>) -> bool {
        let mut st = self.state.borrow_mut();
        let id = match bitmap {
            Some(b) => {
                if st.bitmap(b).is_none() {
                    return false;
                }
                Some(b.addr())
            }
            None => None,
        };
        match st.ctx() {
            Some(c) => {
                c.bg_bitmap = id;
                st.ok()
            }
            None => false,
        }
    }

    fn set_bg_palette(&self, palette: RawHandle) -> bool {
        let mut st = self.state.borrow_mut();
        if st.palette(palette).is_none() {
            return false;
        }
        match st.ctx() {
            Some(c) => {
                c.bg_palette = Some(palette.addr());
                st.ok()
            }
            None => false,
        }
    }

    fn set_global_palette(&self, index: i32, palette: RawHandle) -> bool {
        let mut st = self.state.borrow_mut();
        if !(0..GLOBAL_PALETTES as i32).contains(&index) {
            st.last_error = ErrorCode::IdxPicture;
            return false;
        }
        if st.palette(palette).is_none() {
            return false;
        }
        match st.ctx() {
            Some(c) => {
                c.global_palettes[index as usize] = Some(palette.addr());
                st.ok()
            }
            None => false,
        }
    }

    fn global_palette(&self, index: i32) -> Option<RawHandle> {
        let st = self.state.borrow();
        let c = st.ctx_ref()?;
        c.global_palettes
            .get(usize::try_from(index).ok()?)
            .copied()
            .flatten()
            .map(handle)
    }

    fn set_raster_callback(&self, callback: Option<VideoCallback>) {
        if let Some(c) = self.state.borrow_mut().ctx() {
            c.raster_callback = callback;
        }
    }

    fn set_frame_callback(&self, callback: Option<VideoCallback>) {
        if let Some(c) = self.state.borrow_mut().ctx() {
            c.frame_callback = callback;
        }
    }

    fn set_custom_blend_function(&self, function: Option<BlendFunction>) {
        if let Some(c) = self.state.borrow_mut().ctx() {
            c.blend_function = function;
        }
    }

    fn set_log_level(&self, level: LogLevel) {
        if let Some(c) = self.state.borrow_mut().ctx() {
            c.log_level = level;
        }
    }

    fn set_load_path(&self, path: Option<&str>) {
        self.state.borrow_mut().load_path = path.map(str::to_string);
    }

    fn open_resource_pack(&self, filename: &str, _key: Option<&str>) -> bool {
        let mut st = self.state.borrow_mut();
        if !self.config.placeholder_assets {
            st.last_error = ErrorCode::FileNotFound;
            return false;
        }
        st.resource_pack = Some(filename.to_string());
        st.ok()
    }

    fn close_resource_pack(&self) {
        self.state.borrow_mut().resource_pack = None;
    }

    fn render_frame_to(&self, target: &mut [u8], pitch: i32, frame: i32) {
        let (fill, width, height, frame_cb, raster_cb) = {
            let mut st = self.state.borrow_mut();
            let Some(c) = st.ctx() else {
                return;
            };
            c.frame = if frame == 0 { c.frame + 1 } else { frame };
            let fill = c.bg_color.unwrap_or(Color::BLACK).packed();
            (fill, c.width, c.height, c.frame_callback, c.raster_callback)
        };

        if let Some(cb) = frame_cb {
            cb(frame);
        }

        let row_bytes = (width as usize) * 4;
        let pitch = pitch.max(0) as usize;
        for line in 0..height {
            if let Some(cb) = raster_cb {
                cb(line);
            }
            let start = line as usize * pitch;
            let Some(row) = target.get_mut(start..start + row_bytes.min(pitch)) else {
                break;
            };
            for px in row.chunks_exact_mut(4) {
                px.copy_from_slice(&fill.to_le_bytes());
            }
        }
    }

    fn update_frame(&self, frame: i32) {
        if let Some(c) = self.state.borrow_mut().ctx() {
            c.frame = if frame == 0 { c.frame + 1 } else { frame };
        }
    }

    fn last_error(&self) -> ErrorCode {
        self.state.borrow().last_error
    }

    fn set_last_error(&self, code: ErrorCode) {
        self.state.borrow_mut().last_error = code;
    }

    fn error_string(&self, code: ErrorCode) -> String {
        code.to_string()
    }

    // ── window ────────────────────────────────────────────────────────────

    fn create_window(&self, _overlay: Option<&str>, flags: WindowFlags) -> bool {
        let mut st = self.state.borrow_mut();
        st.window = Some(WindowState::new(false, flags));
        st.stats.windows_created += 1;
        st.ok()
    }

    fn create_window_thread(&self, _overlay: Option<&str>, flags: WindowFlags) -> bool {
        let mut st = self.state.borrow_mut();
        st.window = Some(WindowState::new(true, flags));
        st.stats.windows_created += 1;
        st.ok()
    }

    fn set_window_title(&self, title: &str) {
        if let Some(w) = self.state.borrow_mut().window.as_mut() {
            w.title = title.to_string();
        }
    }

    fn process_window(&self) -> bool {
        let mut st = self.state.borrow_mut();
        st.stats.process_calls += 1;
        let quit = st.pressed.contains(&Input::Quit.encode(Player::P1));
        match st.window.as_mut() {
            Some(w) => {
                if quit {
                    w.closed = true;
                }
                !w.closed
            }
            None => false,
        }
    }

    fn is_window_active(&self) -> bool {
        self.state.borrow().window.as_ref().is_some_and(|w| !w.closed)
    }

    fn input(&self, player: Player, input: Input) -> bool {
        let st = self.state.borrow();
        let enabled = st
            .window
            .as_ref()
            .is_some_and(|w| !w.disabled_players.contains(&player));
        enabled && st.pressed.contains(&input.encode(player))
    }

    fn enable_input(&self, player: Player, enable: bool) {
        if let Some(w) = self.state.borrow_mut().window.as_mut() {
            if enable {
                w.disabled_players.remove(&player);
            } else {
                w.disabled_players.insert(player);
            }
        }
    }

    fn assign_input_joystick(&self, _player: Player, _index: i32) {}

    fn define_input_key(&self, _player: Player, _input: Input, _keycode: u32) {}

    fn define_input_button(&self, _player: Player, _input: Input, _button: u8) {}

    fn draw_frame(&self, frame: i32) {
        let mut st = self.state.borrow_mut();
        st.stats.draw_calls += 1;
        let call = st.stats.draw_calls;

        if self.config.failing_draws.contains(&call) {
            st.last_error = self.config.draw_error;
            return;
        }
        if st.window.is_none() {
            st.last_error = ErrorCode::NullPointer;
            return;
        }
        let Some(c) = st.ctx() else {
            return;
        };
        c.frame = if frame == 0 { c.frame + 1 } else { frame };
        let frame_cb = c.frame_callback;
        let frame_no = c.frame;

        st.stats.frames_drawn += 1;
        let close_after = self.config.close_after_frames;
        if let Some(w) = st.window.as_mut() {
            w.frames += 1;
            if close_after.is_some_and(|n| w.frames >= n) {
                w.closed = true;
            }
        }
        drop(st);

        if let Some(cb) = frame_cb {
            cb(frame_no);
        }
    }

    fn wait_redraw(&self) {
        self.state.borrow_mut().stats.wait_redraw_calls += 1;
    }

    fn delete_window(&self) {
        let mut st = self.state.borrow_mut();
        st.window = None;
        st.stats.windows_deleted += 1;
    }

    fn config_crt_effect(&self, kind: Crt, blur: bool) {
        if let Some(w) = self.state.borrow_mut().window.as_mut() {
            w.crt = Some((kind, blur));
            w.crt_effect = None;
        }
    }

    fn enable_crt_effect(&self, effect: &CrtEffect) {
        if let Some(w) = self.state.borrow_mut().window.as_mut() {
            w.crt_effect = Some(*effect);
            w.crt = None;
        }
    }

    fn disable_crt_effect(&self) {
        if let Some(w) = self.state.borrow_mut().window.as_mut() {
            w.crt = None;
            w.crt_effect = None;
        }
    }

    fn enable_blur(&self, enable: bool) {
        if let Some(w) = self.state.borrow_mut().window.as_mut() {
            w.blur = enable;
        }
    }

    fn delay(&self, msecs: u32) {
        let mut st = self.state.borrow_mut();
        st.delayed_ms = st.delayed_ms.saturating_add(msecs);
    }

    fn ticks(&self) -> u32 {
        let real = self.started.elapsed().as_millis().min(u32::MAX as u128) as u32;
        real.saturating_add(self.state.borrow().delayed_ms)
    }

    fn average_fps(&self) -> u32 {
        self.target_fps().max(0) as u32
    }

    fn window_width(&self) -> i32 {
        let scale = self.window_scale_factor();
        self.width() * scale
    }

    fn window_height(&self) -> i32 {
        let scale = self.window_scale_factor();
        self.height() * scale
    }

    fn window_scale_factor(&self) -> i32 {
        self.state.borrow().window.as_ref().map_or(0, |w| w.scale)
    }

    fn set_window_scale_factor(&self, factor: i32) {
        if let Some(w) = self.state.borrow_mut().window.as_mut() {
            w.scale = factor.clamp(1, 5);
        }
    }

    // ── layers ────────────────────────────────────────────────────────────

    fn set_layer_tilemap(&self, layer: i32, tilemap: RawHandle) -> bool {
        let mut st = self.state.borrow_mut();
        if st.tilemap(tilemap).is_none() {
            return false;
        }
        let r = st.layer(layer).map(|l| {
            l.tilemap = Some(tilemap.addr());
            l.bitmap = None;
            l.objects = None;
        });
        st.flag(r)
    }

    fn set_layer_bitmap(&self, layer: i32, bitmap: RawHandle) -> bool {
        let mut st = self.state.borrow_mut();
        if st.bitmap(bitmap).is_none() {
            return false;
        }
        let r = st.layer(layer).map(|l| {
            l.bitmap = Some(bitmap.addr());
            l.tilemap = None;
            l.objects = None;
        });
        st.flag(r)
    }

    fn set_layer_palette(&self, layer: i32, palette: RawHandle) -> bool {
        let mut st = self.state.borrow_mut();
        if st.palette(palette).is_none() {
            return false;
        }
        let r = st.layer(layer).map(|l| l.palette = Some(palette.addr()));
        st.flag(r)
    }

    fn layer_tilemap(&self, layer: i32) -> Option<RawHandle> {
        self.state.borrow_mut().layer(layer)?.tilemap.map(handle)
    }

    fn layer_bitmap(&self, layer: i32) -> Option<RawHandle> {
        self.state.borrow_mut().layer(layer)?.bitmap.map(handle)
    }

    fn layer_palette(&self, layer: i32) -> Option<RawHandle> {
        let mut st = self.state.borrow_mut();
        let (palette, bitmap) = {
            let l = st.layer(layer)?;
            (l.palette, l.bitmap)
        };
        palette
            .or_else(|| match bitmap.and_then(|b| st.objects.get(&b)) {
                Some(Object::Bitmap(b)) => b.palette,
                _ => None,
            })
            .map(handle)
    }

    fn layer_tileset(&self, layer: i32) -> Option<RawHandle> {
        let mut st = self.state.borrow_mut();
        let (tilemap, objects) = {
            let l = st.layer(layer)?;
            (l.tilemap, l.objects)
        };
        match (tilemap, objects) {
            (Some(tm), _) => st.tileset_of(tm, 0).map(handle),
            (None, Some((_, ts))) => ts.map(handle),
            _ => None,
        }
    }

    fn set_layer_position(&self, layer: i32, x: i32, y: i32) -> bool {
        let mut st = self.state.borrow_mut();
        let r = st.layer(layer).map(|l| {
            l.x = x;
            l.y = y;
        });
        st.flag(r)
    }

    fn layer_x(&self, layer: i32) -> i32 {
        self.state.borrow_mut().layer(layer).map_or(0, |l| l.x)
    }

    fn layer_y(&self, layer: i32) -> i32 {
        self.state.borrow_mut().layer(layer).map_or(0, |l| l.y)
    }

    fn set_layer_scaling(&self, layer: i32, sx: f32, sy: f32) -> bool {
        let mut st = self.state.borrow_mut();
        let r = st.layer(layer).map(|l| {
            l.scaling = Some((sx, sy));
            l.transform = None;
        });
        st.flag(r)
    }

    fn set_layer_transform(&self, layer: i32, angle: f32, dx: f32, dy: f32, sx: f32, sy: f32) -> bool {
        let mut st = self.state.borrow_mut();
        let r = st.layer(layer).map(|l| {
            l.transform = Some([angle, dx, dy, sx, sy]);
            l.scaling = None;
        });
        st.flag(r)
    }

    fn reset_layer_mode(&self, layer: i32) -> bool {
        let mut st = self.state.borrow_mut();
        let r = st.layer(layer).map(|l| {
            l.transform = None;
            l.scaling = None;
        });
        st.flag(r)
    }

    fn set_layer_blend_mode(&self, layer: i32, mode: Blend, factor: u8) -> bool {
        let mut st = self.state.borrow_mut();
        let r = st.layer(layer).map(|l| l.blend = (mode, factor));
        st.flag(r)
    }

    fn set_layer_clip(&self, layer: i32, x1: i32, y1: i32, x2: i32, y2: i32) -> bool {
        let mut st = self.state.borrow_mut();
        let r = st.layer(layer).map(|l| l.clip = Some([x1, y1, x2, y2]));
        st.flag(r)
    }

    fn disable_layer_clip(&self, layer: i32) -> bool {
        let mut st = self.state.borrow_mut();
        let r = st.layer(layer).map(|l| l.clip = None);
        st.flag(r)
    }

    fn set_layer_window(&self, layer: i32, x1: i32, y1: i32, x2: i32, y2: i32, invert: bool) -> bool {
        let mut st = self.state.borrow_mut();
        let r = st.layer(layer).map(|l| l.window = Some(([x1, y1, x2, y2], invert)));
        st.flag(r)
    }

    fn set_layer_window_color(&self, layer: i32, color: Color, blend: Blend) -> bool {
        let mut st = self.state.borrow_mut();
        let r = st.layer(layer).map(|l| l.window_color = Some((color, blend)));
        st.flag(r)
    }

    fn disable_layer_window(&self, layer: i32) -> bool {
        let mut st = self.state.borrow_mut();
        let r = st.layer(layer).map(|l| l.window = None);
        st.flag(r)
    }

    fn disable_layer_window_color(&self, layer: i32) -> bool {
        let mut st = self.state.borrow_mut();
        let r = st.layer(layer).map(|l| l.window_color = None);
        st.flag(r)
    }

    fn layer_tile(&self, layer: i32, x: i32, y: i32) -> Option<TileInfo> {
        let mut st = self.state.borrow_mut();
        let Some(tm) = st.layer(layer)?.tilemap else {
            return st.fail(ErrorCode::RefTilemap);
        };
        let info = st.tile_at(tm, x, y);
        match info {
            Ok(info) => {
                st.ok();
                Some(info)
            }
            Err(code) => st.fail(code),
        }
    }

    fn set_layer_column_offset(&self, layer: i32, offsets: Option<&[i32]>) -> bool {
        let mut st = self.state.borrow_mut();
        let Some(offsets) = offsets else {
            let r = st.layer(layer).map(|l| l.column_offset = None);
            return st.flag(r);
        };
        let Some(tilemap) = st.layer(layer).map(|l| l.tilemap) else {
            return false;
        };
        let tileset = tilemap.and_then(|tm| st.tileset_of(tm, 0));
        let tile_width = match tileset.and_then(|t| st.objects.get(&t)) {
            Some(Object::Tileset(t)) => t.tile_width.max(1),
            _ => {
                st.last_error = ErrorCode::RefTileset;
                return false;
            }
        };
        let width = st.ctx_ref().map_or(0, |c| c.width.max(0));
        if offsets.len() < (width / tile_width) as usize + 2 {
            st.last_error = ErrorCode::WrongSize;
            return false;
        }
        let r = st.layer(layer).map(|l| l.column_offset = Some(offsets.to_vec()));
        st.flag(r)
    }

    fn set_layer_pixel_mapping(&self, layer: i32, table: Option<&[PixelMap]>) -> bool {
        let mut st = self.state.borrow_mut();
        let needed = st
            .ctx_ref()
            .map_or(0, |c| c.width.max(0) as usize * c.height.max(0) as usize);
        if table.is_some_and(|t| t.len() < needed) {
            st.last_error = ErrorCode::WrongSize;
            return false;
        }
        let r = st.layer(layer).map(|l| l.pixel_map = table.map(<[PixelMap]>::to_vec));
        st.flag(r)
    }

    fn set_layer_mosaic(&self, layer: i32, w: i32, h: i32) -> bool {
        let mut st = self.state.borrow_mut();
        let r = st.layer(layer).map(|l| l.mosaic = Some((w, h)));
        st.flag(r)
    }

    fn disable_layer_mosaic(&self, layer: i32) -> bool {
        let mut st = self.state.borrow_mut();
        let r = st.layer(layer).map(|l| l.mosaic = None);
        st.flag(r)
    }

    fn set_layer_objects(&self, layer: i32, list: RawHandle, tileset: Option<RawHandle>) -> bool {
        let mut st = self.state.borrow_mut();
        if st.object_list(list).is_none() {
            return false;
        }
        if let Some(ts) = tileset {
            if st.tileset(ts).is_none() {
                return false;
            }
        }
        let r = st.layer(layer).map(|l| {
            l.objects = Some((list.addr(), tileset.map(RawHandle::addr)));
            l.tilemap = None;
            l.bitmap = None;
        });
        st.flag(r)
    }

    fn layer_objects(&self, layer: i32) -> Option<RawHandle> {
        self.state.borrow_mut().layer(layer)?.objects.map(|(l, _)| handle(l))
    }

    fn set_layer_priority(&self, layer: i32, enable: bool) -> bool {
        let mut st = self.state.borrow_mut();
        let r = st.layer(layer).map(|l| l.priority = enable);
        st.flag(r)
    }

    fn set_layer_parent(&self, layer: i32, parent: i32) -> bool {
        let mut st = self.state.borrow_mut();
        let count = st.ctx_ref().map_or(0, |c| c.layers.len() as i32);
        if !(0..count).contains(&parent) {
            st.last_error = ErrorCode::IdxLayer;
            return false;
        }
        let r = st.layer(layer).map(|l| l.parent = Some(parent));
        st.flag(r)
    }

    fn disable_layer_parent(&self, layer: i32) -> bool {
        let mut st = self.state.borrow_mut();
        let r = st.layer(layer).map(|l| l.parent = None);
        st.flag(r)
    }

    fn enable_layer(&self, layer: i32) -> bool {
        let mut st = self.state.borrow_mut();
        let r = st.layer(layer).map(|l| l.enabled = true);
        st.flag(r)
    }

    fn disable_layer(&self, layer: i32) -> bool {
        let mut st = self.state.borrow_mut();
        let r = st.layer(layer).map(|l| l.enabled = false);
        st.flag(r)
    }

    fn layer_type(&self, layer: i32) -> LayerType {
        let mut st = self.state.borrow_mut();
        match st.layer(layer) {
            Some(l) if l.tilemap.is_some() => LayerType::Tile,
            Some(l) if l.bitmap.is_some() => LayerType::Bitmap,
            Some(l) if l.objects.is_some() => LayerType::Object,
            _ => LayerType::None,
        }
    }

    fn layer_width(&self, layer: i32) -> i32 {
        let mut st = self.state.borrow_mut();
        let Some(l) = st.layer(layer).cloned() else {
            return 0;
        };
        st.layer_size(&l).0
    }

    fn layer_height(&self, layer: i32) -> i32 {
        let mut st = self.state.borrow_mut();
        let Some(l) = st.layer(layer).cloned() else {
            return 0;
        };
        st.layer_size(&l).1
    }

    // ── sprites ───────────────────────────────────────────────────────────

    fn config_sprite(&self, sprite: i32, spriteset: RawHandle, flags: TileFlags) -> bool {
        let mut st = self.state.borrow_mut();
        if st.spriteset(spriteset).is_none() {
            return false;
        }
        let r = st.sprite(sprite).map(|s| {
            s.spriteset = Some(spriteset.addr());
            s.flags = flags;
            s.enabled = true;
        });
        st.flag(r)
    }

    fn set_sprite_set(&self, sprite: i32, spriteset: RawHandle) -> bool {
        let mut st = self.state.borrow_mut();
        if st.spriteset(spriteset).is_none() {
            return false;
        }
        let r = st.sprite(sprite).map(|s| {
            s.spriteset = Some(spriteset.addr());
            s.enabled = true;
        });
        st.flag(r)
    }

    fn set_sprite_flags(&self, sprite: i32, flags: TileFlags) -> bool {
        let mut st = self.state.borrow_mut();
        let r = st.sprite(sprite).map(|s| s.flags = flags);
        st.flag(r)
    }

    fn enable_sprite_flag(&self, sprite: i32, flag: TileFlags, enable: bool) -> bool {
        let mut st = self.state.borrow_mut();
        let r = st.sprite(sprite).map(|s| s.flags.set(flag, enable));
        st.flag(r)
    }

    fn set_sprite_pivot(&self, sprite: i32, px: f32, py: f32) -> bool {
        let mut st = self.state.borrow_mut();
        let r = st.sprite(sprite).map(|s| s.pivot = (px, py));
        st.flag(r)
    }

    fn set_sprite_position(&self, sprite: i32, x: i32, y: i32) -> bool {
        let mut st = self.state.borrow_mut();
        let r = st.sprite(sprite).map(|s| {
            s.x = x;
            s.y = y;
        });
        st.flag(r)
    }

    fn sprite_x(&self, sprite: i32) -> i32 {
        self.state.borrow_mut().sprite(sprite).map_or(0, |s| s.x)
    }

    fn sprite_y(&self, sprite: i32) -> i32 {
        self.state.borrow_mut().sprite(sprite).map_or(0, |s| s.y)
    }

    fn set_sprite_picture(&self, sprite: i32, entry: i32) -> bool {
        let mut st = self.state.borrow_mut();
        let set = st.sprite(sprite).and_then(|s| s.spriteset);
        let entries = match set.and_then(|id| st.objects.get(&id)) {
            Some(Object::Spriteset(s)) => s.entries.len() as i32,
            _ => {
                st.last_error = ErrorCode::RefSpriteset;
                return false;
            }
        };
        if !(0..entries).contains(&entry) {
            st.last_error = ErrorCode::IdxPicture;
            return false;
        }
        let r = st.sprite(sprite).map(|s| s.picture = entry);
        st.flag(r)
    }

    fn sprite_picture(&self, sprite: i32) -> i32 {
        self.state.borrow_mut().sprite(sprite).map_or(0, |s| s.picture)
    }

    fn set_sprite_palette(&self, sprite: i32, palette: RawHandle) -> bool {
        let mut st = self.state.borrow_mut();
        if st.palette(palette).is_none() {
            return false;
        }
        let r = st.sprite(sprite).map(|s| s.palette = Some(palette.addr()));
        st.flag(r)
    }

    fn sprite_palette(&self, sprite: i32) -> Option<RawHandle> {
        self.state.borrow_mut().sprite(sprite)?.palette.map(handle)
    }

    fn set_sprite_blend_mode(&self, sprite: i32, mode: Blend, factor: u8) -> bool {
        let mut st = self.state.borrow_mut();
        let r = st.sprite(sprite).map(|s| s.blend = (mode, factor));
        st.flag(r)
    }

    fn set_sprite_scaling(&self, sprite: i32, sx: f32, sy: f32) -> bool {
        let mut st = self.state.borrow_mut();
        let r = st.sprite(sprite).map(|s| s.scaling = Some((sx, sy)));
        st.flag(r)
    }

    fn reset_sprite_scaling(&self, sprite: i32) -> bool {
        let mut st = self.state.borrow_mut();
        let r = st.sprite(sprite).map(|s| s.scaling = None);
        st.flag(r)
    }

    fn enable_sprite_collision(&self, sprite: i32, enable: bool) -> bool {
        let mut st = self.state.borrow_mut();
        let r = st.sprite(sprite).map(|s| s.collision = enable);
        st.flag(r)
    }

    fn sprite_collision(&self, _sprite: i32) -> bool {
        // nothing is rasterized, so nothing ever overlaps
        false
    }

    fn available_sprite(&self) -> i32 {
        let st = self.state.borrow();
        st.ctx_ref()
            .and_then(|c| c.sprites.iter().position(|s| !s.enabled))
            .map_or(-1, |i| i as i32)
    }

    fn disable_sprite(&self, sprite: i32) -> bool {
        let mut st = self.state.borrow_mut();
        let r = st.sprite(sprite).map(|s| *s = SpriteSlot::default());
        st.flag(r)
    }

    fn set_sprite_animation(&self, sprite: i32, sequence: RawHandle, loops: i32) -> bool {
        let mut st = self.state.borrow_mut();
        if st.sequence(sequence).is_none() {
            return false;
        }
        let r = st.sprite(sprite).map(|s| {
            s.animation = Some((sequence.addr(), loops));
            s.paused = false;
        });
        st.flag(r)
    }

    fn disable_sprite_animation(&self, sprite: i32) -> bool {
        let mut st = self.state.borrow_mut();
        let r = st.sprite(sprite).map(|s| s.animation = None);
        st.flag(r)
    }

    fn pause_sprite_animation(&self, sprite: i32) -> bool {
        let mut st = self.state.borrow_mut();
        let r = st.sprite(sprite).map(|s| s.paused = true);
        st.flag(r)
    }

    fn resume_sprite_animation(&self, sprite: i32) -> bool {
        let mut st = self.state.borrow_mut();
        let r = st.sprite(sprite).map(|s| s.paused = false);
        st.flag(r)
    }

    fn sprite_state(&self, sprite: i32) -> Option<SpriteState> {
        let mut st = self.state.borrow_mut();
        let s = st.sprite(sprite)?.clone();
        let entry = match s.spriteset.and_then(|id| st.objects.get(&id)) {
            Some(Object::Spriteset(set)) => usize::try_from(s.picture).ok().and_then(|i| set.entries.get(i)),
            _ => None,
        };
        let (sx, sy) = s.scaling.unwrap_or((1.0, 1.0));
        let (w, h) = entry.map_or((0, 0), |e| ((e.w as f32 * sx) as i32, (e.h as f32 * sy) as i32));
        Some(SpriteState {
            x: s.x,
            y: s.y,
            w,
            h,
            flags: s.flags,
            palette: s.palette.map(handle),
            spriteset: s.spriteset.map(handle),
            index: s.picture,
            enabled: s.enabled,
            collision: false,
        })
    }

    fn set_first_sprite(&self, sprite: i32) -> bool {
        let mut st = self.state.borrow_mut();
        if st.sprite(sprite).is_none() {
            return false;
        }
        let r = st.ctx().map(|c| c.first_sprite = Some(sprite));
        st.flag(r)
    }

    fn set_next_sprite(&self, sprite: i32, next: i32) -> bool {
        let mut st = self.state.borrow_mut();
        if st.sprite(next).is_none() {
            return false;
        }
        let r = st.sprite(sprite).map(|s| s.next = Some(next));
        st.flag(r)
    }

    fn enable_sprite_masking(&self, sprite: i32, enable: bool) -> bool {
        let mut st = self.state.borrow_mut();
        let r = st.sprite(sprite).map(|s| s.masking = enable);
        st.flag(r)
    }

    fn set_sprites_mask_region(&self, top: i32, bottom: i32) {
        if let Some(c) = self.state.borrow_mut().ctx() {
            c.mask_region = Some((top, bottom));
        }
    }

    // ── palette animations ────────────────────────────────────────────────

    fn set_palette_animation(&self, index: i32, palette: RawHandle, sequence: RawHandle, blend: bool) -> bool {
        let mut st = self.state.borrow_mut();
        if st.palette(palette).is_none() || st.sequence(sequence).is_none() {
            return false;
        }
        let r = st.animation(index).map(|a| {
            a.palette = Some(palette.addr());
            a.sequence = Some(sequence.addr());
            a.blend = blend;
        });
        st.flag(r)
    }

    fn set_palette_animation_source(&self, index: i32, palette: RawHandle) -> bool {
        let mut st = self.state.borrow_mut();
        if st.palette(palette).is_none() {
            return false;
        }
        let r = st.animation(index).map(|a| a.source = Some(palette.addr()));
        st.flag(r)
    }

    fn disable_palette_animation(&self, index: i32) -> bool {
        let mut st = self.state.borrow_mut();
        let r = st.animation(index).map(|a| *a = AnimationState::default());
        st.flag(r)
    }

    fn animation_state(&self, index: i32) -> bool {
        self.state
            .borrow_mut()
            .animation(index)
            .is_some_and(|a| a.sequence.is_some())
    }

    fn available_animation(&self) -> i32 {
        let st = self.state.borrow();
        st.ctx_ref()
            .and_then(|c| c.animations.iter().position(|a| a.sequence.is_none()))
            .map_or(-1, |i| i as i32)
    }

    // ── bitmaps ───────────────────────────────────────────────────────────

    fn create_bitmap(&self, width: i32, height: i32, bpp: i32) -> Option<RawHandle> {
        self.state.borrow_mut().new_bitmap(width, height, bpp)
    }

    fn load_bitmap(&self, _filename: &str) -> Option<RawHandle> {
        let mut st = self.state.borrow_mut();
        if !self.config.placeholder_assets {
            return st.fail(ErrorCode::FileNotFound);
        }
        st.new_bitmap(64, 64, 8)
    }

    fn clone_bitmap(&self, bitmap: RawHandle) -> Option<RawHandle> {
        self.state
            .borrow_mut()
            .clone_object(bitmap, |o| matches!(o, Object::Bitmap(_)), ErrorCode::RefBitmap)
    }

    fn delete_bitmap(&self, bitmap: RawHandle) -> bool {
        self.state
            .borrow_mut()
            .delete(bitmap, |o| matches!(o, Object::Bitmap(_)), ErrorCode::RefBitmap)
    }

    fn bitmap_width(&self, bitmap: RawHandle) -> i32 {
        self.state.borrow_mut().bitmap(bitmap).map_or(0, |b| b.width)
    }

    fn bitmap_height(&self, bitmap: RawHandle) -> i32 {
        self.state.borrow_mut().bitmap(bitmap).map_or(0, |b| b.height)
    }

    fn bitmap_depth(&self, bitmap: RawHandle) -> i32 {
        self.state.borrow_mut().bitmap(bitmap).map_or(0, |b| b.depth)
    }

    fn bitmap_pitch(&self, bitmap: RawHandle) -> i32 {
        self.state.borrow_mut().bitmap(bitmap).map_or(0, |b| b.pitch)
    }

    fn bitmap_palette(&self, bitmap: RawHandle) -> Option<RawHandle> {
        self.state.borrow_mut().bitmap(bitmap)?.palette.map(handle)
    }

    fn set_bitmap_palette(&self, bitmap: RawHandle, palette: RawHandle) -> bool {
        let mut st = self.state.borrow_mut();
        if st.palette(palette).is_none() {
            return false;
        }
        let r = st.bitmap(bitmap).map(|b| b.palette = Some(palette.addr()));
        st.flag(r)
    }

    fn bitmap_pixels(&self, bitmap: RawHandle) -> Option<Vec<u8>> {
        self.state.borrow_mut().bitmap(bitmap).map(|b| b.pixels.clone())
    }

    fn write_bitmap_pixels(&self, bitmap: RawHandle, offset: usize, data: &[u8]) -> bool {
        let mut st = self.state.borrow_mut();
        let Some(b) = st.bitmap(bitmap) else {
            return false;
        };
        let Some(dst) = b.pixels.get_mut(offset..offset + data.len()) else {
            st.last_error = ErrorCode::WrongSize;
            return false;
        };
        dst.copy_from_slice(data);
        st.ok()
    }

    // ── palettes ──────────────────────────────────────────────────────────

    fn create_palette(&self, entries: i32) -> Option<RawHandle> {
        self.state.borrow_mut().new_palette(entries)
    }

    fn load_palette(&self, _filename: &str) -> Option<RawHandle> {
        let mut st = self.state.borrow_mut();
        if !self.config.placeholder_assets {
            return st.fail(ErrorCode::FileNotFound);
        }
        st.new_palette(16)
    }

    fn clone_palette(&self, palette: RawHandle) -> Option<RawHandle> {
        self.state
            .borrow_mut()
            .clone_object(palette, |o| matches!(o, Object::Palette(_)), ErrorCode::RefPalette)
    }

    fn delete_palette(&self, palette: RawHandle) -> bool {
        self.state
            .borrow_mut()
            .delete(palette, |o| matches!(o, Object::Palette(_)), ErrorCode::RefPalette)
    }

    fn set_palette_color(&self, palette: RawHandle, index: i32, color: Color) -> bool {
        let mut st = self.state.borrow_mut();
        let Some(p) = st.palette(palette) else {
            return false;
        };
        match usize::try_from(index).ok().and_then(|i| p.get_mut(i)) {
            Some(c) => {
                *c = color;
                st.ok()
            }
            None => {
                st.last_error = ErrorCode::IdxPicture;
                false
            }
        }
    }

    fn palette_color(&self, palette: RawHandle, index: i32) -> Option<Color> {
        let mut st = self.state.borrow_mut();
        let p = st.palette(palette)?;
        usize::try_from(index).ok().and_then(|i| p.get(i)).copied()
    }

    fn mix_palettes(&self, src1: RawHandle, src2: RawHandle, dst: RawHandle, factor: u8) -> bool {
        let mut st = self.state.borrow_mut();
        let (Some(a), Some(b)) = (st.palette(src1).cloned(), st.palette(src2).cloned()) else {
            return false;
        };
        let Some(d) = st.palette(dst) else {
            return false;
        };
        let f = factor as u32;
        let mix = |x: u8, y: u8| ((x as u32 * (255 - f) + y as u32 * f) / 255) as u8;
        for (i, out) in d.iter_mut().enumerate() {
            if let (Some(ca), Some(cb)) = (a.get(i), b.get(i)) {
                *out = Color::new(mix(ca.r, cb.r), mix(ca.g, cb.g), mix(ca.b, cb.b));
            }
        }
        st.ok()
    }

    fn add_palette_color(&self, palette: RawHandle, color: Color, start: u8, count: u8) -> bool {
        self.state.borrow_mut().palette_op(palette, start, count, |c| {
            Color::new(
                c.r.saturating_add(color.r),
                c.g.saturating_add(color.g),
                c.b.saturating_add(color.b),
            )
        })
    }

    fn sub_palette_color(&self, palette: RawHandle, color: Color, start: u8, count: u8) -> bool {
        self.state.borrow_mut().palette_op(palette, start, count, |c| {
            Color::new(
                c.r.saturating_sub(color.r),
                c.g.saturating_sub(color.g),
                c.b.saturating_sub(color.b),
            )
        })
    }

    fn mod_palette_color(&self, palette: RawHandle, color: Color, start: u8, count: u8) -> bool {
        let m = |x: u8, y: u8| ((x as u32 * y as u32) / 255) as u8;
        self.state.borrow_mut().palette_op(palette, start, count, |c| {
            Color::new(m(c.r, color.r), m(c.g, color.g), m(c.b, color.b))
        })
    }

    // ── tilesets ──────────────────────────────────────────────────────────

    fn create_tileset(&self, num_tiles: i32, width: i32, height: i32, palette: Option<RawHandle>) -> Option<RawHandle> {
        let mut st = self.state.borrow_mut();
        if let Some(p) = palette {
            st.palette(p)?;
        }
        st.new_tileset(num_tiles, width, height, palette.map(RawHandle::addr))
    }

    fn load_tileset(&self, _filename: &str) -> Option<RawHandle> {
        let mut st = self.state.borrow_mut();
        if !self.config.placeholder_assets {
            return st.fail(ErrorCode::FileNotFound);
        }
        st.new_tileset(16, 8, 8, None)
    }

    fn clone_tileset(&self, tileset: RawHandle) -> Option<RawHandle> {
        self.state
            .borrow_mut()
            .clone_object(tileset, |o| matches!(o, Object::Tileset(_)), ErrorCode::RefTileset)
    }

    fn delete_tileset(&self, tileset: RawHandle) -> bool {
        self.state
            .borrow_mut()
            .delete(tileset, |o| matches!(o, Object::Tileset(_)), ErrorCode::RefTileset)
    }

    fn set_tileset_pixels(&self, tileset: RawHandle, entry: i32, data: &[u8], pitch: i32) -> bool {
        let mut st = self.state.borrow_mut();
        let Some(t) = st.tileset(tileset) else {
            return false;
        };
        let (tw, th) = (t.tile_width as usize, t.tile_height as usize);
        let pitch = pitch.max(0) as usize;
        let Some(tile) = usize::try_from(entry).ok().and_then(|e| t.tiles.get_mut(e)) else {
            st.last_error = ErrorCode::IdxPicture;
            return false;
        };
        if pitch < tw || data.len() < pitch * (th - 1) + tw {
            st.last_error = ErrorCode::WrongSize;
            return false;
        }
        for y in 0..th {
            tile[y * tw..(y + 1) * tw].copy_from_slice(&data[y * pitch..y * pitch + tw]);
        }
        st.ok()
    }

    fn tile_width(&self, tileset: RawHandle) -> i32 {
        self.state.borrow_mut().tileset(tileset).map_or(0, |t| t.tile_width)
    }

    fn tile_height(&self, tileset: RawHandle) -> i32 {
        self.state.borrow_mut().tileset(tileset).map_or(0, |t| t.tile_height)
    }

    fn tileset_num_tiles(&self, tileset: RawHandle) -> i32 {
        self.state.borrow_mut().tileset(tileset).map_or(0, |t| t.tiles.len() as i32)
    }

    fn tileset_palette(&self, tileset: RawHandle) -> Option<RawHandle> {
        self.state.borrow_mut().tileset(tileset)?.palette.map(handle)
    }

    // ── tilemaps ──────────────────────────────────────────────────────────

    fn create_tilemap(&self, rows: i32, cols: i32, tiles: &[Tile], bg: Color, tileset: Option<RawHandle>) -> Option<RawHandle> {
        let mut st = self.state.borrow_mut();
        if rows <= 0 || cols <= 0 {
            return st.fail(ErrorCode::WrongSize);
        }
        let cells = (rows * cols) as usize;
        if !tiles.is_empty() && tiles.len() != cells {
            return st.fail(ErrorCode::WrongSize);
        }
        if let Some(ts) = tileset {
            st.tileset(ts)?;
        }
        let mut tilesets = [None; TILEMAP_TILESETS];
        tilesets[0] = tileset.map(RawHandle::addr);
        let tiles = if tiles.is_empty() { vec![Tile::default(); cells] } else { tiles.to_vec() };
        Some(st.insert(Object::Tilemap(TilemapData {
            rows,
            cols,
            tiles,
            bg,
            tilesets,
        })))
    }

    fn load_tilemap(&self, _filename: &str, _layer: Option<&str>) -> Option<RawHandle> {
        let mut st = self.state.borrow_mut();
        if !self.config.placeholder_assets {
            return st.fail(ErrorCode::FileNotFound);
        }
        let tileset = st.new_tileset(16, 8, 8, None)?;
        let mut tilesets = [None; TILEMAP_TILESETS];
        tilesets[0] = Some(tileset.addr());
        Some(st.insert(Object::Tilemap(TilemapData {
            rows: 32,
            cols: 64,
            tiles: (0..32 * 64).map(|i| Tile::new((i % 16) as u16)).collect(),
            bg: Color::new(0x20, 0x40, 0x80),
            tilesets,
        })))
    }

    fn clone_tilemap(&self, tilemap: RawHandle) -> Option<RawHandle> {
        self.state
            .borrow_mut()
            .clone_object(tilemap, |o| matches!(o, Object::Tilemap(_)), ErrorCode::RefTilemap)
    }

    fn delete_tilemap(&self, tilemap: RawHandle) -> bool {
        self.state
            .borrow_mut()
            .delete(tilemap, |o| matches!(o, Object::Tilemap(_)), ErrorCode::RefTilemap)
    }

    fn tilemap_rows(&self, tilemap: RawHandle) -> i32 {
        self.state.borrow_mut().tilemap(tilemap).map_or(0, |t| t.rows)
    }

    fn tilemap_cols(&self, tilemap: RawHandle) -> i32 {
        self.state.borrow_mut().tilemap(tilemap).map_or(0, |t| t.cols)
    }

    fn tilemap_tileset(&self, tilemap: RawHandle, index: i32) -> Option<RawHandle> {
        let mut st = self.state.borrow_mut();
        let t = st.tilemap(tilemap)?;
        usize::try_from(index)
            .ok()
            .and_then(|i| t.tilesets.get(i).copied().flatten())
            .map(handle)
    }

    fn set_tilemap_tileset(&self, tilemap: RawHandle, tileset: RawHandle, index: i32) -> bool {
        let mut st = self.state.borrow_mut();
        if st.tileset(tileset).is_none() {
            return false;
        }
        let Some(t) = st.tilemap(tilemap) else {
            return false;
        };
        match usize::try_from(index).ok().and_then(|i| t.tilesets.get_mut(i)) {
            Some(slot) => {
                *slot = Some(tileset.addr());
                st.ok()
            }
            None => {
                st.last_error = ErrorCode::IdxPicture;
                false
            }
        }
    }

    fn tilemap_tile(&self, tilemap: RawHandle, row: i32, col: i32) -> Option<Tile> {
        let mut st = self.state.borrow_mut();
        let t = st.tilemap(tilemap)?;
        if !(0..t.rows).contains(&row) || !(0..t.cols).contains(&col) {
            return st.fail(ErrorCode::IdxPicture);
        }
        let tile = t.tiles[(row * t.cols + col) as usize];
        st.ok();
        Some(tile)
    }

    fn set_tilemap_tile(&self, tilemap: RawHandle, row: i32, col: i32, tile: Tile) -> bool {
        let mut st = self.state.borrow_mut();
        let Some(t) = st.tilemap(tilemap) else {
            return false;
        };
        if !(0..t.rows).contains(&row) || !(0..t.cols).contains(&col) {
            st.last_error = ErrorCode::IdxPicture;
            return false;
        }
        let cols = t.cols;
        t.tiles[(row * cols + col) as usize] = tile;
        st.ok()
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
        let mut st = self.state.borrow_mut();
        let Some(s) = st.tilemap(src).cloned() else {
            return false;
        };
        let Some(d) = st.tilemap(dst) else {
            return false;
        };
        let fits = |r0: i32, c0: i32, map_rows: i32, map_cols: i32| {
            r0 >= 0 && c0 >= 0 && rows >= 0 && cols >= 0 && r0 + rows <= map_rows && c0 + cols <= map_cols
        };
        if !fits(src_row, src_col, s.rows, s.cols) || !fits(dst_row, dst_col, d.rows, d.cols) {
            st.last_error = ErrorCode::WrongSize;
            return false;
        }
        for r in 0..rows {
            for c in 0..cols {
                let from = ((src_row + r) * s.cols + src_col + c) as usize;
                let to = ((dst_row + r) * d.cols + dst_col + c) as usize;
                d.tiles[to] = s.tiles[from];
            }
        }
        st.ok()
    }

    // ── sequences ─────────────────────────────────────────────────────────

    fn create_sequence(&self, name: &str, _target: i32, frames: &[SequenceFrame]) -> Option<RawHandle> {
        let mut st = self.state.borrow_mut();
        if frames.is_empty() {
            return st.fail(ErrorCode::WrongSize);
        }
        Some(st.insert(Object::Sequence(SequenceInfo {
            name: name.to_string(),
            num_frames: frames.len() as i32,
        })))
    }

    fn create_cycle(&self, name: &str, strips: &[ColorStrip]) -> Option<RawHandle> {
        let mut st = self.state.borrow_mut();
        if strips.is_empty() {
            return st.fail(ErrorCode::WrongSize);
        }
        Some(st.insert(Object::Sequence(SequenceInfo {
            name: name.to_string(),
            num_frames: strips.len() as i32,
        })))
    }

    fn create_sprite_sequence(&self, name: &str, spriteset: RawHandle, basename: &str, _delay: i32) -> Option<RawHandle> {
        let mut st = self.state.borrow_mut();
        let frames = st
            .spriteset(spriteset)?
            .entries
            .iter()
            .filter(|e| e.name.starts_with(basename))
            .count();
        if frames == 0 {
            return st.fail(ErrorCode::IdxPicture);
        }
        Some(st.insert(Object::Sequence(SequenceInfo {
            name: name.to_string(),
            num_frames: frames as i32,
        })))
    }

    fn clone_sequence(&self, sequence: RawHandle) -> Option<RawHandle> {
        self.state
            .borrow_mut()
            .clone_object(sequence, |o| matches!(o, Object::Sequence(_)), ErrorCode::RefSequence)
    }

    fn delete_sequence(&self, sequence: RawHandle) -> bool {
        self.state
            .borrow_mut()
            .delete(sequence, |o| matches!(o, Object::Sequence(_)), ErrorCode::RefSequence)
    }

    fn sequence_info(&self, sequence: RawHandle) -> Option<SequenceInfo> {
        self.state.borrow_mut().sequence(sequence).map(|s| s.clone())
    }

    // ── spritesets ────────────────────────────────────────────────────────

    fn create_spriteset(&self, bitmap: RawHandle, data: &[SpriteData]) -> Option<RawHandle> {
        let mut st = self.state.borrow_mut();
        let (w, h) = {
            let b = st.bitmap(bitmap)?;
            (b.width, b.height)
        };
        let inside = |d: &SpriteData| d.x >= 0 && d.y >= 0 && d.w > 0 && d.h > 0 && d.x + d.w <= w && d.y + d.h <= h;
        if data.is_empty() || !data.iter().all(inside) {
            return st.fail(ErrorCode::WrongSize);
        }
        Some(st.insert(Object::Spriteset(SpritesetData {
            bitmap: bitmap.addr(),
            entries: data.to_vec(),
        })))
    }

    fn load_spriteset(&self, filename: &str) -> Option<RawHandle> {
        let mut st = self.state.borrow_mut();
        if !self.config.placeholder_assets {
            return st.fail(ErrorCode::FileNotFound);
        }
        let bitmap = st.new_bitmap(64, 16, 8)?;
        let entries = (0..4)
            .map(|i| SpriteData {
                name: format!("{filename}{}", i + 1),
                x: i * 16,
                y: 0,
                w: 16,
                h: 16,
            })
            .collect();
        Some(st.insert(Object::Spriteset(SpritesetData {
            bitmap: bitmap.addr(),
            entries,
        })))
    }

    fn clone_spriteset(&self, spriteset: RawHandle) -> Option<RawHandle> {
        self.state
            .borrow_mut()
            .clone_object(spriteset, |o| matches!(o, Object::Spriteset(_)), ErrorCode::RefSpriteset)
    }

    fn delete_spriteset(&self, spriteset: RawHandle) -> bool {
        self.state
            .borrow_mut()
            .delete(spriteset, |o| matches!(o, Object::Spriteset(_)), ErrorCode::RefSpriteset)
    }

    fn spriteset_info(&self, spriteset: RawHandle, entry: i32) -> Option<SpriteInfo> {
        let mut st = self.state.borrow_mut();
        let s = st.spriteset(spriteset)?;
        let info = usize::try_from(entry)
            .ok()
            .and_then(|e| s.entries.get(e))
            .map(|d| SpriteInfo { w: d.w, h: d.h });
        if info.is_none() {
            st.last_error = ErrorCode::IdxPicture;
        }
        info
    }

    fn spriteset_palette(&self, spriteset: RawHandle) -> Option<RawHandle> {
        let mut st = self.state.borrow_mut();
        let bitmap = st.spriteset(spriteset)?.bitmap;
        match st.objects.get(&bitmap) {
            Some(Object::Bitmap(b)) => b.palette.map(handle),
            _ => None,
        }
    }

    fn find_spriteset_sprite(&self, spriteset: RawHandle, name: &str) -> i32 {
        self.state
            .borrow_mut()
            .spriteset(spriteset)
            .and_then(|s| s.entries.iter().position(|e| e.name == name))
            .map_or(-1, |i| i as i32)
    }

    // ── object lists ──────────────────────────────────────────────────────

    fn create_object_list(&self) -> Option<RawHandle> {
        Some(self.state.borrow_mut().insert(Object::ObjectList(Vec::new())))
    }

    fn add_tile_object(&self, list: RawHandle, id: u16, gid: u16, flags: TileFlags, x: i32, y: i32) -> bool {
        let mut st = self.state.borrow_mut();
        let r = st.object_list(list).map(|l| l.push(TileObject { id, gid, flags, x, y }));
        if r.is_some() {
            st.ok();
        }
        r.is_some()
    }

    fn load_object_list(&self, _filename: &str, _layer: Option<&str>) -> Option<RawHandle> {
        let mut st = self.state.borrow_mut();
        if !self.config.placeholder_assets {
            return st.fail(ErrorCode::FileNotFound);
        }
        Some(st.insert(Object::ObjectList(Vec::new())))
    }

    fn clone_object_list(&self, list: RawHandle) -> Option<RawHandle> {
        self.state
            .borrow_mut()
            .clone_object(list, |o| matches!(o, Object::ObjectList(_)), ErrorCode::RefList)
    }

    fn delete_object_list(&self, list: RawHandle) -> bool {
        self.state
            .borrow_mut()
            .delete(list, |o| matches!(o, Object::ObjectList(_)), ErrorCode::RefList)
    }

    fn list_num_objects(&self, list: RawHandle) -> i32 {
        self.state.borrow_mut().object_list(list).map_or(0, |l| l.len() as i32)
    }
}

impl WindowState {
    fn new(threaded: bool, flags: WindowFlags) -> Self {
        let scale = ((flags.bits() >> 2) & 0x7) as i32;
        Self {
            threaded,
            closed: false,
            frames: 0,
            title: String::new(),
            scale: scale.max(1),
            crt: None,
            crt_effect: None,
            blur: false,
            disabled_players: HashSet::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_context() -> Headless {
        let h = Headless::default();
        h.init(320, 240, 2, 4, 2).unwrap();
        h
    }

    #[test]
    fn init_makes_context_current() {
        let h = Headless::default();
        let ctx = h.init(320, 240, 2, 4, 2).unwrap();
        assert_eq!(h.context(), Some(ctx));
        assert_eq!(h.width(), 320);
        assert_eq!(h.num_layers(), 2);
        assert_eq!(h.stats().contexts_created, 1);
    }

    #[test]
    fn layer_index_out_of_range_sets_error() {
        let h = with_context();
        assert!(!h.set_layer_position(5, 1, 1));
        assert_eq!(h.last_error(), ErrorCode::IdxLayer);
        assert!(h.set_layer_position(1, 10, 20));
        assert_eq!(h.layer_x(1), 10);
        assert_eq!(h.last_error(), ErrorCode::Ok);
    }

    #[test]
    fn wrong_handle_kind_is_rejected() {
        let h = with_context();
        let pal = h.create_palette(16).unwrap();
        assert_eq!(h.bitmap_width(pal), 0);
        assert_eq!(h.last_error(), ErrorCode::RefBitmap);
    }

    #[test]
    fn eight_bit_bitmap_owns_palette() {
        let h = with_context();
        let bmp = h.create_bitmap(10, 4, 8).unwrap();
        assert_eq!(h.bitmap_pitch(bmp), 12);
        assert!(h.bitmap_palette(bmp).is_some());
        assert_eq!(h.bitmap_pixels(bmp).unwrap().len(), 48);
    }

    #[test]
    fn draw_closes_window_after_limit() {
        let h = Headless::new(HeadlessConfig {
            close_after_frames: Some(2),
            ..HeadlessConfig::default()
        });
        h.init(16, 16, 1, 1, 1).unwrap();
        assert!(h.create_window(None, WindowFlags::default()));
        h.draw_frame(0);
        assert!(h.is_window_active());
        h.draw_frame(0);
        assert!(!h.is_window_active());
        assert_eq!(h.stats().frames_drawn, 2);
    }

    #[test]
    fn failing_draw_sets_last_error_without_drawing() {
        let h = Headless::new(HeadlessConfig {
            failing_draws: vec![1],
            ..HeadlessConfig::default()
        });
        h.init(16, 16, 1, 1, 1).unwrap();
        h.create_window(None, WindowFlags::default());
        h.draw_frame(0);
        assert_eq!(h.last_error(), ErrorCode::Unsupported);
        assert_eq!(h.stats().frames_drawn, 0);
        assert_eq!(h.stats().draw_calls, 1);
    }

    #[test]
    fn render_fills_background() {
        let h = with_context();
        h.set_bg_color(1, 2, 3);
        let mut buf = vec![0u8; 320 * 240 * 4];
        h.render_frame_to(&mut buf, 320 * 4, 0);
        assert_eq!(&buf[..4], &Color::new(1, 2, 3).packed().to_le_bytes());
        assert_eq!(&buf[buf.len() - 4..], &Color::new(1, 2, 3).packed().to_le_bytes());
    }

    #[test]
    fn quit_input_closes_on_process() {
        let h = with_context();
        h.create_window(None, WindowFlags::default());
        assert!(h.process_window());
        h.set_input(Player::P1, Input::Quit, true);
        assert!(!h.process_window());
        assert_eq!(h.stats().process_calls, 2);
    }

    #[test]
    fn missing_assets_report_file_not_found() {
        let h = Headless::new(HeadlessConfig {
            placeholder_assets: false,
            ..HeadlessConfig::default()
        });
        assert!(h.load_tilemap("level.tmx", None).is_none());
        assert_eq!(h.last_error(), ErrorCode::FileNotFound);
    }
}
