use std::ffi::c_void;
use std::num::NonZeroUsize;

use bitflags::bitflags;
use bytemuck::{Pod, Zeroable};

/// Opaque reference to a native object (context, bitmap, palette, ...).
///
/// Invariant:
/// - never null; a null return from the native layer maps to `None`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct RawHandle(NonZeroUsize);

impl RawHandle {
    #[inline]
    pub fn from_ptr(ptr: *mut c_void) -> Option<Self> {
        NonZeroUsize::new(ptr as usize).map(Self)
    }

    #[inline]
    pub fn as_ptr(self) -> *mut c_void {
        self.0.get() as *mut c_void
    }

    #[inline]
    pub(crate) fn from_id(id: NonZeroUsize) -> Self {
        Self(id)
    }

    #[inline]
    pub fn addr(self) -> usize {
        self.0.get()
    }
}

/// Straight 8-bit RGB color, as the native palette stores it.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
#[repr(C)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Color = Color::new(0, 0, 0);
    pub const WHITE: Color = Color::new(255, 255, 255);

    #[inline]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Packs as opaque `0xAARRGGBB`.
    #[inline]
    pub const fn packed(self) -> u32 {
        0xFF00_0000 | (self.r as u32) << 16 | (self.g as u32) << 8 | self.b as u32
    }

    #[inline]
    pub const fn from_packed(v: u32) -> Self {
        Self {
            r: (v >> 16) as u8,
            g: (v >> 8) as u8,
            b: v as u8,
        }
    }
}

/// Native error codes with their message table.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, thiserror::Error)]
#[repr(i32)]
pub enum ErrorCode {
    #[default]
    #[error("No error")]
    Ok = 0,
    #[error("Not enough memory")]
    OutOfMemory,
    #[error("Layer index out of range")]
    IdxLayer,
    #[error("Sprite index out of range")]
    IdxSprite,
    #[error("Animation index out of range")]
    IdxAnimation,
    #[error("Picture or tile index out of range")]
    IdxPicture,
    #[error("Invalid Tileset reference")]
    RefTileset,
    #[error("Invalid Tilemap reference")]
    RefTilemap,
    #[error("Invalid Spriteset reference")]
    RefSpriteset,
    #[error("Invalid Palette reference")]
    RefPalette,
    #[error("Invalid Sequence reference")]
    RefSequence,
    #[error("Invalid SequencePack reference")]
    RefSeqpack,
    #[error("Invalid Bitmap reference")]
    RefBitmap,
    #[error("Null pointer as argument")]
    NullPointer,
    #[error("Resource file not found")]
    FileNotFound,
    #[error("Resource file has invalid format")]
    WrongFormat,
    #[error("A width or height parameter is invalid")]
    WrongSize,
    #[error("Unsupported function")]
    Unsupported,
    #[error("Invalid ObjectList reference")]
    RefList,
}

impl ErrorCode {
    const ALL: [ErrorCode; 19] = [
        ErrorCode::Ok,
        ErrorCode::OutOfMemory,
        ErrorCode::IdxLayer,
        ErrorCode::IdxSprite,
        ErrorCode::IdxAnimation,
        ErrorCode::IdxPicture,
        ErrorCode::RefTileset,
        ErrorCode::RefTilemap,
        ErrorCode::RefSpriteset,
        ErrorCode::RefPalette,
        ErrorCode::RefSequence,
        ErrorCode::RefSeqpack,
        ErrorCode::RefBitmap,
        ErrorCode::NullPointer,
        ErrorCode::FileNotFound,
        ErrorCode::WrongFormat,
        ErrorCode::WrongSize,
        ErrorCode::Unsupported,
        ErrorCode::RefList,
    ];

    /// Maps a raw native code; unknown values return `None`.
    pub fn from_raw(raw: i32) -> Option<Self> {
        usize::try_from(raw).ok().and_then(|i| Self::ALL.get(i).copied())
    }

    #[inline]
    pub fn is_ok(self) -> bool {
        self == ErrorCode::Ok
    }
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum Blend {
    #[default]
    None = 0,
    Mix25,
    Mix50,
    Mix75,
    Add,
    Sub,
    Mod,
    Custom,
}

impl Blend {
    pub const MIX: Blend = Blend::Mix50;
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum LayerType {
    #[default]
    None = 0,
    Tile,
    Object,
    Bitmap,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum Crt {
    Slot = 0,
    Aperture,
    Shadow,
}

/// Built-in CRT overlay pattern.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum Overlay {
    #[default]
    None = 0,
    ShadowMask,
    Aperture,
    Scanlines,
    Custom,
}

/// Full CRT post-processing setup, as taken by `TLN_EnableCRTEffect`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct CrtEffect {
    pub overlay: Overlay,
    /// Overlay blend strength, 0 disables the overlay.
    pub overlay_factor: u8,
    /// Glow source threshold.
    pub threshold: u8,
    /// Glow transfer curve: `(v0, v1)` and `(v2, v3)` are its two points.
    pub curve: [u8; 4],
    pub blur: bool,
    /// Glow blend strength, 0 disables the glow.
    pub glow_factor: u8,
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum LogLevel {
    None = 0,
    #[default]
    Errors,
    Verbose,
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum Player {
    #[default]
    P1 = 0,
    P2,
    P3,
    P4,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum Input {
    None = 0,
    Up,
    Down,
    Left,
    Right,
    Button1,
    Button2,
    Button3,
    Button4,
    Button5,
    Button6,
    Start,
    Quit,
    Crt,
}

impl Input {
    /// Native encoding: input id in the low 5 bits, player above.
    #[inline]
    pub fn encode(self, player: Player) -> i32 {
        (player as i32) << 5 | self as i32
    }
}

bitflags! {
    /// Window creation flags.
    ///
    /// `S1`..`S5` are values of a 3-bit scale field, not independent bits.
    #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
    pub struct WindowFlags: u32 {
        const FULLSCREEN = 1 << 0;
        const VSYNC = 1 << 1;
        const S1 = 1 << 2;
        const S2 = 2 << 2;
        const S3 = 3 << 2;
        const S4 = 4 << 2;
        const S5 = 5 << 2;
        const NEAREST = 1 << 6;
        const NOVSYNC = 1 << 7;
    }
}

impl Default for WindowFlags {
    fn default() -> Self {
        WindowFlags::S2 | WindowFlags::NOVSYNC
    }
}

bitflags! {
    /// Tile/sprite attribute flags (high half of a tile value).
    #[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
    pub struct TileFlags: u16 {
        const FLIPX = 1 << 15;
        const FLIPY = 1 << 14;
        const ROTATE = 1 << 13;
        const PRIORITY = 1 << 12;
        const MASKED = 1 << 11;
    }
}

/// One tilemap cell: tile index in the low 16 bits, attributes above.
///
/// Attribute layout (bits of the high half):
/// - 0..=4 unused, 5..=7 palette, 8..=10 tileset
/// - 11 masked, 12 priority, 13 rotated, 14 flip-y, 15 flip-x
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, Pod, Zeroable)]
#[repr(transparent)]
pub struct Tile(pub u32);

impl Tile {
    #[inline]
    pub const fn new(index: u16) -> Self {
        Self(index as u32)
    }

    #[inline]
    pub const fn index(self) -> u16 {
        self.0 as u16
    }

    #[inline]
    pub fn set_index(&mut self, index: u16) {
        self.0 = (self.0 & 0xFFFF_0000) | index as u32;
    }

    #[inline]
    pub const fn flags(self) -> u16 {
        (self.0 >> 16) as u16
    }

    #[inline]
    pub fn set_flags(&mut self, flags: u16) {
        self.0 = (self.0 & 0x0000_FFFF) | (flags as u32) << 16;
    }

    #[inline]
    pub fn tile_flags(self) -> TileFlags {
        TileFlags::from_bits_truncate(self.flags())
    }

    fn field(self, shift: u32, width: u32) -> u8 {
        ((self.flags() >> shift) & ((1 << width) - 1)) as u8
    }

    fn set_field(&mut self, shift: u32, width: u32, value: u8) {
        let mask = ((1u16 << width) - 1) << shift;
        let flags = (self.flags() & !mask) | (((value as u16) << shift) & mask);
        self.set_flags(flags);
    }

    pub fn unused(self) -> u8 {
        self.field(0, 5)
    }

    pub fn set_unused(&mut self, v: u8) {
        self.set_field(0, 5, v);
    }

    pub fn palette(self) -> u8 {
        self.field(5, 3)
    }

    pub fn set_palette(&mut self, v: u8) {
        self.set_field(5, 3, v);
    }

    pub fn tileset(self) -> u8 {
        self.field(8, 3)
    }

    pub fn set_tileset(&mut self, v: u8) {
        self.set_field(8, 3, v);
    }

    pub fn masked(self) -> bool {
        self.field(11, 1) != 0
    }

    pub fn set_masked(&mut self, v: bool) {
        self.set_field(11, 1, v as u8);
    }

    pub fn priority(self) -> bool {
        self.field(12, 1) != 0
    }

    pub fn set_priority(&mut self, v: bool) {
        self.set_field(12, 1, v as u8);
    }

    pub fn rotated(self) -> bool {
        self.field(13, 1) != 0
    }

    pub fn set_rotated(&mut self, v: bool) {
        self.set_field(13, 1, v as u8);
    }

    pub fn flip_y(self) -> bool {
        self.field(14, 1) != 0
    }

    pub fn set_flip_y(&mut self, v: bool) {
        self.set_field(14, 1, v as u8);
    }

    pub fn flip_x(self) -> bool {
        self.field(15, 1) != 0
    }

    pub fn set_flip_x(&mut self, v: bool) {
        self.set_field(15, 1, v as u8);
    }
}

/// What a layer shows at one layer-space pixel (`TLN_TileInfo`).
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
#[repr(C)]
pub struct TileInfo {
    pub index: u16,
    pub flags: u16,
    pub row: i32,
    pub col: i32,
    /// Pixel offset inside the tile.
    pub xoffset: i32,
    pub yoffset: i32,
    /// Palette index of the pixel.
    pub color: u8,
    /// Tile type from the tileset.
    pub kind: u8,
    pub empty: bool,
}

impl TileInfo {
    pub fn tile_flags(&self) -> TileFlags {
        TileFlags::from_bits_truncate(self.flags)
    }
}

/// Per-pixel displacement for the pixel-mapping layer mode.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Pod, Zeroable)]
#[repr(C)]
pub struct PixelMap {
    pub dx: i16,
    pub dy: i16,
}

/// Runtime state of a sprite slot.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct SpriteState {
    pub x: i32,
    pub y: i32,
    /// On-screen size after scaling.
    pub w: i32,
    pub h: i32,
    pub flags: TileFlags,
    pub palette: Option<RawHandle>,
    pub spriteset: Option<RawHandle>,
    /// Current spriteset entry.
    pub index: i32,
    pub enabled: bool,
    pub collision: bool,
}

/// Frame of a tile/sprite animation sequence.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Pod, Zeroable)]
#[repr(C)]
pub struct SequenceFrame {
    pub index: i32,
    pub delay: i32,
}

/// Palette color-cycle strip.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
#[repr(C)]
pub struct ColorStrip {
    pub delay: i32,
    pub first: u8,
    pub count: u8,
    /// 0 = descending, 1 = ascending.
    pub dir: u8,
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Pod, Zeroable)]
#[repr(C)]
pub struct SpriteInfo {
    pub w: i32,
    pub h: i32,
}

/// Spriteset entry description used when building a spriteset from a bitmap.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpriteData {
    pub name: String,
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SequenceInfo {
    pub name: String,
    pub num_frames: i32,
}

/// Per-scanline / per-frame callback.
pub type VideoCallback = extern "C" fn(line: i32);

/// Custom blend function for `Blend::Custom`.
pub type BlendFunction = extern "C" fn(src: u8, dst: u8) -> u8;

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn error_code_round_trips_raw() {
        assert_eq!(ErrorCode::from_raw(0), Some(ErrorCode::Ok));
        assert_eq!(ErrorCode::from_raw(18), Some(ErrorCode::RefList));
        assert_eq!(ErrorCode::from_raw(19), None);
        assert_eq!(ErrorCode::from_raw(-1), None);
    }

    #[test]
    fn error_code_message() {
        assert_eq!(ErrorCode::FileNotFound.to_string(), "Resource file not found");
    }

    #[test]
    fn input_encodes_player_bits() {
        assert_eq!(Input::Quit.encode(Player::P1), 12);
        assert_eq!(Input::Up.encode(Player::P2), (1 << 5) | 1);
    }

    #[test]
    fn color_packs_opaque() {
        let c = Color::new(0x12, 0x34, 0x56);
        assert_eq!(c.packed(), 0xFF12_3456);
        assert_eq!(Color::from_packed(c.packed()), c);
    }

    #[test]
    fn tile_info_exposes_flags() {
        let info = TileInfo {
            flags: (TileFlags::FLIPX | TileFlags::PRIORITY).bits(),
            ..TileInfo::default()
        };
        assert!(info.tile_flags().contains(TileFlags::FLIPX));
        assert!(!info.tile_flags().contains(TileFlags::FLIPY));
    }

    #[test]
    fn tile_flip_bits_match_flags() {
        let mut t = Tile::new(23);
        t.set_flip_y(true);
        assert!(t.tile_flags().contains(TileFlags::FLIPY));
        assert!(!t.flip_x());
        assert_eq!(t.index(), 23);
    }

    proptest! {
        #[test]
        fn tile_fields_do_not_overlap(
            index in any::<u16>(),
            palette in 0u8..8,
            tileset in 0u8..8,
            unused in 0u8..32,
            flags in any::<[bool; 5]>(),
        ) {
            let mut t = Tile::new(index);
            t.set_palette(palette);
            t.set_tileset(tileset);
            t.set_unused(unused);
            t.set_masked(flags[0]);
            t.set_priority(flags[1]);
            t.set_rotated(flags[2]);
            t.set_flip_y(flags[3]);
            t.set_flip_x(flags[4]);

            prop_assert_eq!(t.index(), index);
            prop_assert_eq!(t.palette(), palette);
            prop_assert_eq!(t.tileset(), tileset);
            prop_assert_eq!(t.unused(), unused);
            prop_assert_eq!(t.masked(), flags[0]);
            prop_assert_eq!(t.priority(), flags[1]);
            prop_assert_eq!(t.rotated(), flags[2]);
            prop_assert_eq!(t.flip_y(), flags[3]);
            prop_assert_eq!(t.flip_x(), flags[4]);
        }
    }
}
