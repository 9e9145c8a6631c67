use std::ops::Range;

use crate::engine::Tilengine;
use crate::error::EngineError;
use crate::native::RawHandle;

use super::{NativeRef, Palette};

/// Integer 2D point.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub struct Vec2i {
    pub x: i32,
    pub y: i32,
}

impl Vec2i {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Integer rectangle, origin top-left.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { x, y, w, h }
    }

    pub fn from_corners(a: Vec2i, b: Vec2i) -> Self {
        let (x0, x1) = (a.x.min(b.x), a.x.max(b.x));
        let (y0, y1) = (a.y.min(b.y), a.y.max(b.y));
        Self::new(x0, y0, x1.saturating_sub(x0), y1.saturating_sub(y0))
    }

    pub fn contains(&self, p: Vec2i) -> bool {
        let (px, py) = (i64::from(p.x), i64::from(p.y));
        let (x, y) = (i64::from(self.x), i64::from(self.y));
        px >= x && py >= y && px < x + i64::from(self.w) && py < y + i64::from(self.h)
    }
}

/// Native pixel buffer (8, 16, 24 or 32 bpp).
///
/// Pixel values are written little-endian in `depth / 8` bytes, so for an
/// 8 bpp bitmap the value is a palette index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap(NativeRef);

impl Bitmap {
    pub fn new(tln: &Tilengine, width: i32, height: i32, bpp: i32) -> Result<Self, EngineError> {
        NativeRef::create(tln, |n| n.create_bitmap(width, height, bpp)).map(Self)
    }

    /// Loads a png or bmp file relative to the engine load path.
    pub fn load(tln: &Tilengine, filename: &str) -> Result<Self, EngineError> {
        NativeRef::create(tln, |n| n.load_bitmap(filename)).map(Self)
    }

    pub(crate) fn from_ref(r: NativeRef) -> Self {
        Self(r)
    }

    pub fn raw(&self) -> RawHandle {
        self.0.raw()
    }

    /// Deep copy.
    pub fn clone_bitmap(&self) -> Option<Bitmap> {
        self.0.sibling(self.0.native().clone_bitmap(self.raw())).map(Self)
    }

    pub fn width(&self) -> i32 {
        self.0.native().bitmap_width(self.raw())
    }

    pub fn height(&self) -> i32 {
        self.0.native().bitmap_height(self.raw())
    }

    pub fn depth(&self) -> i32 {
        self.0.native().bitmap_depth(self.raw())
    }

    /// Bytes per row.
    pub fn pitch(&self) -> i32 {
        self.0.native().bitmap_pitch(self.raw())
    }

    pub fn palette(&self) -> Option<Palette> {
        self.0
            .sibling(self.0.native().bitmap_palette(self.raw()))
            .map(Palette::from_ref)
    }

    pub fn set_palette(&self, palette: &Palette) -> bool {
        self.0.native().set_bitmap_palette(self.raw(), palette.raw())
    }

    /// Copy of the raw pixel rows (`pitch * height` bytes).
    pub fn pixels(&self) -> Option<Vec<u8>> {
        self.0.native().bitmap_pixels(self.raw())
    }

    /// Replaces all pixel data; `data` must be exactly `pitch * height` bytes.
    pub fn set_pixels(&self, data: &[u8]) -> bool {
        let expected = self.pitch().max(0) as usize * self.height().max(0) as usize;
        data.len() == expected && self.0.native().write_bitmap_pixels(self.raw(), 0, data)
    }

    /// Writes one pixel; coordinates outside the bitmap are ignored.
    pub fn set_pixel(&self, x: i32, y: i32, value: u32) {
        let canvas = self.canvas_info();
        if let Some(offset) = canvas.offset(x, y) {
            let bytes = value.to_le_bytes();
            self.0
                .native()
                .write_bitmap_pixels(self.raw(), offset, &bytes[..canvas.bytes_per_pixel]);
        }
    }

    /// Fills every pixel with `value`.
    pub fn clear(&self, value: u32) {
        self.edit(|c| {
            for y in 0..c.height {
                for x in 0..c.width {
                    c.put(x, y, value);
                }
            }
        });
    }

    /// Horizontal run of `len` pixels from `(x, y)`; negative `len` runs left.
    pub fn draw_hline(&self, x: i32, y: i32, len: i32, value: u32) {
        self.edit(|c| {
            for px in span(x, len, c.width) {
                c.put(px, y, value);
            }
        });
    }

    /// Vertical run of `len` pixels from `(x, y)`; negative `len` runs up.
    pub fn draw_vline(&self, x: i32, y: i32, len: i32, value: u32) {
        self.edit(|c| {
            for py in span(y, len, c.height) {
                c.put(x, py, value);
            }
        });
    }

    /// Rectangle outline, or a solid block when `filled`.
    pub fn draw_rect(&self, rect: Rect, value: u32, filled: bool) {
        if rect.w <= 0 || rect.h <= 0 {
            return;
        }
        // Edges are tested against the unclipped rect, so a rect hanging off
        // the canvas has no outline on the clipped sides.
        let (x0, y0) = (i64::from(rect.x), i64::from(rect.y));
        let (x1, y1) = (x0 + i64::from(rect.w) - 1, y0 + i64::from(rect.h) - 1);
        self.edit(|c| {
            for y in span(rect.y, rect.h, c.height) {
                for x in span(rect.x, rect.w, c.width) {
                    let (wx, wy) = (i64::from(x), i64::from(y));
                    let edge = wx == x0 || wx == x1 || wy == y0 || wy == y1;
                    if filled || edge {
                        c.put(x, y, value);
                    }
                }
            }
        });
    }

    pub fn delete(self) -> bool {
        self.0.native().delete_bitmap(self.raw())
    }

    fn canvas_info(&self) -> Canvas {
        Canvas {
            data: Vec::new(),
            width: self.width(),
            height: self.height(),
            pitch: self.pitch().max(0) as usize,
            bytes_per_pixel: (self.depth().max(8) / 8) as usize,
        }
    }

    /// Read-modify-write of the whole pixel buffer.
    fn edit(&self, f: impl FnOnce(&mut Canvas)) {
        let Some(data) = self.pixels() else {
            return;
        };
        let mut canvas = Canvas {
            data,
            ..self.canvas_info()
        };
        f(&mut canvas);
        self.0.native().write_bitmap_pixels(self.raw(), 0, &canvas.data);
    }
}

/// Pixels covered by a run of `len` from `start`, clipped to `0..limit`.
fn span(start: i32, len: i32, limit: i32) -> Range<i32> {
    let (start, len) = (i64::from(start), i64::from(len));
    let (from, to) = if len >= 0 {
        (start, start + len)
    } else {
        (start + len + 1, start + 1)
    };
    let from = from.max(0);
    let to = to.min(i64::from(limit.max(0)));
    if from >= to {
        return 0..0;
    }
    // Both ends now lie in 0..=limit.
    from as i32..to as i32
}

struct Canvas {
    data: Vec<u8>,
    width: i32,
    height: i32,
    pitch: usize,
    bytes_per_pixel: usize,
}

impl Canvas {
    fn offset(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x >= self.width || y >= self.height {
            return None;
        }
        Some(y as usize * self.pitch + x as usize * self.bytes_per_pixel)
    }

    fn put(&mut self, x: i32, y: i32, value: u32) {
        let Some(offset) = self.offset(x, y) else {
            return;
        };
        let bpp = self.bytes_per_pixel;
        if let Some(dst) = self.data.get_mut(offset..offset + bpp) {
            dst.copy_from_slice(&value.to_le_bytes()[..bpp]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bitmap(w: i32, h: i32) -> (Tilengine, Bitmap) {
        let tln = Tilengine::headless();
        let bmp = Bitmap::new(&tln, w, h, 8).unwrap();
        (tln, bmp)
    }

    fn pixel(bmp: &Bitmap, x: i32, y: i32) -> u8 {
        let pitch = bmp.pitch() as usize;
        bmp.pixels().unwrap()[y as usize * pitch + x as usize]
    }

    #[test]
    fn set_pixel_ignores_out_of_bounds() {
        let (_tln, bmp) = bitmap(4, 4);
        bmp.set_pixel(1, 2, 7);
        bmp.set_pixel(-1, 0, 9);
        bmp.set_pixel(4, 0, 9);
        assert_eq!(pixel(&bmp, 1, 2), 7);
        assert_eq!(bmp.pixels().unwrap().iter().filter(|&&p| p != 0).count(), 1);
    }

    #[test]
    fn negative_hline_draws_backwards() {
        let (_tln, bmp) = bitmap(8, 1);
        bmp.draw_hline(5, 0, -3, 1);
        let row: Vec<u8> = (0..8).map(|x| pixel(&bmp, x, 0)).collect();
        assert_eq!(row, [0, 0, 0, 1, 1, 1, 0, 0]);
    }

    #[test]
    fn vline_clips_to_bitmap() {
        let (_tln, bmp) = bitmap(2, 4);
        bmp.draw_vline(1, 2, 10, 3);
        assert_eq!(pixel(&bmp, 1, 1), 0);
        assert_eq!(pixel(&bmp, 1, 2), 3);
        assert_eq!(pixel(&bmp, 1, 3), 3);
    }

    #[test]
    fn rect_outline_leaves_inside_clear() {
        let (_tln, bmp) = bitmap(5, 5);
        bmp.draw_rect(Rect::new(0, 0, 5, 5), 2, false);
        assert_eq!(pixel(&bmp, 0, 0), 2);
        assert_eq!(pixel(&bmp, 4, 4), 2);
        assert_eq!(pixel(&bmp, 2, 2), 0);

        bmp.draw_rect(Rect::new(1, 1, 3, 3), 4, true);
        assert_eq!(pixel(&bmp, 2, 2), 4);
    }

    #[test]
    fn set_pixels_requires_exact_length() {
        let (_tln, bmp) = bitmap(3, 2);
        let len = (bmp.pitch() * bmp.height()) as usize;
        assert!(!bmp.set_pixels(&vec![1; len - 1]));
        assert!(bmp.set_pixels(&vec![1; len]));
        assert_eq!(pixel(&bmp, 2, 1), 1);
    }

    #[test]
    fn clear_fills_visible_pixels() {
        let (_tln, bmp) = bitmap(3, 3);
        bmp.clear(5);
        assert!((0..3).all(|y| (0..3).all(|x| pixel(&bmp, x, y) == 5)));
    }

    #[test]
    fn rect_from_corners_normalizes() {
        let r = Rect::from_corners(Vec2i::new(4, 1), Vec2i::new(1, 3));
        assert_eq!(r, Rect::new(1, 1, 3, 2));
        assert!(r.contains(Vec2i::new(1, 1)));
        assert!(!r.contains(Vec2i::new(4, 1)));
    }

    #[test]
    fn extreme_lengths_clip_without_overflow() {
        let (_tln, bmp) = bitmap(4, 4);
        bmp.draw_rect(Rect::new(2, 0, i32::MAX, 2), 1, false);
        assert_eq!(pixel(&bmp, 2, 0), 1);
        assert_eq!(pixel(&bmp, 3, 1), 1);

        bmp.draw_hline(-1, 2, i32::MIN, 6);
        bmp.draw_hline(i32::MAX, 2, i32::MAX, 6);
        bmp.draw_vline(0, -2, i32::MAX, 3);
        bmp.draw_vline(1, i32::MIN, i32::MAX, 3);
        assert_eq!(pixel(&bmp, 0, 2), 3);
        assert_eq!((1..4).filter(|&x| pixel(&bmp, x, 2) == 6).count(), 0);
        assert_eq!((0..4).filter(|&y| pixel(&bmp, 0, y) == 3).count(), 4);
        assert!((0..4).all(|y| pixel(&bmp, 1, y) != 3));

        bmp.draw_rect(Rect::new(i32::MIN, i32::MIN, i32::MAX, i32::MAX), 9, true);
        assert!(bmp.pixels().unwrap().iter().all(|&p| p != 9));
    }

    #[test]
    fn huge_rect_touches_only_the_canvas() {
        let (_tln, bmp) = bitmap(3, 3);
        bmp.draw_rect(Rect::new(-1, -1, 100_000, 100_000), 4, false);
        assert!(bmp.pixels().unwrap().iter().all(|&p| p == 0));
        bmp.draw_rect(Rect::new(0, 0, 100_000, 100_000), 4, true);
        assert!((0..3).all(|y| (0..3).all(|x| pixel(&bmp, x, y) == 4)));
    }

    #[test]
    fn contains_at_the_integer_limits() {
        let r = Rect::new(i32::MAX - 1, 0, i32::MAX, 1);
        assert!(r.contains(Vec2i::new(i32::MAX, 0)));
        assert!(!Rect::new(i32::MIN, 0, 0, 1).contains(Vec2i::new(i32::MIN, 0)));
    }
}
