//! An in-memory image of the panel, in the SSD1322's native pixel format: two horizontally adjacent
//! pixels per byte, 4 bits each, left pixel in the high nibble.
//!
//! Rasterization is done by `embedded-graphics`; this module only knows how to store and move
//! pixels.

use alloc::vec::Vec;
use core::convert::Infallible;
use core::iter::Rev;
use core::ops::Range;

use embedded_graphics::{
    mono_font::{ascii::FONT_6X10, MonoTextStyle},
    pixelcolor::{Gray4, GrayColor},
    prelude::*,
    primitives::{Line, PrimitiveStyle},
    text::{Baseline, Text},
};
use itertools::{iproduct, Either};

/// Brightest gray level.
pub const MAX_LEVEL: u8 = 15;

/// A packed 4-bit grayscale buffer with a drawing surface on top of it.
pub struct FrameBuffer {
    width: u16,
    height: u16,
    buf: Vec<u8>,
}

/// Unwrap the result of drawing into a `FrameBuffer`, which cannot fail.
fn infallible<T>(r: Result<T, Infallible>) -> T {
    match r {
        Ok(v) => v,
        Err(e) => match e {},
    }
}

/// Order in which to visit `len` coordinates when moving pixels by `step`, so that every pixel is
/// read before it is overwritten.
fn traversal(len: i32, step: i32) -> Either<Range<i32>, Rev<Range<i32>>> {
    if step < 0 {
        Either::Left(0..len + step)
    } else {
        Either::Right((step..len).rev())
    }
}

impl FrameBuffer {
    /// Allocate a zeroed buffer of `width * height / 2` bytes. Odd sizes are not rejected; the
    /// length is truncated and pixels falling past the end are dropped.
    pub fn new(width: u16, height: u16) -> Self {
        let len = width as usize * height as usize / 2;
        FrameBuffer {
            width,
            height,
            buf: alloc::vec![0u8; len],
        }
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    /// The packed pixel data, row by row.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Mutable access to the packed pixel data. The length cannot be changed through it.
    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.buf
    }

    /// Byte offset and nibble (`true` for the high nibble) of a pixel, or `None` if the pixel is
    /// outside the buffer.
    fn locate(&self, x: i32, y: i32) -> Option<(usize, bool)> {
        if x < 0 || y < 0 || x >= i32::from(self.width) || y >= i32::from(self.height) {
            return None;
        }
        let offset = (x as usize + y as usize * self.width as usize) >> 1;
        if offset < self.buf.len() {
            Some((offset, x & 1 == 0))
        } else {
            None
        }
    }

    /// Set every pixel to `value` (0-15).
    pub fn fill(&mut self, value: u8) {
        let v = value & 0x0F;
        for byte in self.buf.iter_mut() {
            *byte = v << 4 | v;
        }
    }

    /// Set one pixel to `value` (0-15). Pixels outside the buffer are ignored.
    pub fn set_pixel(&mut self, x: i32, y: i32, value: u8) {
        if let Some((offset, high)) = self.locate(x, y) {
            let byte = &mut self.buf[offset];
            *byte = if high {
                (*byte & 0x0F) | (value << 4 & 0xF0)
            } else {
                (*byte & 0xF0) | (value & 0x0F)
            };
        }
    }

    /// The level of one pixel, or `None` outside the buffer.
    pub fn pixel(&self, x: i32, y: i32) -> Option<u8> {
        self.locate(x, y).map(|(offset, high)| {
            let byte = self.buf[offset];
            if high {
                byte >> 4
            } else {
                byte & 0x0F
            }
        })
    }

    /// Turn fully on or off the whole byte at `width/2*y + x/2`, i.e. both pixels of the pair
    /// containing `(x, y)` when the width is even. Offsets past the end of the buffer are ignored.
    pub fn set_pixel_pair(&mut self, x: u16, y: u16, on: bool) {
        let offset = self.width as usize / 2 * y as usize + x as usize / 2;
        if let Some(byte) = self.buf.get_mut(offset) {
            *byte = if on { 0xFF } else { 0x00 };
        }
    }

    /// Draw a one pixel wide line between two points, both included.
    pub fn draw_line(&mut self, x1: i32, y1: i32, x2: i32, y2: i32, value: u8) {
        infallible(
            Line::new(Point::new(x1, y1), Point::new(x2, y2))
                .into_styled(PrimitiveStyle::with_stroke(Gray4::new(value), 1))
                .draw(self),
        )
    }

    /// Draw `text` with its top-left corner at `(x, y)`, in a 6x10 font. Only the glyph pixels are
    /// touched; the background is left alone.
    pub fn draw_text(&mut self, text: &str, x: i32, y: i32, value: u8) {
        let style = MonoTextStyle::new(&FONT_6X10, Gray4::new(value));
        infallible(Text::with_baseline(text, Point::new(x, y), style, Baseline::Top).draw(self));
    }

    /// Move the image by `dx` pixels right and `dy` pixels down. Pixels uncovered by the move keep
    /// their previous value. Moves of a full width or height or more do nothing.
    pub fn scroll(&mut self, dx: i32, dy: i32) {
        if dx.unsigned_abs() >= u32::from(self.width)
            || dy.unsigned_abs() >= u32::from(self.height)
        {
            return;
        }
        let (width, height) = (i32::from(self.width), i32::from(self.height));
        for (y, x) in iproduct!(traversal(height, dy), traversal(width, dx)) {
            if let Some(value) = self.pixel(x - dx, y - dy) {
                self.set_pixel(x, y, value);
            }
        }
    }
}

impl DrawTarget for FrameBuffer {
    type Color = Gray4;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            self.set_pixel(point.x, point.y, color.luma());
        }
        Ok(())
    }

    fn clear(&mut self, color: Self::Color) -> Result<(), Self::Error> {
        self.fill(color.luma());
        Ok(())
    }
}

impl OriginDimensions for FrameBuffer {
    fn size(&self) -> Size {
        Size::new(u32::from(self.width), u32::from(self.height))
    }
}
