//! In-RAM grayscale framebuffer with change tracking.
//!
//! Pages draw into this buffer instead of the panel. A flush sends only the
//! bounding rectangle of pixels that differ from what the panel last
//! accepted, converted to the panel's color type, in a single
//! `fill_contiguous` call. Pages clear before drawing, so a pixel can be
//! written and restored within one frame; such pixels are not sent.

use alloc::vec;
use alloc::vec::Vec;
use core::convert::Infallible;

use embedded_graphics::pixelcolor::Gray4;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use log::debug;

/// Bounding box of pixels written with a new color since the last flush.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct DirtyRect {
    min_x: usize,
    min_y: usize,
    max_x: usize,
    max_y: usize,
}

impl DirtyRect {
    fn from_point(x: usize, y: usize) -> Self {
        Self {
            min_x: x,
            min_y: y,
            max_x: x,
            max_y: y,
        }
    }

    fn expand(&mut self, x: usize, y: usize) {
        self.min_x = self.min_x.min(x);
        self.min_y = self.min_y.min(y);
        self.max_x = self.max_x.max(x);
        self.max_y = self.max_y.max(y);
    }

    fn width(&self) -> usize {
        self.max_x - self.min_x + 1
    }

    fn height(&self) -> usize {
        self.max_y - self.min_y + 1
    }

    fn to_rectangle(self) -> Rectangle {
        Rectangle::new(
            Point::new(self.min_x as i32, self.min_y as i32),
            Size::new(self.width() as u32, self.height() as u32),
        )
    }
}

/// Heap-backed `Gray4` framebuffer implementing `DrawTarget`.
///
/// Starts white, the resting color of the page.
pub struct FrameBuffer {
    width: usize,
    height: usize,
    pixels: Vec<Gray4>,
    /// Panel contents as of the last successful flush
    flushed: Vec<Gray4>,
    /// Candidate region; may include pixels restored to their flushed color
    dirty: Option<DirtyRect>,
}

impl FrameBuffer {
    pub fn new(size: Size) -> Self {
        let width = size.width as usize;
        let height = size.height as usize;
        Self {
            width,
            height,
            pixels: vec![Gray4::WHITE; width * height],
            flushed: vec![Gray4::WHITE; width * height],
            dirty: None,
        }
    }

    /// Pixel at `point`, or `None` outside the buffer
    pub fn pixel(&self, point: Point) -> Option<Gray4> {
        let (x, y) = self.index_of(point)?;
        self.pixels.get(y * self.width + x).copied()
    }

    /// Region that differs from the panel since the last flush
    pub fn dirty_area(&self) -> Option<Rectangle> {
        self.changed_region().map(DirtyRect::to_rectangle)
    }

    /// Shrink the candidate region to the pixels that differ from the
    /// flushed frame.
    fn changed_region(&self) -> Option<DirtyRect> {
        let candidate = self.dirty?;
        let mut region: Option<DirtyRect> = None;
        for y in candidate.min_y..=candidate.max_y {
            let row = y * self.width;
            for x in candidate.min_x..=candidate.max_x {
                if self.pixels[row + x] != self.flushed[row + x] {
                    match &mut region {
                        Some(rect) => rect.expand(x, y),
                        None => region = Some(DirtyRect::from_point(x, y)),
                    }
                }
            }
        }
        region
    }

    fn index_of(&self, point: Point) -> Option<(usize, usize)> {
        let x = usize::try_from(point.x).ok()?;
        let y = usize::try_from(point.y).ok()?;
        (x < self.width && y < self.height).then_some((x, y))
    }

    /// Write one pixel, growing the dirty rect only if the color changed.
    #[inline]
    fn set_pixel(&mut self, x: usize, y: usize, color: Gray4) {
        let idx = y * self.width + x;
        if self.pixels[idx] != color {
            self.pixels[idx] = color;
            match &mut self.dirty {
                Some(rect) => rect.expand(x, y),
                None => self.dirty = Some(DirtyRect::from_point(x, y)),
            }
        }
    }

    /// Send the dirty region to `display`, converting each pixel with
    /// `to_panel`. The dirty state is only reset once the panel accepted the
    /// write. No-op when the frame matches the panel.
    pub fn flush<D, F>(&mut self, display: &mut D, to_panel: F) -> Result<(), D::Error>
    where
        D: DrawTarget,
        F: Fn(Gray4) -> D::Color,
    {
        let Some(rect) = self.changed_region() else {
            self.dirty = None;
            return Ok(());
        };

        let width = rect.width();
        debug!(
            "Flushing {}x{} dirty region at ({}, {})",
            width,
            rect.height(),
            rect.min_x,
            rect.min_y
        );

        let pixels = &self.pixels;
        let stride = self.width;
        let colors = (rect.min_y..=rect.max_y).flat_map(move |y| {
            let row_start = y * stride + rect.min_x;
            pixels[row_start..row_start + width].iter().copied()
        });

        display.fill_contiguous(&rect.to_rectangle(), colors.map(to_panel))?;

        for y in rect.min_y..=rect.max_y {
            let row_start = y * stride + rect.min_x;
            let row = row_start..row_start + width;
            self.flushed[row.clone()].copy_from_slice(&self.pixels[row]);
        }
        self.dirty = None;
        Ok(())
    }
}

impl OriginDimensions for FrameBuffer {
    fn size(&self) -> Size {
        Size::new(self.width as u32, self.height as u32)
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
            if let Some((x, y)) = self.index_of(point) {
                self.set_pixel(x, y, color);
            }
        }
        Ok(())
    }

    fn fill_contiguous<I>(&mut self, area: &Rectangle, colors: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Self::Color>,
    {
        for (point, color) in area.points().zip(colors) {
            if let Some((x, y)) = self.index_of(point) {
                self.set_pixel(x, y, color);
            }
        }
        Ok(())
    }

    fn fill_solid(&mut self, area: &Rectangle, color: Self::Color) -> Result<(), Self::Error> {
        let visible = area.intersection(&self.bounding_box());
        let Some(bottom_right) = visible.bottom_right() else {
            return Ok(());
        };

        for y in visible.top_left.y as usize..=bottom_right.y as usize {
            for x in visible.top_left.x as usize..=bottom_right.x as usize {
                self.set_pixel(x, y, color);
            }
        }
        Ok(())
    }

    fn clear(&mut self, color: Self::Color) -> Result<(), Self::Error> {
        for y in 0..self.height {
            for x in 0..self.width {
                self.set_pixel(x, y, color);
            }
        }
        Ok(())
    }
}
