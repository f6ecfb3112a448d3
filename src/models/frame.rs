use std::fmt;
use std::sync::Arc;

use ctif_dither::{Palette, Rgb};

use super::CellGeometry;
use crate::error::{CtifError, Result};

/// Pixel dimensions of a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: usize,
    pub height: usize,
}

impl Dimensions {
    pub const fn new(width: usize, height: usize) -> Self {
        Self { width, height }
    }

    pub fn pixels(self) -> usize {
        self.width * self.height
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Byte layout of a raw frame buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelLayout {
    Rgb,
    /// Alpha is composited over black when the frame is read.
    Rgba,
}

impl ChannelLayout {
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            ChannelLayout::Rgb => 3,
            ChannelLayout::Rgba => 4,
        }
    }
}

/// A decoded input frame as delivered by an image or video decoder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFrame {
    pub width: usize,
    pub height: usize,
    pub layout: ChannelLayout,
    pub data: Vec<u8>,
}

impl RawFrame {
    pub fn new(width: usize, height: usize, layout: ChannelLayout, data: Vec<u8>) -> Self {
        Self {
            width,
            height,
            layout,
            data,
        }
    }

    pub fn rgb(width: usize, height: usize, data: Vec<u8>) -> Self {
        Self::new(width, height, ChannelLayout::Rgb, data)
    }

    pub fn rgba(width: usize, height: usize, data: Vec<u8>) -> Self {
        Self::new(width, height, ChannelLayout::Rgba, data)
    }

    /// Build an RGB frame from pixels in row-major order.
    pub fn from_pixels(width: usize, height: usize, pixels: &[Rgb]) -> Self {
        Self::rgb(width, height, pixels.iter().flat_map(|p| p.to_bytes()).collect())
    }

    pub fn dimensions(&self) -> Dimensions {
        Dimensions::new(self.width, self.height)
    }

    /// Buffer length implied by the dimensions and layout.
    pub fn expected_len(&self) -> usize {
        self.width * self.height * self.layout.bytes_per_pixel()
    }

    /// Decode the buffer into pixels, compositing alpha over black.
    ///
    /// `index` is the frame's position in the input, used for errors.
    pub fn pixels(&self, index: usize) -> Result<Vec<Rgb>> {
        let expected = self.expected_len();
        if self.data.len() != expected {
            return Err(CtifError::MalformedFrame {
                index,
                expected,
                actual: self.data.len(),
            });
        }

        let pixels = match self.layout {
            ChannelLayout::Rgb => self
                .data
                .chunks_exact(3)
                .map(|c| Rgb::new(c[0], c[1], c[2]))
                .collect(),
            ChannelLayout::Rgba => self
                .data
                .chunks_exact(4)
                .map(|c| Rgb::from_rgba([c[0], c[1], c[2], c[3]]))
                .collect(),
        };
        Ok(pixels)
    }
}

/// One encoded display cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantizedCell {
    Single(u8),
    /// Glyph bits select `fg` (set) or `bg` (clear) per sub-pixel, first
    /// sub-pixel in the most significant used bit.
    Dual { bg: u8, fg: u8, glyph: u8 },
}

/// A frame quantized onto a cell grid.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub cols: usize,
    pub rows: usize,
    pub cells: Vec<QuantizedCell>,
    pub palette: Arc<Palette>,
    pub geometry: CellGeometry,
}

impl Frame {
    #[inline]
    pub fn cell(&self, col: usize, row: usize) -> QuantizedCell {
        self.cells[row * self.cols + col]
    }

    /// Pixel dimensions covered by the grid.
    pub fn dimensions(&self) -> Dimensions {
        Dimensions::new(
            self.cols * self.geometry.width(),
            self.rows * self.geometry.height(),
        )
    }

    /// Palette index shown at pixel `(x, y)`.
    pub fn index_at(&self, x: usize, y: usize) -> u8 {
        let (cw, ch) = (self.geometry.width(), self.geometry.height());
        match self.cell(x / cw, y / ch) {
            QuantizedCell::Single(index) => index,
            QuantizedCell::Dual { bg, fg, glyph } => {
                let sub = (y % ch) * cw + x % cw;
                let bit = cw * ch - 1 - sub;
                if (glyph >> bit) & 1 == 1 {
                    fg
                } else {
                    bg
                }
            }
        }
    }

    /// Render the frame as packed RGB bytes, as a display would show it.
    pub fn to_rgb(&self) -> Vec<u8> {
        let dims = self.dimensions();
        let mut out = Vec::with_capacity(dims.pixels() * 3);
        for y in 0..dims.height {
            for x in 0..dims.width {
                let color = self.palette.color(self.index_at(x, y) as usize);
                out.extend_from_slice(&color.to_bytes());
            }
        }
        out
    }
}
