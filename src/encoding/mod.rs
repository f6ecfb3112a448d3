//! Frame encoding: dithered pixels to cells, cells to packed bytes.
//!
//! A frame payload is the cell grid in raster order, each cell a
//! fixed-width bit record:
//!
//! ```text
//! single: [index]                 index_bits
//! dual:   [bg][fg][glyph]         2 * index_bits + cell_w * cell_h
//! ```
//!
//! `index_bits` is `ceil(log2(palette_len))`, so a one-colour palette needs
//! no index bits at all. Records are packed MSB-first without alignment;
//! only the end of the payload is padded to a whole byte.

mod bits;
mod cell;

pub use bits::{BitReader, BitWriter};

use std::sync::Arc;

use ctif_dither::{DistanceMetric, Palette, QuantizedImage, Rgb};
use rayon::prelude::*;

use crate::error::{CtifError, Result};
use crate::models::{CellGeometry, Frame, QuantizedCell};

/// Bits needed to address every entry of a palette with `len` colours.
pub fn index_bits(len: usize) -> u32 {
    if len <= 1 {
        0
    } else {
        usize::BITS - (len - 1).leading_zeros()
    }
}

/// Turns dithered images into cell grids and cell grids into bytes.
#[derive(Debug, Clone)]
pub struct FrameEncoder {
    palette: Arc<Palette>,
    geometry: CellGeometry,
    metric: DistanceMetric,
    index_bits: u32,
}

impl FrameEncoder {
    /// # Errors
    ///
    /// [`CtifError::UnsupportedGeometry`] when a dual cell covers zero or
    /// more than eight sub-pixels.
    pub fn new(palette: Arc<Palette>, geometry: CellGeometry) -> Result<Self> {
        geometry
            .check()
            .map_err(|reason| CtifError::UnsupportedGeometry {
                width: geometry.width(),
                height: geometry.height(),
                cell: geometry,
                reason,
            })?;

        let index_bits = index_bits(palette.len());
        Ok(Self {
            palette,
            geometry,
            metric: DistanceMetric::default(),
            index_bits,
        })
    }

    /// Distance used when fitting dual cells.
    pub fn metric(mut self, metric: DistanceMetric) -> Self {
        self.metric = metric;
        self
    }

    pub fn palette(&self) -> &Arc<Palette> {
        &self.palette
    }

    pub fn geometry(&self) -> CellGeometry {
        self.geometry
    }

    pub fn index_bits(&self) -> u32 {
        self.index_bits
    }

    /// Bits per cell record.
    pub fn record_bits(&self) -> usize {
        let ib = self.index_bits as usize;
        match self.geometry {
            CellGeometry::Single => ib,
            CellGeometry::Dual { width, height } => 2 * ib + width as usize * height as usize,
        }
    }

    /// Payload size in bytes for a `cols x rows` grid.
    pub fn payload_len(&self, cols: usize, rows: usize) -> usize {
        (cols * rows * self.record_bits()).div_ceil(8)
    }

    /// Group a dithered image into cells.
    ///
    /// `source` holds the undithered pixels `image` was made from; dual
    /// cells pick their colour pair against it. Image dimensions must be
    /// multiples of the cell size. Cell rows are fitted in parallel and
    /// collected in order.
    pub fn quantize_cells(&self, image: &QuantizedImage, source: &[Rgb]) -> Result<Frame> {
        let (cw, ch) = (self.geometry.width(), self.geometry.height());
        let unsupported = |reason: String| CtifError::UnsupportedGeometry {
            width: image.width(),
            height: image.height(),
            cell: self.geometry,
            reason,
        };
        if image.width() % cw != 0 || image.height() % ch != 0 {
            return Err(unsupported(
                "image size is not a multiple of the cell size".to_string(),
            ));
        }
        if source.len() != image.width() * image.height() {
            return Err(unsupported(format!(
                "source has {} pixels, image has {}",
                source.len(),
                image.width() * image.height()
            )));
        }

        let cols = image.width() / cw;
        let rows = image.height() / ch;

        let cells: Vec<QuantizedCell> = match self.geometry {
            CellGeometry::Single => image
                .indices()
                .iter()
                .map(|&i| QuantizedCell::Single(i))
                .collect(),
            CellGeometry::Dual { .. } => {
                let grid: Vec<Vec<QuantizedCell>> = (0..rows)
                    .into_par_iter()
                    .map(|row| {
                        (0..cols)
                            .map(|col| self.fit_cell(image, source, col * cw, row * ch))
                            .collect()
                    })
                    .collect();
                grid.into_iter().flatten().collect()
            }
        };

        Ok(Frame {
            cols,
            rows,
            cells,
            palette: Arc::clone(&self.palette),
            geometry: self.geometry,
        })
    }

    fn fit_cell(&self, image: &QuantizedImage, source: &[Rgb], x0: usize, y0: usize) -> QuantizedCell {
        let (cw, ch) = (self.geometry.width(), self.geometry.height());
        let mut pixels = Vec::with_capacity(cw * ch);
        let mut indices = Vec::with_capacity(cw * ch);
        let mut effective = Vec::with_capacity(cw * ch);
        for y in y0..y0 + ch {
            for x in x0..x0 + cw {
                pixels.push(source[y * image.width() + x].to_f32());
                indices.push(image.index_at(x, y));
                effective.push(image.effective_at(x, y));
            }
        }
        cell::fit_dual(&pixels, &effective, &indices, &self.palette, self.metric)
    }

    /// Pack a frame's cells into payload bytes.
    pub fn encode(&self, frame: &Frame) -> Vec<u8> {
        let ib = self.index_bits;
        let mut writer = BitWriter::with_capacity(frame.cells.len() * self.record_bits());
        let glyph_bits = (self.geometry.width() * self.geometry.height()) as u32;

        for cell in &frame.cells {
            match *cell {
                QuantizedCell::Single(index) => writer.write(index as u32, ib),
                QuantizedCell::Dual { bg, fg, glyph } => {
                    writer.write(bg as u32, ib);
                    writer.write(fg as u32, ib);
                    writer.write(glyph as u32, glyph_bits);
                }
            }
        }
        writer.finish()
    }

    /// Unpack a payload produced by [`encode`](Self::encode).
    ///
    /// # Errors
    ///
    /// [`CtifError::CorruptContainer`] (offsets relative to `bytes`) when
    /// the payload has the wrong length or references a palette index that
    /// does not exist.
    pub fn decode(&self, bytes: &[u8], cols: usize, rows: usize) -> Result<Vec<QuantizedCell>> {
        let expected = self.payload_len(cols, rows);
        if bytes.len() != expected {
            return Err(CtifError::corrupt(
                0,
                format!(
                    "frame payload is {} bytes, expected {expected}",
                    bytes.len()
                ),
            ));
        }

        let ib = self.index_bits;
        let glyph_bits = (self.geometry.width() * self.geometry.height()) as u32;
        let mut reader = BitReader::new(bytes);
        let mut cells = Vec::with_capacity(cols * rows);

        for _ in 0..cols * rows {
            let offset = reader.position() / 8;
            let mut index = || -> Result<u8> {
                let value = reader
                    .read(ib)
                    .ok_or_else(|| CtifError::corrupt(offset, "frame payload truncated"))?;
                if value as usize >= self.palette.len() {
                    return Err(CtifError::corrupt(
                        offset,
                        format!("palette index {value} out of range"),
                    ));
                }
                Ok(value as u8)
            };

            let cell = match self.geometry {
                CellGeometry::Single => QuantizedCell::Single(index()?),
                CellGeometry::Dual { .. } => {
                    let bg = index()?;
                    let fg = index()?;
                    let glyph = reader
                        .read(glyph_bits)
                        .ok_or_else(|| CtifError::corrupt(offset, "frame payload truncated"))?;
                    QuantizedCell::Dual {
                        bg,
                        fg,
                        glyph: glyph as u8,
                    }
                }
            };
            cells.push(cell);
        }
        Ok(cells)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn palette(n: usize) -> Arc<Palette> {
        let colors: Vec<Rgb> = (0..n).map(|i| Rgb::new(i as u8, i as u8, i as u8)).collect();
        Arc::new(Palette::new(&colors).unwrap())
    }

    /// Source pixels for an image that was not dithered.
    fn undithered(image: &QuantizedImage) -> Vec<Rgb> {
        image.effective().iter().map(|&c| Rgb::from_f32(c)).collect()
    }

    #[test]
    fn test_index_bits() {
        assert_eq!(index_bits(1), 0);
        assert_eq!(index_bits(2), 1);
        assert_eq!(index_bits(3), 2);
        assert_eq!(index_bits(4), 2);
        assert_eq!(index_bits(5), 3);
        assert_eq!(index_bits(16), 4);
        assert_eq!(index_bits(17), 5);
        assert_eq!(index_bits(256), 8);
    }

    #[test]
    fn test_rejects_oversized_dual_cell() {
        let result = FrameEncoder::new(palette(2), CellGeometry::Dual { width: 3, height: 3 });
        assert!(matches!(result, Err(CtifError::UnsupportedGeometry { .. })));
    }

    #[test]
    fn test_single_cells_pack_tightly() {
        let encoder = FrameEncoder::new(palette(4), CellGeometry::Single).unwrap();
        let image = QuantizedImage::new(vec![3, 0, 1, 2, 3], vec![[0.0; 3]; 5], 5, 1);
        let frame = encoder.quantize_cells(&image, &undithered(&image)).unwrap();
        // 2 bits each: 11 00 01 10 | 11 000000
        assert_eq!(encoder.encode(&frame), vec![0b1100_0110, 0b1100_0000]);
    }

    #[test]
    fn test_one_color_palette_has_empty_single_payload() {
        let encoder = FrameEncoder::new(palette(1), CellGeometry::Single).unwrap();
        let image = QuantizedImage::new(vec![0; 6], vec![[0.0; 3]; 6], 3, 2);
        let frame = encoder.quantize_cells(&image, &undithered(&image)).unwrap();
        assert!(encoder.encode(&frame).is_empty());
        assert_eq!(encoder.decode(&[], 3, 2).unwrap(), vec![QuantizedCell::Single(0); 6]);
    }

    #[test]
    fn test_dual_record_layout() {
        let pal = Arc::new(Palette::new(&[Rgb::BLACK, Rgb::WHITE]).unwrap());
        let encoder = FrameEncoder::new(pal, CellGeometry::Dual { width: 2, height: 2 }).unwrap();
        let image = QuantizedImage::new(
            vec![1, 0, 0, 0],
            vec![[255.0; 3], [0.0; 3], [0.0; 3], [0.0; 3]],
            2,
            2,
        );
        let frame = encoder.quantize_cells(&image, &undithered(&image)).unwrap();
        assert_eq!(frame.cells, vec![QuantizedCell::Dual { bg: 0, fg: 1, glyph: 0b1000 }]);
        // bg=0, fg=1, glyph=1000 -> 0 1 1000 + 2 padding bits
        assert_eq!(encoder.encode(&frame), vec![0b0110_0000]);
    }

    #[test]
    fn test_dual_cells_in_raster_order() {
        let pal = Arc::new(Palette::new(&[Rgb::BLACK, Rgb::WHITE]).unwrap());
        let encoder = FrameEncoder::new(pal, CellGeometry::Dual { width: 1, height: 2 }).unwrap();
        // 2x4 image -> 2x2 cells
        let indices = vec![1, 0, 1, 0, 0, 0, 0, 1];
        let effective = indices.iter().map(|&i| [i as f32 * 255.0; 3]).collect();
        let image = QuantizedImage::new(indices, effective, 2, 4);
        let frame = encoder.quantize_cells(&image, &undithered(&image)).unwrap();
        assert_eq!((frame.cols, frame.rows), (2, 2));
        assert_eq!(frame.cell(0, 0), QuantizedCell::Dual { bg: 1, fg: 1, glyph: 0 });
        assert_eq!(frame.cell(1, 0), QuantizedCell::Dual { bg: 0, fg: 0, glyph: 0 });
        assert_eq!(frame.cell(1, 1), QuantizedCell::Dual { bg: 0, fg: 1, glyph: 0b01 });

        let bytes = encoder.encode(&frame);
        assert_eq!(encoder.decode(&bytes, 2, 2).unwrap(), frame.cells);
    }

    #[test]
    fn test_image_not_multiple_of_cell() {
        let encoder = FrameEncoder::new(palette(2), CellGeometry::Dual { width: 2, height: 4 }).unwrap();
        let image = QuantizedImage::new(vec![0; 12], vec![[0.0; 3]; 12], 3, 4);
        assert!(matches!(
            encoder.quantize_cells(&image, &undithered(&image)),
            Err(CtifError::UnsupportedGeometry { width: 3, height: 4, .. })
        ));
    }

    #[test]
    fn test_dual_pair_follows_source_not_dither() {
        let pal = Arc::new(Palette::from_hex(&["#000", "#555", "#aaa", "#fff"]).unwrap());
        let encoder = FrameEncoder::new(pal, CellGeometry::Dual { width: 2, height: 1 }).unwrap();
        // Dithered to black and white, but the source is two light greys.
        let image = QuantizedImage::new(vec![0, 3], vec![[0.0; 3], [255.0; 3]], 2, 1);
        let source = [Rgb::new(0xaa, 0xaa, 0xaa), Rgb::new(0xee, 0xee, 0xee)];
        let frame = encoder.quantize_cells(&image, &source).unwrap();
        assert_eq!(frame.cells, vec![QuantizedCell::Dual { bg: 2, fg: 3, glyph: 0b01 }]);
    }

    #[test]
    fn test_source_length_must_match_image() {
        let encoder = FrameEncoder::new(palette(2), CellGeometry::Single).unwrap();
        let image = QuantizedImage::new(vec![0; 4], vec![[0.0; 3]; 4], 2, 2);
        assert!(matches!(
            encoder.quantize_cells(&image, &[Rgb::BLACK; 3]),
            Err(CtifError::UnsupportedGeometry { width: 2, height: 2, .. })
        ));
    }

    #[test]
    fn test_decode_rejects_bad_length() {
        let encoder = FrameEncoder::new(palette(4), CellGeometry::Single).unwrap();
        let result = encoder.decode(&[0, 0], 2, 2);
        assert!(matches!(result, Err(CtifError::CorruptContainer { offset: 0, .. })));
    }

    #[test]
    fn test_decode_rejects_index_out_of_range() {
        // 3 colours use 2 bits, so index 3 is representable but invalid
        let encoder = FrameEncoder::new(palette(3), CellGeometry::Single).unwrap();
        let result = encoder.decode(&[0b0011_0000], 3, 1);
        match result {
            Err(CtifError::CorruptContainer { reason, .. }) => {
                assert_eq!(reason, "palette index 3 out of range");
            }
            other => panic!("Expected CorruptContainer, got {other:?}"),
        }
    }
}
