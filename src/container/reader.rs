use std::io::{self, Cursor, Read};
use std::sync::Arc;

use byteorder::{LittleEndian, ReadBytesExt};
use ctif_dither::{Palette, Rgb, MAX_PALETTE_SIZE};

use super::{rle, xor_delta, Container, FrameRecord, FrameStorage, Header, MAGIC, VERSION};
use crate::encoding::FrameEncoder;
use crate::error::{CtifError, Result};
use crate::models::CellGeometry;

/// Parses and validates complete containers.
pub struct ContainerReader;

impl ContainerReader {
    /// Read a whole container from `source`.
    pub fn read<R: Read>(mut source: R) -> Result<Container> {
        let mut bytes = Vec::new();
        source.read_to_end(&mut bytes)?;
        Self::parse(&bytes)
    }

    /// Parse a container held in memory.
    ///
    /// Every structural inconsistency is reported as
    /// [`CtifError::CorruptContainer`] with the offset where it was found.
    pub fn parse(bytes: &[u8]) -> Result<Container> {
        let mut cursor = Cursor::new(bytes);

        if cursor.slice(4)? != MAGIC {
            return Err(CtifError::corrupt(0, "bad magic"));
        }
        let version = cursor.field(1, |c| c.read_u8())?;
        if version != VERSION {
            return Err(CtifError::corrupt(4, format!("unsupported version {version}")));
        }

        let dims_offset = cursor.offset();
        let width = cursor.field(2, |c| c.read_u16::<LittleEndian>())?;
        let height = cursor.field(2, |c| c.read_u16::<LittleEndian>())?;
        let cell_offset = cursor.offset();
        let cell_w = cursor.field(1, |c| c.read_u8())?;
        let cell_h = cursor.field(1, |c| c.read_u8())?;
        let geometry = match cursor.field(1, |c| c.read_u8())? {
            0 if cell_w == 1 && cell_h == 1 => CellGeometry::Single,
            0 => return Err(CtifError::corrupt(cell_offset, "single cells must be 1x1")),
            1 => CellGeometry::Dual {
                width: cell_w,
                height: cell_h,
            },
            mode => return Err(CtifError::corrupt(cell_offset + 2, format!("unknown cell mode {mode}"))),
        };
        geometry.check().map_err(|reason| CtifError::corrupt(cell_offset, reason))?;

        if width == 0
            || height == 0
            || width as usize % geometry.width() != 0
            || height as usize % geometry.height() != 0
        {
            return Err(CtifError::corrupt(
                dims_offset,
                format!("dimensions {width}x{height} do not fit {geometry} cells"),
            ));
        }

        let palette_offset = cursor.offset();
        let palette_size = cursor.field(2, |c| c.read_u16::<LittleEndian>())? as usize;
        if palette_size == 0 || palette_size > MAX_PALETTE_SIZE {
            return Err(CtifError::corrupt(
                palette_offset,
                format!("invalid palette size {palette_size}"),
            ));
        }
        let colors: Vec<Rgb> = cursor
            .slice(palette_size * 3)?
            .chunks_exact(3)
            .map(|c| Rgb::new(c[0], c[1], c[2]))
            .collect();
        let palette = Arc::new(Palette::new(&colors).map_err(|e| CtifError::corrupt(palette_offset, e.to_string()))?);

        let header = Header {
            width,
            height,
            geometry,
            palette: Arc::clone(&palette),
        };
        let encoder = FrameEncoder::new(palette, geometry)?;
        let (cols, rows) = (header.cols(), header.rows());
        let raw_len = encoder.payload_len(cols, rows);

        let frame_count = cursor.field(4, |c| c.read_u32::<LittleEndian>())? as usize;
        let mut frames = Vec::new();
        let mut previous: Option<Vec<u8>> = None;

        for index in 0..frame_count {
            if cursor.bytes_left() == 0 {
                return Err(CtifError::corrupt(
                    cursor.offset(),
                    format!("frame count says {frame_count} but only {index} frames present"),
                ));
            }

            let record_offset = cursor.offset();
            let flags = cursor.field(1, |c| c.read_u8())?;
            let storage = FrameStorage::from_flags(flags)
                .ok_or_else(|| CtifError::corrupt(record_offset, format!("reserved frame flags {flags:#04x}")))?;
            let stored_len = cursor.field(4, |c| c.read_u32::<LittleEndian>())? as usize;
            let payload_offset = cursor.offset();
            let stored = cursor.slice(stored_len)?;

            let expanded = if storage.is_rle() {
                rle::decode(stored, raw_len).map_err(|e| e.rebase(payload_offset))?
            } else {
                stored.to_vec()
            };
            if expanded.len() != raw_len {
                return Err(CtifError::corrupt(
                    payload_offset,
                    format!("frame payload is {} bytes, expected {raw_len}", expanded.len()),
                ));
            }

            let raw = if storage.is_delta() {
                match &previous {
                    Some(prev) => xor_delta(&expanded, prev),
                    None => return Err(CtifError::corrupt(record_offset, "first frame is a delta")),
                }
            } else {
                expanded
            };

            let cells = encoder
                .decode(&raw, cols, rows)
                .map_err(|e| e.rebase(payload_offset))?;

            frames.push(FrameRecord {
                storage,
                stored_len,
                cells,
            });
            previous = Some(raw);
        }

        if cursor.bytes_left() != 0 {
            return Err(CtifError::corrupt(
                cursor.offset(),
                format!("{} trailing bytes after last frame", cursor.bytes_left()),
            ));
        }

        tracing::debug!(
            width,
            height,
            frames = frames.len(),
            "Parsed container"
        );

        Ok(Container { header, frames })
    }
}

/// Offset-aware reads over an in-memory container.
///
/// A short read becomes [`CtifError::CorruptContainer`] at the offset of
/// the field that did not fit.
trait FieldReadExt<'a> {
    fn offset(&self) -> usize;

    fn bytes_left(&self) -> usize;

    /// Borrow the next `len` bytes.
    fn slice(&mut self, len: usize) -> Result<&'a [u8]>;

    /// Run a `len`-byte [`ReadBytesExt`] read.
    fn field<T>(&mut self, len: usize, read: impl FnOnce(&mut Self) -> io::Result<T>) -> Result<T>;
}

impl<'a> FieldReadExt<'a> for Cursor<&'a [u8]> {
    fn offset(&self) -> usize {
        self.position() as usize
    }

    fn bytes_left(&self) -> usize {
        self.get_ref().len().saturating_sub(self.offset())
    }

    fn slice(&mut self, len: usize) -> Result<&'a [u8]> {
        let (start, left) = (self.offset(), self.bytes_left());
        if left < len {
            return Err(truncated(start, len, left));
        }
        let bytes: &'a [u8] = *self.get_ref();
        self.set_position((start + len) as u64);
        Ok(&bytes[start..start + len])
    }

    fn field<T>(&mut self, len: usize, read: impl FnOnce(&mut Self) -> io::Result<T>) -> Result<T> {
        let (start, left) = (self.offset(), self.bytes_left());
        read(self).map_err(|err| match err.kind() {
            io::ErrorKind::UnexpectedEof => truncated(start, len, left),
            _ => err.into(),
        })
    }
}

fn truncated(offset: usize, needed: usize, left: usize) -> CtifError {
    CtifError::corrupt(offset, format!("truncated: needed {needed} bytes, {left} left"))
}
