//! The CTIF container: header, palette table and frame records.
//!
//! All multi-byte integers are little endian.
//!
//! ```text
//! "CTIF"                 magic
//! version        u8      = 1
//! width, height  u16 x2  pixels, multiples of the cell size
//! cell_w, cell_h u8 x2
//! cell_mode      u8      0 single, 1 dual
//! palette_size   u16     1..=256
//! palette        [r g b] x palette_size
//! frame_count    u32     written when the container is finalized
//! frames         [flags u8][length u32][payload] x frame_count
//! ```
//!
//! Frame flags: bit 0 marks an XOR delta against the previous frame's raw
//! payload, bit 1 marks run-length coding (see [`rle`]). The first frame is
//! never a delta.

mod reader;
pub mod rle;
mod writer;

pub use reader::ContainerReader;
pub use writer::ContainerWriter;

use std::sync::Arc;

use ctif_dither::Palette;

use crate::models::{CellGeometry, Frame, QuantizedCell};

pub const MAGIC: &[u8; 4] = b"CTIF";
pub const VERSION: u8 = 1;

pub(crate) const FLAG_DELTA: u8 = 0b01;
pub(crate) const FLAG_RLE: u8 = 0b10;

/// Stream-level metadata written once at the start of a container.
#[derive(Debug, Clone, PartialEq)]
pub struct Header {
    pub width: u16,
    pub height: u16,
    pub geometry: CellGeometry,
    pub palette: Arc<Palette>,
}

impl Header {
    pub fn cols(&self) -> usize {
        self.width as usize / self.geometry.width()
    }

    pub fn rows(&self) -> usize {
        self.height as usize / self.geometry.height()
    }
}

/// How one frame's payload is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameStorage {
    Raw,
    Rle,
    /// XOR against the previous raw payload, stored verbatim
    Delta,
    /// XOR against the previous raw payload, then run-length coded
    DeltaRle,
}

impl FrameStorage {
    pub fn flags(self) -> u8 {
        match self {
            FrameStorage::Raw => 0,
            FrameStorage::Rle => FLAG_RLE,
            FrameStorage::Delta => FLAG_DELTA,
            FrameStorage::DeltaRle => FLAG_DELTA | FLAG_RLE,
        }
    }

    /// `None` when reserved bits are set.
    pub fn from_flags(flags: u8) -> Option<Self> {
        match flags {
            0 => Some(FrameStorage::Raw),
            FLAG_RLE => Some(FrameStorage::Rle),
            FLAG_DELTA => Some(FrameStorage::Delta),
            f if f == FLAG_DELTA | FLAG_RLE => Some(FrameStorage::DeltaRle),
            _ => None,
        }
    }

    pub fn is_delta(self) -> bool {
        self.flags() & FLAG_DELTA != 0
    }

    pub fn is_rle(self) -> bool {
        self.flags() & FLAG_RLE != 0
    }
}

/// XOR `payload` against `previous`, byte by byte.
pub(crate) fn xor_delta(payload: &[u8], previous: &[u8]) -> Vec<u8> {
    payload.iter().zip(previous).map(|(a, b)| a ^ b).collect()
}

/// One decoded frame record.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameRecord {
    pub storage: FrameStorage,
    /// Stored size in bytes, excluding the record header
    pub stored_len: usize,
    pub cells: Vec<QuantizedCell>,
}

/// A fully parsed container.
#[derive(Debug, Clone, PartialEq)]
pub struct Container {
    pub header: Header,
    pub frames: Vec<FrameRecord>,
}

impl Container {
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Rebuild frame `index` as a [`Frame`], e.g. for previews.
    pub fn frame(&self, index: usize) -> Option<Frame> {
        self.frames.get(index).map(|record| Frame {
            cols: self.header.cols(),
            rows: self.header.rows(),
            cells: record.cells.clone(),
            palette: Arc::clone(&self.header.palette),
            geometry: self.header.geometry,
        })
    }
}
