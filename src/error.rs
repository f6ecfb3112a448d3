use std::path::PathBuf;

use ctif_dither::{PaletteError, ParseColorError, MAX_PALETTE_SIZE};
use thiserror::Error;

use crate::models::{CellGeometry, Dimensions};

pub type Result<T, E = CtifError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum CtifError {
    #[error("Invalid palette size {requested} (must be 1..={max})")]
    InvalidPaletteSize { requested: usize, max: usize },

    #[error("Palette table of {len} bytes is not a whole number of [r, g, b] entries")]
    InvalidPaletteTable { len: usize },

    #[error("Cannot read palette file {}: {reason}", path.display())]
    PaletteFile { path: PathBuf, reason: String },

    #[error("Invalid color: {0}")]
    InvalidColor(#[from] ParseColorError),

    #[error("Unsupported geometry {width}x{height} with {cell} cells: {reason}")]
    UnsupportedGeometry {
        width: usize,
        height: usize,
        cell: CellGeometry,
        reason: String,
    },

    #[error("Input sequence contains no frames")]
    EmptyInputSequence,

    #[error("Frame {index} is malformed: expected {expected} bytes, got {actual}")]
    MalformedFrame {
        index: usize,
        expected: usize,
        actual: usize,
    },

    #[error("Frame {index} is {actual}, expected {expected}")]
    FrameDimensionMismatch {
        index: usize,
        expected: Dimensions,
        actual: Dimensions,
    },

    #[error("Encode aborted: frame {index} failed earlier")]
    SessionAborted { index: usize },

    #[error("Corrupt container at byte {offset}: {reason}")]
    CorruptContainer { offset: usize, reason: String },

    #[error("Config error: {0}")]
    Config(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CtifError {
    pub(crate) fn corrupt(offset: usize, reason: impl Into<String>) -> Self {
        CtifError::CorruptContainer {
            offset,
            reason: reason.into(),
        }
    }

    /// Shift the offset of a `CorruptContainer` error by `base` bytes.
    pub(crate) fn rebase(self, base: usize) -> Self {
        match self {
            CtifError::CorruptContainer { offset, reason } => CtifError::CorruptContainer {
                offset: base + offset,
                reason,
            },
            other => other,
        }
    }
}

impl From<PaletteError> for CtifError {
    fn from(e: PaletteError) -> Self {
        match e {
            PaletteError::InvalidPaletteSize { requested } => CtifError::InvalidPaletteSize {
                requested,
                max: MAX_PALETTE_SIZE,
            },
            PaletteError::ParseColor { source, .. } => CtifError::InvalidColor(source),
            PaletteError::EmptySample => CtifError::EmptyInputSequence,
            PaletteError::TableLength { len } => CtifError::InvalidPaletteTable { len },
            PaletteError::AdaptiveExceedsBase { adaptive, base } => CtifError::InvalidPaletteSize {
                requested: adaptive,
                max: base,
            },
            PaletteError::ReadFile { path, reason } => CtifError::PaletteFile { path, reason },
        }
    }
}
