//! Error types for colour parsing and palette construction.

use std::num::ParseIntError;
use std::path::PathBuf;

use thiserror::Error;

use super::MAX_PALETTE_SIZE;

/// Error returned when a hex colour string cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseColorError {
    /// Hex string length (after stripping `#`) is not 3 or 6
    #[error("invalid hex color length {0} (expected 3 or 6 characters)")]
    InvalidLength(usize),

    #[error("invalid hex character: {0}")]
    InvalidHex(#[from] ParseIntError),
}

/// Error returned when a palette cannot be built.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PaletteError {
    /// Requested palette size is 0 or above [`MAX_PALETTE_SIZE`]
    #[error("invalid palette size {requested} (must be 1..={})", MAX_PALETTE_SIZE)]
    InvalidPaletteSize { requested: usize },

    /// Adaptive palette requested from a sample with no pixels
    #[error("cannot compute an adaptive palette from an empty sample")]
    EmptySample,

    #[error("invalid color at index {index}: {source}")]
    ParseColor {
        index: usize,
        #[source]
        source: ParseColorError,
    },

    /// Raw `[r, g, b]` palette table whose length is not a whole number
    /// of entries
    #[error("palette table of {len} bytes is not a multiple of 3")]
    TableLength { len: usize },

    #[error("{adaptive} adaptive entries do not fit a base palette of {base}")]
    AdaptiveExceedsBase { adaptive: usize, base: usize },

    #[error("cannot read palette file {}: {reason}", path.display())]
    ReadFile { path: PathBuf, reason: String },
}
