//! CTIF - palette-constrained image and video encoding
//!
//! Converts raw RGB(A) frames into the CTIF container: a small fixed
//! palette, a grid of single- or dual-colour cells, and per-frame records
//! that may be run-length coded or stored as XOR deltas.
//!
//! Decoding source media is left to the caller; this library starts at
//! [`RawFrame`] buffers.
//!
//! ```
//! use ctif::{EncodeConfig, Pipeline, RawFrame};
//!
//! let pipeline = Pipeline::new(EncodeConfig::default()).unwrap();
//! let frame = RawFrame::rgb(4, 2, vec![200; 4 * 2 * 3]);
//! let bytes = pipeline.encode(vec![frame]).unwrap();
//! assert_eq!(&bytes[..4], b"CTIF");
//! ```

pub mod container;
pub mod encoding;
pub mod error;
pub mod models;
pub mod pipeline;

pub use container::{Container, ContainerReader, ContainerWriter, FrameRecord, FrameStorage, Header};
pub use encoding::FrameEncoder;
pub use error::{CtifError, Result};
pub use models::{
    CellGeometry, ChannelLayout, Dimensions, EncodeConfig, Frame, QuantizedCell, RawFrame,
    SizeMismatch, StoragePolicy,
};
pub use pipeline::{EncodeSession, Pipeline};
