pub mod config;
pub mod frame;

pub use config::{CellGeometry, EncodeConfig, SizeMismatch, StoragePolicy};
pub use frame::{ChannelLayout, Dimensions, Frame, QuantizedCell, RawFrame};
