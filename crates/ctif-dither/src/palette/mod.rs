//! Palette types and palette resolution
//!
//! A palette comes from one of three sources, selected by [`PaletteConfig`]:
//! a built-in table ([`FixedPalette`]), a user supplied list of hex colours,
//! or a k-means reduction of a sample image ([`AdaptivePalette`]).

mod adaptive;
mod config;
mod error;
mod fixed;
mod palette;

pub use adaptive::AdaptivePalette;
pub use config::PaletteConfig;
pub use error::{PaletteError, ParseColorError};
pub use fixed::FixedPalette;
pub use palette::Palette;

/// Largest palette the container format can address with an 8-bit index.
pub const MAX_PALETTE_SIZE: usize = 256;
