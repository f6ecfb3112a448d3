//! ctif-dither: palette resolution, quantization and dithering for
//! constrained-palette displays
//!
//! This crate turns full-colour pixels into indices into a small palette.
//! It knows nothing about cells, frames or containers; those live in the
//! `ctif` crate on top of it.
//!
//! # Quick Start
//!
//! ```
//! use ctif_dither::{
//!     DiffusionKernel, DistanceMetric, DitherMode, DitherOptions, FixedPalette, PaletteConfig,
//!     Rgb,
//! };
//!
//! let palette = PaletteConfig::Fixed(FixedPalette::Mono)
//!     .resolve(&[], DistanceMetric::Euclidean)
//!     .unwrap();
//!
//! let pixels = vec![Rgb::new(90, 90, 90); 8 * 8];
//! let image = DitherMode::Diffusion(DiffusionKernel::Atkinson).apply(
//!     &pixels,
//!     8,
//!     8,
//!     &palette,
//!     DistanceMetric::Euclidean,
//!     &DitherOptions::new(),
//! );
//!
//! assert_eq!(image.width(), 8);
//! assert!(image.indices().iter().all(|&i| i < 2));
//! ```
//!
//! # Pipeline
//!
//! ```text
//! PaletteConfig ──resolve──▶ Palette
//!                              │
//! Rgb pixels ──DitherMode::apply──▶ QuantizedImage (indices + effective colours)
//! ```
//!
//! # Determinism
//!
//! Every operation is a pure function of its inputs. Parallel work
//! (rows for `none` and `ordered`, k-means attempts for adaptive palettes)
//! is collected in index order, so results never depend on scheduling.

#![allow(clippy::module_inception)]

pub mod color;
pub mod dither;
pub mod output;
pub mod palette;
pub mod quantize;

pub use color::Rgb;
pub use dither::{BayerMatrix, DiffusionKernel, DitherMode, DitherOptions, ErrorBuffer, Kernel};
pub use output::QuantizedImage;
pub use palette::{
    AdaptivePalette, FixedPalette, Palette, PaletteConfig, PaletteError, ParseColorError,
    MAX_PALETTE_SIZE,
};
pub use quantize::{nearest, DistanceMetric};
