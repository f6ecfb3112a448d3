//! Palette source selection.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::{AdaptivePalette, FixedPalette, Palette, PaletteError};
use crate::color::Rgb;
use crate::quantize::DistanceMetric;

/// Where the encoding palette comes from.
///
/// Serialized externally tagged, so YAML reads naturally:
///
/// ```yaml
/// palette: { fixed: oc256 }
/// palette: { custom: ["#000", "#fff", "#f00"] }
/// palette: { adaptive: { max_size: 16, seed: 7 } }
/// palette: { adaptive: { max_size: 16, base: oc256, sampling: 64 } }
/// palette: { file: palettes/sunset.pal }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PaletteConfig {
    Fixed(FixedPalette),
    /// Hex colour strings, in index order.
    Custom(Vec<String>),
    Adaptive(AdaptivePalette),
    /// Raw `[r, g, b]*` table on disk.
    File(PathBuf),
}

impl Default for PaletteConfig {
    fn default() -> Self {
        PaletteConfig::Fixed(FixedPalette::default())
    }
}

impl PaletteConfig {
    /// Whether the palette depends on image content.
    pub fn is_adaptive(&self) -> bool {
        matches!(self, PaletteConfig::Adaptive(_))
    }

    /// Produce the palette.
    ///
    /// `sample` is only read by the adaptive source; fixed and custom
    /// palettes ignore it. `metric` drives k-means cluster assignment.
    pub fn resolve(&self, sample: &[Rgb], metric: DistanceMetric) -> Result<Palette, PaletteError> {
        match self {
            PaletteConfig::Fixed(fixed) => Ok(fixed.palette()),
            PaletteConfig::Custom(colors) => Palette::from_hex(colors),
            PaletteConfig::Adaptive(adaptive) => adaptive.compute(sample, metric),
            PaletteConfig::File(path) => {
                let bytes = std::fs::read(path).map_err(|e| PaletteError::ReadFile {
                    path: path.clone(),
                    reason: e.to_string(),
                })?;
                Palette::from_rgb_bytes(&bytes)
            }
        }
    }

    /// Produce the palette from a whole `width x height` frame, applying
    /// the adaptive source's sampling grid first.
    pub fn resolve_frame(
        &self,
        pixels: &[Rgb],
        width: usize,
        height: usize,
        metric: DistanceMetric,
    ) -> Result<Palette, PaletteError> {
        match self {
            PaletteConfig::Adaptive(adaptive) => {
                adaptive.compute(&adaptive.sample(pixels, width, height), metric)
            }
            _ => self.resolve(pixels, metric),
        }
    }
}
