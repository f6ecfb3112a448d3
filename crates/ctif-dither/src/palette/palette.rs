//! Palette struct with precomputed channel data.
//!
//! A [`Palette`] is the ordered set of colours a display can show. The
//! position of a colour in the palette is its identity everywhere
//! downstream: dithered images, encoded cells and the container's palette
//! table all refer to entries by index.

use std::str::FromStr;

use super::error::PaletteError;
use super::MAX_PALETTE_SIZE;
use crate::color::Rgb;
use crate::quantize::{self, DistanceMetric};

/// An ordered, non-empty palette of at most [`MAX_PALETTE_SIZE`] colours.
///
/// # Precomputation
///
/// Float channel values and the mean nearest-neighbour spacing are computed
/// once at construction. A palette is never mutated afterwards, so it can be
/// shared freely between worker threads (wrap it in an `Arc`).
///
/// # Example
///
/// ```
/// use ctif_dither::{Palette, Rgb};
///
/// let palette = Palette::new(&[Rgb::BLACK, Rgb::WHITE]).unwrap();
/// assert_eq!(palette.len(), 2);
/// assert_eq!(palette.color(1), Rgb::WHITE);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Palette {
    colors: Vec<Rgb>,
    channels: Vec<[f32; 3]>,
    spacing: f32,
}

impl Palette {
    /// Create a palette from a list of colours.
    ///
    /// Duplicate entries are allowed; lookups resolve to the lowest index.
    ///
    /// # Errors
    ///
    /// [`PaletteError::InvalidPaletteSize`] when `colors` is empty or longer
    /// than [`MAX_PALETTE_SIZE`].
    pub fn new(colors: &[Rgb]) -> Result<Self, PaletteError> {
        if colors.is_empty() || colors.len() > MAX_PALETTE_SIZE {
            return Err(PaletteError::InvalidPaletteSize {
                requested: colors.len(),
            });
        }

        let channels: Vec<[f32; 3]> = colors.iter().map(|c| c.to_f32()).collect();
        let spacing = channel_spacing(&channels);

        Ok(Self {
            colors: colors.to_vec(),
            channels,
            spacing,
        })
    }

    /// Create a palette from hex colour strings such as `"#FF0000"` or `"F00"`.
    ///
    /// # Errors
    ///
    /// [`PaletteError::ParseColor`] naming the first malformed entry, or
    /// [`PaletteError::InvalidPaletteSize`].
    pub fn from_hex<S: AsRef<str>>(colors: &[S]) -> Result<Self, PaletteError> {
        let parsed = colors
            .iter()
            .enumerate()
            .map(|(index, s)| {
                Rgb::from_str(s.as_ref()).map_err(|source| PaletteError::ParseColor { index, source })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(&parsed)
    }

    /// Create a palette from a raw `[r, g, b, r, g, b, ...]` table, the
    /// layout written by [`to_rgb_bytes`](Self::to_rgb_bytes) and used by
    /// palette files.
    ///
    /// # Errors
    ///
    /// [`PaletteError::TableLength`] when `bytes` does not hold whole
    /// entries, or [`PaletteError::InvalidPaletteSize`].
    pub fn from_rgb_bytes(bytes: &[u8]) -> Result<Self, PaletteError> {
        if bytes.len() % 3 != 0 {
            return Err(PaletteError::TableLength { len: bytes.len() });
        }
        let colors: Vec<Rgb> = bytes
            .chunks_exact(3)
            .map(|c| Rgb::new(c[0], c[1], c[2]))
            .collect();
        Self::new(&colors)
    }

    /// Number of colours in the palette.
    #[inline]
    pub fn len(&self) -> usize {
        self.colors.len()
    }

    /// Always `false`; empty palettes are rejected at construction.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// Colour at `idx`.
    #[inline]
    pub fn color(&self, idx: usize) -> Rgb {
        self.colors[idx]
    }

    /// All colours in index order.
    #[inline]
    pub fn colors(&self) -> &[Rgb] {
        &self.colors
    }

    /// Colour at `idx` as floats in the 0..=255 scale.
    #[inline]
    pub fn channels(&self, idx: usize) -> [f32; 3] {
        self.channels[idx]
    }

    /// Mean per-channel distance between each entry and its nearest
    /// neighbour.
    ///
    /// Used as the amplitude of ordered dithering offsets: a pixel moved by
    /// this much can cross into an adjacent palette entry. Zero for a
    /// single-colour palette.
    #[inline]
    pub fn spacing(&self) -> f32 {
        self.spacing
    }

    /// Index of the entry nearest to `color` under `metric`.
    #[inline]
    pub fn nearest(&self, color: Rgb, metric: DistanceMetric) -> u8 {
        quantize::nearest(color.to_f32(), self, metric)
    }

    /// Index of the entry nearest to black, used as padding colour.
    #[inline]
    pub fn nearest_black(&self, metric: DistanceMetric) -> u8 {
        self.nearest(Rgb::BLACK, metric)
    }

    /// Palette table as packed `[r, g, b, r, g, b, ...]` bytes.
    pub fn to_rgb_bytes(&self) -> Vec<u8> {
        self.colors.iter().flat_map(|c| c.to_bytes()).collect()
    }
}

/// Mean Euclidean nearest-neighbour distance, divided by sqrt(3) so it
/// reads as a per-channel step.
fn channel_spacing(channels: &[[f32; 3]]) -> f32 {
    if channels.len() < 2 {
        return 0.0;
    }

    let total: f32 = channels
        .iter()
        .enumerate()
        .map(|(i, a)| {
            channels
                .iter()
                .enumerate()
                .filter(|&(j, _)| j != i)
                .map(|(_, b)| DistanceMetric::Euclidean.distance(*a, *b))
                .fold(f32::MAX, f32::min)
                .sqrt()
        })
        .sum();

    total / channels.len() as f32 / 3f32.sqrt()
}
