//! Dithering: mapping a full-colour frame onto palette indices.
//!
//! Three families are available through [`DitherMode`]:
//!
//! - **None**: plain nearest-colour quantization
//! - **Ordered**: Bayer threshold offsets, no state between pixels
//! - **Diffusion**: quantization error pushed onto unvisited neighbours
//!
//! Every mode returns a [`QuantizedImage`] that carries, next to each index,
//! the effective colour the index was chosen for. Cell encoding scores
//! colour pairs against those effective colours so dither patterns survive.
//!
//! # Example
//!
//! ```
//! use ctif_dither::{DitherMode, DitherOptions, DistanceMetric, Palette, Rgb};
//!
//! let palette = Palette::new(&[Rgb::BLACK, Rgb::WHITE]).unwrap();
//! let pixels = vec![Rgb::new(128, 128, 128); 16];
//!
//! let image = DitherMode::default().apply(
//!     &pixels,
//!     4,
//!     4,
//!     &palette,
//!     DistanceMetric::Euclidean,
//!     &DitherOptions::new(),
//! );
//! assert_eq!(image.indices().len(), 16);
//! ```

mod diffusion;
mod kernel;
mod options;
mod ordered;

pub use kernel::*;
pub use options::DitherOptions;
pub use ordered::BayerMatrix;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::color::{channels, Rgb};
use crate::output::QuantizedImage;
use crate::palette::Palette;
use crate::quantize::{self, DistanceMetric};

/// Dither mode selection.
///
/// YAML form: `none`, `{ ordered: 4x4 }`, `{ diffusion: floyd-steinberg }`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DitherMode {
    None,
    Ordered(BayerMatrix),
    Diffusion(DiffusionKernel),
}

impl Default for DitherMode {
    fn default() -> Self {
        DitherMode::Diffusion(DiffusionKernel::default())
    }
}

impl DitherMode {
    /// Dither a row-major frame to palette indices.
    ///
    /// `pixels.len()` must equal `width * height`. A strength of zero
    /// behaves like [`DitherMode::None`].
    pub fn apply(
        &self,
        pixels: &[Rgb],
        width: usize,
        height: usize,
        palette: &Palette,
        metric: DistanceMetric,
        options: &DitherOptions,
    ) -> QuantizedImage {
        debug_assert_eq!(
            pixels.len(),
            width * height,
            "pixel count ({}) must match width * height ({}x{})",
            pixels.len(),
            width,
            height,
        );

        if width == 0 || height == 0 {
            return QuantizedImage::new(Vec::new(), Vec::new(), width, height);
        }

        let mode = if options.strength > 0.0 { *self } else { DitherMode::None };
        match mode {
            DitherMode::None => per_pixel(pixels, width, height, palette, metric, |_, _, c| c),
            DitherMode::Ordered(matrix) => {
                let amplitude = palette.spacing() * options.strength;
                per_pixel(pixels, width, height, palette, metric, |x, y, c| {
                    ordered::perturb(c, matrix, x, y, amplitude)
                })
            }
            DitherMode::Diffusion(kernel) => diffusion::diffuse(
                pixels,
                width,
                height,
                palette,
                metric,
                kernel.kernel(),
                options,
            ),
        }
    }
}

/// Quantize each pixel independently, rows in parallel.
///
/// `adjust` maps `(x, y, colour)` to the colour actually quantized.
fn per_pixel<F>(
    pixels: &[Rgb],
    width: usize,
    height: usize,
    palette: &Palette,
    metric: DistanceMetric,
    adjust: F,
) -> QuantizedImage
where
    F: Fn(usize, usize, [f32; 3]) -> [f32; 3] + Sync,
{
    let rows: Vec<Vec<(u8, [f32; 3])>> = pixels
        .par_chunks(width)
        .enumerate()
        .map(|(y, row)| {
            row.iter()
                .enumerate()
                .map(|(x, p)| {
                    let color = adjust(x, y, p.to_f32());
                    (quantize::nearest(color, palette, metric), color)
                })
                .collect()
        })
        .collect();

    let (indices, effective) = rows.into_iter().flatten().unzip();
    QuantizedImage::new(indices, effective, width, height)
}

/// Residual error waiting to be applied to upcoming pixels.
///
/// A ring of `depth` rows, `depth` being the kernel's reach plus the
/// current row. Advancing clears the finished row and reuses it as the
/// farthest one, so no row is ever reallocated.
#[derive(Debug)]
pub struct ErrorBuffer {
    cells: Vec<[f32; 3]>,
    width: usize,
    depth: usize,
    head: usize,
}

impl ErrorBuffer {
    pub fn new(width: usize, depth: usize) -> Self {
        let depth = depth.max(1);
        Self {
            cells: vec![[0.0; 3]; width * depth],
            width,
            depth,
            head: 0,
        }
    }

    fn slot(&self, x: usize, row_offset: usize) -> usize {
        (self.head + row_offset) % self.depth * self.width + x
    }

    /// Error accumulated so far for pixel `x` of the current row.
    #[inline]
    pub fn get_accumulated(&self, x: usize) -> [f32; 3] {
        self.cells[self.slot(x, 0)]
    }

    /// Add error to pixel `x`, `row_offset` rows below the current one.
    /// Out-of-range targets are ignored.
    #[inline]
    pub fn add_error(&mut self, x: usize, row_offset: usize, error: [f32; 3]) {
        if x < self.width && row_offset < self.depth {
            let slot = self.slot(x, row_offset);
            self.cells[slot] = channels::add(self.cells[slot], error);
        }
    }

    /// Finish the current row.
    pub fn advance_row(&mut self) {
        let start = self.head * self.width;
        self.cells[start..start + self.width].fill([0.0; 3]);
        self.head = (self.head + 1) % self.depth;
    }
}
