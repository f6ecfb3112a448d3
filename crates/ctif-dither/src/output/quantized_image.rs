use crate::palette::Palette;

/// Per-pixel palette indices plus the colour each one approximates.
///
/// The effective colour is the source pixel after dithering adjustments
/// (ordered offset or accumulated diffusion error), clamped to `0..=255`.
///
/// # Example
///
/// ```
/// use ctif_dither::{Palette, QuantizedImage, Rgb};
///
/// let palette = Palette::new(&[Rgb::BLACK, Rgb::WHITE]).unwrap();
/// let image = QuantizedImage::new(vec![0, 1], vec![[10.0; 3], [250.0; 3]], 2, 1);
///
/// assert_eq!(image.index_at(1, 0), 1);
/// assert_eq!(image.to_rgb(&palette), vec![0, 0, 0, 255, 255, 255]);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct QuantizedImage {
    indices: Vec<u8>,
    effective: Vec<[f32; 3]>,
    width: usize,
    height: usize,
}

impl QuantizedImage {
    /// # Panics (debug only)
    ///
    /// Debug-asserts that both buffers hold `width * height` entries.
    pub fn new(indices: Vec<u8>, effective: Vec<[f32; 3]>, width: usize, height: usize) -> Self {
        debug_assert_eq!(indices.len(), width * height, "indices length must match width * height");
        debug_assert_eq!(effective.len(), indices.len(), "effective length must match indices");
        Self {
            indices,
            effective,
            width,
            height,
        }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Palette indices, row-major.
    #[inline]
    pub fn indices(&self) -> &[u8] {
        &self.indices
    }

    /// Effective colours, row-major.
    #[inline]
    pub fn effective(&self) -> &[[f32; 3]] {
        &self.effective
    }

    #[inline]
    pub fn index_at(&self, x: usize, y: usize) -> u8 {
        self.indices[y * self.width + x]
    }

    #[inline]
    pub fn effective_at(&self, x: usize, y: usize) -> [f32; 3] {
        self.effective[y * self.width + x]
    }

    /// Render to packed RGB bytes using `palette`.
    pub fn to_rgb(&self, palette: &Palette) -> Vec<u8> {
        self.indices
            .iter()
            .flat_map(|&i| palette.color(i as usize).to_bytes())
            .collect()
    }
}
