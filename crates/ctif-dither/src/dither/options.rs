//! Dithering options.

/// Configuration shared by all dither modes.
///
/// # Example
///
/// ```
/// use ctif_dither::DitherOptions;
///
/// let options = DitherOptions::new().serpentine(true).strength(0.5);
/// assert!(options.serpentine);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DitherOptions {
    /// Alternate scan direction per row for error diffusion, mirroring the
    /// kernel on odd rows.
    ///
    /// Default: `false`
    pub serpentine: bool,

    /// Scale applied to the dither amplitude: the diffused residual, or the
    /// ordered threshold offset. `0.0` disables dithering.
    ///
    /// Default: `1.0`
    pub strength: f32,
}

impl Default for DitherOptions {
    fn default() -> Self {
        Self {
            serpentine: false,
            strength: 1.0,
        }
    }
}

impl DitherOptions {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn serpentine(mut self, enabled: bool) -> Self {
        self.serpentine = enabled;
        self
    }

    /// Set dither strength, clamped to `0.0..=1.0`. NaN maps to `0.0`.
    #[inline]
    pub fn strength(mut self, strength: f32) -> Self {
        self.strength = if strength.is_nan() {
            0.0
        } else {
            strength.clamp(0.0, 1.0)
        };
        self
    }
}
