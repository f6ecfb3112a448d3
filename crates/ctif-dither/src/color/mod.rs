//! Colour types
//!
//! The whole pipeline works on 8-bit sRGB triples as delivered by the
//! frame source. Arithmetic that needs headroom (error diffusion, ordered
//! offsets, k-means centroids) uses `[f32; 3]` in the same 0..=255 scale.

pub(crate) mod channels;
mod rgb;

pub use rgb::Rgb;
