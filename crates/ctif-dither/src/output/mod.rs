//! Output of the dithering stage.
//!
//! [`QuantizedImage`] keeps one palette index per pixel together with the
//! effective colour the index was picked for.

mod quantized_image;

pub use quantized_image::QuantizedImage;
