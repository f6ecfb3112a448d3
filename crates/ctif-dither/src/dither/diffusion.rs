//! Sequential error diffusion.

use super::{DitherOptions, ErrorBuffer, Kernel};
use crate::color::{channels, Rgb};
use crate::output::QuantizedImage;
use crate::palette::Palette;
use crate::quantize::{self, DistanceMetric};

/// Core error diffusion loop parameterized by kernel.
///
/// The accumulator lives only for this call, so consecutive frames never
/// share residual error. Contributions that would land outside the image
/// are dropped.
pub(crate) fn diffuse(
    pixels: &[Rgb],
    width: usize,
    height: usize,
    palette: &Palette,
    metric: DistanceMetric,
    kernel: &Kernel,
    options: &DitherOptions,
) -> QuantizedImage {
    let mut indices = vec![0u8; width * height];
    let mut effective = vec![[0.0f32; 3]; width * height];
    let mut pending = ErrorBuffer::new(width, kernel.max_dy + 1);
    let divisor = kernel.divisor as f32;

    for y in 0..height {
        let reverse = options.serpentine && y % 2 == 1;

        for step in 0..width {
            let x = if reverse { width - 1 - step } else { step };
            let idx = y * width + x;

            let pixel = channels::clamp(channels::add(pixels[idx].to_f32(), pending.get_accumulated(x)));
            let chosen = quantize::nearest(pixel, palette, metric);
            indices[idx] = chosen;
            effective[idx] = pixel;

            let residual = channels::scale(
                channels::sub(pixel, palette.channels(chosen as usize)),
                options.strength,
            );

            for &(dx, dy, weight) in kernel.entries {
                let dx = if reverse { -dx } else { dx };
                let Some(nx) = x.checked_add_signed(dx as isize).filter(|&nx| nx < width) else {
                    continue;
                };
                if y + dy as usize >= height {
                    continue;
                }
                pending.add_error(nx, dy as usize, channels::scale(residual, weight as f32 / divisor));
            }
        }

        pending.advance_row();
    }

    QuantizedImage::new(indices, effective, width, height)
}
