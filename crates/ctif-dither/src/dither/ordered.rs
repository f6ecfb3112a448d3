//! Ordered (Bayer matrix) dithering.
//!
//! Every pixel is offset by a position-dependent threshold before
//! quantization. No state crosses pixel boundaries, so rows are processed
//! in parallel.

use serde::{Deserialize, Serialize};

use crate::color::channels;

include!(concat!(env!("OUT_DIR"), "/bayer.rs"));

/// Threshold matrix size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BayerMatrix {
    #[serde(rename = "2x2")]
    Bayer2,
    #[default]
    #[serde(rename = "4x4")]
    Bayer4,
    #[serde(rename = "8x8")]
    Bayer8,
}

impl BayerMatrix {
    /// Side length of the matrix.
    pub fn size(self) -> usize {
        match self {
            BayerMatrix::Bayer2 => 2,
            BayerMatrix::Bayer4 => 4,
            BayerMatrix::Bayer8 => 8,
        }
    }

    /// Threshold index at pixel `(x, y)`, in `0..size²`.
    #[inline]
    pub fn threshold(self, x: usize, y: usize) -> u8 {
        match self {
            BayerMatrix::Bayer2 => BAYER_2[y % 2][x % 2],
            BayerMatrix::Bayer4 => BAYER_4[y % 4][x % 4],
            BayerMatrix::Bayer8 => BAYER_8[y % 8][x % 8],
        }
    }

    /// Signed offset in `-0.5..0.5` for pixel `(x, y)`, centred on zero.
    #[inline]
    pub fn offset(self, x: usize, y: usize) -> f32 {
        let n = self.size();
        (self.threshold(x, y) as f32 + 0.5) / (n * n) as f32 - 0.5
    }
}

/// Apply the threshold offset at `(x, y)` to every channel.
///
/// `amplitude` is the palette spacing scaled by dither strength.
#[inline]
pub(crate) fn perturb(color: [f32; 3], matrix: BayerMatrix, x: usize, y: usize, amplitude: f32) -> [f32; 3] {
    let offset = matrix.offset(x, y) * amplitude;
    channels::clamp(color.map(|c| c + offset))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(matrix: BayerMatrix) -> Vec<u8> {
        let n = matrix.size();
        let mut v: Vec<u8> = (0..n)
            .flat_map(|y| (0..n).map(move |x| matrix.threshold(x, y)))
            .collect();
        v.sort_unstable();
        v
    }

    #[test]
    fn test_matrices_are_permutations() {
        for matrix in [BayerMatrix::Bayer2, BayerMatrix::Bayer4, BayerMatrix::Bayer8] {
            let n = matrix.size();
            let expected: Vec<u8> = (0..(n * n) as u8).collect();
            assert_eq!(values(matrix), expected, "{matrix:?}");
        }
    }

    #[test]
    fn test_bayer2_layout() {
        assert_eq!(BAYER_2, [[0, 2], [3, 1]]);
    }

    #[test]
    fn test_offsets_average_to_zero() {
        for matrix in [BayerMatrix::Bayer2, BayerMatrix::Bayer4, BayerMatrix::Bayer8] {
            let n = matrix.size();
            let sum: f32 = (0..n)
                .flat_map(|y| (0..n).map(move |x| matrix.offset(x, y)))
                .sum();
            assert!(sum.abs() < 1e-4, "{matrix:?} offsets sum to {sum}");
        }
    }

    #[test]
    fn test_matrix_tiles() {
        let m = BayerMatrix::Bayer4;
        assert_eq!(m.threshold(1, 2), m.threshold(5, 6));
    }

    #[test]
    fn test_perturb_clamps() {
        let out = perturb([0.0, 128.0, 255.0], BayerMatrix::Bayer2, 0, 0, 255.0);
        // threshold 0 -> offset (0.5 / 4 - 0.5) * 255 = -95.625
        assert_eq!(out, [0.0, 32.375, 159.375]);
        let out = perturb([250.0; 3], BayerMatrix::Bayer2, 0, 1, 255.0);
        // threshold 3 -> offset (3.5 / 4 - 0.5) * 255 = 95.625
        assert_eq!(out, [255.0; 3]);
    }
}
