//! Nearest-colour search.
//!
//! Quantization maps a continuous colour onto one palette index. Two
//! metrics are available: plain RGB distance, and a perceptual distance in
//! YIQ space that weights brightness differences above hue differences.
//! Both are squared distances; only the ordering matters.

use serde::{Deserialize, Serialize};

use crate::palette::Palette;

/// Colour distance used for palette matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceMetric {
    /// Squared distance in RGB.
    #[default]
    Euclidean,
    /// Squared distance in YIQ, computed on the RGB difference vector.
    Perceptual,
}

impl DistanceMetric {
    /// Squared distance between two colours in the 0..=255 scale.
    #[inline]
    pub fn distance(self, a: [f32; 3], b: [f32; 3]) -> f32 {
        let dr = a[0] - b[0];
        let dg = a[1] - b[1];
        let db = a[2] - b[2];
        match self {
            DistanceMetric::Euclidean => dr * dr + dg * dg + db * db,
            DistanceMetric::Perceptual => {
                let y = 0.299 * dr + 0.587 * dg + 0.114 * db;
                let i = 0.596 * dr - 0.274 * dg - 0.322 * db;
                let q = 0.211 * dr - 0.523 * dg + 0.312 * db;
                y * y + i * i + q * q
            }
        }
    }
}

/// Index of the palette entry nearest to `pixel`.
///
/// Equidistant entries resolve to the lowest index.
#[inline]
pub fn nearest(pixel: [f32; 3], palette: &Palette, metric: DistanceMetric) -> u8 {
    let idx = nearest_index(pixel, (0..palette.len()).map(|i| palette.channels(i)), metric);
    // Palettes hold at most 256 entries.
    idx as u8
}

/// Position of the candidate nearest to `pixel`; 0 when `candidates` is empty.
pub(crate) fn nearest_index<I>(pixel: [f32; 3], candidates: I, metric: DistanceMetric) -> usize
where
    I: IntoIterator<Item = [f32; 3]>,
{
    let mut best_idx = 0;
    let mut best_dist = f32::INFINITY;
    for (i, candidate) in candidates.into_iter().enumerate() {
        let dist = metric.distance(pixel, candidate);
        if dist < best_dist {
            best_dist = dist;
            best_idx = i;
        }
    }
    best_idx
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Rgb;
    use proptest::prelude::*;

    fn rgb_palette(colors: &[Rgb]) -> Palette {
        Palette::new(colors).unwrap()
    }

    #[test]
    fn test_exact_color_matches() {
        let palette = rgb_palette(&[Rgb::BLACK, Rgb::WHITE, Rgb::new(255, 0, 0)]);
        for metric in [DistanceMetric::Euclidean, DistanceMetric::Perceptual] {
            assert_eq!(nearest([255.0, 0.0, 0.0], &palette, metric), 2);
            assert_eq!(nearest([0.0, 0.0, 0.0], &palette, metric), 0);
        }
    }

    #[test]
    fn test_tie_prefers_lower_index() {
        // 100 is exactly between 50 and 150
        let palette = rgb_palette(&[Rgb::new(150, 150, 150), Rgb::new(50, 50, 50)]);
        assert_eq!(nearest([100.0; 3], &palette, DistanceMetric::Euclidean), 0);

        let palette = rgb_palette(&[Rgb::new(50, 50, 50), Rgb::new(150, 150, 150)]);
        assert_eq!(nearest([100.0; 3], &palette, DistanceMetric::Euclidean), 0);
    }

    #[test]
    fn test_duplicate_entries_resolve_low() {
        let palette = rgb_palette(&[Rgb::WHITE, Rgb::BLACK, Rgb::BLACK]);
        assert_eq!(nearest([3.0; 3], &palette, DistanceMetric::Euclidean), 1);
    }

    #[test]
    fn test_perceptual_weights_luma() {
        // Equal RGB distance, but a pure green shift changes luma far more
        // than a pure blue shift.
        let palette = rgb_palette(&[Rgb::new(100, 160, 100), Rgb::new(100, 100, 160)]);
        let pixel = [100.0, 100.0, 100.0];
        assert_eq!(nearest(pixel, &palette, DistanceMetric::Perceptual), 1);
        assert_eq!(nearest(pixel, &palette, DistanceMetric::Euclidean), 0);
    }

    #[test]
    fn test_distance_is_squared() {
        let d = DistanceMetric::Euclidean.distance([0.0; 3], [3.0, 4.0, 0.0]);
        assert_eq!(d, 25.0);
        assert_eq!(DistanceMetric::Perceptual.distance([7.0; 3], [7.0; 3]), 0.0);
    }

    #[test]
    fn test_empty_candidates() {
        assert_eq!(nearest_index([1.0; 3], Vec::new(), DistanceMetric::Euclidean), 0);
    }

    fn arb_palette() -> impl Strategy<Value = Vec<Rgb>> {
        prop::collection::vec(any::<[u8; 3]>().prop_map(Rgb::from_bytes), 1..=32)
    }

    proptest! {
        #[test]
        fn prop_palette_colors_are_fixed_points(
            colors in arb_palette(),
            pick in any::<prop::sample::Index>(),
            perceptual in any::<bool>(),
        ) {
            let metric = if perceptual { DistanceMetric::Perceptual } else { DistanceMetric::Euclidean };
            let palette = rgb_palette(&colors);
            let k = pick.index(colors.len());
            let found = nearest(colors[k].to_f32(), &palette, metric) as usize;
            prop_assert_eq!(colors[found], colors[k]);
            prop_assert!(found <= k);
        }

        #[test]
        fn prop_nearest_in_range_and_deterministic(
            colors in arb_palette(),
            pixel in any::<[u8; 3]>(),
        ) {
            let palette = rgb_palette(&colors);
            let p = Rgb::from_bytes(pixel).to_f32();
            let a = nearest(p, &palette, DistanceMetric::Euclidean);
            let b = nearest(p, &palette, DistanceMetric::Euclidean);
            prop_assert_eq!(a, b);
            prop_assert!((a as usize) < palette.len());
        }
    }
}
