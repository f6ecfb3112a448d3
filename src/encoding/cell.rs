//! Two-colour cell fitting.

use std::collections::BTreeSet;

use ctif_dither::{nearest, DistanceMetric, Palette};

use crate::models::QuantizedCell;

/// Palettes up to this size try every entry pair for every cell.
const EXHAUSTIVE_LIMIT: usize = 16;

/// Pick the background/foreground pair and glyph for one dual cell.
///
/// All slices hold the cell's sub-pixels in raster order. The pair `(a, b)`,
/// `a < b`, minimizing the summed distance of every source sub-pixel to the
/// nearer of the two wins; the first pair in order wins ties. A sub-pixel
/// shows `fg = b` only when its dithered colour is strictly closer to it,
/// so dither patterns survive inside the chosen pair.
///
/// A cell whose glyph ends up all background or all foreground is stored
/// as that one colour with an empty glyph.
pub(crate) fn fit_dual(
    source: &[[f32; 3]],
    effective: &[[f32; 3]],
    indices: &[u8],
    palette: &Palette,
    metric: DistanceMetric,
) -> QuantizedCell {
    let candidates = candidates(source, indices, palette, metric);

    let (bg, fg) = match candidates.as_slice() {
        [] => (0, 0),
        [only] => (*only, *only),
        _ => {
            let mut best = (candidates[0], candidates[1]);
            let mut best_score = f32::INFINITY;
            for (i, &a) in candidates.iter().enumerate() {
                let ca = palette.channels(a as usize);
                for &b in &candidates[i + 1..] {
                    let cb = palette.channels(b as usize);
                    let score: f32 = source
                        .iter()
                        .map(|&s| metric.distance(s, ca).min(metric.distance(s, cb)))
                        .sum();
                    if score < best_score {
                        best_score = score;
                        best = (a, b);
                    }
                }
            }
            best
        }
    };

    if bg == fg {
        return QuantizedCell::Dual { bg, fg, glyph: 0 };
    }

    let (cbg, cfg) = (palette.channels(bg as usize), palette.channels(fg as usize));
    let n = effective.len();
    let glyph = effective.iter().enumerate().fold(0u8, |glyph, (k, &e)| {
        if metric.distance(e, cfg) < metric.distance(e, cbg) {
            glyph | 1 << (n - 1 - k)
        } else {
            glyph
        }
    });

    let full = if n >= 8 { u8::MAX } else { (1u8 << n) - 1 };
    match glyph {
        0 => QuantizedCell::Dual { bg, fg: bg, glyph: 0 },
        g if g == full => QuantizedCell::Dual { bg: fg, fg, glyph: 0 },
        _ => QuantizedCell::Dual { bg, fg, glyph },
    }
}

/// Palette entries worth pairing for this cell, sorted.
///
/// Small palettes are searched in full. Larger ones use the dithered
/// indices plus the entries nearest to each source sub-pixel, to the
/// midpoint of every sub-pixel pair and to the cell mean.
fn candidates(source: &[[f32; 3]], indices: &[u8], palette: &Palette, metric: DistanceMetric) -> Vec<u8> {
    if palette.len() <= EXHAUSTIVE_LIMIT {
        return (0..palette.len()).map(|i| i as u8).collect();
    }

    let mut set: BTreeSet<u8> = indices.iter().copied().collect();
    for (i, &a) in source.iter().enumerate() {
        set.insert(nearest(a, palette, metric));
        for &b in &source[i + 1..] {
            let mid = [(a[0] + b[0]) / 2.0, (a[1] + b[1]) / 2.0, (a[2] + b[2]) / 2.0];
            set.insert(nearest(mid, palette, metric));
        }
    }
    if !source.is_empty() {
        let n = source.len() as f32;
        let mean = source.iter().fold([0.0f32; 3], |acc, s| {
            [acc[0] + s[0] / n, acc[1] + s[1] / n, acc[2] + s[2] / n]
        });
        set.insert(nearest(mean, palette, metric));
    }
    set.into_iter().collect()
}
