//! K-means palette reduction.
//!
//! The sample is first collapsed into an ordered colour histogram so every
//! pass iterates distinct colours in the same order. Each attempt starts
//! from its own seeded choice of initial centroids; attempts run in
//! parallel and the one with the lowest weighted error wins.
//!
//! With a base palette only the leading `max_size` slots are fitted. The
//! remaining base entries stay fixed, and a colour already closer to one of
//! them than to every centroid does not pull any centroid.

use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::{FixedPalette, Palette, PaletteError, MAX_PALETTE_SIZE};
use crate::color::Rgb;
use crate::quantize::{self, DistanceMetric};

/// Upper bound on assign/update rounds per attempt.
const MAX_ITERATIONS: usize = 128;

/// Parameters for a palette computed from image content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdaptivePalette {
    /// Number of colours to fit (1..=256).
    pub max_size: usize,
    /// Base seed; attempt `i` is seeded with `seed + i`.
    pub seed: u64,
    /// Independent k-means runs. Zero is treated as one.
    pub attempts: usize,
    /// Fixed palette whose first `max_size` entries are replaced by fitted
    /// colours; the rest are kept as they are.
    pub base: Option<FixedPalette>,
    /// Sample one pixel from each cell of a `sampling x sampling` grid
    /// instead of reading every pixel. Zero reads every pixel.
    pub sampling: usize,
}

impl Default for AdaptivePalette {
    fn default() -> Self {
        Self {
            max_size: 16,
            seed: 0,
            attempts: 4,
            base: None,
            sampling: 0,
        }
    }
}

/// A distinct sample colour.
struct Entry {
    color: [f32; 3],
    count: u64,
    /// Distance to the nearest fixed base entry, infinite without a base.
    fixed: f32,
}

/// Outcome of one k-means run.
struct Clustering {
    centroids: Vec<[f32; 3]>,
    error: f64,
}

impl AdaptivePalette {
    /// Pixels of a `width x height` frame to feed into [`compute`](Self::compute).
    ///
    /// With a sampling grid, each grid cell contributes one pixel picked by
    /// an RNG seeded with `seed`, so the sample is reproducible.
    pub fn sample<'a>(&self, pixels: &'a [Rgb], width: usize, height: usize) -> Cow<'a, [Rgb]> {
        let res = self.sampling;
        if res == 0 || width == 0 || height == 0 || pixels.len() != width * height {
            return Cow::Borrowed(pixels);
        }

        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut sample = Vec::with_capacity(res * res);
        for gy in 0..res {
            let rows = grid_span(gy, res, height);
            for gx in 0..res {
                let cols = grid_span(gx, res, width);
                let y = rng.gen_range(rows.clone());
                let x = rng.gen_range(cols);
                sample.push(pixels[y * width + x]);
            }
        }
        Cow::Owned(sample)
    }

    /// Reduce `sample` to at most `max_size` colours.
    ///
    /// Without a base the output is sorted and free of duplicates. With a
    /// base the output has the base's length: sorted fitted colours first,
    /// then the untouched base entries. Equal input and seed give a
    /// byte-identical palette.
    pub fn compute(&self, sample: &[Rgb], metric: DistanceMetric) -> Result<Palette, PaletteError> {
        if self.max_size == 0 || self.max_size > MAX_PALETTE_SIZE {
            return Err(PaletteError::InvalidPaletteSize {
                requested: self.max_size,
            });
        }
        let base = self.base.map(FixedPalette::colors).unwrap_or_default();
        if !base.is_empty() && self.max_size > base.len() {
            return Err(PaletteError::AdaptiveExceedsBase {
                adaptive: self.max_size,
                base: base.len(),
            });
        }
        if sample.is_empty() {
            return Err(PaletteError::EmptySample);
        }

        let mut histogram: BTreeMap<Rgb, u64> = BTreeMap::new();
        for &color in sample {
            *histogram.entry(color).or_insert(0) += 1;
        }

        if histogram.len() <= self.max_size {
            tracing::debug!(
                distinct = histogram.len(),
                "sample fits palette, skipping k-means"
            );
            return assemble(histogram.into_keys().collect(), &base);
        }

        let fixed: Vec<[f32; 3]> = base.iter().skip(self.max_size).map(|c| c.to_f32()).collect();
        let entries: Vec<Entry> = histogram
            .iter()
            .map(|(color, &count)| {
                let color = color.to_f32();
                let fixed = fixed
                    .iter()
                    .map(|&f| metric.distance(color, f))
                    .fold(f32::INFINITY, f32::min);
                Entry { color, count, fixed }
            })
            .collect();

        let attempts = self.attempts.max(1);
        let runs: Vec<Clustering> = (0..attempts)
            .into_par_iter()
            .map(|attempt| {
                let seed = self.seed.wrapping_add(attempt as u64);
                kmeans(&entries, self.max_size, seed, metric)
            })
            .collect();

        // Strict `<` keeps the lowest attempt on ties.
        let mut best = 0;
        for (i, run) in runs.iter().enumerate().skip(1) {
            if run.error < runs[best].error {
                best = i;
            }
        }

        tracing::debug!(
            distinct = entries.len(),
            attempts,
            best_attempt = best,
            error = runs[best].error,
            base = ?self.base,
            "adaptive palette computed"
        );

        let fitted = runs[best].centroids.iter().map(|&c| Rgb::from_f32(c)).collect();
        assemble(fitted, &base)
    }
}

/// Half-open range of grid cell `index` when `len` is split into `parts`.
/// Never empty, even when there are more parts than pixels.
fn grid_span(index: usize, parts: usize, len: usize) -> std::ops::Range<usize> {
    let start = index * len / parts;
    let end = ((index + 1) * len / parts).clamp(start + 1, len);
    start..end
}

/// Final palette from fitted colours and an optional base.
fn assemble(mut fitted: Vec<Rgb>, base: &[Rgb]) -> Result<Palette, PaletteError> {
    if base.is_empty() {
        let unique: BTreeSet<Rgb> = fitted.into_iter().collect();
        let colors: Vec<Rgb> = unique.into_iter().collect();
        return Palette::new(&colors);
    }

    // Slots are positional here, so duplicates stay.
    fitted.sort_unstable();
    let tail = &base[fitted.len()..];
    fitted.extend_from_slice(tail);
    Palette::new(&fitted)
}

/// One seeded k-means run over weighted distinct colours.
///
/// Requires `entries.len() > k`. An entry closer to its fixed base colour
/// than to every centroid is left unassigned.
fn kmeans(entries: &[Entry], k: usize, seed: u64, metric: DistanceMetric) -> Clustering {
    let mut rng = StdRng::seed_from_u64(seed);

    // Colours the base already shows exactly make poor seeds.
    let eligible: Vec<usize> = (0..entries.len()).filter(|&i| entries[i].fixed > 0.0).collect();
    let pool: Vec<usize> = if eligible.len() >= k {
        eligible
    } else {
        (0..entries.len()).collect()
    };
    let mut initial: Vec<usize> = rand::seq::index::sample(&mut rng, pool.len(), k)
        .into_iter()
        .map(|i| pool[i])
        .collect();
    initial.sort_unstable();
    let mut centroids: Vec<[f32; 3]> = initial.iter().map(|&i| entries[i].color).collect();

    let mut assignment: Vec<Option<usize>> = vec![None; entries.len()];
    for round in 0..MAX_ITERATIONS {
        let mut changed = round == 0;
        for (slot, entry) in assignment.iter_mut().zip(entries) {
            let nearest = quantize::nearest_index(entry.color, centroids.iter().copied(), metric);
            let target = (metric.distance(entry.color, centroids[nearest]) < entry.fixed).then_some(nearest);
            if *slot != target {
                *slot = target;
                changed = true;
            }
        }
        if !changed {
            break;
        }

        let mut sums = vec![[0.0f64; 3]; k];
        let mut weights = vec![0u64; k];
        for (cluster, entry) in assignment.iter().zip(entries) {
            let Some(cluster) = *cluster else { continue };
            for c in 0..3 {
                sums[cluster][c] += f64::from(entry.color[c]) * entry.count as f64;
            }
            weights[cluster] += entry.count;
        }
        for ((centroid, sum), &weight) in centroids.iter_mut().zip(&sums).zip(&weights) {
            // Empty clusters keep their previous centroid.
            if weight > 0 {
                for c in 0..3 {
                    centroid[c] = (sum[c] / weight as f64) as f32;
                }
            }
        }
    }

    let error: f64 = assignment
        .iter()
        .zip(entries)
        .map(|(cluster, entry)| {
            let distance = match *cluster {
                Some(c) => metric.distance(entry.color, centroids[c]),
                None => entry.fixed,
            };
            f64::from(distance) * entry.count as f64
        })
        .sum();

    Clustering { centroids, error }
}
