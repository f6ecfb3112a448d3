use std::fmt;
use std::path::{Path, PathBuf};

use ctif_dither::{DistanceMetric, DitherMode, DitherOptions, PaletteConfig};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Encoder configuration, usually loaded from YAML.
///
/// Every field is optional; missing fields take the [`Default`] value.
///
/// ```yaml
/// palette: { adaptive: { max_size: 16, seed: 1 } }
/// metric: perceptual
/// dither: { ordered: 4x4 }
/// cell: { dual: { width: 2, height: 4 } }
/// on_size_mismatch: pad
/// storage: delta
/// palette_export: out/palette.pal
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncodeConfig {
    /// Palette source
    pub palette: PaletteConfig,

    /// Distance used for every nearest-colour decision
    pub metric: DistanceMetric,

    pub dither: DitherMode,

    /// Alternate row direction during error diffusion
    pub serpentine: bool,

    /// Dither amplitude, 0.0 (off) to 1.0 (full)
    pub strength: f32,

    pub cell: CellGeometry,

    /// What to do when frame dimensions are not a multiple of the cell size
    pub on_size_mismatch: SizeMismatch,

    /// How frame payloads are stored in the container
    pub storage: StoragePolicy,

    /// Write the resolved palette here as a raw `[r, g, b]*` table
    pub palette_export: Option<PathBuf>,
}

impl Default for EncodeConfig {
    fn default() -> Self {
        Self {
            palette: PaletteConfig::default(),
            metric: DistanceMetric::default(),
            dither: DitherMode::default(),
            serpentine: false,
            strength: 1.0,
            cell: CellGeometry::Single,
            on_size_mismatch: SizeMismatch::Fail,
            storage: StoragePolicy::Delta,
            palette_export: None,
        }
    }
}

impl EncodeConfig {
    /// Parse configuration from a YAML document.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        tracing::info!(
            metric = ?config.metric,
            dither = ?config.dither,
            cell = %config.cell,
            storage = ?config.storage,
            "Loaded encoder configuration"
        );
        Ok(config)
    }

    /// Load configuration from a YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml_str(&content)
    }

    pub fn dither_options(&self) -> DitherOptions {
        DitherOptions::new()
            .serpentine(self.serpentine)
            .strength(self.strength)
    }
}

/// Shape of one display cell.
///
/// `Single` is one pixel per cell holding one palette index. `Dual` cells
/// cover `width x height` sub-pixels drawn with two colours and a glyph mask
/// selecting between them; the mask has one bit per sub-pixel, so a cell
/// covers at most 8 sub-pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellGeometry {
    #[default]
    Single,
    Dual { width: u8, height: u8 },
}

/// Most sub-pixels a dual cell can cover (one glyph byte).
pub const MAX_DUAL_SUBPIXELS: usize = 8;

impl CellGeometry {
    /// Cell width in pixels.
    pub fn width(self) -> usize {
        match self {
            CellGeometry::Single => 1,
            CellGeometry::Dual { width, .. } => width as usize,
        }
    }

    /// Cell height in pixels.
    pub fn height(self) -> usize {
        match self {
            CellGeometry::Single => 1,
            CellGeometry::Dual { height, .. } => height as usize,
        }
    }

    /// Container `cell_mode` byte.
    pub fn mode(self) -> u8 {
        match self {
            CellGeometry::Single => 0,
            CellGeometry::Dual { .. } => 1,
        }
    }

    /// Check the cell itself is encodable, returning the reason if not.
    pub fn check(self) -> std::result::Result<(), String> {
        match self {
            CellGeometry::Single => Ok(()),
            CellGeometry::Dual { width, height } => {
                let area = width as usize * height as usize;
                if area == 0 || area > MAX_DUAL_SUBPIXELS {
                    Err(format!(
                        "dual cells must cover 1 to {MAX_DUAL_SUBPIXELS} sub-pixels, got {area}"
                    ))
                } else {
                    Ok(())
                }
            }
        }
    }
}

impl fmt::Display for CellGeometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellGeometry::Single => write!(f, "single"),
            CellGeometry::Dual { width, height } => write!(f, "dual {width}x{height}"),
        }
    }
}

/// Handling of frames whose size is not a multiple of the cell size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SizeMismatch {
    /// Reject the input with `UnsupportedGeometry`
    #[default]
    Fail,
    /// Extend right and bottom edges with the palette's darkest entry
    Pad,
}

/// Frame payload storage strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoragePolicy {
    /// Every frame stored verbatim
    Full,
    /// Smallest of raw, run-length, or XOR-delta + run-length per frame
    #[default]
    Delta,
}
