//! Test fixtures: frames, palettes and configs.

use ctif::{CellGeometry, EncodeConfig, RawFrame, StoragePolicy};
use ctif_dither::{DitherMode, PaletteConfig, Rgb};

pub const RED: Rgb = Rgb::new(255, 0, 0);
pub const GREEN: Rgb = Rgb::new(0, 255, 0);
pub const BLUE: Rgb = Rgb::new(0, 0, 255);

/// Install a test subscriber once; honours `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Frame filled with one colour.
pub fn solid_frame(width: usize, height: usize, color: Rgb) -> RawFrame {
    RawFrame::from_pixels(width, height, &vec![color; width * height])
}

/// Diagonal colour ramp; `phase` shifts it so consecutive frames differ.
pub fn gradient_frame(width: usize, height: usize, phase: usize) -> RawFrame {
    let pixels: Vec<Rgb> = (0..height)
        .flat_map(|y| {
            (0..width).map(move |x| {
                let t = ((x + y + phase) * 255 / (width + height).max(1)) as u8;
                Rgb::new(t, 255 - t, ((x * 37 + y * 11) % 256) as u8)
            })
        })
        .collect();
    RawFrame::from_pixels(width, height, &pixels)
}

/// Short clip of gradient frames with a still section in the middle.
pub fn clip(width: usize, height: usize) -> Vec<RawFrame> {
    vec![
        gradient_frame(width, height, 0),
        gradient_frame(width, height, 3),
        gradient_frame(width, height, 3),
        gradient_frame(width, height, 3),
        gradient_frame(width, height, 9),
    ]
}

/// Config with a custom palette and no dithering.
pub fn custom_config(colors: &[&str]) -> EncodeConfig {
    EncodeConfig {
        palette: PaletteConfig::Custom(colors.iter().map(|c| c.to_string()).collect()),
        dither: DitherMode::None,
        ..Default::default()
    }
}

pub fn dual_config(storage: StoragePolicy) -> EncodeConfig {
    EncodeConfig {
        cell: CellGeometry::Dual { width: 2, height: 4 },
        storage,
        ..Default::default()
    }
}
