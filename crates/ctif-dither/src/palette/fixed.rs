//! Built-in palette tables.

use serde::{Deserialize, Serialize};

use super::Palette;
use crate::color::Rgb;

/// Hard-coded palettes for common terminal-like targets.
///
/// Every variant is deterministic and independent of the input image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FixedPalette {
    /// Black and white.
    Mono,
    /// The 16 standard terminal colours (xterm defaults).
    #[default]
    Ansi16,
    /// 16 evenly spaced greys (`17 * i`).
    Grey16,
    /// 16 greys followed by a 6x8x5 RGB cube: 256 entries.
    Oc256,
}

const ANSI16: [Rgb; 16] = [
    Rgb::new(0x00, 0x00, 0x00),
    Rgb::new(0xCD, 0x00, 0x00),
    Rgb::new(0x00, 0xCD, 0x00),
    Rgb::new(0xCD, 0xCD, 0x00),
    Rgb::new(0x00, 0x00, 0xEE),
    Rgb::new(0xCD, 0x00, 0xCD),
    Rgb::new(0x00, 0xCD, 0xCD),
    Rgb::new(0xE5, 0xE5, 0xE5),
    Rgb::new(0x7F, 0x7F, 0x7F),
    Rgb::new(0xFF, 0x00, 0x00),
    Rgb::new(0x00, 0xFF, 0x00),
    Rgb::new(0xFF, 0xFF, 0x00),
    Rgb::new(0x5C, 0x5C, 0xFF),
    Rgb::new(0xFF, 0x00, 0xFF),
    Rgb::new(0x00, 0xFF, 0xFF),
    Rgb::new(0xFF, 0xFF, 0xFF),
];

impl FixedPalette {
    /// The colour table for this palette.
    pub fn colors(self) -> Vec<Rgb> {
        match self {
            FixedPalette::Mono => vec![Rgb::BLACK, Rgb::WHITE],
            FixedPalette::Ansi16 => ANSI16.to_vec(),
            FixedPalette::Grey16 => grey_ramp(),
            FixedPalette::Oc256 => {
                let mut colors = grey_ramp();
                colors.extend((0..240u32).map(|i| {
                    Rgb::new(
                        (((i / 40) % 6) * 255 / 5) as u8,
                        (((i / 5) % 8) * 255 / 7) as u8,
                        ((i % 5) * 255 / 4) as u8,
                    )
                }));
                colors
            }
        }
    }

    /// Build the [`Palette`]. Infallible: every table holds 2..=256 entries.
    pub fn palette(self) -> Palette {
        let colors = self.colors();
        match Palette::new(&colors) {
            Ok(palette) => palette,
            Err(err) => unreachable!("built-in palette {self:?} is invalid: {err}"),
        }
    }
}

fn grey_ramp() -> Vec<Rgb> {
    (0..16u8).map(|i| Rgb::new(17 * i, 17 * i, 17 * i)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_sizes() {
        assert_eq!(FixedPalette::Mono.palette().len(), 2);
        assert_eq!(FixedPalette::Ansi16.palette().len(), 16);
        assert_eq!(FixedPalette::Grey16.palette().len(), 16);
        assert_eq!(FixedPalette::Oc256.palette().len(), 256);
    }

    #[test]
    fn test_fixed_is_deterministic() {
        for fixed in [
            FixedPalette::Mono,
            FixedPalette::Ansi16,
            FixedPalette::Grey16,
            FixedPalette::Oc256,
        ] {
            assert_eq!(fixed.palette(), fixed.palette());
        }
    }

    #[test]
    fn test_oc256_layout() {
        let colors = FixedPalette::Oc256.colors();
        assert_eq!(colors[15], Rgb::WHITE);
        // First cube entry is black, last is white
        assert_eq!(colors[16], Rgb::BLACK);
        assert_eq!(colors[255], Rgb::WHITE);
        // Blue axis has 5 levels
        assert_eq!(colors[17], Rgb::new(0, 0, 63));
        assert_eq!(colors[20], Rgb::new(0, 0, 255));
    }

    #[test]
    fn test_ansi16_endpoints() {
        let colors = FixedPalette::Ansi16.colors();
        assert_eq!(colors[0], Rgb::BLACK);
        assert_eq!(colors[15], Rgb::WHITE);
    }
}
