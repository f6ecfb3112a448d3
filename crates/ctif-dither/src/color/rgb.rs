//! 8-bit RGB colour type with hex parsing.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::palette::ParseColorError;

/// An 8-bit RGB colour.
///
/// Ordering is lexicographic on `(r, g, b)`, which gives colour histograms
/// a stable iteration order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);

    #[inline]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Create from a byte array `[R, G, B]`.
    #[inline]
    pub const fn from_bytes(bytes: [u8; 3]) -> Self {
        Self::new(bytes[0], bytes[1], bytes[2])
    }

    #[inline]
    pub const fn to_bytes(self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }

    /// Composite an RGBA pixel over black.
    ///
    /// # Example
    /// ```
    /// use ctif_dither::Rgb;
    /// assert_eq!(Rgb::from_rgba([255, 255, 255, 0]), Rgb::BLACK);
    /// assert_eq!(Rgb::from_rgba([200, 100, 50, 255]), Rgb::new(200, 100, 50));
    /// ```
    #[inline]
    pub fn from_rgba(rgba: [u8; 4]) -> Self {
        let a = rgba[3] as u16;
        let scale = |c: u8| ((c as u16 * a + 127) / 255) as u8;
        Self::new(scale(rgba[0]), scale(rgba[1]), scale(rgba[2]))
    }

    /// Channels as floats in the 0.0..=255.0 scale.
    #[inline]
    pub fn to_f32(self) -> [f32; 3] {
        [self.r as f32, self.g as f32, self.b as f32]
    }

    /// Round and clamp a float triple back into an `Rgb`.
    #[inline]
    pub fn from_f32(channels: [f32; 3]) -> Self {
        let c = |v: f32| v.round().clamp(0.0, 255.0) as u8;
        Self::new(c(channels[0]), c(channels[1]), c(channels[2]))
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

impl FromStr for Rgb {
    type Err = ParseColorError;

    /// Parse a colour from a hex string.
    ///
    /// Accepts `#RRGGBB`, `RRGGBB`, `#RGB` and `RGB`, case-insensitive,
    /// surrounding whitespace ignored.
    ///
    /// ```
    /// use ctif_dither::Rgb;
    ///
    /// let red: Rgb = "#F00".parse().unwrap();
    /// assert_eq!(red, Rgb::new(255, 0, 0));
    /// ```
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let s = s.strip_prefix('#').unwrap_or(s);

        if !s.is_ascii() {
            return Err(ParseColorError::InvalidLength(s.chars().count()));
        }

        match s.len() {
            3 => {
                // Shorthand: 0xF -> 0xFF
                let r = u8::from_str_radix(&s[0..1], 16)? * 17;
                let g = u8::from_str_radix(&s[1..2], 16)? * 17;
                let b = u8::from_str_radix(&s[2..3], 16)? * 17;
                Ok(Self::new(r, g, b))
            }
            6 => {
                let r = u8::from_str_radix(&s[0..2], 16)?;
                let g = u8::from_str_radix(&s[2..4], 16)?;
                let b = u8::from_str_radix(&s[4..6], 16)?;
                Ok(Self::new(r, g, b))
            }
            len => Err(ParseColorError::InvalidLength(len)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_six_digit() {
        let c: Rgb = "#1A2b3C".parse().unwrap();
        assert_eq!(c, Rgb::new(0x1A, 0x2B, 0x3C));
    }

    #[test]
    fn test_parse_shorthand_and_no_hash() {
        assert_eq!("fff".parse::<Rgb>().unwrap(), Rgb::WHITE);
        assert_eq!("  #000  ".parse::<Rgb>().unwrap(), Rgb::BLACK);
        assert_eq!("808080".parse::<Rgb>().unwrap(), Rgb::new(128, 128, 128));
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            "#12345".parse::<Rgb>(),
            Err(ParseColorError::InvalidLength(5))
        ));
        assert!(matches!(
            "#GG0000".parse::<Rgb>(),
            Err(ParseColorError::InvalidHex(_))
        ));
        assert!(matches!(
            "#ééé".parse::<Rgb>(),
            Err(ParseColorError::InvalidLength(3))
        ));
    }

    #[test]
    fn test_display_round_trips_through_parse() {
        let c = Rgb::new(3, 200, 17);
        assert_eq!(c.to_string(), "#03C811");
        assert_eq!(c.to_string().parse::<Rgb>().unwrap(), c);
    }

    #[test]
    fn test_rgba_composite_over_black() {
        assert_eq!(Rgb::from_rgba([255, 0, 0, 128]), Rgb::new(128, 0, 0));
        assert_eq!(Rgb::from_rgba([10, 20, 30, 255]), Rgb::new(10, 20, 30));
    }

    #[test]
    fn test_from_f32_clamps() {
        assert_eq!(Rgb::from_f32([-4.0, 300.0, 127.5]), Rgb::new(0, 255, 128));
    }

    #[test]
    fn test_ordering_is_lexicographic() {
        assert!(Rgb::new(0, 255, 255) < Rgb::new(1, 0, 0));
        assert!(Rgb::new(5, 1, 0) < Rgb::new(5, 1, 1));
    }
}
