//! RGBA colors in the sRGB space.
//!
//! Channels are `f32` in `[0.0, 1.0]`. Colors are stored exactly as the
//! Material tokens specify them (gamma-encoded sRGB), so a value read back
//! from the theme compares bitwise with the token table.

use std::{fmt, str::FromStr};

/// A color in the sRGB color space with an alpha component.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Color {
    /// Red channel.
    pub r: f32,
    /// Green channel.
    pub g: f32,
    /// Blue channel.
    pub b: f32,
    /// Alpha channel.
    pub a: f32,
}

impl Color {
    /// Fully transparent black.
    pub const TRANSPARENT: Color = Color::new(0.0, 0.0, 0.0, 0.0);
    /// Opaque black.
    pub const BLACK: Color = Color::new(0.0, 0.0, 0.0, 1.0);
    /// Opaque white.
    pub const WHITE: Color = Color::new(1.0, 1.0, 1.0, 1.0);

    /// Creates a new `Color` from four `f32` values (red, green, blue, alpha).
    #[inline]
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Creates a new opaque `Color` from three `f32` values (red, green, blue).
    #[inline]
    pub const fn from_rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    /// Creates a new `Color` from four `u8` values (red, green, blue, alpha).
    #[inline]
    pub fn from_rgba_u8(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self {
            r: r as f32 / 255.0,
            g: g as f32 / 255.0,
            b: b as f32 / 255.0,
            a: a as f32 / 255.0,
        }
    }

    /// Creates a new opaque `Color` from three `u8` values (red, green, blue).
    #[inline]
    pub fn from_rgb_u8(r: u8, g: u8, b: u8) -> Self {
        Self::from_rgba_u8(r, g, b, 255)
    }

    /// Creates an opaque color from a packed `0xRRGGBB` value.
    pub const fn from_rgb_hex(hex: u32) -> Self {
        Self {
            r: ((hex >> 16) & 0xFF) as f32 / 255.0,
            g: ((hex >> 8) & 0xFF) as f32 / 255.0,
            b: (hex & 0xFF) as f32 / 255.0,
            a: 1.0,
        }
    }

    /// Creates a color from a packed `0xAARRGGBB` value.
    pub fn from_argb(argb: u32) -> Self {
        Self::from_rgba_u8(
            ((argb >> 16) & 0xFF) as u8,
            ((argb >> 8) & 0xFF) as u8,
            (argb & 0xFF) as u8,
            ((argb >> 24) & 0xFF) as u8,
        )
    }

    /// Packs the color into `0xAARRGGBB`.
    pub fn to_argb(self) -> u32 {
        let channel = |v: f32| (v.clamp(0.0, 1.0) * 255.0 + 0.5) as u32;
        (channel(self.a) << 24) | (channel(self.r) << 16) | (channel(self.g) << 8) | channel(self.b)
    }

    /// Parses `#RGB`, `#RRGGBB` or `#RRGGBBAA` (leading `#` optional).
    pub fn from_hex(hex: &str) -> Result<Self, ParseColorError> {
        let digits = hex.trim().trim_start_matches('#');
        let nibble = |i: usize| -> Result<u8, ParseColorError> {
            digits
                .get(i..i + 1)
                .and_then(|d| u8::from_str_radix(d, 16).ok())
                .ok_or_else(|| ParseColorError(hex.to_string()))
        };
        let byte =
            |i: usize| -> Result<u8, ParseColorError> { Ok(nibble(i)? << 4 | nibble(i + 1)?) };
        match digits.len() {
            3 => Ok(Self::from_rgb_u8(
                nibble(0)? * 17,
                nibble(1)? * 17,
                nibble(2)? * 17,
            )),
            6 => Ok(Self::from_rgb_u8(byte(0)?, byte(2)?, byte(4)?)),
            8 => Ok(Self::from_rgba_u8(byte(0)?, byte(2)?, byte(4)?, byte(6)?)),
            _ => Err(ParseColorError(hex.to_string())),
        }
    }

    /// Formats as `#RRGGBBAA`.
    pub fn to_hex(self) -> String {
        let argb = self.to_argb();
        format!("#{:06X}{:02X}", argb & 0x00FF_FFFF, argb >> 24)
    }

    /// Returns the same color with a different alpha.
    #[inline]
    pub const fn with_alpha(self, a: f32) -> Self {
        Self { a, ..self }
    }

    /// Returns the same color with its alpha multiplied by `factor`.
    #[inline]
    pub fn multiply_alpha(self, factor: f32) -> Self {
        Self {
            a: (self.a * factor).clamp(0.0, 1.0),
            ..self
        }
    }

    /// Blends `overlay` at `alpha` on top of `self`, keeping `self`'s alpha.
    pub fn blend_over(self, overlay: Color, alpha: f32) -> Self {
        let t = alpha.clamp(0.0, 1.0);
        Self {
            r: self.r + (overlay.r - self.r) * t,
            g: self.g + (overlay.g - self.g) * t,
            b: self.b + (overlay.b - self.b) * t,
            a: self.a,
        }
    }

    /// Source-over compositing of `overlay` on `self`.
    pub fn composite(self, overlay: Color) -> Self {
        let overlay_a = overlay.a.clamp(0.0, 1.0);
        let base_a = self.a.clamp(0.0, 1.0);
        let out_a = overlay_a + base_a * (1.0 - overlay_a);
        if out_a <= 0.0 {
            return Color::TRANSPARENT;
        }
        let mix = |o: f32, b: f32| (o * overlay_a + b * base_a * (1.0 - overlay_a)) / out_a;
        Color::new(
            mix(overlay.r, self.r),
            mix(overlay.g, self.g),
            mix(overlay.b, self.b),
            out_a,
        )
    }

    /// Linear interpolation of every channel.
    pub fn lerp(self, to: Color, t: f32) -> Self {
        Self {
            r: self.r + (to.r - self.r) * t,
            g: self.g + (to.g - self.g) * t,
            b: self.b + (to.b - self.b) * t,
            a: self.a + (to.a - self.a) * t,
        }
    }

    /// Relative luminance as defined by WCAG.
    pub fn luminance(self) -> f32 {
        let lin = |v: f32| {
            if v <= 0.04045 {
                v / 12.92
            } else {
                ((v + 0.055) / 1.055).powf(2.4)
            }
        };
        0.2126 * lin(self.r) + 0.7152 * lin(self.g) + 0.0722 * lin(self.b)
    }

    /// Channel-wise comparison within `epsilon`.
    pub fn approx_eq(self, other: Color, epsilon: f32) -> bool {
        (self.r - other.r).abs() <= epsilon
            && (self.g - other.g).abs() <= epsilon
            && (self.b - other.b).abs() <= epsilon
            && (self.a - other.a).abs() <= epsilon
    }

    /// Converts the color to an array of `[f32; 4]`.
    #[inline]
    pub fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

/// The default color is fully transparent.
impl Default for Color {
    #[inline]
    fn default() -> Self {
        Self::TRANSPARENT
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for Color {
    type Err = ParseColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

/// Returned when a hex color string is malformed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid hex color `{0}`")]
pub struct ParseColorError(pub String);

impl From<[f32; 4]> for Color {
    #[inline]
    fn from([r, g, b, a]: [f32; 4]) -> Self {
        Self { r, g, b, a }
    }
}

impl From<Color> for [f32; 4] {
    #[inline]
    fn from(color: Color) -> Self {
        [color.r, color.g, color.b, color.a]
    }
}

impl From<[f32; 3]> for Color {
    #[inline]
    fn from([r, g, b]: [f32; 3]) -> Self {
        Self { r, g, b, a: 1.0 }
    }
}

impl From<[u8; 4]> for Color {
    #[inline]
    fn from([r, g, b, a]: [u8; 4]) -> Self {
        Self::from_rgba_u8(r, g, b, a)
    }
}

impl From<[u8; 3]> for Color {
    #[inline]
    fn from([r, g, b]: [u8; 3]) -> Self {
        Self::from_rgb_u8(r, g, b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hex_forms() {
        assert_eq!(Color::from_hex("#fff").unwrap(), Color::WHITE);
        assert_eq!(Color::from_hex("000000").unwrap(), Color::BLACK);
        let c = Color::from_hex("#F4433680").unwrap();
        assert_eq!(c.to_argb(), 0x80F4_4336);
        assert!(Color::from_hex("#12345").is_err());
        assert!(Color::from_hex("#zzzzzz").is_err());
    }

    #[test]
    fn argb_round_trip_is_exact_for_bytes() {
        let c = Color::from_rgb_hex(0x904B40);
        assert_eq!(c.to_argb(), 0xFF90_4B40);
        assert_eq!(Color::from_argb(c.to_argb()), c);
        assert_eq!(c.to_hex(), "#904B40FF");
    }

    #[test]
    fn multiply_alpha_clamps() {
        let c = Color::WHITE.multiply_alpha(0.38);
        assert!((c.a - 0.38).abs() < f32::EPSILON);
        assert_eq!(Color::WHITE.multiply_alpha(4.0).a, 1.0);
    }

    #[test]
    fn composite_over_opaque_base() {
        let base = Color::WHITE;
        let out = base.composite(Color::BLACK.with_alpha(0.5));
        assert!(out.approx_eq(Color::new(0.5, 0.5, 0.5, 1.0), 1e-6));
        assert_eq!(Color::TRANSPARENT.composite(Color::TRANSPARENT), Color::TRANSPARENT);
    }
}
