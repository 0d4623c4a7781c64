//! Static Material palettes and the text-contrast table.
//!
//! Nineteen named palettes, each mapping the hue ladder
//! `50, 100, ..., 900, A100, A200, A400, A700` to an sRGB color. Brown, Gray
//! and BlueGray carry no A-tier hues.
//!
//! ```
//! use mdkit_components::color_definitions::{Hue, Palette, lookup, text_on};
//! use mdkit_ui::Color;
//!
//! assert_eq!(lookup(Palette::Red, Hue::H500).unwrap(), Color::from_rgb_hex(0xF44336));
//! assert_eq!(text_on(Palette::Red, Hue::H500).unwrap(), Color::WHITE);
//! assert!(lookup(Palette::Gray, Hue::A200).is_err());
//! ```

use std::{fmt, str::FromStr};

use mdkit_ui::Color;
use serde::{Deserialize, Serialize};

use crate::error::{ThemeError, ThemeResult};

/// A named static palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Palette {
    /// Red.
    Red,
    /// Pink.
    Pink,
    /// Purple.
    Purple,
    /// Deep purple.
    DeepPurple,
    /// Indigo.
    Indigo,
    /// Blue.
    #[default]
    Blue,
    /// Light blue.
    LightBlue,
    /// Cyan.
    Cyan,
    /// Teal.
    Teal,
    /// Green.
    Green,
    /// Light green.
    LightGreen,
    /// Lime.
    Lime,
    /// Yellow.
    Yellow,
    /// Amber.
    Amber,
    /// Orange.
    Orange,
    /// Deep orange.
    DeepOrange,
    /// Brown (no A-tier).
    Brown,
    /// Gray (no A-tier).
    Gray,
    /// Blue gray (no A-tier).
    BlueGray,
}

impl Palette {
    /// Every palette in hue-wheel order, neutrals last.
    pub const ALL: [Palette; 19] = [
        Palette::Red,
        Palette::Pink,
        Palette::Purple,
        Palette::DeepPurple,
        Palette::Indigo,
        Palette::Blue,
        Palette::LightBlue,
        Palette::Cyan,
        Palette::Teal,
        Palette::Green,
        Palette::LightGreen,
        Palette::Lime,
        Palette::Yellow,
        Palette::Amber,
        Palette::Orange,
        Palette::DeepOrange,
        Palette::Brown,
        Palette::Gray,
        Palette::BlueGray,
    ];

    const CHROMATIC: usize = 16;

    /// Palette name as written in configuration.
    pub fn name(self) -> &'static str {
        match self {
            Palette::Red => "Red",
            Palette::Pink => "Pink",
            Palette::Purple => "Purple",
            Palette::DeepPurple => "DeepPurple",
            Palette::Indigo => "Indigo",
            Palette::Blue => "Blue",
            Palette::LightBlue => "LightBlue",
            Palette::Cyan => "Cyan",
            Palette::Teal => "Teal",
            Palette::Green => "Green",
            Palette::LightGreen => "LightGreen",
            Palette::Lime => "Lime",
            Palette::Yellow => "Yellow",
            Palette::Amber => "Amber",
            Palette::Orange => "Orange",
            Palette::DeepOrange => "DeepOrange",
            Palette::Brown => "Brown",
            Palette::Gray => "Gray",
            Palette::BlueGray => "BlueGray",
        }
    }

    /// Whether the palette has A-tier hues.
    pub fn has_accents(self) -> bool {
        !matches!(self, Palette::Brown | Palette::Gray | Palette::BlueGray)
    }

    fn index(self) -> usize {
        self as usize
    }

    /// Palettes used for the secondary and tertiary roles of the static
    /// scheme: the next palette on the hue wheel and the opposite one.
    /// Neutral palettes pair with each other and a muted accent.
    pub fn companions(self) -> (Palette, Palette) {
        match self {
            Palette::Brown => (Palette::BlueGray, Palette::DeepOrange),
            Palette::Gray => (Palette::BlueGray, Palette::Brown),
            Palette::BlueGray => (Palette::Gray, Palette::Teal),
            chromatic => {
                let i = chromatic.index();
                (
                    Palette::ALL[(i + 1) % Self::CHROMATIC],
                    Palette::ALL[(i + Self::CHROMATIC / 2) % Self::CHROMATIC],
                )
            }
        }
    }
}

impl fmt::Display for Palette {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Palette {
    type Err = ThemeError;

    /// Accepts the exact name and a few spellings (`"deep_purple"`,
    /// `"Grey"`).
    fn from_str(s: &str) -> ThemeResult<Self> {
        let normalized: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase()
            .replace("grey", "gray");
        Palette::ALL
            .into_iter()
            .find(|p| p.name().to_ascii_lowercase() == normalized)
            .ok_or_else(|| ThemeError::UnknownPalette { name: s.to_owned() })
    }
}

/// A hue on the palette ladder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Hue {
    /// 50.
    H50,
    /// 100.
    H100,
    /// 200.
    H200,
    /// 300.
    H300,
    /// 400.
    H400,
    /// 500.
    H500,
    /// 600.
    H600,
    /// 700.
    H700,
    /// 800.
    H800,
    /// 900.
    H900,
    /// A100.
    A100,
    /// A200.
    A200,
    /// A400.
    A400,
    /// A700.
    A700,
}

impl Hue {
    /// Ordered ladder.
    pub const ALL: [Hue; 14] = [
        Hue::H50,
        Hue::H100,
        Hue::H200,
        Hue::H300,
        Hue::H400,
        Hue::H500,
        Hue::H600,
        Hue::H700,
        Hue::H800,
        Hue::H900,
        Hue::A100,
        Hue::A200,
        Hue::A400,
        Hue::A700,
    ];

    /// Hue name, e.g. `"500"` or `"A200"`.
    pub fn name(self) -> &'static str {
        match self {
            Hue::H50 => "50",
            Hue::H100 => "100",
            Hue::H200 => "200",
            Hue::H300 => "300",
            Hue::H400 => "400",
            Hue::H500 => "500",
            Hue::H600 => "600",
            Hue::H700 => "700",
            Hue::H800 => "800",
            Hue::H900 => "900",
            Hue::A100 => "A100",
            Hue::A200 => "A200",
            Hue::A400 => "A400",
            Hue::A700 => "A700",
        }
    }

    /// Whether this is an accent hue.
    pub fn is_accent(self) -> bool {
        matches!(self, Hue::A100 | Hue::A200 | Hue::A400 | Hue::A700)
    }

    /// The non-accent hue with the same number (`A100 -> 100`).
    pub fn base(self) -> Hue {
        match self {
            Hue::A100 => Hue::H100,
            Hue::A200 => Hue::H200,
            Hue::A400 => Hue::H400,
            Hue::A700 => Hue::H700,
            other => other,
        }
    }

    fn index(self) -> usize {
        self as usize
    }

    /// Parses a hue name for `palette`, reporting the palette on failure.
    pub fn parse_for(palette: Palette, s: &str) -> ThemeResult<Hue> {
        Hue::ALL
            .into_iter()
            .find(|h| h.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ThemeError::UnknownHue {
                palette: palette.name().to_owned(),
                hue: s.to_owned(),
            })
    }
}

impl fmt::Display for Hue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Ladder values `50..900` followed by `A100, A200, A400, A700` (zero for
/// palettes without accents).
const PALETTES: [[u32; 14]; 19] = [
    // Red
    [
        0xFFEBEE, 0xFFCDD2, 0xEF9A9A, 0xE57373, 0xEF5350, 0xF44336, 0xE53935, 0xD32F2F, 0xC62828,
        0xB71C1C, 0xFF8A80, 0xFF5252, 0xFF1744, 0xD50000,
    ],
    // Pink
    [
        0xFCE4EC, 0xF8BBD0, 0xF48FB1, 0xF06292, 0xEC407A, 0xE91E63, 0xD81B60, 0xC2185B, 0xAD1457,
        0x880E4F, 0xFF80AB, 0xFF4081, 0xF50057, 0xC51162,
    ],
    // Purple
    [
        0xF3E5F5, 0xE1BEE7, 0xCE93D8, 0xBA68C8, 0xAB47BC, 0x9C27B0, 0x8E24AA, 0x7B1FA2, 0x6A1B9A,
        0x4A148C, 0xEA80FC, 0xE040FB, 0xD500F9, 0xAA00FF,
    ],
    // DeepPurple
    [
        0xEDE7F6, 0xD1C4E9, 0xB39DDB, 0x9575CD, 0x7E57C2, 0x673AB7, 0x5E35B1, 0x512DA8, 0x4527A0,
        0x311B92, 0xB388FF, 0x7C4DFF, 0x651FFF, 0x6200EA,
    ],
    // Indigo
    [
        0xE8EAF6, 0xC5CAE9, 0x9FA8DA, 0x7986CB, 0x5C6BC0, 0x3F51B5, 0x3949AB, 0x303F9F, 0x283593,
        0x1A237E, 0x8C9EFF, 0x536DFE, 0x3D5AFE, 0x304FFE,
    ],
    // Blue
    [
        0xE3F2FD, 0xBBDEFB, 0x90CAF9, 0x64B5F6, 0x42A5F5, 0x2196F3, 0x1E88E5, 0x1976D2, 0x1565C0,
        0x0D47A1, 0x82B1FF, 0x448AFF, 0x2979FF, 0x2962FF,
    ],
    // LightBlue
    [
        0xE1F5FE, 0xB3E5FC, 0x81D4FA, 0x4FC3F7, 0x29B6F6, 0x03A9F4, 0x039BE5, 0x0288D1, 0x0277BD,
        0x01579B, 0x80D8FF, 0x40C4FF, 0x00B0FF, 0x0091EA,
    ],
    // Cyan
    [
        0xE0F7FA, 0xB2EBF2, 0x80DEEA, 0x4DD0E1, 0x26C6DA, 0x00BCD4, 0x00ACC1, 0x0097A7, 0x00838F,
        0x006064, 0x84FFFF, 0x18FFFF, 0x00E5FF, 0x00B8D4,
    ],
    // Teal
    [
        0xE0F2F1, 0xB2DFDB, 0x80CBC4, 0x4DB6AC, 0x26A69A, 0x009688, 0x00897B, 0x00796B, 0x00695C,
        0x004D40, 0xA7FFEB, 0x64FFDA, 0x1DE9B6, 0x00BFA5,
    ],
    // Green
    [
        0xE8F5E9, 0xC8E6C9, 0xA5D6A7, 0x81C784, 0x66BB6A, 0x4CAF50, 0x43A047, 0x388E3C, 0x2E7D32,
        0x1B5E20, 0xB9F6CA, 0x69F0AE, 0x00E676, 0x00C853,
    ],
    // LightGreen
    [
        0xF1F8E9, 0xDCEDC8, 0xC5E1A5, 0xAED581, 0x9CCC65, 0x8BC34A, 0x7CB342, 0x689F38, 0x558B2F,
        0x33691E, 0xCCFF90, 0xB2FF59, 0x76FF03, 0x64DD17,
    ],
    // Lime
    [
        0xF9FBE7, 0xF0F4C3, 0xE6EE9C, 0xDCE775, 0xD4E157, 0xCDDC39, 0xC0CA33, 0xAFB42B, 0x9E9D24,
        0x827717, 0xF4FF81, 0xEEFF41, 0xC6FF00, 0xAEEA00,
    ],
    // Yellow
    [
        0xFFFDE7, 0xFFF9C4, 0xFFF59D, 0xFFF176, 0xFFEE58, 0xFFEB3B, 0xFDD835, 0xFBC02D, 0xF9A825,
        0xF57F17, 0xFFFF8D, 0xFFFF00, 0xFFEA00, 0xFFD600,
    ],
    // Amber
    [
        0xFFF8E1, 0xFFECB3, 0xFFE082, 0xFFD54F, 0xFFCA28, 0xFFC107, 0xFFB300, 0xFFA000, 0xFF8F00,
        0xFF6F00, 0xFFE57F, 0xFFD740, 0xFFC400, 0xFFAB00,
    ],
    // Orange
    [
        0xFFF3E0, 0xFFE0B2, 0xFFCC80, 0xFFB74D, 0xFFA726, 0xFF9800, 0xFB8C00, 0xF57C00, 0xEF6C00,
        0xE65100, 0xFFD180, 0xFFAB40, 0xFF9100, 0xFF6D00,
    ],
    // DeepOrange
    [
        0xFBE9E7, 0xFFCCBC, 0xFFAB91, 0xFF8A65, 0xFF7043, 0xFF5722, 0xF4511E, 0xE64A19, 0xD84315,
        0xBF360C, 0xFF9E80, 0xFF6E40, 0xFF3D00, 0xDD2C00,
    ],
    // Brown
    [
        0xEFEBE9, 0xD7CCC8, 0xBCAAA4, 0xA1887F, 0x8D6E63, 0x795548, 0x6D4C41, 0x5D4037, 0x4E342E,
        0x3E2723, 0, 0, 0, 0,
    ],
    // Gray
    [
        0xFAFAFA, 0xF5F5F5, 0xEEEEEE, 0xE0E0E0, 0xBDBDBD, 0x9E9E9E, 0x757575, 0x616161, 0x424242,
        0x212121, 0, 0, 0, 0,
    ],
    // BlueGray
    [
        0xECEFF1, 0xCFD8DC, 0xB0BEC5, 0x90A4AE, 0x78909C, 0x607D8B, 0x546E7A, 0x455A64, 0x37474F,
        0x263238, 0, 0, 0, 0,
    ],
];

/// Text tone on a hue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tone {
    Dark,
    Light,
}

const D: Tone = Tone::Dark;
const L: Tone = Tone::Light;

/// Contrast rows: tones for `50..900`, then tones for the accents when the
/// table carries them. Missing accent rows fall back to the base hue.
const TEXT_TONES: [([Tone; 10], Option<[Tone; 4]>); 19] = [
    ([D, D, D, D, L, L, L, L, L, L], Some([D, L, L, L])), // Red
    ([D, D, D, L, L, L, L, L, L, L], Some([D, L, L, L])), // Pink
    ([D, D, D, L, L, L, L, L, L, L], Some([D, L, L, L])), // Purple
    ([D, D, D, L, L, L, L, L, L, L], Some([D, L, L, L])), // DeepPurple
    ([D, D, D, L, L, L, L, L, L, L], Some([D, L, L, L])), // Indigo
    ([D, D, D, D, D, L, L, L, L, L], Some([D, L, L, L])), // Blue
    ([D, D, D, D, D, D, L, L, L, L], Some([D, D, D, L])), // LightBlue
    ([D, D, D, D, D, D, D, L, L, L], None),               // Cyan
    ([D, D, D, D, D, L, L, L, L, L], Some([D, D, D, D])), // Teal
    ([D, D, D, D, D, D, L, L, L, L], Some([D, D, D, D])), // Green
    ([D, D, D, D, D, D, D, D, L, L], Some([D, D, D, D])), // LightGreen
    ([D, D, D, D, D, D, D, D, D, L], None),               // Lime
    ([D, D, D, D, D, D, D, D, D, D], None),               // Yellow
    ([D, D, D, D, D, D, D, D, D, D], None),               // Amber
    ([D, D, D, D, D, D, D, D, D, L], Some([D, D, D, D])), // Orange
    ([D, D, D, D, D, L, L, L, L, L], Some([D, D, L, L])), // DeepOrange
    ([D, D, D, L, L, L, L, L, L, L], None),               // Brown
    ([D, D, D, D, D, D, L, L, L, L], None),               // Gray
    ([D, D, D, D, L, L, L, L, L, L], None),               // BlueGray
];

fn check_hue(palette: Palette, hue: Hue) -> ThemeResult<()> {
    if hue.is_accent() && !palette.has_accents() {
        return Err(ThemeError::UnknownHue {
            palette: palette.name().to_owned(),
            hue: hue.name().to_owned(),
        });
    }
    Ok(())
}

/// Exact palette lookup.
pub fn lookup(palette: Palette, hue: Hue) -> ThemeResult<Color> {
    check_hue(palette, hue)?;
    Ok(Color::from_rgb_hex(PALETTES[palette.index()][hue.index()]))
}

/// Lookup by names, e.g. `("Red", "A200")`.
pub fn lookup_by_name(palette: &str, hue: &str) -> ThemeResult<Color> {
    let palette: Palette = palette.parse()?;
    lookup(palette, Hue::parse_for(palette, hue)?)
}

/// Text color with enough contrast on `palette[hue]`.
pub fn text_on(palette: Palette, hue: Hue) -> ThemeResult<Color> {
    check_hue(palette, hue)?;
    let (base, accents) = &TEXT_TONES[palette.index()];
    let tone = match (hue.is_accent(), accents) {
        (true, Some(accents)) => accents[hue.index() - Hue::A100.index()],
        _ => base[hue.base().index()],
    };
    Ok(match tone {
        Tone::Dark => Color::BLACK,
        Tone::Light => Color::WHITE,
    })
}

/// Parses `#RGB`, `#RRGGBB` or `#RRGGBBAA`.
pub fn get_color_from_hex(hex: &str) -> Result<Color, mdkit_ui::ParseColorError> {
    Color::from_hex(hex)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_palette_has_full_base_ladder() {
        for palette in Palette::ALL {
            for hue in &Hue::ALL[..10] {
                assert!(lookup(palette, *hue).is_ok(), "{palette} {hue}");
            }
        }
    }

    #[test]
    fn neutral_palettes_reject_accents() {
        for palette in [Palette::Brown, Palette::Gray, Palette::BlueGray] {
            assert!(matches!(
                lookup(palette, Hue::A100),
                Err(ThemeError::UnknownHue { .. })
            ));
            assert!(text_on(palette, Hue::A700).is_err());
        }
    }

    #[test]
    fn accent_contrast_falls_back_to_base_hue() {
        assert_eq!(
            text_on(Palette::Cyan, Hue::A700).unwrap(),
            text_on(Palette::Cyan, Hue::H700).unwrap()
        );
    }

    #[test]
    fn names_parse() {
        assert_eq!("DeepPurple".parse::<Palette>().unwrap(), Palette::DeepPurple);
        assert_eq!("blue_grey".parse::<Palette>().unwrap(), Palette::BlueGray);
        assert!(matches!(
            "Mauve".parse::<Palette>(),
            Err(ThemeError::UnknownPalette { .. })
        ));
        assert_eq!(
            lookup_by_name("Teal", "a400").unwrap(),
            Color::from_rgb_hex(0x1DE9B6)
        );
        assert!(matches!(
            lookup_by_name("Teal", "550"),
            Err(ThemeError::UnknownHue { .. })
        ));
    }

    #[test]
    fn companions_wrap_around_the_wheel() {
        assert_eq!(
            Palette::DeepOrange.companions(),
            (Palette::Red, Palette::Cyan)
        );
        assert_eq!(Palette::Red.companions(), (Palette::Pink, Palette::Teal));
    }
}
