//! Seed-to-scheme derivation.
//!
//! Two paths produce a [`ColorScheme`]:
//!
//! - [`derive_dynamic`] runs the Material 3 dynamic-color algorithm
//!   (`material-color-utilities`) on a seed color, a variant, the mode and a
//!   contrast level.
//! - [`derive_static`] assembles the roles from the fixed palettes: the
//!   primary palette's 500 hue, its companions for secondary and tertiary,
//!   the gray ladder for surfaces and red for errors.
//!
//! A wallpaper image can replace the seed; see [`wallpaper_seed`].

use std::{fmt, path::Path, str::FromStr};

use image::imageops::FilterType;
use material_color_utilities::{
    dynamiccolor::{DynamicSchemeBuilder, MaterialDynamicColors, SpecVersion, Variant},
    hct::Hct,
};
use mdkit_ui::Color;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::{
    color_definitions::{Hue, Palette, lookup, text_on},
    error::{ThemeError, ThemeResult},
    role::{ColorScheme, Role},
};

/// Edge of the square the wallpaper is downsampled to before bucketing.
pub const WALLPAPER_SAMPLE_EDGE: u32 = 112;

/// Algorithmic mapping from a seed to a full role set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SchemeVariant {
    /// Low-chroma primary, the Material default.
    #[default]
    TonalSpot,
    /// Saturated palettes.
    Vibrant,
    /// Primary hue rotated away from the seed.
    Expressive,
    /// Near-grayscale with a hint of the seed.
    Neutral,
    /// Pure grayscale.
    Monochrome,
    /// Primary keeps the seed's chroma.
    Fidelity,
    /// Like fidelity, tuned for content-derived seeds.
    Content,
    /// Playful, multi-hue.
    Rainbow,
    /// Playful, hue-rotated secondary and tertiary.
    FruitSalad,
}

impl SchemeVariant {
    /// Every variant.
    pub const ALL: [SchemeVariant; 9] = [
        SchemeVariant::TonalSpot,
        SchemeVariant::Vibrant,
        SchemeVariant::Expressive,
        SchemeVariant::Neutral,
        SchemeVariant::Monochrome,
        SchemeVariant::Fidelity,
        SchemeVariant::Content,
        SchemeVariant::Rainbow,
        SchemeVariant::FruitSalad,
    ];

    /// Name as written in configuration.
    pub fn name(self) -> &'static str {
        match self {
            SchemeVariant::TonalSpot => "TONAL_SPOT",
            SchemeVariant::Vibrant => "VIBRANT",
            SchemeVariant::Expressive => "EXPRESSIVE",
            SchemeVariant::Neutral => "NEUTRAL",
            SchemeVariant::Monochrome => "MONOCHROME",
            SchemeVariant::Fidelity => "FIDELITY",
            SchemeVariant::Content => "CONTENT",
            SchemeVariant::Rainbow => "RAINBOW",
            SchemeVariant::FruitSalad => "FRUIT_SALAD",
        }
    }

    fn to_mcu(self) -> Variant {
        match self {
            SchemeVariant::TonalSpot => Variant::TonalSpot,
            SchemeVariant::Vibrant => Variant::Vibrant,
            SchemeVariant::Expressive => Variant::Expressive,
            SchemeVariant::Neutral => Variant::Neutral,
            SchemeVariant::Monochrome => Variant::Monochrome,
            SchemeVariant::Fidelity => Variant::Fidelity,
            SchemeVariant::Content => Variant::Content,
            SchemeVariant::Rainbow => Variant::Rainbow,
            SchemeVariant::FruitSalad => Variant::FruitSalad,
        }
    }
}

impl fmt::Display for SchemeVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SchemeVariant {
    type Err = ThemeError;

    fn from_str(s: &str) -> ThemeResult<Self> {
        let wanted: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();
        SchemeVariant::ALL
            .into_iter()
            .find(|v| v.name().replace('_', "").to_ascii_lowercase() == wanted)
            .ok_or_else(|| ThemeError::UnknownVariant { name: s.to_owned() })
    }
}

/// Everything a scheme derivation depends on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SchemeInputs {
    /// Seed color; alpha is ignored.
    pub seed: Color,
    /// Variant.
    pub variant: SchemeVariant,
    /// Dark mode.
    pub is_dark: bool,
    /// Contrast level in `[-1, 1]`; clamped.
    pub contrast_level: f64,
    /// Alpha multiplier of `disabledTextColor` relative to `onSurface`.
    pub disabled_opacity: f32,
}

/// Runs the dynamic-color algorithm. Deterministic for equal inputs.
#[instrument(
    level = "debug",
    skip_all,
    fields(seed = %inputs.seed.to_hex(), variant = %inputs.variant, dark = inputs.is_dark)
)]
pub fn derive_dynamic(inputs: &SchemeInputs) -> ColorScheme {
    let seed = inputs.seed.to_argb() | 0xFF00_0000;
    let scheme = DynamicSchemeBuilder::default()
        .source_color_hct(Hct::from_int(seed))
        .variant(inputs.variant.to_mcu())
        .spec_version(SpecVersion::Spec2021)
        .is_dark(inputs.is_dark)
        .contrast_level(inputs.contrast_level.clamp(-1.0, 1.0))
        .build();
    let dynamic_colors = MaterialDynamicColors::new();

    let mut on_surface = Color::BLACK;
    let colors = ColorScheme::from_fn(inputs.is_dark, |role| {
        let argb = match role {
            Role::Primary => dynamic_colors.primary().get_argb(&scheme),
            Role::OnPrimary => dynamic_colors.on_primary().get_argb(&scheme),
            Role::PrimaryContainer => dynamic_colors.primary_container().get_argb(&scheme),
            Role::OnPrimaryContainer => dynamic_colors.on_primary_container().get_argb(&scheme),
            Role::Secondary => dynamic_colors.secondary().get_argb(&scheme),
            Role::OnSecondary => dynamic_colors.on_secondary().get_argb(&scheme),
            Role::SecondaryContainer => dynamic_colors.secondary_container().get_argb(&scheme),
            Role::OnSecondaryContainer => {
                dynamic_colors.on_secondary_container().get_argb(&scheme)
            }
            Role::Tertiary => dynamic_colors.tertiary().get_argb(&scheme),
            Role::OnTertiary => dynamic_colors.on_tertiary().get_argb(&scheme),
            Role::TertiaryContainer => dynamic_colors.tertiary_container().get_argb(&scheme),
            Role::OnTertiaryContainer => dynamic_colors.on_tertiary_container().get_argb(&scheme),
            Role::Error => dynamic_colors.error().get_argb(&scheme),
            Role::OnError => dynamic_colors.on_error().get_argb(&scheme),
            Role::ErrorContainer => dynamic_colors.error_container().get_argb(&scheme),
            Role::OnErrorContainer => dynamic_colors.on_error_container().get_argb(&scheme),
            Role::Surface => dynamic_colors.surface().get_argb(&scheme),
            Role::OnSurface => dynamic_colors.on_surface().get_argb(&scheme),
            Role::SurfaceVariant => dynamic_colors.surface_variant().get_argb(&scheme),
            Role::OnSurfaceVariant => dynamic_colors.on_surface_variant().get_argb(&scheme),
            Role::SurfaceDim => dynamic_colors.surface_dim().get_argb(&scheme),
            Role::SurfaceBright => dynamic_colors.surface_bright().get_argb(&scheme),
            Role::SurfaceContainerLowest => {
                dynamic_colors.surface_container_lowest().get_argb(&scheme)
            }
            Role::SurfaceContainerLow => dynamic_colors.surface_container_low().get_argb(&scheme),
            Role::SurfaceContainer => dynamic_colors.surface_container().get_argb(&scheme),
            Role::SurfaceContainerHigh => dynamic_colors.surface_container_high().get_argb(&scheme),
            Role::SurfaceContainerHighest => {
                dynamic_colors.surface_container_highest().get_argb(&scheme)
            }
            Role::SurfaceTint => dynamic_colors.surface_tint().get_argb(&scheme),
            Role::Outline => dynamic_colors.outline().get_argb(&scheme),
            Role::OutlineVariant => dynamic_colors.outline_variant().get_argb(&scheme),
            Role::InverseSurface => dynamic_colors.inverse_surface().get_argb(&scheme),
            Role::InverseOnSurface => dynamic_colors.inverse_on_surface().get_argb(&scheme),
            Role::InversePrimary => dynamic_colors.inverse_primary().get_argb(&scheme),
            Role::Background => dynamic_colors.background().get_argb(&scheme),
            Role::OnBackground => dynamic_colors.on_background().get_argb(&scheme),
            Role::Scrim => dynamic_colors.scrim().get_argb(&scheme),
            Role::Shadow => dynamic_colors.shadow().get_argb(&scheme),
            Role::DisabledText | Role::Transparent => return Color::TRANSPARENT,
        };
        let color = Color::from_argb(argb);
        if role == Role::OnSurface {
            on_surface = color;
        }
        color
    });
    finish_derived(&colors, on_surface, inputs.disabled_opacity)
}

/// Fills the two roles no algorithm produces.
fn finish_derived(colors: &ColorScheme, on_surface: Color, disabled_opacity: f32) -> ColorScheme {
    let disabled = on_surface.multiply_alpha(disabled_opacity);
    ColorScheme::from_fn(colors.is_dark(), |role| match role {
        Role::DisabledText => disabled,
        Role::Transparent => Color::TRANSPARENT,
        other => colors.get(other),
    })
}

/// Assembles a scheme from the fixed palettes.
///
/// Primary is always `palette[500]` so widgets bound to it follow the
/// palette exactly; containers use hues 100/900 in light mode and 700/100 in
/// dark mode.
pub fn derive_static(
    palette: Palette,
    is_dark: bool,
    disabled_opacity: f32,
) -> ThemeResult<ColorScheme> {
    let (secondary, tertiary) = palette.companions();
    let hue = |p: Palette, h: Hue| lookup(p, h);
    let (container_hue, on_container_hue) = if is_dark {
        (Hue::H700, Hue::H100)
    } else {
        (Hue::H100, Hue::H900)
    };

    let mut table: FxHashMap<Role, Color> = FxHashMap::default();
    for (accent, base, on, container, on_container) in [
        (
            palette,
            Role::Primary,
            Role::OnPrimary,
            Role::PrimaryContainer,
            Role::OnPrimaryContainer,
        ),
        (
            secondary,
            Role::Secondary,
            Role::OnSecondary,
            Role::SecondaryContainer,
            Role::OnSecondaryContainer,
        ),
        (
            tertiary,
            Role::Tertiary,
            Role::OnTertiary,
            Role::TertiaryContainer,
            Role::OnTertiaryContainer,
        ),
    ] {
        table.insert(base, hue(accent, Hue::H500)?);
        table.insert(on, text_on(accent, Hue::H500)?);
        table.insert(container, hue(accent, container_hue)?);
        table.insert(on_container, hue(accent, on_container_hue)?);
    }

    let gray = |h: Hue| hue(Palette::Gray, h);
    let red = |h: Hue| hue(Palette::Red, h);
    let neutral: [(Role, Color); 23] = if is_dark {
        [
            (Role::Error, red(Hue::H200)?),
            (Role::OnError, red(Hue::H900)?),
            (Role::ErrorContainer, red(Hue::H800)?),
            (Role::OnErrorContainer, red(Hue::H100)?),
            (Role::Surface, Color::from_rgb_hex(0x121212)),
            (Role::OnSurface, gray(Hue::H100)?),
            (Role::SurfaceVariant, gray(Hue::H800)?),
            (Role::OnSurfaceVariant, gray(Hue::H400)?),
            (Role::SurfaceDim, Color::from_rgb_hex(0x121212)),
            (Role::SurfaceBright, Color::from_rgb_hex(0x383838)),
            (Role::SurfaceContainerLowest, Color::from_rgb_hex(0x0E0E0E)),
            (Role::SurfaceContainerLow, Color::from_rgb_hex(0x1D1D1D)),
            (Role::SurfaceContainer, gray(Hue::H900)?),
            (Role::SurfaceContainerHigh, Color::from_rgb_hex(0x2C2C2C)),
            (Role::SurfaceContainerHighest, Color::from_rgb_hex(0x373737)),
            (Role::Outline, gray(Hue::H600)?),
            (Role::OutlineVariant, gray(Hue::H700)?),
            (Role::InverseSurface, gray(Hue::H100)?),
            (Role::InverseOnSurface, gray(Hue::H900)?),
            (Role::InversePrimary, hue(palette, Hue::H700)?),
            (Role::Background, Color::from_rgb_hex(0x121212)),
            (Role::OnBackground, gray(Hue::H100)?),
            (Role::Scrim, Color::BLACK),
        ]
    } else {
        [
            (Role::Error, red(Hue::H700)?),
            (Role::OnError, Color::WHITE),
            (Role::ErrorContainer, red(Hue::H100)?),
            (Role::OnErrorContainer, red(Hue::H900)?),
            (Role::Surface, gray(Hue::H50)?),
            (Role::OnSurface, gray(Hue::H900)?),
            (Role::SurfaceVariant, gray(Hue::H200)?),
            (Role::OnSurfaceVariant, gray(Hue::H700)?),
            (Role::SurfaceDim, gray(Hue::H300)?),
            (Role::SurfaceBright, Color::WHITE),
            (Role::SurfaceContainerLowest, Color::WHITE),
            (Role::SurfaceContainerLow, gray(Hue::H50)?),
            (Role::SurfaceContainer, gray(Hue::H100)?),
            (Role::SurfaceContainerHigh, gray(Hue::H200)?),
            (Role::SurfaceContainerHighest, gray(Hue::H300)?),
            (Role::Outline, gray(Hue::H500)?),
            (Role::OutlineVariant, gray(Hue::H300)?),
            (Role::InverseSurface, gray(Hue::H800)?),
            (Role::InverseOnSurface, gray(Hue::H50)?),
            (Role::InversePrimary, hue(palette, Hue::H200)?),
            (Role::Background, gray(Hue::H50)?),
            (Role::OnBackground, gray(Hue::H900)?),
            (Role::Scrim, Color::BLACK),
        ]
    };
    table.extend(neutral);
    table.insert(Role::Shadow, Color::BLACK);
    table.insert(Role::SurfaceTint, table[&Role::Primary]);

    let on_surface = table[&Role::OnSurface];
    let colors = ColorScheme::from_fn(is_dark, |role| {
        table.get(&role).copied().unwrap_or(Color::TRANSPARENT)
    });
    Ok(finish_derived(&colors, on_surface, disabled_opacity))
}

/// Dominant color of the image at `path`.
///
/// The image is downsampled to 112x112; opaque pixels are bucketed by the top
/// five bits of each channel and the most populated bucket is averaged. Ties
/// go to the bucket with the lowest key so the result is deterministic.
pub fn wallpaper_seed(path: &Path) -> ThemeResult<Color> {
    let failed = |details: String| ThemeError::SchemeDerivationFailed {
        path: Some(path.to_path_buf()),
        details,
    };
    let image = image::open(path).map_err(|e| failed(e.to_string()))?;
    let sample = image
        .resize_exact(
            WALLPAPER_SAMPLE_EDGE,
            WALLPAPER_SAMPLE_EDGE,
            FilterType::Triangle,
        )
        .to_rgba8();

    let mut buckets: FxHashMap<u16, (u32, [u64; 3])> = FxHashMap::default();
    for pixel in sample.pixels() {
        let [r, g, b, a] = pixel.0;
        if a != u8::MAX {
            continue;
        }
        let key = (u16::from(r >> 3) << 10) | (u16::from(g >> 3) << 5) | u16::from(b >> 3);
        let entry = buckets.entry(key).or_insert((0, [0; 3]));
        entry.0 += 1;
        entry.1[0] += u64::from(r);
        entry.1[1] += u64::from(g);
        entry.1[2] += u64::from(b);
    }

    let (_, (count, sums)) = buckets
        .into_iter()
        .max_by(|(ka, (ca, _)), (kb, (cb, _))| ca.cmp(cb).then(kb.cmp(ka)))
        .ok_or_else(|| failed("wallpaper has no opaque pixels".to_owned()))?;
    let average = |sum: u64| (sum / u64::from(count)) as u8;
    let seed = Color::from_rgb_u8(average(sums[0]), average(sums[1]), average(sums[2]));
    debug!(seed = %seed.to_hex(), "wallpaper seed extracted");
    Ok(seed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_primary_is_palette_500_in_both_modes() {
        for palette in Palette::ALL {
            for dark in [false, true] {
                let scheme = derive_static(palette, dark, 0.38).unwrap();
                assert_eq!(
                    scheme.get(Role::Primary),
                    lookup(palette, Hue::H500).unwrap()
                );
                assert_eq!(scheme.get(Role::SurfaceTint), scheme.get(Role::Primary));
            }
        }
    }

    #[test]
    fn disabled_text_is_translucent_on_surface() {
        let scheme = derive_static(Palette::Teal, false, 0.38).unwrap();
        let on_surface = scheme.get(Role::OnSurface);
        let disabled = scheme.get(Role::DisabledText);
        assert!((disabled.a - on_surface.a * 0.38).abs() < 1e-6);
        assert_eq!(
            (disabled.r, disabled.g, disabled.b),
            (on_surface.r, on_surface.g, on_surface.b)
        );
        assert_eq!(scheme.get(Role::Transparent), Color::TRANSPARENT);
    }

    #[test]
    fn dynamic_derivation_is_deterministic_and_mode_aware() {
        let inputs = SchemeInputs {
            seed: Color::from_rgb_hex(0xF44336),
            variant: SchemeVariant::TonalSpot,
            is_dark: false,
            contrast_level: 0.0,
            disabled_opacity: 0.38,
        };
        let light = derive_dynamic(&inputs);
        assert_eq!(light, derive_dynamic(&inputs));
        let dark = derive_dynamic(&SchemeInputs {
            is_dark: true,
            ..inputs
        });
        assert!(light.get(Role::Surface).luminance() > dark.get(Role::Surface).luminance());
        assert!(dark.is_dark());
    }

    #[test]
    fn seed_alpha_is_ignored() {
        let opaque = SchemeInputs {
            seed: Color::from_rgb_hex(0x3F51B5),
            variant: SchemeVariant::Vibrant,
            is_dark: false,
            contrast_level: 0.0,
            disabled_opacity: 0.38,
        };
        let translucent = SchemeInputs {
            seed: opaque.seed.with_alpha(0.2),
            ..opaque
        };
        assert_eq!(derive_dynamic(&opaque), derive_dynamic(&translucent));
    }

    #[test]
    fn variant_names_parse() {
        assert_eq!(
            "FRUIT_SALAD".parse::<SchemeVariant>().unwrap(),
            SchemeVariant::FruitSalad
        );
        assert_eq!(
            "TonalSpot".parse::<SchemeVariant>().unwrap(),
            SchemeVariant::TonalSpot
        );
        assert!("Pastel".parse::<SchemeVariant>().is_err());
    }

    #[test]
    fn wallpaper_dominant_bucket_wins() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wall.png");
        let mut img = image::RgbaImage::new(200, 200);
        for (x, _, pixel) in img.enumerate_pixels_mut() {
            *pixel = if x < 150 {
                image::Rgba([0x21, 0x96, 0xF3, 0xFF])
            } else {
                image::Rgba([0xF4, 0x43, 0x36, 0xFF])
            };
        }
        img.save(&path).unwrap();
        let seed = wallpaper_seed(&path).unwrap();
        assert!(seed.approx_eq(Color::from_rgb_hex(0x2196F3), 1.0 / 255.0 + 1e-6));
    }

    #[test]
    fn unreadable_wallpaper_reports_derivation_failure() {
        let err = wallpaper_seed(Path::new("/definitely/not/here.png")).unwrap_err();
        assert!(matches!(err, ThemeError::SchemeDerivationFailed { .. }));
    }
}
