//! The theme manager: observable theme inputs and the derived role colors.
//!
//! ## Usage
//!
//! Create one [`ThemeManager`] per application context and hand it to
//! widgets through a [`crate::context::BuildContext`]. Widgets bind to the
//! aggregate [`ThemeManager::on_colors`] notification and to the fields they
//! care about.
//!
//! ```
//! use mdkit_components::{
//!     color_definitions::Palette,
//!     role::Role,
//!     theme::{ThemeManager, ThemeStyle},
//! };
//!
//! let theme = ThemeManager::new();
//! let light = theme.color(Role::Surface);
//! theme.switch_theme();
//! assert_eq!(theme.theme_style.get(), ThemeStyle::Dark);
//! assert_ne!(theme.color(Role::Surface), light);
//!
//! theme.batch(|t| {
//!     t.primary_palette.set(Palette::Red);
//!     t.theme_style.set(ThemeStyle::Light);
//! });
//! ```

use std::{
    cell::Cell,
    fmt,
    path::{Path, PathBuf},
    rc::Rc,
};

use mdkit_ui::{Color, Dp, ObserverId, Property};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::{
    color_definitions::{Hue, Palette, lookup},
    dynamic_scheme::{SchemeInputs, SchemeVariant, derive_dynamic, derive_static, wallpaper_seed},
    error::{ThemeError, ThemeResult},
    font_styles::{FontRole, FontSpec, FontStyles},
    role::{ColorScheme, Role},
};

const DEFAULT_SEED: Color = Color::from_rgb_hex(0x2196F3);

/// Standard Material 3 alpha values used for state layers and disabled content.
pub struct MaterialAlpha;

impl MaterialAlpha {
    /// Alpha for hover state layers.
    pub const HOVER: f32 = 0.08;
    /// Alpha for pressed state layers.
    pub const PRESSED: f32 = 0.1;
    /// Alpha for focused state layers.
    pub const FOCUSED: f32 = 0.1;
    /// Alpha for dragged state layers.
    pub const DRAGGED: f32 = 0.16;
    /// Alpha for disabled containers (e.g., filled controls).
    pub const DISABLED_CONTAINER: f32 = 0.12;
    /// Alpha for disabled content (text/icons) placed on disabled containers.
    pub const DISABLED_CONTENT: f32 = 0.38;
}

/// Material corner-radius tokens.
pub struct MaterialShapes;

impl MaterialShapes {
    /// Extra small corners.
    pub const EXTRA_SMALL: Dp = Dp(4.0);
    /// Small corners.
    pub const SMALL: Dp = Dp(8.0);
    /// Medium corners.
    pub const MEDIUM: Dp = Dp(12.0);
    /// Large corners.
    pub const LARGE: Dp = Dp(16.0);
    /// Extra large corners.
    pub const EXTRA_LARGE: Dp = Dp(28.0);
    /// Fully rounded.
    pub const FULL: Dp = Dp(1000.0);
}

/// Light or dark mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ThemeStyle {
    /// Light surfaces.
    #[default]
    Light,
    /// Dark surfaces.
    Dark,
}

impl ThemeStyle {
    /// The other style.
    pub fn toggled(self) -> Self {
        match self {
            ThemeStyle::Light => ThemeStyle::Dark,
            ThemeStyle::Dark => ThemeStyle::Light,
        }
    }
}

impl fmt::Display for ThemeStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ThemeStyle::Light => "Light",
            ThemeStyle::Dark => "Dark",
        })
    }
}

/// Screen orientation reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceOrientation {
    /// Taller than wide.
    #[default]
    Portrait,
    /// Wider than tall.
    Landscape,
}

/// Subscription returned by [`ThemeManager::on_colors`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorsSubscription(ObserverId);

/// Observable theme state. Every field that feeds the color derivation
/// triggers one recompute per change (or per [`ThemeManager::batch`]).
pub struct ThemeManager {
    /// Light or dark mode.
    pub theme_style: Property<ThemeStyle>,
    /// Palette seeding the scheme.
    pub primary_palette: Property<Palette>,
    /// Variant of the dynamic scheme.
    pub dynamic_scheme_name: Property<SchemeVariant>,
    /// Contrast level of the dynamic scheme, `[-1, 1]`.
    pub dynamic_scheme_contrast: Property<f64>,
    /// Derive roles with the dynamic-color algorithm instead of the static
    /// palettes.
    pub dynamic_color: Property<bool>,
    /// Image whose dominant color seeds the dynamic scheme.
    pub path_to_wallpaper: Property<Option<PathBuf>>,
    /// Font-style registry.
    pub font_styles: Property<FontStyles>,
    /// Orientation of the device.
    pub device_orientation: Property<DeviceOrientation>,
    /// Reserved style marker.
    pub material_style: Property<String>,
    /// Alpha multiplier applied to colors of disabled widgets.
    pub is_disabled_overlay_opacity: Property<f32>,
    colors: Property<Rc<ColorScheme>>,
    batch_depth: Cell<u32>,
    pending: Cell<bool>,
    recompute_count: Cell<u64>,
}

impl fmt::Debug for ThemeManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThemeManager")
            .field("theme_style", &self.theme_style.get())
            .field("primary_palette", &self.primary_palette.get())
            .field("dynamic_color", &self.dynamic_color.get())
            .finish_non_exhaustive()
    }
}

impl ThemeManager {
    /// Light theme on the Blue palette with static colors.
    pub fn new() -> Rc<Self> {
        Self::with_settings(ThemeStyle::Light, Palette::default(), false)
    }

    /// Theme with the given inputs.
    pub fn with_settings(style: ThemeStyle, palette: Palette, dynamic_color: bool) -> Rc<Self> {
        let placeholder = ColorScheme::from_fn(false, |_| Color::TRANSPARENT);
        let theme = Rc::new(Self {
            theme_style: Property::new("theme_style", style),
            primary_palette: Property::new("primary_palette", palette),
            dynamic_scheme_name: Property::new("dynamic_scheme_name", SchemeVariant::default()),
            dynamic_scheme_contrast: Property::new("dynamic_scheme_contrast", 0.0),
            dynamic_color: Property::new("dynamic_color", dynamic_color),
            path_to_wallpaper: Property::new("path_to_wallpaper", None),
            font_styles: Property::new("font_styles", FontStyles::default()),
            device_orientation: Property::new("device_orientation", DeviceOrientation::default()),
            material_style: Property::new("material_style", "M3".to_owned()),
            is_disabled_overlay_opacity: Property::new("is_disabled_overlay_opacity", 0.38),
            colors: Property::new("colors", Rc::new(placeholder)),
            batch_depth: Cell::new(0),
            pending: Cell::new(false),
            recompute_count: Cell::new(0),
        });
        theme.install_recompute_observers();
        theme.recompute();
        theme
    }

    /// Builds a manager from a configuration.
    pub fn from_config(config: &ThemeConfig) -> ThemeResult<Rc<Self>> {
        let palette: Palette = config.primary_palette.parse()?;
        let variant: SchemeVariant = config.dynamic_scheme_name.parse()?;
        let theme = Self::with_settings(config.theme_style, palette, config.dynamic_color);
        theme.batch(|t| {
            t.dynamic_scheme_name.set(variant);
            t.dynamic_scheme_contrast.set(config.dynamic_scheme_contrast);
            t.path_to_wallpaper.set(config.path_to_wallpaper.clone());
            t.is_disabled_overlay_opacity
                .set(config.is_disabled_overlay_opacity);
        });
        for entry in &config.font_styles {
            let role: FontRole = entry.role.parse().map_err(|_| ThemeError::ConfigParse {
                source: <toml::de::Error as serde::de::Error>::custom(format!(
                    "unknown font role '{}'",
                    entry.role
                )),
            })?;
            theme.register_font_style(
                &entry.style,
                role,
                FontSpec::new(&entry.font_name, entry.font_size, entry.line_height),
            );
        }
        Ok(theme)
    }

    fn install_recompute_observers(self: &Rc<Self>) {
        macro_rules! recompute_on {
            ($($field:ident),+) => {
                $(
                    let weak = Rc::downgrade(self);
                    self.$field.bind(move |_| {
                        if let Some(theme) = weak.upgrade() {
                            theme.request_recompute();
                        }
                    });
                )+
            };
        }
        recompute_on!(
            theme_style,
            primary_palette,
            dynamic_scheme_name,
            dynamic_scheme_contrast,
            dynamic_color,
            path_to_wallpaper,
            is_disabled_overlay_opacity
        );
    }

    fn request_recompute(&self) {
        if self.batch_depth.get() > 0 {
            self.pending.set(true);
        } else {
            self.recompute();
        }
    }

    /// Runs `f` with recomputation deferred; all changes made inside produce
    /// a single recompute and a single color notification. Nested batches
    /// flush when the outermost one ends.
    pub fn batch<R>(&self, f: impl FnOnce(&Self) -> R) -> R {
        self.batch_depth.set(self.batch_depth.get() + 1);
        let result = f(self);
        self.batch_depth.set(self.batch_depth.get() - 1);
        if self.batch_depth.get() == 0 && self.pending.replace(false) {
            self.recompute();
        }
        result
    }

    #[instrument(
        level = "debug",
        skip(self),
        fields(style = %self.theme_style.get(), palette = %self.primary_palette.get())
    )]
    fn recompute(&self) {
        let is_dark = self.theme_style.get() == ThemeStyle::Dark;
        let palette = self.primary_palette.get();
        let disabled_opacity = self.is_disabled_overlay_opacity.get();
        let palette_seed = lookup(palette, Hue::H500).unwrap_or(DEFAULT_SEED);

        let scheme = if self.dynamic_color.get() {
            let seed = match self.path_to_wallpaper.get() {
                Some(path) => wallpaper_seed(&path).unwrap_or_else(|error| {
                    warn!(%error, "falling back to the palette seed");
                    palette_seed
                }),
                None => palette_seed,
            };
            derive_dynamic(&SchemeInputs {
                seed,
                variant: self.dynamic_scheme_name.get(),
                is_dark,
                contrast_level: self.dynamic_scheme_contrast.get(),
                disabled_opacity,
            })
        } else {
            match derive_static(palette, is_dark, disabled_opacity) {
                Ok(scheme) => scheme,
                Err(error) => {
                    warn!(%error, "static derivation failed, using the dynamic scheme");
                    derive_dynamic(&SchemeInputs {
                        seed: palette_seed,
                        variant: SchemeVariant::TonalSpot,
                        is_dark,
                        contrast_level: 0.0,
                        disabled_opacity,
                    })
                }
            }
        };
        self.recompute_count.set(self.recompute_count.get() + 1);
        if self.colors.set(Rc::new(scheme)) {
            debug!("theme colors changed");
        }
    }

    /// Number of recomputes so far.
    pub fn recompute_count(&self) -> u64 {
        self.recompute_count.get()
    }

    /// The current role mapping. The snapshot never changes; a recompute
    /// replaces it.
    pub fn colors(&self) -> Rc<ColorScheme> {
        self.colors.get()
    }

    /// Color of `role` in the current mapping.
    pub fn color(&self, role: Role) -> Color {
        self.colors.with(|c| c.get(role))
    }

    /// Color by role name.
    pub fn color_by_name(&self, name: &str) -> ThemeResult<Color> {
        Ok(self.color(name.parse()?))
    }

    /// `color` with its alpha scaled by `is_disabled_overlay_opacity`.
    pub fn disabled(&self, color: Color) -> Color {
        color.multiply_alpha(self.is_disabled_overlay_opacity.get())
    }

    /// Calls `callback` with the new mapping after every recompute that
    /// changed it.
    pub fn on_colors(&self, callback: impl Fn(&Rc<ColorScheme>) + 'static) -> ColorsSubscription {
        ColorsSubscription(self.colors.bind(callback))
    }

    /// Removes a subscription made with [`ThemeManager::on_colors`].
    pub fn unbind_colors(&self, subscription: ColorsSubscription) -> bool {
        self.colors.unbind(subscription.0)
    }

    /// Toggles between light and dark.
    pub fn switch_theme(&self) {
        self.theme_style.set(self.theme_style.get().toggled());
    }

    /// Registers or overwrites a font spec.
    pub fn register_font_style(&self, style: &str, role: FontRole, spec: FontSpec) {
        self.font_styles
            .update(|styles| styles.register(style, role, spec));
    }

    /// Resolves a font spec.
    pub fn resolve_font_style(
        &self,
        style: &str,
        role: FontRole,
    ) -> Result<FontSpec, crate::error::FontStyleError> {
        self.font_styles
            .with(|styles| styles.resolve(style, role).cloned())
    }

    /// Number of observers bound to the named field, `None` for names that
    /// are not theme fields. The manager's own recompute observer is not
    /// counted.
    pub fn get_property_observers(&self, name: &str) -> Option<usize> {
        let (count, internal) = match name {
            "theme_style" => (self.theme_style.observer_count(), 1),
            "primary_palette" => (self.primary_palette.observer_count(), 1),
            "dynamic_scheme_name" => (self.dynamic_scheme_name.observer_count(), 1),
            "dynamic_scheme_contrast" => (self.dynamic_scheme_contrast.observer_count(), 1),
            "dynamic_color" => (self.dynamic_color.observer_count(), 1),
            "path_to_wallpaper" => (self.path_to_wallpaper.observer_count(), 1),
            "is_disabled_overlay_opacity" => (self.is_disabled_overlay_opacity.observer_count(), 1),
            "font_styles" => (self.font_styles.observer_count(), 0),
            "device_orientation" => (self.device_orientation.observer_count(), 0),
            "material_style" => (self.material_style.observer_count(), 0),
            "colors" => (self.colors.observer_count(), 0),
            _ => return None,
        };
        Some(count - internal)
    }
}

/// One font-style override in a [`ThemeConfig`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FontStyleEntry {
    /// Style name.
    pub style: String,
    /// `large`, `medium` or `small`.
    pub role: String,
    /// Font family or file.
    pub font_name: String,
    /// Size in dp.
    pub font_size: f64,
    /// Line height in dp.
    pub line_height: f64,
}

/// Theme settings loaded from TOML.
///
/// ```
/// use mdkit_components::theme::{ThemeConfig, ThemeManager, ThemeStyle};
///
/// let config: ThemeConfig = ThemeConfig::from_toml_str(r#"
///     theme_style = "Dark"
///     primary_palette = "Teal"
/// "#).unwrap();
/// let theme = ThemeManager::from_config(&config).unwrap();
/// assert_eq!(theme.theme_style.get(), ThemeStyle::Dark);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ThemeConfig {
    /// Light or dark.
    pub theme_style: ThemeStyle,
    /// Palette name.
    pub primary_palette: String,
    /// Variant name.
    pub dynamic_scheme_name: String,
    /// Contrast level.
    pub dynamic_scheme_contrast: f64,
    /// Use the dynamic-color algorithm.
    pub dynamic_color: bool,
    /// Wallpaper seeding the dynamic scheme.
    pub path_to_wallpaper: Option<PathBuf>,
    /// Disabled alpha multiplier.
    pub is_disabled_overlay_opacity: f32,
    /// Font overrides applied in order.
    pub font_styles: Vec<FontStyleEntry>,
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            theme_style: ThemeStyle::Light,
            primary_palette: Palette::default().name().to_owned(),
            dynamic_scheme_name: SchemeVariant::default().name().to_owned(),
            dynamic_scheme_contrast: 0.0,
            dynamic_color: false,
            path_to_wallpaper: None,
            is_disabled_overlay_opacity: MaterialAlpha::DISABLED_CONTENT,
            font_styles: Vec::new(),
        }
    }
}

impl ThemeConfig {
    /// Parses a TOML document.
    pub fn from_toml_str(source: &str) -> ThemeResult<Self> {
        Ok(toml::from_str(source)?)
    }

    /// Reads and parses a TOML file.
    pub fn load(path: &Path) -> ThemeResult<Self> {
        let source = std::fs::read_to_string(path).map_err(|source| ThemeError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&source)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;

    #[test]
    fn switch_theme_recomputes_before_field_observers() {
        let theme = ThemeManager::new();
        let seen = Rc::new(RefCell::new(None));
        let theme_in = Rc::downgrade(&theme);
        let seen_in = seen.clone();
        theme.theme_style.bind(move |_| {
            if let Some(theme) = theme_in.upgrade() {
                *seen_in.borrow_mut() = Some(theme.color(Role::Surface));
            }
        });
        theme.switch_theme();
        let expected = derive_static(Palette::Blue, true, 0.38).unwrap();
        assert_eq!(*seen.borrow(), Some(expected.get(Role::Surface)));
    }

    #[test]
    fn batch_coalesces_to_one_recompute_and_one_notification() {
        let theme = ThemeManager::new();
        let notifications = Rc::new(Cell::new(0));
        let n = notifications.clone();
        theme.on_colors(move |_| n.set(n.get() + 1));
        let before = theme.recompute_count();
        theme.batch(|t| {
            t.primary_palette.set(Palette::Red);
            t.theme_style.set(ThemeStyle::Dark);
            t.batch(|t| t.primary_palette.set(Palette::Green));
        });
        assert_eq!(theme.recompute_count(), before + 1);
        assert_eq!(notifications.get(), 1);
        assert_eq!(
            theme.color(Role::Primary),
            lookup(Palette::Green, Hue::H500).unwrap()
        );
    }

    #[test]
    fn equal_recompute_does_not_notify() {
        let theme = ThemeManager::new();
        let notifications = Rc::new(Cell::new(0));
        let n = notifications.clone();
        let sub = theme.on_colors(move |_| n.set(n.get() + 1));
        theme.dynamic_scheme_name.set(SchemeVariant::Vibrant);
        assert_eq!(notifications.get(), 0);
        assert!(theme.unbind_colors(sub));
    }

    #[test]
    fn broken_wallpaper_falls_back_to_palette_seed() {
        let theme = ThemeManager::with_settings(ThemeStyle::Light, Palette::Red, true);
        let reference = theme.colors();
        theme
            .path_to_wallpaper
            .set(Some(PathBuf::from("/no/such/wallpaper.png")));
        assert_eq!(theme.colors(), reference);
    }

    #[test]
    fn observer_introspection() {
        let theme = ThemeManager::new();
        assert_eq!(theme.get_property_observers("theme_style"), Some(0));
        let id = theme.theme_style.bind(|_| {});
        assert_eq!(theme.get_property_observers("theme_style"), Some(1));
        theme.theme_style.unbind(id);
        assert_eq!(theme.get_property_observers("theme_style"), Some(0));
        assert_eq!(theme.get_property_observers("nonsense"), None);
    }

    #[test]
    fn config_round_trip_and_errors() {
        let config = ThemeConfig::from_toml_str(
            r#"
            primary_palette = "DeepPurple"
            dynamic_color = true
            dynamic_scheme_name = "VIBRANT"
            dynamic_scheme_contrast = 0.5

            [[font_styles]]
            style = "Headline"
            role = "large"
            font_name = "Lobster"
            font_size = 40.0
            line_height = 48.0
            "#,
        )
        .unwrap();
        let theme = ThemeManager::from_config(&config).unwrap();
        assert_eq!(theme.dynamic_scheme_name.get(), SchemeVariant::Vibrant);
        assert_eq!(
            theme
                .resolve_font_style("Headline", FontRole::Large)
                .unwrap()
                .font_name,
            "Lobster"
        );

        let bad = ThemeConfig {
            primary_palette: "Mauve".into(),
            ..ThemeConfig::default()
        };
        assert!(matches!(
            ThemeManager::from_config(&bad),
            Err(ThemeError::UnknownPalette { .. })
        ));
        assert!(matches!(
            ThemeConfig::from_toml_str("theme_style = 3"),
            Err(ThemeError::ConfigParse { .. })
        ));
    }
}
