//! Font-style registry: `style -> role -> spec`.
//!
//! Defaults follow the Material 3 type scale for the Display, Headline,
//! Title, Body and Label styles, plus an Icon style that renders with the
//! bundled icon font. Custom style names may be registered at runtime.

use std::{collections::BTreeMap, fmt, str::FromStr};

use derive_setters::Setters;
use mdkit_ui::Dp;
use serde::{Deserialize, Serialize};

use crate::error::FontStyleError;

/// Font used by the icon style.
pub const ICON_FONT: &str = "MaterialDesignIcons";

/// Size tier within a style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontRole {
    /// `large`.
    Large,
    /// `medium`.
    Medium,
    /// `small`.
    Small,
}

impl FontRole {
    /// Every role.
    pub const ALL: [FontRole; 3] = [FontRole::Large, FontRole::Medium, FontRole::Small];

    /// Lowercase name.
    pub fn name(self) -> &'static str {
        match self {
            FontRole::Large => "large",
            FontRole::Medium => "medium",
            FontRole::Small => "small",
        }
    }
}

impl fmt::Display for FontRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FontRole {
    type Err = FontStyleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FontRole::ALL
            .into_iter()
            .find(|r| r.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| FontStyleError::UnknownFontRole(s.to_owned()))
    }
}

/// Font parameters for one `(style, role)` entry.
#[derive(Debug, Clone, PartialEq, Setters, Serialize, Deserialize)]
#[setters(into)]
pub struct FontSpec {
    /// Font family or file name.
    pub font_name: String,
    /// Font size.
    pub font_size: Dp,
    /// Line height.
    pub line_height: Dp,
}

impl FontSpec {
    /// Creates a spec.
    pub fn new(font_name: impl Into<String>, font_size: f64, line_height: f64) -> Self {
        Self {
            font_name: font_name.into(),
            font_size: Dp(font_size),
            line_height: Dp(line_height),
        }
    }
}

/// Mutable registry of font specs.
#[derive(Debug, Clone, PartialEq)]
pub struct FontStyles {
    entries: BTreeMap<(String, FontRole), FontSpec>,
}

impl Default for FontStyles {
    fn default() -> Self {
        let mut styles = Self::empty();
        let scale: [(&str, &str, [(f64, f64); 3]); 5] = [
            ("Display", "Roboto", [(57.0, 64.0), (45.0, 52.0), (36.0, 44.0)]),
            ("Headline", "Roboto", [(32.0, 40.0), (28.0, 36.0), (24.0, 32.0)]),
            ("Title", "Roboto", [(22.0, 28.0), (16.0, 24.0), (14.0, 20.0)]),
            ("Body", "Roboto", [(16.0, 24.0), (14.0, 20.0), (12.0, 16.0)]),
            ("Label", "Roboto-Medium", [(14.0, 20.0), (12.0, 16.0), (11.0, 16.0)]),
        ];
        for (style, font, sizes) in scale {
            for (role, (size, line)) in FontRole::ALL.into_iter().zip(sizes) {
                styles.register(style, role, FontSpec::new(font, size, line));
            }
        }
        for (role, size) in FontRole::ALL.into_iter().zip([36.0, 24.0, 18.0]) {
            styles.register("Icon", role, FontSpec::new(ICON_FONT, size, size));
        }
        styles
    }
}

impl FontStyles {
    /// Registry without any entry.
    pub fn empty() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Inserts or overwrites an entry.
    pub fn register(&mut self, style: impl Into<String>, role: FontRole, spec: FontSpec) {
        self.entries.insert((style.into(), role), spec);
    }

    /// Returns the registered spec.
    pub fn resolve(&self, style: &str, role: FontRole) -> Result<&FontSpec, FontStyleError> {
        self.entries
            .get(&(style.to_owned(), role))
            .ok_or_else(|| FontStyleError::UnknownFontStyle {
                style: style.to_owned(),
                role: role.name().to_owned(),
            })
    }

    /// Resolves with the role given by name.
    pub fn resolve_by_name(&self, style: &str, role: &str) -> Result<&FontSpec, FontStyleError> {
        let role = role
            .parse::<FontRole>()
            .map_err(|_| FontStyleError::UnknownFontStyle {
                style: style.to_owned(),
                role: role.to_owned(),
            })?;
        self.resolve(style, role)
    }

    /// Distinct style names in sorted order.
    pub fn styles(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.entries.keys().map(|(s, _)| s.as_str()).collect();
        names.dedup();
        names
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_follow_type_scale() {
        let styles = FontStyles::default();
        let display = styles.resolve("Display", FontRole::Large).unwrap();
        assert_eq!(display.font_size, Dp(57.0));
        assert_eq!(display.line_height, Dp(64.0));
        assert_eq!(
            styles.resolve("Label", FontRole::Small).unwrap().font_size,
            Dp(11.0)
        );
        assert_eq!(
            styles.resolve("Icon", FontRole::Medium).unwrap().font_name,
            ICON_FONT
        );
        assert_eq!(
            styles.styles(),
            vec!["Body", "Display", "Headline", "Icon", "Label", "Title"]
        );
    }

    #[test]
    fn register_overwrites_and_custom_styles_resolve() {
        let mut styles = FontStyles::default();
        let spec = FontSpec::new("Lobster", 40.0, 48.0);
        styles.register("Headline", FontRole::Large, spec.clone());
        assert_eq!(styles.resolve("Headline", FontRole::Large).unwrap(), &spec);

        styles.register("Poster", FontRole::Small, spec.clone().font_size(Dp(20.0)));
        assert_eq!(
            styles.resolve_by_name("Poster", "small").unwrap().font_size,
            Dp(20.0)
        );
    }

    #[test]
    fn missing_entries_fail() {
        let styles = FontStyles::default();
        assert_eq!(
            styles.resolve("Poster", FontRole::Large),
            Err(FontStyleError::UnknownFontStyle {
                style: "Poster".into(),
                role: "large".into(),
            })
        );
        assert!(styles.resolve_by_name("Body", "huge").is_err());
    }
}
