//! Material 3 color roles and the immutable role -> color mapping.

use std::{fmt, str::FromStr};

use mdkit_ui::Color;
use serde::{Deserialize, Serialize};

use crate::error::{ThemeError, ThemeResult};

macro_rules! roles {
    ($($variant:ident => $name:literal),+ $(,)?) => {
        /// A semantic color token of the scheme.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum Role {
            $(
                #[doc = concat!("`", $name, "`")]
                $variant,
            )+
        }

        impl Role {
            /// Every role in mapping order.
            pub const ALL: &'static [Role] = &[$(Role::$variant),+];

            /// Canonical camelCase name.
            pub fn name(self) -> &'static str {
                match self {
                    $(Role::$variant => $name,)+
                }
            }
        }
    };
}

roles! {
    Primary => "primary",
    OnPrimary => "onPrimary",
    PrimaryContainer => "primaryContainer",
    OnPrimaryContainer => "onPrimaryContainer",
    Secondary => "secondary",
    OnSecondary => "onSecondary",
    SecondaryContainer => "secondaryContainer",
    OnSecondaryContainer => "onSecondaryContainer",
    Tertiary => "tertiary",
    OnTertiary => "onTertiary",
    TertiaryContainer => "tertiaryContainer",
    OnTertiaryContainer => "onTertiaryContainer",
    Error => "error",
    OnError => "onError",
    ErrorContainer => "errorContainer",
    OnErrorContainer => "onErrorContainer",
    Surface => "surface",
    OnSurface => "onSurface",
    SurfaceVariant => "surfaceVariant",
    OnSurfaceVariant => "onSurfaceVariant",
    SurfaceDim => "surfaceDim",
    SurfaceBright => "surfaceBright",
    SurfaceContainerLowest => "surfaceContainerLowest",
    SurfaceContainerLow => "surfaceContainerLow",
    SurfaceContainer => "surfaceContainer",
    SurfaceContainerHigh => "surfaceContainerHigh",
    SurfaceContainerHighest => "surfaceContainerHighest",
    SurfaceTint => "surfaceTint",
    Outline => "outline",
    OutlineVariant => "outlineVariant",
    InverseSurface => "inverseSurface",
    InverseOnSurface => "inverseOnSurface",
    InversePrimary => "inversePrimary",
    Background => "background",
    OnBackground => "onBackground",
    Scrim => "scrim",
    Shadow => "shadow",
    DisabledText => "disabledTextColor",
    Transparent => "transparentColor",
}

impl Role {
    /// Number of roles.
    pub const COUNT: usize = Role::ALL.len();

    fn index(self) -> usize {
        self as usize
    }

    /// The role used for content drawn on top of this one.
    pub fn on_color(self) -> Role {
        match self {
            Role::Primary | Role::SurfaceTint => Role::OnPrimary,
            Role::PrimaryContainer => Role::OnPrimaryContainer,
            Role::Secondary => Role::OnSecondary,
            Role::SecondaryContainer => Role::OnSecondaryContainer,
            Role::Tertiary => Role::OnTertiary,
            Role::TertiaryContainer => Role::OnTertiaryContainer,
            Role::Error => Role::OnError,
            Role::ErrorContainer => Role::OnErrorContainer,
            Role::SurfaceVariant => Role::OnSurfaceVariant,
            Role::InverseSurface => Role::InverseOnSurface,
            Role::Background => Role::OnBackground,
            Role::InversePrimary => Role::Primary,
            _ => Role::OnSurface,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn normalize(name: &str) -> String {
    let lower: String = name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_ascii_lowercase();
    match lower.strip_suffix("color") {
        Some(stripped) if !stripped.is_empty() => stripped.to_owned(),
        _ => lower,
    }
}

impl FromStr for Role {
    type Err = ThemeError;

    /// Accepts `"primary"`, `"Primary"`, `"primaryColor"`, `"on_surface"`
    /// and similar spellings.
    fn from_str(s: &str) -> ThemeResult<Self> {
        let wanted = normalize(s);
        Role::ALL
            .iter()
            .copied()
            .find(|role| normalize(role.name()) == wanted)
            .ok_or_else(|| ThemeError::UnknownRole { name: s.to_owned() })
    }
}

/// An immutable role -> color mapping.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorScheme {
    colors: [Color; Role::COUNT],
    is_dark: bool,
}

impl ColorScheme {
    /// Builds a scheme by asking `f` for every role.
    pub fn from_fn(is_dark: bool, mut f: impl FnMut(Role) -> Color) -> Self {
        let mut colors = [Color::TRANSPARENT; Role::COUNT];
        for role in Role::ALL {
            colors[role.index()] = f(*role);
        }
        Self { colors, is_dark }
    }

    /// Color of `role`.
    pub fn get(&self, role: Role) -> Color {
        self.colors[role.index()]
    }

    /// Color by role name.
    pub fn get_by_name(&self, name: &str) -> ThemeResult<Color> {
        Ok(self.get(name.parse()?))
    }

    /// Whether the scheme was derived for dark mode.
    pub fn is_dark(&self) -> bool {
        self.is_dark
    }

    /// Iterates `(role, color)` pairs in role order.
    pub fn iter(&self) -> impl Iterator<Item = (Role, Color)> + '_ {
        Role::ALL.iter().map(|role| (*role, self.get(*role)))
    }

    /// Returns the on-color of `background` when it matches a role exactly.
    pub fn content_color_for(&self, background: Color) -> Option<Color> {
        self.iter()
            .filter(|(role, _)| !matches!(role, Role::Transparent | Role::DisabledText))
            .find(|(_, color)| *color == background)
            .map(|(role, _)| self.get(role.on_color()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_names_parse_in_several_spellings() {
        assert_eq!("Primary".parse::<Role>().unwrap(), Role::Primary);
        assert_eq!("primaryColor".parse::<Role>().unwrap(), Role::Primary);
        assert_eq!("on_surface_variant".parse::<Role>().unwrap(), Role::OnSurfaceVariant);
        assert_eq!("disabledTextColor".parse::<Role>().unwrap(), Role::DisabledText);
        assert_eq!("Surface".parse::<Role>().unwrap(), Role::Surface);
        assert!(matches!(
            "Sparkle".parse::<Role>(),
            Err(ThemeError::UnknownRole { .. })
        ));
    }

    #[test]
    fn scheme_lookup_by_name() {
        let scheme = ColorScheme::from_fn(false, |role| {
            if role == Role::Primary {
                Color::WHITE
            } else {
                Color::BLACK
            }
        });
        assert_eq!(scheme.get_by_name("primary").unwrap(), Color::WHITE);
        assert!(scheme.get_by_name("nope").is_err());
    }
}
