//! Error types of the component library.
//!
//! Setter-time mistakes (unknown role, palette, hue, font style, child type)
//! surface as these errors. Render-time problems never do; they are logged
//! and the frame continues.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by color definitions, scheme derivation and the theme
/// manager.
#[derive(Error, Debug)]
pub enum ThemeError {
    /// The palette name is not one of the fixed palettes.
    #[error("unknown palette '{name}'")]
    UnknownPalette {
        /// The name that failed to resolve.
        name: String,
    },

    /// The hue does not exist in the palette (A-tier hues of Brown, Gray and
    /// BlueGray, or a malformed hue name).
    #[error("unknown hue '{hue}' in palette '{palette}'")]
    UnknownHue {
        /// Palette that was searched.
        palette: String,
        /// Hue that was requested.
        hue: String,
    },

    /// The role name is not a color role.
    #[error("unknown color role '{name}'")]
    UnknownRole {
        /// The name that failed to resolve.
        name: String,
    },

    /// The scheme variant name is not known.
    #[error("unknown scheme variant '{name}'")]
    UnknownVariant {
        /// The name that failed to resolve.
        name: String,
    },

    /// A seed could not be derived (unreadable wallpaper, no opaque pixels).
    /// The theme falls back to the palette seed when this happens.
    #[error("scheme derivation failed: {details}")]
    SchemeDerivationFailed {
        /// Wallpaper involved, if any.
        path: Option<PathBuf>,
        /// What went wrong.
        details: String,
    },

    /// A theme or responsive configuration file could not be read.
    #[error("failed to read configuration {path:?}: {source}")]
    ConfigRead {
        /// File that was read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A theme or responsive configuration could not be parsed.
    #[error("failed to parse configuration: {source}")]
    ConfigParse {
        /// Underlying TOML error.
        #[from]
        source: toml::de::Error,
    },
}

/// Errors raised by the font-style registry.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum FontStyleError {
    /// No spec is registered for `(style, role)`.
    #[error("unknown font style '{style}' / '{role}'")]
    UnknownFontStyle {
        /// Style name, e.g. `Headline`.
        style: String,
        /// Role name, e.g. `large`.
        role: String,
    },

    /// The role name is not `large`, `medium` or `small`.
    #[error("unknown font role '{0}'")]
    UnknownFontRole(String),
}

/// Errors raised when composing widgets declaratively.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum CompositionError {
    /// A child of an unexpected kind was passed to a container.
    #[error("{parent} does not accept {child} children (accepted: {})", .accepted.join(", "))]
    UnsupportedChildType {
        /// Kind of the container.
        parent: String,
        /// Kind of the rejected child.
        child: String,
        /// Kinds the container accepts.
        accepted: Vec<String>,
    },
}

/// Convenience alias for theme results.
pub type ThemeResult<T> = Result<T, ThemeError>;
