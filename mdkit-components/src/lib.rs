//! Material Design 3 widgets, behaviors and dynamic-color theming.
//!
//! # Usage
//!
//! Every widget is built from a [`context::BuildContext`] that carries the
//! [`theme::ThemeManager`], the [`mdkit_ui::Clock`] and optionally the
//! [`mdkit_ui::Window`] used for overlays.
//!
//! ```
//! use mdkit_components::{
//!     button::{Button, ButtonArgs, ButtonStyle},
//!     context::BuildContext,
//!     role::Role,
//! };
//!
//! let ctx = BuildContext::new();
//! let button = Button::new(&ctx, ButtonArgs::new(ButtonStyle::Filled).text("Send"));
//! let light = button.md_bg_color();
//! ctx.theme.switch_theme();
//! assert_ne!(button.md_bg_color(), light);
//! assert_eq!(button.md_bg_color(), ctx.theme.color(Role::Primary));
//! ```
//!
//! # Composition
//!
//! Widgets are thin handles around a [`mdkit_ui::Widget`] and dereference to
//! it, so geometry, `disabled` and the child tree are always at hand. Their
//! look and behavior come from the feature records in [`behaviors`].
#![deny(missing_docs, clippy::unwrap_used)]

/// Implements the handle conversions every widget shares.
macro_rules! widget_wrapper {
    ($name:ident) => {
        impl ::std::ops::Deref for $name {
            type Target = ::mdkit_ui::Widget;

            fn deref(&self) -> &::mdkit_ui::Widget {
                &self.widget
            }
        }

        impl ::std::convert::AsRef<::mdkit_ui::Widget> for $name {
            fn as_ref(&self) -> &::mdkit_ui::Widget {
                &self.widget
            }
        }

        impl ::std::convert::From<$name> for ::mdkit_ui::Widget {
            fn from(handle: $name) -> Self {
                handle.widget
            }
        }

        impl ::std::convert::From<&$name> for ::mdkit_ui::Widget {
            fn from(handle: &$name) -> Self {
                handle.widget.clone()
            }
        }

        impl ::std::fmt::Debug for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.debug_struct(stringify!($name))
                    .field("widget", &self.widget)
                    .finish_non_exhaustive()
            }
        }
    };
}

pub mod app_bar;
pub mod badge;
pub mod behaviors;
pub mod button;
pub mod card;
pub mod carousel;
pub mod checkbox;
pub mod chip;
pub mod color_definitions;
pub mod context;
pub mod date_picker;
pub mod dialog;
pub mod divider;
pub mod dynamic_scheme;
pub mod error;
pub mod expansion_panel;
pub mod floating_action_button;
pub mod font_styles;
pub mod hero;
pub mod icon_button;
pub mod icon_definitions;
pub mod label;
pub mod layout;
pub mod list_item;
pub mod menu;
pub mod navigation_bar;
pub mod navigation_drawer;
pub mod navigation_rail;
pub mod overlay;
pub mod progress_indicator;
pub mod responsive;
pub mod role;
pub mod segmented_buttons;
pub mod shape;
pub mod slider;
pub mod snackbar;
pub mod surface;
pub mod switch;
pub mod tabs;
pub mod text_field;
pub mod theme;
pub mod time_picker;
pub mod tooltip;

pub use crate::{
    context::BuildContext,
    error::{CompositionError, FontStyleError, ThemeError, ThemeResult},
    role::Role,
    theme::{ThemeManager, ThemeStyle},
};
