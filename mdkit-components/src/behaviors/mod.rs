//! Reusable behaviors attached to widgets as feature records.
//!
//! A widget is a [`mdkit_ui::Widget`] plus an ordered list of features. Draw
//! order follows attach order, so widgets attach in this sequence:
//!
//! 1. [`themable::Themable`] (no drawing, owns the theme subscription)
//! 2. [`elevation::Elevation`]
//! 3. [`background::BackgroundColor`]
//! 4. content features of the widget itself
//! 5. [`state_layer::StateLayer`] and [`ripple::Ripple`]
//! 6. [`transform::Transform`], always last

pub mod background;
pub mod declarative;
pub mod elevation;
pub mod magic;
pub mod ripple;
pub mod state_layer;
pub mod themable;
pub mod touch;
pub mod transform;

pub use background::BackgroundColor;
pub use declarative::ChildPolicy;
pub use elevation::Elevation;
pub use magic::{AnimatorArgs, AttentionKind, MagicBehavior};
pub use ripple::{Ripple, RippleArgs, RippleShape};
pub use state_layer::StateLayer;
pub use themable::{ColorBinding, Themable, ThemedColor};
pub use touch::{TouchArgs, TouchBehavior};
pub use transform::Transform;
