//! Headless, frame-driven toolkit contracts underneath mdkit.
//!
//! This crate owns the pieces every widget relies on but that carry no
//! Material semantics of their own:
//!
//! - [`Property`] and [`Signal`]: observable values and synchronous callbacks.
//! - [`Clock`] and [`Animation`]: all time advances through [`Clock::tick`],
//!   so tests drive animations frame by frame without waiting.
//! - [`Canvas`]: the retained instruction list widgets record each frame.
//! - [`Widget`] and [`WidgetFeature`]: the widget tree and the composable
//!   feature records that give widgets their behavior.
//! - [`Window`], [`Screen`] and [`ScreenManager`]: input routing and paging.
//!
//! Everything here is single-threaded (`Rc`/`RefCell`); the host calls into
//! the toolkit from its GUI thread only.
//!
//! ```
//! use mdkit_ui::{Clock, PxSize, Widget, Window};
//!
//! let clock = Clock::new();
//! let window = Window::new(PxSize::new(360.0, 640.0));
//! let root = Widget::new("Root");
//! window.add_widget(&root);
//! clock.tick(1.0 / 60.0);
//! assert_eq!(window.render().len(), 1);
//! ```
#![deny(missing_docs, clippy::unwrap_used)]

pub mod animation;
pub mod canvas;
pub mod clock;
pub mod color;
pub mod dp;
pub mod input;
pub mod logging;
pub mod property;
pub mod px;
pub mod screen;
pub mod signal;
pub mod widget;
pub mod window;

pub use crate::{
    animation::{Animatable, Animation, AnimationHandle, Easing},
    canvas::{Canvas, CanvasLayer, CornerRadii, Instruction, RenderNode},
    clock::{Clock, ClockEvent, ClockEventId},
    color::{Color, ParseColorError},
    dp::Dp,
    input::{MouseButton, TouchEvent, TouchPhase, TouchResponse},
    property::Property,
    px::{Px, PxPosition, PxRect, PxSize},
    screen::{
        Screen, ScreenError, ScreenManager, SlideDirection, Transition, TransitionInfo,
        TransitionKind,
    },
    signal::{ObserverId, Signal},
    widget::{PosHint, WeakWidget, Widget, WidgetData, WidgetEvent, WidgetFeature},
    window::{SoftInputMode, Window},
};
