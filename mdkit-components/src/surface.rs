//! Shared construction of themed containers.
//!
//! Most widgets are a surface: a theme subscription, an optional shadow, a
//! filled outline and, when interactive, a state layer, a ripple and a
//! transform. [`Surface::attach`] installs the first group and
//! [`Interaction::attach`] the second, so widget content features can be
//! attached in between and keep the draw order right.

use std::rc::Rc;

use derive_setters::Setters;
use mdkit_ui::{
    Color, Dp, PxSize, Signal, TouchEvent, TouchPhase, TouchResponse, Widget, WidgetFeature,
};

use crate::{
    behaviors::{
        background::BackgroundColor,
        elevation::Elevation,
        ripple::{Ripple, RippleArgs, RippleShape},
        state_layer::StateLayer,
        themable::{ColorBinding, Themable},
        transform::Transform,
    },
    context::BuildContext,
    role::Role,
    shape::Shape,
};

/// Interaction size tokens.
pub struct SurfaceDefaults;

impl SurfaceDefaults {
    /// Minimum edge of anything that can be tapped.
    pub const MIN_TAP_TARGET: Dp = Dp(48.0);
}

/// Configuration of a surface.
#[derive(Debug, Clone, PartialEq, Setters)]
pub struct SurfaceArgs {
    /// Fill role or `Custom`.
    pub bg: ColorBinding,
    /// Explicit fill, used with `Custom`.
    #[setters(strip_option)]
    pub bg_color: Option<Color>,
    /// Outline of the fill.
    pub shape: Shape,
    /// Shadow level; no shadow feature when `None`.
    #[setters(strip_option)]
    pub elevation: Option<u8>,
    /// Outline role and width.
    #[setters(strip_option)]
    pub outline: Option<(Role, Dp)>,
}

impl SurfaceArgs {
    /// Surface filled with `bg`.
    pub fn new(bg: impl Into<ColorBinding>) -> Self {
        Self {
            bg: bg.into(),
            bg_color: None,
            shape: Shape::RECTANGLE,
            elevation: None,
            outline: None,
        }
    }
}

/// The static part of a surface.
#[derive(Debug, Clone)]
pub struct Surface {
    /// Theme subscription of the widget.
    pub themable: Rc<Themable>,
    /// Shadow, when the surface is elevated.
    pub elevation: Option<Rc<Elevation>>,
    /// Fill and outline.
    pub background: Rc<BackgroundColor>,
}

impl Surface {
    /// Attaches theme subscription, shadow and background to `widget`.
    pub fn attach(widget: &Widget, ctx: &BuildContext, args: SurfaceArgs) -> Self {
        let themable = Themable::of(widget, &ctx.theme);
        let elevation = args
            .elevation
            .map(|level| Elevation::attach(widget, &themable, level));
        let background =
            BackgroundColor::attach(widget, &themable, args.bg, args.bg_color, args.shape);
        if let Some((role, width)) = args.outline {
            background.line_color.set_role(role);
            background.line_width.set(width.to_pixels_f32());
        }
        Self {
            themable,
            elevation,
            background,
        }
    }
}

/// The interactive part of a surface.
#[derive(Debug, Clone)]
pub struct Interaction {
    /// Hover, focus and pressed overlay.
    pub state_layer: Rc<StateLayer>,
    /// Touch ripple.
    pub ripple: Rc<Ripple>,
    /// Press and release notifications.
    pub clickable: Rc<Clickable>,
    /// Render transform; attached last.
    pub transform: Rc<Transform>,
}

impl Interaction {
    /// Attaches overlay, ripple, click tracking and transform. Call after
    /// every content feature of the widget.
    pub fn attach(
        widget: &Widget,
        ctx: &BuildContext,
        themable: &Themable,
        layer: impl Into<ColorBinding>,
        ripple: RippleArgs,
    ) -> Self {
        let layer = layer.into();
        let shape = ripple.shape;
        let ripple_args = match layer {
            ColorBinding::Role(role) if ripple.ripple_color.is_none() => ripple.ripple_role(role),
            _ => ripple,
        };
        let state_layer = StateLayer::attach(widget, themable, &ctx.clock, layer, shape);
        let ripple = Ripple::attach(widget, themable, &ctx.clock, ripple_args);
        let clickable = Clickable::attach(widget);
        let transform = Transform::of(widget);
        Self {
            state_layer,
            ripple,
            clickable,
            transform,
        }
    }

    /// Circular variant used by icon buttons and selection controls.
    pub fn attach_circular(
        widget: &Widget,
        ctx: &BuildContext,
        themable: &Themable,
        layer: impl Into<ColorBinding>,
    ) -> Self {
        Self::attach(widget, ctx, themable, layer, RippleArgs::circular())
    }

    /// Whether the ripple follows the circle inscribed in the widget.
    pub fn is_circular(&self) -> bool {
        self.ripple.shape() == RippleShape::Circle
    }
}

/// Emits `on_press` on touch down and `on_release` when the touch ends
/// inside the widget.
pub struct Clickable {
    /// Touch went down on the widget.
    pub on_press: Signal<()>,
    /// Touch ended inside the widget.
    pub on_release: Signal<()>,
}

impl std::fmt::Debug for Clickable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Clickable")
            .field("on_release", &self.on_release.observer_count())
            .finish()
    }
}

impl Clickable {
    /// Attaches click tracking to `widget`.
    pub fn attach(widget: &Widget) -> Rc<Self> {
        if let Some(existing) = widget.feature::<Clickable>() {
            return existing;
        }
        let clickable = Rc::new(Self {
            on_press: Signal::new(),
            on_release: Signal::new(),
        });
        widget.attach_feature(clickable.clone());
        clickable
    }

    /// Simulates a full click when the widget is enabled.
    pub fn click(&self, widget: &Widget) {
        if widget.is_effectively_disabled() {
            return;
        }
        self.on_press.emit(&());
        self.on_release.emit(&());
    }
}

impl WidgetFeature for Clickable {
    fn name(&self) -> &'static str {
        "clickable"
    }

    fn on_touch(&self, widget: &Widget, touch: &TouchEvent) -> TouchResponse {
        match touch.phase {
            TouchPhase::Down if !widget.is_effectively_disabled() => {
                self.on_press.emit(&());
                TouchResponse::Grab
            }
            TouchPhase::Up if widget.collide_point(touch.pos) => {
                self.on_release.emit(&());
                TouchResponse::Consumed
            }
            _ => TouchResponse::Ignored,
        }
    }
}

/// Grows `size` so both edges reach the minimum tap target.
pub fn tap_target(size: PxSize) -> PxSize {
    let min = SurfaceDefaults::MIN_TAP_TARGET.to_pixels_f32();
    PxSize::new(size.width.max(min), size.height.max(min))
}

/// Runs `relayout` whenever `widget` moves or resizes.
pub fn on_geometry(widget: &Widget, relayout: impl Fn(&Widget) + 'static) {
    let relayout = Rc::new(relayout);
    let target = widget.downgrade();
    let f = relayout.clone();
    widget.pos.bind(move |_| {
        if let Some(widget) = target.upgrade() {
            f(&widget);
        }
    });
    let target = widget.downgrade();
    widget.size.bind(move |_| {
        if let Some(widget) = target.upgrade() {
            relayout(&widget);
        }
    });
}

/// Mirrors the `disabled` flag of `parent` onto its current children.
pub fn propagate_disabled(parent: &Widget) {
    let weak = parent.downgrade();
    parent.disabled.bind(move |disabled| {
        if let Some(parent) = weak.upgrade() {
            for child in parent.children() {
                child.disabled.set(*disabled);
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use mdkit_ui::{PxPosition, Window};

    use super::*;

    #[test]
    fn surface_features_draw_in_order() {
        let ctx = BuildContext::new();
        let widget = Widget::new("Box");
        let surface = Surface::attach(
            &widget,
            &ctx,
            SurfaceArgs::new(Role::Primary)
                .elevation(1)
                .outline((Role::Outline, Dp(1.0))),
        );
        let interaction = Interaction::attach(
            &widget,
            &ctx,
            &surface.themable,
            Role::OnPrimary,
            RippleArgs::default(),
        );
        assert_eq!(
            widget.feature_names(),
            [
                "themable",
                "elevation",
                "background_color",
                "state_layer",
                "ripple",
                "clickable",
                "transform"
            ]
        );
        assert!(!interaction.is_circular());
        assert_eq!(surface.background.line_color.get(), ctx.theme.color(Role::Outline));
    }

    #[test]
    fn release_inside_fires_once() {
        let ctx = BuildContext::new();
        let window = Window::new(PxSize::new(300.0, 300.0));
        let widget = Widget::new("Box");
        let surface = Surface::attach(&widget, &ctx, SurfaceArgs::new(Role::Primary));
        let interaction = Interaction::attach(
            &widget,
            &ctx,
            &surface.themable,
            Role::OnPrimary,
            RippleArgs::default(),
        );
        window.add_widget(&widget);
        let clicks = Rc::new(Cell::new(0));
        let c = clicks.clone();
        interaction.clickable.on_release.connect(move |_| c.set(c.get() + 1));

        let down = TouchEvent::new(1, PxPosition::new(10.0, 10.0), TouchPhase::Down, 0.0);
        window.dispatch_touch(&down);
        window.dispatch_touch(&down.with(TouchPhase::Up, PxPosition::new(12.0, 10.0), 0.1));
        let down = TouchEvent::new(2, PxPosition::new(10.0, 10.0), TouchPhase::Down, 0.2);
        window.dispatch_touch(&down);
        window.dispatch_touch(&down.with(TouchPhase::Up, PxPosition::new(250.0, 250.0), 0.3));
        assert_eq!(clicks.get(), 1);
        assert!(!interaction.state_layer.pressed.get());
    }

    #[test]
    fn tap_target_has_minimum_edge() {
        let size = tap_target(PxSize::new(40.0, 20.0));
        assert_eq!(size, PxSize::new(48.0, 48.0));
    }
}
