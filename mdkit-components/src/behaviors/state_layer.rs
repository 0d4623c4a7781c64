//! Hover, focus, pressed and dragged overlays combined into one state layer.
//!
//! The overlay alpha is the sum of the active layer opacities, clamped to 1:
//! pressed replaces hover, focus and dragged stack on top. Every state change
//! retargets a short linear tween from the current alpha, so the overlay
//! always moves monotonically toward the latest target and never stalls.

use std::{
    cell::RefCell,
    fmt,
    rc::{Rc, Weak},
};

use mdkit_ui::{
    Animation, AnimationHandle, Canvas, CanvasLayer, Clock, Easing, Instruction, Property,
    PxPosition, Signal, TouchEvent, TouchPhase, TouchResponse, WeakWidget, Widget, WidgetFeature,
};

use crate::{
    behaviors::{
        background::BackgroundColor,
        ripple::RippleShape,
        themable::{ColorBinding, Themable, ThemedColor},
    },
    shape::Shape,
    theme::MaterialAlpha,
};

/// State-layer timing.
pub struct StateLayerDefaults;

impl StateLayerDefaults {
    /// Duration of a full 0 -> target transition, in seconds.
    pub const TRANSITION: f64 = 0.15;
}

/// Interaction overlay feature.
pub struct StateLayer {
    /// Pointer is inside the widget.
    pub hovering: Property<bool>,
    /// A touch is grabbed by the widget.
    pub pressed: Property<bool>,
    /// The widget is being dragged.
    pub dragged: Property<bool>,
    /// Overlay color slot, usually the on-color of the container.
    pub layer_color: Rc<ThemedColor>,
    /// Current overlay alpha.
    pub overlay_alpha: Property<f32>,
    /// Fired when the pointer enters.
    pub on_enter: Signal<()>,
    /// Fired when the pointer leaves.
    pub on_leave: Signal<()>,
    shape: RippleShape,
    clock: Clock,
    widget: WeakWidget,
    tween: RefCell<Option<AnimationHandle>>,
    this: Weak<StateLayer>,
}

impl fmt::Debug for StateLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateLayer")
            .field("hovering", &self.hovering.get())
            .field("pressed", &self.pressed.get())
            .field("dragged", &self.dragged.get())
            .field("overlay_alpha", &self.overlay_alpha.get())
            .finish()
    }
}

impl StateLayer {
    /// Attaches a state layer painted in `layer_color`.
    pub fn attach(
        widget: &Widget,
        themable: &Themable,
        clock: &Clock,
        layer_color: impl Into<ColorBinding>,
        shape: RippleShape,
    ) -> Rc<Self> {
        let layer = Rc::new_cyclic(|this| Self {
            hovering: Property::new("hovering", false),
            pressed: Property::new("pressed", false),
            dragged: Property::new("dragged", false),
            layer_color: themable.color_slot("state_layer_color", layer_color, None),
            overlay_alpha: Property::new("overlay_alpha", 0.0),
            on_enter: Signal::new(),
            on_leave: Signal::new(),
            shape,
            clock: clock.clone(),
            widget: widget.downgrade(),
            tween: RefCell::new(None),
            this: this.clone(),
        });
        for property in [&layer.hovering, &layer.pressed, &layer.dragged, &widget.focus] {
            let weak = layer.this.clone();
            property.bind(move |_| {
                if let Some(layer) = weak.upgrade() {
                    layer.retarget();
                }
            });
        }
        widget.attach_feature(layer.clone());
        layer
    }

    /// Alpha the overlay is heading to.
    pub fn target_alpha(&self) -> f32 {
        let Some(widget) = self.widget.upgrade() else {
            return 0.0;
        };
        if widget.is_effectively_disabled() {
            return 0.0;
        }
        let mut alpha = if self.pressed.get() {
            MaterialAlpha::PRESSED
        } else if self.hovering.get() {
            MaterialAlpha::HOVER
        } else {
            0.0
        };
        if widget.focus.get() {
            alpha += MaterialAlpha::FOCUSED;
        }
        if self.dragged.get() {
            alpha += MaterialAlpha::DRAGGED;
        }
        alpha.min(1.0)
    }

    /// Overlay color of the current frame.
    pub fn overlay_color(&self) -> mdkit_ui::Color {
        let color = self.layer_color.get();
        color.with_alpha(color.a * self.overlay_alpha.get())
    }

    fn retarget(&self) {
        if let Some(previous) = self.tween.borrow_mut().take() {
            previous.cancel();
        }
        let target = self.target_alpha();
        let current = self.overlay_alpha.get();
        if (target - current).abs() < f32::EPSILON {
            return;
        }
        let handle = Animation::new(StateLayerDefaults::TRANSITION, Easing::Linear)
            .animate(&self.overlay_alpha, target)
            .start(&self.clock);
        *self.tween.borrow_mut() = Some(handle);
    }

    fn outline(&self, widget: &Widget) -> (Shape, mdkit_ui::PxRect) {
        let rect = widget.rect();
        match self.shape {
            RippleShape::Rectangle => (BackgroundColor::shape_of(widget), rect),
            RippleShape::Circle => (Shape::Ellipse, rect),
        }
    }
}

impl WidgetFeature for StateLayer {
    fn name(&self) -> &'static str {
        "state_layer"
    }

    fn draw(&self, widget: &Widget, canvas: &mut Canvas) {
        let color = self.overlay_color();
        if color.a <= 0.0 {
            return;
        }
        let (shape, rect) = self.outline(widget);
        canvas.push(CanvasLayer::After, Instruction::Color(color));
        canvas.push(CanvasLayer::After, shape.fill(rect));
    }

    fn on_touch(&self, widget: &Widget, touch: &TouchEvent) -> TouchResponse {
        match touch.phase {
            TouchPhase::Down => {
                if widget.is_effectively_disabled() {
                    return TouchResponse::Ignored;
                }
                self.pressed.set(true);
                TouchResponse::Grab
            }
            TouchPhase::Move => TouchResponse::Ignored,
            TouchPhase::Up | TouchPhase::Cancel => {
                self.pressed.set(false);
                TouchResponse::Consumed
            }
        }
    }

    fn on_pointer(&self, widget: &Widget, _pos: PxPosition, inside: bool) {
        let inside = inside && !widget.is_effectively_disabled();
        if self.hovering.set(inside) {
            if inside {
                self.on_enter.emit(&());
            } else {
                self.on_leave.emit(&());
            }
        }
    }

    fn cancel_transient(&self, _widget: &Widget) {
        self.pressed.set(false);
        self.hovering.set(false);
        self.dragged.set(false);
        if let Some(tween) = self.tween.borrow_mut().take() {
            tween.cancel();
        }
        self.overlay_alpha.set(0.0);
    }
}

#[cfg(test)]
mod tests {
    use mdkit_ui::PxSize;

    use super::*;
    use crate::{role::Role, theme::ThemeManager};

    fn setup() -> (Widget, Rc<StateLayer>, Clock) {
        let theme = ThemeManager::new();
        let clock = Clock::new();
        let widget = Widget::new("Box");
        widget.size.set(PxSize::new(100.0, 40.0));
        let themable = Themable::of(&widget, &theme);
        let layer = StateLayer::attach(
            &widget,
            &themable,
            &clock,
            Role::OnPrimary,
            RippleShape::Rectangle,
        );
        (widget, layer, clock)
    }

    #[test]
    fn pressed_replaces_hover_and_focus_stacks() {
        let (widget, layer, _clock) = setup();
        layer.hovering.set(true);
        assert_eq!(layer.target_alpha(), MaterialAlpha::HOVER);
        layer.pressed.set(true);
        assert_eq!(layer.target_alpha(), MaterialAlpha::PRESSED);
        widget.focus.set(true);
        let stacked = MaterialAlpha::PRESSED + MaterialAlpha::FOCUSED;
        assert!((layer.target_alpha() - stacked).abs() < 1e-6);
    }

    #[test]
    fn transitions_settle_on_the_latest_target() {
        let (_widget, layer, clock) = setup();
        layer.hovering.set(true);
        clock.tick(0.05);
        let midway = layer.overlay_alpha.get();
        assert!(midway > 0.0 && midway < MaterialAlpha::HOVER);
        layer.hovering.set(false);
        clock.advance(0.3, 1.0 / 60.0);
        assert_eq!(layer.overlay_alpha.get(), 0.0);

        layer.pressed.set(true);
        clock.advance(0.3, 1.0 / 60.0);
        assert_eq!(layer.overlay_alpha.get(), MaterialAlpha::PRESSED);
    }

    #[test]
    fn pointer_and_disable_drive_hover() {
        let (widget, layer, clock) = setup();
        let entered = Rc::new(std::cell::Cell::new(0));
        let e = entered.clone();
        layer.on_enter.connect(move |_| e.set(e.get() + 1));
        widget.dispatch_pointer(PxPosition::new(10.0, 10.0), false);
        assert!(layer.hovering.get());
        assert_eq!(entered.get(), 1);
        clock.advance(0.3, 0.05);
        widget.disabled.set(true);
        assert!(!layer.hovering.get());
        assert_eq!(layer.overlay_alpha.get(), 0.0);
    }
}
