//! Touch ripples: expanding discs clipped to the widget outline.
//!
//! A press starts a disc at the touch point (or the center, for circular
//! ripples) that grows to `ripple_scale x max(width, height)` in diameter.
//! Releasing fades every growing disc out; pressing again before a fade ends
//! starts another disc. Removal from the parent, disabling the widget or
//! losing the touch grab drops all discs immediately.

use std::{
    cell::{Cell, RefCell},
    rc::{Rc, Weak},
};

use derive_setters::Setters;
use mdkit_ui::{
    Animation, AnimationHandle, Canvas, CanvasLayer, Clock, Color, Easing, Instruction, Property,
    PxPosition, PxRect, TouchEvent, TouchPhase, TouchResponse, Widget, WidgetFeature,
};
use smallvec::SmallVec;
use tracing::trace;

use crate::{
    behaviors::{
        background::BackgroundColor,
        themable::{ColorBinding, Themable, ThemedColor},
    },
    role::Role,
    shape::Shape,
    theme::MaterialAlpha,
};

/// Outline a ripple is clipped to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RippleShape {
    /// The widget's background outline (rectangle, rounded or capsule).
    #[default]
    Rectangle,
    /// The circle inscribed in the widget; the disc grows from the center.
    Circle,
}

/// Default ripple parameters.
pub struct RippleDefaults;

impl RippleDefaults {
    /// Grow duration in seconds.
    pub const DURATION_IN: f64 = 0.3;
    /// Fade duration in seconds.
    pub const DURATION_OUT: f64 = 0.3;
    /// Diameter factor for rectangular ripples.
    pub const SCALE_RECTANGLE: f32 = 2.75;
    /// Diameter factor for circular ripples.
    pub const SCALE_CIRCLE: f32 = 1.0;
}

/// Ripple configuration.
#[derive(Debug, Clone, PartialEq, Setters)]
pub struct RippleArgs {
    /// Whether presses spawn ripples.
    pub ripple_effect: bool,
    /// Role of the ripple color.
    pub ripple_role: Role,
    /// Explicit ripple color; overrides `ripple_role`.
    #[setters(strip_option)]
    pub ripple_color: Option<Color>,
    /// Peak alpha of a disc.
    pub ripple_alpha: f32,
    /// Grow duration in seconds.
    pub ripple_duration_in: f64,
    /// Fade duration in seconds.
    pub ripple_duration_out: f64,
    /// Diameter factor relative to the longer edge.
    pub ripple_scale: f32,
    /// Clip outline.
    pub shape: RippleShape,
}

impl Default for RippleArgs {
    fn default() -> Self {
        Self {
            ripple_effect: true,
            ripple_role: Role::OnSurface,
            ripple_color: None,
            ripple_alpha: MaterialAlpha::PRESSED,
            ripple_duration_in: RippleDefaults::DURATION_IN,
            ripple_duration_out: RippleDefaults::DURATION_OUT,
            ripple_scale: RippleDefaults::SCALE_RECTANGLE,
            shape: RippleShape::Rectangle,
        }
    }
}

impl RippleArgs {
    /// Circular ripple.
    pub fn circular() -> Self {
        Self {
            ripple_scale: RippleDefaults::SCALE_CIRCLE,
            shape: RippleShape::Circle,
            ..Self::default()
        }
    }
}

struct Disc {
    origin: PxPosition,
    max_radius: f32,
    t_start: f64,
    radius: Property<f32>,
    alpha: Property<f32>,
    released: Cell<bool>,
    animation: RefCell<Option<AnimationHandle>>,
}

impl Disc {
    fn cancel(&self) {
        if let Some(handle) = self.animation.borrow_mut().take() {
            handle.cancel();
        }
    }
}

/// State of one live disc, for inspection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RippleDisc {
    /// Center of the disc.
    pub origin: PxPosition,
    /// Current radius.
    pub radius: f32,
    /// Radius the disc grows to.
    pub max_radius: f32,
    /// Clock time of the press.
    pub t_start: f64,
    /// Current alpha.
    pub color_alpha: f32,
}

/// Ripple feature.
pub struct Ripple {
    /// Whether presses spawn ripples.
    pub ripple_effect: Property<bool>,
    /// Ripple color slot.
    pub ripple_color: Rc<ThemedColor>,
    args: RippleArgs,
    clock: Clock,
    discs: RefCell<SmallVec<[Rc<Disc>; 2]>>,
    this: Weak<Ripple>,
}

impl std::fmt::Debug for Ripple {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ripple")
            .field("args", &self.args)
            .field("active", &self.active_ripples())
            .finish()
    }
}

impl Ripple {
    /// Attaches a ripple to `widget`.
    pub fn attach(
        widget: &Widget,
        themable: &Themable,
        clock: &Clock,
        args: RippleArgs,
    ) -> Rc<Self> {
        let binding = match args.ripple_color {
            Some(_) => ColorBinding::Custom,
            None => ColorBinding::Role(args.ripple_role),
        };
        let ripple = Rc::new_cyclic(|this| Self {
            ripple_effect: Property::new("ripple_effect", args.ripple_effect),
            ripple_color: themable.color_slot("ripple_color", binding, args.ripple_color),
            args,
            clock: clock.clone(),
            discs: RefCell::new(SmallVec::new()),
            this: this.clone(),
        });
        widget.attach_feature(ripple.clone());
        ripple
    }

    /// Outline and bounds the discs are clipped to.
    pub fn clip(&self, widget: &Widget) -> (Shape, PxRect) {
        let rect = widget.rect();
        match self.args.shape {
            RippleShape::Rectangle => (BackgroundColor::shape_of(widget), rect),
            RippleShape::Circle => {
                let edge = rect.width.min(rect.height);
                let c = rect.center();
                (
                    Shape::Ellipse,
                    PxRect::new(c.x - edge / 2.0, c.y - edge / 2.0, edge, edge),
                )
            }
        }
    }

    /// Clip outline kind.
    pub fn shape(&self) -> RippleShape {
        self.args.shape
    }

    /// Live discs, oldest first.
    pub fn discs(&self) -> Vec<RippleDisc> {
        self.discs
            .borrow()
            .iter()
            .map(|d| RippleDisc {
                origin: d.origin,
                radius: d.radius.get(),
                max_radius: d.max_radius,
                t_start: d.t_start,
                color_alpha: d.alpha.get(),
            })
            .collect()
    }

    /// Number of live discs.
    pub fn active_ripples(&self) -> usize {
        self.discs.borrow().len()
    }

    /// Whether a ripple pixel is painted at `point`: inside some disc and
    /// inside the clip outline.
    pub fn covers(&self, widget: &Widget, point: PxPosition) -> bool {
        let (shape, rect) = self.clip(widget);
        shape.contains(&rect, point)
            && self
                .discs
                .borrow()
                .iter()
                .any(|d| point.distance_to(d.origin) <= d.radius.get())
    }

    fn press(&self, widget: &Widget, pos: PxPosition) {
        let (_, rect) = self.clip(widget);
        let origin = match self.args.shape {
            RippleShape::Rectangle => pos,
            RippleShape::Circle => rect.center(),
        };
        let max_radius = self.args.ripple_scale * rect.width.max(rect.height) / 2.0;
        let disc = Rc::new(Disc {
            origin,
            max_radius,
            t_start: self.clock.time(),
            radius: Property::new("ripple_radius", 0.0),
            alpha: Property::new("ripple_alpha", self.args.ripple_alpha),
            released: Cell::new(false),
            animation: RefCell::new(None),
        });
        let handle = Animation::new(self.args.ripple_duration_in, Easing::OutQuad)
            .animate(&disc.radius, max_radius)
            .start(&self.clock);
        *disc.animation.borrow_mut() = Some(handle);
        trace!(widget = widget.kind(), x = origin.x, y = origin.y, "ripple started");
        self.discs.borrow_mut().push(disc);
    }

    fn release(&self) {
        let growing: Vec<Rc<Disc>> = self
            .discs
            .borrow()
            .iter()
            .filter(|d| !d.released.replace(true))
            .cloned()
            .collect();
        for disc in growing {
            disc.cancel();
            let handle = Animation::new(self.args.ripple_duration_out, Easing::Linear)
                .animate(&disc.radius, disc.max_radius)
                .animate(&disc.alpha, 0.0)
                .start(&self.clock);
            let ripple = self.this.clone();
            let finished = Rc::downgrade(&disc);
            handle.on_complete().connect(move |_| {
                if let (Some(ripple), Some(disc)) = (ripple.upgrade(), finished.upgrade()) {
                    ripple.discs.borrow_mut().retain(|d| !Rc::ptr_eq(d, &disc));
                }
            });
            *disc.animation.borrow_mut() = Some(handle);
        }
    }
}

impl WidgetFeature for Ripple {
    fn name(&self) -> &'static str {
        "ripple"
    }

    fn draw(&self, widget: &Widget, canvas: &mut Canvas) {
        let discs = self.discs.borrow();
        if discs.is_empty() {
            return;
        }
        let (shape, rect) = self.clip(widget);
        let color = self.ripple_color.get();
        let layer = canvas.layer_mut(CanvasLayer::After);
        layer.push(Instruction::StencilPush);
        layer.push(shape.fill(rect));
        layer.push(Instruction::StencilUse);
        for disc in discs.iter() {
            let r = disc.radius.get();
            layer.push(Instruction::Color(color.with_alpha(color.a * disc.alpha.get())));
            layer.push(Instruction::Ellipse {
                rect: PxRect::new(disc.origin.x - r, disc.origin.y - r, r * 2.0, r * 2.0),
                angle_start: 0.0,
                angle_end: 360.0,
            });
        }
        layer.push(Instruction::StencilUnUse);
        layer.push(shape.fill(rect));
        layer.push(Instruction::StencilPop);
    }

    fn on_touch(&self, widget: &Widget, touch: &TouchEvent) -> TouchResponse {
        match touch.phase {
            TouchPhase::Down => {
                if !self.ripple_effect.get() || widget.is_effectively_disabled() {
                    return TouchResponse::Ignored;
                }
                let (shape, rect) = self.clip(widget);
                if !shape.contains(&rect, touch.pos) {
                    return TouchResponse::Ignored;
                }
                self.press(widget, touch.pos);
                TouchResponse::Grab
            }
            TouchPhase::Move => TouchResponse::Ignored,
            TouchPhase::Up => {
                self.release();
                TouchResponse::Consumed
            }
            TouchPhase::Cancel => {
                self.cancel_transient(widget);
                TouchResponse::Consumed
            }
        }
    }

    fn cancel_transient(&self, _widget: &Widget) {
        let discs = std::mem::take(&mut *self.discs.borrow_mut());
        for disc in discs {
            disc.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use mdkit_ui::{Dp, PxSize};

    use super::*;
    use crate::theme::ThemeManager;

    fn setup(args: RippleArgs) -> (Widget, Rc<Ripple>, Clock) {
        let theme = ThemeManager::new();
        let clock = Clock::new();
        let widget = Widget::new("Box");
        widget.size.set(PxSize::new(120.0, 40.0));
        let themable = Themable::of(&widget, &theme);
        BackgroundColor::attach(&widget, &themable, Role::Primary, None, Shape::rounded(Dp(12.0)));
        let ripple = Ripple::attach(&widget, &themable, &clock, args);
        (widget, ripple, clock)
    }

    fn touch(phase: TouchPhase, x: f32, y: f32) -> TouchEvent {
        TouchEvent::new(1, PxPosition::new(x, y), phase, 0.0)
    }

    #[test]
    fn press_grows_and_release_fades_out() {
        let (widget, ripple, clock) = setup(RippleArgs::default());
        assert_eq!(widget.deliver_touch(&touch(TouchPhase::Down, 10.0, 10.0)), TouchResponse::Grab);
        clock.advance(0.15, 1.0 / 60.0);
        let disc = ripple.discs()[0];
        assert!(disc.radius > 0.0 && disc.radius < disc.max_radius);

        widget.deliver_touch(&touch(TouchPhase::Up, 10.0, 10.0));
        clock.advance(0.5, 1.0 / 60.0);
        assert_eq!(ripple.active_ripples(), 0);
    }

    #[test]
    fn re_press_before_fade_spawns_second_disc() {
        let (widget, ripple, clock) = setup(RippleArgs::default());
        widget.deliver_touch(&touch(TouchPhase::Down, 10.0, 10.0));
        widget.deliver_touch(&touch(TouchPhase::Up, 10.0, 10.0));
        clock.tick(0.05);
        widget.deliver_touch(&touch(TouchPhase::Down, 60.0, 20.0));
        assert_eq!(ripple.active_ripples(), 2);
    }

    #[test]
    fn disable_and_removal_cancel_everything() {
        let (widget, ripple, clock) = setup(RippleArgs::default());
        widget.deliver_touch(&touch(TouchPhase::Down, 10.0, 10.0));
        widget.disabled.set(true);
        assert_eq!(ripple.active_ripples(), 0);
        assert!(widget.render().canvas.after.is_empty());

        widget.disabled.set(false);
        let parent = Widget::new("Parent");
        parent.add_widget(&widget);
        widget.deliver_touch(&touch(TouchPhase::Down, 10.0, 10.0));
        parent.remove_widget(&widget);
        assert_eq!(ripple.active_ripples(), 0);
        clock.advance(1.0, 0.1);
        assert_eq!(ripple.active_ripples(), 0);
    }

    #[test]
    fn circular_ripple_grows_from_center() {
        let (widget, ripple, clock) = setup(RippleArgs::circular());
        widget.deliver_touch(&touch(TouchPhase::Down, 60.0, 25.0));
        clock.advance(1.0, 0.1);
        let disc = ripple.discs()[0];
        assert_eq!(disc.origin, widget.center());
        assert_eq!(disc.max_radius, 20.0);
        assert!(!ripple.covers(&widget, PxPosition::new(5.0, 20.0)));
    }

    #[test]
    fn discs_draw_inside_stencil() {
        let (widget, _ripple, clock) = setup(RippleArgs::default());
        widget.deliver_touch(&touch(TouchPhase::Down, 10.0, 10.0));
        clock.tick(0.1);
        let after = widget.render().canvas.after;
        assert_eq!(after[0], Instruction::StencilPush);
        assert_eq!(after[2], Instruction::StencilUse);
        assert!(matches!(after[4], Instruction::Ellipse { .. }));
        assert_eq!(after[5], Instruction::StencilUnUse);
        assert_eq!(after.last(), Some(&Instruction::StencilPop));
    }
}
