//! Material Design switches.
//!
//! ## Usage
//!
//! Toggle a single setting on or off. The thumb slides across a capsule
//! track and grows when the switch is on.

use std::{cell::RefCell, rc::Rc};

use derive_setters::Setters;
use mdkit_ui::{
    Animation, AnimationHandle, Clock, Color, Dp, Easing, Property, PxPosition, PxRect, PxSize,
    Signal, Widget, WidgetFeature,
};

use crate::{
    behaviors::ripple::RippleArgs,
    context::BuildContext,
    role::Role,
    shape::Shape,
    surface::{Interaction, Surface, SurfaceArgs, on_geometry, propagate_disabled},
};

/// Switch tokens.
pub struct SwitchDefaults;

impl SwitchDefaults {
    /// Track width.
    pub const TRACK_WIDTH: Dp = Dp(52.0);
    /// Track height.
    pub const TRACK_HEIGHT: Dp = Dp(32.0);
    /// Thumb edge when off.
    pub const THUMB_OFF: Dp = Dp(16.0);
    /// Thumb edge when on.
    pub const THUMB_ON: Dp = Dp(24.0);
    /// Track outline width when off.
    pub const OUTLINE_WIDTH: Dp = Dp(2.0);
    /// Duration of the thumb slide in seconds.
    pub const SLIDE_DURATION: f64 = 0.2;
}

/// Arguments for [`Switch::new`].
#[derive(Debug, Clone, PartialEq, Default, Setters)]
pub struct SwitchArgs {
    /// Initial state.
    pub active: bool,
    /// Initial disabled state.
    pub disabled: bool,
    /// Explicit track color when on.
    #[setters(strip_option)]
    pub track_color_active: Option<Color>,
}

/// State shared by a switch and its observers.
#[derive(Debug)]
pub struct SwitchState {
    /// Whether the switch is on.
    pub active: Property<bool>,
    /// Track features.
    pub track: Surface,
    /// Thumb features.
    pub thumb_surface: Surface,
    /// Interactive features.
    pub interaction: Interaction,
    track_color_active: Option<Color>,
    clock: Clock,
    slide: RefCell<Option<AnimationHandle>>,
}

impl WidgetFeature for SwitchState {
    fn name(&self) -> &'static str {
        "switch"
    }

    fn cancel_transient(&self, _widget: &Widget) {
        if let Some(slide) = self.slide.borrow_mut().take() {
            slide.cancel();
        }
    }
}

impl SwitchState {
    fn apply_colors(&self, active: bool) {
        let track = &self.track.background;
        let thumb = &self.thumb_surface.background;
        if active {
            match self.track_color_active {
                Some(color) => track.md_bg_color.set_custom(color),
                None => track.md_bg_color.set_role(Role::Primary),
            }
            track.line_width.set(0.0);
            thumb.md_bg_color.set_role(Role::OnPrimary);
        } else {
            track.md_bg_color.set_role(Role::SurfaceContainerHighest);
            track.line_color.set_role(Role::Outline);
            track
                .line_width
                .set(SwitchDefaults::OUTLINE_WIDTH.to_pixels_f32());
            thumb.md_bg_color.set_role(Role::Outline);
        }
    }
}

/// Rect of the thumb inside `track` for `active`.
pub fn thumb_rect(track: PxRect, active: bool) -> PxRect {
    let edge = if active {
        SwitchDefaults::THUMB_ON
    } else {
        SwitchDefaults::THUMB_OFF
    }
    .to_pixels_f32();
    let inset = (track.height - edge) / 2.0;
    let x = if active {
        track.right() - inset - edge
    } else {
        track.x + inset
    };
    PxRect::new(x, track.y + inset, edge, edge)
}

/// An on/off switch.
#[derive(Clone)]
pub struct Switch {
    widget: Widget,
    /// Sliding thumb.
    pub thumb: Widget,
    /// State and interaction features.
    pub state: Rc<SwitchState>,
}

widget_wrapper!(Switch);

impl Switch {
    /// Creates a switch.
    pub fn new(ctx: &BuildContext, args: SwitchArgs) -> Self {
        let widget = Widget::new("Switch");
        let track = Surface::attach(
            &widget,
            ctx,
            SurfaceArgs::new(Role::SurfaceContainerHighest).shape(Shape::CAPSULE),
        );
        let thumb = Widget::new("SwitchThumb");
        let thumb_surface = Surface::attach(
            &thumb,
            ctx,
            SurfaceArgs::new(Role::Outline).shape(Shape::Ellipse),
        );
        let interaction = Interaction::attach(
            &widget,
            ctx,
            &track.themable,
            Role::OnSurface,
            RippleArgs::default().ripple_effect(false),
        );
        let state = Rc::new(SwitchState {
            active: Property::new("active", args.active),
            track,
            thumb_surface,
            interaction,
            track_color_active: args.track_color_active,
            clock: ctx.clock.clone(),
            slide: RefCell::new(None),
        });
        widget.attach_feature(state.clone());
        widget.add_widget(&thumb);
        state.apply_colors(args.active);
        widget.size.set(PxSize::from_dp(
            SwitchDefaults::TRACK_WIDTH,
            SwitchDefaults::TRACK_HEIGHT,
        ));
        snap_thumb(&widget);
        on_geometry(&widget, snap_thumb);

        let weak = Rc::downgrade(&state);
        let target = widget.downgrade();
        state.active.bind(move |active| {
            if let (Some(state), Some(widget)) = (weak.upgrade(), target.upgrade()) {
                state.apply_colors(*active);
                slide_thumb(&widget, &state, *active);
            }
        });
        let weak = Rc::downgrade(&state);
        let target = widget.downgrade();
        state.interaction.clickable.on_release.connect(move |_| {
            if let (Some(state), Some(widget)) = (weak.upgrade(), target.upgrade())
                && !widget.is_effectively_disabled()
            {
                state.active.update(|active| *active = !*active);
            }
        });
        propagate_disabled(&widget);
        widget.disabled.set(args.disabled);
        Self {
            widget,
            thumb,
            state,
        }
    }

    /// Whether the switch is on.
    pub fn is_active(&self) -> bool {
        self.state.active.get()
    }

    /// Effective track color.
    pub fn track_color(&self) -> Color {
        self.state.track.background.md_bg_color.get()
    }

    /// Fired when a press is released over the switch.
    pub fn on_release(&self) -> &Signal<()> {
        &self.state.interaction.clickable.on_release
    }
}

fn snap_thumb(widget: &Widget) {
    let Some(state) = widget.feature::<SwitchState>() else {
        return;
    };
    if state.slide.borrow().as_ref().is_some_and(AnimationHandle::is_running) {
        return;
    }
    let rect = thumb_rect(widget.rect(), state.active.get());
    for thumb in widget.children() {
        thumb.pos.set(PxPosition::new(rect.x, rect.y));
        thumb.size.set(PxSize::new(rect.width, rect.height));
    }
}

fn slide_thumb(widget: &Widget, state: &SwitchState, active: bool) {
    if let Some(previous) = state.slide.borrow_mut().take() {
        previous.cancel();
    }
    let rect = thumb_rect(widget.rect(), active);
    let Some(thumb) = widget.children().into_iter().next() else {
        return;
    };
    let handle = Animation::new(SwitchDefaults::SLIDE_DURATION, Easing::OutCubic)
        .animate(&thumb.pos, PxPosition::new(rect.x, rect.y))
        .animate(&thumb.size, PxSize::new(rect.width, rect.height))
        .start(&state.clock);
    *state.slide.borrow_mut() = Some(handle);
}

#[cfg(test)]
mod tests {
    use mdkit_ui::{TouchEvent, TouchPhase, Window};

    use super::*;

    #[test]
    fn thumb_slides_and_grows() {
        let ctx = BuildContext::new();
        let switch = Switch::new(&ctx, SwitchArgs::default());
        assert_eq!(switch.thumb.rect(), PxRect::new(8.0, 8.0, 16.0, 16.0));
        assert_eq!(switch.track_color(), ctx.theme.color(Role::SurfaceContainerHighest));

        switch.state.active.set(true);
        assert_eq!(switch.track_color(), ctx.theme.color(Role::Primary));
        ctx.clock.advance(0.3, 0.05);
        assert_eq!(switch.thumb.rect(), PxRect::new(24.0, 4.0, 24.0, 24.0));
    }

    #[test]
    fn tap_toggles_unless_disabled() {
        let ctx = BuildContext::new();
        let window = Window::new(PxSize::new(200.0, 200.0));
        let switch = Switch::new(&ctx, SwitchArgs::default());
        window.add_widget(&switch);
        let at = PxPosition::new(20.0, 16.0);
        let down = TouchEvent::new(1, at, TouchPhase::Down, 0.0);
        window.dispatch_touch(&down);
        window.dispatch_touch(&down.with(TouchPhase::Up, at, 0.05));
        assert!(switch.is_active());

        switch.disabled.set(true);
        window.dispatch_touch(&down);
        window.dispatch_touch(&down.with(TouchPhase::Up, at, 0.05));
        assert!(switch.is_active());
        assert!(switch.thumb.disabled.get());
    }
}
