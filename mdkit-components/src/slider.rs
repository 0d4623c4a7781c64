//! Sliders: pick a value from a continuous or stepped range.
//!
//! ## Usage
//!
//! Drag the handle or tap the track. While the handle is held, an optional
//! value label floats above it. Values snap to `step` when it is positive.

use std::{cell::Cell, rc::Rc};

use derive_setters::Setters;
use mdkit_ui::{
    Canvas, CanvasLayer, Color, Dp, Instruction, Property, PxPosition, PxRect, PxSize, Signal,
    TouchEvent, TouchPhase, TouchResponse, Widget, WidgetFeature,
};
use tracing::trace;

use crate::{
    behaviors::themable::{ColorBinding, Themable, ThemedColor},
    context::BuildContext,
    font_styles::FontRole,
    label::{Label, LabelArgs},
    role::Role,
    shape::Shape,
    surface::{Surface, SurfaceArgs, on_geometry, propagate_disabled},
};

/// Slider tokens.
pub struct SliderDefaults;

impl SliderDefaults {
    /// Default width.
    pub const WIDTH: Dp = Dp(240.0);
    /// Height, the minimum tap target.
    pub const HEIGHT: Dp = Dp(48.0);
    /// Track thickness.
    pub const TRACK_HEIGHT: Dp = Dp(4.0);
    /// Handle diameter.
    pub const HANDLE_SIZE: Dp = Dp(20.0);
    /// Value label width.
    pub const LABEL_WIDTH: Dp = Dp(48.0);
    /// Value label height.
    pub const LABEL_HEIGHT: Dp = Dp(44.0);
    /// Gap between handle and value label.
    pub const LABEL_OFFSET: Dp = Dp(4.0);
}

/// Kind of the handle child.
pub const HANDLE: &str = "SliderHandle";
/// Kind of the value label child.
pub const VALUE_LABEL: &str = "SliderValueLabel";

/// Arguments for [`Slider::new`].
#[derive(Debug, Clone, PartialEq, Setters)]
pub struct SliderArgs {
    /// Lower bound.
    pub min: f32,
    /// Upper bound.
    pub max: f32,
    /// Initial value.
    pub value: f32,
    /// Snap interval; continuous when zero.
    pub step: f32,
    /// Float the value above the handle while held.
    pub show_value_label: bool,
    /// Explicit color of the filled track part.
    #[setters(strip_option)]
    pub track_active_color: Option<Color>,
    /// Explicit color of the empty track part.
    #[setters(strip_option)]
    pub track_inactive_color: Option<Color>,
    /// Initial disabled state.
    pub disabled: bool,
}

impl Default for SliderArgs {
    fn default() -> Self {
        Self {
            min: 0.0,
            max: 100.0,
            value: 0.0,
            step: 0.0,
            show_value_label: true,
            track_active_color: None,
            track_inactive_color: None,
            disabled: false,
        }
    }
}

/// Clamps `value` into `[min, max]` and snaps it to the nearest multiple of
/// `step` counted from `min`.
pub fn snap(value: f32, min: f32, max: f32, step: f32) -> f32 {
    let (low, high) = if min <= max { (min, max) } else { (max, min) };
    let value = value.clamp(low, high);
    if step <= 0.0 {
        return value;
    }
    (low + ((value - low) / step).round() * step).min(high)
}

/// Text of the value label.
pub fn format_value(value: f32, step: f32) -> String {
    if step > 0.0 && step.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{value:.2}")
    }
}

/// Slider feature: range, value, track and touch handling.
#[derive(Debug)]
pub struct SliderState {
    /// Lower bound.
    pub min: Property<f32>,
    /// Upper bound.
    pub max: Property<f32>,
    /// Snap interval.
    pub step: Property<f32>,
    /// Current value.
    pub value: Property<f32>,
    /// Whether the handle is held.
    pub active: Property<bool>,
    /// Float the value above the handle while held.
    pub show_value_label: Property<bool>,
    /// Color of the filled track part.
    pub track_active_color: Rc<ThemedColor>,
    /// Color of the empty track part.
    pub track_inactive_color: Rc<ThemedColor>,
    /// Fired with the value when the handle is released.
    pub on_release: Signal<f32>,
    touch: Cell<Option<u64>>,
}

impl SliderState {
    /// Share of the range below the value, `[0, 1]`.
    pub fn fraction(&self) -> f32 {
        let (min, max) = (self.min.get(), self.max.get());
        if (max - min).abs() <= f32::EPSILON {
            return 0.0;
        }
        ((self.value.get() - min) / (max - min)).clamp(0.0, 1.0)
    }

    /// Sets the value, clamped and snapped.
    pub fn set_value(&self, value: f32) {
        self.value.set(snap(
            value,
            self.min.get(),
            self.max.get(),
            self.step.get(),
        ));
    }

    /// Track rectangle inside the slider bounds.
    pub fn track_rect(&self, bounds: PxRect) -> PxRect {
        let inset = SliderDefaults::HANDLE_SIZE.to_pixels_f32() / 2.0;
        let height = SliderDefaults::TRACK_HEIGHT.to_pixels_f32();
        PxRect::new(
            bounds.x + inset,
            bounds.center().y - height / 2.0,
            (bounds.width - 2.0 * inset).max(0.0),
            height,
        )
    }

    /// Center of the handle inside the slider bounds.
    pub fn handle_center(&self, bounds: PxRect) -> PxPosition {
        let track = self.track_rect(bounds);
        PxPosition::new(track.x + track.width * self.fraction(), bounds.center().y)
    }

    fn value_at(&self, bounds: PxRect, x: f32) -> f32 {
        let track = self.track_rect(bounds);
        let t = if track.width > 0.0 {
            ((x - track.x) / track.width).clamp(0.0, 1.0)
        } else {
            0.0
        };
        let (min, max) = (self.min.get(), self.max.get());
        min + (max - min) * t
    }
}

impl WidgetFeature for SliderState {
    fn name(&self) -> &'static str {
        "slider"
    }

    fn draw(&self, widget: &Widget, canvas: &mut Canvas) {
        let bounds = widget.rect();
        let track = self.track_rect(bounds);
        let split = self.handle_center(bounds).x;
        canvas.push(
            CanvasLayer::Main,
            Instruction::Color(self.track_inactive_color.get()),
        );
        canvas.push(
            CanvasLayer::Main,
            Shape::CAPSULE.fill(PxRect::new(split, track.y, track.right() - split, track.height)),
        );
        canvas.push(
            CanvasLayer::Main,
            Instruction::Color(self.track_active_color.get()),
        );
        canvas.push(
            CanvasLayer::Main,
            Shape::CAPSULE.fill(PxRect::new(track.x, track.y, split - track.x, track.height)),
        );
    }

    fn on_touch(&self, widget: &Widget, touch: &TouchEvent) -> TouchResponse {
        match touch.phase {
            TouchPhase::Down => {
                if widget.is_effectively_disabled() || self.touch.get().is_some() {
                    return TouchResponse::Ignored;
                }
                self.touch.set(Some(touch.id));
                self.active.set(true);
                self.set_value(self.value_at(widget.rect(), touch.pos.x));
                TouchResponse::Grab
            }
            TouchPhase::Move if self.touch.get() == Some(touch.id) => {
                self.set_value(self.value_at(widget.rect(), touch.pos.x));
                trace!(value = self.value.get(), "slider dragged");
                TouchResponse::Consumed
            }
            TouchPhase::Up if self.touch.get() == Some(touch.id) => {
                self.touch.set(None);
                self.set_value(self.value_at(widget.rect(), touch.pos.x));
                self.active.set(false);
                self.on_release.emit(&self.value.get());
                TouchResponse::Consumed
            }
            TouchPhase::Cancel if self.touch.get() == Some(touch.id) => {
                self.touch.set(None);
                self.active.set(false);
                TouchResponse::Consumed
            }
            _ => TouchResponse::Ignored,
        }
    }

    fn cancel_transient(&self, _widget: &Widget) {
        self.touch.set(None);
        self.active.set(false);
    }
}

/// A horizontal slider.
#[derive(Clone)]
pub struct Slider {
    widget: Widget,
    /// Round handle.
    pub handle: Widget,
    /// Value label, when enabled.
    pub value_label: Option<Widget>,
    /// Range, value and track state.
    pub state: Rc<SliderState>,
}

widget_wrapper!(Slider);

impl Slider {
    /// Creates a slider.
    pub fn new(ctx: &BuildContext, args: SliderArgs) -> Self {
        let widget = Widget::new("Slider");
        let themable = Themable::of(&widget, &ctx.theme);
        let binding = |custom: Option<Color>, role| match custom {
            Some(_) => ColorBinding::Custom,
            None => ColorBinding::Role(role),
        };
        let state = Rc::new(SliderState {
            min: Property::new("min", args.min),
            max: Property::new("max", args.max),
            step: Property::new("step", args.step),
            value: Property::new("value", snap(args.value, args.min, args.max, args.step)),
            active: Property::new("active", false),
            show_value_label: Property::new("show_value_label", args.show_value_label),
            track_active_color: themable.color_slot(
                "track_active_color",
                binding(args.track_active_color, Role::Primary),
                args.track_active_color,
            ),
            track_inactive_color: themable.color_slot(
                "track_inactive_color",
                binding(args.track_inactive_color, Role::SurfaceContainerHighest),
                args.track_inactive_color,
            ),
            on_release: Signal::new(),
            touch: Cell::new(None),
        });
        widget.attach_feature(state.clone());

        let handle = Widget::new(HANDLE);
        Surface::attach(
            &handle,
            ctx,
            SurfaceArgs::new(Role::Primary).shape(Shape::Ellipse),
        );
        handle
            .size
            .set(PxSize::square_dp(SliderDefaults::HANDLE_SIZE));
        widget.add_widget(&handle);

        let value_label = args.show_value_label.then(|| {
            let bubble = Widget::new(VALUE_LABEL);
            Surface::attach(
                &bubble,
                ctx,
                SurfaceArgs::new(Role::Primary).shape(Shape::CAPSULE),
            );
            let text = Label::new(
                ctx,
                LabelArgs::new(format_value(state.value.get(), args.step))
                    .font_style("Label")
                    .role(FontRole::Medium)
                    .text_color(Role::OnPrimary),
            );
            bubble.add_widget(&text);
            bubble.size.set(PxSize::from_dp(
                SliderDefaults::LABEL_WIDTH,
                SliderDefaults::LABEL_HEIGHT,
            ));
            bubble.opacity.set(0.0);
            widget.add_widget(&bubble);
            bubble
        });

        widget.size.set(PxSize::from_dp(
            SliderDefaults::WIDTH,
            SliderDefaults::HEIGHT,
        ));
        place_handle(&widget);
        on_geometry(&widget, place_handle);
        for property in [&state.value, &state.min, &state.max] {
            let target = widget.downgrade();
            property.bind(move |_| {
                if let Some(widget) = target.upgrade() {
                    place_handle(&widget);
                }
            });
        }
        let weak = Rc::downgrade(&state);
        for property in [&state.min, &state.max, &state.step] {
            let weak = weak.clone();
            property.bind(move |_| {
                if let Some(state) = weak.upgrade() {
                    state.set_value(state.value.get());
                }
            });
        }
        let target = widget.downgrade();
        state.active.bind(move |_| {
            if let Some(widget) = target.upgrade() {
                place_handle(&widget);
            }
        });
        propagate_disabled(&widget);
        widget.disabled.set(args.disabled);
        Self {
            widget,
            handle,
            value_label,
            state,
        }
    }

    /// Current value.
    pub fn value(&self) -> f32 {
        self.state.value.get()
    }

    /// Sets the value, clamped and snapped.
    pub fn set_value(&self, value: f32) {
        self.state.set_value(value);
    }

    /// Text currently shown by the value label.
    pub fn value_text(&self) -> Option<String> {
        let label = self.value_label.as_ref()?.children().into_iter().next()?;
        Label::from_widget(label).map(|l| l.text())
    }

    /// Fired with the value when the handle is released.
    pub fn on_release(&self) -> &Signal<f32> {
        &self.state.on_release
    }
}

fn place_handle(widget: &Widget) {
    let Some(state) = widget.feature::<SliderState>() else {
        return;
    };
    let center = state.handle_center(widget.rect());
    for child in widget.children() {
        let size = child.size.get();
        match child.kind() {
            HANDLE => {
                child.pos.set(PxPosition::new(
                    center.x - size.width / 2.0,
                    center.y - size.height / 2.0,
                ));
            }
            VALUE_LABEL => {
                let handle_top = center.y + SliderDefaults::HANDLE_SIZE.to_pixels_f32() / 2.0;
                child.pos.set(PxPosition::new(
                    center.x - size.width / 2.0,
                    handle_top + SliderDefaults::LABEL_OFFSET.to_pixels_f32(),
                ));
                let shown = state.active.get() && state.show_value_label.get();
                child.opacity.set(if shown { 1.0 } else { 0.0 });
                if let Some(text) = child
                    .children()
                    .into_iter()
                    .next()
                    .and_then(Label::from_widget)
                {
                    text.set_text(format_value(state.value.get(), state.step.get()));
                    let text_size = text.size.get();
                    let rect = child.rect();
                    text.pos.set(PxPosition::new(
                        rect.center().x - text_size.width / 2.0,
                        rect.center().y - text_size.height / 2.0,
                    ));
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use mdkit_ui::Window;

    use super::*;

    #[test]
    fn snaps_to_step_inside_range() {
        assert_eq!(snap(37.0, 0.0, 100.0, 10.0), 40.0);
        assert_eq!(snap(-5.0, 0.0, 100.0, 10.0), 0.0);
        assert_eq!(snap(99.0, 0.0, 95.0, 10.0), 90.0);
        assert_eq!(snap(0.33, 0.0, 1.0, 0.0), 0.33);
        assert_eq!(format_value(40.0, 10.0), "40");
        assert_eq!(format_value(0.5, 0.0), "0.50");
    }

    #[test]
    fn dragging_moves_value_and_label() {
        let ctx = BuildContext::new();
        let window = Window::new(PxSize::new(400.0, 200.0));
        let slider = Slider::new(&ctx, SliderArgs::default().step(10.0));
        window.add_widget(&slider);
        let released = Rc::new(Cell::new(-1.0));
        let r = released.clone();
        slider.on_release().connect(move |v| r.set(*v));

        // Track runs from x = 10 to x = 230.
        let down = TouchEvent::new(1, PxPosition::new(120.0, 24.0), TouchPhase::Down, 0.0);
        window.dispatch_touch(&down);
        assert_eq!(slider.value(), 50.0);
        assert!(slider.state.active.get());
        assert_eq!(slider.value_label.as_ref().map(|l| l.opacity.get()), Some(1.0));
        assert_eq!(slider.value_text().as_deref(), Some("50"));
        assert_eq!(slider.handle.center().x, 120.0);

        window.dispatch_touch(&down.with(TouchPhase::Move, PxPosition::new(300.0, 24.0), 0.1));
        assert_eq!(slider.value(), 100.0);
        window.dispatch_touch(&down.with(TouchPhase::Up, PxPosition::new(54.0, 24.0), 0.2));
        assert_eq!(slider.value(), 20.0);
        assert_eq!(released.get(), 20.0);
        assert_eq!(slider.value_label.as_ref().map(|l| l.opacity.get()), Some(0.0));
    }

    #[test]
    fn disabled_slider_ignores_touch_and_dims() {
        let ctx = BuildContext::new();
        let window = Window::new(PxSize::new(400.0, 200.0));
        let slider = Slider::new(&ctx, SliderArgs::default().value(30.0).disabled(true));
        window.add_widget(&slider);
        let down = TouchEvent::new(1, PxPosition::new(200.0, 24.0), TouchPhase::Down, 0.0);
        window.dispatch_touch(&down);
        assert_eq!(slider.value(), 30.0);
        assert!(slider.handle.disabled.get());
        let enabled = ctx.theme.color(Role::Primary);
        assert_eq!(
            slider.state.track_active_color.get(),
            ctx.theme.disabled(enabled)
        );
    }
}
