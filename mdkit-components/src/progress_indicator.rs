//! Linear and circular progress indicators.
//!
//! ## Usage
//!
//! Show the completion of a task with a known extent (determinate) or keep
//! a perpetual sweep running while the extent is unknown (indeterminate).

use std::{cell::RefCell, f32::consts::TAU, ops::ControlFlow, rc::Rc};

use derive_setters::Setters;
use mdkit_ui::{
    Canvas, CanvasLayer, Clock, ClockEvent, Color, Dp, Instruction, Property, PxPosition, PxRect,
    PxSize, Widget, WidgetFeature,
};
use smallvec::SmallVec;
use tracing::debug;

use crate::{
    behaviors::themable::{ColorBinding, Themable, ThemedColor},
    context::BuildContext,
    role::Role,
};

/// Progress indicator tokens.
pub struct ProgressIndicatorDefaults;

impl ProgressIndicatorDefaults {
    /// Linear track thickness.
    pub const LINEAR_HEIGHT: Dp = Dp(4.0);
    /// Linear indicator default width.
    pub const LINEAR_WIDTH: Dp = Dp(240.0);
    /// Circular indicator diameter.
    pub const CIRCULAR_SIZE: Dp = Dp(48.0);
    /// Circular stroke width.
    pub const CIRCULAR_LINE_WIDTH: Dp = Dp(4.0);
    /// Seconds per indeterminate sweep.
    pub const SWEEP_PERIOD: f64 = 1.5;
    /// Length of the linear indeterminate segment, as a fraction of the
    /// track.
    pub const SEGMENT: f32 = 0.4;
    /// Shortest and longest circular indeterminate arc in degrees.
    pub const ARC_RANGE: (f32, f32) = (10.0, 270.0);
    /// Points per full circle when tessellating arcs.
    pub const ARC_SEGMENTS: usize = 48;
}

/// Geometry of the indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProgressShape {
    /// Horizontal bar.
    #[default]
    Linear,
    /// Ring.
    Circular,
}

/// Whether the extent of the work is known.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProgressType {
    /// Shows `value / max`.
    #[default]
    Determinate,
    /// Sweeps perpetually.
    Indeterminate,
}

/// Arguments for [`ProgressIndicator::new`].
#[derive(Debug, Clone, PartialEq, Setters)]
pub struct ProgressIndicatorArgs {
    /// Geometry.
    pub shape: ProgressShape,
    /// Determinate or indeterminate.
    pub kind: ProgressType,
    /// Initial value.
    pub value: f32,
    /// Value of a complete task.
    pub max: f32,
    /// Explicit indicator color.
    #[setters(strip_option)]
    pub color: Option<Color>,
    /// Explicit track color.
    #[setters(strip_option)]
    pub back_color: Option<Color>,
}

impl Default for ProgressIndicatorArgs {
    fn default() -> Self {
        Self {
            shape: ProgressShape::Linear,
            kind: ProgressType::Determinate,
            value: 0.0,
            max: 100.0,
            color: None,
            back_color: None,
        }
    }
}

/// Progress feature.
#[derive(Debug)]
pub struct ProgressState {
    /// Geometry.
    pub shape: ProgressShape,
    /// Determinate or indeterminate.
    pub kind: Property<ProgressType>,
    /// Current value, kept inside `[0, max]`.
    pub value: Property<f32>,
    /// Value of a complete task.
    pub max: Property<f32>,
    /// Position inside the indeterminate sweep, `[0, 1)`.
    pub phase: Property<f32>,
    /// Indicator color slot.
    pub indicator_color: Rc<ThemedColor>,
    /// Track color slot.
    pub track_color: Rc<ThemedColor>,
    clock: Clock,
    sweep: RefCell<Option<ClockEvent>>,
}

impl ProgressState {
    /// Completed share of the work, `[0, 1]`.
    pub fn fraction(&self) -> f32 {
        let max = self.max.get();
        if max <= 0.0 {
            return 0.0;
        }
        (self.value.get() / max).clamp(0.0, 1.0)
    }

    /// Start and end of the linear indicator as fractions of the track.
    pub fn span(&self) -> (f32, f32) {
        match self.kind.get() {
            ProgressType::Determinate => (0.0, self.fraction()),
            ProgressType::Indeterminate => {
                let segment = ProgressIndicatorDefaults::SEGMENT;
                let head = self.phase.get() * (1.0 + segment);
                ((head - segment).max(0.0), head.min(1.0))
            }
        }
    }

    /// Start and end angles of the circular arc in degrees, clockwise from
    /// twelve o'clock.
    pub fn arc(&self) -> (f32, f32) {
        match self.kind.get() {
            ProgressType::Determinate => (0.0, 360.0 * self.fraction()),
            ProgressType::Indeterminate => {
                let phase = self.phase.get();
                let (short, long) = ProgressIndicatorDefaults::ARC_RANGE;
                let length = short + (long - short) * (0.5 - 0.5 * (TAU * phase).cos());
                let start = 720.0 * phase;
                (start, start + length)
            }
        }
    }

    /// Whether the sweep is running.
    pub fn is_running(&self) -> bool {
        self.sweep.borrow().as_ref().is_some_and(ClockEvent::is_active)
    }

    fn start(&self) {
        if self.is_running() {
            return;
        }
        let phase = self.phase.clone();
        let event = self.clock.schedule_interval(0.0, move |dt| {
            let step = (dt / ProgressIndicatorDefaults::SWEEP_PERIOD) as f32;
            phase.update(|p| *p = (*p + step).fract());
            ControlFlow::Continue(())
        });
        *self.sweep.borrow_mut() = Some(event);
        debug!("progress sweep started");
    }

    fn stop(&self) {
        if let Some(sweep) = self.sweep.borrow_mut().take() {
            sweep.cancel();
            debug!("progress sweep stopped");
        }
    }

    fn draw_linear(&self, rect: PxRect, canvas: &mut Canvas) {
        canvas.push(CanvasLayer::Main, Instruction::Color(self.track_color.get()));
        canvas.push(CanvasLayer::Main, Instruction::Rectangle(rect));
        let (start, end) = self.span();
        if end <= start {
            return;
        }
        canvas.push(CanvasLayer::Main, Instruction::Color(self.indicator_color.get()));
        canvas.push(
            CanvasLayer::Main,
            Instruction::Rectangle(PxRect::new(
                rect.x + rect.width * start,
                rect.y,
                rect.width * (end - start),
                rect.height,
            )),
        );
    }

    fn draw_circular(&self, rect: PxRect, canvas: &mut Canvas) {
        let width = ProgressIndicatorDefaults::CIRCULAR_LINE_WIDTH.to_pixels_f32();
        canvas.push(CanvasLayer::Main, Instruction::Color(self.track_color.get()));
        canvas.push(
            CanvasLayer::Main,
            Instruction::Line {
                points: arc_points(rect, 0.0, 360.0),
                width,
                close: true,
            },
        );
        let (start, end) = self.arc();
        if end <= start {
            return;
        }
        canvas.push(CanvasLayer::Main, Instruction::Color(self.indicator_color.get()));
        canvas.push(
            CanvasLayer::Main,
            Instruction::Line {
                points: arc_points(rect, start, end),
                width,
                close: false,
            },
        );
    }
}

/// Points along the circle inscribed in `rect` from `start` to `end`
/// degrees, clockwise from twelve o'clock, inset by half the stroke.
pub fn arc_points(rect: PxRect, start: f32, end: f32) -> SmallVec<[PxPosition; 4]> {
    let center = rect.center();
    let radius = (rect.width.min(rect.height)
        - ProgressIndicatorDefaults::CIRCULAR_LINE_WIDTH.to_pixels_f32())
        / 2.0;
    let sweep = (end - start).clamp(0.0, 360.0);
    let steps = ((ProgressIndicatorDefaults::ARC_SEGMENTS as f32 * sweep / 360.0).ceil() as usize)
        .max(1);
    (0..=steps)
        .map(|i| {
            let degrees = start + sweep * i as f32 / steps as f32;
            let radians = degrees.to_radians();
            PxPosition::new(
                center.x + radius * radians.sin(),
                center.y + radius * radians.cos(),
            )
        })
        .collect()
}

impl WidgetFeature for ProgressState {
    fn name(&self) -> &'static str {
        "progress"
    }

    fn draw(&self, widget: &Widget, canvas: &mut Canvas) {
        match self.shape {
            ProgressShape::Linear => self.draw_linear(widget.rect(), canvas),
            ProgressShape::Circular => self.draw_circular(widget.rect(), canvas),
        }
    }

    fn on_destroy(&self, _widget: &Widget) {
        self.stop();
    }
}

/// A linear or circular progress indicator.
#[derive(Clone)]
pub struct ProgressIndicator {
    widget: Widget,
    /// Value and sweep state.
    pub state: Rc<ProgressState>,
}

widget_wrapper!(ProgressIndicator);

impl ProgressIndicator {
    /// Creates an indicator. Indeterminate indicators start sweeping right
    /// away.
    pub fn new(ctx: &BuildContext, args: ProgressIndicatorArgs) -> Self {
        let widget = Widget::new("ProgressIndicator");
        let themable = Themable::of(&widget, &ctx.theme);
        let binding = |custom: Option<Color>, role| match custom {
            Some(_) => ColorBinding::Custom,
            None => ColorBinding::Role(role),
        };
        let max = args.max.max(0.0);
        let state = Rc::new(ProgressState {
            shape: args.shape,
            kind: Property::new("type", args.kind),
            value: Property::new("value", args.value.clamp(0.0, max)),
            max: Property::new("max", max),
            phase: Property::new("phase", 0.0),
            indicator_color: themable.color_slot(
                "color",
                binding(args.color, Role::Primary),
                args.color,
            ),
            track_color: themable.color_slot(
                "back_color",
                binding(args.back_color, Role::SurfaceContainerHighest),
                args.back_color,
            ),
            clock: ctx.clock.clone(),
            sweep: RefCell::new(None),
        });
        widget.attach_feature(state.clone());
        widget.size.set(match args.shape {
            ProgressShape::Linear => PxSize::from_dp(
                ProgressIndicatorDefaults::LINEAR_WIDTH,
                ProgressIndicatorDefaults::LINEAR_HEIGHT,
            ),
            ProgressShape::Circular => PxSize::square_dp(ProgressIndicatorDefaults::CIRCULAR_SIZE),
        });

        let weak = Rc::downgrade(&state);
        state.max.bind(move |max| {
            if let Some(state) = weak.upgrade() {
                let max = max.max(0.0);
                state.value.update(|v| *v = v.clamp(0.0, max));
            }
        });
        let weak = Rc::downgrade(&state);
        state.kind.bind(move |kind| {
            if let Some(state) = weak.upgrade() {
                match kind {
                    ProgressType::Indeterminate => state.start(),
                    ProgressType::Determinate => {
                        state.stop();
                        state.phase.set(0.0);
                    }
                }
            }
        });
        if args.kind == ProgressType::Indeterminate {
            state.start();
        }
        Self { widget, state }
    }

    /// Sets the value, clamped to `[0, max]`.
    pub fn set_value(&self, value: f32) {
        let max = self.state.max.get().max(0.0);
        self.state.value.set(value.clamp(0.0, max));
    }

    /// Current value.
    pub fn value(&self) -> f32 {
        self.state.value.get()
    }

    /// Resumes the indeterminate sweep.
    pub fn start(&self) {
        if self.state.kind.get() == ProgressType::Indeterminate {
            self.state.start();
        }
    }

    /// Freezes the indeterminate sweep.
    pub fn stop(&self) {
        self.state.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_stays_inside_the_range() {
        let ctx = BuildContext::new();
        let bar = ProgressIndicator::new(&ctx, ProgressIndicatorArgs::default().value(150.0));
        assert_eq!(bar.value(), 100.0);
        bar.set_value(-3.0);
        assert_eq!(bar.value(), 0.0);
        bar.set_value(40.0);
        assert_eq!(bar.state.span(), (0.0, 0.4));
        bar.state.max.set(20.0);
        assert_eq!(bar.value(), 20.0);
        assert_eq!(bar.state.fraction(), 1.0);
    }

    #[test]
    fn indeterminate_sweeps_until_stopped() {
        let ctx = BuildContext::new();
        let bar = ProgressIndicator::new(
            &ctx,
            ProgressIndicatorArgs::default().kind(ProgressType::Indeterminate),
        );
        assert!(bar.state.is_running());
        ctx.clock.advance(0.75, 0.05);
        let phase = bar.state.phase.get();
        assert!((phase - 0.5).abs() < 0.05, "{phase}");
        let (start, end) = bar.state.span();
        assert!(start > 0.0 && end > start && end <= 1.0);

        bar.stop();
        ctx.clock.advance(0.5, 0.05);
        assert_eq!(bar.state.phase.get(), phase);

        bar.state.kind.set(ProgressType::Determinate);
        assert_eq!(bar.state.phase.get(), 0.0);
        assert!(!bar.state.is_running());
    }

    #[test]
    fn circular_arc_follows_the_value() {
        let ctx = BuildContext::new();
        let ring = ProgressIndicator::new(
            &ctx,
            ProgressIndicatorArgs::default()
                .shape(ProgressShape::Circular)
                .value(25.0),
        );
        assert_eq!(ring.size.get(), PxSize::new(48.0, 48.0));
        assert_eq!(ring.state.arc(), (0.0, 90.0));
        let points = arc_points(ring.rect(), 0.0, 90.0);
        let first = points[0];
        let last = points[points.len() - 1];
        assert!((first.x - 24.0).abs() < 1e-3 && (first.y - 46.0).abs() < 1e-3);
        assert!((last.x - 46.0).abs() < 1e-3 && (last.y - 24.0).abs() < 1e-3);
    }

    #[test]
    fn destroy_stops_the_sweep() {
        let ctx = BuildContext::new();
        let bar = ProgressIndicator::new(
            &ctx,
            ProgressIndicatorArgs::default().kind(ProgressType::Indeterminate),
        );
        bar.destroy();
        assert_eq!(ctx.clock.pending(), 0);
    }
}
