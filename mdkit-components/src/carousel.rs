//! A swipeable pager showing one slide at a time.
//!
//! Slides sit side by side along the carousel axis. Dragging shifts them with
//! the finger; releasing past `min_move` of a page, or calling
//! [`Carousel::load_next`] / [`Carousel::load_previous`], animates to the
//! neighbour and fires `on_slide_complete`.

use std::{
    cell::{Cell, RefCell},
    rc::{Rc, Weak},
};

use derive_setters::Setters;
use mdkit_ui::{
    Animation, AnimationHandle, Easing, Property, PxPosition, Signal, TouchEvent, TouchPhase,
    TouchResponse, Widget, WidgetFeature,
};
use tracing::debug;

use crate::{
    behaviors::declarative::ChildPolicy, context::BuildContext, error::CompositionError,
    surface::on_geometry,
};

/// Carousel tokens.
pub struct CarouselDefaults;

impl CarouselDefaults {
    /// Page animation in seconds.
    pub const ANIM_MOVE_DURATION: f64 = 0.5;
    /// Share of a page a drag must cover to change slides.
    pub const MIN_MOVE: f32 = 0.2;
}

/// Slides accepted by a carousel.
pub const CAROUSEL_CHILDREN: ChildPolicy = ChildPolicy::any("Carousel");

/// Axis the slides are laid out along.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CarouselDirection {
    /// Next slide on the right.
    #[default]
    Horizontal,
    /// Next slide below.
    Vertical,
}

/// Arguments for [`Carousel::compose`].
#[derive(Debug, Clone, Copy, PartialEq, Setters)]
pub struct CarouselArgs {
    /// Layout axis.
    pub direction: CarouselDirection,
    /// Wrap from the last slide to the first and back.
    pub wrap: bool,
    /// Page animation in seconds.
    pub anim_move_duration: f64,
    /// Share of a page a drag must cover to change slides.
    pub min_move: f32,
    /// First slide shown.
    pub index: usize,
}

impl Default for CarouselArgs {
    fn default() -> Self {
        Self {
            direction: CarouselDirection::Horizontal,
            wrap: false,
            anim_move_duration: CarouselDefaults::ANIM_MOVE_DURATION,
            min_move: CarouselDefaults::MIN_MOVE,
            index: 0,
        }
    }
}

/// Paging state of a carousel.
pub struct CarouselState {
    /// Layout axis.
    pub direction: CarouselDirection,
    /// Wrap around at the ends.
    pub wrap: Property<bool>,
    /// Index of the shown slide.
    pub index: Property<usize>,
    /// Distance moved toward the next slide, in pixels.
    pub shift: Property<f32>,
    /// Fired with the new index after a page change settled.
    pub on_slide_complete: Signal<usize>,
    anim_move_duration: f64,
    min_move: f32,
    drag_start: Cell<Option<(PxPosition, f32)>>,
    settle: RefCell<Option<AnimationHandle>>,
    ctx: BuildContext,
    this: Weak<CarouselState>,
}

impl std::fmt::Debug for CarouselState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CarouselState")
            .field("direction", &self.direction)
            .field("index", &self.index.get())
            .field("shift", &self.shift.get())
            .finish_non_exhaustive()
    }
}

impl CarouselState {
    fn page(&self, widget: &Widget) -> f32 {
        let size = widget.size.get();
        match self.direction {
            CarouselDirection::Horizontal => size.width,
            CarouselDirection::Vertical => size.height,
        }
    }

    /// Index of the slide `step` pages from the current one.
    fn neighbour(&self, count: usize, step: isize) -> Option<usize> {
        if count == 0 {
            return None;
        }
        let target = self.index.get() as isize + step;
        if self.wrap.get() {
            Some(target.rem_euclid(count as isize) as usize)
        } else {
            (0..count as isize).contains(&target).then_some(target as usize)
        }
    }

    /// Offset of slide `i` from the current one in pages, wrapped to the
    /// nearest side when wrapping.
    fn relative(&self, i: usize, count: usize) -> f32 {
        let mut rel = i as isize - self.index.get() as isize;
        if self.wrap.get() && count > 2 {
            let n = count as isize;
            rel = rel.rem_euclid(n);
            if rel > n / 2 {
                rel -= n;
            }
        }
        rel as f32
    }

    /// Clamps a drag so it only reveals existing neighbours.
    fn clamp_shift(&self, count: usize, shift: f32) -> f32 {
        if shift > 0.0 && self.neighbour(count, 1).is_none() {
            0.0
        } else if shift < 0.0 && self.neighbour(count, -1).is_none() {
            0.0
        } else {
            shift
        }
    }

    fn settle(&self, widget: &Widget, step: isize) {
        if let Some(previous) = self.settle.borrow_mut().take() {
            previous.cancel();
        }
        let count = widget.child_count();
        let step = if step != 0 && self.neighbour(count, step).is_none() {
            0
        } else {
            step
        };
        let target = self.page(widget) * step as f32;
        let handle = Animation::new(self.anim_move_duration, Easing::OutQuad)
            .animate(&self.shift, target)
            .start(&self.ctx.clock);
        let weak = self.this.clone();
        handle.on_complete().connect(move |_| {
            let Some(state) = weak.upgrade() else {
                return;
            };
            if step == 0 {
                return;
            }
            let Some(index) = state.neighbour(count, step) else {
                return;
            };
            state.shift.set_silent(0.0);
            state.index.set(index);
            debug!(index, "carousel slide complete");
            state.on_slide_complete.emit(&index);
        });
        *self.settle.borrow_mut() = Some(handle);
    }
}

impl WidgetFeature for CarouselState {
    fn name(&self) -> &'static str {
        "carousel"
    }

    fn on_touch(&self, widget: &Widget, touch: &TouchEvent) -> TouchResponse {
        let along = |pos: PxPosition| match self.direction {
            CarouselDirection::Horizontal => -pos.x,
            CarouselDirection::Vertical => pos.y,
        };
        match touch.phase {
            TouchPhase::Down => {
                if let Some(settle) = self.settle.borrow_mut().take() {
                    settle.cancel();
                }
                self.drag_start.set(Some((touch.pos, self.shift.get())));
                TouchResponse::Grab
            }
            TouchPhase::Move => {
                if let Some((start, base)) = self.drag_start.get() {
                    let shift = base + along(touch.pos) - along(start);
                    self.shift
                        .set(self.clamp_shift(widget.child_count(), shift));
                }
                TouchResponse::Consumed
            }
            TouchPhase::Up | TouchPhase::Cancel => {
                self.drag_start.set(None);
                let threshold = self.page(widget) * self.min_move;
                let shift = self.shift.get();
                let step = match touch.phase {
                    TouchPhase::Up if shift >= threshold => 1,
                    TouchPhase::Up if shift <= -threshold => -1,
                    _ => 0,
                };
                self.settle(widget, step);
                TouchResponse::Consumed
            }
        }
    }

    fn cancel_transient(&self, _widget: &Widget) {
        if let Some(settle) = self.settle.borrow_mut().take() {
            settle.cancel();
        }
        self.drag_start.set(None);
    }
}

fn layout(widget: &Widget) {
    let Some(state) = widget.feature::<CarouselState>() else {
        return;
    };
    let rect = widget.rect();
    let slides = widget.children();
    let count = slides.len();
    let shift = state.shift.get();
    for (i, slide) in slides.iter().enumerate() {
        let offset = state.relative(i, count) * state.page(widget) - shift;
        slide.size.set(rect.size());
        slide.pos.set(match state.direction {
            CarouselDirection::Horizontal => PxPosition::new(rect.x + offset, rect.y),
            CarouselDirection::Vertical => PxPosition::new(rect.x, rect.y - offset),
        });
    }
}

/// A pager over its children.
#[derive(Clone)]
pub struct Carousel {
    widget: Widget,
    /// Paging state.
    pub state: Rc<CarouselState>,
}

widget_wrapper!(Carousel);

impl Carousel {
    /// Creates a carousel over `slides`.
    pub fn compose<I>(
        ctx: &BuildContext,
        args: CarouselArgs,
        slides: I,
    ) -> Result<Self, CompositionError>
    where
        I: IntoIterator,
        I::Item: Into<Widget>,
    {
        let widget = Widget::new("Carousel");
        let slides = CAROUSEL_CHILDREN.add_children(&widget, slides)?;
        let index = args.index.min(slides.len().saturating_sub(1));
        let state = Rc::new_cyclic(|this| CarouselState {
            direction: args.direction,
            wrap: Property::new("loop", args.wrap),
            index: Property::new("index", index),
            shift: Property::new("shift", 0.0),
            on_slide_complete: Signal::new(),
            anim_move_duration: args.anim_move_duration,
            min_move: args.min_move,
            drag_start: Cell::new(None),
            settle: RefCell::new(None),
            ctx: ctx.clone(),
            this: this.clone(),
        });
        widget.attach_feature(state.clone());
        on_geometry(&widget, layout);
        layout(&widget);
        let target = widget.downgrade();
        state.shift.bind(move |_| {
            if let Some(widget) = target.upgrade() {
                layout(&widget);
            }
        });
        let target = widget.downgrade();
        state.index.bind(move |_| {
            if let Some(widget) = target.upgrade() {
                layout(&widget);
            }
        });
        Ok(Self { widget, state })
    }

    /// Appends a slide.
    pub fn add_slide(&self, slide: impl Into<Widget>) {
        self.add_widget(&slide.into());
        layout(&self.widget);
    }

    /// Slides in order.
    pub fn slides(&self) -> Vec<Widget> {
        self.children()
    }

    /// Index of the shown slide.
    pub fn index(&self) -> usize {
        self.state.index.get()
    }

    /// The shown slide.
    pub fn current_slide(&self) -> Option<Widget> {
        self.children().get(self.index()).cloned()
    }

    /// The slide after the current one, honouring wrap.
    pub fn next_slide(&self) -> Option<Widget> {
        let index = self.state.neighbour(self.child_count(), 1)?;
        self.children().get(index).cloned()
    }

    /// The slide before the current one, honouring wrap.
    pub fn previous_slide(&self) -> Option<Widget> {
        let index = self.state.neighbour(self.child_count(), -1)?;
        self.children().get(index).cloned()
    }

    /// Animates to the next slide.
    pub fn load_next(&self) {
        self.state.settle(&self.widget, 1);
    }

    /// Animates to the previous slide.
    pub fn load_previous(&self) {
        self.state.settle(&self.widget, -1);
    }

    /// Jumps to slide `index` without animation.
    pub fn load_slide(&self, index: usize) {
        if index >= self.child_count() || index == self.index() {
            return;
        }
        if let Some(settle) = self.state.settle.borrow_mut().take() {
            settle.cancel();
        }
        self.state.shift.set_silent(0.0);
        self.state.index.set(index);
        self.state.on_slide_complete.emit(&index);
    }

    /// Fired with the new index after a page change settled.
    pub fn on_slide_complete(&self) -> &Signal<usize> {
        &self.state.on_slide_complete
    }
}

#[cfg(test)]
mod tests {
    use mdkit_ui::{PxSize, Window};

    use super::*;

    fn pager(ctx: &BuildContext, args: CarouselArgs) -> Carousel {
        let slides = (0..3).map(|i| Widget::new("Page").with_id(format!("page{i}")));
        let carousel = Carousel::compose(ctx, args, slides).expect("slides");
        carousel.size.set(PxSize::new(300.0, 200.0));
        carousel
    }

    fn drag(window: &Window, from: PxPosition, to: PxPosition) {
        let down = TouchEvent::new(4, from, TouchPhase::Down, 0.0);
        window.dispatch_touch(&down);
        window.dispatch_touch(&down.with(TouchPhase::Move, to, 0.05));
        window.dispatch_touch(&down.with(TouchPhase::Up, to, 0.1));
    }

    #[test]
    fn swipe_past_threshold_pages_and_short_swipe_snaps_back() {
        let window = Window::new(PxSize::new(300.0, 200.0));
        let ctx = BuildContext::new().with_window(window.clone());
        let carousel = pager(&ctx, CarouselArgs::default());
        window.add_widget(&carousel);
        assert_eq!(carousel.slides()[1].pos.get().x, 300.0);

        let done = Rc::new(Cell::new(None));
        let d = done.clone();
        carousel.on_slide_complete().connect(move |i| d.set(Some(*i)));

        drag(&window, PxPosition::new(200.0, 100.0), PxPosition::new(180.0, 100.0));
        ctx.clock.advance(0.6, 0.05);
        assert_eq!(carousel.index(), 0);
        assert_eq!(carousel.slides()[0].pos.get().x, 0.0);

        drag(&window, PxPosition::new(250.0, 100.0), PxPosition::new(100.0, 100.0));
        ctx.clock.advance(0.6, 0.05);
        assert_eq!(carousel.index(), 1);
        assert_eq!(done.get(), Some(1));
        assert_eq!(carousel.slides()[1].pos.get().x, 0.0);
        assert_eq!(carousel.slides()[0].pos.get().x, -300.0);
    }

    #[test]
    fn ends_stop_without_wrap_and_wrap_with_it() {
        let ctx = BuildContext::new();
        let carousel = pager(&ctx, CarouselArgs::default());
        assert!(carousel.previous_slide().is_none());
        carousel.load_previous();
        ctx.clock.advance(0.6, 0.05);
        assert_eq!(carousel.index(), 0);

        let looping = pager(&ctx, CarouselArgs::default().wrap(true));
        assert_eq!(
            looping.previous_slide().and_then(|s| s.id()).as_deref(),
            Some("page2")
        );
        assert_eq!(looping.slides()[2].pos.get().x, -300.0);
        looping.load_previous();
        ctx.clock.advance(0.6, 0.05);
        assert_eq!(looping.index(), 2);
        looping.load_slide(0);
        assert_eq!(looping.current_slide().and_then(|s| s.id()).as_deref(), Some("page0"));
    }

    #[test]
    fn vertical_carousel_stacks_downward() {
        let ctx = BuildContext::new();
        let carousel = pager(
            &ctx,
            CarouselArgs::default().direction(CarouselDirection::Vertical),
        );
        assert_eq!(carousel.slides()[1].pos.get().y, -200.0);
        carousel.load_next();
        ctx.clock.advance(0.6, 0.05);
        assert_eq!(carousel.slides()[1].pos.get().y, 0.0);
    }
}
