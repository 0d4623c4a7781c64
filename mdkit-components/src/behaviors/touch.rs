//! Tap, long-press, double-tap and drag gestures synthesized from raw
//! down/move/up events.

use std::{
    cell::{Cell, RefCell},
    fmt,
    rc::{Rc, Weak},
};

use derive_setters::Setters;
use mdkit_ui::{
    Clock, ClockEvent, Dp, PxPosition, Signal, TouchEvent, TouchPhase, TouchResponse, Widget,
    WidgetFeature,
};

/// Gesture thresholds.
pub struct TouchDefaults;

impl TouchDefaults {
    /// Hold time before a long press fires, in seconds.
    pub const LONG_PRESS_TIME: f64 = 0.4;
    /// Maximum gap between two taps of a double tap, in seconds.
    pub const DOUBLE_TAP_TIME: f64 = 0.25;
    /// Travel that turns a press into a drag.
    pub const DRAG_DISTANCE: Dp = Dp(20.0);
}

/// Gesture configuration.
#[derive(Debug, Clone, Copy, PartialEq, Setters)]
pub struct TouchArgs {
    /// Hold time before a long press fires.
    pub long_press_time: f64,
    /// Maximum gap between two taps of a double tap.
    pub double_tap_time: f64,
    /// Travel that turns a press into a drag; also the tap slop.
    pub drag_distance: Dp,
}

impl Default for TouchArgs {
    fn default() -> Self {
        Self {
            long_press_time: TouchDefaults::LONG_PRESS_TIME,
            double_tap_time: TouchDefaults::DOUBLE_TAP_TIME,
            drag_distance: TouchDefaults::DRAG_DISTANCE,
        }
    }
}

/// Payload of drag signals.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragEvent {
    /// Where the press started.
    pub origin: PxPosition,
    /// Current pointer position.
    pub pos: PxPosition,
    /// Motion since the previous drag event.
    pub delta: PxPosition,
}

#[derive(Debug, Clone, Copy)]
struct Press {
    id: u64,
    origin: PxPosition,
    last: PxPosition,
    dragging: bool,
    long_pressed: bool,
}

/// Gesture feature.
pub struct TouchBehavior {
    /// Short press released in place.
    pub on_tap: Signal<PxPosition>,
    /// Press held in place past the threshold.
    pub on_long_press: Signal<PxPosition>,
    /// Second tap close to the first.
    pub on_double_tap: Signal<PxPosition>,
    /// Press moved past the drag distance.
    pub on_drag_start: Signal<DragEvent>,
    /// Further motion of a drag.
    pub on_drag_move: Signal<DragEvent>,
    /// Release of a drag.
    pub on_drag_end: Signal<DragEvent>,
    args: TouchArgs,
    clock: Clock,
    press: Cell<Option<Press>>,
    last_tap: Cell<Option<(f64, PxPosition)>>,
    long_press: RefCell<Option<ClockEvent>>,
    this: Weak<TouchBehavior>,
}

impl fmt::Debug for TouchBehavior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TouchBehavior")
            .field("args", &self.args)
            .field("pressed", &self.press.get().is_some())
            .finish()
    }
}

impl TouchBehavior {
    /// Attaches gesture recognition to `widget`.
    pub fn attach(widget: &Widget, clock: &Clock, args: TouchArgs) -> Rc<Self> {
        let touch = Rc::new_cyclic(|this| Self {
            on_tap: Signal::new(),
            on_long_press: Signal::new(),
            on_double_tap: Signal::new(),
            on_drag_start: Signal::new(),
            on_drag_move: Signal::new(),
            on_drag_end: Signal::new(),
            args,
            clock: clock.clone(),
            press: Cell::new(None),
            last_tap: Cell::new(None),
            long_press: RefCell::new(None),
            this: this.clone(),
        });
        widget.attach_feature(touch.clone());
        touch
    }

    /// Whether a press is in progress.
    pub fn is_pressed(&self) -> bool {
        self.press.get().is_some()
    }

    /// Whether the current press became a drag.
    pub fn is_dragging(&self) -> bool {
        self.press.get().is_some_and(|p| p.dragging)
    }

    fn cancel_long_press(&self) {
        if let Some(event) = self.long_press.borrow_mut().take() {
            event.cancel();
        }
    }

    fn begin(&self, touch: &TouchEvent) {
        self.cancel_long_press();
        self.press.set(Some(Press {
            id: touch.id,
            origin: touch.pos,
            last: touch.pos,
            dragging: false,
            long_pressed: false,
        }));
        let weak = self.this.clone();
        let id = touch.id;
        let event = self.clock.schedule_once(self.args.long_press_time, move |_| {
            let Some(touch) = weak.upgrade() else {
                return;
            };
            let Some(mut press) = touch.press.get() else {
                return;
            };
            if press.id != id || press.dragging {
                return;
            }
            press.long_pressed = true;
            touch.press.set(Some(press));
            touch.long_press.borrow_mut().take();
            touch.on_long_press.emit(&press.origin);
        });
        *self.long_press.borrow_mut() = Some(event);
    }

    fn motion(&self, touch: &TouchEvent) {
        let Some(mut press) = self.press.get() else {
            return;
        };
        if press.id != touch.id {
            return;
        }
        let drag = DragEvent {
            origin: press.origin,
            pos: touch.pos,
            delta: PxPosition::new(touch.pos.x - press.last.x, touch.pos.y - press.last.y),
        };
        press.last = touch.pos;
        let started = !press.dragging
            && !press.long_pressed
            && press.origin.distance_to(touch.pos) > self.args.drag_distance.to_pixels_f32();
        if started {
            press.dragging = true;
        }
        self.press.set(Some(press));
        if started {
            self.cancel_long_press();
            self.on_drag_start.emit(&drag);
        } else if press.dragging {
            self.on_drag_move.emit(&drag);
        }
    }

    fn release(&self, touch: &TouchEvent) {
        let Some(press) = self.press.get().filter(|p| p.id == touch.id) else {
            return;
        };
        self.press.set(None);
        self.cancel_long_press();
        if press.dragging {
            self.on_drag_end.emit(&DragEvent {
                origin: press.origin,
                pos: touch.pos,
                delta: PxPosition::new(touch.pos.x - press.last.x, touch.pos.y - press.last.y),
            });
            return;
        }
        if press.long_pressed {
            return;
        }
        let slop = self.args.drag_distance.to_pixels_f32();
        let double = self.last_tap.take().is_some_and(|(time, pos)| {
            touch.time - time <= self.args.double_tap_time && pos.distance_to(touch.pos) <= slop
        });
        self.on_tap.emit(&touch.pos);
        if double {
            self.on_double_tap.emit(&touch.pos);
        } else {
            self.last_tap.set(Some((touch.time, touch.pos)));
        }
    }

    /// Drops every in-progress gesture without firing.
    pub fn cancel(&self) {
        self.cancel_long_press();
        self.press.set(None);
        self.last_tap.set(None);
    }
}

impl WidgetFeature for TouchBehavior {
    fn name(&self) -> &'static str {
        "touch"
    }

    fn on_touch(&self, widget: &Widget, touch: &TouchEvent) -> TouchResponse {
        match touch.phase {
            TouchPhase::Down => {
                if widget.is_effectively_disabled() {
                    return TouchResponse::Ignored;
                }
                self.begin(touch);
                TouchResponse::Grab
            }
            TouchPhase::Move => {
                self.motion(touch);
                TouchResponse::Consumed
            }
            TouchPhase::Up => {
                self.release(touch);
                TouchResponse::Consumed
            }
            TouchPhase::Cancel => {
                self.cancel();
                TouchResponse::Consumed
            }
        }
    }

    fn cancel_transient(&self, _widget: &Widget) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use mdkit_ui::{PxSize, Window};

    use super::*;

    fn setup() -> (Clock, Window, Widget, Rc<TouchBehavior>) {
        let clock = Clock::new();
        let window = Window::new(PxSize::new(400.0, 400.0));
        let widget = Widget::new("Box");
        window.add_widget(&widget);
        let touch = TouchBehavior::attach(&widget, &clock, TouchArgs::default());
        (clock, window, widget, touch)
    }

    fn counter<A: 'static>(signal: &Signal<A>) -> Rc<Cell<u32>> {
        let count = Rc::new(Cell::new(0));
        let c = count.clone();
        signal.connect(move |_| c.set(c.get() + 1));
        count
    }

    fn tap(window: &Window, id: u64, time: f64) {
        let pos = PxPosition::new(50.0, 50.0);
        window.dispatch_touch(&TouchEvent::new(id, pos, TouchPhase::Down, time));
        window.dispatch_touch(&TouchEvent::new(id, pos, TouchPhase::Up, time + 0.05));
    }

    #[test]
    fn two_quick_taps_make_a_double_tap() {
        let (_clock, window, _widget, touch) = setup();
        let taps = counter(&touch.on_tap);
        let doubles = counter(&touch.on_double_tap);
        tap(&window, 1, 0.0);
        tap(&window, 2, 0.15);
        assert_eq!(taps.get(), 2);
        assert_eq!(doubles.get(), 1);
        tap(&window, 3, 1.0);
        assert_eq!(doubles.get(), 1);
    }

    #[test]
    fn holding_fires_long_press_and_no_tap() {
        let (clock, window, _widget, touch) = setup();
        let taps = counter(&touch.on_tap);
        let long = counter(&touch.on_long_press);
        let pos = PxPosition::new(50.0, 50.0);
        window.dispatch_touch(&TouchEvent::new(1, pos, TouchPhase::Down, 0.0));
        clock.advance(0.5, 0.05);
        window.dispatch_touch(&TouchEvent::new(1, pos, TouchPhase::Up, 0.5));
        assert_eq!(long.get(), 1);
        assert_eq!(taps.get(), 0);
    }

    #[test]
    fn travel_turns_press_into_drag() {
        let (clock, window, _widget, touch) = setup();
        let starts = counter(&touch.on_drag_start);
        let moves = counter(&touch.on_drag_move);
        let ends = counter(&touch.on_drag_end);
        let long = counter(&touch.on_long_press);
        let down = TouchEvent::new(1, PxPosition::new(10.0, 10.0), TouchPhase::Down, 0.0);
        window.dispatch_touch(&down);
        window.dispatch_touch(&down.with(TouchPhase::Move, PxPosition::new(15.0, 10.0), 0.02));
        assert_eq!(starts.get(), 0);
        window.dispatch_touch(&down.with(TouchPhase::Move, PxPosition::new(40.0, 10.0), 0.04));
        window.dispatch_touch(&down.with(TouchPhase::Move, PxPosition::new(60.0, 10.0), 0.06));
        clock.advance(0.5, 0.05);
        window.dispatch_touch(&down.with(TouchPhase::Up, PxPosition::new(60.0, 10.0), 0.6));
        assert_eq!((starts.get(), moves.get(), ends.get()), (1, 1, 1));
        assert_eq!(long.get(), 0);
    }

    #[test]
    fn disabling_cancels_pending_long_press() {
        let (clock, window, widget, touch) = setup();
        let long = counter(&touch.on_long_press);
        window.dispatch_touch(&TouchEvent::new(
            1,
            PxPosition::new(50.0, 50.0),
            TouchPhase::Down,
            0.0,
        ));
        widget.disabled.set(true);
        clock.advance(0.5, 0.05);
        assert_eq!(long.get(), 0);
        assert!(!touch.is_pressed());
    }
}
