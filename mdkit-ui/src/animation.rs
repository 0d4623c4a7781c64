//! Property tweens driven by the [`Clock`].
//!
//! An [`Animation`] is a list of steps played back to back; each step moves a
//! set of properties from the values they hold when the step begins to the
//! step's targets, over the step's duration and easing.
//!
//! ```
//! use mdkit_ui::{Animation, Clock, Easing, Property};
//!
//! let clock = Clock::new();
//! let opacity = Property::new("opacity", 1.0_f32);
//! let handle = Animation::new(0.2, Easing::Linear)
//!     .animate(&opacity, 0.0)
//!     .start(&clock);
//! clock.advance(0.2, 0.05);
//! assert_eq!(opacity.get(), 0.0);
//! assert!(!handle.is_running());
//! ```

use std::{
    cell::{Cell, RefCell},
    f32::consts::PI,
    fmt,
    ops::ControlFlow,
    rc::Rc,
};

use crate::{
    Color, Property, PxPosition, PxRect, PxSize,
    clock::{Clock, ClockEvent},
    signal::Signal,
};

/// Easing curves, named after the classic Penner set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Easing {
    /// Constant velocity.
    #[default]
    Linear,
    /// Quadratic ease in.
    InQuad,
    /// Quadratic ease out.
    OutQuad,
    /// Quadratic ease in-out.
    InOutQuad,
    /// Cubic ease in.
    InCubic,
    /// Cubic ease out.
    OutCubic,
    /// Cubic ease in-out.
    InOutCubic,
    /// Sine ease in.
    InSine,
    /// Sine ease out.
    OutSine,
    /// Sine ease in-out.
    InOutSine,
    /// Overshooting ease in.
    InBack,
    /// Overshooting ease out.
    OutBack,
    /// Bouncing ease out.
    OutBounce,
    /// Elastic ease out.
    OutElastic,
}

impl Easing {
    /// Maps linear progress in `[0, 1]` onto the curve.
    pub fn apply(self, progress: f32) -> f32 {
        let t = progress.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::InQuad => t * t,
            Easing::OutQuad => -t * (t - 2.0),
            Easing::InOutQuad => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
                }
            }
            Easing::InCubic => t * t * t,
            Easing::OutCubic => 1.0 - (1.0 - t).powi(3),
            Easing::InOutCubic => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
                }
            }
            Easing::InSine => 1.0 - (t * PI / 2.0).cos(),
            Easing::OutSine => (t * PI / 2.0).sin(),
            Easing::InOutSine => -((PI * t).cos() - 1.0) / 2.0,
            Easing::InBack => {
                let s = 1.70158;
                t * t * ((s + 1.0) * t - s)
            }
            Easing::OutBack => {
                let s = 1.70158;
                let p = t - 1.0;
                p * p * ((s + 1.0) * p + s) + 1.0
            }
            Easing::OutBounce => out_bounce(t),
            Easing::OutElastic => {
                if t == 0.0 || t == 1.0 {
                    t
                } else {
                    let p = 0.3;
                    2f32.powf(-10.0 * t) * ((t - p / 4.0) * (2.0 * PI) / p).sin() + 1.0
                }
            }
        }
    }
}

fn out_bounce(t: f32) -> f32 {
    let n1 = 7.5625;
    let d1 = 2.75;
    if t < 1.0 / d1 {
        n1 * t * t
    } else if t < 2.0 / d1 {
        let t = t - 1.5 / d1;
        n1 * t * t + 0.75
    } else if t < 2.5 / d1 {
        let t = t - 2.25 / d1;
        n1 * t * t + 0.9375
    } else {
        let t = t - 2.625 / d1;
        n1 * t * t + 0.984375
    }
}

/// Values a tween can interpolate.
pub trait Animatable: Clone + PartialEq + 'static {
    /// Interpolates from `self` to `to` at `t` (unclamped, so overshooting
    /// easings overshoot).
    fn interpolate(&self, to: &Self, t: f32) -> Self;
}

impl Animatable for f32 {
    fn interpolate(&self, to: &Self, t: f32) -> Self {
        self + (to - self) * t
    }
}

impl Animatable for f64 {
    fn interpolate(&self, to: &Self, t: f32) -> Self {
        self + (to - self) * t as f64
    }
}

impl Animatable for Color {
    fn interpolate(&self, to: &Self, t: f32) -> Self {
        self.lerp(*to, t)
    }
}

impl Animatable for PxPosition {
    fn interpolate(&self, to: &Self, t: f32) -> Self {
        self.lerp(*to, t)
    }
}

impl Animatable for PxSize {
    fn interpolate(&self, to: &Self, t: f32) -> Self {
        self.lerp(*to, t)
    }
}

impl Animatable for PxRect {
    fn interpolate(&self, to: &Self, t: f32) -> Self {
        self.lerp(to, t)
    }
}

trait Track {
    fn capture(&mut self);
    fn apply(&self, t: f32);
}

struct PropertyTrack<T: Animatable> {
    property: Property<T>,
    from: Option<T>,
    to: T,
}

impl<T: Animatable> Track for PropertyTrack<T> {
    fn capture(&mut self) {
        self.from = Some(self.property.get());
    }

    fn apply(&self, t: f32) {
        let Some(from) = &self.from else {
            return;
        };
        let value = if t >= 1.0 {
            self.to.clone()
        } else {
            from.interpolate(&self.to, t)
        };
        self.property.set(value);
    }
}

struct Step {
    duration: f64,
    easing: Easing,
    tracks: Vec<Box<dyn Track>>,
}

impl Step {
    fn capture(&mut self) {
        for track in &mut self.tracks {
            track.capture();
        }
    }

    fn apply(&self, linear: f32) {
        let eased = if linear >= 1.0 {
            1.0
        } else {
            self.easing.apply(linear)
        };
        for track in &self.tracks {
            track.apply(eased);
        }
    }
}

/// A sequence of tween steps.
pub struct Animation {
    steps: Vec<Step>,
}

impl Animation {
    /// Starts a description with one step.
    pub fn new(duration: f64, easing: Easing) -> Self {
        Self {
            steps: vec![Step {
                duration: duration.max(0.0),
                easing,
                tracks: Vec::new(),
            }],
        }
    }

    /// Adds a target to the current (last) step.
    pub fn animate<T: Animatable>(mut self, property: &Property<T>, to: T) -> Self {
        if let Some(step) = self.steps.last_mut() {
            step.tracks.push(Box::new(PropertyTrack {
                property: property.clone(),
                from: None,
                to,
            }));
        }
        self
    }

    /// Appends a new step that begins when the previous one ends.
    pub fn then(mut self, duration: f64, easing: Easing) -> Self {
        self.steps.push(Step {
            duration: duration.max(0.0),
            easing,
            tracks: Vec::new(),
        });
        self
    }

    /// Appends an idle step.
    pub fn pause(self, duration: f64) -> Self {
        self.then(duration, Easing::Linear)
    }

    /// Sum of all step durations.
    pub fn duration(&self) -> f64 {
        self.steps.iter().map(|s| s.duration).sum()
    }

    /// Schedules playback on `clock`.
    pub fn start(mut self, clock: &Clock) -> AnimationHandle {
        if let Some(first) = self.steps.first_mut() {
            first.capture();
        }
        let state = Rc::new(Cell::new(PlayState::Running));
        let running = RefCell::new(Running {
            steps: self.steps,
            index: 0,
            elapsed: 0.0,
            state: state.clone(),
        });
        let on_complete: Signal<()> = Signal::new();

        let complete = on_complete.clone();
        let event = clock.schedule_interval(0.0, move |dt| {
            let outcome = running.borrow_mut().advance(dt);
            match outcome {
                PlayState::Running => ControlFlow::Continue(()),
                PlayState::Finished => {
                    complete.emit(&());
                    ControlFlow::Break(())
                }
                PlayState::Cancelled => ControlFlow::Break(()),
            }
        });

        AnimationHandle {
            state,
            event,
            on_complete,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PlayState {
    Running,
    Finished,
    Cancelled,
}

struct Running {
    steps: Vec<Step>,
    index: usize,
    elapsed: f64,
    state: Rc<Cell<PlayState>>,
}

impl Running {
    /// Plays `dt` seconds. Observers of the animated properties may cancel
    /// the handle while a step applies; playback stops right there.
    fn advance(&mut self, dt: f64) -> PlayState {
        if self.state.get() != PlayState::Running {
            return self.state.get();
        }
        self.elapsed += dt;
        while let Some(step) = self.steps.get(self.index) {
            if self.elapsed + 1e-9 < step.duration {
                step.apply((self.elapsed / step.duration) as f32);
                return self.state.get();
            }
            step.apply(1.0);
            if self.state.get() == PlayState::Cancelled {
                return PlayState::Cancelled;
            }
            self.elapsed -= step.duration;
            self.index += 1;
            if let Some(next) = self.steps.get_mut(self.index) {
                next.capture();
            }
        }
        self.state.set(PlayState::Finished);
        PlayState::Finished
    }
}

/// Controls a started [`Animation`].
pub struct AnimationHandle {
    state: Rc<Cell<PlayState>>,
    event: ClockEvent,
    on_complete: Signal<()>,
}

impl fmt::Debug for AnimationHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnimationHandle")
            .field("running", &self.is_running())
            .finish_non_exhaustive()
    }
}

impl AnimationHandle {
    /// Stops playback where it is. Properties keep their current values and
    /// `on_complete` does not fire. Cancelling twice is a no-op.
    pub fn cancel(&self) {
        self.event.cancel();
        if self.state.get() == PlayState::Running {
            self.state.set(PlayState::Cancelled);
        }
    }

    /// Whether the animation is still playing.
    pub fn is_running(&self) -> bool {
        self.state.get() == PlayState::Running
    }

    /// Whether the animation was cancelled before finishing.
    pub fn is_cancelled(&self) -> bool {
        self.state.get() == PlayState::Cancelled
    }

    /// Fired once after the last step completes.
    pub fn on_complete(&self) -> &Signal<()> {
        &self.on_complete
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn easing_endpoints_are_fixed() {
        for easing in [
            Easing::Linear,
            Easing::InQuad,
            Easing::OutQuad,
            Easing::InOutCubic,
            Easing::OutSine,
            Easing::OutBack,
            Easing::OutBounce,
            Easing::OutElastic,
        ] {
            assert!(easing.apply(0.0).abs() < 1e-5, "{easing:?}");
            assert!((easing.apply(1.0) - 1.0).abs() < 1e-5, "{easing:?}");
        }
    }

    #[test]
    fn steps_play_in_sequence() {
        let clock = Clock::new();
        let x = Property::new("x", 0.0_f32);
        let done = Rc::new(Cell::new(false));
        let handle = Animation::new(0.1, Easing::Linear)
            .animate(&x, 10.0)
            .then(0.1, Easing::Linear)
            .animate(&x, 0.0)
            .start(&clock);
        let d = done.clone();
        handle.on_complete().connect(move |_| d.set(true));

        clock.advance(0.05, 0.05);
        assert!((x.get() - 5.0).abs() < 1e-4);
        clock.advance(0.1, 0.05);
        assert!((x.get() - 5.0).abs() < 1e-4);
        clock.advance(0.05, 0.05);
        assert_eq!(x.get(), 0.0);
        assert!(done.get());
    }

    #[test]
    fn cancel_leaves_value_and_skips_complete() {
        let clock = Clock::new();
        let x = Property::new("x", 0.0_f32);
        let handle = Animation::new(1.0, Easing::Linear)
            .animate(&x, 1.0)
            .start(&clock);
        let fired = Rc::new(Cell::new(false));
        let f = fired.clone();
        handle.on_complete().connect(move |_| f.set(true));
        clock.advance(0.5, 0.1);
        handle.cancel();
        handle.cancel();
        let frozen = x.get();
        clock.advance(1.0, 0.1);
        assert_eq!(x.get(), frozen);
        assert!(!fired.get());
        assert!(handle.is_cancelled());
    }

    #[test]
    fn observer_may_cancel_its_own_animation() {
        let clock = Clock::new();
        let x = Property::new("x", 0.0_f32);
        let slot: Rc<RefCell<Option<Rc<AnimationHandle>>>> = Rc::new(RefCell::new(None));
        let s = slot.clone();
        x.bind(move |value| {
            if *value > 0.3
                && let Some(handle) = s.borrow().as_ref()
            {
                handle.cancel();
            }
        });
        let handle = Rc::new(
            Animation::new(1.0, Easing::Linear)
                .animate(&x, 1.0)
                .then(1.0, Easing::Linear)
                .animate(&x, 0.0)
                .start(&clock),
        );
        let fired = Rc::new(Cell::new(false));
        let f = fired.clone();
        handle.on_complete().connect(move |_| f.set(true));
        *slot.borrow_mut() = Some(handle.clone());

        clock.advance(3.0, 0.1);
        assert!(handle.is_cancelled());
        assert!(!fired.get());
        assert!(x.get() > 0.3 && x.get() < 0.5);
        assert_eq!(clock.pending(), 0);
    }
}
