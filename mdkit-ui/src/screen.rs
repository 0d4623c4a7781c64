//! Named screens and animated switching between them.
//!
//! A [`ScreenManager`] shows one [`Screen`] at a time. Switching sets
//! `current` immediately, attaches the incoming screen next to the outgoing
//! one and plays a transition by animating `transition_progress` from 0 to 1;
//! the outgoing screen is detached when the transition completes.

use std::{
    cell::RefCell,
    fmt,
    ops::Deref,
    rc::{Rc, Weak},
};

use thiserror::Error;
use tracing::debug;

use crate::{
    Animation, AnimationHandle, Clock, Easing, Property, PxPosition, Signal, Widget,
};

/// Errors raised by the screen manager.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScreenError {
    /// No screen with that name was added.
    #[error("unknown screen '{0}'")]
    UnknownScreen(String),
    /// A screen with that name already exists.
    #[error("duplicate screen '{0}'")]
    DuplicateScreen(String),
}

/// A named page.
#[derive(Clone)]
pub struct Screen {
    widget: Widget,
    name: Rc<str>,
    on_pre_enter: Signal<()>,
    on_enter: Signal<()>,
    on_pre_leave: Signal<()>,
    on_leave: Signal<()>,
}

impl Screen {
    /// Creates an empty screen.
    pub fn new(name: &str) -> Self {
        Self {
            widget: Widget::new("Screen").with_id(name),
            name: Rc::from(name),
            on_pre_enter: Signal::new(),
            on_enter: Signal::new(),
            on_pre_leave: Signal::new(),
            on_leave: Signal::new(),
        }
    }

    /// Screen name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The screen's widget.
    pub fn widget(&self) -> &Widget {
        &self.widget
    }

    /// Fired when the screen starts entering.
    pub fn on_pre_enter(&self) -> &Signal<()> {
        &self.on_pre_enter
    }

    /// Fired when the screen finished entering.
    pub fn on_enter(&self) -> &Signal<()> {
        &self.on_enter
    }

    /// Fired when the screen starts leaving.
    pub fn on_pre_leave(&self) -> &Signal<()> {
        &self.on_pre_leave
    }

    /// Fired when the screen finished leaving.
    pub fn on_leave(&self) -> &Signal<()> {
        &self.on_leave
    }
}

impl fmt::Debug for Screen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Screen").field("name", &self.name).finish()
    }
}

impl PartialEq for Screen {
    fn eq(&self, other: &Self) -> bool {
        self.widget == other.widget
    }
}

impl Deref for Screen {
    type Target = Widget;

    fn deref(&self) -> &Widget {
        &self.widget
    }
}

/// Direction of a slide transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SlideDirection {
    /// Incoming screen enters from the right.
    #[default]
    Left,
    /// Incoming screen enters from the left.
    Right,
    /// Incoming screen enters from the bottom.
    Up,
    /// Incoming screen enters from the top.
    Down,
}

/// Visual kind of a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TransitionKind {
    /// Switch on the spot.
    None,
    /// Both screens slide.
    #[default]
    Slide,
    /// Cross-fade.
    Fade,
    /// Screens stay in place; overlays such as heroes do the animating.
    Shared,
}

/// Transition parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Transition {
    /// Visual kind.
    pub kind: TransitionKind,
    /// Slide direction, ignored by other kinds.
    pub direction: SlideDirection,
    /// Duration in seconds.
    pub duration: f64,
    /// Progress curve.
    pub easing: Easing,
}

impl Default for Transition {
    fn default() -> Self {
        Self {
            kind: TransitionKind::Slide,
            direction: SlideDirection::Left,
            duration: 0.4,
            easing: Easing::OutQuad,
        }
    }
}

impl Transition {
    /// Transition that switches immediately.
    pub fn none() -> Self {
        Self {
            kind: TransitionKind::None,
            duration: 0.0,
            ..Self::default()
        }
    }

    /// Cross-fade of the given duration.
    pub fn fade(duration: f64) -> Self {
        Self {
            kind: TransitionKind::Fade,
            duration,
            ..Self::default()
        }
    }
}

/// Names of the screens involved in a running transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionInfo {
    /// Outgoing screen.
    pub from: String,
    /// Incoming screen.
    pub to: String,
}

struct Active {
    from: Screen,
    to: Screen,
    handle: Option<AnimationHandle>,
}

struct ManagerInner {
    widget: Widget,
    clock: Clock,
    screens: RefCell<Vec<Screen>>,
    current: Property<String>,
    transition: RefCell<Transition>,
    progress: Property<f32>,
    active: RefCell<Option<Active>>,
    on_transition_start: Signal<TransitionInfo>,
    on_transition_complete: Signal<TransitionInfo>,
}

/// Holds screens and switches between them.
#[derive(Clone)]
pub struct ScreenManager {
    inner: Rc<ManagerInner>,
}

impl ScreenManager {
    /// Creates an empty manager driven by `clock`.
    pub fn new(clock: &Clock) -> Self {
        let inner = Rc::new(ManagerInner {
            widget: Widget::new("ScreenManager"),
            clock: clock.clone(),
            screens: RefCell::new(Vec::new()),
            current: Property::new("current", String::new()),
            transition: RefCell::new(Transition::default()),
            progress: Property::new("transition_progress", 1.0),
            active: RefCell::new(None),
            on_transition_start: Signal::new(),
            on_transition_complete: Signal::new(),
        });
        let weak: Weak<ManagerInner> = Rc::downgrade(&inner);
        inner.progress.bind(move |progress| {
            if let Some(inner) = weak.upgrade() {
                ScreenManager { inner }.place_screens(*progress);
            }
        });
        ScreenManager { inner }
    }

    /// The manager's widget.
    pub fn widget(&self) -> &Widget {
        &self.inner.widget
    }

    /// Name of the shown (or incoming) screen; empty when no screen exists.
    pub fn current(&self) -> &Property<String> {
        &self.inner.current
    }

    /// Progress of the running transition, 1 when idle.
    pub fn transition_progress(&self) -> &Property<f32> {
        &self.inner.progress
    }

    /// Fired when a switch begins.
    pub fn on_transition_start(&self) -> &Signal<TransitionInfo> {
        &self.inner.on_transition_start
    }

    /// Fired after the outgoing screen was detached.
    pub fn on_transition_complete(&self) -> &Signal<TransitionInfo> {
        &self.inner.on_transition_complete
    }

    /// Transition used by the next switch.
    pub fn set_transition(&self, transition: Transition) {
        *self.inner.transition.borrow_mut() = transition;
    }

    /// Current transition settings.
    pub fn transition(&self) -> Transition {
        *self.inner.transition.borrow()
    }

    /// Whether a transition is playing.
    pub fn is_transitioning(&self) -> bool {
        self.inner.active.borrow().is_some()
    }

    /// Adds a screen. The first screen added becomes current.
    pub fn add_screen(&self, screen: Screen) -> Result<(), ScreenError> {
        if self.get_screen(screen.name()).is_some() {
            return Err(ScreenError::DuplicateScreen(screen.name().to_owned()));
        }
        let first = self.inner.screens.borrow().is_empty();
        self.inner.screens.borrow_mut().push(screen.clone());
        if first {
            self.fit(&screen);
            self.inner.widget.add_widget(&screen);
            self.inner.current.set(screen.name().to_owned());
            screen.on_enter.emit(&());
        }
        Ok(())
    }

    /// Screen by name.
    pub fn get_screen(&self, name: &str) -> Option<Screen> {
        self.inner
            .screens
            .borrow()
            .iter()
            .find(|s| s.name() == name)
            .cloned()
    }

    /// Names of all screens in insertion order.
    pub fn screen_names(&self) -> Vec<String> {
        self.inner
            .screens
            .borrow()
            .iter()
            .map(|s| s.name().to_owned())
            .collect()
    }

    /// The shown (or incoming) screen.
    pub fn current_screen(&self) -> Option<Screen> {
        self.get_screen(&self.inner.current.get())
    }

    fn fit(&self, screen: &Screen) {
        screen.pos.set(self.inner.widget.pos.get());
        screen.size.set(self.inner.widget.size.get());
        screen.opacity.set(1.0);
    }

    /// Switches to `name` with the configured transition. A running
    /// transition is completed first. Switching to the current screen is a
    /// no-op.
    pub fn switch_to(&self, name: &str) -> Result<(), ScreenError> {
        let to = self
            .get_screen(name)
            .ok_or_else(|| ScreenError::UnknownScreen(name.to_owned()))?;
        self.finish_transition();
        let Some(from) = self.current_screen() else {
            self.fit(&to);
            self.inner.widget.add_widget(&to);
            self.inner.current.set(to.name().to_owned());
            return Ok(());
        };
        if from == to {
            return Ok(());
        }

        let transition = self.transition();
        let info = TransitionInfo {
            from: from.name().to_owned(),
            to: to.name().to_owned(),
        };
        debug!(from = %info.from, to = %info.to, "screen switch");

        from.on_pre_leave.emit(&());
        to.on_pre_enter.emit(&());
        self.fit(&to);
        self.inner.widget.add_widget(&to);
        *self.inner.active.borrow_mut() = Some(Active {
            from,
            to,
            handle: None,
        });
        self.inner.progress.set(0.0);
        self.inner.current.set(info.to.clone());
        self.inner.on_transition_start.emit(&info);

        if transition.kind == TransitionKind::None || transition.duration <= 0.0 {
            self.finish_transition();
            return Ok(());
        }

        let handle = Animation::new(transition.duration, transition.easing)
            .animate(&self.inner.progress, 1.0)
            .start(&self.inner.clock);
        let weak = Rc::downgrade(&self.inner);
        handle.on_complete().connect(move |_| {
            if let Some(inner) = weak.upgrade() {
                ScreenManager { inner }.finish_transition();
            }
        });
        if let Some(active) = self.inner.active.borrow_mut().as_mut() {
            active.handle = Some(handle);
        }
        Ok(())
    }

    /// Jumps a running transition to its end.
    pub fn finish_transition(&self) {
        let Some(active) = self.inner.active.borrow_mut().take() else {
            return;
        };
        if let Some(handle) = &active.handle {
            handle.cancel();
        }
        self.inner.progress.set_silent(1.0);
        self.inner.widget.remove_widget(&active.from);
        self.fit(&active.from);
        self.fit(&active.to);
        active.from.on_leave.emit(&());
        active.to.on_enter.emit(&());
        let info = TransitionInfo {
            from: active.from.name().to_owned(),
            to: active.to.name().to_owned(),
        };
        self.inner.on_transition_complete.emit(&info);
    }

    fn place_screens(&self, progress: f32) {
        let (from, to) = match self.inner.active.borrow().as_ref() {
            Some(active) => (active.from.clone(), active.to.clone()),
            None => return,
        };
        let transition = self.transition();
        let origin = self.inner.widget.pos.get();
        let size = self.inner.widget.size.get();
        match transition.kind {
            TransitionKind::Slide => {
                let (dx, dy) = match transition.direction {
                    SlideDirection::Left => (-size.width, 0.0),
                    SlideDirection::Right => (size.width, 0.0),
                    SlideDirection::Up => (0.0, size.height),
                    SlideDirection::Down => (0.0, -size.height),
                };
                from.pos
                    .set(PxPosition::new(origin.x + dx * progress, origin.y + dy * progress));
                to.pos.set(PxPosition::new(
                    origin.x - dx * (1.0 - progress),
                    origin.y - dy * (1.0 - progress),
                ));
            }
            TransitionKind::Fade => {
                from.opacity.set(1.0 - progress);
                to.opacity.set(progress);
            }
            TransitionKind::None | TransitionKind::Shared => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PxSize;

    fn manager() -> (Clock, ScreenManager) {
        let clock = Clock::new();
        let manager = ScreenManager::new(&clock);
        manager.widget().size.set(PxSize::new(400.0, 800.0));
        manager.add_screen(Screen::new("a")).unwrap();
        manager.add_screen(Screen::new("b")).unwrap();
        (clock, manager)
    }

    #[test]
    fn slide_moves_both_screens_then_detaches_old() {
        let (clock, manager) = manager();
        manager.set_transition(Transition {
            easing: Easing::Linear,
            ..Transition::default()
        });
        manager.switch_to("b").unwrap();
        assert_eq!(manager.current().get(), "b");
        assert_eq!(manager.widget().child_count(), 2);

        clock.advance(0.2, 0.05);
        let a = manager.get_screen("a").unwrap();
        let b = manager.get_screen("b").unwrap();
        assert!((a.pos.get().x + 200.0).abs() < 1e-3);
        assert!((b.pos.get().x - 200.0).abs() < 1e-3);

        clock.advance(0.25, 0.05);
        assert!(!manager.is_transitioning());
        assert_eq!(manager.widget().children(), vec![b.widget().clone()]);
        assert_eq!(b.pos.get(), PxPosition::ZERO);
    }

    #[test]
    fn unknown_screen_is_an_error() {
        let (_clock, manager) = manager();
        assert_eq!(
            manager.switch_to("missing"),
            Err(ScreenError::UnknownScreen("missing".into()))
        );
    }

    #[test]
    fn none_transition_switches_immediately() {
        let (_clock, manager) = manager();
        manager.set_transition(Transition::none());
        manager.switch_to("b").unwrap();
        assert!(!manager.is_transitioning());
        assert_eq!(manager.widget().child_count(), 1);
    }
}
