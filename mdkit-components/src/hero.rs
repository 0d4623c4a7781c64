//! Hero transitions: a widget that flies from one screen to its counterpart
//! on the next.
//!
//! ## Usage
//!
//! Wrap the flying content in a [`HeroFrom`] on the first screen, put a
//! [`HeroTo`] with the same tag on the second, install a [`HeroTransition`]
//! on the [`ScreenManager`] and list the tag in `current_heroes` before
//! switching. During the switch the content leaves its slot, follows
//! `transition_progress` from the source rect to the target rect, and lands
//! in the target slot. Switching back flies it home the same way.

use std::{
    cell::RefCell,
    rc::{Rc, Weak},
};

use mdkit_ui::{
    Property, PxRect, PxSize, ScreenManager, Signal, TransitionInfo, WeakWidget, Widget,
    WidgetFeature,
};
use tracing::debug;

use crate::surface::on_geometry;

/// Kind of the source slot.
pub const HERO_FROM: &str = "HeroFrom";
/// Kind of the target slot.
pub const HERO_TO: &str = "HeroTo";

/// Tag of a hero slot.
#[derive(Debug)]
pub struct HeroSlot {
    /// Shared tag pairing a source with its targets.
    pub tag: String,
}

impl WidgetFeature for HeroSlot {
    fn name(&self) -> &'static str {
        "hero_slot"
    }
}

fn fill_slot(slot: &Widget) {
    let rect = slot.rect();
    for child in slot.children() {
        child.pos.set(rect.position());
        child.size.set(rect.size());
    }
}

fn slot(kind: &'static str, tag: String) -> Widget {
    let widget = Widget::new(kind);
    widget.attach_feature(Rc::new(HeroSlot { tag }));
    on_geometry(&widget, fill_slot);
    widget
}

fn tag_of(widget: &Widget) -> Option<String> {
    widget.feature::<HeroSlot>().map(|slot| slot.tag.clone())
}

/// Slot holding the hero content on its home screen.
#[derive(Clone)]
pub struct HeroFrom {
    widget: Widget,
}

widget_wrapper!(HeroFrom);

impl HeroFrom {
    /// Wraps `content` under `tag`. The slot takes the content's size.
    pub fn new(tag: impl Into<String>, content: impl Into<Widget>) -> Self {
        let content = content.into();
        let widget = slot(HERO_FROM, tag.into());
        widget.size.set(content.size.get());
        widget.add_widget(&content);
        fill_slot(&widget);
        Self { widget }
    }

    /// Tag of the slot.
    pub fn tag(&self) -> String {
        tag_of(&self.widget).unwrap_or_default()
    }

    /// The content while it sits in this slot.
    pub fn content(&self) -> Option<Widget> {
        self.children().into_iter().next()
    }
}

/// Empty slot the hero content lands in.
#[derive(Clone)]
pub struct HeroTo {
    widget: Widget,
}

widget_wrapper!(HeroTo);

impl HeroTo {
    /// Creates an empty target slot of `size`.
    pub fn new(tag: impl Into<String>, size: PxSize) -> Self {
        let widget = slot(HERO_TO, tag.into());
        widget.size.set(size);
        Self { widget }
    }

    /// Tag of the slot.
    pub fn tag(&self) -> String {
        tag_of(&self.widget).unwrap_or_default()
    }

    /// The content while it sits in this slot.
    pub fn content(&self) -> Option<Widget> {
        self.children().into_iter().next()
    }
}

struct Flight {
    tag: String,
    content: Widget,
    from: PxRect,
    to: PxRect,
    landing: Widget,
}

/// Flight controller attached to a screen manager.
pub struct HeroTransition {
    /// Tags that fly on the next switch.
    pub current_heroes: Property<Vec<String>>,
    /// Fired with the tag when a hero landed.
    pub on_landed: Signal<String>,
    stage: WeakWidget,
    flights: RefCell<Vec<Flight>>,
}

impl std::fmt::Debug for HeroTransition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HeroTransition")
            .field("current_heroes", &self.current_heroes.get())
            .field("flying", &self.flights.borrow().len())
            .finish_non_exhaustive()
    }
}

impl WidgetFeature for HeroTransition {
    fn name(&self) -> &'static str {
        "hero_transition"
    }

    fn on_destroy(&self, _widget: &Widget) {
        self.flights.borrow_mut().clear();
    }
}

fn find_slot(screen: &Widget, tag: &str, loaded: bool) -> Option<Widget> {
    screen.find(&|w| {
        tag_of(w).is_some_and(|t| t == tag) && (w.child_count() > 0) == loaded
    })
}

impl HeroTransition {
    /// Attaches a controller to `manager`. The manager's widget owns it.
    pub fn install(manager: &ScreenManager) -> Rc<Self> {
        let state = Rc::new(Self {
            current_heroes: Property::new("current_heroes", Vec::new()),
            on_landed: Signal::new(),
            stage: manager.widget().downgrade(),
            flights: RefCell::new(Vec::new()),
        });
        manager.widget().attach_feature(state.clone());

        let weak: Weak<Self> = Rc::downgrade(&state);
        manager.on_transition_start().connect(move |info| {
            if let Some(state) = weak.upgrade() {
                state.take_off(info);
            }
        });
        let weak = Rc::downgrade(&state);
        manager.transition_progress().bind(move |progress| {
            if let Some(state) = weak.upgrade() {
                state.fly(*progress);
            }
        });
        let weak = Rc::downgrade(&state);
        manager.on_transition_complete().connect(move |_| {
            if let Some(state) = weak.upgrade() {
                state.land();
            }
        });
        state
    }

    /// Whether any hero is in the air.
    pub fn is_flying(&self) -> bool {
        !self.flights.borrow().is_empty()
    }

    /// Current rect of the flying hero `tag`.
    pub fn hero_rect(&self, tag: &str) -> Option<PxRect> {
        self.flights
            .borrow()
            .iter()
            .find(|f| f.tag == tag)
            .map(|f| f.content.rect())
    }

    fn take_off(&self, info: &TransitionInfo) {
        self.land();
        let Some(stage) = self.stage.upgrade() else {
            return;
        };
        // Both screens are attached to the stage while the switch runs.
        let screen = |name: &str| {
            stage
                .children()
                .into_iter()
                .find(|c| c.id().as_deref() == Some(name))
        };
        let (Some(from), Some(to)) = (screen(&info.from), screen(&info.to)) else {
            return;
        };
        let mut flights = Vec::new();
        for tag in self.current_heroes.get() {
            let Some(source) = find_slot(&from, &tag, true) else {
                debug!(%tag, screen = %info.from, "no hero to fly");
                continue;
            };
            let Some(landing) = find_slot(&to, &tag, false) else {
                debug!(%tag, screen = %info.to, "no landing slot");
                continue;
            };
            let Some(content) = source.children().into_iter().next() else {
                continue;
            };
            let from_rect = source.rect();
            source.remove_widget(&content);
            stage.add_widget(&content);
            content.pos.set(from_rect.position());
            content.size.set(from_rect.size());
            debug!(%tag, from = %info.from, to = %info.to, "hero take-off");
            flights.push(Flight {
                tag,
                content,
                from: from_rect,
                to: landing.rect(),
                landing,
            });
        }
        *self.flights.borrow_mut() = flights;
    }

    fn fly(&self, progress: f32) {
        for flight in self.flights.borrow().iter() {
            let rect = flight.from.lerp(&flight.to, progress);
            flight.content.pos.set(rect.position());
            flight.content.size.set(rect.size());
        }
    }

    fn land(&self) {
        let flights = std::mem::take(&mut *self.flights.borrow_mut());
        for flight in flights {
            if let Some(parent) = flight.content.parent() {
                parent.remove_widget(&flight.content);
            }
            flight.landing.add_widget(&flight.content);
            fill_slot(&flight.landing);
            self.on_landed.emit(&flight.tag);
        }
    }
}

#[cfg(test)]
mod tests {
    use mdkit_ui::{Clock, Easing, PxPosition, Screen, Transition, TransitionKind};

    use super::*;

    fn rect(x: f32, y: f32, w: f32, h: f32) -> PxRect {
        PxRect::from_position_size(PxPosition::new(x, y), PxSize::new(w, h))
    }

    #[test]
    fn hero_flies_there_and_back() {
        let clock = Clock::new();
        let manager = ScreenManager::new(&clock);
        manager.widget().size.set(PxSize::new(400.0, 800.0));
        manager.set_transition(Transition {
            kind: TransitionKind::Shared,
            duration: 0.4,
            easing: Easing::Linear,
            ..Transition::default()
        });
        let a = Screen::new("a");
        let b = Screen::new("b");
        let content = Widget::new("Image");
        content.size.set(PxSize::new(100.0, 100.0));
        let from = HeroFrom::new("h", content.clone());
        from.pos.set(PxPosition::new(20.0, 20.0));
        a.add_widget(&from);
        let to = HeroTo::new("h", PxSize::new(200.0, 200.0));
        to.pos.set(PxPosition::new(200.0, 400.0));
        b.add_widget(&to);
        manager.add_screen(a).expect("screen a");
        manager.add_screen(b).expect("screen b");

        let heroes = HeroTransition::install(&manager);
        heroes.current_heroes.set(vec!["h".into()]);
        manager.switch_to("b").expect("switch");
        assert_eq!(heroes.hero_rect("h"), Some(rect(20.0, 20.0, 100.0, 100.0)));

        clock.advance(0.2, 0.05);
        let mid = heroes.hero_rect("h").expect("in flight");
        assert!((mid.x - 110.0).abs() < 1e-3);
        assert!((mid.width - 150.0).abs() < 1e-3);

        clock.advance(0.3, 0.05);
        assert!(!heroes.is_flying());
        assert_eq!(to.content(), Some(content.clone()));
        assert_eq!(content.rect(), rect(200.0, 400.0, 200.0, 200.0));

        manager.switch_to("a").expect("switch back");
        clock.advance(0.5, 0.05);
        assert_eq!(from.content(), Some(content.clone()));
        assert_eq!(content.rect(), rect(20.0, 20.0, 100.0, 100.0));
    }

    #[test]
    fn unlisted_tags_stay_home() {
        let clock = Clock::new();
        let manager = ScreenManager::new(&clock);
        let a = Screen::new("a");
        let from = HeroFrom::new("h", Widget::new("Image"));
        a.add_widget(&from);
        let b = Screen::new("b");
        b.add_widget(&HeroTo::new("h", PxSize::new(10.0, 10.0)));
        manager.add_screen(a).expect("screen a");
        manager.add_screen(b).expect("screen b");
        let heroes = HeroTransition::install(&manager);
        manager.switch_to("b").expect("switch");
        assert!(!heroes.is_flying());
        assert!(from.content().is_some());
    }
}
