//! Widget tree and feature composition.
//!
//! A [`Widget`] is a reference-counted node with the geometry every widget
//! shares (position, size, opacity, angle, placement hint) plus an ordered
//! list of [`WidgetFeature`] records. Features carry their own properties and
//! observers and contribute to rendering and input; a widget's draw is the
//! ordered sum of its features' contributions.
//!
//! Features are looked up by concrete type:
//!
//! ```
//! use std::rc::Rc;
//!
//! use mdkit_ui::{Widget, WidgetFeature};
//!
//! struct Marker;
//! impl WidgetFeature for Marker {
//!     fn name(&self) -> &'static str {
//!         "marker"
//!     }
//! }
//!
//! let widget = Widget::new("Box");
//! widget.attach_feature(Rc::new(Marker));
//! assert!(widget.feature::<Marker>().is_some());
//! ```

use std::{
    cell::{Cell, RefCell},
    fmt,
    rc::{Rc, Weak},
    sync::atomic::{AtomicU64, Ordering},
};

use downcast_rs::{Downcast, impl_downcast};
use rustc_hash::FxHashMap;
use tracing::{debug, trace};

use crate::{
    Animatable, Canvas, Property, PxPosition, PxRect, PxSize, RenderNode, Signal, TouchEvent,
    TouchResponse,
};

static NEXT_UID: AtomicU64 = AtomicU64::new(1);

/// Placement hint relative to the parent, as fractions of its size.
///
/// Only the fields that are `Some` take part in placement; the rest leave
/// the widget's position alone.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PosHint {
    /// Left edge.
    pub x: Option<f32>,
    /// Bottom edge.
    pub y: Option<f32>,
    /// Horizontal center.
    pub center_x: Option<f32>,
    /// Vertical center.
    pub center_y: Option<f32>,
    /// Right edge.
    pub right: Option<f32>,
    /// Top edge.
    pub top: Option<f32>,
}

impl PosHint {
    /// Hint that centers the widget.
    pub const CENTER: PosHint = PosHint {
        x: None,
        y: None,
        center_x: Some(0.5),
        center_y: Some(0.5),
        right: None,
        top: None,
    };

    /// Hint with only the center set.
    pub fn center(center_x: f32, center_y: f32) -> Self {
        Self {
            center_x: Some(center_x),
            center_y: Some(center_y),
            ..Self::default()
        }
    }

    /// Resolves the hint into a position for a widget of `size` inside
    /// `parent`. Returns `None` when no axis is hinted.
    pub fn resolve(&self, parent: PxRect, size: PxSize, current: PxPosition) -> Option<PxPosition> {
        let x = if let Some(x) = self.x {
            Some(parent.x + parent.width * x)
        } else if let Some(cx) = self.center_x {
            Some(parent.x + parent.width * cx - size.width / 2.0)
        } else {
            self.right
                .map(|r| parent.x + parent.width * r - size.width)
        };
        let y = if let Some(y) = self.y {
            Some(parent.y + parent.height * y)
        } else if let Some(cy) = self.center_y {
            Some(parent.y + parent.height * cy - size.height / 2.0)
        } else {
            self.top
                .map(|t| parent.y + parent.height * t - size.height)
        };
        if x.is_none() && y.is_none() {
            return None;
        }
        Some(PxPosition::new(x.unwrap_or(current.x), y.unwrap_or(current.y)))
    }
}

fn lerp_opt(from: Option<f32>, to: Option<f32>, t: f32) -> Option<f32> {
    match (from, to) {
        (Some(a), Some(b)) => Some(a + (b - a) * t),
        _ => to,
    }
}

impl Animatable for PosHint {
    fn interpolate(&self, to: &Self, t: f32) -> Self {
        Self {
            x: lerp_opt(self.x, to.x, t),
            y: lerp_opt(self.y, to.y, t),
            center_x: lerp_opt(self.center_x, to.center_x, t),
            center_y: lerp_opt(self.center_y, to.center_y, t),
            right: lerp_opt(self.right, to.right, t),
            top: lerp_opt(self.top, to.top, t),
        }
    }
}

/// Lifecycle notifications of a widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WidgetEvent {
    /// Added to a parent.
    Attached,
    /// Removed from its parent.
    Detached,
    /// Destroyed; no further events follow.
    Destroyed,
}

/// A composable capability attached to a widget.
///
/// All hooks have empty defaults; a feature overrides the ones it needs.
/// Features keep their state behind interior mutability because the widget
/// shares them.
pub trait WidgetFeature: Downcast {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Appends render instructions for the current frame.
    fn draw(&self, _widget: &Widget, _canvas: &mut Canvas) {}

    /// Handles a touch routed to the widget. Down events only arrive when the
    /// point collides with the widget; grabbed touches arrive regardless.
    fn on_touch(&self, _widget: &Widget, _touch: &TouchEvent) -> TouchResponse {
        TouchResponse::Ignored
    }

    /// Window-level pointer motion; `inside` tells whether the pointer is over
    /// the widget and nothing above it covers the point.
    fn on_pointer(&self, _widget: &Widget, _pos: PxPosition, _inside: bool) {}

    /// Cancels transient work (ripples, gestures, animations). Called on
    /// removal from the parent, on disable, and on grab loss.
    fn cancel_transient(&self, _widget: &Widget) {}

    /// Releases observers and other resources. Called once from
    /// [`Widget::destroy`].
    fn on_destroy(&self, _widget: &Widget) {}
}
impl_downcast!(WidgetFeature);

/// Shared data of a widget node.
pub struct WidgetData {
    kind: &'static str,
    uid: u64,
    id: RefCell<Option<String>>,
    /// Bottom-left corner in window coordinates.
    pub pos: Property<PxPosition>,
    /// Size in pixels.
    pub size: Property<PxSize>,
    /// Opacity multiplier in `[0, 1]`.
    pub opacity: Property<f32>,
    /// Rotation in degrees around the center. Always present, default 0.
    pub angle: Property<f32>,
    /// Placement hint relative to the parent.
    pub pos_hint: Property<PosHint>,
    /// Whether the widget ignores input and renders in its disabled state.
    pub disabled: Property<bool>,
    /// Whether the widget holds keyboard focus.
    pub focus: Property<bool>,
    parent: RefCell<Weak<WidgetData>>,
    children: RefCell<Vec<Widget>>,
    ids: RefCell<FxHashMap<String, Weak<WidgetData>>>,
    features: RefCell<Vec<Rc<dyn WidgetFeature>>>,
    events: Signal<WidgetEvent>,
    destroyed: Cell<bool>,
}

/// Handle to a widget node. Cloning yields another handle to the same node.
#[derive(Clone)]
pub struct Widget {
    data: Rc<WidgetData>,
}

/// Non-owning widget handle.
#[derive(Clone, Default)]
pub struct WeakWidget {
    data: Weak<WidgetData>,
}

impl WeakWidget {
    /// Upgrades to a strong handle if the widget is still alive.
    pub fn upgrade(&self) -> Option<Widget> {
        self.data.upgrade().map(|data| Widget { data })
    }
}

impl fmt::Debug for Widget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Widget")
            .field("kind", &self.data.kind)
            .field("uid", &self.data.uid)
            .field("id", &*self.data.id.borrow())
            .finish()
    }
}

impl PartialEq for Widget {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.data, &other.data)
    }
}

impl std::ops::Deref for Widget {
    type Target = WidgetData;

    fn deref(&self) -> &WidgetData {
        &self.data
    }
}

impl Widget {
    /// Creates a detached widget of the given kind name.
    pub fn new(kind: &'static str) -> Self {
        let data = Rc::new(WidgetData {
            kind,
            uid: NEXT_UID.fetch_add(1, Ordering::Relaxed),
            id: RefCell::new(None),
            pos: Property::new("pos", PxPosition::ZERO),
            size: Property::new("size", PxSize::new(100.0, 100.0)),
            opacity: Property::new("opacity", 1.0),
            angle: Property::new("angle", 0.0),
            pos_hint: Property::new("pos_hint", PosHint::default()),
            disabled: Property::new("disabled", false),
            focus: Property::new("focus", false),
            parent: RefCell::new(Weak::new()),
            children: RefCell::new(Vec::new()),
            ids: RefCell::new(FxHashMap::default()),
            features: RefCell::new(Vec::new()),
            events: Signal::new(),
            destroyed: Cell::new(false),
        });
        let widget = Widget { data };

        let weak = widget.downgrade();
        widget.disabled.bind(move |disabled| {
            if *disabled && let Some(widget) = weak.upgrade() {
                widget.cancel_transient();
            }
        });
        widget
    }

    /// Builder-style id assignment.
    pub fn with_id(self, id: impl Into<String>) -> Self {
        self.set_id(id);
        self
    }

    /// Kind name given at construction.
    pub fn kind(&self) -> &'static str {
        self.data.kind
    }

    /// Process-unique number.
    pub fn uid(&self) -> u64 {
        self.data.uid
    }

    /// Declared id, if any.
    pub fn id(&self) -> Option<String> {
        self.data.id.borrow().clone()
    }

    /// Sets the id; an attached widget is re-registered in its parent's table.
    pub fn set_id(&self, id: impl Into<String>) {
        let id = id.into();
        if let Some(parent) = self.parent() {
            let mut ids = parent.data.ids.borrow_mut();
            if let Some(old) = self.data.id.borrow().as_ref() {
                ids.remove(old);
            }
            ids.insert(id.clone(), Rc::downgrade(&self.data));
        }
        *self.data.id.borrow_mut() = Some(id);
    }

    /// Non-owning handle.
    pub fn downgrade(&self) -> WeakWidget {
        WeakWidget {
            data: Rc::downgrade(&self.data),
        }
    }

    /// Lifecycle notifications.
    pub fn events(&self) -> &Signal<WidgetEvent> {
        &self.data.events
    }

    /// Whether [`Widget::destroy`] has run.
    pub fn is_destroyed(&self) -> bool {
        self.data.destroyed.get()
    }

    /// Parent widget, if attached.
    pub fn parent(&self) -> Option<Widget> {
        self.data.parent.borrow().upgrade().map(|data| Widget { data })
    }

    /// Children in insertion order (draw order; last is topmost).
    pub fn children(&self) -> Vec<Widget> {
        self.data.children.borrow().clone()
    }

    /// Number of children.
    pub fn child_count(&self) -> usize {
        self.data.children.borrow().len()
    }

    /// Appends `child`, detaching it from any previous parent. A child with
    /// an id becomes retrievable through [`Widget::get_by_id`].
    pub fn add_widget(&self, child: &Widget) {
        if child == self {
            return;
        }
        if let Some(old) = child.parent() {
            old.remove_widget(child);
        }
        *child.data.parent.borrow_mut() = Rc::downgrade(&self.data);
        if let Some(id) = child.id() {
            self.data
                .ids
                .borrow_mut()
                .insert(id, Rc::downgrade(&child.data));
        }
        self.data.children.borrow_mut().push(child.clone());
        trace!(parent = self.kind(), child = child.kind(), "widget attached");
        child.data.events.emit(&WidgetEvent::Attached);
    }

    /// Inserts `child` at `index` among the children (clamped).
    pub fn insert_widget(&self, index: usize, child: &Widget) {
        self.add_widget(child);
        let mut children = self.data.children.borrow_mut();
        if let Some(last) = children.pop() {
            let index = index.min(children.len());
            children.insert(index, last);
        }
    }

    /// Removes `child`; cancels its transient work. Returns whether it was a
    /// child of this widget.
    pub fn remove_widget(&self, child: &Widget) -> bool {
        let removed = {
            let mut children = self.data.children.borrow_mut();
            let before = children.len();
            children.retain(|c| c != child);
            before != children.len()
        };
        if !removed {
            return false;
        }
        if let Some(id) = child.id() {
            let mut ids = self.data.ids.borrow_mut();
            if ids
                .get(&id)
                .is_some_and(|w| std::ptr::eq(w.as_ptr(), Rc::as_ptr(&child.data)))
            {
                ids.remove(&id);
            }
        }
        *child.data.parent.borrow_mut() = Weak::new();
        child.cancel_transient_recursive();
        trace!(parent = self.kind(), child = child.kind(), "widget detached");
        child.data.events.emit(&WidgetEvent::Detached);
        true
    }

    /// Removes every child.
    pub fn clear_widgets(&self) {
        for child in self.children() {
            self.remove_widget(&child);
        }
    }

    /// Looks up a child by id in this widget's id table.
    pub fn get_by_id(&self, id: &str) -> Option<Widget> {
        self.data
            .ids
            .borrow()
            .get(id)
            .and_then(|w| w.upgrade())
            .map(|data| Widget { data })
    }

    /// Depth-first search of the subtree (including `self`).
    pub fn find(&self, predicate: &dyn Fn(&Widget) -> bool) -> Option<Widget> {
        if predicate(self) {
            return Some(self.clone());
        }
        self.children().iter().find_map(|c| c.find(predicate))
    }

    /// Walks up to the root of the tree.
    pub fn root(&self) -> Widget {
        let mut current = self.clone();
        while let Some(parent) = current.parent() {
            current = parent;
        }
        current
    }

    /// Attaches a feature. Features draw and receive input in attach order.
    pub fn attach_feature(&self, feature: Rc<dyn WidgetFeature>) {
        trace!(widget = self.kind(), feature = feature.name(), "feature attached");
        self.data.features.borrow_mut().push(feature);
    }

    /// First feature of concrete type `T`.
    pub fn feature<T: WidgetFeature>(&self) -> Option<Rc<T>> {
        self.data
            .features
            .borrow()
            .iter()
            .find_map(|f| f.clone().downcast_rc::<T>().ok())
    }

    /// Whether a feature of type `T` is attached.
    pub fn has_feature<T: WidgetFeature>(&self) -> bool {
        self.data.features.borrow().iter().any(|f| f.is::<T>())
    }

    /// Names of the attached features in order.
    pub fn feature_names(&self) -> Vec<&'static str> {
        self.data.features.borrow().iter().map(|f| f.name()).collect()
    }

    fn features(&self) -> Vec<Rc<dyn WidgetFeature>> {
        self.data.features.borrow().clone()
    }

    /// Bounds in window coordinates.
    pub fn rect(&self) -> PxRect {
        PxRect::from_position_size(self.pos.get(), self.size.get())
    }

    /// Center of the bounds.
    pub fn center(&self) -> PxPosition {
        self.rect().center()
    }

    /// Whether `point` lies inside the bounds.
    pub fn collide_point(&self, point: PxPosition) -> bool {
        self.rect().contains(point)
    }

    /// Whether the widget or any ancestor is disabled.
    pub fn is_effectively_disabled(&self) -> bool {
        self.disabled.get() || self.parent().is_some_and(|p| p.is_effectively_disabled())
    }

    /// Applies the placement hint against `parent`, recursively placing
    /// children against this widget's bounds afterwards.
    pub fn apply_layout(&self, parent: PxRect) {
        let hint = self.pos_hint.get();
        if let Some(pos) = hint.resolve(parent, self.size.get(), self.pos.get()) {
            self.pos.set(pos);
        }
        let rect = self.rect();
        for child in self.children() {
            child.apply_layout(rect);
        }
    }

    /// Cancels transient work of every feature.
    pub fn cancel_transient(&self) {
        for feature in self.features() {
            feature.cancel_transient(self);
        }
    }

    fn cancel_transient_recursive(&self) {
        self.cancel_transient();
        for child in self.children() {
            child.cancel_transient_recursive();
        }
    }

    /// Records the frame for this subtree. Destroyed widgets render nothing.
    pub fn render(&self) -> RenderNode {
        if self.is_destroyed() {
            return RenderNode::default();
        }
        let mut canvas = Canvas::new();
        for feature in self.features() {
            feature.draw(self, &mut canvas);
        }
        if !canvas.is_balanced() {
            tracing::warn!(widget = self.kind(), "unbalanced canvas instructions");
        }
        RenderNode {
            canvas,
            children: self.children().iter().map(Widget::render).collect(),
        }
    }

    /// Routes a down event: topmost colliding descendants first, then this
    /// widget's features in reverse attach order. Returns the widget that
    /// handled it together with the response.
    pub fn dispatch_touch_down(&self, touch: &TouchEvent) -> Option<(Widget, TouchResponse)> {
        if self.is_destroyed() || self.disabled.get() || !self.collide_point(touch.pos) {
            return None;
        }
        for child in self.children().iter().rev() {
            if let Some(hit) = child.dispatch_touch_down(touch) {
                return Some(hit);
            }
        }
        let response = self.deliver_touch(touch);
        (response != TouchResponse::Ignored).then(|| (self.clone(), response))
    }

    /// Delivers a touch to every feature of this widget and returns the
    /// strongest response.
    pub fn deliver_touch(&self, touch: &TouchEvent) -> TouchResponse {
        let mut response = TouchResponse::Ignored;
        for feature in self.features().iter().rev() {
            response = response.merge(feature.on_touch(self, touch));
        }
        response
    }

    /// Routes window-level pointer motion through the subtree. `covered`
    /// tells whether something above this subtree already contains the
    /// point. Returns whether this subtree contains the point.
    pub fn dispatch_pointer(&self, pos: PxPosition, covered: bool) -> bool {
        if self.is_destroyed() {
            return false;
        }
        let mut hit_child = false;
        for child in self.children().iter().rev() {
            hit_child |= child.dispatch_pointer(pos, covered || hit_child);
        }
        let inside = self.collide_point(pos);
        let exclusive = inside && !covered && !hit_child;
        for feature in self.features() {
            feature.on_pointer(self, pos, exclusive);
        }
        inside || hit_child
    }

    /// Destroys the subtree: children first, then features release their
    /// observers, then the node leaves its parent. Idempotent.
    pub fn destroy(&self) {
        if self.data.destroyed.get() {
            return;
        }
        for child in self.children() {
            child.destroy();
        }
        self.cancel_transient();
        for feature in self.features() {
            feature.on_destroy(self);
        }
        self.data.features.borrow_mut().clear();
        if let Some(parent) = self.parent() {
            parent.remove_widget(self);
        }
        self.data.destroyed.set(true);
        debug!(widget = self.kind(), uid = self.uid(), "widget destroyed");
        self.data.events.emit(&WidgetEvent::Destroyed);
        self.data.events.clear();
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::{CanvasLayer, Instruction, TouchPhase};

    #[derive(Default)]
    struct Recorder {
        touches: Cell<u32>,
        cancels: Cell<u32>,
        destroyed: Cell<bool>,
    }

    impl WidgetFeature for Recorder {
        fn name(&self) -> &'static str {
            "recorder"
        }

        fn draw(&self, widget: &Widget, canvas: &mut Canvas) {
            canvas.push(CanvasLayer::Before, Instruction::Rectangle(widget.rect()));
        }

        fn on_touch(&self, _widget: &Widget, _touch: &TouchEvent) -> TouchResponse {
            self.touches.set(self.touches.get() + 1);
            TouchResponse::Grab
        }

        fn cancel_transient(&self, _widget: &Widget) {
            self.cancels.set(self.cancels.get() + 1);
        }

        fn on_destroy(&self, _widget: &Widget) {
            self.destroyed.set(true);
        }
    }

    #[test]
    fn ids_are_registered_in_parent() {
        let parent = Widget::new("Box");
        let child = Widget::new("Label").with_id("title");
        parent.add_widget(&child);
        assert_eq!(parent.get_by_id("title"), Some(child.clone()));
        parent.remove_widget(&child);
        assert!(parent.get_by_id("title").is_none());
    }

    #[test]
    fn topmost_child_receives_down() {
        let parent = Widget::new("Box");
        parent.size.set(PxSize::new(200.0, 200.0));
        let below = Widget::new("A");
        let above = Widget::new("B");
        let below_seen = Rc::new(Recorder::default());
        let above_seen = Rc::new(Recorder::default());
        below.attach_feature(below_seen.clone());
        above.attach_feature(above_seen.clone());
        parent.add_widget(&below);
        parent.add_widget(&above);

        let touch = TouchEvent::new(1, PxPosition::new(10.0, 10.0), TouchPhase::Down, 0.0);
        let (hit, response) = parent.dispatch_touch_down(&touch).unwrap();
        assert_eq!(hit, above);
        assert_eq!(response, TouchResponse::Grab);
        assert_eq!(below_seen.touches.get(), 0);
    }

    #[test]
    fn disable_and_removal_cancel_transients() {
        let parent = Widget::new("Box");
        let child = Widget::new("Button");
        let recorder = Rc::new(Recorder::default());
        child.attach_feature(recorder.clone());
        parent.add_widget(&child);
        child.disabled.set(true);
        assert_eq!(recorder.cancels.get(), 1);
        parent.remove_widget(&child);
        assert_eq!(recorder.cancels.get(), 2);
    }

    #[test]
    fn destroy_releases_features_and_renders_nothing() {
        let parent = Widget::new("Box");
        let child = Widget::new("Card");
        let recorder = Rc::new(Recorder::default());
        child.attach_feature(recorder.clone());
        parent.add_widget(&child);
        assert!(!child.render().canvas.is_empty());
        child.destroy();
        child.destroy();
        assert!(recorder.destroyed.get());
        assert!(child.feature::<Recorder>().is_none());
        assert_eq!(parent.child_count(), 0);
        assert!(child.render().canvas.is_empty());
    }

    #[test]
    fn pos_hint_centers_widget() {
        let widget = Widget::new("Box");
        widget.size.set(PxSize::new(20.0, 10.0));
        widget.pos_hint.set(PosHint::CENTER);
        widget.apply_layout(PxRect::new(0.0, 0.0, 100.0, 100.0));
        assert_eq!(widget.pos.get(), PxPosition::new(40.0, 45.0));
    }
}
