//! The top-level window contract.
//!
//! The host owns the real surface; the [`Window`] holds what widgets observe
//! (size, position, pointer) and routes input into the widget tree. The first
//! child is the application root; later children are overlays such as
//! dialogs and snackbars, stacked above it.

use std::{cell::RefCell, fmt, path::PathBuf, rc::Rc};

use rustc_hash::FxHashMap;
use tracing::{debug, trace};

use crate::{
    Property, PxPosition, PxRect, PxSize, RenderNode, Signal, TouchEvent, TouchPhase,
    TouchResponse, Widget,
};

/// How the window reacts to an on-screen keyboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SoftInputMode {
    /// The keyboard overlaps the content.
    #[default]
    Overlap,
    /// The window shrinks.
    Resize,
    /// The content pans so the focused widget stays visible.
    Pan,
    /// The content pans so the focused widget sits just above the keyboard.
    BelowTarget,
}

struct WindowInner {
    size: Property<PxSize>,
    position: Property<PxPosition>,
    mouse_pos: Property<PxPosition>,
    softinput_mode: Property<SoftInputMode>,
    on_resize: Signal<PxSize>,
    on_drop_file: Signal<PathBuf>,
    children: RefCell<Vec<Widget>>,
    grabs: RefCell<FxHashMap<u64, Widget>>,
    focused: RefCell<Option<Widget>>,
}

/// Handle to the window. Cloning yields another handle to the same window.
#[derive(Clone)]
pub struct Window {
    inner: Rc<WindowInner>,
}

impl fmt::Debug for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Window")
            .field("size", &self.inner.size.get())
            .field("children", &self.inner.children.borrow().len())
            .finish_non_exhaustive()
    }
}

impl Window {
    /// Creates a window of the given pixel size.
    pub fn new(size: PxSize) -> Self {
        let inner = Rc::new(WindowInner {
            size: Property::new("size", size),
            position: Property::new("position", PxPosition::ZERO),
            mouse_pos: Property::new("mouse_pos", PxPosition::ZERO),
            softinput_mode: Property::new("softinput_mode", SoftInputMode::default()),
            on_resize: Signal::new(),
            on_drop_file: Signal::new(),
            children: RefCell::new(Vec::new()),
            grabs: RefCell::new(FxHashMap::default()),
            focused: RefCell::new(None),
        });
        let window = Window { inner };

        let weak = Rc::downgrade(&window.inner);
        window.inner.size.bind(move |size| {
            if let Some(inner) = weak.upgrade() {
                let window = Window { inner };
                window.layout();
                window.inner.on_resize.emit(size);
            }
        });
        window
    }

    /// Window size in pixels.
    pub fn size(&self) -> &Property<PxSize> {
        &self.inner.size
    }

    /// Position of the window on the desktop.
    pub fn position(&self) -> &Property<PxPosition> {
        &self.inner.position
    }

    /// Last pointer position reported by the host.
    pub fn mouse_pos(&self) -> &Property<PxPosition> {
        &self.inner.mouse_pos
    }

    /// Keyboard handling mode.
    pub fn softinput_mode(&self) -> &Property<SoftInputMode> {
        &self.inner.softinput_mode
    }

    /// Fired after every size change, once layout has been reapplied.
    pub fn on_resize(&self) -> &Signal<PxSize> {
        &self.inner.on_resize
    }

    /// Fired when a file is dropped onto the window.
    pub fn on_drop_file(&self) -> &Signal<PathBuf> {
        &self.inner.on_drop_file
    }

    /// Window bounds with the origin at the bottom-left corner.
    pub fn rect(&self) -> PxRect {
        PxRect::from_position_size(PxPosition::ZERO, self.inner.size.get())
    }

    /// Adds a top-level widget above the existing ones.
    pub fn add_widget(&self, widget: &Widget) {
        if self.contains(widget) {
            return;
        }
        widget.apply_layout(self.rect());
        self.inner.children.borrow_mut().push(widget.clone());
        debug!(widget = widget.kind(), "window child added");
    }

    /// Removes a top-level widget, dropping any grab it held.
    pub fn remove_widget(&self, widget: &Widget) -> bool {
        let removed = {
            let mut children = self.inner.children.borrow_mut();
            let before = children.len();
            children.retain(|w| w != widget);
            before != children.len()
        };
        if removed {
            self.inner.grabs.borrow_mut().retain(|_, w| w.root() != *widget);
            widget.cancel_transient();
        }
        removed
    }

    /// Whether `widget` is a top-level child.
    pub fn contains(&self, widget: &Widget) -> bool {
        self.inner.children.borrow().iter().any(|w| w == widget)
    }

    /// Top-level widgets, bottom first.
    pub fn children(&self) -> Vec<Widget> {
        self.inner.children.borrow().clone()
    }

    /// The application root (first child).
    pub fn root(&self) -> Option<Widget> {
        self.inner.children.borrow().first().cloned()
    }

    /// Replaces the application root, keeping overlays. Returns the old root.
    pub fn set_root(&self, root: &Widget) -> Option<Widget> {
        root.apply_layout(self.rect());
        let old = {
            let mut children = self.inner.children.borrow_mut();
            if children.is_empty() {
                children.push(root.clone());
                None
            } else {
                Some(std::mem::replace(&mut children[0], root.clone()))
            }
        };
        if let Some(old) = &old {
            self.inner.grabs.borrow_mut().retain(|_, w| w.root() != *old);
        }
        old
    }

    /// Reapplies placement hints of all top-level widgets.
    pub fn layout(&self) {
        let rect = self.rect();
        for child in self.children() {
            child.apply_layout(rect);
        }
    }

    /// Gives keyboard focus to `widget`, removing it from the previous holder.
    pub fn request_focus(&self, widget: &Widget) {
        let previous = self.inner.focused.replace(Some(widget.clone()));
        if let Some(previous) = previous
            && previous != *widget
        {
            previous.focus.set(false);
        }
        widget.focus.set(true);
    }

    /// Clears keyboard focus.
    pub fn clear_focus(&self) {
        if let Some(previous) = self.inner.focused.take() {
            previous.focus.set(false);
        }
    }

    /// Currently focused widget.
    pub fn focused(&self) -> Option<Widget> {
        self.inner.focused.borrow().clone()
    }

    /// Widget currently holding the grab of touch `id`.
    pub fn grab_holder(&self, id: u64) -> Option<Widget> {
        self.inner.grabs.borrow().get(&id).cloned()
    }

    /// Routes a touch event.
    ///
    /// Down events go to the topmost widget under the point; a widget that
    /// answers [`TouchResponse::Grab`] receives the rest of that touch even
    /// outside its bounds. A grab holder that got disabled or destroyed
    /// receives a cancel instead. Returns the widget that handled the event.
    pub fn dispatch_touch(&self, touch: &TouchEvent) -> Option<Widget> {
        trace!(id = touch.id, phase = ?touch.phase, "touch");
        match touch.phase {
            TouchPhase::Down => {
                for child in self.children().iter().rev() {
                    if let Some((widget, response)) = child.dispatch_touch_down(touch) {
                        if response == TouchResponse::Grab {
                            self.inner.grabs.borrow_mut().insert(touch.id, widget.clone());
                        }
                        return Some(widget);
                    }
                }
                None
            }
            TouchPhase::Move | TouchPhase::Up | TouchPhase::Cancel => {
                let holder = self.grab_holder(touch.id)?;
                let mut event = *touch;
                if holder.is_destroyed() || holder.is_effectively_disabled() {
                    event.phase = TouchPhase::Cancel;
                }
                if event.phase != TouchPhase::Move {
                    self.inner.grabs.borrow_mut().remove(&touch.id);
                }
                if !holder.is_destroyed() {
                    holder.deliver_touch(&event);
                }
                Some(holder)
            }
        }
    }

    /// Window-level pointer motion, delivered to every widget so hover can
    /// track enter and leave.
    pub fn dispatch_mouse_pos(&self, pos: PxPosition) {
        self.inner.mouse_pos.set(pos);
        let mut covered = false;
        for child in self.children().iter().rev() {
            covered |= child.dispatch_pointer(pos, covered);
        }
    }

    /// Reports a dropped file.
    pub fn drop_file(&self, path: impl Into<PathBuf>) {
        self.inner.on_drop_file.emit(&path.into());
    }

    /// Records the frame of every top-level widget, bottom first.
    pub fn render(&self) -> Vec<RenderNode> {
        self.children().iter().map(Widget::render).collect()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::WidgetFeature;

    #[derive(Default)]
    struct Grabber {
        moves: Cell<u32>,
        ups: Cell<u32>,
        cancels: Cell<u32>,
    }

    impl WidgetFeature for Grabber {
        fn name(&self) -> &'static str {
            "grabber"
        }

        fn on_touch(&self, _widget: &Widget, touch: &TouchEvent) -> TouchResponse {
            match touch.phase {
                TouchPhase::Down => return TouchResponse::Grab,
                TouchPhase::Move => self.moves.set(self.moves.get() + 1),
                TouchPhase::Up => self.ups.set(self.ups.get() + 1),
                TouchPhase::Cancel => self.cancels.set(self.cancels.get() + 1),
            }
            TouchResponse::Consumed
        }
    }

    fn setup() -> (Window, Widget, Rc<Grabber>) {
        let window = Window::new(PxSize::new(400.0, 400.0));
        let button = Widget::new("Button");
        let grabber = Rc::new(Grabber::default());
        button.attach_feature(grabber.clone());
        window.add_widget(&button);
        (window, button, grabber)
    }

    #[test]
    fn grab_routes_moves_outside_bounds() {
        let (window, button, grabber) = setup();
        let down = TouchEvent::new(7, PxPosition::new(5.0, 5.0), TouchPhase::Down, 0.0);
        assert_eq!(window.dispatch_touch(&down), Some(button));
        window.dispatch_touch(&down.with(TouchPhase::Move, PxPosition::new(300.0, 300.0), 0.1));
        window.dispatch_touch(&down.with(TouchPhase::Up, PxPosition::new(300.0, 300.0), 0.2));
        assert_eq!(grabber.moves.get(), 1);
        assert_eq!(grabber.ups.get(), 1);
        assert!(window.grab_holder(7).is_none());
    }

    #[test]
    fn disabled_holder_gets_cancel() {
        let (window, button, grabber) = setup();
        let down = TouchEvent::new(1, PxPosition::new(5.0, 5.0), TouchPhase::Down, 0.0);
        window.dispatch_touch(&down);
        button.disabled.set(true);
        window.dispatch_touch(&down.with(TouchPhase::Move, PxPosition::new(6.0, 6.0), 0.1));
        assert_eq!(grabber.cancels.get(), 1);
        assert_eq!(grabber.moves.get(), 0);
    }

    #[test]
    fn resize_fires_after_layout() {
        let window = Window::new(PxSize::new(100.0, 100.0));
        let seen = Rc::new(Cell::new(0.0));
        let s = seen.clone();
        window.on_resize().connect(move |size| s.set(size.width));
        window.size().set(PxSize::new(640.0, 480.0));
        assert_eq!(seen.get(), 640.0);
    }

    #[test]
    fn focus_moves_between_widgets() {
        let window = Window::new(PxSize::new(100.0, 100.0));
        let a = Widget::new("TextField");
        let b = Widget::new("TextField");
        window.request_focus(&a);
        window.request_focus(&b);
        assert!(!a.focus.get());
        assert!(b.focus.get());
        window.clear_focus();
        assert!(!b.focus.get());
    }
}
