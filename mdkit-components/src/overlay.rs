//! Top-level overlays: scrims and window attachment.
//!
//! Dialogs, menus, snackbars, tooltips, modal drawers and pickers live above
//! the application root. They attach to the window of the
//! [`BuildContext`]; without a window they stay detached and log why.

use std::{
    cell::RefCell,
    fmt,
    rc::{Rc, Weak},
};

use mdkit_ui::{
    Canvas, CanvasLayer, Instruction, ObserverId, Property, PxPosition, PxRect, Signal, TouchEvent,
    TouchPhase, TouchResponse, WeakWidget, Widget, WidgetFeature, Window,
};
use tracing::{debug, warn};

use crate::{
    behaviors::themable::{Themable, ThemedColor},
    context::BuildContext,
    role::Role,
};

/// Scrim tokens.
pub struct ScrimDefaults;

impl ScrimDefaults {
    /// Opacity of the scrim color.
    pub const ALPHA: f32 = 0.32;
}

/// Shows `widget` above everything else. Returns `false` when the context
/// has no window.
pub fn show_overlay(ctx: &BuildContext, widget: &Widget) -> bool {
    match &ctx.window {
        Some(window) => {
            window.add_widget(widget);
            debug!(widget = widget.kind(), "overlay shown");
            true
        }
        None => {
            warn!(widget = widget.kind(), "no window in build context, overlay not shown");
            false
        }
    }
}

/// Removes `widget` from the overlay stack. Returns whether it was shown.
pub fn hide_overlay(ctx: &BuildContext, widget: &Widget) -> bool {
    ctx.window
        .as_ref()
        .is_some_and(|window| window.remove_widget(widget))
}

/// Dimming layer of a scrim.
pub struct ScrimLayer {
    /// Scrim color slot.
    pub color: Rc<ThemedColor>,
    /// Opacity applied over the color.
    pub alpha: Property<f32>,
    /// Fired when a touch ends on the scrim outside the content.
    pub on_tap: Signal<()>,
    content: RefCell<WeakWidget>,
}

impl fmt::Debug for ScrimLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScrimLayer")
            .field("alpha", &self.alpha.get())
            .finish_non_exhaustive()
    }
}

impl ScrimLayer {
    fn over_content(&self, pos: PxPosition) -> bool {
        self.content
            .borrow()
            .upgrade()
            .is_some_and(|content| content.collide_point(pos))
    }
}

impl WidgetFeature for ScrimLayer {
    fn name(&self) -> &'static str {
        "scrim"
    }

    fn draw(&self, widget: &Widget, canvas: &mut Canvas) {
        let color = self.color.get().multiply_alpha(self.alpha.get());
        canvas.push(CanvasLayer::Before, Instruction::Color(color));
        canvas.push(CanvasLayer::Before, Instruction::Rectangle(widget.rect()));
    }

    fn on_touch(&self, _widget: &Widget, touch: &TouchEvent) -> TouchResponse {
        match touch.phase {
            TouchPhase::Down => TouchResponse::Grab,
            TouchPhase::Up if !self.over_content(touch.pos) => {
                self.on_tap.emit(&());
                TouchResponse::Consumed
            }
            _ => TouchResponse::Consumed,
        }
    }
}

/// A full-window dimming layer that swallows touches and reports taps
/// outside its content.
#[derive(Clone)]
pub struct Scrim {
    widget: Widget,
    /// Dimming feature.
    pub layer: Rc<ScrimLayer>,
    resize: Rc<RefCell<Option<(Window, ObserverId)>>>,
}

widget_wrapper!(Scrim);

impl Scrim {
    /// Creates a scrim holding `content`.
    pub fn new(ctx: &BuildContext, content: &Widget) -> Self {
        let widget = Widget::new("Scrim");
        let themable = Themable::of(&widget, &ctx.theme);
        let layer = Rc::new(ScrimLayer {
            color: themable.color_slot("scrim_color", Role::Scrim, None),
            alpha: Property::new("alpha", ScrimDefaults::ALPHA),
            on_tap: Signal::new(),
            content: RefCell::new(content.downgrade()),
        });
        widget.attach_feature(layer.clone());
        widget.add_widget(content);
        Self {
            widget,
            layer,
            resize: Rc::new(RefCell::new(None)),
        }
    }

    /// Covers the window of `ctx` and follows its size. Returns `false`
    /// without a window.
    pub fn show(&self, ctx: &BuildContext) -> bool {
        let Some(window) = &ctx.window else {
            warn!("no window in build context, scrim not shown");
            return false;
        };
        self.widget.pos.set(PxPosition::ZERO);
        self.widget.size.set(window.size().get());
        if self.resize.borrow().is_none() {
            let target = self.widget.downgrade();
            let id = window.size().bind(move |size| {
                if let Some(scrim) = target.upgrade() {
                    scrim.size.set(*size);
                    scrim.apply_layout(PxRect::from_position_size(PxPosition::ZERO, *size));
                }
            });
            *self.resize.borrow_mut() = Some((window.clone(), id));
        }
        show_overlay(ctx, &self.widget)
    }

    /// Removes the scrim and stops following the window.
    pub fn hide(&self, ctx: &BuildContext) -> bool {
        if let Some((window, id)) = self.resize.borrow_mut().take() {
            window.size().unbind(id);
        }
        hide_overlay(ctx, &self.widget)
    }

    /// Fired on a tap outside the content.
    pub fn on_tap(&self) -> &Signal<()> {
        &self.layer.on_tap
    }

    /// Non-owning handle, for callbacks stored on the scrim itself.
    pub fn downgrade(&self) -> WeakScrim {
        WeakScrim {
            widget: self.widget.downgrade(),
            layer: Rc::downgrade(&self.layer),
            resize: Rc::downgrade(&self.resize),
        }
    }
}

/// Weak counterpart of [`Scrim`].
#[derive(Clone)]
pub struct WeakScrim {
    widget: WeakWidget,
    layer: Weak<ScrimLayer>,
    resize: Weak<RefCell<Option<(Window, ObserverId)>>>,
}

impl WeakScrim {
    /// Upgrades while the scrim is alive.
    pub fn upgrade(&self) -> Option<Scrim> {
        Some(Scrim {
            widget: self.widget.upgrade()?,
            layer: self.layer.upgrade()?,
            resize: self.resize.upgrade()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use mdkit_ui::PxSize;

    use super::*;

    #[test]
    fn scrim_reports_taps_outside_content() {
        let window = Window::new(PxSize::new(400.0, 400.0));
        let ctx = BuildContext::new().with_window(window.clone());
        let content = Widget::new("Panel");
        let scrim = Scrim::new(&ctx, &content);
        assert!(scrim.show(&ctx));
        content.pos.set(PxPosition::new(150.0, 150.0));
        assert_eq!(scrim.rect(), PxRect::new(0.0, 0.0, 400.0, 400.0));

        let taps = Rc::new(Cell::new(0));
        let t = taps.clone();
        scrim.on_tap().connect(move |_| t.set(t.get() + 1));
        for at in [PxPosition::new(200.0, 200.0), PxPosition::new(10.0, 10.0)] {
            let down = TouchEvent::new(1, at, TouchPhase::Down, 0.0);
            window.dispatch_touch(&down);
            window.dispatch_touch(&down.with(TouchPhase::Up, at, 0.1));
        }
        assert_eq!(taps.get(), 1);

        window.size().set(PxSize::new(800.0, 600.0));
        assert_eq!(scrim.size.get(), PxSize::new(800.0, 600.0));
        assert!(scrim.hide(&ctx));
        assert!(!window.contains(&scrim));
    }

    #[test]
    fn overlays_need_a_window() {
        let ctx = BuildContext::new();
        assert!(!show_overlay(&ctx, &Widget::new("Panel")));
    }
}
