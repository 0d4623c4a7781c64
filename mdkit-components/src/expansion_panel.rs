//! Expansion panels: a header that reveals content below it.
//!
//! The panel is as tall as its header while closed. Opening attaches the
//! content and grows the panel by the content height over the open
//! animation; closing shrinks it back and detaches the content.

use std::{
    cell::RefCell,
    rc::{Rc, Weak},
};

use derive_setters::Setters;
use mdkit_ui::{
    Animation, AnimationHandle, Easing, Property, PxPosition, PxSize, Signal, WeakWidget, Widget,
    WidgetFeature,
};
use tracing::debug;

use crate::{
    behaviors::declarative::ChildPolicy, context::BuildContext, error::CompositionError,
    surface::on_geometry,
};

/// Expansion panel tokens.
pub struct ExpansionPanelDefaults;

impl ExpansionPanelDefaults {
    /// Open animation in seconds.
    pub const OPEN_DURATION: f64 = 0.2;
    /// Close animation in seconds.
    pub const CLOSE_DURATION: f64 = 0.2;
    /// Chevron rotation of an open panel, in degrees.
    pub const CHEVRON_ANGLE: f32 = 180.0;
}

/// Kind of the header slot.
pub const HEADER: &str = "ExpansionPanelHeader";
/// Kind of the content slot.
pub const CONTENT: &str = "ExpansionPanelContent";

/// Slots an expansion panel accepts.
pub const EXPANSION_PANEL_CHILDREN: ChildPolicy =
    ChildPolicy::new("ExpansionPanel", &[HEADER, CONTENT]);

fn fill(slot: &Widget) {
    let rect = slot.rect();
    for child in slot.children() {
        child.pos.set(rect.position());
        child.size.set(rect.size());
    }
}

fn slot(kind: &'static str, content: Widget) -> Widget {
    let widget = Widget::new(kind);
    widget.size.set(content.size.get());
    widget.add_widget(&content);
    on_geometry(&widget, fill);
    widget
}

/// Header slot holding `content`, usually a list item.
pub fn expansion_panel_header(content: impl Into<Widget>) -> Widget {
    slot(HEADER, content.into())
}

/// Content slot holding `content`.
pub fn expansion_panel_content(content: impl Into<Widget>) -> Widget {
    slot(CONTENT, content.into())
}

/// Arguments for [`ExpansionPanel::compose`].
#[derive(Debug, Clone, Copy, PartialEq, Setters)]
pub struct ExpansionPanelArgs {
    /// Open animation in seconds.
    pub open_duration: f64,
    /// Close animation in seconds.
    pub close_duration: f64,
    /// Easing of both animations.
    pub easing: Easing,
}

impl Default for ExpansionPanelArgs {
    fn default() -> Self {
        Self {
            open_duration: ExpansionPanelDefaults::OPEN_DURATION,
            close_duration: ExpansionPanelDefaults::CLOSE_DURATION,
            easing: Easing::OutCubic,
        }
    }
}

/// Open state of a panel.
pub struct ExpansionPanelState {
    /// Whether the panel is open or opening.
    pub is_open: Property<bool>,
    /// Revealed share of the content, `[0, 1]`.
    pub progress: Property<f32>,
    /// Fired when an open animation finished.
    pub on_open: Signal<()>,
    /// Fired when a close animation finished.
    pub on_close: Signal<()>,
    args: ExpansionPanelArgs,
    content: Option<Widget>,
    chevron: RefCell<Option<WeakWidget>>,
    animation: RefCell<Option<AnimationHandle>>,
}

impl std::fmt::Debug for ExpansionPanelState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExpansionPanelState")
            .field("is_open", &self.is_open.get())
            .field("progress", &self.progress.get())
            .finish_non_exhaustive()
    }
}

impl WidgetFeature for ExpansionPanelState {
    fn name(&self) -> &'static str {
        "expansion_panel"
    }

    fn cancel_transient(&self, _widget: &Widget) {
        if let Some(animation) = self.animation.borrow_mut().take() {
            animation.cancel();
        }
    }

    fn on_destroy(&self, _widget: &Widget) {
        if let Some(content) = &self.content
            && content.parent().is_none()
        {
            content.destroy();
        }
    }
}

fn header_of(widget: &Widget) -> Option<Widget> {
    widget.children().into_iter().find(|c| c.kind() == HEADER)
}

fn layout(widget: &Widget) {
    let Some(state) = widget.feature::<ExpansionPanelState>() else {
        return;
    };
    let rect = widget.rect();
    let mut bottom = rect.top();
    if let Some(header) = header_of(widget) {
        let height = header.size.get().height;
        bottom -= height;
        header.pos.set(PxPosition::new(rect.x, bottom));
        header.size.set(PxSize::new(rect.width, height));
    }
    if let Some(content) = &state.content
        && content.parent().as_ref() == Some(widget)
    {
        let height = content.size.get().height;
        content.size.set(PxSize::new(rect.width, height));
        content.pos.set(PxPosition::new(rect.x, bottom - height));
        content.opacity.set(state.progress.get());
    }
}

fn resize(widget: &Widget) {
    let Some(state) = widget.feature::<ExpansionPanelState>() else {
        return;
    };
    let header = header_of(widget).map_or(0.0, |h| h.size.get().height);
    let content = state
        .content
        .as_ref()
        .map_or(0.0, |c| c.size.get().height);
    let width = widget.size.get().width;
    let height = header + content * state.progress.get();
    // Keep the top edge in place while the height changes.
    let top = widget.rect().top();
    if !widget.size.set(PxSize::new(width, height)) {
        layout(widget);
    }
    widget.pos.set(PxPosition::new(widget.pos.get().x, top - height));
    if let Some(chevron) = state.chevron.borrow().as_ref().and_then(WeakWidget::upgrade) {
        chevron
            .angle
            .set(ExpansionPanelDefaults::CHEVRON_ANGLE * state.progress.get());
    }
}

/// A header with collapsible content.
#[derive(Clone)]
pub struct ExpansionPanel {
    widget: Widget,
    /// Open state.
    pub state: Rc<ExpansionPanelState>,
    ctx: BuildContext,
}

widget_wrapper!(ExpansionPanel);

impl ExpansionPanel {
    /// Creates a closed panel from a header and a content slot.
    pub fn compose<I>(
        ctx: &BuildContext,
        args: ExpansionPanelArgs,
        children: I,
    ) -> Result<Self, CompositionError>
    where
        I: IntoIterator,
        I::Item: Into<Widget>,
    {
        let widget = Widget::new("ExpansionPanel");
        let children = EXPANSION_PANEL_CHILDREN.add_children(&widget, children)?;
        let content = children.into_iter().find(|c| c.kind() == CONTENT);
        if let Some(content) = &content {
            widget.remove_widget(content);
        }
        let width = header_of(&widget).map_or(0.0, |h| h.size.get().width);
        widget.size.set(PxSize::new(width, widget.size.get().height));
        let state = Rc::new(ExpansionPanelState {
            is_open: Property::new("is_open", false),
            progress: Property::new("progress", 0.0),
            on_open: Signal::new(),
            on_close: Signal::new(),
            args,
            content,
            chevron: RefCell::new(None),
            animation: RefCell::new(None),
        });
        widget.attach_feature(state.clone());
        on_geometry(&widget, layout);
        resize(&widget);
        let target = widget.downgrade();
        state.progress.bind(move |_| {
            if let Some(widget) = target.upgrade() {
                resize(&widget);
            }
        });
        Ok(Self {
            widget,
            state,
            ctx: ctx.clone(),
        })
    }

    /// Rotates `chevron` by half a turn as the panel opens.
    pub fn set_chevron(&self, chevron: &Widget) {
        *self.state.chevron.borrow_mut() = Some(chevron.downgrade());
        chevron
            .angle
            .set(ExpansionPanelDefaults::CHEVRON_ANGLE * self.state.progress.get());
    }

    /// Header slot.
    pub fn header(&self) -> Option<Widget> {
        header_of(&self.widget)
    }

    /// Content slot, attached or not.
    pub fn content(&self) -> Option<Widget> {
        self.state.content.clone()
    }

    /// Whether the panel is open or opening.
    pub fn is_open(&self) -> bool {
        self.state.is_open.get()
    }

    /// Reveals the content.
    pub fn open(&self) {
        if self.state.is_open.get() {
            return;
        }
        self.state.is_open.set(true);
        if let Some(content) = &self.state.content
            && content.parent().is_none()
        {
            self.add_widget(content);
            content.opacity.set(self.state.progress.get());
        }
        self.animate(true);
    }

    /// Hides the content.
    pub fn close(&self) {
        if !self.state.is_open.get() {
            return;
        }
        self.state.is_open.set(false);
        self.animate(false);
    }

    /// Opens a closed panel and closes an open one.
    pub fn toggle(&self) {
        if self.is_open() {
            self.close();
        } else {
            self.open();
        }
    }

    fn animate(&self, open: bool) {
        if let Some(previous) = self.state.animation.borrow_mut().take() {
            previous.cancel();
        }
        let args = self.state.args;
        let (duration, to) = if open {
            (args.open_duration, 1.0)
        } else {
            (args.close_duration, 0.0)
        };
        let handle = Animation::new(duration, args.easing)
            .animate(&self.state.progress, to)
            .start(&self.ctx.clock);
        let target = self.widget.downgrade();
        let weak: Weak<ExpansionPanelState> = Rc::downgrade(&self.state);
        handle.on_complete().connect(move |_| {
            let (Some(widget), Some(state)) = (target.upgrade(), weak.upgrade()) else {
                return;
            };
            if open {
                debug!("expansion panel opened");
                state.on_open.emit(&());
            } else {
                if let Some(content) = &state.content {
                    widget.remove_widget(content);
                }
                debug!("expansion panel closed");
                state.on_close.emit(&());
            }
        });
        *self.state.animation.borrow_mut() = Some(handle);
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::children;

    fn block(kind: &'static str, width: f32, height: f32) -> Widget {
        let widget = Widget::new(kind);
        widget.size.set(PxSize::new(width, height));
        widget
    }

    fn panel(ctx: &BuildContext) -> ExpansionPanel {
        let panel = ExpansionPanel::compose(
            ctx,
            ExpansionPanelArgs::default(),
            children![
                expansion_panel_header(block("ListItem", 360.0, 56.0)),
                expansion_panel_content(block("Column", 360.0, 120.0)),
            ],
        )
        .expect("panel children");
        panel.pos.set(PxPosition::new(0.0, 500.0));
        panel
    }

    #[test]
    fn opening_grows_by_the_content_and_closing_detaches_it() {
        let ctx = BuildContext::new();
        let panel = panel(&ctx);
        let chevron = Widget::new("Icon");
        panel.set_chevron(&chevron);
        let content = panel.content().expect("content");
        assert_eq!(panel.size.get(), PxSize::new(360.0, 56.0));
        assert!(content.parent().is_none());
        let top = panel.rect().top();

        let events = Rc::new(Cell::new((0, 0)));
        let e = events.clone();
        panel.state.on_open.connect(move |_| e.set((e.get().0 + 1, e.get().1)));
        let e = events.clone();
        panel.state.on_close.connect(move |_| e.set((e.get().0, e.get().1 + 1)));

        panel.open();
        assert!(panel.is_open());
        assert_eq!(events.get(), (0, 0));
        ctx.clock.advance(0.25, 0.05);
        assert_eq!(events.get(), (1, 0));
        assert_eq!(panel.size.get().height, 176.0);
        assert_eq!(panel.rect().top(), top);
        assert_eq!(content.rect().top(), panel.header().expect("header").pos.get().y);
        assert_eq!(chevron.angle.get(), 180.0);

        panel.close();
        ctx.clock.advance(0.25, 0.05);
        assert_eq!(events.get(), (1, 1));
        assert_eq!(panel.size.get().height, 56.0);
        assert!(content.parent().is_none());
        assert_eq!(chevron.angle.get(), 0.0);
    }

    #[test]
    fn reopening_mid_close_keeps_the_content() {
        let ctx = BuildContext::new();
        let panel = panel(&ctx);
        panel.open();
        ctx.clock.advance(0.25, 0.05);
        panel.toggle();
        ctx.clock.advance(0.1, 0.05);
        panel.toggle();
        ctx.clock.advance(0.25, 0.05);
        assert!(panel.is_open());
        assert_eq!(panel.size.get().height, 176.0);
        assert_eq!(panel.content().and_then(|c| c.parent()), Some(panel.widget.clone()));
    }

    #[test]
    fn other_children_are_rejected() {
        let ctx = BuildContext::new();
        let err = ExpansionPanel::compose(
            &ctx,
            ExpansionPanelArgs::default(),
            children![Widget::new("Label")],
        )
        .map(|_| ())
        .unwrap_err();
        assert!(matches!(err, CompositionError::UnsupportedChildType { .. }));
    }
}
