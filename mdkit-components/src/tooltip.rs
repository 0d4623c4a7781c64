//! Tooltips: short descriptions shown while the pointer rests on a widget.
//!
//! ## Usage
//!
//! A plain tooltip names an icon-only control. A rich tooltip adds a subhead
//! and an action and stays open while the pointer moves onto it. Both appear
//! after the pointer has dwelled on the anchor for `display_delay` seconds.

use std::{
    cell::{Cell, RefCell},
    rc::{Rc, Weak},
};

use derive_setters::Setters;
use mdkit_ui::{
    Animation, AnimationHandle, ClockEvent, Dp, Easing, Property, PxPosition, PxRect, PxSize,
    Signal, WeakWidget, Widget, WidgetFeature,
};
use tracing::{debug, trace};

use crate::{
    button::{Button, ButtonArgs, ButtonStyle},
    context::BuildContext,
    font_styles::FontRole,
    label::{Label, LabelArgs},
    layout::{Arrangement, CrossAxisAlignment, Padding, column_extent, place_column},
    overlay::{hide_overlay, show_overlay},
    role::Role,
    shape::Shape,
    surface::{Surface, SurfaceArgs},
    theme::MaterialShapes,
};

/// Tooltip tokens.
pub struct TooltipDefaults;

impl TooltipDefaults {
    /// Hover dwell before the tooltip appears, in seconds.
    pub const DISPLAY_DELAY: f64 = 0.5;
    /// Fade duration in seconds.
    pub const FADE_DURATION: f64 = 0.15;
    /// Gap between anchor and tooltip.
    pub const OFFSET: Dp = Dp(4.0);
    /// Plain tooltip height.
    pub const PLAIN_HEIGHT: Dp = Dp(24.0);
    /// Plain tooltip horizontal padding.
    pub const PLAIN_PADDING: Dp = Dp(8.0);
    /// Widest rich tooltip.
    pub const RICH_MAX_WIDTH: Dp = Dp(320.0);
    /// Rich tooltip horizontal padding.
    pub const RICH_PADDING: Dp = Dp(16.0);
    /// Rich tooltip top padding.
    pub const RICH_TOP_PADDING: Dp = Dp(12.0);
    /// Rich tooltip bottom padding.
    pub const RICH_BOTTOM_PADDING: Dp = Dp(8.0);
    /// Gap between rich tooltip lines.
    pub const RICH_SPACING: Dp = Dp(4.0);
    /// Rich tooltip elevation.
    pub const RICH_ELEVATION: u8 = 2;
}

/// Kind of the plain tooltip text.
pub const PLAIN_TEXT: &str = "TooltipPlainText";
/// Kind of the rich tooltip subhead.
pub const SUBHEAD: &str = "TooltipRichSubhead";
/// Kind of the rich tooltip body.
pub const SUPPORTING_TEXT: &str = "TooltipRichSupportingText";
/// Kind of the rich tooltip action.
pub const ACTION: &str = "TooltipRichActionButton";

/// Which look the tooltip has.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TooltipVariant {
    /// One line on the inverse surface.
    Plain,
    /// Subhead, body and action on a container surface.
    Rich,
}

/// Arguments for [`Tooltip::new`]. Setting a subhead or an action makes the
/// tooltip rich.
#[derive(Debug, Clone, PartialEq, Setters)]
pub struct TooltipArgs {
    /// Tooltip text, or the rich body.
    #[setters(into)]
    pub text: String,
    /// Rich subhead.
    #[setters(strip_option, into)]
    pub subhead: Option<String>,
    /// Rich action label.
    #[setters(strip_option, into)]
    pub action: Option<String>,
    /// Hover dwell in seconds.
    pub display_delay: f64,
}

impl TooltipArgs {
    /// Tooltip showing `text`.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            subhead: None,
            action: None,
            display_delay: TooltipDefaults::DISPLAY_DELAY,
        }
    }

    fn variant(&self) -> TooltipVariant {
        if self.subhead.is_some() || self.action.is_some() {
            TooltipVariant::Rich
        } else {
            TooltipVariant::Plain
        }
    }
}

/// State shared by a tooltip, its anchor and its observers.
pub struct TooltipState {
    /// Look of the tooltip.
    pub variant: TooltipVariant,
    /// Hover dwell in seconds.
    pub display_delay: Property<f64>,
    /// Whether the tooltip is on screen.
    pub is_open: Property<bool>,
    /// Fired after the tooltip appears.
    pub on_open: Signal<()>,
    /// Fired after the tooltip is gone.
    pub on_dismiss: Signal<()>,
    /// Container features.
    pub surface: Surface,
    anchor: WeakWidget,
    over_anchor: Cell<bool>,
    over_tooltip: Cell<bool>,
    timer: RefCell<Option<ClockEvent>>,
    fade: RefCell<Option<AnimationHandle>>,
}

impl std::fmt::Debug for TooltipState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TooltipState")
            .field("variant", &self.variant)
            .field("is_open", &self.is_open.get())
            .finish_non_exhaustive()
    }
}

impl TooltipState {
    fn stop_timers(&self) {
        if let Some(timer) = self.timer.borrow_mut().take() {
            timer.cancel();
        }
        if let Some(fade) = self.fade.borrow_mut().take() {
            fade.cancel();
        }
    }

    fn wanted(&self) -> bool {
        self.over_anchor.get() || (self.variant == TooltipVariant::Rich && self.over_tooltip.get())
    }
}

impl WidgetFeature for TooltipState {
    fn name(&self) -> &'static str {
        "tooltip"
    }

    fn on_pointer(&self, widget: &Widget, pos: PxPosition, _inside: bool) {
        let over = self.is_open.get() && widget.collide_point(pos);
        if self.over_tooltip.replace(over) != over
            && let Some(tooltip) = self.anchor.upgrade().and_then(|a| a.feature::<TooltipHover>())
        {
            tooltip.sync();
        }
    }
}

/// Hover tracking installed on the anchor.
pub struct TooltipHover {
    tooltip: RefCell<Option<WeakTooltip>>,
}

impl TooltipHover {
    fn upgrade(&self) -> Option<Tooltip> {
        self.tooltip.borrow().as_ref().and_then(WeakTooltip::upgrade)
    }

    fn sync(&self) {
        if let Some(tooltip) = self.upgrade() {
            if tooltip.state.wanted() {
                tooltip.schedule();
            } else {
                tooltip.dismiss();
            }
        }
    }
}

impl WidgetFeature for TooltipHover {
    fn name(&self) -> &'static str {
        "tooltip_hover"
    }

    fn on_pointer(&self, widget: &Widget, pos: PxPosition, _inside: bool) {
        let Some(tooltip) = self.upgrade() else {
            return;
        };
        let over = widget.collide_point(pos) && !widget.is_effectively_disabled();
        if tooltip.state.over_anchor.replace(over) != over {
            trace!(over, "tooltip anchor hover changed");
            self.sync();
        }
    }

    fn cancel_transient(&self, _widget: &Widget) {
        if let Some(tooltip) = self.upgrade() {
            tooltip.state.over_anchor.set(false);
            tooltip.state.over_tooltip.set(false);
            tooltip.dismiss();
        }
    }
}

/// Position of a tooltip of `size` for `anchor`: centered above it, or
/// below when the window top is in the way, clamped inside the window.
pub fn tooltip_position(anchor: PxRect, size: PxSize, window: PxSize) -> PxPosition {
    let offset = TooltipDefaults::OFFSET.to_pixels_f32();
    let x = (anchor.center().x - size.width / 2.0).clamp(0.0, (window.width - size.width).max(0.0));
    let above = anchor.top() + offset;
    let y = if above + size.height <= window.height {
        above
    } else {
        (anchor.y - offset - size.height).max(0.0)
    };
    PxPosition::new(x, y)
}

fn rich_arrangement() -> Arrangement {
    Arrangement::spaced(TooltipDefaults::RICH_SPACING)
        .cross(CrossAxisAlignment::Start)
        .padding(Padding {
            left: TooltipDefaults::RICH_PADDING,
            top: TooltipDefaults::RICH_TOP_PADDING,
            right: TooltipDefaults::RICH_PADDING,
            bottom: TooltipDefaults::RICH_BOTTOM_PADDING,
        })
}

fn fit(widget: &Widget, variant: TooltipVariant) {
    let children = widget.children();
    match variant {
        TooltipVariant::Plain => {
            let Some(text) = children.first() else {
                return;
            };
            let text_size = text.size.get();
            let padding = TooltipDefaults::PLAIN_PADDING.to_pixels_f32();
            let height = text_size
                .height
                .max(TooltipDefaults::PLAIN_HEIGHT.to_pixels_f32());
            widget
                .size
                .set(PxSize::new(text_size.width + 2.0 * padding, height));
            let rect = widget.rect();
            text.pos.set(PxPosition::new(
                rect.x + padding,
                rect.center().y - text_size.height / 2.0,
            ));
        }
        TooltipVariant::Rich => {
            let arrangement = rich_arrangement();
            let extent = column_extent(&children, &arrangement);
            let width = extent
                .width
                .min(TooltipDefaults::RICH_MAX_WIDTH.to_pixels_f32());
            widget.size.set(PxSize::new(width, extent.height));
            place_column(widget.rect(), &children, &arrangement);
        }
    }
}

/// A plain or rich tooltip bound to an anchor widget.
#[derive(Clone)]
pub struct Tooltip {
    widget: Widget,
    /// Hover and container state.
    pub state: Rc<TooltipState>,
    ctx: BuildContext,
}

widget_wrapper!(Tooltip);

impl Tooltip {
    /// Creates a tooltip for `anchor` and starts tracking hover on it.
    pub fn new(ctx: &BuildContext, anchor: &Widget, args: TooltipArgs) -> Self {
        let variant = args.variant();
        let widget = Widget::new("Tooltip");
        let surface_args = match variant {
            TooltipVariant::Plain => SurfaceArgs::new(Role::InverseSurface)
                .shape(Shape::rounded(MaterialShapes::EXTRA_SMALL)),
            TooltipVariant::Rich => SurfaceArgs::new(Role::SurfaceContainer)
                .shape(Shape::rounded(MaterialShapes::MEDIUM))
                .elevation(TooltipDefaults::RICH_ELEVATION),
        };
        let surface = Surface::attach(&widget, ctx, surface_args);
        match variant {
            TooltipVariant::Plain => {
                let text = Label::with_kind(
                    ctx,
                    PLAIN_TEXT,
                    LabelArgs::new(args.text)
                        .font_style("Body")
                        .role(FontRole::Small)
                        .text_color(Role::InverseOnSurface),
                );
                widget.add_widget(&text);
            }
            TooltipVariant::Rich => {
                if let Some(subhead) = args.subhead {
                    let subhead = Label::with_kind(
                        ctx,
                        SUBHEAD,
                        LabelArgs::new(subhead)
                            .font_style("Title")
                            .role(FontRole::Small)
                            .text_color(Role::OnSurfaceVariant),
                    );
                    widget.add_widget(&subhead);
                }
                let body = Label::with_kind(
                    ctx,
                    SUPPORTING_TEXT,
                    LabelArgs::new(args.text)
                        .font_style("Body")
                        .role(FontRole::Medium)
                        .text_color(Role::OnSurfaceVariant),
                );
                widget.add_widget(&body);
                if let Some(action) = args.action {
                    let action = Button::with_kind(
                        ctx,
                        ACTION,
                        ButtonArgs::new(ButtonStyle::Text).text(action),
                    );
                    widget.add_widget(&action);
                }
            }
        }
        let state = Rc::new(TooltipState {
            variant,
            display_delay: Property::new("display_delay", args.display_delay),
            is_open: Property::new("is_open", false),
            on_open: Signal::new(),
            on_dismiss: Signal::new(),
            surface,
            anchor: anchor.downgrade(),
            over_anchor: Cell::new(false),
            over_tooltip: Cell::new(false),
            timer: RefCell::new(None),
            fade: RefCell::new(None),
        });
        widget.attach_feature(state.clone());
        fit(&widget, variant);

        let tooltip = Self {
            widget,
            state,
            ctx: ctx.clone(),
        };
        let hover = match anchor.feature::<TooltipHover>() {
            Some(hover) => hover,
            None => {
                let hover = Rc::new(TooltipHover {
                    tooltip: RefCell::new(None),
                });
                anchor.attach_feature(hover.clone());
                hover
            }
        };
        *hover.tooltip.borrow_mut() = Some(tooltip.downgrade_handle());
        tooltip
    }

    /// Look of the tooltip.
    pub fn variant(&self) -> TooltipVariant {
        self.state.variant
    }

    /// The rich action button.
    pub fn action(&self) -> Option<Button> {
        self.children()
            .into_iter()
            .find(|c| c.kind() == ACTION)
            .and_then(Button::from_widget)
    }

    /// Slot child of `kind`.
    pub fn slot(&self, kind: &str) -> Option<Widget> {
        self.children().into_iter().find(|c| c.kind() == kind)
    }

    fn schedule(&self) {
        if self.state.is_open.get() {
            if let Some(fade) = self.state.fade.borrow().as_ref()
                && fade.is_running()
                && self.opacity.get() < 1.0
            {
                self.fade_in();
            }
            return;
        }
        if self.state.timer.borrow().as_ref().is_some_and(ClockEvent::is_active) {
            return;
        }
        let target = self.downgrade_handle();
        let timer = self
            .ctx
            .clock
            .schedule_once(self.state.display_delay.get(), move |_| {
                if let Some(tooltip) = target.upgrade() {
                    tooltip.open();
                }
            });
        *self.state.timer.borrow_mut() = Some(timer);
    }

    fn fade_in(&self) {
        self.state.stop_timers();
        let fade = Animation::new(TooltipDefaults::FADE_DURATION, Easing::OutCubic)
            .animate(&self.opacity, 1.0)
            .start(&self.ctx.clock);
        *self.state.fade.borrow_mut() = Some(fade);
    }

    /// Shows the tooltip next to its anchor right away.
    pub fn open(&self) {
        if self.state.is_open.get() {
            return;
        }
        let Some(anchor) = self.state.anchor.upgrade() else {
            return;
        };
        let window = self
            .ctx
            .window
            .as_ref()
            .map_or(PxSize::new(f32::MAX, f32::MAX), |w| w.size().get());
        fit(&self.widget, self.state.variant);
        self.pos
            .set(tooltip_position(anchor.rect(), self.size.get(), window));
        fit(&self.widget, self.state.variant);
        self.opacity.set(0.0);
        if !show_overlay(&self.ctx, &self.widget) {
            return;
        }
        self.fade_in();
        self.state.is_open.set(true);
        debug!(variant = ?self.state.variant, "tooltip opened");
        self.state.on_open.emit(&());
    }

    /// Fades the tooltip out and removes it. Also cancels a pending dwell.
    pub fn dismiss(&self) {
        if !self.state.is_open.get() {
            self.state.stop_timers();
            return;
        }
        self.state.stop_timers();
        let fade = Animation::new(TooltipDefaults::FADE_DURATION, Easing::InCubic)
            .animate(&self.opacity, 0.0)
            .start(&self.ctx.clock);
        let target = self.downgrade_handle();
        fade.on_complete().connect(move |_| {
            if let Some(tooltip) = target.upgrade() {
                hide_overlay(&tooltip.ctx, &tooltip.widget);
                tooltip.state.is_open.set(false);
                tooltip.state.over_tooltip.set(false);
                debug!("tooltip dismissed");
                tooltip.state.on_dismiss.emit(&());
            }
        });
        *self.state.fade.borrow_mut() = Some(fade);
    }

    fn downgrade_handle(&self) -> WeakTooltip {
        WeakTooltip {
            widget: self.widget.downgrade(),
            state: Rc::downgrade(&self.state),
            ctx: self.ctx.clone(),
        }
    }
}

struct WeakTooltip {
    widget: WeakWidget,
    state: Weak<TooltipState>,
    ctx: BuildContext,
}

impl WeakTooltip {
    fn upgrade(&self) -> Option<Tooltip> {
        Some(Tooltip {
            widget: self.widget.upgrade()?,
            state: self.state.upgrade()?,
            ctx: self.ctx.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use mdkit_ui::Window;

    use super::*;

    fn setup() -> (BuildContext, Window, Widget) {
        let window = Window::new(PxSize::new(400.0, 300.0));
        let ctx = BuildContext::new().with_window(window.clone());
        let anchor = Widget::new("Anchor");
        anchor.size.set(PxSize::new(48.0, 48.0));
        anchor.pos.set(PxPosition::new(100.0, 100.0));
        window.add_widget(&anchor);
        (ctx, window, anchor)
    }

    #[test]
    fn appears_after_dwell_and_leaves_with_the_pointer() {
        let (ctx, window, anchor) = setup();
        let tooltip = Tooltip::new(&ctx, &anchor, TooltipArgs::new("Search"));
        assert_eq!(tooltip.variant(), TooltipVariant::Plain);

        window.dispatch_mouse_pos(PxPosition::new(120.0, 120.0));
        ctx.clock.advance(0.3, 0.05);
        assert!(!tooltip.state.is_open.get());
        ctx.clock.advance(0.3, 0.05);
        assert!(tooltip.state.is_open.get());
        assert!(window.contains(&tooltip));
        assert_eq!(tooltip.pos.get().y, anchor.rect().top() + 4.0);
        assert_eq!(tooltip.size.get().height, 24.0);

        window.dispatch_mouse_pos(PxPosition::new(10.0, 10.0));
        ctx.clock.advance(0.3, 0.05);
        assert!(!tooltip.state.is_open.get());
        assert!(!window.contains(&tooltip));
    }

    #[test]
    fn short_hover_shows_nothing() {
        let (ctx, window, anchor) = setup();
        let tooltip = Tooltip::new(&ctx, &anchor, TooltipArgs::new("Search"));
        window.dispatch_mouse_pos(PxPosition::new(120.0, 120.0));
        ctx.clock.advance(0.2, 0.05);
        window.dispatch_mouse_pos(PxPosition::new(10.0, 10.0));
        ctx.clock.advance(1.0, 0.05);
        assert!(!tooltip.state.is_open.get());
    }

    #[test]
    fn rich_tooltip_carries_its_slots() {
        let (ctx, _window, anchor) = setup();
        let tooltip = Tooltip::new(
            &ctx,
            &anchor,
            TooltipArgs::new("Body").subhead("Title").action("Learn more"),
        );
        assert_eq!(tooltip.variant(), TooltipVariant::Rich);
        assert!(tooltip.slot(SUBHEAD).is_some());
        assert!(tooltip.action().is_some());
        let subhead = tooltip.slot(SUBHEAD).map(|s| s.rect());
        let body = tooltip.slot(SUPPORTING_TEXT).map(|s| s.rect());
        assert!(subhead.zip(body).is_some_and(|(s, b)| s.y > b.y));
        assert_eq!(
            tooltip.state.surface.background.md_bg_color.get(),
            ctx.theme.color(Role::SurfaceContainer)
        );
    }

    #[test]
    fn flips_below_near_the_window_top() {
        let anchor = PxRect::new(10.0, 270.0, 48.0, 24.0);
        let pos = tooltip_position(anchor, PxSize::new(80.0, 24.0), PxSize::new(400.0, 300.0));
        assert_eq!(pos, PxPosition::new(0.0, 242.0));
    }
}
