//! Snackbars: brief messages at the bottom of the window.
//!
//! ## Usage
//!
//! Report the result of an operation with an optional action and close
//! button. A snackbar shows for `duration` seconds, then fades away. Keeping
//! a single snackbar on screen at a time is up to the caller.

use std::{
    cell::RefCell,
    rc::{Rc, Weak},
};

use derive_setters::Setters;
use mdkit_ui::{
    Animation, AnimationHandle, ClockEvent, Dp, Easing, Property, PxPosition, PxRect, PxSize,
    Signal, WeakWidget, Widget, WidgetFeature,
};
use tracing::debug;

use crate::{
    behaviors::declarative::ChildPolicy,
    button::{Button, ButtonArgs, ButtonStyle},
    context::BuildContext,
    error::CompositionError,
    font_styles::FontRole,
    icon_button::{IconButton, IconButtonArgs},
    label::{Label, LabelArgs},
    layout::{Arrangement, CrossAxisAlignment, column_extent, place_column, place_row},
    overlay::{hide_overlay, show_overlay},
    role::Role,
    shape::Shape,
    surface::{Surface, SurfaceArgs, on_geometry},
    theme::MaterialShapes,
};

/// Snackbar tokens.
pub struct SnackbarDefaults;

impl SnackbarDefaults {
    /// Narrowest snackbar.
    pub const MIN_WIDTH: Dp = Dp(344.0);
    /// Widest snackbar.
    pub const MAX_WIDTH: Dp = Dp(672.0);
    /// Distance from the window edges.
    pub const MARGIN: Dp = Dp(16.0);
    /// Horizontal text padding.
    pub const PADDING: Dp = Dp(16.0);
    /// Vertical text padding.
    pub const VERTICAL_PADDING: Dp = Dp(14.0);
    /// Inset of the button container.
    pub const BUTTON_INSET: Dp = Dp(8.0);
    /// Gap between spacer, action and close button.
    pub const BUTTON_SPACING: Dp = Dp(8.0);
    /// Minimum height.
    pub const MIN_HEIGHT: Dp = Dp(48.0);
    /// Seconds on screen.
    pub const DURATION: f64 = 3.0;
    /// Fade duration in seconds.
    pub const FADE_DURATION: f64 = 0.2;
    /// Container elevation.
    pub const ELEVATION: u8 = 3;
}

/// Kind of the message line.
pub const TEXT: &str = "SnackbarText";
/// Kind of the second message line.
pub const SUPPORTING_TEXT: &str = "SnackbarSupportingText";
/// Kind of the button row.
pub const BUTTON_CONTAINER: &str = "SnackbarButtonContainer";
/// Kind of the action button.
pub const ACTION_BUTTON: &str = "SnackbarActionButton";
/// Kind of the close button.
pub const CLOSE_BUTTON: &str = "SnackbarCloseButton";
/// Kind of the flexible gap leading the button row.
pub const SPACER: &str = "SnackbarSpacer";

/// Slots a snackbar accepts.
pub const SNACKBAR_CHILDREN: ChildPolicy =
    ChildPolicy::new("Snackbar", &[TEXT, SUPPORTING_TEXT, BUTTON_CONTAINER]);

/// Slots a snackbar button container accepts.
pub const BUTTON_CONTAINER_CHILDREN: ChildPolicy =
    ChildPolicy::new("SnackbarButtonContainer", &[ACTION_BUTTON, CLOSE_BUTTON]);

/// Message line.
pub fn snackbar_text(ctx: &BuildContext, text: impl Into<String>) -> Label {
    Label::with_kind(
        ctx,
        TEXT,
        LabelArgs::new(text)
            .role(FontRole::Medium)
            .text_color(Role::InverseOnSurface),
    )
}

/// Second message line.
pub fn snackbar_supporting_text(ctx: &BuildContext, text: impl Into<String>) -> Label {
    Label::with_kind(
        ctx,
        SUPPORTING_TEXT,
        LabelArgs::new(text)
            .role(FontRole::Medium)
            .text_color(Role::InverseOnSurface),
    )
}

/// Text button tinted for the inverse surface.
pub fn snackbar_action(ctx: &BuildContext, text: impl Into<String>) -> Button {
    Button::with_kind(
        ctx,
        ACTION_BUTTON,
        ButtonArgs::new(ButtonStyle::Text)
            .text(text)
            .theme_text_color(Role::InversePrimary),
    )
}

/// Close button tinted for the inverse surface.
pub fn snackbar_close(ctx: &BuildContext) -> IconButton {
    IconButton::with_kind(
        ctx,
        CLOSE_BUTTON,
        IconButtonArgs::new("close").theme_icon_color(Role::InverseOnSurface),
    )
}

/// Row holding a flexible spacer followed by the given buttons.
pub fn snackbar_buttons<I>(children: I) -> Result<Widget, CompositionError>
where
    I: IntoIterator,
    I::Item: Into<Widget>,
{
    let container = Widget::new(BUTTON_CONTAINER);
    container.add_widget(&Widget::new(SPACER));
    BUTTON_CONTAINER_CHILDREN.add_children(&container, children)?;
    for child in container.children() {
        child.size.bind({
            let target = container.downgrade();
            move |_| {
                if let Some(container) = target.upgrade() {
                    arrange_buttons(&container);
                }
            }
        });
    }
    fit_buttons(&container);
    on_geometry(&container, arrange_buttons);
    Ok(container)
}

fn button_arrangement() -> Arrangement {
    Arrangement::spaced(SnackbarDefaults::BUTTON_SPACING)
}

fn buttons_width(container: &Widget) -> f32 {
    let spacing = SnackbarDefaults::BUTTON_SPACING.to_pixels_f32();
    container
        .children()
        .iter()
        .filter(|c| c.kind() != SPACER)
        .map(|c| c.size.get().width + spacing)
        .sum()
}

fn fit_buttons(container: &Widget) {
    let height = container
        .children()
        .iter()
        .map(|c| c.size.get().height)
        .fold(0.0, f32::max);
    let width = container.size.get().width.max(buttons_width(container));
    container.size.set(PxSize::new(width, height));
}

fn arrange_buttons(container: &Widget) {
    let children = container.children();
    let free = (container.size.get().width - buttons_width(container)).max(0.0);
    let height = container.size.get().height;
    if let Some(spacer) = children.iter().find(|c| c.kind() == SPACER) {
        spacer.size.set(PxSize::new(free, height));
    }
    place_row(container.rect(), &children, &button_arrangement());
}

/// Arguments for [`Snackbar::compose`].
#[derive(Debug, Clone, PartialEq, Setters)]
pub struct SnackbarArgs {
    /// Seconds on screen before dismissing itself.
    pub duration: f64,
    /// Dismiss after `duration`.
    pub auto_dismiss: bool,
    /// Distance from the bottom of the window.
    pub y: Dp,
}

impl Default for SnackbarArgs {
    fn default() -> Self {
        Self {
            duration: SnackbarDefaults::DURATION,
            auto_dismiss: true,
            y: SnackbarDefaults::MARGIN,
        }
    }
}

/// State shared by a snackbar and its observers.
pub struct SnackbarState {
    /// Seconds on screen.
    pub duration: Property<f64>,
    /// Dismiss after `duration`.
    pub auto_dismiss: Property<bool>,
    /// Whether the snackbar is on screen.
    pub is_open: Property<bool>,
    /// Fired after the snackbar appears.
    pub on_open: Signal<()>,
    /// Fired after the snackbar is gone.
    pub on_dismiss: Signal<()>,
    /// Container features.
    pub surface: Surface,
    y: Dp,
    timer: RefCell<Option<ClockEvent>>,
    fade: RefCell<Option<AnimationHandle>>,
}

impl std::fmt::Debug for SnackbarState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnackbarState")
            .field("duration", &self.duration.get())
            .field("is_open", &self.is_open.get())
            .finish_non_exhaustive()
    }
}

impl SnackbarState {
    fn stop_timers(&self) {
        if let Some(timer) = self.timer.borrow_mut().take() {
            timer.cancel();
        }
        if let Some(fade) = self.fade.borrow_mut().take() {
            fade.cancel();
        }
    }
}

impl WidgetFeature for SnackbarState {
    fn name(&self) -> &'static str {
        "snackbar"
    }

    fn cancel_transient(&self, _widget: &Widget) {
        self.stop_timers();
    }
}

fn text_lines(widget: &Widget) -> Vec<Widget> {
    let mut lines: Vec<Widget> = widget
        .children()
        .into_iter()
        .filter(|c| c.kind() == TEXT || c.kind() == SUPPORTING_TEXT)
        .collect();
    lines.sort_by_key(|c| c.kind() != TEXT);
    lines
}

fn layout(widget: &Widget) {
    let rect = widget.rect();
    let padding = SnackbarDefaults::PADDING.to_pixels_f32();
    let inset = SnackbarDefaults::BUTTON_INSET.to_pixels_f32();
    let lines = text_lines(widget);
    let text_arrangement = Arrangement::default().cross(CrossAxisAlignment::Start);
    let text_size = column_extent(&lines, &text_arrangement);
    let text_rect = PxRect::new(
        rect.x + padding,
        rect.center().y - text_size.height / 2.0,
        text_size.width,
        text_size.height,
    );
    place_column(text_rect, &lines, &text_arrangement);

    if let Some(buttons) = widget.children().into_iter().find(|c| c.kind() == BUTTON_CONTAINER) {
        let right = rect.right() - inset;
        let left = text_rect.right();
        let height = buttons.size.get().height;
        buttons
            .size
            .set(PxSize::new((right - left).max(buttons_width(&buttons)), height));
        let width = buttons.size.get().width;
        buttons.pos.set(PxPosition::new(right - width, rect.y + inset));
    }
}

fn fit(widget: &Widget, width: f32) {
    let lines = text_lines(widget);
    let text = column_extent(&lines, &Arrangement::default());
    let buttons = widget
        .children()
        .into_iter()
        .find(|c| c.kind() == BUTTON_CONTAINER)
        .map_or(0.0, |b| {
            b.size.get().height + 2.0 * SnackbarDefaults::BUTTON_INSET.to_pixels_f32()
        });
    let height = (text.height + 2.0 * SnackbarDefaults::VERTICAL_PADDING.to_pixels_f32())
        .max(buttons)
        .max(SnackbarDefaults::MIN_HEIGHT.to_pixels_f32());
    if !widget.size.set(PxSize::new(width, height)) {
        layout(widget);
    }
}

/// A transient message bar.
#[derive(Clone)]
pub struct Snackbar {
    widget: Widget,
    /// Timing and container features.
    pub state: Rc<SnackbarState>,
    ctx: BuildContext,
}

widget_wrapper!(Snackbar);

impl Snackbar {
    /// Creates a closed snackbar from slot children.
    pub fn compose<I>(
        ctx: &BuildContext,
        args: SnackbarArgs,
        children: I,
    ) -> Result<Self, CompositionError>
    where
        I: IntoIterator,
        I::Item: Into<Widget>,
    {
        let widget = Widget::new("Snackbar");
        let surface = Surface::attach(
            &widget,
            ctx,
            SurfaceArgs::new(Role::InverseSurface)
                .shape(Shape::rounded(MaterialShapes::EXTRA_SMALL))
                .elevation(SnackbarDefaults::ELEVATION),
        );
        SNACKBAR_CHILDREN.add_children(&widget, children)?;
        let state = Rc::new(SnackbarState {
            duration: Property::new("duration", args.duration),
            auto_dismiss: Property::new("auto_dismiss", args.auto_dismiss),
            is_open: Property::new("is_open", false),
            on_open: Signal::new(),
            on_dismiss: Signal::new(),
            surface,
            y: args.y,
            timer: RefCell::new(None),
            fade: RefCell::new(None),
        });
        widget.attach_feature(state.clone());
        on_geometry(&widget, layout);
        for child in widget.children() {
            let target = widget.downgrade();
            child.size.bind(move |_| {
                if let Some(widget) = target.upgrade() {
                    layout(&widget);
                }
            });
        }
        fit(&widget, SnackbarDefaults::MIN_WIDTH.to_pixels_f32());
        Ok(Self {
            widget,
            state,
            ctx: ctx.clone(),
        })
    }

    /// Width for a window `window_width` pixels wide.
    pub fn width_for(window_width: f32) -> f32 {
        let margin = SnackbarDefaults::MARGIN.to_pixels_f32();
        (window_width - 2.0 * margin).clamp(
            SnackbarDefaults::MIN_WIDTH.to_pixels_f32(),
            SnackbarDefaults::MAX_WIDTH.to_pixels_f32(),
        )
    }

    /// Shows the snackbar at the bottom of the window and starts the
    /// dismiss timer.
    pub fn open(&self) {
        if self.state.is_open.get() {
            return;
        }
        let Some(window) = &self.ctx.window else {
            show_overlay(&self.ctx, &self.widget);
            return;
        };
        let window_size = window.size().get();
        fit(&self.widget, Self::width_for(window_size.width));
        let width = self.size.get().width;
        self.pos.set(PxPosition::new(
            (window_size.width - width) / 2.0,
            self.state.y.to_pixels_f32(),
        ));
        self.opacity.set(0.0);
        if !show_overlay(&self.ctx, &self.widget) {
            return;
        }
        self.state.stop_timers();
        let fade = Animation::new(SnackbarDefaults::FADE_DURATION, Easing::OutCubic)
            .animate(&self.opacity, 1.0)
            .start(&self.ctx.clock);
        *self.state.fade.borrow_mut() = Some(fade);
        self.state.is_open.set(true);
        debug!("snackbar opened");
        self.state.on_open.emit(&());

        if self.state.auto_dismiss.get() {
            let target = self.downgrade_handle();
            let timer = self
                .ctx
                .clock
                .schedule_once(self.state.duration.get(), move |_| {
                    if let Some(snackbar) = target.upgrade() {
                        snackbar.dismiss();
                    }
                });
            *self.state.timer.borrow_mut() = Some(timer);
        }
    }

    /// Fades the snackbar out and removes it. Dismissing a closed snackbar
    /// does nothing.
    pub fn dismiss(&self) {
        if !self.state.is_open.get() {
            return;
        }
        self.state.stop_timers();
        let fade = Animation::new(SnackbarDefaults::FADE_DURATION, Easing::InCubic)
            .animate(&self.opacity, 0.0)
            .start(&self.ctx.clock);
        let target = self.downgrade_handle();
        fade.on_complete().connect(move |_| {
            if let Some(snackbar) = target.upgrade() {
                hide_overlay(&snackbar.ctx, &snackbar.widget);
                snackbar.state.is_open.set(false);
                debug!("snackbar dismissed");
                snackbar.state.on_dismiss.emit(&());
            }
        });
        *self.state.fade.borrow_mut() = Some(fade);
    }

    /// The button row, if any.
    pub fn button_container(&self) -> Option<Widget> {
        self.children()
            .into_iter()
            .find(|c| c.kind() == BUTTON_CONTAINER)
    }

    fn downgrade_handle(&self) -> WeakSnackbar {
        WeakSnackbar {
            widget: self.widget.downgrade(),
            state: Rc::downgrade(&self.state),
            ctx: self.ctx.clone(),
        }
    }
}

struct WeakSnackbar {
    widget: WeakWidget,
    state: Weak<SnackbarState>,
    ctx: BuildContext,
}

impl WeakSnackbar {
    fn upgrade(&self) -> Option<Snackbar> {
        Some(Snackbar {
            widget: self.widget.upgrade()?,
            state: self.state.upgrade()?,
            ctx: self.ctx.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use mdkit_ui::Window;

    use super::*;
    use crate::children;

    fn snackbar(ctx: &BuildContext) -> Snackbar {
        Snackbar::compose(
            ctx,
            SnackbarArgs::default(),
            children![
                snackbar_text(ctx, "Photo archived"),
                snackbar_buttons(children![snackbar_action(ctx, "Undo"), snackbar_close(ctx)])
                    .unwrap(),
            ],
        )
        .unwrap()
    }

    #[test]
    fn opens_at_the_bottom_and_dismisses_after_duration() {
        let window = Window::new(PxSize::new(1000.0, 800.0));
        let ctx = BuildContext::new().with_window(window.clone());
        let bar = snackbar(&ctx);
        let dismissed = Rc::new(Cell::new(false));
        let d = dismissed.clone();
        bar.state.on_dismiss.connect(move |_| d.set(true));

        bar.open();
        assert!(window.contains(&bar));
        assert_eq!(bar.size.get().width, 672.0);
        assert_eq!(bar.pos.get(), PxPosition::new(164.0, 16.0));
        ctx.clock.advance(0.5, 0.05);
        assert_eq!(bar.opacity.get(), 1.0);

        ctx.clock.advance(3.0, 0.05);
        assert!(dismissed.get());
        assert!(!window.contains(&bar));
    }

    #[test]
    fn rejects_foreign_buttons() {
        let err = snackbar_buttons([Widget::new("Slider")]);
        assert!(matches!(err, Err(CompositionError::UnsupportedChildType { .. })));
    }
}
