//! Modal dialogs.
//!
//! ## Usage
//!
//! Interrupt the user with a decision or important information. A dialog
//! is composed from typed slots (icon, headline, supporting text, content
//! container, button container), sits on a scrim and closes on a scrim tap
//! only when `auto_dismiss` is set.

use std::rc::{Rc, Weak};

use derive_setters::Setters;
use mdkit_ui::{
    Dp, PosHint, Property, PxPosition, PxRect, PxSize, Signal, WeakWidget, Widget, WidgetFeature,
};
use tracing::debug;

use crate::{
    behaviors::declarative::ChildPolicy,
    context::BuildContext,
    error::CompositionError,
    font_styles::FontRole,
    label::{Icon, IconArgs, Label, LabelArgs},
    layout::{
        Arrangement, CrossAxisAlignment, MainAxisAlignment, column_extent, place_column,
        place_row, row_extent,
    },
    overlay::{Scrim, WeakScrim},
    role::Role,
    shape::Shape,
    surface::{Surface, SurfaceArgs, on_geometry},
    theme::MaterialShapes,
};

/// Dialog tokens.
pub struct DialogDefaults;

impl DialogDefaults {
    /// Narrowest dialog.
    pub const MIN_WIDTH: Dp = Dp(280.0);
    /// Widest dialog.
    pub const MAX_WIDTH: Dp = Dp(560.0);
    /// Default width.
    pub const WIDTH: Dp = Dp(312.0);
    /// Inner padding.
    pub const PADDING: Dp = Dp(24.0);
    /// Gap between icon, headline and supporting text.
    pub const SPACING: Dp = Dp(16.0);
    /// Gap above the button container.
    pub const BUTTON_GAP: Dp = Dp(24.0);
    /// Gap between buttons.
    pub const BUTTON_SPACING: Dp = Dp(8.0);
    /// Container elevation.
    pub const ELEVATION: u8 = 3;
}

/// Kind of the icon slot.
pub const ICON: &str = "DialogIcon";
/// Kind of the headline slot.
pub const HEADLINE: &str = "DialogHeadlineText";
/// Kind of the supporting text slot.
pub const SUPPORTING: &str = "DialogSupportingText";
/// Kind of the content container slot.
pub const CONTENT: &str = "DialogContentContainer";
/// Kind of the button container slot.
pub const BUTTONS: &str = "DialogButtonContainer";

/// Slots a dialog accepts, in display order.
pub const DIALOG_CHILDREN: ChildPolicy =
    ChildPolicy::new("Dialog", &[ICON, HEADLINE, SUPPORTING, CONTENT, BUTTONS]);

const SLOT_ORDER: [&str; 5] = [ICON, HEADLINE, SUPPORTING, CONTENT, BUTTONS];

/// Hero icon above the headline.
pub fn dialog_icon(ctx: &BuildContext, icon: impl Into<String>) -> Icon {
    Icon::with_kind(
        ctx,
        ICON,
        IconArgs::new(icon).icon_color(Role::Secondary),
    )
}

/// Headline of the dialog.
pub fn dialog_headline(ctx: &BuildContext, text: impl Into<String>) -> Label {
    Label::with_kind(
        ctx,
        HEADLINE,
        LabelArgs::new(text)
            .font_style("Headline")
            .role(FontRole::Small)
            .text_color(Role::OnSurface),
    )
}

/// Body text of the dialog.
pub fn dialog_supporting_text(ctx: &BuildContext, text: impl Into<String>) -> Label {
    Label::with_kind(
        ctx,
        SUPPORTING,
        LabelArgs::new(text)
            .role(FontRole::Medium)
            .text_color(Role::OnSurfaceVariant),
    )
}

/// Container for arbitrary content, stacked top to bottom.
pub fn dialog_content<I>(children: I) -> Widget
where
    I: IntoIterator,
    I::Item: Into<Widget>,
{
    let container = Widget::new(CONTENT);
    for child in children {
        container.add_widget(&child.into());
    }
    let arrangement = Arrangement::spaced(Dp(8.0)).cross(CrossAxisAlignment::Start);
    container.size.set(column_extent(&container.children(), &arrangement));
    on_geometry(&container, move |c| {
        place_column(c.rect(), &c.children(), &arrangement);
    });
    container
}

/// Row of actions aligned to the end of the dialog.
pub fn dialog_buttons<I>(children: I) -> Widget
where
    I: IntoIterator,
    I::Item: Into<Widget>,
{
    let container = Widget::new(BUTTONS);
    for child in children {
        container.add_widget(&child.into());
    }
    let arrangement = button_arrangement();
    container.size.set(row_extent(&container.children(), &arrangement));
    on_geometry(&container, move |c| {
        place_row(c.rect(), &c.children(), &arrangement);
    });
    container
}

fn button_arrangement() -> Arrangement {
    Arrangement::spaced(DialogDefaults::BUTTON_SPACING).main(MainAxisAlignment::End)
}

/// Arguments for [`Dialog::compose`].
#[derive(Debug, Clone, PartialEq, Setters)]
pub struct DialogArgs {
    /// Close on a scrim tap.
    pub auto_dismiss: bool,
    /// Container width, clamped to 280..=560 dp.
    pub width: Dp,
}

impl Default for DialogArgs {
    fn default() -> Self {
        Self {
            auto_dismiss: true,
            width: DialogDefaults::WIDTH,
        }
    }
}

/// State shared by a dialog and its observers.
#[derive(Debug)]
pub struct DialogState {
    /// Close on a scrim tap.
    pub auto_dismiss: Property<bool>,
    /// Whether the dialog is shown.
    pub is_open: Property<bool>,
    /// Fired after the dialog is shown.
    pub on_open: Signal<()>,
    /// Fired after the dialog is closed.
    pub on_dismiss: Signal<()>,
    /// Container features.
    pub surface: Surface,
}

impl WidgetFeature for DialogState {
    fn name(&self) -> &'static str {
        "dialog"
    }
}

fn ordered_slots(widget: &Widget) -> Vec<Widget> {
    let mut slots = widget.children();
    slots.sort_by_key(|c| SLOT_ORDER.iter().position(|k| *k == c.kind()));
    slots
}

fn content_height(slots: &[Widget]) -> f32 {
    let spacing = DialogDefaults::SPACING.to_pixels_f32();
    let gap = DialogDefaults::BUTTON_GAP.to_pixels_f32();
    let mut height = 0.0;
    for (i, slot) in slots.iter().enumerate() {
        if i > 0 {
            height += if slot.kind() == BUTTONS { gap } else { spacing };
        }
        height += slot.size.get().height;
    }
    height + 2.0 * DialogDefaults::PADDING.to_pixels_f32()
}

fn layout(widget: &Widget) {
    let slots = ordered_slots(widget);
    let padding = DialogDefaults::PADDING.to_pixels_f32();
    let spacing = DialogDefaults::SPACING.to_pixels_f32();
    let gap = DialogDefaults::BUTTON_GAP.to_pixels_f32();
    let rect = widget.rect();
    let inner = PxRect::new(
        rect.x + padding,
        rect.y + padding,
        rect.width - 2.0 * padding,
        rect.height - 2.0 * padding,
    );
    let centered = slots.iter().any(|s| s.kind() == ICON);
    let mut top = inner.top();
    for (i, slot) in slots.iter().enumerate() {
        if i > 0 {
            top -= if slot.kind() == BUTTONS { gap } else { spacing };
        }
        let mut size = slot.size.get();
        if matches!(slot.kind(), CONTENT | BUTTONS) {
            size.width = inner.width;
            slot.size.set(size);
        }
        let x = if centered && matches!(slot.kind(), ICON | HEADLINE) {
            inner.center().x - size.width / 2.0
        } else {
            inner.x
        };
        top -= size.height;
        slot.pos.set(PxPosition::new(x, top));
    }
}

fn fit(widget: &Widget) {
    let slots = ordered_slots(widget);
    let width = widget.size.get().width;
    if !widget.size.set(PxSize::new(width, content_height(&slots))) {
        layout(widget);
    }
}

/// A modal dialog.
#[derive(Clone)]
pub struct Dialog {
    widget: Widget,
    /// Dimming layer holding the container.
    pub scrim: Scrim,
    /// Open state and container features.
    pub state: Rc<DialogState>,
    ctx: BuildContext,
}

widget_wrapper!(Dialog);

impl Dialog {
    /// Creates a closed dialog from slot children.
    pub fn compose<I>(
        ctx: &BuildContext,
        args: DialogArgs,
        children: I,
    ) -> Result<Self, CompositionError>
    where
        I: IntoIterator,
        I::Item: Into<Widget>,
    {
        let widget = Widget::new("Dialog");
        let surface = Surface::attach(
            &widget,
            ctx,
            SurfaceArgs::new(Role::SurfaceContainerHigh)
                .shape(Shape::rounded(MaterialShapes::EXTRA_LARGE))
                .elevation(DialogDefaults::ELEVATION),
        );
        DIALOG_CHILDREN.add_children(&widget, children)?;
        let state = Rc::new(DialogState {
            auto_dismiss: Property::new("auto_dismiss", args.auto_dismiss),
            is_open: Property::new("is_open", false),
            on_open: Signal::new(),
            on_dismiss: Signal::new(),
            surface,
        });
        widget.attach_feature(state.clone());
        let min = DialogDefaults::MIN_WIDTH.0;
        let max = DialogDefaults::MAX_WIDTH.0;
        let width = Dp(args.width.0.clamp(min, max)).to_pixels_f32();
        widget.size.set(PxSize::new(width, 0.0));
        widget.pos_hint.set(PosHint::CENTER);
        on_geometry(&widget, layout);
        for slot in widget.children() {
            let target = widget.downgrade();
            slot.size.bind(move |_| {
                if let Some(widget) = target.upgrade() {
                    fit(&widget);
                }
            });
        }
        fit(&widget);

        let scrim = Scrim::new(ctx, &widget);
        let weak = Rc::downgrade(&state);
        let dismiss = ctx.clone();
        let target = scrim.downgrade();
        scrim.on_tap().connect(move |_| {
            if let (Some(state), Some(scrim)) = (weak.upgrade(), target.upgrade())
                && state.auto_dismiss.get()
            {
                close(&dismiss, &scrim, &state);
            }
        });
        Ok(Self {
            widget,
            scrim,
            state,
            ctx: ctx.clone(),
        })
    }

    /// Shows the dialog on the window of the build context.
    pub fn open(&self) {
        if self.state.is_open.get() {
            return;
        }
        if self.scrim.show(&self.ctx) {
            self.state.is_open.set(true);
            debug!("dialog opened");
            self.state.on_open.emit(&());
        }
    }

    /// Closes the dialog. Closing a closed dialog does nothing.
    pub fn dismiss(&self) {
        close(&self.ctx, &self.scrim, &self.state);
    }

    /// Slot child of `kind`.
    pub fn slot(&self, kind: &str) -> Option<Widget> {
        self.children().into_iter().find(|c| c.kind() == kind)
    }

    /// Non-owning handle, for callbacks stored inside the dialog.
    pub fn downgrade(&self) -> WeakDialog {
        WeakDialog {
            widget: self.widget.downgrade(),
            scrim: self.scrim.downgrade(),
            state: Rc::downgrade(&self.state),
            ctx: self.ctx.clone(),
        }
    }
}

/// Weak counterpart of [`Dialog`].
#[derive(Clone)]
pub struct WeakDialog {
    widget: WeakWidget,
    scrim: WeakScrim,
    state: Weak<DialogState>,
    ctx: BuildContext,
}

impl WeakDialog {
    /// Upgrades while the dialog is alive.
    pub fn upgrade(&self) -> Option<Dialog> {
        Some(Dialog {
            widget: self.widget.upgrade()?,
            scrim: self.scrim.upgrade()?,
            state: self.state.upgrade()?,
            ctx: self.ctx.clone(),
        })
    }
}

fn close(ctx: &BuildContext, scrim: &Scrim, state: &DialogState) {
    if !state.is_open.get() {
        return;
    }
    scrim.hide(ctx);
    state.is_open.set(false);
    debug!("dialog dismissed");
    state.on_dismiss.emit(&());
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use mdkit_ui::{TouchEvent, TouchPhase, Window};

    use super::*;
    use crate::{
        button::{Button, ButtonArgs, ButtonStyle},
        children,
    };

    fn tap(window: &Window, at: PxPosition) {
        let down = TouchEvent::new(7, at, TouchPhase::Down, 0.0);
        window.dispatch_touch(&down);
        window.dispatch_touch(&down.with(TouchPhase::Up, at, 0.1));
    }

    fn basic(ctx: &BuildContext, args: DialogArgs) -> Dialog {
        Dialog::compose(
            ctx,
            args,
            children![
                dialog_buttons(children![
                    Button::new(ctx, ButtonArgs::new(ButtonStyle::Text).text("Cancel")),
                    Button::new(ctx, ButtonArgs::new(ButtonStyle::Text).text("OK")),
                ]),
                dialog_headline(ctx, "Reset settings?"),
                dialog_icon(ctx, "alert"),
                dialog_supporting_text(ctx, "This will reset your device."),
            ],
        )
        .unwrap()
    }

    #[test]
    fn slots_stack_in_order_and_center_with_icon() {
        let window = Window::new(PxSize::new(800.0, 800.0));
        let ctx = BuildContext::new().with_window(window);
        let dialog = basic(&ctx, DialogArgs::default());
        dialog.open();
        assert_eq!(dialog.center(), PxPosition::new(400.0, 400.0));
        let icon = dialog.slot(ICON).unwrap();
        let headline = dialog.slot(HEADLINE).unwrap();
        let buttons = dialog.slot(BUTTONS).unwrap();
        assert!(icon.pos.get().y > headline.pos.get().y);
        assert!(headline.pos.get().y > buttons.pos.get().y);
        assert_eq!(icon.center().x, dialog.center().x);
        assert_eq!(buttons.pos.get().y, dialog.pos.get().y + 24.0);
        assert_eq!(dialog.size.get().width, 312.0);
        let last = buttons.children()[1].clone();
        assert_eq!(last.rect().right(), dialog.rect().right() - 24.0);
    }

    #[test]
    fn scrim_tap_respects_auto_dismiss() {
        let window = Window::new(PxSize::new(800.0, 800.0));
        let ctx = BuildContext::new().with_window(window.clone());
        let sticky = basic(&ctx, DialogArgs::default().auto_dismiss(false));
        sticky.open();
        tap(&window, PxPosition::new(5.0, 5.0));
        assert!(sticky.state.is_open.get());
        sticky.dismiss();
        assert!(!window.contains(&sticky.scrim));

        let dialog = basic(&ctx, DialogArgs::default());
        let dismissed = Rc::new(Cell::new(0));
        let d = dismissed.clone();
        dialog.state.on_dismiss.connect(move |_| d.set(d.get() + 1));
        dialog.open();
        tap(&window, dialog.center());
        assert!(dialog.state.is_open.get());
        tap(&window, PxPosition::new(5.0, 5.0));
        assert!(!dialog.state.is_open.get());
        dialog.dismiss();
        assert_eq!(dismissed.get(), 1);
    }

    #[test]
    fn unknown_slot_is_rejected() {
        let ctx = BuildContext::new();
        let err = Dialog::compose(&ctx, DialogArgs::default(), [Widget::new("Slider")]);
        assert!(matches!(err, Err(CompositionError::UnsupportedChildType { .. })));
    }
}
