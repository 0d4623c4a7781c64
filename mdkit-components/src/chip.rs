//! Chips: compact elements for input, attributes and actions.
//!
//! ## Usage
//!
//! Compose a chip from an optional leading icon or avatar, a text and an
//! optional trailing icon. Filter chips toggle `active` on tap and show a
//! check mark while active; input chips report taps on their trailing icon
//! through `on_remove`.

use std::{
    cell::RefCell,
    rc::{Rc, Weak},
};

use derive_setters::Setters;
use mdkit_ui::{
    Dp, Property, PxSize, Signal, TouchEvent, TouchPhase, TouchResponse, Widget, WidgetFeature,
};
use tracing::debug;

use crate::{
    behaviors::{declarative::ChildPolicy, ripple::RippleArgs},
    context::BuildContext,
    error::CompositionError,
    font_styles::FontRole,
    label::{Icon, IconArgs, Label, LabelArgs, content_slot},
    layout::{Arrangement, Padding, place_row, row_extent},
    role::Role,
    shape::Shape,
    surface::{Interaction, Surface, SurfaceArgs, on_geometry, propagate_disabled},
    theme::MaterialShapes,
};

/// Chip tokens.
pub struct ChipDefaults;

impl ChipDefaults {
    /// Container height.
    pub const HEIGHT: Dp = Dp(32.0);
    /// Corner radius.
    pub const RADIUS: Dp = MaterialShapes::SMALL;
    /// Edge padding next to text.
    pub const TEXT_PADDING: Dp = Dp(16.0);
    /// Edge padding next to an icon.
    pub const ICON_PADDING: Dp = Dp(8.0);
    /// Gap between content items.
    pub const SPACING: Dp = Dp(8.0);
    /// Icon edge.
    pub const ICON_SIZE: Dp = Dp(18.0);
    /// Avatar edge.
    pub const AVATAR_SIZE: Dp = Dp(24.0);
    /// Outline width.
    pub const OUTLINE_WIDTH: Dp = Dp(1.0);
    /// Elevation of elevated chips.
    pub const ELEVATION: u8 = 1;
    /// Check mark of an active filter chip.
    pub const SELECTED_ICON: &'static str = "check";
}

/// Kind of the leading icon.
pub const LEADING_ICON: &str = "ChipLeadingIcon";
/// Kind of the leading avatar.
pub const LEADING_AVATAR: &str = "ChipLeadingAvatar";
/// Kind of the text.
pub const TEXT: &str = "ChipText";
/// Kind of the trailing icon.
pub const TRAILING_ICON: &str = "ChipTrailingIcon";

/// Slots a chip accepts.
pub const CHIP_CHILDREN: ChildPolicy =
    ChildPolicy::new("Chip", &[LEADING_ICON, LEADING_AVATAR, TEXT, TRAILING_ICON]);

/// Chip types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChipType {
    /// Smart or automated action.
    #[default]
    Assist,
    /// Toggleable attribute.
    Filter,
    /// Piece of user input, removable.
    Input,
    /// Dynamically generated suggestion.
    Suggestion,
}

/// Leading icon.
pub fn chip_leading_icon(ctx: &BuildContext, icon: impl Into<String>) -> Icon {
    chip_icon(ctx, LEADING_ICON, icon)
}

/// Leading avatar image, drawn as a circular icon slot.
pub fn chip_leading_avatar(ctx: &BuildContext, icon: impl Into<String>) -> Icon {
    let avatar = Icon::with_kind(ctx, LEADING_AVATAR, IconArgs::new(icon));
    avatar.core.font_size.set(ChipDefaults::AVATAR_SIZE);
    avatar
}

/// Trailing icon.
pub fn chip_trailing_icon(ctx: &BuildContext, icon: impl Into<String>) -> Icon {
    chip_icon(ctx, TRAILING_ICON, icon)
}

fn chip_icon(ctx: &BuildContext, kind: &'static str, icon: impl Into<String>) -> Icon {
    let icon = Icon::with_kind(ctx, kind, IconArgs::new(icon));
    icon.core.font_size.set(ChipDefaults::ICON_SIZE);
    icon
}

/// Chip text.
pub fn chip_text(ctx: &BuildContext, text: impl Into<String>) -> Label {
    Label::with_kind(
        ctx,
        TEXT,
        LabelArgs::new(text)
            .font_style("Label")
            .role(FontRole::Large),
    )
}

/// Arguments for [`Chip::compose`].
#[derive(Debug, Clone, PartialEq, Default, Setters)]
pub struct ChipArgs {
    /// Chip type.
    pub chip_type: ChipType,
    /// Elevated container instead of an outline.
    pub elevated: bool,
    /// Initial state of a filter chip.
    pub active: bool,
    /// Initial disabled state.
    pub disabled: bool,
}

/// State shared by a chip and its observers.
#[derive(Debug)]
pub struct ChipState {
    /// Chip type.
    pub chip_type: ChipType,
    /// Whether a filter chip is selected.
    pub active: Property<bool>,
    /// Fired when the trailing icon of an input chip is tapped.
    pub on_remove: Signal<()>,
    /// Container features.
    pub surface: Surface,
    /// Interactive features.
    pub interaction: Interaction,
    elevated: bool,
    swapped_icon: RefCell<Option<String>>,
    added_check: RefCell<Option<Widget>>,
    ctx: BuildContext,
}

impl WidgetFeature for ChipState {
    fn name(&self) -> &'static str {
        "chip"
    }
}

impl ChipState {
    fn content_roles(&self, active: bool) -> (Role, Role) {
        match (self.chip_type, active) {
            (ChipType::Filter, true) => (Role::OnSecondaryContainer, Role::OnSecondaryContainer),
            (ChipType::Assist, _) => (Role::Primary, Role::OnSurface),
            _ => (Role::OnSurfaceVariant, Role::OnSurfaceVariant),
        }
    }

    fn apply_active(&self, widget: &Widget, active: bool) {
        let selected = self.chip_type == ChipType::Filter && active;
        let background = &self.surface.background;
        if selected {
            background.md_bg_color.set_role(Role::SecondaryContainer);
            background.line_width.set(0.0);
        } else if self.elevated {
            background.md_bg_color.set_role(Role::SurfaceContainerLow);
            background.line_width.set(0.0);
        } else {
            background.md_bg_color.set_role(Role::Transparent);
            background
                .line_width
                .set(ChipDefaults::OUTLINE_WIDTH.to_pixels_f32());
        }
        if self.chip_type == ChipType::Filter {
            self.sync_check(widget, active);
        }
        let (icon_role, text_role) = self.content_roles(active);
        for child in widget.children() {
            let role = if child.kind() == TEXT { text_role } else { icon_role };
            if child.kind() != LEADING_AVATAR
                && let Some(slot) = content_slot(&child)
            {
                slot.set_role(role);
            }
        }
        layout(widget);
    }

    fn sync_check(&self, widget: &Widget, active: bool) {
        let leading = widget
            .children()
            .into_iter()
            .find(|c| c.kind() == LEADING_ICON)
            .and_then(Icon::from_widget);
        if active {
            match leading {
                Some(icon) if self.added_check.borrow().is_none() => {
                    let original = icon.core.icon.get();
                    if original != ChipDefaults::SELECTED_ICON {
                        icon.core.icon.set(ChipDefaults::SELECTED_ICON.to_owned());
                        *self.swapped_icon.borrow_mut() = Some(original);
                    }
                }
                Some(_) => {}
                None => {
                    let check = chip_leading_icon(&self.ctx, ChipDefaults::SELECTED_ICON);
                    widget.insert_widget(0, &check);
                    *self.added_check.borrow_mut() = Some(check.into());
                }
            }
        } else {
            if let Some(check) = self.added_check.borrow_mut().take() {
                check.destroy();
            }
            if let (Some(original), Some(icon)) = (self.swapped_icon.borrow_mut().take(), leading)
            {
                icon.core.icon.set(original);
            }
        }
    }
}

fn layout(widget: &Widget) {
    let children = widget.children();
    let order = [LEADING_AVATAR, LEADING_ICON, TEXT, TRAILING_ICON];
    let ordered: Vec<Widget> = order
        .iter()
        .flat_map(|kind| children.iter().filter(move |c| c.kind() == *kind).cloned())
        .collect();
    let leading = ordered
        .first()
        .is_some_and(|c| c.kind() != TEXT && c.kind() != TRAILING_ICON);
    let trailing = ordered.last().is_some_and(|c| c.kind() == TRAILING_ICON);
    let edge = |icon: bool| {
        if icon {
            ChipDefaults::ICON_PADDING
        } else {
            ChipDefaults::TEXT_PADDING
        }
    };
    let arrangement = Arrangement::spaced(ChipDefaults::SPACING).padding(Padding {
        left: edge(leading),
        top: Dp(0.0),
        right: edge(trailing),
        bottom: Dp(0.0),
    });
    let width = row_extent(&ordered, &arrangement).width;
    let size = PxSize::new(width, ChipDefaults::HEIGHT.to_pixels_f32());
    if widget.size.get() != size {
        // Resizing re-enters through the geometry observer.
        widget.size.set(size);
        return;
    }
    place_row(widget.rect(), &ordered, &arrangement);
}

/// Routes taps on an input chip's trailing icon to `on_remove`.
struct RemoveTap {
    chip: Weak<ChipState>,
}

impl WidgetFeature for RemoveTap {
    fn name(&self) -> &'static str {
        "chip_remove"
    }

    fn on_touch(&self, widget: &Widget, touch: &TouchEvent) -> TouchResponse {
        match touch.phase {
            TouchPhase::Down => TouchResponse::Grab,
            TouchPhase::Up => {
                if widget.collide_point(touch.pos)
                    && let Some(chip) = self.chip.upgrade()
                {
                    debug!("input chip remove tapped");
                    chip.on_remove.emit(&());
                }
                TouchResponse::Consumed
            }
            _ => TouchResponse::Consumed,
        }
    }
}

/// A chip.
#[derive(Clone)]
pub struct Chip {
    widget: Widget,
    /// Selection and surface state.
    pub state: Rc<ChipState>,
}

widget_wrapper!(Chip);

impl Chip {
    /// Creates a chip from leading, text and trailing children.
    pub fn compose<I>(
        ctx: &BuildContext,
        args: ChipArgs,
        children: I,
    ) -> Result<Self, CompositionError>
    where
        I: IntoIterator,
        I::Item: Into<Widget>,
    {
        let widget = Widget::new("Chip");
        let elevated = args.elevated
            && matches!(args.chip_type, ChipType::Assist | ChipType::Suggestion);
        let mut surface_args = SurfaceArgs::new(Role::Transparent)
            .shape(Shape::rounded(ChipDefaults::RADIUS))
            .outline((Role::Outline, ChipDefaults::OUTLINE_WIDTH));
        if elevated {
            surface_args = surface_args.elevation(ChipDefaults::ELEVATION);
        }
        let surface = Surface::attach(&widget, ctx, surface_args);
        CHIP_CHILDREN.add_children(&widget, children)?;
        let interaction = Interaction::attach(
            &widget,
            ctx,
            &surface.themable,
            Role::OnSurfaceVariant,
            RippleArgs::default(),
        );
        let state = Rc::new(ChipState {
            chip_type: args.chip_type,
            active: Property::new("active", args.active),
            on_remove: Signal::new(),
            surface,
            interaction,
            elevated,
            swapped_icon: RefCell::new(None),
            added_check: RefCell::new(None),
            ctx: ctx.clone(),
        });
        widget.attach_feature(state.clone());
        if args.chip_type == ChipType::Input {
            for trailing in widget.children().iter().filter(|c| c.kind() == TRAILING_ICON) {
                trailing.attach_feature(Rc::new(RemoveTap {
                    chip: Rc::downgrade(&state),
                }));
            }
        }
        propagate_disabled(&widget);
        on_geometry(&widget, layout);
        state.apply_active(&widget, args.active);

        let target = widget.downgrade();
        let weak = Rc::downgrade(&state);
        state.active.bind(move |active| {
            if let (Some(widget), Some(state)) = (target.upgrade(), weak.upgrade()) {
                state.apply_active(&widget, *active);
            }
        });
        if args.chip_type == ChipType::Filter {
            let weak = Rc::downgrade(&state);
            state.interaction.clickable.on_release.connect(move |_| {
                if let Some(state) = weak.upgrade() {
                    state.active.update(|active| *active = !*active);
                }
            });
        }
        widget.disabled.set(args.disabled);
        Ok(Self { widget, state })
    }

    /// Text of the chip, or empty.
    pub fn text(&self) -> String {
        self.children()
            .iter()
            .find(|c| c.kind() == TEXT)
            .and_then(Label::core_of)
            .map(|core| core.text.get())
            .unwrap_or_default()
    }

    /// Name of the leading icon, if any.
    pub fn leading_icon(&self) -> Option<String> {
        self.children()
            .into_iter()
            .find(|c| c.kind() == LEADING_ICON)
            .and_then(Icon::from_widget)
            .map(|icon| icon.core.icon.get())
    }

    /// Fired when a press is released over the chip.
    pub fn on_release(&self) -> &Signal<()> {
        &self.state.interaction.clickable.on_release
    }

    /// Fired when the trailing icon of an input chip is tapped.
    pub fn on_remove(&self) -> &Signal<()> {
        &self.state.on_remove
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use mdkit_ui::{PxPosition, Window};

    use super::*;
    use crate::children;

    fn tap(window: &Window, at: PxPosition) {
        let down = TouchEvent::new(1, at, TouchPhase::Down, 0.0);
        window.dispatch_touch(&down);
        window.dispatch_touch(&down.with(TouchPhase::Up, at, 0.05));
    }

    #[test]
    fn filter_chip_toggles_and_shows_a_check() {
        let ctx = BuildContext::new();
        let window = Window::new(PxSize::new(400.0, 200.0));
        let chip = Chip::compose(
            &ctx,
            ChipArgs::default().chip_type(ChipType::Filter),
            children![chip_text(&ctx, "Vegan")],
        )
        .expect("chip children");
        window.add_widget(&chip);
        assert_eq!(chip.size.get().height, 32.0);
        let plain_width = chip.size.get().width;
        assert_eq!(chip.leading_icon(), None);

        tap(&window, chip.center());
        assert!(chip.state.active.get());
        assert_eq!(chip.leading_icon().as_deref(), Some("check"));
        assert_eq!(
            chip.state.surface.background.md_bg_color.get(),
            ctx.theme.color(Role::SecondaryContainer)
        );
        // 16 padding on the text side becomes 8 + 18 icon + 8 gap.
        assert_eq!(chip.size.get().width, plain_width - 16.0 + 8.0 + 18.0 + 8.0);

        tap(&window, chip.center());
        assert!(!chip.state.active.get());
        assert_eq!(chip.leading_icon(), None);
        assert_eq!(chip.size.get().width, plain_width);
    }

    #[test]
    fn filter_chip_swaps_an_existing_leading_icon() {
        let ctx = BuildContext::new();
        let chip = Chip::compose(
            &ctx,
            ChipArgs::default().chip_type(ChipType::Filter),
            children![chip_leading_icon(&ctx, "leaf"), chip_text(&ctx, "Vegan")],
        )
        .expect("chip children");
        chip.state.active.set(true);
        assert_eq!(chip.leading_icon().as_deref(), Some("check"));
        chip.state.active.set(false);
        assert_eq!(chip.leading_icon().as_deref(), Some("leaf"));
    }

    #[test]
    fn input_chip_reports_removal_from_its_trailing_icon() {
        let ctx = BuildContext::new();
        let window = Window::new(PxSize::new(400.0, 200.0));
        let chip = Chip::compose(
            &ctx,
            ChipArgs::default().chip_type(ChipType::Input),
            children![chip_text(&ctx, "Ada"), chip_trailing_icon(&ctx, "close")],
        )
        .expect("chip children");
        window.add_widget(&chip);
        let removed = Rc::new(Cell::new(0));
        let released = Rc::new(Cell::new(0));
        let (r, c) = (removed.clone(), released.clone());
        chip.on_remove().connect(move |_| r.set(r.get() + 1));
        chip.on_release().connect(move |_| c.set(c.get() + 1));

        let trailing = chip
            .children()
            .into_iter()
            .find(|c| c.kind() == TRAILING_ICON)
            .expect("trailing icon");
        tap(&window, trailing.center());
        assert_eq!(removed.get(), 1);
        assert_eq!(released.get(), 0);
        assert_eq!(trailing.rect().right(), chip.rect().right() - 8.0);
    }

    #[test]
    fn elevated_assist_chip_has_no_outline() {
        let ctx = BuildContext::new();
        let chip = Chip::compose(
            &ctx,
            ChipArgs::default().elevated(true),
            children![chip_leading_icon(&ctx, "calendar"), chip_text(&ctx, "Plan")],
        )
        .expect("chip children");
        assert!(chip.state.surface.elevation.is_some());
        assert_eq!(chip.state.surface.background.line_width.get(), 0.0);
        let icon = chip.children()[0].clone();
        assert_eq!(
            content_slot(&icon).map(|s| s.get()),
            Some(ctx.theme.color(Role::Primary))
        );
    }
}
