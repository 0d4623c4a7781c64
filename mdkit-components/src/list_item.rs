//! List items with up to three lines of text and optional leading and
//! trailing content.
//!
//! ## Usage
//!
//! Build rows of a list. The container height follows the number of text
//! lines present: 56, 72 or 88 dp.

use std::rc::Rc;

use derive_setters::Setters;
use mdkit_ui::{Dp, Property, PxPosition, PxRect, PxSize, Signal, Widget, WidgetFeature};

use crate::{
    behaviors::{declarative::ChildPolicy, ripple::RippleArgs, themable::ThemedColor},
    checkbox::{Checkbox, CheckboxArgs},
    context::BuildContext,
    error::CompositionError,
    font_styles::FontRole,
    label::{Icon, IconArgs, Label, LabelArgs, content_slot},
    layout::{Arrangement, CrossAxisAlignment, place_column},
    role::Role,
    shape::Shape,
    surface::{Interaction, Surface, SurfaceArgs, on_geometry, propagate_disabled},
};

/// Default tokens for list items.
pub struct ListItemDefaults;

impl ListItemDefaults {
    /// Height of a one-line item.
    pub const MIN_HEIGHT_ONE_LINE: Dp = Dp(56.0);
    /// Height of a two-line item.
    pub const MIN_HEIGHT_TWO_LINE: Dp = Dp(72.0);
    /// Height of a three-line item.
    pub const MIN_HEIGHT_THREE_LINE: Dp = Dp(88.0);
    /// Edge of a leading avatar.
    pub const AVATAR_SIZE: Dp = Dp(40.0);
    /// Spacing between leading/trailing slots and the text column.
    pub const INTERNAL_SPACING: Dp = Dp(16.0);
    /// Horizontal padding of the container.
    pub const HORIZONTAL_PADDING: Dp = Dp(16.0);
    /// Default width of a list item.
    pub const WIDTH: Dp = Dp(360.0);

    /// Height for `lines` lines of text.
    pub fn height(lines: usize) -> Dp {
        match lines {
            0 | 1 => Self::MIN_HEIGHT_ONE_LINE,
            2 => Self::MIN_HEIGHT_TWO_LINE,
            _ => Self::MIN_HEIGHT_THREE_LINE,
        }
    }
}

/// Kind of the first text line.
pub const HEADLINE: &str = "ListItemHeadlineText";
/// Kind of the second text line.
pub const SUPPORTING: &str = "ListItemSupportingText";
/// Kind of the third text line.
pub const TERTIARY: &str = "ListItemTertiaryText";
/// Kind of a leading icon.
pub const LEADING_ICON: &str = "ListItemLeadingIcon";
/// Kind of a leading avatar.
pub const LEADING_AVATAR: &str = "ListItemLeadingAvatar";
/// Kind of a trailing icon.
pub const TRAILING_ICON: &str = "ListItemTrailingIcon";
/// Kind of a trailing checkbox.
pub const TRAILING_CHECKBOX: &str = "ListItemTrailingCheckbox";
/// Kind of trailing text.
pub const TRAILING_TEXT: &str = "ListItemTrailingSupportingText";

/// Child kinds a list item accepts.
pub const LIST_ITEM_CHILDREN: ChildPolicy = ChildPolicy::new(
    "ListItem",
    &[
        HEADLINE,
        SUPPORTING,
        TERTIARY,
        LEADING_ICON,
        LEADING_AVATAR,
        TRAILING_ICON,
        TRAILING_CHECKBOX,
        TRAILING_TEXT,
    ],
);

const TEXT_KINDS: [&str; 3] = [HEADLINE, SUPPORTING, TERTIARY];

fn is_leading(kind: &str) -> bool {
    kind == LEADING_ICON || kind == LEADING_AVATAR
}

fn is_trailing(kind: &str) -> bool {
    kind == TRAILING_ICON || kind == TRAILING_CHECKBOX || kind == TRAILING_TEXT
}

/// Headline line.
pub fn headline_text(ctx: &BuildContext, text: impl Into<String>) -> Label {
    Label::with_kind(
        ctx,
        HEADLINE,
        LabelArgs::new(text).role(FontRole::Large).text_color(Role::OnSurface),
    )
}

/// Supporting line.
pub fn supporting_text(ctx: &BuildContext, text: impl Into<String>) -> Label {
    Label::with_kind(
        ctx,
        SUPPORTING,
        LabelArgs::new(text)
            .role(FontRole::Medium)
            .text_color(Role::OnSurfaceVariant),
    )
}

/// Tertiary line.
pub fn tertiary_text(ctx: &BuildContext, text: impl Into<String>) -> Label {
    Label::with_kind(
        ctx,
        TERTIARY,
        LabelArgs::new(text)
            .role(FontRole::Medium)
            .text_color(Role::OnSurfaceVariant),
    )
}

/// Leading icon.
pub fn leading_icon(ctx: &BuildContext, icon: impl Into<String>) -> Icon {
    Icon::with_kind(ctx, LEADING_ICON, IconArgs::new(icon))
}

/// Trailing icon.
pub fn trailing_icon(ctx: &BuildContext, icon: impl Into<String>) -> Icon {
    Icon::with_kind(ctx, TRAILING_ICON, IconArgs::new(icon))
}

/// Trailing text, e.g. a count.
pub fn trailing_text(ctx: &BuildContext, text: impl Into<String>) -> Label {
    Label::with_kind(
        ctx,
        TRAILING_TEXT,
        LabelArgs::new(text)
            .font_style("Label")
            .role(FontRole::Small)
            .text_color(Role::OnSurfaceVariant),
    )
}

/// Trailing checkbox.
pub fn trailing_checkbox(ctx: &BuildContext) -> Checkbox {
    Checkbox::with_kind(ctx, TRAILING_CHECKBOX, CheckboxArgs::default())
}

/// Image source of an avatar.
#[derive(Debug)]
pub struct AvatarSource {
    /// Path or URI of the picture.
    pub source: Property<String>,
}

impl WidgetFeature for AvatarSource {
    fn name(&self) -> &'static str {
        "avatar"
    }
}

/// Leading circular avatar showing `source`.
pub fn leading_avatar(ctx: &BuildContext, source: impl Into<String>) -> Widget {
    let widget = Widget::new(LEADING_AVATAR);
    Surface::attach(
        &widget,
        ctx,
        SurfaceArgs::new(Role::SurfaceVariant).shape(Shape::Ellipse),
    );
    widget.attach_feature(Rc::new(AvatarSource {
        source: Property::new("source", source.into()),
    }));
    widget.size.set(PxSize::square_dp(ListItemDefaults::AVATAR_SIZE));
    widget
}

/// Arguments for [`ListItem::new`].
#[derive(Debug, Clone, PartialEq, Default, Setters)]
#[setters(strip_option, into)]
pub struct ListItemArgs {
    /// First line.
    pub headline: Option<String>,
    /// Second line.
    pub supporting: Option<String>,
    /// Third line.
    pub tertiary: Option<String>,
    /// Leading icon name.
    pub leading_icon: Option<String>,
    /// Trailing icon name.
    pub trailing_icon: Option<String>,
    /// Trailing text.
    pub trailing_text: Option<String>,
}

/// State shared by a list item and its observers.
#[derive(Debug)]
pub struct ListItemState {
    /// Whether the item is highlighted as selected.
    pub selected: Property<bool>,
    /// Container features.
    pub surface: Surface,
    /// Interactive features.
    pub interaction: Interaction,
}

impl WidgetFeature for ListItemState {
    fn name(&self) -> &'static str {
        "list_item"
    }
}

fn text_lines(widget: &Widget) -> Vec<Widget> {
    let mut lines: Vec<Widget> = widget
        .children()
        .into_iter()
        .filter(|c| TEXT_KINDS.contains(&c.kind()))
        .collect();
    lines.sort_by_key(|c| TEXT_KINDS.iter().position(|k| *k == c.kind()));
    lines
}

fn layout(widget: &Widget) {
    let rect = widget.rect();
    let padding = ListItemDefaults::HORIZONTAL_PADDING.to_pixels_f32();
    let spacing = ListItemDefaults::INTERNAL_SPACING.to_pixels_f32();
    let mut left = rect.x + padding;
    let mut right = rect.right() - padding;
    let mid = rect.center().y;
    for child in widget.children() {
        let size = child.size.get();
        if is_leading(child.kind()) {
            child.pos.set(PxPosition::new(left, mid - size.height / 2.0));
            left += size.width + spacing;
        } else if is_trailing(child.kind()) {
            right -= size.width;
            child.pos.set(PxPosition::new(right, mid - size.height / 2.0));
            right -= spacing;
        }
    }
    let lines = text_lines(widget);
    let height: f32 = lines.iter().map(|l| l.size.get().height).sum();
    let column = PxRect::new(
        left,
        mid - height / 2.0,
        (right - left).max(0.0),
        height,
    );
    place_column(
        column,
        &lines,
        &Arrangement::default().cross(CrossAxisAlignment::Start),
    );
}

fn fit_height(widget: &Widget) {
    let lines = text_lines(widget).len();
    let height = ListItemDefaults::height(lines).to_pixels_f32();
    let size = widget.size.get();
    if !widget.size.set(PxSize::new(size.width, height)) {
        layout(widget);
    }
}

/// One row of a list.
#[derive(Clone)]
pub struct ListItem {
    widget: Widget,
    /// Selection and interaction features.
    pub state: Rc<ListItemState>,
}

widget_wrapper!(ListItem);

impl ListItem {
    /// Creates a list item from text and icon names.
    pub fn new(ctx: &BuildContext, args: ListItemArgs) -> Self {
        let mut children: Vec<Widget> = Vec::new();
        if let Some(icon) = args.leading_icon {
            children.push(leading_icon(ctx, icon).into());
        }
        if let Some(text) = args.headline {
            children.push(headline_text(ctx, text).into());
        }
        if let Some(text) = args.supporting {
            children.push(supporting_text(ctx, text).into());
        }
        if let Some(text) = args.tertiary {
            children.push(tertiary_text(ctx, text).into());
        }
        if let Some(text) = args.trailing_text {
            children.push(trailing_text(ctx, text).into());
        }
        if let Some(icon) = args.trailing_icon {
            children.push(trailing_icon(ctx, icon).into());
        }
        let item = Self::build(ctx);
        for child in &children {
            item.attach(child);
        }
        fit_height(&item.widget);
        item
    }

    /// Creates a list item from explicit slot children.
    pub fn compose<I>(ctx: &BuildContext, children: I) -> Result<Self, CompositionError>
    where
        I: IntoIterator,
        I::Item: Into<Widget>,
    {
        let children: Vec<Widget> = children.into_iter().map(Into::into).collect();
        for child in &children {
            LIST_ITEM_CHILDREN.check(child)?;
        }
        let item = Self::build(ctx);
        for child in &children {
            item.attach(child);
        }
        fit_height(&item.widget);
        Ok(item)
    }

    /// Adds one more slot child.
    pub fn add_slot(&self, child: impl Into<Widget>) -> Result<(), CompositionError> {
        let child = child.into();
        LIST_ITEM_CHILDREN.check(&child)?;
        self.attach(&child);
        fit_height(&self.widget);
        Ok(())
    }

    fn build(ctx: &BuildContext) -> Self {
        let widget = Widget::new("ListItem");
        let surface = Surface::attach(&widget, ctx, SurfaceArgs::new(Role::Surface));
        let interaction = Interaction::attach(
            &widget,
            ctx,
            &surface.themable,
            Role::OnSurface,
            RippleArgs::default(),
        );
        let state = Rc::new(ListItemState {
            selected: Property::new("selected", false),
            surface,
            interaction,
        });
        widget.attach_feature(state.clone());
        widget.size.set(PxSize::from_dp(
            ListItemDefaults::WIDTH,
            ListItemDefaults::MIN_HEIGHT_ONE_LINE,
        ));
        propagate_disabled(&widget);
        on_geometry(&widget, layout);

        let target = widget.downgrade();
        state.selected.bind(move |selected| {
            if let Some(widget) = target.upgrade() {
                apply_selection(&widget, *selected);
            }
        });
        Self { widget, state }
    }

    fn attach(&self, child: &Widget) {
        self.widget.add_widget(child);
        child.disabled.set(self.disabled.get());
        if self.state.selected.get() {
            apply_selection(&self.widget, true);
        }
        let target = self.widget.downgrade();
        child.size.bind(move |_| {
            if let Some(widget) = target.upgrade() {
                layout(&widget);
            }
        });
    }

    /// Number of text lines present.
    pub fn line_count(&self) -> usize {
        text_lines(&self.widget).len()
    }

    /// Text of the line of `kind`, if present.
    pub fn line_text(&self, kind: &str) -> Option<String> {
        self.children()
            .into_iter()
            .find(|c| c.kind() == kind)
            .and_then(|c| Label::core_of(&c))
            .map(|core| core.text.get())
    }

    /// Fired when a press is released over the item.
    pub fn on_release(&self) -> &Signal<()> {
        &self.state.interaction.clickable.on_release
    }
}

fn default_role(kind: &str) -> Role {
    match kind {
        HEADLINE => Role::OnSurface,
        _ => Role::OnSurfaceVariant,
    }
}

fn apply_selection(widget: &Widget, selected: bool) {
    let Some(state) = widget.feature::<ListItemState>() else {
        return;
    };
    let container = if selected {
        Role::SecondaryContainer
    } else {
        Role::Surface
    };
    state.surface.background.md_bg_color.set_role(container);
    for child in widget.children() {
        let slot: Option<Rc<ThemedColor>> = content_slot(&child);
        if let Some(slot) = slot {
            let role = if selected {
                Role::OnSecondaryContainer
            } else {
                default_role(child.kind())
            };
            slot.set_role(role);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::children;

    #[test]
    fn height_follows_line_count() {
        let ctx = BuildContext::new();
        let one = ListItem::new(&ctx, ListItemArgs::default().headline("One"));
        assert_eq!(one.size.get().height, 56.0);
        let two = ListItem::new(&ctx, ListItemArgs::default().headline("One").supporting("Two"));
        assert_eq!(two.size.get().height, 72.0);
        let three = ListItem::new(
            &ctx,
            ListItemArgs::default()
                .headline("One")
                .supporting("Two")
                .tertiary("Three"),
        );
        assert_eq!(three.size.get().height, 88.0);
        assert_eq!(three.line_count(), 3);

        two.add_slot(tertiary_text(&ctx, "Late")).unwrap();
        assert_eq!(two.size.get().height, 88.0);
    }

    #[test]
    fn slots_sit_left_middle_right() {
        let ctx = BuildContext::new();
        let item = ListItem::compose(
            &ctx,
            children![
                leading_avatar(&ctx, "avatar.png"),
                headline_text(&ctx, "Ada"),
                trailing_icon(&ctx, "chevron-right"),
            ],
        )
        .unwrap();
        let kids = item.children();
        assert_eq!(kids[0].pos.get().x, 16.0);
        assert_eq!(kids[1].pos.get().x, 16.0 + 40.0 + 16.0);
        assert_eq!(kids[2].rect().right(), 360.0 - 16.0);
        assert_eq!(kids[1].center().y, item.center().y);
    }

    #[test]
    fn rejects_unknown_slots() {
        let ctx = BuildContext::new();
        let err = ListItem::compose(&ctx, children![Label::new(&ctx, LabelArgs::new("x"))]);
        assert!(matches!(err, Err(CompositionError::UnsupportedChildType { .. })));
    }

    #[test]
    fn selection_recolors_container_and_text() {
        let ctx = BuildContext::new();
        let item = ListItem::new(&ctx, ListItemArgs::default().headline("One").supporting("Two"));
        item.state.selected.set(true);
        assert_eq!(
            item.state.surface.background.md_bg_color.get(),
            ctx.theme.color(Role::SecondaryContainer)
        );
        let supporting = Label::core_of(&item.children()[1]).unwrap();
        assert_eq!(supporting.text_color.get(), ctx.theme.color(Role::OnSecondaryContainer));
        item.state.selected.set(false);
        assert_eq!(supporting.text_color.get(), ctx.theme.color(Role::OnSurfaceVariant));
    }
}
