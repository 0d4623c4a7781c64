//! Segmented buttons: a row of outlined segments with single or multiple
//! selection.
//!
//! ## Usage
//!
//! Compose [`SegmentedButtonItem`]s from an optional icon and a label, then
//! pass them to [`SegmentedButton::compose`]. A marked segment shows a check
//! instead of its icon. In single-select mode exactly one segment stays
//! marked once one was chosen; in multiselect mode every tap toggles.

use std::{cell::RefCell, rc::Rc};

use derive_setters::Setters;
use mdkit_ui::{Dp, Property, PxPosition, PxSize, Signal, Widget, WidgetFeature};
use tracing::debug;

use crate::{
    behaviors::{declarative::ChildPolicy, ripple::RippleArgs},
    context::BuildContext,
    error::CompositionError,
    font_styles::FontRole,
    label::{Icon, IconArgs, Label, LabelArgs, content_slot},
    layout::{Arrangement, CrossAxisAlignment, Padding, place_row, row_extent},
    role::Role,
    shape::{RoundedCorner, Shape},
    surface::{Interaction, Surface, SurfaceArgs, on_geometry, propagate_disabled},
};

/// Segmented button tokens.
pub struct SegmentedButtonDefaults;

impl SegmentedButtonDefaults {
    /// Segment height.
    pub const HEIGHT: Dp = Dp(40.0);
    /// Narrowest segment.
    pub const MIN_SEGMENT_WIDTH: Dp = Dp(48.0);
    /// Horizontal segment padding.
    pub const PADDING: Dp = Dp(12.0);
    /// Gap between icon and label.
    pub const SPACING: Dp = Dp(8.0);
    /// Icon size.
    pub const ICON_SIZE: Dp = Dp(18.0);
    /// Outline width.
    pub const OUTLINE_WIDTH: Dp = Dp(1.0);
    /// Icon of a marked segment.
    pub const SELECTED_ICON: &'static str = "check";
}

/// Kind of a segment.
pub const ITEM: &str = "SegmentedButtonItem";
/// Kind of a segment icon.
pub const ICON: &str = "SegmentButtonIcon";
/// Kind of a segment label.
pub const LABEL: &str = "SegmentButtonLabel";

/// Slots a segmented button accepts.
pub const SEGMENTED_BUTTON_CHILDREN: ChildPolicy = ChildPolicy::new("SegmentedButton", &[ITEM]);
/// Slots a segment accepts.
pub const SEGMENT_CHILDREN: ChildPolicy = ChildPolicy::new(ITEM, &[ICON, LABEL]);

/// Segment icon.
pub fn segment_button_icon(ctx: &BuildContext, icon: impl Into<String>) -> Icon {
    let icon = Icon::with_kind(ctx, ICON, IconArgs::new(icon).icon_color(Role::OnSurface));
    icon.core.font_size.set(SegmentedButtonDefaults::ICON_SIZE);
    icon
}

/// Segment label.
pub fn segment_button_label(ctx: &BuildContext, text: impl Into<String>) -> Label {
    Label::with_kind(
        ctx,
        LABEL,
        LabelArgs::new(text)
            .font_style("Label")
            .role(FontRole::Large)
            .text_color(Role::OnSurface),
    )
}

/// State of one segment.
#[derive(Debug)]
pub struct SegmentState {
    /// Whether the segment is marked.
    pub active: Property<bool>,
    /// Container features.
    pub surface: Surface,
    /// Interactive features.
    pub interaction: Interaction,
    swapped_icon: RefCell<Option<String>>,
    added_check: RefCell<Option<Widget>>,
    ctx: BuildContext,
}

impl WidgetFeature for SegmentState {
    fn name(&self) -> &'static str {
        "segmented_button_item"
    }
}

impl SegmentState {
    fn apply_active(&self, widget: &Widget, active: bool) {
        self.surface.background.md_bg_color.set_role(if active {
            Role::SecondaryContainer
        } else {
            Role::Transparent
        });
        let icon = widget
            .children()
            .into_iter()
            .find(|c| c.kind() == ICON && Some(c) != self.added_check.borrow().as_ref())
            .and_then(Icon::from_widget);
        if active {
            match icon {
                Some(icon) => {
                    let original = icon.core.icon.get();
                    if original != SegmentedButtonDefaults::SELECTED_ICON {
                        icon.core
                            .icon
                            .set(SegmentedButtonDefaults::SELECTED_ICON.to_owned());
                        *self.swapped_icon.borrow_mut() = Some(original);
                    }
                }
                None if self.added_check.borrow().is_none() => {
                    let check =
                        segment_button_icon(&self.ctx, SegmentedButtonDefaults::SELECTED_ICON);
                    widget.insert_widget(0, &check);
                    *self.added_check.borrow_mut() = Some(check.into());
                }
                None => {}
            }
        } else {
            if let Some(check) = self.added_check.borrow_mut().take() {
                check.destroy();
            }
            if let (Some(original), Some(icon)) = (self.swapped_icon.borrow_mut().take(), icon) {
                icon.core.icon.set(original);
            }
        }
        let content = if active {
            Role::OnSecondaryContainer
        } else {
            Role::OnSurface
        };
        for child in widget.children() {
            if let Some(slot) = content_slot(&child) {
                slot.set_role(content);
            }
        }
        layout_item(widget);
    }
}

fn item_arrangement() -> Arrangement {
    Arrangement::spaced(SegmentedButtonDefaults::SPACING)
        .cross(CrossAxisAlignment::Center)
        .padding(Padding::symmetric(SegmentedButtonDefaults::PADDING, Dp(0.0)))
}

fn content_of(widget: &Widget) -> Vec<Widget> {
    let children = widget.children();
    [ICON, LABEL]
        .iter()
        .flat_map(|kind| children.iter().filter(move |c| c.kind() == *kind).cloned())
        .collect()
}

/// Width the segment content needs.
fn natural_width(widget: &Widget) -> f32 {
    row_extent(&content_of(widget), &item_arrangement())
        .width
        .max(SegmentedButtonDefaults::MIN_SEGMENT_WIDTH.to_pixels_f32())
}

fn layout_item(widget: &Widget) {
    let rect = widget.rect();
    let content = content_of(widget);
    let width = row_extent(&content, &item_arrangement()).width;
    // Content is centered inside the segment.
    let inset = ((rect.width - width) / 2.0).max(0.0);
    let mut inner = rect;
    inner.x += inset;
    inner.width -= 2.0 * inset;
    place_row(inner, &content, &item_arrangement());
}

/// One segment.
#[derive(Clone)]
pub struct SegmentedButtonItem {
    widget: Widget,
    /// Selection and interaction state.
    pub state: Rc<SegmentState>,
}

widget_wrapper!(SegmentedButtonItem);

impl SegmentedButtonItem {
    /// Creates a segment from an icon and a label.
    pub fn compose<I>(ctx: &BuildContext, children: I) -> Result<Self, CompositionError>
    where
        I: IntoIterator,
        I::Item: Into<Widget>,
    {
        let widget = Widget::new(ITEM);
        let surface = Surface::attach(
            &widget,
            ctx,
            SurfaceArgs::new(Role::Transparent).outline((
                Role::Outline,
                SegmentedButtonDefaults::OUTLINE_WIDTH,
            )),
        );
        SEGMENT_CHILDREN.add_children(&widget, children)?;
        let interaction = Interaction::attach(
            &widget,
            ctx,
            &surface.themable,
            Role::OnSurface,
            RippleArgs::default(),
        );
        let state = Rc::new(SegmentState {
            active: Property::new("active", false),
            surface,
            interaction,
            swapped_icon: RefCell::new(None),
            added_check: RefCell::new(None),
            ctx: ctx.clone(),
        });
        widget.attach_feature(state.clone());
        widget.size.set(PxSize::new(
            natural_width(&widget),
            SegmentedButtonDefaults::HEIGHT.to_pixels_f32(),
        ));
        propagate_disabled(&widget);
        on_geometry(&widget, layout_item);
        layout_item(&widget);
        let target = widget.downgrade();
        let weak = Rc::downgrade(&state);
        state.active.bind(move |active| {
            if let (Some(widget), Some(state)) = (target.upgrade(), weak.upgrade()) {
                state.apply_active(&widget, *active);
            }
        });
        Ok(Self { widget, state })
    }

    /// Segment handle for a widget built by [`SegmentedButtonItem::compose`].
    pub fn from_widget(widget: Widget) -> Option<Self> {
        let state = widget.feature::<SegmentState>()?;
        Some(Self { widget, state })
    }

    /// Label text, or empty.
    pub fn text(&self) -> String {
        self.children()
            .into_iter()
            .find(|c| c.kind() == LABEL)
            .and_then(|c| Label::core_of(&c))
            .map(|core| core.text.get())
            .unwrap_or_default()
    }

    /// Name of the shown icon, if any.
    pub fn icon(&self) -> Option<String> {
        self.children()
            .into_iter()
            .find(|c| c.kind() == ICON)
            .and_then(Icon::from_widget)
            .map(|icon| icon.core.icon.get())
    }

    /// Whether the segment is marked.
    pub fn is_active(&self) -> bool {
        self.state.active.get()
    }
}

/// Arguments for [`SegmentedButton::compose`].
#[derive(Debug, Clone, Copy, PartialEq, Default, Setters)]
pub struct SegmentedButtonArgs {
    /// Allow several marked segments.
    pub multiselect: bool,
}

/// A marking change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentMarked {
    /// Position of the segment.
    pub index: usize,
    /// New state of the segment.
    pub active: bool,
}

/// Selection state of a segmented button.
#[derive(Debug)]
pub struct SegmentedButtonState {
    /// Allow several marked segments.
    pub multiselect: Property<bool>,
    /// Fired for every segment whose mark changed.
    pub on_marked: Signal<SegmentMarked>,
}

impl WidgetFeature for SegmentedButtonState {
    fn name(&self) -> &'static str {
        "segmented_button"
    }
}

fn segment_shape(index: usize, count: usize) -> Shape {
    let (round, sharp) = (RoundedCorner::Capsule, RoundedCorner::ZERO);
    match (index == 0, index + 1 == count) {
        (true, true) => Shape::CAPSULE,
        (true, false) => Shape::RoundedRectangle([round, sharp, sharp, round]),
        (false, true) => Shape::RoundedRectangle([sharp, round, round, sharp]),
        (false, false) => Shape::RECTANGLE,
    }
}

fn layout(widget: &Widget) {
    let rect = widget.rect();
    let items = widget.children();
    if items.is_empty() {
        return;
    }
    let width = rect.width / items.len() as f32;
    for (index, item) in items.iter().enumerate() {
        item.pos.set(PxPosition::new(rect.x + width * index as f32, rect.y));
        item.size.set(PxSize::new(width, rect.height));
    }
}

/// A row of segments.
#[derive(Clone)]
pub struct SegmentedButton {
    widget: Widget,
    /// Selection state.
    pub state: Rc<SegmentedButtonState>,
}

widget_wrapper!(SegmentedButton);

impl SegmentedButton {
    /// Creates the row; segments share the width of the widest one.
    pub fn compose<I>(args: SegmentedButtonArgs, items: I) -> Result<Self, CompositionError>
    where
        I: IntoIterator,
        I::Item: Into<Widget>,
    {
        let widget = Widget::new("SegmentedButton");
        let items = SEGMENTED_BUTTON_CHILDREN.add_children(&widget, items)?;
        let state = Rc::new(SegmentedButtonState {
            multiselect: Property::new("multiselect", args.multiselect),
            on_marked: Signal::new(),
        });
        widget.attach_feature(state.clone());
        let segment = items.iter().map(natural_width).fold(0.0, f32::max);
        widget.size.set(PxSize::new(
            segment * items.len() as f32,
            SegmentedButtonDefaults::HEIGHT.to_pixels_f32(),
        ));
        propagate_disabled(&widget);
        on_geometry(&widget, layout);
        layout(&widget);

        let button = Self { widget, state };
        let count = items.len();
        for (index, item) in items.iter().enumerate() {
            let Some(item) = SegmentedButtonItem::from_widget(item.clone()) else {
                continue;
            };
            item.state
                .surface
                .background
                .shape
                .set(segment_shape(index, count));
            let target = button.widget.downgrade();
            item.state.interaction.clickable.on_release.connect(move |_| {
                if let Some(button) = target.upgrade().and_then(SegmentedButton::from_widget) {
                    button.mark_item(index);
                }
            });
        }
        Ok(button)
    }

    /// Segmented button handle for a widget built by
    /// [`SegmentedButton::compose`].
    pub fn from_widget(widget: Widget) -> Option<Self> {
        let state = widget.feature::<SegmentedButtonState>()?;
        Some(Self { widget, state })
    }

    /// Segments in order.
    pub fn get_items(&self) -> Vec<SegmentedButtonItem> {
        self.children()
            .into_iter()
            .filter_map(SegmentedButtonItem::from_widget)
            .collect()
    }

    /// Marked segments in order.
    pub fn get_marked_items(&self) -> Vec<SegmentedButtonItem> {
        self.get_items()
            .into_iter()
            .filter(SegmentedButtonItem::is_active)
            .collect()
    }

    /// Applies a tap on segment `index`: toggles it in multiselect mode,
    /// makes it the only marked one otherwise.
    pub fn mark_item(&self, index: usize) {
        let items = self.get_items();
        let Some(item) = items.get(index) else {
            return;
        };
        if item.is_effectively_disabled() {
            return;
        }
        let mut changes = Vec::new();
        if self.state.multiselect.get() {
            let active = !item.is_active();
            item.state.active.set(active);
            changes.push(SegmentMarked { index, active });
        } else {
            if item.is_active() {
                return;
            }
            for (other, segment) in items.iter().enumerate() {
                if other != index && segment.state.active.set(false) {
                    changes.push(SegmentMarked {
                        index: other,
                        active: false,
                    });
                }
            }
            item.state.active.set(true);
            changes.push(SegmentMarked {
                index,
                active: true,
            });
        }
        debug!(index, ?changes, "segments marked");
        for change in &changes {
            self.state.on_marked.emit(change);
        }
    }
}

#[cfg(test)]
mod tests {
    use mdkit_ui::{TouchEvent, TouchPhase, Window};

    use super::*;
    use crate::children;

    fn segments(ctx: &BuildContext, args: SegmentedButtonArgs) -> SegmentedButton {
        let item = |icon: Option<&str>, text: &str| {
            let mut content = Vec::new();
            if let Some(icon) = icon {
                content.push(Widget::from(segment_button_icon(ctx, icon)));
            }
            content.push(segment_button_label(ctx, text).into());
            SegmentedButtonItem::compose(ctx, content).expect("segment children")
        };
        SegmentedButton::compose(
            args,
            children![
                item(None, "Day"),
                item(Some("calendar-week"), "Week"),
                item(None, "Month"),
            ],
        )
        .expect("segments")
    }

    #[test]
    fn single_select_keeps_one_marked() {
        let window = Window::new(PxSize::new(400.0, 200.0));
        let ctx = BuildContext::new().with_window(window.clone());
        let button = segments(&ctx, SegmentedButtonArgs::default());
        window.add_widget(&button);
        let items = button.get_items();
        let width = items[0].size.get().width;
        assert!(items.iter().all(|i| i.size.get().width == width));
        assert_eq!(button.size.get().height, 40.0);

        let at = items[1].center();
        let down = TouchEvent::new(1, at, TouchPhase::Down, 0.0);
        window.dispatch_touch(&down);
        window.dispatch_touch(&down.with(TouchPhase::Up, at, 0.05));
        assert_eq!(items[1].icon().as_deref(), Some("check"));
        button.mark_item(0);
        assert_eq!(button.get_marked_items().len(), 1);
        assert!(items[0].is_active());
        assert_eq!(items[1].icon().as_deref(), Some("calendar-week"));
        assert_eq!(items[0].icon().as_deref(), Some("check"));
        button.mark_item(0);
        assert!(items[0].is_active());
    }

    #[test]
    fn multiselect_toggles_and_reports_each_change() {
        let ctx = BuildContext::new();
        let button = segments(&ctx, SegmentedButtonArgs::default().multiselect(true));
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = seen.clone();
        button.state.on_marked.connect(move |m| s.borrow_mut().push(*m));
        button.mark_item(0);
        button.mark_item(2);
        button.mark_item(0);
        let marked: Vec<String> = button
            .get_marked_items()
            .iter()
            .map(SegmentedButtonItem::text)
            .collect();
        assert_eq!(marked, ["Month"]);
        assert_eq!(
            *seen.borrow(),
            [
                SegmentMarked { index: 0, active: true },
                SegmentMarked { index: 2, active: true },
                SegmentMarked { index: 0, active: false },
            ]
        );
        assert_eq!(button.get_items()[0].icon(), None);
    }

    #[test]
    fn outer_segments_are_rounded() {
        assert_eq!(segment_shape(0, 1), Shape::CAPSULE);
        assert_eq!(segment_shape(1, 3), Shape::RECTANGLE);
        let Shape::RoundedRectangle(corners) = segment_shape(2, 3) else {
            panic!("segments are rounded rectangles");
        };
        assert_eq!(corners[0], RoundedCorner::ZERO);
        assert_eq!(corners[1], RoundedCorner::Capsule);
    }
}
