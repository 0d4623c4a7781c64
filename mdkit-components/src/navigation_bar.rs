//! Bottom navigation bars and the destination items they share with
//! navigation rails.
//!
//! ## Usage
//!
//! Switch between three to five top-level destinations. The active item
//! shows a pill indicator behind its icon; `on_switch_tabs` reports every
//! change of destination.

use std::{cell::RefCell, rc::Rc};

use derive_setters::Setters;
use mdkit_ui::{Dp, Property, PxPosition, PxSize, Signal, Widget, WidgetFeature};
use tracing::debug;

use crate::{
    behaviors::{declarative::ChildPolicy, ripple::RippleArgs},
    context::BuildContext,
    error::CompositionError,
    font_styles::FontRole,
    label::{Icon, IconArgs, Label, LabelArgs},
    role::Role,
    shape::Shape,
    surface::{Interaction, Surface, SurfaceArgs, on_geometry, propagate_disabled},
};

/// Navigation bar tokens.
pub struct NavigationBarDefaults;

impl NavigationBarDefaults {
    /// Bar height.
    pub const HEIGHT: Dp = Dp(80.0);
    /// Default bar width.
    pub const WIDTH: Dp = Dp(360.0);
    /// Active indicator width in a bar.
    pub const INDICATOR_WIDTH: Dp = Dp(64.0);
    /// Active indicator height.
    pub const INDICATOR_HEIGHT: Dp = Dp(32.0);
    /// Gap above the indicator.
    pub const TOP_PADDING: Dp = Dp(12.0);
    /// Gap between indicator and label.
    pub const LABEL_SPACING: Dp = Dp(4.0);
    /// Bar elevation.
    pub const ELEVATION: u8 = 2;
}

/// Kind of a destination item.
pub const ITEM: &str = "NavigationItem";
/// Kind of the active indicator inside an item.
pub const ITEM_INDICATOR: &str = "NavigationItemIndicator";
/// Kind of the item icon.
pub const ITEM_ICON: &str = "NavigationItemIcon";
/// Kind of the item label.
pub const ITEM_LABEL: &str = "NavigationItemLabel";

/// Slots a navigation bar accepts.
pub const NAVIGATION_BAR_CHILDREN: ChildPolicy = ChildPolicy::new("NavigationBar", &[ITEM]);

/// Payload of `on_switch_tabs`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabSwitch {
    /// Position of the new destination.
    pub index: usize,
    /// Label of the new destination.
    pub text: String,
}

/// Exclusive selection over a list of destinations.
#[derive(Debug)]
pub struct NavigationSelection {
    /// Index of the active destination.
    pub active: Property<Option<usize>>,
    /// Fired after the active destination changed.
    pub on_switch_tabs: Signal<TabSwitch>,
    entries: RefCell<Vec<(Property<bool>, String)>>,
}

impl Default for NavigationSelection {
    fn default() -> Self {
        Self {
            active: Property::new("active", None),
            on_switch_tabs: Signal::new(),
            entries: RefCell::new(Vec::new()),
        }
    }
}

impl NavigationSelection {
    /// Registers a destination whose `active` flag follows the selection.
    /// A destination added active becomes the selection.
    pub fn push(self: &Rc<Self>, active: &Property<bool>, text: String) -> usize {
        let index = {
            let mut entries = self.entries.borrow_mut();
            entries.push((active.clone(), text));
            entries.len() - 1
        };
        if active.get() {
            self.select(index);
        }
        let weak = Rc::downgrade(self);
        active.bind(move |on| {
            if let Some(selection) = weak.upgrade()
                && *on
            {
                selection.select(index);
            }
        });
        index
    }

    /// Makes `index` the active destination. Returns `false` when out of
    /// range; selecting the active destination does nothing.
    pub fn select(&self, index: usize) -> bool {
        let entries: Vec<(Property<bool>, String)> = self.entries.borrow().clone();
        let Some((_, text)) = entries.get(index) else {
            return false;
        };
        if self.active.get() == Some(index) {
            return true;
        }
        self.active.set(Some(index));
        for (i, (flag, _)) in entries.iter().enumerate() {
            flag.set(i == index);
        }
        debug!(index, text = %text, "navigation destination switched");
        self.on_switch_tabs.emit(&TabSwitch {
            index,
            text: text.clone(),
        });
        true
    }

    /// Number of destinations.
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    /// Whether no destination is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

/// Arguments for [`NavigationItem::new`].
#[derive(Debug, Clone, PartialEq, Setters)]
pub struct NavigationItemArgs {
    /// Icon name.
    #[setters(into)]
    pub icon: String,
    /// Label text.
    #[setters(strip_option, into)]
    pub text: Option<String>,
    /// Badge content; empty for a dot.
    #[setters(strip_option, into)]
    pub badge_icon: Option<String>,
    /// Start as the active destination.
    pub active: bool,
}

impl NavigationItemArgs {
    /// Item showing `icon`.
    pub fn new(icon: impl Into<String>) -> Self {
        Self {
            icon: icon.into(),
            text: None,
            badge_icon: None,
            active: false,
        }
    }
}

/// State of a destination item.
#[derive(Debug)]
pub struct NavigationItemState {
    /// Whether the item is the active destination.
    pub active: Property<bool>,
    /// Width of the pill indicator.
    pub indicator_width: Property<Dp>,
    /// Container features.
    pub surface: Surface,
    /// Interactive features.
    pub interaction: Interaction,
}

impl WidgetFeature for NavigationItemState {
    fn name(&self) -> &'static str {
        "navigation_item"
    }
}

/// A destination of a navigation bar or rail.
#[derive(Clone)]
pub struct NavigationItem {
    widget: Widget,
    /// Selection and interaction state.
    pub state: Rc<NavigationItemState>,
}

widget_wrapper!(NavigationItem);

impl NavigationItem {
    /// Creates an item.
    pub fn new(ctx: &BuildContext, args: NavigationItemArgs) -> Self {
        let widget = Widget::new(ITEM);
        let surface = Surface::attach(&widget, ctx, SurfaceArgs::new(Role::Transparent));

        let indicator = Widget::new(ITEM_INDICATOR);
        Surface::attach(
            &indicator,
            ctx,
            SurfaceArgs::new(Role::SecondaryContainer).shape(Shape::CAPSULE),
        );
        widget.add_widget(&indicator);
        let mut icon_args = IconArgs::new(args.icon);
        if let Some(badge) = args.badge_icon {
            icon_args = icon_args.badge_icon(badge);
        }
        let icon = Icon::with_kind(ctx, ITEM_ICON, icon_args);
        widget.add_widget(&icon);
        if let Some(text) = args.text {
            let label = Label::with_kind(
                ctx,
                ITEM_LABEL,
                LabelArgs::new(text)
                    .font_style("Label")
                    .role(FontRole::Medium)
                    .text_color(Role::OnSurfaceVariant),
            );
            widget.add_widget(&label);
        }

        let interaction = Interaction::attach(
            &widget,
            ctx,
            &surface.themable,
            Role::OnSurface,
            RippleArgs::default().ripple_effect(false),
        );
        let state = Rc::new(NavigationItemState {
            active: Property::new("active", args.active),
            indicator_width: Property::new(
                "indicator_width",
                NavigationBarDefaults::INDICATOR_WIDTH,
            ),
            surface,
            interaction,
        });
        widget.attach_feature(state.clone());
        widget.size.set(PxSize::from_dp(
            NavigationBarDefaults::INDICATOR_WIDTH,
            NavigationBarDefaults::HEIGHT,
        ));
        propagate_disabled(&widget);
        on_geometry(&widget, layout_item);
        apply_active(&widget, args.active);

        let target = widget.downgrade();
        state.active.bind(move |active| {
            if let Some(widget) = target.upgrade() {
                apply_active(&widget, *active);
            }
        });
        let target = widget.downgrade();
        state.indicator_width.bind(move |_| {
            if let Some(widget) = target.upgrade() {
                layout_item(&widget);
            }
        });
        let weak = Rc::downgrade(&state);
        let target = widget.downgrade();
        state.interaction.clickable.on_release.connect(move |_| {
            if let (Some(state), Some(widget)) = (weak.upgrade(), target.upgrade())
                && !widget.is_effectively_disabled()
            {
                state.active.set(true);
            }
        });
        Self { widget, state }
    }

    /// Item handle for a widget built by [`NavigationItem::new`].
    pub fn from_widget(widget: Widget) -> Option<Self> {
        let state = widget.feature::<NavigationItemState>()?;
        Some(Self { widget, state })
    }

    /// Label text, or empty without a label.
    pub fn text(&self) -> String {
        self.slot(ITEM_LABEL)
            .and_then(|label| Label::core_of(&label))
            .map(|core| core.text.get())
            .unwrap_or_default()
    }

    /// The icon child.
    pub fn icon(&self) -> Option<Icon> {
        self.slot(ITEM_ICON).and_then(Icon::from_widget)
    }

    /// The active indicator child.
    pub fn indicator(&self) -> Option<Widget> {
        self.slot(ITEM_INDICATOR)
    }

    fn slot(&self, kind: &str) -> Option<Widget> {
        self.children().into_iter().find(|c| c.kind() == kind)
    }

    /// Fired when a press is released over the item.
    pub fn on_release(&self) -> &Signal<()> {
        &self.state.interaction.clickable.on_release
    }
}

fn apply_active(widget: &Widget, active: bool) {
    for child in widget.children() {
        match child.kind() {
            ITEM_INDICATOR => {
                child.opacity.set(if active { 1.0 } else { 0.0 });
            }
            ITEM_ICON => {
                if let Some(icon) = Icon::from_widget(child) {
                    icon.core.icon_color.set_role(if active {
                        Role::OnSecondaryContainer
                    } else {
                        Role::OnSurfaceVariant
                    });
                }
            }
            ITEM_LABEL => {
                if let Some(core) = Label::core_of(&child) {
                    core.text_color.set_role(if active {
                        Role::OnSurface
                    } else {
                        Role::OnSurfaceVariant
                    });
                }
            }
            _ => {}
        }
    }
}

/// Stacks indicator, icon and label from the top of the item, centered.
fn layout_item(widget: &Widget) {
    let Some(state) = widget.feature::<NavigationItemState>() else {
        return;
    };
    let rect = widget.rect();
    let indicator_size = PxSize::from_dp(
        state.indicator_width.get(),
        NavigationBarDefaults::INDICATOR_HEIGHT,
    );
    let has_label = widget.children().iter().any(|c| c.kind() == ITEM_LABEL);
    let top_padding = if has_label {
        NavigationBarDefaults::TOP_PADDING.to_pixels_f32()
    } else {
        (rect.height - indicator_size.height) / 2.0
    };
    let indicator = PxPosition::new(
        rect.center().x - indicator_size.width / 2.0,
        rect.top() - top_padding - indicator_size.height,
    );
    let indicator_center = PxPosition::new(
        rect.center().x,
        indicator.y + indicator_size.height / 2.0,
    );
    for child in widget.children() {
        let size = child.size.get();
        match child.kind() {
            ITEM_INDICATOR => {
                child.size.set(indicator_size);
                child.pos.set(indicator);
            }
            ITEM_ICON => {
                child.pos.set(PxPosition::new(
                    indicator_center.x - size.width / 2.0,
                    indicator_center.y - size.height / 2.0,
                ));
            }
            ITEM_LABEL => {
                child.pos.set(PxPosition::new(
                    rect.center().x - size.width / 2.0,
                    indicator.y - NavigationBarDefaults::LABEL_SPACING.to_pixels_f32() - size.height,
                ));
            }
            _ => {}
        }
    }
}

/// Collects the items of `container` into `selection` and activates the
/// first one when none asked to be active.
pub(crate) fn register_items(container: &Widget, selection: &Rc<NavigationSelection>) {
    for item in container
        .children()
        .into_iter()
        .filter_map(NavigationItem::from_widget)
    {
        selection.push(&item.state.active, item.text());
    }
    if selection.active.get().is_none() && !selection.is_empty() {
        selection.select(0);
    }
}

/// Selection and container state of a navigation bar.
#[derive(Debug)]
pub struct NavigationBarState {
    /// Destination tracking.
    pub selection: Rc<NavigationSelection>,
    /// Container features.
    pub surface: Surface,
}

impl WidgetFeature for NavigationBarState {
    fn name(&self) -> &'static str {
        "navigation_bar"
    }
}

fn layout_bar(widget: &Widget) {
    let items = widget.children();
    if items.is_empty() {
        return;
    }
    let rect = widget.rect();
    let width = rect.width / items.len() as f32;
    for (i, item) in items.iter().enumerate() {
        item.size.set(PxSize::new(width, rect.height));
        item.pos
            .set(PxPosition::new(rect.x + width * i as f32, rect.y));
    }
}

/// A bottom navigation bar.
#[derive(Clone)]
pub struct NavigationBar {
    widget: Widget,
    /// Selection and container state.
    pub state: Rc<NavigationBarState>,
}

widget_wrapper!(NavigationBar);

impl NavigationBar {
    /// Creates a bar from [`NavigationItem`] children.
    pub fn compose<I>(ctx: &BuildContext, items: I) -> Result<Self, CompositionError>
    where
        I: IntoIterator,
        I::Item: Into<Widget>,
    {
        let widget = Widget::new("NavigationBar");
        let surface = Surface::attach(
            &widget,
            ctx,
            SurfaceArgs::new(Role::SurfaceContainer).elevation(NavigationBarDefaults::ELEVATION),
        );
        NAVIGATION_BAR_CHILDREN.add_children(&widget, items)?;
        let state = Rc::new(NavigationBarState {
            selection: Rc::new(NavigationSelection::default()),
            surface,
        });
        widget.attach_feature(state.clone());
        widget.size.set(PxSize::from_dp(
            NavigationBarDefaults::WIDTH,
            NavigationBarDefaults::HEIGHT,
        ));
        register_items(&widget, &state.selection);
        propagate_disabled(&widget);
        layout_bar(&widget);
        on_geometry(&widget, layout_bar);
        Ok(Self { widget, state })
    }

    /// Destination items in order.
    pub fn items(&self) -> Vec<NavigationItem> {
        self.children()
            .into_iter()
            .filter_map(NavigationItem::from_widget)
            .collect()
    }

    /// Activates the item at `index`. Returns `false` when out of range.
    pub fn set_active(&self, index: usize) -> bool {
        self.state.selection.select(index)
    }

    /// Index of the active item.
    pub fn active_index(&self) -> Option<usize> {
        self.state.selection.active.get()
    }

    /// Fired after the active destination changed.
    pub fn on_switch_tabs(&self) -> &Signal<TabSwitch> {
        &self.state.selection.on_switch_tabs
    }
}

#[cfg(test)]
mod tests {
    use mdkit_ui::{TouchEvent, TouchPhase, Window};

    use super::*;

    fn bar(ctx: &BuildContext) -> NavigationBar {
        let items = ["Home", "Search", "Inbox"].map(|text| {
            NavigationItem::new(ctx, NavigationItemArgs::new("magnify").text(text))
        });
        NavigationBar::compose(ctx, items).expect("navigation items")
    }

    #[test]
    fn first_item_starts_active_and_taps_switch() {
        let ctx = BuildContext::new();
        let window = Window::new(PxSize::new(360.0, 640.0));
        let bar = bar(&ctx);
        window.add_widget(&bar);
        assert_eq!(bar.active_index(), Some(0));

        let switches = Rc::new(RefCell::new(Vec::new()));
        let s = switches.clone();
        bar.on_switch_tabs().connect(move |switch| s.borrow_mut().push(switch.clone()));

        let at = PxPosition::new(300.0, 40.0);
        let down = TouchEvent::new(1, at, TouchPhase::Down, 0.0);
        window.dispatch_touch(&down);
        window.dispatch_touch(&down.with(TouchPhase::Up, at, 0.1));
        assert_eq!(bar.active_index(), Some(2));
        assert_eq!(
            switches.borrow().as_slice(),
            [TabSwitch {
                index: 2,
                text: "Inbox".into()
            }]
        );
        let items = bar.items();
        assert!(!items[0].state.active.get());
        assert_eq!(items[0].indicator().map(|i| i.opacity.get()), Some(0.0));
        assert_eq!(items[2].indicator().map(|i| i.opacity.get()), Some(1.0));
        assert_eq!(
            items[2].icon().map(|i| i.icon_color()),
            Some(ctx.theme.color(Role::OnSecondaryContainer))
        );
    }

    #[test]
    fn items_share_the_width_and_stack_their_content() {
        let ctx = BuildContext::new();
        let bar = bar(&ctx);
        let items = bar.items();
        assert_eq!(items[1].rect().x, 120.0);
        assert_eq!(items[1].size.get().width, 120.0);
        let indicator = items[1].indicator().map(|i| i.rect());
        assert_eq!(indicator.map(|r| (r.x, r.y, r.width)), Some((148.0, 36.0, 64.0)));
        assert!(!bar.set_active(7));
        assert!(bar.set_active(1));
        assert_eq!(bar.active_index(), Some(1));
    }

    #[test]
    fn rejects_other_children() {
        let ctx = BuildContext::new();
        let err = NavigationBar::compose(&ctx, [Widget::new("Label")]);
        assert!(matches!(err, Err(CompositionError::UnsupportedChildType { .. })));
    }
}
