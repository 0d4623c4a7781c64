//! Navigation rails: vertical destination strips for tablet and desktop
//! layouts.
//!
//! A rail holds an optional menu button and floating action button at the
//! top, followed by the same [`NavigationItem`]s a navigation bar takes.

use std::rc::Rc;

use derive_setters::Setters;
use mdkit_ui::{Dp, Property, PxPosition, PxSize, Signal, Widget, WidgetFeature};

use crate::{
    behaviors::declarative::ChildPolicy,
    context::BuildContext,
    error::CompositionError,
    icon_button::{IconButton, IconButtonArgs},
    navigation_bar::{ITEM, NavigationItem, NavigationSelection, TabSwitch, register_items},
    role::Role,
    surface::{Surface, SurfaceArgs, on_geometry, propagate_disabled},
};

/// Navigation rail tokens.
pub struct NavigationRailDefaults;

impl NavigationRailDefaults {
    /// Rail width.
    pub const WIDTH: Dp = Dp(80.0);
    /// Default rail height.
    pub const HEIGHT: Dp = Dp(640.0);
    /// Item height.
    pub const ITEM_HEIGHT: Dp = Dp(56.0);
    /// Active indicator width in a rail.
    pub const INDICATOR_WIDTH: Dp = Dp(56.0);
    /// Gap between items.
    pub const ITEM_SPACING: Dp = Dp(12.0);
    /// Gap above the first child.
    pub const TOP_PADDING: Dp = Dp(44.0);
    /// Gap between the header buttons and the items.
    pub const HEADER_SPACING: Dp = Dp(40.0);
}

/// Kind of the menu button.
pub const MENU_BUTTON: &str = "NavigationRailMenuButton";
/// Kind of a floating action button placed in the rail header.
pub const FAB_BUTTON: &str = "FabButton";

/// Slots a navigation rail accepts.
pub const NAVIGATION_RAIL_CHILDREN: ChildPolicy =
    ChildPolicy::new("NavigationRail", &[MENU_BUTTON, FAB_BUTTON, ITEM]);

/// Vertical placement of the items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RailAnchor {
    /// Right below the header.
    #[default]
    Top,
    /// Centered in the rail.
    Center,
    /// Against the bottom edge.
    Bottom,
}

/// Menu button for the rail header.
pub fn navigation_rail_menu_button(ctx: &BuildContext, icon: impl Into<String>) -> IconButton {
    IconButton::with_kind(ctx, MENU_BUTTON, IconButtonArgs::new(icon))
}

/// Arguments for [`NavigationRail::compose`].
#[derive(Debug, Clone, PartialEq, Default, Setters)]
pub struct NavigationRailArgs {
    /// Vertical placement of the items.
    pub anchor: RailAnchor,
}

/// Selection and container state of a rail.
#[derive(Debug)]
pub struct NavigationRailState {
    /// Destination tracking.
    pub selection: Rc<NavigationSelection>,
    /// Vertical placement of the items.
    pub anchor: Property<RailAnchor>,
    /// Container features.
    pub surface: Surface,
}

impl WidgetFeature for NavigationRailState {
    fn name(&self) -> &'static str {
        "navigation_rail"
    }
}

fn layout(widget: &Widget) {
    let Some(state) = widget.feature::<NavigationRailState>() else {
        return;
    };
    let rect = widget.rect();
    let children = widget.children();
    let (header, items): (Vec<Widget>, Vec<Widget>) =
        children.into_iter().partition(|c| c.kind() != ITEM);

    let mut cursor = rect.top() - NavigationRailDefaults::TOP_PADDING.to_pixels_f32();
    for child in &header {
        let size = child.size.get();
        cursor -= size.height;
        child
            .pos
            .set(PxPosition::new(rect.center().x - size.width / 2.0, cursor));
        cursor -= NavigationRailDefaults::ITEM_SPACING.to_pixels_f32();
    }
    if !header.is_empty() {
        cursor -= NavigationRailDefaults::HEADER_SPACING.to_pixels_f32()
            - NavigationRailDefaults::ITEM_SPACING.to_pixels_f32();
    }

    let item_height = NavigationRailDefaults::ITEM_HEIGHT.to_pixels_f32();
    let spacing = NavigationRailDefaults::ITEM_SPACING.to_pixels_f32();
    let count = items.len() as f32;
    let block = (item_height * count + spacing * (count - 1.0)).max(0.0);
    let top = match state.anchor.get() {
        RailAnchor::Top => cursor,
        RailAnchor::Center => (rect.center().y + block / 2.0).min(cursor),
        RailAnchor::Bottom => (rect.y + block).min(cursor),
    };
    for (i, item) in items.iter().enumerate() {
        item.size.set(PxSize::new(rect.width, item_height));
        let y = top - (item_height + spacing) * i as f32 - item_height;
        item.pos.set(PxPosition::new(rect.x, y));
    }
}

/// A vertical navigation rail.
#[derive(Clone)]
pub struct NavigationRail {
    widget: Widget,
    /// Selection and container state.
    pub state: Rc<NavigationRailState>,
}

widget_wrapper!(NavigationRail);

impl NavigationRail {
    /// Creates a rail from header buttons and [`NavigationItem`] children.
    pub fn compose<I>(
        ctx: &BuildContext,
        args: NavigationRailArgs,
        children: I,
    ) -> Result<Self, CompositionError>
    where
        I: IntoIterator,
        I::Item: Into<Widget>,
    {
        let widget = Widget::new("NavigationRail");
        let surface = Surface::attach(&widget, ctx, SurfaceArgs::new(Role::Surface));
        NAVIGATION_RAIL_CHILDREN.add_children(&widget, children)?;
        let state = Rc::new(NavigationRailState {
            selection: Rc::new(NavigationSelection::default()),
            anchor: Property::new("anchor", args.anchor),
            surface,
        });
        widget.attach_feature(state.clone());
        for item in widget
            .children()
            .into_iter()
            .filter_map(NavigationItem::from_widget)
        {
            item.state
                .indicator_width
                .set(NavigationRailDefaults::INDICATOR_WIDTH);
        }
        widget.size.set(PxSize::from_dp(
            NavigationRailDefaults::WIDTH,
            NavigationRailDefaults::HEIGHT,
        ));
        register_items(&widget, &state.selection);
        propagate_disabled(&widget);
        layout(&widget);
        on_geometry(&widget, layout);
        let target = widget.downgrade();
        state.anchor.bind(move |_| {
            if let Some(widget) = target.upgrade() {
                layout(&widget);
            }
        });
        Ok(Self { widget, state })
    }

    /// Destination items in order.
    pub fn items(&self) -> Vec<NavigationItem> {
        self.children()
            .into_iter()
            .filter_map(NavigationItem::from_widget)
            .collect()
    }

    /// The menu button, if present.
    pub fn menu_button(&self) -> Option<Widget> {
        self.children().into_iter().find(|c| c.kind() == MENU_BUTTON)
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
    use super::*;
    use crate::navigation_bar::NavigationItemArgs;

    fn rail(ctx: &BuildContext, args: NavigationRailArgs) -> NavigationRail {
        let menu = navigation_rail_menu_button(ctx, "menu");
        let items = ["Mail", "Chat"].map(|text| {
            Widget::from(NavigationItem::new(
                ctx,
                NavigationItemArgs::new("magnify").text(text),
            ))
        });
        let children = std::iter::once(Widget::from(menu)).chain(items);
        NavigationRail::compose(ctx, args, children).expect("rail children")
    }

    #[test]
    fn header_then_items_from_the_top() {
        let ctx = BuildContext::new();
        let rail = rail(&ctx, NavigationRailArgs::default());
        assert_eq!(rail.active_index(), Some(0));
        let menu = rail.menu_button().map(|m| m.rect());
        assert_eq!(menu.map(|r| r.top()), Some(596.0));
        let items = rail.items();
        // 640 - 44 - 48 (menu) - 40 (header gap) = 508.
        assert_eq!(items[0].rect().top(), 508.0);
        assert_eq!(items[1].rect().top(), 508.0 - 56.0 - 12.0);
        assert_eq!(items[0].indicator().map(|i| i.size.get().width), Some(56.0));
    }

    #[test]
    fn centered_items_and_switching() {
        let ctx = BuildContext::new();
        let rail = rail(&ctx, NavigationRailArgs::default().anchor(RailAnchor::Center));
        let items = rail.items();
        let block_top = items[0].rect().top();
        let block_bottom = items[1].rect().y;
        assert_eq!((block_top + block_bottom) / 2.0, 320.0);

        let switched = Rc::new(std::cell::Cell::new(None));
        let s = switched.clone();
        rail.on_switch_tabs().connect(move |switch| s.set(Some(switch.index)));
        items[1].state.active.set(true);
        assert_eq!(switched.get(), Some(1));
        assert!(!items[0].state.active.get());
    }
}
