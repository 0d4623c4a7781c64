//! Navigation drawers: side sheets listing destinations.
//!
//! ## Usage
//!
//! A standard drawer sits in the layout next to the content and slides in
//! and out. A modal drawer slides above a scrim; tapping the scrim closes
//! it when `close_on_click` is set.

use std::{
    cell::RefCell,
    rc::{Rc, Weak},
};

use derive_setters::Setters;
use mdkit_ui::{
    Animation, AnimationHandle, Dp, Easing, Property, PxPosition, PxSize, Signal, WeakWidget,
    Widget, WidgetFeature,
};
use tracing::{debug, warn};

use crate::{
    behaviors::{declarative::ChildPolicy, ripple::RippleArgs},
    context::BuildContext,
    error::CompositionError,
    font_styles::FontRole,
    label::{Icon, IconArgs, Label, LabelArgs},
    layout::{Arrangement, CrossAxisAlignment, Padding, place_column},
    navigation_bar::{NavigationSelection, TabSwitch},
    overlay::{Scrim, ScrimDefaults, WeakScrim},
    role::Role,
    shape::Shape,
    surface::{Interaction, Surface, SurfaceArgs, on_geometry, propagate_disabled},
    theme::MaterialShapes,
};

/// Navigation drawer tokens.
pub struct NavigationDrawerDefaults;

impl NavigationDrawerDefaults {
    /// Drawer width.
    pub const WIDTH: Dp = Dp(360.0);
    /// Height when no window is known.
    pub const HEIGHT: Dp = Dp(640.0);
    /// Inset of the content.
    pub const PADDING: Dp = Dp(12.0);
    /// Item height.
    pub const ITEM_HEIGHT: Dp = Dp(56.0);
    /// Item content padding.
    pub const ITEM_PADDING: Dp = Dp(16.0);
    /// Gap between item icon and text.
    pub const ITEM_SPACING: Dp = Dp(12.0);
    /// Slide duration in seconds.
    pub const ANIMATION_DURATION: f64 = 0.25;
    /// Modal drawer elevation.
    pub const ELEVATION: u8 = 1;
}

/// Kind of a destination item.
pub const ITEM: &str = "NavigationDrawerItem";
/// Kind of a section label.
pub const LABEL: &str = "NavigationDrawerLabel";
/// Kind of a separator.
pub const DIVIDER: &str = "Divider";
/// Kind of the item icon.
pub const ITEM_ICON: &str = "NavigationDrawerItemIcon";
/// Kind of the item text.
pub const ITEM_TEXT: &str = "NavigationDrawerItemText";
/// Kind of the item trailing text.
pub const ITEM_TRAILING_TEXT: &str = "NavigationDrawerItemTrailingText";

/// Slots a navigation drawer accepts.
pub const NAVIGATION_DRAWER_CHILDREN: ChildPolicy =
    ChildPolicy::new("NavigationDrawer", &[ITEM, LABEL, DIVIDER]);

/// Slots a navigation drawer item accepts.
pub const DRAWER_ITEM_CHILDREN: ChildPolicy =
    ChildPolicy::new(ITEM, &[ITEM_ICON, ITEM_TEXT, ITEM_TRAILING_TEXT]);

/// How the drawer relates to the content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DrawerType {
    /// Above a scrim, closed by a tap outside.
    #[default]
    Modal,
    /// Part of the layout.
    Standard,
}

/// Edge the drawer slides from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DrawerAnchor {
    /// Left edge.
    #[default]
    Left,
    /// Right edge.
    Right,
}

/// Where the drawer is in its open/close cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DrawerStatus {
    /// Hidden.
    #[default]
    Closed,
    /// Sliding in.
    Opening,
    /// Fully shown.
    Opened,
    /// Sliding out.
    Closing,
}

/// Requested change of the drawer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawerCommand {
    /// Slide in.
    Open,
    /// Slide out.
    Close,
    /// Open when closed or closing, close otherwise.
    Toggle,
}

/// Section label.
pub fn navigation_drawer_label(ctx: &BuildContext, text: impl Into<String>) -> Label {
    Label::with_kind(
        ctx,
        LABEL,
        LabelArgs::new(text)
            .font_style("Title")
            .role(FontRole::Small)
            .text_color(Role::OnSurfaceVariant),
    )
}

/// Item icon.
pub fn drawer_item_icon(ctx: &BuildContext, icon: impl Into<String>) -> Icon {
    Icon::with_kind(ctx, ITEM_ICON, IconArgs::new(icon))
}

/// Item text.
pub fn drawer_item_text(ctx: &BuildContext, text: impl Into<String>) -> Label {
    Label::with_kind(
        ctx,
        ITEM_TEXT,
        LabelArgs::new(text)
            .font_style("Label")
            .role(FontRole::Large)
            .text_color(Role::OnSurfaceVariant),
    )
}

/// Item trailing text, such as an unread count.
pub fn drawer_item_trailing_text(ctx: &BuildContext, text: impl Into<String>) -> Label {
    Label::with_kind(
        ctx,
        ITEM_TRAILING_TEXT,
        LabelArgs::new(text)
            .font_style("Label")
            .role(FontRole::Large)
            .text_color(Role::OnSurfaceVariant),
    )
}

/// State of a drawer item.
#[derive(Debug)]
pub struct DrawerItemState {
    /// Whether the item is the active destination.
    pub active: Property<bool>,
    /// Container features.
    pub surface: Surface,
    /// Interactive features.
    pub interaction: Interaction,
}

impl WidgetFeature for DrawerItemState {
    fn name(&self) -> &'static str {
        "navigation_drawer_item"
    }
}

/// A destination row of a drawer.
#[derive(Clone)]
pub struct NavigationDrawerItem {
    widget: Widget,
    /// Selection and interaction state.
    pub state: Rc<DrawerItemState>,
}

widget_wrapper!(NavigationDrawerItem);

impl NavigationDrawerItem {
    /// Creates an item from icon, text and trailing text children.
    pub fn compose<I>(ctx: &BuildContext, children: I) -> Result<Self, CompositionError>
    where
        I: IntoIterator,
        I::Item: Into<Widget>,
    {
        let widget = Widget::new(ITEM);
        let surface = Surface::attach(
            &widget,
            ctx,
            SurfaceArgs::new(Role::Transparent).shape(Shape::CAPSULE),
        );
        DRAWER_ITEM_CHILDREN.add_children(&widget, children)?;
        let interaction = Interaction::attach(
            &widget,
            ctx,
            &surface.themable,
            Role::OnSurface,
            RippleArgs::default(),
        );
        let state = Rc::new(DrawerItemState {
            active: Property::new("active", false),
            surface,
            interaction,
        });
        widget.attach_feature(state.clone());
        widget.size.set(PxSize::from_dp(
            Dp(NavigationDrawerDefaults::WIDTH.0 - 2.0 * NavigationDrawerDefaults::PADDING.0),
            NavigationDrawerDefaults::ITEM_HEIGHT,
        ));
        propagate_disabled(&widget);
        on_geometry(&widget, layout_item);
        let target = widget.downgrade();
        state.active.bind(move |active| {
            if let Some(widget) = target.upgrade() {
                apply_active(&widget, *active);
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
        apply_active(&widget, false);
        Ok(Self { widget, state })
    }

    /// Item handle for a widget built by [`NavigationDrawerItem::compose`].
    pub fn from_widget(widget: Widget) -> Option<Self> {
        let state = widget.feature::<DrawerItemState>()?;
        Some(Self { widget, state })
    }

    /// Text of the item, or empty.
    pub fn text(&self) -> String {
        self.children()
            .into_iter()
            .find(|c| c.kind() == ITEM_TEXT)
            .and_then(|c| Label::core_of(&c))
            .map(|core| core.text.get())
            .unwrap_or_default()
    }

    /// Fired when a press is released over the item.
    pub fn on_release(&self) -> &Signal<()> {
        &self.state.interaction.clickable.on_release
    }
}

fn apply_active(widget: &Widget, active: bool) {
    let Some(state) = widget.feature::<DrawerItemState>() else {
        return;
    };
    state.surface.background.md_bg_color.set_role(if active {
        Role::SecondaryContainer
    } else {
        Role::Transparent
    });
    let content = if active {
        Role::OnSecondaryContainer
    } else {
        Role::OnSurfaceVariant
    };
    for child in widget.children() {
        if let Some(core) = Label::core_of(&child) {
            core.text_color.set_role(content);
        } else if let Some(icon) = Icon::from_widget(child) {
            icon.core.icon_color.set_role(content);
        }
    }
}

fn layout_item(widget: &Widget) {
    let rect = widget.rect();
    let padding = NavigationDrawerDefaults::ITEM_PADDING.to_pixels_f32();
    let spacing = NavigationDrawerDefaults::ITEM_SPACING.to_pixels_f32();
    let mid = rect.center().y;
    let mut left = rect.x + padding;
    let children = widget.children();
    for kind in [ITEM_ICON, ITEM_TEXT] {
        for child in children.iter().filter(|c| c.kind() == kind) {
            let size = child.size.get();
            child.pos.set(PxPosition::new(left, mid - size.height / 2.0));
            left += size.width + spacing;
        }
    }
    for child in children.iter().filter(|c| c.kind() == ITEM_TRAILING_TEXT) {
        let size = child.size.get();
        child.pos.set(PxPosition::new(
            rect.right() - padding - size.width,
            mid - size.height / 2.0,
        ));
    }
}

/// Open/close and selection state of a drawer.
pub struct DrawerState {
    /// Modal or standard.
    pub drawer_type: DrawerType,
    /// Edge the drawer slides from.
    pub anchor: DrawerAnchor,
    /// Where the drawer is in its cycle.
    pub status: Property<DrawerStatus>,
    /// Share of the drawer on screen, `[0, 1]`.
    pub open_progress: Property<f32>,
    /// Close on a scrim tap.
    pub close_on_click: Property<bool>,
    /// Destination tracking.
    pub selection: Rc<NavigationSelection>,
    /// Container features.
    pub surface: Surface,
    slide: RefCell<Option<AnimationHandle>>,
}

impl std::fmt::Debug for DrawerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DrawerState")
            .field("drawer_type", &self.drawer_type)
            .field("status", &self.status.get())
            .field("open_progress", &self.open_progress.get())
            .finish_non_exhaustive()
    }
}

impl DrawerState {
    /// Whether the drawer is open or opening.
    pub fn is_open(&self) -> bool {
        matches!(
            self.status.get(),
            DrawerStatus::Opening | DrawerStatus::Opened
        )
    }
}

impl WidgetFeature for DrawerState {
    fn name(&self) -> &'static str {
        "navigation_drawer"
    }
}

/// Arguments for [`NavigationDrawer::compose`].
#[derive(Debug, Clone, PartialEq, Setters)]
pub struct NavigationDrawerArgs {
    /// Modal or standard.
    pub drawer_type: DrawerType,
    /// Edge the drawer slides from.
    pub anchor: DrawerAnchor,
    /// Close on a scrim tap.
    pub close_on_click: bool,
}

impl Default for NavigationDrawerArgs {
    fn default() -> Self {
        Self {
            drawer_type: DrawerType::Modal,
            anchor: DrawerAnchor::Left,
            close_on_click: true,
        }
    }
}

fn layout(widget: &Widget) {
    let padding = NavigationDrawerDefaults::PADDING;
    let children = widget.children();
    place_column(
        widget.rect(),
        &children,
        &Arrangement::default()
            .cross(CrossAxisAlignment::Stretch)
            .padding(Padding::all(padding)),
    );
}

/// A side sheet of destinations.
#[derive(Clone)]
pub struct NavigationDrawer {
    widget: Widget,
    /// Open/close and selection state.
    pub state: Rc<DrawerState>,
    /// Scrim of a modal drawer.
    pub scrim: Option<Scrim>,
    ctx: BuildContext,
}

widget_wrapper!(NavigationDrawer);

impl NavigationDrawer {
    /// Creates a closed drawer from items, labels and dividers.
    pub fn compose<I>(
        ctx: &BuildContext,
        args: NavigationDrawerArgs,
        children: I,
    ) -> Result<Self, CompositionError>
    where
        I: IntoIterator,
        I::Item: Into<Widget>,
    {
        let widget = Widget::new("NavigationDrawer");
        let large = MaterialShapes::LARGE;
        let shape = match args.anchor {
            DrawerAnchor::Left => Shape::corners(Dp(0.0), large, large, Dp(0.0)),
            DrawerAnchor::Right => Shape::corners(large, Dp(0.0), Dp(0.0), large),
        };
        let mut surface_args = SurfaceArgs::new(Role::SurfaceContainerLow).shape(shape);
        if args.drawer_type == DrawerType::Modal {
            surface_args = surface_args.elevation(NavigationDrawerDefaults::ELEVATION);
        }
        let surface = Surface::attach(&widget, ctx, surface_args);
        NAVIGATION_DRAWER_CHILDREN.add_children(&widget, children)?;
        let state = Rc::new(DrawerState {
            drawer_type: args.drawer_type,
            anchor: args.anchor,
            status: Property::new("status", DrawerStatus::Closed),
            open_progress: Property::new("open_progress", 0.0),
            close_on_click: Property::new("close_on_click", args.close_on_click),
            selection: Rc::new(NavigationSelection::default()),
            surface,
            slide: RefCell::new(None),
        });
        widget.attach_feature(state.clone());
        for item in widget
            .children()
            .into_iter()
            .filter_map(NavigationDrawerItem::from_widget)
        {
            state.selection.push(&item.state.active, item.text());
        }
        let height = ctx
            .window
            .as_ref()
            .map_or(NavigationDrawerDefaults::HEIGHT.to_pixels_f32(), |w| {
                w.size().get().height
            });
        widget.size.set(PxSize::new(
            NavigationDrawerDefaults::WIDTH.to_pixels_f32(),
            height,
        ));
        propagate_disabled(&widget);
        layout(&widget);
        on_geometry(&widget, layout);

        let scrim = (args.drawer_type == DrawerType::Modal).then(|| Scrim::new(ctx, &widget));
        let drawer = Self {
            widget,
            state,
            scrim,
            ctx: ctx.clone(),
        };
        drawer.follow_progress();
        if let Some(scrim) = &drawer.scrim {
            scrim.layer.alpha.set(0.0);
            let target = drawer.downgrade();
            scrim.on_tap().connect(move |_| {
                if let Some(drawer) = target.upgrade()
                    && drawer.state.close_on_click.get()
                {
                    drawer.set_state(DrawerCommand::Close);
                }
            });
        }
        drawer.place(0.0);
        Ok(drawer)
    }

    fn follow_progress(&self) {
        let target = self.downgrade();
        self.state.open_progress.bind(move |progress| {
            if let Some(drawer) = target.upgrade() {
                drawer.place(*progress);
            }
        });
    }

    fn place(&self, progress: f32) {
        let width = self.size.get().width;
        let edge = match &self.ctx.window {
            Some(window) => window.size().get().width,
            None => width,
        };
        let x = match self.state.anchor {
            DrawerAnchor::Left => -width * (1.0 - progress),
            DrawerAnchor::Right => edge - width * progress,
        };
        self.pos.set(PxPosition::new(x, self.pos.get().y));
        if let Some(scrim) = &self.scrim {
            scrim.layer.alpha.set(ScrimDefaults::ALPHA * progress);
        }
    }

    /// Opens, closes or toggles the drawer with a slide.
    pub fn set_state(&self, command: DrawerCommand) {
        let open = match command {
            DrawerCommand::Open => true,
            DrawerCommand::Close => false,
            DrawerCommand::Toggle => !self.state.is_open(),
        };
        if open == self.state.is_open() {
            return;
        }
        if let Some(previous) = self.state.slide.borrow_mut().take() {
            previous.cancel();
        }
        if open
            && let Some(scrim) = &self.scrim
            && !scrim.show(&self.ctx)
        {
            warn!("modal drawer needs a window");
            return;
        }
        self.state.status.set(if open {
            DrawerStatus::Opening
        } else {
            DrawerStatus::Closing
        });
        let handle = Animation::new(NavigationDrawerDefaults::ANIMATION_DURATION, Easing::OutCubic)
            .animate(&self.state.open_progress, if open { 1.0 } else { 0.0 })
            .start(&self.ctx.clock);
        let target = self.downgrade();
        handle.on_complete().connect(move |_| {
            let Some(drawer) = target.upgrade() else {
                return;
            };
            if open {
                drawer.state.status.set(DrawerStatus::Opened);
                debug!("navigation drawer opened");
            } else {
                if let Some(scrim) = &drawer.scrim {
                    scrim.hide(&drawer.ctx);
                }
                drawer.state.status.set(DrawerStatus::Closed);
                debug!("navigation drawer closed");
            }
        });
        *self.state.slide.borrow_mut() = Some(handle);
    }

    /// Slides the drawer in.
    pub fn open(&self) {
        self.set_state(DrawerCommand::Open);
    }

    /// Slides the drawer out.
    pub fn close(&self) {
        self.set_state(DrawerCommand::Close);
    }

    /// Opens a closed drawer and closes an open one.
    pub fn toggle(&self) {
        self.set_state(DrawerCommand::Toggle);
    }

    /// Destination items in order.
    pub fn items(&self) -> Vec<NavigationDrawerItem> {
        self.children()
            .into_iter()
            .filter_map(NavigationDrawerItem::from_widget)
            .collect()
    }

    /// Fired after the active destination changed.
    pub fn on_switch_tabs(&self) -> &Signal<TabSwitch> {
        &self.state.selection.on_switch_tabs
    }

    fn downgrade(&self) -> WeakDrawer {
        WeakDrawer {
            widget: self.widget.downgrade(),
            state: Rc::downgrade(&self.state),
            scrim: self.scrim.as_ref().map(Scrim::downgrade),
            ctx: self.ctx.clone(),
        }
    }
}

struct WeakDrawer {
    widget: WeakWidget,
    state: Weak<DrawerState>,
    scrim: Option<WeakScrim>,
    ctx: BuildContext,
}

impl WeakDrawer {
    fn upgrade(&self) -> Option<NavigationDrawer> {
        let scrim = match &self.scrim {
            Some(scrim) => Some(scrim.upgrade()?),
            None => None,
        };
        Some(NavigationDrawer {
            widget: self.widget.upgrade()?,
            state: self.state.upgrade()?,
            scrim,
            ctx: self.ctx.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use mdkit_ui::{TouchEvent, TouchPhase, Window};

    use super::*;
    use crate::{
        children,
        divider::{Divider, DividerArgs},
    };

    fn drawer(ctx: &BuildContext, args: NavigationDrawerArgs) -> NavigationDrawer {
        let item = |icon: &str, text: &str| {
            NavigationDrawerItem::compose(
                ctx,
                children![drawer_item_icon(ctx, icon), drawer_item_text(ctx, text)],
            )
            .expect("item children")
        };
        NavigationDrawer::compose(
            ctx,
            args,
            children![
                navigation_drawer_label(ctx, "Mail"),
                item("menu", "Inbox"),
                item("pencil", "Outbox"),
                Divider::new(ctx, DividerArgs::default()),
            ],
        )
        .expect("drawer children")
    }

    #[test]
    fn modal_drawer_slides_over_a_scrim() {
        let window = Window::new(PxSize::new(800.0, 600.0));
        let ctx = BuildContext::new().with_window(window.clone());
        let drawer = drawer(&ctx, NavigationDrawerArgs::default());
        assert_eq!(drawer.pos.get().x, -360.0);
        assert_eq!(drawer.size.get().height, 600.0);

        drawer.toggle();
        assert_eq!(drawer.state.status.get(), DrawerStatus::Opening);
        ctx.clock.advance(0.3, 0.05);
        assert_eq!(drawer.state.status.get(), DrawerStatus::Opened);
        assert_eq!(drawer.pos.get().x, 0.0);
        let scrim = drawer.scrim.clone().expect("modal scrim");
        assert!(window.contains(&scrim));
        assert!((scrim.layer.alpha.get() - ScrimDefaults::ALPHA).abs() < 1e-6);

        let at = PxPosition::new(600.0, 300.0);
        let down = TouchEvent::new(1, at, TouchPhase::Down, 0.0);
        window.dispatch_touch(&down);
        window.dispatch_touch(&down.with(TouchPhase::Up, at, 0.1));
        assert_eq!(drawer.state.status.get(), DrawerStatus::Closing);
        ctx.clock.advance(0.3, 0.05);
        assert_eq!(drawer.state.status.get(), DrawerStatus::Closed);
        assert!(!window.contains(&scrim));
    }

    #[test]
    fn standard_drawer_tracks_the_active_item() {
        let ctx = BuildContext::new();
        let drawer = drawer(
            &ctx,
            NavigationDrawerArgs::default().drawer_type(DrawerType::Standard),
        );
        assert!(drawer.scrim.is_none());
        drawer.open();
        ctx.clock.advance(0.3, 0.05);
        assert!(drawer.state.is_open());

        let switched = Rc::new(RefCell::new(None));
        let s = switched.clone();
        drawer
            .on_switch_tabs()
            .connect(move |switch| *s.borrow_mut() = Some(switch.text.clone()));
        let items = drawer.items();
        items[1].state.interaction.clickable.click(&items[1]);
        assert_eq!(switched.borrow().as_deref(), Some("Outbox"));
        assert_eq!(
            items[1].state.surface.background.md_bg_color.get(),
            ctx.theme.color(Role::SecondaryContainer)
        );
        // Label, two items and divider run top to bottom.
        let kinds: Vec<&str> = drawer.children().iter().map(|c| c.kind()).collect();
        assert_eq!(kinds, [LABEL, ITEM, ITEM, DIVIDER]);
        assert!(items[0].rect().y > items[1].rect().y);
    }
}
