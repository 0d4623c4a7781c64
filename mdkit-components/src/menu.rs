//! Drop-down menus and the drop-down item that usually opens them.
//!
//! ## Usage
//!
//! Build a [`DropdownMenu`] for a caller widget from a list of
//! [`MenuItemArgs`]. `open` places the menu next to the caller inside the
//! window, `on_select` reports the chosen item and closes the menu, and a tap
//! outside the menu dismisses it.

use std::{
    cell::{Cell, RefCell},
    rc::{Rc, Weak},
};

use derive_setters::Setters;
use mdkit_ui::{
    Animation, AnimationHandle, Dp, Easing, Property, PxPosition, PxRect, PxSize, Signal,
    WeakWidget, Widget, WidgetFeature,
};
use tracing::{debug, warn};

use crate::{
    behaviors::ripple::RippleArgs,
    context::BuildContext,
    font_styles::FontRole,
    label::{Icon, IconArgs, Label, LabelArgs},
    layout::{Arrangement, CrossAxisAlignment, Padding, place_row, row_extent},
    overlay::{Scrim, WeakScrim},
    role::Role,
    shape::Shape,
    surface::{Interaction, Surface, SurfaceArgs, on_geometry, propagate_disabled},
    theme::MaterialShapes,
};

/// Menu tokens.
pub struct MenuDefaults;

impl MenuDefaults {
    /// Item height.
    pub const ITEM_HEIGHT: Dp = Dp(48.0);
    /// Narrowest menu.
    pub const MIN_WIDTH: Dp = Dp(112.0);
    /// Widest menu.
    pub const MAX_WIDTH: Dp = Dp(280.0);
    /// Gap above the first and below the last item.
    pub const VERTICAL_PADDING: Dp = Dp(8.0);
    /// Horizontal item padding.
    pub const ITEM_PADDING: Dp = Dp(12.0);
    /// Gap between item content.
    pub const ITEM_SPACING: Dp = Dp(12.0);
    /// Distance kept from the window edges.
    pub const BORDER_MARGIN: Dp = Dp(4.0);
    /// Menu elevation.
    pub const ELEVATION: u8 = 2;
    /// Fade-in duration in seconds.
    pub const OPEN_DURATION: f64 = 0.15;
    /// Arrow glyph of a drop-down item.
    pub const DROP_DOWN_ICON: &'static str = "menu-down";
}

/// Kind of a menu item.
pub const ITEM: &str = "MenuItem";
/// Kind of a drop-down item.
pub const DROP_DOWN_ITEM: &str = "DropDownItem";

/// Where the menu opens relative to its caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MenuPosition {
    /// Below when it fits, above otherwise.
    #[default]
    Auto,
    /// Above the caller.
    Top,
    /// Below the caller.
    Bottom,
    /// Centered on the caller.
    Center,
}

/// One entry of a menu.
#[derive(Debug, Clone, PartialEq, Setters)]
#[setters(strip_option, into)]
pub struct MenuItemArgs {
    /// Item text.
    pub text: String,
    /// Icon before the text.
    pub leading_icon: Option<String>,
    /// Icon after the text.
    pub trailing_icon: Option<String>,
    /// Text after the text, such as a shortcut.
    pub trailing_text: Option<String>,
    /// Initial disabled state.
    #[setters(skip)]
    pub disabled: bool,
}

impl MenuItemArgs {
    /// Item showing `text`.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            leading_icon: None,
            trailing_icon: None,
            trailing_text: None,
            disabled: false,
        }
    }

    /// Builder-style disabled flag.
    pub fn disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }
}

/// Arguments for [`DropdownMenu::new`].
#[derive(Debug, Clone, PartialEq, Default, Setters)]
pub struct DropdownMenuArgs {
    /// Entries in order.
    pub items: Vec<MenuItemArgs>,
    /// Placement relative to the caller.
    pub position: MenuPosition,
    /// Fixed width; fits the items when `None`.
    #[setters(strip_option)]
    pub width: Option<Dp>,
    /// Height limit; items beyond it scroll.
    #[setters(strip_option)]
    pub max_height: Option<Dp>,
}

/// A chosen entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuSelection {
    /// Position in the item list.
    pub index: usize,
    /// Item text.
    pub text: String,
}

/// Position of a menu of `size` next to `caller` inside `window`, kept
/// `margin` away from the window edges.
pub fn menu_position(
    caller: PxRect,
    size: PxSize,
    window: PxSize,
    position: MenuPosition,
    margin: f32,
) -> PxPosition {
    let max_x = (window.width - size.width - margin).max(margin);
    let x = caller.x.clamp(margin, max_x);
    let below = caller.y - size.height;
    let above = caller.top();
    let y = match position {
        MenuPosition::Bottom => below,
        MenuPosition::Top => above,
        MenuPosition::Center => caller.center().y - size.height / 2.0,
        MenuPosition::Auto => {
            if below >= margin {
                below
            } else if above + size.height <= window.height - margin {
                above
            } else if caller.y > window.height - caller.top() {
                margin
            } else {
                window.height - margin - size.height
            }
        }
    };
    let max_y = (window.height - size.height - margin).max(margin);
    PxPosition::new(x, y.clamp(margin, max_y))
}

/// State of one menu item.
#[derive(Debug)]
pub struct MenuItemState {
    /// Position in the menu.
    pub index: usize,
    /// Item text.
    pub text: String,
    /// Container features.
    pub surface: Surface,
    /// Interactive features.
    pub interaction: Interaction,
}

impl WidgetFeature for MenuItemState {
    fn name(&self) -> &'static str {
        "menu_item"
    }
}

fn item_arrangement() -> Arrangement {
    Arrangement::spaced(MenuDefaults::ITEM_SPACING)
        .cross(CrossAxisAlignment::Center)
        .padding(Padding::symmetric(MenuDefaults::ITEM_PADDING, Dp(0.0)))
}

fn layout_item(widget: &Widget) {
    let rect = widget.rect();
    let children = widget.children();
    let (trailing, leading): (Vec<Widget>, Vec<Widget>) = children
        .into_iter()
        .partition(|c| c.id().as_deref() == Some("trailing"));
    place_row(rect, &leading, &item_arrangement());
    let padding = MenuDefaults::ITEM_PADDING.to_pixels_f32();
    let spacing = MenuDefaults::ITEM_SPACING.to_pixels_f32();
    let mut right = rect.right() - padding;
    for child in trailing.iter().rev() {
        let size = child.size.get();
        right -= size.width;
        child
            .pos
            .set(PxPosition::new(right, rect.center().y - size.height / 2.0));
        right -= spacing;
    }
}

fn menu_item(ctx: &BuildContext, index: usize, args: &MenuItemArgs) -> Widget {
    let widget = Widget::new(ITEM);
    let surface = Surface::attach(&widget, ctx, SurfaceArgs::new(Role::Transparent));
    if let Some(icon) = &args.leading_icon {
        widget.add_widget(&Icon::new(ctx, IconArgs::new(icon.clone())));
    }
    widget.add_widget(&Label::new(
        ctx,
        LabelArgs::new(args.text.clone())
            .font_style("Label")
            .role(FontRole::Large),
    ));
    if let Some(text) = &args.trailing_text {
        let label = Label::new(
            ctx,
            LabelArgs::new(text.clone())
                .font_style("Label")
                .role(FontRole::Large)
                .text_color(Role::OnSurfaceVariant),
        );
        label.set_id("trailing");
        widget.add_widget(&label);
    }
    if let Some(icon) = &args.trailing_icon {
        let icon = Icon::new(ctx, IconArgs::new(icon.clone()));
        icon.set_id("trailing");
        widget.add_widget(&icon);
    }
    let interaction = Interaction::attach(
        &widget,
        ctx,
        &surface.themable,
        Role::OnSurface,
        RippleArgs::default(),
    );
    widget.attach_feature(Rc::new(MenuItemState {
        index,
        text: args.text.clone(),
        surface,
        interaction,
    }));
    propagate_disabled(&widget);
    on_geometry(&widget, layout_item);
    widget.disabled.set(args.disabled);
    widget
}

/// Open state of a menu.
pub struct MenuState {
    /// Whether the menu is shown.
    pub is_open: Property<bool>,
    /// Placement relative to the caller.
    pub position: Property<MenuPosition>,
    /// How far the items are scrolled up, in pixels.
    pub scroll_offset: Property<f32>,
    /// Fired with the chosen entry before the menu closes.
    pub on_select: Signal<MenuSelection>,
    /// Fired after the menu closed.
    pub on_dismiss: Signal<()>,
    /// Container features.
    pub surface: Surface,
    caller: WeakWidget,
    content_height: Cell<f32>,
    fade: RefCell<Option<AnimationHandle>>,
}

impl std::fmt::Debug for MenuState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MenuState")
            .field("is_open", &self.is_open.get())
            .field("position", &self.position.get())
            .finish_non_exhaustive()
    }
}

impl WidgetFeature for MenuState {
    fn name(&self) -> &'static str {
        "dropdown_menu"
    }

    fn on_destroy(&self, _widget: &Widget) {
        if let Some(fade) = self.fade.borrow_mut().take() {
            fade.cancel();
        }
    }
}

impl MenuState {
    fn max_scroll(&self, widget: &Widget) -> f32 {
        (self.content_height.get() - widget.size.get().height).max(0.0)
    }
}

fn layout_menu(widget: &Widget) {
    let Some(state) = widget.feature::<MenuState>() else {
        return;
    };
    let rect = widget.rect();
    let item_height = MenuDefaults::ITEM_HEIGHT.to_pixels_f32();
    let mut top =
        rect.top() - MenuDefaults::VERTICAL_PADDING.to_pixels_f32() + state.scroll_offset.get();
    for item in widget.children() {
        item.size.set(PxSize::new(rect.width, item_height));
        item.pos.set(PxPosition::new(rect.x, top - item_height));
        // Rows scrolled out of the container stay invisible.
        let visible = item.rect().intersection(&rect).map_or(0.0, |r| r.area());
        item.opacity.set(if visible > 0.0 { 1.0 } else { 0.0 });
        top -= item_height;
    }
}

/// A drop-down menu anchored to a caller widget.
#[derive(Clone)]
pub struct DropdownMenu {
    widget: Widget,
    /// Dismissal layer holding the menu.
    pub scrim: Scrim,
    /// Open state and container features.
    pub state: Rc<MenuState>,
    ctx: BuildContext,
}

widget_wrapper!(DropdownMenu);

impl DropdownMenu {
    /// Creates a closed menu for `caller`.
    pub fn new(ctx: &BuildContext, caller: &Widget, args: DropdownMenuArgs) -> Self {
        let widget = Widget::new("DropdownMenu");
        let surface = Surface::attach(
            &widget,
            ctx,
            SurfaceArgs::new(Role::SurfaceContainer)
                .shape(Shape::rounded(MaterialShapes::EXTRA_SMALL))
                .elevation(MenuDefaults::ELEVATION),
        );
        let items: Vec<Widget> = args
            .items
            .iter()
            .enumerate()
            .map(|(index, item)| menu_item(ctx, index, item))
            .collect();
        for item in &items {
            widget.add_widget(item);
        }
        let width = match args.width {
            Some(width) => width.to_pixels_f32(),
            None => items
                .iter()
                .map(|item| row_extent(&item.children(), &item_arrangement()).width)
                .fold(0.0, f32::max),
        }
        .clamp(
            MenuDefaults::MIN_WIDTH.to_pixels_f32(),
            MenuDefaults::MAX_WIDTH.to_pixels_f32(),
        );
        let padding = MenuDefaults::VERTICAL_PADDING.to_pixels_f32();
        let content_height =
            items.len() as f32 * MenuDefaults::ITEM_HEIGHT.to_pixels_f32() + 2.0 * padding;
        let height = args
            .max_height
            .map_or(content_height, |max| content_height.min(max.to_pixels_f32()));

        let state = Rc::new(MenuState {
            is_open: Property::new("is_open", false),
            position: Property::new("position", args.position),
            scroll_offset: Property::new("scroll_offset", 0.0),
            on_select: Signal::new(),
            on_dismiss: Signal::new(),
            surface,
            caller: caller.downgrade(),
            content_height: Cell::new(content_height),
            fade: RefCell::new(None),
        });
        widget.attach_feature(state.clone());
        widget.size.set(PxSize::new(width, height));
        layout_menu(&widget);
        on_geometry(&widget, layout_menu);
        let target = widget.downgrade();
        state.scroll_offset.bind(move |_| {
            if let Some(widget) = target.upgrade() {
                layout_menu(&widget);
            }
        });

        let scrim = Scrim::new(ctx, &widget);
        scrim.layer.alpha.set(0.0);
        let menu = Self {
            widget,
            scrim,
            state,
            ctx: ctx.clone(),
        };
        for item in &items {
            let Some(item_state) = item.feature::<MenuItemState>() else {
                continue;
            };
            let target = menu.downgrade();
            let selection = MenuSelection {
                index: item_state.index,
                text: item_state.text.clone(),
            };
            item_state.interaction.clickable.on_release.connect(move |_| {
                if let Some(menu) = target.upgrade() {
                    menu.select(&selection);
                }
            });
        }
        let target = menu.downgrade();
        menu.scrim.on_tap().connect(move |_| {
            if let Some(menu) = target.upgrade() {
                menu.dismiss();
            }
        });
        menu
    }

    /// Shows the menu next to its caller. Without a window or a caller the
    /// menu stays closed.
    pub fn open(&self) {
        if self.state.is_open.get() {
            return;
        }
        let (Some(window), Some(caller)) = (&self.ctx.window, self.state.caller.upgrade()) else {
            warn!("menu needs a window and a live caller");
            return;
        };
        let pos = menu_position(
            caller.rect(),
            self.size.get(),
            window.size().get(),
            self.state.position.get(),
            MenuDefaults::BORDER_MARGIN.to_pixels_f32(),
        );
        self.pos.set(pos);
        if !self.scrim.show(&self.ctx) {
            return;
        }
        self.state.scroll_offset.set(0.0);
        self.opacity.set(0.0);
        let fade = Animation::new(MenuDefaults::OPEN_DURATION, Easing::OutCubic)
            .animate(&self.opacity, 1.0)
            .start(&self.ctx.clock);
        *self.state.fade.borrow_mut() = Some(fade);
        self.state.is_open.set(true);
        debug!(?pos, "menu opened");
    }

    /// Closes the menu. Closing a closed menu does nothing.
    pub fn dismiss(&self) {
        if !self.state.is_open.get() {
            return;
        }
        if let Some(fade) = self.state.fade.borrow_mut().take() {
            fade.cancel();
        }
        self.scrim.hide(&self.ctx);
        self.state.is_open.set(false);
        debug!("menu dismissed");
        self.state.on_dismiss.emit(&());
    }

    fn select(&self, selection: &MenuSelection) {
        debug!(index = selection.index, text = %selection.text, "menu item selected");
        self.state.on_select.emit(selection);
        self.dismiss();
    }

    /// Scrolls the items by `dy` pixels, clamped to the overflow.
    pub fn scroll_by(&self, dy: f32) {
        let max = self.state.max_scroll(&self.widget);
        self.state
            .scroll_offset
            .update(|offset| *offset = (*offset + dy).clamp(0.0, max));
    }

    /// Item widgets in order.
    pub fn items(&self) -> Vec<Widget> {
        self.children()
    }

    /// Fired with the chosen entry.
    pub fn on_select(&self) -> &Signal<MenuSelection> {
        &self.state.on_select
    }

    fn downgrade(&self) -> WeakMenu {
        WeakMenu {
            widget: self.widget.downgrade(),
            scrim: self.scrim.downgrade(),
            state: Rc::downgrade(&self.state),
            ctx: self.ctx.clone(),
        }
    }
}

struct WeakMenu {
    widget: WeakWidget,
    scrim: WeakScrim,
    state: Weak<MenuState>,
    ctx: BuildContext,
}

impl WeakMenu {
    fn upgrade(&self) -> Option<DropdownMenu> {
        Some(DropdownMenu {
            widget: self.widget.upgrade()?,
            scrim: self.scrim.upgrade()?,
            state: self.state.upgrade()?,
            ctx: self.ctx.clone(),
        })
    }
}

/// State of a drop-down item.
#[derive(Debug)]
pub struct DropDownItemState {
    /// Shown selection.
    pub current_item: Property<String>,
    /// Interactive features.
    pub interaction: Interaction,
}

impl WidgetFeature for DropDownItemState {
    fn name(&self) -> &'static str {
        "drop_down_item"
    }
}

/// A text with a drop-down arrow, typically opening a [`DropdownMenu`].
#[derive(Clone)]
pub struct DropDownItem {
    widget: Widget,
    /// Selection and interaction state.
    pub state: Rc<DropDownItemState>,
}

widget_wrapper!(DropDownItem);

fn fit_drop_down(widget: &Widget) {
    let children = widget.children();
    let arrangement = Arrangement::spaced(Dp(4.0)).cross(CrossAxisAlignment::Center);
    let extent = row_extent(&children, &arrangement);
    if widget.size.get() != extent {
        widget.size.set(extent);
        return;
    }
    place_row(widget.rect(), &children, &arrangement);
}

impl DropDownItem {
    /// Creates an item showing `text`.
    pub fn new(ctx: &BuildContext, text: impl Into<String>) -> Self {
        let widget = Widget::new(DROP_DOWN_ITEM);
        let surface = Surface::attach(&widget, ctx, SurfaceArgs::new(Role::Transparent));
        let text = text.into();
        let label = Label::new(ctx, LabelArgs::new(text.clone()));
        widget.add_widget(&label);
        widget.add_widget(&Icon::new(
            ctx,
            IconArgs::new(MenuDefaults::DROP_DOWN_ICON).icon_color(Role::OnSurface),
        ));
        let interaction = Interaction::attach(
            &widget,
            ctx,
            &surface.themable,
            Role::OnSurface,
            RippleArgs::default(),
        );
        let state = Rc::new(DropDownItemState {
            current_item: Property::new("current_item", text),
            interaction,
        });
        widget.attach_feature(state.clone());
        propagate_disabled(&widget);
        on_geometry(&widget, fit_drop_down);
        fit_drop_down(&widget);
        let target = label.downgrade();
        state.current_item.bind(move |text| {
            if let Some(label) = target.upgrade().and_then(Label::from_widget) {
                label.set_text(text.clone());
            }
        });
        let target = widget.downgrade();
        label.size.bind(move |_| {
            if let Some(widget) = target.upgrade() {
                fit_drop_down(&widget);
            }
        });
        Self { widget, state }
    }

    /// Shows `text` as the current selection.
    pub fn set_item(&self, text: impl Into<String>) {
        self.state.current_item.set(text.into());
    }

    /// Current selection.
    pub fn current_item(&self) -> String {
        self.state.current_item.get()
    }

    /// Fired when a press is released over the item.
    pub fn on_release(&self) -> &Signal<()> {
        &self.state.interaction.clickable.on_release
    }
}

#[cfg(test)]
mod tests {
    use mdkit_ui::{TouchEvent, TouchPhase, Window};

    use super::*;

    fn tap(window: &Window, at: PxPosition) {
        let down = TouchEvent::new(3, at, TouchPhase::Down, 0.0);
        window.dispatch_touch(&down);
        window.dispatch_touch(&down.with(TouchPhase::Up, at, 0.05));
    }

    fn rect(x: f32, y: f32, w: f32, h: f32) -> PxRect {
        PxRect::from_position_size(PxPosition::new(x, y), PxSize::new(w, h))
    }

    #[test]
    fn auto_position_flips_above_near_the_bottom() {
        let window = PxSize::new(400.0, 800.0);
        let size = PxSize::new(200.0, 160.0);
        let place = |caller, position| menu_position(caller, size, window, position, 4.0);
        let high = place(rect(20.0, 600.0, 100.0, 40.0), MenuPosition::Auto);
        assert_eq!(high, PxPosition::new(20.0, 440.0));
        let low = place(rect(20.0, 60.0, 100.0, 40.0), MenuPosition::Auto);
        assert_eq!(low, PxPosition::new(20.0, 100.0));
        let right = place(rect(380.0, 600.0, 20.0, 40.0), MenuPosition::Bottom);
        assert_eq!(right.x, 196.0);
    }

    #[test]
    fn selecting_an_item_reports_it_and_closes() {
        let window = Window::new(PxSize::new(400.0, 800.0));
        let ctx = BuildContext::new().with_window(window.clone());
        let caller = DropDownItem::new(&ctx, "Apple");
        caller.pos.set(PxPosition::new(20.0, 600.0));
        window.add_widget(&caller);
        let items = ["Apple", "Banana", "Cherry"].map(MenuItemArgs::new).to_vec();
        let menu = DropdownMenu::new(&ctx, &caller, DropdownMenuArgs::default().items(items));
        assert_eq!(menu.size.get().height, 3.0 * 48.0 + 16.0);
        assert_eq!(menu.size.get().width, 112.0);

        let target = caller.clone();
        menu.on_select().connect(move |selection| target.set_item(selection.text.clone()));
        let m = menu.clone();
        caller.on_release().connect(move |_| m.open());
        tap(&window, caller.center());
        assert!(menu.state.is_open.get());
        assert_eq!(menu.rect().top(), caller.pos.get().y);
        ctx.clock.advance(0.2, 0.05);
        assert_eq!(menu.opacity.get(), 1.0);

        let banana = menu.items()[1].clone();
        tap(&window, banana.center());
        assert_eq!(caller.current_item(), "Banana");
        assert!(!menu.state.is_open.get());
        assert!(!window.contains(&menu.scrim));
    }

    #[test]
    fn outside_tap_dismisses_and_disabled_items_do_nothing() {
        let window = Window::new(PxSize::new(400.0, 800.0));
        let ctx = BuildContext::new().with_window(window.clone());
        let caller = Widget::new("Anchor");
        caller.pos.set(PxPosition::new(20.0, 600.0));
        caller.size.set(PxSize::new(100.0, 40.0));
        let items = vec![
            MenuItemArgs::new("Cut").trailing_text("Ctrl+X"),
            MenuItemArgs::new("Paste").disabled(true),
        ];
        let menu = DropdownMenu::new(&ctx, &caller, DropdownMenuArgs::default().items(items));
        let picked = Rc::new(Cell::new(None));
        let p = picked.clone();
        menu.on_select().connect(move |s| p.set(Some(s.index)));
        menu.open();
        tap(&window, menu.items()[1].center());
        assert_eq!(picked.get(), None);
        assert!(menu.state.is_open.get());

        let shortcut = menu.items()[0].children()[1].clone();
        assert_eq!(shortcut.rect().right(), menu.rect().right() - 12.0);

        tap(&window, PxPosition::new(350.0, 50.0));
        assert!(!menu.state.is_open.get());
    }

    #[test]
    fn long_menus_scroll_within_max_height() {
        let ctx = BuildContext::new();
        let caller = Widget::new("Anchor");
        let items = (0..10).map(|i| MenuItemArgs::new(format!("Item {i}"))).collect();
        let menu = DropdownMenu::new(
            &ctx,
            &caller,
            DropdownMenuArgs::default().items(items).max_height(Dp(200.0)),
        );
        assert_eq!(menu.size.get().height, 200.0);
        let last = menu.items()[9].clone();
        assert_eq!(last.opacity.get(), 0.0);
        menu.scroll_by(1000.0);
        assert_eq!(menu.state.scroll_offset.get(), 496.0 - 200.0);
        assert_eq!(last.opacity.get(), 1.0);
    }
}
