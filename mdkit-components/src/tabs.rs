//! Tabs: a row of destinations above swappable content.
//!
//! ## Usage
//!
//! Compose [`TabsItem`]s from an icon and/or a text, then pass them with one
//! content widget per tab to [`Tabs::compose`]. Tapping a tab shows its
//! content, slides the indicator under it and fires `on_tab_switch`. Hidden
//! content is detached, never destroyed.

use std::{
    cell::{Cell, RefCell},
    rc::Rc,
};

use derive_setters::Setters;
use mdkit_ui::{
    Animation, AnimationHandle, Canvas, CanvasLayer, Dp, Easing, Instruction, Property,
    PxPosition, PxRect, PxSize, Signal, Widget, WidgetFeature,
};
use tracing::{debug, warn};

use crate::{
    behaviors::{
        declarative::ChildPolicy,
        ripple::RippleArgs,
        themable::{Themable, ThemedColor},
    },
    context::BuildContext,
    error::CompositionError,
    font_styles::FontRole,
    label::{Icon, IconArgs, Label, LabelArgs, content_slot},
    role::Role,
    surface::{Interaction, Surface, SurfaceArgs, on_geometry, propagate_disabled},
};

/// Tabs tokens.
pub struct TabsDefaults;

impl TabsDefaults {
    /// Bar height of text-only or icon-only tabs.
    pub const HEIGHT: Dp = Dp(48.0);
    /// Bar height of primary tabs with icon and text.
    pub const HEIGHT_WITH_ICON: Dp = Dp(64.0);
    /// Narrowest tab when tabs do not stretch.
    pub const MIN_TAB_WIDTH: Dp = Dp(90.0);
    /// Horizontal tab padding.
    pub const PADDING: Dp = Dp(16.0);
    /// Gap between icon and text.
    pub const SPACING: Dp = Dp(2.0);
    /// Indicator thickness of primary tabs.
    pub const PRIMARY_INDICATOR: Dp = Dp(3.0);
    /// Indicator thickness of secondary tabs.
    pub const SECONDARY_INDICATOR: Dp = Dp(2.0);
    /// Narrowest primary indicator.
    pub const MIN_INDICATOR_WIDTH: Dp = Dp(24.0);
    /// Divider thickness under the bar.
    pub const DIVIDER: Dp = Dp(1.0);
    /// Indicator slide in seconds.
    pub const INDICATOR_DURATION: f64 = 0.2;
}

/// Kind of a tab.
pub const ITEM: &str = "TabsItem";
/// Kind of a tab icon.
pub const ITEM_ICON: &str = "TabsItemIcon";
/// Kind of a tab text.
pub const ITEM_TEXT: &str = "TabsItemText";
/// Kind of the content container.
pub const CONTENT: &str = "TabsContent";

/// Slots a tab accepts.
pub const TABS_ITEM_CHILDREN: ChildPolicy = ChildPolicy::new(ITEM, &[ITEM_ICON, ITEM_TEXT]);
/// Slots a tab bar accepts.
pub const TABS_CHILDREN: ChildPolicy = ChildPolicy::new("Tabs", &[ITEM]);

/// Primary tabs sit under the app bar; secondary tabs divide a section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TabsType {
    /// Icon above text, short indicator under the content.
    #[default]
    Primary,
    /// Icon beside text, indicator across the whole tab.
    Secondary,
}

/// Tab icon.
pub fn tabs_item_icon(ctx: &BuildContext, icon: impl Into<String>) -> Icon {
    Icon::with_kind(ctx, ITEM_ICON, IconArgs::new(icon))
}

/// Tab text.
pub fn tabs_item_text(ctx: &BuildContext, text: impl Into<String>) -> Label {
    Label::with_kind(
        ctx,
        ITEM_TEXT,
        LabelArgs::new(text)
            .font_style("Title")
            .role(FontRole::Small)
            .text_color(Role::OnSurfaceVariant),
    )
}

/// State of one tab.
#[derive(Debug)]
pub struct TabsItemState {
    /// Whether the tab is the current one.
    pub active: Property<bool>,
    /// Container features.
    pub surface: Surface,
    /// Interactive features.
    pub interaction: Interaction,
    layout: Cell<TabsType>,
}

impl WidgetFeature for TabsItemState {
    fn name(&self) -> &'static str {
        "tabs_item"
    }
}

fn part(widget: &Widget, kind: &str) -> Option<Widget> {
    widget.children().into_iter().find(|c| c.kind() == kind)
}

/// Extent of the icon and text of a tab, laid out for `tabs_type`.
fn content_extent(widget: &Widget, tabs_type: TabsType) -> PxSize {
    let spacing = TabsDefaults::SPACING.to_pixels_f32();
    let parts: Vec<PxSize> = [ITEM_ICON, ITEM_TEXT]
        .into_iter()
        .filter_map(|kind| part(widget, kind))
        .map(|c| c.size.get())
        .collect();
    let gaps = parts.len().saturating_sub(1) as f32 * spacing;
    match tabs_type {
        TabsType::Primary => PxSize::new(
            parts.iter().map(|s| s.width).fold(0.0, f32::max),
            parts.iter().map(|s| s.height).sum::<f32>() + gaps,
        ),
        TabsType::Secondary => PxSize::new(
            parts.iter().map(|s| s.width).sum::<f32>() + gaps,
            parts.iter().map(|s| s.height).fold(0.0, f32::max),
        ),
    }
}

fn layout_item(widget: &Widget) {
    let Some(state) = widget.feature::<TabsItemState>() else {
        return;
    };
    let tabs_type = state.layout.get();
    let rect = widget.rect();
    let spacing = TabsDefaults::SPACING.to_pixels_f32();
    let extent = content_extent(widget, tabs_type);
    let center = rect.center();
    let (icon, text) = (part(widget, ITEM_ICON), part(widget, ITEM_TEXT));
    match tabs_type {
        TabsType::Primary => {
            let mut top = center.y + extent.height / 2.0;
            for child in [icon, text].into_iter().flatten() {
                let size = child.size.get();
                top -= size.height;
                child
                    .pos
                    .set(PxPosition::new(center.x - size.width / 2.0, top));
                top -= spacing;
            }
        }
        TabsType::Secondary => {
            let mut left = center.x - extent.width / 2.0;
            for child in [icon, text].into_iter().flatten() {
                let size = child.size.get();
                child
                    .pos
                    .set(PxPosition::new(left, center.y - size.height / 2.0));
                left += size.width + spacing;
            }
        }
    }
}

/// One tab.
#[derive(Clone)]
pub struct TabsItem {
    widget: Widget,
    /// Selection and interaction state.
    pub state: Rc<TabsItemState>,
}

widget_wrapper!(TabsItem);

impl TabsItem {
    /// Creates a tab from an icon and/or a text.
    pub fn compose<I>(ctx: &BuildContext, children: I) -> Result<Self, CompositionError>
    where
        I: IntoIterator,
        I::Item: Into<Widget>,
    {
        let widget = Widget::new(ITEM);
        let surface = Surface::attach(&widget, ctx, SurfaceArgs::new(Role::Transparent));
        TABS_ITEM_CHILDREN.add_children(&widget, children)?;
        let interaction = Interaction::attach(
            &widget,
            ctx,
            &surface.themable,
            Role::OnSurface,
            RippleArgs::default(),
        );
        let state = Rc::new(TabsItemState {
            active: Property::new("active", false),
            surface,
            interaction,
            layout: Cell::new(TabsType::Primary),
        });
        widget.attach_feature(state.clone());
        propagate_disabled(&widget);
        on_geometry(&widget, layout_item);
        Ok(Self { widget, state })
    }

    /// Tab handle for a widget built by [`TabsItem::compose`].
    pub fn from_widget(widget: Widget) -> Option<Self> {
        let state = widget.feature::<TabsItemState>()?;
        Some(Self { widget, state })
    }

    /// Text of the tab, or empty.
    pub fn text(&self) -> String {
        part(&self.widget, ITEM_TEXT)
            .and_then(|c| Label::core_of(&c))
            .map(|core| core.text.get())
            .unwrap_or_default()
    }

    /// Icon name of the tab, if any.
    pub fn icon(&self) -> Option<String> {
        part(&self.widget, ITEM_ICON)
            .and_then(Icon::from_widget)
            .map(|icon| icon.core.icon.get())
    }

    /// Fired when a press is released over the tab.
    pub fn on_release(&self) -> &Signal<()> {
        &self.state.interaction.clickable.on_release
    }
}

/// Arguments for [`Tabs::compose`].
#[derive(Debug, Clone, Copy, PartialEq, Setters)]
pub struct TabsArgs {
    /// Primary or secondary tabs.
    pub tabs_type: TabsType,
    /// Share the width equally instead of sizing tabs to their content.
    pub allow_stretch: bool,
    /// Tab shown first.
    pub current: usize,
    /// Animate the indicator between tabs.
    pub indicator_anim: bool,
}

impl Default for TabsArgs {
    fn default() -> Self {
        Self {
            tabs_type: TabsType::Primary,
            allow_stretch: true,
            current: 0,
            indicator_anim: true,
        }
    }
}

/// A tab change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabChange {
    /// Previously shown tab.
    pub old: usize,
    /// Newly shown tab.
    pub new: usize,
    /// Text of the new tab.
    pub text: String,
}

/// Selection, indicator and content of a tab bar.
pub struct TabsState {
    /// Primary or secondary tabs.
    pub tabs_type: TabsType,
    /// Share the width equally.
    pub allow_stretch: bool,
    /// Animate the indicator.
    pub indicator_anim: Property<bool>,
    /// Index of the shown tab.
    pub current: Property<usize>,
    /// Fired after the shown tab changed.
    pub on_tab_switch: Signal<TabChange>,
    /// Indicator rect relative to the bottom-left corner of the bar.
    pub indicator: Property<PxRect>,
    /// Indicator color slot.
    pub indicator_color: Rc<ThemedColor>,
    /// Divider color slot.
    pub divider_color: Rc<ThemedColor>,
    slides: Vec<Widget>,
    content: Widget,
    slide: RefCell<Option<AnimationHandle>>,
    ctx: BuildContext,
}

impl std::fmt::Debug for TabsState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TabsState")
            .field("tabs_type", &self.tabs_type)
            .field("current", &self.current.get())
            .field("indicator", &self.indicator.get())
            .finish_non_exhaustive()
    }
}

impl TabsState {
    fn bar_height(&self, items: &[TabsItem]) -> f32 {
        let both = items
            .iter()
            .any(|i| part(i, ITEM_ICON).is_some() && part(i, ITEM_TEXT).is_some());
        if self.tabs_type == TabsType::Primary && both {
            TabsDefaults::HEIGHT_WITH_ICON.to_pixels_f32()
        } else {
            TabsDefaults::HEIGHT.to_pixels_f32()
        }
    }

    /// Indicator rect under `item`, relative to the bar origin.
    fn indicator_for(&self, bar: PxRect, item: &TabsItem) -> PxRect {
        let rect = item.rect();
        let x = rect.x - bar.x;
        match self.tabs_type {
            TabsType::Primary => {
                let thickness = TabsDefaults::PRIMARY_INDICATOR.to_pixels_f32();
                let width = content_extent(item, TabsType::Primary)
                    .width
                    .max(TabsDefaults::MIN_INDICATOR_WIDTH.to_pixels_f32())
                    .min(rect.width);
                PxRect::new(x + (rect.width - width) / 2.0, 0.0, width, thickness)
            }
            TabsType::Secondary => PxRect::new(
                x,
                0.0,
                rect.width,
                TabsDefaults::SECONDARY_INDICATOR.to_pixels_f32(),
            ),
        }
    }
}

impl WidgetFeature for TabsState {
    fn name(&self) -> &'static str {
        "tabs"
    }

    fn draw(&self, widget: &Widget, canvas: &mut Canvas) {
        let items = items_of(widget);
        let Some(first) = items.first() else {
            return;
        };
        let bar_bottom = first.pos.get().y;
        let rect = widget.rect();
        canvas.push(CanvasLayer::Main, Instruction::Color(self.divider_color.get()));
        canvas.push(
            CanvasLayer::Main,
            Instruction::Rectangle(PxRect::new(
                rect.x,
                bar_bottom,
                rect.width,
                TabsDefaults::DIVIDER.to_pixels_f32(),
            )),
        );
        let indicator = self.indicator.get();
        let on_screen = PxRect::new(
            rect.x + indicator.x,
            bar_bottom + indicator.y,
            indicator.width,
            indicator.height,
        );
        canvas.push(CanvasLayer::Main, Instruction::Color(self.indicator_color.get()));
        let instruction = match self.tabs_type {
            // Only the top corners are rounded.
            TabsType::Primary => {
                let r = on_screen.height;
                Instruction::RoundedRectangle {
                    rect: on_screen,
                    radius: [r, r, 0.0, 0.0],
                }
            }
            TabsType::Secondary => Instruction::Rectangle(on_screen),
        };
        canvas.push(CanvasLayer::Main, instruction);
    }

    fn cancel_transient(&self, _widget: &Widget) {
        if let Some(slide) = self.slide.borrow_mut().take() {
            slide.cancel();
        }
    }

    fn on_destroy(&self, _widget: &Widget) {
        for slide in &self.slides {
            if slide.parent().is_none() {
                slide.destroy();
            }
        }
    }
}

fn items_of(widget: &Widget) -> Vec<TabsItem> {
    widget
        .children()
        .into_iter()
        .filter_map(TabsItem::from_widget)
        .collect()
}

fn layout(widget: &Widget) {
    let Some(state) = widget.feature::<TabsState>() else {
        return;
    };
    let rect = widget.rect();
    let items = items_of(widget);
    let height = state.bar_height(&items);
    let bar = PxRect::new(rect.x, rect.top() - height, rect.width, height);
    let padding = 2.0 * TabsDefaults::PADDING.to_pixels_f32();
    let min = TabsDefaults::MIN_TAB_WIDTH.to_pixels_f32();
    let mut left = bar.x;
    for item in &items {
        let width = if state.allow_stretch && !items.is_empty() {
            bar.width / items.len() as f32
        } else {
            (content_extent(item, state.tabs_type).width + padding).max(min)
        };
        item.pos.set(PxPosition::new(left, bar.y));
        item.size.set(PxSize::new(width, height));
        left += width;
    }
    state.content.pos.set(rect.position());
    state
        .content
        .size
        .set(PxSize::new(rect.width, (rect.height - height).max(0.0)));
    if state.slide.borrow().as_ref().is_none_or(|s| !s.is_running())
        && let Some(item) = items.get(state.current.get())
    {
        state.indicator.set(state.indicator_for(bar, item));
    }
}

fn fill(widget: &Widget) {
    let rect = widget.rect();
    for child in widget.children() {
        child.pos.set(rect.position());
        child.size.set(rect.size());
    }
}

/// A tab bar with its content.
#[derive(Clone)]
pub struct Tabs {
    widget: Widget,
    /// Selection, indicator and content.
    pub state: Rc<TabsState>,
}

widget_wrapper!(Tabs);

impl Tabs {
    /// Creates the bar from `items` and one content widget per tab, in the
    /// same order. Tabs without content show nothing below the bar.
    pub fn compose<I, S>(
        ctx: &BuildContext,
        args: TabsArgs,
        items: I,
        slides: S,
    ) -> Result<Self, CompositionError>
    where
        I: IntoIterator,
        I::Item: Into<Widget>,
        S: IntoIterator,
        S::Item: Into<Widget>,
    {
        let widget = Widget::new("Tabs");
        let items = TABS_CHILDREN.add_children(&widget, items)?;
        let slides: Vec<Widget> = slides.into_iter().map(Into::into).collect();
        if slides.len() != items.len() {
            warn!(
                tabs = items.len(),
                slides = slides.len(),
                "tab and content counts differ"
            );
        }
        let content = Widget::new(CONTENT);
        on_geometry(&content, fill);
        widget.add_widget(&content);
        let themable = Themable::of(&widget, &ctx.theme);
        let current = args.current.min(items.len().saturating_sub(1));
        let state = Rc::new(TabsState {
            tabs_type: args.tabs_type,
            allow_stretch: args.allow_stretch,
            indicator_anim: Property::new("indicator_anim", args.indicator_anim),
            current: Property::new("current", current),
            on_tab_switch: Signal::new(),
            indicator: Property::new("indicator", PxRect::default()),
            indicator_color: themable.color_slot("indicator_color", Role::Primary, None),
            divider_color: themable.color_slot("divider_color", Role::SurfaceVariant, None),
            slides,
            content,
            slide: RefCell::new(None),
            ctx: ctx.clone(),
        });
        widget.attach_feature(state.clone());
        let tabs = Self { widget, state };
        for (index, item) in items_of(&tabs.widget).into_iter().enumerate() {
            item.state.layout.set(args.tabs_type);
            let target = tabs.widget.downgrade();
            item.on_release().connect(move |_| {
                if let Some(tabs) = target.upgrade().and_then(Tabs::from_widget) {
                    tabs.switch_tab(index);
                }
            });
        }
        tabs.size.set(PxSize::new(
            tabs.size.get().width.max(tabs.natural_width()),
            tabs.state.bar_height(&tabs.get_tabs_list()),
        ));
        propagate_disabled(&tabs.widget);
        on_geometry(&tabs.widget, layout);
        layout(&tabs.widget);
        tabs.show(current);
        Ok(tabs)
    }

    /// Tabs handle for a widget built by [`Tabs::compose`].
    pub fn from_widget(widget: Widget) -> Option<Self> {
        let state = widget.feature::<TabsState>()?;
        Some(Self { widget, state })
    }

    fn natural_width(&self) -> f32 {
        let padding = 2.0 * TabsDefaults::PADDING.to_pixels_f32();
        let min = TabsDefaults::MIN_TAB_WIDTH.to_pixels_f32();
        self.get_tabs_list()
            .iter()
            .map(|item| (content_extent(item, self.state.tabs_type).width + padding).max(min))
            .sum()
    }

    fn show(&self, index: usize) {
        for (position, item) in self.get_tabs_list().iter().enumerate() {
            let active = position == index;
            item.state.active.set(active);
            let role = match (active, self.state.tabs_type) {
                (true, TabsType::Primary) => Role::Primary,
                (true, TabsType::Secondary) => Role::OnSurface,
                (false, _) => Role::OnSurfaceVariant,
            };
            for child in item.children() {
                if let Some(slot) = content_slot(&child) {
                    slot.set_role(role);
                }
            }
        }
        let content = &self.state.content;
        content.clear_widgets();
        if let Some(slide) = self.state.slides.get(index) {
            content.add_widget(slide);
            fill(content);
        }
    }

    /// Shows tab `index`. Out-of-range and disabled tabs are ignored.
    pub fn switch_tab(&self, index: usize) {
        let items = self.get_tabs_list();
        let Some(item) = items.get(index) else {
            warn!(index, tabs = items.len(), "no such tab");
            return;
        };
        let old = self.state.current.get();
        if old == index || item.is_effectively_disabled() {
            return;
        }
        if let Some(previous) = self.state.slide.borrow_mut().take() {
            previous.cancel();
        }
        let rect = self.rect();
        let height = self.state.bar_height(&items);
        let bar = PxRect::new(rect.x, rect.top() - height, rect.width, height);
        let target = self.state.indicator_for(bar, item);
        if self.state.indicator_anim.get() {
            let slide = Animation::new(TabsDefaults::INDICATOR_DURATION, Easing::OutCubic)
                .animate(&self.state.indicator, target)
                .start(&self.state.ctx.clock);
            *self.state.slide.borrow_mut() = Some(slide);
        } else {
            self.state.indicator.set(target);
        }
        self.state.current.set(index);
        self.show(index);
        let text = item.text();
        debug!(old, new = index, %text, "tab switched");
        self.state.on_tab_switch.emit(&TabChange {
            old,
            new: index,
            text,
        });
    }

    /// Shows the first tab whose text or icon is `name`; `false` when none
    /// matches.
    pub fn switch_tab_by_name(&self, name: &str) -> bool {
        let found = self
            .get_tabs_list()
            .iter()
            .position(|item| item.text() == name || item.icon().as_deref() == Some(name));
        match found {
            Some(index) => {
                self.switch_tab(index);
                true
            }
            None => false,
        }
    }

    /// Index of the shown tab.
    pub fn current_tab(&self) -> usize {
        self.state.current.get()
    }

    /// Tabs in order.
    pub fn get_tabs_list(&self) -> Vec<TabsItem> {
        items_of(&self.widget)
    }

    /// Content widgets in tab order.
    pub fn get_slides_list(&self) -> Vec<Widget> {
        self.state.slides.clone()
    }

    /// The content container below the bar.
    pub fn content(&self) -> Widget {
        self.state.content.clone()
    }

    /// Fired after the shown tab changed.
    pub fn on_tab_switch(&self) -> &Signal<TabChange> {
        &self.state.on_tab_switch
    }
}

#[cfg(test)]
mod tests {
    use mdkit_ui::{TouchEvent, TouchPhase, Window};

    use super::*;
    use crate::children;

    fn tabs(ctx: &BuildContext, args: TabsArgs) -> Tabs {
        let item = |icon: &str, text: &str| {
            TabsItem::compose(ctx, children![tabs_item_icon(ctx, icon), tabs_item_text(ctx, text)])
                .expect("tab children")
        };
        let tabs = Tabs::compose(
            ctx,
            args,
            children![item("airplane", "Flights"), item("bed", "Hotels"), item("map", "Explore")],
            children![Widget::new("Flights"), Widget::new("Hotels"), Widget::new("Explore")],
        )
        .expect("tabs");
        tabs.size.set(PxSize::new(360.0, 400.0));
        tabs
    }

    #[test]
    fn tapping_a_tab_swaps_content_and_slides_the_indicator() {
        let window = Window::new(PxSize::new(360.0, 400.0));
        let ctx = BuildContext::new().with_window(window.clone());
        let tabs = tabs(&ctx, TabsArgs::default());
        window.add_widget(&tabs);
        let items = tabs.get_tabs_list();
        assert_eq!(items[0].size.get(), PxSize::new(120.0, 64.0));
        assert_eq!(items[0].pos.get().y, 336.0);
        assert_eq!(tabs.content().children()[0].kind(), "Flights");
        assert_eq!(tabs.content().size.get().height, 336.0);
        let start = tabs.state.indicator.get();
        assert!(start.right() <= 120.0);

        let changes = Rc::new(RefCell::new(Vec::new()));
        let c = changes.clone();
        tabs.on_tab_switch().connect(move |change| c.borrow_mut().push(change.clone()));
        let at = items[2].center();
        let down = TouchEvent::new(1, at, TouchPhase::Down, 0.0);
        window.dispatch_touch(&down);
        window.dispatch_touch(&down.with(TouchPhase::Up, at, 0.05));

        assert_eq!(tabs.current_tab(), 2);
        assert_eq!(tabs.content().children()[0].kind(), "Explore");
        assert!(tabs.get_slides_list()[0].parent().is_none());
        assert!(!tabs.get_slides_list()[0].is_destroyed());
        assert_eq!(
            *changes.borrow(),
            [TabChange {
                old: 0,
                new: 2,
                text: "Explore".into()
            }]
        );
        ctx.clock.advance(0.3, 0.05);
        let end = tabs.state.indicator.get();
        assert!(end.x >= 240.0);
        assert_eq!(end.height, 3.0);
        assert!(items[2].state.active.get());
        assert!(!items[0].state.active.get());
    }

    #[test]
    fn secondary_indicator_spans_the_tab() {
        let ctx = BuildContext::new();
        let tabs = tabs(
            &ctx,
            TabsArgs::default()
                .tabs_type(TabsType::Secondary)
                .indicator_anim(false),
        );
        assert_eq!(tabs.get_tabs_list()[0].size.get().height, 48.0);
        assert!(tabs.switch_tab_by_name("bed"));
        assert_eq!(tabs.state.indicator.get(), PxRect::new(120.0, 0.0, 120.0, 2.0));
        assert!(!tabs.switch_tab_by_name("Cars"));
        tabs.switch_tab(7);
        assert_eq!(tabs.current_tab(), 1);
    }
}
