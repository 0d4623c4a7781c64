//! Top and bottom app bars.
//!
//! ## Usage
//!
//! A top app bar holds a leading button container, a title and a trailing
//! button container. Small bars put all three on one row; medium and large
//! bars move the title to a second row below the buttons.
//!
//! A bottom app bar holds action buttons on the left and an optional
//! floating action button on the right, and can slide out of view while
//! content scrolls.

use std::{
    cell::RefCell,
    rc::{Rc, Weak},
};

use derive_setters::Setters;
use mdkit_ui::{
    Animation, AnimationHandle, Dp, Easing, Property, PxPosition, PxSize, Widget, WidgetFeature,
};
use tracing::{debug, warn};

use crate::{
    behaviors::declarative::ChildPolicy,
    context::BuildContext,
    error::CompositionError,
    font_styles::FontRole,
    icon_button::{IconButton, IconButtonArgs, IconButtonState},
    label::{HAlign, Label, LabelArgs},
    layout::{Arrangement, CrossAxisAlignment, Padding, place_row, row_extent},
    role::Role,
    surface::{Surface, SurfaceArgs, on_geometry, propagate_disabled},
};

/// App bar tokens.
pub struct AppBarDefaults;

impl AppBarDefaults {
    /// Height of small top bars and of the button row of taller bars.
    pub const SMALL_HEIGHT: Dp = Dp(64.0);
    /// Height of medium top bars.
    pub const MEDIUM_HEIGHT: Dp = Dp(112.0);
    /// Height of large top bars.
    pub const LARGE_HEIGHT: Dp = Dp(152.0);
    /// Default bar width.
    pub const WIDTH: Dp = Dp(360.0);
    /// Inset of the button containers.
    pub const BUTTON_PADDING: Dp = Dp(4.0);
    /// Inset of the title.
    pub const TITLE_PADDING: Dp = Dp(16.0);
    /// Gap below the title of medium bars.
    pub const MEDIUM_TITLE_BOTTOM: Dp = Dp(24.0);
    /// Gap below the title of large bars.
    pub const LARGE_TITLE_BOTTOM: Dp = Dp(28.0);
    /// Bottom bar height.
    pub const BOTTOM_HEIGHT: Dp = Dp(80.0);
    /// Inset of the bottom bar's floating action button.
    pub const FAB_PADDING: Dp = Dp(16.0);
    /// Bottom bar elevation.
    pub const BOTTOM_ELEVATION: u8 = 2;
    /// Slide duration of the bottom bar in seconds.
    pub const HIDE_DURATION: f64 = 0.2;
}

/// Kind of a top bar action button.
pub const ACTION_BUTTON: &str = "ActionTopAppBarButton";
/// Kind of the leading button container.
pub const LEADING_CONTAINER: &str = "TopAppBarLeadingButtonContainer";
/// Kind of the trailing button container.
pub const TRAILING_CONTAINER: &str = "TopAppBarTrailingButtonContainer";
/// Kind of the title.
pub const TITLE: &str = "TopAppBarTitle";
/// Kind of a bottom bar action button.
pub const BOTTOM_BUTTON: &str = "BottomAppBarButton";
/// Kind of the bottom bar's floating action button.
pub const FAB_BUTTON: &str = "FabButton";

/// Slots a top app bar accepts.
pub const TOP_APP_BAR_CHILDREN: ChildPolicy =
    ChildPolicy::new("TopAppBar", &[LEADING_CONTAINER, TITLE, TRAILING_CONTAINER]);

/// Slots a button container accepts.
pub const BUTTON_CONTAINER_CHILDREN: ChildPolicy =
    ChildPolicy::new("TopAppBarButtonContainer", &[ACTION_BUTTON]);

/// Slots a bottom app bar accepts.
pub const BOTTOM_APP_BAR_CHILDREN: ChildPolicy =
    ChildPolicy::new("BottomAppBar", &[BOTTOM_BUTTON, FAB_BUTTON]);

/// Height variants of the top app bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TopAppBarType {
    /// One row.
    #[default]
    Small,
    /// Title on a second row.
    Medium,
    /// Title on a taller second row.
    Large,
}

impl TopAppBarType {
    /// Bar height.
    pub fn height(self) -> Dp {
        match self {
            TopAppBarType::Small => AppBarDefaults::SMALL_HEIGHT,
            TopAppBarType::Medium => AppBarDefaults::MEDIUM_HEIGHT,
            TopAppBarType::Large => AppBarDefaults::LARGE_HEIGHT,
        }
    }

    /// Title font style and role.
    pub fn title_font(self) -> (&'static str, FontRole) {
        match self {
            TopAppBarType::Small => ("Title", FontRole::Large),
            TopAppBarType::Medium => ("Headline", FontRole::Small),
            TopAppBarType::Large => ("Headline", FontRole::Medium),
        }
    }
}

/// Action button of a top bar. Leading buttons use `OnSurface`, trailing
/// ones keep `OnSurfaceVariant`; the container decides.
pub fn action_top_app_bar_button(ctx: &BuildContext, icon: impl Into<String>) -> IconButton {
    IconButton::with_kind(ctx, ACTION_BUTTON, IconButtonArgs::new(icon))
}

/// Title of a top bar.
pub fn top_app_bar_title(ctx: &BuildContext, text: impl Into<String>) -> Label {
    let (style, role) = TopAppBarType::Small.title_font();
    Label::with_kind(
        ctx,
        TITLE,
        LabelArgs::new(text)
            .font_style(style)
            .role(role)
            .text_color(Role::OnSurface),
    )
}

fn button_container<I>(
    kind: &'static str,
    content: Role,
    buttons: I,
) -> Result<Widget, CompositionError>
where
    I: IntoIterator,
    I::Item: Into<Widget>,
{
    let widget = Widget::new(kind);
    let buttons = BUTTON_CONTAINER_CHILDREN.add_children(&widget, buttons)?;
    for button in &buttons {
        if let Some(state) = button.feature::<IconButtonState>() {
            state.content_color.set_role(content);
        }
    }
    let arrangement = Arrangement::default();
    widget.size.set(row_extent(&buttons, &arrangement));
    on_geometry(&widget, |container| {
        place_row(container.rect(), &container.children(), &Arrangement::default());
    });
    propagate_disabled(&widget);
    Ok(widget)
}

/// Leading buttons, usually navigation.
pub fn top_app_bar_leading_button_container<I>(buttons: I) -> Result<Widget, CompositionError>
where
    I: IntoIterator,
    I::Item: Into<Widget>,
{
    button_container(LEADING_CONTAINER, Role::OnSurface, buttons)
}

/// Trailing action buttons.
pub fn top_app_bar_trailing_button_container<I>(buttons: I) -> Result<Widget, CompositionError>
where
    I: IntoIterator,
    I::Item: Into<Widget>,
{
    button_container(TRAILING_CONTAINER, Role::OnSurfaceVariant, buttons)
}

/// Arguments for [`TopAppBar::compose`].
#[derive(Debug, Clone, PartialEq, Default, Setters)]
pub struct TopAppBarArgs {
    /// Height variant.
    pub bar_type: TopAppBarType,
    /// Center the title of a small bar.
    pub center_title: bool,
}

/// State of a top app bar.
#[derive(Debug)]
pub struct TopAppBarState {
    /// Height variant.
    pub bar_type: Property<TopAppBarType>,
    /// Whether content scrolls under the bar.
    pub scrolled: Property<bool>,
    /// Center the title of a small bar.
    pub center_title: bool,
    /// Container features.
    pub surface: Surface,
}

impl WidgetFeature for TopAppBarState {
    fn name(&self) -> &'static str {
        "top_app_bar"
    }
}

fn layout_top(widget: &Widget) {
    let Some(state) = widget.feature::<TopAppBarState>() else {
        return;
    };
    let bar_type = state.bar_type.get();
    let rect = widget.rect();
    let row_height = AppBarDefaults::SMALL_HEIGHT.to_pixels_f32();
    let row_mid = rect.top() - row_height / 2.0;
    let button_padding = AppBarDefaults::BUTTON_PADDING.to_pixels_f32();
    let title_padding = AppBarDefaults::TITLE_PADDING.to_pixels_f32();
    let children = widget.children();
    let of_kind = |kind: &str| children.iter().find(|c| c.kind() == kind);

    let mut title_left = rect.x + title_padding;
    if let Some(leading) = of_kind(LEADING_CONTAINER) {
        let size = leading.size.get();
        leading.pos.set(PxPosition::new(
            rect.x + button_padding,
            row_mid - size.height / 2.0,
        ));
        if size.width > 0.0 && bar_type == TopAppBarType::Small {
            title_left = rect.x + button_padding + size.width + button_padding;
        }
    }
    if let Some(trailing) = of_kind(TRAILING_CONTAINER) {
        let size = trailing.size.get();
        trailing.pos.set(PxPosition::new(
            rect.right() - button_padding - size.width,
            row_mid - size.height / 2.0,
        ));
    }
    if let Some(title) = of_kind(TITLE) {
        let size = title.size.get();
        let pos = match bar_type {
            TopAppBarType::Small if state.center_title => {
                PxPosition::new(rect.center().x - size.width / 2.0, row_mid - size.height / 2.0)
            }
            TopAppBarType::Small => PxPosition::new(title_left, row_mid - size.height / 2.0),
            TopAppBarType::Medium => PxPosition::new(
                rect.x + title_padding,
                rect.y + AppBarDefaults::MEDIUM_TITLE_BOTTOM.to_pixels_f32(),
            ),
            TopAppBarType::Large => PxPosition::new(
                rect.x + title_padding,
                rect.y + AppBarDefaults::LARGE_TITLE_BOTTOM.to_pixels_f32(),
            ),
        };
        title.pos.set(pos);
    }
}

fn apply_type(widget: &Widget, bar_type: TopAppBarType) {
    let (style, role) = bar_type.title_font();
    for title in widget.children().iter().filter(|c| c.kind() == TITLE) {
        if let Some(core) = Label::core_of(title)
            && let Err(err) = core.set_font_style(style, role)
        {
            warn!(%err, "top app bar title font not registered");
        }
        if let Some(label) = Label::from_widget(title.clone()) {
            label.fit_text();
        }
    }
    let size = widget.size.get();
    widget
        .size
        .set(PxSize::new(size.width, bar_type.height().to_pixels_f32()));
    layout_top(widget);
}

/// A top app bar.
#[derive(Clone)]
pub struct TopAppBar {
    widget: Widget,
    /// Type and surface state.
    pub state: Rc<TopAppBarState>,
}

widget_wrapper!(TopAppBar);

impl TopAppBar {
    /// Creates a bar from its leading container, title and trailing
    /// container.
    pub fn compose<I>(
        ctx: &BuildContext,
        args: TopAppBarArgs,
        children: I,
    ) -> Result<Self, CompositionError>
    where
        I: IntoIterator,
        I::Item: Into<Widget>,
    {
        let widget = Widget::new("TopAppBar");
        let surface = Surface::attach(&widget, ctx, SurfaceArgs::new(Role::Surface));
        TOP_APP_BAR_CHILDREN.add_children(&widget, children)?;
        let state = Rc::new(TopAppBarState {
            bar_type: Property::new("type", args.bar_type),
            scrolled: Property::new("scrolled", false),
            center_title: args.center_title,
            surface,
        });
        widget.attach_feature(state.clone());
        if args.center_title {
            for title in widget.children().iter().filter(|c| c.kind() == TITLE) {
                if let Some(core) = Label::core_of(title) {
                    core.halign.set(HAlign::Center);
                }
            }
        }
        widget.size.set(PxSize::from_dp(
            AppBarDefaults::WIDTH,
            args.bar_type.height(),
        ));
        propagate_disabled(&widget);
        apply_type(&widget, args.bar_type);
        on_geometry(&widget, layout_top);

        let target = widget.downgrade();
        state.bar_type.bind(move |bar_type| {
            if let Some(widget) = target.upgrade() {
                apply_type(&widget, *bar_type);
            }
        });
        let weak = Rc::downgrade(&state);
        state.scrolled.bind(move |scrolled| {
            if let Some(state) = weak.upgrade() {
                state.surface.background.md_bg_color.set_role(if *scrolled {
                    Role::SurfaceContainer
                } else {
                    Role::Surface
                });
            }
        });
        Ok(Self { widget, state })
    }

    /// The title label, if present.
    pub fn title(&self) -> Option<Label> {
        self.children()
            .into_iter()
            .find(|c| c.kind() == TITLE)
            .and_then(Label::from_widget)
    }

    /// Buttons of the leading or trailing container.
    pub fn buttons(&self, leading: bool) -> Vec<IconButton> {
        let kind = if leading {
            LEADING_CONTAINER
        } else {
            TRAILING_CONTAINER
        };
        self.children()
            .into_iter()
            .filter(|c| c.kind() == kind)
            .flat_map(|c| c.children())
            .filter_map(IconButton::from_widget)
            .collect()
    }

    /// Reports whether content scrolls under the bar; the container tints
    /// while it does.
    pub fn set_scrolled(&self, scrolled: bool) {
        self.state.scrolled.set(scrolled);
    }
}

/// Arguments for [`BottomAppBar::compose`].
#[derive(Debug, Clone, PartialEq, Default, Setters)]
pub struct BottomAppBarArgs {
    /// Slide out while content scrolls down.
    pub allow_hidden: bool,
}

/// State of a bottom app bar.
pub struct BottomAppBarState {
    /// Slide out while content scrolls down.
    pub allow_hidden: Property<bool>,
    /// Share of the bar pushed below its resting place, `[0, 1]`.
    pub hidden_progress: Property<f32>,
    /// Resting bottom edge.
    pub rest_y: Property<f32>,
    /// Container features.
    pub surface: Surface,
    slide: RefCell<Option<AnimationHandle>>,
    ctx: BuildContext,
}

impl std::fmt::Debug for BottomAppBarState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BottomAppBarState")
            .field("allow_hidden", &self.allow_hidden.get())
            .field("hidden_progress", &self.hidden_progress.get())
            .finish_non_exhaustive()
    }
}

impl WidgetFeature for BottomAppBarState {
    fn name(&self) -> &'static str {
        "bottom_app_bar"
    }

    fn on_destroy(&self, _widget: &Widget) {
        if let Some(slide) = self.slide.borrow_mut().take() {
            slide.cancel();
        }
    }
}

impl BottomAppBarState {
    fn slide_to(&self, hidden: f32) {
        if let Some(previous) = self.slide.borrow_mut().take() {
            previous.cancel();
        }
        if self.hidden_progress.get() == hidden {
            return;
        }
        let handle = Animation::new(AppBarDefaults::HIDE_DURATION, Easing::OutCubic)
            .animate(&self.hidden_progress, hidden)
            .start(&self.ctx.clock);
        *self.slide.borrow_mut() = Some(handle);
    }
}

fn layout_bottom(widget: &Widget) {
    let rect = widget.rect();
    let children = widget.children();
    let buttons: Vec<Widget> = children
        .iter()
        .filter(|c| c.kind() == BOTTOM_BUTTON)
        .cloned()
        .collect();
    place_row(
        rect,
        &buttons,
        &Arrangement::default()
            .cross(CrossAxisAlignment::Center)
            .padding(Padding::symmetric(AppBarDefaults::BUTTON_PADDING, Dp(0.0))),
    );
    let padding = AppBarDefaults::FAB_PADDING.to_pixels_f32();
    for fab in children.iter().filter(|c| c.kind() == FAB_BUTTON) {
        let size = fab.size.get();
        fab.pos.set(PxPosition::new(
            rect.right() - padding - size.width,
            rect.center().y - size.height / 2.0,
        ));
    }
}

/// A bottom app bar.
#[derive(Clone)]
pub struct BottomAppBar {
    widget: Widget,
    /// Visibility and surface state.
    pub state: Rc<BottomAppBarState>,
}

widget_wrapper!(BottomAppBar);

/// Action button of a bottom bar.
pub fn bottom_app_bar_button(ctx: &BuildContext, icon: impl Into<String>) -> IconButton {
    IconButton::with_kind(ctx, BOTTOM_BUTTON, IconButtonArgs::new(icon))
}

impl BottomAppBar {
    /// Creates a bar from action buttons and an optional floating action
    /// button.
    pub fn compose<I>(
        ctx: &BuildContext,
        args: BottomAppBarArgs,
        children: I,
    ) -> Result<Self, CompositionError>
    where
        I: IntoIterator,
        I::Item: Into<Widget>,
    {
        let widget = Widget::new("BottomAppBar");
        let surface = Surface::attach(
            &widget,
            ctx,
            SurfaceArgs::new(Role::SurfaceContainer).elevation(AppBarDefaults::BOTTOM_ELEVATION),
        );
        BOTTOM_APP_BAR_CHILDREN.add_children(&widget, children)?;
        let state = Rc::new(BottomAppBarState {
            allow_hidden: Property::new("allow_hidden", args.allow_hidden),
            hidden_progress: Property::new("hidden_progress", 0.0),
            rest_y: Property::new("rest_y", 0.0),
            surface,
            slide: RefCell::new(None),
            ctx: ctx.clone(),
        });
        widget.attach_feature(state.clone());
        widget.size.set(PxSize::from_dp(
            AppBarDefaults::WIDTH,
            AppBarDefaults::BOTTOM_HEIGHT,
        ));
        propagate_disabled(&widget);
        layout_bottom(&widget);
        on_geometry(&widget, layout_bottom);

        let target = widget.downgrade();
        let weak: Weak<BottomAppBarState> = Rc::downgrade(&state);
        state.hidden_progress.bind(move |hidden| {
            if let (Some(widget), Some(state)) = (target.upgrade(), weak.upgrade()) {
                let height = widget.size.get().height;
                let x = widget.pos.get().x;
                widget
                    .pos
                    .set(PxPosition::new(x, state.rest_y.get() - height * hidden));
            }
        });
        Ok(Self { widget, state })
    }

    /// Places the bar with its bottom edge at `y` when shown.
    pub fn set_rest_position(&self, pos: PxPosition) {
        self.state.rest_y.set(pos.y);
        let height = self.size.get().height;
        self.pos.set(PxPosition::new(
            pos.x,
            pos.y - height * self.state.hidden_progress.get(),
        ));
    }

    /// Action buttons in order.
    pub fn action_items(&self) -> Vec<IconButton> {
        self.children()
            .into_iter()
            .filter_map(IconButton::from_widget)
            .collect()
    }

    /// Slides the bar out of view.
    pub fn hide(&self) {
        debug!("bottom app bar hidden");
        self.state.slide_to(1.0);
    }

    /// Slides the bar back in.
    pub fn show(&self) {
        self.state.slide_to(0.0);
    }

    /// Feeds a scroll delta: positive while content moves down. Hides or
    /// shows the bar when `allow_hidden` is set.
    pub fn on_scroll(&self, delta: f32) {
        if !self.state.allow_hidden.get() || delta == 0.0 {
            return;
        }
        if delta > 0.0 {
            self.hide();
        } else {
            self.show();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        children,
        floating_action_button::{FabArgs, FloatingActionButton},
    };

    fn top(ctx: &BuildContext, args: TopAppBarArgs) -> TopAppBar {
        TopAppBar::compose(
            ctx,
            args,
            children![
                top_app_bar_leading_button_container(children![action_top_app_bar_button(
                    ctx, "arrow-left"
                )])
                .expect("leading"),
                top_app_bar_title(ctx, "Inbox"),
                top_app_bar_trailing_button_container(children![
                    action_top_app_bar_button(ctx, "magnify"),
                    action_top_app_bar_button(ctx, "dots-vertical"),
                ])
                .expect("trailing"),
            ],
        )
        .expect("top bar children")
    }

    #[test]
    fn small_bar_puts_everything_on_one_row() {
        let ctx = BuildContext::new();
        let bar = top(&ctx, TopAppBarArgs::default());
        assert_eq!(bar.size.get().height, 64.0);
        let leading = bar.buttons(true);
        let trailing = bar.buttons(false);
        assert_eq!(leading.len(), 1);
        assert_eq!(trailing.len(), 2);
        assert_eq!(leading[0].icon_color(), ctx.theme.color(Role::OnSurface));
        assert_eq!(
            trailing[0].icon_color(),
            ctx.theme.color(Role::OnSurfaceVariant)
        );
        let title = bar.title().expect("title");
        assert_eq!(title.center().y, 32.0);
        // 4 padding + 48 button + 4 gap.
        assert_eq!(title.pos.get().x, 56.0);
        assert_eq!(trailing[1].rect().right(), 356.0);
    }

    #[test]
    fn medium_bar_moves_the_title_down_and_tints_on_scroll() {
        let ctx = BuildContext::new();
        let bar = top(&ctx, TopAppBarArgs::default().bar_type(TopAppBarType::Medium));
        assert_eq!(bar.size.get().height, 112.0);
        let title = bar.title().expect("title");
        assert_eq!(title.pos.get(), PxPosition::new(16.0, 24.0));
        assert_eq!(bar.buttons(true)[0].center().y, 112.0 - 32.0);

        bar.set_scrolled(true);
        assert_eq!(
            bar.state.surface.background.md_bg_color.get(),
            ctx.theme.color(Role::SurfaceContainer)
        );
        bar.state.bar_type.set(TopAppBarType::Large);
        assert_eq!(bar.size.get().height, 152.0);
    }

    #[test]
    fn bottom_bar_hides_while_scrolling_down() {
        let ctx = BuildContext::new();
        let bar = BottomAppBar::compose(
            &ctx,
            BottomAppBarArgs::default().allow_hidden(true),
            children![
                bottom_app_bar_button(&ctx, "delete"),
                bottom_app_bar_button(&ctx, "pencil"),
                FloatingActionButton::new(&ctx, FabArgs::new("plus")),
            ],
        )
        .expect("bottom bar children");
        assert_eq!(bar.action_items().len(), 2);
        let fab = bar
            .children()
            .into_iter()
            .find(|c| c.kind() == FAB_BUTTON)
            .expect("fab");
        assert_eq!(fab.rect().right(), 344.0);
        assert_eq!(fab.center().y, 40.0);

        bar.on_scroll(12.0);
        ctx.clock.advance(0.3, 0.05);
        assert_eq!(bar.pos.get().y, -80.0);
        bar.on_scroll(-3.0);
        ctx.clock.advance(0.3, 0.05);
        assert_eq!(bar.pos.get().y, 0.0);
    }
}
