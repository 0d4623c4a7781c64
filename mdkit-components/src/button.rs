//! Common buttons in five emphasis styles.
//!
//! ## Usage
//!
//! Trigger an action. A button takes an optional leading [`button_icon`] and
//! a [`button_text`] child; other child kinds are rejected.

use std::rc::Rc;

use derive_setters::Setters;
use mdkit_ui::{Color, Dp, Property, PxSize, Signal, Widget, WidgetFeature};

use crate::{
    behaviors::{
        declarative::ChildPolicy,
        ripple::RippleArgs,
        themable::{ColorBinding, ThemedColor},
    },
    context::BuildContext,
    error::CompositionError,
    font_styles::FontRole,
    label::{Icon, IconArgs, Label, LabelArgs, tint_content},
    layout::{Arrangement, MainAxisAlignment, Padding, place_row, row_extent},
    role::Role,
    shape::Shape,
    surface::{Interaction, Surface, SurfaceArgs, on_geometry, propagate_disabled, tap_target},
};

/// Button emphasis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ButtonStyle {
    /// Tinted container with a shadow.
    Elevated,
    /// Primary container; highest emphasis.
    #[default]
    Filled,
    /// Secondary container.
    Tonal,
    /// Transparent container with an outline.
    Outlined,
    /// Text only.
    Text,
}

impl ButtonStyle {
    /// Container role.
    pub fn container_role(self) -> Role {
        match self {
            ButtonStyle::Elevated => Role::SurfaceContainerLow,
            ButtonStyle::Filled => Role::Primary,
            ButtonStyle::Tonal => Role::SecondaryContainer,
            ButtonStyle::Outlined | ButtonStyle::Text => Role::Transparent,
        }
    }

    /// Label and icon role.
    pub fn content_role(self) -> Role {
        match self {
            ButtonStyle::Elevated | ButtonStyle::Outlined | ButtonStyle::Text => Role::Primary,
            ButtonStyle::Filled => Role::OnPrimary,
            ButtonStyle::Tonal => Role::OnSecondaryContainer,
        }
    }

    /// Resting shadow level.
    pub fn elevation_level(self) -> u8 {
        match self {
            ButtonStyle::Elevated => 1,
            _ => 0,
        }
    }

    /// Whether the container draws an outline.
    pub fn has_outline(self) -> bool {
        self == ButtonStyle::Outlined
    }
}

/// Button layout tokens.
pub struct ButtonDefaults;

impl ButtonDefaults {
    /// Container height.
    pub const HEIGHT: Dp = Dp(40.0);
    /// Horizontal padding without an icon.
    pub const HORIZONTAL_PADDING: Dp = Dp(24.0);
    /// Leading padding when the button starts with an icon.
    pub const ICON_PADDING: Dp = Dp(16.0);
    /// Gap between icon and text.
    pub const ICON_SPACING: Dp = Dp(8.0);
    /// Outline width of outlined buttons.
    pub const OUTLINE_WIDTH: Dp = Dp(1.0);
}

/// Child kinds a button accepts.
pub const BUTTON_CHILDREN: ChildPolicy = ChildPolicy::new("Button", &["ButtonIcon", "ButtonText"]);

/// Arguments for [`Button::new`].
#[derive(Debug, Clone, PartialEq, Setters)]
pub struct ButtonArgs {
    /// Emphasis style.
    pub style: ButtonStyle,
    /// Text child to create.
    #[setters(strip_option, into)]
    pub text: Option<String>,
    /// Leading icon child to create.
    #[setters(strip_option, into)]
    pub icon: Option<String>,
    /// Role overriding the style's container role.
    #[setters(strip_option, into)]
    pub theme_bg_color: Option<ColorBinding>,
    /// Explicit container color.
    #[setters(strip_option)]
    pub md_bg_color: Option<Color>,
    /// Role overriding the style's content role.
    #[setters(strip_option, into)]
    pub theme_text_color: Option<ColorBinding>,
    /// Explicit content color.
    #[setters(strip_option)]
    pub text_color: Option<Color>,
    /// Container outline.
    pub shape: Shape,
    /// Initial disabled state.
    pub disabled: bool,
}

impl ButtonArgs {
    /// Arguments for a button of `style`.
    pub fn new(style: ButtonStyle) -> Self {
        Self {
            style,
            text: None,
            icon: None,
            theme_bg_color: None,
            md_bg_color: None,
            theme_text_color: None,
            text_color: None,
            shape: Shape::CAPSULE,
            disabled: false,
        }
    }
}

impl Default for ButtonArgs {
    fn default() -> Self {
        Self::new(ButtonStyle::default())
    }
}

/// Text child of a button.
pub fn button_text(ctx: &BuildContext, text: impl Into<String>) -> Label {
    Label::with_kind(
        ctx,
        "ButtonText",
        LabelArgs::new(text).font_style("Label").role(FontRole::Large),
    )
}

/// Leading icon child of a button.
pub fn button_icon(ctx: &BuildContext, icon: impl Into<String>) -> Icon {
    Icon::with_kind(ctx, "ButtonIcon", IconArgs::new(icon).role(FontRole::Small))
}

/// State shared by a button and its observers.
#[derive(Debug)]
pub struct ButtonState {
    /// Emphasis style; changing it re-binds every role.
    pub style: Property<ButtonStyle>,
    /// Content color slot the children follow.
    pub content_color: Rc<ThemedColor>,
    /// Container features.
    pub surface: Surface,
    /// Interactive features.
    pub interaction: Interaction,
}

impl WidgetFeature for ButtonState {
    fn name(&self) -> &'static str {
        "button"
    }
}

impl ButtonState {
    fn apply_style(&self, style: ButtonStyle) {
        let background = &self.surface.background;
        background.md_bg_color.set_role(style.container_role());
        if style.has_outline() {
            background.line_color.set_role(Role::Outline);
            background
                .line_width
                .set(ButtonDefaults::OUTLINE_WIDTH.to_pixels_f32());
        } else {
            background.line_width.set(0.0);
        }
        if let Some(elevation) = &self.surface.elevation {
            elevation.elevation_level.set(style.elevation_level());
        }
        self.interaction
            .state_layer
            .layer_color
            .set_role(style.content_role());
        self.interaction
            .ripple
            .ripple_color
            .set_role(style.content_role());
        self.content_color.set_role(style.content_role());
    }
}

fn arrangement(widget: &Widget) -> Arrangement {
    let leading = match widget.children().first() {
        Some(first) if first.kind() == "ButtonIcon" => ButtonDefaults::ICON_PADDING,
        _ => ButtonDefaults::HORIZONTAL_PADDING,
    };
    Arrangement::spaced(ButtonDefaults::ICON_SPACING)
        .main(MainAxisAlignment::Center)
        .padding(Padding {
            left: leading,
            right: ButtonDefaults::HORIZONTAL_PADDING,
            ..Padding::default()
        })
}

fn place_children(widget: &Widget) {
    place_row(widget.rect(), &widget.children(), &arrangement(widget));
}

fn fit(widget: &Widget) {
    let content = row_extent(&widget.children(), &arrangement(widget));
    let height = ButtonDefaults::HEIGHT.to_pixels_f32().max(content.height);
    if !widget.size.set(tap_target(PxSize::new(content.width, height))) {
        place_children(widget);
    }
}

/// A common button.
#[derive(Clone)]
pub struct Button {
    widget: Widget,
    /// Style, colors and interaction features.
    pub state: Rc<ButtonState>,
}

widget_wrapper!(Button);

impl Button {
    /// Creates a button, building the text and icon children named in
    /// `args`.
    pub fn new(ctx: &BuildContext, args: ButtonArgs) -> Self {
        Self::with_kind(ctx, "Button", args)
    }

    /// Like [`Button::new`], reporting `kind` for typed child slots such as
    /// a snackbar action.
    pub fn with_kind(ctx: &BuildContext, kind: &'static str, args: ButtonArgs) -> Self {
        let mut children: Vec<Widget> = Vec::new();
        if let Some(icon) = &args.icon {
            children.push(button_icon(ctx, icon.clone()).into());
        }
        if let Some(text) = &args.text {
            children.push(button_text(ctx, text.clone()).into());
        }
        let button = Self::build(ctx, kind, args);
        button.attach_children(children);
        button
    }

    /// Creates a button from explicit children.
    pub fn compose<I>(
        ctx: &BuildContext,
        args: ButtonArgs,
        children: I,
    ) -> Result<Self, CompositionError>
    where
        I: IntoIterator,
        I::Item: Into<Widget>,
    {
        let children: Vec<Widget> = children.into_iter().map(Into::into).collect();
        for child in &children {
            BUTTON_CHILDREN.check(child)?;
        }
        let button = Self::build(ctx, "Button", args);
        button.attach_children(children);
        Ok(button)
    }

    fn build(ctx: &BuildContext, kind: &'static str, args: ButtonArgs) -> Self {
        let widget = Widget::new(kind);
        let style = args.style;
        let bg = args
            .theme_bg_color
            .unwrap_or(ColorBinding::Role(style.container_role()));
        let surface = Surface::attach(
            &widget,
            ctx,
            SurfaceArgs {
                bg,
                bg_color: args.md_bg_color,
                shape: args.shape,
                elevation: Some(style.elevation_level()),
                outline: style
                    .has_outline()
                    .then_some((Role::Outline, ButtonDefaults::OUTLINE_WIDTH)),
            },
        );
        let content = args
            .theme_text_color
            .unwrap_or(ColorBinding::Role(style.content_role()));
        let content_color = surface
            .themable
            .color_slot("text_color", content, args.text_color);
        let interaction = Interaction::attach(
            &widget,
            ctx,
            &surface.themable,
            style.content_role(),
            RippleArgs::default(),
        );
        let state = Rc::new(ButtonState {
            style: Property::new("style", style),
            content_color,
            surface,
            interaction,
        });
        widget.attach_feature(state.clone());
        propagate_disabled(&widget);

        let weak = Rc::downgrade(&state);
        state.style.bind(move |style| {
            if let Some(state) = weak.upgrade() {
                state.apply_style(*style);
            }
        });
        let target = widget.downgrade();
        let weak = Rc::downgrade(&state);
        state.content_color.binding.bind(move |_| {
            if let (Some(widget), Some(state)) = (target.upgrade(), weak.upgrade()) {
                for child in widget.children() {
                    tint_content(&child, &state.content_color);
                }
            }
        });
        on_geometry(&widget, place_children);
        widget.disabled.set(args.disabled);
        Self { widget, state }
    }

    fn attach_children(&self, children: Vec<Widget>) {
        for child in &children {
            self.widget.add_widget(child);
            child.disabled.set(self.disabled.get());
            tint_content(child, &self.state.content_color);
            let target = self.widget.downgrade();
            child.size.bind(move |_| {
                if let Some(widget) = target.upgrade() {
                    fit(&widget);
                }
            });
        }
        fit(&self.widget);
    }

    /// Recovers the handle of a widget built by [`Button::with_kind`].
    pub fn from_widget(widget: Widget) -> Option<Self> {
        let state = widget.feature::<ButtonState>()?;
        Some(Self { widget, state })
    }

    /// Resizes the button around its content, keeping the minimum tap
    /// target.
    pub fn fit(&self) {
        fit(&self.widget);
    }

    /// Effective container color.
    pub fn md_bg_color(&self) -> Color {
        self.state.surface.background.md_bg_color.get()
    }

    /// Effective content color.
    pub fn text_color(&self) -> Color {
        self.state.content_color.get()
    }

    /// Text of the text child, if any.
    pub fn text(&self) -> Option<String> {
        self.children()
            .iter()
            .find_map(Label::core_of)
            .map(|core| core.text.get())
    }

    /// Fired when the button is pressed.
    pub fn on_press(&self) -> &Signal<()> {
        &self.state.interaction.clickable.on_press
    }

    /// Fired when a press is released over the button.
    pub fn on_release(&self) -> &Signal<()> {
        &self.state.interaction.clickable.on_release
    }

    /// Clicks the button programmatically.
    pub fn click(&self) {
        self.state.interaction.clickable.click(&self.widget);
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::children;

    #[test]
    fn style_selects_roles() {
        let ctx = BuildContext::new();
        let button = Button::new(&ctx, ButtonArgs::new(ButtonStyle::Tonal).text("Go"));
        assert_eq!(button.md_bg_color(), ctx.theme.color(Role::SecondaryContainer));
        assert_eq!(button.text_color(), ctx.theme.color(Role::OnSecondaryContainer));

        button.state.style.set(ButtonStyle::Outlined);
        assert_eq!(button.md_bg_color(), Color::TRANSPARENT);
        assert_eq!(button.state.surface.background.line_width.get(), 1.0);
        let label = Label::core_of(&button.children()[0]).unwrap();
        assert_eq!(label.text_color.get(), ctx.theme.color(Role::Primary));
    }

    #[test]
    fn surface_role_follows_theme_toggle() {
        let ctx = BuildContext::new();
        let button = Button::new(
            &ctx,
            ButtonArgs::new(ButtonStyle::Filled).theme_bg_color(Role::Surface),
        );
        let light = button.md_bg_color();
        assert_eq!(light, ctx.theme.color(Role::Surface));
        ctx.theme.switch_theme();
        assert_ne!(button.md_bg_color(), light);
        assert_eq!(button.md_bg_color(), ctx.theme.color(Role::Surface));
    }

    #[test]
    fn disabling_dims_container_and_children() {
        let ctx = BuildContext::new();
        let button = Button::new(&ctx, ButtonArgs::new(ButtonStyle::Filled).text("Send"));
        let enabled = button.md_bg_color();
        button.disabled.set(true);
        assert!((button.md_bg_color().a - enabled.a * 0.38).abs() < 1e-4);
        let child = &button.children()[0];
        assert!(child.disabled.get());
        let label = Label::core_of(child).unwrap();
        assert!((label.text_color.get().a - 0.38).abs() < 1e-4);

        let clicks = Rc::new(Cell::new(0));
        let c = clicks.clone();
        button.on_release().connect(move |_| c.set(c.get() + 1));
        button.click();
        assert_eq!(clicks.get(), 0);
    }

    #[test]
    fn compose_rejects_foreign_children() {
        let ctx = BuildContext::new();
        let ok = Button::compose(
            &ctx,
            ButtonArgs::default(),
            children![button_icon(&ctx, "plus"), button_text(&ctx, "Add")],
        )
        .unwrap();
        assert_eq!(ok.child_count(), 2);
        assert_eq!(ok.text().as_deref(), Some("Add"));

        let err = Button::compose(
            &ctx,
            ButtonArgs::default(),
            children![Label::new(&ctx, LabelArgs::new("plain"))],
        )
        .unwrap_err();
        assert_eq!(
            err,
            CompositionError::UnsupportedChildType {
                parent: "Button".into(),
                child: "Label".into(),
                accepted: vec!["ButtonIcon".into(), "ButtonText".into()],
            }
        );
    }

    #[test]
    fn size_wraps_content_and_keeps_tap_target() {
        let ctx = BuildContext::new();
        let button = Button::new(&ctx, ButtonArgs::new(ButtonStyle::Text).text("A"));
        assert_eq!(button.size.get().height, 48.0);
        assert!(button.size.get().width >= 48.0);
        let text = &button.children()[0];
        let before = button.size.get().width;
        Label::core_of(text).unwrap().text.set("A much longer label".into());
        assert!(button.size.get().width > before);
        let rect = button.rect();
        assert!(text.rect().x >= rect.x && text.rect().right() <= rect.right());
    }
}
