//! An interactive button that displays an icon.
//!
//! ## Usage
//!
//! Use for compact actions where an icon is sufficient to convey the meaning.
//! Icon buttons are circular, ripple from the center outwards and always
//! occupy at least the 48 dp tap target.

use std::rc::Rc;

use derive_setters::Setters;
use mdkit_ui::{Color, Dp, Property, PxPosition, PxSize, Signal, Widget, WidgetFeature};

use crate::{
    behaviors::themable::{ColorBinding, ThemedColor},
    context::BuildContext,
    font_styles::FontRole,
    label::{Icon, IconArgs, tint_content},
    role::Role,
    shape::Shape,
    surface::{Interaction, Surface, SurfaceArgs, on_geometry, propagate_disabled, tap_target},
};

/// Variations of the icon button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IconButtonStyle {
    /// Transparent background, no border. Low emphasis.
    #[default]
    Standard,
    /// Filled background (Primary). High emphasis.
    Filled,
    /// Filled background (Secondary Container). Medium emphasis.
    Tonal,
    /// Transparent background, with border. Medium emphasis.
    Outlined,
}

impl IconButtonStyle {
    /// Container role.
    pub fn container_role(self) -> Role {
        match self {
            IconButtonStyle::Standard | IconButtonStyle::Outlined => Role::Transparent,
            IconButtonStyle::Filled => Role::Primary,
            IconButtonStyle::Tonal => Role::SecondaryContainer,
        }
    }

    /// Icon role.
    pub fn content_role(self) -> Role {
        match self {
            IconButtonStyle::Standard | IconButtonStyle::Outlined => Role::OnSurfaceVariant,
            IconButtonStyle::Filled => Role::OnPrimary,
            IconButtonStyle::Tonal => Role::OnSecondaryContainer,
        }
    }
}

/// Icon button tokens.
pub struct IconButtonDefaults;

impl IconButtonDefaults {
    /// Visual container edge.
    pub const CONTAINER_SIZE: Dp = Dp(40.0);
    /// Outline width of outlined icon buttons.
    pub const OUTLINE_WIDTH: Dp = Dp(1.0);
}

/// Arguments for [`IconButton::new`].
#[derive(Debug, Clone, PartialEq, Setters)]
pub struct IconButtonArgs {
    /// Variant of the button.
    pub style: IconButtonStyle,
    /// Icon name.
    #[setters(into)]
    pub icon: String,
    /// Role overriding the container role.
    #[setters(strip_option, into)]
    pub theme_bg_color: Option<ColorBinding>,
    /// Explicit container color.
    #[setters(strip_option)]
    pub md_bg_color: Option<Color>,
    /// Role overriding the style's icon role.
    #[setters(strip_option, into)]
    pub theme_icon_color: Option<ColorBinding>,
    /// Explicit icon color.
    #[setters(strip_option)]
    pub icon_color: Option<Color>,
    /// Initial disabled state.
    pub disabled: bool,
}

impl IconButtonArgs {
    /// Standard icon button showing `icon`.
    pub fn new(icon: impl Into<String>) -> Self {
        Self {
            style: IconButtonStyle::default(),
            icon: icon.into(),
            theme_bg_color: None,
            md_bg_color: None,
            theme_icon_color: None,
            icon_color: None,
            disabled: false,
        }
    }
}

/// State shared by an icon button and its observers.
#[derive(Debug)]
pub struct IconButtonState {
    /// Variant; changing it re-binds every role.
    pub style: Property<IconButtonStyle>,
    /// Icon color slot.
    pub content_color: Rc<ThemedColor>,
    /// Container features.
    pub surface: Surface,
    /// Interactive features.
    pub interaction: Interaction,
}

impl WidgetFeature for IconButtonState {
    fn name(&self) -> &'static str {
        "icon_button"
    }
}

impl IconButtonState {
    fn apply_style(&self, style: IconButtonStyle) {
        let background = &self.surface.background;
        background.md_bg_color.set_role(style.container_role());
        if style == IconButtonStyle::Outlined {
            background.line_color.set_role(Role::OutlineVariant);
            background
                .line_width
                .set(IconButtonDefaults::OUTLINE_WIDTH.to_pixels_f32());
        } else {
            background.line_width.set(0.0);
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

fn center_icon(widget: &Widget) {
    let c = widget.center();
    for child in widget.children() {
        let size = child.size.get();
        child
            .pos
            .set(PxPosition::new(c.x - size.width / 2.0, c.y - size.height / 2.0));
    }
}

/// A circular button showing one icon.
#[derive(Clone)]
pub struct IconButton {
    widget: Widget,
    /// Glyph child.
    pub icon: Icon,
    /// Style, colors and interaction features.
    pub state: Rc<IconButtonState>,
}

widget_wrapper!(IconButton);

impl IconButton {
    /// Creates an icon button.
    pub fn new(ctx: &BuildContext, args: IconButtonArgs) -> Self {
        Self::with_kind(ctx, "IconButton", args)
    }

    /// Creates an icon button reporting `kind`, for typed child slots.
    pub fn with_kind(ctx: &BuildContext, kind: &'static str, args: IconButtonArgs) -> Self {
        let widget = Widget::new(kind);
        let style = args.style;
        let mut surface_args = SurfaceArgs::new(
            args.theme_bg_color
                .unwrap_or(ColorBinding::Role(style.container_role())),
        )
        .shape(Shape::Ellipse);
        if let Some(color) = args.md_bg_color {
            surface_args = surface_args.bg(ColorBinding::Custom).bg_color(color);
        }
        if style == IconButtonStyle::Outlined {
            surface_args =
                surface_args.outline((Role::OutlineVariant, IconButtonDefaults::OUTLINE_WIDTH));
        }
        let surface = Surface::attach(&widget, ctx, surface_args);
        let content_color = surface.themable.color_slot(
            "icon_color",
            match (args.icon_color, args.theme_icon_color) {
                (Some(_), _) => ColorBinding::Custom,
                (None, Some(binding)) => binding,
                (None, None) => ColorBinding::Role(style.content_role()),
            },
            args.icon_color,
        );
        let interaction =
            Interaction::attach_circular(&widget, ctx, &surface.themable, style.content_role());
        let state = Rc::new(IconButtonState {
            style: Property::new("style", style),
            content_color,
            surface,
            interaction,
        });
        widget.attach_feature(state.clone());
        propagate_disabled(&widget);

        let icon = Icon::new(ctx, IconArgs::new(args.icon).role(FontRole::Medium));
        widget.add_widget(&icon);
        tint_content(&icon, &state.content_color);
        widget.size.set(tap_target(PxSize::square_dp(
            IconButtonDefaults::CONTAINER_SIZE,
        )));

        let weak = Rc::downgrade(&state);
        state.style.bind(move |style| {
            if let Some(state) = weak.upgrade() {
                state.apply_style(*style);
            }
        });
        let target = icon.downgrade();
        let weak = Rc::downgrade(&state);
        state.content_color.binding.bind(move |_| {
            if let (Some(icon), Some(state)) = (target.upgrade(), weak.upgrade()) {
                tint_content(&icon, &state.content_color);
            }
        });
        on_geometry(&widget, center_icon);
        center_icon(&widget);
        widget.disabled.set(args.disabled);
        Self {
            widget,
            icon,
            state,
        }
    }

    /// Button handle for a widget built by [`IconButton::with_kind`].
    pub fn from_widget(widget: Widget) -> Option<Self> {
        let state = widget.feature::<IconButtonState>()?;
        let icon = widget.children().into_iter().find_map(Icon::from_widget)?;
        Some(Self {
            widget,
            icon,
            state,
        })
    }

    /// Effective container color.
    pub fn md_bg_color(&self) -> Color {
        self.state.surface.background.md_bg_color.get()
    }

    /// Effective icon color.
    pub fn icon_color(&self) -> Color {
        self.icon.icon_color()
    }

    /// Fired when a press is released over the button.
    pub fn on_release(&self) -> &Signal<()> {
        &self.state.interaction.clickable.on_release
    }
}

#[cfg(test)]
mod tests {
    use mdkit_ui::{TouchEvent, TouchPhase, Window};

    use super::*;

    #[test]
    fn styles_bind_container_and_icon_roles() {
        let ctx = BuildContext::new();
        let button = IconButton::new(
            &ctx,
            IconButtonArgs::new("heart").style(IconButtonStyle::Filled),
        );
        assert_eq!(button.md_bg_color(), ctx.theme.color(Role::Primary));
        assert_eq!(button.icon_color(), ctx.theme.color(Role::OnPrimary));

        button.state.style.set(IconButtonStyle::Outlined);
        assert_eq!(button.md_bg_color(), Color::TRANSPARENT);
        assert_eq!(button.icon_color(), ctx.theme.color(Role::OnSurfaceVariant));
        assert_eq!(button.state.surface.background.line_width.get(), 1.0);
    }

    #[test]
    fn ripple_is_circular_and_target_square() {
        let ctx = BuildContext::new();
        let button = IconButton::new(&ctx, IconButtonArgs::new("heart"));
        assert!(button.state.interaction.is_circular());
        assert_eq!(button.size.get(), PxSize::new(48.0, 48.0));
        assert_eq!(button.icon.center(), button.center());
    }

    #[test]
    fn press_starts_a_ripple_inside_the_circle() {
        let ctx = BuildContext::new();
        let window = Window::new(PxSize::new(200.0, 200.0));
        let button = IconButton::new(&ctx, IconButtonArgs::new("heart"));
        window.add_widget(&button);
        window.dispatch_touch(&TouchEvent::new(
            1,
            PxPosition::new(24.0, 24.0),
            TouchPhase::Down,
            0.0,
        ));
        assert_eq!(button.state.interaction.ripple.active_ripples(), 1);
    }
}
