//! Material Design cards.
//!
//! ## Usage
//!
//! Group related content into a single elevated, filled or outlined
//! container. Children keep their own placement hints and are laid out
//! against the card bounds.

use std::rc::Rc;

use derive_setters::Setters;
use mdkit_ui::{Color, Dp, Property, Signal, Widget, WidgetFeature};

use crate::{
    behaviors::{
        declarative::ChildPolicy,
        ripple::RippleArgs,
        themable::ColorBinding,
    },
    context::BuildContext,
    error::CompositionError,
    role::Role,
    shape::Shape,
    surface::{Interaction, Surface, SurfaceArgs, on_geometry, propagate_disabled},
    theme::MaterialShapes,
};

/// Card variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CardStyle {
    /// Low container with a shadow.
    #[default]
    Elevated,
    /// Highest container, no shadow.
    Filled,
    /// Surface with an outline.
    Outlined,
}

impl CardStyle {
    /// Container role.
    pub fn container_role(self) -> Role {
        match self {
            CardStyle::Elevated => Role::SurfaceContainerLow,
            CardStyle::Filled => Role::SurfaceContainerHighest,
            CardStyle::Outlined => Role::Surface,
        }
    }

    /// Resting shadow level.
    pub fn elevation_level(self) -> u8 {
        match self {
            CardStyle::Elevated => 1,
            _ => 0,
        }
    }
}

/// Card tokens.
pub struct CardDefaults;

impl CardDefaults {
    /// Corner radius.
    pub const RADIUS: Dp = MaterialShapes::MEDIUM;
    /// Outline width of outlined cards.
    pub const OUTLINE_WIDTH: Dp = Dp(1.0);
}

/// Cards take any child.
pub const CARD_CHILDREN: ChildPolicy = ChildPolicy::any("Card");

/// Arguments for [`Card::new`].
#[derive(Debug, Clone, PartialEq, Setters)]
pub struct CardArgs {
    /// Variant.
    pub style: CardStyle,
    /// Whether presses ripple and emit click signals.
    pub ripple_behavior: bool,
    /// Role overriding the container role.
    #[setters(strip_option, into)]
    pub theme_bg_color: Option<ColorBinding>,
    /// Explicit container color.
    #[setters(strip_option)]
    pub md_bg_color: Option<Color>,
    /// Shadow level overriding the style's level.
    #[setters(strip_option)]
    pub elevation: Option<u8>,
    /// Container outline.
    pub shape: Shape,
}

impl Default for CardArgs {
    fn default() -> Self {
        Self {
            style: CardStyle::default(),
            ripple_behavior: false,
            theme_bg_color: None,
            md_bg_color: None,
            elevation: None,
            shape: Shape::rounded(CardDefaults::RADIUS),
        }
    }
}

/// State shared by a card and its observers.
#[derive(Debug)]
pub struct CardState {
    /// Variant.
    pub style: Property<CardStyle>,
    /// Container features.
    pub surface: Surface,
    /// Interactive features, present with `ripple_behavior`.
    pub interaction: Option<Interaction>,
}

impl WidgetFeature for CardState {
    fn name(&self) -> &'static str {
        "card"
    }
}

impl CardState {
    fn apply_style(&self, style: CardStyle) {
        let background = &self.surface.background;
        background.md_bg_color.set_role(style.container_role());
        if style == CardStyle::Outlined {
            background.line_color.set_role(Role::OutlineVariant);
            background
                .line_width
                .set(CardDefaults::OUTLINE_WIDTH.to_pixels_f32());
        } else {
            background.line_width.set(0.0);
        }
        if let Some(elevation) = &self.surface.elevation {
            elevation.elevation_level.set(style.elevation_level());
        }
    }
}

/// A container card.
#[derive(Clone)]
pub struct Card {
    widget: Widget,
    /// Style and surface features.
    pub state: Rc<CardState>,
    click: Signal<()>,
}

widget_wrapper!(Card);

impl Card {
    /// Creates an empty card.
    pub fn new(ctx: &BuildContext, args: CardArgs) -> Self {
        let widget = Widget::new("Card");
        let style = args.style;
        let mut surface_args = SurfaceArgs::new(
            args.theme_bg_color
                .unwrap_or(ColorBinding::Role(style.container_role())),
        )
        .shape(args.shape)
        .elevation(args.elevation.unwrap_or(style.elevation_level()));
        if let Some(color) = args.md_bg_color {
            surface_args = surface_args.bg(ColorBinding::Custom).bg_color(color);
        }
        if style == CardStyle::Outlined {
            surface_args =
                surface_args.outline((Role::OutlineVariant, CardDefaults::OUTLINE_WIDTH));
        }
        let surface = Surface::attach(&widget, ctx, surface_args);
        let interaction = args.ripple_behavior.then(|| {
            Interaction::attach(
                &widget,
                ctx,
                &surface.themable,
                Role::OnSurface,
                RippleArgs::default(),
            )
        });
        let click = interaction
            .as_ref()
            .map_or_else(Signal::new, |i| i.clickable.on_release.clone());
        let state = Rc::new(CardState {
            style: Property::new("style", style),
            surface,
            interaction,
        });
        widget.attach_feature(state.clone());
        propagate_disabled(&widget);
        on_geometry(&widget, |card| {
            let rect = card.rect();
            for child in card.children() {
                child.apply_layout(rect);
            }
        });

        let weak = Rc::downgrade(&state);
        state.style.bind(move |style| {
            if let Some(state) = weak.upgrade() {
                state.apply_style(*style);
            }
        });
        Self {
            widget,
            state,
            click,
        }
    }

    /// Creates a card holding `children`.
    pub fn compose<I>(
        ctx: &BuildContext,
        args: CardArgs,
        children: I,
    ) -> Result<Self, CompositionError>
    where
        I: IntoIterator,
        I::Item: Into<Widget>,
    {
        let card = Self::new(ctx, args);
        let children = CARD_CHILDREN.add_children(&card.widget, children)?;
        let rect = card.rect();
        for child in children {
            child.disabled.set(card.disabled.get());
            child.apply_layout(rect);
        }
        Ok(card)
    }

    /// Effective container color.
    pub fn md_bg_color(&self) -> Color {
        self.state.surface.background.md_bg_color.get()
    }

    /// Fired on release over a card with `ripple_behavior`; never fires
    /// otherwise.
    pub fn on_release(&self) -> &Signal<()> {
        &self.click
    }
}

#[cfg(test)]
mod tests {
    use mdkit_ui::{PosHint, PxPosition, PxSize, TouchEvent, TouchPhase, Window};

    use super::*;
    use crate::{
        children,
        label::{Label, LabelArgs},
    };

    #[test]
    fn styles_map_to_container_roles() {
        let ctx = BuildContext::new();
        let card = Card::new(&ctx, CardArgs::default());
        assert_eq!(card.md_bg_color(), ctx.theme.color(Role::SurfaceContainerLow));
        assert_eq!(card.state.surface.elevation.as_ref().map(|e| e.elevation_level.get()), Some(1));

        card.state.style.set(CardStyle::Outlined);
        assert_eq!(card.md_bg_color(), ctx.theme.color(Role::Surface));
        assert_eq!(card.state.surface.background.line_width.get(), 1.0);
        assert_eq!(card.state.surface.elevation.as_ref().map(|e| e.elevation_level.get()), Some(0));
    }

    #[test]
    fn children_follow_hints_inside_card() {
        let ctx = BuildContext::new();
        let title = Label::new(&ctx, LabelArgs::new("Title"));
        title.pos_hint.set(PosHint::CENTER);
        let card = Card::compose(&ctx, CardArgs::default(), children![title.clone()]).unwrap();
        card.pos.set(PxPosition::new(100.0, 100.0));
        assert_eq!(title.center(), card.center());
        card.size.set(PxSize::new(300.0, 200.0));
        assert_eq!(title.center(), card.center());
    }

    #[test]
    fn ripple_behavior_enables_clicks() {
        let ctx = BuildContext::new();
        let window = Window::new(PxSize::new(400.0, 400.0));
        let plain = Card::new(&ctx, CardArgs::default());
        assert!(plain.state.interaction.is_none());

        let card = Card::new(&ctx, CardArgs::default().ripple_behavior(true));
        window.add_widget(&card);
        let clicked = Rc::new(std::cell::Cell::new(false));
        let c = clicked.clone();
        card.on_release().connect(move |_| c.set(true));
        let down = TouchEvent::new(1, PxPosition::new(10.0, 10.0), TouchPhase::Down, 0.0);
        window.dispatch_touch(&down);
        window.dispatch_touch(&down.with(TouchPhase::Up, PxPosition::new(10.0, 10.0), 0.1));
        assert!(clicked.get());
    }
}
