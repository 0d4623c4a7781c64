//! Floating action buttons.
//!
//! ## Usage
//!
//! Emphasize a primary action with a prominent floating button. The extended
//! variant carries a label and can collapse to its icon through `fab_state`.

use std::{cell::RefCell, rc::Rc};

use derive_setters::Setters;
use mdkit_ui::{
    Animation, AnimationHandle, Clock, Color, Dp, Easing, Property, PxPosition, PxSize, Signal,
    Widget, WidgetFeature,
};

use crate::{
    behaviors::{
        ripple::RippleArgs,
        themable::{ColorBinding, ThemedColor},
    },
    context::BuildContext,
    font_styles::FontRole,
    label::{Icon, IconArgs, Label, LabelArgs, tint_content},
    layout::{Arrangement, Padding, place_row},
    role::Role,
    shape::Shape,
    surface::{Interaction, Surface, SurfaceArgs, on_geometry, propagate_disabled},
    theme::MaterialShapes,
};

/// Sizes supported by [`FloatingActionButton`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FabSize {
    /// Small floating action button (40dp).
    Small,
    /// Standard floating action button (56dp).
    #[default]
    Standard,
    /// Large floating action button (96dp).
    Large,
}

impl FabSize {
    /// Container edge.
    pub fn container_size(self) -> Dp {
        match self {
            FabSize::Small => FabDefaults::SMALL_SIZE,
            FabSize::Standard => FabDefaults::STANDARD_SIZE,
            FabSize::Large => FabDefaults::LARGE_SIZE,
        }
    }

    /// Icon font role.
    pub fn icon_role(self) -> FontRole {
        match self {
            FabSize::Large => FontRole::Large,
            _ => FontRole::Medium,
        }
    }

    /// Corner shape.
    pub fn shape(self) -> Shape {
        match self {
            FabSize::Small => Shape::rounded(MaterialShapes::MEDIUM),
            FabSize::Standard => Shape::rounded(MaterialShapes::LARGE),
            FabSize::Large => Shape::rounded(MaterialShapes::EXTRA_LARGE),
        }
    }
}

/// Container color family.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FabColor {
    /// Surface container, primary icon.
    Surface,
    /// Primary container.
    #[default]
    Primary,
    /// Secondary container.
    Secondary,
    /// Tertiary container.
    Tertiary,
}

impl FabColor {
    /// Container role.
    pub fn container_role(self) -> Role {
        match self {
            FabColor::Surface => Role::SurfaceContainerHigh,
            FabColor::Primary => Role::PrimaryContainer,
            FabColor::Secondary => Role::SecondaryContainer,
            FabColor::Tertiary => Role::TertiaryContainer,
        }
    }

    /// Icon and label role.
    pub fn content_role(self) -> Role {
        match self {
            FabColor::Surface => Role::Primary,
            FabColor::Primary => Role::OnPrimaryContainer,
            FabColor::Secondary => Role::OnSecondaryContainer,
            FabColor::Tertiary => Role::OnTertiaryContainer,
        }
    }
}

/// Whether an extended button shows its label.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FabState {
    /// Icon only.
    Collapsed,
    /// Icon and label.
    #[default]
    Expanded,
}

/// Material Design defaults for floating action buttons.
pub struct FabDefaults;

impl FabDefaults {
    /// Container size for a small floating action button.
    pub const SMALL_SIZE: Dp = Dp(40.0);
    /// Default container size for a standard floating action button.
    pub const STANDARD_SIZE: Dp = Dp(56.0);
    /// Container size for a large floating action button.
    pub const LARGE_SIZE: Dp = Dp(96.0);
    /// Resting shadow level.
    pub const ELEVATION: u8 = 3;
    /// Shadow level while hovered.
    pub const HOVERED_ELEVATION: u8 = 4;
    /// Padding around the content of an extended button.
    pub const EXTENDED_PADDING: Dp = Dp(16.0);
    /// Gap between icon and label of an extended button.
    pub const EXTENDED_SPACING: Dp = Dp(12.0);
    /// Collapse and expand duration, in seconds.
    pub const STATE_DURATION: f64 = 0.2;
}

/// Arguments for [`FloatingActionButton::new`].
#[derive(Debug, Clone, PartialEq, Setters)]
pub struct FabArgs {
    /// Icon name.
    #[setters(into)]
    pub icon: String,
    /// Container size; ignored by the extended variant.
    pub size: FabSize,
    /// Color family.
    pub color: FabColor,
    /// Label; its presence makes the button extended.
    #[setters(strip_option, into)]
    pub text: Option<String>,
    /// Initial state of an extended button.
    pub fab_state: FabState,
    /// Explicit container color.
    #[setters(strip_option)]
    pub md_bg_color: Option<Color>,
}

impl FabArgs {
    /// Standard button showing `icon`.
    pub fn new(icon: impl Into<String>) -> Self {
        Self {
            icon: icon.into(),
            size: FabSize::default(),
            color: FabColor::default(),
            text: None,
            fab_state: FabState::Expanded,
            md_bg_color: None,
        }
    }
}

/// State shared by a floating action button and its observers.
pub struct FabFeature {
    /// Collapsed or expanded; only meaningful for extended buttons.
    pub fab_state: Property<FabState>,
    /// Content color slot.
    pub content_color: Rc<ThemedColor>,
    /// Container features.
    pub surface: Surface,
    /// Interactive features.
    pub interaction: Interaction,
    size: FabSize,
    clock: Clock,
    tween: RefCell<Option<AnimationHandle>>,
}

impl std::fmt::Debug for FabFeature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FabFeature")
            .field("fab_state", &self.fab_state.get())
            .field("size", &self.size)
            .finish_non_exhaustive()
    }
}

impl WidgetFeature for FabFeature {
    fn name(&self) -> &'static str {
        "floating_action_button"
    }

    fn on_pointer(&self, widget: &Widget, _pos: PxPosition, inside: bool) {
        if let Some(elevation) = &self.surface.elevation {
            let level = if inside && !widget.is_effectively_disabled() {
                FabDefaults::HOVERED_ELEVATION
            } else {
                FabDefaults::ELEVATION
            };
            elevation.elevation_level.set(level);
        }
    }

    fn cancel_transient(&self, _widget: &Widget) {
        if let Some(tween) = self.tween.borrow_mut().take() {
            tween.cancel();
        }
    }
}

fn extended_arrangement() -> Arrangement {
    Arrangement::spaced(FabDefaults::EXTENDED_SPACING)
        .padding(Padding::symmetric(FabDefaults::EXTENDED_PADDING, Dp::ZERO))
}

fn place_content(widget: &Widget) {
    let children = widget.children();
    match children.as_slice() {
        [icon] => {
            let c = widget.center();
            let size = icon.size.get();
            icon.pos
                .set(PxPosition::new(c.x - size.width / 2.0, c.y - size.height / 2.0));
        }
        _ => place_row(widget.rect(), &children, &extended_arrangement()),
    }
}

/// A floating action button, optionally extended with a label.
#[derive(Clone)]
pub struct FloatingActionButton {
    widget: Widget,
    /// Glyph child.
    pub icon: Icon,
    /// Label child of an extended button.
    pub label: Option<Label>,
    /// State and interaction features.
    pub state: Rc<FabFeature>,
}

widget_wrapper!(FloatingActionButton);

impl FloatingActionButton {
    /// Creates a floating action button.
    pub fn new(ctx: &BuildContext, args: FabArgs) -> Self {
        let extended = args.text.is_some();
        let kind = if extended {
            "ExtendedFabButton"
        } else {
            "FabButton"
        };
        let size = if extended {
            FabSize::Standard
        } else {
            args.size
        };
        let widget = Widget::new(kind);
        let mut surface_args = SurfaceArgs::new(args.color.container_role())
            .shape(size.shape())
            .elevation(FabDefaults::ELEVATION);
        if let Some(color) = args.md_bg_color {
            surface_args = surface_args.bg(ColorBinding::Custom).bg_color(color);
        }
        let surface = Surface::attach(&widget, ctx, surface_args);
        let content_color =
            surface
                .themable
                .color_slot("icon_color", args.color.content_role(), None);
        let interaction = Interaction::attach(
            &widget,
            ctx,
            &surface.themable,
            args.color.content_role(),
            RippleArgs::default(),
        );
        let state = Rc::new(FabFeature {
            fab_state: Property::new("fab_state", args.fab_state),
            content_color,
            surface,
            interaction,
            size,
            clock: ctx.clock.clone(),
            tween: RefCell::new(None),
        });
        widget.attach_feature(state.clone());
        propagate_disabled(&widget);

        let icon = Icon::new(ctx, IconArgs::new(args.icon).role(size.icon_role()));
        widget.add_widget(&icon);
        tint_content(&icon, &state.content_color);
        let label = args.text.map(|text| {
            let label = Label::new(
                ctx,
                LabelArgs::new(text).font_style("Label").role(FontRole::Large),
            );
            widget.add_widget(&label);
            tint_content(&label, &state.content_color);
            label
        });

        let fab = Self {
            widget,
            icon,
            label,
            state,
        };
        fab.size.set(fab.target_size(fab.state.fab_state.get()));
        if fab.state.fab_state.get() == FabState::Collapsed
            && let Some(label) = &fab.label
        {
            label.opacity.set(0.0);
        }
        on_geometry(&fab.widget, place_content);
        place_content(&fab.widget);

        let weak = fab.downgrade_handle();
        fab.state.fab_state.bind(move |state| {
            if let Some(fab) = weak.upgrade() {
                fab.animate_to(*state);
            }
        });
        fab
    }

    fn downgrade_handle(&self) -> WeakFab {
        WeakFab {
            widget: self.widget.downgrade(),
            icon: self.icon.downgrade(),
            label: self.label.as_ref().map(|l| l.downgrade()),
        }
    }

    /// Whether the button carries a label.
    pub fn is_extended(&self) -> bool {
        self.label.is_some()
    }

    /// Size for `state`.
    pub fn target_size(&self, state: FabState) -> PxSize {
        let edge = self.state.size.container_size();
        match (&self.label, state) {
            (Some(label), FabState::Expanded) => {
                let width = extended_arrangement().padding.horizontal()
                    + self.icon.size.get().width
                    + FabDefaults::EXTENDED_SPACING.to_pixels_f32()
                    + label.core.texture_size().width;
                PxSize::new(width, edge.to_pixels_f32())
            }
            _ => PxSize::square_dp(edge),
        }
    }

    fn animate_to(&self, state: FabState) {
        let Some(label) = &self.label else {
            return;
        };
        if let Some(previous) = self.state.tween.borrow_mut().take() {
            previous.cancel();
        }
        let opacity = match state {
            FabState::Expanded => 1.0,
            FabState::Collapsed => 0.0,
        };
        let handle = Animation::new(FabDefaults::STATE_DURATION, Easing::OutCubic)
            .animate(&self.widget.size, self.target_size(state))
            .animate(&label.opacity, opacity)
            .start(&self.state.clock);
        *self.state.tween.borrow_mut() = Some(handle);
    }

    /// Effective container color.
    pub fn md_bg_color(&self) -> Color {
        self.state.surface.background.md_bg_color.get()
    }

    /// Fired when a press is released over the button.
    pub fn on_release(&self) -> &Signal<()> {
        &self.state.interaction.clickable.on_release
    }
}

struct WeakFab {
    widget: mdkit_ui::WeakWidget,
    icon: mdkit_ui::WeakWidget,
    label: Option<mdkit_ui::WeakWidget>,
}

impl WeakFab {
    fn upgrade(&self) -> Option<FloatingActionButton> {
        let widget = self.widget.upgrade()?;
        let state = widget.feature::<FabFeature>()?;
        let icon = self.icon.upgrade()?;
        let icon = Icon::from_widget(icon)?;
        let label = match &self.label {
            Some(label) => Some(Label::from_widget(label.upgrade()?)?),
            None => None,
        };
        Some(FloatingActionButton {
            widget,
            icon,
            label,
            state,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sizes_follow_tokens() {
        let ctx = BuildContext::new();
        for (size, edge) in [
            (FabSize::Small, 40.0),
            (FabSize::Standard, 56.0),
            (FabSize::Large, 96.0),
        ] {
            let fab = FloatingActionButton::new(&ctx, FabArgs::new("pencil").size(size));
            assert_eq!(fab.size.get(), PxSize::new(edge, edge));
            assert!(!fab.is_extended());
        }
        let large = FloatingActionButton::new(&ctx, FabArgs::new("pencil").size(FabSize::Large));
        assert_eq!(large.icon.size.get(), PxSize::new(36.0, 36.0));
    }

    #[test]
    fn extended_button_collapses_to_icon() {
        let ctx = BuildContext::new();
        let fab = FloatingActionButton::new(&ctx, FabArgs::new("pencil").text("Compose"));
        assert!(fab.is_extended());
        assert!(fab.size.get().width > 56.0);

        fab.state.fab_state.set(FabState::Collapsed);
        ctx.clock.advance(0.3, 0.05);
        assert_eq!(fab.size.get(), PxSize::new(56.0, 56.0));
        assert_eq!(fab.label.as_ref().map(|l| l.opacity.get()), Some(0.0));
        assert_eq!(fab.icon.center(), fab.center());

        fab.state.fab_state.set(FabState::Expanded);
        ctx.clock.advance(0.3, 0.05);
        assert_eq!(fab.size.get(), fab.target_size(FabState::Expanded));
    }

    #[test]
    fn color_family_binds_roles() {
        let ctx = BuildContext::new();
        let fab = FloatingActionButton::new(&ctx, FabArgs::new("pencil").color(FabColor::Tertiary));
        assert_eq!(fab.md_bg_color(), ctx.theme.color(Role::TertiaryContainer));
        assert_eq!(fab.icon.icon_color(), ctx.theme.color(Role::OnTertiaryContainer));
    }
}
