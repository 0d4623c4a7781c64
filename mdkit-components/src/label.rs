//! Text labels and icon glyphs.
//!
//! ## Usage
//!
//! Labels size themselves from the resolved font style unless
//! `adaptive_size` is turned off. Icons render one glyph of the bundled icon
//! font and may carry a [`Badge`].
//!
//! Text is not shaped here: a label records its color and the rectangle its
//! text occupies, and the backend fills that rectangle with the rendered run.

use std::{cell::RefCell, rc::Rc};

use derive_setters::Setters;
use mdkit_ui::{
    Canvas, CanvasLayer, Color, Dp, Instruction, Property, PxRect, PxSize, Widget, WidgetFeature,
};
use tracing::warn;

use crate::{
    badge::Badge,
    behaviors::themable::{ColorBinding, Themable, ThemedColor},
    context::BuildContext,
    error::FontStyleError,
    font_styles::{FontRole, FontSpec},
    icon_definitions::{MISSING_GLYPH, glyph},
    role::Role,
    theme::ThemeManager,
};

/// Label layout tokens.
pub struct LabelDefaults;

impl LabelDefaults {
    /// Font style of plain labels.
    pub const FONT_STYLE: &'static str = "Body";
    /// Average advance of one character, relative to the font size.
    pub const ADVANCE_FACTOR: f32 = 0.55;
    /// Icon size when the `Icon` style cannot be resolved.
    pub const ICON_SIZE: Dp = Dp(24.0);
}

/// Horizontal alignment of text inside the label bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HAlign {
    /// Flush left.
    #[default]
    Left,
    /// Centered.
    Center,
    /// Flush right.
    Right,
}

/// Arguments for [`Label::new`].
#[derive(Debug, Clone, PartialEq, Setters)]
pub struct LabelArgs {
    /// Text content.
    #[setters(into)]
    pub text: String,
    /// Font style name, e.g. `Body` or `Headline`.
    #[setters(into)]
    pub font_style: String,
    /// Size role inside the style.
    pub role: FontRole,
    /// Role the text color follows.
    #[setters(into)]
    pub text_color: ColorBinding,
    /// Explicit text color.
    #[setters(strip_option)]
    pub custom_color: Option<Color>,
    /// Whether the label resizes to its text.
    pub adaptive_size: bool,
    /// Alignment of the text.
    pub halign: HAlign,
}

impl Default for LabelArgs {
    fn default() -> Self {
        Self {
            text: String::new(),
            font_style: LabelDefaults::FONT_STYLE.to_string(),
            role: FontRole::Large,
            text_color: ColorBinding::Role(Role::OnSurface),
            custom_color: None,
            adaptive_size: true,
            halign: HAlign::Left,
        }
    }
}

impl LabelArgs {
    /// Label showing `text`.
    pub fn new(text: impl Into<String>) -> Self {
        Self::default().text(text)
    }
}

/// Text feature of a label.
#[derive(Debug)]
pub struct LabelCore {
    /// Text content.
    pub text: Property<String>,
    /// Font style name.
    pub font_style: Property<String>,
    /// Size role inside the style.
    pub role: Property<FontRole>,
    /// Text color slot.
    pub text_color: Rc<ThemedColor>,
    /// Whether the widget resizes to the text.
    pub adaptive_size: Property<bool>,
    /// Alignment of the text.
    pub halign: Property<HAlign>,
    theme: Rc<ThemeManager>,
}

impl LabelCore {
    /// Resolved font spec; falls back to the default body style when the
    /// configured one is missing.
    pub fn font_spec(&self) -> FontSpec {
        let style = self.font_style.get();
        let role = self.role.get();
        self.theme.resolve_font_style(&style, role).unwrap_or_else(|err| {
            warn!(%err, "font style missing, using the default body style");
            FontSpec::new("Roboto", 14.0, 20.0)
        })
    }

    /// Switches the font style, rejecting names the registry does not know.
    pub fn set_font_style(&self, style: &str, role: FontRole) -> Result<(), FontStyleError> {
        self.theme.resolve_font_style(style, role)?;
        self.font_style.set(style.to_string());
        self.role.set(role);
        Ok(())
    }

    /// Size of the rendered text.
    pub fn texture_size(&self) -> PxSize {
        let spec = self.font_spec();
        let size = spec.font_size.to_pixels_f32();
        let chars = self.text.with(|t| t.chars().count()) as f32;
        PxSize::new(chars * size * LabelDefaults::ADVANCE_FACTOR, spec.line_height.to_pixels_f32())
    }

    /// Rectangle the text occupies inside `bounds`.
    pub fn text_rect(&self, bounds: PxRect) -> PxRect {
        let text = self.texture_size();
        let width = text.width.min(bounds.width);
        let x = match self.halign.get() {
            HAlign::Left => bounds.x,
            HAlign::Center => bounds.x + (bounds.width - width) / 2.0,
            HAlign::Right => bounds.right() - width,
        };
        let y = bounds.y + (bounds.height - text.height).max(0.0) / 2.0;
        PxRect::new(x, y, width, text.height.min(bounds.height))
    }
}

impl WidgetFeature for LabelCore {
    fn name(&self) -> &'static str {
        "label"
    }

    fn draw(&self, widget: &Widget, canvas: &mut Canvas) {
        if self.text.with(String::is_empty) {
            return;
        }
        canvas.push(CanvasLayer::Main, Instruction::Color(self.text_color.get()));
        canvas.push(CanvasLayer::Main, Instruction::Rectangle(self.text_rect(widget.rect())));
    }
}

/// A line of text.
#[derive(Clone)]
pub struct Label {
    widget: Widget,
    /// Text feature.
    pub core: Rc<LabelCore>,
}

widget_wrapper!(Label);

impl Label {
    /// Creates a label.
    pub fn new(ctx: &BuildContext, args: LabelArgs) -> Self {
        Self::with_kind(ctx, "Label", args)
    }

    /// Creates a label reporting `kind`, for typed child slots such as
    /// `ButtonText`.
    pub fn with_kind(ctx: &BuildContext, kind: &'static str, args: LabelArgs) -> Self {
        let widget = Widget::new(kind);
        let themable = Themable::of(&widget, &ctx.theme);
        let core = Rc::new(LabelCore {
            text: Property::new("text", args.text),
            font_style: Property::new("font_style", args.font_style),
            role: Property::new("role", args.role),
            text_color: themable.color_slot("text_color", args.text_color, args.custom_color),
            adaptive_size: Property::new("adaptive_size", args.adaptive_size),
            halign: Property::new("halign", args.halign),
            theme: ctx.theme.clone(),
        });
        widget.attach_feature(core.clone());

        let label = Self { widget, core };
        label.fit_text();
        let weak = label.widget.downgrade();
        let refit = move || {
            if let Some(widget) = weak.upgrade()
                && let Some(core) = widget.feature::<LabelCore>()
                && core.adaptive_size.get()
            {
                widget.size.set(core.texture_size());
            }
        };
        let refit = Rc::new(refit);
        let r = refit.clone();
        label.core.text.bind(move |_| r());
        let r = refit.clone();
        label.core.font_style.bind(move |_| r());
        let r = refit.clone();
        label.core.role.bind(move |_| r());
        label.core.adaptive_size.bind(move |_| refit());
        label
    }

    /// Resizes the label to its text when `adaptive_size` is on.
    pub fn fit_text(&self) {
        if self.core.adaptive_size.get() {
            self.widget.size.set(self.core.texture_size());
        }
    }

    /// Label handle for `widget` when it carries a label core.
    pub fn from_widget(widget: Widget) -> Option<Self> {
        let core = widget.feature::<LabelCore>()?;
        Some(Self { widget, core })
    }

    /// Finds the label core of an arbitrary widget.
    pub fn core_of(widget: &Widget) -> Option<Rc<LabelCore>> {
        widget.feature::<LabelCore>()
    }

    /// Current text.
    pub fn text(&self) -> String {
        self.core.text.get()
    }

    /// Replaces the text.
    pub fn set_text(&self, text: impl Into<String>) {
        self.core.text.set(text.into());
    }

    /// Effective text color.
    pub fn text_color(&self) -> Color {
        self.core.text_color.get()
    }
}

/// Arguments for [`Icon::new`].
#[derive(Debug, Clone, PartialEq, Setters)]
pub struct IconArgs {
    /// Icon name, e.g. `heart`.
    #[setters(into)]
    pub icon: String,
    /// Size role of the `Icon` font style.
    pub role: FontRole,
    /// Role the glyph color follows.
    #[setters(into)]
    pub icon_color: ColorBinding,
    /// Explicit glyph color.
    #[setters(strip_option)]
    pub custom_color: Option<Color>,
    /// Badge content; a dot when empty.
    #[setters(strip_option, into)]
    pub badge_icon: Option<String>,
}

impl IconArgs {
    /// Icon showing `icon`.
    pub fn new(icon: impl Into<String>) -> Self {
        Self {
            icon: icon.into(),
            role: FontRole::Medium,
            icon_color: ColorBinding::Role(Role::OnSurfaceVariant),
            custom_color: None,
            badge_icon: None,
        }
    }
}

/// Glyph feature of an icon.
pub struct IconCore {
    /// Icon name.
    pub icon: Property<String>,
    /// Glyph color slot.
    pub icon_color: Rc<ThemedColor>,
    /// Glyph size.
    pub font_size: Property<Dp>,
    /// Badge content, `None` for no badge.
    pub badge_icon: Property<Option<String>>,
    badge: RefCell<Option<Badge>>,
    ctx: BuildContext,
}

impl std::fmt::Debug for IconCore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IconCore")
            .field("icon", &self.icon.get())
            .field("badge_icon", &self.badge_icon.get())
            .finish()
    }
}

impl IconCore {
    /// Glyph of the current icon; the box glyph for unknown names.
    pub fn glyph(&self) -> char {
        self.icon.with(|name| glyph(name)).unwrap_or(MISSING_GLYPH)
    }

    fn sync_badge(&self, icon: &Widget) {
        let wanted = self.badge_icon.get();
        let mut slot = self.badge.borrow_mut();
        match (wanted, slot.as_ref()) {
            (None, Some(badge)) => {
                badge.destroy();
                *slot = None;
            }
            (Some(text), Some(badge)) => badge.set_text(text),
            (Some(text), None) => {
                let badge = Badge::new(&self.ctx, text);
                icon.add_widget(&badge);
                badge.anchor_to(icon);
                *slot = Some(badge);
            }
            (None, None) => {}
        }
    }
}

impl WidgetFeature for IconCore {
    fn name(&self) -> &'static str {
        "icon"
    }

    fn draw(&self, widget: &Widget, canvas: &mut Canvas) {
        let edge = self.font_size.get().to_pixels_f32();
        let c = widget.center();
        canvas.push(CanvasLayer::Main, Instruction::Color(self.icon_color.get()));
        canvas.push(
            CanvasLayer::Main,
            Instruction::Rectangle(PxRect::new(c.x - edge / 2.0, c.y - edge / 2.0, edge, edge)),
        );
    }
}

/// A glyph of the icon font.
#[derive(Clone)]
pub struct Icon {
    widget: Widget,
    /// Glyph feature.
    pub core: Rc<IconCore>,
}

widget_wrapper!(Icon);

impl Icon {
    /// Creates an icon.
    pub fn new(ctx: &BuildContext, args: IconArgs) -> Self {
        Self::with_kind(ctx, "Icon", args)
    }

    /// Creates an icon reporting `kind`, for typed child slots.
    pub fn with_kind(ctx: &BuildContext, kind: &'static str, args: IconArgs) -> Self {
        let widget = Widget::new(kind);
        let themable = Themable::of(&widget, &ctx.theme);
        let size = ctx
            .theme
            .resolve_font_style("Icon", args.role)
            .map_or(LabelDefaults::ICON_SIZE, |spec| spec.font_size);
        if glyph(&args.icon).is_none() {
            warn!(icon = %args.icon, "unknown icon name, rendering box");
        }
        let core = Rc::new(IconCore {
            icon: Property::new("icon", args.icon),
            icon_color: themable.color_slot("icon_color", args.icon_color, args.custom_color),
            font_size: Property::new("font_size", size),
            badge_icon: Property::new("badge_icon", None),
            badge: RefCell::new(None),
            ctx: ctx.clone(),
        });
        widget.size.set(PxSize::square_dp(size));
        widget.attach_feature(core.clone());

        let target = widget.downgrade();
        core.font_size.bind(move |size| {
            if let Some(widget) = target.upgrade() {
                widget.size.set(PxSize::square_dp(*size));
            }
        });
        core.icon.bind(|name| {
            if glyph(name).is_none() {
                warn!(icon = %name, "unknown icon name, rendering box");
            }
        });
        let weak = Rc::downgrade(&core);
        let target = widget.downgrade();
        core.badge_icon.bind(move |_| {
            if let (Some(core), Some(widget)) = (weak.upgrade(), target.upgrade()) {
                core.sync_badge(&widget);
            }
        });
        core.badge_icon.set(args.badge_icon);
        Self { widget, core }
    }

    /// Icon handle for `widget` when it carries an icon core.
    pub fn from_widget(widget: Widget) -> Option<Self> {
        let core = widget.feature::<IconCore>()?;
        Some(Self { widget, core })
    }

    /// Current badge, if any.
    pub fn badge(&self) -> Option<Badge> {
        self.core.badge.borrow().clone()
    }

    /// Effective glyph color.
    pub fn icon_color(&self) -> Color {
        self.core.icon_color.get()
    }
}

/// Color slot of a label or icon child, whichever `widget` is.
pub fn content_slot(widget: &Widget) -> Option<Rc<ThemedColor>> {
    widget
        .feature::<LabelCore>()
        .map(|core| core.text_color.clone())
        .or_else(|| widget.feature::<IconCore>().map(|core| core.icon_color.clone()))
}

/// Makes the content color of `child` follow `source`.
pub fn tint_content(child: &Widget, source: &ThemedColor) {
    let Some(slot) = content_slot(child) else {
        return;
    };
    match source.binding.get() {
        ColorBinding::Role(role) => slot.set_role(role),
        ColorBinding::Custom => slot.set_custom(source.enabled_color()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_sizes_to_its_text() {
        let ctx = BuildContext::new();
        let label = Label::new(&ctx, LabelArgs::new("Hello"));
        let width = label.size.get().width;
        assert!(width > 0.0);
        label.set_text("Hello world");
        assert!(label.size.get().width > width);
        assert_eq!(label.size.get().height, 24.0);

        label.core.adaptive_size.set(false);
        label.size.set(PxSize::new(10.0, 10.0));
        label.set_text("Longer text still");
        assert_eq!(label.size.get(), PxSize::new(10.0, 10.0));
    }

    #[test]
    fn unknown_font_style_is_rejected() {
        let ctx = BuildContext::new();
        let label = Label::new(&ctx, LabelArgs::new("x"));
        let err = label.core.set_font_style("Fancy", FontRole::Large).unwrap_err();
        assert!(matches!(err, FontStyleError::UnknownFontStyle { .. }));
        assert_eq!(label.core.font_style.get(), "Body");
    }

    #[test]
    fn label_draws_text_in_its_color() {
        let ctx = BuildContext::new();
        let label = Label::new(&ctx, LabelArgs::new("Hi").text_color(Role::Primary));
        let canvas = label.render().canvas;
        assert_eq!(canvas.main[0], Instruction::Color(ctx.theme.color(Role::Primary)));
    }

    #[test]
    fn unknown_icon_renders_box_glyph() {
        let ctx = BuildContext::new();
        let icon = Icon::new(&ctx, IconArgs::new("no-such-icon"));
        assert_eq!(icon.core.glyph(), MISSING_GLYPH);
        assert_eq!(icon.size.get(), PxSize::new(24.0, 24.0));
        assert_eq!(icon.icon_color(), ctx.theme.color(Role::OnSurfaceVariant));
    }

    #[test]
    fn badge_follows_badge_icon() {
        let ctx = BuildContext::new();
        let icon = Icon::new(&ctx, IconArgs::new("bell"));
        assert!(icon.badge().is_none());
        icon.core.badge_icon.set(Some("3".into()));
        assert_eq!(icon.child_count(), 1);
        icon.core.badge_icon.set(None);
        assert!(icon.badge().is_none());
        assert_eq!(icon.child_count(), 0);
    }
}
