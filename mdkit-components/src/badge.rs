//! Small status markers anchored to the top-right corner of another widget.
//!
//! A badge without content renders as a 6 dp dot. Short text or a single
//! icon glyph fits the 16 dp capsule; longer text widens it.

use std::rc::Rc;

use mdkit_ui::{
    Canvas, CanvasLayer, Dp, Instruction, Property, PxPosition, PxRect, PxSize, Widget,
    WidgetFeature,
};

use crate::{
    behaviors::themable::{Themable, ThemedColor},
    context::BuildContext,
    icon_definitions::glyph,
    role::Role,
    shape::Shape,
    surface::{Surface, SurfaceArgs},
};

/// Badge size tokens.
pub struct BadgeDefaults;

impl BadgeDefaults {
    /// Edge of a badge with content.
    pub const SIZE: Dp = Dp(16.0);
    /// Edge of a badge without content.
    pub const DOT: Dp = Dp(6.0);
    /// Width added per character beyond the second.
    pub const CHAR_WIDTH: Dp = Dp(6.0);
    /// Inset of the content.
    pub const PADDING: Dp = Dp(4.0);
}

/// Content feature of a badge.
#[derive(Debug)]
pub struct BadgeContent {
    /// Text or icon name; empty for a dot.
    pub text: Property<String>,
    /// Content color slot.
    pub text_color: Rc<ThemedColor>,
}

impl BadgeContent {
    /// Size of the badge for the current content.
    pub fn preferred_size(&self) -> PxSize {
        self.text.with(|text| {
            if text.is_empty() {
                return PxSize::square_dp(BadgeDefaults::DOT);
            }
            let chars = text.chars().count();
            if chars <= 2 || glyph(text).is_some() {
                return PxSize::square_dp(BadgeDefaults::SIZE);
            }
            let extra = BadgeDefaults::CHAR_WIDTH.0 * (chars - 2) as f64;
            PxSize::from_dp(Dp(BadgeDefaults::SIZE.0 + extra), BadgeDefaults::SIZE)
        })
    }
}

impl WidgetFeature for BadgeContent {
    fn name(&self) -> &'static str {
        "badge"
    }

    fn draw(&self, widget: &Widget, canvas: &mut Canvas) {
        if self.text.with(String::is_empty) {
            return;
        }
        let inset = BadgeDefaults::PADDING.to_pixels_f32();
        let rect = widget.rect();
        canvas.push(CanvasLayer::Main, Instruction::Color(self.text_color.get()));
        canvas.push(
            CanvasLayer::Main,
            Instruction::Rectangle(PxRect::new(
                rect.x + inset,
                rect.y + inset / 2.0,
                (rect.width - 2.0 * inset).max(0.0),
                (rect.height - inset).max(0.0),
            )),
        );
    }
}

/// A status marker.
#[derive(Clone)]
pub struct Badge {
    widget: Widget,
    /// Fill of the marker.
    pub surface: Surface,
    /// Content of the marker.
    pub content: Rc<BadgeContent>,
}

widget_wrapper!(Badge);

impl Badge {
    /// Creates a badge with `text`; empty text yields a dot.
    pub fn new(ctx: &BuildContext, text: impl Into<String>) -> Self {
        let widget = Widget::new("Badge");
        let surface = Surface::attach(
            &widget,
            ctx,
            SurfaceArgs::new(Role::Error).shape(Shape::CAPSULE),
        );
        let themable = Themable::of(&widget, &ctx.theme);
        let content = Rc::new(BadgeContent {
            text: Property::new("text", text.into()),
            text_color: themable.color_slot("text_color", Role::OnError, None),
        });
        widget.attach_feature(content.clone());
        widget.size.set(content.preferred_size());

        let target = widget.downgrade();
        let weak = Rc::downgrade(&content);
        content.text.bind(move |_| {
            if let (Some(widget), Some(content)) = (target.upgrade(), weak.upgrade()) {
                widget.size.set(content.preferred_size());
            }
        });
        Self {
            widget,
            surface,
            content,
        }
    }

    /// Replaces the content.
    pub fn set_text(&self, text: impl Into<String>) {
        self.content.text.set(text.into());
    }

    /// Current content.
    pub fn text(&self) -> String {
        self.content.text.get()
    }

    /// Keeps the badge centered on the top-right corner of `anchor`, inset
    /// so a dot stays inside the anchor bounds.
    pub fn anchor_to(&self, anchor: &Widget) {
        self.place(anchor);
        let badge = self.widget.downgrade();
        let target = anchor.downgrade();
        let follow = Rc::new(move || {
            if let (Some(badge), Some(anchor)) = (badge.upgrade(), target.upgrade()) {
                Badge::place_widget(&badge, &anchor);
            }
        });
        let f = follow.clone();
        anchor.pos.bind(move |_| f());
        let f = follow.clone();
        anchor.size.bind(move |_| f());
        self.widget.size.bind(move |_| follow());
    }

    fn place(&self, anchor: &Widget) {
        Self::place_widget(&self.widget, anchor);
    }

    fn place_widget(badge: &Widget, anchor: &Widget) {
        let rect = anchor.rect();
        let size = badge.size.get();
        let corner = PxPosition::new(rect.right(), rect.top());
        let (x, y) = if size.height < BadgeDefaults::SIZE.to_pixels_f32() {
            (corner.x - size.width, corner.y - size.height)
        } else {
            let half = BadgeDefaults::SIZE.to_pixels_f32() / 2.0;
            (corner.x - half, corner.y - half)
        };
        badge.pos.set(PxPosition::new(x, y));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_follows_content() {
        let ctx = BuildContext::new();
        let badge = Badge::new(&ctx, "");
        assert_eq!(badge.size.get(), PxSize::new(6.0, 6.0));
        badge.set_text("9");
        assert_eq!(badge.size.get(), PxSize::new(16.0, 16.0));
        badge.set_text("99");
        assert_eq!(badge.size.get(), PxSize::new(16.0, 16.0));
        badge.set_text("999+");
        assert_eq!(badge.size.get(), PxSize::new(28.0, 16.0));
        badge.set_text("numeric-10");
        assert_eq!(badge.size.get(), PxSize::new(16.0, 16.0));
    }

    #[test]
    fn badge_sits_on_top_right_corner() {
        let ctx = BuildContext::new();
        let anchor = Widget::new("Anchor");
        anchor.size.set(PxSize::new(24.0, 24.0));
        let badge = Badge::new(&ctx, "3");
        anchor.add_widget(&badge);
        badge.anchor_to(&anchor);
        assert_eq!(badge.pos.get(), PxPosition::new(16.0, 16.0));
        anchor.pos.set(PxPosition::new(100.0, 0.0));
        assert_eq!(badge.pos.get(), PxPosition::new(116.0, 16.0));

        badge.set_text("");
        assert_eq!(badge.pos.get(), PxPosition::new(118.0, 18.0));
    }

    #[test]
    fn badge_uses_error_colors() {
        let ctx = BuildContext::new();
        let badge = Badge::new(&ctx, "1");
        assert_eq!(badge.surface.background.md_bg_color.get(), ctx.theme.color(Role::Error));
        assert_eq!(badge.content.text_color.get(), ctx.theme.color(Role::OnError));
    }
}
