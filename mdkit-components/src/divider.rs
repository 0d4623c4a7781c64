//! Thin separators between groups of content.

use std::rc::Rc;

use derive_setters::Setters;
use mdkit_ui::{
    Canvas, CanvasLayer, Color, Dp, Instruction, Property, PxRect, PxSize, Widget, WidgetFeature,
};

use crate::{
    behaviors::themable::{ColorBinding, ThemedColor, Themable},
    context::BuildContext,
    role::Role,
};

/// Divider tokens.
pub struct DividerDefaults;

impl DividerDefaults {
    /// Line thickness.
    pub const THICKNESS: Dp = Dp(1.0);
}

/// Direction of the line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Orientation {
    /// Spans the width.
    #[default]
    Horizontal,
    /// Spans the height.
    Vertical,
}

/// Arguments for [`Divider::new`].
#[derive(Debug, Clone, PartialEq, Setters)]
pub struct DividerArgs {
    /// Line direction.
    pub orientation: Orientation,
    /// Line thickness.
    pub divider_width: Dp,
    /// Explicit line color.
    #[setters(strip_option)]
    pub color: Option<Color>,
}

impl Default for DividerArgs {
    fn default() -> Self {
        Self {
            orientation: Orientation::default(),
            divider_width: DividerDefaults::THICKNESS,
            color: None,
        }
    }
}

/// Line feature of a divider.
#[derive(Debug)]
pub struct DividerLine {
    /// Line direction.
    pub orientation: Orientation,
    /// Thickness in pixels.
    pub thickness: Property<f32>,
    /// Line color slot.
    pub color: Rc<ThemedColor>,
}

impl DividerLine {
    /// Rect the line covers inside `bounds`, centered across its axis.
    pub fn line_rect(&self, bounds: PxRect) -> PxRect {
        let t = self.thickness.get();
        match self.orientation {
            Orientation::Horizontal => PxRect::new(
                bounds.x,
                bounds.center().y - t / 2.0,
                bounds.width,
                t,
            ),
            Orientation::Vertical => PxRect::new(
                bounds.center().x - t / 2.0,
                bounds.y,
                t,
                bounds.height,
            ),
        }
    }
}

impl WidgetFeature for DividerLine {
    fn name(&self) -> &'static str {
        "divider"
    }

    fn draw(&self, widget: &Widget, canvas: &mut Canvas) {
        canvas.push(CanvasLayer::Main, Instruction::Color(self.color.get()));
        canvas.push(
            CanvasLayer::Main,
            Instruction::Rectangle(self.line_rect(widget.rect())),
        );
    }
}

/// A horizontal or vertical separator.
#[derive(Clone)]
pub struct Divider {
    widget: Widget,
    /// Line feature.
    pub line: Rc<DividerLine>,
}

widget_wrapper!(Divider);

impl Divider {
    /// Creates a divider.
    pub fn new(ctx: &BuildContext, args: DividerArgs) -> Self {
        let widget = Widget::new("Divider");
        let themable = Themable::of(&widget, &ctx.theme);
        let binding = match args.color {
            Some(_) => ColorBinding::Custom,
            None => ColorBinding::Role(Role::OutlineVariant),
        };
        let line = Rc::new(DividerLine {
            orientation: args.orientation,
            thickness: Property::new("divider_width", args.divider_width.to_pixels_f32()),
            color: themable.color_slot("color", binding, args.color),
        });
        widget.attach_feature(line.clone());
        let t = line.thickness.get();
        let size = widget.size.get();
        widget.size.set(match args.orientation {
            Orientation::Horizontal => PxSize::new(size.width, t),
            Orientation::Vertical => PxSize::new(t, size.height),
        });
        Self { widget, line }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_spans_the_main_axis() {
        let ctx = BuildContext::new();
        let divider = Divider::new(&ctx, DividerArgs::default());
        divider.size.set(PxSize::new(300.0, 9.0));
        let rect = divider.line.line_rect(divider.rect());
        assert_eq!(rect, PxRect::new(0.0, 4.0, 300.0, 1.0));
        assert_eq!(divider.line.color.get(), ctx.theme.color(Role::OutlineVariant));

        let vertical = Divider::new(
            &ctx,
            DividerArgs::default().orientation(Orientation::Vertical),
        );
        assert_eq!(vertical.size.get().width, 1.0);
    }
}
