//! Filled, optionally outlined background drawn under a widget's children.

use std::rc::Rc;

use mdkit_ui::{Canvas, CanvasLayer, Color, Instruction, Property, Widget, WidgetFeature};

use crate::{
    behaviors::themable::{ColorBinding, Themable, ThemedColor},
    shape::Shape,
};

/// Background fill and outline of a widget.
#[derive(Debug)]
pub struct BackgroundColor {
    /// Fill color slot (`md_bg_color` / `theme_bg_color`).
    pub md_bg_color: Rc<ThemedColor>,
    /// Outline color slot.
    pub line_color: Rc<ThemedColor>,
    /// Outline width in pixels; zero disables the outline.
    pub line_width: Property<f32>,
    /// Outline of the fill (the `radius` of the widget).
    pub shape: Property<Shape>,
}

impl BackgroundColor {
    /// Attaches a background whose fill follows `bg`.
    pub fn attach(
        widget: &Widget,
        themable: &Themable,
        bg: impl Into<ColorBinding>,
        custom: Option<Color>,
        shape: Shape,
    ) -> Rc<Self> {
        let feature = Rc::new(Self {
            md_bg_color: themable.color_slot("md_bg_color", bg, custom),
            line_color: themable.color_slot(
                "line_color",
                ColorBinding::Custom,
                Some(Color::TRANSPARENT),
            ),
            line_width: Property::new("line_width", 0.0),
            shape: Property::new("radius", shape),
        });
        widget.attach_feature(feature.clone());
        feature
    }

    /// Outline of `widget` as drawn by its background, if it has one.
    pub fn shape_of(widget: &Widget) -> Shape {
        widget
            .feature::<BackgroundColor>()
            .map(|bg| bg.shape.get())
            .unwrap_or_default()
    }
}

impl WidgetFeature for BackgroundColor {
    fn name(&self) -> &'static str {
        "background_color"
    }

    fn draw(&self, widget: &Widget, canvas: &mut Canvas) {
        let rect = widget.rect();
        let shape = self.shape.get();
        let fill = self.md_bg_color.get();
        if fill.a > 0.0 {
            canvas.push(CanvasLayer::Before, Instruction::Color(fill));
            canvas.push(CanvasLayer::Before, shape.fill(rect));
        }
        let width = self.line_width.get();
        let line = self.line_color.get();
        if width > 0.0 && line.a > 0.0 {
            canvas.push(CanvasLayer::Before, Instruction::Color(line));
            canvas.push(
                CanvasLayer::Before,
                Instruction::RoundedLine {
                    rect,
                    radius: shape.radii(&rect),
                    width,
                },
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use mdkit_ui::Dp;

    use super::*;
    use crate::{role::Role, theme::ThemeManager};

    #[test]
    fn draws_fill_then_outline_before_children() {
        let theme = ThemeManager::new();
        let widget = Widget::new("Box");
        let themable = Themable::of(&widget, &theme);
        let bg = BackgroundColor::attach(
            &widget,
            &themable,
            Role::Surface,
            None,
            Shape::rounded(Dp(8.0)),
        );
        bg.line_width.set(1.0);
        bg.line_color.set_custom(Color::BLACK);

        let node = widget.render();
        assert_eq!(node.canvas.before[0], Instruction::Color(theme.color(Role::Surface)));
        assert!(matches!(node.canvas.before[1], Instruction::RoundedRectangle { .. }));
        assert!(matches!(
            node.canvas.before[3],
            Instruction::RoundedLine { width, .. } if width == 1.0
        ));
        assert_eq!(BackgroundColor::shape_of(&widget), Shape::rounded(Dp(8.0)));
    }
}
