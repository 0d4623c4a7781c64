//! Scale, rotation and stencil clipping around a widget's draw.
//!
//! [`Transform`] wraps everything the widget records: its prefix goes to the
//! front of the `before` layer and its suffix to the end of the `after`
//! layer. It must therefore be the last feature attached; the other
//! behaviors keep drawing in untransformed widget coordinates.

use std::rc::Rc;

use mdkit_ui::{Canvas, CanvasLayer, Instruction, Property, PxPosition, Widget, WidgetFeature};

use crate::behaviors::background::BackgroundColor;

/// Render transform feature.
#[derive(Debug)]
pub struct Transform {
    /// Horizontal scale factor.
    pub scale_value_x: Property<f32>,
    /// Vertical scale factor.
    pub scale_value_y: Property<f32>,
    /// Extra rotation in degrees, added to the widget's `angle`.
    pub rotate_value_angle: Property<f32>,
    /// Pivot as fractions of the widget bounds, `(0.5, 0.5)` is the center.
    pub origin: Property<(f32, f32)>,
    /// Clip the widget and its children to its shape.
    pub stencil: Property<bool>,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            scale_value_x: Property::new("scale_value_x", 1.0),
            scale_value_y: Property::new("scale_value_y", 1.0),
            rotate_value_angle: Property::new("rotate_value_angle", 0.0),
            origin: Property::new("origin", (0.5, 0.5)),
            stencil: Property::new("stencil", false),
        }
    }
}

impl Transform {
    /// Returns the widget's transform, attaching one when missing.
    pub fn of(widget: &Widget) -> Rc<Self> {
        if let Some(transform) = widget.feature::<Transform>() {
            return transform;
        }
        let transform = Rc::new(Self::default());
        widget.attach_feature(transform.clone());
        transform
    }

    /// Pivot in window coordinates.
    pub fn origin_point(&self, widget: &Widget) -> PxPosition {
        let rect = widget.rect();
        let (fx, fy) = self.origin.get();
        PxPosition::new(rect.x + rect.width * fx, rect.y + rect.height * fy)
    }

    /// Whether the transform changes nothing.
    pub fn is_identity(&self, widget: &Widget) -> bool {
        self.scale_value_x.get() == 1.0
            && self.scale_value_y.get() == 1.0
            && self.total_angle(widget) == 0.0
            && !self.stencil.get()
    }

    fn total_angle(&self, widget: &Widget) -> f32 {
        widget.angle.get() + self.rotate_value_angle.get()
    }
}

impl WidgetFeature for Transform {
    fn name(&self) -> &'static str {
        "transform"
    }

    fn draw(&self, widget: &Widget, canvas: &mut Canvas) {
        if self.is_identity(widget) {
            return;
        }
        let origin = self.origin_point(widget);
        let rect = widget.rect();
        let mut prefix = vec![Instruction::PushMatrix];
        let angle = self.total_angle(widget);
        if angle != 0.0 {
            prefix.push(Instruction::Rotate { angle, origin });
        }
        let (x, y) = (self.scale_value_x.get(), self.scale_value_y.get());
        if x != 1.0 || y != 1.0 {
            prefix.push(Instruction::Scale { x, y, origin });
        }
        let mut suffix = Vec::new();
        if self.stencil.get() {
            let shape = BackgroundColor::shape_of(widget);
            prefix.extend([
                Instruction::StencilPush,
                shape.fill(rect),
                Instruction::StencilUse,
            ]);
            suffix.extend([
                Instruction::StencilUnUse,
                shape.fill(rect),
                Instruction::StencilPop,
            ]);
        }
        suffix.push(Instruction::PopMatrix);

        let before = canvas.layer_mut(CanvasLayer::Before);
        prefix.append(before);
        *before = prefix;
        canvas.layer_mut(CanvasLayer::After).extend(suffix);
    }
}

#[cfg(test)]
mod tests {
    use mdkit_ui::{Color, PxSize};

    use super::*;

    #[test]
    fn wraps_every_layer_around_the_origin() {
        let widget = Widget::new("Box");
        widget.size.set(PxSize::new(100.0, 50.0));
        let transform = Transform::of(&widget);
        assert!(widget.render().canvas.is_empty());

        transform.scale_value_x.set(2.0);
        widget.angle.set(10.0);
        transform.rotate_value_angle.set(5.0);
        transform.origin.set((0.0, 1.0));

        let canvas = widget.render().canvas;
        assert_eq!(canvas.before[0], Instruction::PushMatrix);
        assert_eq!(
            canvas.before[1],
            Instruction::Rotate {
                angle: 15.0,
                origin: PxPosition::new(0.0, 50.0)
            }
        );
        assert!(matches!(
            canvas.before[2],
            Instruction::Scale { x, y, .. } if x == 2.0 && y == 1.0
        ));
        assert_eq!(canvas.after.last(), Some(&Instruction::PopMatrix));
        assert!(canvas.is_balanced());
    }

    #[test]
    fn stencil_clips_after_prior_draws() {
        struct Fill;
        impl WidgetFeature for Fill {
            fn name(&self) -> &'static str {
                "fill"
            }
            fn draw(&self, widget: &Widget, canvas: &mut Canvas) {
                canvas.push(CanvasLayer::Before, Instruction::Color(Color::BLACK));
                canvas.push(CanvasLayer::Before, Instruction::Rectangle(widget.rect()));
            }
        }
        let widget = Widget::new("Box");
        widget.attach_feature(Rc::new(Fill));
        let transform = Transform::of(&widget);
        transform.stencil.set(true);

        let canvas = widget.render().canvas;
        assert_eq!(canvas.before[1], Instruction::StencilPush);
        assert_eq!(canvas.before[3], Instruction::StencilUse);
        assert_eq!(canvas.before[4], Instruction::Color(Color::BLACK));
        assert_eq!(canvas.after.first(), Some(&Instruction::StencilUnUse));
        assert!(canvas.is_balanced());
    }
}
