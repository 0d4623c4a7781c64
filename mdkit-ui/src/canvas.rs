//! Retained drawing instructions.
//!
//! A widget's frame is three ordered instruction lists: `before` runs under
//! the widget's children, `main` with them and `after` on top. Behaviors
//! append to whichever layer they draw in; the backend replays the lists.

use smallvec::SmallVec;

use crate::{Color, PxPosition, PxRect};

/// Per-corner radii in the order top-left, top-right, bottom-right,
/// bottom-left.
pub type CornerRadii = [f32; 4];

/// One drawing instruction.
#[derive(Debug, Clone, PartialEq)]
pub enum Instruction {
    /// Sets the color used by following shapes.
    Color(Color),
    /// Axis-aligned rectangle.
    Rectangle(PxRect),
    /// Rectangle with per-corner radii.
    RoundedRectangle {
        /// Bounds.
        rect: PxRect,
        /// Corner radii.
        radius: CornerRadii,
    },
    /// Ellipse inscribed in `rect`, optionally a pie segment in degrees.
    Ellipse {
        /// Bounds.
        rect: PxRect,
        /// Start angle in degrees.
        angle_start: f32,
        /// End angle in degrees.
        angle_end: f32,
    },
    /// Polyline.
    Line {
        /// Points of the line.
        points: SmallVec<[PxPosition; 4]>,
        /// Stroke width.
        width: f32,
        /// Whether the last point connects to the first.
        close: bool,
    },
    /// Outline of a rounded rectangle.
    RoundedLine {
        /// Bounds.
        rect: PxRect,
        /// Corner radii.
        radius: CornerRadii,
        /// Stroke width.
        width: f32,
    },
    /// Blurred drop shadow of a rounded rectangle.
    BoxShadow {
        /// Shape bounds the shadow is cast from.
        rect: PxRect,
        /// Corner radii of the shape.
        radius: CornerRadii,
        /// Offset of the shadow.
        offset: PxPosition,
        /// Blur radius.
        blur: f32,
    },
    /// Saves the transform.
    PushMatrix,
    /// Restores the transform.
    PopMatrix,
    /// Rotation in degrees around `origin`.
    Rotate {
        /// Angle in degrees, counter-clockwise.
        angle: f32,
        /// Pivot.
        origin: PxPosition,
    },
    /// Scale around `origin`.
    Scale {
        /// Horizontal factor.
        x: f32,
        /// Vertical factor.
        y: f32,
        /// Pivot.
        origin: PxPosition,
    },
    /// Translation.
    Translate {
        /// Horizontal offset.
        x: f32,
        /// Vertical offset.
        y: f32,
    },
    /// Begins recording a stencil mask.
    StencilPush,
    /// Ends the mask; following draws are clipped to it.
    StencilUse,
    /// Begins erasing the mask.
    StencilUnUse,
    /// Pops the mask.
    StencilPop,
    /// Triangle mesh.
    Mesh {
        /// Vertex positions.
        vertices: Vec<PxPosition>,
        /// Triangle indices.
        indices: Vec<u16>,
    },
}

/// Layer a behavior contributes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CanvasLayer {
    /// Under the widget's children.
    Before,
    /// Interleaved with children.
    Main,
    /// Over the widget's children.
    After,
}

/// The instruction lists of one widget for one frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Canvas {
    /// Drawn before children.
    pub before: Vec<Instruction>,
    /// Drawn with children.
    pub main: Vec<Instruction>,
    /// Drawn after children.
    pub after: Vec<Instruction>,
}

impl Canvas {
    /// Creates an empty canvas.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mutable access to a layer.
    pub fn layer_mut(&mut self, layer: CanvasLayer) -> &mut Vec<Instruction> {
        match layer {
            CanvasLayer::Before => &mut self.before,
            CanvasLayer::Main => &mut self.main,
            CanvasLayer::After => &mut self.after,
        }
    }

    /// Appends an instruction.
    pub fn push(&mut self, layer: CanvasLayer, instruction: Instruction) {
        self.layer_mut(layer).push(instruction);
    }

    /// Iterates over every instruction in replay order.
    pub fn iter(&self) -> impl Iterator<Item = &Instruction> {
        self.before.iter().chain(&self.main).chain(&self.after)
    }

    /// Whether nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.before.is_empty() && self.main.is_empty() && self.after.is_empty()
    }

    /// Checks that matrix and stencil pushes are balanced over the replay
    /// order (a push in `before` may pop in `after`).
    pub fn is_balanced(&self) -> bool {
        balanced(self.iter())
    }
}

fn balanced<'a>(instructions: impl Iterator<Item = &'a Instruction>) -> bool {
    let mut matrix = 0i32;
    let mut stencil = 0i32;
    for instruction in instructions {
        match instruction {
            Instruction::PushMatrix => matrix += 1,
            Instruction::PopMatrix => matrix -= 1,
            Instruction::StencilPush => stencil += 1,
            Instruction::StencilPop => stencil -= 1,
            _ => {}
        }
        if matrix < 0 || stencil < 0 {
            return false;
        }
    }
    matrix == 0 && stencil == 0
}

/// Rendered output of a widget subtree.
#[derive(Debug, Clone, Default)]
pub struct RenderNode {
    /// The widget's own instructions.
    pub canvas: Canvas,
    /// Children in draw order.
    pub children: Vec<RenderNode>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn balance_detects_missing_pop() {
        let mut canvas = Canvas::new();
        canvas.push(CanvasLayer::Before, Instruction::PushMatrix);
        assert!(!canvas.is_balanced());
        canvas.push(CanvasLayer::Before, Instruction::PopMatrix);
        assert!(canvas.is_balanced());
        canvas.push(CanvasLayer::After, Instruction::StencilPop);
        assert!(!canvas.is_balanced());
    }
}
