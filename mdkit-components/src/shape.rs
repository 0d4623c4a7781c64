//! Defines the [`Shape`] enum used to describe the outline of a widget.
//!
//! The outline drives three things: the background draw, the stencil mask
//! that bounds ripples and state layers, and hit-testing of those overlays.

use mdkit_ui::{CornerRadii, Dp, Instruction, PxPosition, PxRect};

/// Corner radius of a rounded rectangle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum RoundedCorner {
    /// Radius derived from `min(width, height) / 2`.
    Capsule,
    /// Fixed radius.
    Manual(Dp),
}

impl RoundedCorner {
    /// A corner with zero radius.
    pub const ZERO: Self = RoundedCorner::Manual(Dp(0.0));

    /// Resolves into a pixel radius for `rect`.
    pub fn resolve(self, rect: &PxRect) -> f32 {
        let limit = rect.width.min(rect.height) / 2.0;
        match self {
            RoundedCorner::Capsule => limit,
            RoundedCorner::Manual(radius) => radius.to_pixels_f32().clamp(0.0, limit.max(0.0)),
        }
    }
}

/// Outline of a widget.
///
/// ```
/// use mdkit_components::shape::Shape;
/// use mdkit_ui::{Dp, PxPosition, PxRect};
///
/// let shape = Shape::rounded(Dp(10.0));
/// let rect = PxRect::new(0.0, 0.0, 100.0, 40.0);
/// assert!(shape.contains(&rect, PxPosition::new(50.0, 20.0)));
/// assert!(!shape.contains(&rect, PxPosition::new(0.5, 0.5)));
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Shape {
    /// Rectangle with per-corner radii (top-left, top-right, bottom-right,
    /// bottom-left).
    RoundedRectangle([RoundedCorner; 4]),
    /// Ellipse filling the bounds.
    Ellipse,
}

impl Default for Shape {
    fn default() -> Self {
        Shape::RECTANGLE
    }
}

impl Shape {
    /// Sharp rectangle.
    pub const RECTANGLE: Shape = Shape::RoundedRectangle([RoundedCorner::ZERO; 4]);
    /// Fully rounded ends.
    pub const CAPSULE: Shape = Shape::RoundedRectangle([RoundedCorner::Capsule; 4]);

    /// Uniform corner radius.
    pub const fn rounded(radius: Dp) -> Self {
        Shape::RoundedRectangle([RoundedCorner::Manual(radius); 4])
    }

    /// Per-corner radii in dp.
    pub const fn corners(top_left: Dp, top_right: Dp, bottom_right: Dp, bottom_left: Dp) -> Self {
        Shape::RoundedRectangle([
            RoundedCorner::Manual(top_left),
            RoundedCorner::Manual(top_right),
            RoundedCorner::Manual(bottom_right),
            RoundedCorner::Manual(bottom_left),
        ])
    }

    /// Pixel radii for `rect`; an ellipse reports its half extents.
    pub fn radii(&self, rect: &PxRect) -> CornerRadii {
        match self {
            Shape::RoundedRectangle(corners) => corners.map(|c| c.resolve(rect)),
            Shape::Ellipse => [rect.width.min(rect.height) / 2.0; 4],
        }
    }

    /// The instruction drawing this shape filled.
    pub fn fill(&self, rect: PxRect) -> Instruction {
        match self {
            Shape::RoundedRectangle(_) => Instruction::RoundedRectangle {
                radius: self.radii(&rect),
                rect,
            },
            Shape::Ellipse => Instruction::Ellipse {
                rect,
                angle_start: 0.0,
                angle_end: 360.0,
            },
        }
    }

    /// Whether `point` lies inside the outline.
    pub fn contains(&self, rect: &PxRect, point: PxPosition) -> bool {
        if !rect.contains(point) {
            return false;
        }
        match self {
            Shape::Ellipse => {
                let c = rect.center();
                let (rx, ry) = (rect.width / 2.0, rect.height / 2.0);
                if rx <= 0.0 || ry <= 0.0 {
                    return false;
                }
                let (dx, dy) = ((point.x - c.x) / rx, (point.y - c.y) / ry);
                dx * dx + dy * dy <= 1.0
            }
            Shape::RoundedRectangle(_) => {
                // y grows upwards: top corners sit at `rect.top()`.
                let [tl, tr, br, bl] = self.radii(rect);
                let left = rect.x;
                let right = rect.right();
                let bottom = rect.y;
                let top = rect.top();
                // (radius, center, horizontal sign, vertical sign) per corner.
                let corners = [
                    (tl, PxPosition::new(left + tl, top - tl), -1.0, 1.0),
                    (tr, PxPosition::new(right - tr, top - tr), 1.0, 1.0),
                    (br, PxPosition::new(right - br, bottom + br), 1.0, -1.0),
                    (bl, PxPosition::new(left + bl, bottom + bl), -1.0, -1.0),
                ];
                corners.iter().all(|&(r, c, sx, sy)| {
                    let beyond = (point.x - c.x) * sx > 0.0 && (point.y - c.y) * sy > 0.0;
                    r <= 0.0 || !beyond || point.distance_to(c) <= r
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capsule_radius_is_half_the_short_edge() {
        let rect = PxRect::new(0.0, 0.0, 100.0, 40.0);
        assert_eq!(Shape::CAPSULE.radii(&rect), [20.0; 4]);
        assert_eq!(Shape::rounded(Dp(50.0)).radii(&rect), [20.0; 4]);
    }

    #[test]
    fn rounded_corners_exclude_their_outside() {
        let rect = PxRect::new(10.0, 10.0, 100.0, 100.0);
        let shape = Shape::rounded(Dp(20.0));
        assert!(!shape.contains(&rect, PxPosition::new(11.0, 11.0)));
        assert!(!shape.contains(&rect, PxPosition::new(109.0, 109.0)));
        assert!(shape.contains(&rect, PxPosition::new(30.0, 30.0)));
        assert!(shape.contains(&rect, PxPosition::new(60.0, 10.5)));
        assert!(shape.contains(&rect, PxPosition::new(10.5, 60.0)));
        assert!(Shape::RECTANGLE.contains(&rect, PxPosition::new(10.5, 10.5)));
    }

    #[test]
    fn ellipse_contains() {
        let rect = PxRect::new(0.0, 0.0, 40.0, 40.0);
        assert!(Shape::Ellipse.contains(&rect, PxPosition::new(20.0, 20.0)));
        assert!(!Shape::Ellipse.contains(&rect, PxPosition::new(2.0, 2.0)));
    }
}
