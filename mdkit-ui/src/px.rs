//! Physical pixel geometry.
//!
//! Widget coordinates are floating point physical pixels with the origin at
//! the bottom-left of the window, x growing right and y growing up. The same
//! convention applies to touch positions, so hit-testing is a plain rectangle
//! test.

use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};

use crate::dp::Dp;

/// A physical pixel length.
#[derive(Debug, Default, Clone, Copy, PartialEq, PartialOrd)]
pub struct Px(pub f32);

impl Px {
    /// Zero pixels.
    pub const ZERO: Self = Self(0.0);

    /// Converts a dp length into pixels with the current scale factor.
    pub fn from_dp(dp: Dp) -> Self {
        dp.to_px()
    }

    /// Converts this length to dp.
    pub fn to_dp(self) -> Dp {
        Dp::from_pixels_f32(self.0)
    }

    /// Raw value.
    pub fn get(self) -> f32 {
        self.0
    }
}

impl Add for Px {
    type Output = Px;

    fn add(self, rhs: Self) -> Self::Output {
        Px(self.0 + rhs.0)
    }
}

impl Sub for Px {
    type Output = Px;

    fn sub(self, rhs: Self) -> Self::Output {
        Px(self.0 - rhs.0)
    }
}

impl Mul<f32> for Px {
    type Output = Px;

    fn mul(self, rhs: f32) -> Self::Output {
        Px(self.0 * rhs)
    }
}

impl AddAssign for Px {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl SubAssign for Px {
    fn sub_assign(&mut self, rhs: Self) {
        self.0 -= rhs.0;
    }
}

impl From<Dp> for Px {
    fn from(dp: Dp) -> Self {
        dp.to_px()
    }
}

/// A 2D position in physical pixel space.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct PxPosition {
    /// Horizontal coordinate.
    pub x: f32,
    /// Vertical coordinate.
    pub y: f32,
}

impl PxPosition {
    /// The origin.
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    /// Creates a position.
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Returns a position moved by `(dx, dy)`.
    pub fn offset(self, dx: f32, dy: f32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    /// Euclidean distance to `other`.
    pub fn distance_to(self, other: Self) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Linear interpolation toward `to`.
    pub fn lerp(self, to: Self, t: f32) -> Self {
        Self::new(self.x + (to.x - self.x) * t, self.y + (to.y - self.y) * t)
    }
}

impl Add for PxPosition {
    type Output = PxPosition;

    fn add(self, rhs: Self) -> Self::Output {
        PxPosition::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for PxPosition {
    type Output = PxPosition;

    fn sub(self, rhs: Self) -> Self::Output {
        PxPosition::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl From<[f32; 2]> for PxPosition {
    fn from([x, y]: [f32; 2]) -> Self {
        Self::new(x, y)
    }
}

/// A 2D size in physical pixel space.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct PxSize {
    /// Width.
    pub width: f32,
    /// Height.
    pub height: f32,
}

impl PxSize {
    /// Zero size.
    pub const ZERO: Self = Self {
        width: 0.0,
        height: 0.0,
    };

    /// Creates a size.
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Creates a square size from a dp edge.
    pub fn square_dp(edge: Dp) -> Self {
        let px = edge.to_pixels_f32();
        Self::new(px, px)
    }

    /// Creates a size from dp width and height.
    pub fn from_dp(width: Dp, height: Dp) -> Self {
        Self::new(width.to_pixels_f32(), height.to_pixels_f32())
    }

    /// Area in square pixels.
    pub fn area(self) -> f32 {
        self.width * self.height
    }

    /// The larger edge.
    pub fn max_edge(self) -> f32 {
        self.width.max(self.height)
    }

    /// The smaller edge.
    pub fn min_edge(self) -> f32 {
        self.width.min(self.height)
    }

    /// Linear interpolation toward `to`.
    pub fn lerp(self, to: Self, t: f32) -> Self {
        Self::new(
            self.width + (to.width - self.width) * t,
            self.height + (to.height - self.height) * t,
        )
    }
}

impl From<[f32; 2]> for PxSize {
    fn from([width, height]: [f32; 2]) -> Self {
        Self::new(width, height)
    }
}

/// An axis-aligned rectangle.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct PxRect {
    /// Left edge.
    pub x: f32,
    /// Bottom edge.
    pub y: f32,
    /// Width.
    pub width: f32,
    /// Height.
    pub height: f32,
}

impl PxRect {
    /// Creates a rectangle.
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Creates a rectangle from a position and a size.
    pub fn from_position_size(position: PxPosition, size: PxSize) -> Self {
        Self::new(position.x, position.y, size.width, size.height)
    }

    /// Bottom-left corner.
    pub fn position(&self) -> PxPosition {
        PxPosition::new(self.x, self.y)
    }

    /// Size.
    pub fn size(&self) -> PxSize {
        PxSize::new(self.width, self.height)
    }

    /// Right edge.
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    /// Top edge.
    pub fn top(&self) -> f32 {
        self.y + self.height
    }

    /// Center point.
    pub fn center(&self) -> PxPosition {
        PxPosition::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Area in square pixels.
    pub fn area(&self) -> f32 {
        self.width * self.height
    }

    /// Whether `point` lies inside (edges inclusive).
    pub fn contains(&self, point: PxPosition) -> bool {
        point.x >= self.x && point.x <= self.right() && point.y >= self.y && point.y <= self.top()
    }

    /// Intersection of two rectangles, if they overlap.
    pub fn intersection(&self, other: &Self) -> Option<Self> {
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let right = self.right().min(other.right());
        let top = self.top().min(other.top());
        (right > x && top > y).then(|| Self::new(x, y, right - x, top - y))
    }

    /// Linear interpolation of origin and size toward `to`.
    pub fn lerp(&self, to: &Self, t: f32) -> Self {
        Self::new(
            self.x + (to.x - self.x) * t,
            self.y + (to.y - self.y) * t,
            self.width + (to.width - self.width) * t,
            self.height + (to.height - self.height) * t,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance() {
        let pos1 = PxPosition::new(0.0, 0.0);
        let pos2 = PxPosition::new(3.0, 4.0);
        assert_eq!(pos1.distance_to(pos2), 5.0);
    }

    #[test]
    fn test_rect_contains_edges() {
        let rect = PxRect::new(10.0, 10.0, 20.0, 20.0);
        assert!(rect.contains(PxPosition::new(10.0, 30.0)));
        assert!(!rect.contains(PxPosition::new(9.9, 15.0)));
        assert_eq!(rect.center(), PxPosition::new(20.0, 20.0));
    }

    #[test]
    fn test_rect_intersection() {
        let a = PxRect::new(0.0, 0.0, 10.0, 10.0);
        let b = PxRect::new(5.0, 5.0, 10.0, 10.0);
        assert_eq!(a.intersection(&b), Some(PxRect::new(5.0, 5.0, 5.0, 5.0)));
        assert_eq!(a.intersection(&PxRect::new(20.0, 20.0, 1.0, 1.0)), None);
    }

    #[test]
    fn test_rect_lerp_midpoint() {
        let a = PxRect::new(0.0, 0.0, 10.0, 10.0);
        let b = PxRect::new(10.0, 20.0, 30.0, 50.0);
        assert_eq!(a.lerp(&b, 0.5), PxRect::new(5.0, 10.0, 20.0, 30.0));
    }
}
