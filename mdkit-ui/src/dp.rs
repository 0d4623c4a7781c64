//! # Density-Independent Pixels (Dp)
//!
//! Widget tokens (FAB sizes, badge sizes, paddings) are expressed in dp and
//! converted to physical pixels through a global scale factor, so the same
//! token renders at the same physical size on every display density.
//!
//! ```
//! use mdkit_ui::Dp;
//!
//! let padding = Dp(16.0);
//! let pixels = padding.to_pixels_f32();
//! let back = Dp::from_pixels_f32(pixels);
//! assert_eq!(back, padding);
//! ```

use std::sync::OnceLock;

use parking_lot::RwLock;

use crate::Px;

/// Global scale factor for converting between density-independent pixels and
/// physical pixels.
///
/// Set once at startup from the window's density (see [`set_scale_factor`]).
/// When never set, 1 dp equals 1 pixel.
pub static SCALE_FACTOR: OnceLock<RwLock<f64>> = OnceLock::new();

/// Updates the dp -> px scale factor.
pub fn set_scale_factor(factor: f64) {
    let lock = SCALE_FACTOR.get_or_init(|| RwLock::new(1.0));
    *lock.write() = factor;
}

/// Returns the current dp -> px scale factor.
pub fn scale_factor() -> f64 {
    SCALE_FACTOR.get().map(|lock| *lock.read()).unwrap_or(1.0)
}

/// Density-independent pixels (dp) for UI scaling.
#[derive(Debug, Default, Clone, Copy, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Dp(pub f64);

impl Dp {
    /// Zero dp.
    pub const ZERO: Dp = Dp(0.0);

    /// Creates a new `Dp`; usable in constants.
    pub const fn new(value: f64) -> Self {
        Dp(value)
    }

    /// Converts this dp value to physical pixels as an `f64`.
    pub fn to_pixels_f64(&self) -> f64 {
        self.0 * scale_factor()
    }

    /// Creates a `Dp` value from physical pixels specified as an `f64`.
    pub fn from_pixels_f64(value: f64) -> Self {
        Dp(value / scale_factor())
    }

    /// Converts this dp value to physical pixels as an `f32`.
    pub fn to_pixels_f32(&self) -> f32 {
        (self.0 * scale_factor()) as f32
    }

    /// Creates a `Dp` value from physical pixels specified as an `f32`.
    pub fn from_pixels_f32(value: f32) -> Self {
        Dp(value as f64 / scale_factor())
    }

    /// Converts this `Dp` value to a [`Px`] value.
    pub fn to_px(&self) -> Px {
        Px(self.to_pixels_f32())
    }
}

impl From<f64> for Dp {
    fn from(value: f64) -> Self {
        Dp::new(value)
    }
}

impl From<Px> for Dp {
    fn from(px: Px) -> Self {
        Dp::from_pixels_f32(px.0)
    }
}

impl std::ops::Add for Dp {
    type Output = Dp;

    fn add(self, rhs: Self) -> Self::Output {
        Dp(self.0 + rhs.0)
    }
}

impl std::ops::Mul<f64> for Dp {
    type Output = Dp;

    fn mul(self, rhs: f64) -> Self::Output {
        Dp(self.0 * rhs)
    }
}
