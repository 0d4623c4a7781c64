//! Soft shadows under a widget, selected by elevation level.

use std::rc::Rc;

use mdkit_ui::{
    Canvas, CanvasLayer, Dp, Instruction, Property, PxPosition, Widget, WidgetFeature,
};

use crate::{
    behaviors::{
        background::BackgroundColor,
        themable::{Themable, ThemedColor},
    },
    role::Role,
};

/// Shadow parameters of one elevation level.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ElevationProfile {
    /// Downward offset of the shadow.
    pub offset_y: Dp,
    /// Blur radius.
    pub softness: Dp,
    /// Alpha applied to the shadow color.
    pub alpha: f32,
}

/// Highest supported level.
pub const MAX_ELEVATION_LEVEL: u8 = 5;

/// Profiles for levels 0 through 5.
pub const ELEVATION_PROFILES: [ElevationProfile; 6] = [
    ElevationProfile {
        offset_y: Dp(0.0),
        softness: Dp(0.0),
        alpha: 0.0,
    },
    ElevationProfile {
        offset_y: Dp(1.0),
        softness: Dp(3.0),
        alpha: 0.15,
    },
    ElevationProfile {
        offset_y: Dp(2.0),
        softness: Dp(6.0),
        alpha: 0.2,
    },
    ElevationProfile {
        offset_y: Dp(4.0),
        softness: Dp(8.0),
        alpha: 0.25,
    },
    ElevationProfile {
        offset_y: Dp(6.0),
        softness: Dp(12.0),
        alpha: 0.3,
    },
    ElevationProfile {
        offset_y: Dp(8.0),
        softness: Dp(16.0),
        alpha: 0.35,
    },
];

/// Profile of `level`, clamped to the supported range.
pub fn profile(level: u8) -> ElevationProfile {
    ELEVATION_PROFILES[level.min(MAX_ELEVATION_LEVEL) as usize]
}

/// Shadow feature.
///
/// Changing `elevation_level` reloads `shadow_offset`, `shadow_softness` and
/// `shadow_alpha` from the profile; set those afterwards to override.
#[derive(Debug)]
pub struct Elevation {
    /// Level in `0..=5`; larger values are clamped.
    pub elevation_level: Property<u8>,
    /// Offset `(x, y)` in pixels; positive `y` moves the shadow down.
    pub shadow_offset: Property<(f32, f32)>,
    /// Blur radius in pixels.
    pub shadow_softness: Property<f32>,
    /// Alpha applied to the shadow color.
    pub shadow_alpha: Property<f32>,
    /// Shadow color slot.
    pub shadow_color: Rc<ThemedColor>,
}

impl Elevation {
    /// Attaches a shadow at `level`. Attach before the background so the
    /// shadow draws below it.
    pub fn attach(widget: &Widget, themable: &Themable, level: u8) -> Rc<Self> {
        let level = level.min(MAX_ELEVATION_LEVEL);
        let p = profile(level);
        let feature = Rc::new(Self {
            elevation_level: Property::new("elevation_level", level),
            shadow_offset: Property::new("shadow_offset", (0.0, p.offset_y.to_pixels_f32())),
            shadow_softness: Property::new("shadow_softness", p.softness.to_pixels_f32()),
            shadow_alpha: Property::new("shadow_alpha", p.alpha),
            shadow_color: themable.color_slot("shadow_color", Role::Shadow, None),
        });
        let weak = Rc::downgrade(&feature);
        feature.elevation_level.bind(move |level| {
            let Some(feature) = weak.upgrade() else {
                return;
            };
            if *level > MAX_ELEVATION_LEVEL {
                feature.elevation_level.set(MAX_ELEVATION_LEVEL);
                return;
            }
            let p = profile(*level);
            feature
                .shadow_offset
                .set((0.0, p.offset_y.to_pixels_f32()));
            feature.shadow_softness.set(p.softness.to_pixels_f32());
            feature.shadow_alpha.set(p.alpha);
        });
        widget.attach_feature(feature.clone());
        feature
    }
}

impl WidgetFeature for Elevation {
    fn name(&self) -> &'static str {
        "elevation"
    }

    fn draw(&self, widget: &Widget, canvas: &mut Canvas) {
        let alpha = self.shadow_alpha.get();
        if self.elevation_level.get() == 0 || alpha <= 0.0 {
            return;
        }
        let rect = widget.rect();
        let (dx, dy) = self.shadow_offset.get();
        let color = self.shadow_color.get();
        canvas.push(
            CanvasLayer::Before,
            Instruction::Color(color.with_alpha(color.a * alpha)),
        );
        canvas.push(
            CanvasLayer::Before,
            Instruction::BoxShadow {
                rect,
                radius: BackgroundColor::shape_of(widget).radii(&rect),
                offset: PxPosition::new(dx, -dy),
                blur: self.shadow_softness.get(),
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theme::ThemeManager;

    #[test]
    fn level_selects_profile_and_clamps() {
        let theme = ThemeManager::new();
        let widget = Widget::new("Box");
        let themable = Themable::of(&widget, &theme);
        let elevation = Elevation::attach(&widget, &themable, 2);
        assert_eq!(elevation.shadow_softness.get(), 6.0);

        elevation.elevation_level.set(9);
        assert_eq!(elevation.elevation_level.get(), MAX_ELEVATION_LEVEL);
        assert_eq!(elevation.shadow_offset.get(), (0.0, 8.0));

        let before = &widget.render().canvas.before;
        assert!(matches!(
            before[1],
            Instruction::BoxShadow { offset, blur, .. } if offset.y == -8.0 && blur == 16.0
        ));
    }

    #[test]
    fn level_zero_draws_nothing() {
        let theme = ThemeManager::new();
        let widget = Widget::new("Box");
        let themable = Themable::of(&widget, &theme);
        Elevation::attach(&widget, &themable, 0);
        assert!(widget.render().canvas.is_empty());
    }
}
