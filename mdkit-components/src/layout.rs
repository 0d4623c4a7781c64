//! Alignment options and the row/column placement shared by containers.
//!
//! Containers in this crate position their children directly: they compute a
//! rectangle per child and write it to the child's `pos`, and `size` when
//! stretching. Positions are window coordinates with the origin at the
//! bottom-left.

use mdkit_ui::{Dp, PxPosition, PxRect, PxSize, Widget};

/// How children are placed along the main axis.
///
/// - `Start`: children packed at the start (left or top).
/// - `Center`: children centered.
/// - `End`: children packed at the end (right or bottom).
/// - `SpaceBetween`: free space between children, none at the ends.
/// - `SpaceEvenly`: free space between children and at both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MainAxisAlignment {
    /// Pack at the start.
    #[default]
    Start,
    /// Center the children.
    Center,
    /// Pack at the end.
    End,
    /// Distribute free space between children.
    SpaceBetween,
    /// Distribute free space between children and at the ends.
    SpaceEvenly,
}

/// How children are aligned across the main axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CrossAxisAlignment {
    /// Align to the start (bottom for rows, left for columns).
    Start,
    /// Center.
    #[default]
    Center,
    /// Align to the end.
    End,
    /// Stretch to the cross extent.
    Stretch,
}

/// Insets of a container, in dp.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Padding {
    /// Left inset.
    pub left: Dp,
    /// Top inset.
    pub top: Dp,
    /// Right inset.
    pub right: Dp,
    /// Bottom inset.
    pub bottom: Dp,
}

impl Padding {
    /// Same inset on every side.
    pub const fn all(value: Dp) -> Self {
        Self {
            left: value,
            top: value,
            right: value,
            bottom: value,
        }
    }

    /// Horizontal and vertical insets.
    pub const fn symmetric(horizontal: Dp, vertical: Dp) -> Self {
        Self {
            left: horizontal,
            top: vertical,
            right: horizontal,
            bottom: vertical,
        }
    }

    /// Shrinks `rect` by the insets.
    pub fn inset(&self, rect: PxRect) -> PxRect {
        let left = self.left.to_pixels_f32();
        let right = self.right.to_pixels_f32();
        let top = self.top.to_pixels_f32();
        let bottom = self.bottom.to_pixels_f32();
        PxRect::new(
            rect.x + left,
            rect.y + bottom,
            (rect.width - left - right).max(0.0),
            (rect.height - top - bottom).max(0.0),
        )
    }

    /// Horizontal total in pixels.
    pub fn horizontal(&self) -> f32 {
        self.left.to_pixels_f32() + self.right.to_pixels_f32()
    }

    /// Vertical total in pixels.
    pub fn vertical(&self) -> f32 {
        self.top.to_pixels_f32() + self.bottom.to_pixels_f32()
    }
}

/// Placement parameters for [`place_row`] and [`place_column`].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Arrangement {
    /// Main-axis alignment.
    pub main: MainAxisAlignment,
    /// Cross-axis alignment.
    pub cross: CrossAxisAlignment,
    /// Gap between neighbours.
    pub spacing: Dp,
    /// Container insets.
    pub padding: Padding,
}

impl Arrangement {
    /// Arrangement with `spacing` between children.
    pub fn spaced(spacing: Dp) -> Self {
        Self {
            spacing,
            ..Self::default()
        }
    }

    /// Sets the main-axis alignment.
    pub fn main(mut self, main: MainAxisAlignment) -> Self {
        self.main = main;
        self
    }

    /// Sets the cross-axis alignment.
    pub fn cross(mut self, cross: CrossAxisAlignment) -> Self {
        self.cross = cross;
        self
    }

    /// Sets the insets.
    pub fn padding(mut self, padding: Padding) -> Self {
        self.padding = padding;
        self
    }
}

/// Sum of main-axis extents plus spacing, the size a row needs.
pub fn row_extent(children: &[Widget], arrangement: &Arrangement) -> PxSize {
    extent(children, arrangement, true)
}

/// Size a column needs.
pub fn column_extent(children: &[Widget], arrangement: &Arrangement) -> PxSize {
    extent(children, arrangement, false)
}

fn extent(children: &[Widget], arrangement: &Arrangement, horizontal: bool) -> PxSize {
    let spacing = arrangement.spacing.to_pixels_f32();
    let mut main = 0.0f32;
    let mut cross = 0.0f32;
    for (i, child) in children.iter().enumerate() {
        let size = child.size.get();
        let (m, c) = if horizontal {
            (size.width, size.height)
        } else {
            (size.height, size.width)
        };
        main += m + if i > 0 { spacing } else { 0.0 };
        cross = cross.max(c);
    }
    let padding = &arrangement.padding;
    if horizontal {
        PxSize::new(main + padding.horizontal(), cross + padding.vertical())
    } else {
        PxSize::new(cross + padding.horizontal(), main + padding.vertical())
    }
}

/// Lays `children` left to right inside `bounds`.
pub fn place_row(bounds: PxRect, children: &[Widget], arrangement: &Arrangement) {
    place(bounds, children, arrangement, true);
}

/// Lays `children` top to bottom inside `bounds`.
pub fn place_column(bounds: PxRect, children: &[Widget], arrangement: &Arrangement) {
    place(bounds, children, arrangement, false);
}

fn main_offsets(free: f32, count: usize, main: MainAxisAlignment) -> (f32, f32) {
    let free = free.max(0.0);
    match main {
        MainAxisAlignment::Start => (0.0, 0.0),
        MainAxisAlignment::Center => (free / 2.0, 0.0),
        MainAxisAlignment::End => (free, 0.0),
        MainAxisAlignment::SpaceBetween if count > 1 => (0.0, free / (count - 1) as f32),
        MainAxisAlignment::SpaceBetween => (0.0, 0.0),
        MainAxisAlignment::SpaceEvenly => {
            let gap = free / (count + 1) as f32;
            (gap, gap)
        }
    }
}

fn place(bounds: PxRect, children: &[Widget], arrangement: &Arrangement, horizontal: bool) {
    if children.is_empty() {
        return;
    }
    let inner = arrangement.padding.inset(bounds);
    let spacing = arrangement.spacing.to_pixels_f32();
    let used = extent(
        children,
        &Arrangement {
            padding: Padding::default(),
            ..*arrangement
        },
        horizontal,
    );
    let (main_len, cross_len) = if horizontal {
        (inner.width, inner.height)
    } else {
        (inner.height, inner.width)
    };
    let used_main = if horizontal { used.width } else { used.height };
    let (lead, extra) = main_offsets(main_len - used_main, children.len(), arrangement.main);

    let mut cursor = lead;
    for child in children {
        let mut size = child.size.get();
        if arrangement.cross == CrossAxisAlignment::Stretch {
            if horizontal {
                size.height = cross_len;
            } else {
                size.width = cross_len;
            }
            child.size.set(size);
        }
        let (m, c) = if horizontal {
            (size.width, size.height)
        } else {
            (size.height, size.width)
        };
        let cross_off = match arrangement.cross {
            CrossAxisAlignment::Start | CrossAxisAlignment::Stretch => 0.0,
            CrossAxisAlignment::Center => (cross_len - c) / 2.0,
            CrossAxisAlignment::End => cross_len - c,
        };
        let pos = if horizontal {
            PxPosition::new(inner.x + cursor, inner.y + cross_off)
        } else {
            // Columns run top to bottom while y grows upwards.
            PxPosition::new(inner.x + cross_off, inner.top() - cursor - m)
        };
        child.pos.set(pos);
        cursor += m + spacing + extra;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn boxes(sizes: &[(f32, f32)]) -> Vec<Widget> {
        sizes
            .iter()
            .map(|&(w, h)| {
                let widget = Widget::new("Box");
                widget.size.set(PxSize::new(w, h));
                widget
            })
            .collect()
    }

    #[test]
    fn row_packs_at_end_with_spacing() {
        let children = boxes(&[(10.0, 10.0), (20.0, 10.0), (30.0, 20.0)]);
        let arrangement = Arrangement::spaced(Dp(8.0)).main(MainAxisAlignment::End);
        place_row(PxRect::new(0.0, 0.0, 200.0, 40.0), &children, &arrangement);
        let xs: Vec<f32> = children.iter().map(|c| c.pos.get().x).collect();
        assert_eq!(xs, [124.0, 142.0, 170.0]);
        assert_eq!(children[2].pos.get().y, 10.0);
        assert_eq!(children[2].rect().right(), 200.0);
    }

    #[test]
    fn column_runs_downwards() {
        let children = boxes(&[(10.0, 10.0), (10.0, 20.0)]);
        let arrangement = Arrangement::spaced(Dp(4.0)).cross(CrossAxisAlignment::Stretch);
        place_column(PxRect::new(0.0, 0.0, 50.0, 100.0), &children, &arrangement);
        assert_eq!(children[0].pos.get(), PxPosition::new(0.0, 90.0));
        assert_eq!(children[1].pos.get(), PxPosition::new(0.0, 66.0));
        assert_eq!(children[1].size.get().width, 50.0);
        assert_eq!(
            column_extent(&children, &arrangement),
            PxSize::new(50.0, 34.0)
        );
    }

    #[test]
    fn padding_shrinks_bounds() {
        let padding = Padding::symmetric(Dp(16.0), Dp(4.0));
        assert_eq!(
            padding.inset(PxRect::new(0.0, 0.0, 100.0, 40.0)),
            PxRect::new(16.0, 4.0, 68.0, 32.0)
        );
    }
}
