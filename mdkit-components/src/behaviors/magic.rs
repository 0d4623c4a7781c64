//! Attention and entrance animations expressed as data.
//!
//! Every animation in the catalog is a [`Script`]: a pivot, a set of targets
//! applied before playback and a list of keyframes. One interpreter,
//! [`MagicBehavior`], turns a script into a tween over the widget's
//! `opacity`, `size`, `pos_hint` and `angle`, all relative to the snapshot
//! captured when playback starts.
//!
//! ```
//! use mdkit_components::behaviors::magic::{AnimatorArgs, AttentionKind, MagicBehavior};
//! use mdkit_ui::{Clock, Widget};
//!
//! let clock = Clock::new();
//! let widget = Widget::new("Box");
//! let magic = MagicBehavior::attach(&widget, &clock);
//! magic.start(AnimatorArgs::new(AttentionKind::Pulse));
//! clock.advance(0.1, 1.0 / 60.0);
//! magic.stop();
//! assert_eq!(widget.size.get().width, 100.0);
//! ```

use std::{
    cell::RefCell,
    fmt,
    rc::{Rc, Weak},
};

use derive_setters::Setters;
use mdkit_ui::{
    Animation, AnimationHandle, Clock, ClockEvent, Easing, PosHint, PxSize, WeakWidget, Widget,
    WidgetFeature,
};
use smallvec::SmallVec;
use tracing::debug;

use crate::behaviors::transform::Transform;

/// One animated quantity of a keyframe, relative to the snapshot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Target {
    /// Opacity as a multiple of the snapshot opacity.
    Opacity(f32),
    /// Width and height as multiples of the snapshot size.
    Size(f32, f32),
    /// Offset of the center hint, in fractions of the parent.
    Offset(f32, f32),
    /// Rotation in degrees added to the snapshot angle.
    Angle(f32),
}

/// Rotation pivot of a script.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Pivot {
    /// Center of the widget.
    #[default]
    Center,
    /// Top-left corner.
    TopLeft,
    /// Top-right corner.
    TopRight,
    /// Bottom-left corner.
    BottomLeft,
    /// Bottom-right corner.
    BottomRight,
}

impl Pivot {
    /// Pivot as fractions of the widget bounds (y grows upward).
    pub fn fractions(self) -> (f32, f32) {
        match self {
            Pivot::Center => (0.5, 0.5),
            Pivot::TopLeft => (0.0, 1.0),
            Pivot::TopRight => (1.0, 1.0),
            Pivot::BottomLeft => (0.0, 0.0),
            Pivot::BottomRight => (1.0, 0.0),
        }
    }
}

/// A segment of a script.
#[derive(Debug, Clone, PartialEq)]
pub struct Keyframe {
    /// Fraction of the total duration spent reaching the targets.
    pub share: f64,
    /// Easing of the segment.
    pub easing: Easing,
    /// Values reached at the end of the segment.
    pub targets: SmallVec<[Target; 3]>,
}

/// A complete animation description.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Script {
    /// Rotation pivot.
    pub pivot: Pivot,
    /// Targets applied immediately when playback starts.
    pub initial: SmallVec<[Target; 3]>,
    /// Segments played back to back.
    pub keyframes: Vec<Keyframe>,
}

impl Script {
    fn new(pivot: Pivot, initial: &[Target]) -> Self {
        Self {
            pivot,
            initial: initial.iter().copied().collect(),
            keyframes: Vec::new(),
        }
    }

    fn to(mut self, share: f64, easing: Easing, targets: &[Target]) -> Self {
        self.keyframes.push(Keyframe {
            share,
            easing,
            targets: targets.iter().copied().collect(),
        });
        self
    }

    /// Sum of keyframe shares; 1 for every catalog script.
    pub fn total_share(&self) -> f64 {
        self.keyframes.iter().map(|k| k.share).sum()
    }

    /// Whether any target moves the widget.
    pub fn moves(&self) -> bool {
        self.targets()
            .any(|t| matches!(t, Target::Offset(dx, dy) if dx != 0.0 || dy != 0.0))
    }

    /// Quantities that end where the snapshot left them.
    pub fn rest(&self) -> Rest {
        let mut rest = Rest {
            opacity: true,
            size: true,
            offset: true,
            angle: true,
        };
        for target in self.targets() {
            match target {
                Target::Opacity(f) => rest.opacity = f == 1.0,
                Target::Size(fx, fy) => rest.size = fx == 1.0 && fy == 1.0,
                Target::Offset(dx, dy) => rest.offset = dx == 0.0 && dy == 0.0,
                Target::Angle(a) => rest.angle = a == 0.0,
            }
        }
        rest
    }

    fn targets(&self) -> impl Iterator<Item = Target> + '_ {
        self.initial
            .iter()
            .chain(self.keyframes.iter().flat_map(|k| k.targets.iter()))
            .copied()
    }
}

/// Which quantities a script returns to their snapshot values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rest {
    /// Opacity ends at the snapshot value.
    pub opacity: bool,
    /// Size ends at the snapshot value.
    pub size: bool,
    /// Position ends at the snapshot value.
    pub offset: bool,
    /// Angle ends at the snapshot value.
    pub angle: bool,
}

/// Direction of directional entrances and exits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Moving up.
    Up,
    /// Moving down.
    Down,
    /// Moving toward the left.
    Left,
    /// Moving toward the right.
    Right,
}

impl Direction {
    const ALL: [Direction; 4] = [Direction::Up, Direction::Down, Direction::Left, Direction::Right];

    /// Unit travel vector (y grows upward).
    fn vector(self) -> (f32, f32) {
        match self {
            Direction::Up => (0.0, 1.0),
            Direction::Down => (0.0, -1.0),
            Direction::Left => (-1.0, 0.0),
            Direction::Right => (1.0, 0.0),
        }
    }

    fn name(self) -> &'static str {
        match self {
            Direction::Up => "Up",
            Direction::Down => "Down",
            Direction::Left => "Left",
            Direction::Right => "Right",
        }
    }
}

/// Corner a rotation pivots around.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Corner {
    /// Bottom-left pivot.
    DownLeft,
    /// Bottom-right pivot.
    DownRight,
    /// Top-left pivot.
    UpLeft,
    /// Top-right pivot.
    UpRight,
}

impl Corner {
    const ALL: [Corner; 4] = [Corner::DownLeft, Corner::DownRight, Corner::UpLeft, Corner::UpRight];

    fn pivot(self) -> Pivot {
        match self {
            Corner::DownLeft => Pivot::BottomLeft,
            Corner::DownRight => Pivot::BottomRight,
            Corner::UpLeft => Pivot::TopLeft,
            Corner::UpRight => Pivot::TopRight,
        }
    }

    /// Entry angle; left pivots swing in clockwise.
    fn angle(self) -> f32 {
        match self {
            Corner::DownLeft | Corner::UpRight => 45.0,
            Corner::DownRight | Corner::UpLeft => -45.0,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Corner::DownLeft => "DownLeft",
            Corner::DownRight => "DownRight",
            Corner::UpLeft => "UpLeft",
            Corner::UpRight => "UpRight",
        }
    }
}

/// The animation catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttentionKind {
    /// Four opacity crossings.
    Flash,
    /// Grows to 1.08x and back.
    Pulse,
    /// Non-uniform width/height swings.
    RubberBand,
    /// Horizontal shake with decreasing amplitude.
    Shake,
    /// Angle alternations with decreasing magnitude.
    Swing,
    /// Combined offset and angle perturbations.
    Wobble,
    /// Scale and angle perturbations.
    Tada,
    /// Angle swings.
    Wave,
    /// Opacity up, optionally travelling in a direction.
    FadeIn(Option<Direction>),
    /// Opacity down, optionally travelling in a direction.
    FadeOut(Option<Direction>),
    /// Grows from a small size.
    ZoomIn(Option<Direction>),
    /// Shrinks to a small size.
    ZoomOut(Option<Direction>),
    /// Rotates into place around the center or a corner.
    RotateIn(Option<Corner>),
    /// Rotates away around the center or a corner.
    RotateOut(Option<Corner>),
    /// Travels in from the opposite side.
    SlideIn(Direction),
    /// Travels out toward a side.
    SlideOut(Direction),
    /// Three-phase overshooting entrance.
    BounceIn(Option<Direction>),
    /// Swings on the top-left corner, then falls.
    HingeLeft,
    /// Swings on the top-right corner, then falls.
    HingeRight,
    /// Falls off while fading.
    DropOut,
    /// Flies in from above.
    FlyIn,
    /// Flies out upward.
    FlyOut,
    /// Rolls in from the left.
    RollIn,
    /// Rolls out to the right.
    RollOut,
    /// Quick grow and settle.
    Grow,
    /// Quick shrink and settle.
    Shrink,
    /// Quick back-and-forth twist.
    Twist,
    /// Short horizontal shake.
    MagicShake,
}

fn directional(base: &str, direction: Option<Direction>) -> String {
    match direction {
        Some(direction) => format!("{base}{}", direction.name()),
        None => base.to_string(),
    }
}

impl AttentionKind {
    /// Every catalog entry, directional variants included.
    pub fn catalog() -> Vec<AttentionKind> {
        use AttentionKind::*;
        let mut kinds = vec![
            Flash, Pulse, RubberBand, Shake, Swing, Wobble, Tada, Wave, HingeLeft, HingeRight,
            DropOut, FlyIn, FlyOut, RollIn, RollOut, Grow, Shrink, Twist, MagicShake,
        ];
        let directions = std::iter::once(None).chain(Direction::ALL.map(Some));
        for direction in directions {
            kinds.extend([
                FadeIn(direction),
                FadeOut(direction),
                ZoomIn(direction),
                ZoomOut(direction),
                BounceIn(direction),
            ]);
        }
        for corner in std::iter::once(None).chain(Corner::ALL.map(Some)) {
            kinds.extend([RotateIn(corner), RotateOut(corner)]);
        }
        for direction in Direction::ALL {
            kinds.extend([SlideIn(direction), SlideOut(direction)]);
        }
        kinds
    }

    /// Catalog name, e.g. `FadeInUp` or `RotateOutDownLeft`.
    pub fn name(&self) -> String {
        use AttentionKind::*;
        match *self {
            FadeIn(d) => directional("FadeIn", d),
            FadeOut(d) => directional("FadeOut", d),
            ZoomIn(d) => directional("ZoomIn", d),
            ZoomOut(d) => directional("ZoomOut", d),
            BounceIn(d) => directional("BounceIn", d),
            SlideIn(d) => format!("SlideIn{}", d.name()),
            SlideOut(d) => format!("SlideOut{}", d.name()),
            RotateIn(c) => format!("RotateIn{}", c.map_or("", Corner::name)),
            RotateOut(c) => format!("RotateOut{}", c.map_or("", Corner::name)),
            other => format!("{other:?}"),
        }
    }

    /// Playback time when the caller does not override it.
    pub fn default_duration(&self) -> f64 {
        use AttentionKind::*;
        match self {
            Grow | Shrink | Twist | MagicShake => 0.5,
            HingeLeft | HingeRight => 2.0,
            _ => 1.0,
        }
    }

    /// The script played for this kind.
    pub fn script(&self) -> Script {
        use AttentionKind::*;
        use Easing::*;
        use Target::*;
        match *self {
            Flash => Script::default()
                .to(0.25, Linear, &[Opacity(0.0)])
                .to(0.25, Linear, &[Opacity(1.0)])
                .to(0.25, Linear, &[Opacity(0.0)])
                .to(0.25, Linear, &[Opacity(1.0)]),
            Pulse => Script::default()
                .to(0.5, InOutSine, &[Size(1.08, 1.08)])
                .to(0.5, InOutSine, &[Size(1.0, 1.0)]),
            RubberBand => Script::default()
                .to(0.3, OutQuad, &[Size(1.25, 0.75)])
                .to(0.2, InOutQuad, &[Size(0.75, 1.25)])
                .to(0.25, InOutQuad, &[Size(1.15, 0.85)])
                .to(0.25, OutQuad, &[Size(1.0, 1.0)]),
            Shake => [-0.05, 0.05, -0.04, 0.04, -0.02, 0.02, -0.01, 0.0]
                .into_iter()
                .fold(Script::default(), |script, dx| {
                    script.to(0.125, InOutSine, &[Offset(dx, 0.0)])
                }),
            Swing => [15.0, -10.0, 5.0, -5.0, 2.0, -1.0, 0.0]
                .into_iter()
                .fold(Script::new(Pivot::TopLeft, &[]), |script, angle| {
                    script.to(1.0 / 7.0, InOutSine, &[Angle(angle)])
                }),
            Wobble => [
                (-0.05, -5.0),
                (0.04, 3.0),
                (-0.03, -3.0),
                (0.02, 2.0),
                (-0.01, -1.0),
                (0.0, 0.0),
            ]
                .into_iter()
                .fold(Script::default(), |script, (dx, angle)| {
                    script.to(1.0 / 6.0, InOutSine, &[Offset(dx, 0.0), Angle(angle)])
                }),
            Tada => [
                (0.9, -3.0),
                (0.9, -3.0),
                (1.1, 3.0),
                (1.1, -3.0),
                (1.1, 3.0),
                (1.1, -3.0),
                (1.1, 3.0),
                (1.1, -3.0),
                (1.0, 0.0),
            ]
            .into_iter()
            .fold(Script::default(), |script, (scale, angle)| {
                script.to(1.0 / 9.0, Linear, &[Size(scale, scale), Angle(angle)])
            }),
            Wave => [12.0, -10.0, 8.0, -4.0, 0.0]
                .into_iter()
                .fold(Script::new(Pivot::BottomLeft, &[]), |script, angle| {
                    script.to(0.2, InOutSine, &[Angle(angle)])
                }),
            FadeIn(direction) => {
                let (dx, dy) = travel(direction, 0.1);
                Script::new(Pivot::Center, &[Opacity(0.0), Offset(-dx, -dy)])
                    .to(1.0, OutQuad, &[Opacity(1.0), Offset(0.0, 0.0)])
            }
            FadeOut(direction) => {
                let (dx, dy) = travel(direction, 0.1);
                Script::default().to(1.0, InQuad, &[Opacity(0.0), Offset(dx, dy)])
            }
            ZoomIn(direction) => {
                let (dx, dy) = travel(direction, 0.5);
                Script::new(Pivot::Center, &[Opacity(0.0), Size(0.3, 0.3), Offset(-dx, -dy)])
                    .to(
                        0.6,
                        OutCubic,
                        &[Opacity(1.0), Size(0.9, 0.9), Offset(dx * 0.05, dy * 0.05)],
                    )
                    .to(0.4, OutQuad, &[Size(1.0, 1.0), Offset(0.0, 0.0)])
            }
            ZoomOut(direction) => {
                let (dx, dy) = travel(direction, 0.5);
                Script::default()
                    .to(0.4, OutQuad, &[Size(0.9, 0.9), Offset(-dx * 0.05, -dy * 0.05)])
                    .to(0.6, InCubic, &[Opacity(0.0), Size(0.3, 0.3), Offset(dx, dy)])
            }
            RotateIn(corner) => {
                let (pivot, angle) =
                    corner.map_or((Pivot::Center, -200.0), |c| (c.pivot(), c.angle()));
                Script::new(pivot, &[Opacity(0.0), Angle(angle)])
                    .to(1.0, OutQuad, &[Opacity(1.0), Angle(0.0)])
            }
            RotateOut(corner) => {
                let (pivot, angle) =
                    corner.map_or((Pivot::Center, 200.0), |c| (c.pivot(), -c.angle()));
                Script::new(pivot, &[]).to(1.0, InQuad, &[Opacity(0.0), Angle(angle)])
            }
            SlideIn(direction) => {
                let (dx, dy) = direction.vector();
                Script::new(Pivot::Center, &[Opacity(0.0), Offset(-dx, -dy)])
                    .to(1.0, OutCubic, &[Opacity(1.0), Offset(0.0, 0.0)])
            }
            SlideOut(direction) => {
                let (dx, dy) = direction.vector();
                Script::default().to(1.0, InCubic, &[Opacity(0.0), Offset(dx, dy)])
            }
            BounceIn(None) => Script::new(Pivot::Center, &[Opacity(0.0), Size(0.3, 0.3)])
                .to(0.4, OutQuad, &[Opacity(1.0), Size(1.1, 1.1)])
                .to(0.3, InOutQuad, &[Size(0.9, 0.9)])
                .to(0.3, OutQuad, &[Size(1.0, 1.0)]),
            BounceIn(Some(direction)) => {
                let (dx, dy) = direction.vector();
                Script::new(Pivot::Center, &[Opacity(0.0), Offset(-dx, -dy)])
                    .to(0.6, OutQuad, &[Opacity(1.0), Offset(dx * 0.05, dy * 0.05)])
                    .to(0.2, InOutQuad, &[Offset(-dx * 0.02, -dy * 0.02)])
                    .to(0.2, OutQuad, &[Offset(0.0, 0.0)])
            }
            HingeLeft => hinge(Pivot::TopLeft, -1.0),
            HingeRight => hinge(Pivot::TopRight, 1.0),
            DropOut => {
                Script::default().to(1.0, InBack, &[Opacity(0.0), Offset(0.0, -0.7), Angle(-15.0)])
            }
            FlyIn => Script::new(Pivot::Center, &[Opacity(0.0), Size(0.5, 0.5), Offset(0.0, 1.0)])
                .to(1.0, OutBack, &[Opacity(1.0), Size(1.0, 1.0), Offset(0.0, 0.0)]),
            FlyOut => {
                Script::default().to(1.0, InBack, &[Opacity(0.0), Size(0.5, 0.5), Offset(0.0, 1.0)])
            }
            RollIn => Script::new(Pivot::Center, &[Opacity(0.0), Offset(-1.0, 0.0), Angle(120.0)])
                .to(1.0, OutQuad, &[Opacity(1.0), Offset(0.0, 0.0), Angle(0.0)]),
            RollOut => {
                Script::default().to(1.0, InQuad, &[Opacity(0.0), Offset(1.0, 0.0), Angle(-120.0)])
            }
            Grow => Script::default()
                .to(0.4, OutQuad, &[Size(1.2, 1.2)])
                .to(0.6, OutBounce, &[Size(1.0, 1.0)]),
            Shrink => Script::default()
                .to(0.4, OutQuad, &[Size(0.8, 0.8)])
                .to(0.6, OutBounce, &[Size(1.0, 1.0)]),
            Twist => Script::default()
                .to(0.25, OutQuad, &[Angle(25.0)])
                .to(0.25, InOutQuad, &[Angle(-25.0)])
                .to(0.25, InOutQuad, &[Angle(10.0)])
                .to(0.25, OutQuad, &[Angle(0.0)]),
            MagicShake => [-0.03, 0.03, -0.02, 0.0]
                .into_iter()
                .fold(Script::default(), |script, dx| {
                    script.to(0.25, InOutSine, &[Offset(dx, 0.0)])
                }),
        }
    }
}

fn travel(direction: Option<Direction>, distance: f32) -> (f32, f32) {
    direction.map_or((0.0, 0.0), |d| {
        let (x, y) = d.vector();
        (x * distance, y * distance)
    })
}

fn hinge(pivot: Pivot, sign: f32) -> Script {
    use Easing::*;
    use Target::*;
    Script::new(pivot, &[])
        .to(0.2, InOutSine, &[Angle(80.0 * sign)])
        .to(0.2, InOutSine, &[Angle(60.0 * sign)])
        .to(0.2, InOutSine, &[Angle(80.0 * sign)])
        .to(0.2, InOutSine, &[Angle(60.0 * sign)])
        .to(0.2, InQuad, &[Opacity(0.0), Offset(0.0, -1.0)])
}

/// Playback parameters.
#[derive(Debug, Clone, PartialEq, Setters)]
pub struct AnimatorArgs {
    /// Which animation to play.
    pub kind: AttentionKind,
    /// Total duration; the kind's default when `None`.
    #[setters(strip_option)]
    pub duration: Option<f64>,
    /// Replay after each completion.
    pub repeat: bool,
    /// Idle time between repeats.
    pub repeat_delay: f64,
}

impl AnimatorArgs {
    /// Plays `kind` once with its default duration.
    pub fn new(kind: AttentionKind) -> Self {
        Self {
            kind,
            duration: None,
            repeat: false,
            repeat_delay: AnimatorDefaults::REPEAT_DELAY,
        }
    }
}

/// Animator timing defaults.
pub struct AnimatorDefaults;

impl AnimatorDefaults {
    /// Pause between repeats, in seconds.
    pub const REPEAT_DELAY: f64 = 0.5;
}

/// Properties the animator restores.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Snapshot {
    /// Widget opacity.
    pub opacity: f32,
    /// Widget size.
    pub size: PxSize,
    /// Placement hint as set by the user.
    pub pos_hint: PosHint,
    /// Widget angle.
    pub angle: f32,
    /// Transform pivot.
    pub origin: (f32, f32),
    /// Center of the widget in fractions of its parent; offsets animate
    /// around it.
    pub center: (f32, f32),
}

impl Snapshot {
    fn capture(widget: &Widget, transform: &Transform) -> Self {
        let pos_hint = widget.pos_hint.get();
        let parent = widget
            .parent()
            .map(|p| p.rect())
            .filter(|r| r.width > 0.0 && r.height > 0.0);
        let c = widget.center();
        let center = (
            pos_hint
                .center_x
                .or_else(|| parent.map(|r| (c.x - r.x) / r.width))
                .unwrap_or(0.5),
            pos_hint
                .center_y
                .or_else(|| parent.map(|r| (c.y - r.y) / r.height))
                .unwrap_or(0.5),
        );
        Self {
            opacity: widget.opacity.get(),
            size: widget.size.get(),
            pos_hint,
            angle: widget.angle.get(),
            origin: transform.origin.get(),
            center,
        }
    }

    fn restore(&self, widget: &Widget, transform: &Transform) {
        widget.opacity.set(self.opacity);
        widget.size.set(self.size);
        widget.pos_hint.set(self.pos_hint);
        widget.angle.set(self.angle);
        transform.origin.set(self.origin);
    }

    fn settle(&self, widget: &Widget, rest: Rest) {
        if rest.opacity {
            widget.opacity.set(self.opacity);
        }
        if rest.size {
            widget.size.set(self.size);
        }
        if rest.offset {
            widget.pos_hint.set(self.pos_hint);
        }
        if rest.angle {
            widget.angle.set(self.angle);
        }
    }

    /// Hint with both center fields present, so offsets can be animated.
    fn centered_hint(&self) -> PosHint {
        PosHint {
            x: None,
            y: None,
            right: None,
            top: None,
            center_x: Some(self.center.0),
            center_y: Some(self.center.1),
        }
    }

    fn apply(&self, widget: &Widget, target: Target) {
        match target {
            Target::Opacity(f) => {
                widget.opacity.set(self.opacity * f);
            }
            Target::Size(fx, fy) => {
                widget.size.set(self.scaled(fx, fy));
            }
            Target::Offset(dx, dy) => {
                widget.pos_hint.set(self.offset(dx, dy));
            }
            Target::Angle(a) => {
                widget.angle.set(self.angle + a);
            }
        }
    }

    fn scaled(&self, fx: f32, fy: f32) -> PxSize {
        PxSize::new(self.size.width * fx, self.size.height * fy)
    }

    fn offset(&self, dx: f32, dy: f32) -> PosHint {
        let hint = self.centered_hint();
        PosHint {
            center_x: hint.center_x.map(|x| x + dx),
            center_y: hint.center_y.map(|y| y + dy),
            ..hint
        }
    }
}

struct Playback {
    args: AnimatorArgs,
    snapshot: Snapshot,
    handle: Option<AnimationHandle>,
    pending: Option<ClockEvent>,
    plays: u32,
}

/// Interpreter of catalog scripts attached to one widget.
pub struct MagicBehavior {
    widget: WeakWidget,
    clock: Clock,
    playback: RefCell<Option<Playback>>,
    this: Weak<MagicBehavior>,
}

impl fmt::Debug for MagicBehavior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MagicBehavior")
            .field("playing", &self.is_playing())
            .finish()
    }
}

impl MagicBehavior {
    /// Returns the widget's animator, attaching one when missing. A
    /// [`Transform`] is attached as well for corner pivots.
    pub fn attach(widget: &Widget, clock: &Clock) -> Rc<Self> {
        if let Some(magic) = widget.feature::<MagicBehavior>() {
            return magic;
        }
        let magic = Rc::new_cyclic(|this| Self {
            widget: widget.downgrade(),
            clock: clock.clone(),
            playback: RefCell::new(None),
            this: this.clone(),
        });
        widget.attach_feature(magic.clone());
        Transform::of(widget);
        magic
    }

    /// Cancels any running animation (restoring its snapshot), captures a new
    /// snapshot and plays `args`.
    pub fn start(&self, args: AnimatorArgs) {
        self.stop();
        let Some(widget) = self.widget.upgrade() else {
            return;
        };
        let transform = Transform::of(&widget);
        let snapshot = Snapshot::capture(&widget, &transform);
        debug!(widget = widget.kind(), animation = %args.kind.name(), "animator started");
        *self.playback.borrow_mut() = Some(Playback {
            args,
            snapshot,
            handle: None,
            pending: None,
            plays: 0,
        });
        self.play();
    }

    /// Stops playback and restores the snapshot. A no-op when idle.
    pub fn stop(&self) {
        let Some(playback) = self.playback.borrow_mut().take() else {
            return;
        };
        if let Some(handle) = &playback.handle {
            handle.cancel();
        }
        if let Some(pending) = &playback.pending {
            pending.cancel();
        }
        if let Some(widget) = self.widget.upgrade() {
            playback.snapshot.restore(&widget, &Transform::of(&widget));
        }
    }

    /// Whether an animation is playing or waiting to repeat.
    pub fn is_playing(&self) -> bool {
        self.playback.borrow().is_some()
    }

    /// Number of times the current animation started playing.
    pub fn plays(&self) -> u32 {
        self.playback.borrow().as_ref().map_or(0, |p| p.plays)
    }

    /// Snapshot captured by the current playback.
    pub fn snapshot(&self) -> Option<Snapshot> {
        self.playback.borrow().as_ref().map(|p| p.snapshot)
    }

    fn play(&self) {
        let Some(widget) = self.widget.upgrade() else {
            return;
        };
        let (kind, duration, snapshot) = {
            let playback = self.playback.borrow();
            let Some(p) = playback.as_ref() else {
                return;
            };
            let duration = p.args.duration.unwrap_or_else(|| p.args.kind.default_duration());
            (p.args.kind, duration, p.snapshot)
        };
        let transform = Transform::of(&widget);
        snapshot.restore(&widget, &transform);
        let script = kind.script();
        transform.origin.set(script.pivot.fractions());
        let moves = script.moves();
        if moves {
            widget.pos_hint.set(snapshot.centered_hint());
        }
        for target in &script.initial {
            if moves || !matches!(target, Target::Offset(..)) {
                snapshot.apply(&widget, *target);
            }
        }

        let mut animation: Option<Animation> = None;
        for keyframe in &script.keyframes {
            let seconds = keyframe.share * duration;
            let mut step = match animation {
                Some(animation) => animation.then(seconds, keyframe.easing),
                None => Animation::new(seconds, keyframe.easing),
            };
            for target in &keyframe.targets {
                step = match *target {
                    Target::Opacity(f) => step.animate(&widget.opacity, snapshot.opacity * f),
                    Target::Size(fx, fy) => step.animate(&widget.size, snapshot.scaled(fx, fy)),
                    Target::Offset(..) if !moves => step,
                    Target::Offset(dx, dy) => {
                        step.animate(&widget.pos_hint, snapshot.offset(dx, dy))
                    }
                    Target::Angle(a) => step.animate(&widget.angle, snapshot.angle + a),
                };
            }
            animation = Some(step);
        }
        let Some(animation) = animation else {
            return;
        };
        let handle = animation.start(&self.clock);
        let weak = self.this.clone();
        handle.on_complete().connect(move |_| {
            if let Some(magic) = weak.upgrade() {
                magic.finished();
            }
        });
        if let Some(p) = self.playback.borrow_mut().as_mut() {
            p.handle = Some(handle);
            p.plays += 1;
        }
    }

    fn finished(&self) {
        let repeat = {
            let mut playback = self.playback.borrow_mut();
            let Some(p) = playback.as_mut() else {
                return;
            };
            p.handle = None;
            if p.args.repeat {
                Some(p.args.repeat_delay)
            } else {
                None
            }
        };
        let Some(delay) = repeat else {
            // Exits keep their final state; everything at rest gets the
            // exact snapshot value back.
            let done = self.playback.borrow_mut().take();
            if let Some(p) = done
                && let Some(widget) = self.widget.upgrade()
            {
                p.snapshot.settle(&widget, p.args.kind.script().rest());
                Transform::of(&widget).origin.set(p.snapshot.origin);
            }
            return;
        };
        if let Some(widget) = self.widget.upgrade()
            && let Some(snapshot) = self.snapshot()
        {
            snapshot.restore(&widget, &Transform::of(&widget));
        }
        let weak = self.this.clone();
        let event = self.clock.schedule_once(delay, move |_| {
            if let Some(magic) = weak.upgrade() {
                if let Some(p) = magic.playback.borrow_mut().as_mut() {
                    p.pending = None;
                }
                magic.play();
            }
        });
        if let Some(p) = self.playback.borrow_mut().as_mut() {
            p.pending = Some(event);
        }
    }
}

impl WidgetFeature for MagicBehavior {
    fn name(&self) -> &'static str {
        "magic"
    }

    fn cancel_transient(&self, _widget: &Widget) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (Clock, Widget, Rc<MagicBehavior>) {
        let clock = Clock::new();
        let widget = Widget::new("Box");
        widget.size.set(PxSize::new(80.0, 40.0));
        widget.opacity.set(0.9);
        widget.pos_hint.set(PosHint {
            x: Some(0.1),
            ..PosHint::default()
        });
        let magic = MagicBehavior::attach(&widget, &clock);
        (clock, widget, magic)
    }

    fn state(widget: &Widget) -> (f32, PxSize, PosHint, f32) {
        (
            widget.opacity.get(),
            widget.size.get(),
            widget.pos_hint.get(),
            widget.angle.get(),
        )
    }

    #[test]
    fn every_script_spans_the_whole_duration() {
        for kind in AttentionKind::catalog() {
            let script = kind.script();
            assert!(!script.keyframes.is_empty(), "{}", kind.name());
            assert!((script.total_share() - 1.0).abs() < 1e-9, "{}", kind.name());
        }
    }

    #[test]
    fn catalog_names_are_unique() {
        let mut names: Vec<String> = AttentionKind::catalog()
            .iter()
            .map(AttentionKind::name)
            .collect();
        let count = names.len();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), count);
        assert!(names.contains(&"FadeInUp".to_string()));
        assert!(names.contains(&"RotateOutDownLeft".to_string()));
    }

    #[test]
    fn start_then_stop_restores_snapshot_for_every_kind() {
        let (clock, widget, magic) = setup();
        let before = state(&widget);
        for kind in AttentionKind::catalog() {
            magic.start(AnimatorArgs::new(kind));
            clock.advance(0.23, 1.0 / 60.0);
            magic.stop();
            assert_eq!(state(&widget), before, "{}", kind.name());
        }
        magic.stop();
        assert_eq!(state(&widget), before);
    }

    #[test]
    fn restart_cancels_the_previous_run() {
        let (clock, widget, magic) = setup();
        let before = state(&widget);
        magic.start(AnimatorArgs::new(AttentionKind::Pulse));
        clock.advance(0.3, 0.05);
        magic.start(AnimatorArgs::new(AttentionKind::Pulse));
        assert_eq!(magic.snapshot().map(|s| s.size), Some(before.1));
        clock.advance(1.5, 0.05);
        assert!(!magic.is_playing());
        assert_eq!(widget.size.get(), before.1);
    }

    #[test]
    fn repeat_replays_from_the_snapshot() {
        let (clock, widget, magic) = setup();
        magic.start(
            AnimatorArgs::new(AttentionKind::Twist)
                .duration(0.2)
                .repeat(true)
                .repeat_delay(0.1),
        );
        clock.advance(0.25, 0.05);
        assert!(magic.is_playing());
        assert_eq!(widget.angle.get(), 0.0);
        clock.advance(0.2, 0.05);
        assert_eq!(magic.plays(), 2);
        magic.stop();
        assert_eq!(widget.angle.get(), 0.0);
    }

    #[test]
    fn finished_attention_scripts_leave_the_widget_as_found() {
        let (clock, widget, magic) = setup();
        let before = state(&widget);
        for kind in [AttentionKind::Pulse, AttentionKind::Shake, AttentionKind::Swing] {
            magic.start(AnimatorArgs::new(kind));
            clock.advance(1.2, 0.05);
            assert!(!magic.is_playing(), "{}", kind.name());
            assert_eq!(state(&widget), before, "{}", kind.name());
        }
    }

    #[test]
    fn finished_exit_keeps_only_what_it_changed() {
        let (clock, widget, magic) = setup();
        let before = state(&widget);
        magic.start(AnimatorArgs::new(AttentionKind::FadeOut(None)));
        clock.advance(1.2, 0.05);
        assert!(!magic.is_playing());
        assert_eq!(widget.opacity.get(), 0.0);
        assert_eq!(widget.pos_hint.get(), before.2);
        assert_eq!(widget.size.get(), before.1);
    }

    #[test]
    fn still_scripts_never_touch_the_position() {
        assert!(!AttentionKind::Pulse.script().moves());
        assert!(!AttentionKind::FadeOut(None).script().moves());
        assert!(AttentionKind::Shake.script().moves());
        assert!(!AttentionKind::FadeOut(Some(Direction::Up)).script().rest().offset);
    }

    #[test]
    fn disabling_stops_playback() {
        let (clock, widget, magic) = setup();
        let before = state(&widget);
        magic.start(AnimatorArgs::new(AttentionKind::Wobble));
        clock.advance(0.2, 0.05);
        widget.disabled.set(true);
        assert!(!magic.is_playing());
        assert_eq!(state(&widget), before);
    }
}
