//! Raw pointer input.
//!
//! The host forwards down/move/up events; the [`crate::Window`] routes them
//! to widgets with grab semantics: whoever grabs a down keeps receiving that
//! touch's moves and up even when the pointer leaves its bounds.

use crate::PxPosition;

/// Phase of a touch event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TouchPhase {
    /// Pointer pressed.
    Down,
    /// Pointer moved while pressed.
    Move,
    /// Pointer released.
    Up,
    /// The system took the pointer away (grab loss).
    Cancel,
}

/// Mouse button that produced a touch, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    /// Primary button.
    Left,
    /// Secondary button.
    Right,
    /// Middle button.
    Middle,
}

/// A single touch sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TouchEvent {
    /// Stable id for the whole down..up sequence.
    pub id: u64,
    /// Position in window coordinates.
    pub pos: PxPosition,
    /// Phase.
    pub phase: TouchPhase,
    /// Clock time of the sample in seconds.
    pub time: f64,
    /// Originating mouse button, `None` for fingers.
    pub button: Option<MouseButton>,
}

impl TouchEvent {
    /// Creates a finger touch.
    pub fn new(id: u64, pos: PxPosition, phase: TouchPhase, time: f64) -> Self {
        Self {
            id,
            pos,
            phase,
            time,
            button: None,
        }
    }

    /// Same touch with another phase, position and time.
    pub fn with(self, phase: TouchPhase, pos: PxPosition, time: f64) -> Self {
        Self {
            phase,
            pos,
            time,
            ..self
        }
    }
}

/// What a behavior did with a touch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum TouchResponse {
    /// Not interested; keep propagating.
    Ignored,
    /// Handled; stop propagating.
    Consumed,
    /// Handled, and route the rest of this touch here.
    Grab,
}

impl TouchResponse {
    /// Keeps the stronger of two responses.
    pub fn merge(self, other: Self) -> Self {
        self.max(other)
    }
}
