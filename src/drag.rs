//! Drag gesture state machine for the positioned signature images.
//!
//! `DragState` is the active gesture between pointer-down and pointer-up.
//! It carries the pointer position of the previous event so each move
//! applies only the incremental delta, and the element's position at the
//! start of the gesture so a cancel can restore it.

use serde::{Deserialize, Serialize};

use crate::model::{ElementId, Layout, Position};

pub const MIN_SCALE: f64 = 0.1;
pub const MAX_SCALE: f64 = 3.0;

/// A pointer location in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum DragState {
    /// No gesture in progress.
    #[default]
    Idle,
    /// An element follows the pointer.
    Dragging {
        element: ElementId,
        /// Pointer position at the previous event.
        last: Point,
        /// Element position when the gesture began.
        origin: Position,
    },
}

/// Owns the layout being edited and the current gesture.
#[derive(Debug, Clone, Default)]
pub struct DragController {
    layout: Layout,
    state: DragState,
}

impl DragController {
    #[must_use]
    pub fn new(layout: Layout) -> Self {
        Self { layout, state: DragState::Idle }
    }

    #[must_use]
    pub fn layout(&self) -> Layout {
        self.layout
    }

    #[must_use]
    pub fn state(&self) -> DragState {
        self.state
    }

    #[must_use]
    pub fn position(&self, element: ElementId) -> Position {
        self.layout.get(element)
    }

    /// Begin dragging `element`. Replaces any gesture already in progress.
    pub fn pointer_down(&mut self, element: ElementId, point: Point) {
        if !point.is_finite() {
            return;
        }
        self.state = DragState::Dragging { element, last: point, origin: self.layout.get(element) };
    }

    /// Move the dragged element by the pointer delta since the last event.
    ///
    /// Returns the element's new position, or `None` when idle or the
    /// point is not finite.
    pub fn pointer_move(&mut self, point: Point) -> Option<Position> {
        let DragState::Dragging { element, last, origin } = self.state else {
            return None;
        };
        if !point.is_finite() {
            return None;
        }

        let pos = self.layout.get_mut(element);
        pos.x += point.x - last.x;
        pos.y += point.y - last.y;
        let updated = *pos;

        self.state = DragState::Dragging { element, last: point, origin };
        Some(updated)
    }

    /// Finish the gesture, reporting the final position.
    pub fn pointer_up(&mut self) -> Option<(ElementId, Position)> {
        let DragState::Dragging { element, .. } = std::mem::take(&mut self.state) else {
            return None;
        };
        let pos = self.layout.get(element);
        tracing::debug!(element = element.as_str(), x = pos.x, y = pos.y, "drag finished");
        Some((element, pos))
    }

    /// Abort the gesture and put the element back where it started.
    pub fn cancel(&mut self) {
        if let DragState::Dragging { element, origin, .. } = std::mem::take(&mut self.state) {
            *self.layout.get_mut(element) = origin;
        }
    }

    /// Set an element's scale, clamped to [`MIN_SCALE`, `MAX_SCALE`].
    pub fn set_scale(&mut self, element: ElementId, scale: f64) -> Position {
        if scale.is_finite() {
            self.layout.get_mut(element).scale = scale.clamp(MIN_SCALE, MAX_SCALE);
        }
        self.layout.get(element)
    }

    /// Restore an element to the origin at unit scale.
    pub fn reset(&mut self, element: ElementId) {
        if matches!(self.state, DragState::Dragging { element: dragged, .. } if dragged == element) {
            self.state = DragState::Idle;
        }
        *self.layout.get_mut(element) = Position::default();
    }
}

#[cfg(test)]
#[path = "drag_test.rs"]
mod tests;
