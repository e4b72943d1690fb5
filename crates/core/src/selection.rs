//! Interactive rectangle selection.
//!
//! Tracks the pointer gesture that carves out the region an effect or
//! annotation will target. Two states: Idle and Selecting. The gesture
//! only grows down-right from its anchor; dragging above or left of the
//! anchor clamps that dimension to zero rather than mirroring the
//! rectangle (preserved behavior of the original editor).

use pagemark_raster::PixelRect;

/// In-progress or completed selection, in canvas-local coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectionRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl SelectionRect {
    /// A selection with no area disables the editing operations.
    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    /// Round to whole pixels. `None` when degenerate.
    pub fn to_pixel_rect(&self) -> Option<PixelRect> {
        if self.is_empty() {
            return None;
        }
        let rect = PixelRect::new(
            self.x.max(0.0).round() as u32,
            self.y.max(0.0).round() as u32,
            self.width.round() as u32,
            self.height.round() as u32,
        );
        (!rect.is_empty()).then_some(rect)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TrackerState {
    Idle,
    Selecting,
}

/// Selection gesture state machine.
///
/// Fully synchronous: each pointer event is handled in place. The visual
/// overlay is observational; callers read [`rect`](Self::rect) after any
/// event, the tracker itself has no drawing side effects.
#[derive(Debug)]
pub struct SelectionTracker {
    state: TrackerState,
    anchor: (f32, f32),
    rect: Option<SelectionRect>,
}

impl SelectionTracker {
    pub fn new() -> Self {
        Self {
            state: TrackerState::Idle,
            anchor: (0.0, 0.0),
            rect: None,
        }
    }

    /// Pointer pressed: anchor a fresh zero-size selection.
    pub fn pointer_down(&mut self, x: f32, y: f32) {
        self.state = TrackerState::Selecting;
        self.anchor = (x, y);
        self.rect = Some(SelectionRect {
            x,
            y,
            width: 0.0,
            height: 0.0,
        });
    }

    /// Pointer moved: grow the active selection. Ignored while Idle.
    pub fn pointer_move(&mut self, x: f32, y: f32) {
        if self.state != TrackerState::Selecting {
            return;
        }
        if let Some(rect) = self.rect.as_mut() {
            rect.width = (x - self.anchor.0).max(0.0);
            rect.height = (y - self.anchor.1).max(0.0);
        }
    }

    /// Pointer released: the rectangle stays as the current selection but
    /// no longer follows the pointer.
    pub fn pointer_up(&mut self) {
        self.state = TrackerState::Idle;
    }

    pub fn is_selecting(&self) -> bool {
        self.state == TrackerState::Selecting
    }

    /// The current selection, if any.
    pub fn rect(&self) -> Option<SelectionRect> {
        self.rect
    }

    /// Drop the current selection and return to Idle.
    pub fn clear(&mut self) {
        self.state = TrackerState::Idle;
        self.rect = None;
    }
}

impl Default for SelectionTracker {
    fn default() -> Self {
        Self::new()
    }
}
