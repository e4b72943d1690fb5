//! Per-page effect and annotation history.
//!
//! Each page keeps two replay lists (effects, then annotations, in the
//! order the render pipeline applies them) and a bounded undo stack. Replay
//! lists are cheap and unbounded: they hold only the operation parameters.
//! Undo records carry a full-canvas snapshot and are bounded; when the
//! stack is full the oldest edit becomes permanent.

use crate::annotation::Annotation;
use pagemark_raster::{Canvas, PixelRect};
use std::collections::VecDeque;

/// Destructive pixel effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectKind {
    Blur,
    Erase,
}

/// One applied effect, as replayed on re-render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EffectOp {
    pub kind: EffectKind,
    pub rect: PixelRect,
}

/// Which replay list an undo record belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OpTag {
    Effect,
    Annotation,
}

#[derive(Debug)]
struct UndoRecord {
    tag: OpTag,
    /// Full canvas state captured immediately before the operation.
    snapshot: Canvas,
}

/// Edit history for a single page.
#[derive(Debug, Default)]
pub struct PageHistory {
    effects: Vec<EffectOp>,
    annotations: Vec<Annotation>,
    undo: VecDeque<UndoRecord>,
}

impl PageHistory {
    /// Effects in application order.
    pub fn effects(&self) -> &[EffectOp] {
        &self.effects
    }

    /// Annotations in application order.
    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    /// Number of operations that can currently be undone.
    pub fn undo_depth(&self) -> usize {
        self.undo.len()
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty() && self.annotations.is_empty()
    }

    pub(crate) fn record_effect(&mut self, op: EffectOp, snapshot: Canvas, max_depth: usize) {
        self.effects.push(op);
        self.push_record(OpTag::Effect, snapshot, max_depth);
    }

    pub(crate) fn record_annotation(
        &mut self,
        annotation: Annotation,
        snapshot: Canvas,
        max_depth: usize,
    ) {
        self.annotations.push(annotation);
        self.push_record(OpTag::Annotation, snapshot, max_depth);
    }

    /// Pop the most recent record: drop its operation from the tail of the
    /// matching replay list and hand back the pre-operation snapshot.
    ///
    /// The undo stack is always a suffix of the page's operation sequence,
    /// and each replay list preserves application order, so the popped
    /// record's operation is the last element of its list.
    pub(crate) fn undo(&mut self) -> Option<Canvas> {
        let record = self.undo.pop_back()?;
        match record.tag {
            OpTag::Effect => {
                self.effects.pop();
            }
            OpTag::Annotation => {
                self.annotations.pop();
            }
        }
        Some(record.snapshot)
    }

    fn push_record(&mut self, tag: OpTag, snapshot: Canvas, max_depth: usize) {
        while self.undo.len() >= max_depth.max(1) {
            // Oldest edit becomes permanent; only its snapshot is freed.
            self.undo.pop_front();
        }
        self.undo.push_back(UndoRecord { tag, snapshot });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::Color;

    fn canvas(tag: u8) -> Canvas {
        Canvas::from_image(pagemark_raster::RgbaImage::from_pixel(
            4,
            4,
            pagemark_raster::Rgba([tag, tag, tag, 255]),
        ))
    }

    fn blur_op(x: u32) -> EffectOp {
        EffectOp {
            kind: EffectKind::Blur,
            rect: PixelRect::new(x, 0, 2, 2),
        }
    }

    fn note(text: &str) -> Annotation {
        Annotation {
            rect: PixelRect::new(0, 0, 2, 2),
            text: text.to_owned(),
            color: Color::rgb(255, 255, 200),
        }
    }

    #[test]
    fn undo_pops_in_reverse_application_order() {
        let mut history = PageHistory::default();
        history.record_effect(blur_op(0), canvas(0), 8);
        history.record_annotation(note("first"), canvas(1), 8);
        history.record_effect(blur_op(1), canvas(2), 8);

        assert_eq!(history.effects().len(), 2);
        assert_eq!(history.annotations().len(), 1);

        let snapshot = history.undo().expect("latest effect");
        assert_eq!(snapshot, canvas(2));
        assert_eq!(history.effects().len(), 1);
        assert_eq!(history.annotations().len(), 1);

        let snapshot = history.undo().expect("annotation");
        assert_eq!(snapshot, canvas(1));
        assert_eq!(history.annotations().len(), 0);

        let snapshot = history.undo().expect("first effect");
        assert_eq!(snapshot, canvas(0));
        assert!(history.is_empty());
        assert!(history.undo().is_none());
    }

    #[test]
    fn bounded_depth_drops_oldest_but_keeps_replay_ops() {
        let mut history = PageHistory::default();
        for i in 0..5 {
            history.record_effect(blur_op(i), canvas(i as u8), 3);
        }

        assert_eq!(history.undo_depth(), 3);
        // All five effects still replay.
        assert_eq!(history.effects().len(), 5);

        // Undoing everything available stops at the bound.
        assert!(history.undo().is_some());
        assert!(history.undo().is_some());
        assert!(history.undo().is_some());
        assert!(history.undo().is_none());
        assert_eq!(history.effects().len(), 2);
    }

    #[test]
    fn undo_on_fresh_history_is_none() {
        let mut history = PageHistory::default();
        assert!(history.undo().is_none());
    }
}
