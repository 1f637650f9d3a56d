//! Selection control.
//!
//! Arrow-key motion of a range through the caret walker, and snapshots that let a
//! range survive edits which do not track boundaries.

use tracing::trace;

use crate::algebra::{align_to, end_of_range, start_of_range};
use crate::caret::CaretWalker;
use crate::document::{Boundary, Document, NodeId};
use crate::geometry::CaretGeometry;
use crate::range::{Corner, Range, RangeError, Side, check_boundary};

/// Direction of a caret motion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Motion {
    /// One caret stop back.
    Left,
    /// One caret stop forward.
    Right,
    /// One visual line up.
    Up,
    /// One visual line down.
    Down,
}

/// Moves a range in response to [`Motion`]s.
#[derive(Debug, Clone)]
pub struct SelectionController {
    walker: CaretWalker,
}

impl SelectionController {
    /// Controller for the editing root `root`.
    pub fn new(root: NodeId) -> Self {
        Self {
            walker: CaretWalker::new(root),
        }
    }

    /// Controller for the whole document.
    pub fn for_document(doc: &Document) -> Self {
        Self::new(doc.root())
    }

    /// Caret walker driving the motions.
    pub fn walker(&self) -> &CaretWalker {
        &self.walker
    }

    /// Apply one motion.
    ///
    /// Backward motions start from the range start and move it; forward motions start
    /// from the range end and move it. Without `extend` the range then collapses onto
    /// the moved boundary. Returns `false`, leaving the range untouched, when there is no
    /// caret to move to.
    pub fn apply(
        &self,
        doc: &Document,
        geometry: &dyn CaretGeometry,
        range: &mut Range,
        motion: Motion,
        extend: bool,
    ) -> bool {
        let (caret, side) = match motion {
            Motion::Left => (
                self.walker.prev_caret(doc, &start_of_range(range)),
                Side::Start,
            ),
            Motion::Right => (
                self.walker.next_caret(doc, &end_of_range(range)),
                Side::End,
            ),
            Motion::Up => (
                Some(
                    self.walker
                        .upper_caret(doc, geometry, &start_of_range(range)),
                ),
                Side::Start,
            ),
            Motion::Down => (
                Some(self.walker.lower_caret(doc, geometry, &end_of_range(range))),
                Side::End,
            ),
        };
        let Some(caret) = caret else {
            trace!(?motion, "no caret to move to");
            return false;
        };

        let corner = match side {
            Side::Start => Corner::StartToStart,
            Side::End => Corner::EndToEnd,
        };
        align_to(doc, range, corner, &caret);
        if !extend {
            range.collapse(side);
        }
        trace!(?motion, extend, ?range, "selection moved");
        true
    }
}

/// Saved boundary points of a range.
///
/// Restoring clamps a non-zero offset into a block to the end of that block, so a
/// caret saved after the last child of a block stays at the block's end even when its
/// children were rebuilt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeSnapshot {
    start: Boundary,
    end: Boundary,
}

impl RangeSnapshot {
    /// Save the boundaries of `range`.
    pub fn save(range: &Range) -> Self {
        Self {
            start: range.start(),
            end: range.end(),
        }
    }

    /// Rebuild the saved range against the current document.
    pub fn restore(&self, doc: &Document) -> Result<Range, RangeError> {
        let start = clamp(doc, self.start)?;
        let end = clamp(doc, self.end)?;
        let mut range = Range::collapsed(start);
        range.set_end(doc, end);
        Ok(range)
    }
}

fn clamp(doc: &Document, point: Boundary) -> Result<Boundary, RangeError> {
    if !doc.is_attached(point.container) {
        return Err(RangeError::Detached(point.container));
    }
    let point = if doc.is_block(point.container) && point.offset > 0 {
        Boundary::new(point.container, doc.len(point.container))
    } else {
        point
    };
    check_boundary(doc, point)?;
    Ok(point)
}
