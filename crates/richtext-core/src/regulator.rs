//! Range Regulator
//!
//! Rewrites ranges into the canonical shapes editing operations expect: a caret
//! resting on a chosen side of an inline boundary, a range that exactly wraps (or
//! exactly fills) its content, a range widened over whole format wrappers, or one
//! spanning whole blocks. Some adjustments split text or format nodes; every split
//! keeps the caller's other boundaries up to date through the `tracked` slices.

use tracing::debug;

use crate::algebra::{
    ExtendMode, align_to, end_of_range, extend_end, extend_end_to_adjacent_container,
    extend_end_to_container, extend_start, extend_start_to_adjacent_container,
    extend_start_to_container, start_of_range,
};
use crate::document::{Boundary, Document, NodeId, SplitMode};
use crate::range::{Corner, Range, after, before, track, untrack};
use crate::traversal::TraversalSet;

/// Side of an inline boundary a caret is moved to.
///
/// "Start" sides look at the unit before the caret, "end" sides at the unit after it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InlineSide {
    /// Inside the preceding unit, at its end.
    BeforeStart,
    /// Just after the preceding unit.
    AfterStart,
    /// Just before the following unit.
    BeforeEnd,
    /// Inside the following unit, at its start.
    AfterEnd,
}

impl InlineSide {
    /// Same before/after placement, looking at the other neighbour.
    pub fn contra(self) -> Self {
        match self {
            InlineSide::BeforeStart => InlineSide::BeforeEnd,
            InlineSide::AfterStart => InlineSide::AfterEnd,
            InlineSide::BeforeEnd => InlineSide::BeforeStart,
            InlineSide::AfterEnd => InlineSide::AfterStart,
        }
    }

    fn is_start(self) -> bool {
        matches!(self, InlineSide::BeforeStart | InlineSide::AfterStart)
    }
}

/// Range canonicalization over one editing root.
#[derive(Debug, Clone)]
pub struct RangeRegulator {
    traversals: TraversalSet,
}

impl RangeRegulator {
    /// Regulator for the editing root `root`.
    pub fn new(root: NodeId) -> Self {
        Self {
            traversals: TraversalSet::new(root),
        }
    }

    /// Regulator for the whole document.
    pub fn for_document(doc: &Document) -> Self {
        Self::new(doc.root())
    }

    /// Traversals used by the regulator.
    pub fn traversals(&self) -> &TraversalSet {
        &self.traversals
    }

    /// Merge adjacent text and drop empty text inside the block enclosing `range`.
    pub fn normalize(&self, doc: &mut Document, range: &mut Range, tracked: &mut [Boundary]) {
        let Some(ancestor) = range.common_ancestor(doc) else {
            debug!(?range, "stale range left unnormalized");
            return;
        };
        let block = doc.closest(ancestor, Document::is_block);
        let mut points = track(&[range.start(), range.end()], tracked);
        doc.normalize(block, &mut points);
        *range = Range::from_ordered(points[0], points[1]);
        untrack(&points, 2, tracked);
        debug!(?block, ?range, "normalized");
    }

    /// Move a caret onto `side` of the inline boundary it rests at.
    ///
    /// A caret strictly inside a text run first splits the run; the caret stays at the
    /// end of the first half. A caret never lands inside a line break or an embed:
    /// where the side would put it there it stops next to the node instead.
    ///
    /// # Panics
    ///
    /// Panics if `caret` is not collapsed.
    pub fn adjust_to_inline_boundary_side(
        &self,
        doc: &mut Document,
        caret: &mut Range,
        side: InlineSide,
        tracked: &mut [Boundary],
    ) {
        assert!(caret.is_collapsed(), "caret must be collapsed");
        let Boundary { container, offset } = caret.start();
        if doc.is_non_empty_text(container) && offset > 0 && offset < doc.len(container) {
            doc.split_text(container, offset, tracked);
        }

        let doc: &Document = doc;
        let mut prev = None;
        let mut next = None;
        if doc.is_content(container) {
            let len = doc.len(container);
            if offset == len {
                prev = Some(container);
            }
            if offset == 0 {
                next = Some(container);
            }
        }

        let inline_boundary = &self.traversals.inline_boundary;
        let point = if side.is_start() {
            let prev = prev.or_else(|| inline_boundary.node_before(doc, caret.start()));
            match prev {
                None => Boundary::new(self.traversals.root(), 0),
                Some(prev) if doc.is_block(prev) => Boundary::new(prev, 0),
                Some(prev) if side == InlineSide::BeforeStart && doc.is_text(prev) => {
                    Boundary::new(prev, doc.len(prev))
                }
                Some(prev) => after(doc, prev),
            }
        } else {
            let next = next.or_else(|| inline_boundary.node_after(doc, caret.end()));
            match next {
                Some(next) if !doc.is_block(next) => {
                    if side == InlineSide::AfterEnd && doc.is_text(next) {
                        Boundary::new(next, 0)
                    } else {
                        before(doc, next)
                    }
                }
                _ => {
                    let block = self
                        .traversals
                        .block
                        .node_before(doc, caret.start())
                        .unwrap_or(self.traversals.root());
                    Boundary::new(block, doc.len(block))
                }
            }
        };
        debug!(?side, from = ?caret.start(), to = ?point, "inline boundary side");
        *caret = Range::collapsed(point);
    }

    /// Like [`adjust_to_inline_boundary_side`](Self::adjust_to_inline_boundary_side)
    /// with the opposite neighbour: content sides face the content the caret borders.
    pub fn adjust_to_content_side(
        &self,
        doc: &mut Document,
        caret: &mut Range,
        side: InlineSide,
        tracked: &mut [Boundary],
    ) {
        self.adjust_to_inline_boundary_side(doc, caret, side.contra(), tracked);
    }

    /// Widen `range` so its boundaries sit just outside the content it covers.
    ///
    /// A caret stays a caret, moved like its start.
    pub fn adjust_to_content_outer_range(
        &self,
        doc: &mut Document,
        range: &mut Range,
        tracked: &mut [Boundary],
    ) {
        let mut start = start_of_range(range);
        if range.is_collapsed() {
            self.adjust_to_content_side(doc, &mut start, InlineSide::BeforeStart, tracked);
            *range = start;
            debug!(?range, "content outer caret");
            return;
        }

        let mut points = track(&[range.end()], tracked);
        self.adjust_to_content_side(doc, &mut start, InlineSide::BeforeStart, &mut points);
        *range = Range::from_ordered(range.start(), points[0]);
        untrack(&points, 1, tracked);
        align_to(doc, range, Corner::EndToStart, &start);
        if range.is_collapsed() {
            debug!(?range, "content outer caret");
            return;
        }

        let mut end = end_of_range(range);
        let mut points = track(&[range.start()], tracked);
        self.adjust_to_content_side(doc, &mut end, InlineSide::AfterEnd, &mut points);
        *range = Range::from_ordered(points[0], range.end());
        untrack(&points, 1, tracked);
        align_to(doc, range, Corner::StartToEnd, &end);
        debug!(?range, "content outer range");
    }

    /// Narrow `range` so its boundaries sit just inside the content it covers.
    ///
    /// A caret already at the edge of its container is left alone; a caret that would
    /// end up at the far edge of a content node stays just before that node.
    pub fn adjust_to_content_inner_range(
        &self,
        doc: &mut Document,
        range: &mut Range,
        tracked: &mut [Boundary],
    ) {
        let was_collapsed = range.is_collapsed();
        if was_collapsed {
            let Boundary { container, offset } = range.start();
            if offset == 0 || offset == doc.len(container) {
                return;
            }
        }

        let mut start = start_of_range(range);
        if was_collapsed {
            self.adjust_to_content_side(doc, &mut start, InlineSide::AfterStart, tracked);
            *range = start;
        } else {
            let mut points = track(&[range.end()], tracked);
            self.adjust_to_content_side(doc, &mut start, InlineSide::AfterStart, &mut points);
            *range = Range::from_ordered(range.start(), points[0]);
            untrack(&points, 1, tracked);
            align_to(doc, range, Corner::StartToStart, &start);
        }

        if range.is_collapsed() {
            let Boundary { container, offset } = range.start();
            if doc.is_content(container) && offset == doc.len(container) {
                range.set_end_before(doc, container);
            }
            debug!(?range, "content inner caret");
            return;
        }

        let mut end = end_of_range(range);
        let mut points = track(&[range.start()], tracked);
        self.adjust_to_content_side(doc, &mut end, InlineSide::BeforeEnd, &mut points);
        *range = Range::from_ordered(points[0], range.end());
        untrack(&points, 1, tracked);
        align_to(doc, range, Corner::StartToEnd, &end);
        debug!(?range, "content inner range");
    }

    /// Outer content range widened over format wrappers it touches at either edge,
    /// stopping at blocks.
    pub fn adjust_to_format_range(
        &self,
        doc: &mut Document,
        range: &mut Range,
        tracked: &mut [Boundary],
    ) {
        self.adjust_to_content_outer_range(doc, range, tracked);
        let doc: &Document = doc;
        let mut leading = start_of_range(range);
        extend_start_to_adjacent_container(doc, &mut leading, Document::is_block);
        let mut trailing = end_of_range(range);
        extend_end_to_adjacent_container(doc, &mut trailing, Document::is_block);
        align_to(doc, range, Corner::StartToStart, &leading);
        align_to(doc, range, Corner::EndToEnd, &trailing);
        debug!(?range, "format range");
    }

    /// Split the format wrappers around each boundary of `range` up to the enclosing
    /// block, so both boundaries become gaps between children of a block.
    pub fn split_format_range_out_of_blocks(
        &self,
        doc: &mut Document,
        range: &mut Range,
        tracked: &mut [Boundary],
    ) {
        let mut leading = start_of_range(range);
        extend_start_to_container(doc, &mut leading, Document::is_block);
        let block = leading.start().container;
        let mut points = track(&[range.end()], tracked);
        let cut = doc.split_up_to(range.start(), block, SplitMode::Partial, &mut points);
        *range = Range::from_ordered(cut, points[0]);
        untrack(&points, 1, tracked);

        let mut trailing = end_of_range(range);
        extend_end_to_container(doc, &mut trailing, Document::is_block);
        let block = trailing.end().container;
        let mut points = track(&[range.start()], tracked);
        let cut = doc.split_up_to(range.end(), block, SplitMode::Partial, &mut points);
        *range = Range::from_ordered(points[0], cut);
        untrack(&points, 1, tracked);
        debug!(?range, "format range split out of blocks");
    }

    /// Widen `range` over every block it reaches into.
    pub fn adjust_to_block_range(&self, doc: &Document, range: &mut Range) {
        let mode = ExtendMode::Decide(|_, _, contained| contained);
        extend_start(doc, range, &self.traversals.block, mode);
        extend_end(doc, range, &self.traversals.block, mode);
        debug!(?range, "block range");
    }
}
