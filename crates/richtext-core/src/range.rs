//! Range values.
//!
//! A [`Range`] is a pair of [`Boundary`] points with `start <= end` in document order.
//! Ranges are `Copy` values: they never observe the document on their own, so every
//! operation that needs tree order takes the [`Document`] it refers to.

use std::cmp::Ordering;

use thiserror::Error;

use crate::document::{Boundary, Document, NodeId};

/// Errors raised when a range is built from caller-supplied boundary points.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RangeError {
    /// The container no longer exists or is not attached to the document.
    #[error("node {0:?} is not attached to the document")]
    Detached(NodeId),
    /// The offset exceeds the container's length.
    #[error("offset {offset} out of bounds for node {container:?} of length {len}")]
    OffsetOutOfBounds {
        /// Container node.
        container: NodeId,
        /// Requested offset.
        offset: usize,
        /// Container length.
        len: usize,
    },
    /// The start point comes after the end point.
    #[error("range start is after its end")]
    Inverted,
}

/// One end of a range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    /// The start boundary.
    Start,
    /// The end boundary.
    End,
}

/// Which boundary of the receiving range is paired with which boundary of a source range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Corner {
    /// This start against the source start.
    StartToStart,
    /// This end against the source start.
    StartToEnd,
    /// This end against the source end.
    EndToEnd,
    /// This start against the source end.
    EndToStart,
}

impl Corner {
    /// Boundary of the receiving range.
    pub fn own_side(self) -> Side {
        match self {
            Corner::StartToStart | Corner::EndToStart => Side::Start,
            Corner::StartToEnd | Corner::EndToEnd => Side::End,
        }
    }

    /// Boundary of the source range.
    pub fn source_side(self) -> Side {
        match self {
            Corner::StartToStart | Corner::StartToEnd => Side::Start,
            Corner::EndToEnd | Corner::EndToStart => Side::End,
        }
    }
}

/// A range over a [`Document`]. A collapsed range is a caret.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Range {
    start: Boundary,
    end: Boundary,
}

impl Range {
    /// Collapsed range at `point`.
    pub fn collapsed(point: Boundary) -> Self {
        Self {
            start: point,
            end: point,
        }
    }

    /// Range from points already known to be in document order.
    pub(crate) fn from_ordered(start: Boundary, end: Boundary) -> Self {
        Self { start, end }
    }

    /// Build a range from caller-supplied points, validating both and their order.
    pub fn new(doc: &Document, start: Boundary, end: Boundary) -> Result<Self, RangeError> {
        check_boundary(doc, start)?;
        check_boundary(doc, end)?;
        if doc.compare_boundaries(start, end) == Ordering::Greater {
            return Err(RangeError::Inverted);
        }
        Ok(Self { start, end })
    }

    /// Range covering `node` inside its parent.
    pub fn selecting_node(doc: &Document, node: NodeId) -> Self {
        let mut range = Self::collapsed(Boundary::new(node, 0));
        range.select_node(doc, node);
        range
    }

    /// Range covering the contents of `node`.
    pub fn selecting_node_contents(doc: &Document, node: NodeId) -> Self {
        Self {
            start: Boundary::new(node, 0),
            end: Boundary::new(node, doc.len(node)),
        }
    }

    /// Start boundary.
    pub fn start(&self) -> Boundary {
        self.start
    }

    /// End boundary.
    pub fn end(&self) -> Boundary {
        self.end
    }

    /// Boundary on `side`.
    pub fn boundary(&self, side: Side) -> Boundary {
        match side {
            Side::Start => self.start,
            Side::End => self.end,
        }
    }

    /// Whether start equals end.
    pub fn is_collapsed(&self) -> bool {
        self.start == self.end
    }

    /// Check that both boundaries still address the document.
    pub fn validate(&self, doc: &Document) -> Result<(), RangeError> {
        check_boundary(doc, self.start)?;
        check_boundary(doc, self.end)?;
        if doc.compare_boundaries(self.start, self.end) == Ordering::Greater {
            return Err(RangeError::Inverted);
        }
        Ok(())
    }

    /// Move the start; an end that would precede it collapses onto it.
    pub fn set_start(&mut self, doc: &Document, point: Boundary) {
        self.start = point;
        if doc.compare_boundaries(point, self.end) == Ordering::Greater {
            self.end = point;
        }
    }

    /// Move the end; a start that would follow it collapses onto it.
    pub fn set_end(&mut self, doc: &Document, point: Boundary) {
        self.end = point;
        if doc.compare_boundaries(point, self.start) == Ordering::Less {
            self.start = point;
        }
    }

    /// Set the boundary on `side`.
    pub fn set_boundary(&mut self, doc: &Document, side: Side, point: Boundary) {
        match side {
            Side::Start => self.set_start(doc, point),
            Side::End => self.set_end(doc, point),
        }
    }

    /// Move the start to just before `node`.
    pub fn set_start_before(&mut self, doc: &Document, node: NodeId) {
        self.set_start(doc, before(doc, node));
    }

    /// Move the start to just after `node`.
    pub fn set_start_after(&mut self, doc: &Document, node: NodeId) {
        self.set_start(doc, after(doc, node));
    }

    /// Move the end to just before `node`.
    pub fn set_end_before(&mut self, doc: &Document, node: NodeId) {
        self.set_end(doc, before(doc, node));
    }

    /// Move the end to just after `node`.
    pub fn set_end_after(&mut self, doc: &Document, node: NodeId) {
        self.set_end(doc, after(doc, node));
    }

    /// Select `node` inside its parent.
    pub fn select_node(&mut self, doc: &Document, node: NodeId) {
        self.start = before(doc, node);
        self.end = after(doc, node);
    }

    /// Select the contents of `node`.
    pub fn select_node_contents(&mut self, doc: &Document, node: NodeId) {
        *self = Self::selecting_node_contents(doc, node);
    }

    /// Collapse onto one of the boundaries.
    pub fn collapse(&mut self, side: Side) {
        match side {
            Side::Start => self.end = self.start,
            Side::End => self.start = self.end,
        }
    }

    /// Nearest node containing both boundaries, or `None` once a mutation has detached
    /// one of them from the other's tree.
    pub fn common_ancestor(&self, doc: &Document) -> Option<NodeId> {
        doc.common_ancestor(self.start.container, self.end.container)
    }

    /// Compare the boundary pair selected by `corner` (own boundary against source boundary).
    pub fn compare_corner(&self, doc: &Document, corner: Corner, source: &Range) -> Ordering {
        doc.compare_boundaries(
            self.boundary(corner.own_side()),
            source.boundary(corner.source_side()),
        )
    }

    /// Whether any part of `node` lies inside the range. Parentless nodes always intersect.
    pub fn intersects_node(&self, doc: &Document, node: NodeId) -> bool {
        let Some(parent) = doc.parent(node) else {
            return true;
        };
        let index = doc.index(node);
        doc.compare_boundaries(Boundary::new(parent, index), self.end) == Ordering::Less
            && doc.compare_boundaries(Boundary::new(parent, index + 1), self.start)
                == Ordering::Greater
    }

    /// Whether `point` lies within the range (inclusive).
    pub fn is_point_in_range(&self, doc: &Document, point: Boundary) -> bool {
        doc.compare_boundaries(point, self.start) != Ordering::Less
            && doc.compare_boundaries(point, self.end) != Ordering::Greater
    }
}

/// Gap right before `node` in its parent.
///
/// A parentless node (the root, or a detached subtree) has no outside; its own start
/// is returned instead.
pub fn before(doc: &Document, node: NodeId) -> Boundary {
    match doc.parent(node) {
        Some(parent) => Boundary::new(parent, doc.index(node)),
        None => Boundary::new(node, 0),
    }
}

/// Gap right after `node` in its parent, or the node's own end when it has no parent.
pub fn after(doc: &Document, node: NodeId) -> Boundary {
    match doc.parent(node) {
        Some(parent) => Boundary::new(parent, doc.index(node) + 1),
        None => Boundary::new(node, doc.len(node)),
    }
}

/// `own` followed by the caller's tracked boundaries, for one tracked mutation.
pub(crate) fn track(own: &[Boundary], tracked: &[Boundary]) -> Vec<Boundary> {
    let mut points = Vec::with_capacity(own.len() + tracked.len());
    points.extend_from_slice(own);
    points.extend_from_slice(tracked);
    points
}

/// Copy the caller's share of `points` (everything after the first `own` entries) back.
pub(crate) fn untrack(points: &[Boundary], own: usize, tracked: &mut [Boundary]) {
    tracked.copy_from_slice(&points[own..]);
}

/// Validate a boundary point against the document.
pub fn check_boundary(doc: &Document, point: Boundary) -> Result<(), RangeError> {
    if !doc.is_attached(point.container) {
        return Err(RangeError::Detached(point.container));
    }
    let len = doc.len(point.container);
    if point.offset > len {
        return Err(RangeError::OffsetOutOfBounds {
            container: point.container,
            offset: point.offset,
            len,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_runs() -> (Document, NodeId, NodeId, NodeId) {
        let mut doc = Document::new();
        let p = doc.append_block(doc.root(), "p");
        let a = doc.append_text(p, "ab");
        let c = doc.append_text(p, "cd");
        (doc, p, a, c)
    }

    #[test]
    fn test_new_validates() {
        let (mut doc, p, a, c) = two_runs();
        assert!(Range::new(&doc, Boundary::new(a, 1), Boundary::new(c, 1)).is_ok());
        assert_eq!(
            Range::new(&doc, Boundary::new(c, 1), Boundary::new(a, 1)),
            Err(RangeError::Inverted)
        );
        assert_eq!(
            Range::new(&doc, Boundary::new(a, 3), Boundary::new(c, 1)),
            Err(RangeError::OffsetOutOfBounds {
                container: a,
                offset: 3,
                len: 2
            })
        );
        doc.detach(c);
        assert_eq!(
            Range::new(&doc, Boundary::new(p, 0), Boundary::new(c, 0)),
            Err(RangeError::Detached(c))
        );
    }

    #[test]
    fn test_setters_keep_order() {
        let (doc, p, a, c) = two_runs();
        let mut range = Range::collapsed(Boundary::new(a, 1));
        range.set_start(&doc, Boundary::new(c, 1));
        assert!(range.is_collapsed());
        assert_eq!(range.end(), Boundary::new(c, 1));

        range.set_end(&doc, Boundary::new(p, 0));
        assert_eq!(range.start(), Boundary::new(p, 0));

        range.set_end_after(&doc, c);
        assert_eq!(range.end(), Boundary::new(p, 2));
        range.collapse(Side::End);
        assert_eq!(range.start(), Boundary::new(p, 2));
    }

    #[test]
    fn test_intersects_node() {
        let (doc, p, a, c) = two_runs();
        let caret = Range::collapsed(Boundary::new(p, 1));
        assert!(!caret.intersects_node(&doc, a));
        assert!(!caret.intersects_node(&doc, c));

        let inside = Range::collapsed(Boundary::new(a, 1));
        assert!(inside.intersects_node(&doc, a));
        assert!(inside.intersects_node(&doc, p));
        assert!(inside.intersects_node(&doc, doc.root()));
        assert!(!inside.intersects_node(&doc, c));
    }

    #[test]
    fn test_gaps_around_parentless_node() {
        let (doc, p, _, _) = two_runs();
        let root = doc.root();
        assert_eq!(before(&doc, p), Boundary::new(root, 0));
        assert_eq!(before(&doc, root), Boundary::new(root, 0));
        assert_eq!(after(&doc, root), Boundary::new(root, 1));

        let mut range = Range::collapsed(Boundary::new(p, 1));
        range.set_end_after(&doc, root);
        assert_eq!(range.end(), Boundary::new(root, 1));
    }

    #[test]
    fn test_common_ancestor_of_detached_boundary() {
        let (mut doc, p, a, c) = two_runs();
        let range = Range::new(&doc, Boundary::new(a, 1), Boundary::new(c, 1)).expect("range");
        assert_eq!(range.common_ancestor(&doc), Some(p));

        doc.detach(c);
        assert_eq!(range.common_ancestor(&doc), None);
    }

    #[test]
    fn test_compare_corner() {
        let (doc, _, a, c) = two_runs();
        let left = Range::selecting_node_contents(&doc, a);
        let right = Range::selecting_node_contents(&doc, c);
        assert_eq!(
            left.compare_corner(&doc, Corner::StartToStart, &right),
            Ordering::Less
        );
        assert_eq!(
            right.compare_corner(&doc, Corner::EndToStart, &left),
            Ordering::Greater
        );
        assert_eq!(
            left.compare_corner(&doc, Corner::StartToEnd, &right),
            Ordering::Less
        );
    }
}
