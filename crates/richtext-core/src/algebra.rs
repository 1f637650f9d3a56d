//! Boundary / range algebra.
//!
//! Free functions over [`Range`] values: cloning to either end, alignment of one
//! boundary to another range, containment and intersection tests, widening a range
//! to the nearest node found by a [`Traversal`], and structural splitting.

use std::cmp::Ordering;

use crate::document::{Boundary, Document, NodeId, SplitMode};
use crate::geometry::CaretGeometry;
use crate::range::{Corner, Range, Side, after, before};
use crate::traversal::Traversal;

/// Where [`extend_start`] / [`extend_end`] land relative to the node they find.
#[derive(Debug, Clone, Copy)]
pub enum ExtendMode {
    /// Land inside the found node (or on the near side of it when the range doesn't reach it).
    Inner,
    /// Land outside the found node.
    Outer,
    /// Decide per node: called with the found node and whether the range already
    /// reaches into it; `true` means outer.
    Decide(fn(&Document, NodeId, bool) -> bool),
}

impl ExtendMode {
    fn is_outer(self, doc: &Document, node: NodeId, contained: bool) -> bool {
        match self {
            ExtendMode::Inner => false,
            ExtendMode::Outer => true,
            ExtendMode::Decide(decide) => decide(doc, node, contained),
        }
    }
}

/// Caret at the start of `range`.
pub fn start_of_range(range: &Range) -> Range {
    Range::collapsed(range.start())
}

/// Caret at the end of `range`.
pub fn end_of_range(range: &Range) -> Range {
    Range::collapsed(range.end())
}

/// Move one boundary of `range` onto a boundary of `source`, as selected by `corner`.
///
/// `StartToStart` and `EndToStart` move the start (to the source start / end);
/// `StartToEnd` and `EndToEnd` move the end (to the source start / end).
pub fn align_to(doc: &Document, range: &mut Range, corner: Corner, source: &Range) {
    let point = source.boundary(corner.source_side());
    match corner.own_side() {
        Side::Start => range.set_start(doc, point),
        Side::End => range.set_end(doc, point),
    }
}

/// Whether `caret` lies within `range` (inclusive).
pub fn contains_caret(doc: &Document, range: &Range, caret: &Range) -> bool {
    assert!(caret.is_collapsed(), "caret must be collapsed");
    range.is_point_in_range(doc, caret.start())
}

/// Whether `outer` contains `inner` (inclusive at both ends).
pub fn contains(doc: &Document, outer: &Range, inner: &Range) -> bool {
    outer.compare_corner(doc, Corner::StartToStart, inner) != Ordering::Greater
        && outer.compare_corner(doc, Corner::EndToEnd, inner) != Ordering::Less
}

/// Whether both ranges have the same boundaries.
pub fn is_equal_range(doc: &Document, a: &Range, b: &Range) -> bool {
    a.compare_corner(doc, Corner::StartToStart, b) == Ordering::Equal
        && a.compare_corner(doc, Corner::EndToEnd, b) == Ordering::Equal
}

/// Overlap of two ranges.
///
/// Returns `None` when the ranges are disjoint, including when the overlap would be a
/// single point lying outside either input.
pub fn intersect(doc: &Document, a: &Range, b: &Range) -> Option<Range> {
    let start = if a.compare_corner(doc, Corner::StartToStart, b) != Ordering::Less {
        a.start()
    } else {
        b.start()
    };
    let end = if a.compare_corner(doc, Corner::EndToEnd, b) != Ordering::Greater {
        a.end()
    } else {
        b.end()
    };
    let mut range = Range::collapsed(start);
    range.set_end(doc, end);
    if range.is_collapsed() && !(contains_caret(doc, a, &range) && contains_caret(doc, b, &range))
    {
        return None;
    }
    Some(range)
}

/// Widen the start of `range` to the nearest node the traversal accepts before it.
///
/// A text start is first moved before its text node. When nothing is found, or the
/// traversal root itself is the nearest match, the start goes to the beginning of the
/// traversal root; a range never widens past it.
pub fn extend_start(doc: &Document, range: &mut Range, traversal: &Traversal, mode: ExtendMode) {
    let mut point = range.start();
    if doc.is_text(point.container) {
        point = before(doc, point.container);
    }
    let root = traversal.root();
    let Some(nearest) = traversal
        .node_before(doc, point)
        .filter(|&node| node != root)
    else {
        range.set_start(doc, Boundary::new(root, 0));
        return;
    };
    let contained = range.intersects_node(doc, nearest);
    if mode.is_outer(doc, nearest, contained) {
        range.set_start_before(doc, nearest);
    } else if contained {
        range.set_start(doc, Boundary::new(nearest, 0));
    } else {
        range.set_start_after(doc, nearest);
    }
}

/// Widen the end of `range` to the nearest node the traversal accepts after it, or to
/// the end of the nearest accepted node enclosing it, whichever comes first. Like
/// [`extend_start`], it stops at the end of the traversal root.
pub fn extend_end(doc: &Document, range: &mut Range, traversal: &Traversal, mode: ExtendMode) {
    let mut point = range.end();
    if doc.is_text(point.container) {
        point = after(doc, point.container);
    }
    let container = traversal.node_containing(doc, &Range::collapsed(point));
    let sibling = traversal.node_after(doc, point);
    let nearest = match (container, sibling) {
        (Some(container), Some(sibling)) if doc.contains(container, sibling) => Some(sibling),
        (Some(container), _) => Some(container),
        (None, sibling) => sibling,
    };
    let root = traversal.root();
    let Some(nearest) = nearest.filter(|&node| node != root) else {
        range.set_end(doc, Boundary::new(root, doc.len(root)));
        return;
    };
    let contained = Some(nearest) == container;
    if mode.is_outer(doc, nearest, contained) {
        range.set_end_after(doc, nearest);
    } else if contained {
        range.set_end(doc, Boundary::new(nearest, doc.len(nearest)));
    } else {
        range.set_end_before(doc, nearest);
    }
}

/// Move the start outward, one parent at a time, until its container matches `predicate`.
pub fn extend_start_to_container(
    doc: &Document,
    range: &mut Range,
    predicate: impl Fn(&Document, NodeId) -> bool,
) {
    loop {
        let container = range.start().container;
        if predicate(doc, container) || doc.parent(container).is_none() {
            break;
        }
        range.set_start_before(doc, container);
    }
}

/// Move the end outward, one parent at a time, until its container matches `predicate`.
pub fn extend_end_to_container(
    doc: &Document,
    range: &mut Range,
    predicate: impl Fn(&Document, NodeId) -> bool,
) {
    loop {
        let container = range.end().container;
        if predicate(doc, container) || doc.parent(container).is_none() {
            break;
        }
        range.set_end_after(doc, container);
    }
}

/// Like [`extend_start_to_container`], but only while the start sits at offset 0.
pub fn extend_start_to_adjacent_container(
    doc: &Document,
    range: &mut Range,
    predicate: impl Fn(&Document, NodeId) -> bool,
) {
    loop {
        let Boundary { container, offset } = range.start();
        if offset > 0 || predicate(doc, container) || doc.parent(container).is_none() {
            break;
        }
        range.set_start_before(doc, container);
    }
}

/// Like [`extend_end_to_container`], but only while the end sits at its container's end.
pub fn extend_end_to_adjacent_container(
    doc: &Document,
    range: &mut Range,
    predicate: impl Fn(&Document, NodeId) -> bool,
) {
    loop {
        let Boundary { container, offset } = range.end();
        if offset < doc.len(container) || predicate(doc, container) || doc.parent(container).is_none()
        {
            break;
        }
        range.set_end_after(doc, container);
    }
}

/// Structurally split `source` around `separator`.
///
/// Every node between the separator's boundaries and the common ancestor of `source`
/// is split so that the separator becomes a run of whole children of that ancestor.
/// `separator` is rewritten to that run and the two parts of `source` outside it are
/// returned. When `separator` is not within `source` nothing changes and `[source]` is
/// returned.
pub fn split_range(doc: &mut Document, source: &Range, separator: &mut Range) -> Vec<Range> {
    if !contains(doc, source, separator) {
        return vec![*source];
    }
    let Some(mut root) = source.common_ancestor(doc) else {
        return vec![*source];
    };
    if doc.is_text(root)
        && let Some(parent) = doc.parent(root)
    {
        root = parent;
    }

    let mut tracked = [source.start(), source.end(), separator.end()];
    let before_cut = doc.split_up_to(separator.start(), root, SplitMode::Partial, &mut tracked);
    let [start, end, separator_end] = tracked;
    let mut tracked = [start, end, before_cut];
    let after_cut = doc.split_up_to(separator_end, root, SplitMode::Partial, &mut tracked);
    let [start, end, before_cut] = tracked;

    let mut prev = Range::collapsed(start);
    prev.set_end(doc, before_cut);
    let mut next = Range::collapsed(after_cut);
    next.set_end(doc, end);
    *separator = Range::collapsed(before_cut);
    separator.set_end(doc, after_cut);
    vec![prev, next]
}

/// Horizontal position of a caret, as reported by the geometry provider.
pub fn caret_position(doc: &Document, geometry: &dyn CaretGeometry, caret: &Range) -> f64 {
    assert!(caret.is_collapsed(), "caret must be collapsed");
    geometry.caret_position(doc, caret)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traversal::TraversalSet;

    // <body><p>ab<b>cd</b></p><p>ef<br/>gh</p></body>
    struct Fixture {
        doc: Document,
        p1: NodeId,
        ab: NodeId,
        bold: NodeId,
        cd: NodeId,
        p2: NodeId,
        ef: NodeId,
        br: NodeId,
        gh: NodeId,
    }

    fn fixture() -> Fixture {
        let mut doc = Document::new();
        let root = doc.root();
        let p1 = doc.append_block(root, "p");
        let ab = doc.append_text(p1, "ab");
        let bold = doc.append_format(p1, "b");
        let cd = doc.append_text(bold, "cd");
        let p2 = doc.append_block(root, "p");
        let ef = doc.append_text(p2, "ef");
        let br = doc.append_linebreak(p2);
        let gh = doc.append_text(p2, "gh");
        Fixture {
            doc,
            p1,
            ab,
            bold,
            cd,
            p2,
            ef,
            br,
            gh,
        }
    }

    fn range(doc: &Document, start: (NodeId, usize), end: (NodeId, usize)) -> Range {
        Range::new(
            doc,
            Boundary::new(start.0, start.1),
            Boundary::new(end.0, end.1),
        )
        .unwrap()
    }

    #[test]
    fn test_align_to_corners() {
        let f = fixture();
        let source = range(&f.doc, (f.cd, 1), (f.ef, 1));

        let mut r = range(&f.doc, (f.ab, 0), (f.gh, 2));
        align_to(&f.doc, &mut r, Corner::StartToStart, &source);
        assert_eq!(r.start(), Boundary::new(f.cd, 1));

        let mut r = range(&f.doc, (f.ab, 0), (f.gh, 2));
        align_to(&f.doc, &mut r, Corner::StartToEnd, &source);
        assert_eq!(r.end(), Boundary::new(f.cd, 1));

        let mut r = range(&f.doc, (f.ab, 0), (f.gh, 2));
        align_to(&f.doc, &mut r, Corner::EndToEnd, &source);
        assert_eq!(r.end(), Boundary::new(f.ef, 1));

        let mut r = range(&f.doc, (f.ab, 0), (f.ab, 1));
        align_to(&f.doc, &mut r, Corner::EndToStart, &source);
        assert!(r.is_collapsed());
        assert_eq!(r.start(), Boundary::new(f.ef, 1));
    }

    #[test]
    fn test_contains_and_intersect() {
        let f = fixture();
        let outer = range(&f.doc, (f.ab, 0), (f.ef, 2));
        let inner = range(&f.doc, (f.cd, 0), (f.cd, 2));
        assert!(contains(&f.doc, &outer, &inner));
        assert!(!contains(&f.doc, &inner, &outer));
        assert!(is_equal_range(&f.doc, &inner, &inner));
        assert!(!is_equal_range(&f.doc, &inner, &outer));

        let left = range(&f.doc, (f.ab, 0), (f.cd, 1));
        let right = range(&f.doc, (f.cd, 1), (f.gh, 1));
        let touching = intersect(&f.doc, &left, &right).unwrap();
        assert_eq!(touching, Range::collapsed(Boundary::new(f.cd, 1)));

        let apart = range(&f.doc, (f.ef, 0), (f.gh, 1));
        assert_eq!(intersect(&f.doc, &left, &apart), None);

        let overlap = intersect(&f.doc, &outer, &right).unwrap();
        assert_eq!(overlap, range(&f.doc, (f.cd, 1), (f.ef, 2)));
    }

    #[test]
    fn test_extend_to_line_boundaries() {
        let f = fixture();
        let set = TraversalSet::new(f.doc.root());

        let mut r = Range::collapsed(Boundary::new(f.gh, 1));
        extend_start(&f.doc, &mut r, &set.line_boundary, ExtendMode::Inner);
        assert_eq!(r.start(), Boundary::new(f.p2, 2));
        extend_end(&f.doc, &mut r, &set.line_boundary, ExtendMode::Inner);
        assert_eq!(r.end(), Boundary::new(f.p2, 3));

        let mut r = Range::collapsed(Boundary::new(f.ef, 1));
        extend_start(&f.doc, &mut r, &set.line_boundary, ExtendMode::Inner);
        assert_eq!(r.start(), Boundary::new(f.p2, 0));
        extend_end(&f.doc, &mut r, &set.line_boundary, ExtendMode::Inner);
        assert_eq!(r.end(), Boundary::new(f.p2, 1));

        let mut r = Range::collapsed(Boundary::new(f.ef, 1));
        extend_end(&f.doc, &mut r, &set.line_boundary, ExtendMode::Outer);
        assert_eq!(r.end(), Boundary::new(f.p2, 2));
        assert_eq!(f.doc.child(f.p2, 1), Some(f.br));
    }

    #[test]
    fn test_extend_is_idempotent() {
        let f = fixture();
        let set = TraversalSet::new(f.doc.root());
        for traversal in [&set.line_boundary, &set.inline_boundary, &set.block] {
            let mut r = range(&f.doc, (f.cd, 1), (f.ef, 1));
            extend_start(&f.doc, &mut r, traversal, ExtendMode::Inner);
            extend_end(&f.doc, &mut r, traversal, ExtendMode::Inner);
            let once = r;
            extend_start(&f.doc, &mut r, traversal, ExtendMode::Inner);
            extend_end(&f.doc, &mut r, traversal, ExtendMode::Inner);
            assert_eq!(r, once);
        }
    }

    #[test]
    fn test_extend_without_match_reaches_root_edges() {
        let f = fixture();
        let set = TraversalSet::new(f.doc.root());
        let mut r = range(&f.doc, (f.cd, 1), (f.ef, 1));
        extend_start(&f.doc, &mut r, &set.linebreak, ExtendMode::Inner);
        assert_eq!(r.start(), Boundary::new(f.doc.root(), 0));

        let mut r = Range::collapsed(Boundary::new(f.gh, 1));
        extend_end(&f.doc, &mut r, &set.linebreak, ExtendMode::Inner);
        assert_eq!(r.end(), Boundary::new(f.doc.root(), 2));
    }

    #[test]
    fn test_extend_to_containers() {
        let f = fixture();
        let mut r = range(&f.doc, (f.cd, 0), (f.cd, 2));
        extend_start_to_adjacent_container(&f.doc, &mut r, Document::is_block);
        assert_eq!(r.start(), Boundary::new(f.p1, 1));
        extend_end_to_adjacent_container(&f.doc, &mut r, Document::is_block);
        assert_eq!(r.end(), Boundary::new(f.p1, 2));

        let mut r = range(&f.doc, (f.cd, 1), (f.cd, 1));
        extend_start_to_container(&f.doc, &mut r, Document::is_block);
        extend_end_to_container(&f.doc, &mut r, Document::is_block);
        assert_eq!(r, range(&f.doc, (f.p1, 1), (f.p1, 2)));

        let mut r = range(&f.doc, (f.cd, 1), (f.cd, 1));
        extend_start_to_adjacent_container(&f.doc, &mut r, Document::is_block);
        assert_eq!(r.start(), Boundary::new(f.cd, 1));
    }

    #[test]
    fn test_split_range_partitions_source() {
        let mut f = fixture();
        let source = range(&f.doc, (f.ab, 1), (f.cd, 2));
        let mut separator = range(&f.doc, (f.ab, 2), (f.cd, 1));
        let parts = split_range(&mut f.doc, &source, &mut separator);

        assert_eq!(
            f.doc.debug_markup(f.p1),
            "<p>ab<b>c</b><b>d</b></p>"
        );
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0], range(&f.doc, (f.ab, 1), (f.p1, 1)));
        assert_eq!(separator, range(&f.doc, (f.p1, 1), (f.p1, 2)));
        let tail = f.doc.child(f.p1, 2).unwrap();
        assert_eq!(parts[1].start(), Boundary::new(f.p1, 2));
        assert_eq!(parts[1].end().offset, 1);
        assert!(f.doc.contains(tail, parts[1].end().container));
        assert_eq!(f.doc.child(f.p1, 1), Some(f.bold));
    }

    #[test]
    fn test_split_range_outside_is_identity() {
        let mut f = fixture();
        let before = f.doc.debug_markup(f.doc.root());
        let source = range(&f.doc, (f.ab, 0), (f.cd, 1));
        let mut separator = range(&f.doc, (f.ef, 0), (f.gh, 1));
        let parts = split_range(&mut f.doc, &source, &mut separator);
        assert_eq!(parts, vec![source]);
        assert_eq!(separator, range(&f.doc, (f.ef, 0), (f.gh, 1)));
        assert_eq!(f.doc.debug_markup(f.doc.root()), before);
    }
}
