//! Caret Walker
//!
//! Steps collapsed ranges ("carets") through the document one visual position at a
//! time. Horizontal stepping only looks at the tree: every character gap of a
//! non-empty text run, both sides of an inline embed and the start of every line are
//! caret stops, while redundant positions at the end of a line are folded away.
//! Vertical stepping combines horizontal stepping with a [`CaretGeometry`] query to
//! find the caret on the adjacent visual line closest to the original column.

use std::cmp::Ordering;

use tracing::trace;

use crate::algebra::{ExtendMode, caret_position, contains, extend_end, extend_start};
use crate::document::{Boundary, Document, NodeId};
use crate::geometry::CaretGeometry;
use crate::range::{Corner, Range, after, before};
use crate::traversal::TraversalSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Vertical {
    Up,
    Down,
}

/// Caret stepping, equivalence and distance over one editing root.
#[derive(Debug, Clone)]
pub struct CaretWalker {
    traversals: TraversalSet,
}

impl CaretWalker {
    /// Walker for the editing root `root`.
    pub fn new(root: NodeId) -> Self {
        Self {
            traversals: TraversalSet::new(root),
        }
    }

    /// Walker for the whole document.
    pub fn for_document(doc: &Document) -> Self {
        Self::new(doc.root())
    }

    /// Traversals used by the walker.
    pub fn traversals(&self) -> &TraversalSet {
        &self.traversals
    }

    /// Previous caret stop, or `None` at the start of the document.
    ///
    /// # Panics
    ///
    /// Panics if `caret` is not collapsed.
    pub fn prev_caret(&self, doc: &Document, caret: &Range) -> Option<Range> {
        assert!(caret.is_collapsed(), "caret must be collapsed");
        let Boundary { container, offset } = caret.start();
        if doc.is_non_empty_text(container) && offset > 0 {
            return Some(Range::collapsed(Boundary::new(container, offset - 1)));
        }

        let node = self.traversals.content.node_before(doc, caret.start())?;
        let mut line = *caret;
        extend_start(
            doc,
            &mut line,
            &self.traversals.line_boundary,
            ExtendMode::Inner,
        );
        let in_line = line.intersects_node(doc, node);

        let point = if doc.is_non_empty_text(node) {
            let len = doc.len(node);
            Boundary::new(node, if in_line { len - 1 } else { len })
        } else if doc.is_inline_embedded(node) {
            if in_line {
                before(doc, node)
            } else {
                after(doc, node)
            }
        } else {
            // A line break is never inside the line that starts after it.
            before(doc, node)
        };
        trace!(?node, in_line, ?point, "prev caret");
        Some(Range::collapsed(point))
    }

    /// Next caret stop, or `None` at the end of the document.
    ///
    /// A line break that ends the caret's own line is stepped over once, so the caret
    /// lands on the first unit of the following line.
    ///
    /// # Panics
    ///
    /// Panics if `caret` is not collapsed.
    pub fn next_caret(&self, doc: &Document, caret: &Range) -> Option<Range> {
        assert!(caret.is_collapsed(), "caret must be collapsed");
        let mut point = caret.start();
        let mut after_line_end = false;
        loop {
            let Boundary { container, offset } = point;
            if doc.is_non_empty_text(container) && offset < doc.len(container) {
                return Some(Range::collapsed(Boundary::new(container, offset + 1)));
            }

            let node = self.traversals.content.node_after(doc, point)?;
            let in_line = !after_line_end && {
                let mut line = Range::collapsed(point);
                extend_end(
                    doc,
                    &mut line,
                    &self.traversals.line_boundary,
                    ExtendMode::Decide(|doc, node, _| doc.is_linebreak(node)),
                );
                line.intersects_node(doc, node)
            };

            let next = if doc.is_non_empty_text(node) {
                Boundary::new(node, if in_line { 1 } else { 0 })
            } else if doc.is_inline_embedded(node) {
                if in_line {
                    after(doc, node)
                } else {
                    before(doc, node)
                }
            } else if in_line {
                trace!(?node, "skip line end break");
                point = after(doc, node);
                after_line_end = true;
                continue;
            } else {
                before(doc, node)
            };
            trace!(?node, in_line, ?next, "next caret");
            return Some(Range::collapsed(next));
        }
    }

    /// Caret on the visual line above, closest to the caret's horizontal position.
    ///
    /// With no line above the scan runs out at the first caret of the document and
    /// returns it, so on the first line this acts like moving to the line start.
    pub fn upper_caret(&self, doc: &Document, geometry: &dyn CaretGeometry, caret: &Range) -> Range {
        self.vertical_caret(doc, geometry, caret, Vertical::Up)
    }

    /// Caret on the visual line below, closest to the caret's horizontal position.
    ///
    /// With no line below the scan runs out at the last caret of the document and
    /// returns it, so on the last line this acts like moving to the line end.
    pub fn lower_caret(&self, doc: &Document, geometry: &dyn CaretGeometry, caret: &Range) -> Range {
        self.vertical_caret(doc, geometry, caret, Vertical::Down)
    }

    fn vertical_caret(
        &self,
        doc: &Document,
        geometry: &dyn CaretGeometry,
        caret: &Range,
        direction: Vertical,
    ) -> Range {
        assert!(caret.is_collapsed(), "caret must be collapsed");
        let step = |caret: &Range| match direction {
            Vertical::Up => self.prev_caret(doc, caret),
            Vertical::Down => self.next_caret(doc, caret),
        };
        // Positions shrink while moving left along a line; a jump back marks a line change.
        let crossed = |current: f64, last: f64| match direction {
            Vertical::Up => current >= last,
            Vertical::Down => current <= last,
        };
        let position = |caret: &Range| caret_position(doc, geometry, caret);
        let target = position(caret);

        let mut last = *caret;
        let mut current = loop {
            let Some(current) = step(&last) else {
                return last;
            };
            if crossed(position(&current), position(&last)) {
                break current;
            }
            last = current;
        };

        loop {
            last = current;
            let Some(next) = step(&last) else {
                return last;
            };
            let next_position = position(&next);
            let last_position = position(&last);
            if crossed(next_position, last_position) {
                return last;
            }
            if (next_position - target).abs() >= (last_position - target).abs() {
                trace!(?last, target, "vertical target reached");
                return last;
            }
            current = next;
        }
    }

    /// Whether two carets denote the same visual position.
    ///
    /// Carets strictly inside a text run must be identical. Otherwise carets at the edge
    /// of a run are moved just outside it, and the carets are equivalent when one lies
    /// within the other widened over surrounding inline boundaries.
    pub fn is_equivalent_caret(&self, doc: &Document, a: &Range, b: &Range) -> bool {
        let (a, b) = (a.start(), b.start());
        if in_mid_text(doc, a) || in_mid_text(doc, b) {
            return a == b;
        }
        let a = outside_text_edge(doc, a);
        let b = outside_text_edge(doc, b);
        contains(doc, &self.widen(doc, a), &Range::collapsed(b))
            || contains(doc, &self.widen(doc, b), &Range::collapsed(a))
    }

    fn widen(&self, doc: &Document, point: Boundary) -> Range {
        let mut range = Range::collapsed(point);
        let walker = &self.traversals.inline_boundary;
        extend_start(doc, &mut range, walker, ExtendMode::Inner);
        extend_end(doc, &mut range, walker, ExtendMode::Inner);
        range
    }

    /// Number of [`CaretWalker::next_caret`] steps from the earlier caret to the later.
    pub fn distance_between(&self, doc: &Document, a: &Range, b: &Range) -> usize {
        let (from, to) = match doc.compare_boundaries(a.start(), b.start()) {
            Ordering::Equal => return 0,
            Ordering::Less => (a, b),
            Ordering::Greater => (b, a),
        };
        let mut current = *from;
        let mut steps = 0;
        while doc.compare_boundaries(current.start(), to.start()) == Ordering::Less {
            match self.next_caret(doc, &current) {
                Some(next) if next != current => {
                    current = next;
                    steps += 1;
                }
                _ => break,
            }
        }
        steps
    }

    /// Distance between the boundaries of `range` and `source` selected by `corner`.
    pub fn distance_between_ranges(
        &self,
        doc: &Document,
        range: &Range,
        corner: Corner,
        source: &Range,
    ) -> usize {
        if range.compare_corner(doc, corner, source) == Ordering::Equal {
            return 0;
        }
        let a = Range::collapsed(range.boundary(corner.own_side()));
        let b = Range::collapsed(source.boundary(corner.source_side()));
        self.distance_between(doc, &a, &b)
    }
}

fn in_mid_text(doc: &Document, point: Boundary) -> bool {
    doc.is_non_empty_text(point.container)
        && point.offset > 0
        && point.offset < doc.len(point.container)
}

fn outside_text_edge(doc: &Document, point: Boundary) -> Boundary {
    if !doc.is_non_empty_text(point.container) {
        return point;
    }
    if point.offset == 0 {
        before(doc, point.container)
    } else {
        after(doc, point.container)
    }
}
