//! Insertion editing.
//!
//! [`InsertionEditor`] applies typing, line breaks, paragraph breaks and backspace to
//! a range. Every operation runs the same pipeline:
//!
//! 1. normalize the enclosing block and pull the range inside its content,
//! 2. push the range just outside its content,
//! 3. delete a non-empty selection and join the lines it spanned,
//! 4. perform the operation,
//! 5. pull the caret back inside the content and normalize again.

use thiserror::Error;
use tracing::debug;

use crate::algebra::{ExtendMode, align_to, extend_end};
use crate::caret::CaretWalker;
use crate::document::{Boundary, Document, NodeId, NodeKind, SplitMode};
use crate::range::{Corner, Range, RangeError, Side, track, untrack};
use crate::regulator::RangeRegulator;

/// One editing operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOperation {
    /// Replace the range with text.
    InsertText(String),
    /// Replace the range with a line break.
    BreakLine,
    /// Replace the range with a paragraph break.
    BreakParagraph,
    /// Delete the range, or the caret stop before a caret.
    Backspace,
}

/// Errors reported by [`InsertionEditor::apply`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditError {
    /// `InsertText` with an empty string.
    #[error("text cannot be empty")]
    EmptyText,
    /// The range does not address the document.
    #[error(transparent)]
    Range(#[from] RangeError),
}

/// Applies [`EditOperation`]s over one editing root.
#[derive(Debug, Clone)]
pub struct InsertionEditor {
    walker: CaretWalker,
    regulator: RangeRegulator,
}

impl InsertionEditor {
    /// Editor for the editing root `root`.
    pub fn new(root: NodeId) -> Self {
        Self {
            walker: CaretWalker::new(root),
            regulator: RangeRegulator::new(root),
        }
    }

    /// Editor for the whole document.
    pub fn for_document(doc: &Document) -> Self {
        Self::new(doc.root())
    }

    /// Apply `operation` to `range`, leaving `range` as the caret after the edit.
    pub fn apply(
        &self,
        doc: &mut Document,
        range: &mut Range,
        operation: EditOperation,
    ) -> Result<(), EditError> {
        range.validate(doc)?;
        if matches!(&operation, EditOperation::InsertText(text) if text.is_empty()) {
            return Err(EditError::EmptyText);
        }
        debug!(?operation, ?range, "apply edit");

        let regulator = &self.regulator;
        regulator.normalize(doc, range, &mut []);
        regulator.adjust_to_content_inner_range(doc, range, &mut []);

        let collapsed = range.is_collapsed();
        regulator.adjust_to_content_outer_range(doc, range, &mut []);
        if !collapsed {
            delete_contents(doc, range, &mut [])?;
            self.collapse_lines(doc, range);
        }

        match operation {
            EditOperation::InsertText(text) => {
                regulator.adjust_to_content_inner_range(doc, range, &mut []);
                insert_text(doc, range, &text);
            }
            EditOperation::BreakLine => self.insert_linebreak(doc, range),
            EditOperation::BreakParagraph => self.break_paragraph(doc, range),
            EditOperation::Backspace => {
                if collapsed {
                    self.delete_backward(doc, range)?;
                }
            }
        }

        regulator.adjust_to_content_inner_range(doc, range, &mut []);
        regulator.normalize(doc, range, &mut []);
        debug!(?range, "edit applied");
        Ok(())
    }

    fn is_collapsed_block(&self, doc: &Document, block: NodeId) -> bool {
        self.walker
            .traversals()
            .content
            .first_child(doc, block)
            .is_none()
    }

    /// Whether no content lies between the start of `line` and its end.
    fn is_collapsed_line(&self, doc: &Document, line: &Range) -> bool {
        match self.walker.traversals().content.node_before(doc, line.end()) {
            Some(node) => !line.intersects_node(doc, node),
            None => true,
        }
    }

    /// Join the lines on both sides of a caret sitting between two children.
    ///
    /// Empty blocks next to the caret are dropped. When content remains on both sides
    /// and one of them is a block, the following line moves to the end of the
    /// preceding one and the caret lands at the junction.
    fn collapse_lines(&self, doc: &mut Document, caret: &mut Range) {
        debug_assert!(caret.is_collapsed());
        let Boundary {
            container,
            mut offset,
        } = caret.start();
        if !doc.is_element(container) {
            return;
        }
        let mut prev = offset.checked_sub(1).and_then(|i| doc.child(container, i));
        let mut next = doc.child(container, offset);
        if let Some(node) = prev
            && is_block_element(doc, node)
            && self.is_collapsed_block(doc, node)
        {
            doc.remove(node);
            offset -= 1;
            prev = None;
        }
        if let Some(node) = next
            && is_block_element(doc, node)
            && self.is_collapsed_block(doc, node)
        {
            doc.remove(node);
            next = None;
        }
        *caret = Range::collapsed(Boundary::new(container, offset));

        let (Some(prev), Some(next)) = (prev, next) else {
            return;
        };
        let (prev_is_block, next_is_block) =
            (is_block_element(doc, prev), is_block_element(doc, next));
        if !prev_is_block && !next_is_block {
            return;
        }
        let moved: Vec<NodeId> = if next_is_block {
            doc.children(next).to_vec()
        } else {
            doc.children(container)[offset..]
                .iter()
                .copied()
                .take_while(|&node| !doc.is_block(node))
                .collect()
        };
        let (target, mut index) = if prev_is_block {
            (prev, doc.len(prev))
        } else {
            (container, offset)
        };
        let junction = Boundary::new(target, index);
        for node in moved {
            doc.detach(node);
            doc.insert(target, index, node);
            index += 1;
        }
        if next_is_block {
            doc.remove(next);
        }
        debug!(?junction, "lines joined");
        *caret = Range::collapsed(junction);
    }

    /// Insert a line break, plus a placeholder break when the new line would be empty.
    fn insert_linebreak(&self, doc: &mut Document, caret: &mut Range) {
        let linebreak = doc.create_linebreak();
        insert_node(doc, caret, linebreak, &mut []);
        caret.collapse(Side::End);

        let mut line = *caret;
        extend_end(
            doc,
            &mut line,
            &self.walker.traversals().block,
            ExtendMode::Inner,
        );
        if self.is_collapsed_line(doc, &line) {
            let placeholder = doc.create_linebreak();
            let mut at = Range::collapsed(line.start());
            let mut tracked = [caret.start()];
            insert_node(doc, &mut at, placeholder, &mut tracked);
            *caret = Range::collapsed(tracked[0]);
            debug!(?placeholder, "blank line placeholder");
        }
    }

    /// Split the enclosing block at the caret; the caret moves to the start of the
    /// second half. Directly inside the editing root this is a line break.
    fn break_paragraph(&self, doc: &mut Document, caret: &mut Range) {
        let block = doc.closest(caret.start().container, Document::is_block);
        let root = self.walker.traversals().root();
        let parent = match doc.parent(block) {
            Some(parent) if block != root => parent,
            _ => {
                self.insert_linebreak(doc, caret);
                return;
            }
        };

        let cut = doc.split_up_to(caret.start(), parent, SplitMode::Always, &mut []);
        let head = doc.child(parent, cut.offset - 1).expect("split leaves a head");
        let tail = doc.child(parent, cut.offset).expect("split leaves a tail");
        if self.is_collapsed_block(doc, head) {
            let placeholder = doc.create_linebreak();
            doc.append(head, placeholder);
        }
        *caret = Range::collapsed(Boundary::new(tail, 0));
        if self.is_collapsed_block(doc, tail) {
            let placeholder = doc.create_linebreak();
            doc.insert(tail, 0, placeholder);
        }
        debug!(?head, ?tail, "paragraph split");
    }

    /// Delete back to the previous caret stop and join the lines it crossed.
    fn delete_backward(&self, doc: &mut Document, caret: &mut Range) -> Result<(), RangeError> {
        let Some(prev) = self.walker.prev_caret(doc, caret) else {
            return Ok(());
        };
        align_to(doc, caret, Corner::StartToStart, &prev);
        delete_contents(doc, caret, &mut [])?;
        self.collapse_lines(doc, caret);
        Ok(())
    }
}

/// Block elements proper; block-displayed embeds are atomic.
fn is_block_element(doc: &Document, node: NodeId) -> bool {
    matches!(doc.kind(node), NodeKind::Block { .. })
}

fn insert_text(doc: &mut Document, caret: &mut Range, text: &str) {
    let Boundary { container, offset } = caret.start();
    if doc.is_text(container) {
        doc.insert_text(container, offset, text, &mut []);
        *caret = Range::collapsed(Boundary::new(container, offset + text.chars().count()));
    } else {
        let node = doc.create_text(text);
        insert_node(doc, caret, node, &mut []);
        caret.collapse(Side::End);
    }
}

/// Insert a detached `node` at the start of `range`.
///
/// A start inside text splits the text. The range start becomes the gap before
/// `node`; a collapsed range grows to cover `node`.
pub fn insert_node(doc: &mut Document, range: &mut Range, node: NodeId, tracked: &mut [Boundary]) {
    let start = range.start();
    let parent = if doc.is_text(start.container) {
        doc.parent(start.container).expect("text node has a parent")
    } else {
        start.container
    };
    let collapsed = range.is_collapsed();
    let mut points = track(&[range.end()], tracked);
    let gap = doc.split_up_to(start, parent, SplitMode::Partial, &mut points);
    doc.insert_tracked(parent, gap.offset, node, &mut points);
    let end = if collapsed {
        Boundary::new(parent, gap.offset + 1)
    } else {
        points[0]
    };
    *range = Range::from_ordered(gap, end);
    untrack(&points, 1, tracked);
}

/// Remove everything inside `range` and collapse it onto the removal point.
///
/// Nodes cut by a boundary are split; the halves outside the range stay in place.
/// Boundaries in `tracked` that pointed into removed content move to the removal point.
/// Fails without touching the document when `range` no longer addresses it.
pub fn delete_contents(
    doc: &mut Document,
    range: &mut Range,
    tracked: &mut [Boundary],
) -> Result<(), RangeError> {
    range.validate(doc)?;
    if range.is_collapsed() {
        return Ok(());
    }
    let Boundary { container, offset } = range.start();
    if container == range.end().container && doc.is_text(container) {
        doc.delete_text(container, offset, range.end().offset, tracked);
        range.collapse(Side::Start);
        return Ok(());
    }

    let ancestor = range
        .common_ancestor(doc)
        .ok_or(RangeError::Detached(range.end().container))?;
    let mut points = track(&[range.end()], tracked);
    let head = doc.split_up_to(range.start(), ancestor, SplitMode::Partial, &mut points);
    let end = points[0];
    points[0] = head;
    let tail = doc.split_up_to(end, ancestor, SplitMode::Partial, &mut points);
    let head = points[0];
    for _ in head.offset..tail.offset {
        let child = doc.child(ancestor, head.offset).expect("checked");
        doc.remove_tracked(child, &mut points[1..]);
    }
    untrack(&points, 1, tracked);
    *range = Range::collapsed(head);
    Ok(())
}
