//! Filtered traversals over the document tree.
//!
//! A [`Traversal`] is a stateless tree walker: a root plus a filter that classifies
//! every node as [`Visit::Accept`], [`Visit::Skip`] (descend but don't yield) or
//! [`Visit::Reject`] (prune the subtree). The walking primitives follow the DOM
//! `TreeWalker` algorithms, but take the current node as an argument instead of
//! holding a cursor, so a traversal can be shared and cloned freely.
//!
//! On top of the primitives sit the seeded lookups used by the caret and range code:
//! [`Traversal::node_before`] / [`Traversal::node_after`] search from a boundary point,
//! and [`Traversal::nodes_within`] lazily lists the accepted nodes touching a range.

use std::cmp::Ordering;

use thiserror::Error;

use crate::document::{Boundary, Document, NodeId};
use crate::range::{Corner, Range};

/// Outcome of classifying one node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visit {
    /// Yield the node.
    Accept,
    /// Don't yield the node, but look at its descendants.
    Skip,
    /// Prune the node and its subtree.
    Reject,
}

/// Node predicate: `true` accepts, `false` skips.
pub type NodePredicate = fn(&Document, NodeId) -> bool;

/// Three-way node classifier.
pub type NodeClassifier = fn(&Document, NodeId) -> Visit;

#[derive(Debug, Clone)]
enum Filter {
    Predicate(NodePredicate),
    Classifier(NodeClassifier),
    Union(Vec<Traversal>),
}

/// Errors raised when composing traversals.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TraversalError {
    /// No member traversals were given.
    #[error("cannot compose an empty set of traversals")]
    Empty,
    /// Two member roots are not nested, so no member root contains all the others.
    #[error("traversal roots {0:?} and {1:?} are not nested")]
    IncompatibleRoots(NodeId, NodeId),
}

/// A filtered, rooted walk over the document.
#[derive(Debug, Clone)]
pub struct Traversal {
    root: NodeId,
    filter: Filter,
}

impl Traversal {
    /// Traversal accepting nodes that match `predicate` and skipping the rest.
    pub fn new(root: NodeId, predicate: NodePredicate) -> Self {
        Self {
            root,
            filter: Filter::Predicate(predicate),
        }
    }

    /// Traversal driven by a three-way classifier.
    pub fn with_classifier(root: NodeId, classifier: NodeClassifier) -> Self {
        Self {
            root,
            filter: Filter::Classifier(classifier),
        }
    }

    /// Compose traversals into one.
    ///
    /// A node is accepted if any member accepts it, skipped if none accepts but some
    /// member skips it, and rejected otherwise. The composed root is the member root
    /// that contains every other member root.
    pub fn union(doc: &Document, members: Vec<Traversal>) -> Result<Self, TraversalError> {
        let mut root: Option<NodeId> = None;
        for member in &members {
            root = Some(match root {
                None => member.root,
                Some(current) if doc.contains(current, member.root) => current,
                Some(current) if doc.contains(member.root, current) => member.root,
                Some(current) => {
                    return Err(TraversalError::IncompatibleRoots(current, member.root));
                }
            });
        }
        let root = root.ok_or(TraversalError::Empty)?;
        Ok(Self::union_at(root, members))
    }

    /// Compose members that are known to share `root`.
    fn union_at(root: NodeId, members: Vec<Traversal>) -> Self {
        Self {
            root,
            filter: Filter::Union(members),
        }
    }

    /// Root of the walk.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Classify a node.
    pub fn classify(&self, doc: &Document, node: NodeId) -> Visit {
        match &self.filter {
            Filter::Predicate(predicate) => {
                if predicate(doc, node) {
                    Visit::Accept
                } else {
                    Visit::Skip
                }
            }
            Filter::Classifier(classifier) => classifier(doc, node),
            Filter::Union(members) => {
                if node == self.root {
                    return Visit::Skip;
                }
                let mut skip = false;
                for member in members {
                    match member.classify(doc, node) {
                        Visit::Accept => return Visit::Accept,
                        Visit::Skip => skip = true,
                        Visit::Reject => {}
                    }
                }
                if skip { Visit::Skip } else { Visit::Reject }
            }
        }
    }

    /// Whether the filter accepts `node`.
    pub fn accepts(&self, doc: &Document, node: NodeId) -> bool {
        self.classify(doc, node) == Visit::Accept
    }

    // ---- tree walker primitives ----

    /// Nearest accepted proper ancestor of `node`, not going above the root.
    pub fn parent_node(&self, doc: &Document, node: NodeId) -> Option<NodeId> {
        let mut node = node;
        while node != self.root {
            node = doc.parent(node)?;
            if self.accepts(doc, node) {
                return Some(node);
            }
        }
        None
    }

    /// First accepted node among the (skip-flattened) children of `node`.
    pub fn first_child(&self, doc: &Document, node: NodeId) -> Option<NodeId> {
        self.traverse_children(doc, node, true)
    }

    /// Last accepted node among the (skip-flattened) children of `node`.
    pub fn last_child(&self, doc: &Document, node: NodeId) -> Option<NodeId> {
        self.traverse_children(doc, node, false)
    }

    fn traverse_children(&self, doc: &Document, current: NodeId, forward: bool) -> Option<NodeId> {
        let edge_child = |node: NodeId| {
            if forward {
                doc.first_child(node)
            } else {
                doc.last_child(node)
            }
        };
        let mut node = edge_child(current)?;
        loop {
            match self.classify(doc, node) {
                Visit::Accept => return Some(node),
                Visit::Skip => {
                    if let Some(child) = edge_child(node) {
                        node = child;
                        continue;
                    }
                }
                Visit::Reject => {}
            }
            loop {
                let sibling = if forward {
                    doc.next_sibling(node)
                } else {
                    doc.previous_sibling(node)
                };
                if let Some(sibling) = sibling {
                    node = sibling;
                    break;
                }
                match doc.parent(node) {
                    Some(parent) if parent != self.root && parent != current => node = parent,
                    _ => return None,
                }
            }
        }
    }

    /// Accepted node preceding `node` in pre-order, staying inside the root.
    pub fn previous_node(&self, doc: &Document, node: NodeId) -> Option<NodeId> {
        let mut node = node;
        while node != self.root {
            let mut sibling = doc.previous_sibling(node);
            while let Some(current) = sibling {
                node = current;
                let mut visit = self.classify(doc, node);
                while visit != Visit::Reject {
                    let Some(last) = doc.last_child(node) else {
                        break;
                    };
                    node = last;
                    visit = self.classify(doc, node);
                }
                if visit == Visit::Accept {
                    return Some(node);
                }
                sibling = doc.previous_sibling(node);
            }
            if node == self.root {
                return None;
            }
            node = doc.parent(node)?;
            if self.accepts(doc, node) {
                return Some(node);
            }
        }
        None
    }

    /// Accepted node following `node` in pre-order, staying inside the root.
    pub fn next_node(&self, doc: &Document, node: NodeId) -> Option<NodeId> {
        let mut node = node;
        let mut visit = Visit::Accept;
        loop {
            while visit != Visit::Reject {
                let Some(first) = doc.first_child(node) else {
                    break;
                };
                node = first;
                visit = self.classify(doc, node);
                if visit == Visit::Accept {
                    return Some(node);
                }
            }
            let mut following = None;
            let mut climb = Some(node);
            while let Some(current) = climb {
                if current == self.root {
                    return None;
                }
                if let Some(sibling) = doc.next_sibling(current) {
                    following = Some(sibling);
                    break;
                }
                climb = doc.parent(current);
            }
            node = following?;
            visit = self.classify(doc, node);
            if visit == Visit::Accept {
                return Some(node);
            }
        }
    }

    // ---- seeded lookups ----

    fn deepest_last(&self, doc: &Document, node: NodeId) -> NodeId {
        let mut node = node;
        while let Some(last) = self.last_child(doc, node) {
            node = last;
        }
        node
    }

    /// Nearest accepted node ending before `point`.
    ///
    /// For an element container the search starts at the indexed child; at a trailing
    /// edge it starts from the container's deepest last accepted descendant, which may
    /// itself be the answer.
    pub fn node_before(&self, doc: &Document, point: Boundary) -> Option<NodeId> {
        let (current, inclusive) = match doc.child(point.container, point.offset) {
            Some(child) if doc.is_element(point.container) => (child, false),
            _ if doc.is_element(point.container) => {
                (self.deepest_last(doc, point.container), true)
            }
            _ => (point.container, false),
        };
        if inclusive && self.accepts(doc, current) {
            return Some(current);
        }
        self.previous_node(doc, current)
    }

    /// Nearest accepted node starting after `point`.
    ///
    /// For an element container the indexed child itself is a candidate; at a trailing
    /// edge the search continues after the container's deepest last accepted descendant.
    pub fn node_after(&self, doc: &Document, point: Boundary) -> Option<NodeId> {
        let (current, inclusive) = match doc.child(point.container, point.offset) {
            Some(child) if doc.is_element(point.container) => (child, true),
            _ if doc.is_element(point.container) => {
                (self.deepest_last(doc, point.container), false)
            }
            _ => (point.container, false),
        };
        if inclusive && self.accepts(doc, current) {
            return Some(current);
        }
        self.next_node(doc, current)
    }

    /// Nearest accepted inclusive ancestor of the range's common ancestor.
    pub fn node_containing(&self, doc: &Document, range: &Range) -> Option<NodeId> {
        let node = range.common_ancestor(doc)?;
        if self.accepts(doc, node) {
            return Some(node);
        }
        self.parent_node(doc, node)
    }

    /// Whether a non-collapsed range fully covers the first accepted node after its start.
    pub fn covers_node_after_start(&self, doc: &Document, range: &Range) -> bool {
        if range.is_collapsed() {
            return false;
        }
        let Some(node) = self.node_after(doc, range.start()) else {
            return false;
        };
        let node_range = if doc.is_text(node) {
            Range::selecting_node_contents(doc, node)
        } else {
            Range::selecting_node(doc, node)
        };
        range.compare_corner(doc, Corner::EndToEnd, &node_range) != Ordering::Less
    }

    /// Accepted nodes intersecting `range`, last first.
    ///
    /// The walk is seeded at the range end the same way as [`Traversal::node_before`], so a
    /// text node holding the end boundary is not listed; callers adjust the range to
    /// element boundaries first.
    pub fn nodes_within<'a>(&'a self, doc: &'a Document, range: Range) -> NodesWithin<'a> {
        NodesWithin {
            traversal: self,
            doc,
            range,
            cursor: Some(range.end()),
        }
    }

    /// Like [`Traversal::nodes_within`], but omits a node when it contains the node
    /// yielded just before it, so nested matches report only the innermost one.
    pub fn innermost_nodes_within<'a>(
        &'a self,
        doc: &'a Document,
        range: Range,
    ) -> InnermostNodesWithin<'a> {
        InnermostNodesWithin {
            inner: self.nodes_within(doc, range),
            last: None,
        }
    }
}

/// Lazy, single-pass reverse walk over the accepted nodes intersecting a range.
///
/// Returned by [`Traversal::nodes_within`]. Borrows the document for its lifetime.
pub struct NodesWithin<'a> {
    traversal: &'a Traversal,
    doc: &'a Document,
    range: Range,
    cursor: Option<Boundary>,
}

impl Iterator for NodesWithin<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let cursor = self.cursor.take()?;
        let node = self
            .traversal
            .node_before(self.doc, cursor)
            .filter(|&node| self.range.intersects_node(self.doc, node))?;
        self.cursor = self
            .doc
            .parent(node)
            .map(|parent| Boundary::new(parent, self.doc.index(node)));
        Some(node)
    }
}

/// Returned by [`Traversal::innermost_nodes_within`].
pub struct InnermostNodesWithin<'a> {
    inner: NodesWithin<'a>,
    last: Option<NodeId>,
}

impl Iterator for InnermostNodesWithin<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        loop {
            let node = self.inner.next()?;
            if let Some(last) = self.last
                && self.inner.doc.contains(node, last)
            {
                continue;
            }
            self.last = Some(node);
            return Some(node);
        }
    }
}

fn is_inline_node(doc: &Document, node: NodeId) -> bool {
    doc.is_content(node) || doc.is_format(node)
}

/// The standard traversals for one editing root.
#[derive(Debug, Clone)]
pub struct TraversalSet {
    /// Non-empty text runs.
    pub text: Traversal,
    /// Line breaks.
    pub linebreak: Traversal,
    /// Inline embeds.
    pub embed: Traversal,
    /// Blocks (including block embeds).
    pub block: Traversal,
    /// Format wrappers.
    pub format: Traversal,
    /// Text, line breaks and inline embeds.
    pub content: Traversal,
    /// Content plus format wrappers.
    pub inline: Traversal,
    /// Line breaks and blocks.
    pub line_boundary: Traversal,
    /// Text, line breaks, inline embeds and blocks.
    pub inline_boundary: Traversal,
}

impl TraversalSet {
    /// Build the standard traversals rooted at `root`.
    pub fn new(root: NodeId) -> Self {
        let text = Traversal::new(root, Document::is_non_empty_text);
        let linebreak = Traversal::new(root, Document::is_linebreak);
        let embed = Traversal::new(root, Document::is_inline_embedded);
        let block = Traversal::new(root, Document::is_block);
        let format = Traversal::new(root, Document::is_format);
        Self {
            content: Traversal::union_at(
                root,
                vec![text.clone(), linebreak.clone(), embed.clone()],
            ),
            inline: Traversal::new(root, is_inline_node),
            line_boundary: Traversal::union_at(root, vec![linebreak.clone(), block.clone()]),
            inline_boundary: Traversal::union_at(
                root,
                vec![text.clone(), linebreak.clone(), embed.clone(), block.clone()],
            ),
            text,
            linebreak,
            embed,
            block,
            format,
        }
    }

    /// Root shared by every traversal of the set.
    pub fn root(&self) -> NodeId {
        self.block.root()
    }
}
