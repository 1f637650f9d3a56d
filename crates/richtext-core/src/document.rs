//! Host Document Model
//!
//! An arena-backed tree of rich-text nodes. Every node lives in a [`SlotMap`] and is
//! addressed by a [`NodeId`]; parent/child links are plain keys, so the tree can be
//! cloned cheaply for snapshots and stale ids are detected instead of aliasing.
//!
//! Ranges over the tree are plain values (see [`crate::range`]). Mutations that would
//! move a live DOM range instead take a `tracked: &mut [Boundary]` slice and remap the
//! boundaries they are given, so callers can keep a handful of points valid across
//! structural edits.

use std::cmp::Ordering;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

use ropey::Rope;
use slotmap::SlotMap;

slotmap::new_key_type! {
    /// Key of a node in a [`Document`].
    pub struct NodeId;
}

static NEXT_REVISION: AtomicU64 = AtomicU64::new(1);

fn next_revision() -> u64 {
    NEXT_REVISION.fetch_add(1, AtomicOrdering::Relaxed)
}

/// How an embedded atomic node is laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Display {
    /// Flows with the surrounding text.
    #[default]
    Inline,
    /// Occupies its own line, like a block.
    Block,
}

/// Node kind (tagged payload).
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// Block container (paragraph, heading, list item, body, ...).
    Block {
        /// Element tag, e.g. `"p"`.
        tag: String,
    },
    /// Inline formatting wrapper (`b`, `i`, `span`, ...).
    Format {
        /// Element tag, e.g. `"b"`.
        tag: String,
    },
    /// Text run; offsets count `char`s.
    Text(Rope),
    /// Hard line break.
    Linebreak,
    /// Indivisible embedded object (image, widget, ...).
    Embedded {
        /// Element tag, e.g. `"img"`.
        tag: String,
        /// Inline or block layout.
        display: Display,
    },
}

/// Whether [`Document::split_up_to`] may leave an empty half behind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SplitMode {
    /// A point at the very start or end of a node moves before/after it instead of splitting.
    #[default]
    Partial,
    /// Every level is split, even when one half ends up empty.
    Always,
}

/// Boundary point: a container node plus an offset.
///
/// For text containers the offset addresses a character gap (`0..=len`); for element
/// containers it addresses a gap between children (`0..=child_count`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Boundary {
    /// Container node.
    pub container: NodeId,
    /// Offset inside the container.
    pub offset: usize,
}

impl Boundary {
    /// Create a boundary point.
    pub fn new(container: NodeId, offset: usize) -> Self {
        Self { container, offset }
    }
}

#[derive(Debug, Clone)]
struct NodeData {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl NodeData {
    fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            parent: None,
            children: Vec::new(),
        }
    }
}

/// The document tree.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: SlotMap<NodeId, NodeData>,
    root: NodeId,
    revision: u64,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create an empty document whose root is a `body` block.
    pub fn new() -> Self {
        Self::with_root_tag("body")
    }

    /// Create an empty document whose root block uses `tag`.
    pub fn with_root_tag(tag: &str) -> Self {
        let mut nodes = SlotMap::with_key();
        let root = nodes.insert(NodeData::new(NodeKind::Block {
            tag: tag.to_string(),
        }));
        Self {
            nodes,
            root,
            revision: next_revision(),
        }
    }

    /// Root block of the document.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Revision stamp; unique across all documents and changed by every mutation.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    fn touch(&mut self) {
        self.revision = next_revision();
    }

    fn data(&self, id: NodeId) -> &NodeData {
        match self.nodes.get(id) {
            Some(data) => data,
            None => panic!("stale node id {id:?}"),
        }
    }

    fn data_mut(&mut self, id: NodeId) -> &mut NodeData {
        match self.nodes.get_mut(id) {
            Some(data) => data,
            None => panic!("stale node id {id:?}"),
        }
    }

    /// Whether `id` still names a live node.
    pub fn exists(&self, id: NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Number of live nodes (attached or not).
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    // ---- structural queries ----

    /// Kind of a node.
    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.data(id).kind
    }

    /// Parent of a node (`None` for the root and detached nodes).
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.data(id).parent
    }

    /// Children of a node in order.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.data(id).children
    }

    /// Child at `index`.
    pub fn child(&self, id: NodeId, index: usize) -> Option<NodeId> {
        self.data(id).children.get(index).copied()
    }

    /// First child.
    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.data(id).children.first().copied()
    }

    /// Last child.
    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.data(id).children.last().copied()
    }

    /// Index of a node among its siblings (0 for parentless nodes).
    pub fn index(&self, id: NodeId) -> usize {
        match self.parent(id) {
            Some(parent) => self
                .children(parent)
                .iter()
                .position(|&child| child == id)
                .unwrap_or(0),
            None => 0,
        }
    }

    /// Previous sibling.
    pub fn previous_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let index = self.index(id);
        if index == 0 {
            None
        } else {
            self.child(parent, index - 1)
        }
    }

    /// Next sibling.
    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        self.child(parent, self.index(id) + 1)
    }

    /// Node length: character count for text, child count otherwise.
    pub fn len(&self, id: NodeId) -> usize {
        match &self.data(id).kind {
            NodeKind::Text(rope) => rope.len_chars(),
            _ => self.data(id).children.len(),
        }
    }

    /// Text payload of a text node.
    pub fn text(&self, id: NodeId) -> Option<&Rope> {
        match &self.data(id).kind {
            NodeKind::Text(rope) => Some(rope),
            _ => None,
        }
    }

    /// Concatenated text of a subtree.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        out
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        match &self.data(id).kind {
            NodeKind::Text(rope) => out.extend(rope.chunks()),
            _ => {
                for &child in self.children(id) {
                    self.collect_text(child, out);
                }
            }
        }
    }

    // ---- classification ----

    /// Text node (possibly empty).
    pub fn is_text(&self, id: NodeId) -> bool {
        matches!(self.kind(id), NodeKind::Text(_))
    }

    /// Anything that is not a text node.
    pub fn is_element(&self, id: NodeId) -> bool {
        !self.is_text(id)
    }

    /// Text node with at least one character.
    pub fn is_non_empty_text(&self, id: NodeId) -> bool {
        matches!(self.kind(id), NodeKind::Text(rope) if rope.len_chars() > 0)
    }

    /// Hard line break.
    pub fn is_linebreak(&self, id: NodeId) -> bool {
        matches!(self.kind(id), NodeKind::Linebreak)
    }

    /// Block container, or an embed laid out as a block.
    pub fn is_block(&self, id: NodeId) -> bool {
        matches!(
            self.kind(id),
            NodeKind::Block { .. }
                | NodeKind::Embedded {
                    display: Display::Block,
                    ..
                }
        )
    }

    /// Embed laid out inline.
    pub fn is_inline_embedded(&self, id: NodeId) -> bool {
        matches!(
            self.kind(id),
            NodeKind::Embedded {
                display: Display::Inline,
                ..
            }
        )
    }

    /// Inline formatting wrapper.
    pub fn is_format(&self, id: NodeId) -> bool {
        matches!(self.kind(id), NodeKind::Format { .. })
    }

    /// Caret-addressable content: non-empty text, line breaks and inline embeds.
    pub fn is_content(&self, id: NodeId) -> bool {
        self.is_non_empty_text(id) || self.is_linebreak(id) || self.is_inline_embedded(id)
    }

    // ---- tree relations ----

    /// Inclusive ancestors of a node, nearest first.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(Some(id), move |&node| self.parent(node))
    }

    /// Inclusive containment: `ancestor == node` or `ancestor` is above `node`.
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        self.ancestors(node).any(|n| n == ancestor)
    }

    /// Whether a node is live and reachable from the root.
    pub fn is_attached(&self, id: NodeId) -> bool {
        self.exists(id) && self.contains(self.root, id)
    }

    /// Nearest inclusive ancestor shared by `a` and `b`.
    pub fn common_ancestor(&self, a: NodeId, b: NodeId) -> Option<NodeId> {
        let chain: Vec<NodeId> = self.ancestors(a).collect();
        self.ancestors(b).find(|node| chain.contains(node))
    }

    /// Nearest inclusive ancestor matching `predicate`, stopping at (and falling back to) the root.
    pub fn closest(&self, id: NodeId, predicate: impl Fn(&Document, NodeId) -> bool) -> NodeId {
        let mut last = id;
        for node in self.ancestors(id) {
            if node == self.root || predicate(self, node) {
                return node;
            }
            last = node;
        }
        last
    }

    /// Child of `ancestor` on the path down to `node`.
    pub fn child_toward(&self, ancestor: NodeId, node: NodeId) -> Option<NodeId> {
        self.ancestors(node)
            .find(|&n| self.parent(n) == Some(ancestor))
    }

    fn path_from_root(&self, id: NodeId) -> Vec<NodeId> {
        let mut path: Vec<NodeId> = self.ancestors(id).collect();
        path.reverse();
        path
    }

    /// Tree order of two nodes of the same tree (ancestors come first).
    pub fn compare_nodes(&self, a: NodeId, b: NodeId) -> Ordering {
        if a == b {
            return Ordering::Equal;
        }
        let path_a = self.path_from_root(a);
        let path_b = self.path_from_root(b);
        assert_eq!(path_a[0], path_b[0], "nodes belong to different trees");

        let shared = path_a
            .iter()
            .zip(&path_b)
            .take_while(|(x, y)| x == y)
            .count();
        match (path_a.get(shared), path_b.get(shared)) {
            (None, _) => Ordering::Less,
            (_, None) => Ordering::Greater,
            (Some(&x), Some(&y)) => self.index(x).cmp(&self.index(y)),
        }
    }

    /// Document order of two boundary points.
    pub fn compare_boundaries(&self, a: Boundary, b: Boundary) -> Ordering {
        if a.container == b.container {
            return a.offset.cmp(&b.offset);
        }
        if self.compare_nodes(a.container, b.container) == Ordering::Greater {
            return self.compare_boundaries(b, a).reverse();
        }
        if self.contains(a.container, b.container) {
            let child = self
                .child_toward(a.container, b.container)
                .expect("checked");
            if self.index(child) < a.offset {
                return Ordering::Greater;
            }
        }
        Ordering::Less
    }

    // ---- construction ----

    fn alloc(&mut self, kind: NodeKind) -> NodeId {
        self.nodes.insert(NodeData::new(kind))
    }

    /// Create a detached text node.
    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.alloc(NodeKind::Text(Rope::from_str(text)))
    }

    /// Create a detached block.
    pub fn create_block(&mut self, tag: &str) -> NodeId {
        self.alloc(NodeKind::Block {
            tag: tag.to_string(),
        })
    }

    /// Create a detached format wrapper.
    pub fn create_format(&mut self, tag: &str) -> NodeId {
        self.alloc(NodeKind::Format {
            tag: tag.to_string(),
        })
    }

    /// Create a detached line break.
    pub fn create_linebreak(&mut self) -> NodeId {
        self.alloc(NodeKind::Linebreak)
    }

    /// Create a detached embed.
    pub fn create_embedded(&mut self, tag: &str, display: Display) -> NodeId {
        self.alloc(NodeKind::Embedded {
            tag: tag.to_string(),
            display,
        })
    }

    /// Append a new text node to `parent`.
    pub fn append_text(&mut self, parent: NodeId, text: &str) -> NodeId {
        let node = self.create_text(text);
        self.append(parent, node);
        node
    }

    /// Append a new block to `parent`.
    pub fn append_block(&mut self, parent: NodeId, tag: &str) -> NodeId {
        let node = self.create_block(tag);
        self.append(parent, node);
        node
    }

    /// Append a new format wrapper to `parent`.
    pub fn append_format(&mut self, parent: NodeId, tag: &str) -> NodeId {
        let node = self.create_format(tag);
        self.append(parent, node);
        node
    }

    /// Append a new line break to `parent`.
    pub fn append_linebreak(&mut self, parent: NodeId) -> NodeId {
        let node = self.create_linebreak();
        self.append(parent, node);
        node
    }

    /// Append a new embed to `parent`.
    pub fn append_embedded(&mut self, parent: NodeId, tag: &str, display: Display) -> NodeId {
        let node = self.create_embedded(tag, display);
        self.append(parent, node);
        node
    }

    // ---- mutation ----

    /// Insert a detached node as child `index` of `parent`.
    pub fn insert(&mut self, parent: NodeId, index: usize, node: NodeId) {
        self.insert_tracked(parent, index, node, &mut []);
    }

    /// [`Document::insert`], shifting tracked boundaries after the insertion point.
    pub fn insert_tracked(
        &mut self,
        parent: NodeId,
        index: usize,
        node: NodeId,
        tracked: &mut [Boundary],
    ) {
        assert!(self.is_element(parent), "cannot insert into a text node");
        assert!(self.parent(node).is_none(), "node is already attached");
        assert!(
            !self.contains(node, parent),
            "cannot insert a node into its own subtree"
        );
        assert!(index <= self.len(parent), "child index out of bounds");

        self.data_mut(parent).children.insert(index, node);
        self.data_mut(node).parent = Some(parent);
        for point in tracked.iter_mut() {
            if point.container == parent && point.offset > index {
                point.offset += 1;
            }
        }
        self.touch();
    }

    /// Append a detached node as the last child of `parent`.
    pub fn append(&mut self, parent: NodeId, node: NodeId) {
        let index = self.len(parent);
        self.insert(parent, index, node);
    }

    /// Insert a detached node right before `reference`.
    pub fn insert_before(&mut self, reference: NodeId, node: NodeId) {
        let parent = self.parent(reference).expect("reference node has a parent");
        let index = self.index(reference);
        self.insert(parent, index, node);
    }

    /// Insert a detached node right after `reference`.
    pub fn insert_after(&mut self, reference: NodeId, node: NodeId) {
        let parent = self.parent(reference).expect("reference node has a parent");
        let index = self.index(reference) + 1;
        self.insert(parent, index, node);
    }

    /// Unlink a node (and its subtree) from its parent, keeping it alive.
    pub fn detach(&mut self, node: NodeId) {
        self.detach_tracked(node, &mut []);
    }

    /// [`Document::detach`], moving tracked boundaries inside the subtree to the gap it leaves.
    pub fn detach_tracked(&mut self, node: NodeId, tracked: &mut [Boundary]) {
        let Some(parent) = self.parent(node) else {
            return;
        };
        let index = self.index(node);
        for point in tracked.iter_mut() {
            if self.contains(node, point.container) {
                *point = Boundary::new(parent, index);
            } else if point.container == parent && point.offset > index {
                point.offset -= 1;
            }
        }
        self.data_mut(parent).children.remove(index);
        self.data_mut(node).parent = None;
        self.touch();
    }

    /// Detach a node and free its whole subtree.
    pub fn remove(&mut self, node: NodeId) {
        self.remove_tracked(node, &mut []);
    }

    /// [`Document::remove`] with boundary tracking.
    pub fn remove_tracked(&mut self, node: NodeId, tracked: &mut [Boundary]) {
        assert_ne!(node, self.root, "cannot remove the root");
        self.detach_tracked(node, tracked);
        let mut stack = vec![node];
        while let Some(id) = stack.pop() {
            if let Some(data) = self.nodes.remove(id) {
                stack.extend(data.children);
            }
        }
        self.touch();
    }

    /// Insert `text` into a text node at char offset `offset`.
    pub fn insert_text(&mut self, node: NodeId, offset: usize, text: &str, tracked: &mut [Boundary]) {
        let inserted = text.chars().count();
        match &mut self.data_mut(node).kind {
            NodeKind::Text(rope) => {
                assert!(offset <= rope.len_chars(), "text offset out of bounds");
                rope.insert(offset, text);
            }
            _ => panic!("insert_text on a non-text node"),
        }
        for point in tracked.iter_mut() {
            if point.container == node && point.offset > offset {
                point.offset += inserted;
            }
        }
        self.touch();
    }

    /// Delete the chars in `start..end` from a text node.
    pub fn delete_text(&mut self, node: NodeId, start: usize, end: usize, tracked: &mut [Boundary]) {
        match &mut self.data_mut(node).kind {
            NodeKind::Text(rope) => {
                assert!(start <= end && end <= rope.len_chars(), "text range out of bounds");
                rope.remove(start..end);
            }
            _ => panic!("delete_text on a non-text node"),
        }
        for point in tracked.iter_mut() {
            if point.container == node && point.offset > start {
                point.offset = if point.offset >= end {
                    point.offset - (end - start)
                } else {
                    start
                };
            }
        }
        self.touch();
    }

    /// Split a text node at `offset`.
    ///
    /// The node keeps the prefix; the returned sibling inserted right after it holds the
    /// suffix.
    pub fn split_text(&mut self, node: NodeId, offset: usize, tracked: &mut [Boundary]) -> NodeId {
        let parent = self.parent(node).expect("split text node has a parent");
        let index = self.index(node);
        let suffix = match &mut self.data_mut(node).kind {
            NodeKind::Text(rope) => {
                assert!(offset <= rope.len_chars(), "text offset out of bounds");
                rope.split_off(offset)
            }
            _ => panic!("split_text on a non-text node"),
        };
        let tail = self.alloc(NodeKind::Text(suffix));
        self.link_after(parent, index, node, tail, offset, tracked);
        tail
    }

    /// Split an element after its first `at` children; the clone gets the rest.
    fn split_element(&mut self, node: NodeId, at: usize, tracked: &mut [Boundary]) -> NodeId {
        let parent = self.parent(node).expect("split element has a parent");
        let index = self.index(node);
        let kind = self.kind(node).clone();
        let tail = self.alloc(kind);
        let moved = self.data_mut(node).children.split_off(at);
        for &child in &moved {
            self.data_mut(child).parent = Some(tail);
        }
        self.data_mut(tail).children = moved;
        self.link_after(parent, index, node, tail, at, tracked);
        tail
    }

    fn link_after(
        &mut self,
        parent: NodeId,
        index: usize,
        head: NodeId,
        tail: NodeId,
        at: usize,
        tracked: &mut [Boundary],
    ) {
        self.data_mut(parent).children.insert(index + 1, tail);
        self.data_mut(tail).parent = Some(parent);
        for point in tracked.iter_mut() {
            if point.container == head && point.offset > at {
                *point = Boundary::new(tail, point.offset - at);
            } else if point.container == parent && point.offset > index {
                point.offset += 1;
            }
        }
        self.touch();
    }

    /// Split every node between `point` and `ancestor` so that `point` becomes a gap
    /// between two children of `ancestor`; returns that gap.
    ///
    /// Tracked boundaries equal to `point` end up on the returned gap; the others follow
    /// the content they were in.
    pub fn split_up_to(
        &mut self,
        point: Boundary,
        ancestor: NodeId,
        mode: SplitMode,
        tracked: &mut [Boundary],
    ) -> Boundary {
        assert!(
            self.contains(ancestor, point.container),
            "split point is outside the ancestor"
        );
        let hits: Vec<bool> = tracked.iter().map(|b| *b == point).collect();
        let mut cut = point;
        while cut.container != ancestor {
            let node = cut.container;
            let parent = self.parent(node).expect("checked");
            let index = self.index(node);
            let len = self.len(node);
            cut = match mode {
                SplitMode::Partial if cut.offset == 0 => Boundary::new(parent, index),
                SplitMode::Partial if cut.offset >= len => Boundary::new(parent, index + 1),
                _ => {
                    if self.is_text(node) {
                        self.split_text(node, cut.offset, tracked);
                    } else {
                        self.split_element(node, cut.offset, tracked);
                    }
                    Boundary::new(parent, index + 1)
                }
            };
        }
        for (point, hit) in tracked.iter_mut().zip(hits) {
            if hit {
                *point = cut;
            }
        }
        cut
    }

    /// Merge adjacent text nodes and drop empty ones below `node`.
    pub fn normalize(&mut self, node: NodeId, tracked: &mut [Boundary]) {
        let mut texts = Vec::new();
        let mut stack = vec![node];
        while let Some(id) = stack.pop() {
            if self.is_text(id) {
                texts.push(id);
            } else {
                stack.extend(self.children(id).iter().rev());
            }
        }

        for text in texts {
            if !self.exists(text) || text == node {
                continue;
            }
            if self.len(text) == 0 {
                self.remove_tracked(text, tracked);
                continue;
            }
            let parent = self.parent(text).expect("descendant has a parent");
            while let Some(next) = self.next_sibling(text) {
                let Some(rope) = self.text(next).cloned() else {
                    break;
                };
                let head_len = self.len(text);
                let next_index = self.index(next);
                for point in tracked.iter_mut() {
                    if point.container == next {
                        *point = Boundary::new(text, head_len + point.offset);
                    } else if point.container == parent && point.offset == next_index {
                        *point = Boundary::new(text, head_len);
                    }
                }
                if let NodeKind::Text(head) = &mut self.data_mut(text).kind {
                    head.append(rope);
                }
                self.remove_tracked(next, tracked);
            }
        }
        self.touch();
    }

    /// Tag-like dump of a subtree, for diagnostics and tests.
    ///
    /// `<p>ab<br/><img/></p>`; block embeds render as `<tag display="block"/>`. Text is
    /// written verbatim. There is no parser.
    pub fn debug_markup(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_markup(id, &mut out);
        out
    }

    fn write_markup(&self, id: NodeId, out: &mut String) {
        match self.kind(id) {
            NodeKind::Text(rope) => out.extend(rope.chunks()),
            NodeKind::Linebreak => out.push_str("<br/>"),
            NodeKind::Embedded { tag, display } => {
                out.push('<');
                out.push_str(tag);
                if *display == Display::Block {
                    out.push_str(" display=\"block\"");
                }
                out.push_str("/>");
            }
            NodeKind::Block { tag } | NodeKind::Format { tag } => {
                out.push('<');
                out.push_str(tag);
                out.push('>');
                for &child in self.children(id) {
                    self.write_markup(child, out);
                }
                out.push_str("</");
                out.push_str(tag);
                out.push('>');
            }
        }
    }
}
