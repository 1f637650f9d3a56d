//! Caret geometry (headless layout).
//!
//! The caret walker only needs one geometric fact: the horizontal position of a caret.
//! [`CaretGeometry`] is that query. [`MonospaceLayout`] answers it by laying the
//! document out on a grid of character cells: blocks start on a fresh row, line breaks
//! end the current row, text soft-wraps per character and inline embeds take a fixed
//! number of cells. Character widths follow UAX #11 and tabs advance to the next stop.

use std::cell::RefCell;

use slotmap::SecondaryMap;
use unicode_width::UnicodeWidthChar;

use crate::document::{Boundary, Display, Document, NodeId, NodeKind};
use crate::range::Range;

/// Default tab width (in cells) used when a caller does not specify a tab width.
pub const DEFAULT_TAB_WIDTH: usize = 4;

/// Source of horizontal caret positions.
pub trait CaretGeometry {
    /// Horizontal position of a collapsed range; larger is further right.
    fn caret_position(&self, doc: &Document, caret: &Range) -> f64;
}

/// Number of grid cells a character pushes the caret to the right.
///
/// East Asian wide characters take two cells and combining marks none, so a caret after
/// them lines up with the column a monospace renderer would draw. Control characters
/// without a defined width count as one cell.
pub fn char_width(ch: char) -> usize {
    UnicodeWidthChar::width(ch).unwrap_or(1)
}

/// Cells a character occupies when its caret stop sits `x` cells into the row.
///
/// Only a tab depends on where it starts: it reaches the next tab stop.
pub fn cell_width_at(ch: char, x: usize, tab_width: usize) -> usize {
    if ch == '\t' {
        let tab_width = tab_width.max(1);
        tab_width - x % tab_width
    } else {
        char_width(ch)
    }
}

/// Layout settings for [`MonospaceLayout`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutOptions {
    /// Row width in cells; content wraps when it would overflow.
    pub viewport_width: usize,
    /// Tab stop distance in cells.
    pub tab_width: usize,
    /// Width of an embedded object in cells.
    pub embed_width: usize,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            viewport_width: 80,
            tab_width: DEFAULT_TAB_WIDTH,
            embed_width: 2,
        }
    }
}

impl LayoutOptions {
    /// Set the viewport width.
    pub fn with_viewport_width(mut self, viewport_width: usize) -> Self {
        self.viewport_width = viewport_width;
        self
    }

    /// Set the tab width.
    pub fn with_tab_width(mut self, tab_width: usize) -> Self {
        self.tab_width = tab_width;
        self
    }

    /// Set the embed width.
    pub fn with_embed_width(mut self, embed_width: usize) -> Self {
        self.embed_width = embed_width;
        self
    }
}

/// A caret's place on the grid: visual row and cell offset within the row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CaretCell {
    /// Visual row (0-based, counted over the whole document).
    pub row: usize,
    /// Cell offset from the left edge of the row.
    pub x: usize,
}

impl CaretCell {
    /// Cell at `row`, `x`.
    pub fn new(row: usize, x: usize) -> Self {
        Self { row, x }
    }
}

#[derive(Debug, Clone, Copy)]
struct Extent {
    start: CaretCell,
    end: CaretCell,
}

#[derive(Debug, Default)]
struct Cursor {
    row: usize,
    x: usize,
    /// Something occupies the current row.
    dirty: bool,
}

impl Cursor {
    fn cell(&self) -> CaretCell {
        CaretCell::new(self.row, self.x)
    }

    fn new_row(&mut self) {
        self.row += 1;
        self.x = 0;
        self.dirty = false;
    }

    fn close_row(&mut self) {
        if self.dirty {
            self.new_row();
        }
    }

    /// Reserve `width` cells, wrapping first if they don't fit; returns the start cell.
    fn place(&mut self, width: usize, viewport_width: usize) -> CaretCell {
        if self.x > 0 && self.x + width > viewport_width {
            self.new_row();
        }
        let cell = self.cell();
        self.x += width;
        self.dirty = true;
        cell
    }
}

#[derive(Debug)]
struct LayoutMap {
    revision: u64,
    rows: usize,
    extents: SecondaryMap<NodeId, Extent>,
    text_stops: SecondaryMap<NodeId, Vec<CaretCell>>,
}

impl LayoutMap {
    fn build(doc: &Document, options: &LayoutOptions) -> Self {
        let mut map = Self {
            revision: doc.revision(),
            rows: 0,
            extents: SecondaryMap::new(),
            text_stops: SecondaryMap::new(),
        };
        let mut cursor = Cursor::default();
        map.layout(doc, doc.root(), &mut cursor, options);
        map.rows = cursor.row + usize::from(cursor.dirty);
        tracing::trace!(revision = map.revision, rows = map.rows, "layout rebuilt");
        map
    }

    fn layout(&mut self, doc: &Document, node: NodeId, cursor: &mut Cursor, options: &LayoutOptions) {
        let width = options.viewport_width.max(1);
        let extent = match doc.kind(node) {
            NodeKind::Text(rope) => {
                let mut stops = Vec::with_capacity(rope.len_chars() + 1);
                for ch in rope.chars() {
                    let w = cell_width_at(ch, cursor.x, options.tab_width);
                    stops.push(cursor.place(w, width));
                }
                stops.push(cursor.cell());
                let extent = Extent {
                    start: stops[0],
                    end: cursor.cell(),
                };
                self.text_stops.insert(node, stops);
                extent
            }
            NodeKind::Linebreak => {
                let start = cursor.cell();
                cursor.new_row();
                Extent {
                    start,
                    end: cursor.cell(),
                }
            }
            NodeKind::Embedded {
                display: Display::Inline,
                ..
            } => {
                let start = cursor.place(options.embed_width, width);
                Extent {
                    start,
                    end: cursor.cell(),
                }
            }
            NodeKind::Embedded {
                display: Display::Block,
                ..
            } => {
                cursor.close_row();
                let start = cursor.place(options.embed_width, width);
                let end = cursor.cell();
                cursor.close_row();
                Extent { start, end }
            }
            NodeKind::Block { .. } => {
                cursor.close_row();
                let extent = self.layout_children(doc, node, cursor, options);
                cursor.close_row();
                extent
            }
            NodeKind::Format { .. } => self.layout_children(doc, node, cursor, options),
        };
        self.extents.insert(node, extent);
    }

    fn layout_children(
        &mut self,
        doc: &Document,
        node: NodeId,
        cursor: &mut Cursor,
        options: &LayoutOptions,
    ) -> Extent {
        let entry = cursor.cell();
        for &child in doc.children(node) {
            self.layout(doc, child, cursor, options);
        }
        let start = doc
            .first_child(node)
            .map_or(entry, |first| self.extents[first].start);
        Extent {
            start,
            end: cursor.cell(),
        }
    }

    /// Points in nodes the layout never reached (removed, or detached from the root)
    /// map to the origin cell.
    fn cell_at(&self, doc: &Document, point: Boundary) -> CaretCell {
        if !doc.exists(point.container) {
            return CaretCell::default();
        }
        if let Some(stops) = self.text_stops.get(point.container) {
            return stops[point.offset.min(stops.len() - 1)];
        }
        let cell = match doc.child(point.container, point.offset) {
            Some(child) => self.extents.get(child).map(|extent| extent.start),
            None => match doc.last_child(point.container) {
                Some(last) => self.extents.get(last).map(|extent| extent.end),
                None => self.extents.get(point.container).map(|extent| extent.start),
            },
        };
        cell.unwrap_or_default()
    }
}

/// Grid layout over a document, cached per document revision.
#[derive(Debug, Default)]
pub struct MonospaceLayout {
    options: LayoutOptions,
    cache: RefCell<Option<LayoutMap>>,
}

impl MonospaceLayout {
    /// Create a layout with the given options.
    pub fn new(options: LayoutOptions) -> Self {
        Self {
            options,
            cache: RefCell::new(None),
        }
    }

    /// Layout options in use.
    pub fn options(&self) -> LayoutOptions {
        self.options
    }

    /// Change the options; the next query lays the document out again.
    pub fn set_options(&mut self, options: LayoutOptions) {
        self.options = options;
        self.cache.get_mut().take();
    }

    fn with_map<R>(&self, doc: &Document, f: impl FnOnce(&LayoutMap) -> R) -> R {
        let mut cache = self.cache.borrow_mut();
        if cache
            .as_ref()
            .is_none_or(|map| map.revision != doc.revision())
        {
            *cache = Some(LayoutMap::build(doc, &self.options));
        }
        f(cache.as_ref().expect("checked"))
    }

    /// Grid cell of a boundary point.
    pub fn caret_cell(&self, doc: &Document, point: Boundary) -> CaretCell {
        self.with_map(doc, |map| map.cell_at(doc, point))
    }

    /// Number of visual rows the document occupies.
    pub fn row_count(&self, doc: &Document) -> usize {
        self.with_map(doc, |map| map.rows)
    }
}

impl CaretGeometry for MonospaceLayout {
    fn caret_position(&self, doc: &Document, caret: &Range) -> f64 {
        self.caret_cell(doc, caret.start()).x as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout(width: usize) -> MonospaceLayout {
        MonospaceLayout::new(LayoutOptions::default().with_viewport_width(width))
    }

    #[test]
    fn test_char_widths() {
        assert_eq!(char_width('a'), 1);
        assert_eq!(char_width('中'), 2);
        assert_eq!(char_width('\u{0301}'), 0);
        assert_eq!(cell_width_at('\t', 0, 4), 4);
        assert_eq!(cell_width_at('\t', 3, 4), 1);
        assert_eq!(cell_width_at('\t', 2, 0), 1);
    }

    #[test]
    fn test_text_wraps_per_character() {
        let mut doc = Document::new();
        let p = doc.append_block(doc.root(), "p");
        let t = doc.append_text(p, "abcdefg");
        let grid = layout(5);

        assert_eq!(grid.caret_cell(&doc, Boundary::new(t, 4)), CaretCell::new(0, 4));
        assert_eq!(grid.caret_cell(&doc, Boundary::new(t, 5)), CaretCell::new(1, 0));
        assert_eq!(grid.caret_cell(&doc, Boundary::new(t, 7)), CaretCell::new(1, 2));
        assert_eq!(grid.row_count(&doc), 2);
    }

    #[test]
    fn test_wide_chars_wrap_intact() {
        let mut doc = Document::new();
        let p = doc.append_block(doc.root(), "p");
        let t = doc.append_text(p, "ab中");
        let grid = layout(3);
        assert_eq!(grid.caret_cell(&doc, Boundary::new(t, 2)), CaretCell::new(1, 0));
        assert_eq!(grid.caret_cell(&doc, Boundary::new(t, 3)), CaretCell::new(1, 2));
    }

    #[test]
    fn test_linebreaks_and_blocks() {
        let mut doc = Document::new();
        let root = doc.root();
        let p1 = doc.append_block(root, "p");
        let ab = doc.append_text(p1, "ab");
        doc.append_linebreak(p1);
        let cd = doc.append_text(p1, "cd");
        let p2 = doc.append_block(root, "p");
        doc.append_linebreak(p2);
        let p3 = doc.append_block(root, "p");
        let ef = doc.append_text(p3, "ef");
        let grid = layout(80);

        assert_eq!(grid.caret_cell(&doc, Boundary::new(p1, 1)), CaretCell::new(0, 2));
        assert_eq!(grid.caret_cell(&doc, Boundary::new(ab, 2)), CaretCell::new(0, 2));
        assert_eq!(grid.caret_cell(&doc, Boundary::new(p1, 2)), CaretCell::new(1, 0));
        assert_eq!(grid.caret_cell(&doc, Boundary::new(cd, 2)), CaretCell::new(1, 2));
        assert_eq!(grid.caret_cell(&doc, Boundary::new(p2, 0)), CaretCell::new(2, 0));
        assert_eq!(grid.caret_cell(&doc, Boundary::new(ef, 1)), CaretCell::new(3, 1));
        assert_eq!(grid.caret_cell(&doc, Boundary::new(root, 3)), CaretCell::new(3, 2));
        assert_eq!(grid.row_count(&doc), 4);
    }

    #[test]
    fn test_embeds() {
        let mut doc = Document::new();
        let root = doc.root();
        let p = doc.append_block(root, "p");
        doc.append_text(p, "a");
        doc.append_embedded(p, "img", Display::Inline);
        let b = doc.append_text(p, "b");
        doc.append_embedded(root, "figure", Display::Block);
        let grid = MonospaceLayout::new(LayoutOptions::default().with_embed_width(3));

        assert_eq!(grid.caret_cell(&doc, Boundary::new(p, 1)), CaretCell::new(0, 1));
        assert_eq!(grid.caret_cell(&doc, Boundary::new(p, 2)), CaretCell::new(0, 4));
        assert_eq!(grid.caret_cell(&doc, Boundary::new(b, 1)), CaretCell::new(0, 5));
        assert_eq!(grid.caret_cell(&doc, Boundary::new(root, 1)), CaretCell::new(1, 0));
        assert_eq!(grid.caret_cell(&doc, Boundary::new(root, 2)), CaretCell::new(1, 3));
    }

    #[test]
    fn test_cache_follows_revision() {
        let mut doc = Document::new();
        let p = doc.append_block(doc.root(), "p");
        let t = doc.append_text(p, "abc");
        let grid = layout(80);
        let caret = Range::collapsed(Boundary::new(p, 1));
        assert_eq!(grid.caret_position(&doc, &caret), 3.0);

        doc.insert_text(t, 0, "xy", &mut []);
        assert_eq!(grid.caret_position(&doc, &caret), 5.0);
    }

    #[test]
    fn test_empty_containers_use_entry_cell() {
        let mut doc = Document::new();
        let root = doc.root();
        let p1 = doc.append_block(root, "p");
        doc.append_text(p1, "abc");
        let p2 = doc.append_block(root, "p");
        let grid = layout(80);
        assert_eq!(grid.caret_cell(&doc, Boundary::new(p2, 0)), CaretCell::new(1, 0));
    }

    #[test]
    fn test_unreached_nodes_map_to_origin() {
        let mut doc = Document::new();
        let root = doc.root();
        let p = doc.append_block(root, "p");
        doc.append_text(p, "abc");
        let loose = doc.create_block("p");
        let loose_text = doc.append_text(loose, "xy");
        let gone = doc.append_text(p, "de");
        doc.remove(gone);
        let grid = layout(80);

        assert_eq!(grid.caret_cell(&doc, Boundary::new(loose, 1)), CaretCell::default());
        assert_eq!(grid.caret_cell(&doc, Boundary::new(loose_text, 1)), CaretCell::default());
        assert_eq!(grid.caret_cell(&doc, Boundary::new(gone, 1)), CaretCell::default());
        assert_eq!(grid.caret_cell(&doc, Boundary::new(p, 1)), CaretCell::new(0, 3));
    }
}
