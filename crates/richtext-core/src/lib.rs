#![warn(missing_docs)]
//! Richtext Core - Caret Navigation and Range Normalization for Rich-Text Trees
//!
//! # Overview
//!
//! `richtext-core` is a headless rich-text editing kernel. It works on a tree of
//! blocks, format wrappers, text runs, line breaks and embeds, and answers the
//! questions an editor surface asks on every keystroke: where does the caret go next,
//! which positions are visually the same, and how must a selection be reshaped before
//! an edit touches the tree. Rendering is left to the host; vertical motion consults a
//! [`CaretGeometry`] provider, and [`MonospaceLayout`] is a grid implementation of it.
//!
//! # Core Features
//!
//! - **Caret Walking**: previous/next caret stops, upper/lower line motion, caret
//!   equivalence and distance
//! - **Range Algebra**: alignment, containment, intersection, widening and structural
//!   splitting of ranges
//! - **Range Regulation**: canonical inline-boundary sides, inner/outer content ranges,
//!   format and block ranges
//! - **Live Boundaries**: every mutation can keep caller boundaries up to date
//! - **Editing**: typing, line and paragraph breaks and backspace on top of the above
//!
//! # Architecture Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │  Selection Control & Insertion Editing      │  ← Public API
//! ├─────────────────────────────────────────────┤
//! │  Caret Walker        │  Range Regulator     │  ← Navigation / Normalization
//! ├─────────────────────────────────────────────┤
//! │  Range Algebra       │  Caret Geometry      │  ← Range Math / Layout
//! ├─────────────────────────────────────────────┤
//! │  Filtered Traversals (tree walkers)         │  ← Node Classification
//! ├─────────────────────────────────────────────┤
//! │  Ranges & Boundary Points                   │  ← Positions
//! ├─────────────────────────────────────────────┤
//! │  Document Arena (slotmap + ropey)           │  ← Tree Storage
//! └─────────────────────────────────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ```rust
//! use richtext_core::{Boundary, CaretWalker, Document, Range};
//!
//! let mut doc = Document::new();
//! let p = doc.append_block(doc.root(), "p");
//! let ab = doc.append_text(p, "ab");
//! doc.append_linebreak(p);
//! let cd = doc.append_text(p, "cd");
//!
//! let walker = CaretWalker::for_document(&doc);
//! let caret = Range::collapsed(Boundary::new(ab, 2));
//! let next = walker.next_caret(&doc, &caret).unwrap();
//! assert_eq!(next.start(), Boundary::new(cd, 0));
//! ```
//!
//! ## Editing
//!
//! ```rust
//! use richtext_core::{Boundary, Document, EditOperation, InsertionEditor, Range};
//!
//! let mut doc = Document::new();
//! let p = doc.append_block(doc.root(), "p");
//! let text = doc.append_text(p, "held");
//!
//! let editor = InsertionEditor::for_document(&doc);
//! let mut caret = Range::collapsed(Boundary::new(text, 3));
//! editor
//!     .apply(&mut doc, &mut caret, EditOperation::InsertText("l".into()))
//!     .unwrap();
//! editor
//!     .apply(&mut doc, &mut caret, EditOperation::BreakParagraph)
//!     .unwrap();
//! assert_eq!(doc.debug_markup(doc.root()), "<body><p>hell</p><p>d</p></body>");
//! ```
//!
//! # Module Description
//!
//! - [`document`] - node arena, classification and tracked mutations
//! - [`range`] - boundary points and range values
//! - [`traversal`] - filtered pre-order walkers and the standard traversal set
//! - [`algebra`] - free functions over ranges
//! - [`geometry`] - caret geometry trait and monospace grid layout
//! - [`caret`] - caret walker
//! - [`regulator`] - range regulator
//! - [`selection`] - arrow-key motion and range snapshots
//! - [`editing`] - insertion editor
//!
//! # Unicode Support
//!
//! - Text offsets count Unicode scalar values (chars)
//! - Grid layout follows `unicode-width`, so CJK characters take two cells

pub mod algebra;
pub mod caret;
pub mod document;
pub mod editing;
pub mod geometry;
pub mod range;
pub mod regulator;
pub mod selection;
pub mod traversal;

pub use algebra::{
    ExtendMode, align_to, caret_position, contains, contains_caret, end_of_range, extend_end,
    extend_end_to_adjacent_container, extend_end_to_container, extend_start,
    extend_start_to_adjacent_container, extend_start_to_container, intersect, is_equal_range,
    split_range, start_of_range,
};
pub use caret::CaretWalker;
pub use document::{Boundary, Display, Document, NodeId, NodeKind, SplitMode};
pub use editing::{EditError, EditOperation, InsertionEditor, delete_contents, insert_node};
pub use geometry::{
    CaretCell, CaretGeometry, DEFAULT_TAB_WIDTH, LayoutOptions, MonospaceLayout, cell_width_at,
    char_width,
};
pub use range::{Corner, Range, RangeError, Side, after, before, check_boundary};
pub use regulator::{InlineSide, RangeRegulator};
pub use selection::{Motion, RangeSnapshot, SelectionController};
pub use traversal::{
    InnermostNodesWithin, NodeClassifier, NodePredicate, NodesWithin, Traversal, TraversalError,
    TraversalSet, Visit,
};
