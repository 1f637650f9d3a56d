use pretty_assertions::assert_eq;
use richtext_core::{
    Boundary, Document, ExtendMode, NodeId, Range, TraversalSet, contains, extend_end,
    extend_start, intersect, is_equal_range, split_range,
};

fn range(doc: &Document, start: (NodeId, usize), end: (NodeId, usize)) -> Range {
    Range::new(
        doc,
        Boundary::new(start.0, start.1),
        Boundary::new(end.0, end.1),
    )
    .expect("valid range")
}

#[test]
fn test_intersect_touching_and_disjoint() {
    let mut doc = Document::new();
    let p = doc.append_block(doc.root(), "p");
    let t = doc.append_text(p, "abcd");

    let left = range(&doc, (t, 0), (t, 2));
    let right = range(&doc, (t, 2), (t, 4));
    assert_eq!(
        intersect(&doc, &left, &right),
        Some(Range::collapsed(Boundary::new(t, 2)))
    );

    let far_left = range(&doc, (t, 0), (t, 1));
    let far_right = range(&doc, (t, 3), (t, 4));
    assert_eq!(intersect(&doc, &far_left, &far_right), None);

    let whole = range(&doc, (t, 0), (t, 4));
    let overlap = intersect(&doc, &whole, &right).expect("overlap");
    assert!(is_equal_range(&doc, &overlap, &right));
    assert!(contains(&doc, &whole, &overlap));
}

#[test]
fn test_extend_to_line_is_idempotent() {
    let mut doc = Document::new();
    let p = doc.append_block(doc.root(), "p");
    doc.append_text(p, "ab");
    doc.append_linebreak(p);
    let cd = doc.append_text(p, "cd");
    let traversals = TraversalSet::new(doc.root());

    let mut line = Range::collapsed(Boundary::new(cd, 1));
    extend_start(&doc, &mut line, &traversals.line_boundary, ExtendMode::Inner);
    extend_end(&doc, &mut line, &traversals.line_boundary, ExtendMode::Inner);
    assert_eq!(line.start(), Boundary::new(p, 2));
    assert_eq!(line.end(), Boundary::new(p, 3));

    let once = line;
    extend_start(&doc, &mut line, &traversals.line_boundary, ExtendMode::Inner);
    extend_end(&doc, &mut line, &traversals.line_boundary, ExtendMode::Inner);
    assert_eq!(line, once);
}

#[test]
fn test_split_range_outside_source_is_identity() {
    let mut doc = Document::new();
    let p = doc.append_block(doc.root(), "p");
    let t = doc.append_text(p, "abcd");
    let before = doc.debug_markup(doc.root());

    let source = range(&doc, (t, 0), (t, 2));
    let mut separator = range(&doc, (t, 3), (t, 4));
    let parts = split_range(&mut doc, &source, &mut separator);
    assert_eq!(parts, vec![source]);
    assert_eq!(doc.debug_markup(doc.root()), before);
}

#[test]
fn test_split_range_partitions_formatting() {
    let mut doc = Document::new();
    let p = doc.append_block(doc.root(), "p");
    let b = doc.append_format(p, "b");
    let t = doc.append_text(b, "abcd");

    let source = range(&doc, (p, 0), (p, 1));
    let mut separator = range(&doc, (t, 1), (t, 3));
    let parts = split_range(&mut doc, &source, &mut separator);

    assert_eq!(doc.debug_markup(p), "<p><b>a</b><b>bc</b><b>d</b></p>");
    assert_eq!(parts, vec![range(&doc, (p, 0), (p, 1)), range(&doc, (p, 2), (p, 3))]);
    assert_eq!(separator, range(&doc, (p, 1), (p, 2)));
}

#[test]
fn test_outer_extension_stops_at_accepted_root() {
    let mut doc = Document::new();
    let root = doc.root();
    let p = doc.append_block(root, "p");
    let ab = doc.append_text(p, "ab");
    let traversals = TraversalSet::new(root);
    assert!(traversals.block.accepts(&doc, root));

    let mut widened = Range::collapsed(Boundary::new(ab, 1));
    extend_start(&doc, &mut widened, &traversals.block, ExtendMode::Outer);
    extend_end(&doc, &mut widened, &traversals.block, ExtendMode::Outer);
    assert_eq!(widened, range(&doc, (root, 0), (root, 1)));

    let once = widened;
    extend_start(&doc, &mut widened, &traversals.block, ExtendMode::Outer);
    extend_end(&doc, &mut widened, &traversals.block, ExtendMode::Outer);
    assert_eq!(widened, once);
}

#[test]
fn test_decided_extension_over_root_level_text() {
    let mut doc = Document::new();
    let root = doc.root();
    let t = doc.append_text(root, "abc");
    let traversals = TraversalSet::new(root);
    let mode = ExtendMode::Decide(|_, _, contained| contained);

    let mut widened = Range::collapsed(Boundary::new(t, 1));
    extend_start(&doc, &mut widened, &traversals.block, mode);
    extend_end(&doc, &mut widened, &traversals.block, mode);
    assert_eq!(widened, range(&doc, (root, 0), (root, 1)));
}
