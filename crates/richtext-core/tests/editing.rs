use pretty_assertions::assert_eq;
use richtext_core::{Boundary, Document, EditOperation, InsertionEditor, NodeId, Range};

fn paragraph(text: &str) -> (Document, NodeId, NodeId) {
    let mut doc = Document::new();
    let p = doc.append_block(doc.root(), "p");
    let t = doc.append_text(p, text);
    (doc, p, t)
}

fn type_text(editor: &InsertionEditor, doc: &mut Document, caret: &mut Range, text: &str) {
    for ch in text.chars() {
        editor
            .apply(doc, caret, EditOperation::InsertText(ch.to_string()))
            .expect("typing succeeds");
    }
}

#[test]
fn test_typing_at_end_of_run() {
    let (mut doc, p, t) = paragraph("x");
    let editor = InsertionEditor::for_document(&doc);
    let mut caret = Range::collapsed(Boundary::new(t, 1));

    type_text(&editor, &mut doc, &mut caret, "abc");
    assert_eq!(doc.debug_markup(p), "<p>xabc</p>");
    assert_eq!(doc.len(p), 1);
    assert_eq!(caret, Range::collapsed(Boundary::new(p, 1)));
}

#[test]
fn test_break_then_backspace_restores_paragraph() {
    let (mut doc, _, t) = paragraph("abcd");
    let root = doc.root();
    let editor = InsertionEditor::for_document(&doc);
    let mut caret = Range::collapsed(Boundary::new(t, 2));

    editor
        .apply(&mut doc, &mut caret, EditOperation::BreakParagraph)
        .expect("break");
    assert_eq!(doc.debug_markup(root), "<body><p>ab</p><p>cd</p></body>");

    editor
        .apply(&mut doc, &mut caret, EditOperation::Backspace)
        .expect("backspace");
    assert_eq!(doc.debug_markup(root), "<body><p>abcd</p></body>");
    assert_eq!(caret, Range::collapsed(Boundary::new(t, 2)));
}

#[test]
fn test_typing_over_selection_across_paragraphs() {
    let mut doc = Document::new();
    let root = doc.root();
    let p1 = doc.append_block(root, "p");
    let abc = doc.append_text(p1, "abc");
    let p2 = doc.append_block(root, "p");
    let def = doc.append_text(p2, "def");
    let editor = InsertionEditor::for_document(&doc);

    let mut range = Range::new(&doc, Boundary::new(abc, 1), Boundary::new(def, 2)).expect("range");
    editor
        .apply(&mut doc, &mut range, EditOperation::InsertText("X".into()))
        .expect("replace");
    assert_eq!(doc.debug_markup(root), "<body><p>aXf</p></body>");
    assert_eq!(range, Range::collapsed(Boundary::new(abc, 2)));
}

#[test]
fn test_typing_on_a_new_line() {
    let (mut doc, p, t) = paragraph("ab");
    let editor = InsertionEditor::for_document(&doc);
    let mut caret = Range::collapsed(Boundary::new(t, 2));

    editor
        .apply(&mut doc, &mut caret, EditOperation::BreakLine)
        .expect("break line");
    assert_eq!(doc.debug_markup(p), "<p>ab<br/><br/></p>");

    type_text(&editor, &mut doc, &mut caret, "c");
    assert_eq!(doc.debug_markup(p), "<p>ab<br/>c<br/></p>");
    assert_eq!(caret, Range::collapsed(Boundary::new(p, 3)));
}
