use richtext_core::{
    Boundary, Document, EditOperation, InsertionEditor, MonospaceLayout, Motion, Range,
    RangeSnapshot, SelectionController,
};
use tracing_subscriber::EnvFilter;

fn main() {
    // RUST_LOG=richtext_core=debug shows every adjustment the editor makes.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut doc = Document::new();
    let root = doc.root();
    let p = doc.append_block(root, "p");
    let hello = doc.append_text(p, "hello ");
    let bold = doc.append_format(p, "b");
    doc.append_text(bold, "world");

    let editor = InsertionEditor::for_document(&doc);
    let selection = SelectionController::for_document(&doc);
    let layout = MonospaceLayout::default();

    // Walk to the end of the first run and split the paragraph there.
    let mut caret = Range::collapsed(Boundary::new(hello, 0));
    for _ in 0..5 {
        selection.apply(&doc, &layout, &mut caret, Motion::Right, false);
    }
    editor
        .apply(&mut doc, &mut caret, EditOperation::BreakParagraph)
        .unwrap();
    assert_eq!(
        doc.debug_markup(root),
        "<body><p>hello</p><p> <b>world</b></p></body>"
    );

    // Back up into the first paragraph, remember the spot, then type.
    selection.apply(&doc, &layout, &mut caret, Motion::Up, false);
    let snapshot = RangeSnapshot::save(&caret);
    let mut caret = snapshot.restore(&doc).unwrap();
    editor
        .apply(&mut doc, &mut caret, EditOperation::InsertText("!".into()))
        .unwrap();
    println!("{}", doc.debug_markup(root));
}
