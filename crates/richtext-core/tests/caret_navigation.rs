use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use richtext_core::{Boundary, CaretWalker, Display, Document, NodeId, Range};

fn caret(node: NodeId, offset: usize) -> Range {
    Range::collapsed(Boundary::new(node, offset))
}

fn random_text(rng: &mut StdRng) -> String {
    let len = rng.gen_range(1..=4);
    (0..len)
        .map(|_| char::from(b'a' + rng.gen_range(0..8)))
        .collect()
}

/// Paragraphs of lines separated by line breaks, mixing plain runs, bold runs and inline
/// images, with the occasional empty paragraph held open by a placeholder break. The
/// document always opens with a plain run, which is returned.
fn random_document(rng: &mut StdRng) -> (Document, NodeId) {
    let mut doc = Document::new();
    let root = doc.root();
    let first_paragraph = doc.append_block(root, "p");
    let first = doc.append_text(first_paragraph, &random_text(rng));

    for index in 0..rng.gen_range(1..=4) {
        let p = if index == 0 {
            first_paragraph
        } else {
            doc.append_block(root, "p")
        };
        if index > 0 && rng.gen_bool(0.2) {
            doc.append_linebreak(p);
            continue;
        }
        for line in 0..rng.gen_range(1..=3) {
            if line > 0 {
                doc.append_linebreak(p);
            }
            for _ in 0..rng.gen_range(1..=3) {
                match rng.gen_range(0..4) {
                    0 => {
                        let bold = doc.append_format(p, "b");
                        doc.append_text(bold, &random_text(rng));
                    }
                    1 => {
                        doc.append_embedded(p, "img", Display::Inline);
                    }
                    _ => {
                        doc.append_text(p, &random_text(rng));
                    }
                }
            }
        }
    }
    (doc, first)
}

fn walk_forward(walker: &CaretWalker, doc: &Document, start: Range) -> Vec<Range> {
    let mut stops = vec![start];
    let mut current = start;
    while let Some(next) = walker.next_caret(doc, &current) {
        stops.push(next);
        current = next;
    }
    stops
}

#[test]
fn test_three_steps_cross_a_run() {
    let mut doc = Document::new();
    let root = doc.root();
    let p1 = doc.append_block(root, "p");
    let abc = doc.append_text(p1, "abc");
    let p2 = doc.append_block(root, "p");
    let de = doc.append_text(p2, "de");
    let walker = CaretWalker::for_document(&doc);

    let mut current = caret(abc, 0);
    for offset in 1..=3 {
        current = walker.next_caret(&doc, &current).expect("next caret");
        assert_eq!(current, caret(abc, offset));
    }
    assert_eq!(walker.next_caret(&doc, &current), Some(caret(de, 0)));
    assert_eq!(walker.next_caret(&doc, &caret(de, 2)), None);
    assert_eq!(walker.prev_caret(&doc, &caret(abc, 0)), None);
}

#[test]
fn test_adjacent_runs_share_a_stop() {
    let mut doc = Document::new();
    let p = doc.append_block(doc.root(), "p");
    let ab = doc.append_text(p, "ab");
    let cd = doc.append_text(p, "cd");
    let walker = CaretWalker::for_document(&doc);

    let next = walker.next_caret(&doc, &caret(ab, 1)).expect("next");
    assert_eq!(next, caret(ab, 2));
    let next = walker.next_caret(&doc, &next).expect("next");
    assert_eq!(next, caret(cd, 1));

    assert!(walker.is_equivalent_caret(&doc, &caret(ab, 2), &caret(cd, 0)));
    assert!(walker.is_equivalent_caret(&doc, &caret(cd, 0), &caret(ab, 2)));
    assert!(!walker.is_equivalent_caret(&doc, &caret(ab, 1), &caret(cd, 0)));
}

#[test]
fn test_prev_undoes_next_on_random_documents() {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    for _ in 0..200 {
        let (doc, first) = random_document(&mut rng);
        let walker = CaretWalker::for_document(&doc);
        let stops = walk_forward(&walker, &doc, caret(first, 0));

        for pair in stops.windows(2) {
            let back = walker.prev_caret(&doc, &pair[1]).expect("a previous caret");
            assert!(
                walker.is_equivalent_caret(&doc, &back, &pair[0]),
                "{:?} stepped back to {:?}, expected {:?} in {}",
                pair[1],
                back,
                pair[0],
                doc.debug_markup(doc.root())
            );
        }

        let last = *stops.last().expect("non-empty walk");
        assert_eq!(walker.distance_between(&doc, &stops[0], &last), stops.len() - 1);
        assert_eq!(
            walker.distance_between(&doc, &last, &stops[0]),
            walker.distance_between(&doc, &stops[0], &last)
        );
        assert_eq!(walker.distance_between(&doc, &last, &last), 0);
    }
}
