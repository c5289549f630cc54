//! End-to-end backspace behaviour through the engine entry point

use std::cell::Cell;
use std::rc::Rc;

use insta::assert_snapshot;
use pretty_assertions::assert_eq;
use richedit_engine::{
    CardKey, Change, EditableCard, Engine, Flow, KeyEvent, NodeId, Outcome, Position, Range,
};
use rstest::rstest;

fn node_at(engine: &Engine, path: &[usize]) -> NodeId {
    let tree = engine.change().tree();
    path.iter()
        .fold(tree.root(), |node, &i| tree.child(node, i).unwrap())
}

fn backspace(engine: &mut Engine) -> Outcome {
    engine
        .handle_key(&KeyEvent::key_down("backspace"))
        .outcome("backspace")
        .unwrap()
}

#[test]
fn test_paired_breaks_after_text_collapse_to_text() {
    let mut engine = Engine::from_markup("<p>ab<br/><br/></p>").unwrap();
    let p = node_at(&engine, &[0]);
    engine.change_mut().set_range(Range::caret(p, 2));

    let dispatch = engine.handle_key(&KeyEvent::key_down("backspace"));

    assert!(dispatch.suppresses_default());
    assert_snapshot!(engine.to_markup(), @"<p>ab</p>");
    let text = node_at(&engine, &[0, 0]);
    assert_eq!(engine.change().tree().text(text), Some("ab"));
    assert_eq!(*engine.change().range(), Range::caret(text, 2));
}

#[test]
fn test_repeated_backspace_on_empty_document() {
    let mut engine = Engine::new();

    for version in 1..=5 {
        assert_eq!(backspace(&mut engine), Outcome::Handled);
        insta::allow_duplicates! {
            assert_snapshot!(engine.to_markup(), @"<p><br /></p>");
        }
        assert_eq!(engine.change().version(), version);
    }
}

#[test]
fn test_paired_breaks_after_bold_run() {
    let mut engine = Engine::from_markup("<p><b>ab</b><br/><br/></p>").unwrap();
    let p = node_at(&engine, &[0]);
    engine.change_mut().set_range(Range::caret(p, 2));

    assert_eq!(backspace(&mut engine), Outcome::Handled);

    assert_snapshot!(engine.to_markup(), @"<p><b>ab</b></p>");
    let text = node_at(&engine, &[0, 0, 0]);
    assert_eq!(*engine.change().range(), Range::caret(text, 2));
}

#[rstest]
#[case::between_text_runs("<p>ab<br />cd</p>", &[0], 2)]
#[case::after_lone_break("<p>ab<br /></p>", &[0], 2)]
#[case::inside_text("<p>abc</p>", &[0, 0], 2)]
#[case::three_breaks("<p>ab<br /><br /><br /></p>", &[0], 3)]
fn test_unpaired_break_defers_to_host(
    #[case] markup: &str,
    #[case] path: &[usize],
    #[case] offset: usize,
) {
    let mut engine = Engine::from_markup(markup).unwrap();
    let node = node_at(&engine, path);
    engine.change_mut().set_range(Range::caret(node, offset));

    let dispatch = engine.handle_key(&KeyEvent::key_down("backspace"));

    assert!(!dispatch.suppresses_default());
    assert_eq!(dispatch.outcome("backspace"), Some(Outcome::Deferred));
    assert_eq!(engine.to_markup(), markup);
}

#[test]
fn test_selection_across_paragraphs() {
    let mut engine =
        Engine::from_markup("<h1>Title</h1><p>one <b>bold</b> two</p><p>three</p>").unwrap();
    let title = node_at(&engine, &[0, 0]);
    let bold = node_at(&engine, &[1, 1, 0]);
    let range = Range::new(
        engine.change().tree(),
        Position::new(title, 2),
        Position::new(bold, 2),
    );
    engine.change_mut().set_range(range);

    assert_eq!(backspace(&mut engine), Outcome::Handled);

    assert_snapshot!(engine.to_markup(), @"<h1>Ti<b>ld</b> two</h1><p>three</p>");
    assert!(engine.change().range().is_collapsed());
    assert_eq!(*engine.change().range(), Range::caret(title, 2));
}

#[test]
fn test_select_all_then_backspace_reinitialises() {
    let mut engine = Engine::from_markup("<p>one</p><p>two</p>").unwrap();
    let root = engine.change().tree().root();
    let range = Range::new(
        engine.change().tree(),
        Position::new(root, 0),
        Position::new(root, 2),
    );
    engine.change_mut().set_range(range);

    assert_eq!(backspace(&mut engine), Outcome::Handled);

    assert_snapshot!(engine.to_markup(), @"<p><br /></p>");
    assert!(engine.change().is_empty());
    assert!(engine.change().range().is_valid(engine.change().tree()));
}

#[test]
fn test_veto_listener_and_unregister_restores_behaviour() {
    let calls = Rc::new(Cell::new(0));
    let mut engine = Engine::from_markup("<p>ab<br /><br /></p>").unwrap();
    let p = node_at(&engine, &[0]);
    engine.change_mut().set_range(Range::caret(p, 2));
    let seen = Rc::clone(&calls);
    let id = engine
        .on_backspace(Box::new(move |event: &KeyEvent, _: &mut Change| {
            seen.set(seen.get() + 1);
            Flow::from(event.key != "backspace")
        }))
        .unwrap();

    assert_eq!(
        backspace(&mut engine),
        Outcome::Vetoed {
            suppress_default: false
        }
    );
    assert_eq!(calls.get(), 1);
    assert_snapshot!(engine.to_markup(), @"<p>ab<br /><br /></p>");

    assert!(engine.off_backspace(id));
    assert_eq!(backspace(&mut engine), Outcome::Handled);
    assert_eq!(calls.get(), 1);
    assert_snapshot!(engine.to_markup(), @"<p>ab</p>");
}

#[test]
fn test_listener_side_effects_with_suppression() {
    let mut engine = Engine::from_markup("<p>abc</p>").unwrap();
    let text = node_at(&engine, &[0, 0]);
    engine.change_mut().set_range(Range::caret(text, 3));
    engine
        .on_backspace(Box::new(|_: &KeyEvent, change: &mut Change| {
            let p = change.tree().child(change.tree().root(), 0).unwrap();
            let _ = change.set_inner_markup(p, "replaced");
            Flow::Veto {
                suppress_default: true,
            }
        }))
        .unwrap();

    let dispatch = engine.handle_key(&KeyEvent::key_down("backspace"));

    assert!(dispatch.suppresses_default());
    assert_snapshot!(engine.to_markup(), @"<p>replaced</p>");
    assert!(engine.change().range().is_valid(engine.change().tree()));
}

#[test]
fn test_card_cell_selection_is_cleared() {
    let key = CardKey::new();
    let markup = format!(
        "<p>intro</p><div data-card-key=\"{key}\"><table><tr><td>a1</td><td>b1</td></tr><tr><td>a2</td><td>b2</td></tr></table></div>"
    );
    let mut engine = Engine::from_markup(&markup).unwrap();
    let card_root = node_at(&engine, &[1]);
    let selected = vec![node_at(&engine, &[1, 0, 0, 1]), node_at(&engine, &[1, 0, 1, 1])];
    engine.register_card(Box::new(
        EditableCard::new(key, card_root).with_selection(selected.clone()),
    ));
    let inside = node_at(&engine, &[1, 0, 1, 1, 0]);
    engine.change_mut().set_range(Range::caret(inside, 1));

    assert_eq!(backspace(&mut engine), Outcome::Handled);

    let tree = engine.change().tree();
    assert_snapshot!(
        tree.inner_markup(node_at(&engine, &[1, 0])),
        @"<tr><td>a1</td><td><p><br /></p></td></tr><tr><td>a2</td><td><p><br /></p></td></tr>"
    );
    assert_eq!(*engine.change().range(), Range::caret(selected[0], 0));
}

#[test]
fn test_break_at_end_of_editable_root() {
    let mut engine = Engine::from_markup("<p>text</p><br />").unwrap();
    let root = engine.change().tree().root();
    engine.change_mut().set_range(Range::caret(root, 2));

    assert_eq!(backspace(&mut engine), Outcome::Handled);

    assert_snapshot!(engine.to_markup(), @"<p>text</p>");
    assert_eq!(*engine.change().range(), Range::caret(root, 1));
}

#[test]
fn test_other_keys_are_not_dispatched() {
    let mut engine = Engine::from_markup("<p>ab<br /><br /></p>").unwrap();

    let dispatch = engine.handle_key(&KeyEvent::key_down("delete"));
    let release = engine.handle_key(&KeyEvent::key_up("backspace"));

    assert!(dispatch.is_unmatched());
    assert!(release.is_unmatched());
    assert_eq!(engine.change().cached_range(), None);
}
