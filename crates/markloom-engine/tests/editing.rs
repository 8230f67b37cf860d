mod common;

use common::{at, names, root, session, text};
use markloom_engine::{ArrowKey, Cmd, EditorError, EditorEvent, Modifiers, Position};
use pretty_assertions::assert_eq;

// ============ Typing tests ============

#[test]
fn test_insert_text_at_caret() {
    let mut s = session(&["Hello"]);
    s.add_range(at(&s, 0, 5), None).unwrap();
    s.apply(Cmd::InsertText(" world".into())).unwrap();

    assert_eq!(s.text(), "Hello world");
    let caret = s.selection().current_range().unwrap();
    assert_eq!(caret.focus(), at(&s, 0, 11));
    assert!(caret.is_collapsed());
}

#[test]
fn test_insert_text_replaces_selection() {
    let mut s = session(&["Hello world"]);
    s.add_range(at(&s, 0, 0), Some(at(&s, 0, 5))).unwrap();
    s.apply(Cmd::InsertText("Howdy".into())).unwrap();
    assert_eq!(s.text(), "Howdy world");
}

#[test]
fn test_newline_in_inserted_text_breaks_line() {
    let mut s = session(&["ab"]);
    s.add_range(at(&s, 0, 1), None).unwrap();
    s.apply(Cmd::InsertText("x\ny".into())).unwrap();

    assert_eq!(s.text(), "ax\nyb");
    assert_eq!(s.layout().len(), 2);
}

#[test]
fn test_every_caret_types() {
    let mut s = session(&["abc", "def"]);
    s.add_range(at(&s, 0, 1), None).unwrap();
    s.add_range(at(&s, 1, 1), None).unwrap();
    s.apply(Cmd::InsertText("X".into())).unwrap();
    assert_eq!(s.text(), "aXbc\ndXef");
}

#[test]
fn test_carets_in_one_element_shift_each_other() {
    let mut s = session(&["abc"]);
    s.add_range(at(&s, 0, 1), None).unwrap();
    s.add_range(at(&s, 0, 2), None).unwrap();
    s.apply(Cmd::InsertText("X".into())).unwrap();

    assert_eq!(s.text(), "aXbXc");
    let offsets: Vec<usize> = s
        .selection()
        .ranges()
        .iter()
        .map(|r| r.focus().offset)
        .collect();
    assert_eq!(offsets, vec![2, 4]);
}

// ============ Deletion tests ============

#[test]
fn test_backspace_removes_previous_character() {
    let mut s = session(&["Hello"]);
    s.add_range(at(&s, 0, 3), None).unwrap();
    s.apply(Cmd::DeleteBackward).unwrap();
    assert_eq!(s.text(), "Helo");
    assert_eq!(s.selection().current_range().unwrap().focus(), at(&s, 0, 2));
}

#[test]
fn test_delete_removes_next_character() {
    let mut s = session(&["Hello"]);
    s.add_range(at(&s, 0, 0), None).unwrap();
    s.apply(Cmd::DeleteForward).unwrap();
    assert_eq!(s.text(), "ello");
}

#[test]
fn test_backspace_at_line_start_joins_lines() {
    let mut s = session(&["one", "two"]);
    s.add_range(at(&s, 1, 0), None).unwrap();
    s.apply(Cmd::DeleteBackward).unwrap();

    assert_eq!(s.text(), "onetwo");
    assert_eq!(s.layout().len(), 1);
    assert_eq!(s.selection().current_range().unwrap().focus(), at(&s, 0, 3));
}

#[test]
fn test_backspace_from_line_root_keeps_text_under_previous_line() {
    let mut s = session(&["one", "two"]);
    let (p1, p2, t2) = (root(&s, 0), root(&s, 1), text(&s, 1));
    s.add_range(at(&s, 1, 2), None).unwrap();
    s.keyboard_select(ArrowKey::Left, Modifiers::CTRL).unwrap();
    assert_eq!(
        s.selection().current_range().unwrap().focus(),
        Position::new(p2, 0)
    );

    s.apply(Cmd::DeleteBackward).unwrap();

    assert_eq!(s.text(), "onetwo");
    assert_eq!(s.store().get(t2).unwrap().parent(), Some(p1));
    assert_eq!(s.store().group_ids(t2), vec![p1]);
    assert_eq!(s.layout().len(), 1);
}

#[test]
fn test_backspace_at_document_start_is_a_no_op() {
    let mut s = session(&["one"]);
    s.add_range(at(&s, 0, 0), None).unwrap();
    s.apply(Cmd::DeleteBackward).unwrap();
    assert_eq!(s.text(), "one");
    assert!(!s.history().can_undo());
}

#[test]
fn test_delete_selection_across_lines() {
    let mut s = session(&["Hello", "Second", "World"]);
    s.add_range(at(&s, 2, 2), Some(at(&s, 0, 3))).unwrap();
    s.apply(Cmd::DeleteSelection).unwrap();

    assert_eq!(s.text(), "Helrld");
    assert_eq!(s.layout().len(), 1);
}

#[test]
fn test_collapse_current_range() {
    let mut s = session(&["Hello"]);
    s.add_range(at(&s, 0, 1), Some(at(&s, 0, 4))).unwrap();
    s.collapse().unwrap();
    assert_eq!(s.text(), "Ho");
    assert!(s.selection().current_range().unwrap().is_collapsed());
}

#[test]
fn test_select_all_then_type_replaces_document() {
    let mut s = session(&["one", "two"]);
    s.select_all().unwrap();
    s.apply(Cmd::InsertText("x".into())).unwrap();
    assert_eq!(s.text(), "x");
    assert_eq!(s.layout().len(), 1);
}

// ============ Line break tests ============

#[test]
fn test_break_line_moves_caret_to_new_line() {
    let mut s = session(&["Hello"]);
    s.add_range(at(&s, 0, 2), None).unwrap();
    s.apply(Cmd::BreakLine).unwrap();

    assert_eq!(s.text(), "He\nllo");
    let ys: Vec<f32> = s.layout().entries().iter().map(|e| e.y).collect();
    assert_eq!(ys, vec![10.0, 40.0]);

    let caret = s.selection().current_range().unwrap().focus();
    assert_eq!(caret.offset, 0);
    let new_line = s.store().element(caret.block).unwrap().view_line_id();
    assert_ne!(new_line, root(&s, 0));
}

// ============ History tests ============

#[test]
fn test_undo_and_redo_restore_text_and_caret() {
    let mut s = session(&["Hello"]);
    s.add_range(at(&s, 0, 5), None).unwrap();
    s.apply(Cmd::InsertText("!".into())).unwrap();

    s.undo().unwrap();
    assert_eq!(s.text(), "Hello");
    assert_eq!(s.selection().current_range().unwrap().focus(), at(&s, 0, 5));

    s.redo().unwrap();
    assert_eq!(s.text(), "Hello!");
    assert_eq!(s.selection().current_range().unwrap().focus(), at(&s, 0, 6));
}

#[test]
fn test_undo_restores_joined_lines() {
    let mut s = session(&["one", "two"]);
    s.add_range(at(&s, 1, 0), None).unwrap();
    s.apply(Cmd::DeleteBackward).unwrap();
    s.undo().unwrap();
    assert_eq!(s.text(), "one\ntwo");
    assert_eq!(s.layout().len(), 2);
}

#[test]
fn test_empty_history() {
    let mut s = session(&["one"]);
    assert_eq!(s.undo(), Err(EditorError::NothingToUndo));
    assert_eq!(s.redo(), Err(EditorError::NothingToRedo));
}

#[test]
fn test_new_edit_clears_redo() {
    let mut s = session(&["ab"]);
    s.add_range(at(&s, 0, 2), None).unwrap();
    s.apply(Cmd::InsertText("c".into())).unwrap();
    s.undo().unwrap();
    s.apply(Cmd::InsertText("d".into())).unwrap();
    assert_eq!(s.redo(), Err(EditorError::NothingToRedo));
    assert_eq!(s.text(), "abd");
}

// ============ Event tests ============

#[test]
fn test_edit_emits_schema_render_then_selection() {
    let mut s = session(&["Hello"]);
    s.add_range(at(&s, 0, 0), None).unwrap();
    let log = s.events().record();
    s.apply(Cmd::InsertText("a".into())).unwrap();

    assert_eq!(
        names(&log.borrow()),
        vec!["schema-changed", "render-requested", "selection-changed"]
    );
    match &log.borrow()[0] {
        EditorEvent::SchemaChanged(diff) => {
            assert_eq!(diff.len(), 1);
            assert_eq!(diff.entries()[0].view_line, root(&s, 0));
        }
        other => panic!("unexpected first event {other:?}"),
    }
}
