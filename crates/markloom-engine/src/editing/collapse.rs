//! Deleting the content of a selection range.
//!
//! A range inside one element is a slice of that element's text. A range
//! spanning elements merges the focus element's remaining text into the
//! anchor element and removes everything in between, including whole view
//! lines. Elements that follow the focus on its view line stay where they are
//! in the sequence; only their parent handles are rewritten so they hang off
//! the anchor's line instead of a removed ancestor.

use std::collections::HashSet;

use crate::editing::commands::{Edit, PositionMap};
use crate::editing::{Position, SelectionRange};
use crate::error::{Result, StructureError};
use crate::schema::{ElementId, SchemaStore, Transaction, char_slice};

/// Remove the text covered by `range`
///
/// Returns `None` for a collapsed range: nothing is committed and no diff is
/// produced. Otherwise the store is updated in one transaction and the edit
/// carries the caret at the merge point.
pub fn collapse(store: &mut SchemaStore, range: &SelectionRange) -> Result<Option<Edit>> {
    if range.is_collapsed() {
        return Ok(None);
    }
    let physics = range.physics_range(store);
    let (start, end) = (physics.anchor, physics.focus);

    let anchor = store.element(start.block)?.clone();
    let focus = store.element(end.block)?.clone();
    let start = Position::new(anchor.id(), start.offset.min(anchor.char_len()));
    let end = Position::new(focus.id(), end.offset.min(focus.char_len()));

    if anchor.id() == focus.id() {
        let content = anchor.content();
        let merged = format!(
            "{}{}",
            char_slice(content, 0, start.offset),
            char_slice(content, end.offset, anchor.char_len())
        );
        let mut tx = Transaction::new();
        tx.replace(anchor.id(), anchor.with_content(merged));
        let diff = store.commit(tx)?;
        return Ok(Some(Edit::new(
            diff,
            start,
            PositionMap::Merge {
                start,
                end,
                removed: HashSet::new(),
            },
        )));
    }

    let anchor_index = store
        .index_of(anchor.id())
        .ok_or(StructureError::UnknownElement(anchor.id()))?;
    let focus_index = store
        .index_of(focus.id())
        .ok_or(StructureError::UnknownElement(focus.id()))?;
    let anchor_line = anchor.view_line_id();
    let focus_line = focus.view_line_id();

    let removed: HashSet<ElementId> = store
        .elements()
        .skip(anchor_index + 1)
        .take(focus_index - anchor_index)
        .map(|e| e.id())
        .collect();

    let mut tx = Transaction::new();

    // Re-parent the rest of the focus line onto surviving ancestors
    let tail = store
        .elements()
        .skip(focus_index + 1)
        .take_while(|e| e.view_line_id() == focus_line);
    for element in tail {
        let Some(parent) = element.parent() else {
            continue;
        };
        if !removed.contains(&parent) {
            continue;
        }
        let adopted = surviving_ancestor(store, parent, &removed, &focus, anchor.id(), anchor_line)?;
        tx.replace(element.id(), element.with_parent(Some(adopted)));
    }

    let merged = format!(
        "{}{}",
        char_slice(anchor.content(), 0, start.offset),
        char_slice(focus.content(), end.offset, focus.char_len())
    );
    tx.replace(anchor.id(), anchor.with_content(merged));
    tx.splice(anchor_index + 1, focus_index - anchor_index, Vec::new());

    log::debug!(
        "collapsing {start}..{end}: removing {} elements, merging into {}",
        removed.len(),
        anchor.id()
    );
    let diff = store.commit(tx)?;
    Ok(Some(Edit::new(
        diff,
        start,
        PositionMap::Merge {
            start,
            end,
            removed,
        },
    )))
}

/// Nearest ancestor of `parent` that survives the removal, with the focus
/// element and focus view line standing in for the anchor element and line
fn surviving_ancestor(
    store: &SchemaStore,
    parent: ElementId,
    removed: &HashSet<ElementId>,
    focus: &crate::schema::SchemaElement,
    anchor: ElementId,
    anchor_line: ElementId,
) -> Result<ElementId, StructureError> {
    let mut cursor = parent;
    loop {
        if cursor == focus.view_line_id() {
            return Ok(anchor_line);
        }
        if cursor == focus.id() {
            return Ok(anchor);
        }
        if !removed.contains(&cursor) {
            return Ok(cursor);
        }
        cursor = store
            .element(cursor)?
            .parent()
            .ok_or(StructureError::UnknownElement(cursor))?;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Behavior, ElementKind};
    use pretty_assertions::assert_eq;

    /// P1 [E1 "Hello", E2 " World"], P2 [S strong [T "bold"], U " tail"]
    struct Doc {
        store: SchemaStore,
        p1: ElementId,
        e1: ElementId,
        e2: ElementId,
        p2: ElementId,
        s: ElementId,
        t: ElementId,
        u: ElementId,
    }

    fn doc() -> Doc {
        let mut store = SchemaStore::new();
        let p1 = store.create_element(ElementKind::Paragraph, None, "");
        let e1 = store.create_element(ElementKind::PlainText, Some(p1.id()), "Hello");
        let e2 = store.create_element(ElementKind::PlainText, Some(p1.id()), " World");
        let p2 = store.create_element(ElementKind::Paragraph, None, "");
        let s = store.create_element(ElementKind::Strong, Some(p2.id()), "");
        let t = store.create_element(ElementKind::PlainText, Some(s.id()), "bold");
        let u = store.create_element(ElementKind::PlainText, Some(p2.id()), " tail");
        let ids = [p1.id(), e1.id(), e2.id(), p2.id(), s.id(), t.id(), u.id()];
        store.splice(0, 0, vec![p1, e1, e2, p2, s, t, u]).unwrap();
        let [p1, e1, e2, p2, s, t, u] = ids;
        Doc {
            store,
            p1,
            e1,
            e2,
            p2,
            s,
            t,
            u,
        }
    }

    fn content(store: &SchemaStore, id: ElementId) -> String {
        store.get(id).unwrap().content().to_string()
    }

    // ============ Same element tests ============

    #[test]
    fn test_collapsed_range_is_noop() {
        let mut d = doc();
        let before = d.store.snapshot();
        let range = SelectionRange::caret(Position::new(d.e1, 2));
        assert!(collapse(&mut d.store, &range).unwrap().is_none());
        assert_eq!(d.store.snapshot(), before);
    }

    #[test]
    fn test_same_element_slice() {
        let mut d = doc();
        let range = SelectionRange::new(Position::new(d.e1, 4), Position::new(d.e1, 1));
        let edit = collapse(&mut d.store, &range).unwrap().unwrap();
        assert_eq!(content(&d.store, d.e1), "Ho");
        assert_eq!(edit.caret, Position::new(d.e1, 1));
        assert_eq!(edit.diff.entries().len(), 1);
        assert_eq!(edit.diff.entries()[0].behavior, Behavior::Update);
    }

    // ============ Cross element tests ============

    #[test]
    fn test_cross_element_merge_on_one_line() {
        let mut d = doc();
        let range = SelectionRange::new(Position::new(d.e1, 3), Position::new(d.e2, 2));
        let edit = collapse(&mut d.store, &range).unwrap().unwrap();
        assert_eq!(content(&d.store, d.e1), "Helorld");
        assert!(!d.store.contains(d.e2));
        assert_eq!(edit.caret, Position::new(d.e1, 3));
    }

    #[test]
    fn test_cross_element_merge_with_bare_focus_text() {
        let mut d = doc();
        let world = d.store.get(d.e2).unwrap().with_content("World");
        d.store.replace(d.e2, world).unwrap();
        let range = SelectionRange::new(Position::new(d.e1, 3), Position::new(d.e2, 2));
        collapse(&mut d.store, &range).unwrap().unwrap();
        assert_eq!(content(&d.store, d.e1), "Helrld");
    }

    #[test]
    fn test_direction_does_not_matter() {
        let mut forward = doc();
        let mut backward = doc();
        let a = SelectionRange::new(Position::new(forward.e1, 3), Position::new(forward.e2, 2));
        let b = SelectionRange::new(Position::new(backward.e2, 2), Position::new(backward.e1, 3));
        collapse(&mut forward.store, &a).unwrap();
        collapse(&mut backward.store, &b).unwrap();
        assert_eq!(forward.store.snapshot(), backward.store.snapshot());
    }

    #[test]
    fn test_cross_line_merge_reparents_tail() {
        let mut d = doc();
        // "Hel|lo World" .. "bo|ld tail"
        let range = SelectionRange::new(Position::new(d.e1, 3), Position::new(d.t, 2));
        let edit = collapse(&mut d.store, &range).unwrap().unwrap();

        assert_eq!(content(&d.store, d.e1), "Helld");
        for gone in [d.e2, d.p2, d.s, d.t] {
            assert!(!d.store.contains(gone), "{gone} should be removed");
        }
        let u = d.store.get(d.u).unwrap();
        assert_eq!(u.parent(), Some(d.p1));
        assert_eq!(u.view_line_id(), d.p1);
        assert_eq!(d.store.view_line_text(d.p1), "Helld tail");
        assert_eq!(edit.caret, Position::new(d.e1, 3));

        let behaviors: Vec<_> = edit.diff.iter().map(|e| (e.view_line, e.behavior)).collect();
        assert_eq!(
            behaviors,
            vec![(d.p2, Behavior::Delete), (d.p1, Behavior::Update)]
        );
    }

    #[test]
    fn test_children_of_focus_element_move_to_anchor() {
        let mut d = doc();
        // Selecting into the strong container itself hands its children over
        let range = SelectionRange::new(Position::new(d.e2, 1), Position::new(d.s, 0));
        collapse(&mut d.store, &range).unwrap().unwrap();
        assert_eq!(d.store.get(d.t).unwrap().parent(), Some(d.e2));
        assert_eq!(d.store.get(d.u).unwrap().parent(), Some(d.p1));
        assert_eq!(d.store.view_line_text(d.p1), "Hello bold tail");
    }

    #[test]
    fn test_children_of_focus_line_move_to_anchor_line() {
        let mut d = doc();
        // "Hello World|" .. "|bold tail" with the caret on the line root
        let range = SelectionRange::new(Position::new(d.e2, 6), Position::new(d.p2, 0));
        let edit = collapse(&mut d.store, &range).unwrap().unwrap();
        assert!(!d.store.contains(d.p2));
        assert_eq!(d.store.get(d.s).unwrap().parent(), Some(d.p1));
        assert_eq!(d.store.get(d.t).unwrap().parent(), Some(d.s));
        assert_eq!(d.store.get(d.u).unwrap().parent(), Some(d.p1));
        assert_eq!(d.store.group_ids(d.t), vec![d.p1, d.s]);
        assert_eq!(d.store.view_line_text(d.p1), "Hello Worldbold tail");
        assert_eq!(edit.caret, Position::new(d.e2, 6));
    }

    #[test]
    fn test_merge_maps_other_positions() {
        let mut d = doc();
        let range = SelectionRange::new(Position::new(d.e1, 3), Position::new(d.e2, 2));
        let edit = collapse(&mut d.store, &range).unwrap().unwrap();
        // after the removed text: shifted into the anchor
        assert_eq!(edit.map(Position::new(d.e2, 4)), Position::new(d.e1, 5));
        // inside the removed text: snapped to the merge point
        assert_eq!(edit.map(Position::new(d.e1, 4)), Position::new(d.e1, 3));
        // untouched
        assert_eq!(edit.map(Position::new(d.u, 1)), Position::new(d.u, 1));
    }
}
