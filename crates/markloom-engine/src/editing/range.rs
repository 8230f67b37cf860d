use std::fmt;

use uuid::Uuid;

use crate::schema::{ElementId, SchemaStore};

/// Stable identity of a selection range, unique within a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RangeId(Uuid);

impl RangeId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RangeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RangeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A place in the document: an element and a character offset into its content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position {
    pub block: ElementId,
    pub offset: usize,
}

impl Position {
    pub fn new(block: ElementId, offset: usize) -> Self {
        Self { block, offset }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.block, self.offset)
    }
}

/// A range with its endpoints in document order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhysicsRange {
    pub anchor: Position,
    pub focus: Position,
}

impl PhysicsRange {
    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.focus
    }
}

/// A selection: anchor where it started, focus where it ends (either order)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionRange {
    id: RangeId,
    anchor: Position,
    focus: Position,
}

impl SelectionRange {
    pub fn new(anchor: Position, focus: Position) -> Self {
        Self {
            id: RangeId::new(),
            anchor,
            focus,
        }
    }

    pub fn caret(position: Position) -> Self {
        Self::new(position, position)
    }

    pub fn id(&self) -> RangeId {
        self.id
    }

    pub fn anchor(&self) -> Position {
        self.anchor
    }

    pub fn focus(&self) -> Position {
        self.focus
    }

    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.focus
    }

    /// Move the anchor, leaving the focus
    pub fn set_start(&mut self, position: Position) {
        self.anchor = position;
    }

    /// Move the focus, leaving the anchor
    pub fn set_end(&mut self, position: Position) {
        self.focus = position;
    }

    pub fn set_range(&mut self, anchor: Position, focus: Position) {
        self.anchor = anchor;
        self.focus = focus;
    }

    /// Endpoints ordered by document position
    ///
    /// Within one element the smaller offset comes first; across elements the
    /// one earlier in the sequence does. Unknown elements keep the stored order.
    pub fn physics_range(&self, store: &SchemaStore) -> PhysicsRange {
        let (anchor, focus) = (self.anchor, self.focus);
        let swap = if anchor.block == focus.block {
            anchor.offset > focus.offset
        } else {
            match (store.index_of(anchor.block), store.index_of(focus.block)) {
                (Some(a), Some(f)) => a > f,
                _ => false,
            }
        };
        if swap {
            PhysicsRange {
                anchor: focus,
                focus: anchor,
            }
        } else {
            PhysicsRange { anchor, focus }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ElementKind;
    use pretty_assertions::assert_eq;

    fn store_with_two() -> (SchemaStore, ElementId, ElementId) {
        let mut store = SchemaStore::new();
        let p = store.create_element(ElementKind::Paragraph, None, "");
        let a = store.create_element(ElementKind::PlainText, Some(p.id()), "Hello");
        let b = store.create_element(ElementKind::PlainText, Some(p.id()), " World");
        let (a_id, b_id) = (a.id(), b.id());
        store.splice(0, 0, vec![p, a, b]).unwrap();
        (store, a_id, b_id)
    }

    #[test]
    fn test_range_ids_are_unique() {
        assert_ne!(RangeId::new(), RangeId::new());
    }

    #[test]
    fn test_physics_range_orders_offsets_in_one_element() {
        let (store, a, _) = store_with_two();
        let range = SelectionRange::new(Position::new(a, 4), Position::new(a, 1));
        let physics = range.physics_range(&store);
        assert_eq!(physics.anchor, Position::new(a, 1));
        assert_eq!(physics.focus, Position::new(a, 4));
    }

    #[test]
    fn test_physics_range_orders_by_sequence() {
        let (store, a, b) = store_with_two();
        let forward = SelectionRange::new(Position::new(a, 3), Position::new(b, 2));
        let backward = SelectionRange::new(Position::new(b, 2), Position::new(a, 3));
        assert_eq!(forward.physics_range(&store), backward.physics_range(&store));
    }

    #[test]
    fn test_set_end_keeps_anchor() {
        let (_, a, b) = store_with_two();
        let mut range = SelectionRange::caret(Position::new(a, 1));
        assert!(range.is_collapsed());
        range.set_end(Position::new(b, 0));
        assert_eq!(range.anchor(), Position::new(a, 1));
        assert!(!range.is_collapsed());
    }
}
