use std::collections::HashSet;

use crate::editing::Position;
use crate::error::{Result, StructureError};
use crate::schema::{
    ElementId, ElementKind, SchemaDiff, SchemaStore, Transaction, char_slice,
};

/// Editing commands a front end can send to a session
///
/// Every command applies to all ranges, in order, and is recorded as one undo
/// step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cmd {
    /// Remove the text of every non-collapsed range
    DeleteSelection,
    /// Backspace: remove the selection, or the character before each caret
    DeleteBackward,
    /// Delete: remove the selection, or the character after each caret
    DeleteForward,
    /// Replace the selection with text; `\n` breaks the line
    InsertText(String),
    /// Split the line at each caret
    BreakLine,
}

impl Cmd {
    pub fn name(&self) -> &'static str {
        match self {
            Cmd::DeleteSelection => "delete-selection",
            Cmd::DeleteBackward => "delete-backward",
            Cmd::DeleteForward => "delete-forward",
            Cmd::InsertText(_) => "insert-text",
            Cmd::BreakLine => "break-line",
        }
    }
}

/// How positions outside the edited range move after an edit
#[derive(Debug, Clone, PartialEq)]
pub enum PositionMap {
    /// Text from `start` to `end` was removed and `end` now follows `start`
    Merge {
        start: Position,
        end: Position,
        removed: HashSet<ElementId>,
    },
    /// `len` characters were inserted at `at`
    Insert { at: Position, len: usize },
    /// The element was split at `at`; the rest lives in `into`
    Split { at: Position, into: ElementId },
}

/// Outcome of one committed edit
#[derive(Debug, Clone, PartialEq)]
pub struct Edit {
    pub diff: SchemaDiff,
    /// Where the caret that made the edit ends up
    pub caret: Position,
    map: PositionMap,
}

impl Edit {
    pub fn new(diff: SchemaDiff, caret: Position, map: PositionMap) -> Self {
        Self { diff, caret, map }
    }

    /// Where a position from before the edit lives afterwards
    pub fn map(&self, p: Position) -> Position {
        match &self.map {
            PositionMap::Merge {
                start,
                end,
                removed,
            } => {
                if p.block == end.block && p.offset >= end.offset {
                    Position::new(start.block, start.offset + p.offset - end.offset)
                } else if (p.block == start.block && p.offset > start.offset)
                    || removed.contains(&p.block)
                {
                    *start
                } else {
                    p
                }
            }
            PositionMap::Insert { at, len } => {
                if p.block == at.block && p.offset >= at.offset {
                    Position::new(p.block, p.offset + len)
                } else {
                    p
                }
            }
            PositionMap::Split { at, into } => {
                if p.block == at.block && p.offset >= at.offset {
                    Position::new(*into, p.offset - at.offset)
                } else {
                    p
                }
            }
        }
    }
}

/// Insert `text` (no line breaks) at `at`
pub fn insert_text(store: &mut SchemaStore, at: Position, text: &str) -> Result<Edit> {
    let element = store.element(at.block)?.clone();
    let offset = at.offset.min(element.char_len());
    let content = element.content();
    let updated = format!(
        "{}{}{}",
        char_slice(content, 0, offset),
        text,
        char_slice(content, offset, element.char_len())
    );
    let len = text.chars().count();

    let mut tx = Transaction::new();
    tx.replace(element.id(), element.with_content(updated));
    let diff = store.commit(tx)?;
    let at = Position::new(at.block, offset);
    Ok(Edit::new(
        diff,
        Position::new(at.block, offset + len),
        PositionMap::Insert { at, len },
    ))
}

/// Split the view line at `at` into two
///
/// The element holding the caret keeps the text before it. A new view line is
/// inserted right after it, with copies of the caret element's ancestors
/// (so text inside a bold span stays bold), holding the text after the caret.
/// Everything that followed on the old line is re-parented into the new one.
pub fn break_line(store: &mut SchemaStore, at: Position) -> Result<Edit> {
    let element = store.element(at.block)?.clone();
    let offset = at.offset.min(element.char_len());
    let index = store
        .index_of(element.id())
        .ok_or(StructureError::UnknownElement(element.id()))?;
    let line = element.view_line_id();
    let root = store.element(line)?.clone();

    let head = char_slice(element.content(), 0, offset).to_string();
    let rest = char_slice(element.content(), offset, element.char_len()).to_string();

    let new_root_kind = match root.kind() {
        ElementKind::Heading(_) => ElementKind::Paragraph,
        kind => kind,
    };

    // old id -> replacement in the new line
    let mut adopted: Vec<(ElementId, ElementId)> = Vec::new();
    let mut inserted = Vec::new();

    let caret_element = if element.id() == line {
        let new_root = store.create_element(new_root_kind, None, rest);
        adopted.push((line, new_root.id()));
        let id = new_root.id();
        inserted.push(new_root);
        id
    } else {
        let new_root = store.create_element(new_root_kind, None, "");
        adopted.push((line, new_root.id()));
        let mut parent = new_root.id();
        inserted.push(new_root);

        // Ancestors between the root and the caret element, root excluded
        for ancestor in store.group_ids(element.id()).into_iter().skip(1) {
            let kind = store.element(ancestor)?.kind();
            let copy = store.create_element(kind, Some(parent), "");
            adopted.push((ancestor, copy.id()));
            parent = copy.id();
            inserted.push(copy);
        }
        let tail = store.create_element(element.kind(), Some(parent), rest);
        adopted.push((element.id(), tail.id()));
        let id = tail.id();
        inserted.push(tail);
        id
    };

    let mut tx = Transaction::new();
    tx.replace(element.id(), element.with_content(head));

    let following = store
        .elements()
        .skip(index + 1)
        .take_while(|e| e.view_line_id() == line);
    for follower in following {
        let Some(parent) = follower.parent() else {
            continue;
        };
        if let Some((_, replacement)) = adopted.iter().find(|(old, _)| *old == parent) {
            tx.replace(follower.id(), follower.with_parent(Some(*replacement)));
        }
    }
    tx.splice(index + 1, 0, inserted);

    let diff = store.commit(tx)?;
    log::debug!("broke line {line} at {}:{offset}", element.id());
    let at = Position::new(element.id(), offset);
    Ok(Edit::new(
        diff,
        Position::new(caret_element, 0),
        PositionMap::Split {
            at,
            into: caret_element,
        },
    ))
}

/// Span a Backspace (`forward == false`) or Delete at `caret` would remove
///
/// Zero-length elements (markers, empty containers) are stepped over so a key
/// press always removes a character or joins two lines. `None` at the
/// document edge.
pub fn deletion_span(
    store: &SchemaStore,
    caret: Position,
    forward: bool,
) -> Result<Option<(Position, Position)>> {
    let element = store.element(caret.block)?;
    let offset = caret.offset.min(element.char_len());
    let caret = Position::new(caret.block, offset);
    let line = element.view_line_id();
    let index = store
        .index_of(caret.block)
        .ok_or(StructureError::UnknownElement(caret.block))?;

    if forward {
        if offset < element.char_len() {
            return Ok(Some((caret, Position::new(caret.block, offset + 1))));
        }
        for next in store.elements().skip(index + 1) {
            if next.view_line_id() != line {
                return Ok(Some((caret, Position::new(next.id(), 0))));
            }
            if next.char_len() > 0 {
                return Ok(Some((Position::new(next.id(), 0), Position::new(next.id(), 1))));
            }
        }
    } else {
        if offset > 0 {
            return Ok(Some((Position::new(caret.block, offset - 1), caret)));
        }
        for previous in store.elements().take(index).rev() {
            if previous.view_line_id() != line {
                return Ok(Some((Position::new(previous.id(), previous.char_len()), caret)));
            }
            let len = previous.char_len();
            if len > 0 {
                return Ok(Some((
                    Position::new(previous.id(), len - 1),
                    Position::new(previous.id(), len),
                )));
            }
        }
    }
    Ok(None)
}
