use crate::editing::Position;
use crate::error::{EditorError, Result, StructureError};
use crate::geometry::{Point, Rect, ScrollDelta};
use crate::host::LayoutOracle;
use crate::layout::LayoutContext;

/// Where a caret or focus can move
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Prev,
    Next,
    LineStart,
    LineEnd,
    First,
    End,
    PrevLine,
    NextLine,
}

/// Destination of moving `from` one step in `direction`
pub fn get_end_by<O: LayoutOracle + ?Sized>(
    ctx: &LayoutContext<'_, O>,
    from: Position,
    direction: Direction,
) -> Result<Position> {
    let store = ctx.store;
    let element = store
        .get(from.block)
        .ok_or(EditorError::UnknownElement(from.block))?;
    let offset = from.offset.min(element.char_len());

    let destination = match direction {
        Direction::Prev => {
            if offset > 0 {
                Position::new(from.block, offset - 1)
            } else {
                match store.index_of(from.block).and_then(|i| i.checked_sub(1)) {
                    Some(i) => {
                        let previous = store.at(i).ok_or(StructureError::UnknownElement(from.block))?;
                        Position::new(previous.id(), previous.char_len())
                    }
                    None => Position::new(from.block, 0),
                }
            }
        }
        Direction::Next => {
            if offset < element.char_len() {
                Position::new(from.block, offset + 1)
            } else {
                match store.index_of(from.block).and_then(|i| store.at(i + 1)) {
                    Some(next) => Position::new(next.id(), 0),
                    None => Position::new(from.block, offset),
                }
            }
        }
        Direction::LineStart => Position::new(element.view_line_id(), 0),
        Direction::LineEnd => {
            let run = store.view_line_run(element.view_line_id());
            let last = run.last().ok_or(StructureError::UnknownElement(from.block))?;
            Position::new(last.id(), last.char_len())
        }
        Direction::First => {
            let first = store.first().ok_or(EditorError::EmptyDocument)?;
            Position::new(first.id(), 0)
        }
        Direction::End => {
            let last = store.last().ok_or(EditorError::EmptyDocument)?;
            Position::new(last.id(), last.char_len())
        }
        Direction::PrevLine | Direction::NextLine => {
            let caret = ctx.caret_or_approximate(Position::new(from.block, offset))?;
            let line_height = if caret.height > 0.0 {
                caret.height
            } else {
                ctx.table.line_height()
            };
            let y = if direction == Direction::PrevLine {
                caret.y - line_height / 2.0
            } else {
                caret.bottom() + line_height / 2.0
            };
            ctx.resolve_point(Point::new(caret.x, y))?
        }
    };
    Ok(destination)
}

/// Scroll needed to bring the caret at `position` inside `visible`
///
/// `visible` is the container rectangle in content space. Returns `None` when
/// the caret is already inside. Unmaterialized positions are judged by their
/// line's tracked entry.
pub fn scroll_into_view<O: LayoutOracle + ?Sized>(
    ctx: &LayoutContext<'_, O>,
    position: Position,
    visible: Rect,
) -> Result<Option<ScrollDelta>, StructureError> {
    let caret = ctx.caret_or_approximate(position)?;

    let dx = if caret.x < visible.x {
        caret.x - visible.x
    } else if caret.right() > visible.right() {
        caret.right() - visible.right()
    } else {
        0.0
    };
    let dy = if caret.y < visible.y {
        caret.y - visible.y
    } else if caret.bottom() > visible.bottom() {
        caret.bottom() - visible.bottom()
    } else {
        0.0
    };

    let delta = ScrollDelta { dx, dy };
    Ok((!delta.is_zero()).then_some(delta))
}
