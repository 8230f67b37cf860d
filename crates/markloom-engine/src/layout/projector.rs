//! Range to rectangle projection.
//!
//! A selection that stays on one view line is a single rectangle between the
//! two caret x positions. A selection across lines becomes up to three kinds
//! of pieces: the tail of the first line, every line in between at full
//! width, and the head of the last line. Each rectangle is independent; they
//! are not merged into an outline.

use crate::editing::PhysicsRange;
use crate::error::StructureError;
use crate::geometry::Rect;
use crate::host::LayoutOracle;
use crate::layout::LayoutContext;

pub fn project<O: LayoutOracle + ?Sized>(
    ctx: &LayoutContext<'_, O>,
    range: &PhysicsRange,
) -> Result<Vec<Rect>, StructureError> {
    if range.is_collapsed() {
        return Ok(Vec::new());
    }

    let anchor_line = ctx
        .table
        .entry(ctx.store.element(range.anchor.block)?.view_line_id())?;
    let focus_line = ctx
        .table
        .entry(ctx.store.element(range.focus.block)?.view_line_id())?;

    if anchor_line.id == focus_line.id {
        let rect = match (ctx.caret_rect(range.anchor), ctx.caret_rect(range.focus)) {
            (Ok(a), Ok(f)) => Rect::spanning(a.x, f.x, anchor_line.y, anchor_line.height),
            (Err(err), _) | (_, Err(err)) => {
                log::debug!("projecting whole line {}: {err}", anchor_line.id);
                anchor_line.rect()
            }
        };
        return Ok(vec![rect]);
    }

    let mut rects = Vec::new();

    let head = if ctx.is_line_start(range.anchor) {
        anchor_line.rect()
    } else {
        match ctx.caret_rect(range.anchor) {
            Ok(caret) => Rect::new(
                caret.x,
                anchor_line.y,
                (anchor_line.rect().right() - caret.x).max(0.0),
                anchor_line.height,
            ),
            Err(err) => {
                log::debug!("projecting whole line {}: {err}", anchor_line.id);
                anchor_line.rect()
            }
        }
    };
    rects.push(head);

    if let (Some(first), Some(last)) = (
        ctx.table.index_of(anchor_line.id),
        ctx.table.index_of(focus_line.id),
    ) {
        if first + 1 < last {
            rects.extend(ctx.table.entries()[first + 1..last].iter().map(|e| e.rect()));
        }
    }

    let tail = if ctx.is_line_end(range.focus) {
        focus_line.rect()
    } else {
        match ctx.caret_rect(range.focus) {
            Ok(caret) => Rect::new(
                focus_line.x,
                focus_line.y,
                (caret.x - focus_line.x).max(0.0),
                focus_line.height,
            ),
            Err(err) => {
                log::debug!("projecting whole line {}: {err}", focus_line.id);
                focus_line.rect()
            }
        }
    };
    rects.push(tail);

    Ok(rects)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editing::Position;
    use crate::testing::Fixture;
    use pretty_assertions::assert_eq;

    fn fixture() -> Fixture {
        // 10px cells, 20px rows, 20 columns, 10px gap: lines at y = 10, 40, 70
        Fixture::new(&[&["Hello", " World"], &["Second"], &["Third line"]])
    }

    fn range(anchor: Position, focus: Position) -> PhysicsRange {
        PhysicsRange { anchor, focus }
    }

    // ============ Single line tests ============

    #[test]
    fn test_collapsed_range_projects_nothing() {
        let fx = fixture();
        let pos = Position::new(fx.el(0, 0), 2);
        assert_eq!(fx.ctx().project(&range(pos, pos)).unwrap(), vec![]);
    }

    #[test]
    fn test_same_line_single_rect_between_carets() {
        let fx = fixture();
        let rects = fx
            .ctx()
            .project(&range(
                Position::new(fx.el(0, 0), 1),
                Position::new(fx.el(0, 1), 2),
            ))
            .unwrap();
        assert_eq!(rects, vec![Rect::new(10.0, 10.0, 60.0, 20.0)]);
    }

    // ============ Multi line tests ============

    #[test]
    fn test_cross_line_head_middle_tail() {
        let fx = fixture();
        let rects = fx
            .ctx()
            .project(&range(
                Position::new(fx.el(0, 0), 2),
                Position::new(fx.el(2, 0), 5),
            ))
            .unwrap();
        assert_eq!(
            rects,
            vec![
                Rect::new(20.0, 10.0, 180.0, 20.0),
                Rect::new(0.0, 40.0, 200.0, 20.0),
                Rect::new(0.0, 70.0, 50.0, 20.0),
            ]
        );
    }

    #[test]
    fn test_adjacent_lines_have_no_middle() {
        let fx = fixture();
        let rects = fx
            .ctx()
            .project(&range(
                Position::new(fx.el(1, 0), 3),
                Position::new(fx.el(2, 0), 1),
            ))
            .unwrap();
        assert_eq!(
            rects,
            vec![
                Rect::new(30.0, 40.0, 170.0, 20.0),
                Rect::new(0.0, 70.0, 10.0, 20.0),
            ]
        );
    }

    #[test]
    fn test_line_start_and_end_cover_full_width() {
        let fx = fixture();
        let rects = fx
            .ctx()
            .project(&range(
                Position::new(fx.el(0, 0), 0),
                Position::new(fx.el(1, 0), 6),
            ))
            .unwrap();
        assert_eq!(
            rects,
            vec![
                Rect::new(0.0, 10.0, 200.0, 20.0),
                Rect::new(0.0, 40.0, 200.0, 20.0),
            ]
        );
    }

    #[test]
    fn test_unmaterialized_endpoint_uses_line_rect() {
        let mut fx = fixture();
        fx.materialize_only(&[0, 1]);
        let rects = fx
            .ctx()
            .project(&range(
                Position::new(fx.el(1, 0), 3),
                Position::new(fx.el(2, 0), 1),
            ))
            .unwrap();
        assert_eq!(rects[1], Rect::new(0.0, 70.0, 200.0, 20.0));
    }

    #[test]
    fn test_unknown_endpoint_is_structural() {
        let fx = fixture();
        let ghost = crate::schema::ElementId::from_raw(999);
        let result = fx
            .ctx()
            .project(&range(Position::new(ghost, 0), Position::new(fx.el(0, 0), 1)));
        assert_eq!(result, Err(StructureError::UnknownElement(ghost)));
    }
}
