//! Geometry of the document: where every view line sits, which lines are
//! materialized, and how positions and ranges map to rectangles.
//!
//! The [`LayoutTable`] mirrors the view lines of the schema store. It is
//! patched from each [`SchemaDiff`](crate::schema::SchemaDiff) instead of
//! being recomputed, so an edit costs time proportional to the lines it
//! touches plus the shift of the lines below.
//!
//! Queries that need both the store and the host go through a short-lived
//! [`LayoutContext`]. When the host cannot answer (the line is outside the
//! virtual window), the context falls back to the tracked table entry.

pub mod patch;
pub mod projector;
pub mod window;

use crate::editing::{PhysicsRange, Position};
use crate::error::{EditorError, OracleError, StructureError};
use crate::geometry::{Point, Rect};
use crate::host::LayoutOracle;
use crate::schema::SchemaStore;

pub use patch::{LayoutTable, RenderedElement};
pub use window::VirtualWindow;

/// Borrowed view over the store, the layout table and the host oracle
pub struct LayoutContext<'a, O: ?Sized> {
    pub store: &'a SchemaStore,
    pub table: &'a LayoutTable,
    pub oracle: &'a O,
}

impl<'a, O: LayoutOracle + ?Sized> LayoutContext<'a, O> {
    pub fn new(store: &'a SchemaStore, table: &'a LayoutTable, oracle: &'a O) -> Self {
        Self {
            store,
            table,
            oracle,
        }
    }

    /// Caret rectangle from the host. Zero-length elements have no text to
    /// measure against, so their bounding box stands in.
    pub fn caret_rect(&self, position: Position) -> Result<Rect, OracleError> {
        let element = self
            .store
            .get(position.block)
            .ok_or(OracleError::NoGeometry(position.block))?;
        let len = element.char_len();
        if len == 0 {
            self.oracle.element_rect(position.block)
        } else {
            self.oracle
                .measure_caret(position.block, position.offset.min(len))
        }
    }

    /// Caret band at the left edge of the position's line, from the table
    pub fn approximate_caret(&self, position: Position) -> Result<Rect, StructureError> {
        let element = self.store.element(position.block)?;
        let entry = self.table.entry(element.view_line_id())?;
        Ok(Rect::new(entry.x, entry.y, 0.0, entry.line_height))
    }

    /// Host caret when available, otherwise the table approximation
    pub fn caret_or_approximate(&self, position: Position) -> Result<Rect, StructureError> {
        match self.caret_rect(position) {
            Ok(rect) => Ok(rect),
            Err(err) => {
                log::debug!("caret fallback for {}: {err}", position.block);
                self.approximate_caret(position)
            }
        }
    }

    /// Map a content-space point to a document position
    ///
    /// The line is chosen from the table by vertical band, the point is
    /// clamped into that line's rectangle and then hit-tested. An
    /// unmaterialized line resolves to its start.
    pub fn resolve_point(&self, point: Point) -> Result<Position, EditorError> {
        let line = self.table.line_at(point.y).ok_or(EditorError::EmptyDocument)?;
        let rect = line.rect();
        let target = if rect.contains(point) {
            point
        } else {
            rect.clamp_inside(point)
        };
        match self.oracle.hit_test(target) {
            Ok(position) => Ok(position),
            Err(err) => {
                log::warn!("hit test fallback to start of {}: {err}", line.id);
                Ok(Position::new(line.id, 0))
            }
        }
    }

    /// True when nothing on the position's line precedes it
    pub fn is_line_start(&self, position: Position) -> bool {
        if position.offset > 0 {
            return false;
        }
        let Some(element) = self.store.get(position.block) else {
            return false;
        };
        self.store
            .view_line_run(element.view_line_id())
            .iter()
            .take_while(|e| e.id() != position.block)
            .all(|e| e.char_len() == 0)
    }

    /// True when nothing on the position's line follows it
    pub fn is_line_end(&self, position: Position) -> bool {
        let Some(element) = self.store.get(position.block) else {
            return false;
        };
        if position.offset < element.char_len() {
            return false;
        }
        self.store
            .view_line_run(element.view_line_id())
            .iter()
            .skip_while(|e| e.id() != position.block)
            .skip(1)
            .all(|e| e.char_len() == 0)
    }

    /// Highlight rectangles for a normalized range
    pub fn project(&self, range: &PhysicsRange) -> Result<Vec<Rect>, StructureError> {
        projector::project(self, range)
    }
}
