//! Monospace host: every character occupies one cell and lines wrap at a
//! fixed column count.
//!
//! Used by the terminal front end and by tests, where pixel-exact geometry
//! needs to be predictable.

use std::collections::HashMap;

use crate::editing::Position;
use crate::error::OracleError;
use crate::geometry::{Point, Rect, Size};
use crate::host::{LayoutOracle, RenderSink, ViewLine};
use crate::layout::RenderedElement;
use crate::schema::ElementId;

/// Cell geometry for a [`GridHost`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridMetrics {
    pub cell_width: f32,
    pub line_height: f32,
    /// Columns before a line wraps
    pub columns: usize,
}

impl Default for GridMetrics {
    fn default() -> Self {
        Self {
            cell_width: 8.0,
            line_height: 20.0,
            columns: 80,
        }
    }
}

impl GridMetrics {
    fn columns(&self) -> usize {
        self.columns.max(1)
    }

    fn line_width(&self) -> f32 {
        self.columns() as f32 * self.cell_width
    }

    /// Row and column of a character index. A caret sitting exactly at a wrap
    /// boundary at the end of the text stays at the end of the previous row.
    fn cell_of(&self, index: usize, total: usize) -> (usize, usize) {
        let cols = self.columns();
        if index > 0 && index == total && index % cols == 0 {
            (index / cols - 1, cols)
        } else {
            (index / cols, index % cols)
        }
    }

    fn rows_for(&self, total: usize) -> usize {
        total.div_ceil(self.columns()).max(1)
    }
}

/// Character span of one element within its line
#[derive(Debug, Clone, Copy)]
struct Span {
    id: ElementId,
    start: usize,
    end: usize,
}

#[derive(Debug, Clone)]
struct GridLine {
    text: Vec<char>,
    spans: Vec<Span>,
}

impl GridLine {
    fn len(&self) -> usize {
        self.text.len()
    }

    fn span(&self, id: ElementId) -> Option<&Span> {
        self.spans.iter().find(|s| s.id == id)
    }
}

/// In-memory [`LayoutOracle`] + [`RenderSink`] over a character grid
#[derive(Debug, Clone, Default)]
pub struct GridHost {
    metrics: GridMetrics,
    lines: HashMap<ElementId, GridLine>,
    /// element id -> owning view line
    owners: HashMap<ElementId, ElementId>,
    /// Materialized lines and their content-space rectangles
    placed: HashMap<ElementId, Rect>,
    /// Extra height contributed by embedded content such as images
    extra_heights: HashMap<ElementId, f32>,
}

impl GridHost {
    pub fn new(metrics: GridMetrics) -> Self {
        Self {
            metrics,
            ..Default::default()
        }
    }

    pub fn metrics(&self) -> GridMetrics {
        self.metrics
    }

    /// Change the wrap width. Line heights change with it, so callers must
    /// report a resize for every line afterwards.
    pub fn set_columns(&mut self, columns: usize) {
        self.metrics.columns = columns;
    }

    /// Give an element extra vertical space below its line's text, the way an
    /// image grows once it has loaded
    pub fn set_extra_height(&mut self, element: ElementId, height: f32) {
        if height <= 0.0 {
            self.extra_heights.remove(&element);
        } else {
            self.extra_heights.insert(element, height);
        }
    }

    pub fn is_materialized(&self, view_line: ElementId) -> bool {
        self.placed.contains_key(&view_line)
    }

    /// Materialized lines sorted top to bottom
    pub fn materialized(&self) -> Vec<(ElementId, Rect)> {
        let mut lines: Vec<_> = self.placed.iter().map(|(id, rect)| (*id, *rect)).collect();
        lines.sort_by(|a, b| a.1.y.total_cmp(&b.1.y));
        lines
    }

    /// Wrapped text rows of a rendered line
    pub fn rows(&self, view_line: ElementId) -> Option<Vec<String>> {
        let line = self.lines.get(&view_line)?;
        let cols = self.metrics.columns();
        if line.text.is_empty() {
            return Some(vec![String::new()]);
        }
        Some(line.text.chunks(cols).map(|c| c.iter().collect()).collect())
    }

    fn line_height_of(&self, line: &GridLine) -> f32 {
        let extra: f32 = line
            .spans
            .iter()
            .filter_map(|s| self.extra_heights.get(&s.id))
            .sum();
        self.metrics.rows_for(line.len()) as f32 * self.metrics.line_height + extra
    }

    fn owning_line(&self, element: ElementId) -> Result<(ElementId, &GridLine), OracleError> {
        let view_line = *self
            .owners
            .get(&element)
            .ok_or(OracleError::NoGeometry(element))?;
        let line = self
            .lines
            .get(&view_line)
            .ok_or(OracleError::NoGeometry(element))?;
        Ok((view_line, line))
    }

    fn placed_rect(&self, view_line: ElementId, element: ElementId) -> Result<Rect, OracleError> {
        self.placed
            .get(&view_line)
            .copied()
            .ok_or(OracleError::NotMaterialized(element))
    }

    /// Caret rectangle for a character index within a placed line
    fn caret_at(&self, origin: Rect, line: &GridLine, index: usize) -> Rect {
        let (row, col) = self.metrics.cell_of(index, line.len());
        Rect::new(
            origin.x + col as f32 * self.metrics.cell_width,
            origin.y + row as f32 * self.metrics.line_height,
            0.0,
            self.metrics.line_height,
        )
    }
}

impl LayoutOracle for GridHost {
    fn measure_caret(&self, element: ElementId, offset: usize) -> Result<Rect, OracleError> {
        let (view_line, line) = self.owning_line(element)?;
        let origin = self.placed_rect(view_line, element)?;
        let span = line.span(element).ok_or(OracleError::NoGeometry(element))?;
        let index = (span.start + offset).min(span.end);
        Ok(self.caret_at(origin, line, index))
    }

    fn hit_test(&self, point: Point) -> Result<Position, OracleError> {
        let (view_line, origin) = self
            .placed
            .iter()
            .find(|(_, rect)| rect.contains(point))
            .map(|(id, rect)| (*id, *rect))
            .ok_or(OracleError::NoHit {
                x: point.x,
                y: point.y,
            })?;
        let line = self
            .lines
            .get(&view_line)
            .ok_or(OracleError::NoGeometry(view_line))?;

        let m = self.metrics;
        let rows = m.rows_for(line.len());
        let row = (((point.y - origin.y) / m.line_height).floor().max(0.0) as usize).min(rows - 1);
        let col = (((point.x - origin.x) / m.cell_width).round().max(0.0) as usize).min(m.columns());
        let index = (row * m.columns() + col).min(line.len());

        // Prefer the element that actually holds text at this boundary
        let span = line
            .spans
            .iter()
            .find(|s| s.end > s.start && s.start <= index && index <= s.end)
            .or_else(|| {
                line.spans
                    .iter()
                    .rev()
                    .find(|s| s.start <= index && index <= s.end)
            })
            .ok_or(OracleError::NoGeometry(view_line))?;

        Ok(Position::new(span.id, index - span.start))
    }

    fn measure_element(&self, element: ElementId) -> Result<Size, OracleError> {
        if let Some(line) = self.lines.get(&element) {
            return Ok(Size::new(
                self.metrics.line_width(),
                self.line_height_of(line),
            ));
        }
        let (view_line, line) = self.owning_line(element)?;
        let origin = Rect::new(0.0, 0.0, self.metrics.line_width(), 0.0);
        let rect = span_rect(self.metrics, origin, line, element)
            .ok_or(OracleError::NoGeometry(view_line))?;
        Ok(Size::new(rect.width, rect.height))
    }

    fn element_rect(&self, element: ElementId) -> Result<Rect, OracleError> {
        let (view_line, line) = self.owning_line(element)?;
        let origin = self.placed_rect(view_line, element)?;
        if view_line == element {
            return Ok(Rect::new(
                origin.x,
                origin.y,
                origin.width,
                self.line_height_of(line),
            ));
        }
        span_rect(self.metrics, origin, line, element).ok_or(OracleError::NoGeometry(element))
    }
}

/// Bounding box of an element's characters. Spans covering more than one row
/// take the full line width.
fn span_rect(metrics: GridMetrics, origin: Rect, line: &GridLine, element: ElementId) -> Option<Rect> {
    let span = line.span(element)?;
    let (start_row, start_col) = metrics.cell_of(span.start, line.len());
    let (end_row, end_col) = metrics.cell_of(span.end, line.len());
    let y = origin.y + start_row as f32 * metrics.line_height;
    let height = (end_row - start_row + 1) as f32 * metrics.line_height;
    if start_row == end_row {
        Some(Rect::new(
            origin.x + start_col as f32 * metrics.cell_width,
            y,
            (end_col - start_col) as f32 * metrics.cell_width,
            height,
        ))
    } else {
        Some(Rect::new(origin.x, y, metrics.line_width(), height))
    }
}

impl RenderSink for GridHost {
    fn render_view_line(&mut self, view_line: &ViewLine<'_>) {
        let mut text = Vec::new();
        let mut spans = Vec::with_capacity(view_line.elements.len());
        for element in &view_line.elements {
            let start = text.len();
            text.extend(element.content().chars());
            spans.push(Span {
                id: element.id(),
                start,
                end: text.len(),
            });
        }

        if let Some(old) = self.lines.get(&view_line.id) {
            for span in &old.spans {
                self.owners.remove(&span.id);
            }
        }
        for span in &spans {
            self.owners.insert(span.id, view_line.id);
        }
        self.lines.insert(view_line.id, GridLine { text, spans });
    }

    fn remove_view_line(&mut self, id: ElementId) {
        if let Some(line) = self.lines.remove(&id) {
            for span in &line.spans {
                // A moved element may already belong to a newer line
                if self.owners.get(&span.id) == Some(&id) {
                    self.owners.remove(&span.id);
                }
            }
        }
        self.placed.remove(&id);
    }

    fn materialize(&mut self, lines: &[RenderedElement]) {
        self.placed.clear();
        for entry in lines {
            if self.lines.contains_key(&entry.id) {
                self.placed.insert(entry.id, entry.rect());
            }
        }
        log::trace!("materialized {} view lines", self.placed.len());
    }
}
