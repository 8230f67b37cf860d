use crate::error::{EditorError, StructureError};
use crate::geometry::{Rect, Size};
use crate::host::LayoutOracle;
use crate::layout::VirtualWindow;
use crate::schema::{Behavior, ElementId, SchemaDiff};

/// Tracked geometry of one view line in content space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderedElement {
    pub id: ElementId,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    /// Row height inside this line, for caret bands
    pub line_height: f32,
}

impl RenderedElement {
    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }
}

/// Measured change, resolved before anything is mutated
enum Step {
    Add {
        id: ElementId,
        reference: Option<ElementId>,
        size: Size,
    },
    Update {
        id: ElementId,
        size: Size,
    },
    Delete {
        id: ElementId,
    },
}

/// Ordered table of view-line geometry
///
/// Entries are kept in document order with strictly increasing `y`, exactly
/// `gap` apart: `entries[i + 1].y == entries[i].y + entries[i].height + gap`.
/// `last_top` is where the next appended line would start minus `gap`, i.e.
/// the bottom of the last entry (or zero when empty).
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutTable {
    entries: Vec<RenderedElement>,
    last_top: f32,
    gap: f32,
    line_height: f32,
}

impl LayoutTable {
    pub fn new(gap: f32, line_height: f32) -> Self {
        Self {
            entries: Vec::new(),
            last_top: 0.0,
            gap,
            line_height,
        }
    }

    pub fn entries(&self) -> &[RenderedElement] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn gap(&self) -> f32 {
        self.gap
    }

    pub fn line_height(&self) -> f32 {
        self.line_height
    }

    pub fn last_top(&self) -> f32 {
        self.last_top
    }

    /// Total scrollable height including the trailing gap
    pub fn content_height(&self) -> f32 {
        self.last_top + self.gap
    }

    pub fn index_of(&self, id: ElementId) -> Option<usize> {
        self.entries.iter().position(|e| e.id == id)
    }

    pub fn get(&self, id: ElementId) -> Option<&RenderedElement> {
        self.entries.iter().find(|e| e.id == id)
    }

    pub fn entry(&self, id: ElementId) -> Result<&RenderedElement, StructureError> {
        self.get(id).ok_or(StructureError::MissingViewLine(id))
    }

    /// Apply a schema diff, measuring added and updated lines through `oracle`
    ///
    /// Every entry is validated and measured first, so a diff that references
    /// a missing view line or fails to measure leaves the table untouched.
    pub fn apply<O: LayoutOracle + ?Sized>(
        &mut self,
        diff: &SchemaDiff,
        oracle: &O,
    ) -> Result<(), EditorError> {
        let steps = self.plan(diff, oracle)?;
        for step in steps {
            match step {
                Step::Delete { id } => {
                    self.delete(id)?;
                }
                Step::Add {
                    id,
                    reference,
                    size,
                } => self.add(id, reference, size),
                Step::Update { id, size } => {
                    self.update(id, size)?;
                }
            }
        }
        log::debug!(
            "applied {} layout changes, {} lines, last_top {}",
            diff.len(),
            self.entries.len(),
            self.last_top
        );
        Ok(())
    }

    fn plan<O: LayoutOracle + ?Sized>(
        &self,
        diff: &SchemaDiff,
        oracle: &O,
    ) -> Result<Vec<Step>, EditorError> {
        // Presence as it will be after each preceding step
        let mut present: Vec<ElementId> = self.entries.iter().map(|e| e.id).collect();
        let mut steps = Vec::with_capacity(diff.len());

        for change in diff {
            let id = change.view_line;
            match change.behavior {
                Behavior::Delete => {
                    let index = present
                        .iter()
                        .position(|p| *p == id)
                        .ok_or(StructureError::MissingViewLine(id))?;
                    present.remove(index);
                    steps.push(Step::Delete { id });
                }
                Behavior::Add => {
                    let size = oracle.measure_element(id)?;
                    present.push(id);
                    steps.push(Step::Add {
                        id,
                        reference: change.reference,
                        size,
                    });
                }
                Behavior::Update => {
                    if !present.contains(&id) {
                        return Err(StructureError::MissingViewLine(id).into());
                    }
                    let size = oracle.measure_element(id)?;
                    steps.push(Step::Update { id, size });
                }
            }
        }
        Ok(steps)
    }

    /// Insert a measured line after `reference`
    ///
    /// `None` makes it the first line. A reference that is not in the table
    /// appends at the end.
    pub fn add(&mut self, id: ElementId, reference: Option<ElementId>, size: Size) {
        let shift = size.height + self.gap;
        let (index, y) = match reference {
            None => (0, self.gap),
            Some(reference) => match self.index_of(reference) {
                Some(i) => (i + 1, self.entries[i].bottom() + self.gap),
                None => (self.entries.len(), self.last_top + self.gap),
            },
        };

        for entry in &mut self.entries[index..] {
            entry.y += shift;
        }
        self.entries.insert(
            index,
            RenderedElement {
                id,
                x: 0.0,
                y,
                width: size.width,
                height: size.height,
                line_height: self.line_height,
            },
        );
        self.last_top += shift;
    }

    /// Re-measure a line in place, shifting everything below by the height change
    pub fn update(&mut self, id: ElementId, size: Size) -> Result<f32, StructureError> {
        let index = self
            .index_of(id)
            .ok_or(StructureError::MissingViewLine(id))?;
        let delta = size.height - self.entries[index].height;
        self.entries[index].height = size.height;
        self.entries[index].width = size.width;
        if delta != 0.0 {
            for entry in &mut self.entries[index + 1..] {
                entry.y += delta;
            }
            self.last_top += delta;
        }
        Ok(delta)
    }

    /// Asynchronous size change of an already laid out line
    pub fn resize(&mut self, id: ElementId, size: Size) -> Result<f32, StructureError> {
        self.update(id, size)
    }

    pub fn delete(&mut self, id: ElementId) -> Result<RenderedElement, StructureError> {
        let index = self
            .index_of(id)
            .ok_or(StructureError::MissingViewLine(id))?;
        let removed = self.entries.remove(index);
        let shift = removed.height + self.gap;
        for entry in &mut self.entries[index..] {
            entry.y -= shift;
        }
        self.last_top -= shift;
        Ok(removed)
    }

    /// Lines to materialize for a viewport at `scroll_y` of `height`
    ///
    /// Finds the first line starting at or below the viewport top and the
    /// last line starting at or above its bottom, then widens by `buffer`
    /// lines each side. The buffer also covers a tall line that starts above
    /// the viewport and fills it.
    pub fn window(&self, scroll_y: f32, height: f32, buffer: usize) -> VirtualWindow {
        let len = self.entries.len();
        if len == 0 {
            return VirtualWindow::default();
        }
        let first = self
            .entries
            .partition_point(|e| e.y < scroll_y)
            .min(len - 1);
        let last = self
            .entries
            .partition_point(|e| e.y <= scroll_y + height)
            .saturating_sub(1);

        let end = (last.max(first) + 1 + buffer).min(len);
        let start = first.saturating_sub(buffer).min(end);
        VirtualWindow::new(start, end)
    }

    /// Line whose vertical band contains `y`
    ///
    /// Each band extends half a gap above and below its line and bands are
    /// half-open, so a `y` exactly on the boundary between two lines belongs
    /// to the lower one. Anything above the first band resolves to the first
    /// line, anything below the last to the last.
    pub fn line_at(&self, y: f32) -> Option<&RenderedElement> {
        let half_gap = self.gap / 2.0;
        let first = self.entries.first()?;
        let last = self.entries.last()?;
        if y < first.y - half_gap {
            return Some(first);
        }
        if y >= self.last_top + half_gap {
            return Some(last);
        }
        let index = self
            .entries
            .partition_point(|e| e.bottom() + half_gap <= y)
            .min(self.entries.len() - 1);
        Some(&self.entries[index])
    }
}
