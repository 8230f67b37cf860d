use crate::editing::{Position, RangeId, SelectionRange};
use crate::error::{EditorError, Result, StructureError};
use crate::geometry::{Point, Rect};
use crate::host::LayoutOracle;
use crate::layout::LayoutContext;
use crate::schema::{ElementId, SchemaStore};

/// The set of selection ranges plus the one currently being edited
///
/// Ranges keep insertion order. Adding a range always makes it current.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    ranges: Vec<SelectionRange>,
    current: Option<RangeId>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ranges(&self) -> &[SelectionRange] {
        &self.ranges
    }

    pub fn ids(&self) -> Vec<RangeId> {
        self.ranges.iter().map(|r| r.id()).collect()
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    pub fn get(&self, id: RangeId) -> Option<&SelectionRange> {
        self.ranges.iter().find(|r| r.id() == id)
    }

    pub fn get_mut(&mut self, id: RangeId) -> Option<&mut SelectionRange> {
        self.ranges.iter_mut().find(|r| r.id() == id)
    }

    pub fn current_id(&self) -> Option<RangeId> {
        self.current
    }

    pub fn current_range(&self) -> Option<&SelectionRange> {
        self.current.and_then(|id| self.get(id))
    }

    pub fn current_range_mut(&mut self) -> Option<&mut SelectionRange> {
        let id = self.current?;
        self.get_mut(id)
    }

    /// Register a new range and make it current. Without a focus it is a caret.
    pub fn add_range(&mut self, anchor: Position, focus: Option<Position>) -> RangeId {
        self.insert_range(SelectionRange::new(anchor, focus.unwrap_or(anchor)))
    }

    /// Register an existing range (keeping its id) and make it current
    pub fn insert_range(&mut self, range: SelectionRange) -> RangeId {
        let id = range.id();
        self.ranges.retain(|r| r.id() != id);
        self.ranges.push(range);
        self.current = Some(id);
        id
    }

    /// Make an existing range current
    pub fn set_current(&mut self, id: RangeId) -> bool {
        if self.get(id).is_some() {
            self.current = Some(id);
            true
        } else {
            false
        }
    }

    /// Replace both endpoints of the current range
    pub fn set_range(&mut self, anchor: Position, focus: Position) -> Result<()> {
        let range = self.current_range_mut().ok_or(EditorError::NoCurrentRange)?;
        range.set_range(anchor, focus);
        Ok(())
    }

    /// Move the focus of the current range
    pub fn set_end(&mut self, focus: Position) -> Result<()> {
        let range = self.current_range_mut().ok_or(EditorError::NoCurrentRange)?;
        range.set_end(focus);
        Ok(())
    }

    /// Remove one range. Removing the current range leaves no current range.
    pub fn remove_range(&mut self, id: RangeId) -> Option<SelectionRange> {
        let index = self.ranges.iter().position(|r| r.id() == id)?;
        if self.current == Some(id) {
            self.current = None;
        }
        Some(self.ranges.remove(index))
    }

    /// Leave every range in place but none current
    pub fn clear_current(&mut self) {
        self.current = None;
    }

    /// Drop ranges with the same endpoints as an earlier one, keeping the
    /// current range when it is one of the duplicates
    pub fn dedup(&mut self) {
        let mut kept: Vec<SelectionRange> = Vec::with_capacity(self.ranges.len());
        for range in self.ranges.drain(..) {
            let same = |r: &SelectionRange| r.anchor() == range.anchor() && r.focus() == range.focus();
            match kept.iter().position(same) {
                Some(i) if Some(range.id()) == self.current => kept[i] = range,
                Some(_) => {}
                None => kept.push(range),
            }
        }
        self.ranges = kept;
    }

    pub fn remove_all_ranges(&mut self) {
        self.ranges.clear();
        self.current = None;
    }

    /// A plain caret: exactly one range and it is collapsed
    pub fn is_only_one_collapsed_range(&self) -> bool {
        self.ranges.len() == 1 && self.ranges[0].is_collapsed()
    }

    /// View line holding the focus of the current range
    pub fn focus_view_line(&self, store: &SchemaStore) -> Option<ElementId> {
        let focus = self.current_range()?.focus();
        store.get(focus.block).map(|e| e.view_line_id())
    }

    /// Replace every range with one covering the whole document
    pub fn select_all(&mut self, store: &SchemaStore) -> Result<RangeId> {
        let first = store.first().ok_or(EditorError::EmptyDocument)?;
        let last = store.last().ok_or(EditorError::EmptyDocument)?;
        let anchor = Position::new(first.id(), 0);
        let focus = Position::new(last.id(), last.char_len());
        self.remove_all_ranges();
        Ok(self.add_range(anchor, Some(focus)))
    }

    /// Rewrite every endpoint through `map`, e.g. after an edit moved text
    pub fn remap(&mut self, map: impl Fn(Position) -> Position) {
        for range in &mut self.ranges {
            range.set_range(map(range.anchor()), map(range.focus()));
        }
    }

    /// Highlight rectangles of one range
    pub fn rects<O: LayoutOracle + ?Sized>(
        &self,
        id: RangeId,
        ctx: &LayoutContext<'_, O>,
    ) -> Result<Vec<Rect>, StructureError> {
        match self.get(id) {
            Some(range) => ctx.project(&range.physics_range(ctx.store)),
            None => Ok(Vec::new()),
        }
    }

    /// Range whose highlight contains `point`, checking the current range first
    pub fn range_at<O: LayoutOracle + ?Sized>(
        &self,
        point: Point,
        ctx: &LayoutContext<'_, O>,
    ) -> Result<Option<RangeId>, StructureError> {
        let current = self.current.into_iter();
        let others = self.ranges.iter().map(|r| r.id()).filter(|id| Some(*id) != self.current);
        for id in current.chain(others) {
            if self.rects(id, ctx)?.iter().any(|r| r.contains(point)) {
                return Ok(Some(id));
            }
        }
        Ok(None)
    }

    /// Non-current ranges overlapping the current one by more than `threshold`
    pub fn intersecting<O: LayoutOracle + ?Sized>(
        &self,
        ctx: &LayoutContext<'_, O>,
        threshold: f32,
    ) -> Result<Vec<RangeId>, StructureError> {
        let Some(current) = self.current else {
            return Ok(Vec::new());
        };
        let current_rects = self.rects(current, ctx)?;
        if current_rects.is_empty() {
            return Ok(Vec::new());
        }

        let mut hits = Vec::new();
        for range in self.ranges.iter().filter(|r| r.id() != current) {
            let rects = self.rects(range.id(), ctx)?;
            if rects_intersect(&current_rects, &rects, threshold) {
                hits.push(range.id());
            }
        }
        Ok(hits)
    }

    /// Drop every range that overlaps the current one; returns what was removed
    pub fn remove_intersecting<O: LayoutOracle + ?Sized>(
        &mut self,
        ctx: &LayoutContext<'_, O>,
        threshold: f32,
    ) -> Result<Vec<RangeId>, StructureError> {
        let hits = self.intersecting(ctx, threshold)?;
        for id in &hits {
            log::debug!("removing range {id}: overlaps the current range");
            self.remove_range(*id);
        }
        Ok(hits)
    }
}

/// True when any rectangle of `a` overlaps any of `b` by more than `threshold`
pub fn rects_intersect(a: &[Rect], b: &[Rect], threshold: f32) -> bool {
    a.iter()
        .any(|ra| b.iter().any(|rb| ra.intersection_area(rb) > threshold))
}
