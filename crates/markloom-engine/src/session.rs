//! The editor session: sole owner of the element store, the selection, the
//! layout table and the host.
//!
//! Every mutation goes through a method here and runs to completion before
//! returning. Store commits are pushed to the host and the layout table
//! immediately, so geometry queries made later in the same call already see
//! the new document.

use crate::editing::commands::{break_line, deletion_span, insert_text};
use crate::editing::{
    Cmd, Direction, Edit, History, Position, RangeId, Selection, SelectionRange, Snapshot,
    collapse, get_end_by, scroll_into_view,
};
use crate::error::{EditorError, Result, StructureError};
use crate::events::{EditorEvent, EventBus};
use crate::geometry::{Point, Rect, ScrollDelta, Size};
use crate::host::{Host, ViewLine};
use crate::layout::{LayoutContext, LayoutTable, VirtualWindow};
use crate::schema::{
    Behavior, ElementId, ElementKind, SchemaDiff, SchemaElement, SchemaStore, Transaction,
};
use crate::settings::EditorSettings;

/// Modifier keys held during a pointer or keyboard event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
    pub alt: bool,
    pub shift: bool,
    pub ctrl: bool,
}

impl Modifiers {
    pub const NONE: Self = Self {
        alt: false,
        shift: false,
        ctrl: false,
    };
    pub const ALT: Self = Self {
        alt: true,
        ..Self::NONE
    };
    pub const SHIFT: Self = Self {
        shift: true,
        ..Self::NONE
    };
    pub const CTRL: Self = Self {
        ctrl: true,
        ..Self::NONE
    };
    pub const CTRL_SHIFT: Self = Self {
        ctrl: true,
        shift: true,
        alt: false,
    };
    pub const ALT_SHIFT: Self = Self {
        alt: true,
        shift: true,
        ctrl: false,
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrowKey {
    Up,
    Down,
    Left,
    Right,
}

impl ArrowKey {
    /// Move used with Ctrl held
    fn jump(self) -> Direction {
        match self {
            ArrowKey::Up => Direction::First,
            ArrowKey::Right => Direction::LineEnd,
            ArrowKey::Down => Direction::End,
            ArrowKey::Left => Direction::LineStart,
        }
    }

    /// Move used without Ctrl
    fn step(self) -> Direction {
        match self {
            ArrowKey::Up => Direction::PrevLine,
            ArrowKey::Right => Direction::Next,
            ArrowKey::Down => Direction::NextLine,
            ArrowKey::Left => Direction::Prev,
        }
    }
}

pub struct EditorSession<H> {
    settings: EditorSettings,
    store: SchemaStore,
    selection: Selection,
    layout: LayoutTable,
    history: History,
    bus: EventBus,
    host: H,
    scroll: Point,
    window: VirtualWindow,
    dragging: bool,
    reanchor_on_drag: bool,
}

impl<H: Host> EditorSession<H> {
    pub fn new(host: H, settings: EditorSettings) -> Self {
        Self {
            layout: LayoutTable::new(settings.gap, settings.line_height),
            history: History::new(settings.history_limit),
            settings,
            store: SchemaStore::new(),
            selection: Selection::new(),
            bus: EventBus::new(),
            host,
            scroll: Point::default(),
            window: VirtualWindow::default(),
            dragging: false,
            reanchor_on_drag: false,
        }
    }

    // ============ Accessors ============

    pub fn settings(&self) -> &EditorSettings {
        &self.settings
    }

    pub fn store(&self) -> &SchemaStore {
        &self.store
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn layout(&self) -> &LayoutTable {
        &self.layout
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    /// Mutable host access for host-side changes (wrap width, media size).
    /// Follow with [`relayout`](Self::relayout) or
    /// [`element_resized`](Self::element_resized).
    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn events(&mut self) -> &mut EventBus {
        &mut self.bus
    }

    pub fn scroll(&self) -> Point {
        self.scroll
    }

    pub fn window(&self) -> VirtualWindow {
        self.window
    }

    /// Whole document, one view line per text line
    pub fn text(&self) -> String {
        self.store
            .view_lines()
            .map(|line| self.store.view_line_text(line.id()))
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn ctx(&self) -> LayoutContext<'_, H> {
        LayoutContext::new(&self.store, &self.layout, &self.host)
    }

    // ============ Document ============

    pub fn create_element(
        &mut self,
        kind: ElementKind,
        parent: Option<ElementId>,
        content: impl Into<String>,
    ) -> SchemaElement {
        self.store.create_element(kind, parent, content)
    }

    /// Replace the whole document, dropping ranges and history
    pub fn load(&mut self, elements: Vec<SchemaElement>) -> Result<SchemaDiff> {
        let diff = self.store.splice(0, self.store.len(), elements)?;
        self.publish(&diff)?;
        self.history.clear();
        self.selection.remove_all_ranges();
        self.emit_selection();
        log::info!(
            "loaded {} elements in {} view lines",
            self.store.len(),
            self.layout.len()
        );
        Ok(diff)
    }

    pub fn splice(
        &mut self,
        index: usize,
        remove_count: usize,
        elements: Vec<SchemaElement>,
    ) -> Result<SchemaDiff> {
        let diff = self.store.splice(index, remove_count, elements)?;
        self.after_external_edit(&diff)?;
        Ok(diff)
    }

    pub fn replace(&mut self, id: ElementId, element: SchemaElement) -> Result<SchemaDiff> {
        let diff = self.store.replace(id, element)?;
        self.after_external_edit(&diff)?;
        Ok(diff)
    }

    pub fn append(&mut self, element: SchemaElement) -> Result<SchemaDiff> {
        let diff = self.store.append(element)?;
        self.after_external_edit(&diff)?;
        Ok(diff)
    }

    pub fn commit(&mut self, tx: Transaction) -> Result<SchemaDiff> {
        let diff = self.store.commit(tx)?;
        self.after_external_edit(&diff)?;
        Ok(diff)
    }

    fn after_external_edit(&mut self, diff: &SchemaDiff) -> Result<()> {
        self.publish(diff)?;
        let stale: Vec<RangeId> = self
            .selection
            .ranges()
            .iter()
            .filter(|r| !self.store.contains(r.anchor().block) || !self.store.contains(r.focus().block))
            .map(|r| r.id())
            .collect();
        if !stale.is_empty() {
            for id in stale {
                self.selection.remove_range(id);
            }
            self.emit_selection();
        }
        Ok(())
    }

    /// Push a committed diff to the host and the layout table
    fn publish(&mut self, diff: &SchemaDiff) -> Result<()> {
        if diff.is_empty() {
            return Ok(());
        }
        for change in diff {
            let id = change.view_line;
            match change.behavior {
                Behavior::Delete => self.host.remove_view_line(id),
                Behavior::Add | Behavior::Update => {
                    let elements = self.store.view_line_run(id);
                    if elements.is_empty() {
                        return Err(StructureError::UnknownElement(id).into());
                    }
                    self.host.render_view_line(&ViewLine { id, elements });
                }
            }
        }
        self.layout.apply(diff, &self.host)?;
        self.bus.emit(EditorEvent::SchemaChanged(diff.clone()));
        self.clamp_scroll();
        self.refresh_window();
        Ok(())
    }

    /// Re-measure one element's view line after a host-side size change
    pub fn element_resized(&mut self, element: ElementId) -> Result<()> {
        let line = self
            .store
            .get(element)
            .ok_or(EditorError::UnknownElement(element))?
            .view_line_id();
        let size = self.host.measure_element(line)?;
        let delta = self.layout.resize(line, size)?;
        self.bus.emit(EditorEvent::ElementResized(element));
        if delta != 0.0 {
            self.clamp_scroll();
            self.refresh_window();
        }
        Ok(())
    }

    /// Re-measure every view line, e.g. after the wrap width changed
    pub fn relayout(&mut self) -> Result<()> {
        let lines: Vec<ElementId> = self.layout.entries().iter().map(|e| e.id).collect();
        for line in lines {
            let size = self.host.measure_element(line)?;
            self.layout.resize(line, size)?;
        }
        self.clamp_scroll();
        self.refresh_window();
        Ok(())
    }

    // ============ Scrolling ============

    pub fn set_viewport(&mut self, viewport: Size) {
        self.settings.viewport = viewport;
        self.clamp_scroll();
        self.refresh_window();
    }

    pub fn max_scroll(&self) -> Point {
        let widest = self
            .layout
            .entries()
            .iter()
            .map(|e| e.rect().right())
            .fold(0.0, f32::max);
        Point::new(
            (widest - self.settings.viewport.width).max(0.0),
            (self.layout.content_height() - self.settings.viewport.height).max(0.0),
        )
    }

    pub fn scroll_to(&mut self, x: f32, y: f32) {
        let max = self.max_scroll();
        let target = Point::new(x.clamp(0.0, max.x), y.clamp(0.0, max.y));
        let moved_vertically = target.y != self.scroll.y;
        self.scroll = target;
        if moved_vertically {
            self.refresh_window();
        }
    }

    pub fn scroll_by(&mut self, delta: ScrollDelta) {
        self.scroll_to(self.scroll.x + delta.dx, self.scroll.y + delta.dy);
    }

    fn clamp_scroll(&mut self) {
        let max = self.max_scroll();
        self.scroll = Point::new(self.scroll.x.clamp(0.0, max.x), self.scroll.y.clamp(0.0, max.y));
    }

    fn refresh_window(&mut self) {
        self.window = self.layout.window(
            self.scroll.y,
            self.settings.viewport.height,
            self.settings.window_buffer,
        );
        self.host
            .materialize(&self.layout.entries()[self.window.range()]);
        self.bus.emit(EditorEvent::RenderRequested(self.window));
    }

    /// Container rectangle in content space
    pub fn visible_rect(&self) -> Rect {
        let size = self.settings.container_size();
        Rect::new(self.scroll.x, self.scroll.y, size.width, size.height)
    }

    /// Viewport coordinates to content coordinates
    pub fn to_content(&self, point: Point) -> Point {
        Point::new(point.x + self.scroll.x, point.y + self.scroll.y)
    }

    /// Document position under a viewport point
    pub fn resolve_point(&self, point: Point) -> Result<Position> {
        self.ctx().resolve_point(self.to_content(point))
    }

    fn request_scroll(&mut self, delta: ScrollDelta) {
        if !delta.is_zero() {
            log::debug!("requesting scroll by ({}, {})", delta.dx, delta.dy);
            self.bus.emit(EditorEvent::ScrollDeltaRequested(delta));
        }
    }

    /// Ask for a scroll when the caret at `position` is outside the container
    fn reveal(&mut self, position: Position) -> Result<()> {
        let visible = self.visible_rect();
        let delta = scroll_into_view(&self.ctx(), position, visible)?;
        if let Some(delta) = delta {
            self.request_scroll(delta);
        }
        Ok(())
    }

    fn scroll_if_current_out_of_view(&mut self) -> Result<()> {
        match self.selection.current_range() {
            Some(range) if range.is_collapsed() => {
                let focus = range.focus();
                self.reveal(focus)
            }
            _ => Ok(()),
        }
    }

    /// Drag-autoscroll when the pointer leaves the container
    fn autoscroll_at_edge(&mut self, point: Point) {
        let container = self.settings.container_size();
        let step = if self.settings.scrollbar_size > 0.0 {
            self.settings.scrollbar_size * 2.0
        } else {
            self.settings.line_height
        };
        let along = |value: f32, extent: f32| {
            if value < 0.0 {
                -step
            } else if value > extent {
                step
            } else {
                0.0
            }
        };
        self.request_scroll(ScrollDelta {
            dx: along(point.x, container.width),
            dy: along(point.y, container.height),
        });
    }

    // ============ Selection ============

    fn checked(&self, position: Position) -> Result<Position> {
        self.store
            .clamp_offset(position.block, position.offset)
            .map(|offset| Position::new(position.block, offset))
            .ok_or(EditorError::UnknownElement(position.block))
    }

    fn emit_selection(&mut self) {
        self.bus
            .emit(EditorEvent::SelectionChanged(self.selection.ids()));
    }

    fn prune_intersections(&mut self) -> Result<()> {
        let ctx = LayoutContext::new(&self.store, &self.layout, &self.host);
        self.selection
            .remove_intersecting(&ctx, self.settings.intersection_threshold)?;
        Ok(())
    }

    /// Add a range (a caret without `focus`) and make it current
    pub fn add_range(&mut self, anchor: Position, focus: Option<Position>) -> Result<RangeId> {
        let anchor = self.checked(anchor)?;
        let focus = focus.map(|f| self.checked(f)).transpose()?;
        let id = self.selection.add_range(anchor, focus);
        self.prune_intersections()?;
        self.emit_selection();
        Ok(id)
    }

    /// Replace both endpoints of the current range
    pub fn set_range(&mut self, anchor: Position, focus: Position) -> Result<()> {
        let (anchor, focus) = (self.checked(anchor)?, self.checked(focus)?);
        self.selection.set_range(anchor, focus)?;
        self.prune_intersections()?;
        self.emit_selection();
        Ok(())
    }

    /// Move the focus of the current range
    pub fn set_end(&mut self, focus: Position) -> Result<()> {
        let focus = self.checked(focus)?;
        self.selection.set_end(focus)?;
        self.prune_intersections()?;
        self.emit_selection();
        Ok(())
    }

    pub fn remove_range(&mut self, id: RangeId) -> bool {
        let removed = self.selection.remove_range(id).is_some();
        if removed {
            self.emit_selection();
        }
        removed
    }

    pub fn remove_all_ranges(&mut self) {
        self.selection.remove_all_ranges();
        self.emit_selection();
    }

    pub fn select_all(&mut self) -> Result<RangeId> {
        let id = self.selection.select_all(&self.store)?;
        self.emit_selection();
        Ok(id)
    }

    /// Destination of moving the current range's focus; requests a scroll if
    /// that destination is out of view. The range itself is not changed.
    pub fn get_end_by(&mut self, direction: Direction) -> Result<Position> {
        let focus = self
            .selection
            .current_range()
            .ok_or(EditorError::NoCurrentRange)?
            .focus();
        let destination = get_end_by(&self.ctx(), focus, direction)?;
        self.reveal(destination)?;
        Ok(destination)
    }

    /// Highlight rectangles of a range, in content space
    pub fn range_rects(&self, id: RangeId) -> Result<Vec<Rect>> {
        Ok(self.selection.rects(id, &self.ctx())?)
    }

    /// Caret rectangle of a range's focus, falling back to the line's tracked
    /// entry when it is not materialized
    pub fn caret_rect(&self, id: RangeId) -> Result<Option<Rect>> {
        let Some(range) = self.selection.get(id) else {
            return Ok(None);
        };
        Ok(Some(self.ctx().caret_or_approximate(range.focus())?))
    }

    /// Range whose highlight contains a viewport point
    pub fn range_at(&self, point: Point) -> Result<Option<RangeId>> {
        Ok(self
            .selection
            .range_at(self.to_content(point), &self.ctx())?)
    }

    // ============ Pointer ============

    pub fn pointer_down(&mut self, point: Point, modifiers: Modifiers) -> Result<()> {
        self.dragging = true;
        self.reanchor_on_drag = false;
        self.autoscroll_at_edge(point);
        let content = self.to_content(point);
        let position = self.ctx().resolve_point(content)?;

        match (modifiers.alt, modifiers.shift) {
            (true, false) => {
                let hit = self.selection.range_at(content, &self.ctx())?;
                match hit {
                    Some(id) if Some(id) == self.selection.current_id() => {
                        self.reanchor_on_drag = true;
                        return Ok(());
                    }
                    Some(id) => {
                        self.dragging = false;
                        self.selection.remove_range(id);
                        self.emit_selection();
                        return Ok(());
                    }
                    None => {
                        self.selection.add_range(position, None);
                    }
                }
            }
            (false, true) => {
                if self.selection.current_range().is_some() {
                    self.selection.set_end(position)?;
                } else {
                    self.selection.add_range(position, None);
                }
            }
            (true, true) => {
                self.selection.add_range(position, None);
            }
            (false, false) => {
                self.selection.remove_all_ranges();
                self.selection.add_range(position, None);
            }
        }

        self.prune_intersections()?;
        self.emit_selection();
        self.scroll_if_current_out_of_view()
    }

    pub fn pointer_move(&mut self, point: Point) -> Result<()> {
        if !self.dragging {
            return Ok(());
        }
        let Some(current) = self.selection.current_range().cloned() else {
            return Ok(());
        };
        self.autoscroll_at_edge(point);
        let position = self.ctx().resolve_point(self.to_content(point))?;

        if self.reanchor_on_drag {
            self.reanchor_on_drag = false;
            self.selection.remove_range(current.id());
            self.selection.add_range(current.anchor(), Some(position));
        } else {
            self.selection.set_end(position)?;
        }
        self.prune_intersections()?;
        self.emit_selection();
        Ok(())
    }

    pub fn pointer_up(&mut self, point: Point) -> Result<()> {
        let was_dragging = std::mem::take(&mut self.dragging);
        if std::mem::take(&mut self.reanchor_on_drag) || !was_dragging {
            return Ok(());
        }
        if self.selection.current_range().is_none() {
            return Ok(());
        }
        let position = self.ctx().resolve_point(self.to_content(point))?;
        self.selection.set_end(position)?;
        self.prune_intersections()?;
        self.emit_selection();
        Ok(())
    }

    // ============ Keyboard ============

    /// Arrow-key movement and selection, applied to every range
    pub fn keyboard_select(&mut self, key: ArrowKey, modifiers: Modifiers) -> Result<()> {
        for id in self.selection.ids() {
            let Some(range) = self.selection.get(id).cloned() else {
                continue;
            };
            let ctx = self.ctx();
            let (anchor, focus) = match (modifiers.ctrl, modifiers.shift) {
                (true, false) => {
                    let to = get_end_by(&ctx, range.focus(), key.jump())?;
                    (to, to)
                }
                (false, true) => (range.anchor(), get_end_by(&ctx, range.focus(), key.step())?),
                (true, true) => (range.anchor(), get_end_by(&ctx, range.focus(), key.jump())?),
                (false, false) if range.is_collapsed() => {
                    let to = get_end_by(&ctx, range.focus(), key.step())?;
                    (to, to)
                }
                (false, false) => {
                    let physics = range.physics_range(&self.store);
                    let to = match key {
                        ArrowKey::Left => physics.anchor,
                        ArrowKey::Right => physics.focus,
                        ArrowKey::Up | ArrowKey::Down => {
                            get_end_by(&ctx, range.focus(), key.step())?
                        }
                    };
                    (to, to)
                }
            };
            if let Some(range) = self.selection.get_mut(id) {
                range.set_range(anchor, focus);
            }
            if Some(id) == self.selection.current_id() {
                self.reveal(focus)?;
            }
        }
        self.prune_intersections()?;
        self.emit_selection();
        Ok(())
    }

    // ============ Commands ============

    /// Delete the current range's text, leaving a caret
    pub fn collapse(&mut self) -> Result<()> {
        let current = self.selection.current_id().ok_or(EditorError::NoCurrentRange)?;
        self.run_command("collapse", |session| {
            session.edit_range(current, |store, range| collapse(store, range))
        })
    }

    /// Apply a command to every range as one undo step
    pub fn apply(&mut self, cmd: Cmd) -> Result<()> {
        log::debug!("apply {} to {} ranges", cmd.name(), self.selection.len());
        self.run_command(cmd.name(), |session| session.apply_each(&cmd))
    }

    /// Run `command` all-or-nothing: a failure on any range puts the document
    /// and ranges back as they were and records no history
    fn run_command<F>(&mut self, label: &'static str, command: F) -> Result<()>
    where
        F: FnOnce(&mut Self) -> Result<()>,
    {
        let before = self.snapshot();
        if let Err(err) = command(self) {
            log::warn!("{label} failed, rolling back: {err}");
            self.restore(before)?;
            return Err(err);
        }
        self.finish_command(label, before);
        Ok(())
    }

    fn apply_each(&mut self, cmd: &Cmd) -> Result<()> {
        match cmd {
            Cmd::DeleteSelection => self.edit_each(collapse),
            Cmd::DeleteBackward => self.edit_each(|store, range| delete_one(store, range, false)),
            Cmd::DeleteForward => self.edit_each(|store, range| delete_one(store, range, true)),
            Cmd::InsertText(text) => {
                self.edit_each(collapse)?;
                for (i, part) in text.split('\n').enumerate() {
                    if i > 0 {
                        self.edit_each(|store, range| break_line(store, range.focus()).map(Some))?;
                    }
                    if !part.is_empty() {
                        self.edit_each(|store, range| {
                            insert_text(store, range.focus(), part).map(Some)
                        })?;
                    }
                }
                Ok(())
            }
            Cmd::BreakLine => {
                self.edit_each(collapse)?;
                self.edit_each(|store, range| break_line(store, range.focus()).map(Some))
            }
        }
    }

    fn edit_each<F>(&mut self, mut edit: F) -> Result<()>
    where
        F: FnMut(&mut SchemaStore, &SelectionRange) -> Result<Option<Edit>>,
    {
        for id in self.selection.ids() {
            self.edit_range(id, &mut edit)?;
        }
        self.selection.dedup();
        Ok(())
    }

    /// Run one edit for one range, then carry every range across it
    fn edit_range<F>(&mut self, id: RangeId, mut edit: F) -> Result<()>
    where
        F: FnMut(&mut SchemaStore, &SelectionRange) -> Result<Option<Edit>>,
    {
        let Some(range) = self.selection.get(id).cloned() else {
            return Ok(());
        };
        let Some(outcome) = edit(&mut self.store, &range)? else {
            return Ok(());
        };
        self.publish(&outcome.diff)?;
        self.selection.remap(|p| outcome.map(p));
        if let Some(range) = self.selection.get_mut(id) {
            range.set_range(outcome.caret, outcome.caret);
        }
        Ok(())
    }

    fn finish_command(&mut self, label: &'static str, before: Snapshot) {
        if let Err(err) = self.prune_intersections() {
            log::warn!("skipping overlap check after {label}: {err}");
        }
        let after = self.snapshot();
        self.history.record(label, before, after);
        self.emit_selection();
        if let Err(err) = self.scroll_if_current_out_of_view() {
            log::warn!("skipping scroll check after {label}: {err}");
        }
    }

    // ============ History ============

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            elements: self.store.snapshot(),
            ranges: self.selection.ranges().to_vec(),
            current: self.selection.current_id(),
        }
    }

    pub fn undo(&mut self) -> Result<()> {
        let snapshot = self
            .history
            .undo()
            .cloned()
            .ok_or(EditorError::NothingToUndo)?;
        self.restore(snapshot)
    }

    pub fn redo(&mut self) -> Result<()> {
        let snapshot = self
            .history
            .redo()
            .cloned()
            .ok_or(EditorError::NothingToRedo)?;
        self.restore(snapshot)
    }

    fn restore(&mut self, snapshot: Snapshot) -> Result<()> {
        let diff = self.store.splice(0, self.store.len(), snapshot.elements)?;
        self.publish(&diff)?;
        self.selection.remove_all_ranges();
        for range in snapshot.ranges {
            self.selection.insert_range(range);
        }
        match snapshot.current {
            Some(current) => {
                self.selection.set_current(current);
            }
            None => self.selection.clear_current(),
        }
        self.emit_selection();
        Ok(())
    }
}

/// Backspace/Delete for one range: the selection if any, else one character
fn delete_one(
    store: &mut SchemaStore,
    range: &SelectionRange,
    forward: bool,
) -> Result<Option<Edit>> {
    if !range.is_collapsed() {
        return collapse(store, range);
    }
    match deletion_span(store, range.focus(), forward)? {
        Some((start, end)) => collapse(store, &SelectionRange::new(start, end)),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{GridHost, GridMetrics};
    use pretty_assertions::assert_eq;

    fn session(lines: &[&str]) -> EditorSession<GridHost> {
        let host = GridHost::new(GridMetrics {
            cell_width: 10.0,
            line_height: 20.0,
            columns: 20,
        });
        let settings = EditorSettings {
            gap: 10.0,
            line_height: 20.0,
            scrollbar_size: 0.0,
            container_padding: 0.0,
            viewport: Size::new(200.0, 100.0),
            ..Default::default()
        };
        let mut session = EditorSession::new(host, settings);
        let mut elements = Vec::new();
        for line in lines {
            let p = session.create_element(ElementKind::Paragraph, None, "");
            let t = session.create_element(ElementKind::PlainText, Some(p.id()), *line);
            elements.push(p);
            elements.push(t);
        }
        session.load(elements).unwrap();
        session
    }

    /// Text element of line `i`
    fn text_el(session: &EditorSession<GridHost>, i: usize) -> ElementId {
        session.store().at(i * 2 + 1).unwrap().id()
    }

    #[test]
    fn test_load_lays_out_every_line() {
        let s = session(&["one", "two", "three"]);
        let ys: Vec<f32> = s.layout().entries().iter().map(|e| e.y).collect();
        assert_eq!(ys, vec![10.0, 40.0, 70.0]);
        assert_eq!(s.text(), "one\ntwo\nthree");
    }

    #[test]
    fn test_unknown_element_is_rejected() {
        let mut s = session(&["one"]);
        let ghost = ElementId::from_raw(999);
        assert_eq!(
            s.add_range(Position::new(ghost, 0), None),
            Err(EditorError::UnknownElement(ghost))
        );
    }

    #[test]
    fn test_offsets_are_clamped() {
        let mut s = session(&["one"]);
        let t = text_el(&s, 0);
        let id = s.add_range(Position::new(t, 50), None).unwrap();
        assert_eq!(s.selection().get(id).unwrap().focus(), Position::new(t, 3));
    }

    #[test]
    fn test_scroll_is_clamped_to_content() {
        let mut s = session(&["a", "b", "c", "d", "e", "f"]);
        // six lines: last_top = 6 * 30 = 180, content height 190, viewport 100
        s.scroll_to(0.0, 1000.0);
        assert_eq!(s.scroll().y, 90.0);
        s.scroll_by(ScrollDelta { dx: 0.0, dy: -500.0 });
        assert_eq!(s.scroll().y, 0.0);
    }

    #[test]
    fn test_external_splice_drops_stale_ranges() {
        let mut s = session(&["one", "two"]);
        let t = text_el(&s, 1);
        s.add_range(Position::new(t, 1), None).unwrap();
        s.splice(2, 2, Vec::new()).unwrap();
        assert!(s.selection().is_empty());
        assert_eq!(s.text(), "one");
    }

    #[test]
    fn test_collapse_without_range() {
        let mut s = session(&["one"]);
        assert_eq!(s.collapse(), Err(EditorError::NoCurrentRange));
    }

    #[test]
    fn test_failed_command_rolls_back_every_range() {
        let mut s = session(&["one", "two"]);
        let (t1, t2) = (text_el(&s, 0), text_el(&s, 1));
        s.add_range(Position::new(t1, 3), None).unwrap();
        s.add_range(Position::new(t2, 3), None).unwrap();
        let ranges = s.selection().ranges().to_vec();

        let result = s.run_command("insert", |session| {
            session.edit_each(|store, range| {
                if range.focus().block == t2 {
                    return Err(EditorError::NoCurrentRange);
                }
                insert_text(store, range.focus(), "!").map(Some)
            })
        });

        assert_eq!(result, Err(EditorError::NoCurrentRange));
        assert_eq!(s.text(), "one\ntwo");
        assert_eq!(s.selection().ranges(), ranges.as_slice());
        assert_eq!(s.undo(), Err(EditorError::NothingToUndo));
    }

    #[test]
    fn test_command_over_many_ranges_is_one_undo_step() {
        let mut s = session(&["one", "two"]);
        let (t1, t2) = (text_el(&s, 0), text_el(&s, 1));
        s.add_range(Position::new(t1, 3), None).unwrap();
        s.add_range(Position::new(t2, 3), None).unwrap();
        s.apply(Cmd::InsertText("!".to_string())).unwrap();
        assert_eq!(s.text(), "one!\ntwo!");
        s.undo().unwrap();
        assert_eq!(s.text(), "one\ntwo");
        assert_eq!(s.undo(), Err(EditorError::NothingToUndo));
    }
}
