use std::collections::VecDeque;

use crate::editing::{RangeId, SelectionRange};
use crate::schema::SchemaElement;

/// Document and selection state at one point in time
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub elements: Vec<SchemaElement>,
    pub ranges: Vec<SelectionRange>,
    pub current: Option<RangeId>,
}

#[derive(Debug, Clone)]
struct Step {
    label: &'static str,
    before: Snapshot,
    after: Snapshot,
}

/// Bounded undo/redo stacks of before/after snapshot pairs
///
/// Recording a new step clears the redo stack. Once `limit` steps are kept the
/// oldest is dropped.
#[derive(Debug, Clone)]
pub struct History {
    undo: VecDeque<Step>,
    redo: Vec<Step>,
    limit: usize,
}

impl History {
    pub fn new(limit: usize) -> Self {
        Self {
            undo: VecDeque::new(),
            redo: Vec::new(),
            limit: limit.max(1),
        }
    }

    pub fn record(&mut self, label: &'static str, before: Snapshot, after: Snapshot) {
        if before == after {
            return;
        }
        self.redo.clear();
        if self.undo.len() == self.limit {
            self.undo.pop_front();
        }
        self.undo.push_back(Step {
            label,
            before,
            after,
        });
    }

    /// State to restore for undo, moving the step onto the redo stack
    pub fn undo(&mut self) -> Option<&Snapshot> {
        let step = self.undo.pop_back()?;
        log::debug!("undo {}", step.label);
        self.redo.push(step);
        self.redo.last().map(|s| &s.before)
    }

    /// State to restore for redo, moving the step back onto the undo stack
    pub fn redo(&mut self) -> Option<&Snapshot> {
        let step = self.redo.pop()?;
        log::debug!("redo {}", step.label);
        self.undo.push_back(step);
        self.undo.back().map(|s| &s.after)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }
}
