use std::collections::{HashMap, HashSet};

use crate::error::StructureError;
use crate::schema::{
    AffectedViewLine, ElementId, ElementKind, SchemaDiff, SchemaElement, char_len,
};

#[derive(Debug, Clone)]
enum Op {
    Replace {
        id: ElementId,
        element: SchemaElement,
    },
    Splice {
        index: usize,
        remove_count: usize,
        insert: Vec<SchemaElement>,
    },
}

/// A batch of store edits committed atomically
///
/// Operations are applied in order against a staged copy of the sequence;
/// the result is validated as a whole, so intermediate states may be
/// temporarily inconsistent (e.g. a child re-parented before its old parent
/// is spliced away).
#[derive(Debug, Clone, Default)]
pub struct Transaction {
    ops: Vec<Op>,
}

impl Transaction {
    pub fn new() -> Self {
        Self::default()
    }

    /// Swap the element currently named `id` for `element`, keeping its position
    pub fn replace(&mut self, id: ElementId, element: SchemaElement) -> &mut Self {
        self.ops.push(Op::Replace { id, element });
        self
    }

    /// Remove `remove_count` elements at `index` and insert `insert` there
    pub fn splice(
        &mut self,
        index: usize,
        remove_count: usize,
        insert: Vec<SchemaElement>,
    ) -> &mut Self {
        self.ops.push(Op::Splice {
            index,
            remove_count,
            insert,
        });
        self
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

/// Owner of the flattened element sequence
#[derive(Debug, Clone, Default)]
pub struct SchemaStore {
    order: Vec<ElementId>,
    elements: HashMap<ElementId, SchemaElement>,
    next_id: u64,
}

impl SchemaStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Factory for new elements. Capabilities come from the kind table.
    ///
    /// The element is not part of the document until it is spliced or
    /// appended in.
    pub fn create_element(
        &mut self,
        kind: ElementKind,
        parent: Option<ElementId>,
        content: impl Into<String>,
    ) -> SchemaElement {
        self.next_id += 1;
        SchemaElement::new(ElementId(self.next_id), kind, parent, content.into())
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Elements in document order
    pub fn elements(
        &self,
    ) -> impl DoubleEndedIterator<Item = &SchemaElement> + ExactSizeIterator + '_ {
        self.order.iter().map(|id| &self.elements[id])
    }

    pub fn get(&self, id: ElementId) -> Option<&SchemaElement> {
        self.elements.get(&id)
    }

    pub fn element(&self, id: ElementId) -> Result<&SchemaElement, StructureError> {
        self.get(id).ok_or(StructureError::UnknownElement(id))
    }

    pub fn contains(&self, id: ElementId) -> bool {
        self.elements.contains_key(&id)
    }

    /// Position of `id` in document order
    pub fn index_of(&self, id: ElementId) -> Option<usize> {
        if !self.contains(id) {
            return None;
        }
        self.order.iter().position(|e| *e == id)
    }

    pub fn at(&self, index: usize) -> Option<&SchemaElement> {
        self.order.get(index).map(|id| &self.elements[id])
    }

    pub fn first(&self) -> Option<&SchemaElement> {
        self.at(0)
    }

    pub fn last(&self) -> Option<&SchemaElement> {
        self.order.last().map(|id| &self.elements[id])
    }

    /// Ancestor chain of `id`, root first, immediate parent last
    pub fn group_ids(&self, id: ElementId) -> Vec<ElementId> {
        let mut chain = Vec::new();
        let mut cursor = self.get(id).and_then(SchemaElement::parent);
        while let Some(parent) = cursor {
            chain.push(parent);
            cursor = self.get(parent).and_then(SchemaElement::parent);
        }
        chain.reverse();
        chain
    }

    /// View-line roots in document order
    pub fn view_lines(&self) -> impl Iterator<Item = &SchemaElement> + '_ {
        self.elements().filter(|e| e.is_view_line())
    }

    /// The contiguous run of elements belonging to `view_line`, root included
    pub fn view_line_run(&self, view_line: ElementId) -> Vec<&SchemaElement> {
        let Some(start) = self.index_of(view_line) else {
            return Vec::new();
        };
        self.order[start..]
            .iter()
            .map(|id| &self.elements[id])
            .take_while(|e| e.view_line_id() == view_line)
            .collect()
    }

    /// Concatenated content of one view line
    pub fn view_line_text(&self, view_line: ElementId) -> String {
        self.view_line_run(view_line)
            .iter()
            .map(|e| e.content())
            .collect()
    }

    /// Concatenated content of the view lines from `start` to `end` inclusive,
    /// in document order regardless of argument order
    pub fn text_between(&self, start: ElementId, end: ElementId) -> String {
        let (Some(a), Some(b)) = (self.index_of(start), self.index_of(end)) else {
            return String::new();
        };
        let (from, to) = if a <= b { (a, b) } else { (b, a) };
        let last_line = self.elements[&self.order[to]].view_line_id();
        self.order[from..]
            .iter()
            .map(|id| &self.elements[id])
            .enumerate()
            .take_while(|(i, e)| from + i <= to || e.view_line_id() == last_line)
            .map(|(_, e)| e.content())
            .collect()
    }

    /// Clone of the sequence, for history snapshots
    pub fn snapshot(&self) -> Vec<SchemaElement> {
        self.elements().cloned().collect()
    }

    pub fn splice(
        &mut self,
        index: usize,
        remove_count: usize,
        elements: Vec<SchemaElement>,
    ) -> Result<SchemaDiff, StructureError> {
        let mut tx = Transaction::new();
        tx.splice(index, remove_count, elements);
        self.commit(tx)
    }

    /// Same-position swap, used for in-line text edits
    pub fn replace(
        &mut self,
        id: ElementId,
        element: SchemaElement,
    ) -> Result<SchemaDiff, StructureError> {
        let mut tx = Transaction::new();
        tx.replace(id, element);
        self.commit(tx)
    }

    pub fn append(&mut self, element: SchemaElement) -> Result<SchemaDiff, StructureError> {
        self.splice(self.len(), 0, vec![element])
    }

    /// Validate and apply a transaction, returning the view-line diff
    ///
    /// On error nothing is changed.
    pub fn commit(&mut self, tx: Transaction) -> Result<SchemaDiff, StructureError> {
        if tx.is_empty() {
            return Ok(SchemaDiff::default());
        }
        let mut order = self.order.clone();
        let mut staged: HashMap<ElementId, SchemaElement> = HashMap::new();

        for op in tx.ops {
            match op {
                Op::Replace { id, element } => {
                    let pos = order
                        .iter()
                        .position(|e| *e == id)
                        .ok_or(StructureError::UnknownElement(id))?;
                    order[pos] = element.id();
                    staged.insert(element.id(), element);
                }
                Op::Splice {
                    index,
                    remove_count,
                    insert,
                } => {
                    let len = order.len();
                    if index > len || index + remove_count > len {
                        return Err(StructureError::SpliceOutOfBounds {
                            index,
                            remove_count,
                            len,
                        });
                    }
                    let ids: Vec<ElementId> = insert.iter().map(SchemaElement::id).collect();
                    order.splice(index..index + remove_count, ids);
                    for element in insert {
                        staged.insert(element.id(), element);
                    }
                }
            }
        }

        let members: HashSet<ElementId> = order.iter().copied().collect();
        let mut seen: HashSet<ElementId> = HashSet::with_capacity(order.len());
        let mut view_lines: HashMap<ElementId, Option<ElementId>> =
            HashMap::with_capacity(order.len());
        let mut new_roots = Vec::new();

        for id in &order {
            if !seen.insert(*id) {
                return Err(StructureError::DuplicateElement(*id));
            }
            let element = staged
                .get(id)
                .or_else(|| self.elements.get(id))
                .ok_or(StructureError::UnknownElement(*id))?;
            let view_line = match element.parent() {
                None => {
                    new_roots.push(*id);
                    None
                }
                Some(parent) if seen.contains(&parent) => {
                    Some(view_lines[&parent].unwrap_or(parent))
                }
                Some(parent) if members.contains(&parent) => {
                    return Err(StructureError::ParentAfterChild {
                        element: *id,
                        parent,
                    });
                }
                Some(parent) => {
                    return Err(StructureError::DanglingParent {
                        element: *id,
                        parent,
                    });
                }
            };
            view_lines.insert(*id, view_line);
        }

        let diff = self.diff(&order, &members, &staged, &view_lines, &new_roots);

        let removed: Vec<ElementId> = self
            .order
            .iter()
            .filter(|id| !members.contains(id))
            .copied()
            .collect();
        for id in removed {
            self.elements.remove(&id);
        }
        for (id, element) in staged {
            if members.contains(&id) {
                self.elements.insert(id, element);
            }
        }
        for (id, view_line) in &view_lines {
            if let Some(element) = self.elements.get_mut(id) {
                element.set_view_line(*view_line);
            }
        }
        self.order = order;

        log::debug!("schema commit: {} elements, {} diff entries", self.len(), diff.len());
        Ok(diff)
    }

    fn diff(
        &self,
        order: &[ElementId],
        members: &HashSet<ElementId>,
        staged: &HashMap<ElementId, SchemaElement>,
        view_lines: &HashMap<ElementId, Option<ElementId>>,
        new_roots: &[ElementId],
    ) -> SchemaDiff {
        let old_roots: Vec<ElementId> = self
            .order
            .iter()
            .filter(|id| self.elements[*id].is_view_line())
            .copied()
            .collect();
        let old_root_set: HashSet<ElementId> = old_roots.iter().copied().collect();
        let new_root_set: HashSet<ElementId> = new_roots.iter().copied().collect();

        let mut touched: HashSet<ElementId> = HashSet::new();
        for id in order {
            let new_line = view_lines[id].unwrap_or(*id);
            let old_line = self.elements.get(id).map(SchemaElement::view_line_id);
            if staged.contains_key(id) || old_line != Some(new_line) {
                touched.insert(new_line);
                touched.extend(old_line);
            }
        }
        for id in &self.order {
            if !members.contains(id) {
                touched.insert(self.elements[id].view_line_id());
            }
        }

        // survivors whose relative order changed are re-laid out as delete + add
        let survivors_old: Vec<ElementId> = old_roots
            .iter()
            .filter(|id| new_root_set.contains(id))
            .copied()
            .collect();
        let survivors_new: Vec<ElementId> = new_roots
            .iter()
            .filter(|id| old_root_set.contains(id))
            .copied()
            .collect();
        let moved: HashSet<ElementId> = survivors_old
            .iter()
            .zip(&survivors_new)
            .filter(|(a, b)| a != b)
            .flat_map(|(a, b)| [*a, *b])
            .collect();

        let mut entries = Vec::new();
        for (i, id) in old_roots.iter().enumerate() {
            if !new_root_set.contains(id) || moved.contains(id) {
                let reference = i.checked_sub(1).map(|p| old_roots[p]);
                entries.push(AffectedViewLine::delete(*id, reference));
            }
        }
        for (i, id) in new_roots.iter().enumerate() {
            if !old_root_set.contains(id) || moved.contains(id) {
                let reference = i.checked_sub(1).map(|p| new_roots[p]);
                entries.push(AffectedViewLine::add(*id, reference));
            }
        }
        for id in new_roots {
            if old_root_set.contains(id) && !moved.contains(id) && touched.contains(id) {
                entries.push(AffectedViewLine::update(*id));
            }
        }
        SchemaDiff::new(entries)
    }

    /// Clamp `offset` into the content of `id`
    pub fn clamp_offset(&self, id: ElementId, offset: usize) -> Option<usize> {
        self.get(id).map(|e| offset.min(char_len(e.content())))
    }
}
