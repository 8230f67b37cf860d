use crate::schema::ElementId;

/// What happened to a view line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Behavior {
    Add,
    Update,
    Delete,
}

/// One entry of a structural diff
///
/// For `Add` the reference is the view line the new one follows (`None` when
/// it becomes the first line). For `Delete` it is the predecessor in the old
/// sequence. `Update` entries carry no reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AffectedViewLine {
    pub view_line: ElementId,
    pub behavior: Behavior,
    pub reference: Option<ElementId>,
}

impl AffectedViewLine {
    pub fn add(view_line: ElementId, reference: Option<ElementId>) -> Self {
        Self {
            view_line,
            behavior: Behavior::Add,
            reference,
        }
    }

    pub fn update(view_line: ElementId) -> Self {
        Self {
            view_line,
            behavior: Behavior::Update,
            reference: None,
        }
    }

    pub fn delete(view_line: ElementId, reference: Option<ElementId>) -> Self {
        Self {
            view_line,
            behavior: Behavior::Delete,
            reference,
        }
    }
}

/// Ordered list of view-line changes produced by one store mutation
///
/// Entries are ordered deletes first (old document order), then adds (new
/// document order), then updates, so applying them one after another against
/// the previous layout always finds every reference it needs.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SchemaDiff {
    entries: Vec<AffectedViewLine>,
}

impl SchemaDiff {
    pub fn new(entries: Vec<AffectedViewLine>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[AffectedViewLine] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, AffectedViewLine> {
        self.entries.iter()
    }

    /// Entries with the given behavior, in diff order
    pub fn with_behavior(&self, behavior: Behavior) -> impl Iterator<Item = &AffectedViewLine> {
        self.entries.iter().filter(move |e| e.behavior == behavior)
    }
}

impl<'a> IntoIterator for &'a SchemaDiff {
    type Item = &'a AffectedViewLine;
    type IntoIter = std::slice::Iter<'a, AffectedViewLine>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
