use crate::schema::ElementId;

/// Structural corruption: the element sequence, a group chain or the layout
/// table no longer agree with each other.
///
/// These abort the operation that detected them. Nothing is committed.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StructureError {
    #[error("element {0} does not exist")]
    UnknownElement(ElementId),
    #[error("element {element} references missing parent {parent}")]
    DanglingParent {
        element: ElementId,
        parent: ElementId,
    },
    #[error("element {element} appears before its parent {parent}")]
    ParentAfterChild {
        element: ElementId,
        parent: ElementId,
    },
    #[error("element {0} appears more than once in the sequence")]
    DuplicateElement(ElementId),
    #[error("splice at {index} removing {remove_count} exceeds sequence length {len}")]
    SpliceOutOfBounds {
        index: usize,
        remove_count: usize,
        len: usize,
    },
    #[error("view line {0} is missing from the layout table")]
    MissingViewLine(ElementId),
}

/// Layout oracle failures
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum OracleError {
    /// The element exists but is outside the virtual-scroll window
    #[error("element {0} is not materialized")]
    NotMaterialized(ElementId),
    /// The host has no geometry for this element/offset
    #[error("no geometry for element {0}")]
    NoGeometry(ElementId),
    /// Nothing materialized under the point
    #[error("no content at ({x}, {y})")]
    NoHit { x: f32, y: f32 },
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EditorError {
    #[error("corrupt structure: {0}")]
    CorruptStructure(#[from] StructureError),
    #[error("layout oracle: {0}")]
    Oracle(#[from] OracleError),
    #[error("unknown element {0}")]
    UnknownElement(ElementId),
    #[error("no current selection range")]
    NoCurrentRange,
    #[error("document is empty")]
    EmptyDocument,
    #[error("nothing to undo")]
    NothingToUndo,
    #[error("nothing to redo")]
    NothingToRedo,
}

impl EditorError {
    /// True for the fatal "corrupt structure" family
    pub fn is_corrupt_structure(&self) -> bool {
        matches!(self, EditorError::CorruptStructure(_))
    }
}

pub type Result<T, E = EditorError> = std::result::Result<T, E>;
