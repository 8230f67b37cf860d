//! # Schema Store
//!
//! The document is a flat, ordered sequence of [`SchemaElement`]s: a pre-order
//! flattening of the block/inline tree. There are no child pointers. Each
//! element carries a direct `parent` handle and a cached view-line handle, and
//! the ancestor chain ("group chain") is derived by walking parents.
//!
//! Elements are immutable values from the outside: edits build a new element
//! (`with_content`, `with_parent`) and hand it back to the store, which
//! validates the whole sequence before committing and reports which view lines
//! were added, updated or deleted as a [`SchemaDiff`].

pub mod diff;
pub mod store;

use std::collections::BTreeMap;
use std::fmt;

pub use diff::{AffectedViewLine, Behavior, SchemaDiff};
pub use store::{SchemaStore, Transaction};

/// Stable handle of an element. Handles are never reused within a store.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd, Debug)]
pub struct ElementId(u64);

impl ElementId {
    /// Build a handle from its raw value (hosts and tests use this to name
    /// elements they learned about through events)
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Behavioural flags of an element kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Capabilities {
    /// Renders as its own block box
    pub block: bool,
    /// Wraps other elements (markers plus content)
    pub container: bool,
    /// Markdown syntax glyphs such as `**` or `# `
    pub symbol: bool,
}

impl Capabilities {
    const fn new(block: bool, container: bool, symbol: bool) -> Self {
        Self {
            block,
            container,
            symbol,
        }
    }
}

/// Closed set of element kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    Paragraph,
    Heading(u8),
    Blockquote,
    UnorderedList,
    OrderedList,
    TaskList,
    ListItem,
    TaskListItem,
    CodeBlock,
    Table,
    /// Wrapper around a table and its toolbar area
    TableContainer,
    TableHeadCell,
    TableCell,
    /// Image block (figure wrapper)
    Figure,
    /// The image itself inside a figure
    ImageSource,
    Strong,
    Italic,
    Strikethrough,
    InlineCode,
    Hyperlink,
    Anchor,
    PlainText,
    /// Syntax glyph kept in the document so the raw markdown can be revealed
    Marker,
}

impl ElementKind {
    /// The capability table, resolved once when an element is created
    pub const fn capabilities(self) -> Capabilities {
        use ElementKind::*;
        match self {
            Paragraph | Heading(_) | TableHeadCell | TableCell => {
                Capabilities::new(true, false, false)
            }
            Blockquote | UnorderedList | OrderedList | TaskList | ListItem | TaskListItem
            | CodeBlock | Table | TableContainer | Figure => Capabilities::new(true, true, false),
            Strong | Italic | Strikethrough | InlineCode | Hyperlink | Anchor => {
                Capabilities::new(false, true, false)
            }
            PlainText | ImageSource => Capabilities::new(false, false, false),
            Marker => Capabilities::new(false, false, true),
        }
    }
}

/// One node of the flattened document
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaElement {
    id: ElementId,
    kind: ElementKind,
    content: String,
    parent: Option<ElementId>,
    /// Root ancestor, maintained by the store; `None` for view-line roots
    view_line: Option<ElementId>,
    capabilities: Capabilities,
    attrs: BTreeMap<String, String>,
}

impl SchemaElement {
    pub(crate) fn new(
        id: ElementId,
        kind: ElementKind,
        parent: Option<ElementId>,
        content: String,
    ) -> Self {
        Self {
            id,
            kind,
            content,
            parent,
            view_line: parent,
            capabilities: kind.capabilities(),
            attrs: BTreeMap::new(),
        }
    }

    pub fn id(&self) -> ElementId {
        self.id
    }

    pub fn kind(&self) -> ElementKind {
        self.kind
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    /// Content length in characters (the unit of every offset)
    pub fn char_len(&self) -> usize {
        char_len(&self.content)
    }

    /// Immediate parent, `None` for view-line roots
    pub fn parent(&self) -> Option<ElementId> {
        self.parent
    }

    /// The view line this element belongs to (itself for roots)
    pub fn view_line_id(&self) -> ElementId {
        self.view_line.unwrap_or(self.id)
    }

    pub fn is_view_line(&self) -> bool {
        self.parent.is_none()
    }

    pub fn is_block(&self) -> bool {
        self.capabilities.block
    }

    pub fn is_container(&self) -> bool {
        self.capabilities.container
    }

    pub fn is_symbol(&self) -> bool {
        self.capabilities.symbol
    }

    pub fn attrs(&self) -> &BTreeMap<String, String> {
        &self.attrs
    }

    /// Copy of this element with new content
    #[must_use]
    pub fn with_content(&self, content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..self.clone()
        }
    }

    /// Copy of this element under a different parent
    #[must_use]
    pub fn with_parent(&self, parent: Option<ElementId>) -> Self {
        Self {
            parent,
            view_line: parent,
            ..self.clone()
        }
    }

    #[must_use]
    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.insert(key.into(), value.into());
        self
    }

    pub(crate) fn set_view_line(&mut self, view_line: Option<ElementId>) {
        self.view_line = view_line;
    }
}

/// Number of characters in `s`
pub fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Byte index of the `char_idx`-th character, clamped to the end of `s`
pub(crate) fn byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map_or(s.len(), |(byte, _)| byte)
}

/// Characters `[start, end)` of `s`, clamped
pub(crate) fn char_slice(s: &str, start: usize, end: usize) -> &str {
    let start_byte = byte_index(s, start);
    let end_byte = byte_index(s, end.max(start));
    &s[start_byte..end_byte]
}
