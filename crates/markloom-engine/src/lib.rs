//! Document model and selection engine for a markdown editor.
//!
//! A flat, ordered [`SchemaStore`] of elements is laid out as a stack of view
//! lines by a [`LayoutTable`]. A [`Selection`] of independent ranges lives on
//! top. An [`EditorSession`] ties them to a [`Host`] that renders lines and
//! answers geometry questions.

pub mod editing;
pub mod error;
pub mod events;
pub mod geometry;
pub mod host;
pub mod layout;
pub mod schema;
pub mod session;
pub mod settings;

#[cfg(test)]
pub(crate) mod testing;

pub use editing::{Cmd, Direction, Position, RangeId, Selection, SelectionRange};
pub use error::{EditorError, OracleError, Result, StructureError};
pub use events::{EditorEvent, EventBus, SubscriptionId};
pub use geometry::{Point, Rect, ScrollDelta, Size};
pub use host::{GridHost, GridMetrics, Host, LayoutOracle, RenderSink, ViewLine};
pub use layout::{LayoutContext, LayoutTable, RenderedElement, VirtualWindow};
pub use schema::{ElementId, ElementKind, SchemaDiff, SchemaElement, SchemaStore, Transaction};
pub use session::{ArrowKey, EditorSession, Modifiers};
pub use settings::EditorSettings;
