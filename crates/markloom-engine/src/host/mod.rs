//! Collaborators provided by the embedding host.
//!
//! The engine never touches pixels. It asks a [`LayoutOracle`] to measure and
//! hit-test content that a [`RenderSink`] has turned into host-native nodes.
//! Only view lines inside the virtual-scroll window are materialized; geometry
//! queries against anything else fail with [`OracleError::NotMaterialized`]
//! and callers fall back to the tracked layout entry.

pub mod grid;

use crate::editing::Position;
use crate::error::OracleError;
use crate::geometry::{Point, Rect, Size};
use crate::layout::RenderedElement;
use crate::schema::{ElementId, SchemaElement};

pub use grid::{GridHost, GridMetrics};

/// Text measurement and hit-testing against materialized content
pub trait LayoutOracle {
    /// Caret rectangle at `offset` characters into `element`
    fn measure_caret(&self, element: ElementId, offset: usize) -> Result<Rect, OracleError>;

    /// Element and offset under a content-space point
    fn hit_test(&self, point: Point) -> Result<Position, OracleError>;

    /// Size of a rendered element. Works for any rendered view line, whether
    /// or not it is currently materialized.
    fn measure_element(&self, element: ElementId) -> Result<Size, OracleError>;

    /// Bounding rectangle of an element in content space
    fn element_rect(&self, element: ElementId) -> Result<Rect, OracleError>;
}

/// A view line with its nested elements, in document order (root first)
#[derive(Debug, Clone)]
pub struct ViewLine<'a> {
    pub id: ElementId,
    pub elements: Vec<&'a SchemaElement>,
}

/// Produces and positions host-native nodes
pub trait RenderSink {
    /// Build (or rebuild) the node for a view line
    fn render_view_line(&mut self, line: &ViewLine<'_>);

    fn remove_view_line(&mut self, id: ElementId);

    /// Position exactly these lines; everything else is unmaterialized
    fn materialize(&mut self, lines: &[RenderedElement]);
}

/// Anything that can both render and answer geometry queries
pub trait Host: LayoutOracle + RenderSink {}

impl<T: LayoutOracle + RenderSink> Host for T {}
