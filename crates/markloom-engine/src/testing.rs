//! Shared test fixture: a small laid-out document on a [`GridHost`].

use crate::host::{GridHost, GridMetrics, RenderSink, ViewLine};
use crate::layout::{LayoutContext, LayoutTable, RenderedElement};
use crate::schema::{ElementId, ElementKind, SchemaElement, SchemaStore};

/// Paragraph lines of plain-text children, laid out with 10px cells, 20px
/// rows and a 10px gap. Every line is materialized.
pub(crate) struct Fixture {
    pub store: SchemaStore,
    pub table: LayoutTable,
    pub host: GridHost,
    lines: Vec<(ElementId, Vec<ElementId>)>,
}

impl Fixture {
    pub fn new(lines: &[&[&str]]) -> Self {
        Self::with_columns(lines, 20)
    }

    pub fn with_columns(lines: &[&[&str]], columns: usize) -> Self {
        let mut store = SchemaStore::new();
        let mut elements = Vec::new();
        let mut ids = Vec::new();
        for line in lines {
            let root = store.create_element(ElementKind::Paragraph, None, "");
            let children: Vec<SchemaElement> = line
                .iter()
                .map(|text| store.create_element(ElementKind::PlainText, Some(root.id()), *text))
                .collect();
            ids.push((root.id(), children.iter().map(|c| c.id()).collect()));
            elements.push(root);
            elements.extend(children);
        }
        let diff = store
            .splice(0, 0, elements)
            .expect("fixture elements are well formed");

        let mut host = GridHost::new(GridMetrics {
            cell_width: 10.0,
            line_height: 20.0,
            columns,
        });
        for change in &diff {
            host.render_view_line(&ViewLine {
                id: change.view_line,
                elements: store.view_line_run(change.view_line),
            });
        }
        let mut table = LayoutTable::new(10.0, 20.0);
        table.apply(&diff, &host).expect("fixture lines measure");
        host.materialize(table.entries());

        Self {
            store,
            table,
            host,
            lines: ids,
        }
    }

    /// Child `child` of line `line`
    pub fn el(&self, line: usize, child: usize) -> ElementId {
        self.lines[line].1[child]
    }

    /// Root element of line `i`
    pub fn line(&self, i: usize) -> ElementId {
        self.lines[i].0
    }

    pub fn ctx(&self) -> LayoutContext<'_, GridHost> {
        LayoutContext::new(&self.store, &self.table, &self.host)
    }

    /// Materialize only the layout entries at these indices
    pub fn materialize_only(&mut self, indices: &[usize]) {
        let entries: Vec<RenderedElement> =
            indices.iter().map(|&i| self.table.entries()[i]).collect();
        self.host.materialize(&entries);
    }
}
