// Shared by several integration test files; not every file uses every helper
#![allow(dead_code)]

use markloom_engine::{
    EditorEvent, EditorSession, EditorSettings, ElementId, ElementKind, GridHost, GridMetrics,
    Position, Size,
};

/// One paragraph per entry, each holding one plain-text child.
///
/// 10px cells, 20px rows, 20 columns and a 10px gap put line `i` at
/// `y = 10 + 30 * i`, 200px wide. The viewport is 200x100 with no scrollbar
/// or padding.
pub fn session(lines: &[&str]) -> EditorSession<GridHost> {
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
pub fn text(session: &EditorSession<GridHost>, i: usize) -> ElementId {
    session.store().at(i * 2 + 1).unwrap().id()
}

/// Root element of line `i`
pub fn root(session: &EditorSession<GridHost>, i: usize) -> ElementId {
    session.store().at(i * 2).unwrap().id()
}

pub fn at(session: &EditorSession<GridHost>, line: usize, offset: usize) -> Position {
    Position::new(text(session, line), offset)
}

pub fn names(events: &[EditorEvent]) -> Vec<&'static str> {
    events.iter().map(EditorEvent::name).collect()
}
