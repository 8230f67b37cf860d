// Benchmark helper functions - Rust's dead code analysis doesn't understand
// that these are used by benchmark files in the same directory
// See: https://users.rust-lang.org/t/cargo-rustc-benches-awarnings/110111/2
use markloom_engine::{
    EditorSession, EditorSettings, ElementId, ElementKind, GridHost, GridMetrics, SchemaElement,
    SchemaStore,
};

/// `lines` paragraphs, each `Line n **bold** and some trailing words`
#[allow(dead_code)]
pub fn build_elements(
    mut make: impl FnMut(ElementKind, Option<ElementId>, String) -> SchemaElement,
    lines: usize,
) -> Vec<SchemaElement> {
    let mut elements = Vec::with_capacity(lines * 5);
    for i in 0..lines {
        let p = make(ElementKind::Paragraph, None, String::new());
        let strong = make(ElementKind::Strong, Some(p.id()), String::new());
        let parts = [
            make(ElementKind::PlainText, Some(p.id()), format!("Line {i} ")),
            make(ElementKind::PlainText, Some(strong.id()), "bold".to_string()),
            make(
                ElementKind::PlainText,
                Some(p.id()),
                " and some trailing words".to_string(),
            ),
        ];
        let [before, bold, after] = parts;
        elements.extend([p, before, strong, bold, after]);
    }
    elements
}

#[allow(dead_code)]
pub fn store_with_lines(lines: usize) -> SchemaStore {
    let mut store = SchemaStore::new();
    let elements = build_elements(|kind, parent, text| store.create_element(kind, parent, text), lines);
    store.splice(0, 0, elements).unwrap();
    store
}

#[allow(dead_code)]
pub fn loaded_session(lines: usize) -> EditorSession<GridHost> {
    let mut session = EditorSession::new(
        GridHost::new(GridMetrics::default()),
        EditorSettings::default(),
    );
    let elements = build_elements(
        |kind, parent, text| session.create_element(kind, parent, text),
        lines,
    );
    session.load(elements).unwrap();
    session
}
