use anyhow::Result;
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
    },
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use markloom_config::{Config, EditorConfig};
use markloom_engine::{
    ArrowKey, Cmd, EditorError, EditorEvent, EditorSession, EditorSettings, ElementKind,
    GridHost, GridMetrics, Modifiers, Point, Position, Rect as ContentRect, ScrollDelta, Size,
};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};
use std::{
    cell::RefCell,
    env, fs,
    io::{Stdout, stdout},
    path::PathBuf,
    process,
    rc::Rc,
};

const WELCOME: &str = "Welcome to markloom.
Click to place the caret, drag to select.
Alt+click adds another caret; Alt+click a highlight to remove it.
Shift+click or Shift+arrows extend the current range.
Ctrl+arrows jump to line and document edges, Ctrl+A selects everything.
Ctrl+Z undoes, Ctrl+Y redoes. Esc or Ctrl+Q quits.";

/// Rows scrolled per mouse wheel notch
const WHEEL_ROWS: f32 = 3.0;

struct App {
    session: EditorSession<GridHost>,
    events: Rc<RefCell<Vec<EditorEvent>>>,
    title: String,
    /// Editor pane inside its border, as last laid out
    area: Rect,
    status: String,
}

impl App {
    fn new(config: &Config, title: String, text: &str) -> Result<Self> {
        let metrics = GridMetrics {
            cell_width: config.grid.cell_width,
            line_height: config.grid.line_height,
            columns: 80,
        };
        // Lines sit on whole terminal rows; there is no scrollbar or padding
        let settings = EditorSettings {
            gap: gap_rows(&config.editor) * metrics.line_height,
            line_height: metrics.line_height,
            scrollbar_size: 0.0,
            container_padding: 0.0,
            window_buffer: config.editor.window_buffer,
            intersection_threshold: config.editor.intersection_threshold,
            viewport: Size::new(config.editor.viewport_width, config.editor.viewport_height),
            history_limit: config.editor.history_limit,
        };
        let mut session = EditorSession::new(GridHost::new(metrics), settings);
        let events = session.events().record();

        let mut elements = Vec::new();
        for line in text.lines() {
            let paragraph = session.create_element(ElementKind::Paragraph, None, "");
            let content = session.create_element(ElementKind::PlainText, Some(paragraph.id()), line);
            elements.push(paragraph);
            elements.push(content);
        }
        if elements.is_empty() {
            let paragraph = session.create_element(ElementKind::Paragraph, None, "");
            let content = session.create_element(ElementKind::PlainText, Some(paragraph.id()), "");
            elements.extend([paragraph, content]);
        }
        session.load(elements)?;

        let first_text = session
            .store()
            .elements()
            .find(|e| !e.is_view_line())
            .map(|e| e.id());
        if let Some(id) = first_text {
            session.add_range(Position::new(id, 0), None)?;
        }

        Ok(Self {
            session,
            events,
            title,
            area: Rect::default(),
            status: String::new(),
        })
    }

    fn metrics(&self) -> GridMetrics {
        self.session.host().metrics()
    }

    /// Keep the grid width and viewport in step with the terminal
    fn resize(&mut self, area: Rect) -> Result<()> {
        if area == self.area {
            return Ok(());
        }
        self.area = area;
        let columns = usize::from(area.width.max(1));
        if self.metrics().columns != columns {
            self.session.host_mut().set_columns(columns);
            self.session.relayout()?;
        }
        let m = self.metrics();
        self.session.set_viewport(Size::new(
            f32::from(area.width) * m.cell_width,
            f32::from(area.height) * m.line_height,
        ));
        log::debug!("editor area {}x{}", area.width, area.height);
        Ok(())
    }

    /// Terminal cell to viewport coordinates. Cells left of or above the
    /// editor pane map to negative values so drags there autoscroll.
    fn to_point(&self, column: u16, row: u16) -> Point {
        let m = self.metrics();
        let col = f32::from(column) - f32::from(self.area.x);
        let row = f32::from(row) - f32::from(self.area.y);
        Point::new(
            (col + 0.25) * m.cell_width,
            (row + 0.5) * m.line_height,
        )
    }

    fn report(&mut self, result: markloom_engine::Result<()>) {
        match result {
            Ok(()) => self.status.clear(),
            Err(EditorError::NothingToUndo) => self.status = "Nothing to undo".to_string(),
            Err(EditorError::NothingToRedo) => self.status = "Nothing to redo".to_string(),
            Err(err) => {
                log::warn!("{err}");
                self.status = err.to_string();
            }
        }
    }

    /// Apply the scroll requests the session published since the last input
    fn follow_scroll_requests(&mut self) {
        let deltas: Vec<ScrollDelta> = self
            .events
            .borrow_mut()
            .drain(..)
            .filter_map(|event| match event {
                EditorEvent::ScrollDeltaRequested(delta) => Some(delta),
                _ => None,
            })
            .collect();
        for delta in deltas {
            self.session.scroll_by(delta);
        }
    }

    fn scroll_rows(&mut self, rows: f32) {
        let dy = rows * self.metrics().line_height;
        self.session.scroll_by(ScrollDelta { dx: 0.0, dy });
    }

    /// Returns true when the user asked to quit
    fn handle_key(&mut self, key: KeyEvent) -> bool {
        if key.kind != KeyEventKind::Press {
            return false;
        }
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        let modifiers = Modifiers {
            alt: key.modifiers.contains(KeyModifiers::ALT),
            shift: key.modifiers.contains(KeyModifiers::SHIFT),
            ctrl,
        };

        let result = match key.code {
            KeyCode::Esc => return true,
            KeyCode::Char('q') if ctrl => return true,
            KeyCode::Char('a') if ctrl => self.session.select_all().map(|_| ()),
            KeyCode::Char('z') if ctrl => self.session.undo(),
            KeyCode::Char('y') if ctrl => self.session.redo(),
            KeyCode::Char(c) if !ctrl => self.session.apply(Cmd::InsertText(c.to_string())),
            KeyCode::Tab => self.session.apply(Cmd::InsertText("    ".to_string())),
            KeyCode::Enter => self.session.apply(Cmd::BreakLine),
            KeyCode::Backspace => self.session.apply(Cmd::DeleteBackward),
            KeyCode::Delete => self.session.apply(Cmd::DeleteForward),
            KeyCode::Home => self.session.keyboard_select(
                ArrowKey::Left,
                Modifiers {
                    ctrl: true,
                    ..modifiers
                },
            ),
            KeyCode::End => self.session.keyboard_select(
                ArrowKey::Right,
                Modifiers {
                    ctrl: true,
                    ..modifiers
                },
            ),
            KeyCode::PageUp => {
                self.scroll_rows(-f32::from(self.area.height));
                Ok(())
            }
            KeyCode::PageDown => {
                self.scroll_rows(f32::from(self.area.height));
                Ok(())
            }
            code => match arrow(code) {
                Some(direction) => self.session.keyboard_select(direction, modifiers),
                None => Ok(()),
            },
        };
        self.report(result);
        false
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) {
        let point = self.to_point(mouse.column, mouse.row);
        let modifiers = Modifiers {
            alt: mouse.modifiers.contains(KeyModifiers::ALT),
            shift: mouse.modifiers.contains(KeyModifiers::SHIFT),
            ctrl: mouse.modifiers.contains(KeyModifiers::CONTROL),
        };
        let result = match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => self.session.pointer_down(point, modifiers),
            MouseEventKind::Drag(MouseButton::Left) => self.session.pointer_move(point),
            MouseEventKind::Up(MouseButton::Left) => self.session.pointer_up(point),
            MouseEventKind::ScrollDown => {
                self.scroll_rows(WHEEL_ROWS);
                Ok(())
            }
            MouseEventKind::ScrollUp => {
                self.scroll_rows(-WHEEL_ROWS);
                Ok(())
            }
            _ => Ok(()),
        };
        self.report(result);
    }

    /// Cell span covered by a content rectangle, clamped to the pane
    fn cells(&self, rect: ContentRect, rows: usize, cols: usize) -> (usize, usize, usize, usize) {
        let m = self.metrics();
        let scroll = self.session.scroll();
        let to_cell = |value: f32, unit: f32, limit: usize| {
            ((value / unit).round().max(0.0) as usize).min(limit)
        };
        (
            to_cell(rect.y - scroll.y, m.line_height, rows),
            to_cell(rect.bottom() - scroll.y, m.line_height, rows),
            to_cell(rect.x - scroll.x, m.cell_width, cols),
            to_cell(rect.right() - scroll.x, m.cell_width, cols),
        )
    }

    fn visible_lines(&self, rows: usize, cols: usize) -> Vec<Line<'static>> {
        let m = self.metrics();
        let scroll = self.session.scroll();
        let host = self.session.host();
        let mut grid = vec![vec![(' ', Style::default()); cols]; rows];

        for (view_line, rect) in host.materialized() {
            let Some(text_rows) = host.rows(view_line) else {
                continue;
            };
            let top = ((rect.y - scroll.y) / m.line_height).round() as i64;
            for (i, text) in text_rows.iter().enumerate() {
                let row = top + i as i64;
                if row < 0 || row >= rows as i64 {
                    continue;
                }
                for (col, ch) in text.chars().take(cols).enumerate() {
                    grid[row as usize][col].0 = ch;
                }
            }
        }

        let highlight = Style::default().bg(Color::Blue).fg(Color::White);
        let caret = Style::default().add_modifier(Modifier::REVERSED);
        let current = self.session.selection().current_id();
        for id in self.session.selection().ids() {
            if let Ok(rects) = self.session.range_rects(id) {
                for rect in rects {
                    let (row0, row1, col0, col1) = self.cells(rect, rows, cols);
                    for row in &mut grid[row0..row1] {
                        for cell in &mut row[col0..col1] {
                            cell.1 = highlight;
                        }
                    }
                }
            }
            // the terminal cursor marks the current caret
            if Some(id) != current
                && let Ok(Some(rect)) = self.session.caret_rect(id)
            {
                let (row, _, col, _) = self.cells(rect, rows, cols);
                if row < rows && col < cols {
                    grid[row][col].1 = caret;
                }
            }
        }

        grid.into_iter()
            .map(|row| {
                Line::from(
                    row.into_iter()
                        .map(|(ch, style)| Span::styled(ch.to_string(), style))
                        .collect::<Vec<_>>(),
                )
            })
            .collect()
    }

    /// Cell of the current range's caret, relative to the pane
    fn cursor_cell(&self) -> Option<(u16, u16)> {
        let id = self.session.selection().current_id()?;
        let rect = self.session.caret_rect(id).ok()??;
        let m = self.metrics();
        let scroll = self.session.scroll();
        let col = ((rect.x - scroll.x) / m.cell_width).round();
        let row = ((rect.y - scroll.y) / m.line_height).round();
        let in_pane = col >= 0.0
            && row >= 0.0
            && col < f32::from(self.area.width)
            && row < f32::from(self.area.height);
        in_pane.then_some((col as u16, row as u16))
    }

    fn status_line(&self) -> String {
        let session = &self.session;
        let message = if self.status.is_empty() {
            "Esc: Quit | Ctrl+Z/Y: Undo/Redo | Alt+click: Add caret"
        } else {
            self.status.as_str()
        };
        format!(
            "{message} | {} lines | {} range(s)",
            session.layout().len(),
            session.selection().len()
        )
    }
}

fn arrow(code: KeyCode) -> Option<ArrowKey> {
    match code {
        KeyCode::Up => Some(ArrowKey::Up),
        KeyCode::Down => Some(ArrowKey::Down),
        KeyCode::Left => Some(ArrowKey::Left),
        KeyCode::Right => Some(ArrowKey::Right),
        _ => None,
    }
}

/// Configured line gap in whole terminal rows, never less than one
fn gap_rows(editor: &EditorConfig) -> f32 {
    if editor.line_height <= 0.0 {
        return 1.0;
    }
    (editor.gap / editor.line_height).round().max(1.0)
}

/// Editor pane (with border) and status bar
fn split(area: Rect) -> (Rect, Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)].as_ref())
        .split(area);
    (chunks[0], chunks[1])
}

fn editor_block(title: &str) -> Block<'_> {
    Block::default().borders(Borders::ALL).title(title)
}

/// Log to a file; the terminal belongs to the UI
fn init_logging() -> Result<PathBuf> {
    let log_path = env::temp_dir().join("markloom.log");
    let file = fs::File::create(&log_path)?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .init();
    Ok(log_path)
}

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();
    let log_path = init_logging()?;

    let config = match Config::load_or_default() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: Failed to load config file: {e}");
            process::exit(1);
        }
    };

    let document = match args.len() {
        1 => config.document.clone(),
        2 => Some(PathBuf::from(&args[1])),
        _ => {
            eprintln!("Usage: {} [document]", args[0]);
            process::exit(1);
        }
    };

    let (title, text) = match &document {
        Some(path) => match fs::read_to_string(path) {
            Ok(text) => (path.display().to_string(), text),
            Err(e) => {
                eprintln!("Error: Could not read '{}': {e}", path.display());
                process::exit(1);
            }
        },
        None => ("scratch".to_string(), WELCOME.to_string()),
    };
    log::info!("opening {title}, logging to {}", log_path.display());

    let mut app = App::new(&config, title, &text)?;

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("{err:?}");
    }

    Ok(())
}

fn run_app(terminal: &mut Terminal<CrosstermBackend<Stdout>>, app: &mut App) -> Result<()> {
    loop {
        let size = terminal.size()?;
        let (pane, _) = split(Rect::new(0, 0, size.width, size.height));
        app.resize(editor_block("").inner(pane))?;
        app.follow_scroll_requests();

        terminal.draw(|f| ui(f, app))?;

        match event::read()? {
            Event::Key(key) => {
                if app.handle_key(key) {
                    return Ok(());
                }
            }
            Event::Mouse(mouse) => app.handle_mouse(mouse),
            _ => {}
        }
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let (pane, status) = split(f.area());
    let block = editor_block(&app.title);
    let inner = block.inner(pane);

    let lines = app.visible_lines(usize::from(inner.height), usize::from(inner.width));
    f.render_widget(Paragraph::new(lines).block(block), pane);

    if let Some((col, row)) = app.cursor_cell() {
        f.set_cursor_position((inner.x + col, inner.y + row));
    }

    let help = Paragraph::new(app.status_line())
        .style(Style::default().bg(Color::DarkGray).fg(Color::White));
    f.render_widget(help, status);
}
