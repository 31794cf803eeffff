use color_eyre::eyre::Result;
use crossterm::{
    event::{
        Event,
        KeyCode,
        KeyEvent,
        KeyEventKind,
        KeyModifiers,
    },
    terminal::{
        disable_raw_mode,
        enable_raw_mode,
    },
};
use itertools::Itertools;
use ratatui::{
    prelude::*,
    widgets::{
        canvas::{
            Canvas,
            Line as CanvasLine,
        },
        *,
    },
};
use reelspin::{
    config::VariantSpec,
    presenter::{
        ColumnRect,
        LayoutGeometry,
    },
    symbols::render_symbol,
    table::{
        StatusKind,
        TableState,
    },
};
use std::io::stdout;

const KEY_HELP: [(&str, &str); 5] = [
    ("Space/Enter", "spin"),
    ("+/-", "wager"),
    ("PgUp/PgDn", "wager x10"),
    ("y/n", "reset prompt"),
    ("q/Esc", "quit"),
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UserEvent {
    Quit,
    Spin,
    WagerUp,
    WagerDown,
    WagerUpBig,
    WagerDownBig,
    ConfirmReset,
    DeclineReset,
    Redraw,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
enum Mode {
    #[default]
    Normal,
    ResetPrompt,
}

#[derive(Default)]
pub struct UiState {
    mode: Mode,
    terminal: Option<Terminal<CrosstermBackend<std::io::Stdout>>>,
}

impl UiState {
    pub fn open_reset_prompt(&mut self) {
        self.mode = Mode::ResetPrompt;
    }

    pub fn is_prompting(&self) -> bool {
        self.mode == Mode::ResetPrompt
    }
}

/// Everything one frame needs.
pub struct View<'a> {
    pub table: &'a TableState,
    pub spec: &'a VariantSpec,
    pub wager: u64,
    pub server_url: &'a str,
}

pub fn terminal_enter(state: &mut UiState) -> Result<()> {
    enable_raw_mode()?;
    crossterm::execute!(stdout(), crossterm::terminal::EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout());
    state.terminal = Some(Terminal::new(backend)?);
    Ok(())
}

pub fn terminal_exit() -> Result<()> {
    disable_raw_mode()?;
    crossterm::execute!(stdout(), crossterm::terminal::LeaveAlternateScreen)?;
    Ok(())
}

/// Draws a frame and returns the reel geometry it was laid out with.
pub fn draw(state: &mut UiState, view: &View) -> Result<Option<LayoutGeometry>> {
    let mut geometry = None;
    let prompting = state.is_prompting();
    if let Some(term) = state.terminal.as_mut() {
        term.draw(|f| geometry = render(f, view, prompting))?;
    }
    Ok(geometry)
}

pub fn interpret_event(state: &mut UiState, event: Event) -> Option<UserEvent> {
    match event {
        Event::Key(key) if key.kind == KeyEventKind::Press => interpret_key(state, key),
        Event::Resize(..) => Some(UserEvent::Redraw),
        _ => None,
    }
}

fn interpret_key(state: &mut UiState, key: KeyEvent) -> Option<UserEvent> {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return Some(UserEvent::Quit);
    }
    match state.mode {
        Mode::ResetPrompt => match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                state.mode = Mode::Normal;
                Some(UserEvent::ConfirmReset)
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                state.mode = Mode::Normal;
                Some(UserEvent::DeclineReset)
            }
            _ => None,
        },
        Mode::Normal => match key.code {
            KeyCode::Char('q') | KeyCode::Esc => Some(UserEvent::Quit),
            KeyCode::Char(' ') | KeyCode::Enter => Some(UserEvent::Spin),
            KeyCode::Char('+') | KeyCode::Char('=') | KeyCode::Up => {
                Some(UserEvent::WagerUp)
            }
            KeyCode::Char('-') | KeyCode::Down => Some(UserEvent::WagerDown),
            KeyCode::PageUp => Some(UserEvent::WagerUpBig),
            KeyCode::PageDown => Some(UserEvent::WagerDownBig),
            _ => None,
        },
    }
}

fn render(f: &mut Frame, view: &View, prompting: bool) -> Option<LayoutGeometry> {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(5),
            Constraint::Min(5),
            Constraint::Length(3),
        ])
        .split(f.area());

    draw_header(f, chunks[0], view);
    let geometry = draw_reels(f, chunks[1], view);
    draw_help(f, chunks[2]);
    if prompting {
        draw_reset_prompt(f, f.area(), view);
    }
    geometry
}

fn status_style(kind: StatusKind) -> Style {
    match kind {
        StatusKind::Neutral => Style::default(),
        StatusKind::Busy => Style::default().fg(Color::Cyan),
        StatusKind::Win => Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD),
        StatusKind::Error => Style::default().fg(Color::Red),
    }
}

fn draw_header(f: &mut Frame, area: Rect, view: &View) {
    let table = view.table;
    let win = if table.win_amount > 0 {
        Span::styled(
            table.win_amount.to_string(),
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        )
    } else {
        Span::raw("0")
    };
    let lines = vec![
        Line::from(vec![
            Span::raw("Balance: "),
            Span::styled(
                table.balance.to_string(),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::raw("   Wager: "),
            Span::styled(view.wager.to_string(), Style::default().fg(Color::Cyan)),
            Span::raw("   Win: "),
            win,
        ]),
        Line::styled(table.status.text.clone(), status_style(table.status.kind)),
        Line::styled(
            format!("{:?} | {}", table.phase, view.server_url),
            Style::default().fg(Color::DarkGray),
        ),
    ];
    let title = format!("{} Slots", view.spec.title);
    let header =
        Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title(title));
    f.render_widget(header, area);
}

fn draw_reels(f: &mut Frame, area: Rect, view: &View) -> Option<LayoutGeometry> {
    let reel_count = view.spec.reel_count.max(1);
    let rows = view.spec.rows.max(1);
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(vec![Constraint::Ratio(1, reel_count as u32); reel_count])
        .split(area);

    let mut columns = Vec::with_capacity(reel_count);
    let mut row_origin = 0.0;
    let mut cell_height = 1;
    for (reel_index, rect) in cols.iter().enumerate() {
        let block = Block::default().borders(Borders::ALL);
        let inner = block.inner(*rect);
        f.render_widget(block, *rect);
        cell_height = (inner.height as usize / rows).max(1);
        row_origin = inner.y as f64;
        columns.push(ColumnRect {
            left: inner.x as f64,
            width: inner.width as f64,
        });
        let lines = reel_lines(view.table, reel_index, inner, cell_height);
        f.render_widget(Paragraph::new(lines), inner);
    }

    let geometry = LayoutGeometry {
        columns,
        row_origin,
        cell_height: cell_height as f64,
    };
    draw_win_lines(f, area, view.table, &geometry);
    Some(geometry)
}

/// One text line per terminal row of the reel window, scrolled by the
/// reel's fractional offset. Glyphs sit on the middle line of their cell.
fn reel_lines(
    table: &TableState,
    reel_index: usize,
    inner: Rect,
    cell_height: usize,
) -> Vec<Line<'static>> {
    let Some(reel) = table.reels.get(reel_index) else {
        return Vec::new();
    };
    let scroll = (reel.offset.max(0.0) * cell_height as f64).round() as usize;
    (0..inner.height as usize)
        .map(|y| {
            let pos = scroll + y;
            let strip_index = pos / cell_height;
            if pos % cell_height != cell_height / 2 {
                return Line::from("");
            }
            let Some(symbol) = reel.strip.get(strip_index) else {
                return Line::from("");
            };
            let cell = render_symbol(symbol);
            let text = cell.centered(inner.width as usize);
            match table.is_highlighted(reel_index, strip_index) {
                Some(highlight) => Line::styled(
                    text,
                    cell.style.bg(highlight.color).fg(Color::Black),
                ),
                None => Line::styled(text, cell.style),
            }
        })
        .collect()
}

fn draw_win_lines(f: &mut Frame, area: Rect, table: &TableState, geometry: &LayoutGeometry) {
    if table.win_lines.is_empty() || area.width == 0 || area.height == 0 {
        return;
    }
    let top = area.y as f64;
    let bottom = (area.y + area.height) as f64;
    let canvas = Canvas::default()
        .marker(ratatui::symbols::Marker::Braille)
        .x_bounds([area.x as f64, (area.x + area.width) as f64])
        .y_bounds([0.0, bottom - top])
        .paint(|ctx| {
            for path in &table.win_lines {
                for ((x1, y1), (x2, y2)) in path.points.iter().tuple_windows() {
                    ctx.draw(&CanvasLine {
                        x1: *x1,
                        y1: bottom - (y1 + path.offset_y),
                        x2: *x2,
                        y2: bottom - (y2 + path.offset_y),
                        color: path.color,
                    });
                }
            }
        });
    f.render_widget(canvas, area);
    tracing::trace!(
        lines = table.win_lines.len(),
        cell_height = geometry.cell_height,
        "win lines drawn"
    );
}

fn draw_help(f: &mut Frame, area: Rect) {
    let help = KEY_HELP
        .iter()
        .map(|(keys, action)| format!("{keys} {action}"))
        .join("  |  ");
    let widget = Paragraph::new(help)
        .style(Style::default().fg(Color::DarkGray))
        .block(Block::default().borders(Borders::ALL).title("Keys"));
    f.render_widget(widget, area);
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect::new(
        area.x + (area.width - width) / 2,
        area.y + (area.height - height) / 2,
        width,
        height,
    )
}

fn draw_reset_prompt(f: &mut Frame, area: Rect, view: &View) {
    let rect = centered_rect(44, 5, area);
    let lines = vec![
        Line::from(format!("Balance {} is too low to play.", view.table.balance)),
        Line::styled(
            "Reset balance? (y/n)",
            Style::default().add_modifier(Modifier::BOLD),
        ),
    ];
    let modal = Paragraph::new(lines).alignment(Alignment::Center).block(
        Block::default()
            .borders(Borders::ALL)
            .title("Out of credits"),
    );
    f.render_widget(Clear, rect);
    f.render_widget(modal, rect);
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]
    use super::*;
    use ratatui::backend::TestBackend;
    use reelspin::{
        config::Variant,
        presenter::{
            HighlightedCell,
            LINE_PALETTE,
        },
        symbols::Symbol,
        table::ReelView,
    };

    fn press(code: KeyCode) -> Event {
        Event::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn buffer_text(terminal: &Terminal<TestBackend>) -> String {
        let buffer = terminal.backend().buffer();
        buffer.content().iter().map(|cell| cell.symbol()).collect()
    }

    #[test]
    fn interpret_event__maps_wager_and_spin_keys() {
        let mut state = UiState::default();
        let cases = [
            (KeyCode::Char('+'), UserEvent::WagerUp),
            (KeyCode::Char('-'), UserEvent::WagerDown),
            (KeyCode::PageUp, UserEvent::WagerUpBig),
            (KeyCode::PageDown, UserEvent::WagerDownBig),
            (KeyCode::Char(' '), UserEvent::Spin),
            (KeyCode::Enter, UserEvent::Spin),
            (KeyCode::Char('q'), UserEvent::Quit),
        ];
        for (code, expected) in cases {
            assert_eq!(interpret_event(&mut state, press(code)), Some(expected));
        }
    }

    #[test]
    fn interpret_event__reset_prompt_swallows_spin_keys() {
        // given
        let mut state = UiState::default();
        state.open_reset_prompt();

        // when
        let spin = interpret_event(&mut state, press(KeyCode::Char(' ')));
        let confirm = interpret_event(&mut state, press(KeyCode::Char('y')));

        // then
        assert_eq!(spin, None);
        assert_eq!(confirm, Some(UserEvent::ConfirmReset));
        assert!(!state.is_prompting());
    }

    #[test]
    fn interpret_event__ignores_key_releases() {
        let mut state = UiState::default();
        let mut release = KeyEvent::new(KeyCode::Char(' '), KeyModifiers::NONE);
        release.kind = KeyEventKind::Release;
        assert_eq!(interpret_event(&mut state, Event::Key(release)), None);
    }

    #[test]
    fn render__reports_reel_geometry_and_status() {
        // given
        let spec = Variant::Grand.spec();
        let strip: Vec<Symbol> = ["A", "K", "Q", "J", "10"]
            .into_iter()
            .map(Symbol::from)
            .collect();
        let mut table = TableState::new(vec![ReelView::new(strip, 1.0); 5]);
        table.balance = 4200;
        table.highlights.push(HighlightedCell {
            reel: 0,
            strip_index: 1,
            color: LINE_PALETTE[0],
        });
        let view = View {
            table: &table,
            spec: &spec,
            wager: 50,
            server_url: "http://127.0.0.1:8000",
        };
        let mut terminal = Terminal::new(TestBackend::new(80, 30)).unwrap();

        // when
        let mut geometry = None;
        terminal
            .draw(|f| geometry = render(f, &view, false))
            .unwrap();

        // then
        let geometry = geometry.unwrap();
        assert_eq!(geometry.columns.len(), 5);
        assert!(geometry.cell_height >= 1.0);
        let text = buffer_text(&terminal);
        assert!(text.contains("4200"));
        assert!(text.contains("Place your bet"));
    }

    #[test]
    fn render__reset_prompt_is_drawn_on_top() {
        let spec = Variant::Classic.spec();
        let table = TableState::new(Vec::new());
        let view = View {
            table: &table,
            spec: &spec,
            wager: 10,
            server_url: "http://localhost",
        };
        let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();

        terminal
            .draw(|f| {
                render(f, &view, true);
            })
            .unwrap();

        assert!(buffer_text(&terminal).contains("Reset balance?"));
    }
}
