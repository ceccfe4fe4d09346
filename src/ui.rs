use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget, Wrap},
    Frame,
};

use crate::app::{App, AppState};
use crate::buffer::Tile;
use crate::feedback::LetterState;
use crate::session::SessionStatus;
use crate::{COLS, ROWS};

const HORIZONTAL_MARGIN: u16 = 2;
const KEYBOARD_ROWS: [&[&str]; 3] = [
    &["Q", "W", "E", "R", "T", "Y", "U", "I", "O", "P"],
    &["A", "S", "D", "F", "G", "H", "J", "K", "L"],
    &["ENTER", "Z", "X", "C", "V", "B", "N", "M", "DEL"],
];

fn state_color(state: LetterState) -> Color {
    match state {
        LetterState::Correct => Color::Rgb(106, 170, 100),
        LetterState::Present => Color::Rgb(201, 180, 88),
        LetterState::Absent => Color::Rgb(120, 124, 126),
    }
}

fn tile_span(tile: &Tile, show_state: bool, is_cursor: bool) -> Span<'static> {
    let bold = Style::default().add_modifier(Modifier::BOLD);
    match (tile.letter, tile.state) {
        (Some(letter), Some(state)) if show_state => Span::styled(
            format!(" {letter} "),
            bold.fg(Color::White).bg(state_color(state)),
        ),
        (Some(letter), _) => Span::styled(format!(" {letter} "), bold.fg(Color::White).bg(Color::DarkGray)),
        (None, _) if is_cursor => Span::styled(" _ ", Style::default().fg(Color::Gray)),
        (None, _) => Span::styled(" · ", Style::default().add_modifier(Modifier::DIM)),
    }
}

fn board_lines(app: &App) -> Vec<Line<'static>> {
    let (cursor_row, cursor_col) = app.session.cursor();
    let playing = app.state == AppState::Playing && !app.session.status().is_over();

    app.session
        .grid()
        .iter()
        .enumerate()
        .flat_map(|(r, row)| {
            let revealed = app.revealed_in_row(r);
            let mut spans = Vec::with_capacity(COLS * 2);
            for (c, tile) in row.iter().enumerate() {
                if c > 0 {
                    spans.push(Span::raw(" "));
                }
                let is_cursor = playing && r == cursor_row && c == cursor_col;
                spans.push(tile_span(tile, c < revealed, is_cursor));
            }
            // blank line between rows, not after the last
            let gap = (r + 1 < ROWS).then(Line::default);
            std::iter::once(Line::from(spans)).chain(gap)
        })
        .collect()
}

fn keyboard_lines(app: &App) -> Vec<Line<'static>> {
    KEYBOARD_ROWS
        .iter()
        .map(|row| {
            let spans = row
                .iter()
                .flat_map(|label| {
                    let letter = label.chars().next().filter(|_| label.len() == 1);
                    let style = match letter.and_then(|l| app.key_colors.get(&l)) {
                        Some(state) => Style::default().fg(Color::White).bg(state_color(*state)),
                        None => Style::default().fg(Color::Black).bg(Color::Gray),
                    };
                    [Span::styled(format!(" {label} "), style), Span::raw(" ")]
                })
                .collect::<Vec<_>>();
            Line::from(spans)
        })
        .collect()
}

fn help_text(app: &App) -> &'static str {
    match (app.state, app.session.is_locked()) {
        (AppState::Finished, _) => "(r)estart  (esc)ape",
        (_, true) => "waiting for the judge...",
        _ => "type letters  (enter) submit  (backspace) delete  (esc)ape",
    }
}

fn render_start(area: Rect, buf: &mut Buffer) {
    let bold = Style::default().add_modifier(Modifier::BOLD);
    let lines = vec![
        Line::from(Span::styled("G R I D L E", bold.fg(Color::Green))),
        Line::default(),
        Line::from(format!("Guess the {COLS}-letter word in {ROWS} tries.")),
        Line::from(Span::styled(
            "Press Enter to start, Esc to quit",
            Style::default().add_modifier(Modifier::ITALIC | Modifier::DIM),
        )),
    ];
    let top = area.height.saturating_sub(lines.len() as u16) / 2;
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(top), Constraint::Min(1)])
        .split(area);
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .render(chunks[1], buf);
}

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if self.state == AppState::Start {
            render_start(area, buf);
            return;
        }

        let board = board_lines(self);
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .constraints([
                Constraint::Length(2),                  // title
                Constraint::Length(board.len() as u16), // board
                Constraint::Length(1),                  // padding
                Constraint::Length(1),                  // message
                Constraint::Length(1),                  // padding
                Constraint::Length(KEYBOARD_ROWS.len() as u16),
                Constraint::Min(0),
                Constraint::Length(1), // help
            ])
            .split(area);

        let title_style = match self.session.status() {
            SessionStatus::Won => Style::default().fg(Color::Green),
            SessionStatus::Lost => Style::default().fg(Color::Red),
            SessionStatus::InProgress => Style::default(),
        };
        Paragraph::new(Span::styled(
            "G R I D L E",
            title_style.add_modifier(Modifier::BOLD),
        ))
        .alignment(Alignment::Center)
        .render(chunks[0], buf);

        Paragraph::new(board)
            .alignment(Alignment::Center)
            .render(chunks[1], buf);

        if let Some(message) = &self.message {
            Paragraph::new(Span::styled(
                message.text.clone(),
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            ))
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .render(chunks[3], buf);
        }

        Paragraph::new(keyboard_lines(self))
            .alignment(Alignment::Center)
            .render(chunks[5], buf);

        Paragraph::new(Span::styled(
            help_text(self),
            Style::default().add_modifier(Modifier::ITALIC | Modifier::DIM),
        ))
        .alignment(Alignment::Center)
        .render(chunks[7], buf);

        if self.confetti.is_active() {
            self.confetti.render(area, buf);
        }
    }
}

pub fn draw(app: &App, f: &mut Frame) {
    f.render_widget(app, f.area());
}
