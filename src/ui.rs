pub mod scene;
pub mod screen;

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use crate::app::App;

const HORIZONTAL_MARGIN: u16 = 2;

pub const CALIBRATION_MESSAGE: &str =
    "Stand inside the outline: head and both shoulders must be visible";
pub const PLAY_AGAIN: &str = "(enter) play again / (esc)ape";

/// Render the screen for the game's current phase
pub fn draw(app: &App, f: &mut Frame) {
    screen::current_screen(app.game.phase()).render(app, f);
}

/// Header, canvas and footer rows
pub(crate) fn regions(area: Rect) -> [Rect; 3] {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .constraints([
            Constraint::Length(1), // score + timer
            Constraint::Min(3),    // canvas
            Constraint::Length(2), // messages + keys
        ])
        .split(area);
    [chunks[0], chunks[1], chunks[2]]
}

pub(crate) fn render_scoreboard(app: &App, f: &mut Frame, area: Rect) {
    let bold_style = Style::default().add_modifier(Modifier::BOLD);
    let state = app.game.state();

    let halves = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    let score = Paragraph::new(Span::styled(
        format!("Score: {}", state.score),
        bold_style.fg(Color::Green),
    ));
    f.render_widget(score, halves[0]);

    let timer_style = if state.time_remaining <= 10 {
        bold_style.fg(Color::Red)
    } else {
        bold_style
    };
    let timer = Paragraph::new(Span::styled(
        format!("Time: {}", state.time_remaining),
        timer_style,
    ))
    .alignment(Alignment::Right);
    f.render_widget(timer, halves[1]);
}

/// Two footer lines: a status message (possibly empty) and the key legend
pub(crate) fn render_footer(f: &mut Frame, area: Rect, message: Option<&str>, legend: &str) {
    let italic_style = Style::default().add_modifier(Modifier::ITALIC);
    let message_style = Style::default()
        .fg(Color::Yellow)
        .add_modifier(Modifier::BOLD);

    let lines = vec![
        Line::from(Span::styled(message.unwrap_or_default(), message_style)),
        Line::from(Span::styled(legend, italic_style)),
    ];
    f.render_widget(
        Paragraph::new(lines).alignment(Alignment::Center),
        area,
    );
}

/// Centered box with the final score, drawn over the frozen scene
pub(crate) fn render_report(f: &mut Frame, area: Rect, report: &str) {
    let popup = centered(area, 40, 5);
    let text = vec![
        Line::from(Span::styled(
            report,
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(
            PLAY_AGAIN,
            Style::default().add_modifier(Modifier::ITALIC),
        )),
    ];

    f.render_widget(Clear, popup);
    f.render_widget(
        Paragraph::new(text)
            .block(Block::default().borders(Borders::ALL).title("wristtap"))
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true }),
        popup,
    );
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}
