use ratatui::{
    layout::{Constraint, Flex, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use crate::app::{App, HistoryEntry, COMMANDS};

const KEYS: &[(&str, &str)] = &[
    ("Tab", "switch between Fact and Query"),
    ("Enter", "submit"),
    ("Up/Down", "scroll the history"),
    ("Ctrl+A / Ctrl+E", "start / end of input"),
    ("Ctrl+U", "clear input"),
    ("Ctrl+C", "exit"),
];

const EXAMPLE: &[(&str, &str)] = &[
    ("fact ", "Lives(John; London) Lives(John; Paris) Likes(John, Paris;)"),
    ("query", "Likes(p, t;), not Lives(p; t)"),
];

pub fn draw(f: &mut Frame, app: &App) {
    let [title, history, input] =
        Layout::vertical([Constraint::Length(1), Constraint::Min(5), Constraint::Length(3)])
            .areas(f.area());

    let mode = Style::default().fg(app.mode.color()).add_modifier(Modifier::BOLD);
    let title_line = Line::from(vec![
        Span::styled(format!(" {} ", app.mode.name()), mode),
        Span::raw(format!("{} facts, F1 for help", app.database.len())),
    ]);
    f.render_widget(Paragraph::new(title_line).bg(Color::DarkGray), title);

    render_history(f, app, history);

    let block = Block::bordered().border_style(Style::default().fg(app.mode.color()));
    let inner = block.inner(input);
    f.render_widget(Paragraph::new(app.input.as_str()).block(block), input);
    f.set_cursor_position((inner.x + app.cursor_column() as u16, inner.y));

    if app.show_help {
        render_help(f);
    }
}

fn render_history(f: &mut Frame, app: &App, area: Rect) {
    let lines: Vec<Line> = if app.history.is_empty() {
        EXAMPLE
            .iter()
            .map(|(label, text)| {
                Line::from(vec![Span::raw(format!(" {}  ", label)), Span::raw(*text).cyan()])
            })
            .collect()
    } else {
        app.history
            .iter()
            .rev()
            .skip(app.scroll_offset)
            .flat_map(entry_lines)
            .collect()
    };
    let history = Paragraph::new(lines)
        .block(Block::new().borders(Borders::TOP).title(" History "))
        .wrap(Wrap { trim: false });
    f.render_widget(history, area);
}

fn entry_lines(entry: &HistoryEntry) -> Vec<Line<'_>> {
    let color = if entry.is_error { Color::Red } else { Color::Green };
    let mut lines = vec![Line::from(vec![
        Span::styled("> ", Style::default().fg(entry.mode.color())),
        entry.input.as_str().yellow(),
    ])];
    lines.extend(entry.output.lines().map(|line| Line::from(format!("  {}", line)).fg(color)));
    lines.push(Line::default());
    lines
}

fn render_help(f: &mut Frame) {
    let mut lines = vec![Line::from(" keys").bold()];
    lines.extend(rows(KEYS));
    lines.push(Line::from(" commands").bold());
    lines.extend(rows(COMMANDS));
    lines.push(Line::from(" any key closes").dark_gray());

    let area = popup_area(f.area(), 64, lines.len() as u16 + 2);
    f.render_widget(Clear, area);
    f.render_widget(
        Paragraph::new(lines).block(Block::bordered().title(" Help ").cyan()),
        area,
    );
}

fn rows(table: &[(&str, &str)]) -> Vec<Line<'static>> {
    table
        .iter()
        .map(|(key, text)| Line::from(format!("  {:<16} {}", key, text)))
        .collect()
}

fn popup_area(area: Rect, width: u16, height: u16) -> Rect {
    let [area] = Layout::vertical([Constraint::Length(height)])
        .flex(Flex::Center)
        .areas(area);
    let [area] = Layout::horizontal([Constraint::Length(width)])
        .flex(Flex::Center)
        .areas(area);
    area
}
