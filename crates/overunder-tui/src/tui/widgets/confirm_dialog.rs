// Confirmation overlay widget.
//
// Renders a centered modal dialog with a prompt and (y/n) hint. Used for
// quitting and for submitting an entry with unanswered questions.

use ratatui::layout::{Constraint, Flex, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use ratatui::Frame;

const MIN_WIDTH: u16 = 28;
const MAX_WIDTH: u16 = 60;
const DIALOG_HEIGHT: u16 = 6;

/// Render a confirmation dialog centered on `area`.
pub fn render(frame: &mut Frame, area: Rect, title: &str, prompt: &str) {
    let dialog_area = centered_rect(dialog_width(prompt), DIALOG_HEIGHT, area);

    frame.render_widget(Clear, dialog_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .title(Span::styled(
            title.to_string(),
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        ));

    let lines = vec![
        Line::from(format!(" {prompt}")),
        Line::from(vec![
            Span::raw(" ("),
            Span::styled("y", Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)),
            Span::raw("/"),
            Span::styled("n", Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)),
            Span::raw(")"),
        ]),
    ];

    let paragraph = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false })
        .style(Style::default().bg(Color::Black));

    frame.render_widget(paragraph, dialog_area);
}

/// Width that fits `prompt` on one line where possible.
fn dialog_width(prompt: &str) -> u16 {
    let wanted = u16::try_from(prompt.chars().count() + 4).unwrap_or(MAX_WIDTH);
    wanted.clamp(MIN_WIDTH, MAX_WIDTH)
}

/// Compute a centered rectangle of the given size within `area`, clamped
/// to the available space.
fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let clamped_width = width.min(area.width);
    let clamped_height = height.min(area.height);

    let vertical = Layout::vertical([Constraint::Length(clamped_height)])
        .flex(Flex::Center)
        .split(area);

    let horizontal = Layout::horizontal([Constraint::Length(clamped_width)])
        .flex(Flex::Center)
        .split(vertical[0]);

    horizontal[0]
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
