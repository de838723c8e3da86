// Countdown banner widget: contest name and time left until entries lock.
//
// Line 1: contest name, plus a SUBMITTED badge once the entry is in
// Line 2: "Locks in: {countdown}" colored by urgency

use chrono::{DateTime, Utc};
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

use overunder_core::countdown::{Countdown, CountdownOptions, Urgency};

use crate::protocol::EntrySnapshot;

/// Render the countdown banner into the given area.
pub fn render(
    frame: &mut Frame,
    area: Rect,
    entry: &EntrySnapshot,
    options: &CountdownOptions,
    now: DateTime<Utc>,
) {
    let countdown = Countdown::new(entry.lock_timestamp, *options);
    let view = countdown.render(now);
    let color = urgency_color(view.urgency);

    let mut title_line = vec![Span::styled(
        format!(" {}", entry.contest_name),
        Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
    )];
    if entry.submitted {
        title_line.push(Span::styled(
            "  SUBMITTED",
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        ));
    }

    let prefix = if view.is_expired() { " Entries: " } else { " Locks in: " };
    let lines = vec![
        Line::from(title_line),
        Line::from(vec![
            Span::styled(prefix, Style::default().fg(Color::Gray)),
            Span::styled(view.text, Style::default().fg(color).add_modifier(Modifier::BOLD)),
        ]),
    ];

    let paragraph = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title("Contest")
            .border_style(Style::default().fg(color)),
    );
    frame.render_widget(paragraph, area);
}

pub fn urgency_color(urgency: Urgency) -> Color {
    match urgency {
        Urgency::Normal => Color::Green,
        Urgency::Urgent => Color::Yellow,
        Urgency::Critical => Color::Red,
        Urgency::Expired => Color::DarkGray,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
