// Contests widget: search box, active filters, sort order, and result list.
//
// +- Search ---------------------------------------+
// | Search: nfl_                                    |
// | Sort: Newest First  [Open for Entry x]          |
// | Showing 2 of 4 contests (filtered)              |
// +- Contests --------------------------------------+
// | Name | Creator | Status | Entries | Closes      |

use chrono::{DateTime, Utc};
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState};
use ratatui::Frame;

use overunder_core::countdown::time_until;
use overunder_core::search::ContestCard;

use crate::protocol::ContestsSnapshot;
use crate::tui::ViewState;

pub fn render(frame: &mut Frame, area: Rect, state: &ViewState, now: DateTime<Utc>) {
    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(5), Constraint::Min(3)])
        .split(area);

    render_controls(frame, sections[0], state);

    if state.contests.cards.is_empty() {
        render_empty(frame, sections[1]);
    } else {
        render_table(frame, sections[1], &state.contests, state.selected_contest, now);
    }
}

fn render_controls(frame: &mut Frame, area: Rect, state: &ViewState) {
    let contests = &state.contests;

    let cursor = if state.search_mode { "_" } else { "" };
    let search_style = if state.search_mode {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default().fg(Color::White)
    };
    let search_line = Line::from(vec![
        Span::styled(" Search: ", Style::default().fg(Color::Gray)),
        Span::styled(format!("{}{cursor}", state.search_input), search_style),
    ]);

    let mut sort_line = vec![
        Span::styled(" Sort: ", Style::default().fg(Color::Gray)),
        Span::styled(contests.sort_by.label(), Style::default().fg(Color::White)),
        Span::raw("  "),
    ];
    sort_line.extend(filter_tags(contests));

    let stats = contests
        .stats
        .clone()
        .unwrap_or_else(|| format!("{} contests", contests.total));
    let stats_line = Line::from(Span::styled(
        format!(" {stats}"),
        Style::default().fg(Color::DarkGray),
    ));

    let paragraph = Paragraph::new(vec![search_line, Line::from(sort_line), stats_line])
        .block(Block::default().borders(Borders::ALL).title("Search"));
    frame.render_widget(paragraph, area);
}

/// One highlighted tag per active filter.
pub fn filter_tags(contests: &ContestsSnapshot) -> Vec<Span<'static>> {
    let tag_style = Style::default()
        .fg(Color::Black)
        .bg(Color::Cyan)
        .add_modifier(Modifier::BOLD);
    let mut spans = Vec::new();
    for filter in &contests.active_filters {
        spans.push(Span::styled(format!("[{}]", filter.label()), tag_style));
        spans.push(Span::raw(" "));
    }
    spans
}

fn render_empty(frame: &mut Frame, area: Rect) {
    let lines = vec![
        Line::from(Span::styled(
            "  No contests found",
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            "  Try adjusting your search terms or filters.",
            Style::default().fg(Color::DarkGray),
        )),
    ];
    let paragraph =
        Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Contests"));
    frame.render_widget(paragraph, area);
}

fn render_table(
    frame: &mut Frame,
    area: Rect,
    contests: &ContestsSnapshot,
    selected: usize,
    now: DateTime<Utc>,
) {
    let header = Row::new(vec![
        Cell::from("Name"),
        Cell::from("Creator"),
        Cell::from("Status"),
        Cell::from("Entries"),
        Cell::from("Closes"),
    ])
    .style(Style::default().fg(Color::White).add_modifier(Modifier::BOLD));

    let rows: Vec<Row> = contests
        .cards
        .iter()
        .map(|card| {
            let (status, color) = status_badge(card);
            Row::new(vec![
                Cell::from(card.name.clone()),
                Cell::from(card.creator.clone()),
                Cell::from(status).style(Style::default().fg(color)),
                Cell::from(card.entry_count.to_string()),
                Cell::from(card.deadline.map_or_else(|| "-".to_string(), |d| time_until(d, now))),
            ])
        })
        .collect();

    let widths = [
        Constraint::Min(20),
        Constraint::Length(12),
        Constraint::Length(8),
        Constraint::Length(8),
        Constraint::Length(10),
    ];

    let table = Table::new(rows, widths)
        .header(header)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("Contests ({})", contests.cards.len())),
        )
        .row_highlight_style(Style::default().bg(Color::DarkGray))
        .highlight_symbol(">> ");

    let mut table_state = TableState::default();
    table_state.select(Some(selected.min(contests.cards.len() - 1)));
    frame.render_stateful_widget(table, area, &mut table_state);
}

/// Status text and color for a contest card.
pub fn status_badge(card: &ContestCard) -> (&'static str, Color) {
    if card.has_results {
        ("Results", Color::Magenta)
    } else if card.is_locked {
        ("Locked", Color::Red)
    } else {
        ("Open", Color::Green)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
