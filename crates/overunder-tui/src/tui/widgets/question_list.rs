// Question list widget: one row per over/under question.
//
// Columns: #, Question, Over, Under
// The chosen side of each answered question is highlighted.

use ratatui::layout::{Constraint, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Cell, Row, Table, TableState};
use ratatui::Frame;

use crate::protocol::{EntrySnapshot, QuestionView};

/// Render the question table into the given area.
pub fn render(frame: &mut Frame, area: Rect, entry: &EntrySnapshot, selected: usize) {
    let header = Row::new(vec![
        Cell::from("#"),
        Cell::from("Question"),
        Cell::from("Over"),
        Cell::from("Under"),
    ])
    .style(Style::default().fg(Color::White).add_modifier(Modifier::BOLD));

    let rows: Vec<Row> = entry
        .questions
        .iter()
        .enumerate()
        .map(|(i, q)| {
            let (over, under) = answer_cells(q);
            Row::new(vec![
                Cell::from(format!("{}", i + 1)),
                Cell::from(q.text.clone()),
                over,
                under,
            ])
        })
        .collect();

    let widths = [
        Constraint::Length(4),
        Constraint::Min(20),
        Constraint::Length(8),
        Constraint::Length(8),
    ];

    let title = if entry.submitted {
        "Questions (submitted)"
    } else {
        "Questions"
    };

    let table = Table::new(rows, widths)
        .header(header)
        .block(Block::default().borders(Borders::ALL).title(title))
        .row_highlight_style(Style::default().bg(Color::DarkGray))
        .highlight_symbol(">> ");

    let mut table_state = TableState::default();
    if !entry.questions.is_empty() {
        table_state.select(Some(selected.min(entry.questions.len() - 1)));
    }
    frame.render_stateful_widget(table, area, &mut table_state);
}

/// Over/Under cells, with the chosen side filled in.
fn answer_cells(question: &QuestionView) -> (Cell<'static>, Cell<'static>) {
    let chosen = Style::default()
        .fg(Color::Black)
        .bg(Color::Cyan)
        .add_modifier(Modifier::BOLD);
    let unchosen = Style::default().fg(Color::DarkGray);

    match question.answer {
        Some(true) => (
            Cell::from(" OVER ").style(chosen),
            Cell::from(" under").style(unchosen),
        ),
        Some(false) => (
            Cell::from(" over").style(unchosen),
            Cell::from(" UNDER ").style(chosen),
        ),
        None => (
            Cell::from(" over").style(unchosen),
            Cell::from(" under").style(unchosen),
        ),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
