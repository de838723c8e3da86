// Status bar widget: screen tabs and the autosave indicator.

use std::time::{Duration, Instant};

use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use overunder_core::autosave::SaveState;

use crate::tui::{Screen, ViewState};

/// How long "Saved" stays visible after a successful save.
pub const SAVED_LABEL_DURATION: Duration = Duration::from_secs(3);

/// Render the status bar into the given area.
///
/// Layout: [tab bar] | [autosave indicator]
pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let mut spans = vec![Span::raw(" ")];
    spans.extend(tab_spans(state.screen));

    let restored = state.entry.as_ref().is_some_and(|e| e.restored_draft);
    if let Some((label, color)) =
        autosave_indicator(state.save_state, state.save_state_since, Instant::now(), restored)
    {
        spans.push(Span::styled("| ", Style::default().fg(Color::Gray)));
        spans.push(Span::styled(
            label,
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        ));
    }

    let paragraph = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::Black));
    frame.render_widget(paragraph, area);
}

/// Label and color for the autosave state, or `None` when nothing is shown.
///
/// "Saved" fades after [`SAVED_LABEL_DURATION`]; an untouched restored
/// draft is flagged until the first save activity.
pub fn autosave_indicator(
    save_state: SaveState,
    since: Instant,
    now: Instant,
    restored: bool,
) -> Option<(&'static str, Color)> {
    match save_state {
        SaveState::Saving => Some(("Saving...", Color::Yellow)),
        SaveState::Failed => Some(("Save failed", Color::Red)),
        SaveState::Saved if now.saturating_duration_since(since) < SAVED_LABEL_DURATION => {
            Some(("Saved", Color::Green))
        }
        SaveState::Saved => None,
        SaveState::Pending => Some(("Unsaved changes", Color::DarkGray)),
        SaveState::Idle if restored => Some(("Draft restored", Color::Cyan)),
        SaveState::Idle => None,
    }
}

/// Tab indicator spans with the active screen highlighted.
pub fn tab_spans(active: Screen) -> Vec<Span<'static>> {
    let tabs = [(Screen::Entry, "Entry"), (Screen::Contests, "Contests")];

    let mut spans = Vec::new();
    for (screen, label) in tabs {
        let style = if screen == active {
            Style::default()
                .fg(Color::Black)
                .bg(Color::White)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::White)
        };
        spans.push(Span::styled(format!("[{label}]"), style));
        spans.push(Span::raw(" "));
    }
    spans
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
