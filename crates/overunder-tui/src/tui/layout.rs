// Screen layout: panel arrangement and sizing.
//
// Outer frame shared by both screens:
//
// +--------------------------------------------------+
// | Status Bar (1 row)                                |
// +--------------------------------------------------+
// | Main Area (fill)                                  |
// +--------------------------------------------------+
// | Help Bar (1 row)                                  |
// +--------------------------------------------------+
//
// The entry screen further splits the main area:
//
// +--------------------------------------------------+
// | Countdown Banner (4 rows)                         |
// +--------------------------------------------------+
// | Question List (fill)                              |
// +--------------------------------------------------+
// | Progress (3 rows)                                 |
// +--------------------------------------------------+

use ratatui::layout::{Constraint, Direction, Layout, Rect};

/// Resolved screen areas shared by every screen.
#[derive(Debug, Clone)]
pub struct AppLayout {
    /// Top row: screen tabs and autosave indicator.
    pub status_bar: Rect,
    /// Middle section: content of the active screen.
    pub main_area: Rect,
    /// Bottom row: keyboard shortcut hints.
    pub help_bar: Rect,
}

/// Areas of the entry screen within the main area.
#[derive(Debug, Clone)]
pub struct EntryLayout {
    pub banner: Rect,
    pub questions: Rect,
    pub progress: Rect,
}

/// Build the outer layout from the available terminal area.
pub fn build_layout(area: Rect) -> AppLayout {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // status bar
            Constraint::Min(5),    // main area
            Constraint::Length(1), // help bar
        ])
        .split(area);

    AppLayout {
        status_bar: vertical[0],
        main_area: vertical[1],
        help_bar: vertical[2],
    }
}

/// Split the main area for the entry screen.
pub fn split_entry(area: Rect) -> EntryLayout {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4), // countdown banner
            Constraint::Min(3),    // question list
            Constraint::Length(3), // progress gauge
        ])
        .split(area);

    EntryLayout {
        banner: vertical[0],
        questions: vertical[1],
        progress: vertical[2],
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
