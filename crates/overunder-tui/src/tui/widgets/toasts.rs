// Toast widget: stacked notifications in the top-right corner.

use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use ratatui::Frame;

use crate::notifications::{NotificationKind, Notifications};

const TOAST_WIDTH: u16 = 40;
const TOAST_HEIGHT: u16 = 3;

/// Render every live toast, newest at the top, below the status bar.
pub fn render(frame: &mut Frame, area: Rect, notifications: &Notifications) {
    let mut y = area.y + 1;
    for toast in notifications.iter().collect::<Vec<_>>().into_iter().rev() {
        let Some(rect) = toast_rect(area, y) else {
            break;
        };
        y += TOAST_HEIGHT;

        let color = kind_color(toast.kind);
        frame.render_widget(Clear, rect);
        let paragraph = Paragraph::new(Line::from(Span::raw(toast.message.clone())))
            .wrap(Wrap { trim: true })
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(color))
                    .title(Span::styled(
                        format!(" {} ", toast.kind.title()),
                        Style::default().fg(color).add_modifier(Modifier::BOLD),
                    )),
            )
            .style(Style::default().bg(Color::Black));
        frame.render_widget(paragraph, rect);
    }
}

/// Slot for a toast starting at row `y`, if it fits inside `area`.
fn toast_rect(area: Rect, y: u16) -> Option<Rect> {
    let width = TOAST_WIDTH.min(area.width);
    if width == 0 || y + TOAST_HEIGHT > area.y + area.height {
        return None;
    }
    Some(Rect::new(area.x + area.width - width, y, width, TOAST_HEIGHT))
}

pub fn kind_color(kind: NotificationKind) -> Color {
    match kind {
        NotificationKind::Success => Color::Green,
        NotificationKind::Error => Color::Red,
        NotificationKind::Warning => Color::Yellow,
        NotificationKind::Info => Color::Cyan,
    }
}
