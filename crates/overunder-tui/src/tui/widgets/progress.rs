// Progress widget: answered-question gauge.

use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::widgets::{Block, Borders, Gauge};
use ratatui::Frame;

use overunder_core::progress::EntryProgress;

pub fn render(frame: &mut Frame, area: Rect, progress: &EntryProgress) {
    let color = if progress.is_complete() {
        Color::Green
    } else {
        Color::Cyan
    };
    let gauge = Gauge::default()
        .block(Block::default().borders(Borders::ALL).title("Progress"))
        .gauge_style(Style::default().fg(color).bg(Color::Black))
        .percent(progress.percentage())
        .label(progress.label());
    frame.render_widget(gauge, area);
}
