// TUI widget modules for each screen panel.

pub mod confirm_dialog;
pub mod contests;
pub mod countdown_banner;
pub mod progress;
pub mod question_list;
pub mod status_bar;
pub mod toasts;
