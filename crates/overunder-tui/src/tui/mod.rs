// TUI: layout, input handling, and widget rendering.
//
// The TUI owns a `ViewState` that mirrors what the app orchestrator last
// reported. The orchestrator pushes `UiUpdate` messages over an mpsc channel;
// the TUI applies them to `ViewState` and re-renders at ~30 fps.

pub mod input;
pub mod layout;
pub mod widgets;

use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use crossterm::event::{Event, EventStream};
use futures_util::StreamExt;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use overunder_core::autosave::SaveState;
use overunder_core::countdown::CountdownOptions;

use crate::notifications::{Notifications, DEFAULT_DURATION};
use crate::protocol::{ContestsSnapshot, EntrySnapshot, UiUpdate, UserCommand};

use layout::{build_layout, AppLayout};

// ---------------------------------------------------------------------------
// ViewState
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Entry,
    Contests,
}

/// TUI-local state that mirrors the application state for rendering.
pub struct ViewState {
    pub screen: Screen,
    /// Latest entry form, if one is loaded.
    pub entry: Option<EntrySnapshot>,
    pub contests: ContestsSnapshot,
    pub save_state: SaveState,
    /// When `save_state` last changed; drives hiding the "Saved" label.
    pub save_state_since: Instant,
    pub selected_question: usize,
    pub selected_contest: usize,
    /// Whether keystrokes go to the contest search box.
    pub search_mode: bool,
    pub search_input: String,
    /// Prompt of the pending incomplete-entry confirmation.
    pub confirm_submit: Option<String>,
    pub confirm_quit: bool,
    pub notifications: Notifications,
    pub countdown: CountdownOptions,
    /// Wall clock the countdown is drawn against; advanced on the countdown tick.
    pub clock: DateTime<Utc>,
}

impl Default for ViewState {
    fn default() -> Self {
        ViewState {
            screen: Screen::Entry,
            entry: None,
            contests: ContestsSnapshot::default(),
            save_state: SaveState::Idle,
            save_state_since: Instant::now(),
            selected_question: 0,
            selected_contest: 0,
            search_mode: false,
            search_input: String::new(),
            confirm_submit: None,
            confirm_quit: false,
            notifications: Notifications::default(),
            countdown: CountdownOptions::default(),
            clock: Utc::now(),
        }
    }
}

impl ViewState {
    pub fn new(countdown: CountdownOptions) -> Self {
        ViewState {
            countdown,
            ..ViewState::default()
        }
    }

    pub fn question_count(&self) -> usize {
        self.entry.as_ref().map_or(0, |e| e.questions.len())
    }
}

// ---------------------------------------------------------------------------
// UiUpdate processing
// ---------------------------------------------------------------------------

/// Apply a single UiUpdate to the ViewState.
fn apply_ui_update(state: &mut ViewState, update: UiUpdate) {
    match update {
        UiUpdate::Entry(entry) => {
            state.selected_question = state
                .selected_question
                .min(entry.questions.len().saturating_sub(1));
            state.entry = Some(*entry);
        }
        UiUpdate::Contests(contests) => {
            state.selected_contest = state
                .selected_contest
                .min(contests.cards.len().saturating_sub(1));
            state.contests = *contests;
        }
        UiUpdate::SaveState(save_state) => {
            if state.save_state != save_state {
                state.save_state = save_state;
                state.save_state_since = Instant::now();
            }
        }
        UiUpdate::ConfirmSubmit(prompt) => {
            state.confirm_submit = Some(prompt);
        }
        UiUpdate::Notify { message, kind } => {
            state.notifications.show(message, kind, DEFAULT_DURATION);
        }
    }
}

// ---------------------------------------------------------------------------
// Render frame
// ---------------------------------------------------------------------------

/// Render the complete frame.
fn render_frame(frame: &mut Frame, state: &ViewState, now: DateTime<Utc>) {
    let layout = build_layout(frame.area());

    widgets::status_bar::render(frame, layout.status_bar, state);
    match state.screen {
        Screen::Entry => render_entry_screen(frame, &layout, state, now),
        Screen::Contests => widgets::contests::render(frame, layout.main_area, state, now),
    }
    render_help_bar(frame, &layout, state);

    widgets::toasts::render(frame, frame.area(), &state.notifications);

    if let Some(ref prompt) = state.confirm_submit {
        widgets::confirm_dialog::render(frame, frame.area(), " Submit entry? ", prompt);
    } else if state.confirm_quit {
        widgets::confirm_dialog::render(frame, frame.area(), " Quit? ", "Really quit?");
    }
}

fn render_entry_screen(frame: &mut Frame, layout: &AppLayout, state: &ViewState, now: DateTime<Utc>) {
    let Some(ref entry) = state.entry else {
        let paragraph = Paragraph::new(Line::from(Span::styled(
            "  No entry form loaded. Press Tab to browse contests.",
            Style::default().fg(Color::DarkGray),
        )));
        frame.render_widget(paragraph, layout.main_area);
        return;
    };

    let entry_layout = layout::split_entry(layout.main_area);
    widgets::countdown_banner::render(frame, entry_layout.banner, entry, &state.countdown, now);
    widgets::question_list::render(frame, entry_layout.questions, entry, state.selected_question);
    widgets::progress::render(frame, entry_layout.progress, &entry.progress);
}

fn render_help_bar(frame: &mut Frame, layout: &AppLayout, state: &ViewState) {
    let text = help_text(state);
    let paragraph = Paragraph::new(Line::from(vec![Span::styled(
        text,
        Style::default().fg(Color::White).add_modifier(Modifier::DIM),
    )]))
    .style(Style::default().bg(Color::DarkGray));
    frame.render_widget(paragraph, layout.help_bar);
}

/// Key hints for the current screen and mode.
pub fn help_text(state: &ViewState) -> &'static str {
    if state.confirm_submit.is_some() || state.confirm_quit {
        return " y:Confirm | n/Esc:Cancel";
    }
    match state.screen {
        Screen::Entry => " q:Quit | Tab:Contests | j/k:Move | o:Over | u:Under | x:Clear | s:Submit",
        Screen::Contests if state.search_mode => " Enter:Done | Esc:Clear search",
        Screen::Contests => {
            " q:Quit | Tab:Entry | /:Search | s:Sort | o/l/m/e/n/r:Filters | c:Clear"
        }
    }
}

// ---------------------------------------------------------------------------
// Main TUI loop
// ---------------------------------------------------------------------------

/// Countdown refresh period, floored so a zero setting cannot spin the loop.
fn countdown_period(options: &CountdownOptions) -> Duration {
    options.update_interval.max(Duration::from_millis(100))
}

/// Run the TUI event loop.
///
/// 1. Initializes the terminal (raw mode, alternate screen).
/// 2. Installs a panic hook to restore the terminal on crash.
/// 3. Runs an async select loop: UI updates, keyboard input, render ticks.
/// 4. Restores the terminal on exit.
pub async fn run(
    mut ui_rx: mpsc::Receiver<UiUpdate>,
    cmd_tx: mpsc::Sender<UserCommand>,
    countdown: CountdownOptions,
) -> anyhow::Result<()> {
    let mut terminal = ratatui::init();

    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = ratatui::restore();
        original_hook(panic_info);
    }));

    let mut view_state = ViewState::new(countdown);
    let mut event_stream = EventStream::new();

    let mut render_tick = tokio::time::interval(Duration::from_millis(33));
    render_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    let mut countdown_tick = tokio::time::interval(countdown_period(&countdown));
    countdown_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            update = ui_rx.recv() => {
                match update {
                    Some(ui_update) => apply_ui_update(&mut view_state, ui_update),
                    None => {
                        debug!("UI channel closed");
                        break;
                    }
                }
            }

            maybe_event = event_stream.next() => {
                match maybe_event {
                    Some(Ok(Event::Key(key_event))) => {
                        if let Some(cmd) = input::handle_key(key_event, &mut view_state) {
                            let quit = cmd == UserCommand::Quit;
                            let _ = cmd_tx.send(cmd).await;
                            if quit {
                                break;
                            }
                        }
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        warn!("terminal input error: {e}");
                        let _ = cmd_tx.send(UserCommand::Quit).await;
                        break;
                    }
                    None => break,
                }
            }

            _ = countdown_tick.tick() => {
                view_state.clock = Utc::now();
            }

            _ = render_tick.tick() => {
                view_state.notifications.prune(Instant::now());
                terminal.draw(|frame| render_frame(frame, &view_state, view_state.clock))?;
            }
        }
    }

    ratatui::restore();

    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notifications::NotificationKind;
    use crate::protocol::QuestionView;
    use chrono::TimeZone;
    use overunder_core::progress::EntryProgress;
    use overunder_core::search::ContestCard;

    pub(crate) fn sample_entry() -> EntrySnapshot {
        EntrySnapshot {
            contest_id: "12".into(),
            contest_name: "NFL Week 8 Totals".into(),
            lock_timestamp: Utc.with_ymd_and_hms(2026, 10, 25, 17, 0, 0).unwrap(),
            questions: vec![
                QuestionView {
                    question_id: 1,
                    text: "Chiefs over 47.5?".into(),
                    answer: Some(true),
                },
                QuestionView {
                    question_id: 2,
                    text: "Allen over 265.5 yards?".into(),
                    answer: None,
                },
            ],
            progress: EntryProgress { answered: 1, total: 2 },
            submitted: false,
            restored_draft: false,
        }
    }

    fn buffer_text(terminal: &ratatui::Terminal<ratatui::backend::TestBackend>) -> String {
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect()
    }

    #[test]
    fn view_state_default_is_sensible() {
        let state = ViewState::default();
        assert_eq!(state.screen, Screen::Entry);
        assert!(state.entry.is_none());
        assert!(state.contests.cards.is_empty());
        assert_eq!(state.save_state, SaveState::Idle);
        assert!(!state.search_mode);
        assert!(state.confirm_submit.is_none());
        assert!(!state.confirm_quit);
        assert!(state.notifications.is_empty());
    }

    #[test]
    fn entry_update_clamps_selection() {
        let mut state = ViewState::default();
        state.selected_question = 9;
        apply_ui_update(&mut state, UiUpdate::Entry(Box::new(sample_entry())));
        assert_eq!(state.selected_question, 1);
        assert_eq!(state.question_count(), 2);
    }

    #[test]
    fn contests_update_clamps_selection() {
        let mut state = ViewState::default();
        state.selected_contest = 4;
        apply_ui_update(&mut state, UiUpdate::Contests(Box::default()));
        assert_eq!(state.selected_contest, 0);
    }

    #[test]
    fn save_state_update_records_transition_time() {
        let mut state = ViewState::default();
        let before = state.save_state_since;
        std::thread::sleep(Duration::from_millis(2));
        apply_ui_update(&mut state, UiUpdate::SaveState(SaveState::Saving));
        assert_eq!(state.save_state, SaveState::Saving);
        assert!(state.save_state_since > before);
    }

    #[test]
    fn confirm_and_notify_updates() {
        let mut state = ViewState::default();
        apply_ui_update(&mut state, UiUpdate::ConfirmSubmit("Submit anyway?".into()));
        assert_eq!(state.confirm_submit.as_deref(), Some("Submit anyway?"));

        apply_ui_update(
            &mut state,
            UiUpdate::Notify {
                message: "Saved".into(),
                kind: NotificationKind::Success,
            },
        );
        assert_eq!(state.notifications.len(), 1);
    }

    #[test]
    fn countdown_period_is_floored() {
        let mut options = CountdownOptions::default();
        assert_eq!(countdown_period(&options), Duration::from_secs(1));
        options.update_interval = Duration::ZERO;
        assert_eq!(countdown_period(&options), Duration::from_millis(100));
    }

    #[test]
    fn help_text_follows_mode() {
        let mut state = ViewState::default();
        assert!(help_text(&state).contains("s:Submit"));
        state.screen = Screen::Contests;
        assert!(help_text(&state).contains("/:Search"));
        state.search_mode = true;
        assert!(help_text(&state).contains("Esc:Clear search"));
        state.confirm_quit = true;
        assert!(help_text(&state).contains("y:Confirm"));
    }

    #[test]
    fn render_entry_screen_shows_questions() {
        let backend = ratatui::backend::TestBackend::new(100, 30);
        let mut terminal = ratatui::Terminal::new(backend).unwrap();
        let mut state = ViewState::default();
        state.entry = Some(sample_entry());
        let now = Utc.with_ymd_and_hms(2026, 10, 25, 16, 30, 0).unwrap();

        terminal.draw(|frame| render_frame(frame, &state, now)).unwrap();
        let text = buffer_text(&terminal);
        assert!(text.contains("NFL Week 8 Totals"));
        assert!(text.contains("Chiefs over 47.5?"));
        assert!(text.contains("1 of 2 questions answered"));
        assert!(text.contains("30m 0s"));
    }

    #[test]
    fn render_without_entry_form() {
        let backend = ratatui::backend::TestBackend::new(100, 30);
        let mut terminal = ratatui::Terminal::new(backend).unwrap();
        let state = ViewState::default();
        terminal.draw(|frame| render_frame(frame, &state, Utc::now())).unwrap();
        assert!(buffer_text(&terminal).contains("No entry form loaded"));
    }

    #[test]
    fn render_contests_screen_with_dialog() {
        let backend = ratatui::backend::TestBackend::new(100, 30);
        let mut terminal = ratatui::Terminal::new(backend).unwrap();
        let mut state = ViewState::default();
        state.screen = Screen::Contests;
        state.contests.cards = vec![ContestCard {
            contest_id: "1".into(),
            name: "World Series Game 1".into(),
            description: String::new(),
            creator: "dan".into(),
            is_locked: true,
            entry_count: 71,
            deadline: None,
            created_at: None,
            is_my_contest: false,
            has_entered: false,
            has_results: true,
        }];
        state.contests.total = 1;
        state.confirm_quit = true;

        terminal.draw(|frame| render_frame(frame, &state, Utc::now())).unwrap();
        let text = buffer_text(&terminal);
        assert!(text.contains("World Series Game 1"));
        assert!(text.contains("Really quit?"));
    }
}
