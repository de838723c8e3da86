// Keyboard input handling and command dispatch.
//
// Translates crossterm key events into UserCommand messages sent to the
// app orchestrator, or into local ViewState mutations (screen switching,
// selection, search box editing).

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use overunder_core::search::ContestFilter;

use crate::protocol::UserCommand;
use super::{Screen, ViewState};

/// Handle a keyboard event.
///
/// Returns `Some(UserCommand)` when the key press should be forwarded to the
/// app orchestrator. Returns `None` when the key press was handled locally.
pub fn handle_key(key_event: KeyEvent, view_state: &mut ViewState) -> Option<UserCommand> {
    // Windows emits Press and Release for each keypress.
    if key_event.kind != KeyEventKind::Press {
        return None;
    }

    if key_event.modifiers.contains(KeyModifiers::CONTROL) && key_event.code == KeyCode::Char('c') {
        return Some(UserCommand::Quit);
    }

    if view_state.confirm_quit {
        return handle_confirm_quit(key_event, view_state);
    }

    if view_state.confirm_submit.is_some() {
        return handle_confirm_submit(key_event, view_state);
    }

    if view_state.search_mode {
        return handle_search_mode(key_event, view_state);
    }

    match key_event.code {
        KeyCode::Tab => {
            view_state.screen = match view_state.screen {
                Screen::Entry => Screen::Contests,
                Screen::Contests => Screen::Entry,
            };
            None
        }
        KeyCode::Char('q') => {
            view_state.confirm_quit = true;
            None
        }
        _ => match view_state.screen {
            Screen::Entry => handle_entry_key(key_event, view_state),
            Screen::Contests => handle_contests_key(key_event, view_state),
        },
    }
}

fn handle_entry_key(key_event: KeyEvent, view_state: &mut ViewState) -> Option<UserCommand> {
    let count = view_state.question_count();
    let index = view_state.selected_question;
    match key_event.code {
        KeyCode::Up | KeyCode::Char('k') => {
            view_state.selected_question = index.saturating_sub(1);
            None
        }
        KeyCode::Down | KeyCode::Char('j') => {
            if index + 1 < count {
                view_state.selected_question = index + 1;
            }
            None
        }
        KeyCode::Left | KeyCode::Char('o') if count > 0 => {
            Some(UserCommand::SelectAnswer { index, over: true })
        }
        KeyCode::Right | KeyCode::Char('u') if count > 0 => {
            Some(UserCommand::SelectAnswer { index, over: false })
        }
        KeyCode::Backspace | KeyCode::Char('x') if count > 0 => {
            Some(UserCommand::ClearAnswer { index })
        }
        KeyCode::Char('s') if view_state.entry.is_some() => {
            Some(UserCommand::SubmitEntry { confirmed: false })
        }
        _ => None,
    }
}

fn handle_contests_key(key_event: KeyEvent, view_state: &mut ViewState) -> Option<UserCommand> {
    let count = view_state.contests.cards.len();
    match key_event.code {
        KeyCode::Up | KeyCode::Char('k') => {
            view_state.selected_contest = view_state.selected_contest.saturating_sub(1);
            None
        }
        KeyCode::Down | KeyCode::Char('j') => {
            if view_state.selected_contest + 1 < count {
                view_state.selected_contest += 1;
            }
            None
        }
        KeyCode::Char('/') => {
            view_state.search_mode = true;
            None
        }
        KeyCode::Char('s') => Some(UserCommand::CycleSort),
        KeyCode::Char('c') => {
            view_state.search_input.clear();
            Some(UserCommand::ClearFilters)
        }
        KeyCode::Char(c) => filter_for_key(c).map(UserCommand::ToggleFilter),
        _ => None,
    }
}

/// Filter toggled by a single key on the contests screen.
fn filter_for_key(c: char) -> Option<ContestFilter> {
    match c {
        'o' => Some(ContestFilter::Open),
        'l' => Some(ContestFilter::Locked),
        'm' => Some(ContestFilter::MyContests),
        'e' => Some(ContestFilter::Entered),
        'n' => Some(ContestFilter::NotEntered),
        'r' => Some(ContestFilter::HasResults),
        _ => None,
    }
}

/// Quit confirmation: `y`/`q` confirm, `n`/`Esc` cancel, everything else blocked.
fn handle_confirm_quit(key_event: KeyEvent, view_state: &mut ViewState) -> Option<UserCommand> {
    match key_event.code {
        KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Char('q') | KeyCode::Char('Q') => {
            Some(UserCommand::Quit)
        }
        KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
            view_state.confirm_quit = false;
            None
        }
        _ => None,
    }
}

/// Incomplete-entry confirmation: `y`/`Enter` submit, `n`/`Esc` cancel.
fn handle_confirm_submit(key_event: KeyEvent, view_state: &mut ViewState) -> Option<UserCommand> {
    match key_event.code {
        KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
            view_state.confirm_submit = None;
            Some(UserCommand::SubmitEntry { confirmed: true })
        }
        KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
            view_state.confirm_submit = None;
            None
        }
        _ => None,
    }
}

/// Search box editing. Every edit forwards the full term; the app debounces.
fn handle_search_mode(key_event: KeyEvent, view_state: &mut ViewState) -> Option<UserCommand> {
    match key_event.code {
        KeyCode::Esc => {
            view_state.search_mode = false;
            view_state.search_input.clear();
            Some(UserCommand::SetSearchTerm(String::new()))
        }
        KeyCode::Enter => {
            view_state.search_mode = false;
            None
        }
        KeyCode::Backspace => {
            view_state.search_input.pop()?;
            Some(UserCommand::SetSearchTerm(view_state.search_input.clone()))
        }
        KeyCode::Char(c) => {
            view_state.search_input.push(c);
            Some(UserCommand::SetSearchTerm(view_state.search_input.clone()))
        }
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyEventState;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        }
    }

    fn ctrl_key(c: char) -> KeyEvent {
        KeyEvent {
            code: KeyCode::Char(c),
            modifiers: KeyModifiers::CONTROL,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        }
    }

    fn entry_state() -> ViewState {
        let mut state = ViewState::default();
        state.entry = Some(crate::tui::tests::sample_entry());
        state
    }

    fn contests_state() -> ViewState {
        let mut state = ViewState::default();
        state.screen = Screen::Contests;
        state
    }

    // -- global keys --

    #[test]
    fn ctrl_c_quits_in_any_mode() {
        let mut state = contests_state();
        state.search_mode = true;
        assert_eq!(handle_key(ctrl_key('c'), &mut state), Some(UserCommand::Quit));

        let mut state = entry_state();
        state.confirm_submit = Some("Submit anyway?".into());
        assert_eq!(handle_key(ctrl_key('c'), &mut state), Some(UserCommand::Quit));
    }

    #[test]
    fn release_events_ignored() {
        let mut state = entry_state();
        let mut event = key(KeyCode::Char('o'));
        event.kind = KeyEventKind::Release;
        assert_eq!(handle_key(event, &mut state), None);
    }

    #[test]
    fn tab_switches_screens() {
        let mut state = ViewState::default();
        handle_key(key(KeyCode::Tab), &mut state);
        assert_eq!(state.screen, Screen::Contests);
        handle_key(key(KeyCode::Tab), &mut state);
        assert_eq!(state.screen, Screen::Entry);
    }

    #[test]
    fn q_enters_confirm_quit() {
        let mut state = entry_state();
        assert_eq!(handle_key(key(KeyCode::Char('q')), &mut state), None);
        assert!(state.confirm_quit);
    }

    #[test]
    fn confirm_quit_accepts_and_cancels() {
        let mut state = entry_state();
        state.confirm_quit = true;
        assert_eq!(handle_key(key(KeyCode::Char('o')), &mut state), None);
        assert!(state.confirm_quit);
        assert_eq!(handle_key(key(KeyCode::Char('y')), &mut state), Some(UserCommand::Quit));

        assert_eq!(handle_key(key(KeyCode::Esc), &mut state), None);
        assert!(!state.confirm_quit);
    }

    // -- entry screen --

    #[test]
    fn selection_moves_within_bounds() {
        let mut state = entry_state();
        handle_key(key(KeyCode::Char('k')), &mut state);
        assert_eq!(state.selected_question, 0);
        handle_key(key(KeyCode::Char('j')), &mut state);
        assert_eq!(state.selected_question, 1);
        handle_key(key(KeyCode::Down), &mut state);
        assert_eq!(state.selected_question, 1);
        handle_key(key(KeyCode::Up), &mut state);
        assert_eq!(state.selected_question, 0);
    }

    #[test]
    fn answer_keys_target_selected_question() {
        let mut state = entry_state();
        state.selected_question = 1;
        assert_eq!(
            handle_key(key(KeyCode::Char('o')), &mut state),
            Some(UserCommand::SelectAnswer { index: 1, over: true })
        );
        assert_eq!(
            handle_key(key(KeyCode::Right), &mut state),
            Some(UserCommand::SelectAnswer { index: 1, over: false })
        );
        assert_eq!(
            handle_key(key(KeyCode::Char('x')), &mut state),
            Some(UserCommand::ClearAnswer { index: 1 })
        );
    }

    #[test]
    fn answer_keys_ignored_without_form() {
        let mut state = ViewState::default();
        assert_eq!(handle_key(key(KeyCode::Char('o')), &mut state), None);
        assert_eq!(handle_key(key(KeyCode::Char('s')), &mut state), None);
    }

    #[test]
    fn s_requests_unconfirmed_submit() {
        let mut state = entry_state();
        assert_eq!(
            handle_key(key(KeyCode::Char('s')), &mut state),
            Some(UserCommand::SubmitEntry { confirmed: false })
        );
    }

    #[test]
    fn confirm_submit_dialog() {
        let mut state = entry_state();
        state.confirm_submit = Some("You have 1 unanswered questions. Submit anyway?".into());
        assert_eq!(handle_key(key(KeyCode::Char('o')), &mut state), None);
        assert!(state.confirm_submit.is_some());
        assert_eq!(
            handle_key(key(KeyCode::Char('y')), &mut state),
            Some(UserCommand::SubmitEntry { confirmed: true })
        );
        assert!(state.confirm_submit.is_none());

        state.confirm_submit = Some("again".into());
        assert_eq!(handle_key(key(KeyCode::Esc), &mut state), None);
        assert!(state.confirm_submit.is_none());
    }

    // -- contests screen --

    #[test]
    fn filter_keys_toggle_filters() {
        let mut state = contests_state();
        assert_eq!(
            handle_key(key(KeyCode::Char('o')), &mut state),
            Some(UserCommand::ToggleFilter(ContestFilter::Open))
        );
        assert_eq!(
            handle_key(key(KeyCode::Char('r')), &mut state),
            Some(UserCommand::ToggleFilter(ContestFilter::HasResults))
        );
        assert_eq!(handle_key(key(KeyCode::Char('z')), &mut state), None);
    }

    #[test]
    fn sort_and_clear() {
        let mut state = contests_state();
        state.search_input = "nfl".into();
        assert_eq!(handle_key(key(KeyCode::Char('s')), &mut state), Some(UserCommand::CycleSort));
        assert_eq!(handle_key(key(KeyCode::Char('c')), &mut state), Some(UserCommand::ClearFilters));
        assert!(state.search_input.is_empty());
    }

    #[test]
    fn search_mode_forwards_each_edit() {
        let mut state = contests_state();
        handle_key(key(KeyCode::Char('/')), &mut state);
        assert!(state.search_mode);

        assert_eq!(
            handle_key(key(KeyCode::Char('n')), &mut state),
            Some(UserCommand::SetSearchTerm("n".into()))
        );
        assert_eq!(
            handle_key(key(KeyCode::Char('f')), &mut state),
            Some(UserCommand::SetSearchTerm("nf".into()))
        );
        assert_eq!(
            handle_key(key(KeyCode::Backspace), &mut state),
            Some(UserCommand::SetSearchTerm("n".into()))
        );

        assert_eq!(handle_key(key(KeyCode::Enter), &mut state), None);
        assert!(!state.search_mode);
        assert_eq!(state.search_input, "n");
    }

    #[test]
    fn search_mode_backspace_on_empty_is_noop() {
        let mut state = contests_state();
        state.search_mode = true;
        assert_eq!(handle_key(key(KeyCode::Backspace), &mut state), None);
    }

    #[test]
    fn search_mode_esc_clears_term() {
        let mut state = contests_state();
        state.search_mode = true;
        state.search_input = "world".into();
        assert_eq!(
            handle_key(key(KeyCode::Esc), &mut state),
            Some(UserCommand::SetSearchTerm(String::new()))
        );
        assert!(!state.search_mode);
        assert!(state.search_input.is_empty());
    }

    #[test]
    fn search_mode_captures_q() {
        let mut state = contests_state();
        state.search_mode = true;
        assert_eq!(
            handle_key(key(KeyCode::Char('q')), &mut state),
            Some(UserCommand::SetSearchTerm("q".into()))
        );
        assert!(!state.confirm_quit);
    }
}
