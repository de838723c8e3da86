// App orchestrator: owns the entry form, its autosave controller and the
// contest listing, and turns user commands into state changes.
//
// The TUI never touches this state directly. It sends `UserCommand`s and
// renders whatever `UiUpdate`s come back.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, watch};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use overunder_core::autosave::{Autosave, SaveState};
use overunder_core::form::{EntryForm, FormScope};
use overunder_core::progress::EntryProgress;
use overunder_core::search::{ContestCard, ContestSearch};
use overunder_core::snapshot::FormSnapshot;
use overunder_core::transport::EntryTransport;

use crate::notifications::NotificationKind;
use crate::protocol::{ContestsSnapshot, EntrySnapshot, QuestionView, UiUpdate, UserCommand};

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// Result of trying to change an answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOutcome {
    Applied,
    NoForm,
    Locked,
    AlreadySubmitted,
}

/// Result of trying to submit the entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Submitted,
    /// Unanswered questions remain; carries the prompt to show.
    NeedsConfirmation(String),
    NoForm,
    Locked,
    AlreadySubmitted,
    Failed(String),
}

// ---------------------------------------------------------------------------
// AppState
// ---------------------------------------------------------------------------

pub struct AppState {
    form: Option<EntryForm>,
    autosave: Autosave,
    transport: Arc<dyn EntryTransport>,
    contests: Vec<ContestCard>,
    search: ContestSearch,
    search_debounce: Duration,
    /// Search term typed but not yet applied, and when to apply it.
    pending_search: Option<(String, Instant)>,
    submitted: bool,
}

impl AppState {
    pub fn new(
        form: Option<EntryForm>,
        autosave: Autosave,
        transport: Arc<dyn EntryTransport>,
        contests: Vec<ContestCard>,
        search_debounce: Duration,
    ) -> Self {
        let search = ContestSearch::new(&contests);
        AppState {
            form,
            autosave,
            transport,
            contests,
            search,
            search_debounce,
            pending_search: None,
            submitted: false,
        }
    }

    pub fn form(&self) -> Option<&EntryForm> {
        self.form.as_ref()
    }

    pub fn autosave(&self) -> &Autosave {
        &self.autosave
    }

    pub fn is_submitted(&self) -> bool {
        self.submitted
    }

    // -- Entry form --

    /// Set (`Some`) or clear (`None`) the answer for question `index`.
    pub fn apply_answer(&mut self, index: usize, answer: Option<bool>, now: DateTime<Utc>) -> EditOutcome {
        let Some(form) = self.form.as_mut() else {
            return EditOutcome::NoForm;
        };
        if self.submitted {
            return EditOutcome::AlreadySubmitted;
        }
        if form.is_locked_at(now) {
            return EditOutcome::Locked;
        }

        match answer {
            Some(over) => form.select(index, over),
            None => form.clear(index),
        }
        self.autosave.field_changed(FormSnapshot::capture(form.inputs()));
        EditOutcome::Applied
    }

    /// Submit the entry, waiting out any in-flight autosave first.
    pub async fn submit(&mut self, confirmed: bool, now: DateTime<Utc>) -> SubmitOutcome {
        let Some(form) = self.form.as_ref() else {
            return SubmitOutcome::NoForm;
        };
        if self.submitted {
            return SubmitOutcome::AlreadySubmitted;
        }
        if form.is_locked_at(now) {
            return SubmitOutcome::Locked;
        }
        if !confirmed {
            if let Some(prompt) = EntryProgress::from_form(form).confirm_message() {
                return SubmitOutcome::NeedsConfirmation(prompt);
            }
        }
        let Some(contest_id) = form.contest_id().map(str::to_string) else {
            return SubmitOutcome::NoForm;
        };

        self.autosave.before_submit().await;
        // No draft writes may race the submission or land after it.
        self.autosave.disable();

        let snapshot = FormSnapshot::capture(form.inputs());
        match self.transport.submit_entry(&contest_id, &snapshot).await {
            Ok(()) => {
                info!(contest_id = %contest_id, "entry submitted");
                self.autosave.clear_saved_data();
                self.submitted = true;
                SubmitOutcome::Submitted
            }
            Err(e) => {
                warn!(contest_id = %contest_id, "entry submission failed: {e}");
                self.autosave.enable();
                SubmitOutcome::Failed(e.to_string())
            }
        }
    }

    pub fn entry_snapshot(&self) -> Option<EntrySnapshot> {
        let form = self.form.as_ref()?;
        let questions = form
            .questions()
            .iter()
            .enumerate()
            .map(|(i, q)| QuestionView {
                question_id: q.question_id,
                text: q.question_text.clone(),
                answer: form.answer_for(i),
            })
            .collect();

        Some(EntrySnapshot {
            contest_id: form.contest_id().unwrap_or_default().to_string(),
            contest_name: form.contest_name().to_string(),
            lock_timestamp: form.lock_timestamp(),
            questions,
            progress: EntryProgress::from_form(form),
            submitted: self.submitted,
            restored_draft: self.autosave.restored_draft(),
        })
    }

    // -- Contest listing --

    /// Queue a search term; it is applied once typing pauses.
    pub fn queue_search(&mut self, term: String) {
        self.pending_search = Some((term, Instant::now() + self.search_debounce));
    }

    fn search_deadline(&self) -> Option<Instant> {
        self.pending_search.as_ref().map(|(_, at)| *at)
    }

    /// Apply the queued search term, if any.
    pub fn apply_pending_search(&mut self) {
        if let Some((term, _)) = self.pending_search.take() {
            self.search.set_search_term(&term);
            self.search.refresh(&self.contests);
            debug!(term = %self.search.term(), visible = self.search.visible().len(), "search applied");
        }
    }

    pub fn search_mut(&mut self) -> &mut ContestSearch {
        &mut self.search
    }

    pub fn refresh_contests(&mut self) {
        self.search.refresh(&self.contests);
    }

    pub fn clear_filters(&mut self) {
        self.pending_search = None;
        self.search.clear_all();
        self.search.refresh(&self.contests);
    }

    pub fn contests_snapshot(&self) -> ContestsSnapshot {
        ContestsSnapshot {
            cards: self
                .search
                .visible()
                .iter()
                .map(|&i| self.contests[i].clone())
                .collect(),
            total: self.contests.len(),
            stats: self.search.stats(),
            active_filters: self.search.active_filters().collect(),
            sort_by: self.search.sort_by(),
            search_term: self.search.term().to_string(),
        }
    }

    /// Flush unsaved answers and stop autosave.
    /// Flush unsaved answers, stop autosave and wait out the unload beacon.
    pub async fn shutdown(self) {
        self.autosave.flush_on_unload();
        self.autosave.destroy().await;
        self.transport.drain_beacons().await;
    }
}

// ---------------------------------------------------------------------------
// Main event loop
// ---------------------------------------------------------------------------

/// Run the application event loop.
///
/// Listens for user commands, autosave state changes and the search
/// debounce deadline, pushing UI updates through `ui_tx`.
pub async fn run(
    mut cmd_rx: mpsc::Receiver<UserCommand>,
    ui_tx: mpsc::Sender<UiUpdate>,
    mut state: AppState,
) -> anyhow::Result<()> {
    info!("Application event loop started");

    send_entry(&state, &ui_tx).await;
    send_contests(&state, &ui_tx).await;
    if state.autosave().restored_draft() {
        notify(&ui_tx, "Draft restored from your last session", NotificationKind::Info).await;
    }

    let mut save_rx = state.autosave().subscribe();

    loop {
        let search_deadline = state.search_deadline();

        tokio::select! {
            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(UserCommand::Quit) => {
                        info!("Quit command received, shutting down");
                        break;
                    }
                    Some(cmd) => {
                        handle_user_command(&mut state, cmd, &ui_tx).await;
                    }
                    None => {
                        info!("Command channel closed, shutting down");
                        break;
                    }
                }
            }

            save_state = next_save_state(&mut save_rx) => {
                match save_state {
                    Some(s) => {
                        let _ = ui_tx.send(UiUpdate::SaveState(s)).await;
                    }
                    None => {
                        debug!("autosave state channel closed");
                        save_rx = None;
                    }
                }
            }

            _ = tokio::time::sleep_until(search_deadline.unwrap_or_else(Instant::now)), if search_deadline.is_some() => {
                state.apply_pending_search();
                send_contests(&state, &ui_tx).await;
            }
        }
    }

    state.shutdown().await;
    info!("Application event loop exiting");
    Ok(())
}

/// Wait for the next autosave state change. Never resolves without a
/// receiver; `None` means the controller has gone away.
async fn next_save_state(rx: &mut Option<watch::Receiver<SaveState>>) -> Option<SaveState> {
    match rx {
        Some(rx) => match rx.changed().await {
            Ok(()) => Some(*rx.borrow_and_update()),
            Err(_) => None,
        },
        None => std::future::pending().await,
    }
}

async fn handle_user_command(state: &mut AppState, cmd: UserCommand, ui_tx: &mpsc::Sender<UiUpdate>) {
    match cmd {
        UserCommand::SelectAnswer { index, over } => {
            let outcome = state.apply_answer(index, Some(over), Utc::now());
            report_edit(state, outcome, ui_tx).await;
        }
        UserCommand::ClearAnswer { index } => {
            let outcome = state.apply_answer(index, None, Utc::now());
            report_edit(state, outcome, ui_tx).await;
        }
        UserCommand::SubmitEntry { confirmed } => match state.submit(confirmed, Utc::now()).await {
            SubmitOutcome::Submitted => {
                send_entry(state, ui_tx).await;
                notify(ui_tx, "Your entry has been submitted", NotificationKind::Success).await;
            }
            SubmitOutcome::NeedsConfirmation(prompt) => {
                let _ = ui_tx.send(UiUpdate::ConfirmSubmit(prompt)).await;
            }
            SubmitOutcome::NoForm => {}
            SubmitOutcome::Locked => {
                notify(ui_tx, "This contest is locked", NotificationKind::Warning).await;
            }
            SubmitOutcome::AlreadySubmitted => {
                notify(ui_tx, "This entry was already submitted", NotificationKind::Info).await;
            }
            SubmitOutcome::Failed(reason) => {
                notify(ui_tx, format!("Submission failed: {reason}"), NotificationKind::Error).await;
            }
        },
        UserCommand::SetSearchTerm(term) => {
            state.queue_search(term);
        }
        UserCommand::ToggleFilter(filter) => {
            let active = state.search_mut().toggle_filter(filter);
            debug!(?filter, active, "filter toggled");
            state.refresh_contests();
            send_contests(state, ui_tx).await;
        }
        UserCommand::CycleSort => {
            let next = state.search_mut().sort_by().next();
            state.search_mut().set_sort(next);
            state.refresh_contests();
            send_contests(state, ui_tx).await;
        }
        UserCommand::ClearFilters => {
            state.clear_filters();
            send_contests(state, ui_tx).await;
        }
        UserCommand::Quit => {
            // Handled in the main loop
        }
    }
}

async fn report_edit(state: &AppState, outcome: EditOutcome, ui_tx: &mpsc::Sender<UiUpdate>) {
    match outcome {
        EditOutcome::Applied => send_entry(state, ui_tx).await,
        EditOutcome::NoForm => {}
        EditOutcome::Locked => {
            notify(ui_tx, "This contest is locked; answers can no longer change", NotificationKind::Warning).await;
        }
        EditOutcome::AlreadySubmitted => {
            notify(ui_tx, "This entry was already submitted", NotificationKind::Info).await;
        }
    }
}

async fn send_entry(state: &AppState, ui_tx: &mpsc::Sender<UiUpdate>) {
    if let Some(snapshot) = state.entry_snapshot() {
        let _ = ui_tx.send(UiUpdate::Entry(Box::new(snapshot))).await;
    }
}

async fn send_contests(state: &AppState, ui_tx: &mpsc::Sender<UiUpdate>) {
    let _ = ui_tx.send(UiUpdate::Contests(Box::new(state.contests_snapshot()))).await;
}

async fn notify(ui_tx: &mpsc::Sender<UiUpdate>, message: impl Into<String>, kind: NotificationKind) {
    let _ = ui_tx
        .send(UiUpdate::Notify {
            message: message.into(),
            kind,
        })
        .await;
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
