// Messages exchanged between the app orchestrator and the TUI.

use chrono::{DateTime, Utc};

use overunder_core::autosave::SaveState;
use overunder_core::progress::EntryProgress;
use overunder_core::search::{ContestCard, ContestFilter, SortBy};

use crate::notifications::NotificationKind;

// ---------------------------------------------------------------------------
// TUI -> app
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum UserCommand {
    /// Answer question `index` over (`true`) or under (`false`).
    SelectAnswer { index: usize, over: bool },
    ClearAnswer { index: usize },
    /// Submit the entry. `confirmed` is set once the user accepted the
    /// incomplete-entry prompt.
    SubmitEntry { confirmed: bool },
    SetSearchTerm(String),
    ToggleFilter(ContestFilter),
    CycleSort,
    ClearFilters,
    Quit,
}

// ---------------------------------------------------------------------------
// app -> TUI
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct QuestionView {
    pub question_id: u64,
    pub text: String,
    /// `Some(true)` over, `Some(false)` under.
    pub answer: Option<bool>,
}

/// Everything the entry screen draws.
#[derive(Debug, Clone, PartialEq)]
pub struct EntrySnapshot {
    pub contest_id: String,
    pub contest_name: String,
    pub lock_timestamp: DateTime<Utc>,
    pub questions: Vec<QuestionView>,
    pub progress: EntryProgress,
    pub submitted: bool,
    pub restored_draft: bool,
}

/// Everything the contests screen draws.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ContestsSnapshot {
    /// Matching cards in display order.
    pub cards: Vec<ContestCard>,
    pub total: usize,
    pub stats: Option<String>,
    pub active_filters: Vec<ContestFilter>,
    pub sort_by: SortBy,
    pub search_term: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum UiUpdate {
    Entry(Box<EntrySnapshot>),
    Contests(Box<ContestsSnapshot>),
    SaveState(SaveState),
    /// Ask the user to confirm submitting an incomplete entry.
    ConfirmSubmit(String),
    Notify { message: String, kind: NotificationKind },
}
