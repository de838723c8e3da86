// Entry completion progress.

use crate::form::EntryForm;

/// How much of an entry has been answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EntryProgress {
    pub answered: usize,
    pub total: usize,
}

impl EntryProgress {
    pub fn from_form(form: &EntryForm) -> Self {
        EntryProgress {
            answered: form.answered_count(),
            total: form.question_count(),
        }
    }

    /// Completion as a whole percentage, 0 for a form with no questions.
    pub fn percentage(&self) -> u16 {
        if self.total == 0 {
            return 0;
        }
        let pct = self.answered.min(self.total) * 100 / self.total;
        pct as u16
    }

    pub fn unanswered(&self) -> usize {
        self.total.saturating_sub(self.answered)
    }

    pub fn is_complete(&self) -> bool {
        self.unanswered() == 0
    }

    pub fn label(&self) -> String {
        format!("{} of {} questions answered", self.answered, self.total)
    }

    /// Confirmation prompt shown before submitting an incomplete entry.
    pub fn confirm_message(&self) -> Option<String> {
        match self.unanswered() {
            0 => None,
            n => Some(format!("You have {n} unanswered questions. Submit anyway?")),
        }
    }
}
