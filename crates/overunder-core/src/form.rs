// Form model: input elements, the bounded scope the autosave controller
// reads, and the concrete over/under entry form.

use std::path::Path;

use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of input element, which decides how it contributes to a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputKind {
    Radio,
    Checkbox,
    Select,
    Text,
    TextArea,
}

/// A single named input element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormInput {
    pub name: String,
    pub value: String,
    pub kind: InputKind,
    /// Only meaningful for radio and checkbox inputs.
    pub checked: bool,
}

/// A bounded set of inputs that belongs to one contest entry.
pub trait FormScope {
    /// Contest the scope belongs to. Autosave is a no-op without one.
    fn contest_id(&self) -> Option<&str>;
    /// All inputs in document order.
    fn inputs(&self) -> &[FormInput];
    fn inputs_mut(&mut self) -> &mut [FormInput];
}

// ---------------------------------------------------------------------------
// Entry form definition (JSON exported by the server)
// ---------------------------------------------------------------------------

/// One over/under question on a contest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub question_id: u64,
    pub question_text: String,
    #[serde(default)]
    pub question_order: u32,
}

/// The data needed to render and submit an entry for one contest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryFormDefinition {
    pub contest_id: String,
    pub contest_name: String,
    pub lock_timestamp: DateTime<Utc>,
    pub questions: Vec<Question>,
}

impl EntryFormDefinition {
    pub fn from_json_file(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read entry form {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("failed to parse entry form {}", path.display()))
    }
}

/// Radio value submitted for an "over" answer.
pub const OVER_VALUE: &str = "True";
/// Radio value submitted for an "under" answer.
pub const UNDER_VALUE: &str = "False";

/// Field name for a question's radio group.
pub fn question_field_name(question_id: u64) -> String {
    format!("question_{question_id}")
}

// ---------------------------------------------------------------------------
// EntryForm
// ---------------------------------------------------------------------------

/// An entry form: one over/under radio pair per question, in question order.
///
/// Inputs are laid out as `[q0 over, q0 under, q1 over, q1 under, ...]`.
#[derive(Debug, Clone)]
pub struct EntryForm {
    contest_id: String,
    contest_name: String,
    lock_timestamp: DateTime<Utc>,
    questions: Vec<Question>,
    inputs: Vec<FormInput>,
}

impl EntryForm {
    pub fn new(mut definition: EntryFormDefinition) -> Self {
        definition
            .questions
            .sort_by_key(|q| (q.question_order, q.question_id));

        let inputs = definition
            .questions
            .iter()
            .flat_map(|q| {
                let name = question_field_name(q.question_id);
                [
                    FormInput {
                        name: name.clone(),
                        value: OVER_VALUE.to_string(),
                        kind: InputKind::Radio,
                        checked: false,
                    },
                    FormInput {
                        name,
                        value: UNDER_VALUE.to_string(),
                        kind: InputKind::Radio,
                        checked: false,
                    },
                ]
            })
            .collect();

        EntryForm {
            contest_id: definition.contest_id,
            contest_name: definition.contest_name,
            lock_timestamp: definition.lock_timestamp,
            questions: definition.questions,
            inputs,
        }
    }

    pub fn contest_name(&self) -> &str {
        &self.contest_name
    }

    pub fn lock_timestamp(&self) -> DateTime<Utc> {
        self.lock_timestamp
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn question_count(&self) -> usize {
        self.questions.len()
    }

    /// Answer the question at `index`. Out-of-range indices are ignored.
    pub fn select(&mut self, index: usize, over: bool) {
        if index >= self.questions.len() {
            return;
        }
        self.inputs[index * 2].checked = over;
        self.inputs[index * 2 + 1].checked = !over;
    }

    /// Remove the answer for the question at `index`.
    pub fn clear(&mut self, index: usize) {
        if index >= self.questions.len() {
            return;
        }
        self.inputs[index * 2].checked = false;
        self.inputs[index * 2 + 1].checked = false;
    }

    /// `Some(true)` for over, `Some(false)` for under, `None` if unanswered.
    pub fn answer_for(&self, index: usize) -> Option<bool> {
        let over = self.inputs.get(index * 2)?;
        let under = self.inputs.get(index * 2 + 1)?;
        match (over.checked, under.checked) {
            (true, _) => Some(true),
            (false, true) => Some(false),
            (false, false) => None,
        }
    }

    /// Number of checked radio inputs in the form.
    pub fn answered_count(&self) -> usize {
        self.inputs
            .iter()
            .filter(|i| i.kind == InputKind::Radio && i.checked)
            .count()
    }

    pub fn is_locked_at(&self, now: DateTime<Utc>) -> bool {
        now > self.lock_timestamp
    }
}

impl FormScope for EntryForm {
    fn contest_id(&self) -> Option<&str> {
        if self.contest_id.is_empty() {
            None
        } else {
            Some(&self.contest_id)
        }
    }

    fn inputs(&self) -> &[FormInput] {
        &self.inputs
    }

    fn inputs_mut(&mut self) -> &mut [FormInput] {
        &mut self.inputs
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
