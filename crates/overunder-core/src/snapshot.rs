// Point-in-time capture of every answer field in a form scope.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::form::{FormInput, InputKind};

/// Value captured for a single field name.
///
/// Radio groups and selects produce `Single`; a name that appears on more
/// than one contributing input (checkbox groups, multi-selects) produces
/// `Multi` with values in document order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Single(String),
    Multi(Vec<String>),
}

impl FieldValue {
    /// Iterate the captured values in order.
    pub fn values(&self) -> impl Iterator<Item = &str> {
        let slice: &[String] = match self {
            FieldValue::Single(v) => std::slice::from_ref(v),
            FieldValue::Multi(vs) => vs.as_slice(),
        };
        slice.iter().map(String::as_str)
    }

    /// First value, used where a control only holds one value.
    pub fn first(&self) -> Option<&str> {
        self.values().next()
    }

    fn push(&mut self, value: String) {
        match self {
            FieldValue::Single(existing) => {
                let first = std::mem::take(existing);
                *self = FieldValue::Multi(vec![first, value]);
            }
            FieldValue::Multi(vs) => vs.push(value),
        }
    }
}

/// Field name -> value mapping for a form scope.
///
/// Backed by a `BTreeMap` so that equality (and the serialized form) does
/// not depend on the order keys were encountered in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormSnapshot {
    fields: BTreeMap<String, FieldValue>,
}

impl FormSnapshot {
    /// Build a snapshot from inputs in document order.
    ///
    /// Radio and checkbox inputs only contribute when checked. Inputs with
    /// an empty name never contribute.
    pub fn capture(inputs: &[FormInput]) -> Self {
        let mut fields: BTreeMap<String, FieldValue> = BTreeMap::new();

        for input in inputs {
            if input.name.is_empty() {
                continue;
            }
            let contributes = match input.kind {
                InputKind::Radio | InputKind::Checkbox => input.checked,
                InputKind::Select | InputKind::Text | InputKind::TextArea => true,
            };
            if !contributes {
                continue;
            }

            match fields.get_mut(&input.name) {
                Some(existing) => existing.push(input.value.clone()),
                None => {
                    fields.insert(input.name.clone(), FieldValue::Single(input.value.clone()));
                }
            }
        }

        FormSnapshot { fields }
    }

    /// Write the saved values back into `inputs`.
    ///
    /// Radio groups end up checked exactly at the saved value, checkboxes are
    /// checked for each saved value, and value-carrying controls receive the
    /// saved values positionally. Names with no matching input are skipped.
    /// Returns the number of inputs that were changed.
    ///
    /// Restoring only adds saved state on top of what the form already shows.
    /// A checkbox that is checked but absent from the draft stays checked, and
    /// a radio group with no saved name is left as it is. Callers that need
    /// the form to match the draft exactly must reset it first.
    pub fn restore_into(&self, inputs: &mut [FormInput]) -> usize {
        let mut changed = 0;

        for (name, value) in &self.fields {
            let saved: Vec<&str> = value.values().collect();
            let mut positional = saved.iter();

            for input in inputs.iter_mut().filter(|i| &i.name == name) {
                match input.kind {
                    InputKind::Radio => {
                        let checked = saved.first() == Some(&input.value.as_str());
                        if input.checked != checked {
                            input.checked = checked;
                            changed += 1;
                        }
                    }
                    InputKind::Checkbox => {
                        if saved.contains(&input.value.as_str()) && !input.checked {
                            input.checked = true;
                            changed += 1;
                        }
                    }
                    InputKind::Select | InputKind::Text | InputKind::TextArea => {
                        if let Some(v) = positional.next() {
                            if input.value != *v {
                                input.value = (*v).to_string();
                                changed += 1;
                            }
                        }
                    }
                }
            }
        }

        changed
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Flatten into `(name, value)` pairs, repeating the name for each value
    /// of a `Multi`. This is the shape of a URL-encoded form body.
    pub fn pairs(&self) -> Vec<(String, String)> {
        self.fields
            .iter()
            .flat_map(|(k, v)| v.values().map(move |s| (k.clone(), s.to_string())))
            .collect()
    }
}

impl FromIterator<(String, FieldValue)> for FormSnapshot {
    fn from_iter<I: IntoIterator<Item = (String, FieldValue)>>(iter: I) -> Self {
        FormSnapshot {
            fields: iter.into_iter().collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn radio(name: &str, value: &str, checked: bool) -> FormInput {
        FormInput {
            name: name.into(),
            value: value.into(),
            kind: InputKind::Radio,
            checked,
        }
    }

    fn checkbox(name: &str, value: &str, checked: bool) -> FormInput {
        FormInput {
            name: name.into(),
            value: value.into(),
            kind: InputKind::Checkbox,
            checked,
        }
    }

    fn text(name: &str, value: &str) -> FormInput {
        FormInput {
            name: name.into(),
            value: value.into(),
            kind: InputKind::Text,
            checked: false,
        }
    }

    #[test]
    fn capture_skips_unchecked_radios_and_checkboxes() {
        let inputs = vec![
            radio("question_1", "True", false),
            radio("question_1", "False", true),
            checkbox("tags", "a", false),
            text("note", "hello"),
        ];
        let snap = FormSnapshot::capture(&inputs);
        assert_eq!(snap.len(), 2);
        assert_eq!(
            snap.get("question_1"),
            Some(&FieldValue::Single("False".into()))
        );
        assert_eq!(snap.get("note"), Some(&FieldValue::Single("hello".into())));
        assert!(snap.get("tags").is_none());
    }

    #[test]
    fn capture_collects_repeated_names_in_document_order() {
        let inputs = vec![
            checkbox("tags", "b", true),
            checkbox("tags", "a", true),
            checkbox("tags", "c", true),
        ];
        let snap = FormSnapshot::capture(&inputs);
        assert_eq!(
            snap.get("tags"),
            Some(&FieldValue::Multi(vec!["b".into(), "a".into(), "c".into()]))
        );
    }

    #[test]
    fn capture_ignores_unnamed_inputs() {
        let inputs = vec![text("", "orphan"), text("kept", "x")];
        let snap = FormSnapshot::capture(&inputs);
        assert_eq!(snap.len(), 1);
    }

    #[test]
    fn equality_ignores_key_order_but_not_list_order() {
        let a = FormSnapshot::capture(&[text("x", "1"), text("y", "2")]);
        let b = FormSnapshot::capture(&[text("y", "2"), text("x", "1")]);
        assert_eq!(a, b);

        let c = FormSnapshot::capture(&[checkbox("t", "1", true), checkbox("t", "2", true)]);
        let d = FormSnapshot::capture(&[checkbox("t", "2", true), checkbox("t", "1", true)]);
        assert_ne!(c, d);
    }

    #[test]
    fn serializes_as_flat_object() {
        let snap = FormSnapshot::capture(&[
            radio("question_1", "True", true),
            checkbox("tags", "a", true),
            checkbox("tags", "b", true),
        ]);
        let value = serde_json::to_value(&snap).unwrap();
        assert_eq!(value, json!({"question_1": "True", "tags": ["a", "b"]}));

        let back: FormSnapshot = serde_json::from_value(value).unwrap();
        assert_eq!(back, snap);
    }

    #[test]
    fn restore_checks_radio_group_at_saved_value() {
        let saved = FormSnapshot::capture(&[radio("question_1", "False", true)]);
        let mut inputs = vec![
            radio("question_1", "True", true),
            radio("question_1", "False", false),
        ];
        let changed = saved.restore_into(&mut inputs);
        assert_eq!(changed, 2);
        assert!(!inputs[0].checked);
        assert!(inputs[1].checked);
    }

    #[test]
    fn restore_checks_every_saved_checkbox() {
        let saved: FormSnapshot = [(
            "tags".to_string(),
            FieldValue::Multi(vec!["a".into(), "c".into()]),
        )]
        .into_iter()
        .collect();
        let mut inputs = vec![
            checkbox("tags", "a", false),
            checkbox("tags", "b", false),
            checkbox("tags", "c", false),
        ];
        saved.restore_into(&mut inputs);
        assert!(inputs[0].checked);
        assert!(!inputs[1].checked);
        assert!(inputs[2].checked);
    }

    #[test]
    fn restore_leaves_state_the_draft_does_not_mention() {
        let saved: FormSnapshot = [("tags".to_string(), FieldValue::Single("a".into()))]
            .into_iter()
            .collect();
        let mut inputs = vec![
            checkbox("tags", "a", false),
            checkbox("tags", "b", true),
            radio("question_2", "True", true),
            radio("question_2", "False", false),
        ];
        assert_eq!(saved.restore_into(&mut inputs), 1);
        assert!(inputs[0].checked);
        assert!(inputs[1].checked, "checked box missing from the draft stays checked");
        assert!(inputs[2].checked, "radio group without a saved value is untouched");
        assert!(!inputs[3].checked);
    }

    #[test]
    fn restore_sets_text_values_and_skips_unknown_names() {
        let saved: FormSnapshot = [
            ("note".to_string(), FieldValue::Single("restored".into())),
            ("missing".to_string(), FieldValue::Single("x".into())),
        ]
        .into_iter()
        .collect();
        let mut inputs = vec![text("note", "")];
        assert_eq!(saved.restore_into(&mut inputs), 1);
        assert_eq!(inputs[0].value, "restored");
    }

    #[test]
    fn pairs_repeat_names_for_multi_values() {
        let saved: FormSnapshot = [
            ("a".to_string(), FieldValue::Single("1".into())),
            ("b".to_string(), FieldValue::Multi(vec!["x".into(), "y".into()])),
        ]
        .into_iter()
        .collect();
        assert_eq!(
            saved.pairs(),
            vec![
                ("a".to_string(), "1".to_string()),
                ("b".to_string(), "x".to_string()),
                ("b".to_string(), "y".to_string()),
            ]
        );
    }
}
