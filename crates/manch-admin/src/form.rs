//! Screen-scoped form state.
//!
//! Form state is an explicit tagged machine advanced by the pure
//! [`reduce`] function; nothing mutates it in place.  Cancel always
//! returns to [`FormState::Idle`] with no side effects, from any state.

use std::collections::BTreeMap;

use manch_shared::{Record, RecordKey};

/// State of one screen's modal form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormState {
    /// No form open.
    Idle,
    /// Form open; `key` is `Some` when editing an existing record.
    Editing {
        key: Option<RecordKey>,
        values: BTreeMap<String, String>,
    },
    /// Submit in flight; input is frozen.
    Submitting {
        key: Option<RecordKey>,
        values: BTreeMap<String, String>,
    },
    /// Submit failed; values are retained so the user can correct them.
    Failed {
        key: Option<RecordKey>,
        values: BTreeMap<String, String>,
        message: String,
    },
}

/// Events a screen feeds into the reducer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormEvent {
    /// Open the form, blank or pre-filled from an existing record.
    Open { existing: Option<Record> },
    /// The user edited one field.
    Edit { field: String, value: String },
    /// The user pressed submit.
    Submit,
    SubmitSucceeded,
    SubmitFailed { message: String },
    /// The user backed out; pre-action state, no side effects.
    Cancel,
}

/// Advance the form state machine.  Events that make no sense in the
/// current state leave it unchanged.
pub fn reduce(state: FormState, event: FormEvent) -> FormState {
    match (state, event) {
        (_, FormEvent::Cancel) => FormState::Idle,

        (_, FormEvent::Open { existing }) => match existing {
            Some(record) => FormState::Editing {
                key: Some(record.key),
                values: record.fields,
            },
            None => FormState::Editing {
                key: None,
                values: BTreeMap::new(),
            },
        },

        (FormState::Editing { key, mut values }, FormEvent::Edit { field, value }) => {
            values.insert(field, value);
            FormState::Editing { key, values }
        }
        // editing after a failure returns to the editable state
        (FormState::Failed { key, mut values, .. }, FormEvent::Edit { field, value }) => {
            values.insert(field, value);
            FormState::Editing { key, values }
        }

        (FormState::Editing { key, values }, FormEvent::Submit)
        | (FormState::Failed { key, values, .. }, FormEvent::Submit) => {
            FormState::Submitting { key, values }
        }

        (FormState::Submitting { .. }, FormEvent::SubmitSucceeded) => FormState::Idle,

        (FormState::Submitting { key, values }, FormEvent::SubmitFailed { message }) => {
            FormState::Failed {
                key,
                values,
                message,
            }
        }

        (state, _) => state,
    }
}
