// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Inline editing of a single cost-per-area cell.
//!
//! A [`CostEditor`] sits between one row and the owner of the row's cost. The
//! owner pushes its current value in with [`EditCommand::Observe`]; the editor
//! hands proposed values back out as [`EditEvent::Committed`] or
//! [`EditEvent::Reverted`], which callers route to the owner's commit callback.
//! The editor never writes the owner's value itself.

use crate::validation::{ValidationError, format_draft, parse_cost_per_ha};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditMode {
    Display,
    Editing,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EditSession {
    draft: String,
    revert_value: f64,
    selected: bool,
}

impl EditSession {
    fn start(revert_value: f64) -> Self {
        Self {
            draft: format_draft(revert_value),
            revert_value,
            selected: true,
        }
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    /// Authoritative value captured when the session began.
    pub fn revert_value(&self) -> f64 {
        self.revert_value
    }

    /// Whether the whole draft is still pre-selected for overwrite.
    pub fn is_selected(&self) -> bool {
        self.selected
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CostEditState {
    Display,
    Editing(EditSession),
}

#[derive(Debug, Clone, PartialEq)]
pub enum EditCommand {
    Observe(f64),
    Begin { editable: bool },
    SetDraft(String),
    InsertChar(char),
    Backspace,
    ClearDraft,
    ClearSelection,
    Confirm,
    FocusLost,
    Cancel,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EditEvent {
    ModeChanged(EditMode),
    FocusRequested,
    DraftChanged,
    Resynced(f64),
    Committed(f64),
    Reverted(f64),
    DraftRejected {
        draft: String,
        reason: ValidationError,
    },
}

impl EditEvent {
    /// Value this event proposes to the owner, if any.
    pub fn commit_value(&self) -> Option<f64> {
        match self {
            Self::Committed(value) | Self::Reverted(value) => Some(*value),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CostEditor {
    authoritative: f64,
    state: CostEditState,
}

impl CostEditor {
    pub fn new(authoritative: f64) -> Self {
        Self {
            authoritative,
            state: CostEditState::Display,
        }
    }

    pub fn state(&self) -> &CostEditState {
        &self.state
    }

    pub fn mode(&self) -> EditMode {
        match self.state {
            CostEditState::Display => EditMode::Display,
            CostEditState::Editing(_) => EditMode::Editing,
        }
    }

    pub fn is_editing(&self) -> bool {
        self.mode() == EditMode::Editing
    }

    pub fn session(&self) -> Option<&EditSession> {
        match &self.state {
            CostEditState::Display => None,
            CostEditState::Editing(session) => Some(session),
        }
    }

    /// Last value observed from the owner, or the value this row last proposed.
    pub fn authoritative(&self) -> f64 {
        self.authoritative
    }

    pub fn dispatch(&mut self, command: EditCommand) -> Vec<EditEvent> {
        match command {
            EditCommand::Observe(value) => self.observe(value),
            EditCommand::Begin { editable } => self.begin(editable),
            EditCommand::SetDraft(text) => self.edit_draft(|session| {
                session.draft = text;
            }),
            EditCommand::InsertChar(ch) => self.edit_draft(|session| {
                if session.selected {
                    session.draft.clear();
                }
                session.draft.push(ch);
            }),
            EditCommand::Backspace => self.edit_draft(|session| {
                if session.selected {
                    session.draft.clear();
                } else {
                    session.draft.pop();
                }
            }),
            EditCommand::ClearDraft => self.edit_draft(|session| session.draft.clear()),
            EditCommand::ClearSelection => {
                if let CostEditState::Editing(session) = &mut self.state {
                    session.selected = false;
                }
                Vec::new()
            }
            EditCommand::Confirm | EditCommand::FocusLost => self.commit(),
            EditCommand::Cancel => self.revert(),
        }
    }

    fn observe(&mut self, value: f64) -> Vec<EditEvent> {
        self.authoritative = value;
        match self.state {
            CostEditState::Display => vec![EditEvent::Resynced(value)],
            // The live draft and revert snapshot belong to the session.
            CostEditState::Editing(_) => Vec::new(),
        }
    }

    fn begin(&mut self, editable: bool) -> Vec<EditEvent> {
        if !editable || self.is_editing() {
            return Vec::new();
        }
        self.state = CostEditState::Editing(EditSession::start(self.authoritative));
        vec![
            EditEvent::ModeChanged(EditMode::Editing),
            EditEvent::FocusRequested,
        ]
    }

    fn edit_draft(&mut self, apply: impl FnOnce(&mut EditSession)) -> Vec<EditEvent> {
        let CostEditState::Editing(session) = &mut self.state else {
            return Vec::new();
        };
        let before = session.draft.clone();
        apply(session);
        session.selected = false;
        if session.draft == before {
            Vec::new()
        } else {
            vec![EditEvent::DraftChanged]
        }
    }

    fn commit(&mut self) -> Vec<EditEvent> {
        let CostEditState::Editing(session) =
            std::mem::replace(&mut self.state, CostEditState::Display)
        else {
            return Vec::new();
        };

        let outcome = match parse_cost_per_ha(&session.draft) {
            Ok(value) => {
                self.authoritative = value;
                EditEvent::Committed(value)
            }
            Err(reason) => EditEvent::DraftRejected {
                draft: session.draft,
                reason,
            },
        };
        vec![outcome, EditEvent::ModeChanged(EditMode::Display)]
    }

    fn revert(&mut self) -> Vec<EditEvent> {
        let CostEditState::Editing(session) =
            std::mem::replace(&mut self.state, CostEditState::Display)
        else {
            return Vec::new();
        };

        self.authoritative = session.revert_value;
        vec![
            EditEvent::Reverted(session.revert_value),
            EditEvent::ModeChanged(EditMode::Display),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::{CostEditState, CostEditor, EditCommand, EditEvent, EditMode};
    use crate::ValidationError;

    fn type_text(editor: &mut CostEditor, text: &str) {
        for ch in text.chars() {
            editor.dispatch(EditCommand::InsertChar(ch));
        }
    }

    fn commits(events: &[EditEvent]) -> Vec<f64> {
        events.iter().filter_map(EditEvent::commit_value).collect()
    }

    #[test]
    fn starts_in_display() {
        let editor = CostEditor::new(120.0);
        assert_eq!(editor.state(), &CostEditState::Display);
        assert_eq!(editor.mode(), EditMode::Display);
        assert!(editor.session().is_none());
    }

    #[test]
    fn begin_captures_revert_value_and_requests_focus() {
        let mut editor = CostEditor::new(120.0);

        let events = editor.dispatch(EditCommand::Begin { editable: true });
        assert_eq!(
            events,
            vec![
                EditEvent::ModeChanged(EditMode::Editing),
                EditEvent::FocusRequested,
            ]
        );

        let session = editor.session().expect("editing session");
        assert_eq!(session.draft(), "120");
        assert_eq!(session.revert_value(), 120.0);
        assert!(session.is_selected());
    }

    #[test]
    fn begin_is_a_no_op_when_not_editable() {
        let mut editor = CostEditor::new(120.0);

        let events = editor.dispatch(EditCommand::Begin { editable: false });
        assert!(events.is_empty());
        assert_eq!(editor.mode(), EditMode::Display);
    }

    #[test]
    fn begin_while_editing_keeps_the_session() {
        let mut editor = CostEditor::new(10.0);
        editor.dispatch(EditCommand::Begin { editable: true });
        type_text(&mut editor, "42");

        let events = editor.dispatch(EditCommand::Begin { editable: true });
        assert!(events.is_empty());
        assert_eq!(editor.session().map(|s| s.draft()), Some("42"));
    }

    #[test]
    fn valid_draft_commits_parsed_value() {
        let mut editor = CostEditor::new(120.0);
        editor.dispatch(EditCommand::Begin { editable: true });
        type_text(&mut editor, "95.5");

        let events = editor.dispatch(EditCommand::Confirm);
        assert_eq!(
            events,
            vec![
                EditEvent::Committed(95.5),
                EditEvent::ModeChanged(EditMode::Display),
            ]
        );
        assert_eq!(editor.authoritative(), 95.5);
    }

    #[test]
    fn invalid_draft_is_rejected_without_commit() {
        let mut editor = CostEditor::new(50.0);
        editor.dispatch(EditCommand::Begin { editable: true });
        type_text(&mut editor, "abc");

        let events = editor.dispatch(EditCommand::Confirm);
        assert!(commits(&events).is_empty());
        assert_eq!(
            events,
            vec![
                EditEvent::DraftRejected {
                    draft: "abc".to_owned(),
                    reason: ValidationError::InvalidCost,
                },
                EditEvent::ModeChanged(EditMode::Display),
            ]
        );
        assert_eq!(editor.mode(), EditMode::Display);
        assert_eq!(editor.authoritative(), 50.0);
    }

    #[test]
    fn negative_and_empty_drafts_are_rejected() {
        for draft in ["-5", ""] {
            let mut editor = CostEditor::new(12.0);
            editor.dispatch(EditCommand::Begin { editable: true });
            editor.dispatch(EditCommand::SetDraft(draft.to_owned()));

            let events = editor.dispatch(EditCommand::Confirm);
            assert!(commits(&events).is_empty(), "draft {draft:?}");
            assert_eq!(editor.authoritative(), 12.0);
        }
    }

    #[test]
    fn cancel_recommits_the_original_value() {
        let mut editor = CostEditor::new(80.25);
        editor.dispatch(EditCommand::Begin { editable: true });
        type_text(&mut editor, "200");

        let events = editor.dispatch(EditCommand::Cancel);
        assert_eq!(
            events,
            vec![
                EditEvent::Reverted(80.25),
                EditEvent::ModeChanged(EditMode::Display),
            ]
        );
        assert_eq!(commits(&events), vec![80.25]);
    }

    #[test]
    fn focus_loss_commits_like_confirm() {
        let mut editor = CostEditor::new(10.0);
        editor.dispatch(EditCommand::Begin { editable: true });
        type_text(&mut editor, "11");

        let events = editor.dispatch(EditCommand::FocusLost);
        assert_eq!(commits(&events), vec![11.0]);
        assert_eq!(editor.mode(), EditMode::Display);
    }

    #[test]
    fn untouched_draft_commits_original_value() {
        let mut editor = CostEditor::new(33.75);
        editor.dispatch(EditCommand::Begin { editable: true });

        let events = editor.dispatch(EditCommand::Confirm);
        assert_eq!(commits(&events), vec![33.75]);
    }

    #[test]
    fn first_keystroke_overwrites_selected_draft() {
        let mut editor = CostEditor::new(120.0);
        editor.dispatch(EditCommand::Begin { editable: true });

        let events = editor.dispatch(EditCommand::InsertChar('9'));
        assert_eq!(events, vec![EditEvent::DraftChanged]);
        let session = editor.session().expect("editing session");
        assert_eq!(session.draft(), "9");
        assert!(!session.is_selected());

        editor.dispatch(EditCommand::InsertChar('5'));
        assert_eq!(editor.session().map(|s| s.draft()), Some("95"));
    }

    #[test]
    fn backspace_clears_selection_then_deletes_chars() {
        let mut editor = CostEditor::new(120.0);
        editor.dispatch(EditCommand::Begin { editable: true });
        editor.dispatch(EditCommand::ClearSelection);

        editor.dispatch(EditCommand::Backspace);
        assert_eq!(editor.session().map(|s| s.draft()), Some("12"));

        let mut selected = CostEditor::new(120.0);
        selected.dispatch(EditCommand::Begin { editable: true });
        selected.dispatch(EditCommand::Backspace);
        assert_eq!(selected.session().map(|s| s.draft()), Some(""));
    }

    #[test]
    fn clear_selection_appends_to_existing_draft() {
        let mut editor = CostEditor::new(12.0);
        editor.dispatch(EditCommand::Begin { editable: true });

        let events = editor.dispatch(EditCommand::ClearSelection);
        assert!(events.is_empty());
        type_text(&mut editor, ".5");

        let events = editor.dispatch(EditCommand::Confirm);
        assert_eq!(commits(&events), vec![12.5]);
    }

    #[test]
    fn observe_resyncs_while_displaying() {
        let mut editor = CostEditor::new(120.0);

        let events = editor.dispatch(EditCommand::Observe(140.0));
        assert_eq!(events, vec![EditEvent::Resynced(140.0)]);

        editor.dispatch(EditCommand::Begin { editable: true });
        let session = editor.session().expect("editing session");
        assert_eq!(session.draft(), "140");
        assert_eq!(session.revert_value(), 140.0);
    }

    #[test]
    fn observe_does_not_clobber_live_draft() {
        let mut editor = CostEditor::new(80.0);
        editor.dispatch(EditCommand::Begin { editable: true });
        type_text(&mut editor, "81");

        let events = editor.dispatch(EditCommand::Observe(99.0));
        assert!(events.is_empty());
        let session = editor.session().expect("editing session");
        assert_eq!(session.draft(), "81");
        assert_eq!(session.revert_value(), 80.0);

        let events = editor.dispatch(EditCommand::Cancel);
        assert_eq!(commits(&events), vec![80.0]);
    }

    #[test]
    fn external_update_during_rejected_edit_shows_after_session() {
        let mut editor = CostEditor::new(50.0);
        editor.dispatch(EditCommand::Begin { editable: true });
        type_text(&mut editor, "oops");
        editor.dispatch(EditCommand::Observe(60.0));

        let events = editor.dispatch(EditCommand::Confirm);
        assert!(commits(&events).is_empty());
        assert_eq!(editor.authoritative(), 60.0);
    }

    #[test]
    fn draft_commands_are_ignored_while_displaying() {
        let mut editor = CostEditor::new(5.0);
        for command in [
            EditCommand::InsertChar('1'),
            EditCommand::Backspace,
            EditCommand::ClearDraft,
            EditCommand::SetDraft("9".to_owned()),
            EditCommand::ClearSelection,
            EditCommand::Confirm,
            EditCommand::FocusLost,
            EditCommand::Cancel,
        ] {
            assert!(editor.dispatch(command.clone()).is_empty(), "{command:?}");
        }
        assert_eq!(editor, CostEditor::new(5.0));
    }

    #[test]
    fn session_is_re_enterable() {
        let mut editor = CostEditor::new(1.0);
        for round in 2..5 {
            editor.dispatch(EditCommand::Begin { editable: true });
            editor.dispatch(EditCommand::SetDraft(round.to_string()));
            let events = editor.dispatch(EditCommand::Confirm);
            assert_eq!(commits(&events), vec![f64::from(round)]);
        }
        assert_eq!(editor.authoritative(), 4.0);
    }

    #[test]
    fn set_draft_with_same_text_reports_no_change() {
        let mut editor = CostEditor::new(7.0);
        editor.dispatch(EditCommand::Begin { editable: true });

        let events = editor.dispatch(EditCommand::SetDraft("7".to_owned()));
        assert!(events.is_empty());
        assert!(!editor.session().is_some_and(|s| s.is_selected()));
    }
}
