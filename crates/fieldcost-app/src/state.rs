// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::collections::BTreeSet;

use crate::OperationId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppMode {
    Nav,
    Edit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppState {
    pub mode: AppMode,
    pub read_only: bool,
    pub expanded: BTreeSet<OperationId>,
    pub status_line: Option<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            mode: AppMode::Nav,
            read_only: false,
            expanded: BTreeSet::new(),
            status_line: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppCommand {
    EnterEditMode,
    ExitToNav,
    ToggleExpanded(OperationId),
    SetStatus(String),
    ClearStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    ModeChanged(AppMode),
    ExpansionChanged { id: OperationId, expanded: bool },
    StatusUpdated(String),
    StatusCleared,
}

impl AppState {
    pub fn dispatch(&mut self, command: AppCommand) -> Vec<AppEvent> {
        match command {
            AppCommand::EnterEditMode => {
                if self.read_only {
                    return vec![self.set_status("sheet is read-only")];
                }
                self.mode = AppMode::Edit;
                vec![AppEvent::ModeChanged(self.mode), self.set_status("edit")]
            }
            AppCommand::ExitToNav => {
                self.mode = AppMode::Nav;
                vec![AppEvent::ModeChanged(self.mode), self.set_status("nav")]
            }
            AppCommand::ToggleExpanded(id) => {
                let expanded = if self.expanded.remove(&id) {
                    false
                } else {
                    self.expanded.insert(id);
                    true
                };
                vec![AppEvent::ExpansionChanged { id, expanded }]
            }
            AppCommand::SetStatus(message) => vec![self.set_status(&message)],
            AppCommand::ClearStatus => {
                self.status_line = None;
                vec![AppEvent::StatusCleared]
            }
        }
    }

    /// Editing policy for a row: cost cells and delete actions need edit mode
    /// on a writable sheet, and group rows derive their cost from children.
    pub fn row_editable(&self, is_group: bool) -> bool {
        self.mode == AppMode::Edit && !self.read_only && !is_group
    }

    pub fn is_expanded(&self, id: OperationId) -> bool {
        self.expanded.contains(&id)
    }

    fn set_status(&mut self, message: &str) -> AppEvent {
        self.status_line = Some(message.to_owned());
        AppEvent::StatusUpdated(message.to_owned())
    }
}
