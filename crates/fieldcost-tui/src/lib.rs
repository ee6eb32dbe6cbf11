// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use crossterm::event::{
    self, DisableBracketedPaste, DisableFocusChange, DisableMouseCapture, EnableBracketedPaste,
    EnableFocusChange, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers,
    MouseButton, MouseEvent, MouseEventKind,
};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::{execute, terminal};
use fieldcost_app::{
    AppCommand, AppEvent, AppMode, AppState, CostEditor, CostSheet, EditCommand, EditEvent,
    MoneyFormat, Operation, OperationId,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Alignment, Constraint, Flex, Layout, Position, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table};
use std::collections::{BTreeMap, BTreeSet};
use std::io;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};

const NAME_INDENT: &str = "  ";
const EXPANDED_MARK: &str = "▼";
const COLLAPSED_MARK: &str = "▶";
const DELETE_MARK: &str = "✕";
const STATUS_CLEAR_AFTER: Duration = Duration::from_secs(4);
const COLUMN_SPACING: u16 = 1;
const COLUMN_WIDTHS: [Constraint; 4] = [
    Constraint::Fill(1),
    Constraint::Length(16),
    Constraint::Length(14),
    Constraint::Length(3),
];

/// Owner of the authoritative sheet, as seen from the UI.
pub trait AppRuntime {
    fn load_sheet(&mut self) -> Result<CostSheet>;
    /// Commit channel for inline edits; reverts re-commit the original value.
    fn update_cost(&mut self, id: OperationId, value: f64) -> Result<()>;
    fn delete_operation(&mut self, id: OperationId) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UiOptions {
    pub money: MoneyFormat,
    pub allow_delete: bool,
}

impl Default for UiOptions {
    fn default() -> Self {
        Self {
            money: MoneyFormat::default(),
            allow_delete: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct RowProjection {
    id: OperationId,
    name: String,
    depth: usize,
    cost_per_ha: f64,
    total_cost: f64,
    expandable: bool,
    expanded: bool,
    editable: bool,
    deletable: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RowColumn {
    Name,
    Cost,
    Total,
    Delete,
}

impl RowColumn {
    const ALL: [Self; 4] = [Self::Name, Self::Cost, Self::Total, Self::Delete];
}

#[derive(Debug, Clone, PartialEq)]
enum CostCellView {
    Display { text: String, clickable: bool },
    Input { draft: String, selected: bool },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RowHit {
    index: usize,
    column: RowColumn,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct TableGeometry {
    columns: [Rect; 4],
    first_row_y: u16,
    visible_rows: u16,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InternalEvent {
    ClearStatus { token: u64 },
}

#[derive(Debug, Clone, PartialEq, Default)]
struct ViewData {
    options: UiOptions,
    sheet: Option<CostSheet>,
    rows: Vec<RowProjection>,
    editors: BTreeMap<OperationId, CostEditor>,
    selected_row: usize,
    /// First projected row drawn in the table body.
    scroll_offset: usize,
    help_visible: bool,
    status_token: u64,
}

impl ViewData {
    fn with_options(options: UiOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }
}

pub fn run_app<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    options: UiOptions,
) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(
        stdout,
        terminal::EnterAlternateScreen,
        EnableMouseCapture,
        EnableFocusChange,
        EnableBracketedPaste
    )
    .context("enter alternate screen")?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;

    let mut view_data = ViewData::with_options(options);
    let (internal_tx, internal_rx) = mpsc::channel();

    if let Err(error) = refresh_view_data(state, runtime, &mut view_data) {
        warn!(%error, "initial sheet load failed");
        state.dispatch(AppCommand::SetStatus(format!("load failed: {error}")));
    }

    let result = event_loop(
        &mut terminal,
        state,
        runtime,
        &mut view_data,
        &internal_tx,
        &internal_rx,
    );

    disable_raw_mode().context("disable raw mode")?;
    execute!(
        io::stdout(),
        DisableBracketedPaste,
        DisableFocusChange,
        DisableMouseCapture,
        terminal::LeaveAlternateScreen
    )
    .context("leave alternate screen")?;
    result
}

fn event_loop<R: AppRuntime>(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    internal_rx: &Receiver<InternalEvent>,
) -> Result<()> {
    let mut screen = Rect::default();
    loop {
        process_internal_events(state, view_data, internal_rx);

        terminal
            .draw(|frame| {
                screen = frame.area();
                keep_selection_visible(view_data, table_geometry(screen).visible_rows);
                render(frame, state, view_data);
            })
            .context("draw frame")?;

        if !event::poll(Duration::from_millis(120)).context("poll event")? {
            continue;
        }
        match event::read().context("read event")? {
            Event::Key(key) if key.kind == KeyEventKind::Press => {
                if handle_key_event(state, runtime, view_data, internal_tx, key) {
                    return Ok(());
                }
            }
            Event::Mouse(mouse) => {
                handle_mouse_event(state, runtime, view_data, internal_tx, screen, mouse);
            }
            Event::FocusLost => {
                blur_active_editor(state, runtime, view_data, internal_tx);
            }
            Event::Paste(text) => {
                handle_paste(state, runtime, view_data, internal_tx, &text);
            }
            _ => {}
        }
    }
}

fn process_internal_events(
    state: &mut AppState,
    view_data: &mut ViewData,
    rx: &Receiver<InternalEvent>,
) {
    while let Ok(event) = rx.try_recv() {
        match event {
            InternalEvent::ClearStatus { token } if token == view_data.status_token => {
                state.dispatch(AppCommand::ClearStatus);
            }
            InternalEvent::ClearStatus { .. } => {}
        }
    }
}

fn schedule_status_clear(internal_tx: &Sender<InternalEvent>, token: u64) {
    let sender = internal_tx.clone();
    thread::spawn(move || {
        thread::sleep(STATUS_CLEAR_AFTER);
        let _ = sender.send(InternalEvent::ClearStatus { token });
    });
}

fn emit_status(
    state: &mut AppState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    message: impl Into<String>,
) {
    state.dispatch(AppCommand::SetStatus(message.into()));
    view_data.status_token = view_data.status_token.saturating_add(1);
    schedule_status_clear(internal_tx, view_data.status_token);
}

fn handle_key_event<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) -> bool {
    if key.code == KeyCode::Char('q') && key.modifiers.contains(KeyModifiers::CONTROL) {
        blur_active_editor(state, runtime, view_data, internal_tx);
        return true;
    }

    if view_data.help_visible {
        if key.code == KeyCode::Esc || key.code == KeyCode::Char('?') {
            view_data.help_visible = false;
        }
        return false;
    }

    if let Some(id) = active_editor_id(view_data) {
        handle_cost_input_key(state, runtime, view_data, internal_tx, id, key);
        return false;
    }

    match (key.code, key.modifiers) {
        (KeyCode::Char('j'), _) | (KeyCode::Down, _) | (KeyCode::Tab, _) => move_row(view_data, 1),
        (KeyCode::Char('k'), _) | (KeyCode::Up, _) | (KeyCode::BackTab, _) => {
            move_row(view_data, -1)
        }
        (KeyCode::Char('g'), _) | (KeyCode::Home, _) => view_data.selected_row = 0,
        (KeyCode::Char('G'), _) | (KeyCode::End, _) => {
            view_data.selected_row = view_data.rows.len().saturating_sub(1);
        }
        (KeyCode::Enter, _) => activate_selected_row(state, runtime, view_data, internal_tx),
        (KeyCode::Char('e'), KeyModifiers::NONE) => {
            let index = view_data.selected_row;
            begin_cost_edit(state, runtime, view_data, internal_tx, index);
        }
        (KeyCode::Char(' '), _) => {
            let index = view_data.selected_row;
            toggle_row(state, view_data, internal_tx, index);
        }
        (KeyCode::Char('d'), KeyModifiers::NONE) => {
            let index = view_data.selected_row;
            delete_row(state, runtime, view_data, internal_tx, index);
        }
        (KeyCode::Char('i'), KeyModifiers::NONE) => {
            dispatch_and_reproject(state, view_data, internal_tx, AppCommand::EnterEditMode);
        }
        (KeyCode::Esc, _) => {
            if state.mode == AppMode::Edit {
                dispatch_and_reproject(state, view_data, internal_tx, AppCommand::ExitToNav);
            }
        }
        (KeyCode::Char('?'), _) => view_data.help_visible = true,
        _ => {}
    }
    false
}

fn handle_cost_input_key<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    id: OperationId,
    key: KeyEvent,
) {
    let command = match (key.code, key.modifiers) {
        (KeyCode::Enter, _) => EditCommand::Confirm,
        (KeyCode::Esc, _) => EditCommand::Cancel,
        (KeyCode::Up, _) | (KeyCode::BackTab, _) => {
            apply_edit_command(state, runtime, view_data, internal_tx, id, EditCommand::FocusLost);
            move_row(view_data, -1);
            return;
        }
        (KeyCode::Down, _) | (KeyCode::Tab, _) => {
            apply_edit_command(state, runtime, view_data, internal_tx, id, EditCommand::FocusLost);
            move_row(view_data, 1);
            return;
        }
        (KeyCode::Backspace, _) => EditCommand::Backspace,
        (KeyCode::Char('u'), modifiers) if modifiers.contains(KeyModifiers::CONTROL) => {
            EditCommand::ClearDraft
        }
        (KeyCode::Left, _) | (KeyCode::Right, _) | (KeyCode::Home, _) | (KeyCode::End, _) => {
            EditCommand::ClearSelection
        }
        (KeyCode::Char(ch), modifiers)
            if modifiers.is_empty() || modifiers == KeyModifiers::SHIFT =>
        {
            EditCommand::InsertChar(ch)
        }
        _ => return,
    };
    apply_edit_command(state, runtime, view_data, internal_tx, id, command);
}

/// Pasted text replaces a preselected draft and is appended otherwise.
fn handle_paste<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    text: &str,
) {
    let Some(id) = active_editor_id(view_data) else {
        return;
    };
    let Some(session) = view_data.editors.get(&id).and_then(CostEditor::session) else {
        return;
    };
    let pasted = text.chars().filter(|ch| !ch.is_control());
    let draft = if session.is_selected() {
        pasted.collect::<String>()
    } else {
        session.draft().chars().chain(pasted).collect()
    };
    apply_edit_command(
        state,
        runtime,
        view_data,
        internal_tx,
        id,
        EditCommand::SetDraft(draft),
    );
}

fn handle_mouse_event<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    screen: Rect,
    mouse: MouseEvent,
) {
    if mouse.kind != MouseEventKind::Down(MouseButton::Left) || view_data.help_visible {
        return;
    }

    let hit = hit_test(screen, view_data, mouse.column, mouse.row);
    let Some(hit) = hit else {
        blur_active_editor(state, runtime, view_data, internal_tx);
        return;
    };
    let Some(id) = view_data.rows.get(hit.index).map(|row| row.id) else {
        return;
    };
    if hit.column == RowColumn::Cost && active_editor_id(view_data) == Some(id) {
        return;
    }

    blur_active_editor(state, runtime, view_data, internal_tx);
    let Some(index) = row_index(view_data, id) else {
        return;
    };
    view_data.selected_row = index;

    match hit.column {
        RowColumn::Cost => begin_cost_edit(state, runtime, view_data, internal_tx, index),
        RowColumn::Delete => delete_row(state, runtime, view_data, internal_tx, index),
        RowColumn::Name | RowColumn::Total => {
            if view_data.rows[index].expandable {
                toggle_row(state, view_data, internal_tx, index);
            }
        }
    }
}

fn activate_selected_row<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    let index = view_data.selected_row;
    let Some(row) = view_data.rows.get(index) else {
        return;
    };
    if row.expandable {
        toggle_row(state, view_data, internal_tx, index);
    } else {
        begin_cost_edit(state, runtime, view_data, internal_tx, index);
    }
}

fn begin_cost_edit<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    index: usize,
) {
    let Some(row) = view_data.rows.get(index) else {
        return;
    };
    let (id, editable, expandable) = (row.id, row.editable, row.expandable);
    if !editable {
        let hint = if expandable {
            "group cost is the sum of its sub-operations"
        } else if state.read_only {
            "sheet is read-only"
        } else {
            "press i to edit"
        };
        emit_status(state, view_data, internal_tx, hint);
    }
    apply_edit_command(
        state,
        runtime,
        view_data,
        internal_tx,
        id,
        EditCommand::Begin { editable },
    );
}

fn toggle_row(
    state: &mut AppState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    index: usize,
) {
    let Some(row) = view_data.rows.get(index) else {
        return;
    };
    if !row.expandable {
        return;
    }
    let id = row.id;
    dispatch_and_reproject(state, view_data, internal_tx, AppCommand::ToggleExpanded(id));
    if let Some(index) = row_index(view_data, id) {
        view_data.selected_row = index;
    }
}

fn delete_row<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    index: usize,
) {
    let Some(row) = view_data.rows.get(index) else {
        return;
    };
    if !(row.deletable && row.editable) {
        emit_status(state, view_data, internal_tx, "delete unavailable");
        return;
    }

    let (id, name) = (row.id, row.name.clone());
    if let Err(error) = runtime.delete_operation(id) {
        warn!(operation = %id, %error, "delete failed");
        emit_status(
            state,
            view_data,
            internal_tx,
            format!("delete failed: {error}"),
        );
        return;
    }
    info!(operation = %id, name = %name, "operation deleted");
    reload_or_report(state, runtime, view_data, internal_tx);
    emit_status(state, view_data, internal_tx, format!("deleted {name}"));
}

fn blur_active_editor<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    if let Some(id) = active_editor_id(view_data) {
        apply_edit_command(
            state,
            runtime,
            view_data,
            internal_tx,
            id,
            EditCommand::FocusLost,
        );
    }
}

fn apply_edit_command<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    id: OperationId,
    command: EditCommand,
) {
    let Some(editor) = view_data.editors.get_mut(&id) else {
        return;
    };
    let events = editor.dispatch(command);

    let mut proposed = None;
    for event in events {
        match event {
            EditEvent::FocusRequested => {
                if let Some(index) = row_index(view_data, id) {
                    view_data.selected_row = index;
                }
            }
            EditEvent::Committed(value) => {
                info!(operation = %id, value, "cost committed");
                proposed = Some(value);
            }
            EditEvent::Reverted(value) => {
                info!(operation = %id, value, "cost edit canceled; re-committing original");
                proposed = Some(value);
            }
            EditEvent::DraftRejected { draft, reason } => {
                debug!(operation = %id, draft = %draft, %reason, "draft discarded");
            }
            EditEvent::ModeChanged(mode) => {
                debug!(operation = %id, ?mode, "cost cell mode changed");
            }
            EditEvent::DraftChanged | EditEvent::Resynced(_) => {}
        }
    }

    let Some(value) = proposed else {
        return;
    };
    if let Err(error) = runtime.update_cost(id, value) {
        warn!(operation = %id, value, %error, "cost update failed");
        emit_status(
            state,
            view_data,
            internal_tx,
            format!("save cost failed: {error}"),
        );
    }
    reload_or_report(state, runtime, view_data, internal_tx);
}

fn reload_or_report<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    if let Err(error) = refresh_view_data(state, runtime, view_data) {
        warn!(%error, "sheet reload failed");
        emit_status(
            state,
            view_data,
            internal_tx,
            format!("reload failed: {error}"),
        );
    }
}

fn dispatch_and_reproject(
    state: &mut AppState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    command: AppCommand,
) {
    let events = state.dispatch(command);
    for event in &events {
        if let AppEvent::StatusUpdated(_) = event {
            view_data.status_token = view_data.status_token.saturating_add(1);
            schedule_status_clear(internal_tx, view_data.status_token);
        }
    }
    if should_reproject(&events) {
        reproject_rows(state, view_data);
    }
}

fn should_reproject(events: &[AppEvent]) -> bool {
    events.iter().any(|event| {
        matches!(
            event,
            AppEvent::ModeChanged(_) | AppEvent::ExpansionChanged { .. }
        )
    })
}

fn refresh_view_data<R: AppRuntime>(
    state: &AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
) -> Result<()> {
    let sheet = runtime.load_sheet()?;
    view_data.sheet = Some(sheet);
    reproject_rows(state, view_data);
    Ok(())
}

fn reproject_rows(state: &AppState, view_data: &mut ViewData) {
    let Some(sheet) = &view_data.sheet else {
        view_data.rows.clear();
        view_data.editors.clear();
        view_data.selected_row = 0;
        view_data.scroll_offset = 0;
        return;
    };
    view_data.rows = project_rows(sheet, state, view_data.options.allow_delete);
    sync_editors(view_data);
    let last = view_data.rows.len().saturating_sub(1);
    view_data.selected_row = view_data.selected_row.min(last);
    view_data.scroll_offset = view_data.scroll_offset.min(last);
}

/// Feeds every visible row's authoritative cost to its editor; a row that is
/// mid-edit keeps its draft until the session ends.
fn sync_editors(view_data: &mut ViewData) {
    let live = view_data
        .rows
        .iter()
        .map(|row| row.id)
        .collect::<BTreeSet<_>>();
    view_data.editors.retain(|id, _| live.contains(id));

    for row in &view_data.rows {
        view_data
            .editors
            .entry(row.id)
            .and_modify(|editor| {
                editor.dispatch(EditCommand::Observe(row.cost_per_ha));
            })
            .or_insert_with(|| CostEditor::new(row.cost_per_ha));
    }
}

fn project_rows(sheet: &CostSheet, state: &AppState, allow_delete: bool) -> Vec<RowProjection> {
    let mut rows = Vec::with_capacity(sheet.operations.len());
    for operation in &sheet.operations {
        push_row(&mut rows, sheet, state, allow_delete, operation, 0);
    }
    rows
}

fn push_row(
    rows: &mut Vec<RowProjection>,
    sheet: &CostSheet,
    state: &AppState,
    allow_delete: bool,
    operation: &Operation,
    depth: usize,
) {
    let expandable = operation.is_group();
    let expanded = expandable && state.is_expanded(operation.id);
    rows.push(RowProjection {
        id: operation.id,
        name: operation.name.clone(),
        depth,
        cost_per_ha: operation.effective_cost_per_ha(),
        total_cost: sheet.total_cost(operation),
        expandable,
        expanded,
        editable: state.row_editable(expandable),
        deletable: allow_delete,
    });
    if expanded {
        for child in &operation.sub_operations {
            push_row(rows, sheet, state, allow_delete, child, depth + 1);
        }
    }
}

fn active_editor_id(view_data: &ViewData) -> Option<OperationId> {
    view_data
        .editors
        .iter()
        .find(|(_, editor)| editor.is_editing())
        .map(|(id, _)| *id)
}

fn row_index(view_data: &ViewData, id: OperationId) -> Option<usize> {
    view_data.rows.iter().position(|row| row.id == id)
}

fn move_row(view_data: &mut ViewData, delta: isize) {
    let row_count = view_data.rows.len();
    if row_count == 0 {
        view_data.selected_row = 0;
        return;
    }

    let current = view_data.selected_row;
    let next = if delta.is_negative() {
        current.saturating_sub(delta.unsigned_abs())
    } else {
        current.saturating_add(delta as usize)
    };
    view_data.selected_row = next.min(row_count.saturating_sub(1));
}

/// Scrolls the table body just far enough to show the selected row.
fn keep_selection_visible(view_data: &mut ViewData, visible_rows: u16) {
    let visible = usize::from(visible_rows);
    if visible == 0 || view_data.rows.is_empty() {
        view_data.scroll_offset = 0;
        return;
    }
    let selected = view_data.selected_row;
    if selected < view_data.scroll_offset {
        view_data.scroll_offset = selected;
    } else if selected >= view_data.scroll_offset + visible {
        view_data.scroll_offset = selected + 1 - visible;
    }
    let max_offset = view_data.rows.len().saturating_sub(visible);
    view_data.scroll_offset = view_data.scroll_offset.min(max_offset);
}

fn screen_layout(area: Rect) -> [Rect; 3] {
    Layout::vertical([
        Constraint::Length(3),
        Constraint::Min(4),
        Constraint::Length(3),
    ])
    .areas(area)
}

fn table_geometry(screen: Rect) -> TableGeometry {
    let [_, table_area, _] = screen_layout(screen);
    let inner = Block::default().borders(Borders::ALL).inner(table_area);
    let columns: [Rect; 4] = Layout::horizontal(COLUMN_WIDTHS)
        .flex(Flex::Start)
        .spacing(COLUMN_SPACING)
        .areas(inner);
    // One line each for the header and the footer.
    TableGeometry {
        columns,
        first_row_y: inner.y.saturating_add(1),
        visible_rows: inner.height.saturating_sub(2),
    }
}

fn hit_test(screen: Rect, view_data: &ViewData, column: u16, row: u16) -> Option<RowHit> {
    let geometry = table_geometry(screen);
    if row < geometry.first_row_y {
        return None;
    }
    let offset = row - geometry.first_row_y;
    if offset >= geometry.visible_rows {
        return None;
    }
    let index = view_data.scroll_offset + usize::from(offset);
    if index >= view_data.rows.len() {
        return None;
    }

    let position = Position::new(column, geometry.columns[0].y);
    RowColumn::ALL
        .iter()
        .zip(geometry.columns)
        .find(|(_, rect)| rect.contains(position))
        .map(|(column, _)| RowHit {
            index,
            column: *column,
        })
}

fn cost_cell_view(
    row: &RowProjection,
    editor: Option<&CostEditor>,
    money: &MoneyFormat,
) -> CostCellView {
    if let Some(session) = editor.and_then(CostEditor::session) {
        return CostCellView::Input {
            draft: session.draft().to_owned(),
            selected: session.is_selected(),
        };
    }
    let value = editor.map_or(row.cost_per_ha, CostEditor::authoritative);
    CostCellView::Display {
        text: money.rate(value),
        clickable: row.editable,
    }
}

fn name_cell_text(row: &RowProjection) -> String {
    let marker = match (row.expandable, row.expanded) {
        (true, true) => format!("{EXPANDED_MARK} "),
        (true, false) => format!("{COLLAPSED_MARK} "),
        (false, _) => "  ".to_owned(),
    };
    format!("{}{marker}{}", NAME_INDENT.repeat(row.depth), row.name)
}

fn render(frame: &mut ratatui::Frame<'_>, state: &AppState, view_data: &ViewData) {
    let [header_area, table_area, status_area] = screen_layout(frame.area());

    let header = Paragraph::new(render_header_text(view_data))
        .block(Block::default().title("fieldcost").borders(Borders::ALL));
    frame.render_widget(header, header_area);

    render_table(frame, table_area, view_data);

    let status = Paragraph::new(status_text(state, view_data))
        .style(Style::default().fg(Color::Yellow))
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(status, status_area);

    if view_data.help_visible {
        let area = centered_rect(70, 60, frame.area());
        frame.render_widget(Clear, area);
        let help = Paragraph::new(help_overlay_text())
            .block(Block::default().title("help").borders(Borders::ALL));
        frame.render_widget(help, area);
    } else if let Some(position) = input_cursor_position(frame.area(), view_data) {
        frame.set_cursor_position(position);
    }
}

fn render_header_text(view_data: &ViewData) -> String {
    let Some(sheet) = &view_data.sheet else {
        return "no sheet loaded".to_owned();
    };
    let lock = if sheet.locked { " | locked" } else { "" };
    format!(
        "{} | {} {} | {} operations | {}{lock}",
        sheet.field_name,
        sheet.area_ha,
        view_data.options.money.area_unit,
        sheet.operation_count(),
        view_data.options.money.money(sheet.sheet_total()),
    )
}

fn render_table(frame: &mut ratatui::Frame<'_>, area: Rect, view_data: &ViewData) {
    let money = &view_data.options.money;
    let header = Row::new(vec![
        Cell::from("operation"),
        Cell::from(Line::from(format!("cost/{}", money.area_unit)).alignment(Alignment::Right)),
        Cell::from(Line::from("total").alignment(Alignment::Right)),
        Cell::from(""),
    ])
    .style(
        Style::default()
            .fg(Color::White)
            .add_modifier(Modifier::BOLD),
    );

    let rows = view_data
        .rows
        .iter()
        .enumerate()
        .skip(view_data.scroll_offset)
        .map(|(index, row)| {
            let selected = index == view_data.selected_row;
            let editor = view_data.editors.get(&row.id);
            let cost = match cost_cell_view(row, editor, money) {
                CostCellView::Display { text, clickable } => {
                    let style = if clickable {
                        Style::default().add_modifier(Modifier::UNDERLINED)
                    } else {
                        Style::default()
                    };
                    Cell::from(Line::from(Span::styled(text, style)).alignment(Alignment::Right))
                }
                CostCellView::Input { draft, selected } => {
                    let style = if selected {
                        Style::default().add_modifier(Modifier::REVERSED)
                    } else {
                        Style::default()
                    };
                    Cell::from(Line::from(Span::styled(draft, style)))
                        .style(Style::default().fg(Color::Black).bg(Color::Cyan))
                }
            };
            let delete = if row.deletable && row.editable {
                Cell::from(DELETE_MARK).style(Style::default().fg(Color::Red))
            } else {
                Cell::from("")
            };

            let mut style = Style::default();
            if row.depth > 0 {
                style = style.fg(Color::Gray);
            }
            if selected {
                style = style.bg(Color::DarkGray);
            }
            Row::new(vec![
                Cell::from(name_cell_text(row)),
                cost,
                Cell::from(Line::from(money.money(row.total_cost)).alignment(Alignment::Right)),
                delete,
            ])
            .style(style)
        })
        .collect::<Vec<_>>();

    let footer = view_data.sheet.as_ref().map(|sheet| {
        Row::new(vec![
            Cell::from("total"),
            Cell::from(Line::from(money.rate(sheet.sheet_cost_per_ha())).alignment(Alignment::Right)),
            Cell::from(Line::from(money.money(sheet.sheet_total())).alignment(Alignment::Right)),
            Cell::from(""),
        ])
        .style(Style::default().add_modifier(Modifier::BOLD))
    });

    let mut table = Table::new(rows, COLUMN_WIDTHS)
        .header(header)
        .column_spacing(COLUMN_SPACING)
        .flex(Flex::Start)
        .block(Block::default().title("operations").borders(Borders::ALL));
    if let Some(footer) = footer {
        table = table.footer(footer);
    }
    frame.render_widget(table, area);
}

fn input_cursor_position(screen: Rect, view_data: &ViewData) -> Option<Position> {
    let id = active_editor_id(view_data)?;
    let index = row_index(view_data, id)?;
    let session = view_data.editors.get(&id)?.session()?;
    let geometry = table_geometry(screen);
    let offset = u16::try_from(index.checked_sub(view_data.scroll_offset)?).ok()?;
    if offset >= geometry.visible_rows {
        return None;
    }

    let cost = geometry.columns[1];
    let typed = u16::try_from(session.draft().chars().count()).unwrap_or(u16::MAX);
    let x = cost
        .x
        .saturating_add(typed)
        .min(cost.right().saturating_sub(1));
    Some(Position::new(x, geometry.first_row_y + offset))
}

fn status_text(state: &AppState, view_data: &ViewData) -> String {
    if active_editor_id(view_data).is_some() {
        return "COST | type value | enter save | esc cancel | up/down save+move | ctrl+u clear"
            .to_owned();
    }

    let mode = match state.mode {
        AppMode::Nav => "NAV",
        AppMode::Edit => "EDIT",
    };
    let default = match state.mode {
        AppMode::Nav => "j/k g/G | enter open | space expand | i edit | ? help | ctrl+q",
        AppMode::Edit => {
            "j/k g/G | enter/e/click edit cost | space expand | d del | esc nav | ? help | ctrl+q"
        }
    };
    match &state.status_line {
        Some(status) => format!("{mode} | {status} | {default}"),
        None => format!("{mode} | {default}"),
    }
}

fn help_overlay_text() -> &'static str {
    "global: ctrl+q quit | ? help\n\
nav: j/k/up/down move | g/G first/last | enter expand or edit | space expand | i edit mode\n\
edit: e/enter/click cost edit | d or click ✕ delete | esc nav\n\
cost: type value | enter save | esc restore original | up/down/tab or click away save\n\
cost: backspace delete | ctrl+u clear | paste replaces selection | invalid or negative values are discarded"
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let [_, middle, _] = Layout::vertical([
        Constraint::Percentage((100 - percent_y) / 2),
        Constraint::Percentage(percent_y),
        Constraint::Percentage((100 - percent_y) / 2),
    ])
    .areas(area);

    let [_, center, _] = Layout::horizontal([
        Constraint::Percentage((100 - percent_x) / 2),
        Constraint::Percentage(percent_x),
        Constraint::Percentage((100 - percent_x) / 2),
    ])
    .areas(middle);
    center
}
