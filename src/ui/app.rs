use std::cell::RefCell;
use std::rc::Rc;

use crate::db::Database;
use crate::engine::scheduler::FlushReport;
use crate::engine::{CategoryRow, LeavePolicy, Period, PlanningSession, SyncStatus, SystemClock};
use crate::error::SessionError;
use crate::models::{Month, ValueSpace};

pub(crate) type Session = PlanningSession<Database, SystemClock>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Screen {
    Planner,
    Analysis,
}

impl Screen {
    pub(crate) fn all() -> &'static [Screen] {
        &[Self::Planner, Self::Analysis]
    }
}

impl std::fmt::Display for Screen {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Planner => write!(f, "Planner"),
            Self::Analysis => write!(f, "Analysis"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum InputMode {
    Normal,
    Command,
    Editing,
    Confirm,
}

impl std::fmt::Display for InputMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Normal => write!(f, "NORMAL"),
            Self::Command => write!(f, "COMMAND"),
            Self::Editing => write!(f, "EDIT"),
            Self::Confirm => write!(f, "CONFIRM"),
        }
    }
}

/// A move that leaves the current year or value space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Navigation {
    Space(ValueSpace),
    Year(i32),
    Quit,
}

/// What the edit line writes to when Enter is pressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum EditTarget {
    Cell { category_id: i64, month: Month },
    Fill { category_id: i64 },
}

/// Pending action that requires user confirmation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum PendingAction {
    /// Unsaved edits stand in the way: save, discard, or stay.
    Leave(Navigation),
    DeleteScenario { id: i64, name: String },
    DeleteCategory { id: i64, name: String },
}

pub(crate) struct App {
    pub(crate) running: bool,
    pub(crate) screen: Screen,
    pub(crate) input_mode: InputMode,
    pub(crate) command_input: String,
    pub(crate) edit_input: String,
    pub(crate) edit_target: Option<EditTarget>,
    pub(crate) status_message: String,
    pub(crate) show_help: bool,

    // Planner grid
    pub(crate) row_index: usize,
    pub(crate) row_scroll: usize,
    pub(crate) month_index: usize,

    // Analysis
    pub(crate) analysis_period: Period,

    // Sync status, pushed by the scheduler
    pub(crate) sync: Rc<RefCell<SyncStatus>>,

    // Confirmation
    pub(crate) pending_action: Option<PendingAction>,
    pub(crate) confirm_message: String,

    // Layout (updated each render frame)
    pub(crate) visible_rows: usize,
}

impl App {
    pub(crate) fn new(session: &mut Session) -> Self {
        let sync = Rc::new(RefCell::new(session.sync_status()));
        let sink = Rc::clone(&sync);
        session.on_state_change(move |status| *sink.borrow_mut() = status.clone());

        Self {
            running: true,
            screen: Screen::Planner,
            input_mode: InputMode::Normal,
            command_input: String::new(),
            edit_input: String::new(),
            edit_target: None,
            status_message: String::new(),
            show_help: false,

            row_index: 0,
            row_scroll: 0,
            month_index: 0,

            analysis_period: Period::Year,

            sync,

            pending_action: None,
            confirm_message: String::new(),

            visible_rows: 20,
        }
    }

    pub(crate) fn set_status(&mut self, msg: impl Into<String>) {
        self.status_message = msg.into();
    }

    pub(crate) fn sync_status(&self) -> SyncStatus {
        self.sync.borrow().clone()
    }

    pub(crate) fn selected_month(&self) -> Month {
        Month::from_index(self.month_index).unwrap_or_default()
    }

    pub(crate) fn selected_row<'a>(&self, session: &'a Session) -> Option<&'a CategoryRow> {
        session.rows().get(self.row_index)
    }

    /// Keep the cursor inside the grid after rows were added or removed.
    pub(crate) fn clamp_selection(&mut self, session: &Session) {
        let len = session.rows().len();
        if self.row_index >= len {
            self.row_index = len.saturating_sub(1);
        }
        if self.row_scroll > self.row_index {
            self.row_scroll = self.row_index;
        }
    }

    /// Open the edit line for the selected row, prefilled with the current
    /// amount when editing a single cell.
    pub(crate) fn begin_edit(&mut self, session: &Session, fill: bool) {
        let Some(row) = self.selected_row(session) else {
            self.set_status("No category selected");
            return;
        };
        let category_id = row.category.id;
        let month = self.selected_month();
        self.edit_input = if fill {
            String::new()
        } else {
            let current = row.amount(month);
            if current.is_zero() {
                String::new()
            } else {
                current.normalize().to_string()
            }
        };
        self.edit_target = Some(if fill {
            EditTarget::Fill { category_id }
        } else {
            EditTarget::Cell { category_id, month }
        });
        self.input_mode = InputMode::Editing;
    }

    pub(crate) fn ask(&mut self, action: PendingAction, message: impl Into<String>) {
        self.pending_action = Some(action);
        self.confirm_message = message.into();
        self.input_mode = InputMode::Confirm;
    }

    /// Leave the current scope. With unsaved edits, ask first.
    pub(crate) fn navigate(&mut self, session: &mut Session, nav: Navigation) {
        match apply_navigation(session, nav, LeavePolicy::Refuse) {
            Ok(()) => self.after_navigation(session, nav),
            Err(SessionError::UnsavedEdits { count }) => self.ask(
                PendingAction::Leave(nav),
                format!("{count} unsaved change(s): [s]ave, [d]iscard, any other key stays"),
            ),
            Err(e) => self.set_status(format!("Error: {e}")),
        }
    }

    /// Finish a navigation the user confirmed with a leave policy.
    pub(crate) fn resolve_navigation(
        &mut self,
        session: &mut Session,
        nav: Navigation,
        policy: LeavePolicy,
    ) {
        match apply_navigation(session, nav, policy) {
            Ok(()) => self.after_navigation(session, nav),
            Err(e) => self.set_status(format!("Stayed: {e}")),
        }
    }

    fn after_navigation(&mut self, session: &Session, nav: Navigation) {
        match nav {
            Navigation::Quit => self.running = false,
            Navigation::Space(_) | Navigation::Year(_) => {
                self.clamp_selection(session);
                self.set_status(format!(
                    "{} {}",
                    session.year(),
                    session.space_label()
                ));
            }
        }
    }

    /// Surface the outcome of a save in the command bar.
    pub(crate) fn report_flush(&mut self, outcome: Result<Option<FlushReport>, SessionError>) {
        match outcome {
            Ok(Some(report)) if report.remaining > 0 => self.set_status(format!(
                "Saved {} change(s), {} still pending",
                report.written, report.remaining
            )),
            Ok(Some(report)) => self.set_status(format!("Saved {} change(s)", report.written)),
            Ok(None) => {}
            Err(e) => self.set_status(format!("{e} (Esc to dismiss, Ctrl-s to retry)")),
        }
    }
}

fn apply_navigation(
    session: &mut Session,
    nav: Navigation,
    policy: LeavePolicy,
) -> Result<(), SessionError> {
    match nav {
        Navigation::Space(space) => session.switch_space(space, policy),
        Navigation::Year(year) => session.change_year(year, policy),
        Navigation::Quit => {
            let count = session.pending_count();
            if count == 0 {
                return Ok(());
            }
            match policy {
                LeavePolicy::Refuse => Err(SessionError::UnsavedEdits { count }),
                LeavePolicy::Save => {
                    session.save()?;
                    match session.pending_count() {
                        0 => Ok(()),
                        count => Err(SessionError::UnsavedEdits { count }),
                    }
                }
                LeavePolicy::Discard => {
                    session.discard();
                    Ok(())
                }
            }
        }
    }
}
