use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use rust_decimal::Decimal;
use std::io;
use std::time::Duration;

use crate::engine::{LeavePolicy, Period};
use crate::error::SessionError;
use crate::models::Month;
use crate::ui::app::{App, EditTarget, InputMode, Navigation, PendingAction, Screen, Session};
use crate::ui::commands;
use crate::ui::screens::planner::FOOTER_HEIGHT;
use crate::ui::util::{scroll_down, scroll_to_bottom, scroll_to_top, scroll_up};

/// Longest wait for input when no save is due, so the status bar stays fresh.
const IDLE_POLL: Duration = Duration::from_millis(500);

pub(crate) fn as_tui(session: &mut Session) -> Result<()> {
    let mut app = App::new(session);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, &mut app, session);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(ref e) = result {
        eprintln!("Error: {e:?}");
    }
    if session.pending_count() > 0 {
        eprintln!(
            "Warning: {} unsaved change(s) were not written",
            session.pending_count()
        );
    }

    result
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    session: &mut Session,
) -> Result<()> {
    while app.running {
        terminal.draw(|f| {
            // tab + status + command bars, grid borders and header, totals footer
            let content_height = f.area().height.saturating_sub(6 + FOOTER_HEIGHT) as usize;
            app.visible_rows = content_height.max(1);
            crate::ui::render::render(f, app, session);
        })?;

        let timeout = session
            .time_until_due()
            .map_or(IDLE_POLL, |due| due.min(IDLE_POLL));

        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    handle_key(key, app, session)?;
                }
            }
        }

        if let Some(outcome) = session.tick() {
            app.report_flush(outcome.map(Some));
        }
    }
    Ok(())
}

fn handle_key(key: event::KeyEvent, app: &mut App, session: &mut Session) -> Result<()> {
    if app.show_help {
        app.show_help = false;
        return Ok(());
    }
    match app.input_mode {
        InputMode::Normal => handle_normal_input(key, app, session)?,
        InputMode::Command => handle_command_input(key, app, session)?,
        InputMode::Editing => handle_editing_input(key, app, session),
        InputMode::Confirm => handle_confirm_input(key, app, session),
    }
    Ok(())
}

// ── Input handlers ───────────────────────────────────────────

fn handle_normal_input(key: event::KeyEvent, app: &mut App, session: &mut Session) -> Result<()> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Char('q') | KeyCode::Char('c') if ctrl => {
            app.navigate(session, Navigation::Quit);
        }
        KeyCode::Char('s') if ctrl => {
            commands::handle_command("write", app, session)?;
        }
        KeyCode::Char('d') if ctrl => {
            for _ in 0..app.visible_rows / 2 {
                handle_move_down(app, session);
            }
        }
        KeyCode::Char('u') if ctrl => {
            for _ in 0..app.visible_rows / 2 {
                handle_move_up(app);
            }
        }
        KeyCode::Char(':') => {
            app.input_mode = InputMode::Command;
            app.command_input.clear();
        }
        KeyCode::Char('j') | KeyCode::Down => handle_move_down(app, session),
        KeyCode::Char('k') | KeyCode::Up => handle_move_up(app),
        KeyCode::Char('h') | KeyCode::Left => handle_move_left(app),
        KeyCode::Char('l') | KeyCode::Right => handle_move_right(app),
        KeyCode::Char('g') => scroll_to_top(&mut app.row_index, &mut app.row_scroll),
        KeyCode::Char('G') => scroll_to_bottom(
            &mut app.row_index,
            &mut app.row_scroll,
            session.rows().len(),
            app.visible_rows,
        ),
        KeyCode::Char('1') => app.screen = Screen::Planner,
        KeyCode::Char('2') => app.screen = Screen::Analysis,
        KeyCode::Tab | KeyCode::BackTab => {
            app.screen = match app.screen {
                Screen::Planner => Screen::Analysis,
                Screen::Analysis => Screen::Planner,
            };
        }
        KeyCode::Char('[') => app.navigate(session, Navigation::Year(session.year() - 1)),
        KeyCode::Char(']') => app.navigate(session, Navigation::Year(session.year() + 1)),
        KeyCode::Enter | KeyCode::Char('e') if app.screen == Screen::Planner => {
            app.begin_edit(session, false);
        }
        KeyCode::Char('f') if app.screen == Screen::Planner => {
            if let Some((id, amount)) = app
                .selected_row(session)
                .map(|r| (r.category.id, r.amount(app.selected_month())))
            {
                match session.auto_fill(id, amount) {
                    Ok(()) => app.set_status("Copied to all 12 months"),
                    Err(e) => app.set_status(format!("Error: {e}")),
                }
            }
        }
        KeyCode::Char('F') if app.screen == Screen::Planner => {
            app.begin_edit(session, true);
        }
        KeyCode::Char('x') if app.screen == Screen::Planner => {
            if let Some(id) = app.selected_row(session).map(|r| r.category.id) {
                let month = app.selected_month().number();
                if let Err(e) = session.set_value(id, month, Decimal::ZERO) {
                    app.set_status(format!("Error: {e}"));
                }
            }
        }
        KeyCode::Char('?') => app.show_help = true,
        KeyCode::Esc => {
            if app.sync_status().last_error.is_some() {
                session.dismiss_error();
            }
            app.status_message.clear();
        }
        _ => {}
    }
    Ok(())
}

fn handle_move_down(app: &mut App, session: &Session) {
    if app.screen == Screen::Planner {
        scroll_down(
            &mut app.row_index,
            &mut app.row_scroll,
            session.rows().len(),
            app.visible_rows,
        );
    }
}

fn handle_move_up(app: &mut App) {
    if app.screen == Screen::Planner {
        scroll_up(&mut app.row_index, &mut app.row_scroll);
    }
}

fn handle_move_left(app: &mut App) {
    match app.screen {
        Screen::Planner => app.month_index = app.month_index.saturating_sub(1),
        Screen::Analysis => app.analysis_period = step_period(app.analysis_period, -1),
    }
}

fn handle_move_right(app: &mut App) {
    match app.screen {
        Screen::Planner => app.month_index = (app.month_index + 1).min(Month::COUNT - 1),
        Screen::Analysis => app.analysis_period = step_period(app.analysis_period, 1),
    }
}

/// Cycle Year → Jan → … → Dec → Year.
fn step_period(period: Period, delta: i32) -> Period {
    let pos = match period {
        Period::Year => 0,
        Period::Month(m) => m.number() as i32,
    };
    let next = (pos + delta).rem_euclid(Month::COUNT as i32 + 1);
    match Month::new(next as u32) {
        Some(m) => Period::Month(m),
        None => Period::Year,
    }
}

fn handle_command_input(key: event::KeyEvent, app: &mut App, session: &mut Session) -> Result<()> {
    match key.code {
        KeyCode::Enter => {
            let input = app.command_input.clone();
            app.input_mode = InputMode::Normal;
            app.command_input.clear();
            commands::handle_command(&input, app, session)?;
        }
        KeyCode::Esc => {
            app.input_mode = InputMode::Normal;
            app.command_input.clear();
        }
        KeyCode::Backspace => {
            app.command_input.pop();
            if app.command_input.is_empty() {
                app.input_mode = InputMode::Normal;
            }
        }
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.command_input.clear();
            app.input_mode = InputMode::Normal;
        }
        KeyCode::Char('w') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            let trimmed = app.command_input.trim_end();
            if let Some(pos) = trimmed.rfind(' ') {
                app.command_input.truncate(pos + 1);
            } else {
                app.command_input.clear();
                app.input_mode = InputMode::Normal;
            }
        }
        KeyCode::Char(c) => {
            app.command_input.push(c);
        }
        _ => {}
    }
    Ok(())
}

fn handle_editing_input(key: event::KeyEvent, app: &mut App, session: &mut Session) {
    match key.code {
        KeyCode::Enter => {
            let input = std::mem::take(&mut app.edit_input);
            let target = app.edit_target.take();
            app.input_mode = InputMode::Normal;
            let result = match target {
                Some(EditTarget::Cell { category_id, month }) => {
                    let text = if input.trim().is_empty() { "0" } else { input.as_str() };
                    session.set_value_text(category_id, month.number(), text)
                }
                Some(EditTarget::Fill { category_id }) => crate::engine::buffer::parse_amount(&input)
                    .map_err(SessionError::from)
                    .and_then(|amount| session.auto_fill(category_id, amount)),
                None => Ok(()),
            };
            match result {
                Ok(()) => {
                    if matches!(target, Some(EditTarget::Cell { .. })) {
                        app.month_index = (app.month_index + 1).min(Month::COUNT - 1);
                    }
                }
                Err(e) => app.set_status(format!("Error: {e}")),
            }
        }
        KeyCode::Esc => {
            app.edit_input.clear();
            app.edit_target = None;
            app.input_mode = InputMode::Normal;
            app.set_status("Edit cancelled");
        }
        KeyCode::Backspace => {
            app.edit_input.pop();
        }
        KeyCode::Char(c) => {
            app.edit_input.push(c);
        }
        _ => {}
    }
}

fn handle_confirm_input(key: event::KeyEvent, app: &mut App, session: &mut Session) {
    let action = app.pending_action.take();
    app.input_mode = InputMode::Normal;
    app.confirm_message.clear();

    let Some(action) = action else {
        return;
    };

    match (action, key.code) {
        (PendingAction::Leave(nav), KeyCode::Char('s')) => {
            app.resolve_navigation(session, nav, LeavePolicy::Save);
        }
        (PendingAction::Leave(nav), KeyCode::Char('d')) => {
            app.resolve_navigation(session, nav, LeavePolicy::Discard);
        }
        (PendingAction::DeleteScenario { id, name }, KeyCode::Char('y') | KeyCode::Char('Y')) => {
            match session.delete_scenario(id) {
                Ok(()) => {
                    app.clamp_selection(session);
                    app.set_status(format!("Deleted scenario '{name}'"));
                }
                Err(e) => app.set_status(format!("Error: {e}")),
            }
        }
        (PendingAction::DeleteCategory { id, name }, KeyCode::Char('y') | KeyCode::Char('Y')) => {
            match session.delete_category(id) {
                Ok(_) => {
                    app.clamp_selection(session);
                    app.set_status(format!("Deleted category '{name}'"));
                }
                Err(e) => app.set_status(format!("Error: {e}")),
            }
        }
        _ => app.set_status("Cancelled"),
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn test_step_period_wraps() {
        let dec = Period::Month(Month::new(12).unwrap());
        assert_eq!(step_period(Period::Year, 1), Period::Month(Month::new(1).unwrap()));
        assert_eq!(step_period(dec, 1), Period::Year);
        assert_eq!(step_period(Period::Year, -1), dec);
    }
}
