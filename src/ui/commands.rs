use std::collections::HashMap;
use std::sync::LazyLock;

use super::app::{App, InputMode, Navigation, PendingAction, Screen, Session};
use crate::engine::buffer::parse_amount;
use crate::engine::{resolve_space, Period};
use crate::error::SessionError;
use crate::models::{Bucket, CategoryFields, Month, Scenario};

pub(crate) struct Command {
    pub(crate) description: &'static str,
    pub(crate) run: fn(&str, &mut App, &mut Session) -> anyhow::Result<()>,
}

macro_rules! register_command {
    ($name:expr, $desc:expr, $func:expr, $registry:expr) => {{
        $registry.insert(
            $name,
            Command {
                description: $desc,
                run: $func,
            },
        );
    }};
}

pub(crate) static COMMANDS: LazyLock<HashMap<&str, Command>> = LazyLock::new(|| {
    let mut r: HashMap<&str, Command> = HashMap::new();

    register_command!("q", "Quit", cmd_quit, r);
    register_command!("quit", "Quit", cmd_quit, r);
    register_command!("w", "Save pending changes now", cmd_write, r);
    register_command!("write", "Save pending changes now", cmd_write, r);
    register_command!("wq", "Save and quit", cmd_write_quit, r);
    register_command!("discard", "Drop all unsaved changes", cmd_discard, r);
    register_command!("p", "Go to Planner", cmd_planner, r);
    register_command!("planner", "Go to Planner", cmd_planner, r);
    register_command!("a", "Go to Analysis", cmd_analysis, r);
    register_command!("analysis", "Go to Analysis", cmd_analysis, r);
    register_command!("help", "Show available commands", cmd_help, r);
    register_command!("h", "Show available commands", cmd_help, r);
    register_command!("year", "Plan another year (e.g. :year 2026)", cmd_year, r);
    register_command!("y", "Plan another year (e.g. :y 2026)", cmd_year, r);
    register_command!(
        "scenario",
        "Switch to a scenario or back (e.g. :scenario Raise, :scenario live)",
        cmd_scenario,
        r
    );
    register_command!("sc", "Switch scenario (e.g. :sc live)", cmd_scenario, r);
    register_command!(
        "new-scenario",
        "Create a scenario for this year (e.g. :new-scenario Raise --copy)",
        cmd_new_scenario,
        r
    );
    register_command!(
        "delete-scenario",
        "Delete a scenario (default: the active one)",
        cmd_delete_scenario,
        r
    );
    register_command!(
        "category",
        "Create category (e.g. :category Gym variable)",
        cmd_category,
        r
    );
    register_command!(
        "rename",
        "Rename selected category (e.g. :rename Fitness)",
        cmd_rename,
        r
    );
    register_command!(
        "reclassify",
        "Move selected category (e.g. :reclassify fixed)",
        cmd_reclassify,
        r
    );
    register_command!(
        "delete-category",
        "Delete selected category and its values",
        cmd_delete_category,
        r
    );
    register_command!(
        "fill",
        "Set all 12 months of selected category (e.g. :fill 450)",
        cmd_fill,
        r
    );
    register_command!(
        "period",
        "Distribution period on Analysis (e.g. :period 3, :period year)",
        cmd_period,
        r
    );

    r
});

pub(crate) fn handle_command(input: &str, app: &mut App, session: &mut Session) -> anyhow::Result<()> {
    let trimmed = input.trim();
    let mut parts = trimmed.splitn(2, ' ');
    let cmd_name = parts.next().unwrap_or("");
    let args = parts.next().unwrap_or("").trim();

    if let Some(cmd) = COMMANDS.get(cmd_name) {
        (cmd.run)(args, app, session)?;
    } else {
        let suggestion = find_closest(cmd_name);
        app.set_status(format!(
            "Unknown command: :{cmd_name}. Did you mean :{suggestion}?"
        ));
    }

    Ok(())
}

fn find_closest(input: &str) -> String {
    COMMANDS
        .keys()
        .filter(|k| k.len() > 2)
        .min_by_key(|k| levenshtein(input, k))
        .unwrap_or(&"help")
        .to_string()
}

fn levenshtein(a: &str, b: &str) -> usize {
    let (a, b) = (a.as_bytes(), b.as_bytes());
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for i in 1..=a.len() {
        curr[0] = i;
        for j in 1..=b.len() {
            let cost = if a[i - 1] == b[j - 1] { 0 } else { 1 };
            curr[j] = (prev[j] + 1).min(curr[j - 1] + 1).min(prev[j - 1] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

/// Split `"Dining Out variable"` into the name and its trailing bucket.
pub(crate) fn split_bucket(args: &str) -> Option<(&str, Bucket)> {
    let (name, bucket) = args.trim().rsplit_once(' ')?;
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    Some((name, Bucket::parse(bucket)?))
}

/// Remove a boolean `--flag` from an argument string.
pub(crate) fn take_flag<'a>(args: &'a str, flag: &str) -> (String, bool) {
    let mut found = false;
    let rest: Vec<&'a str> = args
        .split_whitespace()
        .filter(|w| {
            let hit = *w == flag;
            found |= hit;
            !hit
        })
        .collect();
    (rest.join(" "), found)
}

// ── Command implementations ──────────────────────────────────

fn cmd_quit(_args: &str, app: &mut App, session: &mut Session) -> anyhow::Result<()> {
    app.navigate(session, Navigation::Quit);
    Ok(())
}

fn cmd_write(_args: &str, app: &mut App, session: &mut Session) -> anyhow::Result<()> {
    let outcome = session.save();
    if matches!(outcome, Ok(None)) {
        app.set_status("Nothing to save");
    }
    app.report_flush(outcome);
    Ok(())
}

fn cmd_write_quit(_args: &str, app: &mut App, session: &mut Session) -> anyhow::Result<()> {
    let outcome = session.save();
    let failed = outcome.is_err();
    app.report_flush(outcome);
    if !failed {
        app.navigate(session, Navigation::Quit);
    }
    Ok(())
}

fn cmd_discard(_args: &str, app: &mut App, session: &mut Session) -> anyhow::Result<()> {
    let dropped = session.discard();
    app.set_status(format!("Discarded {dropped} change(s)"));
    Ok(())
}

fn cmd_planner(_args: &str, app: &mut App, _session: &mut Session) -> anyhow::Result<()> {
    app.screen = Screen::Planner;
    Ok(())
}

fn cmd_analysis(_args: &str, app: &mut App, _session: &mut Session) -> anyhow::Result<()> {
    app.screen = Screen::Analysis;
    Ok(())
}

fn cmd_help(_args: &str, app: &mut App, _session: &mut Session) -> anyhow::Result<()> {
    app.show_help = true;
    Ok(())
}

fn cmd_year(args: &str, app: &mut App, session: &mut Session) -> anyhow::Result<()> {
    match args.parse::<i32>() {
        Ok(year) if (1900..=9999).contains(&year) => app.navigate(session, Navigation::Year(year)),
        _ => app.set_status("Usage: :year <YYYY>"),
    }
    Ok(())
}

fn cmd_scenario(args: &str, app: &mut App, session: &mut Session) -> anyhow::Result<()> {
    if args.is_empty() {
        let names: Vec<&str> = session.scenarios().iter().map(|s| s.name.as_str()).collect();
        if names.is_empty() {
            app.set_status(format!("No scenarios for {}. Create one with :new-scenario", session.year()));
        } else {
            app.set_status(format!("Scenarios: live, {}", names.join(", ")));
        }
        return Ok(());
    }
    match resolve_space(session.scenarios(), session.year(), Some(args)) {
        Ok(space) => app.navigate(session, Navigation::Space(space)),
        Err(msg) => app.set_status(msg),
    }
    Ok(())
}

fn cmd_new_scenario(args: &str, app: &mut App, session: &mut Session) -> anyhow::Result<()> {
    let (name, copy) = take_flag(args, "--copy");
    if name.is_empty() {
        app.set_status("Usage: :new-scenario <name> [--copy]");
        return Ok(());
    }
    if Scenario::find_by_name(session.scenarios(), &name).is_some() {
        app.set_status(format!("Scenario '{name}' already exists"));
        return Ok(());
    }
    match session.create_scenario(&name, copy) {
        Ok(scenario) => {
            app.navigate(session, Navigation::Space(scenario.space()));
            if app.input_mode != InputMode::Confirm {
                app.set_status(format!("Created and opened scenario '{}'", scenario.name));
            }
        }
        Err(e) => app.set_status(format!("Error: {e}")),
    }
    Ok(())
}

fn cmd_delete_scenario(args: &str, app: &mut App, session: &mut Session) -> anyhow::Result<()> {
    let target = if args.is_empty() {
        session
            .space()
            .scenario_id()
            .and_then(|id| Scenario::find_by_id(session.scenarios(), id))
    } else {
        Scenario::find_by_name(session.scenarios(), args)
    };
    match target {
        Some(s) => {
            let (id, name) = (s.id, s.name.clone());
            app.ask(
                PendingAction::DeleteScenario {
                    id,
                    name: name.clone(),
                },
                format!("Delete scenario '{name}' and all its values?"),
            );
        }
        None if args.is_empty() => app.set_status("Not in a scenario. Use :delete-scenario <name>"),
        None => app.set_status(format!("No scenario '{args}' for {}", session.year())),
    }
    Ok(())
}

fn cmd_category(args: &str, app: &mut App, session: &mut Session) -> anyhow::Result<()> {
    let Some((name, bucket)) = split_bucket(args) else {
        app.set_status("Usage: :category <name> income|fixed|variable");
        return Ok(());
    };
    let order = session
        .categories()
        .iter()
        .filter(|c| c.bucket() == bucket)
        .map(|c| c.display_order + 1)
        .max()
        .unwrap_or(0);
    match session.create_category(&CategoryFields::new(name, bucket).with_order(order)) {
        Ok(cat) => app.set_status(format!("Created {} ({})", cat.name, bucket.label())),
        Err(e) => app.set_status(format!("Error: {e}")),
    }
    Ok(())
}

fn cmd_rename(args: &str, app: &mut App, session: &mut Session) -> anyhow::Result<()> {
    if args.is_empty() {
        app.set_status("Usage: :rename <new name>");
        return Ok(());
    }
    let Some(row) = app.selected_row(session) else {
        app.set_status("No category selected");
        return Ok(());
    };
    let id = row.category.id;
    let mut fields = CategoryFields::from(&row.category);
    fields.name = args.to_string();
    match session.update_category(id, &fields) {
        Ok(cat) => app.set_status(format!("Renamed to {}", cat.name)),
        Err(e) => app.set_status(format!("Error: {e}")),
    }
    Ok(())
}

fn cmd_reclassify(args: &str, app: &mut App, session: &mut Session) -> anyhow::Result<()> {
    let Some(bucket) = Bucket::parse(args) else {
        app.set_status("Usage: :reclassify income|fixed|variable");
        return Ok(());
    };
    let Some(row) = app.selected_row(session) else {
        app.set_status("No category selected");
        return Ok(());
    };
    let id = row.category.id;
    let fields = CategoryFields::new(row.category.name.clone(), bucket)
        .with_order(row.category.display_order);
    match session.update_category(id, &fields) {
        Ok(cat) => {
            app.clamp_selection(session);
            app.set_status(format!("{} is now {}", cat.name, bucket.label()));
        }
        Err(e) => app.set_status(format!("Error: {e}")),
    }
    Ok(())
}

fn cmd_delete_category(_args: &str, app: &mut App, session: &mut Session) -> anyhow::Result<()> {
    let Some(row) = app.selected_row(session) else {
        app.set_status("No category selected");
        return Ok(());
    };
    let (id, name) = (row.category.id, row.category.name.clone());
    app.ask(
        PendingAction::DeleteCategory {
            id,
            name: name.clone(),
        },
        format!("Delete category '{name}' with all its values in every year and scenario?"),
    );
    Ok(())
}

fn cmd_fill(args: &str, app: &mut App, session: &mut Session) -> anyhow::Result<()> {
    let Some(id) = app.selected_row(session).map(|r| r.category.id) else {
        app.set_status("No category selected");
        return Ok(());
    };
    let result = parse_amount(args)
        .map_err(SessionError::from)
        .and_then(|amount| session.auto_fill(id, amount));
    match result {
        Ok(()) => app.set_status("Filled 12 months"),
        Err(e) => app.set_status(format!("Error: {e}")),
    }
    Ok(())
}

fn cmd_period(args: &str, app: &mut App, _session: &mut Session) -> anyhow::Result<()> {
    let period = match args.trim() {
        "" | "year" | "y" => Some(Period::Year),
        n => n.parse::<u32>().ok().and_then(Month::new).map(Period::Month),
    };
    match period {
        Some(p) => {
            app.analysis_period = p;
            app.screen = Screen::Analysis;
        }
        None => app.set_status("Usage: :period <1-12>|year"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_bucket() {
        assert_eq!(
            split_bucket("Dining Out variable"),
            Some(("Dining Out", Bucket::VariableExpense))
        );
        assert_eq!(split_bucket("Bonus income"), Some(("Bonus", Bucket::Income)));
        assert_eq!(split_bucket("fixed"), None);
        assert_eq!(split_bucket("Gym sometimes"), None);
    }

    #[test]
    fn test_take_flag() {
        assert_eq!(take_flag("Raise --copy", "--copy"), ("Raise".to_string(), true));
        assert_eq!(take_flag("Big Raise", "--copy"), ("Big Raise".to_string(), false));
    }

    #[test]
    fn test_closest_command() {
        assert_eq!(find_closest("scenaro"), "scenario");
        assert_eq!(find_closest("reclasify"), "reclassify");
    }
}
