use anyhow::{Context, Result};
use std::fmt::Write as _;

use crate::engine::{resolve_space, LeavePolicy, Period};
use crate::models::{Bucket, Category, CategoryFields, Month, Scenario};
use crate::ui::app::Session;
use crate::ui::util::{format_amount, format_cell, format_percent};

/// Flags that take a value; their values are not positional arguments.
const VALUE_FLAGS: [&str; 4] = ["--year", "--scenario", "--month", "--order"];

pub(crate) fn as_cli(args: &[String], session: &mut Session) -> Result<()> {
    let rest = &args[2..];
    match args[1].as_str() {
        "summary" | "s" => cli_summary(rest, session),
        "categories" => cli_categories(session),
        "add-category" => cli_add_category(rest, session),
        "rename-category" => cli_rename_category(rest, session),
        "reclassify" => cli_reclassify(rest, session),
        "delete-category" => cli_delete_category(rest, session),
        "set" => cli_set(rest, session),
        "fill" => cli_fill(rest, session),
        "scenarios" => cli_scenarios(rest, session),
        "new-scenario" => cli_new_scenario(rest, session),
        "delete-scenario" => cli_delete_scenario(rest, session),
        "distribution" | "dist" => cli_distribution(rest, session),
        "--help" | "-h" | "help" => {
            print_usage();
            Ok(())
        }
        "--version" | "-V" | "version" => {
            println!("budgetplan {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        other => {
            print_usage();
            anyhow::bail!("Unknown command: {other}");
        }
    }
}

fn print_usage() {
    println!("budgetplan: monthly budget planner with what-if scenarios");
    println!();
    println!("Usage: budgetplan [command]");
    println!();
    println!("Commands:");
    println!("  (none)                                  Launch interactive planner");
    println!("  summary [YEAR] [--scenario NAME]        Print the yearly summary");
    println!("  categories                              List categories");
    println!("  add-category NAME income|fixed|variable Add a category");
    println!("    --order <N>                           Position within its group");
    println!("  rename-category NAME NEW                Rename a category");
    println!("  reclassify NAME income|fixed|variable   Move a category to another group");
    println!("  delete-category NAME                    Delete a category and all its values");
    println!("  set CATEGORY MONTH AMOUNT               Set one month's amount");
    println!("  fill CATEGORY AMOUNT                    Set all 12 months to one amount");
    println!("    --year <YYYY>                         Year to edit (default: configured year)");
    println!("    --scenario <NAME>                     Edit a scenario instead of live data");
    println!("  scenarios [YEAR]                        List scenarios of a year");
    println!("  new-scenario NAME [--year Y] [--copy]   Create a scenario, optionally from live data");
    println!("  delete-scenario NAME [--year Y]         Delete a scenario");
    println!("  distribution [YEAR] [--month M]         Expense share by category");
    println!("    --scenario <NAME>                     Read a scenario instead of live data");
    println!("  --help, -h                              Show this help");
    println!("  --version, -V                           Show version");
}

// ── Argument helpers ─────────────────────────────────────────

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

fn has_flag(args: &[String], flag: &str) -> bool {
    args.iter().any(|a| a == flag)
}

/// Arguments that are neither flags nor flag values.
fn positionals(args: &[String]) -> Vec<&str> {
    let mut out = Vec::new();
    let mut skip_next = false;
    for arg in args {
        if skip_next {
            skip_next = false;
            continue;
        }
        if VALUE_FLAGS.contains(&arg.as_str()) {
            skip_next = true;
        } else if !arg.starts_with("--") {
            out.push(arg.as_str());
        }
    }
    out
}

fn parse_year(s: &str) -> Result<i32> {
    s.parse::<i32>()
        .ok()
        .filter(|y| (1900..=9999).contains(y))
        .ok_or_else(|| anyhow::anyhow!("Invalid year: {s}"))
}

fn parse_bucket(s: &str) -> Result<Bucket> {
    Bucket::parse(s).ok_or_else(|| anyhow::anyhow!("Expected income, fixed or variable, got '{s}'"))
}

fn find_category(session: &Session, name: &str) -> Result<Category> {
    Category::find_by_name(session.categories(), name)
        .cloned()
        .ok_or_else(|| anyhow::anyhow!("Category '{name}' not found"))
}

/// Point the session at the requested year and value space. A fresh CLI
/// session has nothing pending, so leaving never needs a decision.
fn enter_scope(session: &mut Session, year: Option<i32>, scenario: Option<&str>) -> Result<()> {
    if let Some(year) = year {
        session.change_year(year, LeavePolicy::Refuse)?;
    }
    let space = resolve_space(session.scenarios(), session.year(), scenario)
        .map_err(|msg| anyhow::anyhow!(msg))?;
    session.switch_space(space, LeavePolicy::Refuse)?;
    Ok(())
}

fn scope_from_flags(session: &mut Session, args: &[String]) -> Result<()> {
    let year = flag_value(args, "--year").map(parse_year).transpose()?;
    enter_scope(session, year, flag_value(args, "--scenario"))
}

fn save_and_report(session: &mut Session) -> Result<()> {
    match session.save().context("Failed to save")? {
        Some(report) => println!(
            "Saved {} value(s) to {} {}",
            report.written,
            session.year(),
            session.space_label()
        ),
        None => println!("Nothing to save"),
    }
    Ok(())
}

// ── Commands ─────────────────────────────────────────────────

fn cli_summary(args: &[String], session: &mut Session) -> Result<()> {
    let year = positionals(args).first().map(|y| parse_year(y)).transpose()?;
    enter_scope(session, year, flag_value(args, "--scenario"))?;
    print!("{}", format_summary(session));
    Ok(())
}

pub(crate) fn format_summary(session: &Session) -> String {
    let summary = session.summary();
    let mut out = String::new();

    let _ = writeln!(out, "budgetplan: {} {}", session.year(), session.space_label());
    let _ = write!(out, "{:<20}", "");
    for m in Month::all() {
        let _ = write!(out, "{:>11}", m.short_name());
    }
    let _ = writeln!(out, "{:>13}", "Total");
    let _ = writeln!(out, "{}", "─".repeat(20 + 11 * Month::COUNT + 13));

    for row in session.rows() {
        let _ = write!(out, "{:<20}", row.category.name);
        for m in Month::all() {
            let _ = write!(out, "{:>11}", format_cell(row.amount(m)));
        }
        let _ = writeln!(out, "{:>13}", format_cell(row.total));
    }
    let _ = writeln!(out, "{}", "─".repeat(20 + 11 * Month::COUNT + 13));

    for &bucket in Bucket::all() {
        let amounts = summary.by_bucket(bucket);
        let _ = write!(out, "{:<20}", bucket.label());
        for m in Month::all() {
            let _ = write!(out, "{:>11}", format_cell(amounts[m.index()]));
        }
        let _ = writeln!(out, "{:>13}", format_cell(summary.yearly_for(bucket)));
    }
    let _ = write!(out, "{:<20}", "Balance");
    for m in Month::all() {
        let _ = write!(out, "{:>11}", format_cell(summary.balance(m)));
    }
    let _ = writeln!(out, "{:>13}", format_cell(summary.yearly.balance));

    let stats = session.quick_stats();
    let _ = writeln!(out);
    let _ = writeln!(out, "  Income:              {}", format_amount(summary.yearly.income));
    let _ = writeln!(out, "  Expenses:            {}", format_amount(summary.yearly.total_expense));
    let _ = writeln!(out, "  Balance:             {}", format_amount(summary.yearly.balance));
    let _ = writeln!(out, "  Savings rate:        {}", format_percent(stats.savings_rate));
    let _ = writeln!(out, "  Avg monthly surplus: {}", format_amount(stats.avg_monthly_surplus));
    if let Some((name, amount)) = &stats.top_expense {
        let _ = writeln!(out, "  Largest expense:     {name} ({})", format_amount(*amount));
    }
    out
}

fn cli_categories(session: &mut Session) -> Result<()> {
    let categories = session.categories();
    if categories.is_empty() {
        println!("No categories");
        return Ok(());
    }
    println!("{:<4} {:<24} {:<18} Order", "ID", "Name", "Group");
    println!("{}", "─".repeat(55));
    for cat in categories {
        println!(
            "{:<4} {:<24} {:<18} {}",
            cat.id,
            cat.name,
            cat.bucket().label(),
            cat.display_order
        );
    }
    Ok(())
}

fn cli_add_category(args: &[String], session: &mut Session) -> Result<()> {
    let pos = positionals(args);
    let [name, bucket] = pos[..] else {
        anyhow::bail!("Usage: budgetplan add-category NAME income|fixed|variable [--order N]");
    };
    let bucket = parse_bucket(bucket)?;
    let order = flag_value(args, "--order")
        .map(|o| o.parse::<i32>().with_context(|| format!("Invalid order: {o}")))
        .transpose()?
        .unwrap_or(0);
    let cat = session.create_category(&CategoryFields::new(name, bucket).with_order(order))?;
    println!("Created category {} ({}) with id {}", cat.name, bucket.label(), cat.id);
    Ok(())
}

fn cli_rename_category(args: &[String], session: &mut Session) -> Result<()> {
    let pos = positionals(args);
    let [name, new_name] = pos[..] else {
        anyhow::bail!("Usage: budgetplan rename-category NAME NEW");
    };
    let cat = find_category(session, name)?;
    let mut fields = CategoryFields::from(&cat);
    fields.name = new_name.to_string();
    let updated = session.update_category(cat.id, &fields)?;
    println!("Renamed {} to {}", cat.name, updated.name);
    Ok(())
}

fn cli_reclassify(args: &[String], session: &mut Session) -> Result<()> {
    let pos = positionals(args);
    let [name, bucket] = pos[..] else {
        anyhow::bail!("Usage: budgetplan reclassify NAME income|fixed|variable");
    };
    let bucket = parse_bucket(bucket)?;
    let cat = find_category(session, name)?;
    let fields = CategoryFields::new(cat.name.clone(), bucket).with_order(cat.display_order);
    session.update_category(cat.id, &fields)?;
    println!("{} is now {} (all years report it there)", cat.name, bucket.label());
    Ok(())
}

fn cli_delete_category(args: &[String], session: &mut Session) -> Result<()> {
    let pos = positionals(args);
    let [name] = pos[..] else {
        anyhow::bail!("Usage: budgetplan delete-category NAME");
    };
    let cat = find_category(session, name)?;
    session.delete_category(cat.id)?;
    println!("Deleted category {} and all its values", cat.name);
    Ok(())
}

fn cli_set(args: &[String], session: &mut Session) -> Result<()> {
    let pos = positionals(args);
    let [name, month, amount] = pos[..] else {
        anyhow::bail!("Usage: budgetplan set CATEGORY MONTH AMOUNT [--year Y] [--scenario NAME]");
    };
    scope_from_flags(session, args)?;
    let cat = find_category(session, name)?;
    let month = Month::parse(month).ok_or_else(|| anyhow::anyhow!("Invalid month: {month}"))?;
    session.set_value_text(cat.id, month.number(), amount)?;
    save_and_report(session)
}

fn cli_fill(args: &[String], session: &mut Session) -> Result<()> {
    let pos = positionals(args);
    let [name, amount] = pos[..] else {
        anyhow::bail!("Usage: budgetplan fill CATEGORY AMOUNT [--year Y] [--scenario NAME]");
    };
    scope_from_flags(session, args)?;
    let cat = find_category(session, name)?;
    let amount = crate::engine::buffer::parse_amount(amount)?;
    session.auto_fill(cat.id, amount)?;
    save_and_report(session)
}

fn cli_scenarios(args: &[String], session: &mut Session) -> Result<()> {
    let year = positionals(args).first().map(|y| parse_year(y)).transpose()?;
    enter_scope(session, year, None)?;
    let scenarios = session.scenarios();
    if scenarios.is_empty() {
        println!("No scenarios for {}", session.year());
        return Ok(());
    }
    println!("{:<4} {:<24} Created", "ID", "Name");
    println!("{}", "─".repeat(50));
    for s in scenarios {
        println!("{:<4} {:<24} {}", s.id, s.name, s.created_at);
    }
    Ok(())
}

fn cli_new_scenario(args: &[String], session: &mut Session) -> Result<()> {
    let pos = positionals(args);
    let [name] = pos[..] else {
        anyhow::bail!("Usage: budgetplan new-scenario NAME [--year Y] [--copy]");
    };
    scope_from_flags(session, args)?;
    if Scenario::find_by_name(session.scenarios(), name).is_some() {
        anyhow::bail!("Scenario '{name}' already exists for {}", session.year());
    }
    let copy = has_flag(args, "--copy");
    let scenario = session.create_scenario(name, copy)?;
    println!(
        "Created scenario {} for {}{}",
        scenario.name,
        scenario.year,
        if copy { " from live data" } else { "" }
    );
    Ok(())
}

fn cli_delete_scenario(args: &[String], session: &mut Session) -> Result<()> {
    let pos = positionals(args);
    let [name] = pos[..] else {
        anyhow::bail!("Usage: budgetplan delete-scenario NAME [--year Y]");
    };
    let year = flag_value(args, "--year").map(parse_year).transpose()?;
    enter_scope(session, year, None)?;
    let scenario = Scenario::find_by_name(session.scenarios(), name)
        .cloned()
        .ok_or_else(|| anyhow::anyhow!("No scenario '{name}' for {}", session.year()))?;
    session.delete_scenario(scenario.id)?;
    println!("Deleted scenario {}", scenario.name);
    Ok(())
}

fn cli_distribution(args: &[String], session: &mut Session) -> Result<()> {
    let year = positionals(args).first().map(|y| parse_year(y)).transpose()?;
    enter_scope(session, year, flag_value(args, "--scenario"))?;
    let period = match flag_value(args, "--month") {
        Some(m) => Period::Month(Month::parse(m).ok_or_else(|| anyhow::anyhow!("Invalid month: {m}"))?),
        None => Period::Year,
    };
    print!("{}", format_distribution(session, period));
    Ok(())
}

pub(crate) fn format_distribution(session: &Session, period: Period) -> String {
    let shares = session.distribution(period);
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Expenses by category: {} {} ({period})",
        session.year(),
        session.space_label()
    );
    if shares.is_empty() {
        let _ = writeln!(out, "  No expenses planned");
        return out;
    }
    for share in &shares {
        let _ = writeln!(
            out,
            "  {:<24} {:>14} {:>6.1}%",
            share.name,
            format_amount(share.amount),
            share.percent
        );
    }
    out
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod cli_tests;
