#![allow(clippy::unwrap_used)]

use rust_decimal_macros::dec;

use super::*;
use crate::db::Database;
use crate::engine::{PlanScope, PlanningSession, SyncSettings, SystemClock};
use crate::models::ValueSpace;

fn session() -> Session {
    let db = Database::open_in_memory().unwrap();
    PlanningSession::open(db, SystemClock, SyncSettings::default(), PlanScope::live(2025)).unwrap()
}

fn args(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

fn row_total(session: &Session, name: &str) -> rust_decimal::Decimal {
    session
        .rows()
        .iter()
        .find(|r| r.category.name == name)
        .unwrap()
        .total
}

// ── Argument helpers ──────────────────────────────────────────

#[test]
fn test_positionals_skip_flag_values() {
    let a = args(&["Rent", "--year", "2026", "3", "--copy", "1200"]);
    assert_eq!(positionals(&a), vec!["Rent", "3", "1200"]);
    assert_eq!(flag_value(&a, "--year"), Some("2026"));
    assert!(has_flag(&a, "--copy"));
    assert!(!has_flag(&a, "--scenario"));
}

#[test]
fn test_parse_year_bounds() {
    assert_eq!(parse_year("2025").unwrap(), 2025);
    assert!(parse_year("25").is_err());
    assert!(parse_year("next").is_err());
}

// ── Editing ───────────────────────────────────────────────────

#[test]
fn test_set_writes_through() {
    let mut s = session();
    cli_set(&args(&["Rent", "mar", "1,200"]), &mut s).unwrap();

    assert_eq!(s.pending_count(), 0);
    let rent = s.rows().iter().find(|r| r.category.name == "Rent").unwrap();
    assert_eq!(rent.amount(Month::new(3).unwrap()), dec!(1200));
    assert_eq!(s.summary().yearly.fixed_expense, dec!(1200));
}

#[test]
fn test_set_rejects_bad_input() {
    let mut s = session();
    assert!(cli_set(&args(&["Rent", "13", "100"]), &mut s).is_err());
    assert!(cli_set(&args(&["Nope", "1", "100"]), &mut s).is_err());
    assert!(cli_set(&args(&["Rent", "1", "lots"]), &mut s).is_err());
    assert_eq!(s.pending_count(), 0);
}

#[test]
fn test_fill_other_year() {
    let mut s = session();
    cli_fill(&args(&["Salary", "4000", "--year", "2026"]), &mut s).unwrap();

    assert_eq!(s.year(), 2026);
    assert_eq!(s.summary().yearly.income, dec!(48000));

    enter_scope(&mut s, Some(2025), None).unwrap();
    assert_eq!(s.summary().yearly.income, dec!(0));
}

// ── Scenarios ─────────────────────────────────────────────────

#[test]
fn test_scenario_edits_stay_out_of_live() {
    let mut s = session();
    cli_fill(&args(&["Salary", "4000"]), &mut s).unwrap();
    cli_new_scenario(&args(&["Raise", "--copy"]), &mut s).unwrap();
    cli_fill(&args(&["Salary", "5000", "--scenario", "raise"]), &mut s).unwrap();

    assert!(matches!(s.space(), ValueSpace::Scenario(_)));
    assert_eq!(row_total(&s, "Salary"), dec!(60000));

    enter_scope(&mut s, None, Some("live")).unwrap();
    assert_eq!(row_total(&s, "Salary"), dec!(48000));
}

#[test]
fn test_duplicate_scenario_rejected() {
    let mut s = session();
    cli_new_scenario(&args(&["Lean"]), &mut s).unwrap();
    assert!(cli_new_scenario(&args(&["lean"]), &mut s).is_err());
}

#[test]
fn test_delete_scenario_by_name() {
    let mut s = session();
    cli_new_scenario(&args(&["Lean"]), &mut s).unwrap();
    cli_delete_scenario(&args(&["Lean"]), &mut s).unwrap();
    assert!(s.scenarios().is_empty());
    assert!(cli_delete_scenario(&args(&["Lean"]), &mut s).is_err());
}

// ── Catalog ───────────────────────────────────────────────────

#[test]
fn test_reclassify_moves_totals() {
    let mut s = session();
    cli_set(&args(&["Groceries", "1", "300"]), &mut s).unwrap();
    assert_eq!(s.summary().yearly.variable_expense, dec!(300));

    cli_reclassify(&args(&["Groceries", "fixed"]), &mut s).unwrap();
    assert_eq!(s.summary().yearly.variable_expense, dec!(0));
    assert_eq!(s.summary().yearly.fixed_expense, dec!(300));
}

#[test]
fn test_add_rename_delete_category() {
    let mut s = session();
    cli_add_category(&args(&["Gym", "variable", "--order", "5"]), &mut s).unwrap();
    let gym = Category::find_by_name(s.categories(), "gym").unwrap();
    assert_eq!(gym.display_order, 5);

    cli_rename_category(&args(&["Gym", "Fitness"]), &mut s).unwrap();
    assert!(Category::find_by_name(s.categories(), "Fitness").is_some());

    cli_delete_category(&args(&["Fitness"]), &mut s).unwrap();
    assert!(Category::find_by_name(s.categories(), "Fitness").is_none());
}

#[test]
fn test_add_category_usage() {
    let mut s = session();
    assert!(cli_add_category(&args(&["Gym"]), &mut s).is_err());
    assert!(cli_add_category(&args(&["Gym", "sometimes"]), &mut s).is_err());
}

// ── Output ────────────────────────────────────────────────────

#[test]
fn test_format_summary_lists_totals() {
    let mut s = session();
    cli_fill(&args(&["Salary", "5000"]), &mut s).unwrap();
    cli_fill(&args(&["Rent", "1500"]), &mut s).unwrap();

    let out = format_summary(&s);
    assert!(out.starts_with("budgetplan: 2025 Live"));
    assert!(out.contains("60,000.00"));
    assert!(out.contains("Balance"));
    assert!(out.contains("Savings rate:        70.0%"));
    assert!(out.contains("Largest expense:     Rent ($18,000.00)"));
}

#[test]
fn test_format_distribution() {
    let mut s = session();
    cli_set(&args(&["Rent", "2", "750"]), &mut s).unwrap();
    cli_set(&args(&["Groceries", "2", "250"]), &mut s).unwrap();

    let feb = Period::Month(Month::new(2).unwrap());
    let out = format_distribution(&s, feb);
    assert!(out.contains("(Feb)"));
    let rent = out.lines().position(|l| l.contains("Rent")).unwrap();
    let groceries = out.lines().position(|l| l.contains("Groceries")).unwrap();
    assert!(rent < groceries);
    assert!(out.contains("75.0%"));

    let jan = Period::Month(Month::new(1).unwrap());
    assert!(format_distribution(&s, jan).contains("No expenses planned"));
}
