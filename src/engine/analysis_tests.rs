#![allow(clippy::unwrap_used)]

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::*;
use crate::engine::summary::compute_summary;
use crate::models::{Bucket, Category, Month, ValueFact, ValueSpace};

fn cat(id: i64, name: &str, bucket: Bucket, order: i32) -> Category {
    Category {
        id,
        name: name.into(),
        kind: bucket.kind(),
        is_fixed: bucket.is_fixed(),
        display_order: order,
    }
}

fn fact(category_id: i64, month: u32, amount: Decimal) -> ValueFact {
    ValueFact::new(
        ValueSpace::Live,
        category_id,
        2025,
        Month::new(month).unwrap(),
        amount,
    )
}

fn categories() -> Vec<Category> {
    vec![
        cat(1, "Salary", Bucket::Income, 0),
        cat(3, "Groceries", Bucket::VariableExpense, 0),
        cat(2, "Rent", Bucket::FixedExpense, 1),
        cat(4, "Insurance", Bucket::FixedExpense, 2),
    ]
}

fn facts() -> Vec<ValueFact> {
    let mut f = Vec::new();
    for m in 1..=12 {
        f.push(fact(1, m, dec!(3000)));
        f.push(fact(2, m, dec!(1000)));
    }
    f.push(fact(3, 1, dec!(400)));
    f.push(fact(3, 2, dec!(350)));
    f.push(fact(4, 1, dec!(1200)));
    f
}

// ── category_rows ─────────────────────────────────────────────

#[test]
fn test_rows_grouped_income_fixed_variable() {
    let rows = category_rows(&categories(), &facts());
    let names: Vec<&str> = rows.iter().map(|r| r.category.name.as_str()).collect();
    assert_eq!(names, vec!["Salary", "Rent", "Insurance", "Groceries"]);
}

#[test]
fn test_row_totals() {
    let rows = category_rows(&categories(), &facts());
    let rent = rows.iter().find(|r| r.category.id == 2).unwrap();
    assert_eq!(rent.total, dec!(12000));
    let groceries = rows.iter().find(|r| r.category.id == 3).unwrap();
    assert_eq!(groceries.amount(Month::new(2).unwrap()), dec!(350));
    assert_eq!(groceries.amount(Month::new(3).unwrap()), Decimal::ZERO);
    assert_eq!(groceries.total, dec!(750));
}

#[test]
fn test_rows_ignore_unknown_categories() {
    let mut f = facts();
    f.push(fact(42, 1, dec!(999)));
    let rows = category_rows(&categories(), &f);
    assert_eq!(rows.len(), 4);
    assert!(rows.iter().all(|r| r.category.id != 42));
}

#[test]
fn test_category_without_facts_has_zero_row() {
    let rows = category_rows(&categories(), &[]);
    assert!(rows.iter().all(|r| r.total.is_zero()));
}

// ── quick_stats ───────────────────────────────────────────────

#[test]
fn test_quick_stats() {
    let cats = categories();
    let f = facts();
    let summary = compute_summary(&cats, &f);
    let stats = quick_stats(&summary, &category_rows(&cats, &f));

    // income 36000, expenses 12000 + 750 + 1200 = 13950, balance 22050
    assert_eq!(summary.yearly.balance, dec!(22050));
    assert_eq!(stats.savings_rate, Some(dec!(61.3)));
    assert_eq!(stats.avg_monthly_surplus, dec!(1837.50));
    assert_eq!(stats.top_expense, Some(("Rent".to_string(), dec!(12000))));
}

#[test]
fn test_quick_stats_without_income() {
    let cats = categories();
    let f = vec![fact(3, 1, dec!(120))];
    let summary = compute_summary(&cats, &f);
    let stats = quick_stats(&summary, &category_rows(&cats, &f));
    assert_eq!(stats.savings_rate, None);
    assert_eq!(stats.avg_monthly_surplus, dec!(-10));
    assert_eq!(stats.top_expense, Some(("Groceries".to_string(), dec!(120))));
}

#[test]
fn test_quick_stats_empty() {
    let cats = categories();
    let summary = compute_summary(&cats, &[]);
    let stats = quick_stats(&summary, &category_rows(&cats, &[]));
    assert_eq!(stats.top_expense, None);
    assert_eq!(stats.avg_monthly_surplus, Decimal::ZERO);
}

// ── expense_distribution ──────────────────────────────────────

#[test]
fn test_distribution_full_year() {
    let rows = category_rows(&categories(), &facts());
    let dist = expense_distribution(&rows, Period::Year);
    let names: Vec<&str> = dist.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["Rent", "Insurance", "Groceries"]);
    // 12000 / 13950
    assert_eq!(dist[0].percent, dec!(86.0));
    let total_pct: Decimal = dist.iter().map(|s| s.percent).sum();
    assert!((total_pct - dec!(100)).abs() <= dec!(0.2));
}

#[test]
fn test_distribution_single_month_skips_zero() {
    let rows = category_rows(&categories(), &facts());
    let dist = expense_distribution(&rows, Period::Month(Month::new(2).unwrap()));
    assert_eq!(dist.len(), 2);
    assert_eq!(dist[0].name, "Rent");
    assert_eq!(dist[1].name, "Groceries");
    assert_eq!(dist[1].amount, dec!(350));
    assert_eq!(dist[1].percent, dec!(25.9));
}

#[test]
fn test_distribution_never_includes_income() {
    let rows = category_rows(&categories(), &facts());
    let dist = expense_distribution(&rows, Period::Year);
    assert!(dist.iter().all(|s| s.category_id != 1));
}

#[test]
fn test_distribution_empty() {
    let rows = category_rows(&categories(), &[]);
    assert!(expense_distribution(&rows, Period::Year).is_empty());
}
