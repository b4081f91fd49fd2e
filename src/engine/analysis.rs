use rust_decimal::{Decimal, RoundingStrategy};
use std::collections::HashMap;

use super::summary::{sum, MonthlyAmounts, Summary};
use crate::models::{Bucket, Category, Month, ValueFact};

/// A category with its twelve monthly amounts, as shown in the planning grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CategoryRow {
    pub(crate) category: Category,
    pub(crate) months: MonthlyAmounts,
    pub(crate) total: Decimal,
}

impl CategoryRow {
    pub(crate) fn amount(&self, month: Month) -> Decimal {
        self.months[month.index()]
    }
}

/// Build one row per category, grouped income, fixed, variable. Within a
/// group the incoming category order is kept.
pub(crate) fn category_rows(categories: &[Category], facts: &[ValueFact]) -> Vec<CategoryRow> {
    let mut by_category: HashMap<i64, MonthlyAmounts> = HashMap::new();
    for fact in facts {
        by_category.entry(fact.category_id).or_default()[fact.month.index()] += fact.amount;
    }

    let mut rows: Vec<CategoryRow> = categories
        .iter()
        .map(|cat| {
            let months = by_category.get(&cat.id).copied().unwrap_or_default();
            CategoryRow {
                category: cat.clone(),
                months,
                total: sum(&months),
            }
        })
        .collect();
    rows.sort_by_key(|r| r.category.bucket());
    rows
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct QuickStats {
    /// Percent of income left over, one decimal. `None` without income.
    pub(crate) savings_rate: Option<Decimal>,
    pub(crate) avg_monthly_surplus: Decimal,
    /// Expense category with the largest yearly total.
    pub(crate) top_expense: Option<(String, Decimal)>,
}

pub(crate) fn quick_stats(summary: &Summary, rows: &[CategoryRow]) -> QuickStats {
    let income = summary.yearly.income;
    let balance = summary.yearly.balance;

    let savings_rate = (income > Decimal::ZERO)
        .then(|| round(balance / income * Decimal::ONE_HUNDRED, 1));
    let avg_monthly_surplus = round(balance / Decimal::from(Month::COUNT as u32), 2);

    let mut top: Option<&CategoryRow> = None;
    for row in rows.iter().filter(|r| r.category.bucket() != Bucket::Income) {
        if row.total > top.map_or(Decimal::ZERO, |t| t.total) {
            top = Some(row);
        }
    }

    QuickStats {
        savings_rate,
        avg_monthly_surplus,
        top_expense: top.map(|r| (r.category.name.clone(), r.total)),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Period {
    Year,
    Month(Month),
}

impl std::fmt::Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Year => write!(f, "Full year"),
            Self::Month(m) => write!(f, "{m}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ExpenseShare {
    pub(crate) category_id: i64,
    pub(crate) name: String,
    pub(crate) amount: Decimal,
    /// Share of the period's total expense, one decimal.
    pub(crate) percent: Decimal,
}

/// Expense categories with a positive amount in `period`, largest first.
pub(crate) fn expense_distribution(rows: &[CategoryRow], period: Period) -> Vec<ExpenseShare> {
    let mut shares: Vec<ExpenseShare> = rows
        .iter()
        .filter(|r| r.category.bucket() != Bucket::Income)
        .map(|r| {
            let amount = match period {
                Period::Year => r.total,
                Period::Month(m) => r.amount(m),
            };
            ExpenseShare {
                category_id: r.category.id,
                name: r.category.name.clone(),
                amount,
                percent: Decimal::ZERO,
            }
        })
        .filter(|s| s.amount > Decimal::ZERO)
        .collect();

    let total: Decimal = shares.iter().map(|s| s.amount).sum();
    if total > Decimal::ZERO {
        for share in &mut shares {
            share.percent = round(share.amount / total * Decimal::ONE_HUNDRED, 1);
        }
    }

    shares.sort_by(|a, b| b.amount.cmp(&a.amount).then_with(|| a.name.cmp(&b.name)));
    shares
}

/// Half-up rounding, the way amounts and percentages are displayed.
fn round(value: Decimal, dp: u32) -> Decimal {
    value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero)
}

#[cfg(test)]
#[path = "analysis_tests.rs"]
mod analysis_tests;
