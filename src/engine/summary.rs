use rust_decimal::Decimal;
use std::collections::HashMap;

use crate::models::{Bucket, Category, Month, ValueFact};

/// One amount per calendar month, index 0 = January.
pub(crate) type MonthlyAmounts = [Decimal; Month::COUNT];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct YearlyTotals {
    pub(crate) income: Decimal,
    pub(crate) fixed_expense: Decimal,
    pub(crate) variable_expense: Decimal,
    pub(crate) total_expense: Decimal,
    pub(crate) balance: Decimal,
}

/// Derived view of one year in one value space. Never stored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Summary {
    pub(crate) income_by_month: MonthlyAmounts,
    pub(crate) fixed_expense_by_month: MonthlyAmounts,
    pub(crate) variable_expense_by_month: MonthlyAmounts,
    pub(crate) monthly_balance: MonthlyAmounts,
    pub(crate) yearly: YearlyTotals,
}

impl Summary {
    pub(crate) fn by_bucket(&self, bucket: Bucket) -> &MonthlyAmounts {
        match bucket {
            Bucket::Income => &self.income_by_month,
            Bucket::FixedExpense => &self.fixed_expense_by_month,
            Bucket::VariableExpense => &self.variable_expense_by_month,
        }
    }

    pub(crate) fn income(&self, month: Month) -> Decimal {
        self.income_by_month[month.index()]
    }

    pub(crate) fn expense(&self, month: Month) -> Decimal {
        self.fixed_expense_by_month[month.index()] + self.variable_expense_by_month[month.index()]
    }

    pub(crate) fn balance(&self, month: Month) -> Decimal {
        self.monthly_balance[month.index()]
    }

    pub(crate) fn yearly_for(&self, bucket: Bucket) -> Decimal {
        match bucket {
            Bucket::Income => self.yearly.income,
            Bucket::FixedExpense => self.yearly.fixed_expense,
            Bucket::VariableExpense => self.yearly.variable_expense,
        }
    }
}

/// Roll raw facts up into monthly and yearly totals.
///
/// Classification uses each category's attributes as passed in, so
/// reclassifying a category changes how past months are reported. Facts whose
/// category is missing are skipped. The result does not depend on fact order.
pub(crate) fn compute_summary(categories: &[Category], facts: &[ValueFact]) -> Summary {
    let buckets: HashMap<i64, Bucket> = categories.iter().map(|c| (c.id, c.bucket())).collect();

    let mut summary = Summary::default();
    let mut skipped = 0usize;

    for fact in facts {
        let Some(bucket) = buckets.get(&fact.category_id) else {
            skipped += 1;
            continue;
        };
        let slot = match bucket {
            Bucket::Income => &mut summary.income_by_month,
            Bucket::FixedExpense => &mut summary.fixed_expense_by_month,
            Bucket::VariableExpense => &mut summary.variable_expense_by_month,
        };
        slot[fact.month.index()] += fact.amount;
    }

    if skipped > 0 {
        tracing::debug!(skipped, "facts without a known category left out of summary");
    }

    for i in 0..Month::COUNT {
        summary.monthly_balance[i] = summary.income_by_month[i]
            - summary.fixed_expense_by_month[i]
            - summary.variable_expense_by_month[i];
    }

    let income = sum(&summary.income_by_month);
    let fixed_expense = sum(&summary.fixed_expense_by_month);
    let variable_expense = sum(&summary.variable_expense_by_month);
    let total_expense = fixed_expense + variable_expense;
    summary.yearly = YearlyTotals {
        income,
        fixed_expense,
        variable_expense,
        total_expense,
        balance: income - total_expense,
    };

    summary
}

pub(crate) fn sum(amounts: &MonthlyAmounts) -> Decimal {
    amounts.iter().copied().sum()
}

#[cfg(test)]
#[path = "summary_tests.rs"]
mod summary_tests;
