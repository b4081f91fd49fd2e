use rust_decimal::{Decimal, RoundingStrategy};
use std::collections::{BTreeMap, HashMap};
use std::str::FromStr;

use super::space::PlanScope;
use crate::error::EditError;
use crate::models::{Category, FactKey, Month, ValueFact, ValueSpace};

/// Largest magnitude a single cell may hold (one trillion). Twelve months
/// across any realistic catalog stay far below `Decimal::MAX` when summed.
pub(crate) const MAX_AMOUNT: Decimal = Decimal::from_parts(3_567_587_328, 232, 0, false, 0);

/// Identifies one editable cell. The space is part of the key so edits
/// from different spaces can never be confused with each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct EditKey {
    pub(crate) space: ValueSpace,
    pub(crate) category_id: i64,
    pub(crate) month: Month,
}

/// An edit that has not been durably committed yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PendingEdit {
    pub(crate) category_id: i64,
    pub(crate) year: i32,
    pub(crate) month: Month,
    pub(crate) amount: Decimal,
    pub(crate) space: ValueSpace,
    /// Buffer-wide write counter at the time of the edit.
    seq: u64,
}

impl PendingEdit {
    pub(crate) fn key(&self) -> EditKey {
        EditKey {
            space: self.space,
            category_id: self.category_id,
            month: self.month,
        }
    }

    pub(crate) fn to_fact(&self) -> ValueFact {
        ValueFact::new(self.space, self.category_id, self.year, self.month, self.amount)
    }
}

/// The exact set of edits sent in one flush.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct FlushSnapshot {
    pub(crate) scope: PlanScope,
    sent: Vec<(EditKey, u64)>,
    pub(crate) batch: Vec<ValueFact>,
}

impl FlushSnapshot {
    pub(crate) fn len(&self) -> usize {
        self.sent.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.sent.is_empty()
    }

    pub(crate) fn keys(&self) -> impl Iterator<Item = &EditKey> {
        self.sent.iter().map(|(key, _)| key)
    }

    /// First natural key that appears twice in the batch, if any.
    pub(crate) fn duplicate_key(&self) -> Option<FactKey> {
        let mut seen = std::collections::HashSet::new();
        self.batch.iter().map(ValueFact::key).find(|k| !seen.insert(*k))
    }
}

/// Uncommitted edits for one year in one value space, at most one per cell.
#[derive(Debug, Clone)]
pub(crate) struct EditBuffer {
    scope: PlanScope,
    entries: BTreeMap<EditKey, PendingEdit>,
    next_seq: u64,
    revision: u64,
}

impl EditBuffer {
    pub(crate) fn new(scope: PlanScope) -> Self {
        Self {
            scope,
            entries: BTreeMap::new(),
            next_seq: 0,
            revision: 0,
        }
    }

    pub(crate) fn scope(&self) -> PlanScope {
        self.scope
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Bumped once per buffer operation; an auto-fill counts as one.
    pub(crate) fn revision(&self) -> u64 {
        self.revision
    }

    pub(crate) fn peek(&self) -> impl Iterator<Item = &PendingEdit> {
        self.entries.values()
    }

    #[cfg(test)]
    pub(crate) fn get(&self, category_id: i64, month: Month) -> Option<&PendingEdit> {
        self.entries.get(&EditKey {
            space: self.scope.space,
            category_id,
            month,
        })
    }

    /// Record one cell edit. A later edit to the same cell replaces it.
    pub(crate) fn set_value(
        &mut self,
        categories: &[Category],
        category_id: i64,
        month: u32,
        amount: Decimal,
    ) -> Result<(), EditError> {
        let month = Month::new(month).ok_or(EditError::MonthOutOfRange(month))?;
        ensure_category(categories, category_id)?;
        ensure_in_range(amount)?;

        self.revision += 1;
        self.upsert(category_id, month, amount);
        Ok(())
    }

    /// Set all twelve months of a category to one amount in a single step.
    pub(crate) fn auto_fill(
        &mut self,
        categories: &[Category],
        category_id: i64,
        amount: Decimal,
    ) -> Result<(), EditError> {
        ensure_category(categories, category_id)?;
        ensure_in_range(amount)?;

        self.revision += 1;
        for month in Month::all() {
            self.upsert(category_id, month, amount);
        }
        Ok(())
    }

    fn upsert(&mut self, category_id: i64, month: Month, amount: Decimal) {
        let seq = self.next_seq;
        self.next_seq += 1;
        let edit = PendingEdit {
            category_id,
            year: self.scope.year,
            month,
            amount,
            space: self.scope.space,
            seq,
        };
        self.entries.insert(edit.key(), edit);
    }

    /// Capture the current contents for a flush without removing them.
    pub(crate) fn snapshot(&self) -> FlushSnapshot {
        FlushSnapshot {
            scope: self.scope,
            sent: self.entries.iter().map(|(k, e)| (*k, e.seq)).collect(),
            batch: self.entries.values().map(PendingEdit::to_fact).collect(),
        }
    }

    /// Remove the edits a successful flush committed. Keys added after the
    /// snapshot, or overwritten since, stay in the buffer.
    pub(crate) fn clear(&mut self, snapshot: &FlushSnapshot) -> usize {
        let mut cleared = 0;
        for (key, seq) in &snapshot.sent {
            if self.entries.get(key).is_some_and(|e| e.seq == *seq) {
                self.entries.remove(key);
                cleared += 1;
            }
        }
        if cleared > 0 {
            self.revision += 1;
        }
        cleared
    }

    /// Take every pending edit, leaving the buffer empty.
    pub(crate) fn drain(&mut self) -> Vec<PendingEdit> {
        if !self.entries.is_empty() {
            self.revision += 1;
        }
        std::mem::take(&mut self.entries).into_values().collect()
    }

    /// Drop every pending edit. Returns how many were dropped.
    pub(crate) fn discard(&mut self) -> usize {
        self.drain().len()
    }

    pub(crate) fn discard_category(&mut self, category_id: i64) -> usize {
        let before = self.entries.len();
        self.entries.retain(|k, _| k.category_id != category_id);
        let dropped = before - self.entries.len();
        if dropped > 0 {
            self.revision += 1;
        }
        dropped
    }

    /// Canonical facts with pending edits laid on top, for read-your-writes
    /// display before the store confirms anything.
    pub(crate) fn overlay(&self, canonical: &[ValueFact]) -> Vec<ValueFact> {
        let mut merged: Vec<ValueFact> = Vec::with_capacity(canonical.len() + self.entries.len());
        let mut positions: HashMap<FactKey, usize> = HashMap::new();
        for fact in canonical.iter().filter(|f| self.scope.contains(f)) {
            positions.insert(fact.key(), merged.len());
            merged.push(fact.clone());
        }
        for edit in self.entries.values() {
            let fact = edit.to_fact();
            match positions.get(&fact.key()) {
                Some(&i) => merged[i].amount = fact.amount,
                None => merged.push(fact),
            }
        }
        merged
    }
}

fn ensure_category(categories: &[Category], category_id: i64) -> Result<(), EditError> {
    Category::find_by_id(categories, category_id)
        .map(|_| ())
        .ok_or(EditError::UnknownCategory(category_id))
}

fn ensure_in_range(amount: Decimal) -> Result<(), EditError> {
    if amount.abs() > MAX_AMOUNT {
        return Err(EditError::InvalidAmount(amount.to_string()));
    }
    Ok(())
}

/// Parse user input into a currency amount rounded to cents.
///
/// Accepts an optional leading currency sign and `,` thousand separators.
/// Magnitudes above [`MAX_AMOUNT`] are rejected.
pub(crate) fn parse_amount(input: &str) -> Result<Decimal, EditError> {
    let trimmed = input.trim();
    let (negative, rest) = match trimmed.strip_prefix('-') {
        Some(r) => (true, r),
        None => (false, trimmed),
    };
    let cleaned: String = rest
        .trim_start_matches(['$', '€'])
        .chars()
        .filter(|c| *c != ',' && !c.is_whitespace())
        .collect();
    if cleaned.is_empty() || !cleaned.chars().all(|c| c.is_ascii_digit() || c == '.') {
        return Err(EditError::InvalidAmount(input.to_string()));
    }
    let value =
        Decimal::from_str(&cleaned).map_err(|_| EditError::InvalidAmount(input.to_string()))?;
    let value = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    if value > MAX_AMOUNT {
        return Err(EditError::InvalidAmount(input.to_string()));
    }
    Ok(if negative { -value } else { value })
}

#[cfg(test)]
#[path = "buffer_tests.rs"]
mod buffer_tests;
