//! In-memory store and fixtures shared by the engine tests.

use crate::error::StoreError;
use crate::models::{Bucket, Category, CategoryFields, Scenario, ValueFact, ValueSpace};
use crate::store::{CatalogStore, ScenarioStore, StoreResult, ValueStore};

pub(crate) fn cat(id: i64, name: &str, bucket: Bucket) -> Category {
    Category {
        id,
        name: name.into(),
        kind: bucket.kind(),
        is_fixed: bucket.is_fixed(),
        display_order: 0,
    }
}

pub(crate) fn sample_categories() -> Vec<Category> {
    vec![
        cat(1, "Salary", Bucket::Income),
        cat(2, "Rent", Bucket::FixedExpense),
        cat(3, "Groceries", Bucket::VariableExpense),
    ]
}

/// Store double whose writes can be made to fail a set number of times.
#[derive(Debug, Default)]
pub(crate) struct MemoryStore {
    pub(crate) categories: Vec<Category>,
    pub(crate) scenarios: Vec<Scenario>,
    pub(crate) facts: Vec<ValueFact>,
    /// Upserts left that fail with `Unavailable`.
    pub(crate) fail_writes: usize,
    pub(crate) writes: usize,
    next_id: i64,
}

impl MemoryStore {
    pub(crate) fn with_categories(categories: Vec<Category>) -> Self {
        let next_id = categories.iter().map(|c| c.id).max().unwrap_or(0) + 1;
        Self {
            categories,
            next_id,
            ..Self::default()
        }
    }

    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

impl CatalogStore for MemoryStore {
    fn list_categories(&self) -> StoreResult<Vec<Category>> {
        let mut cats = self.categories.clone();
        cats.sort_by(|a, b| {
            (a.bucket() != Bucket::Income, a.display_order, &a.name).cmp(&(
                b.bucket() != Bucket::Income,
                b.display_order,
                &b.name,
            ))
        });
        Ok(cats)
    }

    fn create_category(&mut self, fields: &CategoryFields) -> StoreResult<Category> {
        let cat = Category {
            id: self.next_id(),
            name: fields.name.clone(),
            kind: fields.kind,
            is_fixed: fields.is_fixed,
            display_order: fields.display_order,
        };
        self.categories.push(cat.clone());
        Ok(cat)
    }

    fn update_category(&mut self, id: i64, fields: &CategoryFields) -> StoreResult<Category> {
        let cat = self
            .categories
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| StoreError::NotFound(format!("category {id}")))?;
        cat.name = fields.name.clone();
        cat.kind = fields.kind;
        cat.is_fixed = fields.is_fixed;
        cat.display_order = fields.display_order;
        Ok(cat.clone())
    }

    fn delete_category(&mut self, id: i64) -> StoreResult<()> {
        self.categories.retain(|c| c.id != id);
        self.facts.retain(|f| f.category_id != id);
        Ok(())
    }
}

impl ValueStore for MemoryStore {
    fn list_facts(&self, year: i32, space: ValueSpace) -> StoreResult<Vec<ValueFact>> {
        Ok(self
            .facts
            .iter()
            .filter(|f| f.year == year && f.space == space)
            .cloned()
            .collect())
    }

    fn upsert_facts(&mut self, batch: &[ValueFact]) -> StoreResult<Vec<ValueFact>> {
        if self.fail_writes > 0 {
            self.fail_writes -= 1;
            return Err(StoreError::Unavailable("offline".into()));
        }
        self.writes += 1;
        for fact in batch {
            match self.facts.iter_mut().find(|f| f.key() == fact.key()) {
                Some(existing) => existing.amount = fact.amount,
                None => self.facts.push(fact.clone()),
            }
        }
        Ok(batch.to_vec())
    }
}

impl ScenarioStore for MemoryStore {
    fn list_scenarios(&self, year: i32) -> StoreResult<Vec<Scenario>> {
        Ok(self.scenarios.iter().filter(|s| s.year == year).cloned().collect())
    }

    fn create_scenario(
        &mut self,
        name: &str,
        year: i32,
        copy_from_live: bool,
    ) -> StoreResult<Scenario> {
        let scenario = Scenario {
            id: self.next_id(),
            name: name.into(),
            year,
            created_at: Scenario::timestamp_now(),
        };
        if copy_from_live {
            let copies: Vec<ValueFact> = self
                .facts
                .iter()
                .filter(|f| f.year == year && f.space.is_live())
                .map(|f| ValueFact {
                    space: scenario.space(),
                    ..f.clone()
                })
                .collect();
            self.facts.extend(copies);
        }
        self.scenarios.push(scenario.clone());
        Ok(scenario)
    }

    fn delete_scenario(&mut self, id: i64) -> StoreResult<()> {
        self.scenarios.retain(|s| s.id != id);
        self.facts.retain(|f| f.space != ValueSpace::Scenario(id));
        Ok(())
    }
}
