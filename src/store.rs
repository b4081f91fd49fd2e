//! Collaborator interfaces the planning core talks to. The SQLite
//! implementation lives in `crate::db`.

use crate::error::StoreError;
use crate::models::{Category, CategoryFields, Scenario, ValueFact, ValueSpace};

pub(crate) type StoreResult<T> = Result<T, StoreError>;

pub(crate) trait CatalogStore {
    /// Categories in display order: income first, then expenses, each by
    /// `display_order`.
    fn list_categories(&self) -> StoreResult<Vec<Category>>;
    fn create_category(&mut self, fields: &CategoryFields) -> StoreResult<Category>;
    fn update_category(&mut self, id: i64, fields: &CategoryFields) -> StoreResult<Category>;
    fn delete_category(&mut self, id: i64) -> StoreResult<()>;
}

pub(crate) trait ValueStore {
    fn list_facts(&self, year: i32, space: ValueSpace) -> StoreResult<Vec<ValueFact>>;
    /// Insert-or-replace every fact by natural key. All-or-nothing.
    fn upsert_facts(&mut self, batch: &[ValueFact]) -> StoreResult<Vec<ValueFact>>;
}

pub(crate) trait ScenarioStore {
    fn list_scenarios(&self, year: i32) -> StoreResult<Vec<Scenario>>;
    fn create_scenario(&mut self, name: &str, year: i32, copy_from_live: bool)
        -> StoreResult<Scenario>;
    /// Removes the scenario and every fact in it.
    fn delete_scenario(&mut self, id: i64) -> StoreResult<()>;
}

/// Everything a planning session needs from storage.
pub(crate) trait BudgetStore: CatalogStore + ValueStore + ScenarioStore {}

impl<T: CatalogStore + ValueStore + ScenarioStore> BudgetStore for T {}
