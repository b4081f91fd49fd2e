use rust_decimal::Decimal;

use super::analysis::{
    category_rows, expense_distribution, quick_stats, CategoryRow, ExpenseShare, Period,
    QuickStats,
};
use super::buffer::{parse_amount, EditBuffer};
use super::scheduler::{Clock, FlushReport, SyncScheduler, SyncSettings, SyncStatus};
use super::space::{space_label, PlanScope};
use super::summary::{compute_summary, Summary};
use crate::error::{FlushError, SessionError};
use crate::models::{Category, CategoryFields, Scenario, ValueFact, ValueSpace};
use crate::store::BudgetStore;

/// What to do with pending edits when the scope changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LeavePolicy {
    /// Fail with `UnsavedEdits` so the caller can ask the user.
    Refuse,
    Save,
    Discard,
}

/// One user's view of one year in one value space: the canonical facts as
/// last read, the uncommitted edits on top, and the scheduler that writes
/// them back.
pub(crate) struct PlanningSession<S: BudgetStore, C: Clock> {
    store: S,
    scope: PlanScope,
    categories: Vec<Category>,
    scenarios: Vec<Scenario>,
    canonical: Vec<ValueFact>,
    buffer: EditBuffer,
    scheduler: SyncScheduler<C>,
    summary: Summary,
    rows: Vec<CategoryRow>,
}

impl<S: BudgetStore, C: Clock> PlanningSession<S, C> {
    pub(crate) fn open(
        store: S,
        clock: C,
        settings: SyncSettings,
        scope: PlanScope,
    ) -> Result<Self, SessionError> {
        let mut session = Self {
            store,
            scope,
            categories: Vec::new(),
            scenarios: Vec::new(),
            canonical: Vec::new(),
            buffer: EditBuffer::new(scope),
            scheduler: SyncScheduler::new(clock, settings),
            summary: Summary::default(),
            rows: Vec::new(),
        };
        session.reload()?;
        tracing::info!(scope = %scope, "planning session opened");
        Ok(session)
    }

    // ── Accessors ─────────────────────────────────────────────

    pub(crate) fn scope(&self) -> PlanScope {
        self.scope
    }

    pub(crate) fn year(&self) -> i32 {
        self.scope.year
    }

    pub(crate) fn space(&self) -> ValueSpace {
        self.scope.space
    }

    pub(crate) fn space_label(&self) -> String {
        space_label(&self.scenarios, self.scope.space)
    }

    pub(crate) fn categories(&self) -> &[Category] {
        &self.categories
    }

    /// Scenarios of the current year.
    pub(crate) fn scenarios(&self) -> &[Scenario] {
        &self.scenarios
    }

    pub(crate) fn summary(&self) -> &Summary {
        &self.summary
    }

    pub(crate) fn rows(&self) -> &[CategoryRow] {
        &self.rows
    }

    pub(crate) fn quick_stats(&self) -> QuickStats {
        quick_stats(&self.summary, &self.rows)
    }

    pub(crate) fn distribution(&self, period: Period) -> Vec<ExpenseShare> {
        expense_distribution(&self.rows, period)
    }

    pub(crate) fn buffer(&self) -> &EditBuffer {
        &self.buffer
    }

    pub(crate) fn pending_count(&self) -> usize {
        self.buffer.len()
    }

    pub(crate) fn sync_status(&self) -> SyncStatus {
        self.scheduler.status()
    }

    pub(crate) fn time_until_due(&self) -> Option<std::time::Duration> {
        self.scheduler.time_until_due()
    }

    pub(crate) fn on_state_change(&mut self, listener: impl FnMut(&SyncStatus) + 'static) {
        self.scheduler.on_state_change(listener);
    }

    pub(crate) fn dismiss_error(&mut self) {
        self.scheduler.dismiss_error();
    }

    #[cfg(test)]
    pub(crate) fn store(&self) -> &S {
        &self.store
    }

    #[cfg(test)]
    pub(crate) fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    // ── Loading ───────────────────────────────────────────────

    fn reload(&mut self) -> Result<(), SessionError> {
        self.categories = self.store.list_categories()?;
        self.scenarios = self.store.list_scenarios(self.scope.year)?;
        self.reload_facts()
    }

    fn reload_facts(&mut self) -> Result<(), SessionError> {
        self.canonical = self.store.list_facts(self.scope.year, self.scope.space)?;
        self.recompute();
        Ok(())
    }

    /// Overlay pending edits on canonical facts and rebuild every derived view.
    fn recompute(&mut self) {
        let view = self.buffer.overlay(&self.canonical);
        self.summary = compute_summary(&self.categories, &view);
        self.rows = category_rows(&self.categories, &view);
    }

    // ── Editing ───────────────────────────────────────────────

    pub(crate) fn set_value(
        &mut self,
        category_id: i64,
        month: u32,
        amount: Decimal,
    ) -> Result<(), SessionError> {
        self.buffer
            .set_value(&self.categories, category_id, month, amount)?;
        self.after_edit();
        Ok(())
    }

    /// Parse raw input, then `set_value`.
    pub(crate) fn set_value_text(
        &mut self,
        category_id: i64,
        month: u32,
        input: &str,
    ) -> Result<(), SessionError> {
        let amount = parse_amount(input)?;
        self.set_value(category_id, month, amount)
    }

    pub(crate) fn auto_fill(&mut self, category_id: i64, amount: Decimal) -> Result<(), SessionError> {
        self.buffer.auto_fill(&self.categories, category_id, amount)?;
        self.after_edit();
        Ok(())
    }

    fn after_edit(&mut self) {
        self.recompute();
        self.scheduler.notify_edit(self.buffer.len());
    }

    // ── Sync ──────────────────────────────────────────────────

    /// Drive the settle timer. Call regularly from the event loop.
    pub(crate) fn tick(&mut self) -> Option<Result<FlushReport, SessionError>> {
        let outcome = self.scheduler.tick(&mut self.buffer, &mut self.store)?;
        Some(self.finish_flush(outcome))
    }

    /// Write all pending edits now. `Ok(None)` when there was nothing to write.
    pub(crate) fn save(&mut self) -> Result<Option<FlushReport>, SessionError> {
        match self.scheduler.flush_now(&mut self.buffer, &mut self.store) {
            Some(outcome) => self.finish_flush(outcome).map(Some),
            None => Ok(None),
        }
    }

    fn finish_flush(
        &mut self,
        outcome: Result<FlushReport, FlushError>,
    ) -> Result<FlushReport, SessionError> {
        let report = outcome?;
        self.reload_facts()?;
        Ok(report)
    }

    /// Drop every pending edit. Returns how many were dropped.
    pub(crate) fn discard(&mut self) -> usize {
        let dropped = self.buffer.discard();
        if dropped > 0 {
            tracing::info!(dropped, scope = %self.scope, "pending edits discarded");
        }
        self.scheduler.reset();
        self.recompute();
        dropped
    }

    // ── Navigation ────────────────────────────────────────────

    pub(crate) fn switch_space(
        &mut self,
        space: ValueSpace,
        policy: LeavePolicy,
    ) -> Result<(), SessionError> {
        if space == self.scope.space {
            return Ok(());
        }
        self.enter(
            PlanScope {
                year: self.scope.year,
                space,
            },
            policy,
        )
    }

    /// Move to another year. Scenarios belong to one year, so this returns
    /// to live data.
    pub(crate) fn change_year(&mut self, year: i32, policy: LeavePolicy) -> Result<(), SessionError> {
        if year == self.scope.year {
            return Ok(());
        }
        self.enter(PlanScope::live(year), policy)
    }

    fn enter(&mut self, scope: PlanScope, policy: LeavePolicy) -> Result<(), SessionError> {
        self.leave(policy)?;
        tracing::info!(from = %self.scope, to = %scope, "switching scope");
        self.scope = scope;
        self.buffer = EditBuffer::new(scope);
        self.scheduler.reset();
        self.reload()
    }

    /// Settle pending edits before the scope changes. Never lets edits cross
    /// into another space.
    fn leave(&mut self, policy: LeavePolicy) -> Result<(), SessionError> {
        if self.buffer.is_empty() {
            return Ok(());
        }
        match policy {
            LeavePolicy::Refuse => Err(SessionError::UnsavedEdits {
                count: self.buffer.len(),
            }),
            LeavePolicy::Save => {
                self.save()?;
                if self.buffer.is_empty() {
                    Ok(())
                } else {
                    Err(SessionError::UnsavedEdits {
                        count: self.buffer.len(),
                    })
                }
            }
            LeavePolicy::Discard => {
                self.discard();
                Ok(())
            }
        }
    }

    // ── Catalog ───────────────────────────────────────────────

    pub(crate) fn create_category(&mut self, fields: &CategoryFields) -> Result<Category, SessionError> {
        let category = self.store.create_category(fields)?;
        tracing::info!(id = category.id, name = %category.name, "category created");
        self.refresh_categories()?;
        Ok(category)
    }

    /// Rename or reclassify. Classification is read at aggregation time, so
    /// past months follow the new bucket.
    pub(crate) fn update_category(
        &mut self,
        id: i64,
        fields: &CategoryFields,
    ) -> Result<Category, SessionError> {
        let category = self.store.update_category(id, fields)?;
        tracing::info!(id, name = %category.name, bucket = category.bucket().label(), "category updated");
        self.refresh_categories()?;
        Ok(category)
    }

    /// Delete a category with its facts. Pending edits for it are dropped.
    pub(crate) fn delete_category(&mut self, id: i64) -> Result<usize, SessionError> {
        self.store.delete_category(id)?;
        let dropped = self.buffer.discard_category(id);
        if dropped > 0 {
            tracing::warn!(id, dropped, "pending edits for deleted category dropped");
            self.scheduler.notify_edit(self.buffer.len());
        }
        self.categories = self.store.list_categories()?;
        self.reload_facts()?;
        Ok(dropped)
    }

    fn refresh_categories(&mut self) -> Result<(), SessionError> {
        self.categories = self.store.list_categories()?;
        self.recompute();
        Ok(())
    }

    // ── Scenarios ─────────────────────────────────────────────

    pub(crate) fn create_scenario(
        &mut self,
        name: &str,
        copy_from_live: bool,
    ) -> Result<Scenario, SessionError> {
        let scenario = self
            .store
            .create_scenario(name, self.scope.year, copy_from_live)?;
        tracing::info!(id = scenario.id, name, copy_from_live, "scenario created");
        self.scenarios = self.store.list_scenarios(self.scope.year)?;
        Ok(scenario)
    }

    /// Delete a scenario and its facts. When it is the active space, its
    /// pending edits are discarded and the session returns to live data.
    pub(crate) fn delete_scenario(&mut self, id: i64) -> Result<(), SessionError> {
        if self.scope.space == ValueSpace::Scenario(id) {
            self.enter(PlanScope::live(self.scope.year), LeavePolicy::Discard)?;
        }
        self.store.delete_scenario(id)?;
        tracing::info!(id, "scenario deleted");
        self.scenarios = self.store.list_scenarios(self.scope.year)?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod session_tests;
