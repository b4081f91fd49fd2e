mod schema;

use anyhow::{Context, Result};
use rusqlite::{params, Connection, Row};
use rust_decimal::Decimal;
use std::collections::HashSet;
use std::path::Path;
use std::str::FromStr;

use crate::engine::space::{collection, LIVE_TABLE, SCENARIO_TABLE};
use crate::error::StoreError;
use crate::models::*;
use crate::store::{CatalogStore, ScenarioStore, StoreResult, ValueStore};

pub(crate) struct Database {
    conn: Connection,
}

impl Database {
    pub(crate) fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database: {}", path.display()))?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")
            .context("Failed to set database pragmas")?;
        let mut db = Self { conn };
        db.migrate().context("Database migration failed")?;
        db.seed_default_categories()?;
        Ok(db)
    }

    #[cfg(test)]
    pub(crate) fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        let mut db = Self { conn };
        db.migrate()?;
        db.seed_default_categories()?;
        Ok(db)
    }

    fn migrate(&mut self) -> Result<()> {
        let has_version_table: bool = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version')",
            [],
            |row| row.get(0),
        )?;

        if !has_version_table {
            self.conn.execute_batch(schema::SCHEMA_V1)?;
            self.conn.execute(
                "INSERT INTO schema_version (version) VALUES (?1)",
                params![schema::CURRENT_VERSION],
            )?;
            tracing::info!(version = schema::CURRENT_VERSION, "database schema created");
            return Ok(());
        }

        let current: i32 = self
            .conn
            .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
                row.get(0)
            })
            .unwrap_or(0);

        for &(from_version, sql) in schema::MIGRATIONS {
            if current <= from_version {
                self.conn.execute_batch(sql)?;
            }
        }

        if current < schema::CURRENT_VERSION {
            self.conn.execute(
                "UPDATE schema_version SET version = ?1",
                params![schema::CURRENT_VERSION],
            )?;
            tracing::info!(from = current, to = schema::CURRENT_VERSION, "database migrated");
        }

        Ok(())
    }

    fn seed_default_categories(&mut self) -> Result<()> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM categories", [], |row| row.get(0))?;
        if count > 0 {
            return Ok(());
        }

        let defaults = [
            ("Salary", Bucket::Income),
            ("Side Income", Bucket::Income),
            ("Rent", Bucket::FixedExpense),
            ("Utilities", Bucket::FixedExpense),
            ("Insurance", Bucket::FixedExpense),
            ("Internet & Phone", Bucket::FixedExpense),
            ("Subscriptions", Bucket::FixedExpense),
            ("Groceries", Bucket::VariableExpense),
            ("Transportation", Bucket::VariableExpense),
            ("Dining Out", Bucket::VariableExpense),
            ("Entertainment", Bucket::VariableExpense),
            ("Personal Care", Bucket::VariableExpense),
            ("Gifts", Bucket::VariableExpense),
        ];

        let tx = self.conn.transaction()?;
        for (order, (name, bucket)) in defaults.iter().enumerate() {
            tx.execute(
                "INSERT OR IGNORE INTO categories (name, kind, is_fixed, display_order)
                 VALUES (?1, ?2, ?3, ?4)",
                params![name, bucket.kind().as_str(), bucket.is_fixed(), order as i32],
            )?;
        }
        tx.commit()?;
        tracing::info!(count = defaults.len(), "default categories seeded");
        Ok(())
    }

    fn category_by_id(&self, id: i64) -> StoreResult<Category> {
        let result = self.conn.query_row(
            "SELECT id, name, kind, is_fixed, display_order FROM categories WHERE id = ?1",
            params![id],
            category_from_row,
        );
        match result {
            Ok(c) => Ok(c),
            Err(rusqlite::Error::QueryReturnedNoRows) => {
                Err(StoreError::NotFound(format!("category {id}")))
            }
            Err(e) => Err(e.into()),
        }
    }
}

fn category_from_row(row: &Row<'_>) -> rusqlite::Result<Category> {
    let kind: String = row.get(2)?;
    Ok(Category {
        id: row.get(0)?,
        name: row.get(1)?,
        kind: CategoryKind::parse(&kind).unwrap_or(CategoryKind::Expense),
        is_fixed: row.get(3)?,
        display_order: row.get(4)?,
    })
}

/// Expects `category_id, year, month, amount`.
fn fact_from_row(row: &Row<'_>, space: ValueSpace) -> rusqlite::Result<ValueFact> {
    let month: u32 = row.get(2)?;
    let month =
        Month::new(month).ok_or(rusqlite::Error::IntegralValueOutOfRange(2, i64::from(month)))?;
    let amt_str: String = row.get(3)?;
    Ok(ValueFact::new(
        space,
        row.get(0)?,
        row.get(1)?,
        month,
        Decimal::from_str(&amt_str).unwrap_or_default(),
    ))
}

fn scenario_from_row(row: &Row<'_>) -> rusqlite::Result<Scenario> {
    Ok(Scenario {
        id: row.get(0)?,
        name: row.get(1)?,
        year: row.get(2)?,
        created_at: row.get(3)?,
    })
}

// ── Categories ────────────────────────────────────────────────

impl CatalogStore for Database {
    fn list_categories(&self) -> StoreResult<Vec<Category>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, kind, is_fixed, display_order FROM categories
             ORDER BY CASE kind WHEN 'income' THEN 0 ELSE 1 END, display_order, name",
        )?;
        let rows = stmt.query_map([], category_from_row)?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    fn create_category(&mut self, fields: &CategoryFields) -> StoreResult<Category> {
        self.conn.execute(
            "INSERT INTO categories (name, kind, is_fixed, display_order) VALUES (?1, ?2, ?3, ?4)",
            params![
                fields.name,
                fields.kind.as_str(),
                fields.is_fixed,
                fields.display_order
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        tracing::debug!(id, name = %fields.name, "category inserted");
        self.category_by_id(id)
    }

    fn update_category(&mut self, id: i64, fields: &CategoryFields) -> StoreResult<Category> {
        let changed = self.conn.execute(
            "UPDATE categories SET name = ?1, kind = ?2, is_fixed = ?3, display_order = ?4
             WHERE id = ?5",
            params![
                fields.name,
                fields.kind.as_str(),
                fields.is_fixed,
                fields.display_order,
                id
            ],
        )?;
        if changed == 0 {
            return Err(StoreError::NotFound(format!("category {id}")));
        }
        self.category_by_id(id)
    }

    fn delete_category(&mut self, id: i64) -> StoreResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM categories WHERE id = ?1", params![id])?;
        if changed == 0 {
            return Err(StoreError::NotFound(format!("category {id}")));
        }
        Ok(())
    }
}

// ── Values ────────────────────────────────────────────────────

impl ValueStore for Database {
    fn list_facts(&self, year: i32, space: ValueSpace) -> StoreResult<Vec<ValueFact>> {
        let target = collection(space);
        let facts = match target.scenario_id {
            None => {
                let mut stmt = self.conn.prepare(&format!(
                    "SELECT category_id, year, month, amount FROM {}
                     WHERE year = ?1 ORDER BY category_id, month",
                    target.table
                ))?;
                let rows = stmt.query_map(params![year], |row| fact_from_row(row, space))?;
                rows.collect::<std::result::Result<Vec<_>, _>>()?
            }
            Some(scenario_id) => {
                let mut stmt = self.conn.prepare(&format!(
                    "SELECT category_id, year, month, amount FROM {}
                     WHERE scenario_id = ?1 AND year = ?2 ORDER BY category_id, month",
                    target.table
                ))?;
                let rows = stmt
                    .query_map(params![scenario_id, year], |row| fact_from_row(row, space))?;
                rows.collect::<std::result::Result<Vec<_>, _>>()?
            }
        };
        Ok(facts)
    }

    fn upsert_facts(&mut self, batch: &[ValueFact]) -> StoreResult<Vec<ValueFact>> {
        let mut seen = HashSet::new();
        if let Some(dup) = batch.iter().map(ValueFact::key).find(|k| !seen.insert(*k)) {
            return Err(StoreError::DuplicateKey(dup));
        }

        let tx = self.conn.transaction()?;
        for fact in batch {
            let amount = fact.amount.to_string();
            match fact.space {
                ValueSpace::Live => tx.execute(
                    &format!(
                        "INSERT INTO {LIVE_TABLE} (category_id, year, month, amount)
                         VALUES (?1, ?2, ?3, ?4)
                         ON CONFLICT(category_id, year, month) DO UPDATE SET amount = ?4"
                    ),
                    params![fact.category_id, fact.year, fact.month.number(), amount],
                )?,
                ValueSpace::Scenario(scenario_id) => tx.execute(
                    &format!(
                        "INSERT INTO {SCENARIO_TABLE} (scenario_id, category_id, year, month, amount)
                         VALUES (?1, ?2, ?3, ?4, ?5)
                         ON CONFLICT(scenario_id, category_id, year, month) DO UPDATE SET amount = ?5"
                    ),
                    params![
                        scenario_id,
                        fact.category_id,
                        fact.year,
                        fact.month.number(),
                        amount
                    ],
                )?,
            };
        }
        tx.commit()?;
        tracing::debug!(rows = batch.len(), "facts upserted");
        Ok(batch.to_vec())
    }
}

// ── Scenarios ─────────────────────────────────────────────────

impl ScenarioStore for Database {
    fn list_scenarios(&self, year: i32) -> StoreResult<Vec<Scenario>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, year, created_at FROM scenarios WHERE year = ?1 ORDER BY name",
        )?;
        let rows = stmt.query_map(params![year], scenario_from_row)?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    fn create_scenario(
        &mut self,
        name: &str,
        year: i32,
        copy_from_live: bool,
    ) -> StoreResult<Scenario> {
        let created_at = Scenario::timestamp_now();
        let tx = self.conn.transaction()?;
        tx.execute(
            "INSERT INTO scenarios (name, year, created_at) VALUES (?1, ?2, ?3)",
            params![name, year, created_at],
        )?;
        let id = tx.last_insert_rowid();
        let copied = if copy_from_live {
            tx.execute(
                &format!(
                    "INSERT INTO {SCENARIO_TABLE} (scenario_id, category_id, year, month, amount)
                     SELECT ?1, category_id, year, month, amount FROM {LIVE_TABLE} WHERE year = ?2"
                ),
                params![id, year],
            )?
        } else {
            0
        };
        tx.commit()?;
        tracing::debug!(id, copied, "scenario inserted");

        Ok(Scenario {
            id,
            name: name.to_string(),
            year,
            created_at,
        })
    }

    fn delete_scenario(&mut self, id: i64) -> StoreResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM scenarios WHERE id = ?1", params![id])?;
        if changed == 0 {
            return Err(StoreError::NotFound(format!("scenario {id}")));
        }
        Ok(())
    }
}
