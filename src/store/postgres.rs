// src/store/postgres.rs
//! PostgreSQL record store over `individual_registrations`.
//!
//! The store borrows a client so it can run inside the caller's transaction:
//! the duplicate check and the insert it guards then see the same snapshot.

use async_trait::async_trait;
use log::{debug, info};
use postgres_types::ToSql;
use tokio_postgres::{GenericClient, Row};

use super::{RecordStore, POSTGRES_MAX_PARAMS};
use crate::dedup::condition::Condition;
use crate::error::StoreError;
use crate::models::individual::{Column, Individual};
use crate::utils::chunked::run_batches;

pub const TABLE: &str = "individual_registrations";

/// Bound parameters per inserted row: id, country_id and every dedup column.
pub const INSERT_PARAMS_PER_ROW: usize = Column::ALL.len() + 2;

pub struct PgIndividualStore<'c, C: GenericClient + Sync> {
    client: &'c C,
    max_params: usize,
}

impl<'c, C: GenericClient + Sync> PgIndividualStore<'c, C> {
    pub fn new(client: &'c C) -> Self {
        Self::with_max_params(client, POSTGRES_MAX_PARAMS)
    }

    pub fn with_max_params(client: &'c C, max_params: usize) -> Self {
        Self { client, max_params }
    }

    /// Inserts `records` after normalizing them, in as many statements as the
    /// parameter ceiling requires. Returns the number of rows written.
    pub async fn insert_many(&self, records: &[Individual]) -> Result<u64, StoreError> {
        if records.is_empty() {
            return Ok(0);
        }
        let normalized: Vec<Individual> = records.iter().cloned().map(Individual::normalized).collect();
        let batch_size = self.max_params / INSERT_PARAMS_PER_ROW;

        let inserted = run_batches(
            &normalized,
            batch_size,
            0u64,
            |n, batch| self.insert_batch(n, batch),
            |total, rows| total + rows,
        )
        .await?;

        info!("Inserted {} individuals into {}", inserted, TABLE);
        Ok(inserted)
    }

    async fn insert_batch(&self, n: usize, batch: &[Individual]) -> Result<u64, StoreError> {
        let (sql, params) = build_insert(batch);
        let params_slice: Vec<&(dyn ToSql + Sync)> = params
            .iter()
            .map(|p| p.as_ref() as &(dyn ToSql + Sync))
            .collect();

        debug!(
            "Insert batch {}: {} rows, {} parameters",
            n + 1,
            batch.len(),
            params_slice.len()
        );
        Ok(self.client.execute(sql.as_str(), params_slice.as_slice()).await?)
    }
}

#[async_trait]
impl<'c, C: GenericClient + Sync> RecordStore for PgIndividualStore<'c, C> {
    fn max_params(&self) -> usize {
        self.max_params
    }

    async fn query(
        &self,
        country_id: &str,
        condition: &Condition,
    ) -> Result<Vec<Individual>, StoreError> {
        let (sql, values) = build_select(condition);
        let required = values.len() + 1;
        if required > self.max_params {
            return Err(StoreError::ParameterLimit {
                required,
                limit: self.max_params,
            });
        }

        let mut params: Vec<&(dyn ToSql + Sync)> = Vec::with_capacity(required);
        params.push(&country_id);
        for value in &values {
            params.push(value);
        }

        debug!("Querying {} with {} parameters", TABLE, required);
        let rows = self.client.query(sql.as_str(), params.as_slice()).await?;
        rows.iter().map(row_to_individual).collect()
    }
}

/// SELECT for non-deleted rows of the country in `$1` matching `condition`.
/// Returns the statement and the values for `$2..`.
pub fn build_select(condition: &Condition) -> (String, Vec<String>) {
    let clause = condition.to_sql(2);
    let columns: Vec<&str> = Column::ALL.iter().map(Column::as_str).collect();
    let sql = format!(
        "SELECT id::text AS id, country_id::text AS country_id, {}, deleted_at \
         FROM {} \
         WHERE country_id = $1::text::uuid AND deleted_at IS NULL AND {} \
         ORDER BY id",
        columns.join(", "),
        TABLE,
        clause.sql
    );
    (sql, clause.params)
}

/// Multi-row INSERT for `batch`, numbering parameters from `$1`.
pub fn build_insert(batch: &[Individual]) -> (String, Vec<Box<dyn ToSql + Sync + Send>>) {
    let mut values_clause_parts = Vec::with_capacity(batch.len());
    let mut params: Vec<Box<dyn ToSql + Sync + Send>> =
        Vec::with_capacity(batch.len() * INSERT_PARAMS_PER_ROW);
    let mut param_idx = 1;

    for record in batch {
        let mut placeholders = vec![
            format!("${}::text::uuid", param_idx),
            format!("${}::text::uuid", param_idx + 1),
        ];
        params.push(Box::new(record.id.clone()));
        params.push(Box::new(record.country_id.clone()));
        for (offset, column) in Column::ALL.iter().enumerate() {
            placeholders.push(format!("${}", param_idx + 2 + offset));
            params.push(Box::new(record.value(*column).to_string()));
        }
        values_clause_parts.push(format!("({})", placeholders.join(", ")));
        param_idx += INSERT_PARAMS_PER_ROW;
    }

    let columns: Vec<&str> = Column::ALL.iter().map(Column::as_str).collect();
    let sql = format!(
        "INSERT INTO {} (id, country_id, {}) VALUES {}",
        TABLE,
        columns.join(", "),
        values_clause_parts.join(", ")
    );
    (sql, params)
}

fn row_to_individual(row: &Row) -> Result<Individual, StoreError> {
    let mut individual = Individual {
        id: row.try_get::<_, Option<String>>("id")?.unwrap_or_default(),
        country_id: row
            .try_get::<_, Option<String>>("country_id")?
            .unwrap_or_default(),
        deleted_at: row.try_get("deleted_at")?,
        ..Default::default()
    };
    for column in Column::ALL {
        let value: Option<String> = row.try_get(column.as_str())?;
        if let Some(value) = value {
            individual = individual.with(column, value);
        }
    }
    Ok(individual)
}
