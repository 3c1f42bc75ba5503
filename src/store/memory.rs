// src/store/memory.rs
// Record store over a plain vector, evaluating conditions in memory.

use async_trait::async_trait;
use log::debug;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::{RecordStore, POSTGRES_MAX_PARAMS};
use crate::dedup::condition::Condition;
use crate::error::StoreError;
use crate::models::individual::Individual;

#[derive(Debug)]
pub struct InMemoryStore {
    records: Vec<Individual>,
    max_params: usize,
    queries: AtomicUsize,
}

impl InMemoryStore {
    pub fn new(records: Vec<Individual>) -> Self {
        Self::with_max_params(records, POSTGRES_MAX_PARAMS)
    }

    /// Same ceiling semantics as the database: a query needing more
    /// parameters than `max_params` fails with `ParameterLimit`.
    pub fn with_max_params(records: Vec<Individual>, max_params: usize) -> Self {
        let mut records: Vec<Individual> = records.into_iter().map(Individual::normalized).collect();
        records.sort_by(|a, b| a.id.cmp(&b.id));
        Self {
            records,
            max_params,
            queries: AtomicUsize::new(0),
        }
    }

    /// How many queries have been executed so far.
    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RecordStore for InMemoryStore {
    fn max_params(&self) -> usize {
        self.max_params
    }

    async fn query(
        &self,
        country_id: &str,
        condition: &Condition,
    ) -> Result<Vec<Individual>, StoreError> {
        let required = condition.param_count() + 1;
        if required > self.max_params {
            return Err(StoreError::ParameterLimit {
                required,
                limit: self.max_params,
            });
        }
        self.queries.fetch_add(1, Ordering::SeqCst);

        let found: Vec<Individual> = self
            .records
            .iter()
            .filter(|r| r.country_id == country_id && !r.is_deleted())
            .filter(|r| condition.matches(r))
            .cloned()
            .collect();
        debug!(
            "In-memory query for country {} with {} params returned {} rows",
            country_id,
            required,
            found.len()
        );
        Ok(found)
    }
}
