// src/store/mod.rs
pub mod memory;
pub mod postgres;

use async_trait::async_trait;

use crate::dedup::condition::Condition;
use crate::error::StoreError;
use crate::models::individual::Individual;

/// PostgreSQL refuses statements with more bind parameters than this.
pub const POSTGRES_MAX_PARAMS: usize = 65535;

/// Read access to persisted individuals, as duplicate detection needs it.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Upper bound on bound parameters a single `query` call may use,
    /// counting the country parameter.
    fn max_params(&self) -> usize;

    /// Non-deleted individuals of `country_id` matching `condition`,
    /// ordered by id.
    async fn query(
        &self,
        country_id: &str,
        condition: &Condition,
    ) -> Result<Vec<Individual>, StoreError>;
}
