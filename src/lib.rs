// src/lib.rs
pub mod dedup;
pub mod error;
pub mod models;
pub mod store;
pub mod utils;

pub use dedup::catalog::{FieldGroup, FieldGroupOption, RuleCatalog};
pub use dedup::config::{DedupConfig, LogicalOperator};
pub use dedup::report::{find_duplicates, DuplicateReport};
pub use error::{DedupError, StoreError};
pub use store::RecordStore;
pub use models::individual::{Column, Individual};
