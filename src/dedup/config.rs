// src/dedup/config.rs

use log::debug;

pub use crate::dedup::catalog::LogicalOperator;
use crate::dedup::catalog::{FieldGroup, RuleCatalog};
use crate::error::DedupError;
use crate::models::individual::Column;

/// The per-request selection of field groups and how they combine.
///
/// Immutable once built; construction never touches the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DedupConfig {
    groups: Vec<FieldGroup>,
    operator: LogicalOperator,
}

impl DedupConfig {
    /// Resolves group names against the catalog.
    ///
    /// Unknown names fail with `UnknownFieldGroup`, an empty selection with
    /// `InvalidConfiguration`. Repeated names keep their first position.
    pub fn new<S: AsRef<str>>(
        catalog: &RuleCatalog,
        group_names: &[S],
        operator: LogicalOperator,
    ) -> Result<Self, DedupError> {
        let mut groups: Vec<FieldGroup> = Vec::with_capacity(group_names.len());
        for name in group_names {
            let group = catalog.lookup(name.as_ref().trim())?;
            if !groups.iter().any(|g| g.id == group.id) {
                groups.push(group.clone());
            }
        }

        if groups.is_empty() {
            return Err(DedupError::InvalidConfiguration(
                "at least one deduplication field group must be selected".to_string(),
            ));
        }

        debug!(
            "Built dedup config: groups={:?}, operator={}",
            groups.iter().map(|g| g.id).collect::<Vec<_>>(),
            operator
        );

        Ok(Self { groups, operator })
    }

    pub fn groups(&self) -> &[FieldGroup] {
        &self.groups
    }

    pub fn operator(&self) -> LogicalOperator {
        self.operator
    }

    pub fn group_ids(&self) -> Vec<&'static str> {
        self.groups.iter().map(|g| g.id).collect()
    }

    /// Every column touched by the selected groups, in selection order,
    /// without repeats.
    pub fn columns(&self) -> Vec<Column> {
        let mut columns = Vec::new();
        for column in self.groups.iter().flat_map(|g| g.columns.iter().copied()) {
            if !columns.contains(&column) {
                columns.push(column);
            }
        }
        columns
    }
}

/// Group names of a comma separated list, trimmed, blanks dropped.
pub fn split_group_list(csv: &str) -> Vec<&str> {
    csv.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}
