// src/dedup/report.rs
// Combines the batch scan and the persisted lookup into one report, and
// renders findings as row-numbered messages for the uploader.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

use crate::dedup::config::DedupConfig;
use crate::dedup::lookup::find_persisted_duplicates;
use crate::dedup::matcher::scan_batch;
use crate::error::DedupError;
use crate::models::individual::Individual;
use crate::store::RecordStore;
use crate::utils::logging::DedupLogger;

/// Findings for one candidate batch, indexed by batch position.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DuplicateReport {
    /// For each candidate, the other candidates it duplicates.
    pub file_duplicates: Vec<BTreeSet<usize>>,
    /// For each candidate, the persisted records it duplicates, ordered by id.
    pub db_duplicates: Vec<Vec<Individual>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateMessage {
    pub message: String,
    pub details: Vec<String>,
}

/// Spreadsheet row of a batch index: the header is row 1.
fn row_number(index: usize) -> usize {
    index + 2
}

impl DuplicateReport {
    pub fn has_duplicates(&self) -> bool {
        self.file_duplicates.iter().any(|s| !s.is_empty())
            || self.db_duplicates.iter().any(|d| !d.is_empty())
    }

    /// Unordered in-file pairs.
    pub fn file_pair_count(&self) -> usize {
        self.file_duplicates.iter().map(BTreeSet::len).sum::<usize>() / 2
    }

    pub fn candidates_with_db_duplicates(&self) -> usize {
        self.db_duplicates.iter().filter(|d| !d.is_empty()).count()
    }

    /// One message per in-file pair, then one per persisted duplicate.
    /// Entries pointing past the end of `candidates` are skipped.
    pub fn messages(&self, candidates: &[Individual], config: &DedupConfig) -> Vec<DuplicateMessage> {
        let columns = config.columns();
        let mut messages = Vec::new();

        for (i, others) in self.file_duplicates.iter().enumerate() {
            for &j in others.iter().filter(|&&j| j > i) {
                let (Some(a), Some(b)) = (candidates.get(i), candidates.get(j)) else {
                    continue;
                };
                let details = columns
                    .iter()
                    .filter(|c| !(a.value(**c).is_empty() && b.value(**c).is_empty()))
                    .map(|c| {
                        format!(
                            ":: {} :: Row {}: {} | Row {}: {}",
                            c,
                            row_number(i),
                            a.value(*c),
                            row_number(j),
                            b.value(*c)
                        )
                    })
                    .collect();
                messages.push(DuplicateMessage {
                    message: format!(
                        "Last name {} - Row {} and Last name: {} - Row {} in your file are duplicates",
                        a.last_name,
                        row_number(i),
                        b.last_name,
                        row_number(j)
                    ),
                    details,
                });
            }
        }

        for (i, records) in self.db_duplicates.iter().enumerate() {
            let Some(candidate) = candidates.get(i) else {
                continue;
            };
            for record in records {
                let details = columns
                    .iter()
                    .filter(|c| !record.value(**c).is_empty())
                    .map(|c| {
                        format!(
                            ":: {} :: Database value: {} | File value: {}",
                            c,
                            record.value(*c),
                            candidate.value(*c)
                        )
                    })
                    .collect();
                messages.push(DuplicateMessage {
                    message: format!(
                        "Last name {} - Row {} is a duplicate of the participant {} with the id {}",
                        candidate.last_name,
                        row_number(i),
                        record.last_name,
                        record.id
                    ),
                    details,
                });
            }
        }
        messages
    }
}

/// Messages for batch rows sharing a record id, as found by
/// [`find_duplicate_ids`](crate::dedup::matcher::find_duplicate_ids).
pub fn id_duplicate_messages(
    duplicates: &BTreeMap<String, BTreeSet<usize>>,
    candidates: &[Individual],
) -> Vec<DuplicateMessage> {
    duplicates
        .iter()
        .map(|(id, rows)| {
            let participants: Vec<String> = rows
                .iter()
                .filter_map(|&row| {
                    candidates.get(row).map(|c| {
                        format!("Last name: {} - (Row {})", c.last_name, row_number(row))
                    })
                })
                .collect();
            DuplicateMessage {
                message: format!("{} share the same id: {}", participants.join(", "), id),
                details: Vec::new(),
            }
        })
        .collect()
}

/// Checks `candidates` against each other and against the persisted records
/// of `country_id`. A store failure fails the call; there is no partial report.
pub async fn find_duplicates<S: RecordStore + ?Sized>(
    store: &S,
    candidates: &[Individual],
    config: &DedupConfig,
    country_id: &str,
) -> Result<DuplicateReport, DedupError> {
    let logger = DedupLogger::new(country_id);
    logger.log_start(
        candidates.len(),
        &config.group_ids(),
        config.operator().as_str(),
    );

    logger.log_phase("Batch scan", None);
    let file_duplicates = scan_batch(candidates, config);
    logger.log_batch_scan(file_duplicates.iter().map(BTreeSet::len).sum::<usize>() / 2);

    logger.log_phase("Persisted lookup", None);
    let db_duplicates =
        find_persisted_duplicates(store, candidates, config, country_id, &logger).await?;

    let report = DuplicateReport {
        file_duplicates,
        db_duplicates,
    };
    logger.log_completion(report.file_pair_count(), report.candidates_with_db_duplicates());
    Ok(report)
}
