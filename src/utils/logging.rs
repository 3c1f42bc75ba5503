// src/utils/logging.rs - Logging helpers for a duplicate detection run
use log::{debug, info, warn};
use std::time::Instant;

/// Phase and summary lines for one `find_duplicates` call, with elapsed time.
/// Never logs candidate field values at info level.
#[derive(Clone)]
pub struct DedupLogger {
    country_id: String,
    start_time: Instant,
}

impl DedupLogger {
    pub fn new(country_id: &str) -> Self {
        Self {
            country_id: country_id.to_string(),
            start_time: Instant::now(),
        }
    }

    fn elapsed(&self) -> f32 {
        self.start_time.elapsed().as_secs_f32()
    }

    pub fn log_start(&self, candidates: usize, groups: &[&str], operator: &str) {
        info!(
            "[DEDUP] 🚀 Checking {} candidates for country {} (groups: {}, operator: {})",
            candidates,
            self.country_id,
            groups.join(", "),
            operator
        );
    }

    pub fn log_phase(&self, phase: &str, details: Option<&str>) {
        match details {
            Some(details) => info!(
                "[DEDUP] 🔄 Phase: {} - {} [+{:.1}s]",
                phase,
                details,
                self.elapsed()
            ),
            None => info!("[DEDUP] 🔄 Phase: {} [+{:.1}s]", phase, self.elapsed()),
        }
    }

    pub fn log_batch_scan(&self, pairs: usize) {
        if pairs > 0 {
            info!("[DEDUP] 📋 Found {} duplicate pairs within the batch", pairs);
        } else {
            debug!("[DEDUP] ✨ No duplicates within the batch");
        }
    }

    pub fn log_lookup_plan(&self, predicates: usize, param_budget: usize) {
        info!(
            "[DEDUP] ⚙️  Looking up {} candidate predicates ({} parameters per query max)",
            predicates, param_budget
        );
    }

    pub fn log_chunk(&self, chunk: usize, params: usize, rows: usize) {
        debug!(
            "[DEDUP] 🔍 Query {}: {} parameters, {} rows [+{:.1}s]",
            chunk,
            params,
            rows,
            self.elapsed()
        );
    }

    pub fn log_split(&self, candidate: usize, parts: usize) {
        warn!(
            "[DEDUP] ✂️  Candidate {} exceeds the per-query parameter budget, looked up in {} part(s)",
            candidate, parts
        );
    }

    pub fn log_completion(&self, in_file_pairs: usize, with_persisted: usize) {
        info!(
            "[DEDUP] ✅ Done in {:.2}s: {} in-file pairs, {} candidates with persisted duplicates",
            self.elapsed(),
            in_file_pairs,
            with_persisted
        );
    }
}
