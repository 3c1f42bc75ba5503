// src/dedup/lookup.rs
//! Finds, for each candidate, the persisted records it duplicates.
//!
//! Candidate predicates are OR-ed together into as few store queries as the
//! bind-parameter ceiling allows. Rows coming back are assigned to candidates
//! by evaluating each candidate's own predicate again in memory.

use std::collections::BTreeMap;

use crate::dedup::catalog::LogicalOperator;
use crate::dedup::condition::Condition;
use crate::dedup::config::DedupConfig;
use crate::error::StoreError;
use crate::models::individual::Individual;
use crate::store::RecordStore;
use crate::utils::chunked::run_weighted;
use crate::utils::logging::DedupLogger;

/// One store query's worth of a candidate's rule. `query` is what the store
/// evaluates and may be weaker than `filter`, which decides what is kept.
/// A candidate whose rule is too large for one query owns several.
#[derive(Debug, Clone)]
struct Predicate {
    candidate: usize,
    query: Condition,
    filter: Condition,
}

impl Predicate {
    fn exact(candidate: usize, condition: Condition) -> Self {
        Self {
            candidate,
            query: condition.clone(),
            filter: condition,
        }
    }
}

/// Returns one vector per candidate with the matching persisted records of
/// `country_id`, ordered by id, without repeats. Candidates whose predicate
/// can never match issue no query. Any store error aborts the whole lookup.
pub async fn find_persisted_duplicates<S: RecordStore + ?Sized>(
    store: &S,
    candidates: &[Individual],
    config: &DedupConfig,
    country_id: &str,
    logger: &DedupLogger,
) -> Result<Vec<Vec<Individual>>, StoreError> {
    // The country id takes one parameter in every query.
    let budget = store.max_params().saturating_sub(1);
    let predicates = plan_predicates(candidates, config, budget, store.max_params(), logger)?;

    if predicates.is_empty() {
        return Ok(vec![Vec::new(); candidates.len()]);
    }
    logger.log_lookup_plan(predicates.len(), budget);

    let init: Vec<BTreeMap<String, Individual>> = vec![BTreeMap::new(); candidates.len()];
    let found = run_weighted(
        &predicates,
        budget,
        |p| p.query.param_count(),
        init,
        move |n, chunk| async move {
            let condition = Condition::combine(
                LogicalOperator::Any,
                chunk.iter().map(|p| p.query.clone()).collect(),
            );
            let rows = store.query(country_id, &condition).await?;
            logger.log_chunk(n + 1, condition.param_count() + 1, rows.len());
            Ok::<_, StoreError>((chunk, rows))
        },
        |mut found, (chunk, rows)| {
            assign_rows(&mut found, candidates, chunk, rows);
            found
        },
    )
    .await?;

    Ok(found
        .into_iter()
        .map(|by_id| by_id.into_values().collect())
        .collect())
}

fn plan_predicates(
    candidates: &[Individual],
    config: &DedupConfig,
    budget: usize,
    max_params: usize,
    logger: &DedupLogger,
) -> Result<Vec<Predicate>, StoreError> {
    let mut predicates = Vec::new();

    for (index, candidate) in candidates.iter().enumerate() {
        let condition = Condition::for_candidate(candidate, config);
        if condition.is_never() {
            continue;
        }
        if condition.param_count() <= budget {
            predicates.push(Predicate::exact(index, condition));
            continue;
        }

        // Disjuncts are covered separately. Every query of a part shares that
        // part as its filter, so weakened queries never widen the result.
        let mut planned = Vec::new();
        for part in condition.into_disjuncts() {
            let queries = part.cover_within(budget).ok_or(StoreError::ParameterLimit {
                required: part.param_count() + 1,
                limit: max_params,
            })?;
            planned.extend(queries.into_iter().map(|query| Predicate {
                candidate: index,
                query,
                filter: part.clone(),
            }));
        }
        logger.log_split(index, planned.len());
        predicates.extend(planned);
    }
    Ok(predicates)
}

/// Rows keyed by persisted id per candidate, so a record found through two
/// predicates or two chunks is reported once.
fn assign_rows(
    found: &mut [BTreeMap<String, Individual>],
    candidates: &[Individual],
    chunk: &[Predicate],
    rows: Vec<Individual>,
) {
    for row in rows {
        for predicate in chunk {
            // Stored ids come back in canonical lower case.
            let own_id = candidates[predicate.candidate].id.trim();
            if !own_id.is_empty() && own_id.eq_ignore_ascii_case(&row.id) {
                continue;
            }
            if predicate.filter.matches(&row) {
                found[predicate.candidate]
                    .entry(row.id.clone())
                    .or_insert_with(|| row.clone());
            }
        }
    }
}
