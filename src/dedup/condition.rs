// src/dedup/condition.rs
//! The two-level match rule (group clauses joined by the configuration's
//! operator) as one tagged tree.
//!
//! The same tree is evaluated in memory by the pairwise matcher and compiled
//! to a parameterized WHERE clause for the registry lookup, so the two paths
//! cannot disagree about what a duplicate is.

use crate::dedup::catalog::{FieldGroup, LogicalOperator};
use crate::dedup::config::DedupConfig;
use crate::models::individual::{Column, Individual};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    /// The record's normalized value for `column` is non-empty and equals `value`.
    Equals { column: Column, value: String },
    Any(Vec<Condition>),
    All(Vec<Condition>),
    /// Matches nothing. Produced when the candidate lacks the values a clause needs.
    Never,
}

/// A compiled WHERE fragment with its positional parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlClause {
    pub sql: String,
    pub params: Vec<String>,
}

impl Condition {
    /// The rule "is another record a duplicate of `candidate` under `config`".
    pub fn for_candidate(candidate: &Individual, config: &DedupConfig) -> Condition {
        let clauses = config
            .groups()
            .iter()
            .map(|group| Self::for_group(candidate, group))
            .collect();
        Self::combine(config.operator(), clauses)
    }

    /// One field group's clause. Columns the candidate leaves empty become
    /// `Never`, which sinks an ALL group and drops out of an ANY group.
    pub fn for_group(candidate: &Individual, group: &FieldGroup) -> Condition {
        let equalities = group
            .columns
            .iter()
            .map(|&column| match candidate.normalized_value(column) {
                Some(value) => Condition::Equals { column, value },
                None => Condition::Never,
            })
            .collect();
        Self::combine(group.combinator, equalities)
    }

    /// Joins clauses with `operator`, folding away `Never` and single-child
    /// nodes and flattening nested nodes of the same kind.
    pub fn combine(operator: LogicalOperator, clauses: Vec<Condition>) -> Condition {
        match operator {
            LogicalOperator::All => {
                if clauses.is_empty() || clauses.iter().any(Condition::is_never) {
                    return Condition::Never;
                }
                let mut flat = Vec::with_capacity(clauses.len());
                for clause in clauses {
                    match clause {
                        Condition::All(inner) => flat.extend(inner),
                        other => flat.push(other),
                    }
                }
                if flat.len() == 1 {
                    flat.remove(0)
                } else {
                    Condition::All(flat)
                }
            }
            LogicalOperator::Any => {
                let mut flat = Vec::with_capacity(clauses.len());
                for clause in clauses {
                    match clause {
                        Condition::Never => {}
                        Condition::Any(inner) => flat.extend(inner),
                        other => flat.push(other),
                    }
                }
                match flat.len() {
                    0 => Condition::Never,
                    1 => flat.remove(0),
                    _ => Condition::Any(flat),
                }
            }
        }
    }

    pub fn is_never(&self) -> bool {
        matches!(self, Condition::Never)
    }

    pub fn matches(&self, record: &Individual) -> bool {
        match self {
            Condition::Equals { column, value } => {
                record.normalized_value(*column).as_deref() == Some(value.as_str())
            }
            Condition::Any(clauses) => clauses.iter().any(|c| c.matches(record)),
            // An empty conjunction must not match everything.
            Condition::All(clauses) => !clauses.is_empty() && clauses.iter().all(|c| c.matches(record)),
            Condition::Never => false,
        }
    }

    /// Number of bound parameters `to_sql` will emit.
    pub fn param_count(&self) -> usize {
        match self {
            Condition::Equals { .. } => 1,
            Condition::Any(clauses) | Condition::All(clauses) => {
                clauses.iter().map(Condition::param_count).sum()
            }
            Condition::Never => 0,
        }
    }

    /// Splits a disjunction into independently queryable parts. Anything else
    /// comes back whole.
    pub fn into_disjuncts(self) -> Vec<Condition> {
        match self {
            Condition::Any(clauses) => clauses,
            other => vec![other],
        }
    }

    /// Queries of at most `budget` parameters each whose union matches every
    /// record `self` matches. Conjunctions are weakened by dropping conjuncts;
    /// when no conjunct fits whole, the cheapest cover of a single conjunct
    /// is used. `None` when not even one equality fits.
    pub fn cover_within(&self, budget: usize) -> Option<Vec<Condition>> {
        if self.param_count() <= budget {
            return Some(vec![self.clone()]);
        }
        match self {
            Condition::Any(clauses) => clauses
                .iter()
                .map(|c| c.cover_within(budget))
                .collect::<Option<Vec<_>>>()
                .map(|parts| parts.into_iter().flatten().collect()),
            Condition::All(clauses) => {
                let mut kept = Vec::new();
                let mut remaining = budget;
                for clause in clauses {
                    let cost = clause.param_count();
                    if cost <= remaining {
                        remaining -= cost;
                        kept.push(clause.clone());
                    }
                }
                if !kept.is_empty() {
                    return Some(vec![Self::combine(LogicalOperator::All, kept)]);
                }
                clauses
                    .iter()
                    .filter_map(|c| c.cover_within(budget))
                    .min_by_key(Vec::len)
            }
            _ => None,
        }
    }

    /// Compiles to SQL, numbering placeholders from `$first_param`.
    /// Column names come from `Column::as_str`; every value is a parameter.
    pub fn to_sql(&self, first_param: usize) -> SqlClause {
        let mut params = Vec::with_capacity(self.param_count());
        let mut sql = String::new();
        self.write_sql(&mut sql, &mut params, first_param);
        SqlClause { sql, params }
    }

    fn write_sql(&self, sql: &mut String, params: &mut Vec<String>, first_param: usize) {
        match self {
            Condition::Equals { column, value } => {
                params.push(value.clone());
                sql.push_str(&format!(
                    "{} = ${}",
                    column.as_str(),
                    first_param + params.len() - 1
                ));
            }
            Condition::Any(clauses) | Condition::All(clauses) if clauses.is_empty() => {
                sql.push_str("FALSE");
            }
            Condition::Any(clauses) | Condition::All(clauses) => {
                let joiner = if matches!(self, Condition::Any(_)) {
                    " OR "
                } else {
                    " AND "
                };
                sql.push('(');
                for (i, clause) in clauses.iter().enumerate() {
                    if i > 0 {
                        sql.push_str(joiner);
                    }
                    clause.write_sql(sql, params, first_param);
                }
                sql.push(')');
            }
            Condition::Never => sql.push_str("FALSE"),
        }
    }
}
