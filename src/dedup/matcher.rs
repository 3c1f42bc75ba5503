// src/dedup/matcher.rs
// In-memory matching: pairwise decisions and the scan over a submitted batch.

use log::debug;
use std::collections::{BTreeMap, BTreeSet};

use crate::dedup::condition::Condition;
use crate::dedup::config::DedupConfig;
use crate::models::individual::Individual;

/// Whether `a` and `b` are duplicates under `config`. Commutative.
pub fn is_duplicate(a: &Individual, b: &Individual, config: &DedupConfig) -> bool {
    Condition::for_candidate(a, config).matches(b)
}

/// Compares every unordered pair of the batch once.
///
/// Returns one set per batch index holding the indices it duplicates; the
/// relation is symmetric and never reflexive.
pub fn scan_batch(candidates: &[Individual], config: &DedupConfig) -> Vec<BTreeSet<usize>> {
    let conditions: Vec<Condition> = candidates
        .iter()
        .map(|c| Condition::for_candidate(c, config))
        .collect();

    let mut duplicates = vec![BTreeSet::new(); candidates.len()];
    let mut pairs = 0usize;

    for i in 0..candidates.len() {
        if conditions[i].is_never() {
            continue;
        }
        for j in (i + 1)..candidates.len() {
            if conditions[i].matches(&candidates[j]) {
                duplicates[i].insert(j);
                duplicates[j].insert(i);
                pairs += 1;
            }
        }
    }

    debug!(
        "Batch scan: {} candidates, {} duplicate pairs",
        candidates.len(),
        pairs
    );
    duplicates
}

/// Groups batch rows that carry the same non-empty record id.
/// Only ids shared by two or more rows are returned.
pub fn find_duplicate_ids(candidates: &[Individual]) -> BTreeMap<String, BTreeSet<usize>> {
    let mut by_id: BTreeMap<String, BTreeSet<usize>> = BTreeMap::new();
    for (index, candidate) in candidates.iter().enumerate() {
        let id = candidate.id.trim();
        if id.is_empty() {
            continue;
        }
        by_id.entry(id.to_string()).or_default().insert(index);
    }
    by_id.retain(|_, rows| rows.len() > 1);
    by_id
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dedup::catalog::{FieldGroup, LogicalOperator, RuleCatalog};
    use crate::models::individual::Column;

    fn config(groups: &[&str], operator: LogicalOperator) -> DedupConfig {
        DedupConfig::new(&RuleCatalog::standard(), groups, operator).unwrap()
    }

    fn sample_records() -> Vec<Individual> {
        vec![
            Individual::default(),
            Individual::default()
                .with(Column::IdentificationNumber1, "1234567890")
                .with(Column::FirstName, "John")
                .with(Column::MiddleName, "Doe")
                .with(Column::LastName, "Smith"),
            Individual::default()
                .with(Column::IdentificationNumber2, "1234567890")
                .with(Column::FirstName, "John")
                .with(Column::MiddleName, "Jane")
                .with(Column::LastName, "Smith"),
            Individual::default()
                .with(Column::IdentificationNumber1, "1234567890")
                .with(Column::PhoneNumber1, "+47 123")
                .with(Column::Email1, "JOHN@EXAMPLE.ORG"),
            Individual::default()
                .with(Column::PhoneNumber2, "47123")
                .with(Column::Email1, "john@example.org")
                .with(Column::FullName, "John Doe Smith"),
            Individual::default()
                .with(Column::FirstName, "John")
                .with(Column::MiddleName, "Doe")
                .with(Column::LastName, "Smith")
                .with(Column::FullName, "John Doe Smith"),
            Individual::default()
                .with(Column::FreeField3, "household-7")
                .with(Column::PhoneNumber1, "47123"),
        ]
    }

    fn all_configs() -> Vec<DedupConfig> {
        let catalog = RuleCatalog::standard();
        let mut configs = Vec::new();
        for operator in [LogicalOperator::All, LogicalOperator::Any] {
            for group in catalog.all() {
                configs.push(DedupConfig::new(&catalog, &[group.id], operator).unwrap());
            }
            configs.push(
                DedupConfig::new(&catalog, &["Ids", "Names", "Emails"], operator).unwrap(),
            );
            configs.push(
                DedupConfig::new(&catalog, &["PhoneNumbers", "FullName", "FreeField3"], operator)
                    .unwrap(),
            );
        }
        configs
    }

    #[test]
    fn test_matcher_is_symmetric() {
        let records = sample_records();
        for config in all_configs() {
            for a in &records {
                for b in &records {
                    assert_eq!(
                        is_duplicate(a, b, &config),
                        is_duplicate(b, a, &config),
                        "asymmetric for {:?} on {:?} / {:?}",
                        config.group_ids(),
                        a,
                        b
                    );
                }
            }
        }
    }

    #[test]
    fn test_empty_fields_never_match() {
        let empty = Individual::default();
        for config in all_configs() {
            assert!(!is_duplicate(&empty, &empty.clone(), &config));
        }
    }

    #[test]
    fn test_names_all_requires_every_component() {
        let a = Individual::default()
            .with(Column::FirstName, "John")
            .with(Column::MiddleName, "Doe")
            .with(Column::LastName, "Smith");
        let b = Individual::default()
            .with(Column::FirstName, "John")
            .with(Column::MiddleName, "Jane")
            .with(Column::LastName, "Smith");
        let names = config(&["Names"], LogicalOperator::All);
        assert!(!is_duplicate(&a, &b, &names));
        assert!(is_duplicate(&a, &a.clone(), &names));
    }

    #[test]
    fn test_names_all_fails_when_both_omit_a_component() {
        let a = Individual::default()
            .with(Column::FirstName, "John")
            .with(Column::LastName, "Smith");
        let names = config(&["Names"], LogicalOperator::All);
        assert!(!is_duplicate(&a, &a.clone(), &names));
    }

    #[test]
    fn test_columns_compare_position_by_position() {
        let a = Individual::default().with(Column::IdentificationNumber1, "X1");
        let b = Individual::default().with(Column::IdentificationNumber2, "X1");
        assert!(!is_duplicate(&a, &b, &config(&["Ids"], LogicalOperator::All)));
    }

    #[test]
    fn test_phone_and_email_normalization_applies() {
        let a = Individual::default()
            .with(Column::PhoneNumber1, "+47 (123) 45")
            .with(Column::Email2, "Mary@Example.org ");
        let b = Individual::default()
            .with(Column::PhoneNumber1, "4712345")
            .with(Column::Email2, "mary@example.org");
        assert!(is_duplicate(&a, &b, &config(&["PhoneNumbers"], LogicalOperator::All)));
        assert!(is_duplicate(&a, &b, &config(&["Emails"], LogicalOperator::All)));
    }

    #[test]
    fn test_inter_group_operators() {
        let a = Individual::default()
            .with(Column::IdentificationNumber1, "ID1")
            .with(Column::FullName, "Ann Lee");
        let b = Individual::default()
            .with(Column::IdentificationNumber1, "ID1")
            .with(Column::FullName, "Anne Lee");
        assert!(!is_duplicate(&a, &b, &config(&["Ids", "FullName"], LogicalOperator::All)));
        assert!(is_duplicate(&a, &b, &config(&["Ids", "FullName"], LogicalOperator::Any)));
    }

    #[test]
    fn test_any_operator_monotonic_when_adding_groups() {
        let records = sample_records();
        let catalog = RuleCatalog::standard();
        let ids: Vec<&str> = catalog.all().iter().map(|g| g.id).collect();
        for k in 1..ids.len() {
            let smaller = DedupConfig::new(&catalog, &ids[..k], LogicalOperator::Any).unwrap();
            let larger = DedupConfig::new(&catalog, &ids[..=k], LogicalOperator::Any).unwrap();
            for a in &records {
                for b in &records {
                    if is_duplicate(a, b, &smaller) {
                        assert!(is_duplicate(a, b, &larger));
                    }
                }
            }
        }
    }

    #[test]
    fn test_all_operator_never_gains_matches_when_a_column_is_blanked() {
        let records = sample_records();
        let config = config(&["Names", "FullName"], LogicalOperator::All);
        for a in &records {
            for b in &records {
                let before = is_duplicate(a, b, &config);
                for column in [Column::FirstName, Column::MiddleName, Column::LastName] {
                    let blanked = a.clone().with(column, "");
                    if is_duplicate(&blanked, b, &config) {
                        assert!(before, "blanking {} created a match", column);
                    }
                }
            }
        }
    }

    #[test]
    fn test_custom_catalog_groups() {
        let catalog = RuleCatalog::new(vec![FieldGroup {
            id: "Household",
            label: "Household",
            columns: vec![Column::FreeField1, Column::FreeField2],
            combinator: LogicalOperator::All,
            order: 0,
            default_selected: false,
        }]);
        let config = DedupConfig::new(&catalog, &["Household"], LogicalOperator::All).unwrap();
        let a = Individual::default()
            .with(Column::FreeField1, "H1")
            .with(Column::FreeField2, "Camp A");
        assert!(is_duplicate(&a, &a.clone(), &config));
        assert!(!is_duplicate(&a, &a.clone().with(Column::FreeField2, "Camp B"), &config));
    }

    #[test]
    fn test_scan_batch_file_duplicates() {
        let batch = vec![
            Individual::default().with(Column::IdentificationNumber1, "1234567890"),
            Individual::default().with(Column::IdentificationNumber1, "1234567890"),
        ];
        let result = scan_batch(&batch, &config(&["Ids"], LogicalOperator::All));
        assert_eq!(
            result,
            vec![BTreeSet::from([1]), BTreeSet::from([0])]
        );
    }

    #[test]
    fn test_scan_batch_is_symmetric_graph() {
        let records = sample_records();
        for config in all_configs() {
            let result = scan_batch(&records, &config);
            for (i, set) in result.iter().enumerate() {
                assert!(!set.contains(&i));
                for &j in set {
                    assert!(result[j].contains(&i));
                    assert!(is_duplicate(&records[i], &records[j], &config));
                }
            }
        }
    }

    #[test]
    fn test_scan_batch_empty_and_single() {
        let config = config(&["Ids"], LogicalOperator::All);
        assert!(scan_batch(&[], &config).is_empty());
        let single = vec![Individual::default().with(Column::IdentificationNumber1, "A")];
        assert_eq!(scan_batch(&single, &config), vec![BTreeSet::new()]);
    }

    #[test]
    fn test_find_duplicate_ids() {
        let batch = vec![
            Individual { id: "a".to_string(), ..Default::default() },
            Individual { id: "b".to_string(), ..Default::default() },
            Individual { id: " a ".to_string(), ..Default::default() },
            Individual::default(),
            Individual::default(),
        ];
        let result = find_duplicate_ids(&batch);
        assert_eq!(result.len(), 1);
        assert_eq!(result["a"], BTreeSet::from([0, 2]));
    }
}
