// src/dedup/catalog.rs
//! Registry of the field groups ("dedup types") a configuration can select.
//!
//! Built once at start-up and handed to whoever needs it; nothing mutates it
//! afterwards, so it can be shared across requests without locking.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::DedupError;
use crate::models::individual::Column;

/// Boolean combinator, used both inside a field group and across the
/// groups of a configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LogicalOperator {
    #[serde(rename = "AND", alias = "ALL")]
    All,
    #[serde(rename = "OR", alias = "ANY")]
    Any,
}

impl LogicalOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogicalOperator::All => "AND",
            LogicalOperator::Any => "OR",
        }
    }
}

impl fmt::Display for LogicalOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogicalOperator {
    type Err = DedupError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "AND" | "ALL" => Ok(LogicalOperator::All),
            "OR" | "ANY" => Ok(LogicalOperator::Any),
            other => Err(DedupError::InvalidConfiguration(format!(
                "unknown logical operator '{}', expected AND or OR",
                other
            ))),
        }
    }
}

/// A named set of columns plus how they must agree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldGroup {
    pub id: &'static str,
    pub label: &'static str,
    pub columns: Vec<Column>,
    pub combinator: LogicalOperator,
    /// Display order in the configuration picker.
    pub order: usize,
    pub default_selected: bool,
}

/// What the configuration picker needs to render one entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldGroupOption {
    pub id: &'static str,
    pub label: &'static str,
    pub default_selected: bool,
}

#[derive(Debug, Clone)]
pub struct RuleCatalog {
    groups: Vec<FieldGroup>,
}

impl RuleCatalog {
    /// Builds a catalog from arbitrary groups, ordered by `order`.
    pub fn new(mut groups: Vec<FieldGroup>) -> Self {
        groups.sort_by_key(|g| g.order);
        Self { groups }
    }

    /// The field groups every country office can choose from.
    pub fn standard() -> Self {
        use Column::*;
        use LogicalOperator::{All, Any};

        let group = |id, label, columns: &[Column], combinator, order, default_selected| FieldGroup {
            id,
            label,
            columns: columns.to_vec(),
            combinator,
            order,
            default_selected,
        };

        Self::new(vec![
            group(
                "Ids",
                "Identification numbers",
                &[IdentificationNumber1, IdentificationNumber2, IdentificationNumber3],
                Any,
                0,
                true,
            ),
            group("FreeField1", "Free Field 1", &[FreeField1], Any, 1, false),
            group("Emails", "E-Mails", &[Email1, Email2, Email3], Any, 2, false),
            group("FreeField2", "Free Field 2", &[FreeField2], Any, 3, false),
            group(
                "PhoneNumbers",
                "Phone numbers",
                &[PhoneNumber1, PhoneNumber2, PhoneNumber3],
                Any,
                4,
                false,
            ),
            group("FreeField3", "Free Field 3", &[FreeField3], Any, 5, false),
            group("FullName", "Full Name", &[FullName], Any, 6, false),
            group("FreeField4", "Free Field 4", &[FreeField4], Any, 7, false),
            group("Names", "Names", &[FirstName, MiddleName, LastName], All, 8, false),
            group("FreeField5", "Free Field 5", &[FreeField5], Any, 9, false),
        ])
    }

    pub fn lookup(&self, name: &str) -> Result<&FieldGroup, DedupError> {
        self.groups
            .iter()
            .find(|g| g.id == name)
            .ok_or_else(|| DedupError::UnknownFieldGroup(name.to_string()))
    }

    pub fn all(&self) -> &[FieldGroup] {
        &self.groups
    }

    pub fn list_field_groups(&self) -> Vec<FieldGroupOption> {
        self.groups
            .iter()
            .map(|g| FieldGroupOption {
                id: g.id,
                label: g.label,
                default_selected: g.default_selected,
            })
            .collect()
    }

    pub fn default_group_ids(&self) -> Vec<&'static str> {
        self.groups
            .iter()
            .filter(|g| g.default_selected)
            .map(|g| g.id)
            .collect()
    }
}

impl Default for RuleCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_known_and_unknown() {
        let catalog = RuleCatalog::standard();

        let ids = catalog.lookup("Ids").unwrap();
        assert_eq!(ids.combinator, LogicalOperator::Any);
        assert_eq!(ids.columns.len(), 3);

        let names = catalog.lookup("Names").unwrap();
        assert_eq!(names.combinator, LogicalOperator::All);
        assert_eq!(
            names.columns,
            vec![Column::FirstName, Column::MiddleName, Column::LastName]
        );

        match catalog.lookup("Nicknames") {
            Err(DedupError::UnknownFieldGroup(name)) => assert_eq!(name, "Nicknames"),
            other => panic!("expected UnknownFieldGroup, got {:?}", other),
        }
    }

    #[test]
    fn test_lookup_is_case_sensitive() {
        let catalog = RuleCatalog::standard();
        assert!(catalog.lookup("ids").is_err());
    }

    #[test]
    fn test_all_is_in_display_order() {
        let catalog = RuleCatalog::standard();
        let ids: Vec<&str> = catalog.all().iter().map(|g| g.id).collect();
        assert_eq!(
            ids,
            vec![
                "Ids",
                "FreeField1",
                "Emails",
                "FreeField2",
                "PhoneNumbers",
                "FreeField3",
                "FullName",
                "FreeField4",
                "Names",
                "FreeField5",
            ]
        );
    }

    #[test]
    fn test_list_field_groups_marks_defaults() {
        let catalog = RuleCatalog::standard();
        let options = catalog.list_field_groups();
        assert_eq!(options.len(), 10);
        assert_eq!(options[0].id, "Ids");
        assert_eq!(options[0].label, "Identification numbers");
        assert!(options[0].default_selected);
        assert!(options[1..].iter().all(|o| !o.default_selected));
        assert_eq!(catalog.default_group_ids(), vec!["Ids"]);
    }

    #[test]
    fn test_every_group_has_columns() {
        for group in RuleCatalog::standard().all() {
            assert!(!group.columns.is_empty(), "{} has no columns", group.id);
        }
    }

    #[test]
    fn test_operator_parsing() {
        assert_eq!("AND".parse::<LogicalOperator>().unwrap(), LogicalOperator::All);
        assert_eq!("all".parse::<LogicalOperator>().unwrap(), LogicalOperator::All);
        assert_eq!(" or ".parse::<LogicalOperator>().unwrap(), LogicalOperator::Any);
        assert_eq!("Any".parse::<LogicalOperator>().unwrap(), LogicalOperator::Any);
        assert!(matches!(
            "XOR".parse::<LogicalOperator>(),
            Err(DedupError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_operator_serialization() {
        assert_eq!(serde_json::to_string(&LogicalOperator::All).unwrap(), "\"AND\"");
        assert_eq!(serde_json::to_string(&LogicalOperator::Any).unwrap(), "\"OR\"");
        let parsed: LogicalOperator = serde_json::from_str("\"ANY\"").unwrap();
        assert_eq!(parsed, LogicalOperator::Any);
    }
}
