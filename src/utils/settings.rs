// src/utils/settings.rs
//! Engine defaults read from the environment.

use log::{debug, warn};
use std::env;

use crate::dedup::catalog::{LogicalOperator, RuleCatalog};
use crate::dedup::config::{split_group_list, DedupConfig};
use crate::error::DedupError;
use crate::store::POSTGRES_MAX_PARAMS;

#[derive(Debug, Clone, PartialEq)]
pub struct DedupSettings {
    /// Bind-parameter ceiling per statement, country parameter included.
    pub max_query_params: usize,
    pub default_operator: LogicalOperator,
    /// Group names used when a request does not select any.
    pub default_groups: Vec<String>,
}

impl DedupSettings {
    /// Reads `DEDUP_MAX_QUERY_PARAMS`, `DEDUP_DEFAULT_OPERATOR` and
    /// `DEDUP_DEFAULT_GROUPS`. Unusable values fall back to the defaults.
    pub fn from_env(catalog: &RuleCatalog) -> Self {
        Self::from_lookup(catalog, |key| env::var(key).ok())
    }

    pub fn from_lookup(catalog: &RuleCatalog, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let max_query_params = match lookup("DEDUP_MAX_QUERY_PARAMS") {
            Some(raw) => match raw.trim().parse::<usize>() {
                Ok(n) if n >= 2 => n,
                _ => {
                    warn!(
                        "Ignoring DEDUP_MAX_QUERY_PARAMS={:?}, using {}",
                        raw, POSTGRES_MAX_PARAMS
                    );
                    POSTGRES_MAX_PARAMS
                }
            },
            None => POSTGRES_MAX_PARAMS,
        };

        let default_operator = match lookup("DEDUP_DEFAULT_OPERATOR") {
            Some(raw) => raw.parse().unwrap_or_else(|e| {
                warn!("Ignoring DEDUP_DEFAULT_OPERATOR: {}", e);
                LogicalOperator::All
            }),
            None => LogicalOperator::All,
        };

        let raw_groups = lookup("DEDUP_DEFAULT_GROUPS").unwrap_or_default();
        let mut default_groups: Vec<String> = split_group_list(&raw_groups)
            .into_iter()
            .map(str::to_string)
            .collect();
        if default_groups.is_empty() {
            default_groups = catalog
                .default_group_ids()
                .into_iter()
                .map(str::to_string)
                .collect();
        }

        let settings = Self {
            max_query_params,
            default_operator,
            default_groups,
        };
        debug!("Dedup settings: {:?}", settings);
        settings
    }

    /// Builds a configuration from optional request values, filling the
    /// gaps with these defaults.
    pub fn config_for(
        &self,
        catalog: &RuleCatalog,
        groups: Option<&str>,
        operator: Option<&str>,
    ) -> Result<DedupConfig, DedupError> {
        let operator = match operator {
            Some(raw) => raw.parse()?,
            None => self.default_operator,
        };
        let names: Vec<&str> = match groups {
            Some(csv) => split_group_list(csv),
            None => self.default_groups.iter().map(String::as_str).collect(),
        };
        DedupConfig::new(catalog, &names, operator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings(vars: &[(&str, &str)]) -> DedupSettings {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        DedupSettings::from_lookup(&RuleCatalog::standard(), |key| vars.get(key).cloned())
    }

    #[test]
    fn test_settings_defaults() {
        let s = settings(&[]);
        assert_eq!(s.max_query_params, 65535);
        assert_eq!(s.default_operator, LogicalOperator::All);
        assert_eq!(s.default_groups, vec!["Ids"]);
    }

    #[test]
    fn test_settings_from_values() {
        let s = settings(&[
            ("DEDUP_MAX_QUERY_PARAMS", "100"),
            ("DEDUP_DEFAULT_OPERATOR", "or"),
            ("DEDUP_DEFAULT_GROUPS", "Emails, PhoneNumbers"),
        ]);
        assert_eq!(s.max_query_params, 100);
        assert_eq!(s.default_operator, LogicalOperator::Any);
        assert_eq!(s.default_groups, vec!["Emails", "PhoneNumbers"]);
    }

    #[test]
    fn test_settings_ignore_unusable_values() {
        let s = settings(&[
            ("DEDUP_MAX_QUERY_PARAMS", "1"),
            ("DEDUP_DEFAULT_OPERATOR", "XOR"),
            ("DEDUP_DEFAULT_GROUPS", " , "),
        ]);
        assert_eq!(s.max_query_params, 65535);
        assert_eq!(s.default_operator, LogicalOperator::All);
        assert_eq!(s.default_groups, vec!["Ids"]);

        assert_eq!(settings(&[("DEDUP_MAX_QUERY_PARAMS", "lots")]).max_query_params, 65535);
    }

    #[test]
    fn test_config_for_fills_defaults() {
        let catalog = RuleCatalog::standard();
        let s = settings(&[("DEDUP_DEFAULT_OPERATOR", "OR")]);

        let config = s.config_for(&catalog, None, None).unwrap();
        assert_eq!(config.group_ids(), vec!["Ids"]);
        assert_eq!(config.operator(), LogicalOperator::Any);

        let config = s.config_for(&catalog, Some("Names,Emails"), Some("AND")).unwrap();
        assert_eq!(config.group_ids(), vec!["Names", "Emails"]);
        assert_eq!(config.operator(), LogicalOperator::All);

        let config = s.config_for(&catalog, Some("Ids, PhoneNumbers,"), Some("or")).unwrap();
        assert_eq!(config.group_ids(), vec!["Ids", "PhoneNumbers"]);
        assert_eq!(config.operator(), LogicalOperator::Any);
    }

    #[test]
    fn test_config_for_rejects_bad_input() {
        let catalog = RuleCatalog::standard();
        let s = settings(&[]);
        assert!(matches!(
            s.config_for(&catalog, Some("Passport"), None),
            Err(DedupError::UnknownFieldGroup(name)) if name == "Passport"
        ));
        assert!(matches!(
            s.config_for(&catalog, Some(" , "), None),
            Err(DedupError::InvalidConfiguration(_))
        ));
        assert!(matches!(
            s.config_for(&catalog, None, Some("NAND")),
            Err(DedupError::InvalidConfiguration(_))
        ));
    }
}
