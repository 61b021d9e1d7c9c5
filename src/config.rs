use crate::error::ConfigError;
use crate::schema::{Field, Schema, ORDER_SCHEMA, SALE_SCHEMA};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FixedRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

/// Tunables for one pipeline run.
///
/// Every field has a default, so an empty YAML document is a valid config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Products whose return percentage exceeds this are flagged as losses.
    pub loss_threshold_pct: f64,
    pub forecast_window: usize,
    /// How many clients the "top offenders" list keeps.
    pub top_n: usize,
    /// Used when the caller supplies no date bounds.
    pub fixed_range: Option<FixedRange>,
    /// Header aliases per logical field name, replacing the built-in list.
    pub order_aliases: BTreeMap<String, Vec<String>>,
    pub sale_aliases: BTreeMap<String, Vec<String>>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            loss_threshold_pct: 20.0,
            forecast_window: 3,
            top_n: 10,
            fixed_range: None,
            order_aliases: BTreeMap::new(),
            sale_aliases: BTreeMap::new(),
        }
    }
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    pub fn from_yaml(contents: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.forecast_window == 0 {
            return Err(ConfigError::Invalid(
                "forecast_window must be at least 1".to_string(),
            ));
        }
        if !self.loss_threshold_pct.is_finite() {
            return Err(ConfigError::Invalid(
                "loss_threshold_pct must be a finite number".to_string(),
            ));
        }
        if let Some(range) = self.fixed_range {
            if range.from > range.to {
                return Err(ConfigError::Invalid(format!(
                    "fixed_range starts {} after it ends {}",
                    range.from, range.to
                )));
            }
        }
        for (name, aliases) in self.order_aliases.iter().chain(&self.sale_aliases) {
            if Field::from_name(name).is_none() {
                return Err(ConfigError::Invalid(format!("unknown field '{}'", name)));
            }
            if aliases.is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "alias list for '{}' is empty",
                    name
                )));
            }
        }
        Ok(())
    }

    pub fn order_schema(&self) -> Schema {
        ORDER_SCHEMA.with_aliases(&typed_aliases(&self.order_aliases))
    }

    pub fn sale_schema(&self) -> Schema {
        SALE_SCHEMA.with_aliases(&typed_aliases(&self.sale_aliases))
    }
}

fn typed_aliases(raw: &BTreeMap<String, Vec<String>>) -> BTreeMap<Field, Vec<String>> {
    raw.iter()
        .filter_map(|(name, aliases)| Field::from_name(name).map(|f| (f, aliases.clone())))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_gives_defaults() {
        let config = Config::from_yaml("{}").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.forecast_window, 3);
        assert_eq!(config.loss_threshold_pct, 20.0);
    }

    #[test]
    fn parses_overrides() {
        let yaml = r#"
loss_threshold_pct: 15.5
top_n: 5
fixed_range:
  from: 2024-01-01
  to: 2024-01-31
sale_aliases:
  product: ["SKU", "Item"]
"#;
        let config = Config::from_yaml(yaml).unwrap();
        assert_eq!(config.loss_threshold_pct, 15.5);
        assert_eq!(config.top_n, 5);
        assert_eq!(
            config.fixed_range,
            Some(FixedRange {
                from: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                to: NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
            })
        );
        let schema = config.sale_schema();
        assert_eq!(
            schema.spec(Field::Product).unwrap().aliases,
            vec!["SKU".to_string(), "Item".to_string()]
        );
    }

    #[test]
    fn rejects_zero_window() {
        assert!(matches!(
            Config::from_yaml("forecast_window: 0"),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn rejects_unknown_alias_field() {
        let yaml = "order_aliases:\n  colour: [\"Цвет\"]\n";
        assert!(matches!(Config::from_yaml(yaml), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn rejects_inverted_fixed_range() {
        let yaml = "fixed_range:\n  from: 2024-02-01\n  to: 2024-01-01\n";
        assert!(matches!(Config::from_yaml(yaml), Err(ConfigError::Invalid(_))));
    }
}
