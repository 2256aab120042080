use thiserror::Error;

use crate::rules::types::RawRules;
use crate::rules::Rules;

#[derive(Debug, Error)]
pub enum RulesError {
    #[error("yaml parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("missing rules entry: {0}")]
    MissingEntry(String),
    #[error("invalid rules: {0}")]
    Invalid(String),
    #[error("utf-8 error: {0}")]
    Utf8(#[from] std::str::Utf8Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub enum RulesSource<'a> {
    Embedded,
    Path(String),
    Bytes(&'a [u8]),
}

const EMBEDDED_RULES: &str = include_str!("../../data/rules.yaml");

pub fn load_rules(source: RulesSource<'_>) -> Result<Rules, RulesError> {
    let raw: RawRules = match source {
        RulesSource::Embedded => serde_yaml::from_str(EMBEDDED_RULES)?,
        RulesSource::Path(path) => {
            let yaml = std::fs::read_to_string(path)?;
            serde_yaml::from_str(&yaml)?
        }
        RulesSource::Bytes(bytes) => serde_yaml::from_str(std::str::from_utf8(bytes)?)?,
    };
    let rules = raw.compile()?;
    tracing::debug!(
        infrastructure_cost = rules.movement.infrastructure_cost,
        max_path_iterations = rules.search.max_path_iterations,
        "rules loaded"
    );
    Ok(rules)
}

impl Default for Rules {
    fn default() -> Self {
        match load_rules(RulesSource::Embedded) {
            Ok(rules) => rules,
            Err(err) => panic!("embedded rules are invalid: {err}"),
        }
    }
}
