//! Harness settings, read from the environment.

use crate::evaluator::{DEFAULT_CONCURRENCY, DEFAULT_FETCH_TIMEOUT};
use oxiri::{Iri, IriParseError};
use std::env;
use std::error::Error;
use std::fmt;
use std::time::Duration;
use xmlwf_api::oracle::FailureMode;

pub const CORPUS_BASE_VARIABLE: &str = "XMLWF_CORPUS_BASE";
pub const FETCH_TIMEOUT_VARIABLE: &str = "XMLWF_FETCH_TIMEOUT_SECS";
pub const CONCURRENCY_VARIABLE: &str = "XMLWF_CONCURRENCY";
pub const ORACLE_MODE_VARIABLE: &str = "XMLWF_ORACLE_MODE";

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct HarnessConfig {
    /// IRI of the directory containing the conformance corpus.
    pub corpus_base: String,
    /// IRI of the directory containing the regression fixtures.
    pub regressions_base: String,
    pub fetch_timeout: Duration,
    pub concurrency: usize,
    pub oracle_mode: FailureMode,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            corpus_base: format!("file://{}/xmlconf/", env!("CARGO_MANIFEST_DIR")),
            regressions_base: format!("file://{}/regressions/", env!("CARGO_MANIFEST_DIR")),
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            concurrency: DEFAULT_CONCURRENCY,
            oracle_mode: FailureMode::Splice,
        }
    }
}

impl HarnessConfig {
    pub fn from_env() -> Result<Self, HarnessError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the configuration from the variables returned by `lookup`.
    /// Unset variables keep their default value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, HarnessError> {
        let mut config = Self::default();
        if let Some(base) = lookup(CORPUS_BASE_VARIABLE) {
            config.corpus_base = if base.ends_with('/') {
                base
            } else {
                format!("{}/", base)
            };
        }
        if let Some(value) = lookup(FETCH_TIMEOUT_VARIABLE) {
            config.fetch_timeout =
                Duration::from_secs(parse_positive(FETCH_TIMEOUT_VARIABLE, value)?);
        }
        if let Some(value) = lookup(CONCURRENCY_VARIABLE) {
            config.concurrency = parse_positive(CONCURRENCY_VARIABLE, value)? as usize;
        }
        if let Some(value) = lookup(ORACLE_MODE_VARIABLE) {
            config.oracle_mode = match value.to_ascii_lowercase().as_str() {
                "discard" => FailureMode::Discard,
                "splice" => FailureMode::Splice,
                "throw" => FailureMode::Throw,
                _ => {
                    return Err(HarnessError::InvalidVariable {
                        name: ORACLE_MODE_VARIABLE,
                        value,
                        reason: "expecting discard, splice or throw".to_owned(),
                    })
                }
            };
        }
        config.corpus_base_iri()?;
        Ok(config)
    }

    pub fn corpus_base_iri(&self) -> Result<Iri<String>, HarnessError> {
        parse_base(&self.corpus_base)
    }

    pub fn regressions_base_iri(&self) -> Result<Iri<String>, HarnessError> {
        parse_base(&self.regressions_base)
    }
}

fn parse_positive(name: &'static str, value: String) -> Result<u64, HarnessError> {
    match value.trim().parse::<u64>() {
        Ok(number) if number > 0 => Ok(number),
        Ok(_) => Err(HarnessError::InvalidVariable {
            name,
            value,
            reason: "expecting a positive number".to_owned(),
        }),
        Err(error) => Err(HarnessError::InvalidVariable {
            name,
            value,
            reason: error.to_string(),
        }),
    }
}

fn parse_base(base: &str) -> Result<Iri<String>, HarnessError> {
    Iri::parse(base.to_owned()).map_err(|error| HarnessError::InvalidBase {
        base: base.to_owned(),
        error,
    })
}

/// Error preventing the harness from running.
#[derive(Debug)]
pub enum HarnessError {
    InvalidVariable {
        name: &'static str,
        value: String,
        reason: String,
    },
    InvalidBase {
        base: String,
        error: IriParseError,
    },
}

impl fmt::Display for HarnessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HarnessError::InvalidVariable {
                name,
                value,
                reason,
            } => write!(f, "invalid value '{}' for {}: {}", value, name, reason),
            HarnessError::InvalidBase { base, error } => {
                write!(f, "invalid base IRI '{}': {}", base, error)
            }
        }
    }
}

impl Error for HarnessError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            HarnessError::InvalidBase { error, .. } => Some(error),
            HarnessError::InvalidVariable { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(variables: &[(&str, &str)]) -> Result<HarnessConfig, HarnessError> {
        let variables: HashMap<String, String> = variables
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        HarnessConfig::from_lookup(|name| variables.get(name).cloned())
    }

    #[test]
    fn defaults() {
        let config = config(&[]).unwrap();
        assert_eq!(HarnessConfig::default(), config);
        assert!(config.corpus_base.ends_with("/xmlconf/"));
        assert_eq!(Duration::from_secs(30), config.fetch_timeout);
        assert_eq!(FailureMode::Splice, config.oracle_mode);
        assert!(config.regressions_base_iri().is_ok());
    }

    #[test]
    fn overrides() {
        let config = config(&[
            (CORPUS_BASE_VARIABLE, "https://www.w3.org/XML/Test/xmlconf"),
            (FETCH_TIMEOUT_VARIABLE, "5"),
            (CONCURRENCY_VARIABLE, " 1 "),
            (ORACLE_MODE_VARIABLE, "Discard"),
        ])
        .unwrap();
        assert_eq!("https://www.w3.org/XML/Test/xmlconf/", config.corpus_base);
        assert_eq!(Duration::from_secs(5), config.fetch_timeout);
        assert_eq!(1, config.concurrency);
        assert_eq!(FailureMode::Discard, config.oracle_mode);
    }

    #[test]
    fn invalid_values() {
        assert!(matches!(
            config(&[(CONCURRENCY_VARIABLE, "0")]),
            Err(HarnessError::InvalidVariable { .. })
        ));
        assert!(matches!(
            config(&[(FETCH_TIMEOUT_VARIABLE, "soon")]),
            Err(HarnessError::InvalidVariable { .. })
        ));
        assert!(matches!(
            config(&[(ORACLE_MODE_VARIABLE, "ignore")]),
            Err(HarnessError::InvalidVariable { .. })
        ));
        assert!(matches!(
            config(&[(CORPUS_BASE_VARIABLE, "not an iri")]),
            Err(HarnessError::InvalidBase { .. })
        ));
    }
}
