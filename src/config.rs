use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::Context;

use crate::finance::yahoo::MAX_LOOKBACK_YEARS;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub environment: String,
    pub access_password: String,
    pub perplexity_api_key: Option<String>,
    pub claude_api_key: Option<String>,
    pub claude_model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub research_model: String,
    pub financial_years: usize,
    pub output_dir: PathBuf,
    pub otel_service_name: String,
    pub otel_exporter_endpoint: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 7860,
            environment: "development".to_string(),
            access_password: "ksegbs123".to_string(),
            perplexity_api_key: None,
            claude_api_key: None,
            claude_model: "claude-3-opus-20240229".to_string(),
            max_tokens: 4096,
            temperature: 0.5,
            research_model: "sonar".to_string(),
            financial_years: 5,
            output_dir: PathBuf::from("."),
            otel_service_name: "case-generator".to_string(),
            otel_exporter_endpoint: "http://localhost:4317".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a config from an arbitrary key lookup, falling back to the
    /// defaults for anything unset. Empty API keys count as unset.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let secret = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let financial_years = parse_or(&lookup, "FINANCIAL_YEARS", defaults.financial_years)?;
        anyhow::ensure!(
            (1..=MAX_LOOKBACK_YEARS).contains(&financial_years),
            "FINANCIAL_YEARS must be between 1 and {MAX_LOOKBACK_YEARS}, got {financial_years}"
        );

        Ok(Self {
            host: lookup("HOST").unwrap_or(defaults.host),
            port: parse_or(&lookup, "PORT", defaults.port)?,
            environment: lookup("CASEGEN_ENVIRONMENT").unwrap_or(defaults.environment),
            access_password: lookup("CASEGEN_PASSWORD").unwrap_or(defaults.access_password),
            perplexity_api_key: secret("PERPLEXITY_API_KEY"),
            claude_api_key: secret("CLAUDE_API_KEY"),
            claude_model: lookup("CLAUDE_MODEL").unwrap_or(defaults.claude_model),
            max_tokens: parse_or(&lookup, "CLAUDE_MAX_TOKENS", defaults.max_tokens)?,
            temperature: parse_or(&lookup, "CLAUDE_TEMPERATURE", defaults.temperature)?,
            research_model: lookup("PERPLEXITY_MODEL").unwrap_or(defaults.research_model),
            financial_years,
            output_dir: lookup("CASE_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.output_dir),
            otel_service_name: lookup("OTEL_SERVICE_NAME").unwrap_or(defaults.otel_service_name),
            otel_exporter_endpoint: lookup("OTEL_EXPORTER_OTLP_ENDPOINT")
                .unwrap_or(defaults.otel_exporter_endpoint),
        })
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> anyhow::Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} must be a number, got {raw:?}")),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_nothing_set() {
        let config = Config::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 7860);
        assert_eq!(config.access_password, "ksegbs123");
        assert_eq!(config.claude_model, "claude-3-opus-20240229");
        assert_eq!(config.max_tokens, 4096);
        assert_eq!(config.financial_years, 5);
        assert!(config.perplexity_api_key.is_none());
        assert!(config.claude_api_key.is_none());
        assert!(!config.is_production());
    }

    #[test]
    fn test_overrides_are_applied() {
        let config = Config::from_lookup(lookup_from(&[
            ("PORT", "9000"),
            ("HOST", "127.0.0.1"),
            ("CLAUDE_API_KEY", "sk-test"),
            ("CLAUDE_TEMPERATURE", "0.2"),
            ("CASEGEN_ENVIRONMENT", "production"),
        ]))
        .unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.claude_api_key.as_deref(), Some("sk-test"));
        assert!((config.temperature - 0.2).abs() < f32::EPSILON);
        assert!(config.is_production());
    }

    #[test]
    fn test_blank_api_key_counts_as_missing() {
        let config = Config::from_lookup(lookup_from(&[("PERPLEXITY_API_KEY", "  ")])).unwrap();
        assert!(config.perplexity_api_key.is_none());
    }

    #[test]
    fn test_financial_years_must_be_in_range() {
        let err = Config::from_lookup(lookup_from(&[("FINANCIAL_YEARS", "100000")])).unwrap_err();
        assert!(err.to_string().contains("FINANCIAL_YEARS"));
        assert!(Config::from_lookup(lookup_from(&[("FINANCIAL_YEARS", "0")])).is_err());

        let config = Config::from_lookup(lookup_from(&[("FINANCIAL_YEARS", "10")])).unwrap();
        assert_eq!(config.financial_years, 10);
    }

    #[test]
    fn test_invalid_port_is_an_error() {
        let err = Config::from_lookup(lookup_from(&[("PORT", "seventy")])).unwrap_err();
        assert!(err.to_string().contains("PORT"));
    }
}
