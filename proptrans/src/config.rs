//! Invocation settings and where they come from.
//!
//! A [`ConfigStore`] is read once when an invocation starts; the core never
//! writes back to it.

use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use serde::{Deserialize, Serialize};

use crate::{
    codec::Charset,
    error::Error,
    types::{LocaleTag, OverwritePolicy},
};

pub const DEFAULT_CONCURRENCY: usize = 4;
pub const DEFAULT_TIMEOUT_MS: u64 = 15_000;

/// Settings for one translation invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TranslateConfig {
    /// Source locale; inferred from the source file name when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_locale: Option<LocaleTag>,
    pub target_locales: Vec<LocaleTag>,
    pub policy: OverwritePolicy,
    /// Upper bound on simultaneous provider calls across all targets.
    pub concurrency: usize,
    /// Per-call timeout in milliseconds.
    pub timeout_ms: u64,
    pub charset: Charset,
}

impl Default for TranslateConfig {
    fn default() -> Self {
        TranslateConfig {
            source_locale: None,
            target_locales: Vec::new(),
            policy: OverwritePolicy::default(),
            concurrency: DEFAULT_CONCURRENCY,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            charset: Charset::default(),
        }
    }
}

impl TranslateConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_source_locale(mut self, locale: Option<LocaleTag>) -> Self {
        self.source_locale = locale;
        self
    }

    pub fn with_target_locales(mut self, locales: Vec<LocaleTag>) -> Self {
        self.target_locales = locales;
        self
    }

    pub fn with_policy(mut self, policy: OverwritePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn with_charset(mut self, charset: Charset) -> Self {
        self.charset = charset;
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Checks the settings an invocation cannot run without.
    pub fn validate(&self) -> Result<(), Error> {
        if self.concurrency == 0 {
            return Err(Error::InvalidConfig(
                "concurrency must be greater than zero".to_string(),
            ));
        }
        if self.timeout_ms == 0 {
            return Err(Error::InvalidConfig(
                "timeout must be greater than zero".to_string(),
            ));
        }
        if self.target_locales.is_empty() {
            return Err(Error::InvalidConfig(
                "at least one target locale is required".to_string(),
            ));
        }
        Ok(())
    }
}

/// Supplies the settings of an invocation.
pub trait ConfigStore: Send + Sync {
    fn load(&self) -> Result<TranslateConfig, Error>;
}

/// A fixed configuration value.
#[derive(Debug, Clone, Default)]
pub struct StaticConfig(pub TranslateConfig);

impl ConfigStore for StaticConfig {
    fn load(&self) -> Result<TranslateConfig, Error> {
        Ok(self.0.clone())
    }
}

/// Reads settings from a TOML file, e.g.
///
/// ```toml
/// source_locale = "en"
/// target_locales = ["es", "fr_CA"]
/// policy = "overwrite-blank"
/// concurrency = 8
/// timeout_ms = 10000
/// charset = "iso-8859-1"
/// ```
#[derive(Debug, Clone)]
pub struct TomlConfigStore {
    path: PathBuf,
}

impl TomlConfigStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        TomlConfigStore {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn parse(text: &str) -> Result<TranslateConfig, Error> {
        toml::from_str(text).map_err(Error::ConfigParse)
    }
}

impl ConfigStore for TomlConfigStore {
    fn load(&self) -> Result<TranslateConfig, Error> {
        let text = std::fs::read_to_string(&self.path)?;
        Self::parse(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    #[test]
    fn test_defaults() {
        let config = TranslateConfig::default();
        assert_eq!(config.concurrency, DEFAULT_CONCURRENCY);
        assert_eq!(config.timeout(), Duration::from_millis(DEFAULT_TIMEOUT_MS));
        assert_eq!(config.policy, OverwritePolicy::SkipExisting);
        assert_eq!(config.charset, Charset::Utf8);
    }

    #[test]
    fn test_parse_toml() {
        let config = TomlConfigStore::parse(indoc! {r#"
            source_locale = "en"
            target_locales = ["es", "fr-CA"]
            policy = "overwrite-blank"
            concurrency = 8
            charset = "iso-8859-1"
        "#})
        .unwrap();
        assert_eq!(config.source_locale.unwrap().as_str(), "en");
        assert_eq!(config.target_locales[1].as_str(), "fr_CA");
        assert_eq!(config.policy, OverwritePolicy::OverwriteOnlyIfBlankOrMissing);
        assert_eq!(config.concurrency, 8);
        assert_eq!(config.timeout_ms, DEFAULT_TIMEOUT_MS);
        assert_eq!(config.charset, Charset::Latin1);
    }

    #[test]
    fn test_parse_toml_rejects_bad_values() {
        assert!(TomlConfigStore::parse("target_locales = [\"??\"]").is_err());
        assert!(TomlConfigStore::parse("policy = \"maybe\"").is_err());
        assert!(TomlConfigStore::parse("concurency = 3").is_err());
    }

    #[test]
    fn test_validate() {
        let es = LocaleTag::parse("es").unwrap();
        let ok = TranslateConfig::new().with_target_locales(vec![es.clone()]);
        assert!(ok.validate().is_ok());
        assert!(ok.clone().with_concurrency(0).validate().is_err());
        assert!(ok.clone().with_timeout(Duration::ZERO).validate().is_err());
        assert!(TranslateConfig::new().validate().is_err());
    }

    #[test]
    fn test_toml_store_reads_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("proptrans.toml");
        std::fs::write(&path, "target_locales = [\"de\"]\n").unwrap();
        let config = TomlConfigStore::new(&path).load().unwrap();
        assert_eq!(config.target_locales.len(), 1);
    }
}
