use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::SourceLocation;
use crate::error::CatalogError;

pub const DEFAULT_CONFIG_FILE: &str = "htan-catalog.json";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;
pub const SUPPORTED_SCHEMA_VERSION: u32 = 1;
pub const DEFAULT_MAX_RETRIES: usize = 3;
pub const DEFAULT_RETRY_DELAY_MS: u64 = 200;

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub schema_version: Option<u32>,
    #[serde(default)]
    pub dataset: Option<SourceEntry>,
    #[serde(default)]
    pub atlas_metadata: Option<SourceEntry>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    #[serde(default)]
    pub max_retries: Option<usize>,
    #[serde(default)]
    pub retry_delay_ms: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum SourceEntry {
    Shorthand(String),
    Detailed(SourceEntryObject),
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SourceEntryObject {
    pub location: String,
    #[serde(default)]
    pub gzip: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRequest {
    pub location: SourceLocation,
    pub gzip: bool,
}

impl SourceRequest {
    pub fn new(location: SourceLocation) -> Self {
        let gzip = location.looks_gzipped();
        Self { location, gzip }
    }
}

impl TryFrom<SourceEntry> for SourceRequest {
    type Error = CatalogError;

    fn try_from(entry: SourceEntry) -> Result<Self, Self::Error> {
        match entry {
            SourceEntry::Shorthand(value) => Ok(SourceRequest::new(value.parse()?)),
            SourceEntry::Detailed(obj) => {
                let location: SourceLocation = obj.location.parse()?;
                let gzip = obj.gzip.unwrap_or_else(|| location.looks_gzipped());
                Ok(SourceRequest { location, gzip })
            }
        }
    }
}

/// Command-line values that take precedence over the config file.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub dataset: Option<String>,
    pub atlas_metadata: Option<String>,
}

impl ConfigOverrides {
    fn is_complete(&self) -> bool {
        self.dataset.is_some() && self.atlas_metadata.is_some()
    }
}

/// How often and how patiently transient fetch failures are retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: usize,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            base_delay: Duration::from_millis(DEFAULT_RETRY_DELAY_MS),
        }
    }
}

impl RetryPolicy {
    /// Linear backoff: the n-th retry (0-based) waits `base_delay * (n + 1)`.
    pub fn delay(&self, attempt: usize) -> Duration {
        self.base_delay
            .saturating_mul(u32::try_from(attempt + 1).unwrap_or(u32::MAX))
    }

    pub fn allows(&self, attempt: usize) -> bool {
        attempt < self.max_retries
    }
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub schema_version: u32,
    pub dataset: SourceRequest,
    pub atlas_metadata: SourceRequest,
    pub timeout: Duration,
    pub retry: RetryPolicy,
}

impl ResolvedConfig {
    pub fn is_remote(&self) -> bool {
        self.dataset.location.is_remote() || self.atlas_metadata.location.is_remote()
    }
}

pub struct ConfigLoader;

impl ConfigLoader {
    pub fn resolve(
        path: Option<&str>,
        overrides: &ConfigOverrides,
    ) -> Result<ResolvedConfig, CatalogError> {
        let config_path = match path {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from(DEFAULT_CONFIG_FILE),
        };

        let config = if path.is_none() && !config_path.exists() {
            if !overrides.is_complete() {
                return Err(CatalogError::MissingConfig);
            }
            Config::default()
        } else {
            let content = fs::read_to_string(&config_path)
                .map_err(|_| CatalogError::ConfigRead(config_path.clone()))?;
            serde_json::from_str(&content)
                .map_err(|err| CatalogError::ConfigParse(err.to_string()))?
        };

        Self::resolve_config(config, overrides)
    }

    pub fn resolve_config(
        config: Config,
        overrides: &ConfigOverrides,
    ) -> Result<ResolvedConfig, CatalogError> {
        let schema_version = config
            .schema_version
            .unwrap_or(SUPPORTED_SCHEMA_VERSION);
        if schema_version != SUPPORTED_SCHEMA_VERSION {
            return Err(CatalogError::UnsupportedSchemaVersion {
                found: schema_version,
                supported: SUPPORTED_SCHEMA_VERSION,
            });
        }

        let dataset: SourceRequest = overrides
            .dataset
            .clone()
            .map(SourceEntry::Shorthand)
            .or(config.dataset)
            .ok_or(CatalogError::MissingSource("dataset"))?
            .try_into()?;
        let atlas_metadata: SourceRequest = overrides
            .atlas_metadata
            .clone()
            .map(SourceEntry::Shorthand)
            .or(config.atlas_metadata)
            .ok_or(CatalogError::MissingSource("atlas metadata"))?
            .try_into()?;

        Ok(ResolvedConfig {
            schema_version,
            dataset,
            atlas_metadata,
            timeout: Duration::from_secs(config.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS)),
            retry: RetryPolicy {
                max_retries: config.max_retries.unwrap_or(DEFAULT_MAX_RETRIES),
                base_delay: Duration::from_millis(
                    config.retry_delay_ms.unwrap_or(DEFAULT_RETRY_DELAY_MS),
                ),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_config_shorthand() {
        let config = Config {
            schema_version: None,
            dataset: Some(SourceEntry::Shorthand("data/processed.json.gz".to_string())),
            atlas_metadata: Some(SourceEntry::Shorthand(
                "https://example.org/atlas-meta.json".to_string(),
            )),
            timeout_secs: None,
            max_retries: None,
            retry_delay_ms: None,
        };

        let resolved = ConfigLoader::resolve_config(config, &ConfigOverrides::default()).unwrap();
        assert_eq!(resolved.schema_version, 1);
        assert!(resolved.dataset.gzip);
        assert!(!resolved.atlas_metadata.gzip);
        assert!(resolved.is_remote());
        assert_eq!(resolved.timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        assert_eq!(resolved.retry, RetryPolicy::default());
    }

    #[test]
    fn retry_delay_grows_linearly() {
        let policy = RetryPolicy {
            max_retries: 2,
            base_delay: Duration::from_millis(100),
        };
        assert_eq!(policy.delay(0), Duration::from_millis(100));
        assert_eq!(policy.delay(2), Duration::from_millis(300));
        assert!(policy.allows(1));
        assert!(!policy.allows(2));
    }
}
