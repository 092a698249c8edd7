//! Pipeline configuration
//!
//! Layered lowest to highest: built-in defaults, optional TOML file,
//! environment (`GEOCODE_DELAY_MS`, `GEOCODE_BATCH_SIZE`), then explicit
//! overrides from the caller.

use crate::error::PipelineError;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sl_geocode::ResolverConfig;
use sl_ingest::ExtractorConfig;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable overriding [`PipelineConfig::delay_ms`]
pub const ENV_DELAY_MS: &str = "GEOCODE_DELAY_MS";

/// Environment variable overriding [`PipelineConfig::batch_size`]
pub const ENV_BATCH_SIZE: &str = "GEOCODE_BATCH_SIZE";

/// Default pause after every resolver call
pub const DEFAULT_DELAY_MS: u64 = 500;

/// Default records per checkpoint
pub const DEFAULT_BATCH_SIZE: usize = 10;

/// Extraction settings as they appear in the config file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractSettings {
    /// Locality names recognised by the primary text pattern
    pub localities: Vec<String>,
    /// Town assigned to fallback matches without one
    pub default_town: Option<String>,
    /// Zip assigned to fallback matches without one
    pub default_zip: Option<String>,
    /// Ignore lines this short or shorter
    pub min_line_len: usize,
}

impl Default for ExtractSettings {
    fn default() -> Self {
        Self {
            localities: vec!["Niskayuna".to_string()],
            default_town: Some("Niskayuna".to_string()),
            default_zip: None,
            min_line_len: 10,
        }
    }
}

impl ExtractSettings {
    /// Extractor configuration stamped with today's date
    #[must_use]
    pub fn to_extractor_config(&self) -> ExtractorConfig {
        ExtractorConfig {
            localities: self.localities.clone(),
            default_town: self.default_town.clone(),
            default_zip: self.default_zip.clone(),
            min_line_len: self.min_line_len,
            as_of: Utc::now().date_naive(),
        }
    }
}

/// Complete pipeline configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Pause after every resolver call, in milliseconds
    pub delay_ms: u64,
    /// Records per batch; the store is persisted after each
    pub batch_size: usize,
    /// Canonical store
    pub store_path: PathBuf,
    /// Derived read-only copy for the presentation layer
    pub feed_path: Option<PathBuf>,
    /// GeoJSON written after a geocoding run
    pub geojson_path: Option<PathBuf>,
    /// Extraction settings
    pub extract: ExtractSettings,
    /// Resolver settings
    pub resolver: ResolverConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            delay_ms: DEFAULT_DELAY_MS,
            batch_size: DEFAULT_BATCH_SIZE,
            store_path: PathBuf::from("data/markers.json"),
            feed_path: Some(PathBuf::from("public/data/markers.json")),
            geojson_path: None,
            extract: ExtractSettings::default(),
            resolver: ResolverConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults, then `file` if given, then the process environment
    ///
    /// # Errors
    /// `Config` if the file cannot be read or parsed, or the result is invalid
    pub fn load(file: Option<&Path>) -> Result<Self, PipelineError> {
        let mut config = match file {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML file over the defaults
    ///
    /// # Errors
    /// `Config` on read or parse failure
    pub fn from_file(path: &Path) -> Result<Self, PipelineError> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            PipelineError::config(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_toml(&text).map_err(|e| {
            PipelineError::config(format!("{}: {e}", path.display()))
        })
    }

    /// Parse TOML text over the defaults
    ///
    /// # Errors
    /// `Config` on parse failure
    pub fn from_toml(text: &str) -> Result<Self, PipelineError> {
        toml::from_str(text).map_err(|e| PipelineError::config(e.to_string()))
    }

    /// Apply environment overrides from `lookup`
    ///
    /// Unparseable or zero values are ignored with a warning.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup(ENV_DELAY_MS) {
            match raw.trim().parse::<u64>() {
                Ok(ms) => self.delay_ms = ms,
                Err(_) => tracing::warn!(
                    var = ENV_DELAY_MS,
                    value = %raw,
                    fallback = self.delay_ms,
                    "ignoring unparseable environment value"
                ),
            }
        }
        if let Some(raw) = lookup(ENV_BATCH_SIZE) {
            match raw.trim().parse::<usize>() {
                Ok(n) if n > 0 => self.batch_size = n,
                _ => tracing::warn!(
                    var = ENV_BATCH_SIZE,
                    value = %raw,
                    fallback = self.batch_size,
                    "ignoring unparseable environment value"
                ),
            }
        }
    }

    /// Reject unusable values
    ///
    /// # Errors
    /// `Config` for a zero batch size
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.batch_size == 0 {
            return Err(PipelineError::config("batch_size must be at least 1"));
        }
        Ok(())
    }

    /// With inter-request delay
    #[inline]
    #[must_use]
    pub fn with_delay_ms(mut self, ms: u64) -> Self {
        self.delay_ms = ms;
        self
    }

    /// With batch size
    #[inline]
    #[must_use]
    pub fn with_batch_size(mut self, size: usize) -> Self {
        self.batch_size = size;
        self
    }

    /// With store path
    #[inline]
    #[must_use]
    pub fn with_store_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.store_path = path.into();
        self
    }

    /// With feed path (`None` disables the feed)
    #[inline]
    #[must_use]
    pub fn with_feed_path(mut self, path: Option<PathBuf>) -> Self {
        self.feed_path = path;
        self
    }

    /// With GeoJSON output path
    #[inline]
    #[must_use]
    pub fn with_geojson_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.geojson_path = Some(path.into());
        self
    }

    /// With resolver settings
    #[inline]
    #[must_use]
    pub fn with_resolver(mut self, resolver: ResolverConfig) -> Self {
        self.resolver = resolver;
        self
    }

    /// Inter-request delay
    #[inline]
    #[must_use]
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.delay_ms, 500);
        assert_eq!(config.batch_size, 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn env_overrides_file() {
        let mut config = PipelineConfig::from_toml("delay_ms = 1000\nbatch_size = 5").unwrap();
        config.apply_env(env(&[(ENV_DELAY_MS, "250")]));
        assert_eq!(config.delay_ms, 250);
        assert_eq!(config.batch_size, 5);
    }

    #[test]
    fn bad_env_values_keep_previous() {
        let mut config = PipelineConfig::default();
        config.apply_env(env(&[(ENV_DELAY_MS, "soon"), (ENV_BATCH_SIZE, "0")]));
        assert_eq!(config.delay_ms, DEFAULT_DELAY_MS);
        assert_eq!(config.batch_size, DEFAULT_BATCH_SIZE);
    }

    #[test]
    fn zero_batch_size_rejected() {
        let config = PipelineConfig::from_toml("batch_size = 0").unwrap();
        assert!(matches!(config.validate(), Err(PipelineError::Config(_))));
    }

    #[test]
    fn nested_sections_parse() {
        let config = PipelineConfig::from_toml(
            r#"
            store_path = "out/markers.json"

            [extract]
            localities = ["Niskayuna", "Schenectady"]
            default_zip = "12309"

            [resolver]
            service = "nys_gis"
            centroid_confidence = 0.5
            "#,
        )
        .unwrap();
        assert_eq!(config.store_path, PathBuf::from("out/markers.json"));
        assert_eq!(config.extract.localities.len(), 2);
        assert_eq!(config.extract.default_town.as_deref(), Some("Niskayuna"));
        assert_eq!(config.resolver.service, sl_geocode::ServiceKind::NysGis);
    }

    #[test]
    fn unknown_service_is_config_error() {
        let err = PipelineConfig::from_toml("[resolver]\nservice = \"bing\"").unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }
}
