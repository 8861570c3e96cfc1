//! Configuration for the compression middleware

use crate::{CompressionError, Result};
use serde::Deserialize;

/// Lowest gzip level accepted
pub const MIN_LEVEL: u32 = 1;
/// Highest gzip level accepted
pub const MAX_LEVEL: u32 = 9;
/// The zlib default, a balance of speed and ratio
pub const DEFAULT_LEVEL: u32 = 6;

/// Configuration for the compression middleware
///
/// Deserializes from a `[compression]`-style table; missing keys take their
/// defaults.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CompressionConfig {
    /// When false, requests pass through without any wrapping
    pub enabled: bool,

    /// Gzip level, 1 (fastest) to 9 (smallest)
    pub level: u32,

    /// Whether to gzip a body the handler already marked with a
    /// non-identity `Content-Encoding`
    pub compress_encoded: bool,
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: DEFAULT_LEVEL,
            compress_encoded: false,
        }
    }
}

impl CompressionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builder() -> CompressionConfigBuilder {
        CompressionConfigBuilder::new()
    }

    /// Parse and validate a TOML document
    ///
    /// ```
    /// use tessera_compression::CompressionConfig;
    ///
    /// let config = CompressionConfig::from_toml_str("level = 9").unwrap();
    /// assert_eq!(config.level, 9);
    /// assert!(config.enabled);
    /// ```
    pub fn from_toml_str(input: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(input).map_err(|e| CompressionError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check that the level is one gzip understands
    pub fn validate(&self) -> Result<()> {
        if !(MIN_LEVEL..=MAX_LEVEL).contains(&self.level) {
            return Err(CompressionError::InvalidLevel(self.level, MIN_LEVEL, MAX_LEVEL));
        }
        Ok(())
    }
}

/// Builder for CompressionConfig
#[derive(Debug, Clone, Default)]
pub struct CompressionConfigBuilder {
    config: CompressionConfig,
}

impl CompressionConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.config.enabled = enabled;
        self
    }

    pub fn level(mut self, level: u32) -> Self {
        self.config.level = level;
        self
    }

    pub fn compress_encoded(mut self, compress: bool) -> Self {
        self.config.compress_encoded = compress;
        self
    }

    /// Shorthand for level 1
    pub fn fastest(self) -> Self {
        self.level(MIN_LEVEL)
    }

    /// Shorthand for level 9
    pub fn best(self) -> Self {
        self.level(MAX_LEVEL)
    }

    /// Build the configuration, rejecting an out-of-range level
    pub fn build(self) -> Result<CompressionConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CompressionConfig::default();
        assert!(config.enabled);
        assert_eq!(config.level, 6);
        assert!(!config.compress_encoded);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let config = CompressionConfig::builder()
            .level(3)
            .compress_encoded(true)
            .build()
            .unwrap();

        assert_eq!(config.level, 3);
        assert!(config.compress_encoded);
        assert_eq!(CompressionConfig::builder().best().build().unwrap().level, 9);
        assert_eq!(CompressionConfig::builder().fastest().build().unwrap().level, 1);
    }

    #[test]
    fn test_invalid_level_rejected() {
        let err = CompressionConfig::builder().level(0).build().unwrap_err();
        assert!(matches!(err, CompressionError::InvalidLevel(0, 1, 9)));

        let err = CompressionConfig::builder().level(10).build().unwrap_err();
        assert!(matches!(err, CompressionError::InvalidLevel(10, 1, 9)));
    }

    #[test]
    fn test_from_toml() {
        let config = CompressionConfig::from_toml_str(
            r#"
            enabled = false
            level = 2
            "#,
        )
        .unwrap();

        assert!(!config.enabled);
        assert_eq!(config.level, 2);
        assert!(!config.compress_encoded);

        assert_eq!(
            CompressionConfig::from_toml_str("").unwrap(),
            CompressionConfig::default()
        );
    }

    #[test]
    fn test_from_toml_errors() {
        assert!(matches!(
            CompressionConfig::from_toml_str("level = 42"),
            Err(CompressionError::InvalidLevel(42, _, _))
        ));
        assert!(matches!(
            CompressionConfig::from_toml_str("level = \"high\""),
            Err(CompressionError::Config(_))
        ));
    }
}
