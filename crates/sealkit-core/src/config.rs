use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{SealkitError, SealkitResult};

/// Top-level configuration (loaded from sealkit.toml)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SealkitConfig {
    pub log: LogConfig,
    pub bench: BenchConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Log level (default: info); RUST_LOG takes precedence
    pub level: String,
    /// Log format: "json" or "text"
    pub format: LogFormat,
}

/// Benchmark driver settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BenchConfig {
    /// Passphrase for key derivation (falls back to SEALKIT_PASSPHRASE, then a prompt)
    pub passphrase: Option<String>,
    /// How many item-sized texts are joined into the single large text of the block scenario
    pub block_repeats: usize,
    /// Number of items for the chunks and items scenarios
    pub item_count: usize,
    /// Characters per generated item
    pub item_size: usize,
    /// Spread item encryption/decryption across the rayon pool
    pub parallel: bool,
    /// Seed for the text generator (random when unset)
    pub seed: Option<u64>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: LogFormat::Text,
        }
    }
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            passphrase: None,
            block_repeats: 100_000,
            item_count: 200_000,
            item_size: 1024,
            parallel: false,
            seed: None,
        }
    }
}

impl SealkitConfig {
    /// Load configuration from `path`, falling back to defaults if the file does not exist.
    pub fn load(path: &Path) -> SealkitResult<Self> {
        if !path.exists() {
            tracing::warn!("config file not found: {}  (using defaults)", path.display());
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content).map_err(|e| match e {
            SealkitError::Config(msg) => {
                SealkitError::Config(format!("parsing {}: {msg}", path.display()))
            }
            other => other,
        })
    }

    pub fn parse(content: &str) -> SealkitResult<Self> {
        let config: Self =
            toml::from_str(content).map_err(|e| SealkitError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> SealkitResult<()> {
        if self.bench.item_size == 0 {
            return Err(SealkitError::Config("bench.item_size must be at least 1".into()));
        }
        Ok(())
    }

    pub fn to_toml(&self) -> SealkitResult<String> {
        toml::to_string_pretty(self).map_err(|e| SealkitError::Config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_full_config() {
        let toml_str = r#"
[log]
level = "debug"
format = "json"

[bench]
passphrase = "mano"
block_repeats = 2048
item_count = 5000
item_size = 512
parallel = true
seed = 42
"#;
        let config = SealkitConfig::parse(toml_str).unwrap();

        assert_eq!(config.log.level, "debug");
        assert_eq!(config.log.format, LogFormat::Json);
        assert_eq!(config.bench.passphrase.as_deref(), Some("mano"));
        assert_eq!(config.bench.block_repeats, 2048);
        assert_eq!(config.bench.item_count, 5000);
        assert_eq!(config.bench.item_size, 512);
        assert!(config.bench.parallel);
        assert_eq!(config.bench.seed, Some(42));
    }

    #[test]
    fn test_parse_defaults() {
        let config = SealkitConfig::parse("").unwrap();

        assert_eq!(config.log.level, "info");
        assert_eq!(config.log.format, LogFormat::Text);
        assert!(config.bench.passphrase.is_none());
        assert_eq!(config.bench.block_repeats, 100_000);
        assert_eq!(config.bench.item_count, 200_000);
        assert_eq!(config.bench.item_size, 1024);
        assert!(!config.bench.parallel);
    }

    #[test]
    fn test_parse_partial_config() {
        let toml_str = r#"
[bench]
item_count = 10
"#;
        let config = SealkitConfig::parse(toml_str).unwrap();

        // Overridden
        assert_eq!(config.bench.item_count, 10);
        // Defaults
        assert_eq!(config.bench.item_size, 1024);
        assert_eq!(config.log.level, "info");
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(matches!(
            SealkitConfig::parse("[bench]\nitem_size = 0\n"),
            Err(SealkitError::Config(_))
        ));
        assert!(matches!(
            SealkitConfig::parse("[log]\nformat = \"xml\"\n"),
            Err(SealkitError::Config(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[log]\nlevel = \"trace\"").unwrap();

        let config = SealkitConfig::load(file.path()).unwrap();
        assert_eq!(config.log.level, "trace");
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = SealkitConfig::load(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.bench.item_count, 200_000);
    }

    #[test]
    fn test_serialize_roundtrip() {
        let config = SealkitConfig::default();
        let parsed = SealkitConfig::parse(&config.to_toml().unwrap()).unwrap();

        assert_eq!(config.log.level, parsed.log.level);
        assert_eq!(config.bench.item_count, parsed.bench.item_count);
        assert_eq!(config.bench.block_repeats, parsed.bench.block_repeats);
    }
}
