//! Configuration file support for md2nb CLI
//!
//! Loads settings from `_md2nb.toml` configuration file.

use anyhow::{Context, Result};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default configuration file name
pub const CONFIG_FILE_NAME: &str = "_md2nb.toml";

/// Schema file referenced by the `#:schema` directive of generated configs
pub const SCHEMA_FILE_NAME: &str = "md2nb.schema.json";

/// Root configuration structure
#[derive(Debug, Default, Clone, Deserialize, Serialize, JsonSchema)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Input file selection
    #[serde(skip_serializing_if = "InputConfig::is_empty")]
    pub input: InputConfig,
    /// Output file configuration
    #[serde(skip_serializing_if = "OutputConfig::is_empty")]
    pub output: OutputConfig,
    /// Batch conversion configuration
    #[serde(skip_serializing_if = "BatchConfig::is_empty")]
    pub batch: BatchConfig,
}

/// Input file selection
#[derive(Debug, Default, Clone, Deserialize, Serialize, JsonSchema)]
#[serde(default, deny_unknown_fields)]
pub struct InputConfig {
    /// File extensions treated as Markdown when converting a directory,
    /// matched ignoring ASCII case (default: ["md"])
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extensions: Option<Vec<String>>,
    /// Descend into subdirectories when converting a directory (default: false)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recursive: Option<bool>,
}

impl InputConfig {
    fn is_empty(&self) -> bool {
        self.extensions.is_none() && self.recursive.is_none()
    }
}

/// Output file configuration
#[derive(Debug, Default, Clone, Deserialize, Serialize, JsonSchema)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    /// Extension of written notebooks, without the leading dot (default: "ipynb")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extension: Option<String>,
}

impl OutputConfig {
    fn is_empty(&self) -> bool {
        self.extension.is_none()
    }
}

/// Batch conversion configuration
#[derive(Debug, Default, Clone, Deserialize, Serialize, JsonSchema)]
#[serde(default, deny_unknown_fields)]
pub struct BatchConfig {
    /// Number of parallel jobs (default: number of CPUs)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jobs: Option<usize>,
}

impl BatchConfig {
    fn is_empty(&self) -> bool {
        self.jobs.is_none()
    }
}

impl Config {
    /// Load configuration from a specific file path
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        config
            .validate()
            .with_context(|| format!("Invalid config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from a directory (looks for `_md2nb.toml`)
    ///
    /// Returns `Ok(None)` if the config file doesn't exist.
    pub fn load_from_dir(dir: &Path) -> Result<Option<Self>> {
        let config_path = dir.join(CONFIG_FILE_NAME);
        if config_path.exists() {
            Ok(Some(Self::load(&config_path)?))
        } else {
            Ok(None)
        }
    }

    /// Check values that parse but cannot be used
    pub fn validate(&self) -> Result<()> {
        if let Some(ext) = &self.output.extension {
            check_extension(ext).context("output.extension")?;
        }
        if let Some(exts) = &self.input.extensions {
            if exts.is_empty() {
                anyhow::bail!("input.extensions: at least one extension is required");
            }
            for ext in exts {
                check_extension(ext).context("input.extensions")?;
            }
        }
        if self.batch.jobs == Some(0) {
            anyhow::bail!("batch.jobs: must be at least 1");
        }
        Ok(())
    }

    /// Generate JSON schema for the configuration
    pub fn json_schema() -> schemars::Schema {
        schemars::schema_for!(Config)
    }

    /// Generate JSON schema as a string
    pub fn json_schema_string() -> Result<String> {
        let schema = Self::json_schema();
        serde_json::to_string_pretty(&schema).context("Failed to serialize JSON schema")
    }

    /// Serialize configuration to TOML string with schema directive
    pub fn to_toml_with_schema(&self) -> Result<String> {
        let toml_content =
            toml::to_string_pretty(self).context("Failed to serialize config to TOML")?;

        Ok(format!("#:schema ./{}\n\n{}", SCHEMA_FILE_NAME, toml_content))
    }

    /// Create a sample configuration with the built-in defaults spelled out
    pub fn sample() -> Self {
        Config {
            input: InputConfig {
                extensions: Some(vec!["md".to_string()]),
                recursive: Some(false),
            },
            output: OutputConfig {
                extension: Some("ipynb".to_string()),
            },
            batch: BatchConfig {
                jobs: None, // all CPUs
            },
        }
    }
}

/// A file extension is a single non-empty path component without dots
fn check_extension(ext: &str) -> Result<()> {
    if ext.is_empty() {
        anyhow::bail!("extension must not be empty");
    }
    if ext.contains(['.', '/', '\\']) {
        anyhow::bail!("extension {:?} must not contain '.', '/' or '\\'", ext);
    }
    Ok(())
}
