//! Extractor configuration
//!
//! Loaded from TOML; every field has a default so partial files are valid.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Keywords that mark text, sheets and task names as milestone-related
pub const DEFAULT_KEYWORDS: &[&str] = &[
    "milestone",
    "deadline",
    "target",
    "completion",
    "delivery",
    "phase",
    "gate",
    "checkpoint",
    "review",
    "approval",
    "timeline",
];

/// Configuration for milestone extraction
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Milestone keywords, matched case-insensitively as substrings
    pub keywords: Vec<String>,

    /// Name given to milestones whose source has none
    pub placeholder_name: String,

    /// Prefix of synthesized identifiers
    pub id_prefix: String,

    /// Free-text names are cut to this many characters
    pub name_max_chars: usize,

    /// Schedule-file backends
    pub schedule: ScheduleConfig,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            keywords: DEFAULT_KEYWORDS.iter().map(|k| k.to_string()).collect(),
            placeholder_name: "Untitled Milestone".to_string(),
            id_prefix: "MS".to_string(),
            name_max_chars: 100,
            schedule: ScheduleConfig::default(),
        }
    }
}

/// Settings for the binary schedule-file backends
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    /// JVM launcher used by the MPXJ bridge
    pub java_command: String,

    /// Classpath containing the MPXJ jars; falls back to `MPXJ_CLASSPATH`
    pub mpxj_classpath: Option<String>,

    /// Converter class invoked as `<main> <input> <output.xml>`
    pub mpxj_main_class: String,

    /// Shell used to drive Project through COM on Windows
    pub powershell_command: String,

    /// Files below this size get a validation warning
    pub small_file_bytes: u64,

    /// More tasks than this get a validation warning
    pub max_items: usize,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            java_command: "java".to_string(),
            mpxj_classpath: None,
            mpxj_main_class: "net.sf.mpxj.sample.MpxjConvert".to_string(),
            powershell_command: "powershell".to_string(),
            small_file_bytes: 1024,
            max_items: 10_000,
        }
    }
}

impl ScheduleConfig {
    /// Configured classpath, or the `MPXJ_CLASSPATH` environment variable
    pub fn resolved_classpath(&self) -> Option<String> {
        self.mpxj_classpath
            .clone()
            .or_else(|| std::env::var("MPXJ_CLASSPATH").ok())
            .filter(|cp| !cp.trim().is_empty())
    }
}

impl ExtractorConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        Ok(config)
    }

    /// Load from an explicit path, else the default path if present, else defaults
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => {
                let default_path = Self::default_config_path();
                if default_path.exists() {
                    Self::from_file(&default_path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Save configuration to a TOML file
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, content).context("Failed to write config file")?;

        Ok(())
    }

    /// Get the default configuration path
    pub fn default_config_path() -> PathBuf {
        PathBuf::from(".milestones/config.toml")
    }

    /// Case-insensitive keyword check
    pub fn mentions_keyword(&self, text: &str) -> bool {
        let lower = text.to_lowercase();
        self.keywords.iter().any(|keyword| lower.contains(&keyword.to_lowercase()))
    }
}
