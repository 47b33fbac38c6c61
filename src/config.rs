//! Configuration for the summarizer
//!
//! Every section has working defaults, so an empty file (or no file at all)
//! yields a usable configuration.

use crate::error::{Result, SummarizerError};
use crate::pdf::PdfConfig;
use crate::pipeline::PipelineConfig;
use crate::segmenter::SegmenterConfig;
use crate::storage::StorageConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Caption fetch settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptionConfig {
    /// Request timeout in seconds
    pub request_timeout_seconds: u64,

    /// API credential passed to the caption endpoint
    pub api_key: Option<String>,

    /// Override for the caption endpoint base URL
    pub endpoint: Option<String>,
}

impl Default for CaptionConfig {
    fn default() -> Self {
        Self {
            request_timeout_seconds: 30,
            api_key: None,
            endpoint: None,
        }
    }
}

/// Metadata fetch settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetadataConfig {
    /// Request timeout in seconds
    pub request_timeout_seconds: u64,

    /// Override for the metadata endpoint base URL
    pub endpoint: Option<String>,
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            request_timeout_seconds: 30,
            endpoint: None,
        }
    }
}

/// Output artifact settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory for summary JSON and PDF artifacts
    pub output_dir: PathBuf,

    /// Also write the assembled summary as JSON
    pub write_json: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("./output"),
            write_json: true,
        }
    }
}

/// Configuration for the summarizer
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Pipeline settings
    pub pipeline: PipelineConfig,

    /// Segmentation thresholds
    pub segmenter: SegmenterConfig,

    /// Caption fetch settings
    pub captions: CaptionConfig,

    /// Metadata fetch settings
    pub metadata: MetadataConfig,

    /// Image storage settings
    pub storage: StorageConfig,

    /// PDF layout settings
    pub pdf: PdfConfig,

    /// Output and artifact settings
    pub output: OutputConfig,
}

impl Config {
    /// Load configuration from the conventional file locations
    pub fn load() -> Result<Self> {
        let config_paths = [
            "yt-summarizer.toml",
            "config/yt-summarizer.toml",
            "~/.config/yt-summarizer/config.toml",
        ];

        for path in &config_paths {
            if let Ok(config_str) = std::fs::read_to_string(path) {
                match toml::from_str::<Config>(&config_str) {
                    Ok(mut config) => {
                        tracing::info!("Loaded configuration from: {}", path);
                        config.apply_env();
                        return Ok(config);
                    }
                    Err(e) => {
                        tracing::warn!("Failed to parse config file {}: {}", path, e);
                    }
                }
            }
        }

        Err(SummarizerError::Configuration(
            "no configuration file found".to_string(),
        ))
    }

    /// Defaults with environment overrides applied
    pub fn load_or_default() -> Self {
        Config::load().unwrap_or_else(|_| {
            let mut config = Config::default();
            config.apply_env();
            config
        })
    }

    /// Credentials come from the environment when present
    fn apply_env(&mut self) {
        if let Ok(key) = std::env::var("YT_SUMMARIZER_CAPTION_KEY") {
            self.captions.api_key = Some(key);
        }
        if let Ok(key) = std::env::var("YT_SUMMARIZER_STORAGE_KEY") {
            self.storage.api_key = Some(key);
        }
        if let Ok(url) = std::env::var("YT_SUMMARIZER_STORAGE_URL") {
            self.storage.base_url = Some(url);
        }
    }

    /// Save configuration to a file
    pub fn save_to_file(&self, path: &str) -> Result<()> {
        let config_str = toml::to_string_pretty(self)
            .map_err(|e| SummarizerError::Configuration(e.to_string()))?;
        std::fs::write(path, config_str)?;
        tracing::info!("Configuration saved to: {}", path);
        Ok(())
    }
}
