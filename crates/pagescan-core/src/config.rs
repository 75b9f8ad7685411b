// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scan pipeline configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Result, ScanError};
use crate::types::OutputRequest;

/// Name of the persisted configuration file.
pub const CONFIG_FILE: &str = "config.json";

/// One rule marking a capture failure as recoverable.
///
/// Both fields are optional; a rule matches when every field that is set
/// matches. `domain` is compared exactly, `description_contains` as a
/// case-insensitive substring.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecoverableRule {
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default)]
    pub description_contains: Option<String>,
}

impl RecoverableRule {
    pub fn description(needle: impl Into<String>) -> Self {
        Self {
            domain: None,
            description_contains: Some(needle.into()),
        }
    }
}

/// Which output modes get size normalization before encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizeModes {
    pub jpeg: bool,
    pub png: bool,
    pub document: bool,
}

impl Default for NormalizeModes {
    fn default() -> Self {
        Self {
            jpeg: true,
            png: false,
            document: false,
        }
    }
}

impl NormalizeModes {
    pub fn applies_to(&self, request: OutputRequest) -> bool {
        match request {
            OutputRequest::ImagesAsJpeg => self.jpeg,
            OutputRequest::ImagesAsPng => self.png,
            OutputRequest::SingleDocument => self.document,
        }
    }
}

/// Settings for the scan bridge and result pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Directory artifacts are written into.
    pub documents_dir: PathBuf,
    /// Longest allowed page side in pixels when normalizing.
    pub max_dimension: u32,
    /// JPEG quality factor (1-100).
    pub jpeg_quality: u8,
    pub normalize: NormalizeModes,
    /// Retry cycles offered per request for recoverable capture failures.
    pub max_capture_retries: u32,
    /// Rules classifying a capture failure as recoverable.
    pub recoverable_rules: Vec<RecoverableRule>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            documents_dir: default_documents_dir(),
            max_dimension: 2048,
            jpeg_quality: 90,
            normalize: NormalizeModes::default(),
            max_capture_retries: 1,
            recoverable_rules: vec![
                RecoverableRule::description("alphafirst"),
                RecoverableRule::description("alpha channel"),
                RecoverableRule::description("image buffer"),
                RecoverableRule::description("cgimage"),
            ],
        }
    }
}

impl ScanConfig {
    /// Config with every default except the output directory.
    pub fn with_documents_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            documents_dir: dir.into(),
            ..Self::default()
        }
    }

    /// Reject values the pipeline cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.max_dimension == 0 {
            return Err(ScanError::Config("max_dimension must be positive".into()));
        }
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(ScanError::Config(format!(
                "jpeg_quality must be within 1..=100, got {}",
                self.jpeg_quality
            )));
        }
        Ok(())
    }

    /// Load `config.json` from `dir`, falling back to defaults when absent.
    pub fn load_or_default(dir: &Path) -> Result<Self> {
        let path = dir.join(CONFIG_FILE);
        if !path.exists() {
            debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        let data = std::fs::read_to_string(&path)?;
        let config: Self = serde_json::from_str(&data)?;
        config.validate()?;
        info!(path = %path.display(), "config loaded");
        Ok(config)
    }

    /// Write the config as pretty JSON into `dir`.
    pub fn persist(&self, dir: &Path) -> Result<()> {
        std::fs::create_dir_all(dir)?;
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(dir.join(CONFIG_FILE), json)?;
        Ok(())
    }
}

/// Per-user documents directory for desktop hosts.
///
/// Mobile hosts pass the platform's per-app documents directory instead.
pub fn default_documents_dir() -> PathBuf {
    default_config_dir().join("documents")
}

/// Per-user directory holding `config.json` on desktop hosts.
pub fn default_config_dir() -> PathBuf {
    data_root().join("pagescan")
}

fn data_root() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_DATA_HOME") {
        return PathBuf::from(xdg);
    }
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".local").join("share");
    }
    std::env::temp_dir()
}
