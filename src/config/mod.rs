// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Configuration management for SmartScan

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Environment variable that overrides `api.url`
pub const API_URL_ENV: &str = "SMARTSCAN_API_URL";

/// Main application configuration
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct AppConfig {
    /// Classification service settings
    #[serde(default)]
    pub api: ApiConfig,

    /// Drop-zone acceptance rules
    #[serde(default)]
    pub intake: IntakeConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ApiConfig {
    /// Endpoint receiving the multipart POST
    #[serde(default = "default_api_url")]
    pub url: String,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// Name of the multipart field carrying the image
    #[serde(default = "default_field_name")]
    pub field_name: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct IntakeConfig {
    /// MIME patterns the drop zone accepts (`image/*`, `image/png`, ...)
    #[serde(default = "default_accept")]
    pub accept: Vec<String>,
    #[serde(default = "default_max_bytes")]
    pub max_bytes: u64,
}

// Default value functions
fn default_api_url() -> String { "http://localhost:8000/predict".to_string() }
fn default_timeout() -> u64 { 30 }
fn default_field_name() -> String { "file".to_string() }
fn default_accept() -> Vec<String> { vec!["image/*".to_string()] }
fn default_max_bytes() -> u64 { 20 * 1024 * 1024 }

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            url: default_api_url(),
            timeout_secs: default_timeout(),
            field_name: default_field_name(),
        }
    }
}

impl Default for IntakeConfig {
    fn default() -> Self {
        Self {
            accept: default_accept(),
            max_bytes: default_max_bytes(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a JSON file, then apply environment overrides
    pub fn load(path: &Path) -> crate::Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)?;
            serde_json::from_str(&content)
                .map_err(|e| crate::SmartScanError::Config(format!("Failed to parse config: {}", e)))?
        } else {
            tracing::info!("Config file not found at {:?}, using defaults", path);
            Self::default()
        };

        if let Ok(url) = std::env::var(API_URL_ENV) {
            config.apply_api_url_override(url);
        }

        Ok(config)
    }

    /// Save configuration to a JSON file
    pub fn save(&self, path: &Path) -> crate::Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    fn apply_api_url_override(&mut self, url: String) {
        let url = url.trim();
        if url.is_empty() {
            return;
        }
        tracing::debug!("Endpoint overridden by {}: {}", API_URL_ENV, url);
        self.api.url = url.to_string();
    }

    /// Check the settings the client depends on
    pub fn validate(&self) -> crate::Result<()> {
        let url = reqwest::Url::parse(&self.api.url)
            .map_err(|e| crate::SmartScanError::Config(format!("Invalid api.url '{}': {}", self.api.url, e)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(crate::SmartScanError::Config(format!(
                "api.url must be http or https, got '{}'",
                url.scheme()
            )));
        }
        if self.api.field_name.trim().is_empty() {
            return Err(crate::SmartScanError::Config("api.field_name must not be empty".to_string()));
        }
        if self.intake.accept.is_empty() {
            return Err(crate::SmartScanError::Config("intake.accept must list at least one pattern".to_string()));
        }
        Ok(())
    }
}
