// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Drop zone: loads candidate paths and keeps only acceptable images
//!
//! This is the widget in front of [`FileIntake`](crate::intake::FileIntake).
//! It owns type and size filtering so intake never has to.

use image::ImageFormat;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::config::IntakeConfig;
use crate::intake::SelectedFile;
use crate::{Result, SmartScanError};

pub struct DropZone {
    accept: Vec<String>,
    max_bytes: u64,
}

impl DropZone {
    pub fn new(config: &IntakeConfig) -> Self {
        Self {
            accept: config.accept.iter().map(|p| p.trim().to_ascii_lowercase()).collect(),
            max_bytes: config.max_bytes,
        }
    }

    /// Match `mime` against the accept patterns (`type/*` or exact)
    pub fn accepts(&self, mime: &str) -> bool {
        let mime = mime.to_ascii_lowercase();
        self.accept.iter().any(|pattern| match pattern.strip_suffix("/*") {
            Some(top) => mime
                .split_once('/')
                .is_some_and(|(kind, sub)| kind == top && !sub.is_empty()),
            None => *pattern == mime,
        })
    }

    /// Read one file and check it against the accept list and size limit
    pub fn load(&self, path: &Path) -> Result<SelectedFile> {
        let size = std::fs::metadata(path)?.len();
        if size > self.max_bytes {
            return Err(SmartScanError::FileTooLarge { size, limit: self.max_bytes });
        }

        let bytes = std::fs::read(path)?;
        let mime = sniff_mime(&bytes, path)
            .ok_or_else(|| SmartScanError::UnsupportedFileType(path.display().to_string()))?;
        if !self.accepts(&mime) {
            return Err(SmartScanError::UnsupportedFileType(mime));
        }

        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("upload")
            .to_string();

        debug!("Accepted {} as {} ({} bytes)", name, mime, bytes.len());
        Ok(SelectedFile::new(name, mime, bytes))
    }

    /// Load every path, skipping rejected ones
    pub fn drop_paths(&self, paths: &[PathBuf]) -> Vec<SelectedFile> {
        paths
            .iter()
            .filter_map(|path| match self.load(path) {
                Ok(file) => Some(file),
                Err(e) => {
                    warn!("Rejected {:?}: {}", path, e);
                    None
                }
            })
            .collect()
    }
}

/// Content sniffing first, extension as a fallback
fn sniff_mime(bytes: &[u8], path: &Path) -> Option<String> {
    image::guess_format(bytes)
        .or_else(|_| ImageFormat::from_path(path))
        .ok()
        .map(|format| format.to_mime_type().to_string())
}
