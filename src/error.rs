// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Error types for SmartScan

use thiserror::Error;

/// Result type alias for SmartScan operations
pub type Result<T> = std::result::Result<T, SmartScanError>;

/// SmartScan error types
#[derive(Error, Debug)]
pub enum SmartScanError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("File system error: {0}")]
    FileSystem(#[from] std::io::Error),

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Classifier returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Malformed classifier response: {0}")]
    MalformedResponse(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unsupported file type: {0}")]
    UnsupportedFileType(String),

    #[error("File too large: {size} bytes (limit {limit})")]
    FileTooLarge { size: u64, limit: u64 },
}

/// Coarse classification of a failed request, used only for logging
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// The request could not be sent or no response came back
    Transport,
    /// A response came back but violated the contract
    Response,
    /// Anything that happened before a request was built
    Local,
}

impl SmartScanError {
    pub fn failure_class(&self) -> FailureClass {
        match self {
            Self::Transport(e) if e.is_decode() || e.is_status() => FailureClass::Response,
            Self::Transport(_) => FailureClass::Transport,
            Self::Status { .. } | Self::MalformedResponse(_) | Self::Json(_) => {
                FailureClass::Response
            }
            _ => FailureClass::Local,
        }
    }
}

impl std::fmt::Display for FailureClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Transport => "transport",
            Self::Response => "response",
            Self::Local => "local",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_and_malformed_are_response_failures() {
        let status = SmartScanError::Status { status: 502, body: String::new() };
        assert_eq!(status.failure_class(), FailureClass::Response);

        let malformed = SmartScanError::MalformedResponse("missing class".into());
        assert_eq!(malformed.failure_class(), FailureClass::Response);
    }

    #[test]
    fn test_io_is_local_failure() {
        let err = SmartScanError::from(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));
        assert_eq!(err.failure_class(), FailureClass::Local);
        assert_eq!(err.failure_class().to_string(), "local");
    }
}
