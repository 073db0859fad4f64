// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Read-only snapshot of a session for whatever renders it

use serde::Serialize;
use std::fmt;

use crate::pipeline::{ClassificationResult, RequestStatus};

/// Scale a [0, 1] confidence to a percentage with two decimals, halves up
pub fn format_confidence(confidence: f64) -> String {
    let percent = confidence * 100.0;
    // Snap away float noise such as 12.344999.. before rounding half up
    let snapped = (percent * 1e9).round() / 1e9;
    let rounded = (snapped * 100.0).round() / 100.0;
    format!("{:.2}%", rounded)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    NoImage,
    Image,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultView {
    pub label: String,
    pub confidence: String,
}

impl From<&ClassificationResult> for ResultView {
    fn from(result: &ClassificationResult) -> Self {
        Self {
            label: result.label.clone(),
            confidence: format_confidence(result.confidence),
        }
    }
}

impl fmt::Display for ResultView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}", self.label, self.confidence)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionView {
    pub mode: Mode,
    pub status: RequestStatus,
    pub preview_url: Option<String>,
    pub file_name: Option<String>,
    pub result: Option<ResultView>,
}

impl SessionView {
    pub fn busy(&self) -> bool {
        self.status == RequestStatus::InFlight
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_confidence() {
        assert_eq!(format_confidence(0.8734), "87.34%");
        assert_eq!(format_confidence(0.95), "95.00%");
        assert_eq!(format_confidence(1.0), "100.00%");
        assert_eq!(format_confidence(0.0), "0.00%");
        assert_eq!(format_confidence(0.123456), "12.35%");
    }

    #[test]
    fn test_half_rounds_up() {
        assert_eq!(format_confidence(0.12345), "12.35%");
        assert_eq!(format_confidence(0.00005), "0.01%");
    }

    #[test]
    fn test_result_view_display() {
        let result = ClassificationResult { label: "Healthy".to_string(), confidence: 0.95 };
        assert_eq!(ResultView::from(&result).to_string(), "Healthy, 95.00%");
    }
}
