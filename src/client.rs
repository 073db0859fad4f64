// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! HTTP client for the remote classification service

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Url};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use crate::config::ApiConfig;
use crate::intake::SelectedFile;
use crate::pipeline::ClassificationResult;
use crate::{Result, SmartScanError};

/// Longest slice of an error body kept for logging
const ERROR_BODY_LIMIT: usize = 200;

/// Anything that can turn an image into a classification
#[async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(&self, file: &SelectedFile) -> Result<ClassificationResult>;
}

/// Wire shape of a successful response
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct PredictResponse {
    class: String,
    confidence: f64,
}

/// Parse and check a response body
pub fn parse_response(body: &[u8]) -> Result<ClassificationResult> {
    let response: PredictResponse = serde_json::from_slice(body)
        .map_err(|e| SmartScanError::MalformedResponse(e.to_string()))?;

    if response.class.trim().is_empty() {
        return Err(SmartScanError::MalformedResponse("empty class".to_string()));
    }
    if !(0.0..=1.0).contains(&response.confidence) {
        return Err(SmartScanError::MalformedResponse(format!(
            "confidence {} outside [0, 1]",
            response.confidence
        )));
    }

    Ok(ClassificationResult {
        label: response.class,
        confidence: response.confidence,
    })
}

/// Classifier reached with a multipart POST
pub struct HttpClassifier {
    client: Client,
    endpoint: String,
    field_name: String,
}

impl HttpClassifier {
    /// Create a new client
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            endpoint: config.url.trim().to_string(),
            field_name: config.field_name.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Check the service answers on its root path
    pub async fn health_check(&self) -> Result<()> {
        let mut root = Url::parse(&self.endpoint)
            .map_err(|e| SmartScanError::Config(format!("Invalid endpoint {}: {}", self.endpoint, e)))?;
        root.set_path("/");
        root.set_query(None);

        let response = self.client
            .get(root)
            .timeout(Duration::from_secs(10))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SmartScanError::Status {
                status: response.status().as_u16(),
                body: String::new(),
            });
        }

        Ok(())
    }

    fn build_form(&self, file: &SelectedFile) -> Result<Form> {
        let part = Part::bytes(file.bytes().to_vec())
            .file_name(file.name().to_string())
            .mime_str(file.mime())
            .map_err(|_| SmartScanError::UnsupportedFileType(file.mime().to_string()))?;

        Ok(Form::new().part(self.field_name.clone(), part))
    }
}

#[async_trait]
impl Classifier for HttpClassifier {
    async fn classify(&self, file: &SelectedFile) -> Result<ClassificationResult> {
        let form = self.build_form(file)?;

        debug!("Posting {} ({} bytes) to {}", file.name(), file.len(), self.endpoint);

        let response = self.client
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            return Err(SmartScanError::Status {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&body).chars().take(ERROR_BODY_LIMIT).collect(),
            });
        }

        parse_response(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_response() {
        let result = parse_response(br#"{"class":"Late_Blight","confidence":0.8734}"#).unwrap();
        assert_eq!(result.label, "Late_Blight");
        assert_eq!(result.confidence, 0.8734);
    }

    #[test]
    fn test_parse_rejects_other_shapes() {
        let bodies: [&[u8]; 7] = [
            b"",
            b"[]",
            br#"{"class":"Healthy"}"#,
            br#"{"label":"Healthy","confidence":0.5}"#,
            br#"{"class":"Healthy","confidence":"0.5"}"#,
            br#"{"class":"Healthy","confidence":0.5,"extra":1}"#,
            br#"{"class":"","confidence":0.5}"#,
        ];
        for body in bodies {
            let err = parse_response(body).unwrap_err();
            assert!(matches!(err, SmartScanError::MalformedResponse(_)), "{:?}", err);
        }
    }

    #[test]
    fn test_parse_rejects_out_of_range_confidence() {
        assert!(parse_response(br#"{"class":"Healthy","confidence":1.5}"#).is_err());
        assert!(parse_response(br#"{"class":"Healthy","confidence":-0.1}"#).is_err());
        assert!(parse_response(br#"{"class":"Healthy","confidence":0}"#).is_ok());
        assert!(parse_response(br#"{"class":"Healthy","confidence":1}"#).is_ok());
    }

    #[test]
    fn test_invalid_mime_is_unsupported() {
        let classifier = HttpClassifier::new(&ApiConfig::default()).unwrap();
        let file = SelectedFile::new("x.bin", "not a mime", vec![0]);
        assert!(matches!(
            classifier.build_form(&file),
            Err(SmartScanError::UnsupportedFileType(_))
        ));
    }
}
