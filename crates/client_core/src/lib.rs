//! HTTP client for the remote PCAP voice conversion service.
//!
//! Owns no codec logic: it ships capture bytes to the service's two
//! multipart endpoints. Every settlement decodes deterministically into
//! either a success value or a [`ServiceError`], so a failure reported by
//! a responding service is never conflated with a failure of the call
//! itself.

use reqwest::{multipart, Client, StatusCode};
use shared::{
    domain::{Codec, Framing},
    protocol::{AnalyzeResponse, ConvertResponse, HealthResponse},
};
use thiserror::Error;
use tracing::debug;
use url::Url;

const CONVERT_FALLBACK_ERROR: &str = "Conversion failed";
const ANALYZE_FALLBACK_ERROR: &str = "Analysis failed";

#[derive(Debug, Error)]
pub enum ServiceError {
    /// The service was reached and responded, but reported failure.
    #[error("{0}")]
    Domain(String),
    /// The call could not complete: send failure or undecodable response.
    #[error("Network error: {0}")]
    Transport(String),
}

impl ServiceError {
    fn transport(err: impl std::fmt::Display) -> Self {
        ServiceError::Transport(err.to_string())
    }
}

/// Capture bytes staged for one submission, with the original file name the
/// service echoes into derived artifact names.
#[derive(Debug, Clone)]
pub struct CaptureUpload {
    pub filename: String,
    pub mime_type: Option<String>,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertSuccess {
    pub message: String,
    pub output_file: String,
    /// Labeled statistics in the service's reporting order.
    pub stats: Vec<(String, String)>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalyzeSuccess {
    pub analysis: String,
    pub warnings: Option<String>,
}

pub struct ConverterClient {
    http: Client,
    base_url: String,
}

impl ConverterClient {
    /// `base_url` must be an absolute http(s) URL; a trailing slash is
    /// tolerated and stripped.
    pub fn new(base_url: impl AsRef<str>) -> Result<Self, url::ParseError> {
        let parsed = Url::parse(base_url.as_ref())?;
        let base_url = parsed.as_str().trim_end_matches('/').to_string();
        Ok(Self {
            http: Client::new(),
            base_url,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Link target for a produced artifact; never fetched by this client.
    pub fn download_url(&self, output_file: &str) -> String {
        format!("{}/api/download/{output_file}", self.base_url)
    }

    pub async fn health(&self) -> Result<HealthResponse, ServiceError> {
        let response = self
            .http
            .get(format!("{}/api/health", self.base_url))
            .send()
            .await
            .map_err(ServiceError::transport)?;
        let status = response.status();
        if !status.is_success() {
            return Err(ServiceError::Domain(format!(
                "health check returned {status}"
            )));
        }
        response.json().await.map_err(ServiceError::transport)
    }

    pub async fn convert(
        &self,
        upload: CaptureUpload,
        codec: Codec,
        framing: Framing,
    ) -> Result<ConvertSuccess, ServiceError> {
        debug!(
            filename = %upload.filename,
            codec = codec.as_str(),
            framing = framing.as_str(),
            "dispatching convert request"
        );
        let form = multipart::Form::new()
            .part("file", file_part(upload)?)
            .text("codec", codec.as_str())
            .text("framing", framing.as_str());

        let response = self
            .http
            .post(format!("{}/api/convert", self.base_url))
            .multipart(form)
            .send()
            .await
            .map_err(ServiceError::transport)?;

        let status = response.status();
        let body: ConvertResponse = response.json().await.map_err(ServiceError::transport)?;
        if !status.is_success() || !body.success {
            return Err(domain_failure(status, body.error, CONVERT_FALLBACK_ERROR));
        }

        let output_file = body.output_file.ok_or_else(|| {
            ServiceError::Transport("conversion response is missing output_file".to_string())
        })?;
        Ok(ConvertSuccess {
            message: body
                .message
                .unwrap_or_else(|| "Conversion completed successfully".to_string()),
            output_file,
            stats: body
                .stats
                .map(|stats| {
                    stats
                        .into_iter()
                        .map(|(label, value)| (label, scalar_display(value)))
                        .collect()
                })
                .unwrap_or_default(),
        })
    }

    pub async fn analyze(&self, upload: CaptureUpload) -> Result<AnalyzeSuccess, ServiceError> {
        debug!(filename = %upload.filename, "dispatching analyze request");
        let form = multipart::Form::new().part("file", file_part(upload)?);

        let response = self
            .http
            .post(format!("{}/api/analyze", self.base_url))
            .multipart(form)
            .send()
            .await
            .map_err(ServiceError::transport)?;

        let status = response.status();
        let body: AnalyzeResponse = response.json().await.map_err(ServiceError::transport)?;
        if !status.is_success() || !body.success {
            return Err(domain_failure(status, body.error, ANALYZE_FALLBACK_ERROR));
        }

        let analysis = body.analysis.ok_or_else(|| {
            ServiceError::Transport("analysis response is missing analysis text".to_string())
        })?;
        Ok(AnalyzeSuccess {
            analysis,
            warnings: body.error,
        })
    }
}

fn file_part(upload: CaptureUpload) -> Result<multipart::Part, ServiceError> {
    let mut part = multipart::Part::bytes(upload.bytes).file_name(upload.filename);
    if let Some(mime) = upload.mime_type {
        part = part
            .mime_str(&mime)
            .map_err(|err| ServiceError::Transport(format!("invalid content type '{mime}': {err}")))?;
    }
    Ok(part)
}

fn domain_failure(status: StatusCode, error: Option<String>, fallback: &str) -> ServiceError {
    let message = error
        .filter(|msg| !msg.is_empty())
        .unwrap_or_else(|| fallback.to_string());
    debug!(%status, %message, "service reported failure");
    ServiceError::Domain(message)
}

/// Stats values are strings in practice; tolerate bare numbers/bools too.
fn scalar_display(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::String(text) => text,
        other => other.to_string(),
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
