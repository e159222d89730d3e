//! Wire shapes of the conversion service's JSON responses.
//!
//! Every field is defaulted so a partial or failure-shaped body still
//! decodes; the client decides success/domain-failure from `success` plus
//! the HTTP status, not from which fields happen to be present.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConvertResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub output_file: Option<String>,
    /// Labeled statistics; insertion order is the service's reporting order.
    #[serde(default)]
    pub stats: Option<Map<String, Value>>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalyzeResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub analysis: Option<String>,
    /// On success this carries non-fatal warnings from the analyzer.
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}
