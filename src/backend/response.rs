use serde::Deserialize;
use serde_json::Value;
use tracing::{error, trace};

use crate::error::{ClaimDocError, Result};

/// Envelope returned by `generateContent`.
///
/// Every level is optional or defaulted so a structurally surprising response
/// deserializes and the gap is reported by [`first_text`](Self::first_text) instead.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    pub usage_metadata: Option<UsageMetadata>,
    pub model_version: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub content: Option<CandidateContent>,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CandidateContent {
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<ResponsePart>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResponsePart {
    pub text: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageMetadata {
    #[serde(default)]
    pub prompt_token_count: u64,
    #[serde(default)]
    pub candidates_token_count: u64,
    #[serde(default)]
    pub total_token_count: u64,
}

impl GenerateContentResponse {
    /// Interpret an already-decoded JSON body as an envelope.
    pub fn from_value(value: &Value) -> Result<Self> {
        Self::deserialize(value).map_err(|e| {
            error!(error = %e, "Response body does not match the envelope shape");
            ClaimDocError::EnvelopeShape(format!("envelope does not deserialize: {}", e))
        })
    }

    /// Text of the first part of the first candidate.
    pub fn first_text(&self) -> Result<&str> {
        let candidate = self
            .candidates
            .first()
            .ok_or_else(|| ClaimDocError::EnvelopeShape("no candidates in response".into()))?;
        trace!(finish_reason = ?candidate.finish_reason, "Candidate finish reason");

        let content = candidate.content.as_ref().ok_or_else(|| {
            ClaimDocError::EnvelopeShape(format!(
                "first candidate has no content (finish reason: {})",
                candidate.finish_reason.as_deref().unwrap_or("unknown")
            ))
        })?;
        let part = content
            .parts
            .first()
            .ok_or_else(|| ClaimDocError::EnvelopeShape("first candidate has no parts".into()))?;
        part.text
            .as_deref()
            .ok_or_else(|| ClaimDocError::EnvelopeShape("first part has no text".into()))
    }
}
