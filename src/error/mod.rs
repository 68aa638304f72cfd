use std::path::PathBuf;

use thiserror::Error;

/// Error types for the claimdoc library.
///
/// Each stage of processing a claim document fails with its own variant, so a caller
/// can tell a missing configuration key apart from a malformed model response without
/// inspecting message text.
///
/// # Examples
///
/// ```
/// use claimdoc::{ClaimDocError, Result};
///
/// fn doc_type(value: &serde_json::Value) -> Result<&str> {
///     value
///         .get("docType")
///         .and_then(|v| v.as_str())
///         .ok_or_else(|| ClaimDocError::FieldMissing("docType".into()))
/// }
///
/// let value = serde_json::json!({ "docTitle": "Invoice" });
/// match doc_type(&value) {
///     Ok(t) => println!("type: {}", t),
///     Err(ClaimDocError::FieldMissing(key)) => println!("model omitted {}", key),
///     Err(e) => println!("unexpected error: {}", e),
/// }
/// ```
#[derive(Error, Debug)]
pub enum ClaimDocError {
    /// One or more required environment variables are absent
    #[error("Missing required configuration: {}", .keys.join(", "))]
    ConfigurationMissing { keys: Vec<String> },

    /// The identity provider could not issue or refresh a bearer token
    #[error("Credential error: {0}")]
    Credential(String),

    /// Network-level failure or a non-success HTTP status
    #[error("Transport error{}: {message}", .status.map(|s| format!(" (HTTP {})", s)).unwrap_or_default())]
    Transport { status: Option<u16>, message: String },

    /// Operation timed out
    #[error("Timeout error")]
    Timeout,

    /// The response envelope lacks the candidate/content/part chain
    #[error("Unexpected response envelope: {0}")]
    EnvelopeShape(String),

    /// The model's text output is not a JSON object
    #[error("Model response is not JSON: {source}")]
    ResponseNotJson {
        text: String,
        #[source]
        source: serde_json::Error,
    },

    /// The parsed model output lacks an expected key
    #[error("Model response is missing field: {0}")]
    FieldMissing(String),

    /// A local document could not be read
    #[error("Failed to read document {}: {source}", .path.display())]
    DocumentRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The side file listing documents could not be read
    #[error("Failed to read file list {}: {source}", .path.display())]
    FileList {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// No MIME type could be determined for a document
    #[error("Cannot determine MIME type for {0}")]
    UnknownMimeType(String),

    /// A response dump could not be written
    #[error("Failed to write response dump {}: {source}", .path.display())]
    DumpWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// HTTP client error (from reqwest)
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization error (from serde_json)
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ClaimDocError {
    /// Short stable name of the variant, used in log fields and batch summaries.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ConfigurationMissing { .. } => "ConfigurationMissing",
            Self::Credential(_) => "CredentialFailure",
            Self::Transport { .. } => "TransportFailure",
            Self::Timeout => "Timeout",
            Self::EnvelopeShape(_) => "EnvelopeShapeError",
            Self::ResponseNotJson { .. } => "ResponseNotJSON",
            Self::FieldMissing(_) => "FieldMissing",
            Self::DocumentRead { .. } => "DocumentRead",
            Self::FileList { .. } => "FileList",
            Self::UnknownMimeType(_) => "UnknownMimeType",
            Self::DumpWrite { .. } => "DumpWrite",
            Self::Http(_) => "TransportFailure",
            Self::Serialization(_) => "Serialization",
        }
    }
}

/// A specialized Result type for claimdoc operations.
pub type Result<T> = std::result::Result<T, ClaimDocError>;
