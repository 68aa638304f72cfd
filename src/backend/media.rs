use std::path::Path;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use tracing::{debug, instrument};

use crate::config::{Config, Variant};
use crate::error::{ClaimDocError, Result};

/// How the document content reaches the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentSource {
    /// Base64-encoded file bytes carried in the request body
    Inline { data: String },
    /// Reference to an object already in cloud storage
    Uri { uri: String },
}

/// One document to send, with an explicit MIME type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// Name as it appeared in the file list
    pub name: String,
    pub mime_type: String,
    pub source: DocumentSource,
}

impl Document {
    pub fn from_bytes(name: impl Into<String>, bytes: &[u8], mime_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            source: DocumentSource::Inline {
                data: STANDARD.encode(bytes),
            },
        }
    }

    pub fn from_uri(
        name: impl Into<String>,
        uri: impl Into<String>,
        mime_type: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            source: DocumentSource::Uri { uri: uri.into() },
        }
    }

    /// Resolve `name` against the configured source.
    ///
    /// Inline documents are read from `docs_path`; storage documents become
    /// `files_url + name` without any path normalization.
    #[instrument(skip(config), fields(variant = ?config.variant))]
    pub async fn load(name: &str, config: &Config, mime_override: Option<&str>) -> Result<Self> {
        let mime_type = resolve_mime_type(name, mime_override)?;
        match config.variant {
            Variant::Inline => {
                let path = config.docs_path.join(name);
                let bytes = tokio::fs::read(&path)
                    .await
                    .map_err(|source| ClaimDocError::DocumentRead {
                        path: path.clone(),
                        source,
                    })?;
                debug!(path = %path.display(), bytes = bytes.len(), "Read local document");
                Ok(Self::from_bytes(name, &bytes, mime_type))
            }
            Variant::Storage => {
                let prefix = config.files_url.as_deref().ok_or_else(|| {
                    ClaimDocError::ConfigurationMissing {
                        keys: vec![crate::config::FILES_URL_VAR.to_string()],
                    }
                })?;
                let uri = format!("{}{}", prefix, name);
                debug!(uri = %uri, "Referencing staged document");
                Ok(Self::from_uri(name, uri, mime_type))
            }
        }
    }
}

/// Pick the MIME type for a document: an explicit override wins, otherwise the
/// file extension decides.
pub fn resolve_mime_type(name: &str, mime_override: Option<&str>) -> Result<String> {
    if let Some(mime) = mime_override.filter(|m| !m.is_empty()) {
        return Ok(mime.to_string());
    }
    mime_guess::from_path(Path::new(name))
        .first()
        .map(|mime| mime.essence_str().to_string())
        .ok_or_else(|| ClaimDocError::UnknownMimeType(name.to_string()))
}
