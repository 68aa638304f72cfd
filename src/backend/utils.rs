use std::path::{Path, PathBuf};

use reqwest::Response;
use serde_json::Value;
use tracing::{debug, error, info};

use crate::error::{ClaimDocError, Result};

/// Convert a reqwest error into a transport error, handling timeouts specially.
pub fn handle_http_error(e: reqwest::Error, endpoint: &str) -> ClaimDocError {
    error!(error = %e, endpoint = endpoint, "HTTP request failed");
    if e.is_timeout() {
        ClaimDocError::Timeout
    } else {
        ClaimDocError::Transport {
            status: None,
            message: e.to_string(),
        }
    }
}

/// Check HTTP response status and surface the error body if unsuccessful.
pub async fn check_response_status(response: Response) -> Result<Response> {
    if !response.status().is_success() {
        let status = response.status();
        let error_text = response.text().await.map_err(|e| ClaimDocError::Transport {
            status: Some(status.as_u16()),
            message: format!("failed to read error body: {}", e),
        })?;
        error!(
            status = %status,
            error = %error_text,
            "Inference endpoint returned error response"
        );
        return Err(ClaimDocError::Transport {
            status: Some(status.as_u16()),
            message: error_text,
        });
    }
    Ok(response)
}

/// Decode a successful response body as JSON. A body that is not JSON at all
/// cannot carry the candidate chain and is reported as an envelope error.
pub async fn read_json_body(response: Response) -> Result<Value> {
    let body = response.text().await.map_err(|e| ClaimDocError::Transport {
        status: None,
        message: format!("failed to read response body: {}", e),
    })?;
    serde_json::from_str(&body).map_err(|e| {
        error!(error = %e, "Response body is not JSON");
        ClaimDocError::EnvelopeShape(format!("response body is not JSON: {}", e))
    })
}

/// File name used when dumping a raw response: dots and spaces in the document
/// name become underscores, followed by `_gemini_<model>.json`.
pub fn dump_file_name(document_name: &str, model_id: &str) -> String {
    let sanitized = document_name.replace(['.', ' '], "_");
    format!("{}_gemini_{}.json", sanitized, model_id)
}

/// Write a raw response envelope under `dir`, keeping non-ASCII text unescaped.
pub async fn write_response_dump(
    dir: &Path,
    document_name: &str,
    model_id: &str,
    envelope: &Value,
) -> Result<PathBuf> {
    let path = dir.join(dump_file_name(document_name, model_id));
    let body = serde_json::to_vec_pretty(envelope)?;
    tokio::fs::write(&path, body)
        .await
        .map_err(|source| ClaimDocError::DumpWrite {
            path: path.clone(),
            source,
        })?;
    debug!(path = %path.display(), "Response dump written");
    info!("written json response to file");
    Ok(path)
}
