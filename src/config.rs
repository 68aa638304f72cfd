//! Process configuration, read once at startup and passed by reference.

use std::path::PathBuf;
use std::time::Duration;

use tracing::{debug, info};

use crate::error::{ClaimDocError, Result};

pub const PROJECT_ID_VAR: &str = "PROJECT_ID";
pub const FILES_URL_VAR: &str = "FILES_URL";
pub const LOCATION_VAR: &str = "LOCATION";
pub const MODEL_ID_VAR: &str = "MODEL_ID";
pub const API_BASE_VAR: &str = "VERTEX_API_BASE";
pub const DOCS_PATH_VAR: &str = "DOCS_PATH";

pub const DEFAULT_LOCATION: &str = "us-central1";
pub const DEFAULT_MODEL_ID: &str = "gemini-1.5-flash-001";
pub const DEFAULT_DOCS_PATH: &str = "docs/";

/// Where documents come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Variant {
    /// Read files from a local directory and send their bytes inline.
    #[default]
    Inline,
    /// Reference files already staged under a cloud-storage prefix.
    Storage,
}

/// Validated configuration for one run.
#[derive(Debug, Clone)]
pub struct Config {
    pub project_id: String,
    pub location: String,
    pub model_id: String,
    /// Scheme and host of the inference endpoint, without trailing slash
    pub api_base: String,
    pub variant: Variant,
    /// Storage prefix such as `gs://bucket/claims/`; set for [`Variant::Storage`]
    pub files_url: Option<String>,
    pub docs_path: PathBuf,
    pub timeout: Option<Duration>,
}

impl Config {
    /// Read configuration from the process environment.
    ///
    /// Every missing required key is reported in one
    /// [`ClaimDocError::ConfigurationMissing`], not just the first.
    pub fn from_env(variant: Variant) -> Result<Self> {
        Self::from_lookup(variant, |key| std::env::var(key).ok())
    }

    /// Read configuration through an arbitrary key lookup.
    ///
    /// Empty values count as missing.
    pub fn from_lookup<F>(variant: Variant, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

        let mut missing = Vec::new();
        let project_id = get(PROJECT_ID_VAR);
        if project_id.is_none() {
            missing.push(PROJECT_ID_VAR.to_string());
        }
        let files_url = get(FILES_URL_VAR);
        if variant == Variant::Storage && files_url.is_none() {
            missing.push(FILES_URL_VAR.to_string());
        }
        let Some(project_id) = project_id else {
            return Err(ClaimDocError::ConfigurationMissing { keys: missing });
        };
        if !missing.is_empty() {
            return Err(ClaimDocError::ConfigurationMissing { keys: missing });
        }

        let location = get(LOCATION_VAR).unwrap_or_else(|| DEFAULT_LOCATION.to_string());
        let model_id = get(MODEL_ID_VAR).unwrap_or_else(|| DEFAULT_MODEL_ID.to_string());
        let api_base = get(API_BASE_VAR)
            .map(|base| base.trim_end_matches('/').to_string())
            .unwrap_or_else(|| default_api_base(&location));
        let docs_path = get(DOCS_PATH_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DOCS_PATH));

        let config = Config {
            project_id,
            location,
            model_id,
            api_base,
            variant,
            files_url: if variant == Variant::Storage {
                files_url
            } else {
                None
            },
            docs_path,
            timeout: None,
        };

        info!(
            project_id = %config.project_id,
            location = %config.location,
            model = %config.model_id,
            variant = ?config.variant,
            "configurations initialized"
        );
        Ok(config)
    }

    /// Full `generateContent` URL for the configured project and model.
    pub fn endpoint_url(&self) -> String {
        let url = format!(
            "{}/v1/projects/{}/locations/{}/publishers/google/models/{}:generateContent",
            self.api_base, self.project_id, self.location, self.model_id
        );
        debug!(url = %url, "Resolved endpoint URL");
        url
    }

    /// Override the model id.
    pub fn with_model(mut self, model_id: impl Into<String>) -> Self {
        self.model_id = model_id.into();
        self
    }

    /// Override the location. The default endpoint host follows the location;
    /// an explicit `VERTEX_API_BASE` does not.
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        let location = location.into();
        if self.api_base == default_api_base(&self.location) {
            self.api_base = default_api_base(&location);
        }
        self.location = location;
        self
    }

    pub fn with_docs_path(mut self, docs_path: impl Into<PathBuf>) -> Self {
        self.docs_path = docs_path.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

fn default_api_base(location: &str) -> String {
    format!("https://{}-aiplatform.googleapis.com", location)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_missing_project_id() {
        let err = Config::from_lookup(Variant::Inline, lookup(&[])).unwrap_err();
        match err {
            ClaimDocError::ConfigurationMissing { keys } => {
                assert_eq!(keys, vec!["PROJECT_ID".to_string()]);
            }
            other => panic!("Expected ConfigurationMissing, got {:?}", other),
        }
    }

    #[test]
    fn test_storage_variant_reports_all_missing_keys() {
        let err = Config::from_lookup(Variant::Storage, lookup(&[])).unwrap_err();
        match err {
            ClaimDocError::ConfigurationMissing { keys } => {
                assert_eq!(keys, vec!["PROJECT_ID".to_string(), "FILES_URL".to_string()]);
            }
            other => panic!("Expected ConfigurationMissing, got {:?}", other),
        }
    }

    #[test]
    fn test_storage_variant_requires_files_url() {
        let err = Config::from_lookup(Variant::Storage, lookup(&[("PROJECT_ID", "demo")]))
            .unwrap_err();
        assert!(matches!(
            err,
            ClaimDocError::ConfigurationMissing { ref keys } if keys == &["FILES_URL".to_string()]
        ));
    }

    #[test]
    fn test_empty_value_counts_as_missing() {
        let err = Config::from_lookup(Variant::Inline, lookup(&[("PROJECT_ID", "")])).unwrap_err();
        assert_eq!(err.kind(), "ConfigurationMissing");
    }

    #[test]
    fn test_defaults_and_endpoint() {
        let config = Config::from_lookup(Variant::Inline, lookup(&[("PROJECT_ID", "demo")]))
            .expect("config should load");
        assert_eq!(config.location, "us-central1");
        assert_eq!(config.model_id, "gemini-1.5-flash-001");
        assert_eq!(config.docs_path, PathBuf::from("docs/"));
        assert!(config.files_url.is_none());
        assert_eq!(
            config.endpoint_url(),
            "https://us-central1-aiplatform.googleapis.com/v1/projects/demo/locations/us-central1/publishers/google/models/gemini-1.5-flash-001:generateContent"
        );
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(
            Variant::Storage,
            lookup(&[
                ("PROJECT_ID", "demo"),
                ("FILES_URL", "gs://bucket/claims/"),
                ("VERTEX_API_BASE", "http://127.0.0.1:9000/"),
                ("MODEL_ID", "gemini-1.5-pro-002"),
            ]),
        )
        .expect("config should load");
        assert_eq!(config.files_url.as_deref(), Some("gs://bucket/claims/"));
        assert_eq!(
            config.endpoint_url(),
            "http://127.0.0.1:9000/v1/projects/demo/locations/us-central1/publishers/google/models/gemini-1.5-pro-002:generateContent"
        );
    }

    #[test]
    fn test_location_override_moves_default_host() {
        let config = Config::from_lookup(Variant::Inline, lookup(&[("PROJECT_ID", "demo")]))
            .expect("config should load")
            .with_location("asia-southeast1");
        assert_eq!(
            config.api_base,
            "https://asia-southeast1-aiplatform.googleapis.com"
        );
    }
}
