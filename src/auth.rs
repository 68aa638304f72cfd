//! Bearer-token acquisition for the inference endpoint.
//!
//! A [`TokenProvider`] fetches a token from an ambient identity source. The
//! [`CachedTokenProvider`] holds one token for the whole run and refreshes it
//! shortly before it expires.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use gcloud_sdk::{BoxSource, Source, TokenSourceType, create_source};
use tokio::process::Command;
use tokio::sync::{Mutex, OnceCell};
use tracing::{debug, error, info, instrument};

use crate::error::{ClaimDocError, Result};

pub const ACCESS_TOKEN_VAR: &str = "GOOGLE_OAUTH_ACCESS_TOKEN";
pub const KEY_FILE_VAR: &str = "GOOGLE_APPLICATION_CREDENTIALS";
/// Scope requested for Application Default Credentials.
pub const CLOUD_PLATFORM_SCOPE: &str = "https://www.googleapis.com/auth/cloud-platform";

/// Lifetime assumed for tokens whose source does not report one.
const ASSUMED_TOKEN_LIFETIME: Duration = Duration::from_secs(55 * 60);
const DEFAULT_REFRESH_MARGIN: Duration = Duration::from_secs(60);

/// A bearer token and when it stops being valid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessToken {
    pub token: String,
    /// `None` means the token is never refreshed
    pub expires_at: Option<Instant>,
}

impl AccessToken {
    pub fn new(token: impl Into<String>, expires_at: Option<Instant>) -> Self {
        Self {
            token: token.into(),
            expires_at,
        }
    }

    /// True when the token expires within `margin` from now.
    pub fn expires_within(&self, margin: Duration) -> bool {
        match self.expires_at {
            Some(at) => Instant::now() + margin >= at,
            None => false,
        }
    }
}

/// Source of bearer tokens.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Obtain a fresh token.
    async fn fetch_token(&self) -> Result<AccessToken>;

    /// Name used in logs.
    fn name(&self) -> &'static str;
}

/// A token supplied up front, typically from `GOOGLE_OAUTH_ACCESS_TOKEN`.
#[derive(Clone)]
pub struct StaticToken {
    token: String,
}

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

impl std::fmt::Debug for StaticToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticToken").finish_non_exhaustive()
    }
}

#[async_trait]
impl TokenProvider for StaticToken {
    async fn fetch_token(&self) -> Result<AccessToken> {
        if self.token.is_empty() {
            return Err(ClaimDocError::Credential("static access token is empty".into()));
        }
        Ok(AccessToken::new(self.token.clone(), None))
    }

    fn name(&self) -> &'static str {
        "static"
    }
}

/// Runs `gcloud auth print-access-token` using the developer's gcloud login.
#[derive(Debug, Clone)]
pub struct GcloudCli {
    program: String,
}

impl Default for GcloudCli {
    fn default() -> Self {
        Self {
            program: "gcloud".to_string(),
        }
    }
}

impl GcloudCli {
    /// Use a different executable, e.g. a full path to `gcloud`.
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

#[async_trait]
impl TokenProvider for GcloudCli {
    #[instrument(skip(self), fields(program = %self.program))]
    async fn fetch_token(&self) -> Result<AccessToken> {
        let output = Command::new(&self.program)
            .args(["auth", "print-access-token"])
            .output()
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to run gcloud");
                ClaimDocError::Credential(format!("failed to run {}: {}", self.program, e))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ClaimDocError::Credential(format!(
                "{} auth print-access-token failed: {}",
                self.program,
                stderr.trim()
            )));
        }

        let token = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if token.is_empty() {
            return Err(ClaimDocError::Credential(
                "gcloud returned an empty access token".into(),
            ));
        }
        debug!("Obtained access token from gcloud");
        Ok(AccessToken::new(
            token,
            Some(Instant::now() + ASSUMED_TOKEN_LIFETIME),
        ))
    }

    fn name(&self) -> &'static str {
        "gcloud"
    }
}

/// Application Default Credentials through `gcloud-sdk`.
///
/// With a key file (usually from `GOOGLE_APPLICATION_CREDENTIALS`) the service
/// account in that file is used. Without one the usual ADC chain applies: the
/// environment variable, the gcloud well-known credentials file, then the
/// metadata server.
pub struct ApplicationDefault {
    kind: AdcKind,
    source: OnceCell<BoxSource>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum AdcKind {
    Default,
    KeyFile(PathBuf),
    MetadataServer,
}

impl ApplicationDefault {
    /// Standard ADC lookup chain.
    pub fn new() -> Self {
        Self::with_kind(AdcKind::Default)
    }

    /// Service-account key file.
    pub fn from_key_file(path: impl Into<PathBuf>) -> Self {
        Self::with_kind(AdcKind::KeyFile(path.into()))
    }

    /// Compute Engine / Cloud Run metadata server only.
    pub fn metadata_server() -> Self {
        Self::with_kind(AdcKind::MetadataServer)
    }

    fn with_kind(kind: AdcKind) -> Self {
        Self {
            kind,
            source: OnceCell::new(),
        }
    }

    fn source_type(&self) -> TokenSourceType {
        match &self.kind {
            AdcKind::Default => TokenSourceType::Default,
            AdcKind::KeyFile(path) => TokenSourceType::File(path.clone()),
            AdcKind::MetadataServer => TokenSourceType::MetadataServer,
        }
    }

    fn describe(&self) -> String {
        match &self.kind {
            AdcKind::Default => "application default credentials".to_string(),
            AdcKind::KeyFile(path) => format!("key file {}", path.display()),
            AdcKind::MetadataServer => "metadata server".to_string(),
        }
    }
}

impl Default for ApplicationDefault {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ApplicationDefault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApplicationDefault")
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl TokenProvider for ApplicationDefault {
    #[instrument(skip(self), fields(source = %self.describe()))]
    async fn fetch_token(&self) -> Result<AccessToken> {
        let source = self
            .source
            .get_or_try_init(|| async {
                create_source(self.source_type(), vec![CLOUD_PLATFORM_SCOPE.to_string()])
                    .await
                    .map_err(|e| {
                        error!(error = %e, "Failed to load credentials");
                        ClaimDocError::Credential(format!(
                            "cannot load {}: {}",
                            self.describe(),
                            e
                        ))
                    })
            })
            .await?;

        let token = source.token().await.map_err(|e| {
            ClaimDocError::Credential(format!(
                "{} did not issue a token: {}",
                self.describe(),
                e
            ))
        })?;

        let header = token.header_value();
        let bearer = header
            .strip_prefix("Bearer ")
            .unwrap_or(header.as_str())
            .to_string();
        if bearer.is_empty() {
            return Err(ClaimDocError::Credential(format!(
                "{} returned an empty access token",
                self.describe()
            )));
        }
        debug!("Obtained access token from application default credentials");
        Ok(AccessToken::new(
            bearer,
            Some(Instant::now() + ASSUMED_TOKEN_LIFETIME),
        ))
    }

    fn name(&self) -> &'static str {
        match self.kind {
            AdcKind::MetadataServer => "metadata",
            _ => "application-default",
        }
    }
}

/// Which ambient source to draw tokens from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CredentialSource {
    /// `GOOGLE_OAUTH_ACCESS_TOKEN` when set, otherwise Application Default Credentials
    #[default]
    Auto,
    Gcloud,
    Metadata,
}

impl CredentialSource {
    /// Build the provider, reading the process environment.
    pub fn into_provider(self) -> Box<dyn TokenProvider> {
        self.into_provider_with(|key| std::env::var(key).ok())
    }

    /// Build the provider, reading variables through `lookup`.
    pub fn into_provider_with<F>(self, lookup: F) -> Box<dyn TokenProvider>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.is_empty());
        match self {
            CredentialSource::Auto => {
                if let Some(token) = non_empty(ACCESS_TOKEN_VAR) {
                    Box::new(StaticToken::new(token))
                } else if let Some(path) = non_empty(KEY_FILE_VAR) {
                    Box::new(ApplicationDefault::from_key_file(path))
                } else {
                    Box::new(ApplicationDefault::new())
                }
            }
            CredentialSource::Gcloud => Box::new(GcloudCli::default()),
            CredentialSource::Metadata => Box::new(ApplicationDefault::metadata_server()),
        }
    }
}

/// Holds the single token reused across documents.
pub struct CachedTokenProvider {
    inner: Box<dyn TokenProvider>,
    cached: Mutex<Option<AccessToken>>,
    refresh_margin: Duration,
}

impl CachedTokenProvider {
    pub fn new(inner: Box<dyn TokenProvider>) -> Self {
        Self {
            inner,
            cached: Mutex::new(None),
            refresh_margin: DEFAULT_REFRESH_MARGIN,
        }
    }

    pub fn refresh_margin(mut self, margin: Duration) -> Self {
        self.refresh_margin = margin;
        self
    }

    /// Current bearer token, fetching a new one if none is cached or the cached
    /// one is about to expire.
    pub async fn bearer(&self) -> Result<String> {
        let mut cached = self.cached.lock().await;
        if let Some(token) = cached.as_ref()
            && !token.expires_within(self.refresh_margin)
        {
            return Ok(token.token.clone());
        }

        info!(source = self.inner.name(), "Refreshing access token");
        let fresh = self.inner.fetch_token().await?;
        let bearer = fresh.token.clone();
        *cached = Some(fresh);
        Ok(bearer)
    }
}

impl std::fmt::Debug for CachedTokenProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachedTokenProvider")
            .field("source", &self.inner.name())
            .field("refresh_margin", &self.refresh_margin)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingProvider {
        calls: Arc<AtomicUsize>,
        lifetime: Duration,
    }

    #[async_trait]
    impl TokenProvider for CountingProvider {
        async fn fetch_token(&self) -> Result<AccessToken> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(AccessToken::new(
                format!("token-{}", n),
                Some(Instant::now() + self.lifetime),
            ))
        }

        fn name(&self) -> &'static str {
            "counting"
        }
    }

    #[tokio::test]
    async fn test_token_reused_until_near_expiry() {
        let calls = Arc::new(AtomicUsize::new(0));
        let cache = CachedTokenProvider::new(Box::new(CountingProvider {
            calls: calls.clone(),
            lifetime: Duration::from_secs(3600),
        }));

        assert_eq!(cache.bearer().await.unwrap(), "token-1");
        assert_eq!(cache.bearer().await.unwrap(), "token-1");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_expiring_token_is_refreshed() {
        let calls = Arc::new(AtomicUsize::new(0));
        let cache = CachedTokenProvider::new(Box::new(CountingProvider {
            calls: calls.clone(),
            lifetime: Duration::from_secs(30),
        }))
        .refresh_margin(Duration::from_secs(60));

        assert_eq!(cache.bearer().await.unwrap(), "token-1");
        assert_eq!(cache.bearer().await.unwrap(), "token-2");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_static_token() {
        let cache = CachedTokenProvider::new(Box::new(StaticToken::new("abc")));
        assert_eq!(cache.bearer().await.unwrap(), "abc");

        let err = StaticToken::new("").fetch_token().await.unwrap_err();
        assert!(matches!(err, ClaimDocError::Credential(_)));
    }

    #[tokio::test]
    async fn test_missing_gcloud_binary_is_credential_error() {
        let provider = GcloudCli::with_program("gcloud-does-not-exist-on-this-machine");
        let err = provider.fetch_token().await.unwrap_err();
        assert!(matches!(err, ClaimDocError::Credential(_)));
    }

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: Vec<(String, String)> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| {
            vars.iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.clone())
        }
    }

    #[test]
    fn test_auto_prefers_explicit_access_token() {
        let provider = CredentialSource::Auto.into_provider_with(lookup(&[
            (ACCESS_TOKEN_VAR, "ya29.env"),
            (KEY_FILE_VAR, "/secrets/sa.json"),
        ]));
        assert_eq!(provider.name(), "static");
    }

    #[tokio::test]
    async fn test_auto_reads_key_file_from_environment() {
        let dir = tempfile::tempdir().unwrap();
        let key_file = dir.path().join("claims-sa.json");
        std::fs::write(&key_file, "not a service account key").unwrap();
        let key_file = key_file.display().to_string();

        let provider =
            CredentialSource::Auto.into_provider_with(lookup(&[(KEY_FILE_VAR, &key_file)]));
        assert_eq!(provider.name(), "application-default");

        let err = provider.fetch_token().await.unwrap_err();
        match err {
            ClaimDocError::Credential(message) => {
                assert!(message.contains("claims-sa.json"), "message: {}", message)
            }
            other => panic!("expected credential error, got {:?}", other),
        }
    }

    #[test]
    fn test_auto_without_token_falls_back_to_adc_chain() {
        let provider = CredentialSource::Auto.into_provider_with(lookup(&[(ACCESS_TOKEN_VAR, "")]));
        assert_eq!(provider.name(), "application-default");
    }

    #[test]
    fn test_explicit_sources() {
        let none = |_: &str| None;
        assert_eq!(CredentialSource::Gcloud.into_provider_with(none).name(), "gcloud");
        assert_eq!(CredentialSource::Metadata.into_provider_with(none).name(), "metadata");
    }

    #[tokio::test]
    async fn test_missing_key_file_is_credential_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.json");
        let err = ApplicationDefault::from_key_file(&path)
            .fetch_token()
            .await
            .unwrap_err();
        match err {
            ClaimDocError::Credential(message) => {
                assert!(message.contains("absent.json"), "message: {}", message)
            }
            other => panic!("expected credential error, got {:?}", other),
        }
    }

    #[test]
    fn test_token_without_expiry_never_expires() {
        let token = AccessToken::new("t", None);
        assert!(!token.expires_within(Duration::from_secs(u32::MAX as u64)));
    }
}
