use serde_json::Value;
use tracing::{debug, info, instrument};

use crate::auth::{CachedTokenProvider, TokenProvider};
use crate::backend::request::{GenerateContentRequest, GenerationOptions, SafetyThreshold};
use crate::backend::{check_response_status, handle_http_error, read_json_body};
use crate::config::Config;
use crate::error::{ClaimDocError, Result};

/// Client for the Vertex AI `generateContent` endpoint.
///
/// Sends exactly one request per call with no retry. The bearer token is cached
/// across calls and refreshed when it nears expiry.
///
/// # Examples
///
/// ```no_run
/// # use claimdoc::{Config, Variant, VertexClient, auth::StaticToken};
/// # fn example() -> claimdoc::Result<()> {
/// let config = Config::from_env(Variant::Inline)?;
/// let client = VertexClient::new(config, Box::new(StaticToken::new("ya29...")))?
///     .temperature(0.2);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct VertexClient {
    config: Config,
    options: GenerationOptions,
    client: reqwest::Client,
    tokens: CachedTokenProvider,
    url: String,
}

impl VertexClient {
    #[instrument(name = "vertex_client_new", skip_all, fields(model = %config.model_id))]
    pub fn new(config: Config, tokens: Box<dyn TokenProvider>) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(ClaimDocError::Http)?;
        let url = config.endpoint_url();

        info!(
            model = %config.model_id,
            location = %config.location,
            timeout = ?config.timeout,
            "Created Vertex AI client"
        );

        Ok(Self {
            config,
            options: GenerationOptions::default(),
            client,
            tokens: CachedTokenProvider::new(tokens),
            url,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn options(&self) -> &GenerationOptions {
        &self.options
    }

    /// Replace all generation options at once.
    pub fn generation_options(mut self, options: GenerationOptions) -> Self {
        self.options = options;
        self
    }

    #[instrument(skip(self))]
    pub fn temperature(mut self, temp: f64) -> Self {
        debug!(
            previous_temp = self.options.temperature,
            new_temp = temp,
            "Setting temperature"
        );
        self.options.temperature = temp;
        self
    }

    #[instrument(skip(self))]
    pub fn max_output_tokens(mut self, max: u32) -> Self {
        debug!(
            previous_max_tokens = self.options.max_output_tokens,
            new_max_tokens = max,
            "Setting max output tokens"
        );
        self.options.max_output_tokens = max;
        self
    }

    #[instrument(skip(self))]
    pub fn top_p(mut self, top_p: f64) -> Self {
        self.options.top_p = top_p;
        self
    }

    #[instrument(skip(self))]
    pub fn safety_threshold(mut self, threshold: SafetyThreshold) -> Self {
        self.options.safety_threshold = threshold;
        self
    }

    /// POST one request and return the raw response envelope.
    #[instrument(
        name = "vertex_generate_content",
        skip(self, request),
        fields(model = %self.config.model_id)
    )]
    pub async fn generate_content(&self, request: &GenerateContentRequest) -> Result<Value> {
        let token = self.tokens.bearer().await?;

        debug!(url = %self.url, "Sending request to Vertex AI");
        let response = self
            .client
            .post(&self.url)
            .bearer_auth(token)
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await
            .map_err(|e| handle_http_error(e, &self.url))?;

        let response = check_response_status(response).await?;
        debug!("Successfully received response from Vertex AI");
        read_json_body(response).await
    }
}
