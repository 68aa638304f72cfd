//! Per-document classification and extraction on top of [`VertexClient`].

use std::path::PathBuf;

use async_trait::async_trait;
use tracing::{debug, instrument, warn};

use crate::backend::{
    Document, GenerateContentRequest, GenerateContentResponse, VertexClient, write_response_dump,
};
use crate::error::Result;
use crate::model::{ClassificationResult, ExtractionResult};
use crate::prompts::{SYSTEM_INSTRUCTION, Task};

/// Result of running a task on one document.
#[derive(Debug, Clone, PartialEq)]
pub enum TaskOutput {
    Classification {
        /// Model text exactly as returned, before JSON parsing
        raw_text: String,
        result: ClassificationResult,
    },
    Extraction(ExtractionResult),
}

/// Work performed once per file-list entry.
#[async_trait]
pub trait DocumentTask: Send + Sync {
    async fn run(&self, file_name: &str) -> Result<TaskOutput>;
}

/// Sends claim documents to the model with the classification or extraction prompt.
#[derive(Debug)]
pub struct DocumentClassifier {
    client: VertexClient,
    task: Task,
    mime_override: Option<String>,
    dump_dir: Option<PathBuf>,
}

impl DocumentClassifier {
    pub fn new(client: VertexClient) -> Self {
        Self {
            client,
            task: Task::Classify,
            mime_override: None,
            dump_dir: None,
        }
    }

    pub fn task(mut self, task: Task) -> Self {
        self.task = task;
        self
    }

    /// Use this MIME type for every document instead of guessing from the extension.
    pub fn mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_override = Some(mime_type.into());
        self
    }

    /// Write each raw response envelope into `dir`.
    ///
    /// The dump is best effort: a failed write is logged at `warn` and never
    /// turns a successful classification into a failed document.
    pub fn save_responses(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dump_dir = Some(dir.into());
        self
    }

    pub fn client(&self) -> &VertexClient {
        &self.client
    }

    /// Determine the document type of `name`.
    #[instrument(skip(self))]
    pub async fn classify(&self, name: &str) -> Result<(String, ClassificationResult)> {
        debug!("checking document type for {}", name);
        let text = self.generate_text(name, Task::Classify).await?;
        let result = ClassificationResult::parse(&text)?;
        Ok((text, result))
    }

    /// Extract claim details from `name` as free text.
    #[instrument(skip(self))]
    pub async fn extract(&self, name: &str) -> Result<ExtractionResult> {
        debug!("{}: Extract information", name);
        let text = self.generate_text(name, Task::Extract).await?;
        Ok(ExtractionResult { text })
    }

    async fn generate_text(&self, name: &str, task: Task) -> Result<String> {
        let config = self.client.config();
        let document = Document::load(name, config, self.mime_override.as_deref()).await?;
        let request = GenerateContentRequest::for_document(
            &document,
            task.prompt(),
            SYSTEM_INSTRUCTION,
            self.client.options(),
        );

        let envelope = self.client.generate_content(&request).await?;

        if let Some(dir) = &self.dump_dir {
            // A failed dump is not a failed classification.
            if let Err(e) = write_response_dump(dir, name, &config.model_id, &envelope).await {
                warn!(error = %e, "Could not save response");
            }
        }

        let response = GenerateContentResponse::from_value(&envelope)?;
        if let Some(usage) = &response.usage_metadata {
            debug!(
                prompt_tokens = usage.prompt_token_count,
                output_tokens = usage.candidates_token_count,
                "Token usage"
            );
        }
        Ok(response.first_text()?.to_string())
    }
}

#[async_trait]
impl DocumentTask for DocumentClassifier {
    async fn run(&self, file_name: &str) -> Result<TaskOutput> {
        match self.task {
            Task::Classify => {
                let (raw_text, result) = self.classify(file_name).await?;
                Ok(TaskOutput::Classification { raw_text, result })
            }
            Task::Extract => Ok(TaskOutput::Extraction(self.extract(file_name).await?)),
        }
    }
}
