//! claimdoc: classify medical-claim documents with a multimodal Vertex AI model
//!
//! # Overview
//!
//! Each document named in a comma-separated file list is sent to the Gemini
//! `generateContent` endpoint together with a fixed prompt and system instruction.
//! The model's text answer is parsed as JSON and its `docType` reported.
//!
//! - Typed request and response envelopes (`backend`)
//! - Inline base64 documents or cloud-storage references
//! - Bearer tokens from Application Default Credentials, gcloud or the environment,
//!   cached per run
//! - Distinct errors for configuration, credentials, transport, envelope shape,
//!   non-JSON output and missing fields
//! - Sequential or bounded-concurrent batches with per-document error isolation
//!
//! # Quick Start
//!
//! ```no_run
//! use claimdoc::{Config, DocumentClassifier, Variant, VertexClient, auth::CredentialSource};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_env(Variant::Inline)?;
//!     let client = VertexClient::new(config, CredentialSource::Auto.into_provider())?;
//!     let classifier = DocumentClassifier::new(client);
//!
//!     let (_, result) = classifier.classify("bill 1.pdf").await?;
//!     println!("bill 1.pdf document type is: {}", result.doc_type);
//!     Ok(())
//! }
//! ```
pub mod auth;
pub mod backend;
pub mod batch;
pub mod classifier;
pub mod config;
mod error;
#[cfg(feature = "logging")]
pub mod logging;
pub mod model;
pub mod prompts;

// Re-exports for convenience
pub use backend::{Document, GenerateContentRequest, GenerationOptions, VertexClient};
pub use batch::{BatchOptions, BatchSummary, DocumentOutcome, read_file_list, run_batch};
pub use classifier::{DocumentClassifier, DocumentTask, TaskOutput};
pub use config::{Config, Variant};
pub use error::{ClaimDocError, Result};
pub use model::{ClassificationResult, ExtractionResult};
pub use prompts::Task;
