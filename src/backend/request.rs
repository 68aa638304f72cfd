use serde::Serialize;

use crate::backend::media::{Document, DocumentSource};

pub const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 2048;
pub const DEFAULT_TEMPERATURE: f64 = 1.0;
pub const DEFAULT_TOP_P: f64 = 0.95;
pub const DEFAULT_RESPONSE_MIME_TYPE: &str = "text/plain";

/// Body of a `generateContent` call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    pub system_instruction: SystemInstruction,
    pub generation_config: GenerationConfig,
    pub safety_settings: Vec<SafetySetting>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Content {
    pub role: String,
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SystemInstruction {
    pub parts: Vec<Part>,
}

/// A single request part. Serializes as `{"inlineData": ...}`, `{"fileData": ...}`
/// or `{"text": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Part {
    InlineData(InlineData),
    FileData(FileData),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    pub mime_type: String,
    pub data: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileData {
    pub mime_type: String,
    pub file_uri: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub max_output_tokens: u32,
    pub temperature: f64,
    pub top_p: f64,
    pub response_mime_type: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HarmCategory {
    HarmCategoryHateSpeech,
    HarmCategoryDangerousContent,
    HarmCategorySexuallyExplicit,
    HarmCategoryHarassment,
}

impl HarmCategory {
    pub const ALL: [HarmCategory; 4] = [
        HarmCategory::HarmCategoryHateSpeech,
        HarmCategory::HarmCategoryDangerousContent,
        HarmCategory::HarmCategorySexuallyExplicit,
        HarmCategory::HarmCategoryHarassment,
    ];
}

/// Blocking threshold, from most to least permissive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SafetyThreshold {
    #[default]
    BlockNone,
    BlockOnlyHigh,
    BlockMediumAndAbove,
    BlockLowAndAbove,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SafetySetting {
    pub category: HarmCategory,
    pub threshold: SafetyThreshold,
}

/// Sampling and safety knobs applied to every request of a run.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationOptions {
    pub max_output_tokens: u32,
    pub temperature: f64,
    pub top_p: f64,
    pub response_mime_type: String,
    pub safety_threshold: SafetyThreshold,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            max_output_tokens: DEFAULT_MAX_OUTPUT_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
            top_p: DEFAULT_TOP_P,
            response_mime_type: DEFAULT_RESPONSE_MIME_TYPE.to_string(),
            safety_threshold: SafetyThreshold::BlockNone,
        }
    }
}

impl From<&Document> for Part {
    fn from(doc: &Document) -> Self {
        match &doc.source {
            DocumentSource::Inline { data } => Part::InlineData(InlineData {
                mime_type: doc.mime_type.clone(),
                data: data.clone(),
            }),
            DocumentSource::Uri { uri } => Part::FileData(FileData {
                mime_type: doc.mime_type.clone(),
                file_uri: uri.clone(),
            }),
        }
    }
}

impl GenerateContentRequest {
    /// Build the request for one document: a single `user` turn holding the
    /// document part followed by the prompt text.
    pub fn for_document(
        document: &Document,
        prompt: &str,
        system_instruction: &str,
        options: &GenerationOptions,
    ) -> Self {
        Self {
            contents: vec![Content {
                role: "user".to_string(),
                parts: vec![Part::from(document), Part::Text(prompt.to_string())],
            }],
            system_instruction: SystemInstruction {
                parts: vec![Part::Text(system_instruction.to_string())],
            },
            generation_config: GenerationConfig {
                max_output_tokens: options.max_output_tokens,
                temperature: options.temperature,
                top_p: options.top_p,
                response_mime_type: options.response_mime_type.clone(),
            },
            safety_settings: HarmCategory::ALL
                .iter()
                .map(|&category| SafetySetting {
                    category,
                    threshold: options.safety_threshold,
                })
                .collect(),
        }
    }
}
