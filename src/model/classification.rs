use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, error};

use crate::error::{ClaimDocError, Result};

/// The model's verdict on one document.
///
/// Only `doc_type` is required. The descriptive keys are kept when present;
/// a non-string value (for example a list of sections) is stored as its JSON text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassificationResult {
    pub doc_title: Option<String>,
    pub organization: Option<String>,
    pub doc_type: String,
    pub description: Option<String>,
    pub explanation: Option<String>,
}

/// Free-text answer of the extraction task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractionResult {
    pub text: String,
}

impl ClassificationResult {
    /// Parse the model's text output.
    ///
    /// The text must be a JSON object as-is. Markdown fences are not stripped,
    /// so fenced output is reported as [`ClaimDocError::ResponseNotJson`].
    pub fn parse(text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text).map_err(|source| {
            error!(error = %source, "Model output is not valid JSON");
            ClaimDocError::ResponseNotJson {
                text: text.to_string(),
                source,
            }
        })?;

        let Value::Object(object) = value else {
            return Err(ClaimDocError::ResponseNotJson {
                text: text.to_string(),
                source: <serde_json::Error as serde::de::Error>::custom(
                    "expected a JSON object",
                ),
            });
        };

        let doc_type = match object.get("docType") {
            Some(Value::String(doc_type)) => doc_type.clone(),
            _ => return Err(ClaimDocError::FieldMissing("docType".to_string())),
        };
        debug!(doc_type = %doc_type, "Parsed classification");

        Ok(Self {
            doc_title: text_field(&object, "docTitle"),
            organization: text_field(&object, "organization"),
            doc_type,
            description: text_field(&object, "description"),
            explanation: text_field(&object, "explanation"),
        })
    }
}

fn text_field(object: &Map<String, Value>, key: &str) -> Option<String> {
    match object.get(key)? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_result() {
        let text = r#"{
            "docTitle": "Official Receipt",
            "organization": "Queen Mary Hospital",
            "docType": "Medical Invoice",
            "description": "Itemized bill",
            "explanation": "Contains billing items"
        }"#;
        let result = ClassificationResult::parse(text).unwrap();
        assert_eq!(result.doc_type, "Medical Invoice");
        assert_eq!(result.organization.as_deref(), Some("Queen Mary Hospital"));
    }

    #[test]
    fn test_doc_type_is_verbatim() {
        let result = ClassificationResult::parse(r#"{"docType": "  medical REPORT "}"#).unwrap();
        assert_eq!(result.doc_type, "  medical REPORT ");
        assert_eq!(result.doc_title, None);
    }

    #[test]
    fn test_markdown_fence_is_not_json() {
        let text = "```json\n{\"docType\": \"Invoice\"}\n```";
        let err = ClassificationResult::parse(text).unwrap_err();
        match err {
            ClaimDocError::ResponseNotJson { text: raw, .. } => assert!(raw.starts_with("```")),
            other => panic!("Expected ResponseNotJson, got {:?}", other),
        }
    }

    #[test]
    fn test_non_object_is_not_json() {
        let err = ClassificationResult::parse(r#"["docType"]"#).unwrap_err();
        assert!(matches!(err, ClaimDocError::ResponseNotJson { .. }));
    }

    #[test]
    fn test_missing_doc_type() {
        let err = ClassificationResult::parse(r#"{"docTitle": "Receipt"}"#).unwrap_err();
        assert!(matches!(err, ClaimDocError::FieldMissing(ref k) if k == "docType"));

        let err = ClassificationResult::parse(r#"{"docType": 7}"#).unwrap_err();
        assert!(matches!(err, ClaimDocError::FieldMissing(_)));
    }

    #[test]
    fn test_structured_description_kept_as_json_text() {
        let text = r#"{"docType": "Claim Form", "description": ["header", "items"], "organization": null}"#;
        let result = ClassificationResult::parse(text).unwrap();
        assert_eq!(result.description.as_deref(), Some(r#"["header","items"]"#));
        assert_eq!(result.organization, None);
    }
}
