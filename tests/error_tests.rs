#[cfg(test)]
mod error_tests {
    use claimdoc::{ClaimDocError, ClassificationResult, Config, Result, Variant};
    use serde_json::json;
    use wiremock::matchers::any;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_credential_error() {
        let err = ClaimDocError::Credential("gcloud not logged in".to_string());
        assert_eq!(format!("{}", err), "Credential error: gcloud not logged in");
    }

    #[test]
    fn test_envelope_error() {
        let err = ClaimDocError::EnvelopeShape("no candidates in response".to_string());
        assert_eq!(
            format!("{}", err),
            "Unexpected response envelope: no candidates in response"
        );
    }

    #[test]
    fn test_field_missing_error() {
        let err = ClaimDocError::FieldMissing("docType".to_string());
        assert_eq!(format!("{}", err), "Model response is missing field: docType");
    }

    #[test]
    fn test_from_json_error() {
        let json_err = serde_json::from_value::<String>(json!(42)).unwrap_err();
        let err: ClaimDocError = json_err.into();
        match err {
            ClaimDocError::Serialization(_) => {}
            other => panic!("Expected Serialization, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_errors_are_distinct() {
        let not_json = ClassificationResult::parse("The document is an invoice.").unwrap_err();
        let missing = ClassificationResult::parse(r#"{"docTitle": "Invoice"}"#).unwrap_err();
        assert_eq!(not_json.kind(), "ResponseNotJSON");
        assert_eq!(missing.kind(), "FieldMissing");
    }

    #[test]
    fn test_result_type() {
        let ok_result: Result<i32> = Ok(42);
        assert!(matches!(ok_result, Ok(42)));

        let err_result: Result<i32> = Err(ClaimDocError::Timeout);
        assert!(err_result.is_err());
    }

    #[tokio::test]
    async fn test_missing_project_id_before_any_request() {
        let server = MockServer::start().await;
        Mock::given(any())
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let uri = server.uri();
        let err = Config::from_lookup(Variant::Inline, |key| match key {
            "VERTEX_API_BASE" => Some(uri.clone()),
            _ => None,
        })
        .unwrap_err();

        match err {
            ClaimDocError::ConfigurationMissing { keys } => assert_eq!(keys, vec!["PROJECT_ID"]),
            other => panic!("Expected ConfigurationMissing, got {:?}", other),
        }
    }
}
