//! Tests for the request/response contract of `AnalysisClient`.

mod common;

use ayushlens::{AnalysisClient, AnalysisError, PrimaryConditionPolicy, Severity};
use common::{ScriptedModel, Step, analysis_json};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

const REQUIRED_FIELDS: [&str; 6] = [
    "primaryCondition",
    "correlationReport",
    "severity",
    "recommendations",
    "disclaimer",
    "summary",
];

#[tokio::test]
async fn test_successful_analysis_is_parsed() {
    let model = Arc::new(ScriptedModel::replying(analysis_json("Common Cold", "Low")));
    let client = AnalysisClient::new(model.clone());

    let result = client
        .analyze("persistent cough, mild fever", None)
        .await
        .expect("analysis should succeed");

    assert_eq!(result.primary_condition, "Common Cold");
    assert_eq!(result.severity, Severity::Low);
    assert!(!result.correlation_report.is_empty());
    assert_eq!(result.recommendations, vec!["Rest", "Hydrate"]);
    assert_eq!(model.calls(), 1);
}

#[tokio::test]
async fn test_every_severity_is_accepted() {
    for severity in Severity::ALL {
        let model = ScriptedModel::replying(analysis_json("Cold", severity.as_str()));
        let result = AnalysisClient::new(model).analyze("cough", None).await.unwrap();
        assert_eq!(result.severity, severity);
    }
}

#[tokio::test]
async fn test_request_without_image() {
    let model = Arc::new(ScriptedModel::replying(analysis_json("Cold", "Low")));
    AnalysisClient::new(model.clone())
        .analyze("persistent cough", None)
        .await
        .unwrap();

    let request = model.last_request().unwrap();
    assert!(request.image.is_none());
    assert!(request.prompt.contains("persistent cough"));
    assert!(request.prompt.contains("No visual evidence provided"));
    assert!(request.system_instruction.contains("Symptom Correlation Engine"));
    assert_eq!(request.response_schema.required_fields(), REQUIRED_FIELDS.to_vec());
}

#[tokio::test]
async fn test_request_with_image_strips_data_uri_prefix() {
    let model = Arc::new(ScriptedModel::replying(analysis_json("Eczema", "Moderate")));
    AnalysisClient::new(model.clone())
        .analyze("itchy rash", Some("data:image/jpeg;base64,/9j/4AAQ"))
        .await
        .unwrap();

    let request = model.last_request().unwrap();
    let image = request.image.expect("image part should be sent");
    assert_eq!(image.mime_type, "image/jpeg");
    assert_eq!(image.data, "/9j/4AAQ");
    assert!(request.prompt.contains("attached visual evidence is required"));
}

#[tokio::test]
async fn test_fenced_payload_is_accepted() {
    let payload = format!("```json\n{}\n```", analysis_json("Cold", "Low"));
    let model = ScriptedModel::new(vec![Step::Text(payload)]);
    let result = AnalysisClient::new(model).analyze("cough", None).await.unwrap();
    assert_eq!(result.primary_condition, "Cold");
}

#[tokio::test]
async fn test_empty_payload_is_invalid_response() {
    let model = ScriptedModel::new(vec![Step::Text(String::new())]);
    let err = AnalysisClient::new(model).analyze("cough", None).await.unwrap_err();
    assert_eq!(err.reason(), "invalid_response");
}

#[tokio::test]
async fn test_non_json_payload_is_invalid_response() {
    let model = ScriptedModel::new(vec![Step::Text("You probably have a cold.".to_string())]);
    let err = AnalysisClient::new(model).analyze("cough", None).await.unwrap_err();
    assert_eq!(err.reason(), "invalid_response");
}

#[tokio::test]
async fn test_each_missing_required_field_is_invalid_response() {
    for field in REQUIRED_FIELDS {
        let mut payload = analysis_json("Cold", "Low");
        payload.as_object_mut().unwrap().remove(field);
        let model = ScriptedModel::replying(payload);

        let err = AnalysisClient::new(model)
            .analyze("cough", None)
            .await
            .expect_err(field);
        assert_eq!(err.reason(), "invalid_response", "missing {}", field);
    }
}

#[tokio::test]
async fn test_each_missing_condition_field_is_invalid_response() {
    for field in ["name", "likelihood", "reason"] {
        let mut payload = analysis_json("Cold", "Low");
        payload["correlationReport"][0]
            .as_object_mut()
            .unwrap()
            .remove(field);
        let model = ScriptedModel::replying(payload);

        let err = AnalysisClient::new(model)
            .analyze("cough", None)
            .await
            .expect_err(field);
        assert_eq!(err.reason(), "invalid_response", "missing {}", field);
    }
}

#[tokio::test]
async fn test_unknown_severity_is_invalid_response() {
    let model = ScriptedModel::replying(analysis_json("Cold", "Critical"));
    let err = AnalysisClient::new(model).analyze("cough", None).await.unwrap_err();
    assert_eq!(err.reason(), "invalid_response");
}

#[tokio::test]
async fn test_empty_correlation_report_is_invalid_response() {
    let mut payload = analysis_json("Cold", "Low");
    payload["correlationReport"] = json!([]);
    let model = ScriptedModel::replying(payload);
    let err = AnalysisClient::new(model).analyze("cough", None).await.unwrap_err();
    assert_eq!(err.reason(), "invalid_response");
}

#[tokio::test]
async fn test_transport_error_is_surfaced() {
    let model = ScriptedModel::new(vec![Step::Transport("connection reset".to_string())]);
    let err = AnalysisClient::new(model).analyze("cough", None).await.unwrap_err();
    assert_eq!(err, AnalysisError::Transport("connection reset".to_string()));
    assert_eq!(err.reason(), "transport_error");
}

#[tokio::test]
async fn test_stalled_call_times_out() {
    let model = ScriptedModel::new(vec![Step::Stall]);
    let client = AnalysisClient::new(model).deadline(Duration::from_millis(20));

    let err = client.analyze("cough", None).await.unwrap_err();
    assert_eq!(err, AnalysisError::Timeout(Duration::from_millis(20)));
    assert_eq!(err.reason(), "timeout");
}

#[tokio::test]
async fn test_cancelled_call() {
    let model = ScriptedModel::new(vec![Step::Stall]);
    let client = AnalysisClient::new(model);
    let token = tokio_util::sync::CancellationToken::new();

    let cancel = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(10)).await;
        cancel.cancel();
    });

    let err = client
        .analyze_with_cancel("cough", None, &token)
        .await
        .unwrap_err();
    assert_eq!(err, AnalysisError::Cancelled);
}

fn inconsistent_payload() -> serde_json::Value {
    let mut payload = analysis_json("Influenza", "Moderate");
    payload["correlationReport"] = json!([
        { "name": "Influenza", "likelihood": 0.3, "reason": "Fever" },
        { "name": "Common Cold", "likelihood": 0.6, "reason": "Cough" }
    ]);
    payload
}

#[tokio::test]
async fn test_trust_policy_keeps_model_primary() {
    let model = ScriptedModel::replying(inconsistent_payload());
    let result = AnalysisClient::new(model)
        .primary_condition_policy(PrimaryConditionPolicy::TrustModel)
        .analyze("cough", None)
        .await
        .unwrap();
    assert_eq!(result.primary_condition, "Influenza");
}

#[tokio::test]
async fn test_derive_policy_uses_top_likelihood() {
    let model = ScriptedModel::replying(inconsistent_payload());
    let result = AnalysisClient::new(model)
        .primary_condition_policy(PrimaryConditionPolicy::DeriveFromReport)
        .analyze("cough", None)
        .await
        .unwrap();
    assert_eq!(result.primary_condition, "Common Cold");
    assert_eq!(result.correlation_report[0].name, "Influenza");
}
