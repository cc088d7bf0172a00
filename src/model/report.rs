use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt;

use crate::error::AnalysisError;
use crate::model::StructuredOutput;
use crate::schema::{Schema, SchemaBuilder, SchemaType};

/// One candidate diagnosis in a correlation report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PotentialCondition {
    pub name: String,
    /// Likelihood in `[0, 1]`
    pub likelihood: f64,
    pub reason: String,
}

impl PotentialCondition {
    /// Likelihood as a whole percentage, rounded.
    pub fn percent(&self) -> u8 {
        (self.likelihood.clamp(0.0, 1.0) * 100.0).round() as u8
    }
}

/// Urgency of an analysis result, ordered from least to most urgent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    Low,
    Moderate,
    High,
    Emergency,
}

impl Severity {
    pub const ALL: [Severity; 4] = [
        Severity::Low,
        Severity::Moderate,
        Severity::High,
        Severity::Emergency,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "Low",
            Severity::Moderate => "Moderate",
            Severity::High => "High",
            Severity::Emergency => "Emergency",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured output of a single analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub primary_condition: String,
    pub correlation_report: Vec<PotentialCondition>,
    pub severity: Severity,
    pub recommendations: Vec<String>,
    pub disclaimer: String,
    pub summary: String,
}

impl AnalysisResult {
    /// The highest-likelihood entry; ties resolve to the earliest.
    pub fn top_condition(&self) -> Option<&PotentialCondition> {
        self.correlation_report.iter().fold(None, |best, candidate| match best {
            Some(current) if current.likelihood >= candidate.likelihood => Some(current),
            _ => Some(candidate),
        })
    }

    /// Whether `primary_condition` names the top-likelihood entry.
    pub fn primary_matches_top(&self) -> bool {
        self.top_condition()
            .is_some_and(|top| top.name.eq_ignore_ascii_case(self.primary_condition.trim()))
    }

    /// Replace `primary_condition` with the name of the top-likelihood entry.
    pub fn with_derived_primary(mut self) -> Self {
        if let Some(top) = self.top_condition() {
            self.primary_condition = top.name.clone();
        }
        self
    }
}

impl SchemaType for AnalysisResult {
    fn schema() -> Schema {
        let condition = SchemaBuilder::object()
            .property("name", json!({ "type": "string" }), true)
            .property(
                "likelihood",
                json!({
                    "type": "number",
                    "description": "Likelihood score from 0.0 to 1.0"
                }),
                true,
            )
            .property(
                "reason",
                json!({
                    "type": "string",
                    "description": "Brief reason why the condition matches"
                }),
                true,
            )
            .build_value();

        let severities: Vec<&str> = Severity::ALL.iter().map(Severity::as_str).collect();

        SchemaBuilder::object()
            .property("primaryCondition", json!({ "type": "string" }), true)
            .property(
                "correlationReport",
                SchemaBuilder::array(condition)
                    .description("Potential conditions ranked by likelihood")
                    .build_value(),
                true,
            )
            .property("severity", SchemaBuilder::string_enum(&severities), true)
            .property(
                "recommendations",
                SchemaBuilder::array(json!({ "type": "string" })).build_value(),
                true,
            )
            .property("disclaimer", json!({ "type": "string" }), true)
            .property("summary", json!({ "type": "string" }), true)
            .build()
    }

    fn schema_name() -> Option<String> {
        Some("analysis_result".to_string())
    }
}

impl StructuredOutput for AnalysisResult {
    fn validate(&self) -> Result<(), AnalysisError> {
        if self.primary_condition.trim().is_empty() {
            return Err(AnalysisError::InvalidResponse(
                "primaryCondition is blank".to_string(),
            ));
        }
        if self.correlation_report.is_empty() {
            return Err(AnalysisError::InvalidResponse(
                "correlationReport is empty".to_string(),
            ));
        }
        for condition in &self.correlation_report {
            if !condition.likelihood.is_finite() || !(0.0..=1.0).contains(&condition.likelihood) {
                return Err(AnalysisError::InvalidResponse(format!(
                    "likelihood for '{}' is outside [0, 1]: {}",
                    condition.name, condition.likelihood
                )));
            }
        }
        Ok(())
    }
}

/// A persisted record pairing submitted symptoms with their analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SymptomReport {
    pub id: String,
    /// Epoch milliseconds
    pub timestamp: i64,
    pub symptoms: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis: Option<AnalysisResult>,
}

impl SymptomReport {
    /// Local time of the report, if the timestamp is representable.
    pub fn created_at(&self) -> Option<chrono::DateTime<chrono::Local>> {
        chrono::DateTime::from_timestamp_millis(self.timestamp)
            .map(|utc| utc.with_timezone(&chrono::Local))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn condition(name: &str, likelihood: f64) -> PotentialCondition {
        PotentialCondition {
            name: name.to_string(),
            likelihood,
            reason: "matches".to_string(),
        }
    }

    fn result(primary: &str, report: Vec<PotentialCondition>) -> AnalysisResult {
        AnalysisResult {
            primary_condition: primary.to_string(),
            correlation_report: report,
            severity: Severity::Low,
            recommendations: vec!["Rest".to_string()],
            disclaimer: "Not medical advice".to_string(),
            summary: "Likely benign".to_string(),
        }
    }

    #[test]
    fn test_severity_order_and_wire_names() {
        assert!(Severity::Low < Severity::Moderate);
        assert!(Severity::High < Severity::Emergency);
        assert_eq!(
            serde_json::to_string(&Severity::Emergency).unwrap(),
            "\"Emergency\""
        );
        assert!(serde_json::from_str::<Severity>("\"Critical\"").is_err());
    }

    #[test]
    fn test_top_condition_ties_keep_earliest() {
        let r = result(
            "Flu",
            vec![condition("Cold", 0.6), condition("Flu", 0.6), condition("Rhinitis", 0.2)],
        );
        assert_eq!(r.top_condition().unwrap().name, "Cold");
        assert!(!r.primary_matches_top());
        assert_eq!(r.with_derived_primary().primary_condition, "Cold");
    }

    #[test]
    fn test_validate_rejects_empty_report() {
        let err = result("Cold", vec![]).validate().unwrap_err();
        assert_eq!(err.reason(), "invalid_response");
    }

    #[test]
    fn test_validate_rejects_out_of_range_likelihood() {
        assert!(result("Cold", vec![condition("Cold", 80.0)]).validate().is_err());
        assert!(result("Cold", vec![condition("Cold", f64::NAN)]).validate().is_err());
        assert!(result("Cold", vec![condition("Cold", 1.0)]).validate().is_ok());
    }

    #[test]
    fn test_schema_requires_every_field() {
        let schema = AnalysisResult::schema();
        assert_eq!(
            schema.required_fields(),
            vec![
                "primaryCondition",
                "correlationReport",
                "severity",
                "recommendations",
                "disclaimer",
                "summary"
            ]
        );
        let items = &schema.to_json()["properties"]["correlationReport"]["items"];
        assert_eq!(items["required"], json!(["name", "likelihood", "reason"]));
        assert_eq!(
            schema.to_json()["properties"]["severity"]["enum"],
            json!(["Low", "Moderate", "High", "Emergency"])
        );
    }

    #[test]
    fn test_report_omits_absent_image() {
        let report = SymptomReport {
            id: "r1".to_string(),
            timestamp: 1_700_000_000_000,
            symptoms: "cough".to_string(),
            image_url: None,
            analysis: None,
        };
        let json = serde_json::to_value(&report).unwrap();
        assert!(json.get("imageUrl").is_none());
        assert_eq!(json["timestamp"], 1_700_000_000_000i64);
        assert!(report.created_at().is_some());
    }

    #[test]
    fn test_percent_rounds() {
        assert_eq!(condition("Cold", 0.804).percent(), 80);
        assert_eq!(condition("Cold", 0.806).percent(), 81);
    }
}
