//! Symptom analysis against the external model.
//!
//! [`AnalysisClient`] owns the request/response contract: it composes the fixed
//! instruction and prompt, attaches the optional photo, constrains output to the
//! [`AnalysisResult`] schema, and turns whatever comes back into either a
//! validated result or an [`AnalysisError`].

use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, trace, warn};

use crate::backend::{ContentRequest, GenerativeModel, InlineImage, extract_json_from_markdown};
use crate::error::AnalysisError;
use crate::model::{AnalysisResult, StructuredOutput};
use crate::schema::SchemaType;

/// Default deadline for a single analysis call.
pub const DEFAULT_DEADLINE: Duration = Duration::from_secs(60);

pub const SYSTEM_INSTRUCTION: &str = "\
You are the AyushLens Symptom Correlation Engine.
Your task is to analyze user-reported symptoms and optional visual evidence.

CORE REQUIREMENTS:
1. Act as a correlation engine: compare symptoms against a medical knowledge database.
2. Provide a RANKED LIST of potential conditions (Correlation Report).
3. Each condition must have a likelihood score (0.0 to 1.0) and a brief reason why it matches.
4. Identify a 'Primary Condition' which is the most likely match.
5. Assess overall severity: Low, Moderate, High, Emergency.

LEGAL COMPLIANCE:
- ALWAYS include a prominent medical disclaimer.
- Explicitly state you are an AI, not a professional medical diagnosis.";

/// How `primaryCondition` is settled when it disagrees with the correlation report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PrimaryConditionPolicy {
    /// Keep the model's `primaryCondition` as returned
    #[default]
    TrustModel,
    /// Replace it with the name of the highest-likelihood entry
    DeriveFromReport,
}

impl std::str::FromStr for PrimaryConditionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "trust" | "trust_model" => Ok(Self::TrustModel),
            "derive" | "derive_from_report" => Ok(Self::DeriveFromReport),
            other => Err(format!("unknown primary condition policy '{}'", other)),
        }
    }
}

/// Builds the user prompt for the given symptoms.
pub fn build_prompt(symptoms: &str, has_image: bool) -> String {
    let evidence = if has_image {
        "Analysis of the attached visual evidence is required."
    } else {
        "No visual evidence provided, rely on text description."
    };
    format!("Symptoms described: {}. {}", symptoms.trim(), evidence)
}

/// Parse and validate a raw payload into an [`AnalysisResult`].
///
/// Empty payloads, text that is not JSON, objects missing a required field, and
/// objects failing [`StructuredOutput::validate`] are all `invalid_response`.
pub fn parse_analysis(payload: &str) -> Result<AnalysisResult, AnalysisError> {
    let json_content = extract_json_from_markdown(payload);
    if json_content.is_empty() {
        error!("Model returned an empty payload");
        return Err(AnalysisError::InvalidResponse(
            "Correlation Engine failed to return data".to_string(),
        ));
    }

    trace!(json_len = json_content.len(), "Attempting to parse response as JSON");
    let result: AnalysisResult = serde_json::from_str(&json_content).map_err(|e| {
        error!(error = %e, "JSON parsing error");
        AnalysisError::InvalidResponse(format!("Failed to parse response: {}", e))
    })?;

    if let Err(e) = result.validate() {
        error!(error = %e, "Analysis result failed validation");
        return Err(e);
    }

    Ok(result)
}

/// Client for the symptom-correlation contract.
///
/// # Examples
///
/// ```no_run
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// use ayushlens::{AnalysisClient, GeminiClient};
/// use std::time::Duration;
///
/// let client = AnalysisClient::new(GeminiClient::from_env()?)
///     .deadline(Duration::from_secs(30));
///
/// let result = client.analyze("persistent cough, mild fever", None).await?;
/// println!("{} ({})", result.primary_condition, result.severity);
/// # Ok(())
/// # }
/// ```
pub struct AnalysisClient<M> {
    model: M,
    deadline: Duration,
    policy: PrimaryConditionPolicy,
}

impl<M: GenerativeModel> AnalysisClient<M> {
    pub fn new(model: M) -> Self {
        Self {
            model,
            deadline: DEFAULT_DEADLINE,
            policy: PrimaryConditionPolicy::default(),
        }
    }

    /// Upper bound on a single call, including transport.
    pub fn deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn primary_condition_policy(mut self, policy: PrimaryConditionPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    /// Compose the multi-part request for `symptoms` and an optional data-URI image.
    pub fn build_request(&self, symptoms: &str, image: Option<&str>) -> ContentRequest {
        let image = image.and_then(InlineImage::from_data_uri);
        ContentRequest {
            system_instruction: SYSTEM_INSTRUCTION.to_string(),
            prompt: build_prompt(symptoms, image.is_some()),
            image,
            response_schema: AnalysisResult::schema(),
        }
    }

    /// Analyze symptoms with an optional data-URI image.
    ///
    /// Symptom text is expected to be non-blank; that check belongs to the caller.
    pub async fn analyze(
        &self,
        symptoms: &str,
        image: Option<&str>,
    ) -> Result<AnalysisResult, AnalysisError> {
        self.analyze_with_cancel(symptoms, image, &CancellationToken::new())
            .await
    }

    /// Like [`analyze`](Self::analyze), but aborts with [`AnalysisError::Cancelled`]
    /// once `cancel` fires.
    #[instrument(
        name = "analyze_symptoms",
        skip(self, symptoms, image, cancel),
        fields(
            model = %self.model.name(),
            symptoms_len = symptoms.len(),
            has_image = image.is_some()
        )
    )]
    pub async fn analyze_with_cancel(
        &self,
        symptoms: &str,
        image: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<AnalysisResult, AnalysisError> {
        info!("Requesting symptom correlation");
        let request = self.build_request(symptoms, image);
        if image.is_some() && request.image.is_none() {
            warn!("Attached image had no payload, sending text only");
        }

        let call = tokio::time::timeout(self.deadline, self.model.generate(&request));
        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                warn!("Analysis cancelled by caller");
                return Err(AnalysisError::Cancelled);
            }
            outcome = call => outcome,
        };

        let generated = match outcome {
            Ok(generated) => generated?,
            Err(_) => {
                error!(deadline = ?self.deadline, "Analysis exceeded deadline");
                return Err(AnalysisError::Timeout(self.deadline));
            }
        };

        if let Some(usage) = &generated.usage {
            debug!(
                model = %usage.model,
                input_tokens = usage.input_tokens,
                output_tokens = usage.output_tokens,
                "Token usage"
            );
        }

        let result = parse_analysis(&generated.text)?;
        let result = match self.policy {
            PrimaryConditionPolicy::TrustModel => {
                if !result.primary_matches_top() {
                    debug!(
                        primary = %result.primary_condition,
                        "Primary condition differs from top-likelihood entry, keeping model value"
                    );
                }
                result
            }
            PrimaryConditionPolicy::DeriveFromReport => result.with_derived_primary(),
        };

        info!(
            severity = %result.severity,
            conditions = result.correlation_report.len(),
            "Successfully generated and validated analysis"
        );
        Ok(result)
    }
}
