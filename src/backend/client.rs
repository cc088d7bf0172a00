use async_trait::async_trait;
use std::sync::Arc;

use crate::backend::{GenerateResult, InlineImage};
use crate::error::AnalysisError;
use crate::schema::Schema;

/// A single multi-part request to the external model.
#[derive(Debug, Clone)]
pub struct ContentRequest {
    /// Fixed instruction describing the assistant's role
    pub system_instruction: String,
    /// User prompt text, sent as the first part
    pub prompt: String,
    /// Optional inline image, sent after the prompt
    pub image: Option<InlineImage>,
    /// Schema the JSON output is constrained to
    pub response_schema: Schema,
}

/// GenerativeModel is the seam between this crate and the black-box model.
///
/// Implementations send a [`ContentRequest`] and hand back the raw text payload
/// untouched. Parsing and validation happen in the caller, so an implementation
/// only reports transport-level failures (and may return an empty payload).
///
/// # Examples
///
/// A canned model, as used in tests:
///
/// ```
/// use async_trait::async_trait;
/// use ayushlens::{AnalysisError, ContentRequest, GenerateResult, GenerativeModel};
///
/// struct Canned(&'static str);
///
/// #[async_trait]
/// impl GenerativeModel for Canned {
///     fn name(&self) -> &str {
///         "canned"
///     }
///
///     async fn generate(&self, _request: &ContentRequest) -> Result<GenerateResult, AnalysisError> {
///         Ok(GenerateResult::text(self.0))
///     }
/// }
/// ```
#[async_trait]
pub trait GenerativeModel: Send + Sync {
    /// Model identifier, used in logs.
    fn name(&self) -> &str;

    /// Send the request and return the raw text payload.
    async fn generate(&self, request: &ContentRequest) -> Result<GenerateResult, AnalysisError>;
}

#[async_trait]
impl<M> GenerativeModel for Arc<M>
where
    M: GenerativeModel + ?Sized,
{
    fn name(&self) -> &str {
        (**self).name()
    }

    async fn generate(&self, request: &ContentRequest) -> Result<GenerateResult, AnalysisError> {
        (**self).generate(request).await
    }
}

#[async_trait]
impl<M> GenerativeModel for Box<M>
where
    M: GenerativeModel + ?Sized,
{
    fn name(&self) -> &str {
        (**self).name()
    }

    async fn generate(&self, request: &ContentRequest) -> Result<GenerateResult, AnalysisError> {
        (**self).generate(request).await
    }
}
