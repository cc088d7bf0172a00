//! AyushLens: a symptom correlation client.
//!
//! # Overview
//!
//! Symptoms (free text plus an optional photo) are sent to a Gemini model whose
//! output is constrained to a fixed JSON schema. The answer comes back as a
//! ranked list of potential conditions with a severity, recommendations, and a
//! disclaimer, and is kept in a local newest-first history.
//!
//! - [`AnalysisClient`] builds the request, enforces a deadline, and parses and
//!   validates the model's output.
//! - [`ReportStore`] persists the full report collection as a single record.
//! - [`SessionController`] is the state machine behind the screens: login,
//!   dashboard, new analysis, history, and details.
//!
//! The model's medical reasoning is a black box; this crate only owns the
//! contract around invoking it.
//!
//! # Quick Start
//!
//! ```no_run
//! use ayushlens::{AnalysisClient, GeminiClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = AnalysisClient::new(GeminiClient::from_env()?);
//!     let result = client.analyze("persistent cough, mild fever", None).await?;
//!
//!     println!("Primary: {} ({})", result.primary_condition, result.severity);
//!     for condition in &result.correlation_report {
//!         println!("  {:>3}% {}", condition.percent(), condition.name);
//!     }
//!     println!("{}", result.disclaimer);
//!     Ok(())
//! }
//! ```
pub mod analysis;
pub mod auth;
mod backend;
pub mod capture;
pub mod config;
mod error;
#[cfg(feature = "logging")]
pub mod logging;
pub mod model;
pub mod schema;
pub mod session;
pub mod store;

// Re-exports for convenience
pub use analysis::{AnalysisClient, PrimaryConditionPolicy};
pub use auth::{AcceptAnyIdentifier, Authenticator, Identity};
pub use backend::{
    ContentRequest, GenerateResult, GenerativeModel, InlineImage, TokenUsage,
    extract_json_from_markdown,
};
#[cfg(feature = "gemini")]
pub use backend::{GeminiClient, GeminiConfig, GeminiModel};
pub use capture::{FileImageSource, ImageSource};
pub use config::LensConfig;
pub use error::{AnalysisError, LensError, Result, StorageError, ValidationError};
pub use model::{AnalysisResult, PotentialCondition, Severity, StructuredOutput, SymptomReport};
pub use schema::{Schema, SchemaBuilder, SchemaType};
pub use session::{Notice, SessionController, Submission, View};
pub use store::{FileReportStore, MemoryReportStore, ReportStore};
