use std::time::Duration;
use thiserror::Error;

/// Local input errors, recovered by re-prompting without a view change.
///
/// # Examples
///
/// ```
/// use ayushlens::ValidationError;
///
/// let err = ValidationError::EmptySymptoms;
/// assert_eq!(err.to_string(), "Please describe your symptoms.");
/// ```
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Submit was attempted with blank symptom text
    #[error("Please describe your symptoms.")]
    EmptySymptoms,

    /// Login was attempted with a blank identifier
    #[error("Please enter a username")]
    EmptyIdentifier,

    /// A second analysis was requested while one is outstanding
    #[error("An analysis is already in progress")]
    AnalysisInFlight,

    /// The action is only available on the new-analysis form
    #[error("Start a new analysis first")]
    NotComposing,

    /// The action requires a logged-in session
    #[error("Please log in first")]
    NotLoggedIn,

    /// Login was attempted while a session identity is already set
    #[error("Already logged in")]
    AlreadyLoggedIn,

    /// No report in the collection carries this id
    #[error("No report with id {0}")]
    UnknownReport(String),
}

/// Failures of a single call to the external model.
///
/// Each variant maps to a stable reason string via [`AnalysisError::reason`], which is what
/// the session surfaces and logs.
#[derive(Error, Debug)]
pub enum AnalysisError {
    /// The request never produced a usable HTTP response (network, non-2xx status)
    #[error("Transport error: {0}")]
    Transport(String),

    /// The model answered, but the payload was empty, not JSON, or did not fit the schema
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// The call did not finish before the configured deadline
    #[error("Analysis timed out after {0:?}")]
    Timeout(Duration),

    /// The caller cancelled the in-flight call
    #[error("Analysis cancelled")]
    Cancelled,
}

impl AnalysisError {
    /// Stable machine-readable reason for this failure.
    pub fn reason(&self) -> &'static str {
        match self {
            AnalysisError::Transport(_) => "transport_error",
            AnalysisError::InvalidResponse(_) => "invalid_response",
            AnalysisError::Timeout(_) => "timeout",
            AnalysisError::Cancelled => "cancelled",
        }
    }
}

impl PartialEq for AnalysisError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Transport(a), Self::Transport(b)) => a == b,
            (Self::InvalidResponse(a), Self::InvalidResponse(b)) => a == b,
            (Self::Timeout(a), Self::Timeout(b)) => a == b,
            (Self::Cancelled, Self::Cancelled) => true,
            _ => false,
        }
    }
}

/// Failures of the durable report record.
#[derive(Error, Debug)]
pub enum StorageError {
    /// The medium rejected the read or write
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The collection could not be serialized
    #[error("Storage serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Injected or backend-specific rejection (e.g. quota exceeded)
    #[error("Storage rejected write: {0}")]
    Rejected(String),
}

// io::Error and serde_json::Error don't implement PartialEq, so those variants never compare equal
impl PartialEq for StorageError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Rejected(a), Self::Rejected(b)) => a == b,
            _ => false,
        }
    }
}

/// Top-level error for the crate.
///
/// # Examples
///
/// ```
/// use ayushlens::{AnalysisError, LensError, Result};
///
/// fn analyze_stub(payload: &str) -> Result<()> {
///     if payload.is_empty() {
///         return Err(AnalysisError::InvalidResponse("empty payload".into()).into());
///     }
///     Ok(())
/// }
///
/// match analyze_stub("") {
///     Err(LensError::Analysis(e)) => assert_eq!(e.reason(), "invalid_response"),
///     other => panic!("unexpected: {:?}", other),
/// }
/// ```
#[derive(Error, Debug, PartialEq)]
pub enum LensError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Analysis(#[from] AnalysisError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Missing or malformed configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

/// A specialized Result type for this crate.
pub type Result<T> = std::result::Result<T, LensError>;
