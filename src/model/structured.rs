use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::AnalysisError;
use crate::schema::SchemaType;

/// A type the model is asked to produce: it knows its schema and how to
/// check itself beyond what deserialization already enforces.
///
/// # Example
///
/// ```
/// use ayushlens::{AnalysisError, Schema, SchemaBuilder, SchemaType, StructuredOutput};
/// use serde::{Deserialize, Serialize};
/// use serde_json::json;
///
/// #[derive(Serialize, Deserialize)]
/// struct Reading {
///     value: f64,
/// }
///
/// impl SchemaType for Reading {
///     fn schema() -> Schema {
///         SchemaBuilder::object()
///             .property("value", json!({ "type": "number" }), true)
///             .build()
///     }
/// }
///
/// impl StructuredOutput for Reading {
///     fn validate(&self) -> Result<(), AnalysisError> {
///         if self.value < 0.0 {
///             return Err(AnalysisError::InvalidResponse(
///                 format!("value must be non-negative, got {}", self.value),
///             ));
///         }
///         Ok(())
///     }
/// }
///
/// assert!(Reading { value: -1.0 }.validate().is_err());
/// ```
pub trait StructuredOutput: SchemaType + DeserializeOwned + Serialize {
    /// Checks applied after a successful parse. The default accepts everything.
    fn validate(&self) -> Result<(), AnalysisError> {
        Ok(())
    }
}
