mod report;
mod structured;

pub use report::{AnalysisResult, PotentialCondition, Severity, SymptomReport};
pub use structured::StructuredOutput;
