pub mod client;
#[cfg(feature = "gemini")]
pub mod gemini;
pub mod media;
pub mod usage;
mod utils;

pub use client::{ContentRequest, GenerativeModel};
#[cfg(feature = "gemini")]
pub use gemini::{GeminiClient, GeminiConfig, Model as GeminiModel};
pub use media::InlineImage;
pub use usage::{GenerateResult, TokenUsage};
pub use utils::extract_json_from_markdown;
#[cfg(feature = "gemini")]
pub(crate) use utils::{check_response_status, handle_http_error};
