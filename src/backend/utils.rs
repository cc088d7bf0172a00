#[cfg(feature = "gemini")]
use crate::error::AnalysisError;
#[cfg(feature = "gemini")]
use reqwest::Response;
#[cfg(feature = "gemini")]
use std::time::Duration;
#[cfg(feature = "gemini")]
use tracing::error;

/// Extract JSON from markdown code blocks if present, otherwise return the content as-is.
///
/// Models occasionally wrap JSON in ```json ... ``` fences even when a JSON
/// mime type was requested.
pub fn extract_json_from_markdown(content: &str) -> String {
    let trimmed = content.trim();

    // Match ```json ... ``` or ``` ... ```
    if trimmed.starts_with("```") {
        if let Some(start_idx) = trimmed.find('\n') {
            let after_start = &trimmed[start_idx + 1..];
            if let Some(end_idx) = after_start.rfind("```") {
                return after_start[..end_idx].trim().to_string();
            }
        }
    }

    trimmed.to_string()
}

/// Convert a reqwest error to an AnalysisError, handling timeout errors specially.
#[cfg(feature = "gemini")]
pub(crate) fn handle_http_error(
    e: reqwest::Error,
    provider_name: &str,
    timeout: Option<Duration>,
) -> AnalysisError {
    error!(error = %e, "HTTP request to {} failed", provider_name);
    if e.is_timeout() {
        AnalysisError::Timeout(timeout.unwrap_or_default())
    } else {
        AnalysisError::Transport(format!("{} request failed: {}", provider_name, e))
    }
}

/// Check HTTP response status and extract error message if unsuccessful.
#[cfg(feature = "gemini")]
pub(crate) async fn check_response_status(
    response: Response,
    provider_name: &str,
) -> Result<Response, AnalysisError> {
    if !response.status().is_success() {
        let status = response.status();
        let error_text = response.text().await.unwrap_or_default();
        error!(
            status = %status,
            error = %error_text,
            "{} API returned error response", provider_name
        );
        return Err(AnalysisError::Transport(format!(
            "{} API error ({}): {}",
            provider_name, status, error_text
        )));
    }
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_json_from_fenced_block() {
        let content = "```json\n{\"a\": 1}\n```";
        assert_eq!(extract_json_from_markdown(content), "{\"a\": 1}");
    }

    #[test]
    fn test_extract_json_from_bare_fence() {
        let content = "  ```\n[1, 2]\n```  ";
        assert_eq!(extract_json_from_markdown(content), "[1, 2]");
    }

    #[test]
    fn test_extract_json_passthrough() {
        assert_eq!(extract_json_from_markdown(" {\"a\": 1} \n"), "{\"a\": 1}");
        assert_eq!(extract_json_from_markdown(""), "");
    }
}
